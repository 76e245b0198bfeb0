//! Arithmetic, bitwise, and comparison instructions (§4.4).

use crate::context::{ExecutionContext, StepResult};
use crate::error::{VmError, VmResult};
use crate::opcode::Opcode;

/// Read the `a`/`b` operand registers for a three-register instruction.
fn operands(ctx: &ExecutionContext, op: Opcode) -> (u64, u64) {
    (ctx.env.read_register(op.a), ctx.env.read_register(op.b))
}

macro_rules! binary_alu {
    ($name:ident, $body:expr) => {
        /// See module documentation; operates on 64-bit words (§4.4).
        pub fn $name(ctx: &mut ExecutionContext, op: Opcode) -> VmResult<StepResult> {
            let (a, b) = operands(ctx, op);
            let f: fn(u64, u64) -> u64 = $body;
            ctx.env.write_register(op.out, f(a, b));
            Ok(ctx.advance())
        }
    };
}

binary_alu!(add, u64::wrapping_add);
binary_alu!(subtract, u64::wrapping_sub);
binary_alu!(multiply, u64::wrapping_mul);
binary_alu!(bitwise_and, |a, b| a & b);
binary_alu!(bitwise_or, |a, b| a | b);
binary_alu!(bitwise_xor, |a, b| a ^ b);
binary_alu!(shift_left, |a, b| a.wrapping_shl(b as u32));
binary_alu!(shift_right_logical, |a, b| a.wrapping_shr(b as u32));
binary_alu!(shift_right_arithmetic, |a, b| (a as i64).wrapping_shr(b as u32) as u64);

/// `divide` (§4.4): 64-bit unsigned division. Division by zero is a
/// [`VmError::DivideByZero`] (§7 leaves this to the implementer).
pub fn divide(ctx: &mut ExecutionContext, op: Opcode) -> VmResult<StepResult> {
    let (a, b) = operands(ctx, op);
    if b == 0 {
        return Err(VmError::DivideByZero);
    }
    ctx.env.write_register(op.out, a / b);
    Ok(ctx.advance())
}

/// `modulus` (§4.4): 64-bit unsigned remainder.
pub fn modulus(ctx: &mut ExecutionContext, op: Opcode) -> VmResult<StepResult> {
    let (a, b) = operands(ctx, op);
    if b == 0 {
        return Err(VmError::DivideByZero);
    }
    ctx.env.write_register(op.out, a % b);
    Ok(ctx.advance())
}

macro_rules! comparison {
    ($name:ident, $body:expr) => {
        /// See module documentation; writes 1 or 0 to `out` (§4.4).
        pub fn $name(ctx: &mut ExecutionContext, op: Opcode) -> VmResult<StepResult> {
            let (a, b) = operands(ctx, op);
            let f: fn(u64, u64) -> bool = $body;
            ctx.env.write_register(op.out, f(a, b) as u64);
            Ok(ctx.advance())
        }
    };
}

comparison!(set_if_equal, |a, b| a == b);
comparison!(set_if_not_equal, |a, b| a != b);
comparison!(set_if_less, |a, b| a < b);
comparison!(set_if_less_signed, |a, b| (a as i64) < (b as i64));
comparison!(set_if_greater_equal, |a, b| a >= b);
comparison!(set_if_greater_equal_signed, |a, b| (a as i64) >= (b as i64));

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::{REG_A0, REG_T0, REG_T9};
    use crate::environment::Environment;
    use crate::opcode::Program;
    use std::sync::Arc;

    fn ctx_with(program: Program) -> ExecutionContext {
        ExecutionContext::new(Arc::new(program), 0, Environment::with_default_size())
    }

    #[test]
    fn add_wraps_on_overflow() {
        let mut ctx = ctx_with(vec![Opcode::new(add, REG_A0, REG_T0, REG_T9)]);
        ctx.env.write_register(REG_T0, u64::MAX);
        ctx.env.write_register(REG_T9, 1);
        add(&mut ctx, ctx.current()).unwrap();
        assert_eq!(ctx.env.read_register(REG_A0), 0);
    }

    #[test]
    fn divide_by_zero_is_an_error() {
        let mut ctx = ctx_with(vec![Opcode::new(divide, REG_A0, REG_T0, REG_T9)]);
        ctx.env.write_register(REG_T0, 10);
        ctx.env.write_register(REG_T9, 0);
        assert!(matches!(divide(&mut ctx, ctx.current()), Err(VmError::DivideByZero)));
    }

    #[test]
    fn set_if_less_signed_treats_operands_as_signed() {
        let mut ctx = ctx_with(vec![Opcode::new(set_if_less_signed, REG_A0, REG_T0, REG_T9)]);
        ctx.env.write_register(REG_T0, (-1i64) as u64);
        ctx.env.write_register(REG_T9, 1);
        set_if_less_signed(&mut ctx, ctx.current()).unwrap();
        assert_eq!(ctx.env.read_register(REG_A0), 1);
    }
}
