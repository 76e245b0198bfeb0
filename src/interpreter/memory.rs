//! Stack access and stack-pointer manipulation instructions (§4.4).

use crate::context::{ExecutionContext, StepResult};
use crate::error::VmResult;
use crate::opcode::Opcode;

macro_rules! stack_load {
    ($name:ident, $width:expr) => {
        /// Reads bits from `sp + registers[a]` (offset treated as signed)
        /// and writes the zero-extended result to `out` (§4.4).
        pub fn $name(ctx: &mut ExecutionContext, op: Opcode) -> VmResult<StepResult> {
            let offset = ctx.env.read_register(op.a) as i64;
            let value = ctx.env.stack_load::<$width>(ctx.sp, offset)?;
            ctx.env.write_register(op.out, value);
            Ok(ctx.advance())
        }
    };
}

stack_load!(stack_load_u64, 8);
stack_load!(stack_load_u32, 4);
stack_load!(stack_load_u16, 2);
stack_load!(stack_load_u8, 1);

macro_rules! stack_store {
    ($name:ident, $width:expr) => {
        /// Writes the low bits of `a` to `sp + registers[b]` and mirrors
        /// them to `out` (§4.4).
        pub fn $name(ctx: &mut ExecutionContext, op: Opcode) -> VmResult<StepResult> {
            let value = ctx.env.read_register(op.a);
            let offset = ctx.env.read_register(op.b) as i64;
            ctx.env.stack_store::<$width>(ctx.sp, offset, value)?;
            ctx.env.write_register(op.out, value);
            Ok(ctx.advance())
        }
    };
}

stack_store!(stack_store_u64, 8);
stack_store!(stack_store_u32, 4);
stack_store!(stack_store_u16, 2);
stack_store!(stack_store_u8, 1);

/// A would-be `sp` that under/overflowed `usize` arithmetic is just as
/// out-of-bounds as one that landed outside `(stack_boundary, stack_bottom]`
/// — both are rejected through [`crate::environment::Environment::check_sp`]
/// rather than panicking the host on the raw subtraction/addition.
fn checked_sp(ctx: &ExecutionContext, new_sp: Option<usize>) -> VmResult<usize> {
    let candidate = new_sp.unwrap_or(usize::MAX);
    ctx.env.check_sp(candidate)?;
    Ok(candidate)
}

/// `stack_push` (§4.4): subtracts `registers[a]` bytes from `sp`.
pub fn stack_push(ctx: &mut ExecutionContext, op: Opcode) -> VmResult<StepResult> {
    let bytes = ctx.env.read_register(op.a) as usize;
    let new_sp = checked_sp(ctx, ctx.sp.checked_sub(bytes))?;
    ctx.sp = new_sp;
    Ok(ctx.advance())
}

/// `stack_pop` (§4.4): adds `registers[a]` bytes to `sp`.
pub fn stack_pop(ctx: &mut ExecutionContext, op: Opcode) -> VmResult<StepResult> {
    let bytes = ctx.env.read_register(op.a) as usize;
    let new_sp = checked_sp(ctx, ctx.sp.checked_add(bytes))?;
    ctx.sp = new_sp;
    Ok(ctx.advance())
}

/// `stack_push_immediate` (§4.4): like [`stack_push`] but the byte count is
/// the opcode's packed 32-bit immediate.
pub fn stack_push_immediate(ctx: &mut ExecutionContext, op: Opcode) -> VmResult<StepResult> {
    let new_sp = checked_sp(ctx, ctx.sp.checked_sub(op.immediate() as usize))?;
    ctx.sp = new_sp;
    Ok(ctx.advance())
}

/// `stack_pop_immediate` (§4.4): like [`stack_pop`] but the byte count is
/// the opcode's packed 32-bit immediate.
pub fn stack_pop_immediate(ctx: &mut ExecutionContext, op: Opcode) -> VmResult<StepResult> {
    let new_sp = checked_sp(ctx, ctx.sp.checked_add(op.immediate() as usize))?;
    ctx.sp = new_sp;
    Ok(ctx.advance())
}

/// `offset_of_stack_bottom` (§4.4): given a signed offset in `a`, computes
/// `sp - (stack_bottom - offset)` — the delta that would move `sp` to the
/// absolute location `offset` bytes above `stack_bottom`.
pub fn offset_of_stack_bottom(ctx: &mut ExecutionContext, op: Opcode) -> VmResult<StepResult> {
    let offset = ctx.env.read_register(op.a) as i64;
    let bottom = ctx.env.stack_bottom() as i64;
    let delta = (ctx.sp as i64).wrapping_sub(bottom.wrapping_sub(offset));
    ctx.env.write_register(op.out, delta as u64);
    Ok(ctx.advance())
}


#[cfg(test)]
trait WithImmediate {
    fn with_immediate(self, value: u32) -> Self;
}

#[cfg(test)]
impl WithImmediate for Opcode {
    fn with_immediate(mut self, value: u32) -> Self {
        self.set_immediate(value);
        self
    }
}
