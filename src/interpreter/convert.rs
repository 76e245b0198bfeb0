//! Integer width conversions (§4.4).

use crate::context::{ExecutionContext, StepResult};
use crate::error::VmResult;
use crate::opcode::Opcode;

/// `convert_to_u64`: copies all 64 bits of `a` into `out` (zero-extending is
/// a no-op at this width, but kept for symmetry with the narrower variants).
pub fn convert_to_u64(ctx: &mut ExecutionContext, op: Opcode) -> VmResult<StepResult> {
    let value = ctx.env.read_register(op.a);
    ctx.env.write_register(op.out, value);
    Ok(ctx.advance())
}

macro_rules! narrowing_convert {
    ($name:ident, $ty:ty) => {
        /// Copies the low bits of `a` into `out`, truncating to the width of
        /// `$ty` and then zero-extending back to 64 bits (§4.4).
        pub fn $name(ctx: &mut ExecutionContext, op: Opcode) -> VmResult<StepResult> {
            let value = ctx.env.read_register(op.a) as $ty as u64;
            ctx.env.write_register(op.out, value);
            Ok(ctx.advance())
        }
    };
}

narrowing_convert!(convert_to_u32, u32);
narrowing_convert!(convert_to_u16, u16);
narrowing_convert!(convert_to_u8, u8);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::{REG_A0, REG_T0};
    use crate::environment::Environment;
    use std::sync::Arc;

    #[test]
    fn narrowing_truncates_and_zero_extends() {
        let mut ctx = ExecutionContext::new(
            Arc::new(vec![Opcode::new(convert_to_u8, REG_A0, REG_T0, 0)]),
            0,
            Environment::with_default_size(),
        );
        ctx.env.write_register(REG_T0, 0x1122_3344_5566_77ff);
        convert_to_u8(&mut ctx, ctx.current()).unwrap();
        assert_eq!(ctx.env.read_register(REG_A0), 0xff);
    }
}
