//! The floating-point instruction bank (§4.5), gated behind `bank-float`.
//!
//! spec.md defines one shape of instruction "for each width W ∈ {32, 64}".
//! `define_float_bank!` below instantiates that shape once per width so the
//! two banks (`f32`, `f64`) stay textually identical apart from their types
//! — the same relationship `fuel-vm`'s ALU helpers (`alu_overflow`,
//! `alu_set`) have to the many arithmetic instructions built on them.

use crate::context::{ExecutionContext, StepResult};
use crate::error::VmResult;
use crate::opcode::Opcode;
use crate::registry::Registry;

macro_rules! define_float_bank {
    ($module:ident, $float:ty, $uint:ty, $int:ty, $width_bytes:expr) => {
        /// Instructions operating on the given float width (§4.5).
        pub mod $module {
            use super::*;

            fn read(ctx: &ExecutionContext, reg: u16) -> $float {
                <$float>::from_bits(ctx.env.read_register(reg) as $uint)
            }

            fn write(ctx: &mut ExecutionContext, reg: u16, value: $float) {
                ctx.env.write_register(reg, value.to_bits() as u64);
            }

            /// `convert_to_fW`: interpret `a` as unsigned and cast to float.
            pub fn convert_to_float(ctx: &mut ExecutionContext, op: Opcode) -> VmResult<StepResult> {
                let value = ctx.env.read_register(op.a) as $uint as $float;
                write(ctx, op.out, value);
                Ok(ctx.advance())
            }

            /// `convert_signed_to_fW`: interpret `a` as signed and cast to float.
            pub fn convert_signed_to_float(ctx: &mut ExecutionContext, op: Opcode) -> VmResult<StepResult> {
                let value = ctx.env.read_register(op.a) as $int as $float;
                write(ctx, op.out, value);
                Ok(ctx.advance())
            }

            /// `convert_from_fW`: truncate float to an unsigned integer.
            pub fn convert_from_float(ctx: &mut ExecutionContext, op: Opcode) -> VmResult<StepResult> {
                let value = read(ctx, op.a) as $uint as u64;
                ctx.env.write_register(op.out, value);
                Ok(ctx.advance())
            }

            /// `convert_signed_from_fW`: truncate float to a signed integer.
            pub fn convert_signed_from_float(ctx: &mut ExecutionContext, op: Opcode) -> VmResult<StepResult> {
                let value = read(ctx, op.a) as $int as u64;
                ctx.env.write_register(op.out, value);
                Ok(ctx.advance())
            }

            /// `add_fW`.
            pub fn add(ctx: &mut ExecutionContext, op: Opcode) -> VmResult<StepResult> {
                let result = read(ctx, op.a) + read(ctx, op.b);
                write(ctx, op.out, result);
                Ok(ctx.advance())
            }

            /// `subtract_fW`.
            pub fn subtract(ctx: &mut ExecutionContext, op: Opcode) -> VmResult<StepResult> {
                let result = read(ctx, op.a) - read(ctx, op.b);
                write(ctx, op.out, result);
                Ok(ctx.advance())
            }

            /// `multiply_fW`.
            pub fn multiply(ctx: &mut ExecutionContext, op: Opcode) -> VmResult<StepResult> {
                let result = read(ctx, op.a) * read(ctx, op.b);
                write(ctx, op.out, result);
                Ok(ctx.advance())
            }

            /// `divide_fW`. IEEE 754 division, including by zero (produces
            /// infinity/NaN rather than a VM-level error, unlike integer
            /// `divide`).
            pub fn divide(ctx: &mut ExecutionContext, op: Opcode) -> VmResult<StepResult> {
                let result = read(ctx, op.a) / read(ctx, op.b);
                write(ctx, op.out, result);
                Ok(ctx.advance())
            }

            /// `max_fW`.
            pub fn max(ctx: &mut ExecutionContext, op: Opcode) -> VmResult<StepResult> {
                let result = read(ctx, op.a).max(read(ctx, op.b));
                write(ctx, op.out, result);
                Ok(ctx.advance())
            }

            /// `min_fW`.
            pub fn min(ctx: &mut ExecutionContext, op: Opcode) -> VmResult<StepResult> {
                let result = read(ctx, op.a).min(read(ctx, op.b));
                write(ctx, op.out, result);
                Ok(ctx.advance())
            }

            /// `sqrt_fW`.
            pub fn sqrt(ctx: &mut ExecutionContext, op: Opcode) -> VmResult<StepResult> {
                let result = read(ctx, op.a).sqrt();
                write(ctx, op.out, result);
                Ok(ctx.advance())
            }

            /// `set_if_equal_fW`.
            pub fn set_if_equal(ctx: &mut ExecutionContext, op: Opcode) -> VmResult<StepResult> {
                let result = read(ctx, op.a) == read(ctx, op.b);
                ctx.env.write_register(op.out, result as u64);
                Ok(ctx.advance())
            }

            /// `set_if_not_equal_fW`.
            pub fn set_if_not_equal(ctx: &mut ExecutionContext, op: Opcode) -> VmResult<StepResult> {
                let result = read(ctx, op.a) != read(ctx, op.b);
                ctx.env.write_register(op.out, result as u64);
                Ok(ctx.advance())
            }

            /// `set_if_less_fW`.
            pub fn set_if_less(ctx: &mut ExecutionContext, op: Opcode) -> VmResult<StepResult> {
                let result = read(ctx, op.a) < read(ctx, op.b);
                ctx.env.write_register(op.out, result as u64);
                Ok(ctx.advance())
            }

            /// `set_if_greater_equal_fW`.
            pub fn set_if_greater_equal(ctx: &mut ExecutionContext, op: Opcode) -> VmResult<StepResult> {
                let result = read(ctx, op.a) >= read(ctx, op.b);
                ctx.env.write_register(op.out, result as u64);
                Ok(ctx.advance())
            }

            /// `set_if_negative_fW`: the sign bit is set.
            pub fn set_if_negative(ctx: &mut ExecutionContext, op: Opcode) -> VmResult<StepResult> {
                let result = read(ctx, op.a).is_sign_negative();
                ctx.env.write_register(op.out, result as u64);
                Ok(ctx.advance())
            }

            /// `set_if_positive_fW`: defined as "not sign-bit", so
            /// `positive(-0.0)` is `false` (§4.5).
            pub fn set_if_positive(ctx: &mut ExecutionContext, op: Opcode) -> VmResult<StepResult> {
                let result = !read(ctx, op.a).is_sign_negative();
                ctx.env.write_register(op.out, result as u64);
                Ok(ctx.advance())
            }

            /// `set_if_infinity_fW`.
            pub fn set_if_infinity(ctx: &mut ExecutionContext, op: Opcode) -> VmResult<StepResult> {
                let result = read(ctx, op.a).is_infinite();
                ctx.env.write_register(op.out, result as u64);
                Ok(ctx.advance())
            }

            /// `set_if_nan_fW`.
            pub fn set_if_nan(ctx: &mut ExecutionContext, op: Opcode) -> VmResult<StepResult> {
                let result = read(ctx, op.a).is_nan();
                ctx.env.write_register(op.out, result as u64);
                Ok(ctx.advance())
            }

            /// `stack_load_fW`: paralleling the integer stack-load instructions (§4.5).
            pub fn stack_load(ctx: &mut ExecutionContext, op: Opcode) -> VmResult<StepResult> {
                let offset = ctx.env.read_register(op.a) as i64;
                let bits = ctx.env.stack_load::<$width_bytes>(ctx.sp, offset)? as $uint;
                write(ctx, op.out, <$float>::from_bits(bits));
                Ok(ctx.advance())
            }

            /// `stack_store_fW`: paralleling the integer stack-store instructions (§4.5).
            pub fn stack_store(ctx: &mut ExecutionContext, op: Opcode) -> VmResult<StepResult> {
                let value = read(ctx, op.a);
                let offset = ctx.env.read_register(op.b) as i64;
                ctx.env.stack_store::<$width_bytes>(ctx.sp, offset, value.to_bits() as u64)?;
                write(ctx, op.out, value);
                Ok(ctx.advance())
            }
        }
    };
}

define_float_bank!(f32_bank, f32, u32, i32, 4);
define_float_bank!(f64_bank, f64, u64, i64, 8);

/// `convert_f32_to_f64` (§4.5).
pub fn convert_f32_to_f64(ctx: &mut ExecutionContext, op: Opcode) -> VmResult<StepResult> {
    let value = f32::from_bits(ctx.env.read_register(op.a) as u32) as f64;
    ctx.env.write_register(op.out, value.to_bits());
    Ok(ctx.advance())
}

/// `convert_f64_to_f32` (§4.5).
pub fn convert_f64_to_f32(ctx: &mut ExecutionContext, op: Opcode) -> VmResult<StepResult> {
    let value = f64::from_bits(ctx.env.read_register(op.a)) as f32;
    ctx.env.write_register(op.out, value.to_bits() as u64);
    Ok(ctx.advance())
}

/// Register every float-bank instruction, for both widths, in a fixed order
/// (§4.1 cross-binary portability).
pub fn register_float_bank(registry: &mut Registry) {
    macro_rules! register_width {
        ($suffix:literal, $module:ident) => {
            registry.register_instruction(concat!("convert_to_f", $suffix), $module::convert_to_float);
            registry.register_instruction(concat!("convert_signed_to_f", $suffix), $module::convert_signed_to_float);
            registry.register_instruction(concat!("convert_from_f", $suffix), $module::convert_from_float);
            registry.register_instruction(concat!("convert_signed_from_f", $suffix), $module::convert_signed_from_float);
            registry.register_instruction(concat!("add_f", $suffix), $module::add);
            registry.register_instruction(concat!("subtract_f", $suffix), $module::subtract);
            registry.register_instruction(concat!("multiply_f", $suffix), $module::multiply);
            registry.register_instruction(concat!("divide_f", $suffix), $module::divide);
            registry.register_instruction(concat!("max_f", $suffix), $module::max);
            registry.register_instruction(concat!("min_f", $suffix), $module::min);
            registry.register_instruction(concat!("sqrt_f", $suffix), $module::sqrt);
            registry.register_instruction(concat!("set_if_equal_f", $suffix), $module::set_if_equal);
            registry.register_instruction(concat!("set_if_not_equal_f", $suffix), $module::set_if_not_equal);
            registry.register_instruction(concat!("set_if_less_f", $suffix), $module::set_if_less);
            registry.register_instruction(concat!("set_if_greater_equal_f", $suffix), $module::set_if_greater_equal);
            registry.register_instruction(concat!("set_if_negative_f", $suffix), $module::set_if_negative);
            registry.register_instruction(concat!("set_if_positive_f", $suffix), $module::set_if_positive);
            registry.register_instruction(concat!("set_if_infinity_f", $suffix), $module::set_if_infinity);
            registry.register_instruction(concat!("set_if_nan_f", $suffix), $module::set_if_nan);
            registry.register_instruction(concat!("stack_load_f", $suffix), $module::stack_load);
            registry.register_instruction(concat!("stack_store_f", $suffix), $module::stack_store);
        };
    }

    register_width!("32", f32_bank);
    register_width!("64", f64_bank);
    registry.register_instruction("convert_f32_to_f64", convert_f32_to_f64);
    registry.register_instruction("convert_f64_to_f32", convert_f64_to_f32);
}
