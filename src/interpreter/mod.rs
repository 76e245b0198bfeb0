//! The base instruction bank (§4.4): arithmetic, logic, shifts,
//! conversions, stack load/store, labels, jumps/branches, immediates, halt.

pub mod alu;
pub mod convert;
pub mod flow;
pub mod memory;

use crate::registry::Registry;

/// Register every base-bank instruction, in the fixed order spec.md demands
/// for cross-binary portability (§4.1). This bank is always present — it is
/// not gated behind a Cargo feature, unlike the optional banks in §2/§6.
pub fn register_base_bank(registry: &mut Registry) {
    use alu::*;
    use convert::*;
    use flow::*;
    use memory::*;

    registry.register_instruction("halt", halt);

    registry.register_instruction("load_immediate", load_immediate);
    registry.register_instruction("load_upper_immediate", load_upper_immediate);

    registry.register_instruction("label", label);
    registry.register_instruction("find_label", find_label);

    registry.register_instruction("jump_relative", jump_relative);
    registry.register_instruction("jump_relative_immediate", jump_relative_immediate);
    registry.register_instruction("jump_to", jump_to);
    registry.register_instruction("branch_relative", branch_relative);
    registry.register_instruction("branch_relative_immediate", branch_relative_immediate);
    registry.register_instruction("branch_to", branch_to);

    registry.register_instruction("set_if_equal", set_if_equal);
    registry.register_instruction("set_if_not_equal", set_if_not_equal);
    registry.register_instruction("set_if_less", set_if_less);
    registry.register_instruction("set_if_less_signed", set_if_less_signed);
    registry.register_instruction("set_if_greater_equal", set_if_greater_equal);
    registry.register_instruction("set_if_greater_equal_signed", set_if_greater_equal_signed);

    registry.register_instruction("add", add);
    registry.register_instruction("subtract", subtract);
    registry.register_instruction("multiply", multiply);
    registry.register_instruction("divide", divide);
    registry.register_instruction("modulus", modulus);
    registry.register_instruction("shift_left", shift_left);
    registry.register_instruction("shift_right_logical", shift_right_logical);
    registry.register_instruction("shift_right_arithmetic", shift_right_arithmetic);
    registry.register_instruction("bitwise_and", bitwise_and);
    registry.register_instruction("bitwise_or", bitwise_or);
    registry.register_instruction("bitwise_xor", bitwise_xor);

    registry.register_instruction("convert_to_u64", convert_to_u64);
    registry.register_instruction("convert_to_u32", convert_to_u32);
    registry.register_instruction("convert_to_u16", convert_to_u16);
    registry.register_instruction("convert_to_u8", convert_to_u8);

    registry.register_instruction("stack_load_u64", stack_load_u64);
    registry.register_instruction("stack_load_u32", stack_load_u32);
    registry.register_instruction("stack_load_u16", stack_load_u16);
    registry.register_instruction("stack_load_u8", stack_load_u8);
    registry.register_instruction("stack_store_u64", stack_store_u64);
    registry.register_instruction("stack_store_u32", stack_store_u32);
    registry.register_instruction("stack_store_u16", stack_store_u16);
    registry.register_instruction("stack_store_u8", stack_store_u8);
    registry.register_instruction("stack_push", stack_push);
    registry.register_instruction("stack_pop", stack_pop);
    registry.register_instruction("stack_push_immediate", stack_push_immediate);
    registry.register_instruction("stack_pop_immediate", stack_pop_immediate);
    registry.register_instruction("offset_of_stack_bottom", offset_of_stack_bottom);
}
