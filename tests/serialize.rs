//! Serialization tests, including end-to-end scenario 5 (spec.md §8):
//! `to_portable`/`from_portable` round trip of the fibonacci program.

use std::sync::Arc;

use mizu::consts::{REG_A0, REG_RA, REG_T0, REG_T9, REG_ZERO};
use mizu::context::ExecutionContext;
use mizu::environment::Environment;
use mizu::interpreter::alu::{add, set_if_less_signed, subtract};
use mizu::interpreter::flow::{branch_relative_immediate, halt, jump_to, load_immediate};
use mizu::interpreter::memory::{stack_load_u64, stack_pop_immediate, stack_push_immediate, stack_store_u64};
use mizu::opcode::{Opcode, Program};
use mizu::registry::Registry;
use mizu::serialize::{from_binary, from_portable, to_binary, to_portable};

const T1: u16 = REG_T0 + 1;
const T2: u16 = REG_T0 + 2;
const T3: u16 = REG_T0 + 3;
const T5: u16 = REG_T0 + 5;
const T6: u16 = REG_T0 + 6;
const A2: u16 = REG_A0 + 2;
const A3: u16 = REG_A0 + 3;

fn op(f: mizu::opcode::InstructionFn, out: u16, a: u16, b: u16) -> Opcode {
    Opcode::new(f, out, a, b)
}

fn with_immediate(mut opcode: Opcode, value: u32) -> Opcode {
    opcode.set_immediate(value);
    opcode
}

fn with_branch_immediate(mut opcode: Opcode, value: i16) -> Opcode {
    opcode.set_branch_immediate(value);
    opcode
}

/// Identical in shape to `tests/fibonacci.rs`'s program; duplicated here
/// (rather than shared) because scenario 5 needs the raw `Program` to put
/// through serialization, independent of how the fibonacci test exercises it.
fn fibonacci_program() -> Program {
    const FIB: usize = 4;
    const BASE: i16 = 29;

    vec![
        with_immediate(op(load_immediate, REG_A0, 0, 0), 10),
        with_immediate(op(load_immediate, T5, 0, 0), FIB as u32),
        op(jump_to, REG_RA, T5, 0),
        op(halt, 0, 0, 0),
        with_immediate(op(load_immediate, T1, 0, 0), 2),
        op(set_if_less_signed, REG_T0, REG_A0, T1),
        with_branch_immediate(op(branch_relative_immediate, REG_T0, REG_T0, 0), BASE - 6),
        with_immediate(op(stack_push_immediate, 0, 0, 0), 16),
        with_immediate(op(load_immediate, T2, 0, 0), 0),
        op(stack_store_u64, REG_T9, REG_RA, T2),
        with_immediate(op(load_immediate, T2, 0, 0), 8),
        op(stack_store_u64, REG_T9, REG_A0, T2),
        with_immediate(op(load_immediate, T3, 0, 0), 1),
        op(subtract, REG_A0, REG_A0, T3),
        with_immediate(op(load_immediate, T5, 0, 0), FIB as u32),
        op(jump_to, REG_RA, T5, 0),
        with_immediate(op(load_immediate, T2, 0, 0), 8),
        op(stack_load_u64, T6, T2, 0),
        with_immediate(op(load_immediate, T3, 0, 0), 2),
        op(subtract, A2, T6, T3),
        op(add, A3, REG_A0, REG_ZERO),
        op(add, REG_A0, A2, REG_ZERO),
        with_immediate(op(load_immediate, T5, 0, 0), FIB as u32),
        op(jump_to, REG_RA, T5, 0),
        op(add, REG_A0, REG_A0, A3),
        with_immediate(op(load_immediate, T2, 0, 0), 0),
        op(stack_load_u64, REG_RA, T2, 0),
        with_immediate(op(stack_pop_immediate, 0, 0, 0), 16),
        op(jump_to, REG_T9, REG_RA, 0),
        op(jump_to, REG_T9, REG_RA, 0),
    ]
}

fn fibonacci_registry() -> Registry {
    let mut registry = Registry::new();
    registry.register_instruction("load_immediate", load_immediate);
    registry.register_instruction("jump_to", jump_to);
    registry.register_instruction("halt", halt);
    registry.register_instruction("set_if_less_signed", set_if_less_signed);
    registry.register_instruction("branch_relative_immediate", branch_relative_immediate);
    registry.register_instruction("stack_push_immediate", stack_push_immediate);
    registry.register_instruction("stack_store_u64", stack_store_u64);
    registry.register_instruction("subtract", subtract);
    registry.register_instruction("stack_load_u64", stack_load_u64);
    registry.register_instruction("add", add);
    registry.register_instruction("stack_pop_immediate", stack_pop_immediate);
    registry
}

#[test]
fn binary_round_trip_is_exact() {
    let registry = fibonacci_registry();
    let program = fibonacci_program();
    let bytes = to_binary(&program, &registry);
    let restored = from_binary(&bytes, &registry);
    assert_eq!(restored.len(), program.len());
    for (original, restored) in program.iter().zip(restored.iter()) {
        assert_eq!(original.out, restored.out);
        assert_eq!(original.a, restored.a);
        assert_eq!(original.b, restored.b);
        assert!(original.op == restored.op);
    }
}

/// Scenario 5: portable round trip of the fibonacci program.
#[test]
fn portable_round_trip_runs_fibonacci_of_ten() {
    let registry = fibonacci_registry();
    let program = fibonacci_program();

    let bytes = to_portable(&program, &[], &registry);
    let (restored, env) = from_portable(&bytes, &registry, mizu::consts::DEFAULT_MEMORY_WORDS);

    let mut ctx = ExecutionContext::new(Arc::new(restored), 0, env);
    ctx.run().unwrap();
    assert_eq!(ctx.env.read_register(REG_A0), 55);
}
