//! End-to-end scenarios against the base instruction bank (spec.md §8,
//! scenarios 1, 3, 6).

use std::sync::Arc;

use mizu::consts::{REG_A0, REG_T0, REG_T1, REG_T2, REG_T3};
use mizu::context::ExecutionContext;
use mizu::environment::Environment;
use mizu::interpreter::alu::{add, set_if_equal};
use mizu::interpreter::flow::{branch_relative_immediate, find_label, halt, label, load_immediate};
use mizu::interpreter::memory::{stack_load_u64, stack_pop_immediate, stack_push_immediate, stack_store_u64};
use mizu::opcode::{Opcode, Program};

fn run(program: Program) -> ExecutionContext {
    let mut ctx = ExecutionContext::new(Arc::new(program), 0, Environment::with_default_size());
    ctx.run().unwrap();
    ctx
}

/// Scenario 1: arithmetic + branch. `t2 = 5 + 6 = 11 != 5`, so the branch is
/// not taken and `a0` ends up 42.
#[test]
fn arithmetic_and_branch_scenario() {
    let mut program: Program = vec![
        Opcode::new(load_immediate, REG_T0, 0, 0),
        Opcode::new(load_immediate, REG_T1, 0, 0),
        Opcode::new(add, REG_T2, REG_T0, REG_T1),
        Opcode::new(set_if_equal, REG_T3, REG_T2, REG_T0),
        Opcode::new(branch_relative_immediate, REG_T3, REG_T3, 0),
        Opcode::new(load_immediate, REG_A0, 0, 0),
        Opcode::new(halt, 0, 0, 0),
        Opcode::new(load_immediate, REG_A0, 0, 0),
        Opcode::new(halt, 0, 0, 0),
    ];
    program[0].set_immediate(5);
    program[1].set_immediate(6);
    program[4].set_branch_immediate(5);
    program[5].set_immediate(42);
    program[7].set_immediate(99);

    let ctx = run(program);
    assert_eq!(ctx.env.read_register(REG_A0), 42);
}

/// Scenario 3: label resolution. A `label(tag=L)` sits at offset 12;
/// `find_label` at offset 3 must locate it.
#[test]
fn label_resolution_scenario() {
    let mut program: Program = vec![Opcode::new(halt, 0, 0, 0); 13];
    program[3] = Opcode::new(find_label, REG_A0, 0, 0);
    program[3].set_label_tag("L");
    program[12] = Opcode::new(label, 0, 0, 0);
    program[12].set_label_tag("L");

    let mut ctx = ExecutionContext::new(Arc::new(program), 3, Environment::with_default_size());
    let op = ctx.current();
    find_label(&mut ctx, op).unwrap();
    assert_eq!(ctx.env.read_register(REG_A0), 12);
}

/// Scenario 6: stack push/pop balance. Pushing 64 bytes, storing/loading a
/// word, then popping must leave `sp` exactly where it started and round
/// the value through unchanged.
#[test]
fn stack_push_pop_balance_scenario() {
    let mut push = Opcode::new(stack_push_immediate, 0, 0, 0);
    push.set_immediate(64);
    let mut pop = Opcode::new(stack_pop_immediate, 0, 0, 0);
    pop.set_immediate(64);

    let program: Program = vec![
        push,
        Opcode::new(stack_store_u64, 0, REG_T0, REG_T1),
        Opcode::new(stack_load_u64, REG_T2, REG_T1, 0),
        pop,
        Opcode::new(halt, 0, 0, 0),
    ];

    let mut ctx = ExecutionContext::new(Arc::new(program), 0, Environment::with_default_size());
    let before_sp = ctx.sp;
    ctx.env.write_register(REG_T0, 0xdead_beef);
    ctx.env.write_register(REG_T1, 0);
    ctx.run().unwrap();

    assert_eq!(ctx.env.read_register(REG_T2), ctx.env.read_register(REG_T0));
    assert_eq!(ctx.sp, before_sp);
}
