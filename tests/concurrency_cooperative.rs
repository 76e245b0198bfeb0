//! Mode C: the same channel ping-pong shape as the Mode P scenario, driven
//! through the round-robin scheduler's `run` entry point instead of
//! `ExecutionContext::run` — suspension points rewind `pc` instead of
//! blocking an OS thread (spec.md §4.6).

#![cfg(feature = "mode-cooperative")]

use std::sync::Arc;

use mizu::concurrency::{channel_create, channel_receive, channel_send, context_register, fork_to, join_thread, run};
use mizu::consts::{REG_A0, REG_T0, REG_ZERO};
use mizu::environment::Environment;
use mizu::interpreter::alu::add;
use mizu::interpreter::flow::{halt, load_immediate};
use mizu::opcode::{Opcode, Program};

const CH_REQ: u16 = REG_T0;
const CH_RESP: u16 = REG_T0 + 1;
const SCRATCH: u16 = REG_T0 + 2;
const WORKER_HANDLE: u16 = REG_T0 + 3;
const SEND_VALUE: u16 = REG_T0 + 4;
const RECV_VALUE: u16 = REG_T0 + 5;
const WORKER_RECEIVED: u16 = REG_T0 + 6;
const WORKER_ONE: u16 = REG_T0 + 7;
const WORKER_RESULT: u16 = REG_T0 + 8;

fn op(f: mizu::opcode::InstructionFn, out: u16, a: u16, b: u16) -> Opcode {
    Opcode::new(f, out, a, b)
}

fn with_immediate(mut opcode: Opcode, value: u32) -> Opcode {
    opcode.set_immediate(value);
    opcode
}

fn channel_ping_pong_program() -> Program {
    const WORKER: u32 = 12;

    vec![
        with_immediate(op(load_immediate, SCRATCH, 0, 0), 1),
        op(channel_create, CH_REQ, SCRATCH, 0),
        with_immediate(op(load_immediate, SCRATCH, 0, 0), 1),
        op(channel_create, CH_RESP, SCRATCH, 0),
        with_immediate(op(load_immediate, SCRATCH, 0, 0), WORKER),
        op(fork_to, WORKER_HANDLE, SCRATCH, 0),
        with_immediate(op(load_immediate, SEND_VALUE, 0, 0), 41),
        op(channel_send, 0, CH_REQ, SEND_VALUE),
        op(channel_receive, RECV_VALUE, CH_RESP, 0),
        op(join_thread, 0, WORKER_HANDLE, REG_ZERO),
        op(add, REG_A0, RECV_VALUE, REG_ZERO),
        op(halt, 0, 0, 0),
        op(channel_receive, WORKER_RECEIVED, CH_REQ, 0),
        with_immediate(op(load_immediate, WORKER_ONE, 0, 0), 1),
        op(add, WORKER_RESULT, WORKER_RECEIVED, WORKER_ONE),
        op(channel_send, 0, CH_RESP, WORKER_RESULT),
        op(halt, 0, 0, 0),
    ]
}

#[test]
fn channel_ping_pong_scenario_cooperative() {
    let program = Arc::new(channel_ping_pong_program());
    let env = Environment::with_default_size();
    run(program, 0, env).unwrap();

    // Context 0 is the root context `run` seeded; the worker forked at
    // runtime lands at index 1.
    assert_eq!(context_register(0, REG_A0), 42);
}
