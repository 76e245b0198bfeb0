//! Mode C (§4.6): a single-threaded, round-robin coroutine scheduler.
//!
//! Every suspension point (fork, join, sleep, channel, mutex contention)
//! rewinds the current context's `pc` by re-returning [`StepResult::Jumped`]
//! without moving `pc`, instead of blocking an OS thread — `advance` itself
//! is the only thing that differs between the two modes (§9); the
//! instructions above it are rewritten, not merely re-tagged, because they
//! have no OS thread to block.
//!
//! The scheduler is a single `thread_local` (Mode C is inherently
//! single-threaded, §4.6 "single-threaded cooperative coroutine
//! round-robin"), guarded by a `RefCell` borrowed only for short bookkeeping
//! — never while an instruction function is running, so a nested
//! `fork_*`/`join_thread` call on the same context can borrow it again
//! without panicking.

use std::cell::RefCell;
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::{Duration, Instant};

use super::{ChannelHandle, MutexHandle, ThreadHandle};
use crate::context::{ExecutionContext, StepResult};
use crate::environment::Environment;
use crate::error::{VmError, VmResult};
use crate::opcode::{Opcode, Program};

struct ChannelBuf {
    capacity: usize,
    queue: VecDeque<u64>,
}

/// The process-wide (thread-local) set of live contexts plus the
/// channel/mutex tables they share (§4.6 glossary "Context (cooperative
/// mode)").
#[derive(Default)]
pub struct Scheduler {
    contexts: Vec<Option<ExecutionContext>>,
    cursor: usize,
    sleep_deadlines: HashMap<usize, Instant>,
    channels: Vec<Option<ChannelBuf>>,
    mutexes: Vec<Option<i64>>,
}

impl Scheduler {
    /// Append a context; used both for the initial run and by `fork_*`.
    pub fn start(&mut self, program: Arc<Program>, pc: usize, env: Environment) -> usize {
        let ctx = ExecutionContext::new(program, pc, env);
        self.contexts.push(Some(ctx));
        self.contexts.len() - 1
    }

    /// True once every context's program counter has reached the program
    /// terminator (modeled here as `done`, §4.6 "`done()` returns true when
    /// all contexts' pc is null").
    pub fn done(&self) -> bool {
        !self.contexts.is_empty() && self.contexts.iter().all(|c| c.as_ref().map_or(true, |c| c.done))
    }
}

thread_local! {
    static SCHEDULER: RefCell<Scheduler> = RefCell::new(Scheduler::default());
}

/// The public dispatcher loop in cooperative mode (§4.6): "repeatedly calls
/// `next` until `done()`". Drives a brand-new, thread-local scheduler
/// seeded with one context at `pc`.
pub fn run(program: Arc<Program>, pc: usize, env: Environment) -> VmResult<()> {
    SCHEDULER.with(|s| *s.borrow_mut() = Scheduler::default());
    SCHEDULER.with(|s| s.borrow_mut().start(program, pc, env));
    loop {
        if SCHEDULER.with(|s| s.borrow().done()) {
            return Ok(());
        }
        step_once()?;
    }
}

/// `next` (§4.6): executes exactly one instruction of the current context,
/// then advances the round-robin cursor to the next live context.
fn step_once() -> VmResult<()> {
    let (idx, mut ctx) = SCHEDULER.with(|s| {
        let mut sched = s.borrow_mut();
        let idx = sched.cursor;
        let ctx = sched.contexts[idx].take().expect("scheduler slot double-taken");
        (idx, ctx)
    });

    let result = if ctx.done {
        Ok(StepResult::Halted)
    } else {
        let opcode = ctx.current();
        match opcode.op {
            None => {
                ctx.done = true;
                Ok(StepResult::Halted)
            }
            Some(f) => f(&mut ctx, opcode),
        }
    };

    SCHEDULER.with(|s| {
        let mut sched = s.borrow_mut();
        sched.contexts[idx] = Some(ctx);
        sched.cursor = (sched.cursor + 1) % sched.contexts.len();
    });

    result.map(|_| ())
}

fn current_index() -> usize {
    SCHEDULER.with(|s| s.borrow().cursor)
}

/// Reads a register out of a finished context by its 0-based scheduler
/// index (the root context created by `run` is always index 0). Intended
/// for inspecting results after `run` returns; panics if the index is out
/// of range.
pub fn context_register(idx: usize, register: u16) -> u64 {
    SCHEDULER.with(|s| {
        let sched = s.borrow();
        sched.contexts[idx].as_ref().expect("scheduler slot empty").env.read_register(register)
    })
}

fn fork(ctx: &ExecutionContext, target: usize) -> ThreadHandle {
    let forked = ExecutionContext::forked(ctx.program.clone(), target, &ctx.env);
    let idx = SCHEDULER.with(|s| {
        let mut sched = s.borrow_mut();
        sched.contexts.push(Some(forked));
        sched.contexts.len() - 1
    });
    ThreadHandle(idx as u64 + 1)
}

/// `fork_relative` (§4.6): "fork_* returns the new context's index" (cooperative semantics).
pub fn fork_relative(ctx: &mut ExecutionContext, op: Opcode) -> VmResult<StepResult> {
    let offset = ctx.env.read_register(op.a) as i64;
    let target = (ctx.pc as i64 + offset) as usize;
    let handle = fork(ctx, target);
    ctx.env.write_register(op.out, handle.0);
    Ok(ctx.advance())
}

/// `fork_relative_immediate` (§4.6).
pub fn fork_relative_immediate(ctx: &mut ExecutionContext, op: Opcode) -> VmResult<StepResult> {
    let offset = op.immediate_signed() as i64;
    let target = (ctx.pc as i64 + offset) as usize;
    let handle = fork(ctx, target);
    ctx.env.write_register(op.out, handle.0);
    Ok(ctx.advance())
}

/// `fork_to` (§4.6).
pub fn fork_to(ctx: &mut ExecutionContext, op: Opcode) -> VmResult<StepResult> {
    let target = ctx.env.read_register(op.a) as usize;
    let handle = fork(ctx, target);
    ctx.env.write_register(op.out, handle.0);
    Ok(ctx.advance())
}

/// `join_thread` (§4.6 cooperative semantics): "rewinds `pc` by one... until
/// the target becomes done".
pub fn join_thread(ctx: &mut ExecutionContext, op: Opcode) -> VmResult<StepResult> {
    let handle = ctx.env.read_register(op.a);
    if handle == 0 {
        return Ok(ctx.advance());
    }
    let done = SCHEDULER.with(|s| {
        s.borrow().contexts.get(handle as usize - 1).and_then(|c| c.as_ref()).map(|c| c.done)
    });
    match done {
        Some(true) => {
            ctx.env.write_register(op.a, ctx.env.read_register(op.b));
            Ok(ctx.advance())
        }
        Some(false) => Ok(ctx.retry()),
        None => Err(VmError::InvalidThread(ThreadHandle(handle))),
    }
}

/// `sleep_microseconds` (§4.6, and SPEC_FULL's inline-deadline rewrite of
/// spec.md §9's pointer-in-register trick): stores the deadline in the
/// scheduler, keyed by context index, instead of in a register.
pub fn sleep_microseconds(ctx: &mut ExecutionContext, op: Opcode) -> VmResult<StepResult> {
    let micros = ctx.env.read_register(op.a);
    let idx = current_index();
    let elapsed = SCHEDULER.with(|s| {
        let mut sched = s.borrow_mut();
        match sched.sleep_deadlines.get(&idx) {
            Some(deadline) => {
                let now = Instant::now();
                if now >= *deadline {
                    sched.sleep_deadlines.remove(&idx);
                    true
                } else {
                    false
                }
            }
            None => {
                sched.sleep_deadlines.insert(idx, Instant::now() + Duration::from_micros(micros));
                false
            }
        }
    });
    if elapsed {
        Ok(ctx.advance())
    } else {
        Ok(ctx.retry())
    }
}

/// `channel_create` (§4.6 cooperative semantics): "plain bounded dynamic arrays".
pub fn channel_create(ctx: &mut ExecutionContext, op: Opcode) -> VmResult<StepResult> {
    let capacity = ctx.env.read_register(op.a) as usize;
    let handle = SCHEDULER.with(|s| {
        let mut sched = s.borrow_mut();
        sched.channels.push(Some(ChannelBuf { capacity, queue: VecDeque::new() }));
        sched.channels.len() as u64
    });
    ctx.env.write_register(op.out, handle);
    Ok(ctx.advance())
}

/// `channel_close` (§4.6).
pub fn channel_close(ctx: &mut ExecutionContext, op: Opcode) -> VmResult<StepResult> {
    let handle = ctx.env.read_register(op.a);
    let removed = SCHEDULER.with(|s| {
        let mut sched = s.borrow_mut();
        sched.channels.get_mut(handle as usize - 1).and_then(|slot| slot.take())
    });
    if removed.is_none() {
        return Err(VmError::InvalidChannel(ChannelHandle(handle)));
    }
    ctx.env.write_register(op.a, ctx.env.read_register(op.b));
    Ok(ctx.advance())
}

/// `channel_send` (§4.6 cooperative semantics): "rewind `pc` on full".
pub fn channel_send(ctx: &mut ExecutionContext, op: Opcode) -> VmResult<StepResult> {
    let handle = ctx.env.read_register(op.a);
    let value = ctx.env.read_register(op.b);
    let outcome = SCHEDULER.with(|s| {
        let mut sched = s.borrow_mut();
        let channel = sched.channels.get_mut(handle as usize - 1).and_then(|c| c.as_mut());
        match channel {
            None => None,
            Some(channel) if channel.queue.len() >= channel.capacity => Some(false),
            Some(channel) => {
                channel.queue.push_back(value);
                Some(true)
            }
        }
    });
    match outcome {
        None => Err(VmError::InvalidChannel(ChannelHandle(handle))),
        Some(true) => Ok(ctx.advance()),
        Some(false) => Ok(ctx.retry()),
    }
}

/// `channel_receive` (§4.6 cooperative semantics): "rewind `pc` on empty".
pub fn channel_receive(ctx: &mut ExecutionContext, op: Opcode) -> VmResult<StepResult> {
    let handle = ctx.env.read_register(op.a);
    let outcome = SCHEDULER.with(|s| {
        let mut sched = s.borrow_mut();
        let channel = sched.channels.get_mut(handle as usize - 1).and_then(|c| c.as_mut());
        match channel {
            None => None,
            Some(channel) => Some(channel.queue.pop_front()),
        }
    });
    match outcome {
        None => Err(VmError::InvalidChannel(ChannelHandle(handle))),
        Some(Some(value)) => {
            ctx.env.write_register(op.out, value);
            Ok(ctx.advance())
        }
        Some(None) => Ok(ctx.retry()),
    }
}

fn with_mutex_slot<R>(handle: u64, f: impl FnOnce(&mut i64) -> R) -> VmResult<R> {
    SCHEDULER.with(|s| {
        let mut sched = s.borrow_mut();
        match sched.mutexes.get_mut(handle as usize - 1).and_then(|m| m.as_mut()) {
            Some(slot) => Ok(f(slot)),
            None => Err(VmError::InvalidMutex(MutexHandle(handle))),
        }
    })
}

/// `mutex_create` (§4.6 cooperative encoding): "`0` = unlocked ... encoded in
/// a single 64-bit register" — here, in a single scheduler-owned slot.
pub fn mutex_create(ctx: &mut ExecutionContext, op: Opcode) -> VmResult<StepResult> {
    let handle = SCHEDULER.with(|s| {
        let mut sched = s.borrow_mut();
        sched.mutexes.push(Some(0));
        sched.mutexes.len() as u64
    });
    ctx.env.write_register(op.out, handle);
    Ok(ctx.advance())
}

/// `mutex_free` (§4.6).
pub fn mutex_free(ctx: &mut ExecutionContext, op: Opcode) -> VmResult<StepResult> {
    let handle = ctx.env.read_register(op.a);
    let removed = SCHEDULER.with(|s| {
        let mut sched = s.borrow_mut();
        sched.mutexes.get_mut(handle as usize - 1).and_then(|m| m.take())
    });
    if removed.is_none() {
        return Err(VmError::InvalidMutex(MutexHandle(handle)));
    }
    ctx.env.write_register(op.a, ctx.env.read_register(op.b));
    Ok(ctx.advance())
}

/// `mutex_write_lock` (§4.6): rewinds `pc` while locked.
pub fn mutex_write_lock(ctx: &mut ExecutionContext, op: Opcode) -> VmResult<StepResult> {
    let handle = ctx.env.read_register(op.a);
    let acquired = with_mutex_slot(handle, |state| {
        if *state == 0 {
            *state = -1;
            true
        } else {
            false
        }
    })?;
    Ok(if acquired { ctx.advance() } else { ctx.retry() })
}

/// `mutex_try_write_lock` (§4.6): writes 1/0 to `out`, never rewinds.
pub fn mutex_try_write_lock(ctx: &mut ExecutionContext, op: Opcode) -> VmResult<StepResult> {
    let handle = ctx.env.read_register(op.a);
    let acquired = with_mutex_slot(handle, |state| {
        if *state == 0 {
            *state = -1;
            true
        } else {
            false
        }
    })?;
    ctx.env.write_register(op.out, acquired as u64);
    Ok(ctx.advance())
}

/// `mutex_write_unlock` (§4.6).
pub fn mutex_write_unlock(ctx: &mut ExecutionContext, op: Opcode) -> VmResult<StepResult> {
    let handle = ctx.env.read_register(op.a);
    with_mutex_slot(handle, |state| *state = 0)?;
    Ok(ctx.advance())
}

/// `mutex_read_lock` (§4.6): rewinds `pc` while exclusively locked.
pub fn mutex_read_lock(ctx: &mut ExecutionContext, op: Opcode) -> VmResult<StepResult> {
    let handle = ctx.env.read_register(op.a);
    let acquired = with_mutex_slot(handle, |state| {
        if *state >= 0 {
            *state += 1;
            true
        } else {
            false
        }
    })?;
    Ok(if acquired { ctx.advance() } else { ctx.retry() })
}

/// `mutex_try_read_lock` (§4.6): writes 1/0 to `out`, never rewinds.
pub fn mutex_try_read_lock(ctx: &mut ExecutionContext, op: Opcode) -> VmResult<StepResult> {
    let handle = ctx.env.read_register(op.a);
    let acquired = with_mutex_slot(handle, |state| {
        if *state >= 0 {
            *state += 1;
            true
        } else {
            false
        }
    })?;
    ctx.env.write_register(op.out, acquired as u64);
    Ok(ctx.advance())
}

/// `mutex_read_unlock` (§4.6).
pub fn mutex_read_unlock(ctx: &mut ExecutionContext, op: Opcode) -> VmResult<StepResult> {
    let handle = ctx.env.read_register(op.a);
    with_mutex_slot(handle, |state| {
        if *state > 0 {
            *state -= 1;
        }
    })?;
    Ok(ctx.advance())
}
