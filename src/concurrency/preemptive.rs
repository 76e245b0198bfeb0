//! Mode P (§4.6): real OS threads, crossbeam channels, and a hand-rolled
//! condvar-based reader-writer lock (std's `RwLock` ties its guard to a
//! borrow scope, which doesn't fit a `lock`/`unlock` pair split across two
//! separate instruction dispatches — so Mizu implements the lock/unlock
//! state machine directly, the same shape `original_source` encodes as a
//! plain counter, just guarded by a `Mutex` + `Condvar` instead of busy-wait
//! rewinding).

use std::sync::{Condvar, Mutex, OnceLock};
use std::thread::JoinHandle;
use std::time::Duration;

use crossbeam_channel::{Receiver, Sender};

use super::{ChannelHandle, MutexHandle, ThreadHandle};
use crate::context::{ExecutionContext, StepResult};
use crate::error::{VmError, VmResult};
use crate::opcode::Opcode;

/// A minimal slot table: handles are `index + 1` so `0` stays reserved as null.
struct Slab<T> {
    slots: Vec<Option<T>>,
}

impl<T> Slab<T> {
    const fn new() -> Self {
        Slab { slots: Vec::new() }
    }

    fn insert(&mut self, value: T) -> u64 {
        for (i, slot) in self.slots.iter_mut().enumerate() {
            if slot.is_none() {
                *slot = Some(value);
                return i as u64 + 1;
            }
        }
        self.slots.push(Some(value));
        self.slots.len() as u64
    }

    fn get(&self, handle: u64) -> Option<&T> {
        if handle == 0 {
            return None;
        }
        self.slots.get(handle as usize - 1).and_then(Option::as_ref)
    }

    fn remove(&mut self, handle: u64) -> Option<T> {
        if handle == 0 {
            return None;
        }
        self.slots.get_mut(handle as usize - 1).and_then(Option::take)
    }
}

fn threads() -> &'static Mutex<Slab<JoinHandle<()>>> {
    static THREADS: OnceLock<Mutex<Slab<JoinHandle<()>>>> = OnceLock::new();
    THREADS.get_or_init(|| Mutex::new(Slab::new()))
}

struct Channel {
    tx: Sender<u64>,
    rx: Receiver<u64>,
}

fn channels() -> &'static Mutex<Slab<Channel>> {
    static CHANNELS: OnceLock<Mutex<Slab<Channel>>> = OnceLock::new();
    CHANNELS.get_or_init(|| Mutex::new(Slab::new()))
}

/// `0` unlocked, `-1` exclusively locked, `n > 0` active readers — the same
/// encoding `original_source` uses for the cooperative build, reused here
/// behind a condvar instead of a rewind loop.
struct RwLockState {
    state: Mutex<i64>,
    condvar: Condvar,
}

impl RwLockState {
    fn new() -> Self {
        RwLockState { state: Mutex::new(0), condvar: Condvar::new() }
    }
}

fn mutexes() -> &'static Mutex<Slab<std::sync::Arc<RwLockState>>> {
    static MUTEXES: OnceLock<Mutex<Slab<std::sync::Arc<RwLockState>>>> = OnceLock::new();
    MUTEXES.get_or_init(|| Mutex::new(Slab::new()))
}

fn new_thread(ctx: &ExecutionContext, target: usize) -> ThreadHandle {
    let mut forked = ExecutionContext::forked(ctx.program.clone(), target, &ctx.env);
    let join = std::thread::spawn(move || {
        let _ = forked.run();
    });
    let handle = threads().lock().unwrap().insert(join);
    ThreadHandle(handle)
}

/// `fork_relative` (§4.6): target is `pc + signed(registers[a])`.
pub fn fork_relative(ctx: &mut ExecutionContext, op: Opcode) -> VmResult<StepResult> {
    let offset = ctx.env.read_register(op.a) as i64;
    let target = (ctx.pc as i64 + offset) as usize;
    let handle = new_thread(ctx, target);
    ctx.env.write_register(op.out, handle.0);
    Ok(ctx.advance())
}

/// `fork_relative_immediate` (§4.6): target is `pc + signed(immediate)`.
pub fn fork_relative_immediate(ctx: &mut ExecutionContext, op: Opcode) -> VmResult<StepResult> {
    let offset = op.immediate_signed() as i64;
    let target = (ctx.pc as i64 + offset) as usize;
    let handle = new_thread(ctx, target);
    ctx.env.write_register(op.out, handle.0);
    Ok(ctx.advance())
}

/// `fork_to` (§4.6): target is the absolute program index in `registers[a]`.
pub fn fork_to(ctx: &mut ExecutionContext, op: Opcode) -> VmResult<StepResult> {
    let target = ctx.env.read_register(op.a) as usize;
    let handle = new_thread(ctx, target);
    ctx.env.write_register(op.out, handle.0);
    Ok(ctx.advance())
}

/// `join_thread` (§4.6): blocks until the thread in `a` finishes, then sets
/// `registers[a] = registers[b]`. A zero handle ("no thread") is a no-op.
pub fn join_thread(ctx: &mut ExecutionContext, op: Opcode) -> VmResult<StepResult> {
    let handle = ctx.env.read_register(op.a);
    if handle != 0 {
        let join = threads()
            .lock()
            .unwrap()
            .remove(handle)
            .ok_or(VmError::InvalidThread(ThreadHandle(handle)))?;
        join.join().expect("forked mizu context panicked");
        ctx.env.write_register(op.a, ctx.env.read_register(op.b));
    }
    Ok(ctx.advance())
}

/// `sleep_microseconds` (§4.6): blocks the calling thread.
pub fn sleep_microseconds(ctx: &mut ExecutionContext, op: Opcode) -> VmResult<StepResult> {
    let micros = ctx.env.read_register(op.a);
    std::thread::sleep(Duration::from_micros(micros));
    Ok(ctx.advance())
}

/// `channel_create` (§4.6): a bounded FIFO queue; capacity 0 is a
/// rendezvous (unbuffered) channel.
pub fn channel_create(ctx: &mut ExecutionContext, op: Opcode) -> VmResult<StepResult> {
    let capacity = ctx.env.read_register(op.a) as usize;
    let (tx, rx) = crossbeam_channel::bounded(capacity);
    let handle = channels().lock().unwrap().insert(Channel { tx, rx });
    ctx.env.write_register(op.out, handle);
    Ok(ctx.advance())
}

/// `channel_close` (§4.6): destroys the channel and sets `registers[a] = registers[b]`.
pub fn channel_close(ctx: &mut ExecutionContext, op: Opcode) -> VmResult<StepResult> {
    let handle = ctx.env.read_register(op.a);
    channels()
        .lock()
        .unwrap()
        .remove(handle)
        .ok_or(VmError::InvalidChannel(ChannelHandle(handle)))?;
    ctx.env.write_register(op.a, ctx.env.read_register(op.b));
    Ok(ctx.advance())
}

/// `channel_send` (§4.6): blocks when full.
pub fn channel_send(ctx: &mut ExecutionContext, op: Opcode) -> VmResult<StepResult> {
    let handle = ctx.env.read_register(op.a);
    let value = ctx.env.read_register(op.b);
    let tx = {
        let table = channels().lock().unwrap();
        let channel = table.get(handle).ok_or(VmError::InvalidChannel(ChannelHandle(handle)))?;
        channel.tx.clone()
    };
    tx.send(value).map_err(|_| VmError::SendOnClosedChannel(ChannelHandle(handle)))?;
    Ok(ctx.advance())
}

/// `channel_receive` (§4.6): blocks when empty.
pub fn channel_receive(ctx: &mut ExecutionContext, op: Opcode) -> VmResult<StepResult> {
    let handle = ctx.env.read_register(op.a);
    let rx = {
        let table = channels().lock().unwrap();
        let channel = table.get(handle).ok_or(VmError::InvalidChannel(ChannelHandle(handle)))?;
        channel.rx.clone()
    };
    let value = rx.recv().map_err(|_| VmError::InvalidChannel(ChannelHandle(handle)))?;
    ctx.env.write_register(op.out, value);
    Ok(ctx.advance())
}

/// `mutex_create` (§4.6): a shared reader-writer lock, initially unlocked.
pub fn mutex_create(ctx: &mut ExecutionContext, op: Opcode) -> VmResult<StepResult> {
    let handle = mutexes().lock().unwrap().insert(std::sync::Arc::new(RwLockState::new()));
    ctx.env.write_register(op.out, handle);
    Ok(ctx.advance())
}

/// `mutex_free` (§4.6): destroys the mutex and sets `registers[a] = registers[b]`.
pub fn mutex_free(ctx: &mut ExecutionContext, op: Opcode) -> VmResult<StepResult> {
    let handle = ctx.env.read_register(op.a);
    mutexes()
        .lock()
        .unwrap()
        .remove(handle)
        .ok_or(VmError::InvalidMutex(MutexHandle(handle)))?;
    ctx.env.write_register(op.a, ctx.env.read_register(op.b));
    Ok(ctx.advance())
}

fn lookup_mutex(handle: u64) -> VmResult<std::sync::Arc<RwLockState>> {
    mutexes()
        .lock()
        .unwrap()
        .get(handle)
        .cloned()
        .ok_or(VmError::InvalidMutex(MutexHandle(handle)))
}

/// `mutex_write_lock` (§4.6): blocks until an exclusive lock can be taken.
pub fn mutex_write_lock(ctx: &mut ExecutionContext, op: Opcode) -> VmResult<StepResult> {
    let lock = lookup_mutex(ctx.env.read_register(op.a))?;
    let mut state = lock.state.lock().unwrap();
    while *state != 0 {
        state = lock.condvar.wait(state).unwrap();
    }
    *state = -1;
    Ok(ctx.advance())
}

/// `mutex_try_write_lock` (§4.6): writes 1/0 to `out` for success/failure.
pub fn mutex_try_write_lock(ctx: &mut ExecutionContext, op: Opcode) -> VmResult<StepResult> {
    let lock = lookup_mutex(ctx.env.read_register(op.a))?;
    let mut state = lock.state.lock().unwrap();
    let acquired = if *state == 0 {
        *state = -1;
        true
    } else {
        false
    };
    ctx.env.write_register(op.out, acquired as u64);
    Ok(ctx.advance())
}

/// `mutex_write_unlock` (§4.6).
pub fn mutex_write_unlock(ctx: &mut ExecutionContext, op: Opcode) -> VmResult<StepResult> {
    let lock = lookup_mutex(ctx.env.read_register(op.a))?;
    let mut state = lock.state.lock().unwrap();
    *state = 0;
    lock.condvar.notify_all();
    Ok(ctx.advance())
}

/// `mutex_read_lock` (§4.6): any number of readers may hold the lock at once.
pub fn mutex_read_lock(ctx: &mut ExecutionContext, op: Opcode) -> VmResult<StepResult> {
    let lock = lookup_mutex(ctx.env.read_register(op.a))?;
    let mut state = lock.state.lock().unwrap();
    while *state < 0 {
        state = lock.condvar.wait(state).unwrap();
    }
    *state += 1;
    Ok(ctx.advance())
}

/// `mutex_try_read_lock` (§4.6): writes 1/0 to `out` for success/failure.
pub fn mutex_try_read_lock(ctx: &mut ExecutionContext, op: Opcode) -> VmResult<StepResult> {
    let lock = lookup_mutex(ctx.env.read_register(op.a))?;
    let mut state = lock.state.lock().unwrap();
    let acquired = if *state >= 0 {
        *state += 1;
        true
    } else {
        false
    };
    ctx.env.write_register(op.out, acquired as u64);
    Ok(ctx.advance())
}

/// `mutex_read_unlock` (§4.6).
pub fn mutex_read_unlock(ctx: &mut ExecutionContext, op: Opcode) -> VmResult<StepResult> {
    let lock = lookup_mutex(ctx.env.read_register(op.a))?;
    let mut state = lock.state.lock().unwrap();
    if *state > 0 {
        *state -= 1;
        if *state == 0 {
            lock.condvar.notify_all();
        }
    }
    Ok(ctx.advance())
}
