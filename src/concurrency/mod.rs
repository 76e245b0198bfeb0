//! The concurrency bank (§4.6): one public contract, two interchangeable
//! implementations selected at build time.
//!
//! Mode P ([`preemptive`]) runs each `fork_*` as a real OS thread; Mode C
//! ([`cooperative`]) runs every context on one OS thread, round-robin, by
//! rewinding `pc` at suspension points instead of blocking. Both expose the
//! exact same instruction names and register conventions (§9 "Two
//! concurrency modes share a contract, not an implementation"); exactly one
//! must be compiled in, enforced by the `compile_error!` in `lib.rs`.

use crate::registry::Registry;

/// An opaque handle to a forked execution context (§4.6). `0` is never a
/// valid handle — `join_thread` treats it as "no thread" (§4.6 "Can't join
/// the main thread!").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ThreadHandle(pub u64);

/// An opaque handle to a bounded FIFO channel (§4.6). `0` is never valid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ChannelHandle(pub u64);

/// An opaque handle to a shared (reader-writer) mutex (§4.6). `0` is never valid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MutexHandle(pub u64);

#[cfg(all(feature = "mode-preemptive", feature = "mode-cooperative"))]
compile_error!("mizu: enable exactly one of `mode-preemptive` or `mode-cooperative`, not both");
#[cfg(not(any(feature = "mode-preemptive", feature = "mode-cooperative")))]
compile_error!("mizu: enable exactly one of `mode-preemptive` or `mode-cooperative`");

#[cfg(feature = "mode-preemptive")]
pub mod preemptive;
#[cfg(feature = "mode-preemptive")]
pub use preemptive::*;

#[cfg(feature = "mode-cooperative")]
pub mod cooperative;
#[cfg(feature = "mode-cooperative")]
pub use cooperative::*;

/// Register every concurrency-bank instruction, in a fixed order (§4.1).
/// Both modes register the same names, so a portable-format program is
/// equally valid against a Mode P or Mode C build.
pub fn register_concurrency_bank(registry: &mut Registry) {
    registry.register_instruction("fork_relative", fork_relative);
    registry.register_instruction("fork_relative_immediate", fork_relative_immediate);
    registry.register_instruction("fork_to", fork_to);
    registry.register_instruction("join_thread", join_thread);
    registry.register_instruction("sleep_microseconds", sleep_microseconds);

    registry.register_instruction("channel_create", channel_create);
    registry.register_instruction("channel_close", channel_close);
    registry.register_instruction("channel_send", channel_send);
    registry.register_instruction("channel_receive", channel_receive);

    registry.register_instruction("mutex_create", mutex_create);
    registry.register_instruction("mutex_free", mutex_free);
    registry.register_instruction("mutex_write_lock", mutex_write_lock);
    registry.register_instruction("mutex_try_write_lock", mutex_try_write_lock);
    registry.register_instruction("mutex_write_unlock", mutex_write_unlock);
    registry.register_instruction("mutex_read_lock", mutex_read_lock);
    registry.register_instruction("mutex_try_read_lock", mutex_try_read_lock);
    registry.register_instruction("mutex_read_unlock", mutex_read_unlock);
}
