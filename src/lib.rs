//! Mizu: an embeddable register-based bytecode virtual machine.
//!
//! A Mizu program is a contiguous sequence of [`opcode::Opcode`] records
//! executed against an [`environment::Environment`] (a register file plus a
//! descending stack in one contiguous buffer) by a trampoline-style
//! [`context::ExecutionContext::run`]. Instructions are grouped into banks —
//! a mandatory [`interpreter`] (base) bank, and optional
//! [`float`]/[`concurrency`]/[`ffi`]/[`simd`]/[`debug`] banks gated behind
//! Cargo features — all registered through a shared [`registry::Registry`]
//! that assigns each instruction a stable numeric ID for
//! [`serialize`]-format portability.

pub mod concurrency;
pub mod consts;
pub mod context;
pub mod environment;
pub mod error;
pub mod interpreter;
pub mod opcode;
pub mod registry;
pub mod serialize;

#[cfg(feature = "bank-float")]
pub mod float;

#[cfg(feature = "bank-ffi")]
pub mod ffi;

#[cfg(feature = "bank-simd")]
pub mod simd;

#[cfg(feature = "bank-unsafe")]
pub mod unsafe_bank;

#[cfg(any(feature = "trace", feature = "bank-debug"))]
pub mod debug;

/// Convenience re-exports for embedding hosts.
pub mod prelude {
    pub use crate::concurrency::{ChannelHandle, MutexHandle, ThreadHandle};
    pub use crate::context::{ExecutionContext, StepResult};
    pub use crate::environment::Environment;
    pub use crate::error::{VmError, VmResult};
    pub use crate::opcode::{InstructionFn, Opcode, Program};
    pub use crate::registry::Registry;
}
