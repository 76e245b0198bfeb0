//! Runtime error types.
//!
//! Mirrors `fuel-vm`'s approach of wrapping VM-level faults in a typed,
//! `thiserror`-derived enum and propagating them through `Result` rather
//! than aborting the host process (§7 "Error Handling Design").

use thiserror::Error;

use crate::concurrency::{ChannelHandle, MutexHandle, ThreadHandle};

/// Error variants produced by the dispatch core and instruction banks.
#[derive(Debug, Error)]
pub enum VmError {
    /// A stack access fell outside `(stack_boundary, stack_bottom]` (§3 invariants).
    #[error("stack access at offset {offset} from sp={sp:#x} is out of bounds ({boundary:#x}, {bottom:#x}]")]
    StackOutOfBounds {
        /// Byte offset requested (`sp as i64 + delta`).
        offset: i64,
        /// The stack pointer the access was relative to.
        sp: usize,
        /// `env.stack_boundary`.
        boundary: usize,
        /// `env.stack_bottom`.
        bottom: usize,
    },

    /// Division or modulus by zero (§7: "undefined; implementers may raise a
    /// host exception"). Mizu chooses to raise this error.
    #[error("division or modulus by zero")]
    DivideByZero,

    /// An instruction referenced a channel handle that does not exist.
    #[error("channel {0:?} does not exist")]
    InvalidChannel(ChannelHandle),

    /// An instruction referenced a mutex handle that does not exist.
    #[error("mutex {0:?} does not exist")]
    InvalidMutex(MutexHandle),

    /// An instruction referenced a thread handle that does not exist.
    #[error("thread {0:?} does not exist")]
    InvalidThread(ThreadHandle),

    /// `channel_send` targeted a channel that was already closed.
    #[error("send on closed channel {0:?}")]
    SendOnClosedChannel(ChannelHandle),

    /// FFI interface construction was attempted with no pushed types.
    #[error("FFI interface has an empty type stack")]
    EmptyTypeStack,

    /// Too many arguments were pushed for the FFI trampoline backend to support.
    #[error("too many arguments for FFI trampoline: {0}")]
    TooManyArguments(usize),

    /// The dynamic library loader failed to open a library.
    #[error("failed to load shared library {path:?}: {message}")]
    LibraryLoad {
        /// Path passed to `load_shared`.
        path: String,
        /// Loader-supplied diagnostic.
        message: String,
    },

    /// The dynamic library loader could not resolve a symbol.
    #[error("symbol {0:?} not found")]
    SymbolNotFound(String),

    /// A `bank-debug` assertion instruction observed a register that failed
    /// the asserted condition.
    #[error("assertion failed: register {register} held {value:#x}")]
    AssertionFailed {
        /// The register selector that was checked.
        register: u16,
        /// The value it held.
        value: u64,
    },
}

/// Convenience alias used throughout the crate.
pub type VmResult<T> = Result<T, VmError>;
