//! Tracing and the `bank-debug` instruction bank (§6 "Tracing: emit
//! instruction-name + arguments to stderr before each dispatch"; glossary
//! "Instruction bank: ... debug").
//!
//! `trace_dispatch` backs the `trace` feature's per-instruction logging,
//! grounded on `fuel-vm`'s own use of `tracing::trace!` at its dispatch
//! boundary rather than raw `eprintln!`. `register_debug_bank` is the
//! optional debug-only instruction bank (breakpoints, register dumps,
//! in-program assertions) — useful to a host author but never emitted by
//! an ordinary compiler, so it stays behind `bank-debug`.

#[cfg(feature = "trace")]
use crate::context::ExecutionContext;
#[cfg(feature = "trace")]
use crate::opcode::Opcode;

/// Emits one `tracing::trace!` event per dispatched instruction, naming its
/// program counter and its three raw register selectors. Resolving the
/// selector fields back to a human-readable instruction name would require
/// threading a [`crate::registry::Registry`] reference through
/// [`ExecutionContext`]; logging the selectors plus the function pointer's
/// address is sufficient to correlate against a registry dump taken at
/// startup, without widening the hot-path struct for a trace-only feature.
#[cfg(feature = "trace")]
pub fn trace_dispatch(ctx: &ExecutionContext, opcode: Opcode) {
    tracing::trace!(
        pc = ctx.pc,
        op = opcode.op.map(|f| f as usize),
        out = opcode.out,
        a = opcode.a,
        b = opcode.b,
        "dispatch"
    );
}

#[cfg(feature = "bank-debug")]
mod bank {
    use crate::context::{ExecutionContext, StepResult};
    use crate::error::{VmError, VmResult};
    use crate::opcode::Opcode;
    use crate::registry::Registry;

    /// `debug_breakpoint`: a no-op that emits a `tracing::warn!` event so a
    /// host running under a log collector can spot where a program paused
    /// conceptually, without an actual debugger attached.
    pub fn debug_breakpoint(ctx: &mut ExecutionContext, _op: Opcode) -> VmResult<StepResult> {
        tracing::warn!(pc = ctx.pc, "breakpoint");
        Ok(ctx.advance())
    }

    /// `debug_print_register`: emits the value of register `a` via
    /// `tracing::info!`, for ad hoc program instrumentation.
    pub fn debug_print_register(ctx: &mut ExecutionContext, op: Opcode) -> VmResult<StepResult> {
        tracing::info!(register = op.a, value = ctx.env.read_register(op.a), "register");
        Ok(ctx.advance())
    }

    /// `debug_assert_nonzero`: fails with [`VmError::AssertionFailed`] if
    /// register `a` is zero, otherwise falls through. Intended for test
    /// programs, not production instruction streams.
    pub fn debug_assert_nonzero(ctx: &mut ExecutionContext, op: Opcode) -> VmResult<StepResult> {
        let value = ctx.env.read_register(op.a);
        if value == 0 {
            return Err(VmError::AssertionFailed { register: op.a, value });
        }
        Ok(ctx.advance())
    }

    /// Register every debug-bank instruction (§4.1 deterministic ordering).
    pub fn register_debug_bank(registry: &mut Registry) {
        registry.register_instruction("debug_breakpoint", debug_breakpoint);
        registry.register_instruction("debug_print_register", debug_print_register);
        registry.register_instruction("debug_assert_nonzero", debug_assert_nonzero);
    }
}

#[cfg(feature = "bank-debug")]
pub use bank::*;

#[cfg(all(test, feature = "bank-debug"))]
mod tests {
    use super::*;
    use crate::consts::REG_T0;
    use crate::context::ExecutionContext;
    use crate::environment::Environment;
    use crate::opcode::Opcode;
    use std::sync::Arc;

    #[test]
    fn assert_nonzero_fails_on_a_zero_register() {
        let program = vec![Opcode::new(debug_assert_nonzero, 0, REG_T0, 0)];
        let mut ctx = ExecutionContext::new(Arc::new(program), 0, Environment::with_default_size());
        let op = ctx.current();
        assert!(matches!(debug_assert_nonzero(&mut ctx, op), Err(crate::error::VmError::AssertionFailed { .. })));
    }

    #[test]
    fn assert_nonzero_passes_on_a_nonzero_register() {
        let program = vec![Opcode::new(debug_assert_nonzero, 0, REG_T0, 0)];
        let mut ctx = ExecutionContext::new(Arc::new(program), 0, Environment::with_default_size());
        ctx.env.write_register(REG_T0, 1);
        let op = ctx.current();
        assert!(debug_assert_nonzero(&mut ctx, op).is_ok());
    }
}
