//! The opcode record and its immediate-packing builders (§3, §4.2).

use crate::context::{ExecutionContext, StepResult};
use crate::error::VmResult;

/// The executable identity of an instruction (§4.3 calling convention).
///
/// `None` is the reserved "program end" sentinel (§3, §4.1): a terminator
/// opcode whose function identity is null. Reaching it ends the current
/// execution context exactly like `halt`.
pub type InstructionFn = fn(&mut ExecutionContext, Opcode) -> VmResult<StepResult>;

/// One instruction in a program stream.
///
/// `out`, `a`, `b` are register selectors (§3). Three adjacent 16-bit
/// selector fields are 6 bytes wide and may instead be read back as packed
/// immediates of various shapes (§3 "Opcode record"); the `*_immediate`
/// accessors below reinterpret the `(a, b)` pair for that purpose, and the
/// `set_*` builders mutate them in place (§4.2 "Builders ... mutate the
/// (a, b) slots in place to pack immediates").
#[derive(Clone, Copy)]
pub struct Opcode {
    /// The instruction's executable identity, or `None` for the program
    /// terminator.
    pub op: Option<InstructionFn>,
    /// The `out` register selector.
    pub out: u16,
    /// The `a` register selector.
    pub a: u16,
    /// The `b` register selector.
    pub b: u16,
}

impl Opcode {
    /// The program terminator: a function identity of `None` (§3, §6).
    pub const PROGRAM_END: Opcode = Opcode { op: None, out: 0, a: 0, b: 0 };

    /// Construct a plain three-register instruction.
    pub const fn new(op: InstructionFn, out: u16, a: u16, b: u16) -> Self {
        Opcode { op: Some(op), out, a, b }
    }

    /// Unsigned 32-bit immediate packed into the `(a, b)` slot, `a` low / `b` high.
    pub const fn immediate(&self) -> u32 {
        (self.a as u32) | ((self.b as u32) << 16)
    }

    /// Signed 32-bit immediate at the same offset as [`Self::immediate`].
    pub const fn immediate_signed(&self) -> i32 {
        self.immediate() as i32
    }

    /// Signed 16-bit immediate packed into the `b` slot alone (used by the
    /// narrower branch-immediate instructions).
    pub const fn branch_immediate(&self) -> i16 {
        self.b as i16
    }

    /// The `(a, b)` slot reinterpreted as an `f32` bit pattern.
    pub fn f32_immediate(&self) -> f32 {
        f32::from_bits(self.immediate())
    }

    /// Pack an unsigned 32-bit immediate into `(a, b)`.
    pub fn set_immediate(&mut self, value: u32) -> &mut Self {
        self.a = (value & 0xffff) as u16;
        self.b = (value >> 16) as u16;
        self
    }

    /// Pack a signed 32-bit immediate into `(a, b)`.
    pub fn set_immediate_signed(&mut self, value: i32) -> &mut Self {
        self.set_immediate(value as u32)
    }

    /// Pack a signed 16-bit branch immediate into `b` alone.
    pub fn set_branch_immediate(&mut self, value: i16) -> &mut Self {
        self.b = value as u16;
        self
    }

    /// Pack an `f32` bit pattern into `(a, b)`.
    pub fn set_f32_immediate(&mut self, value: f32) -> &mut Self {
        self.set_immediate(value.to_bits())
    }

    /// Pack a label tag: the little-endian byte-packing of up to the first
    /// four bytes of `name` (§4.4, §6).
    pub fn set_label_tag(&mut self, name: &str) -> &mut Self {
        let bytes = name.as_bytes();
        let mut tag = [0u8; 4];
        let n = bytes.len().min(4);
        tag[..n].copy_from_slice(&bytes[..n]);
        self.set_immediate(u32::from_le_bytes(tag))
    }
}

impl std::fmt::Debug for Opcode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Opcode")
            .field("op", &self.op.map(|p| p as usize))
            .field("out", &self.out)
            .field("a", &self.a)
            .field("b", &self.b)
            .finish()
    }
}

/// A program is an externally-owned, contiguous sequence of opcodes (§3:
/// "the dispatcher never mutates it"). Shared via [`std::sync::Arc`] so
/// forked execution contexts (§4.6) can reference the same instruction
/// stream without copying it.
pub type Program = Vec<Opcode>;
