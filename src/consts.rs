//! VM sizing and register-convention constants.

/// Word size in bytes (§3 "a contiguous array of 64-bit words").
pub const WORD_SIZE: usize = 8;

/// Register file size, in words (§3: "the first 256 words are the register file").
pub const REGISTER_FILE_WORDS: usize = 256;

/// Register file size, in bytes.
pub const REGISTER_FILE_BYTES: usize = REGISTER_FILE_WORDS * WORD_SIZE;

/// Default environment memory size, in words (§3 "default 1024 words ≈ 8 KiB").
pub const DEFAULT_MEMORY_WORDS: usize = 1024;

/// Default environment memory size, in bytes.
pub const DEFAULT_MEMORY_BYTES: usize = DEFAULT_MEMORY_WORDS * WORD_SIZE;

/* REGISTER CONVENTIONS (§3) */

/// The zero register: always reads as 0, writes are reset before the next dispatch.
pub const REG_ZERO: u16 = 0x00;

/// First caller-preserved temporary register (t0).
pub const REG_T0: u16 = 0x01;

/// Caller-preserved temporary register (t1).
pub const REG_T1: u16 = 0x02;

/// Caller-preserved temporary register (t2).
pub const REG_T2: u16 = 0x03;

/// Caller-preserved temporary register (t3).
pub const REG_T3: u16 = 0x04;

/// Caller-preserved temporary register (t4).
pub const REG_T4: u16 = 0x05;

/// Caller-preserved temporary register (t5).
pub const REG_T5: u16 = 0x06;

/// Caller-preserved temporary register (t6).
pub const REG_T6: u16 = 0x07;

/// Caller-preserved temporary register (t7).
pub const REG_T7: u16 = 0x08;

/// Caller-preserved temporary register (t8).
pub const REG_T8: u16 = 0x09;

/// Last caller-preserved temporary register (t9).
pub const REG_T9: u16 = 0x0a;

/// Return address register (ra), callee-preserved by convention.
pub const REG_RA: u16 = 0x0b;

/// First argument/callee-preserved register (a0..); also used for return values.
pub const REG_A0: u16 = 0x0c;

/// Number of selector bits backed by a live register, i.e. the valid range for
/// a register selector is `0..REGISTER_FILE_WORDS`. Selectors are a 16-bit
/// field (§3), wider than the backing store, to leave room for future growth
/// of the register file without changing the wire format.
pub const REGISTER_SELECTOR_BITS: u32 = 16;
