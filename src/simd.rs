//! The SIMD instruction bank's boundary contract (§1 "OUT of scope", §6
//! "SIMD bank: opaque vector and mask handles held in a single register
//! each; operations map one-to-one to target-width SIMD intrinsics").
//!
//! spec.md specifies only "the core's requirement that opaque handles may
//! live in a register" — Mizu carries that contract as two newtypes and
//! nothing else; a concrete SIMD bank (one per target width/ISA) is an
//! external collaborator, same as the FFI bank in [`crate::ffi`].

/// An opaque handle to a host SIMD vector register, packed into a single
/// 64-bit VM register (§6).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct VectorHandle(pub u64);

/// An opaque handle to a host SIMD mask register, packed into a single
/// 64-bit VM register (§6).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MaskHandle(pub u64);
