//! The unsafe-memory instruction bank's boundary contract (§2 "Unsafe/FFI/SIMD
//! contracts ... Boundary interfaces only"; Non-goals "sandboxing (the VM
//! can reach host memory through unsafe instructions)").
//!
//! spec.md does not hand this bank to an external collaborator the way it
//! does the FFI engine, SIMD codegen, and dynamic-library loader (§1) — but
//! it still specifies only the boundary shape, not the instruction set
//! itself. [`RawPointer`] is that shape: an opaque host address that fits
//! in one VM register, the same way [`crate::ffi`] and [`crate::simd`]
//! carry their own opaque handles.

/// A host memory address held in a single 64-bit VM register. Mizu's core
/// never dereferences this itself; an unsafe-bank instruction set built on
/// top of it would use `std::ptr::read`/`write` directly against the raw
/// address, deliberately outside any bounds check the core's own stack
/// accessors perform (§3 invariants apply only to the environment's own
/// memory, not to host memory reached this way).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RawPointer(pub u64);

impl RawPointer {
    /// Split into the lower/upper 32-bit halves used to assemble a pointer
    /// across two `load_immediate`/`load_upper_immediate`-style opcodes
    /// (§4.2 "host pointers split into lower/upper 32-bit halves").
    pub fn to_halves(self) -> (u32, u32) {
        ((self.0 & 0xffff_ffff) as u32, (self.0 >> 32) as u32)
    }

    /// Reassemble from the two halves produced by [`Self::to_halves`].
    pub fn from_halves(lower: u32, upper: u32) -> Self {
        RawPointer((lower as u64) | ((upper as u64) << 32))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn halves_round_trip() {
        let pointer = RawPointer(0x0123_4567_89ab_cdef);
        let (lower, upper) = pointer.to_halves();
        assert_eq!(RawPointer::from_halves(lower, upper), pointer);
    }
}
