//! The memory model: register file plus descending stack (§3).

use crate::consts::*;
use crate::error::{VmError, VmResult};

/// `{ memory, stack_boundary, stack_bottom }` (§3).
///
/// `memory` is a single contiguous byte buffer. The first
/// [`REGISTER_FILE_BYTES`] bytes are the register file; the remainder is the
/// stack, addressed through a descending stack pointer. Keeping registers and
/// stack in one buffer (rather than two separate `Vec`s) matches spec.md's
/// data model directly and is what makes `stack_load`/`stack_store` and
/// `offset_of_stack_bottom` well-defined relative to a single address space.
#[derive(Clone)]
pub struct Environment {
    memory: Vec<u8>,
    /// Byte offset of the lowest valid stack byte (one past the register file).
    stack_boundary: usize,
    /// Byte offset one past the last valid memory byte (initial stack pointer).
    stack_bottom: usize,
}

impl Environment {
    /// Allocate a new environment with `word_count` 64-bit words of memory
    /// and run [`Self::setup`] on it.
    pub fn new(word_count: usize) -> Self {
        let mut env = Environment {
            memory: vec![0u8; word_count * WORD_SIZE],
            stack_boundary: 0,
            stack_bottom: 0,
        };
        env.setup();
        env
    }

    /// An environment with the default memory size (§3: "default 1024 words ≈ 8 KiB").
    pub fn with_default_size() -> Self {
        Self::new(DEFAULT_MEMORY_WORDS)
    }

    /// `setup_environment` (§4.2): resets register 0, and computes
    /// `stack_boundary`/`stack_bottom` from the memory buffer's size.
    pub fn setup(&mut self) {
        self.stack_boundary = REGISTER_FILE_BYTES.min(self.memory.len());
        self.stack_bottom = self.memory.len();
        self.write_register(REG_ZERO, 0);
    }

    /// Total memory size in bytes.
    pub fn len(&self) -> usize {
        self.memory.len()
    }

    /// Byte offset of the lowest valid stack byte.
    pub fn stack_boundary(&self) -> usize {
        self.stack_boundary
    }

    /// Byte offset one past the last memory byte; the initial stack pointer.
    pub fn stack_bottom(&self) -> usize {
        self.stack_bottom
    }

    /// Read register `idx` (zero-extended 64-bit value).
    ///
    /// Register 0 always reads as 0 is *not* enforced here (§3 says it "reads
    /// as 0" as an externally observed invariant maintained by the dispatcher
    /// resetting it before every dispatch; see [`ExecutionContext::advance`]).
    /// Reading the raw cell directly is useful to instructions that run
    /// within the same step that wrote to it (§9 "Zero register as an
    /// interface").
    pub fn read_register(&self, idx: u16) -> u64 {
        let offset = idx as usize * WORD_SIZE;
        let mut bytes = [0u8; WORD_SIZE];
        bytes.copy_from_slice(&self.memory[offset..offset + WORD_SIZE]);
        u64::from_le_bytes(bytes)
    }

    /// Write register `idx`. Writes to register 0 are observable within the
    /// current instruction (§3); callers that need the "always reads as 0"
    /// guarantee across dispatch boundaries rely on
    /// [`ExecutionContext::advance`] resetting it.
    pub fn write_register(&mut self, idx: u16, value: u64) {
        let offset = idx as usize * WORD_SIZE;
        self.memory[offset..offset + WORD_SIZE].copy_from_slice(&value.to_le_bytes());
    }

    /// Compute and bounds-check an effective stack address: `sp as i64 + offset`
    /// must land in `(stack_boundary, stack_bottom]` minus `width` bytes of
    /// headroom (§3 invariants; §4.4 stack access instructions).
    fn effective_address(&self, sp: usize, offset: i64, width: usize) -> VmResult<usize> {
        let address = sp as i64 + offset;
        if address <= self.stack_boundary as i64 || address as usize + width > self.stack_bottom {
            return Err(VmError::StackOutOfBounds {
                offset,
                sp,
                boundary: self.stack_boundary,
                bottom: self.stack_bottom,
            });
        }
        Ok(address as usize)
    }

    /// Read `WIDTH` bytes at `sp + offset`, zero-extended into a `u64`
    /// (§4.4 `stack_load_u{64,32,16,8}`).
    pub fn stack_load<const WIDTH: usize>(&self, sp: usize, offset: i64) -> VmResult<u64> {
        let address = self.effective_address(sp, offset, WIDTH)?;
        let mut bytes = [0u8; 8];
        bytes[..WIDTH].copy_from_slice(&self.memory[address..address + WIDTH]);
        Ok(u64::from_le_bytes(bytes))
    }

    /// Write the low `WIDTH` bytes of `value` at `sp + offset`
    /// (§4.4 `stack_store_u{64,32,16,8}`).
    pub fn stack_store<const WIDTH: usize>(&mut self, sp: usize, offset: i64, value: u64) -> VmResult<()> {
        let address = self.effective_address(sp, offset, WIDTH)?;
        let bytes = value.to_le_bytes();
        self.memory[address..address + WIDTH].copy_from_slice(&bytes[..WIDTH]);
        Ok(())
    }

    /// `fill_stack_bottom` (§4.2): copy `bytes` into the top of the stack,
    /// ending at `stack_bottom`. Used to pre-populate stack data from a
    /// portable-format bundle (§4.7).
    pub fn fill_stack_bottom(&mut self, bytes: &[u8]) {
        let start = self.stack_bottom - bytes.len();
        self.memory[start..self.stack_bottom].copy_from_slice(bytes);
    }

    /// Assert the universal stack invariant for a given `sp`
    /// (§8 "For any program and any step, `stack_boundary < sp <= stack_bottom`").
    pub fn check_sp(&self, sp: usize) -> VmResult<()> {
        if sp <= self.stack_boundary || sp > self.stack_bottom {
            return Err(VmError::StackOutOfBounds {
                offset: 0,
                sp,
                boundary: self.stack_boundary,
                bottom: self.stack_bottom,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn setup_computes_bounds_from_register_file_size() {
        let env = Environment::new(DEFAULT_MEMORY_WORDS);
        assert_eq!(env.stack_boundary(), REGISTER_FILE_BYTES);
        assert_eq!(env.stack_bottom(), DEFAULT_MEMORY_BYTES);
    }

    #[test]
    fn register_round_trip() {
        let mut env = Environment::with_default_size();
        env.write_register(REG_T0, 0xdead_beef_1234_5678);
        assert_eq!(env.read_register(REG_T0), 0xdead_beef_1234_5678);
    }

    #[test]
    fn stack_store_then_load_round_trips() {
        let mut env = Environment::with_default_size();
        let sp = env.stack_bottom();
        env.stack_store::<8>(sp, -8, 0x1122_3344_5566_7788).unwrap();
        assert_eq!(env.stack_load::<8>(sp, -8).unwrap(), 0x1122_3344_5566_7788);
    }

    #[test]
    fn stack_access_out_of_bounds_is_rejected() {
        let env = Environment::with_default_size();
        let sp = env.stack_bottom();
        assert!(env.stack_load::<8>(sp, 1).is_err());
        assert!(env.stack_load::<8>(env.stack_boundary(), 0).is_err());
    }

    #[test]
    fn fill_stack_bottom_places_data_at_the_top() {
        let mut env = Environment::with_default_size();
        let data = [1u8, 2, 3, 4];
        env.fill_stack_bottom(&data);
        let bottom = env.stack_bottom();
        assert_eq!(&env.memory[bottom - 4..bottom], &data);
    }
}
