//! Serialization (§4.7, §6): convert programs to and from a fixed-width
//! wire format, independent of host pointer size or endianness.
//!
//! The in-memory [`Opcode`] stores an executable function identity directly
//! (for hot-path dispatch speed, §9 "Function-identity vs. ID
//! indirection"); the wire record replaces it with the stable numeric ID
//! the [`Registry`] assigned at registration time, and inverts the mapping
//! on load.

use crate::opcode::{Opcode, Program};
use crate::registry::Registry;

/// Byte width of one wire-format opcode record: `op_id: u64` + `out, a, b: u16` (§6).
pub const RECORD_BYTES: usize = 8 + 2 + 2 + 2;

/// The op-id written for a function identity the registry doesn't know
/// about (§4.7: "a function identity not in the registry serializes as
/// `(u64)-1`").
const UNREGISTERED_ID: u64 = u64::MAX;

fn write_record(out: &mut Vec<u8>, op_id: u64, a: u16, b: u16, c: u16) {
    out.extend_from_slice(&op_id.to_le_bytes());
    out.extend_from_slice(&a.to_le_bytes());
    out.extend_from_slice(&b.to_le_bytes());
    out.extend_from_slice(&c.to_le_bytes());
}

/// `to_binary` (§4.7): one fixed-width little-endian record per opcode,
/// independent of host endianness — on a big-endian host each field is
/// byte-swapped before writing, so `to_le_bytes` below does the
/// normalization for free on every platform (§8 "Endianness invariance").
pub fn to_binary(program: &Program, registry: &Registry) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(program.len() * RECORD_BYTES);
    for opcode in program {
        let op_id = opcode.op.and_then(|f| registry.lookup_id_by_fn(f)).unwrap_or(UNREGISTERED_ID);
        write_record(&mut bytes, op_id, opcode.out, opcode.a, opcode.b);
    }
    bytes
}

/// `from_binary` (§4.7): the inverse of [`to_binary`]. An op-id the
/// registry doesn't recognize deserializes to the null function identity
/// (§4.7 "Unknown IDs deserialize to the null function identity", §7
/// "Serialization mismatch") — a program calling it behaves exactly like
/// `halt`/the program terminator.
pub fn from_binary(bytes: &[u8], registry: &Registry) -> Program {
    bytes
        .chunks_exact(RECORD_BYTES)
        .map(|record| {
            let op_id = u64::from_le_bytes(record[0..8].try_into().unwrap());
            let out = u16::from_le_bytes(record[8..10].try_into().unwrap());
            let a = u16::from_le_bytes(record[10..12].try_into().unwrap());
            let b = u16::from_le_bytes(record[12..14].try_into().unwrap());
            Opcode { op: registry.lookup_fn(op_id), out, a, b }
        })
        .collect()
}

/// `to_portable` (§4.7): serialize `program`, then — if `stack_data` is
/// non-empty — ensure the last serialized record is the null terminator
/// (appending one if the program didn't already end on it) before
/// appending `stack_data` verbatim.
pub fn to_portable(program: &Program, stack_data: &[u8], registry: &Registry) -> Vec<u8> {
    let mut bytes = to_binary(program, registry);
    if !stack_data.is_empty() {
        let ends_in_terminator = program.last().map(|op| op.op.is_none()).unwrap_or(false);
        if !ends_in_terminator {
            write_record(&mut bytes, 0, 0, 0, 0);
        }
        bytes.extend_from_slice(stack_data);
    }
    bytes
}

/// `from_portable` (§4.7): scan opcode records until the null terminator or
/// end of input; any remaining bytes are copied into the top of a fresh
/// environment's stack via [`crate::environment::Environment::fill_stack_bottom`].
///
/// The terminator record itself marks where the program segment ends and the
/// stack blob begins (§6) — it is not part of the restored program, matching
/// what `to_portable` appended it for in the first place.
pub fn from_portable(bytes: &[u8], registry: &Registry, word_count: usize) -> (Program, crate::environment::Environment) {
    let mut program = Vec::new();
    let mut offset = 0;
    while offset + RECORD_BYTES <= bytes.len() {
        let record = &bytes[offset..offset + RECORD_BYTES];
        let op_id = u64::from_le_bytes(record[0..8].try_into().unwrap());
        let out = u16::from_le_bytes(record[8..10].try_into().unwrap());
        let a = u16::from_le_bytes(record[10..12].try_into().unwrap());
        let b = u16::from_le_bytes(record[12..14].try_into().unwrap());
        offset += RECORD_BYTES;
        if op_id == 0 {
            break;
        }
        program.push(Opcode { op: registry.lookup_fn(op_id), out, a, b });
    }

    let mut env = crate::environment::Environment::new(word_count);
    let stack_data = &bytes[offset..];
    if !stack_data.is_empty() {
        env.fill_stack_bottom(stack_data);
    }
    (program, env)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::{DEFAULT_MEMORY_WORDS, REG_A0, REG_T0, REG_T1};
    use crate::interpreter::alu::add;
    use crate::interpreter::flow::halt;

    fn sample_registry() -> Registry {
        let mut registry = Registry::new();
        registry.register_instruction("add", add);
        registry.register_instruction("halt", halt);
        registry
    }

    #[test]
    fn binary_round_trip_preserves_function_identity() {
        let registry = sample_registry();
        let program: Program = vec![Opcode::new(add, REG_A0, REG_T0, REG_T1), Opcode::new(halt, 0, 0, 0)];
        let bytes = to_binary(&program, &registry);
        let restored = from_binary(&bytes, &registry);
        assert_eq!(restored.len(), 2);
        assert!(restored[0].op == Some(add));
        assert!(restored[1].op == Some(halt));
    }

    #[test]
    fn unregistered_function_serializes_to_sentinel_id_and_deserializes_to_null() {
        let registry = Registry::new();
        let program: Program = vec![Opcode::new(add, REG_A0, REG_T0, REG_T1)];
        let bytes = to_binary(&program, &registry);
        let op_id = u64::from_le_bytes(bytes[0..8].try_into().unwrap());
        assert_eq!(op_id, UNREGISTERED_ID);
        let restored = from_binary(&bytes, &registry);
        assert!(restored[0].op.is_none());
    }

    #[test]
    fn portable_round_trip_bundles_stack_data() {
        let registry = sample_registry();
        let program: Program = vec![Opcode::new(halt, 0, 0, 0)];
        let data = [1u8, 2, 3, 4, 5, 6, 7, 8];
        let bytes = to_portable(&program, &data, &registry);
        let (restored, env) = from_portable(&bytes, &registry, DEFAULT_MEMORY_WORDS);
        assert_eq!(restored.len(), 1);
        let bottom = env.stack_bottom();
        assert_eq!(env.stack_load::<8>(bottom, -8).unwrap(), u64::from_le_bytes(data));
    }

    #[test]
    fn portable_round_trip_without_stack_data_appends_nothing() {
        let registry = sample_registry();
        let program: Program = vec![Opcode::new(halt, 0, 0, 0)];
        let bytes = to_portable(&program, &[], &registry);
        assert_eq!(bytes.len(), RECORD_BYTES);
    }
}
