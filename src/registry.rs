//! The instruction registry (§4.1): a bi-directional map between names,
//! stable numeric IDs, and executable function identities.

use std::collections::HashMap;

use crate::opcode::InstructionFn;

/// Assigns a monotonically increasing stable numeric ID to each registered
/// instruction, in registration order, and remembers its name and function
/// identity under that ID.
///
/// ID 0 is reserved for the null "program_end" sentinel (§4.1, §6) — every
/// `Registry` is born with it already occupying slot 0, matching
/// `original_source/mizu/opcode.hpp`'s registration of a nameless,
/// function-less terminator before any real instruction is registered.
pub struct Registry {
    names: Vec<String>,
    functions: Vec<Option<InstructionFn>>,
    by_name: HashMap<String, u64>,
    by_fn: HashMap<usize, u64>,
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

impl Registry {
    /// An empty registry, pre-seeded with the id-0 `program_end` sentinel.
    pub fn new() -> Self {
        let mut registry = Registry {
            names: Vec::new(),
            functions: Vec::new(),
            by_name: HashMap::new(),
            by_fn: HashMap::new(),
        };
        registry.names.push("program_end".to_string());
        registry.functions.push(None);
        registry.by_name.insert("program_end".to_string(), 0);
        // Deliberately not indexed in `by_fn`: it has no function identity.
        registry
    }

    /// Assign the next stable ID to `(name, function)`. `name` and `function`
    /// must both be unique; re-registering either is undefined behavior at
    /// the specification level (§4.1) — Mizu surfaces it as a debug-mode
    /// assertion rather than silently overwriting an existing mapping.
    pub fn register_instruction(&mut self, name: &str, function: InstructionFn) -> u64 {
        debug_assert!(!self.by_name.contains_key(name), "duplicate instruction name {name:?}");
        debug_assert!(
            !self.by_fn.contains_key(&(function as usize)),
            "function identity already registered under a different name"
        );
        let id = self.names.len() as u64;
        self.names.push(name.to_string());
        self.functions.push(Some(function));
        self.by_name.insert(name.to_string(), id);
        self.by_fn.insert(function as usize, id);
        id
    }

    /// Look up the stable ID assigned to `name`.
    pub fn lookup_id_by_name(&self, name: &str) -> Option<u64> {
        self.by_name.get(name).copied()
    }

    /// Look up the stable ID assigned to `function`.
    pub fn lookup_id_by_fn(&self, function: InstructionFn) -> Option<u64> {
        self.by_fn.get(&(function as usize)).copied()
    }

    /// Look up the human-readable name registered under `id`.
    pub fn lookup_name(&self, id: u64) -> Option<&str> {
        self.names.get(id as usize).map(String::as_str)
    }

    /// Look up the function identity registered under `id`. Returns `None`
    /// both when `id` is out of range and when `id` is the null sentinel
    /// (id 0) — both cases behave identically to an unregistered instruction
    /// (§4.7 "Unknown IDs deserialize to the null function identity").
    pub fn lookup_fn(&self, id: u64) -> Option<InstructionFn> {
        self.functions.get(id as usize).copied().flatten()
    }

    /// Number of instructions registered, including the id-0 sentinel.
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Always false: the sentinel occupies slot 0 from construction.
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Discard all lookup tables (§4.1 "for memory reclamation once
    /// serialization is no longer needed"). Leaves the registry usable but
    /// empty (as if freshly constructed); any IDs assigned before this call
    /// are no longer resolvable.
    pub fn release(&mut self) {
        *self = Registry::new();
    }

    /// Build the registry Mizu ships by default: the base bank (§4.4,
    /// always present), then whichever optional banks are compiled in, each
    /// registered in a fixed order so that two builds with the same feature
    /// set produce identical IDs (§4.1 "Serialized programs are portable
    /// between binaries that register the same set of instructions in the
    /// same order").
    pub fn standard() -> Self {
        let mut registry = Registry::new();
        crate::interpreter::register_base_bank(&mut registry);
        #[cfg(feature = "bank-float")]
        crate::float::register_float_bank(&mut registry);
        crate::concurrency::register_concurrency_bank(&mut registry);
        #[cfg(feature = "bank-debug")]
        crate::debug::register_debug_bank(&mut registry);
        registry
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::{ExecutionContext, StepResult};
    use crate::error::VmResult;

    fn noop(ctx: &mut ExecutionContext, _op: crate::opcode::Opcode) -> VmResult<StepResult> {
        Ok(ctx.advance())
    }

    fn other(ctx: &mut ExecutionContext, _op: crate::opcode::Opcode) -> VmResult<StepResult> {
        Ok(ctx.advance())
    }

    #[test]
    fn program_end_occupies_id_zero() {
        let registry = Registry::new();
        assert_eq!(registry.lookup_name(0), Some("program_end"));
        assert_eq!(registry.lookup_fn(0), None);
    }

    #[test]
    fn registration_is_order_stable() {
        let mut registry = Registry::new();
        let a = registry.register_instruction("noop", noop);
        let b = registry.register_instruction("other", other);
        assert_eq!(a, 1);
        assert_eq!(b, 2);
        assert_eq!(registry.lookup_id_by_name("noop"), Some(1));
        assert_eq!(registry.lookup_id_by_fn(other), Some(2));
        assert_eq!(registry.lookup_name(1), Some("noop"));
    }

    #[test]
    fn unknown_id_resolves_to_null() {
        let registry = Registry::new();
        assert_eq!(registry.lookup_fn(999), None);
    }

    #[test]
    fn release_resets_to_sentinel_only() {
        let mut registry = Registry::new();
        registry.register_instruction("noop", noop);
        registry.release();
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.lookup_id_by_name("noop"), None);
    }
}
