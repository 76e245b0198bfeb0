//! The FFI instruction bank's boundary contract (§1 "OUT of scope (external
//! collaborators)", §6 "External collaborators' contracts").
//!
//! spec.md scopes the FFI engine itself out: "wrapping an external C
//! calling-convention library — only its contract with the core is
//! specified." Mizu ships the contract only — the type vocabulary, the
//! type-stack-then-freeze interface-construction shape, and the loader
//! trait a host implements — not a libffi trampoline.

use crate::error::{VmError, VmResult};

/// The FFI type vocabulary (§6): `{void, pointer, i32, u32, i64, u64, f32, f64}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "strum", derive(strum::Display, strum::EnumIter))]
pub enum Type {
    Void,
    Pointer,
    I32,
    U32,
    I64,
    U64,
    F32,
    F64,
}

/// A call signature under construction: "push-type instructions" build this
/// up one [`Type`] at a time, then freeze it into a call-ready interface
/// (§6 "construct a type list ... freeze into an interface handle").
#[derive(Debug, Default, Clone)]
pub struct Interface {
    return_type: Option<Type>,
    argument_types: Vec<Type>,
}

/// The trampoline backend's maximum supported argument count. A concrete
/// FFI engine would size this to its calling-convention register budget;
/// Mizu's contract just needs a bound to reject against (§7 "Interface
/// construction error ... too many arguments for the trampoline backend").
pub const MAX_ARGUMENTS: usize = 16;

impl Interface {
    /// Start building an interface with the given return type.
    pub fn new(return_type: Type) -> Self {
        Interface { return_type: Some(return_type), argument_types: Vec::new() }
    }

    /// `push_type` (§6): appends one argument type to the in-progress signature.
    pub fn push_type(&mut self, ty: Type) -> VmResult<()> {
        if self.argument_types.len() >= MAX_ARGUMENTS {
            return Err(VmError::TooManyArguments(self.argument_types.len() + 1));
        }
        self.argument_types.push(ty);
        Ok(())
    }

    /// `freeze` (§6): validates the interface is callable. An interface
    /// with no return type set has an empty type stack (§7 "empty type stack").
    pub fn freeze(self) -> VmResult<FrozenInterface> {
        let return_type = self.return_type.ok_or(VmError::EmptyTypeStack)?;
        Ok(FrozenInterface { return_type, argument_types: self.argument_types })
    }
}

/// A call-ready signature, produced by [`Interface::freeze`]. A concrete FFI
/// engine would pair this with a function pointer and a register slice to
/// perform the call; that call itself is out of scope (§1).
#[derive(Debug, Clone)]
pub struct FrozenInterface {
    pub return_type: Type,
    pub argument_types: Vec<Type>,
}

/// A loaded shared library handle, opaque to the VM core — only the loader
/// implementation knows how to resolve it back to host symbols.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LibraryHandle(pub u64);

/// The dynamic-library loader's contract (§6 "External collaborators'
/// contracts"): three primitives a host embeds to back the `load_shared`/
/// `lookup`/`close` instructions a concrete FFI bank would expose. Mizu's
/// core depends only on this trait, never on a specific loader
/// implementation (`libloading`, `dlopen`, etc.) — that stays a host concern.
pub trait DynamicLibrary {
    /// `load_shared(path, append_platform_decorator)` (§6). Per §7
    /// "Propagation policy: Optional banks may catch internally (e.g., FFI
    /// `load_library` tries the path without then with a platform
    /// decorator)", a real implementation retries with a decorated path
    /// (e.g. `lib{name}.so`) before surfacing [`VmError::LibraryLoad`].
    fn load_shared(&mut self, path: &str, append_platform_decorator: bool) -> VmResult<LibraryHandle>;

    /// `lookup(name, handle)` (§6): resolves a symbol to a raw function
    /// pointer, represented here as its numeric address — the actual call
    /// ABI is out of scope.
    fn lookup(&self, handle: LibraryHandle, name: &str) -> VmResult<usize>;

    /// `close(handle)` (§6): releases the library.
    fn close(&mut self, handle: LibraryHandle) -> VmResult<()>;
}
