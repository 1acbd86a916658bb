//! Out-of-line native declarations and the cache that shares them.
//!
//! Structures, enums, function pointer typedefs and the COM `_Delegate` interface are printed
//! once, ahead of the signature that uses them. Each of them is created on first use through
//! the [`DefinitionCache`] and identified by a [`DefKey`], so every occurrence of the same
//! managed type in the same context refers to the same [`Definition`].
//!
//! # Key Components
//!
//! - [`DefinitionCache`] - Arena of definitions addressed by [`DefHandle`]
//! - [`Definition`] - One out-of-line declaration
//! - [`StructureDefinition`] - Structure and union layout
//! - [`EnumDefinition`], [`FunctionPtrDefinition`], [`DelegateInterfaceDefinition`]
//! - [`DefinitionSet`] - Collects the definitions a signature depends on and orders them
//!
//! # Recursion
//!
//! A definition is reserved in the cache before its body is built. A structure that refers to
//! itself, directly or through other definitions, therefore finds its own handle while it is
//! still being built; [`DefinitionCache::get`] returns `None` for it and its size reads as 0
//! until the build completes.

mod callback;
mod enums;
mod set;
mod structure;

pub use callback::{
    DelegateInterfaceDefinition, FunctionPtrDefinition, DELEGATE_INTERFACE_IID, DELEGATE_INTERFACE_NAME,
};
pub use enums::EnumDefinition;
pub use set::{DefinitionSet, SetItem};
pub use structure::{NativeField, StructureDefinition};

use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
};

use crate::{
    diagnostics::Log,
    marshal::{flags::MarshalFlags, unmanaged::UnmanagedType, universe::TypeRef},
    output::{CodePrinter, LogPrinter, PrintFlags},
};

/// Handle of a definition inside a [`DefinitionCache`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DefHandle(u32);

impl DefHandle {
    /// Position of the definition in creation order.
    #[must_use]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Identity of a definition: the managed type and the flags that shape it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DefKey {
    /// Structure, union or formatted class
    Structure(TypeRef, MarshalFlags),
    /// Enum with its chosen underlying representation
    Enum(TypeRef, MarshalFlags, UnmanagedType),
    /// Delegate marshaled as a function pointer
    FunctionPtr(TypeRef, MarshalFlags),
    /// Delegate marshaled as the COM `_Delegate` interface
    DelegateInterface(MarshalFlags),
}

/// An out-of-line native declaration.
#[derive(Debug)]
pub enum Definition {
    #[allow(missing_docs)]
    Structure(StructureDefinition),
    #[allow(missing_docs)]
    Enum(EnumDefinition),
    #[allow(missing_docs)]
    FunctionPtr(FunctionPtrDefinition),
    #[allow(missing_docs)]
    DelegateInterface(DelegateInterfaceDefinition),
}

impl Definition {
    /// Name of the declared type.
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Definition::Structure(def) => def.name(),
            Definition::Enum(def) => def.name(),
            Definition::FunctionPtr(def) => def.name(),
            Definition::DelegateInterface(def) => def.name(),
        }
    }

    /// Size of the declared type in bytes.
    #[must_use]
    pub fn size(&self) -> u32 {
        match self {
            Definition::Structure(def) => def.size(),
            Definition::Enum(def) => def.size(),
            Definition::FunctionPtr(def) => def.size(),
            Definition::DelegateInterface(def) => def.size(),
        }
    }

    /// Alignment requirement of the declared type.
    #[must_use]
    pub fn alignment(&self) -> u32 {
        match self {
            Definition::Structure(def) => def.alignment(),
            Definition::Enum(def) => def.size(),
            Definition::FunctionPtr(def) => def.size(),
            Definition::DelegateInterface(def) => def.size(),
        }
    }

    /// Diagnostics attached to the definition itself.
    #[must_use]
    pub fn log(&self) -> &Log {
        match self {
            Definition::Structure(def) => def.log(),
            Definition::Enum(def) => def.log(),
            Definition::FunctionPtr(def) => def.log(),
            Definition::DelegateInterface(def) => def.log(),
        }
    }

    /// Returns true if a dependency cycle through this definition can be broken by a forward
    /// declaration.
    #[must_use]
    pub fn supports_forward_declaration(&self) -> bool {
        matches!(self, Definition::Structure(_) | Definition::FunctionPtr(_))
    }

    /// Prints the declaration.
    ///
    /// `forward_declared` tells a function pointer that a forward declaration has already been
    /// emitted, so it must be printed as the wrapper structure that declaration refers to.
    pub fn print_to(
        &self,
        printer: &mut dyn CodePrinter,
        log_printer: &mut dyn LogPrinter,
        flags: PrintFlags,
        forward_declared: bool,
    ) {
        match self {
            Definition::Structure(def) => def.print_to(printer, log_printer, flags),
            Definition::Enum(def) => def.print_to(printer, log_printer, flags),
            Definition::FunctionPtr(def) => {
                def.print_to(printer, log_printer, flags, forward_declared)
            }
            Definition::DelegateInterface(def) => def.print_to(printer, log_printer, flags),
        }
    }

    /// Prints a forward declaration; does nothing for kinds that cannot be forward declared.
    pub fn print_forward_to(&self, printer: &mut dyn CodePrinter, log_printer: &mut dyn LogPrinter) {
        match self {
            Definition::Structure(def) => def.print_forward_to(printer, log_printer),
            Definition::FunctionPtr(def) => def.print_forward_to(printer, log_printer),
            Definition::Enum(_) | Definition::DelegateInterface(_) => {}
        }
    }

    pub(crate) fn collect(&self, cache: &DefinitionCache, set: &mut DefinitionSet, handle: DefHandle) {
        match self {
            Definition::Structure(def) => def.collect(cache, set, handle),
            Definition::FunctionPtr(def) => def.collect(cache, set, handle),
            Definition::Enum(_) | Definition::DelegateInterface(_) => {}
        }
    }
}

#[derive(Debug)]
enum Slot {
    Building(DefKey),
    Ready(Arc<Definition>),
}

/// Arena of shared definitions.
///
/// Definitions are created through [`crate::marshal::Classifier`] and never removed; a handle
/// stays valid for the lifetime of the cache.
#[derive(Debug, Default)]
pub struct DefinitionCache {
    slots: Vec<Slot>,
    index: HashMap<DefKey, DefHandle>,
}

/// A [`DefinitionCache`] shared between threads.
pub type SharedDefinitionCache = Arc<Mutex<DefinitionCache>>;

impl DefinitionCache {
    /// Creates an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty cache guarded by a mutex.
    #[must_use]
    pub fn shared() -> SharedDefinitionCache {
        Arc::new(Mutex::new(Self::new()))
    }

    /// Number of definitions, including those still being built.
    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Returns true if no definition was created yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Looks up the handle registered for `key`.
    #[must_use]
    pub fn lookup(&self, key: &DefKey) -> Option<DefHandle> {
        self.index.get(key).copied()
    }

    /// Returns a finished definition; `None` while it is being built.
    #[must_use]
    pub fn get(&self, handle: DefHandle) -> Option<&Arc<Definition>> {
        match self.slots.get(handle.index()) {
            Some(Slot::Ready(definition)) => Some(definition),
            _ => None,
        }
    }

    /// Returns true if the definition has been reserved but not finished.
    #[must_use]
    pub fn is_building(&self, handle: DefHandle) -> bool {
        matches!(self.slots.get(handle.index()), Some(Slot::Building(_)))
    }

    /// Size of a definition; 0 while it is being built.
    #[must_use]
    pub fn size_of(&self, handle: DefHandle) -> u32 {
        self.get(handle).map_or(0, |definition| definition.size())
    }

    /// Alignment of a definition; 0 while it is being built.
    #[must_use]
    pub fn alignment_of(&self, handle: DefHandle) -> u32 {
        self.get(handle).map_or(0, |definition| definition.alignment())
    }

    /// Iterates over all finished definitions in creation order.
    pub fn iter(&self) -> impl Iterator<Item = (DefHandle, &Arc<Definition>)> {
        self.slots.iter().enumerate().filter_map(|(index, slot)| match slot {
            Slot::Ready(definition) => Some((DefHandle(index as u32), definition)),
            Slot::Building(_) => None,
        })
    }

    pub(crate) fn reserve(&mut self, key: DefKey) -> DefHandle {
        let handle = DefHandle(self.slots.len() as u32);
        self.slots.push(Slot::Building(key));
        self.index.insert(key, handle);
        handle
    }

    pub(crate) fn complete(&mut self, handle: DefHandle, definition: Definition) {
        if let Some(slot) = self.slots.get_mut(handle.index()) {
            log::debug!(
                "definition {} ready ({} bytes)",
                definition.name(),
                definition.size()
            );
            *slot = Slot::Ready(Arc::new(definition));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::marshal::universe::{Builtin, TypeUniverse};

    #[test]
    fn test_reserve_and_complete() {
        let universe = TypeUniverse::new();
        let key = DefKey::DelegateInterface(MarshalFlags::COM_INTEROP);

        let mut cache = DefinitionCache::new();
        assert!(cache.lookup(&key).is_none());

        let handle = cache.reserve(key);
        assert!(cache.is_building(handle));
        assert!(cache.get(handle).is_none());
        assert_eq!(cache.size_of(handle), 0);
        assert_eq!(cache.lookup(&key), Some(handle));

        cache.complete(
            handle,
            Definition::DelegateInterface(DelegateInterfaceDefinition::new(8)),
        );
        assert!(!cache.is_building(handle));
        assert_eq!(cache.size_of(handle), 8);
        assert_eq!(cache.iter().count(), 1);

        let other = DefKey::Structure(universe.builtin(Builtin::Guid), MarshalFlags::empty());
        assert!(cache.lookup(&other).is_none());
    }
}
