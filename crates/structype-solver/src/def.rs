//! Definition identifiers and storage.
//!
//! Named type definitions (aliases and interfaces) are what make recursive
//! descriptors possible: a type refers to a definition through
//! `TypeData::Lazy(DefId)` instead of inlining its body, and the body is
//! looked up only when a relation or evaluation needs it.
//!
//! A definition can be declared before its body exists so that the body may
//! mention the definition itself:
//!
//! ```ignore
//! let list = store.declare(interner.intern_string("List"), vec![t_param]);
//! let body = /* { value: T; next: List<T> } | undefined */;
//! store.set_body(list, body);
//! ```

use crate::types::{TypeId, TypeParamInfo};
use dashmap::DashMap;
use std::sync::atomic::{AtomicU32, Ordering};
use structype_common::Atom;
use tracing::trace;

// =============================================================================
// DefId
// =============================================================================

/// Identifier of a named type definition.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DefId(pub u32);

impl DefId {
    /// Sentinel value for invalid `DefId`.
    pub const INVALID: Self = Self(0);

    /// First valid `DefId`.
    pub const FIRST_VALID: u32 = 1;

    pub const fn is_valid(self) -> bool {
        self.0 >= Self::FIRST_VALID
    }
}

// =============================================================================
// DefinitionInfo
// =============================================================================

/// Kind of type definition. Only used for diagnostics; both kinds are
/// compared structurally.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum DefKind {
    /// `type Foo<T> = ...`
    TypeAlias,
    /// `interface Foo<T> { ... }`
    Interface,
}

#[derive(Clone, Debug)]
pub struct DefinitionInfo {
    pub kind: DefKind,
    pub name: Atom,
    pub type_params: Vec<TypeParamInfo>,
    /// `None` while the definition is declared but not yet filled in.
    pub body: Option<TypeId>,
}

impl DefinitionInfo {
    pub const fn type_alias(name: Atom, type_params: Vec<TypeParamInfo>, body: TypeId) -> Self {
        Self {
            kind: DefKind::TypeAlias,
            name,
            type_params,
            body: Some(body),
        }
    }

    pub const fn interface(name: Atom, type_params: Vec<TypeParamInfo>, body: TypeId) -> Self {
        Self {
            kind: DefKind::Interface,
            name,
            type_params,
            body: Some(body),
        }
    }
}

// =============================================================================
// DefinitionStore
// =============================================================================

/// Thread-safe storage for type definitions.
pub struct DefinitionStore {
    definitions: DashMap<DefId, DefinitionInfo>,
    next_id: AtomicU32,
}

impl Default for DefinitionStore {
    fn default() -> Self {
        Self::new()
    }
}

impl DefinitionStore {
    pub fn new() -> Self {
        Self {
            definitions: DashMap::new(),
            next_id: AtomicU32::new(DefId::FIRST_VALID),
        }
    }

    fn allocate(&self) -> DefId {
        DefId(self.next_id.fetch_add(1, Ordering::SeqCst))
    }

    /// Register a complete definition.
    pub fn register(&self, info: DefinitionInfo) -> DefId {
        let id = self.allocate();
        trace!(def_id = id.0, kind = ?info.kind, "DefinitionStore::register");
        self.definitions.insert(id, info);
        id
    }

    /// Declare a type alias whose body will be supplied later.
    pub fn declare(&self, name: Atom, type_params: Vec<TypeParamInfo>) -> DefId {
        let id = self.allocate();
        trace!(def_id = id.0, "DefinitionStore::declare");
        self.definitions.insert(
            id,
            DefinitionInfo {
                kind: DefKind::TypeAlias,
                name,
                type_params,
                body: None,
            },
        );
        id
    }

    /// Fill in the body of a declared definition. Returns `false` for an
    /// unknown id.
    pub fn set_body(&self, def_id: DefId, body: TypeId) -> bool {
        match self.definitions.get_mut(&def_id) {
            Some(mut info) => {
                info.body = Some(body);
                true
            }
            None => false,
        }
    }

    pub fn get(&self, def_id: DefId) -> Option<DefinitionInfo> {
        self.definitions.get(&def_id).map(|info| info.clone())
    }

    pub fn body(&self, def_id: DefId) -> Option<TypeId> {
        self.definitions.get(&def_id).and_then(|info| info.body)
    }

    pub fn type_params(&self, def_id: DefId) -> Option<Vec<TypeParamInfo>> {
        self.definitions
            .get(&def_id)
            .map(|info| info.type_params.clone())
    }

    pub fn name(&self, def_id: DefId) -> Option<Atom> {
        self.definitions.get(&def_id).map(|info| info.name)
    }

    /// Find a definition by name. Linear; meant for tests and diagnostics.
    pub fn find_by_name(&self, name: Atom) -> Option<DefId> {
        self.definitions
            .iter()
            .find(|entry| entry.value().name == name)
            .map(|entry| *entry.key())
    }

    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }
}

#[cfg(test)]
#[path = "../tests/def_tests.rs"]
mod tests;
