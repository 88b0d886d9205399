//! The definitions environment.
//!
//! `TypeEnvironment` pairs a [`DefinitionStore`] with a [`QueryCache`] and is
//! the resolver most callers hand to the checkers. It is `Send + Sync`.

use crate::def::{DefId, DefinitionInfo, DefinitionStore};
use crate::intern::TypeInterner;
use crate::query_cache::QueryCache;
use crate::type_resolver::TypeResolver;
use crate::types::{TypeId, TypeParamInfo};
use structype_common::Atom;

#[derive(Default)]
pub struct TypeEnvironment {
    definitions: DefinitionStore,
    cache: QueryCache,
}

impl TypeEnvironment {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn definitions(&self) -> &DefinitionStore {
        &self.definitions
    }

    pub fn cache(&self) -> &QueryCache {
        &self.cache
    }

    /// `type name<params> = body`
    pub fn define_alias(
        &self,
        interner: &TypeInterner,
        name: &str,
        type_params: Vec<TypeParamInfo>,
        body: TypeId,
    ) -> DefId {
        let name = interner.intern_string(name);
        self.definitions
            .register(DefinitionInfo::type_alias(name, type_params, body))
    }

    /// `interface name<params> body`
    pub fn define_interface(
        &self,
        interner: &TypeInterner,
        name: &str,
        type_params: Vec<TypeParamInfo>,
        body: TypeId,
    ) -> DefId {
        let name = interner.intern_string(name);
        self.definitions
            .register(DefinitionInfo::interface(name, type_params, body))
    }

    /// Reserve an id for a definition whose body refers to itself.
    pub fn declare(
        &self,
        interner: &TypeInterner,
        name: &str,
        type_params: Vec<TypeParamInfo>,
    ) -> DefId {
        let name = interner.intern_string(name);
        self.definitions.declare(name, type_params)
    }

    /// Complete a declared definition. Memoised expansions are dropped since
    /// they may have been computed against the missing body.
    pub fn set_body(&self, def_id: DefId, body: TypeId) -> bool {
        let updated = self.definitions.set_body(def_id, body);
        if updated {
            self.cache.clear();
        }
        updated
    }
}

impl TypeResolver for TypeEnvironment {
    fn resolve_lazy(&self, def_id: DefId, _interner: &TypeInterner) -> Option<TypeId> {
        self.definitions.body(def_id)
    }

    fn get_lazy_type_params(&self, def_id: DefId) -> Option<Vec<TypeParamInfo>> {
        self.definitions.type_params(def_id)
    }

    fn def_name(&self, def_id: DefId) -> Option<Atom> {
        self.definitions.name(def_id)
    }

    fn query_cache(&self) -> Option<&QueryCache> {
        Some(&self.cache)
    }
}
