//! Resolution of named definitions.
//!
//! The solver never owns the definitions it relates. Whenever it meets a
//! `Lazy(DefId)` it asks a [`TypeResolver`] for the body, which keeps the
//! relation and evaluation code independent of where definitions live.

use crate::def::DefId;
use crate::intern::TypeInterner;
use crate::query_cache::QueryCache;
use crate::types::{TypeId, TypeParamInfo};
use structype_common::Atom;

pub trait TypeResolver {
    /// Body of a definition, or `None` if unknown or not yet filled in.
    fn resolve_lazy(&self, def_id: DefId, interner: &TypeInterner) -> Option<TypeId>;

    /// Declared type parameters of a generic definition.
    fn get_lazy_type_params(&self, _def_id: DefId) -> Option<Vec<TypeParamInfo>> {
        None
    }

    /// Display name, used by the formatter.
    fn def_name(&self, _def_id: DefId) -> Option<Atom> {
        None
    }

    /// Shared memo tables, if the resolver carries them.
    fn query_cache(&self) -> Option<&QueryCache> {
        None
    }
}

impl<T: TypeResolver + ?Sized> TypeResolver for &T {
    fn resolve_lazy(&self, def_id: DefId, interner: &TypeInterner) -> Option<TypeId> {
        (**self).resolve_lazy(def_id, interner)
    }

    fn get_lazy_type_params(&self, def_id: DefId) -> Option<Vec<TypeParamInfo>> {
        (**self).get_lazy_type_params(def_id)
    }

    fn def_name(&self, def_id: DefId) -> Option<Atom> {
        (**self).def_name(def_id)
    }

    fn query_cache(&self) -> Option<&QueryCache> {
        (**self).query_cache()
    }
}

/// Resolver with no definitions. Every `Lazy` stays opaque.
#[derive(Copy, Clone, Debug, Default)]
pub struct NoopResolver;

impl TypeResolver for NoopResolver {
    fn resolve_lazy(&self, _def_id: DefId, _interner: &TypeInterner) -> Option<TypeId> {
        None
    }
}
