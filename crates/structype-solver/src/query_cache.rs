//! Shared memo tables.
//!
//! Checkers and evaluators are cheap, per-query values. Anything worth
//! remembering across queries lives here, behind `DashMap`s, so that threads
//! sharing one [`TypeEnvironment`](crate::TypeEnvironment) also share the
//! work already done.
//!
//! Only definitive answers are stored. A relation proved `true` while
//! assuming some in-progress pair was related is provisional and must not be
//! cached; the subtype checker takes care of that before calling
//! [`QueryCache::insert_relation`].

use crate::def::DefId;
use crate::types::TypeId;
use dashmap::DashMap;
use smallvec::SmallVec;
use std::sync::atomic::{AtomicU64, Ordering};
use structype_common::CheckerOptions;

/// `(definition, arguments)` of a generic instantiation.
pub type ApplicationKey = (DefId, SmallVec<[TypeId; 4]>);

/// `(source, target, option bits)`.
pub type RelationKey = (TypeId, TypeId, u8);

/// `(type, option bits)`. Conditional types consult the relation, so their
/// evaluation depends on the flags too.
pub type EvaluationKey = (TypeId, u8);

/// Pack the flags that change relation answers into a cache key component.
pub fn option_bits(options: &CheckerOptions) -> u8 {
    u8::from(options.strict_null_checks)
        | (u8::from(options.strict_function_types) << 1)
        | (u8::from(options.exact_optional_property_types) << 2)
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct QueryCacheStats {
    pub hits: u64,
    pub misses: u64,
    pub applications: usize,
    pub evaluations: usize,
    pub relations: usize,
}

#[derive(Default)]
pub struct QueryCache {
    applications: DashMap<ApplicationKey, TypeId>,
    evaluations: DashMap<EvaluationKey, TypeId>,
    relations: DashMap<RelationKey, bool>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl std::fmt::Debug for QueryCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueryCache")
            .field("stats", &self.stats())
            .finish()
    }
}

impl QueryCache {
    pub fn new() -> Self {
        Self::default()
    }

    fn record<T>(&self, found: Option<T>) -> Option<T> {
        let counter = if found.is_some() {
            &self.hits
        } else {
            &self.misses
        };
        counter.fetch_add(1, Ordering::Relaxed);
        found
    }

    pub fn lookup_application(&self, key: &ApplicationKey) -> Option<TypeId> {
        self.record(self.applications.get(key).map(|entry| *entry))
    }

    /// First writer wins; all writers compute the same interned id anyway.
    pub fn insert_application(&self, key: ApplicationKey, expanded: TypeId) -> TypeId {
        *self.applications.entry(key).or_insert(expanded)
    }

    pub fn lookup_evaluation(&self, key: &EvaluationKey) -> Option<TypeId> {
        self.record(self.evaluations.get(key).map(|entry| *entry))
    }

    pub fn insert_evaluation(&self, key: EvaluationKey, evaluated: TypeId) -> TypeId {
        *self.evaluations.entry(key).or_insert(evaluated)
    }

    pub fn lookup_relation(&self, key: &RelationKey) -> Option<bool> {
        self.record(self.relations.get(key).map(|entry| *entry))
    }

    pub fn insert_relation(&self, key: RelationKey, related: bool) {
        self.relations.insert(key, related);
    }

    pub fn stats(&self) -> QueryCacheStats {
        QueryCacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            applications: self.applications.len(),
            evaluations: self.evaluations.len(),
            relations: self.relations.len(),
        }
    }

    pub fn clear(&self) {
        self.applications.clear();
        self.evaluations.clear();
        self.relations.clear();
        self.hits.store(0, Ordering::Relaxed);
        self.misses.store(0, Ordering::Relaxed);
    }
}
