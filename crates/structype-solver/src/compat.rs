//! Assignability layer.
//!
//! `CompatChecker` answers "may a value of type S be stored where T is
//! expected". That is the structural subtype relation plus the excess
//! property check, which only applies at the point where a fresh object
//! literal meets its target:
//!
//! ```typescript
//! let p: { x: number } = { x: 1, y: 2 };   // ❌ 'y' does not exist in type
//! const tmp = { x: 1, y: 2 };
//! let q: { x: number } = tmp;              // ✅ widened, width subtyping
//! ```

use crate::diagnostics::{SubtypeFailureReason, SubtypeTracer};
use crate::errors::IncompatibleTypesError;
use crate::freshness::is_fresh_object_type;
use crate::intern::TypeInterner;
use crate::subtype::{NOOP_RESOLVER, SubtypeChecker};
use crate::type_resolver::{NoopResolver, TypeResolver};
use crate::types::*;
use crate::visitor::union_members;
use rustc_hash::FxHashMap;
use structype_common::{Atom, CheckerOptions};
use tracing::{Level, span, trace};

pub struct CompatChecker<'a, R: TypeResolver = NoopResolver> {
    interner: &'a TypeInterner,
    resolver: &'a R,
    subtype: SubtypeChecker<'a, R>,
    cache: FxHashMap<(TypeId, TypeId), bool>,
}

impl<'a> CompatChecker<'a, NoopResolver> {
    pub fn new(interner: &'a TypeInterner) -> Self {
        Self::with_resolver(interner, &NOOP_RESOLVER)
    }
}

impl<'a, R: TypeResolver> CompatChecker<'a, R> {
    pub fn with_resolver(interner: &'a TypeInterner, resolver: &'a R) -> Self {
        Self {
            interner,
            resolver,
            subtype: SubtypeChecker::with_resolver(interner, resolver),
            cache: FxHashMap::default(),
        }
    }

    pub fn with_options(mut self, options: &CheckerOptions) -> Self {
        self.apply_options(options);
        self
    }

    pub fn apply_options(&mut self, options: &CheckerOptions) {
        if self.subtype.options() != *options {
            self.subtype.apply_options(options);
            self.cache.clear();
        }
    }

    pub fn set_strict_null_checks(&mut self, strict: bool) {
        self.subtype.set_strict_null_checks(strict);
        self.cache.clear();
    }

    pub fn set_strict_function_types(&mut self, strict: bool) {
        self.subtype.set_strict_function_types(strict);
        self.cache.clear();
    }

    pub fn set_exact_optional_property_types(&mut self, exact: bool) {
        self.subtype.set_exact_optional_property_types(exact);
        self.cache.clear();
    }

    pub fn options(&self) -> CheckerOptions {
        self.subtype.options()
    }

    /// Whether `source` is assignable to `target`.
    pub fn is_assignable(&mut self, source: TypeId, target: TypeId) -> bool {
        if source == target {
            return true;
        }
        let key = (source, target);
        if let Some(&cached) = self.cache.get(&key) {
            return cached;
        }
        let result = self.find_excess_property(source, target).is_none()
            && self.subtype.is_subtype_of(source, target);
        if !self.subtype.depth_exceeded() {
            self.cache.insert(key, result);
        }
        result
    }

    /// Like [`is_assignable`](Self::is_assignable), reporting the first
    /// failure to `tracer`.
    pub fn is_assignable_with_tracer<T: SubtypeTracer>(
        &mut self,
        source: TypeId,
        target: TypeId,
        tracer: &mut T,
    ) -> bool {
        if self.is_assignable(source, target) {
            return true;
        }
        tracer.on_mismatch(|| {
            self.explain_failure(source, target)
                .unwrap_or(SubtypeFailureReason::TypeMismatch {
                    source_type: source,
                    target_type: target,
                })
        })
    }

    /// `Ok` when `source` is assignable to `target`, otherwise the error a
    /// rejected assignment reports.
    pub fn check_assignable(
        &mut self,
        source: TypeId,
        target: TypeId,
    ) -> Result<(), IncompatibleTypesError> {
        let _span =
            span!(Level::DEBUG, "check_assignable", source = source.0, target = target.0).entered();
        if self.is_assignable(source, target) {
            return Ok(());
        }
        let reason = self.explain_failure(source, target);
        Err(IncompatibleTypesError::new(
            self.interner,
            Some(self.resolver as &dyn TypeResolver),
            source,
            target,
            reason,
        ))
    }

    /// Comparability (`===`, `case` labels): assignable in either direction.
    pub fn is_comparable(&mut self, a: TypeId, b: TypeId) -> bool {
        self.is_assignable(a, b) || self.is_assignable(b, a)
    }

    pub fn explain_failure(
        &mut self,
        source: TypeId,
        target: TypeId,
    ) -> Option<SubtypeFailureReason> {
        if let Some(property_name) = self.find_excess_property(source, target) {
            return Some(SubtypeFailureReason::ExcessProperty {
                property_name,
                target_type: target,
            });
        }
        self.subtype.explain_failure(source, target)
    }

    /// First property of the fresh object literal `source` that no object
    /// in `target` declares. Nested fresh literals are checked against the
    /// matching target property.
    pub fn find_excess_property(&mut self, source: TypeId, target: TypeId) -> Option<Atom> {
        if !is_fresh_object_type(self.interner, source) {
            return None;
        }
        let TypeData::Object(shape_id) = self.interner.lookup(source)? else {
            return None;
        };
        let source_shape = self.interner.object_shape(shape_id);

        let targets = self.target_shapes(target)?;
        // `{}` and `object`-like targets accept any extra property.
        if targets.iter().any(|shape| shape.properties.is_empty()) {
            return None;
        }

        for prop in &source_shape.properties {
            let declared: Vec<TypeId> = targets
                .iter()
                .filter_map(|shape| shape.find(prop.name))
                .map(|target_prop| target_prop.type_id)
                .collect();
            if declared.is_empty() {
                trace!(
                    property = %self.interner.resolve_atom(prop.name),
                    "excess property in fresh object literal"
                );
                return Some(prop.name);
            }
            if is_fresh_object_type(self.interner, prop.type_id) {
                let nested_target = self.interner.union(declared);
                if let Some(nested) = self.find_excess_property(prop.type_id, nested_target) {
                    return Some(nested);
                }
            }
        }
        None
    }

    /// Object shapes a fresh literal is checked against: the target itself,
    /// the object members of a union target, or the merged view of an
    /// intersection. `None` when the target is not object-like at all.
    fn target_shapes(&mut self, target: TypeId) -> Option<Vec<ObjectShape>> {
        let target = self.subtype.resolve_for_relation(target);
        let mut shapes = Vec::new();
        for member in union_members(self.interner, target) {
            let member = self.subtype.resolve_for_relation(member);
            match self.interner.lookup(member) {
                Some(TypeData::Object(shape_id)) => {
                    shapes.push((*self.interner.object_shape(shape_id)).clone());
                }
                Some(TypeData::Intersection(list_id)) => {
                    let members = self.interner.type_list(list_id).to_vec();
                    let merged = self.subtype.merged_object_view(&members)?;
                    if let Some(TypeData::Object(shape_id)) = self.interner.lookup(merged) {
                        shapes.push((*self.interner.object_shape(shape_id)).clone());
                    }
                }
                // Nullish members don't take part in the check.
                _ if member.is_nullish() || member == TypeId::VOID => {}
                // Primitives and literals cannot hold an object literal.
                Some(TypeData::Intrinsic(kind)) if is_primitive_kind(kind) => {}
                Some(TypeData::Literal(_)) => {}
                // Type parameters, `object`, arrays, functions, ...: no check.
                _ => return None,
            }
        }
        if shapes.is_empty() {
            return None;
        }
        Some(shapes)
    }
}

fn is_primitive_kind(kind: IntrinsicKind) -> bool {
    matches!(
        kind,
        IntrinsicKind::String
            | IntrinsicKind::Number
            | IntrinsicKind::Boolean
            | IntrinsicKind::Bigint
            | IntrinsicKind::Symbol
    )
}

/// One-shot assignability check with default options.
pub fn is_assignable(interner: &TypeInterner, source: TypeId, target: TypeId) -> bool {
    CompatChecker::new(interner).is_assignable(source, target)
}

#[cfg(test)]
#[path = "../tests/compat_tests.rs"]
mod tests;
