//! Object type subtype checking.
//!
//! Objects relate by width: the source may have more properties than the
//! target, but must supply every required target property with a related
//! type. `readonly` is a property of the reference, not of the value, so it
//! never affects the relation in either direction.

use crate::subtype::{SubtypeChecker, SubtypeResult};
use crate::type_resolver::TypeResolver;
use crate::types::*;

impl<'a, R: TypeResolver> SubtypeChecker<'a, R> {
    /// Check object subtyping.
    ///
    /// `source_is_object` is false when `source` is the apparent shape of a
    /// primitive, array or function. Such sources never count as the empty
    /// object type for the weak type rule.
    ///
    /// ## Examples:
    /// - `{ a: 1, b: string }` ≤ `{ a: number }` ✅ (width)
    /// - `{ a?: number }` ≤ `{ a: number }` ❌ (optional to required)
    /// - `{ b: 1 }` ≤ `{ a?: number }` ❌ (weak target, nothing in common)
    /// - `{}` ≤ `{ a?: number }` ✅
    pub(crate) fn check_object_subtype(
        &mut self,
        source: &ObjectShape,
        source_is_object: bool,
        target: &ObjectShape,
    ) -> SubtypeResult {
        if self.violates_weak_type(source, source_is_object, target) {
            return SubtypeResult::False;
        }

        for t_prop in &target.properties {
            let result = match source.find(t_prop.name) {
                Some(s_prop) => self.check_property_compatibility(s_prop, t_prop),
                None if t_prop.optional => SubtypeResult::True,
                None => SubtypeResult::False,
            };
            if !result.is_true() {
                return SubtypeResult::False;
            }
        }

        SubtypeResult::True
    }

    /// Weak type detection: a target whose properties are all optional only
    /// accepts sources that share at least one property with it (or are
    /// themselves `{}`).
    pub(crate) fn violates_weak_type(
        &self,
        source: &ObjectShape,
        source_is_object: bool,
        target: &ObjectShape,
    ) -> bool {
        if !target.is_weak() {
            return false;
        }
        if source_is_object && source.properties.is_empty() {
            return false;
        }
        !self.has_common_property(source, target)
    }

    pub(crate) fn has_common_property(&self, source: &ObjectShape, target: &ObjectShape) -> bool {
        target
            .properties
            .iter()
            .any(|t_prop| source.find(t_prop.name).is_some())
    }

    /// ## Rules:
    /// 1. Optional in source can't satisfy required in target
    ///    - `{ x?: number }` ≤ `{ x: number }` ❌
    ///    - `{ x: number }` ≤ `{ x?: number }` ✅
    /// 2. Types are compared covariantly, with `undefined` added to optional
    ///    properties unless `exactOptionalPropertyTypes` is on.
    pub(crate) fn check_property_compatibility(
        &mut self,
        source: &PropertyInfo,
        target: &PropertyInfo,
    ) -> SubtypeResult {
        if source.optional && !target.optional {
            return SubtypeResult::False;
        }
        let source_type = self.optional_property_type(source);
        let target_type = self.optional_property_type(target);
        self.check_subtype(source_type, target_type)
    }

    /// Read type of a property: optional properties may also be `undefined`
    /// unless `exactOptionalPropertyTypes` is enabled.
    pub(crate) fn optional_property_type(&self, prop: &PropertyInfo) -> TypeId {
        if prop.optional && !self.exact_optional_property_types {
            self.interner.union2(prop.type_id, TypeId::UNDEFINED)
        } else {
            prop.type_id
        }
    }
}
