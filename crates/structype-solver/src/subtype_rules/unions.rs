//! Union, intersection and type parameter subtype checking.
//!
//! - Union source: every member must be a subtype of the target
//! - Union target: some member must accept the source, with a fallback that
//!   splits discriminated object sources into their variants
//! - Intersection target: the source must satisfy every member
//! - Intersection source: some member suffices, or the members' merged
//!   object view does

use crate::subtype::{SubtypeChecker, SubtypeResult};
use crate::type_resolver::TypeResolver;
use crate::types::*;
use crate::visitor::{is_unit_type, type_param_info, union_list_id};
use tracing::trace;

/// Upper bound on the variants produced when splitting a discriminated
/// object source against a union target.
pub(crate) const MAX_DISCRIMINANT_COMBINATIONS: usize = 25;

impl<'a, R: TypeResolver> SubtypeChecker<'a, R> {
    /// `(A | B | C) <: T` if `A <: T` and `B <: T` and `C <: T`.
    pub(crate) fn check_union_source_subtype(
        &mut self,
        members: TypeListId,
        target: TypeId,
    ) -> SubtypeResult {
        let members = self.interner.type_list(members);
        for &member in members.iter() {
            if !self.check_subtype(member, target).is_true() {
                return SubtypeResult::False;
            }
        }
        SubtypeResult::True
    }

    /// `S <: (A | B | C)` if `S <: A` or `S <: B` or `S <: C`.
    ///
    /// ```typescript
    /// // string <: (string | number)                        ✅
    /// // { kind: "a" | "b" } <: { kind: "a" } | { kind: "b" } ✅ (discriminant split)
    /// ```
    pub(crate) fn check_union_target_subtype(
        &mut self,
        source: TypeId,
        target: TypeId,
        members: TypeListId,
    ) -> SubtypeResult {
        let members = self.interner.type_list(members);
        if members.contains(&source) {
            return SubtypeResult::True;
        }
        for &member in members.iter() {
            if self.check_subtype(source, member).is_true() {
                return SubtypeResult::True;
            }
        }
        SubtypeResult::from_bool(self.check_discriminated_source(source, target))
    }

    /// Split an object source on a property whose type is a union of unit
    /// types, and check every resulting variant against `target`.
    fn check_discriminated_source(&mut self, source: TypeId, target: TypeId) -> bool {
        let Some(TypeData::Object(shape_id)) = self.interner.lookup(source) else {
            return false;
        };
        let shape = self.interner.object_shape(shape_id);
        for (index, prop) in shape.properties.iter().enumerate() {
            let Some(list) = union_list_id(self.interner, prop.type_id) else {
                continue;
            };
            let units = self.interner.type_list(list);
            if units.len() > MAX_DISCRIMINANT_COMBINATIONS
                || !units.iter().all(|unit| is_unit_type(self.interner, *unit))
            {
                continue;
            }
            trace!(
                source = source.0,
                variants = units.len(),
                "splitting discriminated source"
            );
            let related = units.iter().all(|&unit| {
                let mut properties = shape.properties.clone();
                properties[index].type_id = unit;
                let variant = self.interner.object_with_flags(properties, shape.flags);
                self.check_subtype(variant, target).is_true()
            });
            if related {
                return true;
            }
        }
        false
    }

    /// `S <: (A & B)` if `S <: A` and `S <: B`.
    pub(crate) fn check_intersection_target_subtype(
        &mut self,
        source: TypeId,
        members: TypeListId,
    ) -> SubtypeResult {
        let members = self.interner.type_list(members);
        for &member in members.iter() {
            if !self.check_subtype(source, member).is_true() {
                return SubtypeResult::False;
            }
        }
        SubtypeResult::True
    }

    /// `(A & B) <: T` if `A <: T` or `B <: T`, or if the properties of all
    /// members taken together satisfy `T`:
    ///
    /// ```typescript
    /// // { a: string } & { b: number } <: { a: string, b: number }  ✅
    /// ```
    pub(crate) fn check_intersection_source_subtype(
        &mut self,
        source: TypeId,
        members: TypeListId,
        target: TypeId,
    ) -> SubtypeResult {
        let members = self.interner.type_list(members);
        for &member in members.iter() {
            if self.check_subtype(member, target).is_true() {
                return SubtypeResult::True;
            }
        }
        match self.merged_object_view(&members) {
            Some(merged) if merged != source => self.check_subtype(merged, target),
            _ => SubtypeResult::False,
        }
    }

    /// One object type with the properties of every member. `None` unless
    /// every member is (or evaluates to) an object type.
    pub(crate) fn merged_object_view(&mut self, members: &[TypeId]) -> Option<TypeId> {
        let mut merged: Vec<PropertyInfo> = Vec::new();
        for &member in members {
            let resolved = self.resolve_for_relation(member);
            let Some(TypeData::Object(shape_id)) = self.interner.lookup(resolved) else {
                return None;
            };
            for prop in &self.interner.object_shape(shape_id).properties {
                match merged.iter_mut().find(|existing| existing.name == prop.name) {
                    Some(existing) => {
                        existing.type_id =
                            self.interner.intersection2(existing.type_id, prop.type_id);
                        existing.optional &= prop.optional;
                        existing.readonly &= prop.readonly;
                    }
                    None => merged.push(*prop),
                }
            }
        }
        Some(self.interner.object(merged))
    }

    /// - Same type parameter by name: related
    /// - Otherwise the constraint (or `{}` when unconstrained) stands in for
    ///   the parameter; a different type parameter target is only reached
    ///   through the constraint chain (`T extends U`)
    pub(crate) fn check_type_parameter_subtype(
        &mut self,
        s_info: &TypeParamInfo,
        target: TypeId,
    ) -> SubtypeResult {
        let target_param = match self.interner.lookup(target) {
            Some(TypeData::Infer(info)) => Some(info),
            _ => type_param_info(self.interner, target),
        };
        if let Some(t_info) = target_param
            && t_info.name == s_info.name
        {
            return SubtypeResult::True;
        }
        match s_info.constraint {
            Some(constraint) => self.check_subtype(constraint, target),
            None if target_param.is_some() => SubtypeResult::False,
            None => {
                let empty = self.interner.empty_object();
                self.check_subtype(empty, target)
            }
        }
    }
}
