//! Failure explanations for subtype checks.
//!
//! This is the slow path: it runs only after a check has already failed and
//! walks the same rules again, this time recording which component was
//! responsible. The result feeds `IncompatibleTypesError` and tracers.

use crate::diagnostics::SubtypeFailureReason;
use crate::subtype::SubtypeChecker;
use crate::subtype_rules::functions::ParameterList;
use crate::type_resolver::TypeResolver;
use crate::types::*;
use crate::visitor::{intersection_list_id, union_list_id};

impl<'a, R: TypeResolver> SubtypeChecker<'a, R> {
    /// Explain why `source` is not assignable to `target`.
    ///
    /// Returns `None` when the types are in fact related.
    pub fn explain_failure(
        &mut self,
        source: TypeId,
        target: TypeId,
    ) -> Option<SubtypeFailureReason> {
        if self.check_subtype(source, target).is_true() {
            return None;
        }
        if self.depth_exceeded() {
            return Some(SubtypeFailureReason::RecursionLimitExceeded);
        }
        let source = match self.try_resolve_for_relation(source) {
            Ok(resolved) => resolved,
            Err(error) => {
                return Some(SubtypeFailureReason::EvaluationFailed {
                    type_id: source,
                    error: Box::new(error),
                });
            }
        };
        let target = match self.try_resolve_for_relation(target) {
            Ok(resolved) => resolved,
            Err(error) => {
                return Some(SubtypeFailureReason::EvaluationFailed {
                    type_id: target,
                    error: Box::new(error),
                });
            }
        };
        Some(
            self.explain_failure_inner(source, target)
                .unwrap_or(SubtypeFailureReason::TypeMismatch {
                    source_type: source,
                    target_type: target,
                }),
        )
    }

    fn explain_failure_inner(
        &mut self,
        source: TypeId,
        target: TypeId,
    ) -> Option<SubtypeFailureReason> {
        if let Some(members) = union_list_id(self.interner, source) {
            let members = self.interner.type_list(members);
            let failing = members
                .iter()
                .copied()
                .find(|member| !self.is_subtype_of(*member, target))?;
            return self.explain_failure(failing, target);
        }
        if let Some(members) = union_list_id(self.interner, target) {
            return Some(SubtypeFailureReason::NoUnionMemberMatches {
                source_type: source,
                target_union_members: self.interner.type_list(members).to_vec(),
            });
        }
        if let Some(members) = intersection_list_id(self.interner, target) {
            let members = self.interner.type_list(members);
            let member = members
                .iter()
                .copied()
                .find(|member| !self.is_subtype_of(source, *member))?;
            let nested = self.explain_failure(source, member);
            return Some(SubtypeFailureReason::IntersectionMemberMismatch {
                source_type: source,
                member,
                nested_reason: nested.map(Box::new),
            });
        }

        let s_data = self.interner.lookup(source)?;
        let t_data = self.interner.lookup(target)?;
        match (s_data, t_data) {
            (TypeData::Object(s_shape), TypeData::Object(t_shape)) => {
                let s_shape = self.interner.object_shape(s_shape);
                let t_shape = self.interner.object_shape(t_shape);
                self.explain_object_failure(source, &s_shape, true, target, &t_shape)
            }
            (TypeData::Array(s_elem), TypeData::Array(t_elem)) => {
                let nested = self.explain_failure(s_elem, t_elem);
                Some(SubtypeFailureReason::ArrayElementMismatch {
                    source_element: s_elem,
                    target_element: t_elem,
                    nested_reason: nested.map(Box::new),
                })
            }
            (TypeData::Tuple(s_list), TypeData::Tuple(t_list)) => {
                let s_elems = self.interner.tuple_list(s_list);
                let t_elems = self.interner.tuple_list(t_list);
                self.explain_tuple_failure(&s_elems, &t_elems)
            }
            (TypeData::Tuple(s_list), TypeData::Array(t_elem)) => {
                let s_elems = self.interner.tuple_list(s_list);
                for (index, elem) in s_elems.iter().enumerate() {
                    let element = if elem.rest {
                        self.interner.rest_element_type(elem.type_id)
                    } else {
                        elem.type_id
                    };
                    if !self.is_subtype_of(element, t_elem) {
                        let nested = self.explain_failure(element, t_elem);
                        return Some(SubtypeFailureReason::TupleElementMismatch {
                            index,
                            source_element: element,
                            target_element: t_elem,
                            nested_reason: nested.map(Box::new),
                        });
                    }
                }
                None
            }
            (TypeData::ReadonlyType(_), TypeData::Array(_) | TypeData::Tuple(_)) => {
                Some(SubtypeFailureReason::ReadonlyToMutable {
                    source_type: source,
                    target_type: target,
                })
            }
            (TypeData::ReadonlyType(s_inner), TypeData::ReadonlyType(t_inner)) => {
                self.explain_failure(s_inner, t_inner)
            }
            (TypeData::Function(s_fn), TypeData::Function(t_fn)) => {
                let s_shape = self.interner.function_shape(s_fn);
                let t_shape = self.interner.function_shape(t_fn);
                self.explain_function_failure(source, &s_shape, target, &t_shape)
            }
            (TypeData::Literal(_), TypeData::Literal(_) | TypeData::Intrinsic(_)) => {
                Some(SubtypeFailureReason::LiteralTypeMismatch {
                    source_type: source,
                    target_type: target,
                })
            }
            (_, TypeData::Object(t_shape)) => {
                let apparent = self.apparent_shape(source)?;
                let t_shape = self.interner.object_shape(t_shape);
                self.explain_object_failure(source, &apparent, false, target, &t_shape)
            }
            _ => None,
        }
    }

    fn explain_object_failure(
        &mut self,
        source: TypeId,
        s_shape: &ObjectShape,
        source_is_object: bool,
        target: TypeId,
        t_shape: &ObjectShape,
    ) -> Option<SubtypeFailureReason> {
        if self.violates_weak_type(s_shape, source_is_object, t_shape) {
            return Some(SubtypeFailureReason::NoCommonProperties {
                source_type: source,
                target_type: target,
            });
        }

        // Missing properties are reported before type mismatches.
        let missing = t_shape.properties.iter().find(|t_prop| {
            !t_prop.optional && s_shape.find(t_prop.name).is_none_or(|s_prop| s_prop.optional)
        });
        if let Some(t_prop) = missing {
            return Some(SubtypeFailureReason::MissingProperty {
                property_name: t_prop.name,
                source_type: source,
                target_type: target,
            });
        }

        for t_prop in &t_shape.properties {
            let Some(s_prop) = s_shape.find(t_prop.name) else {
                continue;
            };
            let source_type = self.optional_property_type(s_prop);
            let target_type = self.optional_property_type(t_prop);
            if !self.is_subtype_of(source_type, target_type) {
                let nested = self.explain_failure(source_type, target_type);
                return Some(SubtypeFailureReason::PropertyTypeMismatch {
                    property_name: t_prop.name,
                    source_property_type: source_type,
                    target_property_type: target_type,
                    nested_reason: nested.map(Box::new),
                });
            }
        }
        None
    }

    fn explain_function_failure(
        &mut self,
        source: TypeId,
        s_shape: &FunctionShape,
        target: TypeId,
        t_shape: &FunctionShape,
    ) -> Option<SubtypeFailureReason> {
        if s_shape.is_constructor != t_shape.is_constructor {
            return Some(SubtypeFailureReason::ConstructorMismatch {
                source_type: source,
                target_type: target,
            });
        }
        if t_shape.return_type != TypeId::VOID
            && !self.is_subtype_of(s_shape.return_type, t_shape.return_type)
        {
            let nested = self.explain_failure(s_shape.return_type, t_shape.return_type);
            return Some(SubtypeFailureReason::ReturnTypeMismatch {
                source_return: s_shape.return_type,
                target_return: t_shape.return_type,
                nested_reason: nested.map(Box::new),
            });
        }
        let s_params = ParameterList::of(self.interner, s_shape);
        let t_params = ParameterList::of(self.interner, t_shape);
        if self.has_too_many_parameters(&s_params, &t_params) {
            return Some(SubtypeFailureReason::TooManyParameters {
                source_count: s_params.required_count(),
                target_count: t_params.positions.len(),
            });
        }
        let positions = s_params.positions.len().max(t_params.positions.len());
        for index in 0..positions {
            let (Some(s_param), Some(t_param)) = (s_params.type_at(index), t_params.type_at(index))
            else {
                continue;
            };
            if !self.are_parameters_compatible(s_param, t_param) {
                return Some(SubtypeFailureReason::ParameterTypeMismatch {
                    param_index: index,
                    source_param: s_param,
                    target_param: t_param,
                });
            }
        }
        if let (Some(s_rest), Some(t_rest)) = (s_params.variadic, t_params.variadic) {
            if !self.are_parameters_compatible(s_rest, t_rest) {
                return Some(SubtypeFailureReason::ParameterTypeMismatch {
                    param_index: positions,
                    source_param: s_rest,
                    target_param: t_rest,
                });
            }
        }
        None
    }

    fn explain_tuple_failure(
        &mut self,
        source: &[TupleElement],
        target: &[TupleElement],
    ) -> Option<SubtypeFailureReason> {
        let arity_mismatch = SubtypeFailureReason::TupleArityMismatch {
            source_count: source.len(),
            target_count: target.len(),
        };
        let source_required = source.iter().filter(|e| !e.optional && !e.rest).count();
        let target_required = target.iter().filter(|e| !e.optional && !e.rest).count();
        let target_open = target.iter().any(|e| e.rest);
        if source_required < target_required
            || (!target_open && (source.len() > target.len() || source.iter().any(|e| e.rest)))
        {
            return Some(arity_mismatch);
        }

        for (index, (s_elem, t_elem)) in source.iter().zip(target.iter()).enumerate() {
            if s_elem.rest || t_elem.rest {
                break;
            }
            if !self.is_subtype_of(s_elem.type_id, t_elem.type_id) {
                let nested = self.explain_failure(s_elem.type_id, t_elem.type_id);
                return Some(SubtypeFailureReason::TupleElementMismatch {
                    index,
                    source_element: s_elem.type_id,
                    target_element: t_elem.type_id,
                    nested_reason: nested.map(Box::new),
                });
            }
        }

        // Elements beyond the target's fixed prefix go against its rest type.
        if let Some(rest_index) = target.iter().position(|e| e.rest) {
            let rest_elem = self.interner.rest_element_type(target[rest_index].type_id);
            for (index, s_elem) in source.iter().enumerate().skip(rest_index) {
                let element = if s_elem.rest {
                    self.interner.rest_element_type(s_elem.type_id)
                } else {
                    s_elem.type_id
                };
                if !self.is_subtype_of(element, rest_elem) {
                    let nested = self.explain_failure(element, rest_elem);
                    return Some(SubtypeFailureReason::TupleElementMismatch {
                        index,
                        source_element: element,
                        target_element: rest_elem,
                        nested_reason: nested.map(Box::new),
                    });
                }
            }
        }
        Some(arity_mismatch)
    }
}
