//! Structural subtype checking.
//!
//! `SubtypeChecker` answers "is every value of S a value of T?" for the type
//! graph held by a [`TypeInterner`]. Recursive types are handled
//! coinductively: a pair that is already being compared further up the
//! stack is assumed related, and results that relied on such an assumption
//! are kept out of the caches.
//!
//! The rules themselves live in `subtype_rules/`, one file per family of
//! types. This file holds the checker state, caching, and the dispatcher.

use crate::diagnostics::{SubtypeFailureReason, SubtypeTracer};
use crate::errors::SolverError;
use crate::evaluate::TypeEvaluator;
use crate::intern::TypeInterner;
use crate::query_cache::{RelationKey, option_bits};
use crate::recursion::{MAX_SOLVER_NESTING, RecursionGuard, RecursionProfile, RecursionResult};
use crate::type_resolver::{NoopResolver, TypeResolver};
use crate::types::*;
use crate::visitor::{intersection_list_id, union_list_id};
use rustc_hash::FxHashMap;
use structype_common::CheckerOptions;
use tracing::{debug, trace};

pub(crate) static NOOP_RESOLVER: NoopResolver = NoopResolver;

/// Outcome of one relation check.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum SubtypeResult {
    True,
    False,
    /// The pair was already being compared; assumed related.
    CycleDetected,
    /// Recursion limits were hit. Treated as unrelated.
    DepthExceeded,
}

impl SubtypeResult {
    #[inline]
    pub fn is_true(self) -> bool {
        matches!(self, Self::True | Self::CycleDetected)
    }

    #[inline]
    pub fn is_false(self) -> bool {
        !self.is_true()
    }

    #[inline]
    pub(crate) fn from_bool(related: bool) -> Self {
        if related { Self::True } else { Self::False }
    }
}

pub struct SubtypeChecker<'a, R: TypeResolver = NoopResolver> {
    pub(crate) interner: &'a TypeInterner,
    pub(crate) resolver: &'a R,
    pub(crate) strict_null_checks: bool,
    pub(crate) strict_function_types: bool,
    pub(crate) exact_optional_property_types: bool,
    guard: RecursionGuard<(TypeId, TypeId)>,
    /// Bumped whenever a comparison is answered by the cycle assumption.
    cycle_hits: u32,
    cache: FxHashMap<(TypeId, TypeId), bool>,
    pub(crate) nesting: u32,
}

impl<'a> SubtypeChecker<'a, NoopResolver> {
    /// Checker with default options and no definitions.
    pub fn new(interner: &'a TypeInterner) -> Self {
        Self::with_resolver(interner, &NOOP_RESOLVER)
    }
}

impl<'a, R: TypeResolver> SubtypeChecker<'a, R> {
    pub fn with_resolver(interner: &'a TypeInterner, resolver: &'a R) -> Self {
        let defaults = CheckerOptions::default();
        Self {
            interner,
            resolver,
            strict_null_checks: defaults.strict_null_checks,
            strict_function_types: defaults.strict_function_types,
            exact_optional_property_types: defaults.exact_optional_property_types,
            guard: RecursionGuard::with_profile(RecursionProfile::SubtypeCheck),
            cycle_hits: 0,
            cache: FxHashMap::default(),
            nesting: 0,
        }
    }

    pub fn with_options(mut self, options: &CheckerOptions) -> Self {
        self.apply_options(options);
        self
    }

    pub fn apply_options(&mut self, options: &CheckerOptions) {
        self.set_strict_null_checks(options.strict_null_checks);
        self.set_strict_function_types(options.strict_function_types);
        self.set_exact_optional_property_types(options.exact_optional_property_types);
    }

    pub fn set_strict_null_checks(&mut self, strict: bool) {
        if self.strict_null_checks != strict {
            self.strict_null_checks = strict;
            self.cache.clear();
        }
    }

    pub fn set_strict_function_types(&mut self, strict: bool) {
        if self.strict_function_types != strict {
            self.strict_function_types = strict;
            self.cache.clear();
        }
    }

    pub fn set_exact_optional_property_types(&mut self, exact: bool) {
        if self.exact_optional_property_types != exact {
            self.exact_optional_property_types = exact;
            self.cache.clear();
        }
    }

    pub(crate) fn with_nesting(mut self, nesting: u32) -> Self {
        self.nesting = nesting;
        self
    }

    pub fn options(&self) -> CheckerOptions {
        CheckerOptions {
            strict_null_checks: self.strict_null_checks,
            strict_function_types: self.strict_function_types,
            exact_optional_property_types: self.exact_optional_property_types,
        }
    }

    /// Whether the last check ran into the depth or iteration limit.
    pub fn depth_exceeded(&self) -> bool {
        self.guard.is_exceeded()
    }

    pub fn is_subtype_of(&mut self, source: TypeId, target: TypeId) -> bool {
        self.check_subtype(source, target).is_true()
    }

    /// Like [`is_subtype_of`](Self::is_subtype_of), reporting the first
    /// failure to `tracer`.
    pub fn check_subtype_with_tracer<T: SubtypeTracer>(
        &mut self,
        source: TypeId,
        target: TypeId,
        tracer: &mut T,
    ) -> bool {
        if self.is_subtype_of(source, target) {
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

    pub fn check_subtype(&mut self, source: TypeId, target: TypeId) -> SubtypeResult {
        if source == target {
            return SubtypeResult::True;
        }
        if self.nesting > MAX_SOLVER_NESTING {
            self.guard.mark_exceeded();
            return SubtypeResult::DepthExceeded;
        }

        let key = (source, target);
        if let Some(&related) = self.cache.get(&key) {
            return SubtypeResult::from_bool(related);
        }
        let relation_key: RelationKey = (source, target, option_bits(&self.options()));
        if let Some(shared) = self.resolver.query_cache()
            && let Some(related) = shared.lookup_relation(&relation_key)
        {
            self.cache.insert(key, related);
            return SubtypeResult::from_bool(related);
        }

        match self.guard.enter(key) {
            RecursionResult::Entered => {}
            RecursionResult::Cycle => {
                trace!(source = source.0, target = target.0, "assuming related on cycle");
                self.cycle_hits += 1;
                return SubtypeResult::CycleDetected;
            }
            RecursionResult::DepthExceeded | RecursionResult::IterationExceeded => {
                debug!(source = source.0, target = target.0, "subtype recursion limit reached");
                return SubtypeResult::DepthExceeded;
            }
        }

        let hits_before = self.cycle_hits;
        let result = self.check_subtype_inner(source, target);
        self.guard.leave(key);

        // `False` never depends on an optimistic assumption; `True` only
        // counts when no in-progress pair was assumed along the way.
        let definitive = match result {
            _ if self.guard.is_exceeded() => None,
            SubtypeResult::False => Some(false),
            SubtypeResult::True if self.cycle_hits == hits_before => Some(true),
            _ => None,
        };
        if let Some(related) = definitive {
            self.cache.insert(key, related);
            if let Some(shared) = self.resolver.query_cache() {
                shared.insert_relation(relation_key, related);
            }
        }
        result
    }

    /// Reduce deferred forms (references, generic applications, conditional
    /// and mapped types, ...) so the structural rules see concrete shapes.
    pub(crate) fn try_resolve_for_relation(
        &mut self,
        type_id: TypeId,
    ) -> Result<TypeId, SolverError> {
        match self.interner.lookup(type_id) {
            Some(
                TypeData::Lazy(_)
                | TypeData::Application(_)
                | TypeData::Conditional(_)
                | TypeData::Mapped(_)
                | TypeData::IndexAccess(..)
                | TypeData::KeyOf(_)
                | TypeData::TemplateLiteral(_),
            ) => {
                let options = self.options();
                let mut evaluator = TypeEvaluator::with_resolver(self.interner, self.resolver)
                    .with_options(options)
                    .with_nesting(self.nesting + 1);
                evaluator.try_evaluate(type_id)
            }
            _ => Ok(type_id),
        }
    }

    /// [`Self::try_resolve_for_relation`], with failures read as `error`.
    pub(crate) fn resolve_for_relation(&mut self, type_id: TypeId) -> TypeId {
        self.try_resolve_for_relation(type_id).unwrap_or(TypeId::ERROR)
    }

    fn check_subtype_inner(&mut self, source: TypeId, target: TypeId) -> SubtypeResult {
        if target.is_any() {
            return SubtypeResult::True;
        }
        // An operand that fails to evaluate relates to nothing but `any`.
        let resolved = self
            .try_resolve_for_relation(source)
            .and_then(|source| Ok((source, self.try_resolve_for_relation(target)?)));
        let (source, target) = match resolved {
            Ok(pair) => pair,
            Err(error) => {
                debug!(source = source.0, target = target.0, %error, "operand failed to evaluate");
                if error == SolverError::EvaluationDepthExceeded {
                    self.guard.mark_exceeded();
                    return SubtypeResult::DepthExceeded;
                }
                return SubtypeResult::False;
            }
        };
        if source == target {
            return SubtypeResult::True;
        }

        // Top and bottom types.
        if source.is_any() {
            return SubtypeResult::from_bool(!target.is_never());
        }
        if target.is_any() || source.is_error() || target.is_error() {
            return SubtypeResult::True;
        }
        if source.is_never() {
            return SubtypeResult::True;
        }
        if target.is_unknown() {
            // Only a lone `null`/`undefined`/`void` is kept out under strict null checks.
            let lone_nullish = source.is_nullish() || source == TypeId::VOID;
            return SubtypeResult::from_bool(!self.strict_null_checks || !lone_nullish);
        }
        if target.is_never() {
            return SubtypeResult::False;
        }
        if !self.strict_null_checks && (source.is_nullish() || source == TypeId::VOID) {
            return SubtypeResult::True;
        }
        if source.is_unknown() {
            return SubtypeResult::False;
        }

        // Composite types.
        if let Some(members) = union_list_id(self.interner, source) {
            return self.check_union_source_subtype(members, target);
        }
        if let Some(members) = union_list_id(self.interner, target) {
            return self.check_union_target_subtype(source, target, members);
        }
        if let Some(members) = intersection_list_id(self.interner, target) {
            return self.check_intersection_target_subtype(source, members);
        }
        if let Some(members) = intersection_list_id(self.interner, source) {
            return self.check_intersection_source_subtype(source, members, target);
        }

        let (Some(s_data), Some(t_data)) =
            (self.interner.lookup(source), self.interner.lookup(target))
        else {
            return SubtypeResult::False;
        };

        match (s_data, t_data) {
            (TypeData::TypeParameter(s_info) | TypeData::Infer(s_info), _) => {
                self.check_type_parameter_subtype(&s_info, target)
            }
            (_, TypeData::TypeParameter(_) | TypeData::Infer(_)) => SubtypeResult::False,

            (TypeData::Intrinsic(s_kind), TypeData::Intrinsic(t_kind)) => {
                self.check_intrinsic_subtype(s_kind, t_kind)
            }
            (_, TypeData::Intrinsic(IntrinsicKind::Object)) => {
                SubtypeResult::from_bool(self.is_object_keyword_type(source))
            }
            (TypeData::Literal(s_lit), TypeData::Intrinsic(_)) => {
                SubtypeResult::from_bool(s_lit.primitive() == target)
            }
            (TypeData::Literal(_), TypeData::Literal(_)) => SubtypeResult::False,
            (TypeData::TemplateLiteral(_), TypeData::Intrinsic(IntrinsicKind::String)) => {
                SubtypeResult::True
            }
            (TypeData::Literal(LiteralValue::String(text)), TypeData::TemplateLiteral(spans)) => {
                self.check_string_to_template_subtype(text, spans)
            }
            (TypeData::TemplateLiteral(s_spans), TypeData::TemplateLiteral(t_spans)) => {
                self.check_template_to_template_subtype(s_spans, t_spans)
            }

            (TypeData::Array(s_elem), TypeData::Array(t_elem)) => {
                self.check_subtype(s_elem, t_elem)
            }
            (TypeData::Tuple(s_list), TypeData::Array(t_elem)) => {
                self.check_tuple_to_array_subtype(s_list, t_elem)
            }
            (TypeData::Array(s_elem), TypeData::Tuple(t_list)) => {
                let t_elems = self.interner.tuple_list(t_list);
                self.check_array_to_tuple_subtype(s_elem, &t_elems)
            }
            (TypeData::Tuple(s_list), TypeData::Tuple(t_list)) => {
                let s_elems = self.interner.tuple_list(s_list);
                let t_elems = self.interner.tuple_list(t_list);
                self.check_tuple_subtype(&s_elems, &t_elems)
            }
            (TypeData::ReadonlyType(_), TypeData::Array(_) | TypeData::Tuple(_)) => {
                SubtypeResult::False
            }
            (TypeData::ReadonlyType(s_inner), TypeData::ReadonlyType(t_inner)) => {
                self.check_subtype(s_inner, t_inner)
            }
            (TypeData::Array(_) | TypeData::Tuple(_), TypeData::ReadonlyType(t_inner)) => {
                self.check_subtype(source, t_inner)
            }

            (TypeData::Function(s_fn), TypeData::Function(t_fn)) => {
                let s_shape = self.interner.function_shape(s_fn);
                let t_shape = self.interner.function_shape(t_fn);
                self.check_function_subtype(&s_shape, &t_shape)
            }

            (TypeData::Object(s_shape), TypeData::Object(t_shape)) => {
                let s_shape = self.interner.object_shape(s_shape);
                let t_shape = self.interner.object_shape(t_shape);
                self.check_object_subtype(&s_shape, true, &t_shape)
            }
            (_, TypeData::Object(t_shape)) => match self.apparent_shape(source) {
                Some(apparent) => {
                    let t_shape = self.interner.object_shape(t_shape);
                    self.check_object_subtype(&apparent, false, &t_shape)
                }
                None => SubtypeResult::False,
            },

            (TypeData::Conditional(cond_id), _) => {
                // A deferred conditional is assignable wherever both of its
                // branches are.
                let cond = self.interner.conditional_type(cond_id);
                if self.check_subtype(cond.true_type, target).is_true()
                    && self.check_subtype(cond.false_type, target).is_true()
                {
                    SubtypeResult::True
                } else {
                    SubtypeResult::False
                }
            }
            (TypeData::KeyOf(_), _) => {
                let keys = self.interner.union(vec![
                    TypeId::STRING,
                    TypeId::NUMBER,
                    TypeId::SYMBOL,
                ]);
                self.check_subtype(keys, target)
            }

            _ => SubtypeResult::False,
        }
    }
}

/// `source <: target` with default options and no definitions.
pub fn is_subtype(interner: &TypeInterner, source: TypeId, target: TypeId) -> bool {
    SubtypeChecker::new(interner).is_subtype_of(source, target)
}

/// `source <: target` resolving references through `resolver`.
pub fn is_subtype_with_env<R: TypeResolver>(
    interner: &TypeInterner,
    resolver: &R,
    options: &CheckerOptions,
    source: TypeId,
    target: TypeId,
) -> bool {
    SubtypeChecker::with_resolver(interner, resolver)
        .with_options(options)
        .is_subtype_of(source, target)
}

#[cfg(test)]
#[path = "../tests/subtype_tests.rs"]
mod tests;
