//! Type-level evaluation.
//!
//! `TypeEvaluator` reduces deferred type forms to the types they stand for:
//!
//! - `Lazy(DefId)` to the definition body
//! - `Def<Args>` to the instantiated body (memoised per definition and
//!   arguments)
//! - conditional, mapped, `keyof`, indexed access and template literal types
//!   by the rules in `evaluate_rules/`
//!
//! Evaluation is shallow: the result's outermost form is concrete, nested
//! positions are reduced on demand by whoever walks into them. A conditional
//! whose check type still mentions a free type parameter stays deferred, so a
//! self-referential alias is unfolded one level at a time instead of forever.

use crate::def::DefId;
use crate::errors::SolverError;
use crate::instantiate::{TypeSubstitution, instantiate_type};
use crate::intern::TypeInterner;
use crate::query_cache::option_bits;
use crate::recursion::{MAX_SOLVER_NESTING, RecursionGuard, RecursionProfile, RecursionResult};
use crate::subtype::{NOOP_RESOLVER, SubtypeChecker};
use crate::type_resolver::{NoopResolver, TypeResolver};
use crate::types::*;
use smallvec::SmallVec;
use structype_common::CheckerOptions;
use tracing::{debug, trace};

pub struct TypeEvaluator<'a, R: TypeResolver = NoopResolver> {
    pub(crate) interner: &'a TypeInterner,
    pub(crate) resolver: &'a R,
    pub(crate) options: CheckerOptions,
    guard: RecursionGuard<TypeId>,
    cycle_hits: u32,
    nesting: u32,
}

impl<'a> TypeEvaluator<'a, NoopResolver> {
    pub fn new(interner: &'a TypeInterner) -> Self {
        Self::with_resolver(interner, &NOOP_RESOLVER)
    }
}

impl<'a, R: TypeResolver> TypeEvaluator<'a, R> {
    pub fn with_resolver(interner: &'a TypeInterner, resolver: &'a R) -> Self {
        Self {
            interner,
            resolver,
            options: CheckerOptions::default(),
            guard: RecursionGuard::with_profile(RecursionProfile::TypeEvaluation),
            cycle_hits: 0,
            nesting: 0,
        }
    }

    /// Options used by the relation checks inside conditional types.
    pub fn with_options(mut self, options: CheckerOptions) -> Self {
        self.options = options;
        self
    }

    pub(crate) fn with_nesting(mut self, nesting: u32) -> Self {
        self.nesting = nesting;
        self
    }

    /// Evaluate `type_id`, mapping failures to the `error` type.
    pub fn evaluate(&mut self, type_id: TypeId) -> TypeId {
        match self.try_evaluate(type_id) {
            Ok(evaluated) => evaluated,
            Err(error) => {
                debug!(type_id = type_id.0, %error, "evaluation failed");
                TypeId::ERROR
            }
        }
    }

    pub fn try_evaluate(&mut self, type_id: TypeId) -> Result<TypeId, SolverError> {
        if type_id.is_intrinsic() {
            return Ok(type_id);
        }
        let Some(data) = self.interner.lookup(type_id) else {
            return Ok(type_id);
        };
        if !self.needs_evaluation(&data) {
            return Ok(type_id);
        }
        if self.nesting > MAX_SOLVER_NESTING {
            return Err(SolverError::EvaluationDepthExceeded);
        }

        let cache_key = (type_id, option_bits(&self.options));
        if let Some(shared) = self.resolver.query_cache()
            && let Some(evaluated) = shared.lookup_evaluation(&cache_key)
        {
            return Ok(evaluated);
        }

        match self.guard.enter(type_id) {
            RecursionResult::Entered => {}
            RecursionResult::Cycle => {
                // A type that is being evaluated further up the stack stays as
                // it is; the caller unfolds it again when it walks into it.
                self.cycle_hits += 1;
                return Ok(type_id);
            }
            RecursionResult::DepthExceeded | RecursionResult::IterationExceeded => {
                return Err(SolverError::EvaluationDepthExceeded);
            }
        }

        let hits_before = self.cycle_hits;
        let result = self.evaluate_inner(type_id, data);
        self.guard.leave(type_id);

        if let Ok(evaluated) = result
            && self.cycle_hits == hits_before
            && let Some(shared) = self.resolver.query_cache()
        {
            shared.insert_evaluation(cache_key, evaluated);
        }
        result
    }

    fn needs_evaluation(&self, data: &TypeData) -> bool {
        match data {
            TypeData::Lazy(_)
            | TypeData::Application(_)
            | TypeData::Conditional(_)
            | TypeData::Mapped(_)
            | TypeData::IndexAccess(..)
            | TypeData::KeyOf(_)
            | TypeData::TemplateLiteral(_) => true,
            TypeData::Union(list_id) | TypeData::Intersection(list_id) => self
                .interner
                .type_list(*list_id)
                .iter()
                .any(|member| match self.interner.lookup(*member) {
                    Some(member_data) => self.needs_evaluation(&member_data),
                    None => false,
                }),
            _ => false,
        }
    }

    fn evaluate_inner(&mut self, type_id: TypeId, data: TypeData) -> Result<TypeId, SolverError> {
        match data {
            TypeData::Lazy(def_id) => match self.resolver.resolve_lazy(def_id, self.interner) {
                Some(body) => self.try_evaluate(body),
                None => Ok(type_id),
            },
            TypeData::Application(app_id) => self.evaluate_application(type_id, app_id),
            TypeData::Conditional(cond_id) => {
                let cond = self.interner.conditional_type(cond_id);
                self.evaluate_conditional_type(type_id, &cond)
            }
            TypeData::Mapped(mapped_id) => {
                let mapped = self.interner.mapped_type(mapped_id);
                self.evaluate_mapped(type_id, &mapped)
            }
            TypeData::KeyOf(operand) => self.evaluate_keyof(type_id, operand),
            TypeData::IndexAccess(object, index) => {
                self.evaluate_index_access(type_id, object, index)
            }
            TypeData::TemplateLiteral(template_id) => {
                self.evaluate_template_literal(type_id, template_id)
            }
            TypeData::Union(list_id) => {
                let members = self.interner.type_list(list_id);
                let mut evaluated = Vec::with_capacity(members.len());
                for &member in members.iter() {
                    evaluated.push(self.try_evaluate(member)?);
                }
                Ok(self.interner.union(evaluated))
            }
            TypeData::Intersection(list_id) => {
                let members = self.interner.type_list(list_id);
                let mut evaluated = Vec::with_capacity(members.len());
                for &member in members.iter() {
                    evaluated.push(self.try_evaluate(member)?);
                }
                Ok(self.interner.intersection(evaluated))
            }
            _ => Ok(type_id),
        }
    }

    /// `Def<Args>`: bind the declared parameters and instantiate the body.
    fn evaluate_application(
        &mut self,
        type_id: TypeId,
        app_id: TypeApplicationId,
    ) -> Result<TypeId, SolverError> {
        let app = self.interner.type_application(app_id);
        let Some(TypeData::Lazy(def_id)) = self.interner.lookup(app.base) else {
            return Ok(type_id);
        };
        match self.expand_application(def_id, &app.args) {
            Some(expanded) => self.try_evaluate(expanded),
            None => Ok(type_id),
        }
    }

    /// Instantiated (not yet evaluated) body of `def_id<args>`, memoised in
    /// the shared cache.
    pub(crate) fn expand_application(&mut self, def_id: DefId, args: &[TypeId]) -> Option<TypeId> {
        let key = (def_id, args.iter().copied().collect::<SmallVec<[TypeId; 4]>>());
        let shared = self.resolver.query_cache();
        if let Some(expanded) = shared.and_then(|cache| cache.lookup_application(&key)) {
            return Some(expanded);
        }

        let body = self.resolver.resolve_lazy(def_id, self.interner)?;
        let params = self.resolver.get_lazy_type_params(def_id).unwrap_or_default();
        let subst = TypeSubstitution::from_args(&params, args);
        let expanded = instantiate_type(self.interner, body, &subst);
        trace!(def = def_id.0, expanded = expanded.0, "expanded application");

        Some(match shared {
            Some(cache) => cache.insert_application(key, expanded),
            None => expanded,
        })
    }

    /// A relation checker sharing this evaluator's resolver and options.
    pub(crate) fn checker(&self) -> SubtypeChecker<'a, R> {
        SubtypeChecker::with_resolver(self.interner, self.resolver)
            .with_options(&self.options)
            .with_nesting(self.nesting + 1)
    }

    pub(crate) fn is_subtype(&self, source: TypeId, target: TypeId) -> bool {
        self.checker().is_subtype_of(source, target)
    }
}

/// Evaluate `type_id` with default options and no definitions.
pub fn evaluate_type(interner: &TypeInterner, type_id: TypeId) -> TypeId {
    TypeEvaluator::new(interner).evaluate(type_id)
}

#[cfg(test)]
#[path = "../tests/evaluate_tests.rs"]
mod tests;
