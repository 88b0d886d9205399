//! Conditional type evaluation.
//!
//! `Check extends Extends ? True : False`
//!
//! - `any` check types take both branches
//! - Union check types of a distributive conditional distribute per member
//! - Check types that still mention a free type parameter stay deferred
//! - Without `infer` placeholders the answer is a plain relation check
//! - With placeholders, the check type is matched against the pattern, the
//!   candidates are resolved, and the instantiated pattern must then accept
//!   the check type before the true branch is taken

use crate::errors::SolverError;
use crate::evaluate::TypeEvaluator;
use crate::instantiate::{TypeSubstitution, instantiate_type};
use crate::intern::TypeInterner;
use crate::type_resolver::TypeResolver;
use crate::types::*;
use crate::visitor::{collect_infer_params, contains_type_parameters, union_list_id};
use structype_common::CheckerOptions;
use tracing::trace;

use super::infer_pattern::{InferenceContext, Polarity};

impl<'a, R: TypeResolver> TypeEvaluator<'a, R> {
    pub(crate) fn evaluate_conditional_type(
        &mut self,
        type_id: TypeId,
        cond: &ConditionalType,
    ) -> Result<TypeId, SolverError> {
        let check = self.try_evaluate(cond.check_type)?;

        if cond.is_distributive {
            if check.is_never() {
                return Ok(TypeId::NEVER);
            }
            if let Some(list_id) = union_list_id(self.interner, check) {
                let members = self.interner.type_list(list_id);
                let mut results = Vec::with_capacity(members.len());
                for &member in members.iter() {
                    results.push(self.evaluate_conditional_branch(type_id, member, cond)?);
                }
                return Ok(self.interner.union(results));
            }
        }

        self.evaluate_conditional_branch(type_id, check, cond)
    }

    fn evaluate_conditional_branch(
        &mut self,
        type_id: TypeId,
        check: TypeId,
        cond: &ConditionalType,
    ) -> Result<TypeId, SolverError> {
        let extends = self.try_evaluate(cond.extends_type)?;

        if contains_type_parameters(self.interner, check)
            || contains_type_parameters(self.interner, extends)
        {
            trace!(conditional = type_id.0, "deferring conditional on free type parameter");
            if check == cond.check_type && extends == cond.extends_type {
                return Ok(type_id);
            }
            return Ok(self.interner.conditional(ConditionalType {
                check_type: check,
                extends_type: extends,
                ..*cond
            }));
        }

        let infer_params = collect_infer_params(self.interner, extends);

        if check.is_any() {
            // `any` satisfies and fails the check at once.
            let mut bindings = TypeSubstitution::new();
            for param in &infer_params {
                bindings.insert(param.name, TypeId::ANY);
            }
            let true_branch = instantiate_type(self.interner, cond.true_type, &bindings);
            let true_type = self.try_evaluate(true_branch)?;
            let false_type = self.try_evaluate(cond.false_type)?;
            return Ok(self.interner.union2(true_type, false_type));
        }

        if infer_params.is_empty() {
            let branch = if self.is_subtype(check, extends) {
                cond.true_type
            } else {
                cond.false_type
            };
            return self.try_evaluate(branch);
        }

        let mut ctx = InferenceContext::new(&infer_params);
        if self.match_infer_pattern(&mut ctx, check, extends, Polarity::Covariant)? {
            let bindings = self.resolve_inference(&mut ctx)?;
            let instantiated = instantiate_type(self.interner, extends, &bindings);
            if self.is_subtype(check, instantiated) {
                let branch = instantiate_type(self.interner, cond.true_type, &bindings);
                return self.try_evaluate(branch);
            }
        }
        self.try_evaluate(cond.false_type)
    }
}

/// Evaluate `check extends extends_type ? then_branch : else_branch` with the
/// type parameters in `bindings` substituted first.
///
/// The conditional distributes over a union check type when `check` is a
/// naked type parameter, as it would when written in a generic alias.
pub fn evaluate_conditional<R: TypeResolver>(
    interner: &TypeInterner,
    resolver: &R,
    options: &CheckerOptions,
    check: TypeId,
    extends_type: TypeId,
    then_branch: TypeId,
    else_branch: TypeId,
    bindings: &TypeSubstitution,
) -> Result<TypeId, SolverError> {
    let is_distributive = matches!(interner.lookup(check), Some(TypeData::TypeParameter(_)));
    let conditional = interner.conditional(ConditionalType {
        check_type: check,
        extends_type,
        true_type: then_branch,
        false_type: else_branch,
        is_distributive,
    });
    let instantiated = instantiate_type(interner, conditional, bindings);
    TypeEvaluator::with_resolver(interner, resolver)
        .with_options(*options)
        .try_evaluate(instantiated)
}

#[cfg(test)]
#[path = "../../tests/conditional_tests.rs"]
mod tests;
