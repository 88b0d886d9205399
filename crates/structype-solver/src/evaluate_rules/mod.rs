//! Evaluation rules, one file per type-level operator.
//!
//! Each file adds methods to [`TypeEvaluator`](crate::evaluate::TypeEvaluator).

pub(crate) mod conditional;
pub(crate) mod index_access;
pub(crate) mod infer_pattern;
pub(crate) mod keyof;
pub(crate) mod mapped;
pub(crate) mod template_literal;
