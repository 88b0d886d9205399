//! Structural type solver
//!
//! Answers type-compatibility questions over an interned type universe of
//! primitives, literals, objects, arrays, tuples, functions, unions,
//! intersections and generic type-level operators. It uses:
//!
//! - **Interning**: every type is hash-consed to a `TypeId`, so structural
//!   equality is id equality
//! - **Coinductive cycle handling**: recursive types relate by assuming an
//!   in-progress pair holds
//! - **Ena**: union-find tables for `infer` bindings during conditional
//!   type evaluation
//!
//! The entry points are [`SubtypeChecker`], [`CompatChecker`] (assignability
//! with excess property checks), [`TypeEvaluator`] (conditional, mapped,
//! indexed access, `keyof` and template literal types), [`CallEvaluator`] and
//! [`NarrowingContext`].
pub mod compat;
pub mod def;
mod diagnostics;
mod environment;
pub mod errors;
mod evaluate;
mod evaluate_rules;
mod format;
pub mod freshness;
mod instantiate;
mod intern;
mod narrowing;
pub mod operations;
pub mod query_cache;
pub mod recursion;
mod subtype;
mod subtype_explain;
mod subtype_rules;
pub mod type_resolver;
pub mod types;
pub mod utils;
pub mod visitor;

pub use intern::{MAX_INTERSECTION_DISTRIBUTION, TypeInterner};
pub use types::*;

pub use compat::{CompatChecker, is_assignable};
pub use def::{DefId, DefKind, DefinitionInfo, DefinitionStore};
pub use diagnostics::{
    DiagnosticTracer, FastTracer, PathSegment, SubtypeFailureReason, SubtypeTracer, render_path,
};
pub use environment::TypeEnvironment;
pub use errors::{CallError, IncompatibleTypesError, SolverError, UnresolvedInferenceError};
pub use evaluate::{TypeEvaluator, evaluate_type};
pub use evaluate_rules::conditional::evaluate_conditional;
pub use evaluate_rules::mapped::{PropertyModifiers, map_properties};
pub use evaluate_rules::template_literal::TEMPLATE_LITERAL_EXPANSION_LIMIT;
pub use format::TypeFormatter;
pub use freshness::{is_fresh_object_type, widen_freshness};
pub use instantiate::{
    MAX_INSTANTIATION_DEPTH, TypeInstantiator, TypeSubstitution, instantiate_type,
};
pub use narrowing::{NarrowingContext, NarrowingResult, TypeGuard};
pub use operations::CallEvaluator;
pub use query_cache::{QueryCache, QueryCacheStats};
pub use recursion::{MAX_SOLVER_NESTING, RecursionGuard, RecursionProfile, RecursionResult};
pub use subtype::{SubtypeChecker, SubtypeResult, is_subtype, is_subtype_with_env};
pub use type_resolver::{NoopResolver, TypeResolver};

pub use structype_common::{Atom, CheckerOptions};

#[cfg(test)]
#[path = "../tests/property_tests.rs"]
mod property_tests;

#[cfg(test)]
#[path = "../tests/concurrent_tests.rs"]
mod concurrent_tests;
