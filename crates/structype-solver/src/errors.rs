//! Error values returned by the solver's public operations.
//!
//! Relation checks themselves answer `bool`; these errors are produced by
//! the call sites that *require* a relation to hold (assignments, calls,
//! inference) and need to report why it does not.

use crate::diagnostics::{PathSegment, SubtypeFailureReason, render_path};
use crate::format::TypeFormatter;
use crate::intern::TypeInterner;
use crate::type_resolver::TypeResolver;
use crate::types::TypeId;
use thiserror::Error;

/// A required assignment or argument was rejected.
#[derive(Clone, Debug, Error, PartialEq)]
#[error("type '{source_type}' is not assignable to type '{target_type}'{}", path_suffix(.path))]
pub struct IncompatibleTypesError {
    /// Formatted source type.
    pub source_type: String,
    /// Formatted target type.
    pub target_type: String,
    pub source_id: TypeId,
    pub target_id: TypeId,
    /// Field chain / parameter index / tuple position of the first mismatch.
    pub path: Vec<PathSegment>,
    pub reason: Option<SubtypeFailureReason>,
}

fn path_suffix(path: &[PathSegment]) -> String {
    if path.is_empty() {
        String::new()
    } else {
        format!(" (at {})", render_path(path))
    }
}

impl IncompatibleTypesError {
    pub fn new(
        interner: &TypeInterner,
        resolver: Option<&dyn TypeResolver>,
        source: TypeId,
        target: TypeId,
        reason: Option<SubtypeFailureReason>,
    ) -> Self {
        let mut formatter = TypeFormatter::new(interner);
        if let Some(resolver) = resolver {
            formatter = formatter.with_resolver(resolver);
        }
        let path = reason
            .as_ref()
            .map(|reason| reason.path(interner))
            .unwrap_or_default();
        Self {
            source_type: formatter.format(source),
            target_type: formatter.format(target),
            source_id: source,
            target_id: target,
            path,
            reason,
        }
    }

    /// Message of the innermost failure, if a reason was recorded.
    pub fn detail(&self, interner: &TypeInterner) -> Option<String> {
        let reason = self.reason.as_ref()?;
        let mut formatter = TypeFormatter::new(interner);
        Some(reason.innermost().message(&mut formatter))
    }
}

/// An `infer` variable could not be bound to a single type.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[error("cannot infer a type for '{name}'")]
pub struct UnresolvedInferenceError {
    pub name: String,
}

#[derive(Clone, Debug, Error, PartialEq)]
pub enum SolverError {
    #[error(transparent)]
    Incompatible(#[from] IncompatibleTypesError),

    #[error(transparent)]
    UnresolvedInference(#[from] UnresolvedInferenceError),

    #[error("type '{type_name}' is not an object type")]
    NotAnObjectType { type_name: String },

    #[error("type evaluation is excessively deep and possibly infinite")]
    EvaluationDepthExceeded,
}

/// Rejection of a call expression.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum CallError {
    #[error("expected {} argument(s), but got {got}", describe_arity(*.min, *.max))]
    ArgumentCountMismatch {
        min: usize,
        /// `None` when the callee has a rest parameter.
        max: Option<usize>,
        got: usize,
    },

    #[error("argument {index}: {error}")]
    ArgumentTypeMismatch {
        index: usize,
        #[source]
        error: IncompatibleTypesError,
    },

    #[error("type '{type_name}' has no call signatures")]
    NotCallable { type_name: String },

    /// Union-of-functions callee whose parameter types at `index` have no
    /// common value.
    #[error("no argument can satisfy parameter {index} of every signature in '{callee}'")]
    UnsatisfiableParameter { index: usize, callee: String },
}

fn describe_arity(min: usize, max: Option<usize>) -> String {
    match max {
        Some(max) if max == min => min.to_string(),
        Some(max) => format!("{min}-{max}"),
        None => format!("at least {min}"),
    }
}
