//! Structured failure reasons for relation checks.
//!
//! ## Tracer pattern
//!
//! The same relation entry point serves fast boolean checks and detailed
//! diagnostics:
//!
//! - **FastTracer**: compiles down to a plain `false`
//! - **DiagnosticTracer**: keeps the first `SubtypeFailureReason`
//!
//! Reasons are built lazily through a closure, so the fast path never pays
//! for the explanation.

use crate::errors::SolverError;
use crate::format::TypeFormatter;
use crate::intern::TypeInterner;
use crate::types::TypeId;
use serde::Serialize;
use std::fmt;
use structype_common::Atom;

// =============================================================================
// Tracers
// =============================================================================

pub trait SubtypeTracer {
    /// Called on a mismatch. Returns whether checking should continue.
    fn on_mismatch(&mut self, reason: impl FnOnce() -> SubtypeFailureReason) -> bool;
}

/// Stops at the first mismatch without building a reason.
#[derive(Clone, Copy, Debug, Default)]
pub struct FastTracer;

impl SubtypeTracer for FastTracer {
    #[inline(always)]
    fn on_mismatch(&mut self, _reason: impl FnOnce() -> SubtypeFailureReason) -> bool {
        false
    }
}

/// Keeps the first failure reason.
#[derive(Debug, Default)]
pub struct DiagnosticTracer {
    failure: Option<SubtypeFailureReason>,
}

impl DiagnosticTracer {
    pub fn new() -> Self {
        Self { failure: None }
    }

    pub fn take_failure(&mut self) -> Option<SubtypeFailureReason> {
        self.failure.take()
    }

    pub fn get_failure(&self) -> Option<&SubtypeFailureReason> {
        self.failure.as_ref()
    }

    pub fn has_failure(&self) -> bool {
        self.failure.is_some()
    }
}

impl SubtypeTracer for DiagnosticTracer {
    #[inline]
    fn on_mismatch(&mut self, reason: impl FnOnce() -> SubtypeFailureReason) -> bool {
        if self.failure.is_none() {
            self.failure = Some(reason());
        }
        false
    }
}

// =============================================================================
// SubtypeFailureReason
// =============================================================================

/// Why a relation check failed.
///
/// Variants that describe a component mismatch carry a `nested_reason` with
/// the failure inside that component, so the chain leads to the innermost
/// offending pair.
#[derive(Clone, Debug, PartialEq)]
pub enum SubtypeFailureReason {
    MissingProperty {
        property_name: Atom,
        source_type: TypeId,
        target_type: TypeId,
    },
    PropertyTypeMismatch {
        property_name: Atom,
        source_property_type: TypeId,
        target_property_type: TypeId,
        nested_reason: Option<Box<SubtypeFailureReason>>,
    },
    /// Fresh object literal has a property the target does not declare.
    ExcessProperty {
        property_name: Atom,
        target_type: TypeId,
    },
    /// Weak target (all properties optional) shares no property with source.
    NoCommonProperties {
        source_type: TypeId,
        target_type: TypeId,
    },
    TupleElementMismatch {
        index: usize,
        source_element: TypeId,
        target_element: TypeId,
        nested_reason: Option<Box<SubtypeFailureReason>>,
    },
    TupleArityMismatch {
        source_count: usize,
        target_count: usize,
    },
    ArrayElementMismatch {
        source_element: TypeId,
        target_element: TypeId,
        nested_reason: Option<Box<SubtypeFailureReason>>,
    },
    ParameterTypeMismatch {
        param_index: usize,
        source_param: TypeId,
        target_param: TypeId,
    },
    /// Source requires more arguments than the target will ever pass.
    TooManyParameters {
        source_count: usize,
        target_count: usize,
    },
    ReturnTypeMismatch {
        source_return: TypeId,
        target_return: TypeId,
        nested_reason: Option<Box<SubtypeFailureReason>>,
    },
    NoUnionMemberMatches {
        source_type: TypeId,
        target_union_members: Vec<TypeId>,
    },
    /// Source fails one member of an intersection target.
    IntersectionMemberMismatch {
        source_type: TypeId,
        member: TypeId,
        nested_reason: Option<Box<SubtypeFailureReason>>,
    },
    LiteralTypeMismatch {
        source_type: TypeId,
        target_type: TypeId,
    },
    /// `readonly T[]` used where a mutable array is required.
    ReadonlyToMutable {
        source_type: TypeId,
        target_type: TypeId,
    },
    /// Construct signature vs call signature.
    ConstructorMismatch {
        source_type: TypeId,
        target_type: TypeId,
    },
    TypeMismatch {
        source_type: TypeId,
        target_type: TypeId,
    },
    RecursionLimitExceeded,
    /// An operand is a deferred form whose evaluation failed.
    EvaluationFailed {
        type_id: TypeId,
        error: Box<SolverError>,
    },
}

impl SubtypeFailureReason {
    pub fn nested(&self) -> Option<&SubtypeFailureReason> {
        match self {
            Self::PropertyTypeMismatch { nested_reason, .. }
            | Self::TupleElementMismatch { nested_reason, .. }
            | Self::ArrayElementMismatch { nested_reason, .. }
            | Self::ReturnTypeMismatch { nested_reason, .. }
            | Self::IntersectionMemberMismatch { nested_reason, .. } => nested_reason.as_deref(),
            _ => None,
        }
    }

    /// The innermost reason of the nesting chain.
    pub fn innermost(&self) -> &SubtypeFailureReason {
        let mut current = self;
        while let Some(next) = current.nested() {
            current = next;
        }
        current
    }

    /// Path from the outer types to the first mismatch.
    pub fn path(&self, interner: &TypeInterner) -> Vec<PathSegment> {
        let mut path = Vec::new();
        let mut current = Some(self);
        while let Some(reason) = current {
            match reason {
                Self::MissingProperty { property_name, .. }
                | Self::PropertyTypeMismatch { property_name, .. }
                | Self::ExcessProperty { property_name, .. } => {
                    path.push(PathSegment::Property(
                        interner.resolve_atom(*property_name).to_string(),
                    ));
                }
                Self::TupleElementMismatch { index, .. } => path.push(PathSegment::Element(*index)),
                Self::ArrayElementMismatch { .. } => path.push(PathSegment::ArrayElement),
                Self::ParameterTypeMismatch { param_index, .. } => {
                    path.push(PathSegment::Parameter(*param_index))
                }
                Self::ReturnTypeMismatch { .. } => path.push(PathSegment::Return),
                _ => {}
            }
            current = reason.nested();
        }
        path
    }

    /// One-line human readable description of this level.
    pub fn message(&self, formatter: &mut TypeFormatter<'_>) -> String {
        match self {
            Self::MissingProperty {
                property_name,
                source_type,
                target_type,
            } => format!(
                "property '{}' is missing in type '{}' but required in type '{}'",
                formatter.atom(*property_name),
                formatter.format(*source_type),
                formatter.format(*target_type)
            ),
            Self::PropertyTypeMismatch {
                property_name,
                source_property_type,
                target_property_type,
                ..
            } => format!(
                "types of property '{}' are incompatible: '{}' is not assignable to '{}'",
                formatter.atom(*property_name),
                formatter.format(*source_property_type),
                formatter.format(*target_property_type)
            ),
            Self::ExcessProperty {
                property_name,
                target_type,
            } => format!(
                "object literal may only specify known properties, and '{}' does not exist in type '{}'",
                formatter.atom(*property_name),
                formatter.format(*target_type)
            ),
            Self::NoCommonProperties {
                source_type,
                target_type,
            } => format!(
                "type '{}' has no properties in common with type '{}'",
                formatter.format(*source_type),
                formatter.format(*target_type)
            ),
            Self::TupleElementMismatch {
                index,
                source_element,
                target_element,
                ..
            } => format!(
                "element {index}: '{}' is not assignable to '{}'",
                formatter.format(*source_element),
                formatter.format(*target_element)
            ),
            Self::TupleArityMismatch {
                source_count,
                target_count,
            } => format!(
                "source has {source_count} element(s) but target allows {target_count}"
            ),
            Self::ArrayElementMismatch {
                source_element,
                target_element,
                ..
            } => format!(
                "array element type '{}' is not assignable to '{}'",
                formatter.format(*source_element),
                formatter.format(*target_element)
            ),
            Self::ParameterTypeMismatch {
                param_index,
                source_param,
                target_param,
            } => format!(
                "types of parameter {param_index} are incompatible: '{}' and '{}'",
                formatter.format(*source_param),
                formatter.format(*target_param)
            ),
            Self::TooManyParameters {
                source_count,
                target_count,
            } => format!(
                "source requires {source_count} parameter(s) but target provides only {target_count}"
            ),
            Self::ReturnTypeMismatch {
                source_return,
                target_return,
                ..
            } => format!(
                "return type '{}' is not assignable to '{}'",
                formatter.format(*source_return),
                formatter.format(*target_return)
            ),
            Self::NoUnionMemberMatches {
                source_type,
                target_union_members,
            } => {
                let members: Vec<String> = target_union_members
                    .iter()
                    .map(|member| formatter.format(*member))
                    .collect();
                format!(
                    "type '{}' is not assignable to any of '{}'",
                    formatter.format(*source_type),
                    members.join(" | ")
                )
            }
            Self::IntersectionMemberMismatch {
                source_type,
                member,
                ..
            } => format!(
                "type '{}' is not assignable to intersection member '{}'",
                formatter.format(*source_type),
                formatter.format(*member)
            ),
            Self::LiteralTypeMismatch {
                source_type,
                target_type,
            }
            | Self::TypeMismatch {
                source_type,
                target_type,
            } => format!(
                "type '{}' is not assignable to type '{}'",
                formatter.format(*source_type),
                formatter.format(*target_type)
            ),
            Self::ReadonlyToMutable {
                source_type,
                target_type,
            } => format!(
                "the type '{}' is 'readonly' and cannot be assigned to the mutable type '{}'",
                formatter.format(*source_type),
                formatter.format(*target_type)
            ),
            Self::ConstructorMismatch {
                source_type,
                target_type,
            } => format!(
                "construct and call signatures are not compatible: '{}' and '{}'",
                formatter.format(*source_type),
                formatter.format(*target_type)
            ),
            Self::RecursionLimitExceeded => {
                "type comparison is excessively deep and possibly infinite".to_string()
            }
            Self::EvaluationFailed { type_id, error } => {
                format!("type '{}' cannot be evaluated: {error}", formatter.format(*type_id))
            }
        }
    }
}

// =============================================================================
// PathSegment
// =============================================================================

/// One step from an outer type to a component.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "camelCase")]
pub enum PathSegment {
    Property(String),
    Parameter(usize),
    Element(usize),
    ArrayElement,
    Return,
}

impl fmt::Display for PathSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathSegment::Property(name) => write!(f, ".{name}"),
            PathSegment::Parameter(index) => write!(f, "(param {index})"),
            PathSegment::Element(index) => write!(f, "[{index}]"),
            PathSegment::ArrayElement => write!(f, "[number]"),
            PathSegment::Return => write!(f, "(return)"),
        }
    }
}

/// `".a.b[0]"`, or an empty string for an empty path.
pub fn render_path(path: &[PathSegment]) -> String {
    path.iter().map(ToString::to_string).collect()
}
