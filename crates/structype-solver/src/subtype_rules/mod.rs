//! Subtype rules, grouped by the kind of type they relate.
//!
//! Each file adds methods to [`SubtypeChecker`](crate::subtype::SubtypeChecker);
//! `subtype.rs` decides which one applies.

pub(crate) mod functions;
mod intrinsics;
mod objects;
pub(crate) mod tuples;
mod unions;
