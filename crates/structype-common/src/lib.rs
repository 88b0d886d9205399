//! Common types and utilities for the structype engine.
//!
//! This crate provides foundational types used across the structype crates:
//! - String interning (`Atom`, `ShardedInterner`)
//! - Checker options (`CheckerOptions`), loadable from JSON
//! - Tracing subscriber setup for debugging relation checks

// String interning for property and parameter names
pub mod interner;
pub use interner::{Atom, ShardedInterner};

// Checker configuration
pub mod options;
pub use options::{CheckerOptions, OptionsError};

// Opt-in tracing output
pub mod tracing_config;
