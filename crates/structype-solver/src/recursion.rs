//! Recursion guard for cycle detection, depth limiting and iteration
//! bounding in recursive type computations.
//!
//! `RecursionGuard` combines:
//! 1. **Cycle detection** via a visiting set (`FxHashSet<K>`)
//! 2. **Depth limiting** to prevent stack overflow
//! 3. **Iteration bounding** to prevent runaway work
//!
//! Limits come from named [`RecursionProfile`]s so that call sites say what
//! they are guarding instead of repeating magic numbers:
//!
//! ```ignore
//! let guard = RecursionGuard::with_profile(RecursionProfile::TypeEvaluation);
//! ```

use rustc_hash::FxHashSet;
use std::hash::Hash;

// ---------------------------------------------------------------------------
// RecursionProfile
// ---------------------------------------------------------------------------

/// Named recursion limit presets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecursionProfile {
    /// Structural comparison of two types. Needs the deepest limit because
    /// recursive types can nest deeply before a cycle is found.
    SubtypeCheck,

    /// Conditional, mapped, keyof and index-access evaluation.
    TypeEvaluation,

    /// Expanding `Def<Args>` into its instantiated body.
    TypeApplication,

    /// Walking a pattern while binding `infer` variables.
    Inference,

    /// Resolving one call expression.
    CallResolution,

    /// Explicit limits for tests and special cases.
    Custom { max_depth: u32, max_iterations: u32 },
}

impl RecursionProfile {
    pub const fn max_depth(self) -> u32 {
        match self {
            Self::SubtypeCheck => 100,
            Self::TypeEvaluation => 50,
            Self::TypeApplication => 50,
            Self::Inference => 64,
            Self::CallResolution => 20,
            Self::Custom { max_depth, .. } => max_depth,
        }
    }

    pub const fn max_iterations(self) -> u32 {
        match self {
            Self::SubtypeCheck => 100_000,
            Self::TypeEvaluation => 100_000,
            Self::TypeApplication => 100_000,
            Self::Inference => 10_000,
            Self::CallResolution => 10_000,
            Self::Custom { max_iterations, .. } => max_iterations,
        }
    }
}

/// How many checker/evaluator instances may be stacked inside one another
/// (a checker resolving a conditional, whose evaluator runs a checker, ...).
/// Each instance has its own guard; this bounds the chain between them.
pub const MAX_SOLVER_NESTING: u32 = 32;

// ---------------------------------------------------------------------------
// RecursionResult
// ---------------------------------------------------------------------------

/// Result of attempting to enter a recursive computation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecursionResult {
    /// Proceed with the computation.
    Entered,
    /// This key is already being visited.
    Cycle,
    DepthExceeded,
    IterationExceeded,
}

impl RecursionResult {
    #[inline]
    pub fn is_entered(self) -> bool {
        matches!(self, Self::Entered)
    }

    #[inline]
    pub fn is_cycle(self) -> bool {
        matches!(self, Self::Cycle)
    }

    /// Depth or iteration limit hit.
    #[inline]
    pub fn is_exceeded(self) -> bool {
        matches!(self, Self::DepthExceeded | Self::IterationExceeded)
    }

    #[inline]
    pub fn is_denied(self) -> bool {
        !self.is_entered()
    }
}

// ---------------------------------------------------------------------------
// RecursionGuard
// ---------------------------------------------------------------------------

/// Tracks recursion state for one computation.
///
/// ```ignore
/// match guard.enter(key) {
///     RecursionResult::Entered => {
///         let result = do_work();
///         guard.leave(key);
///         result
///     }
///     RecursionResult::Cycle => handle_cycle(),
///     RecursionResult::DepthExceeded
///     | RecursionResult::IterationExceeded => handle_exceeded(),
/// }
/// ```
///
/// In debug builds, leaving a key that was never entered panics.
#[derive(Debug)]
pub struct RecursionGuard<K: Hash + Eq + Copy> {
    visiting: FxHashSet<K>,
    depth: u32,
    iterations: u32,
    max_depth: u32,
    max_iterations: u32,
    exceeded: bool,
}

impl<K: Hash + Eq + Copy> RecursionGuard<K> {
    pub fn new(max_depth: u32, max_iterations: u32) -> Self {
        Self {
            visiting: FxHashSet::default(),
            depth: 0,
            iterations: 0,
            max_depth,
            max_iterations,
            exceeded: false,
        }
    }

    pub fn with_profile(profile: RecursionProfile) -> Self {
        Self::new(profile.max_depth(), profile.max_iterations())
    }

    /// Try to enter a recursive computation for `key`.
    ///
    /// On [`RecursionResult::Entered`] the caller must call
    /// [`leave`](Self::leave) with the same key when done.
    pub fn enter(&mut self, key: K) -> RecursionResult {
        self.iterations = self.iterations.saturating_add(1);

        if self.iterations > self.max_iterations {
            self.exceeded = true;
            return RecursionResult::IterationExceeded;
        }
        if self.depth >= self.max_depth {
            self.exceeded = true;
            return RecursionResult::DepthExceeded;
        }
        if self.visiting.contains(&key) {
            return RecursionResult::Cycle;
        }

        self.visiting.insert(key);
        self.depth += 1;
        RecursionResult::Entered
    }

    pub fn leave(&mut self, key: K) {
        let was_present = self.visiting.remove(&key);
        debug_assert!(
            was_present,
            "RecursionGuard::leave() called with a key that is not in the visiting set"
        );
        self.depth = self.depth.saturating_sub(1);
    }

    /// Run `f` inside a guarded scope. Returns `Err(reason)` if entry was
    /// denied.
    pub fn scope<T>(&mut self, key: K, f: impl FnOnce() -> T) -> Result<T, RecursionResult> {
        match self.enter(key) {
            RecursionResult::Entered => {
                let result = f();
                self.leave(key);
                Ok(result)
            }
            denied => Err(denied),
        }
    }

    #[inline]
    pub fn is_visiting(&self, key: &K) -> bool {
        self.visiting.contains(key)
    }

    #[inline]
    pub fn depth(&self) -> u32 {
        self.depth
    }

    #[inline]
    pub fn iterations(&self) -> u32 {
        self.iterations
    }

    #[inline]
    pub fn is_active(&self) -> bool {
        self.depth > 0
    }

    /// Sticky: stays set after the depth drops back under the limit, until
    /// [`reset`](Self::reset).
    #[inline]
    pub fn is_exceeded(&self) -> bool {
        self.exceeded
    }

    #[inline]
    pub fn mark_exceeded(&mut self) {
        self.exceeded = true;
    }

    pub fn reset(&mut self) {
        self.visiting.clear();
        self.depth = 0;
        self.iterations = 0;
        self.exceeded = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_cycles() {
        let mut guard = RecursionGuard::with_profile(RecursionProfile::SubtypeCheck);
        assert_eq!(guard.enter(1u32), RecursionResult::Entered);
        assert_eq!(guard.enter(1u32), RecursionResult::Cycle);
        assert!(guard.is_visiting(&1));
        guard.leave(1);
        assert!(!guard.is_active());
        assert!(!guard.is_exceeded());
    }

    #[test]
    fn depth_limit_is_sticky() {
        let mut guard = RecursionGuard::with_profile(RecursionProfile::Custom {
            max_depth: 2,
            max_iterations: 100,
        });
        assert!(guard.enter(1u32).is_entered());
        assert!(guard.enter(2u32).is_entered());
        assert_eq!(guard.enter(3u32), RecursionResult::DepthExceeded);
        guard.leave(2);
        guard.leave(1);
        assert!(guard.is_exceeded());
        guard.reset();
        assert!(!guard.is_exceeded());
    }

    #[test]
    fn iteration_limit() {
        let mut guard = RecursionGuard::new(10, 3);
        for key in 0..3u32 {
            assert!(guard.enter(key).is_entered());
            guard.leave(key);
        }
        assert_eq!(guard.enter(99), RecursionResult::IterationExceeded);
    }

    #[test]
    fn scope_leaves_on_success() {
        let mut guard = RecursionGuard::with_profile(RecursionProfile::TypeEvaluation);
        let value = guard.scope(7u32, || 42);
        assert_eq!(value, Ok(42));
        assert_eq!(guard.depth(), 0);
    }
}
