//! Call resolution.
//!
//! `CallEvaluator::resolve_call` takes a callee type and the argument types
//! and answers with the call's result type or the reason it is rejected.
//! It checks arity and checks every argument against its parameter with the
//! assignability rules of [`CompatChecker`].
//!
//! Calling a union of functions is only possible with arguments every member
//! accepts, so each parameter position takes the intersection of the
//! members' parameter types:
//!
//! ```typescript
//! declare const f: ((x: string) => void) | ((x: number) => void);
//! f("a");   // ❌ parameter is string & number, i.e. never
//! ```

use crate::compat::CompatChecker;
use crate::errors::CallError;
use crate::evaluate::TypeEvaluator;
use crate::format::TypeFormatter;
use crate::intern::TypeInterner;
use crate::recursion::{RecursionGuard, RecursionProfile, RecursionResult};
use crate::subtype::NOOP_RESOLVER;
use crate::subtype_rules::functions::ParameterList;
use crate::type_resolver::{NoopResolver, TypeResolver};
use crate::types::*;
use structype_common::CheckerOptions;
use tracing::debug;

pub struct CallEvaluator<'a, R: TypeResolver = NoopResolver> {
    interner: &'a TypeInterner,
    resolver: &'a R,
    options: CheckerOptions,
    compat: CompatChecker<'a, R>,
    guard: RecursionGuard<TypeId>,
}

impl<'a> CallEvaluator<'a, NoopResolver> {
    pub fn new(interner: &'a TypeInterner) -> Self {
        Self::with_resolver(interner, &NOOP_RESOLVER)
    }
}

impl<'a, R: TypeResolver> CallEvaluator<'a, R> {
    pub fn with_resolver(interner: &'a TypeInterner, resolver: &'a R) -> Self {
        Self {
            interner,
            resolver,
            options: CheckerOptions::default(),
            compat: CompatChecker::with_resolver(interner, resolver),
            guard: RecursionGuard::with_profile(RecursionProfile::CallResolution),
        }
    }

    pub fn with_options(mut self, options: &CheckerOptions) -> Self {
        self.options = *options;
        self.compat.apply_options(options);
        self
    }

    /// Resolve `callee(args...)` to the call's result type.
    pub fn resolve_call(&mut self, callee: TypeId, args: &[TypeId]) -> Result<TypeId, CallError> {
        if !self.guard.is_active() {
            self.guard.reset();
        }
        match self.guard.enter(callee) {
            RecursionResult::Entered => {}
            _ => return Err(self.not_callable(callee)),
        }
        let result = self.resolve_call_inner(callee, args);
        self.guard.leave(callee);
        if let Err(error) = &result {
            debug!(callee = callee.0, %error, "call rejected");
        }
        result
    }

    fn resolve_call_inner(&mut self, callee: TypeId, args: &[TypeId]) -> Result<TypeId, CallError> {
        let resolved = TypeEvaluator::with_resolver(self.interner, self.resolver)
            .with_options(self.options)
            .evaluate(callee);
        if resolved.is_any() || resolved.is_error() {
            return Ok(resolved);
        }
        let Some(data) = self.interner.lookup(resolved) else {
            return Err(self.not_callable(callee));
        };
        match data {
            TypeData::Function(shape_id) => {
                let shape = self.interner.function_shape(shape_id);
                if shape.is_constructor {
                    // Construct signatures need `new`.
                    return Err(self.not_callable(callee));
                }
                self.resolve_function_call(&shape, args)
            }
            TypeData::Union(list_id) => {
                let members = self.interner.type_list(list_id);
                self.resolve_union_call(callee, &members, args)
            }
            TypeData::Intersection(list_id) => {
                let members = self.interner.type_list(list_id);
                self.resolve_intersection_call(callee, &members, args)
            }
            TypeData::TypeParameter(info) => match info.constraint {
                Some(constraint) => self.resolve_call(constraint, args),
                None => Err(self.not_callable(callee)),
            },
            _ => Err(self.not_callable(callee)),
        }
    }

    fn resolve_function_call(
        &mut self,
        shape: &FunctionShape,
        args: &[TypeId],
    ) -> Result<TypeId, CallError> {
        let params = ParameterList::of(self.interner, shape);
        check_arity(params.required_count(), params.max_count(), args.len())?;
        for (index, &arg) in args.iter().enumerate() {
            let Some(param) = params.type_at(index) else {
                break;
            };
            self.check_argument(index, arg, param)?;
        }
        Ok(shape.return_type)
    }

    /// Every member must be a plain function. The combined signature takes
    /// the strictest arity and, per position, the intersection of the
    /// members' parameter types; the result is the union of their returns.
    fn resolve_union_call(
        &mut self,
        callee: TypeId,
        members: &[TypeId],
        args: &[TypeId],
    ) -> Result<TypeId, CallError> {
        let mut shapes = Vec::with_capacity(members.len());
        for &member in members {
            match self.interner.lookup(member) {
                Some(TypeData::Function(shape_id)) => {
                    let shape = self.interner.function_shape(shape_id);
                    if shape.is_constructor {
                        return Err(self.not_callable(callee));
                    }
                    shapes.push(shape);
                }
                _ => return Err(self.not_callable(callee)),
            }
        }

        let param_lists: Vec<ParameterList> = shapes
            .iter()
            .map(|shape| ParameterList::of(self.interner, shape))
            .collect();
        let mut min = 0;
        let mut max: Option<usize> = None;
        for params in &param_lists {
            min = min.max(params.required_count());
            max = match (max, params.max_count()) {
                (Some(a), Some(b)) => Some(a.min(b)),
                (a, b) => a.or(b),
            };
        }
        check_arity(min, max, args.len())?;

        for (index, &arg) in args.iter().enumerate() {
            let params: Vec<TypeId> = param_lists
                .iter()
                .filter_map(|params| params.type_at(index))
                .collect();
            if params.is_empty() {
                continue;
            }
            let combined = self.interner.intersection(params);
            if combined.is_never() {
                let callee = TypeFormatter::new(self.interner)
                    .with_resolver(self.resolver)
                    .format(callee);
                return Err(CallError::UnsatisfiableParameter { index, callee });
            }
            self.check_argument(index, arg, combined)?;
        }

        let returns = shapes.iter().map(|shape| shape.return_type).collect();
        Ok(self.interner.union(returns))
    }

    /// The first member that accepts the call decides it.
    fn resolve_intersection_call(
        &mut self,
        callee: TypeId,
        members: &[TypeId],
        args: &[TypeId],
    ) -> Result<TypeId, CallError> {
        let mut first_failure = None;
        for &member in members {
            match self.resolve_call(member, args) {
                Ok(result) => return Ok(result),
                Err(CallError::NotCallable { .. }) => {}
                Err(error) => {
                    first_failure.get_or_insert(error);
                }
            }
        }
        Err(first_failure.unwrap_or_else(|| self.not_callable(callee)))
    }

    fn check_argument(
        &mut self,
        index: usize,
        arg: TypeId,
        param: TypeId,
    ) -> Result<(), CallError> {
        self.compat
            .check_assignable(arg, param)
            .map_err(|error| CallError::ArgumentTypeMismatch { index, error })
    }

    fn not_callable(&self, callee: TypeId) -> CallError {
        CallError::NotCallable {
            type_name: TypeFormatter::new(self.interner)
                .with_resolver(self.resolver)
                .format(callee),
        }
    }
}

fn check_arity(min: usize, max: Option<usize>, got: usize) -> Result<(), CallError> {
    if got < min || max.is_some_and(|max| got > max) {
        return Err(CallError::ArgumentCountMismatch { min, max, got });
    }
    Ok(())
}

#[cfg(test)]
#[path = "../tests/operations_tests.rs"]
mod tests;
