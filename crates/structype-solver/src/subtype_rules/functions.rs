//! Function signature subtype checking.
//!
//! Parameters are contravariant (bivariant when `strict_function_types` is
//! off), returns covariant. A function that ignores some of its arguments
//! can stand in for one that is passed more:
//!
//! ```typescript
//! let f: (a: string, b: number) => void = (a: string) => {};  // ✅
//! let g: (a: string) => void = (a: string, b: number) => {};  // ❌
//! ```

use crate::intern::TypeInterner;
use crate::subtype::{SubtypeChecker, SubtypeResult};
use crate::subtype_rules::tuples::expand_tuple_rest;
use crate::type_resolver::TypeResolver;
use crate::types::*;

/// The argument positions a signature accepts, with a tuple-typed rest
/// parameter spread into them.
///
/// `(a: string, ...rest: [number, boolean?])` has the positions
/// `[string, number, boolean?]` and nothing past them, while
/// `(...rest: [number, ...string[]])` has `[number]` followed by any number
/// of `string`s.
pub(crate) struct ParameterList {
    pub positions: Vec<TupleElement>,
    /// Element type accepted after the last position.
    pub variadic: Option<TypeId>,
    /// Required elements a tuple rest declares after its variadic run.
    pub trailing_required: usize,
}

impl ParameterList {
    pub(crate) fn of(interner: &TypeInterner, shape: &FunctionShape) -> Self {
        let mut positions: Vec<TupleElement> = shape
            .fixed_params()
            .iter()
            .map(|param| TupleElement {
                type_id: param.type_id,
                optional: param.optional,
                rest: false,
            })
            .collect();
        let Some(rest) = shape.rest_param() else {
            return Self {
                positions,
                variadic: None,
                trailing_required: 0,
            };
        };

        let expansion = expand_tuple_rest(interner, rest.type_id);
        positions.extend(expansion.fixed.iter().copied());
        // Elements after a variadic run have no fixed index; they widen it.
        let trailing_required = expansion.tail.iter().filter(|elem| !elem.optional).count();
        let variadic = if expansion.tail.is_empty() {
            expansion.variadic
        } else {
            let members = expansion
                .variadic
                .into_iter()
                .chain(expansion.tail.iter().map(|elem| elem.type_id))
                .collect();
            Some(interner.union(members))
        };
        Self {
            positions,
            variadic,
            trailing_required,
        }
    }

    /// Number of arguments a caller must supply.
    pub(crate) fn required_count(&self) -> usize {
        let leading = self
            .positions
            .iter()
            .rposition(|elem| !elem.optional)
            .map_or(0, |index| index + 1);
        leading + self.trailing_required
    }

    /// `None` when any number of further arguments is accepted.
    pub(crate) fn max_count(&self) -> Option<usize> {
        match self.variadic {
            Some(_) => None,
            None => Some(self.positions.len()),
        }
    }

    /// Parameter type the argument at `index` is checked against.
    pub(crate) fn type_at(&self, index: usize) -> Option<TypeId> {
        match self.positions.get(index) {
            Some(elem) => Some(elem.type_id),
            None => self.variadic,
        }
    }
}

impl<'a, R: TypeResolver> SubtypeChecker<'a, R> {
    pub(crate) fn check_function_subtype(
        &mut self,
        source: &FunctionShape,
        target: &FunctionShape,
    ) -> SubtypeResult {
        if source.is_constructor != target.is_constructor {
            return SubtypeResult::False;
        }

        // Whatever a `void` callback returns is ignored by its caller.
        if target.return_type != TypeId::VOID
            && !self
                .check_subtype(source.return_type, target.return_type)
                .is_true()
        {
            return SubtypeResult::False;
        }

        let s_params = ParameterList::of(self.interner, source);
        let t_params = ParameterList::of(self.interner, target);
        if self.has_too_many_parameters(&s_params, &t_params) {
            return SubtypeResult::False;
        }

        let positions = s_params.positions.len().max(t_params.positions.len());
        for index in 0..positions {
            let (Some(s_param), Some(t_param)) = (s_params.type_at(index), t_params.type_at(index))
            else {
                continue;
            };
            if !self.are_parameters_compatible(s_param, t_param) {
                return SubtypeResult::False;
            }
        }

        if let (Some(s_rest), Some(t_rest)) = (s_params.variadic, t_params.variadic) {
            if !self.are_parameters_compatible(s_rest, t_rest) {
                return SubtypeResult::False;
            }
        }

        SubtypeResult::True
    }

    /// The source needs more arguments than a caller of the target passes.
    pub(crate) fn has_too_many_parameters(
        &self,
        source: &ParameterList,
        target: &ParameterList,
    ) -> bool {
        target
            .max_count()
            .is_some_and(|max| source.required_count() > max)
    }

    pub(crate) fn are_parameters_compatible(&mut self, source: TypeId, target: TypeId) -> bool {
        if self.check_subtype(target, source).is_true() {
            return true;
        }
        !self.strict_function_types && self.check_subtype(source, target).is_true()
    }
}
