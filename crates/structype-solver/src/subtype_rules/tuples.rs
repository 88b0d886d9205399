//! Tuple and array subtype checking.
//!
//! Handles fixed tuples (`[number, string]`), optional elements
//! (`[number, string?]`), variadic tuples (`[number, ...string[]]`, including
//! rest elements in the middle) and the array/tuple cross cases.

use crate::intern::TypeInterner;
use crate::subtype::{SubtypeChecker, SubtypeResult};
use crate::type_resolver::TypeResolver;
use crate::types::*;
use crate::visitor::{array_element_type, readonly_inner_type, tuple_list_id};

/// A rest element flattened into prefix / variadic / suffix.
pub(crate) struct TupleRestExpansion {
    pub fixed: Vec<TupleElement>,
    /// Element type of the open-ended portion (`T` for `...T[]`).
    pub variadic: Option<TypeId>,
    pub tail: Vec<TupleElement>,
}

impl<'a, R: TypeResolver> SubtypeChecker<'a, R> {
    /// ## Rules:
    /// 1. Source must supply at least as many required elements as the target
    /// 2. Positions are compared pairwise; an optional source element cannot
    ///    fill a required target position
    /// 3. A closed target (no rest) rejects longer or open-ended sources
    /// 4. An open target matches its suffix from the end of the source and the
    ///    remaining source elements against the variadic element type
    ///
    /// ## Examples:
    /// - `[number, string]` ≤ `[number, string, boolean?]` ✅
    /// - `[number, ...string[]]` ≤ `[number, ...string[]]` ✅
    /// - `[number, string]` ≤ `[number]` ❌ (extra element)
    /// - `[number]` ≤ `[number, string]` ❌ (missing element)
    pub(crate) fn check_tuple_subtype(
        &mut self,
        source: &[TupleElement],
        target: &[TupleElement],
    ) -> SubtypeResult {
        let source_required = source.iter().filter(|e| !e.optional && !e.rest).count();
        let target_required = target.iter().filter(|e| !e.optional && !e.rest).count();
        if source_required < target_required {
            return SubtypeResult::False;
        }

        for (index, t_elem) in target.iter().enumerate() {
            if t_elem.rest {
                return SubtypeResult::from_bool(self.check_variadic_target(
                    source,
                    index,
                    t_elem.type_id,
                    &target[index + 1..],
                ));
            }
            match source.get(index) {
                // `[number, ...number[]]` does not fit `[number, number]`.
                Some(s_elem) if s_elem.rest => return SubtypeResult::False,
                Some(s_elem) => {
                    if s_elem.optional && !t_elem.optional {
                        return SubtypeResult::False;
                    }
                    if !self.check_subtype(s_elem.type_id, t_elem.type_id).is_true() {
                        return SubtypeResult::False;
                    }
                }
                None if t_elem.optional => {}
                None => return SubtypeResult::False,
            }
        }

        // Target is closed.
        if source.len() > target.len() || source.iter().any(|e| e.rest) {
            return SubtypeResult::False;
        }
        SubtypeResult::True
    }

    /// Match `source[start..]` against a target rest element `spread`
    /// followed by `outer_tail`.
    fn check_variadic_target(
        &mut self,
        source: &[TupleElement],
        start: usize,
        spread: TypeId,
        outer_tail: &[TupleElement],
    ) -> bool {
        let start = start.min(source.len());
        let expansion = self.expand_tuple_rest(spread);
        let suffix: Vec<TupleElement> = expansion
            .tail
            .iter()
            .chain(outer_tail.iter())
            .copied()
            .collect();

        // Suffix elements are matched from the end of the source.
        let mut source_end = source.len();
        for tail_elem in suffix.iter().rev() {
            if source_end <= start {
                if !tail_elem.optional {
                    return false;
                }
                break;
            }
            let s_elem = &source[source_end - 1];
            if s_elem.rest {
                if !tail_elem.optional {
                    return false;
                }
                break;
            }
            let related = self.check_subtype(s_elem.type_id, tail_elem.type_id).is_true();
            if !related {
                if tail_elem.optional {
                    break;
                }
                return false;
            }
            source_end -= 1;
        }

        let mut remaining = source[start..source_end].iter();
        for t_fixed in &expansion.fixed {
            match remaining.next() {
                Some(s_elem) if s_elem.rest => return false,
                Some(s_elem) => {
                    if !self.check_subtype(s_elem.type_id, t_fixed.type_id).is_true() {
                        return false;
                    }
                }
                None if t_fixed.optional => {}
                None => return false,
            }
        }

        let Some(variadic) = expansion.variadic else {
            return remaining.next().is_none();
        };
        let variadic_array = self.interner.array(variadic);
        for s_elem in remaining {
            let (element, expected) = if s_elem.rest {
                (s_elem.type_id, variadic_array)
            } else {
                (s_elem.type_id, variadic)
            };
            if !self.check_subtype(element, expected).is_true() {
                return false;
            }
        }
        true
    }

    /// Arrays are not assignable to tuples, with the single exception of
    /// `never[]` (the empty array literal) against a tuple that may be empty.
    ///
    /// - `never[]` ≤ `[]`, `[string?]`, `[...string[]]` ✅
    /// - `never[]` ≤ `[string]` ❌
    /// - `string[]` ≤ `[...string[]]` ❌
    pub(crate) fn check_array_to_tuple_subtype(
        &mut self,
        source_elem: TypeId,
        target: &[TupleElement],
    ) -> SubtypeResult {
        SubtypeResult::from_bool(source_elem == TypeId::NEVER && self.tuple_allows_empty(target))
    }

    /// Whether `[]` fits `target`: every element optional, or a rest element
    /// with nothing required after it.
    pub(crate) fn tuple_allows_empty(&self, target: &[TupleElement]) -> bool {
        for (index, elem) in target.iter().enumerate() {
            if elem.rest {
                let expansion = self.expand_tuple_rest(elem.type_id);
                return target[index + 1..].iter().all(|e| e.optional)
                    && expansion.fixed.iter().all(|e| e.optional)
                    && expansion.tail.iter().all(|e| e.optional);
            }
            if !elem.optional {
                return false;
            }
        }
        true
    }

    /// A tuple is an array of the union of its elements.
    ///
    /// - `[number, number]` ≤ `number[]` ✅
    /// - `[number, ...string[]]` ≤ `(number | string)[]` ✅
    /// - `[number, string]` ≤ `number[]` ❌
    pub(crate) fn check_tuple_to_array_subtype(
        &mut self,
        elems: TupleListId,
        t_elem: TypeId,
    ) -> SubtypeResult {
        let elems = self.interner.tuple_list(elems);
        for elem in elems.iter() {
            if !elem.rest {
                if !self.check_subtype(elem.type_id, t_elem).is_true() {
                    return SubtypeResult::False;
                }
                continue;
            }
            let expansion = self.expand_tuple_rest(elem.type_id);
            let spread = expansion
                .fixed
                .iter()
                .chain(expansion.tail.iter())
                .map(|e| e.type_id)
                .chain(expansion.variadic);
            for element in spread.collect::<Vec<_>>() {
                if !self.check_subtype(element, t_elem).is_true() {
                    return SubtypeResult::False;
                }
            }
        }
        SubtypeResult::True
    }

    pub(crate) fn expand_tuple_rest(&self, type_id: TypeId) -> TupleRestExpansion {
        expand_tuple_rest(self.interner, type_id)
    }
}

/// Flatten a rest element's spread type.
///
/// - `string[]` → variadic `string`
/// - `[A, ...B[], C]` → fixed `[A]`, variadic `B`, tail `[C]`
/// - anything else → variadic of its element type
pub(crate) fn expand_tuple_rest(interner: &TypeInterner, type_id: TypeId) -> TupleRestExpansion {
    if let Some(inner) = readonly_inner_type(interner, type_id) {
        return expand_tuple_rest(interner, inner);
    }
    if let Some(elem) = array_element_type(interner, type_id) {
        return TupleRestExpansion {
            fixed: Vec::new(),
            variadic: Some(elem),
            tail: Vec::new(),
        };
    }
    if let Some(list_id) = tuple_list_id(interner, type_id) {
        let elements = interner.tuple_list(list_id);
        let mut fixed = Vec::new();
        for (index, elem) in elements.iter().enumerate() {
            if elem.rest {
                let inner = expand_tuple_rest(interner, elem.type_id);
                fixed.extend(inner.fixed);
                let mut tail = inner.tail;
                tail.extend(elements[index + 1..].iter().copied());
                return TupleRestExpansion {
                    fixed,
                    variadic: inner.variadic,
                    tail,
                };
            }
            fixed.push(*elem);
        }
        return TupleRestExpansion {
            fixed,
            variadic: None,
            tail: Vec::new(),
        };
    }
    TupleRestExpansion {
        fixed: Vec::new(),
        variadic: Some(interner.rest_element_type(type_id)),
        tail: Vec::new(),
    }
}
