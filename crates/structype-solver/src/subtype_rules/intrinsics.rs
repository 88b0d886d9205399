//! Intrinsic, literal and template literal subtype checking.
//!
//! This module handles:
//! - The intrinsic hierarchy (`undefined <: void`, everything else by identity)
//! - The `object` keyword type
//! - Apparent shapes of primitives, arrays and tuples when they are compared
//!   against object types
//! - String literals and template literals against template literal types

use crate::evaluate_rules::template_literal::match_template_spans;
use crate::subtype::{SubtypeChecker, SubtypeResult};
use crate::type_resolver::TypeResolver;
use crate::types::*;
use crate::utils::number_to_string;
use structype_common::Atom;

impl<'a, R: TypeResolver> SubtypeChecker<'a, R> {
    /// Intrinsic types are related by identity, except that `void` accepts
    /// `undefined`.
    ///
    /// ```typescript
    /// let x: void = undefined;  // ✅
    /// let y: number = null;     // ❌ (strict mode; loose mode is handled earlier)
    /// ```
    pub(crate) fn check_intrinsic_subtype(
        &self,
        source: IntrinsicKind,
        target: IntrinsicKind,
    ) -> SubtypeResult {
        if source == target {
            return SubtypeResult::True;
        }
        match (source, target) {
            (IntrinsicKind::Undefined, IntrinsicKind::Void) => SubtypeResult::True,
            _ => SubtypeResult::False,
        }
    }

    /// Whether `source` is assignable to the `object` keyword type: anything
    /// that is not a primitive.
    ///
    /// ```typescript
    /// let a: object = { x: 1 };   // ✅
    /// let b: object = [1, 2, 3];  // ✅
    /// let c: object = () => {};   // ✅
    /// let d: object = 42;         // ❌
    /// let e: object = null;       // ❌
    /// ```
    pub(crate) fn is_object_keyword_type(&mut self, source: TypeId) -> bool {
        match source {
            TypeId::ANY | TypeId::NEVER | TypeId::ERROR | TypeId::OBJECT => return true,
            TypeId::UNKNOWN
            | TypeId::VOID
            | TypeId::NULL
            | TypeId::UNDEFINED
            | TypeId::BOOLEAN
            | TypeId::NUMBER
            | TypeId::STRING
            | TypeId::BIGINT
            | TypeId::SYMBOL => return false,
            _ => {}
        }
        match self.interner.lookup(source) {
            Some(
                TypeData::Object(_)
                | TypeData::Array(_)
                | TypeData::Tuple(_)
                | TypeData::ReadonlyType(_)
                | TypeData::Function(_)
                | TypeData::Mapped(_),
            ) => true,
            Some(TypeData::TypeParameter(info) | TypeData::Infer(info)) => match info.constraint {
                Some(constraint) => self.check_subtype(constraint, TypeId::OBJECT).is_true(),
                None => false,
            },
            _ => false,
        }
    }

    /// Object view of a non-object type, used when it is compared against an
    /// object type. Strings, arrays and tuples expose `length`; tuples also
    /// expose their positions as `"0"`, `"1"`, ...
    ///
    /// Returns `None` for types that have no members at all (`null`,
    /// `undefined`, `void`, `unknown`).
    pub(crate) fn apparent_shape(&mut self, source: TypeId) -> Option<ObjectShape> {
        let length = self.interner.intern_string("length");
        let data = self.interner.lookup(source)?;
        let properties = match data {
            TypeData::Intrinsic(IntrinsicKind::String)
            | TypeData::Literal(LiteralValue::String(_))
            | TypeData::TemplateLiteral(_) => {
                vec![PropertyInfo::new(length, TypeId::NUMBER).with_readonly(true)]
            }
            TypeData::Intrinsic(
                IntrinsicKind::Number
                | IntrinsicKind::Boolean
                | IntrinsicKind::Bigint
                | IntrinsicKind::Symbol
                | IntrinsicKind::Object,
            )
            | TypeData::Literal(_)
            | TypeData::Function(_) => Vec::new(),
            TypeData::Array(_) => vec![PropertyInfo::new(length, TypeId::NUMBER)],
            TypeData::Tuple(list_id) => self.tuple_apparent_properties(list_id, length),
            TypeData::ReadonlyType(inner) => {
                let mut shape = self.apparent_shape(inner)?;
                for prop in &mut shape.properties {
                    prop.readonly = true;
                }
                return Some(shape);
            }
            TypeData::KeyOf(_) => Vec::new(),
            _ => return None,
        };
        let mut properties = properties;
        properties.sort_by_key(|prop| prop.name);
        Some(ObjectShape {
            flags: ObjectFlags::empty(),
            properties,
        })
    }

    fn tuple_apparent_properties(&self, list_id: TupleListId, length: Atom) -> Vec<PropertyInfo> {
        let elements = self.interner.tuple_list(list_id);
        let mut properties = Vec::with_capacity(elements.len() + 1);
        let mut open = false;
        for (index, element) in elements.iter().enumerate() {
            if element.rest {
                open = true;
                break;
            }
            let name = self.interner.intern_string(&index.to_string());
            properties
                .push(PropertyInfo::new(name, element.type_id).with_optional(element.optional));
        }
        let fixed = properties.len();
        let all_required = properties.iter().all(|prop| !prop.optional);
        let length_type = if open {
            TypeId::NUMBER
        } else if all_required {
            self.interner.literal_number(fixed as f64)
        } else {
            let first_optional = properties.iter().position(|prop| prop.optional).unwrap_or(fixed);
            let lengths = (first_optional..=fixed)
                .map(|count| self.interner.literal_number(count as f64))
                .collect();
            self.interner.union(lengths)
        };
        properties.push(PropertyInfo::new(length, length_type).with_readonly(true));
        properties
    }

    /// `"a-1" <: `a-${number}``
    pub(crate) fn check_string_to_template_subtype(
        &mut self,
        text: Atom,
        template: TemplateLiteralId,
    ) -> SubtypeResult {
        let text = self.interner.resolve_atom(text);
        let spans = self.interner.template_list(template);
        SubtypeResult::from_bool(match_template_spans(self.interner, &text, &spans).is_some())
    }

    /// Template to template: same layout, each hole related.
    ///
    /// ```typescript
    /// type A = `id-${1 | 2}`;     // normalised to a literal union before we get here
    /// type B = `id-${"x"}${number}`;
    /// let b: `id-${string}` = null! as B;  // ✅ every hole of B fits the string hole
    /// ```
    pub(crate) fn check_template_to_template_subtype(
        &mut self,
        source: TemplateLiteralId,
        target: TemplateLiteralId,
    ) -> SubtypeResult {
        let s_spans = self.interner.template_list(source);
        let t_spans = self.interner.template_list(target);
        if s_spans.len() != t_spans.len() {
            return SubtypeResult::False;
        }
        for (s_span, t_span) in s_spans.iter().zip(t_spans.iter()) {
            match (s_span, t_span) {
                (TemplateSpan::Text(a), TemplateSpan::Text(b)) if a == b => {}
                (TemplateSpan::Type(s_hole), TemplateSpan::Type(t_hole)) => {
                    if !self.check_template_hole(*s_hole, *t_hole) {
                        return SubtypeResult::False;
                    }
                }
                _ => return SubtypeResult::False,
            }
        }
        SubtypeResult::True
    }

    fn check_template_hole(&mut self, source: TypeId, target: TypeId) -> bool {
        if target == TypeId::STRING {
            return true;
        }
        // A literal hole renders to a fixed string; compare that text.
        if let Some(TypeData::Literal(LiteralValue::Number(value))) = self.interner.lookup(source)
            && let Some(TypeData::Literal(LiteralValue::String(expected))) =
                self.interner.lookup(target)
        {
            return *self.interner.resolve_atom(expected) == number_to_string(value.0);
        }
        self.check_subtype(source, target).is_true()
    }
}
