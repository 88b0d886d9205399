//! Type narrowing for discriminated unions and type guards.
//!
//! ```typescript
//! type Action =
//!   | { type: "add", value: number }
//!   | { type: "remove", id: string };
//!
//! if (action.type === "add") { /* { type: "add", value: number } */ }
//! if (typeof x === "string") { /* string members of x */ }
//! if ("id" in action)        { /* members that may have `id` */ }
//! ```
//!
//! Narrowing is type algebra only: callers describe the condition with a
//! [`TypeGuard`] and get the type of each branch back.

use crate::intern::TypeInterner;
use crate::subtype::{NOOP_RESOLVER, SubtypeChecker};
use crate::type_resolver::{NoopResolver, TypeResolver};
use crate::types::*;
use crate::visitor::union_members;
use structype_common::{Atom, CheckerOptions};
use tracing::{Level, span, trace};

/// A narrowing condition, independent of the syntax it came from.
#[derive(Clone, Debug, PartialEq)]
pub enum TypeGuard {
    /// `typeof x === "typename"`
    Typeof(String),
    /// `x === literal`
    LiteralEquality(TypeId),
    /// `x == null`
    NullishEquality,
    /// `x.prop === literal`
    Discriminant { property_name: Atom, value_type: TypeId },
    /// `"prop" in x`
    InProperty(Atom),
}

/// Types of the two branches of a condition.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct NarrowingResult {
    pub true_type: TypeId,
    pub false_type: TypeId,
}

pub struct NarrowingContext<'a, R: TypeResolver = NoopResolver> {
    interner: &'a TypeInterner,
    resolver: &'a R,
    options: CheckerOptions,
}

impl<'a> NarrowingContext<'a, NoopResolver> {
    pub fn new(interner: &'a TypeInterner) -> Self {
        Self::with_resolver(interner, &NOOP_RESOLVER)
    }
}

impl<'a, R: TypeResolver> NarrowingContext<'a, R> {
    pub fn with_resolver(interner: &'a TypeInterner, resolver: &'a R) -> Self {
        Self {
            interner,
            resolver,
            options: CheckerOptions::default(),
        }
    }

    pub fn with_options(mut self, options: &CheckerOptions) -> Self {
        self.options = *options;
        self
    }

    fn checker(&self) -> SubtypeChecker<'a, R> {
        SubtypeChecker::with_resolver(self.interner, self.resolver).with_options(&self.options)
    }

    fn is_subtype(&self, source: TypeId, target: TypeId) -> bool {
        self.checker().is_subtype_of(source, target)
    }

    /// Union members with deferred forms reduced.
    fn members(&self, type_id: TypeId) -> Vec<TypeId> {
        let mut checker = self.checker();
        let resolved = checker.resolve_for_relation(type_id);
        union_members(self.interner, resolved)
            .into_iter()
            .map(|member| checker.resolve_for_relation(member))
            .collect()
    }

    fn filter(&self, type_id: TypeId, mut keep: impl FnMut(&Self, TypeId) -> bool) -> TypeId {
        let kept: Vec<TypeId> = self
            .members(type_id)
            .into_iter()
            .filter(|member| keep(self, *member))
            .collect();
        self.interner.union(kept)
    }

    /// Both branches of `guard`.
    pub fn narrow_branches(&self, source: TypeId, guard: &TypeGuard) -> NarrowingResult {
        NarrowingResult {
            true_type: self.narrow_type(source, guard, true),
            false_type: self.narrow_type(source, guard, false),
        }
    }

    /// Type of `source` where `guard` evaluated to `sense`.
    pub fn narrow_type(&self, source: TypeId, guard: &TypeGuard, sense: bool) -> TypeId {
        let _span = span!(Level::TRACE, "narrow_type", source = source.0, sense).entered();
        let narrowed = match guard {
            TypeGuard::Typeof(tag) if sense => self.narrow_by_typeof(source, tag),
            TypeGuard::Typeof(tag) => self.narrow_by_typeof_negation(source, tag),
            TypeGuard::LiteralEquality(literal) if sense => self.narrow_to_type(source, *literal),
            TypeGuard::LiteralEquality(literal) => self.narrow_excluding_type(source, *literal),
            TypeGuard::NullishEquality if sense => {
                let nullish = self.interner.union2(TypeId::NULL, TypeId::UNDEFINED);
                self.narrow_to_type(source, nullish)
            }
            TypeGuard::NullishEquality => {
                let nullish = self.interner.union2(TypeId::NULL, TypeId::UNDEFINED);
                self.narrow_excluding_type(source, nullish)
            }
            TypeGuard::Discriminant {
                property_name,
                value_type,
            } => {
                if sense {
                    self.narrow_by_discriminant(source, *property_name, *value_type)
                } else {
                    self.narrow_by_excluding_discriminant(source, *property_name, *value_type)
                }
            }
            TypeGuard::InProperty(name) => self.narrow_by_property_presence(source, *name, sense),
        };
        trace!(source = source.0, narrowed = narrowed.0, sense, "narrowed");
        narrowed
    }

    /// Type of property `name` on an object member, with `undefined` added
    /// when it is optional.
    fn property_type(&self, member: TypeId, name: Atom) -> Option<TypeId> {
        let TypeData::Object(shape_id) = self.interner.lookup(member)? else {
            return None;
        };
        let shape = self.interner.object_shape(shape_id);
        let prop = shape.find(name)?;
        Some(if prop.optional {
            self.interner.union2(prop.type_id, TypeId::UNDEFINED)
        } else {
            prop.type_id
        })
    }

    /// `x.kind === "a"`: keep members whose `kind` can be `"a"`.
    pub fn narrow_by_discriminant(&self, source: TypeId, property: Atom, value: TypeId) -> TypeId {
        self.filter(source, |ctx, member| match ctx.property_type(member, property) {
            Some(prop_type) => ctx.is_subtype(value, prop_type),
            None => false,
        })
    }

    /// `x.kind !== "a"`: drop members whose `kind` is exactly `"a"`.
    pub fn narrow_by_excluding_discriminant(
        &self,
        source: TypeId,
        property: Atom,
        value: TypeId,
    ) -> TypeId {
        self.filter(source, |ctx, member| match ctx.property_type(member, property) {
            Some(prop_type) => !ctx.is_subtype(prop_type, value),
            None => true,
        })
    }

    /// `typeof x === tag`
    pub fn narrow_by_typeof(&self, source: TypeId, tag: &str) -> TypeId {
        if source.is_any_or_unknown() {
            return match typeof_target(tag) {
                Some(target) => self.typeof_top_narrowing(source, tag, target),
                None => source,
            };
        }
        self.filter(source, |ctx, member| ctx.typeof_tag(member) == Some(tag))
    }

    /// `typeof x !== tag`
    pub fn narrow_by_typeof_negation(&self, source: TypeId, tag: &str) -> TypeId {
        if source.is_any_or_unknown() {
            return source;
        }
        self.filter(source, |ctx, member| ctx.typeof_tag(member) != Some(tag))
    }

    fn typeof_top_narrowing(&self, source: TypeId, tag: &str, target: TypeId) -> TypeId {
        if tag == "object" {
            return self.interner.union2(TypeId::OBJECT, TypeId::NULL);
        }
        if tag == "function" {
            return source;
        }
        target
    }

    /// What `typeof` reports for a value of type `member`, when fixed.
    fn typeof_tag(&self, member: TypeId) -> Option<&'static str> {
        let tag = match member {
            TypeId::STRING => "string",
            TypeId::NUMBER => "number",
            TypeId::BOOLEAN | TypeId::BOOLEAN_TRUE | TypeId::BOOLEAN_FALSE => "boolean",
            TypeId::BIGINT => "bigint",
            TypeId::SYMBOL => "symbol",
            TypeId::UNDEFINED | TypeId::VOID => "undefined",
            TypeId::NULL | TypeId::OBJECT => "object",
            _ => match self.interner.lookup(member)? {
                TypeData::Literal(value) => match value {
                    LiteralValue::String(_) => "string",
                    LiteralValue::Number(_) => "number",
                    LiteralValue::Boolean(_) => "boolean",
                    LiteralValue::BigInt(_) => "bigint",
                },
                TypeData::TemplateLiteral(_) => "string",
                TypeData::Function(_) => "function",
                TypeData::Object(_)
                | TypeData::Array(_)
                | TypeData::Tuple(_)
                | TypeData::ReadonlyType(_) => "object",
                TypeData::TypeParameter(info) => return self.typeof_tag(info.constraint?),
                _ => return None,
            },
        };
        Some(tag)
    }

    /// `"name" in x`: on the true branch keep members that have or may have
    /// `name`; on the false branch keep members that lack it or only
    /// optionally have it.
    pub fn narrow_by_property_presence(&self, source: TypeId, name: Atom, present: bool) -> TypeId {
        self.filter(source, |ctx, member| {
            let Some(TypeData::Object(shape_id)) = ctx.interner.lookup(member) else {
                // Non-object members can't be the operand of `in`; type
                // parameters and `object` stay on both branches.
                return !matches!(ctx.typeof_tag(member), Some(tag) if tag != "object")
                    && !member.is_nullish();
            };
            match ctx.interner.object_shape(shape_id).find(name) {
                Some(prop) if prop.optional => true,
                Some(_) => present,
                None => !present,
            }
        })
    }

    /// Keep the members assignable to `target`. When none is, but `target`
    /// itself fits inside `source`, the result is `target`.
    pub fn narrow_to_type(&self, source: TypeId, target: TypeId) -> TypeId {
        if source.is_any_or_unknown() {
            return target;
        }
        let narrowed = self.filter(source, |ctx, member| ctx.is_subtype(member, target));
        if !narrowed.is_never() {
            return narrowed;
        }
        // `string` narrowed by `=== "a"` is `"a"`.
        let wider: Vec<TypeId> = self
            .members(target)
            .into_iter()
            .filter(|candidate| self.is_subtype(*candidate, source))
            .collect();
        self.interner.union(wider)
    }

    /// Drop the members assignable to `excluded`.
    pub fn narrow_excluding_type(&self, source: TypeId, excluded: TypeId) -> TypeId {
        if source.is_any_or_unknown() {
            return source;
        }
        self.filter(source, |ctx, member| !ctx.is_subtype(member, excluded))
    }
}

/// The type a `typeof` tag narrows `unknown` to.
fn typeof_target(tag: &str) -> Option<TypeId> {
    Some(match tag {
        "string" => TypeId::STRING,
        "number" => TypeId::NUMBER,
        "boolean" => TypeId::BOOLEAN,
        "bigint" => TypeId::BIGINT,
        "symbol" => TypeId::SYMBOL,
        "undefined" => TypeId::UNDEFINED,
        "object" => TypeId::OBJECT,
        "function" => TypeId::UNKNOWN,
        _ => return None,
    })
}

#[cfg(test)]
#[path = "../tests/narrowing_tests.rs"]
mod tests;
