//! Type representation.
//!
//! Types are hash-consed: every structural [`TypeData`] value is stored once
//! in the [`TypeInterner`](crate::TypeInterner) and referred to by a copyable
//! [`TypeId`]. Two types are structurally identical exactly when their ids
//! are equal.
//!
//! Variable-length payloads (property lists, tuple elements, union members,
//! signatures) live in side tables and are referenced by their own ids so
//! that `TypeData` stays `Copy`.

use crate::def::DefId;
use bitflags::bitflags;
use serde::Serialize;
use structype_common::Atom;

// =============================================================================
// TypeId
// =============================================================================

/// Handle to an interned type.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct TypeId(pub u32);

impl TypeId {
    /// Produced when a computation cannot yield a meaningful type.
    pub const ERROR: Self = Self(0);
    pub const NEVER: Self = Self(1);
    pub const UNKNOWN: Self = Self(2);
    pub const ANY: Self = Self(3);
    pub const VOID: Self = Self(4);
    pub const UNDEFINED: Self = Self(5);
    pub const NULL: Self = Self(6);
    pub const BOOLEAN: Self = Self(7);
    pub const NUMBER: Self = Self(8);
    pub const STRING: Self = Self(9);
    pub const BIGINT: Self = Self(10);
    pub const SYMBOL: Self = Self(11);
    /// The non-primitive `object` type.
    pub const OBJECT: Self = Self(12);
    pub const BOOLEAN_TRUE: Self = Self(13);
    pub const BOOLEAN_FALSE: Self = Self(14);

    /// First id handed out for non-intrinsic types.
    pub const FIRST_USER: u32 = 100;

    #[inline]
    pub const fn is_intrinsic(self) -> bool {
        self.0 < Self::FIRST_USER
    }

    #[inline]
    pub const fn is_never(self) -> bool {
        self.0 == Self::NEVER.0
    }

    #[inline]
    pub const fn is_unknown(self) -> bool {
        self.0 == Self::UNKNOWN.0
    }

    #[inline]
    pub const fn is_any(self) -> bool {
        self.0 == Self::ANY.0
    }

    #[inline]
    pub const fn is_any_or_unknown(self) -> bool {
        self.is_any() || self.is_unknown()
    }

    #[inline]
    pub const fn is_error(self) -> bool {
        self.0 == Self::ERROR.0
    }

    /// `null` or `undefined`.
    #[inline]
    pub const fn is_nullish(self) -> bool {
        self.0 == Self::NULL.0 || self.0 == Self::UNDEFINED.0
    }
}

// =============================================================================
// Intrinsics and literals
// =============================================================================

/// Built-in types with fixed ids.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum IntrinsicKind {
    Error,
    Never,
    Unknown,
    Any,
    Void,
    Undefined,
    Null,
    Boolean,
    Number,
    String,
    Bigint,
    Symbol,
    Object,
}

impl IntrinsicKind {
    pub const ALL: [IntrinsicKind; 13] = [
        IntrinsicKind::Error,
        IntrinsicKind::Never,
        IntrinsicKind::Unknown,
        IntrinsicKind::Any,
        IntrinsicKind::Void,
        IntrinsicKind::Undefined,
        IntrinsicKind::Null,
        IntrinsicKind::Boolean,
        IntrinsicKind::Number,
        IntrinsicKind::String,
        IntrinsicKind::Bigint,
        IntrinsicKind::Symbol,
        IntrinsicKind::Object,
    ];

    pub const fn type_id(self) -> TypeId {
        match self {
            IntrinsicKind::Error => TypeId::ERROR,
            IntrinsicKind::Never => TypeId::NEVER,
            IntrinsicKind::Unknown => TypeId::UNKNOWN,
            IntrinsicKind::Any => TypeId::ANY,
            IntrinsicKind::Void => TypeId::VOID,
            IntrinsicKind::Undefined => TypeId::UNDEFINED,
            IntrinsicKind::Null => TypeId::NULL,
            IntrinsicKind::Boolean => TypeId::BOOLEAN,
            IntrinsicKind::Number => TypeId::NUMBER,
            IntrinsicKind::String => TypeId::STRING,
            IntrinsicKind::Bigint => TypeId::BIGINT,
            IntrinsicKind::Symbol => TypeId::SYMBOL,
            IntrinsicKind::Object => TypeId::OBJECT,
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            IntrinsicKind::Error => "error",
            IntrinsicKind::Never => "never",
            IntrinsicKind::Unknown => "unknown",
            IntrinsicKind::Any => "any",
            IntrinsicKind::Void => "void",
            IntrinsicKind::Undefined => "undefined",
            IntrinsicKind::Null => "null",
            IntrinsicKind::Boolean => "boolean",
            IntrinsicKind::Number => "number",
            IntrinsicKind::String => "string",
            IntrinsicKind::Bigint => "bigint",
            IntrinsicKind::Symbol => "symbol",
            IntrinsicKind::Object => "object",
        }
    }

    /// Primitive kinds that values can inhabit (used for disjointness).
    pub const fn is_primitive(self) -> bool {
        matches!(
            self,
            IntrinsicKind::Boolean
                | IntrinsicKind::Number
                | IntrinsicKind::String
                | IntrinsicKind::Bigint
                | IntrinsicKind::Symbol
                | IntrinsicKind::Null
                | IntrinsicKind::Undefined
        )
    }
}

/// `f64` with bitwise equality so it can be hashed.
///
/// `-0.0` is normalised to `0.0` and every NaN to one canonical NaN.
#[derive(Copy, Clone, Debug)]
pub struct OrderedFloat(pub f64);

impl OrderedFloat {
    fn canonical_bits(self) -> u64 {
        if self.0.is_nan() {
            f64::NAN.to_bits()
        } else if self.0 == 0.0 {
            0.0f64.to_bits()
        } else {
            self.0.to_bits()
        }
    }
}

impl PartialEq for OrderedFloat {
    fn eq(&self, other: &Self) -> bool {
        self.canonical_bits() == other.canonical_bits()
    }
}

impl Eq for OrderedFloat {}

impl std::hash::Hash for OrderedFloat {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.canonical_bits().hash(state);
    }
}

/// Value of a literal type.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum LiteralValue {
    String(Atom),
    Number(OrderedFloat),
    Boolean(bool),
    BigInt(Atom),
}

impl LiteralValue {
    /// The primitive this literal widens to.
    pub const fn primitive(&self) -> TypeId {
        match self {
            LiteralValue::String(_) => TypeId::STRING,
            LiteralValue::Number(_) => TypeId::NUMBER,
            LiteralValue::Boolean(_) => TypeId::BOOLEAN,
            LiteralValue::BigInt(_) => TypeId::BIGINT,
        }
    }
}

// =============================================================================
// Objects
// =============================================================================

bitflags! {
    /// Per-object flags that don't affect structure.
    #[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
    pub struct ObjectFlags: u8 {
        /// Object type of an object literal expression that has not been
        /// assigned to a variable yet. Subject to excess property checks.
        const FRESH_LITERAL = 1 << 0;
    }
}

/// A named property of an object type.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct PropertyInfo {
    pub name: Atom,
    pub type_id: TypeId,
    pub optional: bool,
    pub readonly: bool,
}

impl PropertyInfo {
    /// A required, mutable property.
    pub const fn new(name: Atom, type_id: TypeId) -> Self {
        Self {
            name,
            type_id,
            optional: false,
            readonly: false,
        }
    }

    /// An optional (`?`) property.
    pub const fn opt(name: Atom, type_id: TypeId) -> Self {
        Self {
            name,
            type_id,
            optional: true,
            readonly: false,
        }
    }

    pub const fn with_optional(mut self, optional: bool) -> Self {
        self.optional = optional;
        self
    }

    pub const fn with_readonly(mut self, readonly: bool) -> Self {
        self.readonly = readonly;
        self
    }
}

/// Property list of an object type, sorted by name.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct ObjectShape {
    pub flags: ObjectFlags,
    pub properties: Vec<PropertyInfo>,
}

impl ObjectShape {
    pub fn find(&self, name: Atom) -> Option<&PropertyInfo> {
        self.properties
            .binary_search_by_key(&name, |prop| prop.name)
            .ok()
            .map(|index| &self.properties[index])
    }

    pub fn is_fresh(&self) -> bool {
        self.flags.contains(ObjectFlags::FRESH_LITERAL)
    }

    /// A weak type has at least one property and every property is optional.
    pub fn is_weak(&self) -> bool {
        !self.properties.is_empty() && self.properties.iter().all(|prop| prop.optional)
    }
}

// =============================================================================
// Tuples
// =============================================================================

/// One position of a tuple type.
///
/// For a rest element (`...T`), `type_id` is the spread type (usually an
/// array type), not the element type.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct TupleElement {
    pub type_id: TypeId,
    pub optional: bool,
    pub rest: bool,
}

impl TupleElement {
    pub const fn required(type_id: TypeId) -> Self {
        Self {
            type_id,
            optional: false,
            rest: false,
        }
    }

    pub const fn optional(type_id: TypeId) -> Self {
        Self {
            type_id,
            optional: true,
            rest: false,
        }
    }

    pub const fn rest(spread_type: TypeId) -> Self {
        Self {
            type_id: spread_type,
            optional: false,
            rest: true,
        }
    }
}

// =============================================================================
// Functions
// =============================================================================

/// A function parameter. Names are informational only.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct ParamInfo {
    pub name: Option<Atom>,
    pub type_id: TypeId,
    pub optional: bool,
    /// `...name: T[]`; `type_id` is the array type.
    pub rest: bool,
}

impl ParamInfo {
    pub const fn required(type_id: TypeId) -> Self {
        Self {
            name: None,
            type_id,
            optional: false,
            rest: false,
        }
    }

    pub const fn optional(type_id: TypeId) -> Self {
        Self {
            name: None,
            type_id,
            optional: true,
            rest: false,
        }
    }

    pub const fn rest(array_type: TypeId) -> Self {
        Self {
            name: None,
            type_id: array_type,
            optional: false,
            rest: true,
        }
    }

    pub const fn named(mut self, name: Atom) -> Self {
        self.name = Some(name);
        self
    }
}

/// A call or construct signature.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct FunctionShape {
    pub params: Vec<ParamInfo>,
    pub return_type: TypeId,
    pub is_constructor: bool,
}

impl FunctionShape {
    pub fn new(params: Vec<ParamInfo>, return_type: TypeId) -> Self {
        Self {
            params,
            return_type,
            is_constructor: false,
        }
    }

    /// Parameters before the rest parameter.
    pub fn fixed_params(&self) -> &[ParamInfo] {
        match self.params.iter().position(|param| param.rest) {
            Some(index) => &self.params[..index],
            None => &self.params,
        }
    }

    pub fn rest_param(&self) -> Option<&ParamInfo> {
        self.params.iter().find(|param| param.rest)
    }

    /// Number of arguments a caller must supply.
    pub fn required_count(&self) -> usize {
        self.fixed_params()
            .iter()
            .rposition(|param| !param.optional)
            .map_or(0, |index| index + 1)
    }
}

// =============================================================================
// Generics and type-level computation
// =============================================================================

/// A type parameter (`T extends C`) or an `infer` placeholder.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct TypeParamInfo {
    pub name: Atom,
    pub constraint: Option<TypeId>,
}

/// A generic reference `Base<Args>`; `base` is a `Lazy` definition.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct TypeApplication {
    pub base: TypeId,
    pub args: Vec<TypeId>,
}

/// `check_type extends extends_type ? true_type : false_type`
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct ConditionalType {
    pub check_type: TypeId,
    pub extends_type: TypeId,
    pub true_type: TypeId,
    pub false_type: TypeId,
    /// The check type was a naked type parameter, so unions distribute.
    pub is_distributive: bool,
}

/// `+` / `-` on a mapped type modifier.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum MappedModifier {
    Add,
    Remove,
}

/// `{ [P in Constraint]: Template }` with optional modifiers.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct MappedType {
    pub type_param: TypeParamInfo,
    pub constraint: TypeId,
    pub template: TypeId,
    pub readonly_modifier: Option<MappedModifier>,
    pub optional_modifier: Option<MappedModifier>,
}

/// One span of a template literal type.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum TemplateSpan {
    Text(Atom),
    Type(TypeId),
}

// =============================================================================
// Side-table ids
// =============================================================================

macro_rules! side_table_id {
    ($($(#[$meta:meta])* $name:ident;)*) => {
        $(
            $(#[$meta])*
            #[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
            pub struct $name(pub u32);
        )*
    };
}

side_table_id! {
    ObjectShapeId;
    TupleListId;
    /// Sorted, deduplicated member list of a union or intersection.
    TypeListId;
    FunctionShapeId;
    TypeApplicationId;
    ConditionalTypeId;
    MappedTypeId;
    TemplateLiteralId;
}

// =============================================================================
// TypeData
// =============================================================================

/// Structural content of a type.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum TypeData {
    Intrinsic(IntrinsicKind),
    Literal(LiteralValue),
    Object(ObjectShapeId),
    Array(TypeId),
    Tuple(TupleListId),
    /// `readonly T[]` / `readonly [...]`
    ReadonlyType(TypeId),
    Union(TypeListId),
    Intersection(TypeListId),
    Function(FunctionShapeId),
    TypeParameter(TypeParamInfo),
    Infer(TypeParamInfo),
    /// Named definition, resolved on demand through a `TypeResolver`.
    Lazy(DefId),
    Application(TypeApplicationId),
    Conditional(ConditionalTypeId),
    Mapped(MappedTypeId),
    /// `Object[Index]`
    IndexAccess(TypeId, TypeId),
    KeyOf(TypeId),
    TemplateLiteral(TemplateLiteralId),
}

#[cfg(test)]
#[path = "../tests/types_tests.rs"]
mod tests;
