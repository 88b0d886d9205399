//! Object literal freshness.
//!
//! An object literal expression produces a *fresh* object type, which is
//! subject to excess property checks. Storing the value in a variable
//! widens it to the regular type, after which width subtyping applies.
//! Freshness lives in `ObjectFlags`, so fresh and regular shapes intern to
//! different ids.

use crate::intern::TypeInterner;
use crate::types::{ObjectFlags, PropertyInfo, TypeData, TypeId};

pub fn is_fresh_object_type(interner: &TypeInterner, type_id: TypeId) -> bool {
    match interner.lookup(type_id) {
        Some(TypeData::Object(shape_id)) => interner.object_shape(shape_id).is_fresh(),
        _ => false,
    }
}

/// The regular (non-fresh) version of `type_id`. Nested object literals in
/// property position are widened as well.
pub fn widen_freshness(interner: &TypeInterner, type_id: TypeId) -> TypeId {
    let Some(TypeData::Object(shape_id)) = interner.lookup(type_id) else {
        return type_id;
    };
    let shape = interner.object_shape(shape_id);
    let nested_fresh = shape
        .properties
        .iter()
        .any(|prop| is_fresh_object_type(interner, prop.type_id));
    if !shape.is_fresh() && !nested_fresh {
        return type_id;
    }
    let properties: Vec<PropertyInfo> = shape
        .properties
        .iter()
        .map(|prop| PropertyInfo {
            type_id: widen_freshness(interner, prop.type_id),
            ..*prop
        })
        .collect();
    interner.object_with_flags(properties, shape.flags - ObjectFlags::FRESH_LITERAL)
}
