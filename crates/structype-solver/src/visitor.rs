//! Type data extraction and traversal helpers.
//!
//! The extractors return the payload of one `TypeData` variant, or `None`
//! when the type is something else. The `contains_*` walkers answer
//! "does this type mention X anywhere" and stop at the first hit.

use crate::intern::TypeInterner;
use crate::types::{
    ConditionalTypeId, FunctionShapeId, LiteralValue, MappedTypeId, ObjectShapeId,
    TemplateLiteralId, TemplateSpan, TupleListId, TypeApplicationId, TypeData, TypeId, TypeListId,
    TypeParamInfo,
};
use rustc_hash::FxHashSet;

/// Extract the union list id if this is a union type.
pub fn union_list_id(interner: &TypeInterner, type_id: TypeId) -> Option<TypeListId> {
    match interner.lookup(type_id) {
        Some(TypeData::Union(list_id)) => Some(list_id),
        _ => None,
    }
}

/// Extract the intersection list id if this is an intersection type.
pub fn intersection_list_id(interner: &TypeInterner, type_id: TypeId) -> Option<TypeListId> {
    match interner.lookup(type_id) {
        Some(TypeData::Intersection(list_id)) => Some(list_id),
        _ => None,
    }
}

pub fn object_shape_id(interner: &TypeInterner, type_id: TypeId) -> Option<ObjectShapeId> {
    match interner.lookup(type_id) {
        Some(TypeData::Object(shape_id)) => Some(shape_id),
        _ => None,
    }
}

pub fn array_element_type(interner: &TypeInterner, type_id: TypeId) -> Option<TypeId> {
    match interner.lookup(type_id) {
        Some(TypeData::Array(element)) => Some(element),
        _ => None,
    }
}

pub fn tuple_list_id(interner: &TypeInterner, type_id: TypeId) -> Option<TupleListId> {
    match interner.lookup(type_id) {
        Some(TypeData::Tuple(list_id)) => Some(list_id),
        _ => None,
    }
}

pub fn readonly_inner_type(interner: &TypeInterner, type_id: TypeId) -> Option<TypeId> {
    match interner.lookup(type_id) {
        Some(TypeData::ReadonlyType(inner)) => Some(inner),
        _ => None,
    }
}

pub fn function_shape_id(interner: &TypeInterner, type_id: TypeId) -> Option<FunctionShapeId> {
    match interner.lookup(type_id) {
        Some(TypeData::Function(shape_id)) => Some(shape_id),
        _ => None,
    }
}

pub fn literal_value(interner: &TypeInterner, type_id: TypeId) -> Option<LiteralValue> {
    match interner.lookup(type_id) {
        Some(TypeData::Literal(value)) => Some(value),
        _ => None,
    }
}

pub fn type_param_info(interner: &TypeInterner, type_id: TypeId) -> Option<TypeParamInfo> {
    match interner.lookup(type_id) {
        Some(TypeData::TypeParameter(info)) => Some(info),
        _ => None,
    }
}

pub fn application_id(interner: &TypeInterner, type_id: TypeId) -> Option<TypeApplicationId> {
    match interner.lookup(type_id) {
        Some(TypeData::Application(app_id)) => Some(app_id),
        _ => None,
    }
}

pub fn conditional_type_id(interner: &TypeInterner, type_id: TypeId) -> Option<ConditionalTypeId> {
    match interner.lookup(type_id) {
        Some(TypeData::Conditional(cond_id)) => Some(cond_id),
        _ => None,
    }
}

pub fn mapped_type_id(interner: &TypeInterner, type_id: TypeId) -> Option<MappedTypeId> {
    match interner.lookup(type_id) {
        Some(TypeData::Mapped(mapped_id)) => Some(mapped_id),
        _ => None,
    }
}

pub fn template_literal_id(interner: &TypeInterner, type_id: TypeId) -> Option<TemplateLiteralId> {
    match interner.lookup(type_id) {
        Some(TypeData::TemplateLiteral(id)) => Some(id),
        _ => None,
    }
}

/// Literal types and `null`/`undefined`/`void`: types with exactly one value.
pub fn is_unit_type(interner: &TypeInterner, type_id: TypeId) -> bool {
    type_id.is_nullish()
        || type_id == TypeId::VOID
        || matches!(interner.lookup(type_id), Some(TypeData::Literal(_)))
}

/// Members of a union, or the type itself.
pub fn union_members(interner: &TypeInterner, type_id: TypeId) -> Vec<TypeId> {
    match union_list_id(interner, type_id) {
        Some(list_id) => interner.type_list(list_id).to_vec(),
        None => vec![type_id],
    }
}

// =============================================================================
// Traversal
// =============================================================================

/// Calls `f` on every type directly referenced by `type_id`.
///
/// Lazy references are not followed; callers that need the body resolve
/// it themselves.
pub fn for_each_child(interner: &TypeInterner, type_id: TypeId, mut f: impl FnMut(TypeId)) {
    let Some(data) = interner.lookup(type_id) else {
        return;
    };
    match data {
        TypeData::Intrinsic(_) | TypeData::Literal(_) | TypeData::Lazy(_) => {}
        TypeData::Object(shape_id) => {
            for prop in &interner.object_shape(shape_id).properties {
                f(prop.type_id);
            }
        }
        TypeData::Array(element) | TypeData::ReadonlyType(element) | TypeData::KeyOf(element) => {
            f(element)
        }
        TypeData::Tuple(list_id) => {
            for element in interner.tuple_list(list_id).iter() {
                f(element.type_id);
            }
        }
        TypeData::Union(list_id) | TypeData::Intersection(list_id) => {
            for &member in interner.type_list(list_id).iter() {
                f(member);
            }
        }
        TypeData::Function(shape_id) => {
            let shape = interner.function_shape(shape_id);
            for param in &shape.params {
                f(param.type_id);
            }
            f(shape.return_type);
        }
        TypeData::TypeParameter(info) | TypeData::Infer(info) => {
            if let Some(constraint) = info.constraint {
                f(constraint);
            }
        }
        TypeData::Application(app_id) => {
            let app = interner.type_application(app_id);
            f(app.base);
            for &arg in &app.args {
                f(arg);
            }
        }
        TypeData::Conditional(cond_id) => {
            let cond = interner.conditional_type(cond_id);
            f(cond.check_type);
            f(cond.extends_type);
            f(cond.true_type);
            f(cond.false_type);
        }
        TypeData::Mapped(mapped_id) => {
            let mapped = interner.mapped_type(mapped_id);
            f(mapped.constraint);
            f(mapped.template);
        }
        TypeData::IndexAccess(object, index) => {
            f(object);
            f(index);
        }
        TypeData::TemplateLiteral(template_id) => {
            for span in interner.template_list(template_id).iter() {
                if let TemplateSpan::Type(inner) = span {
                    f(*inner);
                }
            }
        }
    }
}

fn contains_matching(
    interner: &TypeInterner,
    type_id: TypeId,
    predicate: &dyn Fn(&TypeData) -> bool,
) -> bool {
    let mut visited = FxHashSet::default();
    let mut stack = vec![type_id];
    while let Some(current) = stack.pop() {
        if current.is_intrinsic() || !visited.insert(current) {
            continue;
        }
        if let Some(data) = interner.lookup(current)
            && predicate(&data)
        {
            return true;
        }
        for_each_child(interner, current, |child| stack.push(child));
    }
    false
}

/// Whether `type_id` mentions a free type parameter. `infer` placeholders
/// don't count; they are bound by the enclosing conditional.
pub fn contains_type_parameters(interner: &TypeInterner, type_id: TypeId) -> bool {
    contains_matching(interner, type_id, &|data| {
        matches!(data, TypeData::TypeParameter(_))
    })
}

pub fn contains_infer(interner: &TypeInterner, type_id: TypeId) -> bool {
    contains_matching(interner, type_id, &|data| matches!(data, TypeData::Infer(_)))
}

/// `infer X` placeholders of `type_id`, in first-occurrence order.
pub fn collect_infer_params(interner: &TypeInterner, type_id: TypeId) -> Vec<TypeParamInfo> {
    let mut found: Vec<TypeParamInfo> = Vec::new();
    let mut visited = FxHashSet::default();
    let mut stack = vec![type_id];
    while let Some(current) = stack.pop() {
        if current.is_intrinsic() || !visited.insert(current) {
            continue;
        }
        if let Some(TypeData::Infer(info)) = interner.lookup(current)
            && !found.iter().any(|known| known.name == info.name)
        {
            found.push(info);
        }
        let mut children = Vec::new();
        for_each_child(interner, current, |child| children.push(child));
        stack.extend(children.into_iter().rev());
    }
    found
}
