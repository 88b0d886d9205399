use super::*;
use crate::environment::TypeEnvironment;
use crate::evaluate::evaluate_type;
use crate::type_resolver::NoopResolver;

fn prop(interner: &TypeInterner, name: &str, type_id: TypeId) -> PropertyInfo {
    PropertyInfo::new(interner.intern_string(name), type_id)
}

/// `{ [P in keyof T]<modifiers>: T[P] }`
fn homomorphic(
    interner: &TypeInterner,
    source: TypeId,
    readonly_modifier: Option<MappedModifier>,
    optional_modifier: Option<MappedModifier>,
) -> TypeId {
    let p = interner.type_param("P", None);
    interner.mapped(MappedType {
        type_param: TypeParamInfo {
            name: interner.intern_string("P"),
            constraint: None,
        },
        constraint: interner.keyof(source),
        template: interner.index_access(source, p),
        readonly_modifier,
        optional_modifier,
    })
}

fn point(interner: &TypeInterner) -> TypeId {
    interner.object(vec![
        prop(interner, "x", TypeId::NUMBER),
        prop(interner, "y", TypeId::STRING),
    ])
}

// =============================================================================
// Homomorphic mapped types
// =============================================================================

#[test]
fn test_partial() {
    let interner = TypeInterner::new();
    let source = point(&interner);
    let partial = homomorphic(&interner, source, None, Some(MappedModifier::Add));

    let expected = interner.object(vec![
        PropertyInfo::opt(interner.intern_string("x"), TypeId::NUMBER),
        PropertyInfo::opt(interner.intern_string("y"), TypeId::STRING),
    ]);
    assert_eq!(evaluate_type(&interner, partial), expected);
}

#[test]
fn test_required_strips_undefined() {
    let interner = TypeInterner::new();
    let x = interner.intern_string("x");
    let source = interner.object(vec![PropertyInfo::opt(
        x,
        interner.union2(TypeId::NUMBER, TypeId::UNDEFINED),
    )]);
    let required = homomorphic(&interner, source, None, Some(MappedModifier::Remove));

    assert_eq!(
        evaluate_type(&interner, required),
        interner.object(vec![PropertyInfo::new(x, TypeId::NUMBER)])
    );
}

#[test]
fn test_readonly_and_mutable() {
    let interner = TypeInterner::new();
    let source = point(&interner);
    let readonly = evaluate_type(
        &interner,
        homomorphic(&interner, source, Some(MappedModifier::Add), None),
    );
    let expected = interner.object(vec![
        prop(&interner, "x", TypeId::NUMBER).with_readonly(true),
        prop(&interner, "y", TypeId::STRING).with_readonly(true),
    ]);
    assert_eq!(readonly, expected);

    let mutable = homomorphic(&interner, readonly, Some(MappedModifier::Remove), None);
    assert_eq!(evaluate_type(&interner, mutable), source);
}

#[test]
fn test_modifiers_are_preserved_without_changes() {
    let interner = TypeInterner::new();
    let source = interner.object(vec![
        PropertyInfo::opt(interner.intern_string("a"), TypeId::STRING),
        prop(&interner, "b", TypeId::NUMBER).with_readonly(true),
    ]);
    let identity = homomorphic(&interner, source, None, None);
    assert_eq!(evaluate_type(&interner, identity), source);
}

#[test]
fn test_template_transforms_values() {
    // { [P in keyof T]: boolean }
    let interner = TypeInterner::new();
    let source = point(&interner);
    let flags = interner.mapped(MappedType {
        type_param: TypeParamInfo {
            name: interner.intern_string("P"),
            constraint: None,
        },
        constraint: interner.keyof(source),
        template: TypeId::BOOLEAN,
        readonly_modifier: None,
        optional_modifier: None,
    });

    let expected = interner.object(vec![
        prop(&interner, "x", TypeId::BOOLEAN),
        prop(&interner, "y", TypeId::BOOLEAN),
    ]);
    assert_eq!(evaluate_type(&interner, flags), expected);
}

#[test]
fn test_homomorphic_over_union_distributes() {
    let interner = TypeInterner::new();
    let a = interner.object(vec![prop(&interner, "a", TypeId::STRING)]);
    let b = interner.object(vec![prop(&interner, "b", TypeId::NUMBER)]);
    let source = interner.union2(a, b);
    let partial = homomorphic(&interner, source, None, Some(MappedModifier::Add));

    let expected = interner.union2(
        interner.object(vec![PropertyInfo::opt(interner.intern_string("a"), TypeId::STRING)]),
        interner.object(vec![PropertyInfo::opt(interner.intern_string("b"), TypeId::NUMBER)]),
    );
    assert_eq!(evaluate_type(&interner, partial), expected);
}

#[test]
fn test_homomorphic_over_primitive_and_never() {
    let interner = TypeInterner::new();
    let over_string = homomorphic(&interner, TypeId::STRING, None, Some(MappedModifier::Add));
    assert_eq!(evaluate_type(&interner, over_string), TypeId::STRING);

    let over_never = homomorphic(&interner, TypeId::NEVER, None, Some(MappedModifier::Add));
    assert_eq!(evaluate_type(&interner, over_never), TypeId::NEVER);
}

#[test]
fn test_homomorphic_over_type_parameter_is_deferred() {
    let interner = TypeInterner::new();
    let t = interner.type_param("T", None);
    let partial = homomorphic(&interner, t, None, Some(MappedModifier::Add));
    assert_eq!(evaluate_type(&interner, partial), partial);
}

// =============================================================================
// Arrays and tuples
// =============================================================================

#[test]
fn test_partial_array_and_readonly_array() {
    let interner = TypeInterner::new();
    let strings = interner.array(TypeId::STRING);

    let partial = homomorphic(&interner, strings, None, Some(MappedModifier::Add));
    assert_eq!(
        evaluate_type(&interner, partial),
        interner.array(interner.union2(TypeId::STRING, TypeId::UNDEFINED))
    );

    let readonly = homomorphic(&interner, strings, Some(MappedModifier::Add), None);
    assert_eq!(evaluate_type(&interner, readonly), interner.readonly(strings));
}

#[test]
fn test_partial_tuple() {
    let interner = TypeInterner::new();
    let pair = interner.tuple_of(&[TypeId::STRING, TypeId::NUMBER]);
    let partial = homomorphic(&interner, pair, None, Some(MappedModifier::Add));

    assert_eq!(
        evaluate_type(&interner, partial),
        interner.tuple(vec![
            TupleElement::optional(TypeId::STRING),
            TupleElement::optional(TypeId::NUMBER),
        ])
    );
}

// =============================================================================
// Literal key sets
// =============================================================================

#[test]
fn test_mapping_over_literal_keys() {
    // { [K in "a" | "b"]: K }
    let interner = TypeInterner::new();
    let k = interner.type_param("K", None);
    let a = interner.literal_string("a");
    let b = interner.literal_string("b");
    let record = interner.mapped(MappedType {
        type_param: TypeParamInfo {
            name: interner.intern_string("K"),
            constraint: None,
        },
        constraint: interner.union2(a, b),
        template: k,
        readonly_modifier: None,
        optional_modifier: None,
    });

    let expected = interner.object(vec![prop(&interner, "a", a), prop(&interner, "b", b)]);
    assert_eq!(evaluate_type(&interner, record), expected);
}

#[test]
fn test_mapping_over_string_stays_deferred() {
    let interner = TypeInterner::new();
    let open = interner.mapped(MappedType {
        type_param: TypeParamInfo {
            name: interner.intern_string("K"),
            constraint: None,
        },
        constraint: TypeId::STRING,
        template: TypeId::NUMBER,
        readonly_modifier: None,
        optional_modifier: None,
    });
    assert_eq!(evaluate_type(&interner, open), open);
}

#[test]
fn test_mapping_over_never_is_empty_object() {
    let interner = TypeInterner::new();
    let empty = interner.mapped(MappedType {
        type_param: TypeParamInfo {
            name: interner.intern_string("K"),
            constraint: None,
        },
        constraint: TypeId::NEVER,
        template: TypeId::NUMBER,
        readonly_modifier: None,
        optional_modifier: None,
    });
    assert_eq!(evaluate_type(&interner, empty), interner.empty_object());
}

// =============================================================================
// map_properties
// =============================================================================

fn map_plain<F>(
    interner: &TypeInterner,
    source: TypeId,
    transform: F,
    modifiers: PropertyModifiers,
) -> Result<TypeId, SolverError>
where
    F: FnMut(Atom, TypeId) -> TypeId,
{
    let options = CheckerOptions::default();
    map_properties(interner, &NoopResolver, &options, source, transform, modifiers)
}

#[test]
fn test_map_properties_with_modifiers() {
    let interner = TypeInterner::new();
    let source = point(&interner);

    let partial = map_plain(&interner, source, |_, ty| ty, PropertyModifiers::PARTIAL);
    assert_eq!(
        partial,
        Ok(interner.object(vec![
            PropertyInfo::opt(interner.intern_string("x"), TypeId::NUMBER),
            PropertyInfo::opt(interner.intern_string("y"), TypeId::STRING),
        ]))
    );

    let readonly = map_plain(&interner, source, |_, ty| ty, PropertyModifiers::READONLY);
    assert_eq!(
        readonly,
        Ok(interner.object(vec![
            prop(&interner, "x", TypeId::NUMBER).with_readonly(true),
            prop(&interner, "y", TypeId::STRING).with_readonly(true),
        ]))
    );
}

#[test]
fn test_map_properties_transform_sees_names() {
    let interner = TypeInterner::new();
    let source = point(&interner);
    let x = interner.intern_string("x");

    let result = map_plain(
        &interner,
        source,
        |name, ty| if name == x { TypeId::BOOLEAN } else { ty },
        PropertyModifiers::default(),
    );
    assert_eq!(
        result,
        Ok(interner.object(vec![
            prop(&interner, "x", TypeId::BOOLEAN),
            prop(&interner, "y", TypeId::STRING),
        ]))
    );
}

#[test]
fn test_map_properties_required_strips_undefined() {
    let interner = TypeInterner::new();
    let a = interner.intern_string("a");
    let source = interner.object(vec![PropertyInfo::opt(
        a,
        interner.union2(TypeId::STRING, TypeId::UNDEFINED),
    )]);

    let result = map_plain(&interner, source, |_, ty| ty, PropertyModifiers::REQUIRED);
    assert_eq!(
        result,
        Ok(interner.object(vec![PropertyInfo::new(a, TypeId::STRING)]))
    );
}

#[test]
fn test_map_properties_rejects_non_objects() {
    let interner = TypeInterner::new();
    let result = map_plain(&interner, TypeId::NUMBER, |_, ty| ty, PropertyModifiers::PARTIAL);
    assert!(matches!(result, Err(SolverError::NotAnObjectType { .. })));
}

#[test]
fn test_map_properties_through_references() {
    let interner = TypeInterner::new();
    let env = TypeEnvironment::new();
    let options = CheckerOptions::default();

    // interface Point { x: number; y: string }
    let point_def = env.define_interface(&interner, "Point", vec![], point(&interner));
    let partial = map_properties(
        &interner,
        &env,
        &options,
        interner.lazy(point_def),
        |_, ty| ty,
        PropertyModifiers::PARTIAL,
    );
    assert_eq!(
        partial,
        Ok(interner.object(vec![
            PropertyInfo::opt(interner.intern_string("x"), TypeId::NUMBER),
            PropertyInfo::opt(interner.intern_string("y"), TypeId::STRING),
        ]))
    );

    // type Box<T> = { value: T }
    let t_info = TypeParamInfo {
        name: interner.intern_string("T"),
        constraint: None,
    };
    let body = interner.object(vec![prop(&interner, "value", interner.type_param_info(t_info))]);
    let box_def = env.define_alias(&interner, "Box", vec![t_info], body);
    let boxed = interner.application(box_def, vec![TypeId::NUMBER]);
    let readonly = map_properties(
        &interner,
        &env,
        &options,
        boxed,
        |_, ty| ty,
        PropertyModifiers::READONLY,
    );
    assert_eq!(
        readonly,
        Ok(interner.object(vec![prop(&interner, "value", TypeId::NUMBER).with_readonly(true)]))
    );

    // Without the definitions the reference cannot be mapped.
    assert!(matches!(
        map_plain(&interner, interner.lazy(point_def), |_, ty| ty, PropertyModifiers::PARTIAL),
        Err(SolverError::NotAnObjectType { .. })
    ));
}
