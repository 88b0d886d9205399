use super::*;
use crate::TypeInterner;

#[test]
fn test_intrinsic_ids_are_fixed() {
    for kind in IntrinsicKind::ALL {
        assert!(kind.type_id().is_intrinsic(), "{} should be intrinsic", kind.name());
    }
    assert_eq!(IntrinsicKind::Never.type_id(), TypeId::NEVER);
    assert_eq!(IntrinsicKind::Object.type_id(), TypeId::OBJECT);
    assert!(!TypeId(TypeId::FIRST_USER).is_intrinsic());
}

#[test]
fn test_type_id_predicates() {
    assert!(TypeId::ANY.is_any_or_unknown());
    assert!(TypeId::UNKNOWN.is_any_or_unknown());
    assert!(!TypeId::NEVER.is_any_or_unknown());
    assert!(TypeId::NULL.is_nullish());
    assert!(TypeId::UNDEFINED.is_nullish());
    assert!(!TypeId::VOID.is_nullish());
    assert!(TypeId::ERROR.is_error());
}

#[test]
fn test_ordered_float_normalises_zero_and_nan() {
    assert_eq!(OrderedFloat(0.0), OrderedFloat(-0.0));
    assert_eq!(OrderedFloat(f64::NAN), OrderedFloat(-f64::NAN));
    assert_ne!(OrderedFloat(1.0), OrderedFloat(2.0));
}

#[test]
fn test_literal_primitive() {
    let interner = TypeInterner::new();
    let name = interner.intern_string("a");
    assert_eq!(LiteralValue::String(name).primitive(), TypeId::STRING);
    assert_eq!(LiteralValue::Number(OrderedFloat(1.0)).primitive(), TypeId::NUMBER);
    assert_eq!(LiteralValue::Boolean(true).primitive(), TypeId::BOOLEAN);
    assert_eq!(LiteralValue::BigInt(name).primitive(), TypeId::BIGINT);
}

#[test]
fn test_object_shape_find_and_weakness() {
    let interner = TypeInterner::new();
    let a = interner.intern_string("a");
    let b = interner.intern_string("b");
    let c = interner.intern_string("c");

    let obj = interner.object(vec![
        PropertyInfo::opt(b, TypeId::NUMBER),
        PropertyInfo::opt(a, TypeId::STRING),
    ]);
    let Some(TypeData::Object(shape_id)) = interner.lookup(obj) else {
        panic!("expected object");
    };
    let shape = interner.object_shape(shape_id);
    assert_eq!(shape.find(a).map(|p| p.type_id), Some(TypeId::STRING));
    assert_eq!(shape.find(b).map(|p| p.type_id), Some(TypeId::NUMBER));
    assert!(shape.find(c).is_none());
    assert!(shape.is_weak());
    assert!(!shape.is_fresh());

    let empty = ObjectShape::default();
    assert!(!empty.is_weak(), "{{}} is not a weak type");
}

#[test]
fn test_property_info_modifiers() {
    let interner = TypeInterner::new();
    let name = interner.intern_string("x");
    let prop = PropertyInfo::new(name, TypeId::NUMBER)
        .with_optional(true)
        .with_readonly(true);
    assert!(prop.optional);
    assert!(prop.readonly);
    assert!(!PropertyInfo::new(name, TypeId::NUMBER).optional);
}

#[test]
fn test_function_shape_counts() {
    let shape = FunctionShape::new(
        vec![
            ParamInfo::required(TypeId::STRING),
            ParamInfo::optional(TypeId::NUMBER),
            ParamInfo::rest(TypeId::ANY),
        ],
        TypeId::VOID,
    );
    assert_eq!(shape.required_count(), 1);
    assert_eq!(shape.fixed_params().len(), 2);
    assert!(shape.rest_param().is_some());

    let no_params = FunctionShape::new(vec![], TypeId::VOID);
    assert_eq!(no_params.required_count(), 0);
    assert!(no_params.rest_param().is_none());
}

#[test]
fn test_required_count_ignores_trailing_optionals_only() {
    // (a?: string, b: number) still needs both arguments
    let shape = FunctionShape::new(
        vec![
            ParamInfo::optional(TypeId::STRING),
            ParamInfo::required(TypeId::NUMBER),
        ],
        TypeId::VOID,
    );
    assert_eq!(shape.required_count(), 2);
}

#[test]
fn test_tuple_element_constructors() {
    let required = TupleElement::required(TypeId::STRING);
    assert!(!required.optional && !required.rest);
    assert!(TupleElement::optional(TypeId::STRING).optional);
    assert!(TupleElement::rest(TypeId::STRING).rest);
}
