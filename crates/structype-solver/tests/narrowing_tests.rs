use super::*;

fn prop(interner: &TypeInterner, name: &str, type_id: TypeId) -> PropertyInfo {
    PropertyInfo::new(interner.intern_string(name), type_id)
}

/// `{ type: "add", value: number } | { type: "remove", id: string }`
fn action_union(interner: &TypeInterner) -> (TypeId, TypeId, TypeId) {
    let add = interner.object(vec![
        prop(interner, "type", interner.literal_string("add")),
        prop(interner, "value", TypeId::NUMBER),
    ]);
    let remove = interner.object(vec![
        prop(interner, "type", interner.literal_string("remove")),
        prop(interner, "id", TypeId::STRING),
    ]);
    (interner.union2(add, remove), add, remove)
}

#[test]
fn test_discriminant_narrowing() {
    let interner = TypeInterner::new();
    let (action, add, remove) = action_union(&interner);
    let ctx = NarrowingContext::new(&interner);
    let kind = interner.intern_string("type");
    let add_literal = interner.literal_string("add");

    assert_eq!(ctx.narrow_by_discriminant(action, kind, add_literal), add);
    assert_eq!(ctx.narrow_by_excluding_discriminant(action, kind, add_literal), remove);

    let guard = TypeGuard::Discriminant {
        property_name: kind,
        value_type: add_literal,
    };
    assert_eq!(
        ctx.narrow_branches(action, &guard),
        NarrowingResult {
            true_type: add,
            false_type: remove,
        }
    );
}

#[test]
fn test_discriminant_with_no_match_is_never() {
    let interner = TypeInterner::new();
    let (action, _, _) = action_union(&interner);
    let ctx = NarrowingContext::new(&interner);
    let kind = interner.intern_string("type");

    let narrowed = ctx.narrow_by_discriminant(action, kind, interner.literal_string("reset"));
    assert_eq!(narrowed, TypeId::NEVER);
}

#[test]
fn test_optional_discriminant_keeps_member_on_both_sides() {
    let interner = TypeInterner::new();
    let kind = interner.intern_string("kind");
    let a = interner.literal_string("a");
    let maybe_a = interner.object(vec![PropertyInfo::opt(kind, a)]);
    let ctx = NarrowingContext::new(&interner);

    assert_eq!(ctx.narrow_by_discriminant(maybe_a, kind, a), maybe_a);
    assert_eq!(ctx.narrow_by_excluding_discriminant(maybe_a, kind, a), maybe_a);
}

#[test]
fn test_typeof_narrowing() {
    let interner = TypeInterner::new();
    let source = interner.union(vec![TypeId::STRING, TypeId::NUMBER, TypeId::UNDEFINED]);
    let ctx = NarrowingContext::new(&interner);

    assert_eq!(ctx.narrow_by_typeof(source, "string"), TypeId::STRING);
    assert_eq!(
        ctx.narrow_by_typeof_negation(source, "string"),
        interner.union2(TypeId::NUMBER, TypeId::UNDEFINED)
    );
    assert_eq!(ctx.narrow_by_typeof(source, "undefined"), TypeId::UNDEFINED);
    assert_eq!(ctx.narrow_by_typeof(source, "boolean"), TypeId::NEVER);
}

#[test]
fn test_typeof_literals_and_functions() {
    let interner = TypeInterner::new();
    let func = interner.function_type(vec![], TypeId::VOID);
    let hello = interner.literal_string("hello");
    let source = interner.union(vec![hello, func, TypeId::NULL]);
    let ctx = NarrowingContext::new(&interner);

    assert_eq!(ctx.narrow_by_typeof(source, "string"), hello);
    assert_eq!(ctx.narrow_by_typeof(source, "function"), func);
    assert_eq!(ctx.narrow_by_typeof(source, "object"), TypeId::NULL);
}

#[test]
fn test_typeof_on_unknown() {
    let interner = TypeInterner::new();
    let ctx = NarrowingContext::new(&interner);

    assert_eq!(ctx.narrow_by_typeof(TypeId::UNKNOWN, "string"), TypeId::STRING);
    assert_eq!(
        ctx.narrow_by_typeof(TypeId::UNKNOWN, "object"),
        interner.union2(TypeId::OBJECT, TypeId::NULL)
    );
    assert_eq!(ctx.narrow_by_typeof(TypeId::UNKNOWN, "function"), TypeId::UNKNOWN);
    assert_eq!(ctx.narrow_by_typeof_negation(TypeId::UNKNOWN, "string"), TypeId::UNKNOWN);
}

#[test]
fn test_in_operator_narrowing() {
    let interner = TypeInterner::new();
    let (action, add, remove) = action_union(&interner);
    let ctx = NarrowingContext::new(&interner);
    let value = interner.intern_string("value");

    assert_eq!(ctx.narrow_by_property_presence(action, value, true), add);
    assert_eq!(ctx.narrow_by_property_presence(action, value, false), remove);

    let guard = TypeGuard::InProperty(value);
    assert_eq!(ctx.narrow_type(action, &guard, true), add);
}

#[test]
fn test_literal_equality_narrowing() {
    let interner = TypeInterner::new();
    let a = interner.literal_string("a");
    let b = interner.literal_string("b");
    let ctx = NarrowingContext::new(&interner);

    let letters = interner.union(vec![a, b, TypeId::NUMBER]);
    assert_eq!(ctx.narrow_to_type(letters, a), a);
    assert_eq!(
        ctx.narrow_excluding_type(letters, a),
        interner.union2(b, TypeId::NUMBER)
    );

    // string narrowed by `=== "a"` is "a"
    let guard = TypeGuard::LiteralEquality(a);
    assert_eq!(ctx.narrow_type(TypeId::STRING, &guard, true), a);
    assert_eq!(ctx.narrow_type(TypeId::STRING, &guard, false), TypeId::STRING);
}

#[test]
fn test_nullish_equality_narrowing() {
    let interner = TypeInterner::new();
    let source = interner.union(vec![TypeId::STRING, TypeId::NULL, TypeId::UNDEFINED]);
    let ctx = NarrowingContext::new(&interner);

    let branches = ctx.narrow_branches(source, &TypeGuard::NullishEquality);
    assert_eq!(
        branches.true_type,
        interner.union2(TypeId::NULL, TypeId::UNDEFINED)
    );
    assert_eq!(branches.false_type, TypeId::STRING);
}

#[test]
fn test_narrowing_any_keeps_any_on_false_branch() {
    let interner = TypeInterner::new();
    let ctx = NarrowingContext::new(&interner);
    let a = interner.literal_string("a");

    assert_eq!(ctx.narrow_to_type(TypeId::ANY, a), a);
    assert_eq!(ctx.narrow_excluding_type(TypeId::ANY, a), TypeId::ANY);
}
