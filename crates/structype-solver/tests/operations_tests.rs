use super::*;
use crate::TypeEnvironment;

fn string_to_number(interner: &TypeInterner) -> TypeId {
    interner.function_type(vec![ParamInfo::required(TypeId::STRING)], TypeId::NUMBER)
}

#[test]
fn test_simple_call() {
    let interner = TypeInterner::new();
    let callee = string_to_number(&interner);
    let mut evaluator = CallEvaluator::new(&interner);

    assert_eq!(evaluator.resolve_call(callee, &[TypeId::STRING]), Ok(TypeId::NUMBER));
    let hello = interner.literal_string("hello");
    assert_eq!(evaluator.resolve_call(callee, &[hello]), Ok(TypeId::NUMBER));
}

#[test]
fn test_argument_type_mismatch() {
    let interner = TypeInterner::new();
    let callee = string_to_number(&interner);
    let mut evaluator = CallEvaluator::new(&interner);

    let error = evaluator
        .resolve_call(callee, &[TypeId::NUMBER])
        .expect_err("number is not a string");
    match error {
        CallError::ArgumentTypeMismatch { index, error } => {
            assert_eq!(index, 0);
            assert_eq!(error.source_id, TypeId::NUMBER);
            assert_eq!(error.target_id, TypeId::STRING);
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn test_argument_count_mismatch() {
    let interner = TypeInterner::new();
    let callee = interner.function_type(
        vec![
            ParamInfo::required(TypeId::STRING),
            ParamInfo::optional(TypeId::NUMBER),
        ],
        TypeId::VOID,
    );
    let mut evaluator = CallEvaluator::new(&interner);

    assert_eq!(
        evaluator.resolve_call(callee, &[]),
        Err(CallError::ArgumentCountMismatch {
            min: 1,
            max: Some(2),
            got: 0,
        })
    );
    assert_eq!(
        evaluator.resolve_call(callee, &[TypeId::STRING, TypeId::NUMBER, TypeId::NUMBER]),
        Err(CallError::ArgumentCountMismatch {
            min: 1,
            max: Some(2),
            got: 3,
        })
    );
    assert_eq!(evaluator.resolve_call(callee, &[TypeId::STRING]), Ok(TypeId::VOID));
}

#[test]
fn test_rest_parameters() {
    let interner = TypeInterner::new();
    // (prefix: string, ...values: number[]) => boolean
    let callee = interner.function_type(
        vec![
            ParamInfo::required(TypeId::STRING),
            ParamInfo::rest(interner.array(TypeId::NUMBER)),
        ],
        TypeId::BOOLEAN,
    );
    let mut evaluator = CallEvaluator::new(&interner);

    assert_eq!(evaluator.resolve_call(callee, &[TypeId::STRING]), Ok(TypeId::BOOLEAN));
    assert_eq!(
        evaluator.resolve_call(callee, &[TypeId::STRING, TypeId::NUMBER, TypeId::NUMBER]),
        Ok(TypeId::BOOLEAN)
    );
    assert!(matches!(
        evaluator.resolve_call(callee, &[TypeId::STRING, TypeId::NUMBER, TypeId::STRING]),
        Err(CallError::ArgumentTypeMismatch { index: 2, .. })
    ));
}

#[test]
fn test_tuple_rest_parameter() {
    let interner = TypeInterner::new();
    // (...args: [string, number]) => void
    let callee = interner.function_type(
        vec![ParamInfo::rest(interner.tuple_of(&[TypeId::STRING, TypeId::NUMBER]))],
        TypeId::VOID,
    );
    let mut evaluator = CallEvaluator::new(&interner);

    assert_eq!(
        evaluator.resolve_call(callee, &[TypeId::STRING, TypeId::NUMBER]),
        Ok(TypeId::VOID)
    );
    assert!(matches!(
        evaluator.resolve_call(callee, &[TypeId::NUMBER, TypeId::NUMBER]),
        Err(CallError::ArgumentTypeMismatch { index: 0, .. })
    ));
}

#[test]
fn test_tuple_rest_parameter_arity() {
    let interner = TypeInterner::new();
    // (...args: [string, number]) => void
    let closed = interner.function_type(
        vec![ParamInfo::rest(interner.tuple_of(&[TypeId::STRING, TypeId::NUMBER]))],
        TypeId::VOID,
    );
    let mut evaluator = CallEvaluator::new(&interner);

    assert_eq!(
        evaluator.resolve_call(closed, &[]),
        Err(CallError::ArgumentCountMismatch {
            min: 2,
            max: Some(2),
            got: 0,
        })
    );
    let four = [TypeId::STRING, TypeId::NUMBER, TypeId::NUMBER, TypeId::NUMBER];
    assert_eq!(
        evaluator.resolve_call(closed, &four),
        Err(CallError::ArgumentCountMismatch {
            min: 2,
            max: Some(2),
            got: 4,
        })
    );

    // (flag: boolean, ...args: [string, number?]) => void
    let optional_tail = interner.function_type(
        vec![
            ParamInfo::required(TypeId::BOOLEAN),
            ParamInfo::rest(interner.tuple(vec![
                TupleElement::required(TypeId::STRING),
                TupleElement::optional(TypeId::NUMBER),
            ])),
        ],
        TypeId::VOID,
    );
    assert_eq!(
        evaluator.resolve_call(optional_tail, &[TypeId::BOOLEAN, TypeId::STRING]),
        Ok(TypeId::VOID)
    );
    assert_eq!(
        evaluator.resolve_call(optional_tail, &[TypeId::BOOLEAN]),
        Err(CallError::ArgumentCountMismatch {
            min: 2,
            max: Some(3),
            got: 1,
        })
    );
}

#[test]
fn test_variadic_tuple_rest_parameter() {
    let interner = TypeInterner::new();
    // (...args: [number, ...string[]]) => void
    let callee = interner.function_type(
        vec![ParamInfo::rest(interner.tuple_with_rest(&[TypeId::NUMBER], TypeId::STRING))],
        TypeId::VOID,
    );
    let mut evaluator = CallEvaluator::new(&interner);

    assert_eq!(
        evaluator.resolve_call(callee, &[TypeId::NUMBER, TypeId::STRING, TypeId::STRING]),
        Ok(TypeId::VOID)
    );
    assert_eq!(
        evaluator.resolve_call(callee, &[]),
        Err(CallError::ArgumentCountMismatch {
            min: 1,
            max: None,
            got: 0,
        })
    );
    assert!(matches!(
        evaluator.resolve_call(callee, &[TypeId::NUMBER, TypeId::STRING, TypeId::NUMBER]),
        Err(CallError::ArgumentTypeMismatch { index: 2, .. })
    ));
}

#[test]
fn test_not_callable() {
    let interner = TypeInterner::new();
    let mut evaluator = CallEvaluator::new(&interner);

    assert!(matches!(
        evaluator.resolve_call(TypeId::NUMBER, &[]),
        Err(CallError::NotCallable { .. })
    ));

    let ctor = interner.constructor_type(vec![], TypeId::OBJECT);
    assert!(matches!(
        evaluator.resolve_call(ctor, &[]),
        Err(CallError::NotCallable { .. })
    ));
}

#[test]
fn test_calling_any_returns_any() {
    let interner = TypeInterner::new();
    let mut evaluator = CallEvaluator::new(&interner);
    assert_eq!(evaluator.resolve_call(TypeId::ANY, &[TypeId::STRING]), Ok(TypeId::ANY));
}

#[test]
fn test_union_callee_intersects_parameters() {
    let interner = TypeInterner::new();
    let a = interner.literal_string("a");
    let b = interner.literal_string("b");
    // ((x: "a" | "b") => string) | ((x: string) => number)
    let first = interner.function_type(
        vec![ParamInfo::required(interner.union2(a, b))],
        TypeId::STRING,
    );
    let second = interner.function_type(vec![ParamInfo::required(TypeId::STRING)], TypeId::NUMBER);
    let callee = interner.union2(first, second);
    let mut evaluator = CallEvaluator::new(&interner);

    assert_eq!(
        evaluator.resolve_call(callee, &[a]),
        Ok(interner.union2(TypeId::STRING, TypeId::NUMBER))
    );
    assert!(matches!(
        evaluator.resolve_call(callee, &[TypeId::STRING]),
        Err(CallError::ArgumentTypeMismatch { index: 0, .. })
    ));
}

#[test]
fn test_union_callee_with_disjoint_parameters() {
    let interner = TypeInterner::new();
    let takes_string = interner.function_type(
        vec![ParamInfo::required(TypeId::STRING)],
        TypeId::VOID,
    );
    let takes_number = interner.function_type(
        vec![ParamInfo::required(TypeId::NUMBER)],
        TypeId::VOID,
    );
    let callee = interner.union2(takes_string, takes_number);
    let mut evaluator = CallEvaluator::new(&interner);

    assert!(matches!(
        evaluator.resolve_call(callee, &[interner.literal_string("a")]),
        Err(CallError::UnsatisfiableParameter { index: 0, .. })
    ));
}

#[test]
fn test_union_callee_arity_is_strictest() {
    let interner = TypeInterner::new();
    let one = interner.function_type(vec![ParamInfo::required(TypeId::STRING)], TypeId::VOID);
    let two = interner.function_type(
        vec![
            ParamInfo::required(TypeId::STRING),
            ParamInfo::required(TypeId::STRING),
        ],
        TypeId::VOID,
    );
    let callee = interner.union2(one, two);
    let mut evaluator = CallEvaluator::new(&interner);

    assert_eq!(
        evaluator.resolve_call(callee, &[TypeId::STRING]),
        Err(CallError::ArgumentCountMismatch {
            min: 2,
            max: Some(1),
            got: 1,
        })
    );
}

#[test]
fn test_intersection_callee_uses_first_accepting_member() {
    let interner = TypeInterner::new();
    let takes_string = interner.function_type(
        vec![ParamInfo::required(TypeId::STRING)],
        TypeId::STRING,
    );
    let takes_number = interner.function_type(
        vec![ParamInfo::required(TypeId::NUMBER)],
        TypeId::NUMBER,
    );
    let callee = interner.intersection2(takes_string, takes_number);
    let mut evaluator = CallEvaluator::new(&interner);

    assert_eq!(evaluator.resolve_call(callee, &[TypeId::NUMBER]), Ok(TypeId::NUMBER));
    assert_eq!(evaluator.resolve_call(callee, &[TypeId::STRING]), Ok(TypeId::STRING));
    assert!(matches!(
        evaluator.resolve_call(callee, &[TypeId::BOOLEAN]),
        Err(CallError::ArgumentTypeMismatch { .. })
    ));
}

#[test]
fn test_type_parameter_callee_uses_constraint() {
    let interner = TypeInterner::new();
    let constraint = string_to_number(&interner);
    let callee = interner.type_param("F", Some(constraint));
    let mut evaluator = CallEvaluator::new(&interner);

    assert_eq!(evaluator.resolve_call(callee, &[TypeId::STRING]), Ok(TypeId::NUMBER));
}

#[test]
fn test_callee_through_definition() {
    let interner = TypeInterner::new();
    let env = TypeEnvironment::new();
    let def = env.define_alias(&interner, "Handler", vec![], string_to_number(&interner));
    let mut evaluator = CallEvaluator::with_resolver(&interner, &env);

    assert_eq!(
        evaluator.resolve_call(interner.lazy(def), &[TypeId::STRING]),
        Ok(TypeId::NUMBER)
    );
}

#[test]
fn test_loose_options_accept_null_arguments() {
    let interner = TypeInterner::new();
    let callee = string_to_number(&interner);

    let mut strict = CallEvaluator::new(&interner);
    assert!(strict.resolve_call(callee, &[TypeId::NULL]).is_err());

    let mut loose = CallEvaluator::new(&interner).with_options(&CheckerOptions::loose());
    assert_eq!(loose.resolve_call(callee, &[TypeId::NULL]), Ok(TypeId::NUMBER));
}
