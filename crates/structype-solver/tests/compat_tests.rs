use super::*;
use crate::diagnostics::PathSegment;
use crate::freshness::widen_freshness;

fn prop(interner: &TypeInterner, name: &str, type_id: TypeId) -> PropertyInfo {
    PropertyInfo::new(interner.intern_string(name), type_id)
}

#[test]
fn test_fresh_literal_with_excess_property_is_rejected() {
    // let p: { x: number } = { x: 1, y: 2 };
    let interner = TypeInterner::new();
    let target = interner.object(vec![prop(&interner, "x", TypeId::NUMBER)]);
    let literal = interner.object_fresh(vec![
        prop(&interner, "x", interner.literal_number(1.0)),
        prop(&interner, "y", interner.literal_number(2.0)),
    ]);

    let mut checker = CompatChecker::new(&interner);
    assert!(!checker.is_assignable(literal, target));
    assert_eq!(
        checker.find_excess_property(literal, target),
        Some(interner.intern_string("y"))
    );
}

#[test]
fn test_widened_literal_uses_width_subtyping() {
    // const tmp = { x: 1, y: 2 }; let q: { x: number } = tmp;
    let interner = TypeInterner::new();
    let target = interner.object(vec![prop(&interner, "x", TypeId::NUMBER)]);
    let literal = interner.object_fresh(vec![
        prop(&interner, "x", interner.literal_number(1.0)),
        prop(&interner, "y", interner.literal_number(2.0)),
    ]);
    let widened = widen_freshness(&interner, literal);

    assert_ne!(widened, literal);
    assert!(is_assignable(&interner, widened, target));
    assert!(crate::is_subtype(&interner, literal, target), "subtyping ignores freshness");
}

#[test]
fn test_nested_fresh_literal_is_checked() {
    let interner = TypeInterner::new();
    let inner_target = interner.object(vec![prop(&interner, "b", TypeId::NUMBER)]);
    let target = interner.object(vec![prop(&interner, "a", inner_target)]);

    let inner = interner.object_fresh(vec![
        prop(&interner, "b", TypeId::NUMBER),
        prop(&interner, "c", TypeId::NUMBER),
    ]);
    let literal = interner.object_fresh(vec![prop(&interner, "a", inner)]);

    let mut checker = CompatChecker::new(&interner);
    assert_eq!(
        checker.find_excess_property(literal, target),
        Some(interner.intern_string("c"))
    );
    assert!(!checker.is_assignable(literal, target));
}

#[test]
fn test_union_target_accepts_property_of_any_member() {
    let interner = TypeInterner::new();
    let a = interner.literal_string("a");
    let b = interner.literal_string("b");
    let target = interner.union2(
        interner.object(vec![prop(&interner, "kind", a)]),
        interner.object(vec![
            prop(&interner, "kind", b),
            prop(&interner, "extra", TypeId::NUMBER),
        ]),
    );

    let known = interner.object_fresh(vec![
        prop(&interner, "kind", a),
        prop(&interner, "extra", TypeId::NUMBER),
    ]);
    let unknown = interner.object_fresh(vec![
        prop(&interner, "kind", a),
        prop(&interner, "other", TypeId::NUMBER),
    ]);

    let mut checker = CompatChecker::new(&interner);
    assert!(checker.is_assignable(known, target));
    assert!(!checker.is_assignable(unknown, target));
}

#[test]
fn test_intersection_target_merges_properties() {
    let interner = TypeInterner::new();
    let target = interner.intersection2(
        interner.object(vec![prop(&interner, "a", TypeId::STRING)]),
        interner.object(vec![prop(&interner, "b", TypeId::NUMBER)]),
    );
    let ok = interner.object_fresh(vec![
        prop(&interner, "a", TypeId::STRING),
        prop(&interner, "b", TypeId::NUMBER),
    ]);
    let excess = interner.object_fresh(vec![
        prop(&interner, "a", TypeId::STRING),
        prop(&interner, "b", TypeId::NUMBER),
        prop(&interner, "c", TypeId::BOOLEAN),
    ]);

    let mut checker = CompatChecker::new(&interner);
    assert!(checker.is_assignable(ok, target));
    assert_eq!(
        checker.find_excess_property(excess, target),
        Some(interner.intern_string("c"))
    );
}

#[test]
fn test_empty_and_open_targets_skip_excess_check() {
    let interner = TypeInterner::new();
    let literal = interner.object_fresh(vec![prop(&interner, "anything", TypeId::NUMBER)]);
    let t = interner.type_param("T", None);

    let mut checker = CompatChecker::new(&interner);
    assert!(checker.find_excess_property(literal, interner.empty_object()).is_none());
    assert!(checker.find_excess_property(literal, TypeId::OBJECT).is_none());
    assert!(checker.find_excess_property(literal, t).is_none());
    assert!(checker.is_assignable(literal, TypeId::UNKNOWN));
}

#[test]
fn test_check_assignable_reports_excess_property() {
    let interner = TypeInterner::new();
    let target = interner.object(vec![prop(&interner, "x", TypeId::NUMBER)]);
    let literal = interner.object_fresh(vec![
        prop(&interner, "x", TypeId::NUMBER),
        prop(&interner, "y", TypeId::NUMBER),
    ]);

    let mut checker = CompatChecker::new(&interner);
    let error = checker
        .check_assignable(literal, target)
        .expect_err("excess property");
    assert!(matches!(
        error.reason,
        Some(SubtypeFailureReason::ExcessProperty { .. })
    ));
    assert_eq!(error.path, vec![PathSegment::Property("y".to_string())]);
    assert!(error.to_string().contains("is not assignable"));
}

#[test]
fn test_check_assignable_reports_missing_property() {
    let interner = TypeInterner::new();
    let source = interner.object(vec![prop(&interner, "x", TypeId::NUMBER)]);
    let target = interner.object(vec![
        prop(&interner, "x", TypeId::NUMBER),
        prop(&interner, "z", TypeId::STRING),
    ]);

    let mut checker = CompatChecker::new(&interner);
    assert!(checker.check_assignable(target, source).is_ok());
    let error = checker.check_assignable(source, target).expect_err("missing z");
    assert!(matches!(
        error.reason,
        Some(SubtypeFailureReason::MissingProperty { .. })
    ));
    assert_eq!(error.source_id, source);
    assert_eq!(error.target_id, target);
}

#[test]
fn test_comparability_is_symmetric() {
    let interner = TypeInterner::new();
    let a = interner.literal_string("a");

    let mut checker = CompatChecker::new(&interner);
    assert!(checker.is_comparable(a, TypeId::STRING));
    assert!(checker.is_comparable(TypeId::STRING, a));
    assert!(!checker.is_comparable(TypeId::STRING, TypeId::NUMBER));
}

#[test]
fn test_option_changes_invalidate_cached_results() {
    let interner = TypeInterner::new();
    let mut checker = CompatChecker::new(&interner);

    assert!(!checker.is_assignable(TypeId::NULL, TypeId::STRING));
    checker.set_strict_null_checks(false);
    assert!(checker.is_assignable(TypeId::NULL, TypeId::STRING));

    checker.apply_options(&CheckerOptions::default());
    assert!(!checker.is_assignable(TypeId::NULL, TypeId::STRING));
    assert_eq!(checker.options(), CheckerOptions::default());
}

#[test]
fn test_tracer_receives_excess_property_reason() {
    let interner = TypeInterner::new();
    let target = interner.object(vec![prop(&interner, "x", TypeId::NUMBER)]);
    let literal = interner.object_fresh(vec![
        prop(&interner, "x", TypeId::NUMBER),
        prop(&interner, "y", TypeId::NUMBER),
    ]);

    let mut checker = CompatChecker::new(&interner);
    let mut tracer = crate::DiagnosticTracer::new();
    assert!(!checker.is_assignable_with_tracer(literal, target, &mut tracer));
    assert!(matches!(
        tracer.take_failure(),
        Some(SubtypeFailureReason::ExcessProperty { .. })
    ));
}

#[test]
fn test_failure_path_serializes() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();

    let interner = TypeInterner::new();
    let inner_target = interner.object(vec![prop(&interner, "b", TypeId::NUMBER)]);
    let target = interner.object(vec![prop(&interner, "a", inner_target)]);
    let source = interner.object(vec![prop(
        &interner,
        "a",
        interner.object(vec![prop(&interner, "b", TypeId::STRING)]),
    )]);

    let mut checker = CompatChecker::new(&interner);
    let error = checker.check_assignable(source, target).expect_err("a.b mismatch");
    let json = serde_json::to_value(&error.path).expect("path serializes");
    assert_eq!(
        json,
        serde_json::json!([
            { "kind": "property", "value": "a" },
            { "kind": "property", "value": "b" },
        ])
    );
}
