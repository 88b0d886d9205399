//! Concurrent use of one interner and one environment.
//!
//! The interner and the definition store are sharded `DashMap`s and the
//! query cache is shared; many threads interning, evaluating and relating
//! types at once must agree on every id and every answer.

use super::*;
use rayon::prelude::*;
use std::sync::Arc;

fn prop(interner: &TypeInterner, name: &str, type_id: TypeId) -> PropertyInfo {
    PropertyInfo::new(interner.intern_string(name), type_id)
}

fn assert_send_sync<T: Send + Sync>() {}

#[test]
fn test_shared_state_is_send_and_sync() {
    assert_send_sync::<TypeInterner>();
    assert_send_sync::<TypeEnvironment>();
    assert_send_sync::<QueryCache>();
}

#[test]
fn test_concurrent_string_interning_deduplicates() {
    let interner = Arc::new(TypeInterner::new());
    let names: Vec<String> = (0..1000).map(|i| format!("name_{}", i % 50)).collect();

    let atoms: Vec<Atom> = names.par_iter().map(|name| interner.intern_string(name)).collect();

    for (name, atom) in names.iter().zip(&atoms) {
        assert_eq!(interner.intern_string(name), *atom);
        assert_eq!(&*interner.resolve_atom(*atom), name.as_str());
    }
}

#[test]
fn test_concurrent_structural_interning_agrees() {
    let interner = TypeInterner::new();

    let ids: Vec<TypeId> = (0..800)
        .into_par_iter()
        .map(|i| match i % 4 {
            0 => interner.union(vec![TypeId::STRING, TypeId::NUMBER]),
            1 => interner.union(vec![TypeId::NUMBER, TypeId::STRING]),
            2 => interner.object(vec![
                prop(&interner, "y", TypeId::NUMBER),
                prop(&interner, "x", TypeId::NUMBER),
            ]),
            _ => interner.object(vec![
                prop(&interner, "x", TypeId::NUMBER),
                prop(&interner, "y", TypeId::NUMBER),
            ]),
        })
        .collect();

    let union = interner.union2(TypeId::STRING, TypeId::NUMBER);
    let point = interner.object(vec![
        prop(&interner, "x", TypeId::NUMBER),
        prop(&interner, "y", TypeId::NUMBER),
    ]);
    for (i, id) in ids.iter().enumerate() {
        let expected = if i % 4 < 2 { union } else { point };
        assert_eq!(*id, expected);
    }
}

#[test]
fn test_concurrent_definition_registration() {
    let interner = TypeInterner::new();
    let env = TypeEnvironment::new();

    let defs: Vec<DefId> = (0..200)
        .into_par_iter()
        .map(|i| env.define_alias(&interner, &format!("Alias{i}"), vec![], TypeId::NUMBER))
        .collect();

    let mut unique = defs.clone();
    unique.sort_unstable();
    unique.dedup();
    assert_eq!(unique.len(), defs.len());
    assert_eq!(env.definitions().len(), 200);
    assert!(defs.iter().all(|def| def.is_valid()));
}

#[test]
fn test_concurrent_relations_share_cache() {
    let interner = TypeInterner::new();
    let env = TypeEnvironment::new();

    // type List<V> = { value: V; next: List | undefined }, declared twice
    let define_list = |name: &str, value: TypeId| {
        let def = env.declare(&interner, name, vec![]);
        let next = interner.union2(interner.lazy(def), TypeId::UNDEFINED);
        let body = interner.object(vec![
            prop(&interner, "value", value),
            prop(&interner, "next", next),
        ]);
        env.set_body(def, body);
        interner.lazy(def)
    };
    let numbers_a = define_list("NumbersA", TypeId::NUMBER);
    let numbers_b = define_list("NumbersB", TypeId::NUMBER);
    let strings = define_list("Strings", TypeId::STRING);

    let options = CheckerOptions::default();
    let results: Vec<(bool, bool)> = (0..64)
        .into_par_iter()
        .map(|_| {
            (
                is_subtype_with_env(&interner, &env, &options, numbers_a, numbers_b),
                is_subtype_with_env(&interner, &env, &options, numbers_a, strings),
            )
        })
        .collect();

    assert!(results.iter().all(|&answer| answer == (true, false)));
    assert!(env.cache().stats().relations > 0);
}

#[test]
fn test_concurrent_application_evaluation() {
    let interner = TypeInterner::new();
    let env = TypeEnvironment::new();
    let t_info = TypeParamInfo {
        name: interner.intern_string("T"),
        constraint: None,
    };
    let body = interner.object(vec![prop(&interner, "value", interner.type_param_info(t_info))]);
    let boxed = env.define_alias(&interner, "Box", vec![t_info], body);

    let args = [TypeId::STRING, TypeId::NUMBER, TypeId::BOOLEAN, TypeId::BIGINT];
    let evaluated: Vec<(TypeId, TypeId)> = (0..400)
        .into_par_iter()
        .map(|i| {
            let arg = args[i % args.len()];
            let application = interner.application(boxed, vec![arg]);
            let result = TypeEvaluator::with_resolver(&interner, &env).evaluate(application);
            (arg, result)
        })
        .collect();

    for (arg, result) in evaluated {
        assert_eq!(result, interner.object(vec![prop(&interner, "value", arg)]));
    }
    assert_eq!(env.cache().stats().applications, args.len());
}

#[test]
fn test_concurrent_assignability_checks() {
    let interner = TypeInterner::new();
    let target = interner.object(vec![prop(&interner, "x", TypeId::NUMBER)]);
    let fresh = interner.object_fresh(vec![
        prop(&interner, "x", TypeId::NUMBER),
        prop(&interner, "y", TypeId::NUMBER),
    ]);
    let widened = widen_freshness(&interner, fresh);

    let answers: Vec<(bool, bool)> = (0..128)
        .into_par_iter()
        .map(|_| {
            let mut checker = CompatChecker::new(&interner);
            (
                checker.is_assignable(fresh, target),
                checker.is_assignable(widened, target),
            )
        })
        .collect();

    assert!(answers.iter().all(|&answer| answer == (false, true)));
}
