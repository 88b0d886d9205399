//! Relation and evaluation benchmarks.
//!
//! Measures structural subtyping over wide objects and large unions, the
//! recursive-type path through a shared environment, and conditional type
//! evaluation with `infer`.

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use std::hint::black_box;
use structype_solver::{
    CheckerOptions, ConditionalType, ParamInfo, PropertyInfo, SubtypeChecker, TypeEnvironment,
    TypeEvaluator, TypeId, TypeInterner, is_subtype_with_env,
};

fn wide_object(interner: &TypeInterner, width: usize) -> TypeId {
    let properties = (0..width)
        .map(|i| PropertyInfo::new(interner.intern_string(&format!("p{i}")), TypeId::NUMBER))
        .collect();
    interner.object(properties)
}

/// Width subtyping: a wide object against a narrower one.
fn bench_object_width(c: &mut Criterion) {
    let mut group = c.benchmark_group("object_width");

    for width in [4, 32, 256] {
        let interner = TypeInterner::new();
        let source = wide_object(&interner, width);
        let target = wide_object(&interner, width / 2);
        group.bench_with_input(BenchmarkId::from_parameter(width), &width, |b, _| {
            b.iter(|| {
                let mut checker = SubtypeChecker::new(&interner);
                black_box(checker.is_subtype_of(black_box(source), black_box(target)))
            });
        });
    }

    group.finish();
}

/// A literal against a large union of literals, and a union against itself.
fn bench_union_membership(c: &mut Criterion) {
    let mut group = c.benchmark_group("union_membership");

    for size in [8, 64, 512] {
        let interner = TypeInterner::new();
        let members: Vec<TypeId> = (0..size)
            .map(|i| interner.literal_string(&format!("member{i}")))
            .collect();
        let last = members[size - 1];
        let union = interner.union(members);

        group.bench_with_input(BenchmarkId::new("literal", size), &size, |b, _| {
            b.iter(|| {
                let mut checker = SubtypeChecker::new(&interner);
                black_box(checker.is_subtype_of(black_box(last), black_box(union)))
            });
        });
        group.bench_with_input(BenchmarkId::new("union", size), &size, |b, _| {
            b.iter(|| {
                let mut checker = SubtypeChecker::new(&interner);
                black_box(checker.is_subtype_of(black_box(union), black_box(union)))
            });
        });
    }

    group.finish();
}

/// Two structurally identical recursive list definitions, with and without
/// the environment's relation cache warmed up.
fn bench_recursive_types(c: &mut Criterion) {
    let interner = TypeInterner::new();
    let env = TypeEnvironment::new();
    let define_list = |name: &str| {
        let def = env.declare(&interner, name, vec![]);
        let next = interner.union2(interner.lazy(def), TypeId::UNDEFINED);
        let body = interner.object(vec![
            PropertyInfo::new(interner.intern_string("value"), TypeId::NUMBER),
            PropertyInfo::new(interner.intern_string("next"), next),
        ]);
        env.set_body(def, body);
        interner.lazy(def)
    };
    let list_a = define_list("ListA");
    let list_b = define_list("ListB");
    let options = CheckerOptions::default();

    c.bench_function("recursive_list_cold", |b| {
        b.iter(|| {
            env.cache().clear();
            black_box(is_subtype_with_env(&interner, &env, &options, list_a, list_b))
        });
    });
    c.bench_function("recursive_list_cached", |b| {
        b.iter(|| black_box(is_subtype_with_env(&interner, &env, &options, list_a, list_b)));
    });
}

/// `ReturnType<F>` over a function type.
fn bench_conditional_infer(c: &mut Criterion) {
    let interner = TypeInterner::new();
    let r = interner.infer("R");
    let pattern = interner.function_type(vec![ParamInfo::rest(interner.array(TypeId::ANY))], r);
    let func = interner.function_type(
        vec![ParamInfo::required(TypeId::STRING), ParamInfo::optional(TypeId::NUMBER)],
        wide_object(&interner, 16),
    );
    let return_type = interner.conditional(ConditionalType {
        check_type: func,
        extends_type: pattern,
        true_type: r,
        false_type: TypeId::NEVER,
        is_distributive: false,
    });

    c.bench_function("conditional_return_type", |b| {
        b.iter(|| black_box(TypeEvaluator::new(&interner).evaluate(black_box(return_type))));
    });
}

criterion_group!(
    benches,
    bench_object_width,
    bench_union_membership,
    bench_recursive_types,
    bench_conditional_infer
);
criterion_main!(benches);
