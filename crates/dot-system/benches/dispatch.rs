//! Reflective dispatch benchmarks
//!
//! Compares a direct call with the same call made through `MethodInfo::invoke`
//! and through the activator.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use dot_system::{Activator, Object, Ptr, Reflected, ReflectionResult, Type, TypeBuilder};

#[derive(Default)]
struct Calculator {
    total: i64,
}

impl Calculator {
    fn add(&self, a: i64, b: i64) -> i64 {
        self.total + a + b
    }
}

impl Reflected for Calculator {
    fn build_type() -> ReflectionResult<Type> {
        TypeBuilder::<Calculator>::new("Dot.Bench", "Calculator")
            .is_class()
            .with_field("total", |c: &Calculator| &c.total, |c: &mut Calculator| &mut c.total)
            .with_constructor(|| Ptr::new(Calculator::default()), &[])
            .with_method("add", Calculator::add, &["a", "b"])
            .build()
    }
}

fn bench_invoke(c: &mut Criterion) {
    let ty = Calculator::type_of();
    let add = ty.get_method("add").expect("add is registered");
    let target = Activator::create_instance(&ty).expect("default constructor");
    let args = [Object::from(3i64), Object::from(4i64)];
    let direct = Calculator::default();

    let mut group = c.benchmark_group("invoke");
    group.bench_function("direct", |b| {
        b.iter(|| direct.add(black_box(3), black_box(4)))
    });
    group.bench_function("method_info", |b| {
        b.iter(|| add.invoke(black_box(&target), black_box(&args)))
    });
    group.finish();
}

fn bench_lookup(c: &mut Criterion) {
    Calculator::type_of();
    let mut group = c.benchmark_group("lookup");
    group.bench_function("type_of", |b| b.iter(Calculator::type_of));
    group.bench_function("by_name", |b| {
        b.iter(|| Type::get_type(black_box("Dot.Bench.Calculator")))
    });
    group.bench_function("activator", |b| {
        let ty = Calculator::type_of();
        b.iter(|| Activator::create_instance(black_box(&ty)))
    });
    group.finish();
}

criterion_group!(benches, bench_invoke, bench_lookup);
criterion_main!(benches);
