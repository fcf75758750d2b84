use criterion::{black_box, criterion_group, criterion_main, Criterion};

use namedcall::datatype::{Callable, Value};
use namedcall::engine::Engine;
use namedcall::metadata::ParameterSpec;
use namedcall::named;
use namedcall::signature::infer_parameter_order;
use namedcall::validation::rule;

pub fn criterion_benchmark(c: &mut Criterion) {
    let source = "function f(alpha, /* beta, */ gamma, // delta,\n epsilon) { }";
    c.bench_function("infer order", |b| b.iter(|| infer_parameter_order(black_box(source))));

    let engine = Engine::new();
    let f = Value::from(Callable::with_source("function f(a, b, c)", |_, args| {
        Ok(Value::from(args.len() as i64))
    }));
    let args = named! { "c" => 3, "a" => 1, "b" => 2 };
    c.bench_function("invoke cached", |b| {
        b.iter(|| engine.invoke_named(black_box(&f), &Value::Null, black_box(&args)))
    });

    let g = Value::from(Callable::with_source("function g(a, b, c)", |_, args| {
        Ok(Value::from(args.len() as i64))
    }));
    engine
        .describe_with(&g, &[
            ParameterSpec::new("a").typed("number"),
            ParameterSpec::new("b").typed("number").default_value(2),
            ParameterSpec::new("c"),
        ])
        .unwrap();
    let positive = Callable::predicate("positive", |v| v.as_f64().is_some_and(|n| n > 0.0));
    engine
        .add_validations(&g, &named! { "a" => rule(positive, true) })
        .unwrap();
    let args = named! { "a" => 1, "c" => "x" };
    c.bench_function("invoke typed and validated", |b| {
        b.iter(|| engine.invoke_named(black_box(&g), &Value::Null, black_box(&args)))
    });
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
