use std::sync::Arc;

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use tether_engine::runtime::{ClassBuilder, ClassLoader, HostError, RuntimeClass, Value};
use tether_engine::{Engine, EngineConfig, ObjectRef, PrimitiveType, TypeRef, VersionTag};

const POINT: &str = "template Point { int x; int getX(); int add(int, int); }";

fn point_class() -> (Arc<ClassLoader>, Arc<RuntimeClass>) {
    let int = TypeRef::primitive(PrimitiveType::Int);
    let loader = ClassLoader::new("bench", VersionTag::parse("1.0").unwrap());
    let class = loader
        .define(
            ClassBuilder::new("geo.Point")
                .field("x", int.clone())
                .method("getX", vec![], int.clone(), |this, _| {
                    this.as_object()
                        .and_then(|obj| obj.get_slot(0))
                        .ok_or_else(|| HostError::runtime("no x"))
                })
                .method("add", vec![int.clone(), int.clone()], int, |_, args| {
                    let sum = args.iter().filter_map(Value::as_i64).sum::<i64>();
                    Ok(Value::Int(sum as i32))
                }),
        )
        .unwrap();
    (loader, class)
}

fn engines() -> Vec<(&'static str, Engine)> {
    let disabled = EngineConfig::from_toml_str("[binding]\ngeneration = \"disabled\"").unwrap();
    vec![("generated", Engine::new()), ("fallback", Engine::with_config(disabled))]
}

fn bench_field_get(c: &mut Criterion) {
    let (_loader, class) = point_class();
    let mut group = c.benchmark_group("field_get");

    for (name, engine) in engines() {
        let t = engine.parse_template(POINT).unwrap();
        let binding = engine.bind(&t, &class).unwrap();
        let obj = Value::Object(ObjectRef::allocate(&class));
        binding.set(0, &obj, Value::Int(5)).unwrap();

        group.bench_with_input(BenchmarkId::new(name, "int x"), &obj, |b, obj| {
            b.iter(|| binding.get(black_box(0), black_box(obj)).unwrap());
        });
    }

    group.finish();
}

fn bench_invoke(c: &mut Criterion) {
    let (_loader, class) = point_class();
    let mut group = c.benchmark_group("invoke");
    let args = [Value::Int(2), Value::Int(3)];

    for (name, engine) in engines() {
        let t = engine.parse_template(POINT).unwrap();
        let binding = engine.bind(&t, &class).unwrap();
        let obj = Value::Object(ObjectRef::allocate(&class));

        group.bench_with_input(BenchmarkId::new(name, "getX()"), &obj, |b, obj| {
            b.iter(|| binding.invoke(black_box(1), black_box(obj), &[]).unwrap());
        });
        group.bench_with_input(BenchmarkId::new(name, "add(int, int)"), &obj, |b, obj| {
            b.iter(|| binding.invoke(black_box(2), black_box(obj), black_box(&args)).unwrap());
        });
    }

    group.finish();
}

fn bench_cached_bind(c: &mut Criterion) {
    let (_loader, class) = point_class();
    let engine = Engine::new();
    let t = engine.parse_template(POINT).unwrap();
    engine.bind(&t, &class).unwrap();

    c.bench_function("bind_cache_hit", |b| {
        b.iter(|| engine.bind(black_box(&t), black_box(&class)).unwrap());
    });
}

criterion_group!(benches, bench_field_get, bench_invoke, bench_cached_bind);
criterion_main!(benches);
