//! Concurrent Binding Tests
//!
//! Many threads requesting the same binding at once:
//! - Exactly one resolution and generation run per key
//! - Every caller observes the same binding or the same error
//! - Unrelated keys proceed independently
//!
//! # Running Tests
//! ```bash
//! cargo test --test concurrency_tests
//! ```

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Barrier};
use std::thread;
use std::time::Duration;

use crossbeam::channel;

use tether_engine::codegen::{AccessorGenerator, ClosureGenerator, GeneratedImplementation, GenerationRequest};
use tether_engine::runtime::{ClassBuilder, ClassLoader, RuntimeClass, Value};
use tether_engine::{BindError, Binding, Engine, GenerationFailure, ObjectRef, PrimitiveType, TypeRef, VersionTag};

const THREADS: usize = 16;

/// Counts generation runs and holds the builder long enough for the other
/// threads to pile up on the slot
#[derive(Default)]
struct CountingGenerator {
    runs: AtomicUsize,
    inner: ClosureGenerator,
}

impl AccessorGenerator for CountingGenerator {
    fn generate(&self, request: &GenerationRequest<'_>) -> Result<GeneratedImplementation, GenerationFailure> {
        self.runs.fetch_add(1, Ordering::SeqCst);
        thread::sleep(Duration::from_millis(20));
        self.inner.generate(request)
    }
}

fn counter_class(name: &str) -> (Arc<ClassLoader>, Arc<RuntimeClass>) {
    let loader = ClassLoader::new("c", VersionTag::parse("1.0").unwrap());
    let class = loader
        .define(ClassBuilder::new(name).field("value", TypeRef::primitive(PrimitiveType::Int)))
        .unwrap();
    (loader, class)
}

#[test]
fn test_single_generation_under_contention() {
    let (_loader, class) = counter_class("Counter");
    let generator = Arc::new(CountingGenerator::default());
    let engine = Engine::builder().generator(generator.clone()).build();
    let t = engine.parse_template("template Counter { int value; }").unwrap();
    let barrier = Barrier::new(THREADS);

    let bindings: Vec<Arc<Binding>> = thread::scope(|s| {
        let handles: Vec<_> = (0..THREADS)
            .map(|_| {
                s.spawn(|| {
                    barrier.wait();
                    engine.bind(&t, &class).unwrap()
                })
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    assert_eq!(generator.runs.load(Ordering::SeqCst), 1);
    assert_eq!(engine.cache().stats().generation_runs(), 1);
    assert!(bindings.iter().all(|b| Arc::ptr_eq(b, &bindings[0])));
    assert!(bindings[0].is_generated());
}

#[test]
fn test_failure_shared_by_all_callers() {
    let (_loader, class) = counter_class("Counter");
    let generator = Arc::new(CountingGenerator::default());
    let engine = Engine::builder().generator(generator.clone()).build();
    let t = engine.parse_template("template Counter { int missing(); }").unwrap();
    let barrier = Barrier::new(THREADS);
    let (tx, rx) = channel::unbounded::<Result<Arc<Binding>, BindError>>();

    thread::scope(|s| {
        for _ in 0..THREADS {
            let tx = tx.clone();
            s.spawn(|| {
                let tx = tx;
                barrier.wait();
                tx.send(engine.bind(&t, &class)).unwrap();
            });
        }
    });
    drop(tx);

    let outcomes: Vec<_> = rx.iter().collect();
    assert_eq!(outcomes.len(), THREADS);
    let first = outcomes[0].as_ref().unwrap_err();
    assert!(matches!(first, BindError::MemberNotFound { .. }));
    assert!(outcomes.iter().all(|o| o.as_ref().unwrap_err() == first));
    // Resolution failed before generation was ever attempted
    assert_eq!(generator.runs.load(Ordering::SeqCst), 0);
    assert_eq!(engine.cache().stats().generation_runs(), 1);
}

#[test]
fn test_independent_keys() {
    let classes: Vec<_> = (0..4).map(|i| counter_class(&format!("Counter{}", i))).collect();
    let generator = Arc::new(CountingGenerator::default());
    let engine = Engine::builder().generator(generator.clone()).build();
    let t = engine.parse_template("template Counter { int value; }").unwrap();
    let barrier = Barrier::new(classes.len() * 2);

    thread::scope(|s| {
        for (_, class) in &classes {
            for _ in 0..2 {
                let (engine, t, barrier) = (&engine, &t, &barrier);
                s.spawn(move || {
                    barrier.wait();
                    let binding = engine.bind(&t, class).unwrap();
                    let obj = Value::Object(ObjectRef::allocate(class));
                    binding.set(0, &obj, Value::Int(1)).unwrap();
                    assert_eq!(binding.get(0, &obj).unwrap(), Value::Int(1));
                });
            }
        }
    });

    assert_eq!(generator.runs.load(Ordering::SeqCst), classes.len());
    assert_eq!(engine.cache().len(), classes.len());
}

#[test]
fn test_shared_binding_across_threads() {
    let (_loader, class) = counter_class("Counter");
    let engine = Engine::new();
    let t = engine.parse_template("template Counter { int value; }").unwrap();
    let binding = engine.bind(&t, &class).unwrap();
    let obj = Value::Object(ObjectRef::allocate(&class));

    thread::scope(|s| {
        for i in 0..THREADS {
            let (binding, obj) = (&binding, &obj);
            s.spawn(move || {
                binding.set(0, obj, Value::Int(i as i32)).unwrap();
                let seen = binding.get(0, obj).unwrap();
                assert!(matches!(seen, Value::Int(n) if (0..THREADS as i32).contains(&n)));
            });
        }
    });
}
