//! Fallback Invoker Tests
//!
//! The reflective fallback must be observably identical to generated
//! accessors. Covers:
//! - Injected generation failures
//! - Generation disabled by configuration
//! - Re-entrant binding requests during generation
//!
//! # Running Tests
//! ```bash
//! cargo test --test fallback_tests
//! ```

use std::sync::{Arc, Mutex, OnceLock, Weak};

use tether_engine::codegen::{AccessorGenerator, ClosureGenerator, GeneratedImplementation, GenerationRequest};
use tether_engine::runtime::{ClassBuilder, ClassLoader, HostError, RuntimeClass, Value};
use tether_engine::{
    AccessError, AccessResult, BindError, Binding, BindingConfig, Engine, EngineConfig, GenerationFailure,
    GenerationMode, ObjectRef, PrimitiveType, TemplateDescriptor, TypeRef, VersionTag,
};

fn int() -> TypeRef {
    TypeRef::primitive(PrimitiveType::Int)
}

struct RejectingGenerator;

impl AccessorGenerator for RejectingGenerator {
    fn generate(&self, request: &GenerationRequest<'_>) -> Result<GeneratedImplementation, GenerationFailure> {
        Err(GenerationFailure::AccessDenied {
            member: request.descriptor.name().to_string(),
        })
    }
}

const ACCOUNT: &str = "
template bank.Account {
    static int opened;
    long balance;
    long deposit(int amount);
    void close();
    optional String owner();
    Account(long initial);
}";

fn account_class() -> (Arc<ClassLoader>, Arc<RuntimeClass>) {
    let loader = ClassLoader::new("bank", VersionTag::parse("3.1").unwrap());
    let long = TypeRef::primitive(PrimitiveType::Long);
    let class = loader
        .define(
            ClassBuilder::new("bank.Account")
                .static_field("opened", int(), Value::Int(0))
                .field("balance", long.clone())
                .method("deposit", vec![int()], long.clone(), |this, args| {
                    let this = this.as_object().ok_or_else(|| HostError::runtime("no receiver"))?;
                    let amount = args[0].as_i64().unwrap_or(0);
                    if amount <= 0 {
                        return Err(HostError::illegal_argument("amount must be positive"));
                    }
                    let balance = this.get_slot(0).and_then(|v| v.as_i64()).unwrap_or(0) + amount;
                    this.set_slot(0, Value::Long(balance));
                    Ok(Value::Long(balance))
                })
                .method("close", vec![], TypeRef::void(), |_, _| {
                    Err(HostError::new("IllegalStateException", "account frozen"))
                })
                .constructor(vec![long], |obj, args| {
                    obj.set_slot(0, args[0].clone());
                    Ok(())
                }),
        )
        .unwrap();
    (loader, class)
}

/// Every observable outcome of a fixed sequence of operations
fn exercise(binding: &Binding) -> Vec<AccessResult<Value>> {
    let mut log = Vec::new();
    log.push(binding.set_static(0, Value::Int(2)).map(|_| Value::Null));
    log.push(binding.get_static(0));

    let account = binding.construct(5, &[Value::Long(100)]);
    log.push(account.clone().map(|_| Value::Null));
    let account = account.unwrap_or(Value::Null);

    log.push(binding.get(1, &account));
    log.push(binding.invoke(2, &account, &[Value::Int(50)]));
    log.push(binding.invoke(2, &account, &[Value::Int(-1)]));
    log.push(binding.invoke(2, &account, &[Value::Long(i64::MAX)]));
    log.push(binding.invoke(2, &account, &[]));
    log.push(binding.invoke(3, &account, &[]));
    log.push(binding.invoke(4, &account, &[]));
    log.push(binding.set(1, &account, Value::Int(7)).map(|_| Value::Null));
    log.push(binding.get(1, &account));
    log.push(binding.get(1, &Value::string("not an account")));
    log.push(binding.get(2, &account));
    log.push(binding.get(42, &account));
    log
}

#[test]
fn test_injected_failure_matches_generated() {
    let (_a, generated_class) = account_class();
    let (_b, fallback_class) = account_class();

    let generated_engine = Engine::new();
    let fallback_engine = Engine::builder().generator(Arc::new(RejectingGenerator)).build();

    let t = generated_engine.parse_template(ACCOUNT).unwrap();
    let generated = generated_engine.bind(&t, &generated_class).unwrap();
    let fallback = fallback_engine.bind(&t, &fallback_class).unwrap();
    assert!(generated.is_generated());
    assert!(!fallback.is_generated());

    let expected = exercise(&generated);
    let actual = exercise(&fallback);
    assert_eq!(expected.len(), actual.len());
    for (i, (e, a)) in expected.iter().zip(&actual).enumerate() {
        assert_eq!(e, a, "operation {} differs", i);
    }

    // Spot-check the sequence itself
    assert_eq!(expected[1], Ok(Value::Int(2)));
    assert_eq!(expected[4], Ok(Value::Long(150)));
    assert_eq!(
        expected[5].as_ref().unwrap_err().host_error().map(|e| e.kind()),
        Some("IllegalArgument")
    );
    assert!(matches!(expected[6], Err(AccessError::Conversion { .. })));
    assert!(matches!(expected[7], Err(AccessError::ArgumentCount { .. })));
    assert!(matches!(expected[9], Err(AccessError::MemberAbsent { .. })));
    assert_eq!(expected[11], Ok(Value::Long(7)));
    assert!(matches!(expected[12], Err(AccessError::IncompatibleInstance { .. })));
    assert!(matches!(expected[13], Err(AccessError::WrongAccessor { .. })));
    assert!(matches!(expected[14], Err(AccessError::NoSuchMember { .. })));
}

#[test]
fn test_generation_disabled() {
    let (_loader, class) = account_class();
    let config = EngineConfig::from_toml_str("[binding]\ngeneration = \"disabled\"").unwrap();
    let engine = Engine::with_config(config);
    let t = engine.parse_template(ACCOUNT).unwrap();
    let binding = engine.bind(&t, &class).unwrap();

    assert!(!binding.is_generated());
    let account = binding.construct(5, &[Value::Long(1)]).unwrap();
    assert_eq!(binding.invoke(2, &account, &[Value::Int(2)]).unwrap(), Value::Long(3));
}

#[test]
fn test_no_fallback_surfaces_generation_failure() {
    let (_loader, class) = account_class();
    let config = EngineConfig {
        binding: BindingConfig {
            fallback: false,
            ..BindingConfig::default()
        },
    };
    let engine = Engine::builder()
        .config(config)
        .generator(Arc::new(RejectingGenerator))
        .build();
    let t = engine.parse_template(ACCOUNT).unwrap();

    match engine.bind(&t, &class).unwrap_err() {
        BindError::BindingUnavailable { source, .. } => {
            assert!(matches!(source, GenerationFailure::AccessDenied { .. }))
        }
        other => panic!("unexpected error: {:?}", other),
    }
}

#[test]
fn test_reflective_only_member_falls_back() {
    let loader = ClassLoader::new("sec", VersionTag::parse("1.0").unwrap());
    let class = loader
        .define(ClassBuilder::new("sec.Vault").field("secret", int()).reflective_only())
        .unwrap();
    let engine = Engine::new();
    let t = engine.parse_template("template Vault { int secret; }").unwrap();
    let binding = engine.bind(&t, &class).unwrap();
    assert!(!binding.is_generated());
    assert_eq!(engine.config().binding.generation, GenerationMode::Enabled);

    let vault = Value::Object(ObjectRef::allocate(&class));
    binding.set(0, &vault, Value::Int(42)).unwrap();
    assert_eq!(binding.get(0, &vault).unwrap(), Value::Int(42));
}

/// Asks the engine for the same binding while generating it
#[derive(Default)]
struct ReentrantGenerator {
    engine: OnceLock<Weak<Engine>>,
    descriptor: OnceLock<Arc<TemplateDescriptor>>,
    nested: Mutex<Option<Arc<Binding>>>,
    inner: ClosureGenerator,
}

impl AccessorGenerator for ReentrantGenerator {
    fn generate(&self, request: &GenerationRequest<'_>) -> Result<GeneratedImplementation, GenerationFailure> {
        if let (Some(engine), Some(descriptor)) = (self.engine.get().and_then(Weak::upgrade), self.descriptor.get()) {
            if let Ok(binding) = engine.bind(descriptor, request.target) {
                *self.nested.lock().unwrap() = Some(binding);
            }
        }
        self.inner.generate(request)
    }
}

#[test]
fn test_reentrant_request_gets_fallback() {
    let (_loader, class) = account_class();
    let generator = Arc::new(ReentrantGenerator::default());
    let engine = Arc::new(Engine::builder().generator(generator.clone()).build());
    let t = engine.parse_template(ACCOUNT).unwrap();
    generator.engine.set(Arc::downgrade(&engine)).unwrap();
    generator.descriptor.set(t.clone()).unwrap();

    let outer = engine.bind(&t, &class).unwrap();
    assert!(outer.is_generated());

    let nested = generator.nested.lock().unwrap().take().unwrap();
    assert!(!nested.is_generated());
    assert!(!Arc::ptr_eq(&outer, &nested));
    assert_eq!(engine.cache().stats().reentrant(), 1);

    // The nested binding is usable and agrees with the memoized one
    let account = outer.construct(5, &[Value::Long(10)]).unwrap();
    assert_eq!(nested.get(1, &account).unwrap(), Value::Long(10));

    // Later requests see the memoized, generated binding
    let again = engine.bind(&t, &class).unwrap();
    assert!(Arc::ptr_eq(&outer, &again));
}

#[test]
fn test_shadowed_field_matches_generated() {
    let loader = ClassLoader::new("geo", VersionTag::parse("1.0").unwrap());
    let base = loader.define(ClassBuilder::new("geo.Base").field("x", int())).unwrap();
    let derived = loader
        .define(ClassBuilder::new("geo.Derived").extends(&base).field("x", int()))
        .unwrap();

    let generated_engine = Engine::new();
    let fallback_engine = Engine::builder().generator(Arc::new(RejectingGenerator)).build();
    let t = generated_engine.parse_template("template Base { int x; }").unwrap();
    let generated = generated_engine.bind(&t, &base).unwrap();
    let fallback = fallback_engine.bind(&t, &base).unwrap();
    assert!(generated.is_generated());
    assert!(!fallback.is_generated());

    // Both paths address the field declared by the bound class
    let obj = Value::Object(ObjectRef::allocate(&derived));
    generated.set(0, &obj, Value::Int(11)).unwrap();
    assert_eq!(generated.get(0, &obj).unwrap(), Value::Int(11));
    assert_eq!(fallback.get(0, &obj).unwrap(), Value::Int(11));

    fallback.set(0, &obj, Value::Int(12)).unwrap();
    assert_eq!(generated.get(0, &obj).unwrap(), Value::Int(12));
}
