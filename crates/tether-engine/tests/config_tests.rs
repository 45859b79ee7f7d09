//! Configuration Loading Tests
//!
//! # Running Tests
//! ```bash
//! cargo test --test config_tests
//! ```

use std::io::Write;

use tether_engine::{AssignabilityMode, ConfigError, Engine, EngineConfig, GenerationMode};

#[test]
fn test_load_from_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(
        file,
        r#"
[binding]
generation = "enabled"
fallback = true
max_generated_arity = 3
assignability = "subtype"
log_fallbacks = false
"#
    )
    .unwrap();

    let config = EngineConfig::load(file.path()).unwrap();
    assert_eq!(config.binding.generation, GenerationMode::Enabled);
    assert_eq!(config.binding.max_generated_arity, 3);
    assert_eq!(config.binding.assignability, AssignabilityMode::Subtype);
    assert!(!config.binding.log_fallbacks);
}

#[test]
fn test_missing_file() {
    let dir = tempfile::tempdir().unwrap();
    let err = EngineConfig::load(&dir.path().join("tether.toml")).unwrap_err();
    assert!(matches!(err, ConfigError::Io(_)));
    assert!(err.to_string().starts_with("Failed to read configuration file"));
}

#[test]
fn test_written_config_reloads() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("tether.toml");

    let mut config = EngineConfig::default();
    config.binding.generation = GenerationMode::Disabled;
    config.binding.assignability = AssignabilityMode::Exact;
    std::fs::write(&path, config.to_toml_string().unwrap()).unwrap();

    assert_eq!(EngineConfig::load(&path).unwrap(), config);
}

#[test]
fn test_json_shape_matches_toml_keys() {
    // Tools that emit JSON use the same keys and lowercase enum values
    let json = serde_json::to_value(EngineConfig::default()).unwrap();
    assert_eq!(json["binding"]["generation"], "enabled");
    assert_eq!(json["binding"]["assignability"], "convertible");
    assert_eq!(json["binding"]["max_generated_arity"], 8);

    let parsed: EngineConfig = serde_json::from_str(
        r#"{"binding": {"generation": "disabled", "assignability": "exact"}}"#,
    )
    .unwrap();
    assert_eq!(parsed.binding.generation, GenerationMode::Disabled);
    assert!(parsed.binding.fallback);
}

#[test]
fn test_arity_limit_applies_to_generation() {
    use tether_engine::runtime::{ClassBuilder, ClassLoader, Value};
    use tether_engine::{PrimitiveType, TypeRef, VersionTag};

    let int = TypeRef::primitive(PrimitiveType::Int);
    let loader = ClassLoader::new("m", VersionTag::parse("1.0").unwrap());
    let class = loader
        .define(ClassBuilder::new("m.Math").static_method(
            "sum3",
            vec![int.clone(), int.clone(), int.clone()],
            int,
            |args| Ok(Value::Int(args.iter().filter_map(|a| a.as_i64()).sum::<i64>() as i32)),
        ))
        .unwrap();

    let config = EngineConfig::from_toml_str("[binding]\nmax_generated_arity = 2").unwrap();
    let engine = Engine::with_config(config);
    let t = engine.parse_template("template Math { static int sum3(int, int, int); }").unwrap();
    let binding = engine.bind(&t, &class).unwrap();

    // Too wide to generate: served by the fallback with the same result
    assert!(!binding.is_generated());
    assert_eq!(
        binding.invoke_static(0, &[Value::Int(1), Value::Int(2), Value::Int(3)]).unwrap(),
        Value::Int(6)
    );
}
