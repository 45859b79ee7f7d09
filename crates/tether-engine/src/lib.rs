//! Tether Engine
//!
//! Binds version-independent member templates to classes loaded at runtime:
//! - **Templates**: Lexer and parser for template text (`template` module)
//! - **Remapping**: Renames and signature changes between releases (`remap` module)
//! - **Resolution**: Maps declared members onto concrete host members (`resolver` module)
//! - **Generation**: Direct accessors built at bind time (`codegen` module)
//! - **Bindings**: Memoized per template, class and loader (`binding` module)
//!
//! # Example
//!
//! ```rust,ignore
//! use tether_engine::{Engine, Value};
//!
//! let engine = Engine::new();
//! let point = engine.parse_template("template geo.Point { int getX(); }")?;
//! let binding = engine.bind_named(&point, &loader)?;
//!
//! let get_x = binding.member_index("getX").unwrap();
//! let x = binding.invoke(get_x, &instance, &[])?;
//! assert_eq!(x, Value::Int(5));
//! ```

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

// ============================================================================
// Core Modules
// ============================================================================

/// Release version tags and ranges
pub mod version;

/// Member signatures and type references
pub mod signature;

/// Host runtime model: loaders, classes, instances and values
pub mod runtime;

/// Conversion boundary and assignability
pub mod convert;

/// Version remap table
pub mod remap;

/// Template lexer, parser and descriptors
pub mod template;

/// Member resolution
pub mod resolver;

/// Accessor generation
pub mod codegen;

/// Reflective fallback invoker
pub mod fallback;

/// Bindings and the binding cache
pub mod binding;

/// Engine configuration
pub mod config;

/// Binding and access errors
pub mod error;

mod engine;

// ============================================================================
// Re-exports
// ============================================================================

pub use binding::{Binding, BindingCache, CacheStats};
pub use config::{BindingConfig, ConfigError, EngineConfig, GenerationMode};
pub use convert::{AssignabilityMode, BasicConverter, Converter};
pub use engine::{Engine, EngineBuilder};
pub use error::{AccessError, AccessResult, BindError, BindResult, ConversionError, GenerationFailure};
pub use remap::{ClassRemap, RemapEntry, RemapError, RemapTable};
pub use runtime::{ClassBuilder, ClassLoader, HostError, ObjectRef, RuntimeClass, Value};
pub use signature::{MemberKind, MemberSignature, PrimitiveType, TypeRef};
pub use template::{parse_template, TemplateDescriptor, TemplateSyntaxError};
pub use version::{VersionRange, VersionTag};
