//! Accessor synthesis
//!
//! An [`AccessorGenerator`] turns resolved members into specialized entry
//! points that reach the host member directly, without any per-call name
//! lookup. The bundled [`ClosureGenerator`] builds one boxed closure per
//! member at bind time.

mod closure;
pub(crate) mod marshal;

pub use closure::ClosureGenerator;

use std::fmt;
use std::sync::Arc;

use crate::convert::Converter;
use crate::error::{AccessResult, GenerationFailure};
use crate::resolver::ResolvedMember;
use crate::runtime::{ObjectRef, RuntimeClass, Value};
use crate::template::TemplateDescriptor;

/// Reads an instance field
pub type FieldGetter = Box<dyn Fn(&ObjectRef) -> AccessResult<Value> + Send + Sync>;

/// Writes an instance field
pub type FieldSetter = Box<dyn Fn(&ObjectRef, Value) -> AccessResult<()> + Send + Sync>;

/// Reads a static field
pub type StaticGetter = Box<dyn Fn() -> AccessResult<Value> + Send + Sync>;

/// Writes a static field
pub type StaticSetter = Box<dyn Fn(Value) -> AccessResult<()> + Send + Sync>;

/// Invokes an instance method on a receiver
pub type MethodInvoker = Box<dyn Fn(&ObjectRef, &[Value]) -> AccessResult<Value> + Send + Sync>;

/// Invokes a static method or constructor
pub type StaticInvoker = Box<dyn Fn(&[Value]) -> AccessResult<Value> + Send + Sync>;

/// Entry point for one member
///
/// Receivers passed in are raw target objects already checked against the
/// bound class; argument counts are already checked.
pub enum Accessor {
    /// Optional member missing on the target
    Absent,
    /// Instance field
    Field {
        /// Read
        get: FieldGetter,
        /// Write
        set: FieldSetter,
    },
    /// Static field
    StaticField {
        /// Read
        get: StaticGetter,
        /// Write
        set: StaticSetter,
    },
    /// Instance method
    Method(MethodInvoker),
    /// Static method
    StaticMethod(StaticInvoker),
    /// Constructor
    Constructor(StaticInvoker),
}

impl fmt::Debug for Accessor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Accessor::Absent => "Absent",
            Accessor::Field { .. } => "Field",
            Accessor::StaticField { .. } => "StaticField",
            Accessor::Method(_) => "Method",
            Accessor::StaticMethod(_) => "StaticMethod",
            Accessor::Constructor(_) => "Constructor",
        };
        f.write_str(name)
    }
}

/// Generated entry points, index-aligned with the template's members
#[derive(Debug)]
pub struct GeneratedImplementation {
    accessors: Vec<Accessor>,
}

impl GeneratedImplementation {
    /// Wrap a list of accessors
    pub fn new(accessors: Vec<Accessor>) -> Self {
        Self { accessors }
    }

    /// Accessor for a member index
    pub fn accessor(&self, index: usize) -> Option<&Accessor> {
        self.accessors.get(index)
    }

    /// Number of accessors
    pub fn len(&self) -> usize {
        self.accessors.len()
    }

    /// Check if there are no accessors
    pub fn is_empty(&self) -> bool {
        self.accessors.is_empty()
    }
}

/// Everything a generator needs for one binding
pub struct GenerationRequest<'a> {
    /// Template being bound
    pub descriptor: &'a TemplateDescriptor,
    /// Target class
    pub target: &'a Arc<RuntimeClass>,
    /// Resolved members, index-aligned with the template
    pub members: &'a [ResolvedMember],
    /// Conversion boundary
    pub converter: &'a Arc<dyn Converter>,
    /// Largest parameter count to synthesize
    pub max_arity: usize,
}

/// Synthesizes accessors for resolved members
pub trait AccessorGenerator: Send + Sync {
    /// Build entry points for every member of the request
    fn generate(&self, request: &GenerationRequest<'_>) -> Result<GeneratedImplementation, GenerationFailure>;
}
