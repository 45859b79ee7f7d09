//! Host runtime model
//!
//! The target side of a binding: class loaders, loaded classes with their
//! slot layouts and virtual method tables, heap instances, and values.

mod class;
mod error;
mod loader;
mod object;
mod value;

pub use class::{
    ClassBuilder, ClassId, ConstructorBody, ConstructorDef, FieldDef, MemberAccess, MethodBody,
    MethodDef, RuntimeClass, StaticStorage,
};
pub use error::{HostError, LoaderError};
pub use loader::{ClassLoader, LoaderId};
pub use object::{Instance, ObjectRef};
pub use value::{Handle, Value};
