//! Signature model
//!
//! Value types describing members independently of any loaded class:
//! [`TypeRef`] for types, [`MemberSignature`] for fields, methods and
//! constructors, and [`Modifiers`] for the declared flags.

mod member;
mod types;

pub use member::{MemberKind, MemberSignature, Modifiers, CONSTRUCTOR_NAME};
pub use types::{PrimitiveType, TypeRef, OBJECT_TYPE, STRING_TYPE};
