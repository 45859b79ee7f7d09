//! Conversion boundary
//!
//! Every argument and result crossing a binding passes through a
//! [`Converter`]. The converter is also consulted statically, through the
//! [`Assignability`] predicate, when the resolver decides whether a target
//! member's types are compatible with the declared ones.

mod assignability;
mod basic;

pub use assignability::{Assignability, AssignabilityMode, MatchQuality, Position, StandardAssignability};
pub use basic::BasicConverter;

use crate::error::ConversionError;
use crate::runtime::Value;
use crate::signature::TypeRef;

/// Converts values between the consumer's declared types and the target's
/// actual types
pub trait Converter: Send + Sync {
    /// Convert `value`, statically typed as `from`, into a value of type `to`
    fn convert(&self, value: Value, from: &TypeRef, to: &TypeRef) -> Result<Value, ConversionError>;

    /// Check whether values of `from` can in principle be converted to `to`
    fn can_convert(&self, from: &TypeRef, to: &TypeRef) -> bool;
}
