//! Runtime values
//!
//! Values flowing through accessors: primitives, strings, raw object
//! references into the host heap, and handles (consumer-facing wrappers
//! around raw objects, translated at the conversion boundary).

use std::fmt;
use std::sync::Arc;

use crate::signature::{PrimitiveType, TypeRef, OBJECT_TYPE, STRING_TYPE};

use super::object::ObjectRef;

/// A consumer-facing wrapper around a raw target object
#[derive(Debug, Clone)]
pub struct Handle {
    type_name: Arc<str>,
    raw: ObjectRef,
}

impl Handle {
    /// Wrap a raw object as a handle of the given logical type
    pub fn new(type_name: &str, raw: ObjectRef) -> Self {
        Self {
            type_name: Arc::from(type_name),
            raw,
        }
    }

    /// Logical type the handle stands for
    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    /// Underlying target object
    pub fn raw(&self) -> &ObjectRef {
        &self.raw
    }

    /// Unwrap into the underlying target object
    pub fn into_raw(self) -> ObjectRef {
        self.raw
    }
}

impl PartialEq for Handle {
    fn eq(&self, other: &Self) -> bool {
        self.type_name == other.type_name && self.raw == other.raw
    }
}

/// A dynamically typed runtime value
#[derive(Debug, Clone, Default)]
pub enum Value {
    /// Null reference (also the result of void calls)
    #[default]
    Null,
    /// boolean
    Bool(bool),
    /// byte
    Byte(i8),
    /// short
    Short(i16),
    /// char (UTF-16 code unit)
    Char(u16),
    /// int
    Int(i32),
    /// long
    Long(i64),
    /// float
    Float(f32),
    /// double
    Double(f64),
    /// String
    Str(Arc<str>),
    /// Raw target object
    Object(ObjectRef),
    /// Consumer-facing wrapper around a target object
    Handle(Handle),
}

impl Value {
    /// Create a string value
    pub fn string(s: &str) -> Self {
        Value::Str(Arc::from(s))
    }

    /// Check for null
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Primitive type of this value, if it is a primitive
    pub fn primitive_type(&self) -> Option<PrimitiveType> {
        Some(match self {
            Value::Bool(_) => PrimitiveType::Boolean,
            Value::Byte(_) => PrimitiveType::Byte,
            Value::Short(_) => PrimitiveType::Short,
            Value::Char(_) => PrimitiveType::Char,
            Value::Int(_) => PrimitiveType::Int,
            Value::Long(_) => PrimitiveType::Long,
            Value::Float(_) => PrimitiveType::Float,
            Value::Double(_) => PrimitiveType::Double,
            _ => return None,
        })
    }

    /// Raw object reference (handles are not unwrapped)
    pub fn as_object(&self) -> Option<&ObjectRef> {
        match self {
            Value::Object(obj) => Some(obj),
            _ => None,
        }
    }

    /// Raw object reference, looking through handles
    pub fn as_raw_object(&self) -> Option<&ObjectRef> {
        match self {
            Value::Object(obj) => Some(obj),
            Value::Handle(handle) => Some(handle.raw()),
            _ => None,
        }
    }

    /// Integral value widened to i64
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Byte(v) => Some(*v as i64),
            Value::Short(v) => Some(*v as i64),
            Value::Char(v) => Some(*v as i64),
            Value::Int(v) => Some(*v as i64),
            Value::Long(v) => Some(*v),
            _ => None,
        }
    }

    /// Numeric value widened to f64
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Float(v) => Some(*v as f64),
            Value::Double(v) => Some(*v),
            other => other.as_i64().map(|v| v as f64),
        }
    }

    /// Boolean value
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// String contents
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    /// The default value stored in a fresh slot of the given type
    pub fn default_for(ty: &TypeRef) -> Value {
        match ty.as_primitive() {
            Some(PrimitiveType::Boolean) => Value::Bool(false),
            Some(PrimitiveType::Byte) => Value::Byte(0),
            Some(PrimitiveType::Short) => Value::Short(0),
            Some(PrimitiveType::Char) => Value::Char(0),
            Some(PrimitiveType::Int) => Value::Int(0),
            Some(PrimitiveType::Long) => Value::Long(0),
            Some(PrimitiveType::Float) => Value::Float(0.0),
            Some(PrimitiveType::Double) => Value::Double(0.0),
            Some(PrimitiveType::Void) | None => Value::Null,
        }
    }

    /// Human-readable runtime type name (for diagnostics)
    pub fn type_name(&self) -> String {
        match self {
            Value::Null => "null".to_string(),
            Value::Str(_) => STRING_TYPE.to_string(),
            Value::Object(obj) => obj.class().name().to_string(),
            Value::Handle(handle) => format!("handle {}", handle.type_name()),
            other => other
                .primitive_type()
                .map(|p| p.keyword().to_string())
                .unwrap_or_else(|| OBJECT_TYPE.to_string()),
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Byte(a), Value::Byte(b)) => a == b,
            (Value::Short(a), Value::Short(b)) => a == b,
            (Value::Char(a), Value::Char(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Long(a), Value::Long(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a == b,
            (Value::Double(a), Value::Double(b)) => a == b,
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::Object(a), Value::Object(b)) => a == b,
            (Value::Handle(a), Value::Handle(b)) => a == b,
            _ => false,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Bool(v) => write!(f, "{}", v),
            Value::Byte(v) => write!(f, "{}", v),
            Value::Short(v) => write!(f, "{}", v),
            Value::Char(v) => match char::from_u32(*v as u32) {
                Some(c) => write!(f, "{}", c),
                None => write!(f, "\\u{:04x}", v),
            },
            Value::Int(v) => write!(f, "{}", v),
            Value::Long(v) => write!(f, "{}", v),
            Value::Float(v) => write!(f, "{}", v),
            Value::Double(v) => write!(f, "{}", v),
            Value::Str(s) => write!(f, "{}", s),
            Value::Object(obj) => write!(f, "{}@{}", obj.class().name(), obj.identity()),
            Value::Handle(h) => write!(f, "{}[{}@{}]", h.type_name(), h.raw().class().name(), h.raw().identity()),
        }
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Int(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Long(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Double(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::string(v)
    }
}

impl From<ObjectRef> for Value {
    fn from(v: ObjectRef) -> Self {
        Value::Object(v)
    }
}

impl From<Handle> for Value {
    fn from(v: Handle) -> Self {
        Value::Handle(v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_numeric_views() {
        assert_eq!(Value::Byte(-3).as_i64(), Some(-3));
        assert_eq!(Value::Int(7).as_f64(), Some(7.0));
        assert_eq!(Value::Double(1.5).as_i64(), None);
        assert_eq!(Value::string("x").as_i64(), None);
    }

    #[test]
    fn test_defaults() {
        assert_eq!(Value::default_for(&TypeRef::primitive(PrimitiveType::Int)), Value::Int(0));
        assert_eq!(Value::default_for(&TypeRef::primitive(PrimitiveType::Boolean)), Value::Bool(false));
        assert_eq!(Value::default_for(&TypeRef::string()), Value::Null);
    }

    #[test]
    fn test_equality_is_type_strict() {
        assert_eq!(Value::Int(1), Value::Int(1));
        assert_ne!(Value::Int(1), Value::Long(1));
        assert_eq!(Value::string("a"), Value::from("a"));
    }
}
