//! Default converter: primitive coercions and handle wrapping

use std::sync::Arc;

use rustc_hash::FxHashSet;

use crate::error::ConversionError;
use crate::runtime::{Handle, Value};
use crate::signature::{PrimitiveType, TypeRef};

use super::Converter;

/// Converter handling the common cases
///
/// * numeric widening, and narrowing when the value fits the target type,
/// * `Object` and type placeholders accept any value,
/// * named types accept instances of that class or a subclass,
/// * registered handle types wrap raw objects on the way out and are
///   unwrapped on the way in.
#[derive(Debug, Clone, Default)]
pub struct BasicConverter {
    handle_types: FxHashSet<Arc<str>>,
}

impl BasicConverter {
    /// Create a converter with no handle types
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a consumer-side handle type name
    pub fn with_handle_type(mut self, name: &str) -> Self {
        self.handle_types.insert(Arc::from(name));
        self
    }

    /// Check whether a type is a registered handle type
    pub fn is_handle_type(&self, ty: &TypeRef) -> bool {
        ty.name().is_some_and(|n| self.handle_types.contains(n))
    }

    fn convert_reference(&self, value: Value, from: &TypeRef, to: &TypeRef) -> Result<Value, ConversionError> {
        if let Some(name) = to.name().filter(|_| self.is_handle_type(to)) {
            return match value {
                Value::Handle(h) if h.type_name() == name => Ok(Value::Handle(h)),
                Value::Handle(h) => Ok(Value::Handle(Handle::new(name, h.into_raw()))),
                Value::Object(obj) => Ok(Value::Handle(Handle::new(name, obj))),
                other => Err(ConversionError::new(&other, from, to, "expected an object")),
            };
        }

        // Handles never reach the target side
        let value = match value {
            Value::Handle(h) => Value::Object(h.into_raw()),
            other => other,
        };

        match to {
            TypeRef::Variable(_) => Ok(value),
            TypeRef::Array(_) => match value {
                Value::Object(_) => Ok(value),
                other => Err(ConversionError::new(&other, from, to, "expected an array object")),
            },
            TypeRef::Named { .. } if to.is_object() => Ok(value),
            TypeRef::Named { name, .. } => match value {
                Value::Str(_) if to.erased_eq(&TypeRef::string()) => Ok(value),
                Value::Object(ref obj) if class_matches(obj.class().ancestors().map(|c| c.name()), name) => {
                    Ok(value)
                }
                other => Err(ConversionError::new(&other, from, to, "incompatible reference type")),
            },
            TypeRef::Primitive(_) => Err(ConversionError::new(&value, from, to, "not a reference type")),
        }
    }
}

/// Match a class chain against a type name, qualified or simple
fn class_matches<'a>(mut names: impl Iterator<Item = &'a str>, wanted: &str) -> bool {
    names.any(|n| n == wanted || (!wanted.contains('.') && n.rsplit('.').next() == Some(wanted)))
}

fn convert_primitive(value: &Value, target: PrimitiveType) -> Result<Value, &'static str> {
    let source = value.primitive_type().ok_or("not a primitive value")?;

    if target == PrimitiveType::Boolean || source == PrimitiveType::Boolean {
        return match (value, target) {
            (Value::Bool(b), PrimitiveType::Boolean) => Ok(Value::Bool(*b)),
            _ => Err("boolean does not convert to or from numbers"),
        };
    }

    if target.is_integral() {
        let n = match value.as_i64() {
            Some(n) => n,
            None => {
                let f = value.as_f64().ok_or("not numeric")?;
                if f.fract() != 0.0 || f < i64::MIN as f64 || f >= i64::MAX as f64 {
                    return Err("value has no exact integral representation");
                }
                f as i64
            }
        };
        let out_of_range = "value out of range";
        return Ok(match target {
            PrimitiveType::Byte => Value::Byte(i8::try_from(n).map_err(|_| out_of_range)?),
            PrimitiveType::Short => Value::Short(i16::try_from(n).map_err(|_| out_of_range)?),
            PrimitiveType::Char => Value::Char(u16::try_from(n).map_err(|_| out_of_range)?),
            PrimitiveType::Int => Value::Int(i32::try_from(n).map_err(|_| out_of_range)?),
            _ => Value::Long(n),
        });
    }

    let f = value.as_f64().ok_or("not numeric")?;
    match target {
        PrimitiveType::Float => {
            let narrowed = f as f32;
            if source.widens_to(PrimitiveType::Float) || !f.is_finite() || narrowed as f64 == f {
                Ok(Value::Float(narrowed))
            } else {
                Err("value does not fit in float")
            }
        }
        PrimitiveType::Double => Ok(Value::Double(f)),
        _ => Err("unsupported primitive target"),
    }
}

impl Converter for BasicConverter {
    fn convert(&self, value: Value, from: &TypeRef, to: &TypeRef) -> Result<Value, ConversionError> {
        if to.is_void() {
            return Ok(Value::Null);
        }

        match to.as_primitive() {
            Some(target) => {
                if value.is_null() {
                    return Err(ConversionError::new(&value, from, to, "null for a primitive"));
                }
                convert_primitive(&value, target).map_err(|reason| ConversionError::new(&value, from, to, reason))
            }
            None if value.is_null() => Ok(Value::Null),
            None if value.primitive_type().is_some() => {
                // Boxing into the root type or a placeholder keeps the value
                if to.is_object() || matches!(to, TypeRef::Variable(_)) {
                    Ok(value)
                } else {
                    Err(ConversionError::new(&value, from, to, "primitive for a reference type"))
                }
            }
            None => self.convert_reference(value, from, to),
        }
    }

    fn can_convert(&self, from: &TypeRef, to: &TypeRef) -> bool {
        if to.is_void() {
            return true;
        }
        if from.is_void() {
            return false;
        }
        if self.is_handle_type(from) || self.is_handle_type(to) {
            return from.is_reference() && to.is_reference();
        }
        match (from, to) {
            (TypeRef::Primitive(a), TypeRef::Primitive(b)) => {
                a == b || (a.is_numeric() && b.is_numeric())
            }
            (TypeRef::Primitive(_), _) => to.is_object() || matches!(to, TypeRef::Variable(_)),
            (_, TypeRef::Primitive(_)) => false,
            (_, TypeRef::Variable(_)) | (TypeRef::Variable(_), _) => true,
            _ if to.is_object() || from.is_object() => true,
            (TypeRef::Array(a), TypeRef::Array(b)) => self.can_convert(a, b),
            (TypeRef::Named { name: a, .. }, TypeRef::Named { name: b, .. }) => {
                class_matches(std::iter::once(&**a), b) || class_matches(std::iter::once(&**b), a)
            }
            _ => false,
        }
    }
}
