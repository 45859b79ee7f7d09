//! Type references
//!
//! A [`TypeRef`] names a type without requiring it to be loaded. Named
//! references are resolved lazily against a [`ClassLoader`] only when a
//! caller asks for the class.

use std::fmt;
use std::sync::Arc;

use rustc_hash::FxHashMap;

use crate::runtime::{ClassLoader, RuntimeClass};

/// Name of the root reference type every class and handle is assignable to
pub const OBJECT_TYPE: &str = "Object";

/// Name of the builtin string type
pub const STRING_TYPE: &str = "String";

/// Primitive value types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrimitiveType {
    /// No value (return type only)
    Void,
    /// true / false
    Boolean,
    /// 8-bit signed integer
    Byte,
    /// 16-bit signed integer
    Short,
    /// UTF-16 code unit
    Char,
    /// 32-bit signed integer
    Int,
    /// 64-bit signed integer
    Long,
    /// 32-bit float
    Float,
    /// 64-bit float
    Double,
}

impl PrimitiveType {
    /// Look up a primitive by its keyword
    pub fn from_keyword(keyword: &str) -> Option<Self> {
        Some(match keyword {
            "void" => PrimitiveType::Void,
            "boolean" => PrimitiveType::Boolean,
            "byte" => PrimitiveType::Byte,
            "short" => PrimitiveType::Short,
            "char" => PrimitiveType::Char,
            "int" => PrimitiveType::Int,
            "long" => PrimitiveType::Long,
            "float" => PrimitiveType::Float,
            "double" => PrimitiveType::Double,
            _ => return None,
        })
    }

    /// Keyword used in template text
    pub fn keyword(self) -> &'static str {
        match self {
            PrimitiveType::Void => "void",
            PrimitiveType::Boolean => "boolean",
            PrimitiveType::Byte => "byte",
            PrimitiveType::Short => "short",
            PrimitiveType::Char => "char",
            PrimitiveType::Int => "int",
            PrimitiveType::Long => "long",
            PrimitiveType::Float => "float",
            PrimitiveType::Double => "double",
        }
    }

    /// Integral or floating point type
    pub fn is_numeric(self) -> bool {
        !matches!(
            self,
            PrimitiveType::Void | PrimitiveType::Boolean
        )
    }

    /// Integral types (char included)
    pub fn is_integral(self) -> bool {
        matches!(
            self,
            PrimitiveType::Byte
                | PrimitiveType::Short
                | PrimitiveType::Char
                | PrimitiveType::Int
                | PrimitiveType::Long
        )
    }

    /// Check whether a value of `self` widens to `other` without loss
    pub fn widens_to(self, other: PrimitiveType) -> bool {
        use PrimitiveType::*;
        if self == other {
            return true;
        }
        match self {
            Byte => matches!(other, Short | Int | Long | Float | Double),
            Short | Char => matches!(other, Int | Long | Float | Double),
            Int => matches!(other, Long | Float | Double),
            Long => matches!(other, Float | Double),
            Float => matches!(other, Double),
            _ => false,
        }
    }
}

/// A reference to a type, resolvable on demand
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TypeRef {
    /// Primitive type
    Primitive(PrimitiveType),
    /// Class or handle type by (possibly qualified) name, with type arguments
    Named {
        /// Type name as written
        name: Arc<str>,
        /// Generic arguments (empty for raw types)
        args: Vec<TypeRef>,
    },
    /// Array of the element type
    Array(Box<TypeRef>),
    /// Generic placeholder, substituted later
    Variable(Arc<str>),
}

impl TypeRef {
    /// Create a primitive type reference
    pub fn primitive(p: PrimitiveType) -> Self {
        TypeRef::Primitive(p)
    }

    /// Create a raw named type reference
    pub fn named(name: &str) -> Self {
        TypeRef::Named {
            name: Arc::from(name),
            args: Vec::new(),
        }
    }

    /// Create a parameterized type reference
    pub fn generic(name: &str, args: Vec<TypeRef>) -> Self {
        TypeRef::Named {
            name: Arc::from(name),
            args,
        }
    }

    /// Create an array type reference
    pub fn array(element: TypeRef) -> Self {
        TypeRef::Array(Box::new(element))
    }

    /// Create a generic placeholder
    pub fn variable(name: &str) -> Self {
        TypeRef::Variable(Arc::from(name))
    }

    /// The root reference type
    pub fn object() -> Self {
        Self::named(OBJECT_TYPE)
    }

    /// The builtin string type
    pub fn string() -> Self {
        Self::named(STRING_TYPE)
    }

    /// `void`
    pub fn void() -> Self {
        TypeRef::Primitive(PrimitiveType::Void)
    }

    /// Get the primitive type, if this is one
    pub fn as_primitive(&self) -> Option<PrimitiveType> {
        match self {
            TypeRef::Primitive(p) => Some(*p),
            _ => None,
        }
    }

    /// Check if this is `void`
    pub fn is_void(&self) -> bool {
        matches!(self, TypeRef::Primitive(PrimitiveType::Void))
    }

    /// Check if values of this type are references (nullable)
    pub fn is_reference(&self) -> bool {
        !matches!(self, TypeRef::Primitive(_))
    }

    /// Check if this is the root reference type
    pub fn is_object(&self) -> bool {
        matches!(self, TypeRef::Named { name, .. } if &**name == OBJECT_TYPE)
    }

    /// Name of a named type (None for primitives, arrays and placeholders)
    pub fn name(&self) -> Option<&str> {
        match self {
            TypeRef::Named { name, .. } => Some(name),
            _ => None,
        }
    }

    /// Last segment of a qualified name
    pub fn simple_name(&self) -> Option<&str> {
        self.name().map(|n| n.rsplit('.').next().unwrap_or(n))
    }

    /// Drop type arguments and replace placeholders with `Object`
    pub fn erase(&self) -> TypeRef {
        match self {
            TypeRef::Primitive(p) => TypeRef::Primitive(*p),
            TypeRef::Named { name, .. } => TypeRef::Named {
                name: name.clone(),
                args: Vec::new(),
            },
            TypeRef::Array(element) => TypeRef::Array(Box::new(element.erase())),
            TypeRef::Variable(_) => TypeRef::object(),
        }
    }

    /// Compare after erasure
    pub fn erased_eq(&self, other: &TypeRef) -> bool {
        self.erase() == other.erase()
    }

    /// Check whether any generic placeholder remains
    pub fn has_variables(&self) -> bool {
        match self {
            TypeRef::Primitive(_) => false,
            TypeRef::Named { args, .. } => args.iter().any(TypeRef::has_variables),
            TypeRef::Array(element) => element.has_variables(),
            TypeRef::Variable(_) => true,
        }
    }

    /// Replace placeholders by the given bindings (unbound ones are kept)
    pub fn substitute(&self, bindings: &FxHashMap<Arc<str>, TypeRef>) -> TypeRef {
        match self {
            TypeRef::Primitive(_) => self.clone(),
            TypeRef::Named { name, args } => TypeRef::Named {
                name: name.clone(),
                args: args.iter().map(|a| a.substitute(bindings)).collect(),
            },
            TypeRef::Array(element) => TypeRef::Array(Box::new(element.substitute(bindings))),
            TypeRef::Variable(name) => bindings.get(name).cloned().unwrap_or_else(|| self.clone()),
        }
    }

    /// Resolve a named reference to a loaded class
    ///
    /// Primitives, arrays and placeholders never resolve to a class.
    pub fn resolve(&self, loader: &ClassLoader) -> Option<Arc<RuntimeClass>> {
        match self {
            TypeRef::Named { name, .. } => loader.find_class(name),
            _ => None,
        }
    }
}

impl From<PrimitiveType> for TypeRef {
    fn from(p: PrimitiveType) -> Self {
        TypeRef::Primitive(p)
    }
}

impl fmt::Display for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeRef::Primitive(p) => write!(f, "{}", p.keyword()),
            TypeRef::Named { name, args } => {
                write!(f, "{}", name)?;
                if !args.is_empty() {
                    write!(f, "<")?;
                    for (i, arg) in args.iter().enumerate() {
                        if i > 0 {
                            write!(f, ", ")?;
                        }
                        write!(f, "{}", arg)?;
                    }
                    write!(f, ">")?;
                }
                Ok(())
            }
            TypeRef::Array(element) => write!(f, "{}[]", element),
            TypeRef::Variable(name) => write!(f, "{}", name),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_erase_generic() {
        let list = TypeRef::generic("java.util.List", vec![TypeRef::variable("T")]);
        assert_eq!(list.erase(), TypeRef::named("java.util.List"));
        assert!(list.has_variables());
        assert_eq!(TypeRef::variable("T").erase(), TypeRef::object());
    }

    #[test]
    fn test_substitute() {
        let mut bindings = FxHashMap::default();
        bindings.insert(Arc::from("T"), TypeRef::string());
        let list = TypeRef::generic("List", vec![TypeRef::variable("T")]);
        let bound = list.substitute(&bindings);
        assert_eq!(bound, TypeRef::generic("List", vec![TypeRef::string()]));
        assert!(!bound.has_variables());
    }

    #[test]
    fn test_display() {
        let t = TypeRef::array(TypeRef::generic(
            "Map",
            vec![TypeRef::string(), TypeRef::primitive(PrimitiveType::Int)],
        ));
        assert_eq!(t.to_string(), "Map<String, int>[]");
    }

    #[test]
    fn test_simple_name() {
        assert_eq!(TypeRef::named("net.server.Point").simple_name(), Some("Point"));
        assert_eq!(TypeRef::named("Point").simple_name(), Some("Point"));
        assert_eq!(TypeRef::void().simple_name(), None);
    }

    #[test]
    fn test_primitive_widening() {
        assert!(PrimitiveType::Int.widens_to(PrimitiveType::Long));
        assert!(PrimitiveType::Int.widens_to(PrimitiveType::Double));
        assert!(!PrimitiveType::Long.widens_to(PrimitiveType::Int));
        assert!(!PrimitiveType::Boolean.widens_to(PrimitiveType::Int));
    }
}
