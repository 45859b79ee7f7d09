//! Member signatures

use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use super::types::TypeRef;

/// Name given to constructor members
pub const CONSTRUCTOR_NAME: &str = "<init>";

/// Kind of class member
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MemberKind {
    /// Instance or static field
    Field,
    /// Instance or static method
    Method,
    /// Constructor
    Constructor,
}

impl fmt::Display for MemberKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MemberKind::Field => write!(f, "field"),
            MemberKind::Method => write!(f, "method"),
            MemberKind::Constructor => write!(f, "constructor"),
        }
    }
}

/// Modifier flags for declared members
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Modifiers {
    /// Public visibility
    pub is_public: bool,
    /// Private visibility
    pub is_private: bool,
    /// Protected visibility
    pub is_protected: bool,
    /// Static member
    pub is_static: bool,
    /// Final member
    pub is_final: bool,
    /// May be missing on the target type
    pub is_optional: bool,
    /// Abstract member
    pub is_abstract: bool,
    /// Native member
    pub is_native: bool,
    /// Synchronized method
    pub is_synchronized: bool,
    /// Transient field
    pub is_transient: bool,
    /// Volatile field
    pub is_volatile: bool,
}

impl Modifiers {
    /// Apply a modifier keyword. Returns false if the keyword is not a modifier.
    pub fn apply(&mut self, keyword: &str) -> bool {
        let flag = match keyword {
            "public" => &mut self.is_public,
            "private" => &mut self.is_private,
            "protected" => &mut self.is_protected,
            "static" => &mut self.is_static,
            "final" => &mut self.is_final,
            "optional" => &mut self.is_optional,
            "abstract" => &mut self.is_abstract,
            "native" => &mut self.is_native,
            "synchronized" => &mut self.is_synchronized,
            "transient" => &mut self.is_transient,
            "volatile" => &mut self.is_volatile,
            _ => return false,
        };
        *flag = true;
        true
    }

    /// Check if a word is a modifier keyword
    pub fn is_modifier(keyword: &str) -> bool {
        Modifiers::default().apply(keyword)
    }
}

/// The shape of a member: kind, name and types
///
/// Equality and hashing are structural over kind, name, and the erased
/// parameter and return types. Staticness and optionality are carried along
/// but do not participate, so a remap keyed on a signature matches regardless
/// of how the member was flagged.
#[derive(Debug, Clone)]
pub struct MemberSignature {
    /// Member kind
    pub kind: MemberKind,
    /// Member name (constructors use `<init>`)
    pub name: Arc<str>,
    /// Parameter types in order (empty for fields)
    pub parameter_types: Vec<TypeRef>,
    /// Return type (field type for fields, owner type for constructors)
    pub return_type: TypeRef,
    /// Static member
    pub is_static: bool,
    /// May resolve to absent
    pub is_optional: bool,
}

impl MemberSignature {
    /// Signature of a field
    pub fn field(name: &str, field_type: TypeRef) -> Self {
        Self {
            kind: MemberKind::Field,
            name: Arc::from(name),
            parameter_types: Vec::new(),
            return_type: field_type,
            is_static: false,
            is_optional: false,
        }
    }

    /// Signature of a method
    pub fn method(name: &str, parameter_types: Vec<TypeRef>, return_type: TypeRef) -> Self {
        Self {
            kind: MemberKind::Method,
            name: Arc::from(name),
            parameter_types,
            return_type,
            is_static: false,
            is_optional: false,
        }
    }

    /// Signature of a constructor of `owner`
    pub fn constructor(owner: TypeRef, parameter_types: Vec<TypeRef>) -> Self {
        Self {
            kind: MemberKind::Constructor,
            name: Arc::from(CONSTRUCTOR_NAME),
            parameter_types,
            return_type: owner,
            is_static: false,
            is_optional: false,
        }
    }

    /// Builder: set staticness
    pub fn with_static(mut self, is_static: bool) -> Self {
        self.is_static = is_static;
        self
    }

    /// Builder: set optionality
    pub fn with_optional(mut self, is_optional: bool) -> Self {
        self.is_optional = is_optional;
        self
    }

    /// Copy of this signature under another name
    pub fn renamed(&self, name: &str) -> Self {
        let mut renamed = self.clone();
        renamed.name = Arc::from(name);
        renamed
    }

    /// Number of parameters
    pub fn arity(&self) -> usize {
        self.parameter_types.len()
    }

    /// Signature with all types erased
    pub fn erase(&self) -> Self {
        Self {
            kind: self.kind,
            name: self.name.clone(),
            parameter_types: self.parameter_types.iter().map(TypeRef::erase).collect(),
            return_type: self.return_type.erase(),
            is_static: self.is_static,
            is_optional: self.is_optional,
        }
    }
}

impl PartialEq for MemberSignature {
    fn eq(&self, other: &Self) -> bool {
        self.kind == other.kind
            && self.name == other.name
            && self.parameter_types.len() == other.parameter_types.len()
            && self
                .parameter_types
                .iter()
                .zip(&other.parameter_types)
                .all(|(a, b)| a.erased_eq(b))
            && self.return_type.erased_eq(&other.return_type)
    }
}

impl Eq for MemberSignature {}

impl Hash for MemberSignature {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.kind.hash(state);
        self.name.hash(state);
        for param in &self.parameter_types {
            param.erase().hash(state);
        }
        self.return_type.erase().hash(state);
    }
}

impl fmt::Display for MemberSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_static {
            write!(f, "static ")?;
        }
        match self.kind {
            MemberKind::Field => write!(f, "{} {}", self.return_type, self.name),
            MemberKind::Method | MemberKind::Constructor => {
                if self.kind == MemberKind::Method {
                    write!(f, "{} ", self.return_type)?;
                }
                write!(f, "{}(", self.name)?;
                for (i, param) in self.parameter_types.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", param)?;
                }
                write!(f, ")")
            }
        }
    }
}
