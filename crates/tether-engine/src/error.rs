//! Binding and access errors

use thiserror::Error;

use crate::remap::RemapError;
use crate::resolver::AccessorKind;
use crate::runtime::{HostError, Value};
use crate::signature::TypeRef;

/// Result type for binding operations
pub type BindResult<T> = Result<T, BindError>;

/// Result type for member access through a binding
pub type AccessResult<T> = Result<T, AccessError>;

/// A value could not cross the conversion boundary
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("Cannot convert {value} from {from} to {to}: {reason}")]
pub struct ConversionError {
    /// Runtime type of the offending value
    pub value: String,
    /// Declared source type
    pub from: String,
    /// Requested target type
    pub to: String,
    /// What went wrong
    pub reason: String,
}

impl ConversionError {
    /// Describe a failed conversion
    pub fn new(value: &Value, from: &TypeRef, to: &TypeRef, reason: impl Into<String>) -> Self {
        Self {
            value: value.type_name(),
            from: from.to_string(),
            to: to.to_string(),
            reason: reason.into(),
        }
    }
}

/// Accessor synthesis failed for one member
///
/// Recovered by substituting the fallback invoker.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum GenerationFailure {
    /// The member has more parameters than the generator handles
    #[error("Unsupported shape for '{member}': arity {arity} exceeds {max}")]
    UnsupportedShape {
        /// Member signature
        member: String,
        /// Parameter count
        arity: usize,
        /// Configured maximum
        max: usize,
    },

    /// The host only allows reflective access to the member
    #[error("Direct access to '{member}' denied")]
    AccessDenied {
        /// Member signature
        member: String,
    },

    /// The resolved member does not fit the class layout
    #[error("Accessor for '{member}' rejected: {reason}")]
    Rejected {
        /// Member signature
        member: String,
        /// Reason for rejection
        reason: String,
    },
}

/// Errors raised while binding a template to a target class
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum BindError {
    /// A required member does not exist on the target
    #[error("{template}: required member '{member}' not found on {target}{}", format_alternatives(.alternatives))]
    MemberNotFound {
        /// Template name
        template: String,
        /// Declared member signature
        member: String,
        /// Target class and version
        target: String,
        /// Most similar existing member names
        alternatives: Vec<String>,
    },

    /// The remap chain for a member could not be walked
    #[error("{template}: cannot remap '{member}': {source}")]
    Remap {
        /// Template name
        template: String,
        /// Declared member signature
        member: String,
        /// Underlying remap failure
        #[source]
        source: RemapError,
    },

    /// The template's target type is not loaded
    #[error("{template}: no class named '{name}' in {loader}")]
    TypeNotFound {
        /// Template name
        template: String,
        /// Name looked up
        name: String,
        /// Loader searched
        loader: String,
    },

    /// Generation failed and fallback is disabled
    #[error("{template}: no binding available for {target}: {source}")]
    BindingUnavailable {
        /// Template name
        template: String,
        /// Target class
        target: String,
        /// Generation failure that could not be recovered
        #[source]
        source: GenerationFailure,
    },

    /// The target class was unloaded
    #[error("Target class '{target}' has been unloaded")]
    TargetUnloaded {
        /// Target class
        target: String,
    },
}

fn format_alternatives(alternatives: &[String]) -> String {
    if alternatives.is_empty() {
        String::new()
    } else {
        format!(" (did you mean: {}?)", alternatives.join(", "))
    }
}

/// Errors raised when using a binding's entry points
#[derive(Debug, Clone, Error, PartialEq)]
pub enum AccessError {
    /// The optional member resolved to absent
    #[error("Member '{member}' is not available on this target")]
    MemberAbsent {
        /// Declared member signature
        member: String,
    },

    /// The host member failed
    #[error("Invocation of '{member}' failed: {source}")]
    Invocation {
        /// Declared member signature
        member: String,
        /// Failure raised by the host body
        #[source]
        source: HostError,
    },

    /// An argument or result could not be converted
    #[error("Conversion failed for '{member}': {source}")]
    Conversion {
        /// Declared member signature
        member: String,
        /// Conversion failure
        #[source]
        source: ConversionError,
    },

    /// The entry point does not match the member's accessor kind
    #[error("'{member}' is a {actual} accessor, not {requested}")]
    WrongAccessor {
        /// Declared member signature
        member: String,
        /// Entry point used
        requested: AccessorKind,
        /// Accessor kind of the member
        actual: AccessorKind,
    },

    /// Wrong number of arguments
    #[error("'{member}' expects {expected} arguments, got {actual}")]
    ArgumentCount {
        /// Declared member signature
        member: String,
        /// Declared parameter count
        expected: usize,
        /// Supplied argument count
        actual: usize,
    },

    /// Member index out of range
    #[error("No member at index {index} (template has {count})")]
    NoSuchMember {
        /// Requested index
        index: usize,
        /// Number of declared members
        count: usize,
    },

    /// The receiver is not an instance of the bound class
    #[error("'{member}' expects an instance of {expected}, got {actual}")]
    IncompatibleInstance {
        /// Declared member signature
        member: String,
        /// Bound class
        expected: String,
        /// Runtime type of the receiver
        actual: String,
    },

    /// The bound class was unloaded
    #[error("Target class '{target}' has been unloaded")]
    TargetUnloaded {
        /// Bound class
        target: String,
    },
}

impl AccessError {
    /// Original host failure, if this error wraps one
    pub fn host_error(&self) -> Option<&HostError> {
        match self {
            AccessError::Invocation { source, .. } => Some(source),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn test_member_not_found_lists_alternatives() {
        let err = BindError::MemberNotFound {
            template: "Point".to_string(),
            member: "int getX()".to_string(),
            target: "geo.Point 2.0".to_string(),
            alternatives: vec!["getXCoord".to_string()],
        };
        let text = err.to_string();
        assert!(text.contains("int getX()"));
        assert!(text.contains("did you mean: getXCoord?"));
    }

    #[test]
    fn test_invocation_preserves_source() {
        let err = AccessError::Invocation {
            member: "void fail()".to_string(),
            source: HostError::runtime("boom"),
        };
        assert_eq!(err.host_error().map(|e| e.message()), Some("boom"));
        assert_eq!(err.source().map(|s| s.to_string()), Some("RuntimeError: boom".to_string()));
    }
}
