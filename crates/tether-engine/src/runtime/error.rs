//! Host runtime errors

use std::sync::Arc;

use thiserror::Error;

/// A failure raised by a host method or constructor body
///
/// This is the host runtime's notion of a thrown exception. Accessors wrap
/// it unchanged so callers can inspect the original cause.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{kind}: {message}")]
pub struct HostError {
    kind: Arc<str>,
    message: String,
}

impl HostError {
    /// Create an error of the given kind
    pub fn new(kind: &str, message: impl Into<String>) -> Self {
        Self {
            kind: Arc::from(kind),
            message: message.into(),
        }
    }

    /// Generic runtime failure
    pub fn runtime(message: impl Into<String>) -> Self {
        Self::new("RuntimeError", message)
    }

    /// Illegal argument passed to a host body
    pub fn illegal_argument(message: impl Into<String>) -> Self {
        Self::new("IllegalArgument", message)
    }

    /// Error kind (exception class name)
    pub fn kind(&self) -> &str {
        &self.kind
    }

    /// Error message
    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Errors raised while defining classes
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum LoaderError {
    /// A class with this name is already defined by the loader
    #[error("Class '{0}' is already defined")]
    DuplicateClass(String),

    /// Two members with the same signature in one class
    #[error("Duplicate member '{member}' in class '{class}'")]
    DuplicateMember {
        /// Class being defined
        class: String,
        /// Offending member
        member: String,
    },
}
