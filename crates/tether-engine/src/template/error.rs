//! Template syntax errors

use thiserror::Error;

/// What went wrong while parsing a template
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SyntaxErrorKind {
    /// Character that starts no token
    #[error("unexpected character '{0}'")]
    UnexpectedCharacter(char),

    /// Token other than the one the grammar requires
    #[error("expected {expected}, found '{found}'")]
    UnexpectedToken {
        /// What the grammar allows here
        expected: String,
        /// Token actually present
        found: String,
    },

    /// Input ended early
    #[error("unexpected end of input, expected {expected}")]
    UnexpectedEof {
        /// What the grammar allows here
        expected: String,
    },

    /// Type token that is not a primitive, type variable or class name
    #[error("unknown type '{0}'")]
    UnknownType(String),

    /// `void` used as a field or parameter type
    #[error("'void' is only allowed as a return type")]
    VoidNotAllowed,

    /// Two members with an identical signature
    #[error("duplicate member '{0}'")]
    DuplicateMember(String),

    /// Type parameter declared twice
    #[error("duplicate type parameter '{0}'")]
    DuplicateTypeParameter(String),

    /// Two different overrides for the same version
    #[error("conflicting overrides of '{member}' for version {version}")]
    ConflictingOverride {
        /// Member being overridden
        member: String,
        /// Version tag
        version: String,
    },

    /// Override shape does not match the member kind
    #[error("override of '{member}' for version {version} does not match its kind")]
    OverrideShapeMismatch {
        /// Member being overridden
        member: String,
        /// Version tag
        version: String,
    },

    /// Constructor named differently from the template
    #[error("constructor must be named '{expected}', found '{found}'")]
    ConstructorName {
        /// Template simple name
        expected: String,
        /// Name written
        found: String,
    },

    /// Malformed release tag
    #[error("invalid version '{0}'")]
    InvalidVersion(String),

    /// Generic arguments nested deeper than the parser allows
    #[error("type arguments nested deeper than {0} levels")]
    NestingTooDeep(usize),
}

/// Template text could not be parsed
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{kind} at line {line}, column {column}")]
pub struct TemplateSyntaxError {
    /// Error kind
    pub kind: SyntaxErrorKind,
    /// 1-based line
    pub line: u32,
    /// 1-based column
    pub column: u32,
}

impl TemplateSyntaxError {
    /// Create an error at a position
    pub fn new(kind: SyntaxErrorKind, line: u32, column: u32) -> Self {
        Self { kind, line, column }
    }
}
