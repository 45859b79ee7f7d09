//! Template parsing
//!
//! A template declares, in the consumer's vocabulary, the members it needs
//! from a target type:
//!
//! ```text
//! template geo.Point @since(1.8) {
//!     int x;
//!     int getX() @version(2.0) -> getXCoord();
//!     static Point origin();
//!     Point(int x, int y);
//!     optional String label();
//! }
//! ```
//!
//! Parsing is pure: types stay unresolved [`TypeRef`]s until a binding is
//! requested against a concrete class.

mod descriptor;
mod error;
mod lexer;
mod parser;
mod token;

pub use descriptor::{DescriptorId, MemberDeclaration, SpecializationError, TemplateDescriptor, VersionOverride};
pub use error::{SyntaxErrorKind, TemplateSyntaxError};

use crate::signature::TypeRef;

use parser::Parser;

/// Parse template text into a descriptor
pub fn parse_template(text: &str) -> Result<TemplateDescriptor, TemplateSyntaxError> {
    Parser::new(text)?.parse_template()
}

/// Parse a single type in template syntax
pub fn parse_type(text: &str) -> Result<TypeRef, TemplateSyntaxError> {
    Parser::new(text)?.parse_standalone_type()
}
