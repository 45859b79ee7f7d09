//! Type compatibility between declared and target members

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::runtime::ClassLoader;
use crate::signature::TypeRef;

use super::Converter;

/// How well a target type matches a declared type (higher is better)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum MatchQuality {
    /// Only compatible through the conversion boundary
    Convertible,
    /// Compatible through subclassing or the root type
    Subtype,
    /// Same type after erasure
    Exact,
}

/// Direction a value flows through a member
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Position {
    /// Consumer value flows into the target (declared -> actual)
    Parameter,
    /// Target value flows back to the consumer (actual -> declared)
    Return,
}

/// Decides whether a target member's type is acceptable for a declared one
pub trait Assignability: Send + Sync {
    /// Match quality of `actual` for `declared`, or `None` if incompatible
    fn accepts(
        &self,
        declared: &TypeRef,
        actual: &TypeRef,
        position: Position,
        loader: Option<&ClassLoader>,
    ) -> Option<MatchQuality>;
}

/// Built-in assignability rules
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssignabilityMode {
    /// Types must be identical after erasure
    Exact,
    /// Identical, or a subclass / root type in the direction of flow
    Subtype,
    /// Anything the converter can convert
    #[default]
    Convertible,
}

impl fmt::Display for AssignabilityMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AssignabilityMode::Exact => write!(f, "exact"),
            AssignabilityMode::Subtype => write!(f, "subtype"),
            AssignabilityMode::Convertible => write!(f, "convertible"),
        }
    }
}

impl AssignabilityMode {
    fn minimum(self) -> MatchQuality {
        match self {
            AssignabilityMode::Exact => MatchQuality::Exact,
            AssignabilityMode::Subtype => MatchQuality::Subtype,
            AssignabilityMode::Convertible => MatchQuality::Convertible,
        }
    }
}

/// Check whether two type names denote the same type
///
/// An unqualified name matches a qualified one with the same last segment.
pub(crate) fn type_names_match(a: &str, b: &str) -> bool {
    if a == b {
        return true;
    }
    if a.contains('.') && b.contains('.') {
        return false;
    }
    a.rsplit('.').next() == b.rsplit('.').next()
}

fn same_type(a: &TypeRef, b: &TypeRef) -> bool {
    match (a.erase(), b.erase()) {
        (TypeRef::Named { name: x, .. }, TypeRef::Named { name: y, .. }) => type_names_match(&x, &y),
        (TypeRef::Array(x), TypeRef::Array(y)) => same_type(&x, &y),
        (x, y) => x == y,
    }
}

/// [`AssignabilityMode`] evaluated against a converter
pub struct StandardAssignability {
    mode: AssignabilityMode,
    converter: Arc<dyn Converter>,
}

impl StandardAssignability {
    /// Create the rule for a mode
    pub fn new(mode: AssignabilityMode, converter: Arc<dyn Converter>) -> Self {
        Self { mode, converter }
    }

    /// Configured mode
    pub fn mode(&self) -> AssignabilityMode {
        self.mode
    }

    fn quality(&self, source: &TypeRef, dest: &TypeRef, loader: Option<&ClassLoader>) -> Option<MatchQuality> {
        if same_type(source, dest) {
            return Some(MatchQuality::Exact);
        }

        let subtype = match (source, dest) {
            (_, TypeRef::Variable(_)) | (TypeRef::Variable(_), _) => true,
            (s, d) if d.is_object() => s.is_reference(),
            (TypeRef::Named { .. }, TypeRef::Named { name, .. }) => loader
                .and_then(|l| source.resolve(l))
                .is_some_and(|class| class.ancestors().any(|c| type_names_match(c.name(), name))),
            _ => false,
        };
        if subtype {
            return Some(MatchQuality::Subtype);
        }

        if self.converter.can_convert(source, dest) {
            Some(MatchQuality::Convertible)
        } else {
            None
        }
    }
}

impl Assignability for StandardAssignability {
    fn accepts(
        &self,
        declared: &TypeRef,
        actual: &TypeRef,
        position: Position,
        loader: Option<&ClassLoader>,
    ) -> Option<MatchQuality> {
        let quality = match position {
            Position::Parameter => self.quality(declared, actual, loader),
            Position::Return => self.quality(actual, declared, loader),
        }?;
        (quality >= self.mode.minimum()).then_some(quality)
    }
}

impl fmt::Debug for StandardAssignability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StandardAssignability")
            .field("mode", &self.mode)
            .finish()
    }
}
