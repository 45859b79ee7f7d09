//! Parsed templates

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use rustc_hash::FxHashMap;
use thiserror::Error;

use crate::signature::{MemberKind, MemberSignature, Modifiers, TypeRef};
use crate::version::VersionTag;

/// Unique template identity
///
/// Every parse or specialization produces a fresh identity; two descriptors
/// can be structurally equal but never share an ID.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DescriptorId(u64);

static NEXT_DESCRIPTOR_ID: AtomicU64 = AtomicU64::new(1);

impl DescriptorId {
    fn next() -> Self {
        DescriptorId(NEXT_DESCRIPTOR_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// Get the numeric ID value
    pub fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Display for DescriptorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "template#{}", self.0)
    }
}

/// A member's shape from a given release onward
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionOverride {
    /// First release the override applies to
    pub version: VersionTag,
    /// Signature from that release on
    pub signature: MemberSignature,
}

impl VersionOverride {
    /// Member name from that release on
    pub fn name(&self) -> &str {
        &self.signature.name
    }
}

/// One declared member
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemberDeclaration {
    /// Base signature (valid from the template's `@since` release)
    pub signature: MemberSignature,
    /// Declared modifiers
    pub modifiers: Modifiers,
    /// Per-release overrides, sorted by version
    pub overrides: Vec<VersionOverride>,
}

impl MemberDeclaration {
    /// Member kind
    pub fn kind(&self) -> MemberKind {
        self.signature.kind
    }

    /// Base member name
    pub fn name(&self) -> &str {
        &self.signature.name
    }

    /// Static member
    pub fn is_static(&self) -> bool {
        self.signature.is_static
    }

    /// May resolve to absent
    pub fn is_optional(&self) -> bool {
        self.signature.is_optional
    }

    /// Signature in effect at `at`, with the release it was declared for
    ///
    /// The override with the greatest version not after `at` wins; without
    /// one the base signature applies, declared at `since`.
    pub fn effective<'a>(
        &'a self,
        at: &VersionTag,
        since: &'a VersionTag,
    ) -> (&'a MemberSignature, &'a VersionTag) {
        match self.overrides.iter().rev().find(|o| &o.version <= at) {
            Some(o) => (&o.signature, &o.version),
            None => (&self.signature, since),
        }
    }

    fn substitute(&self, bindings: &FxHashMap<Arc<str>, TypeRef>) -> Self {
        let subst = |sig: &MemberSignature| MemberSignature {
            parameter_types: sig.parameter_types.iter().map(|t| t.substitute(bindings)).collect(),
            return_type: sig.return_type.substitute(bindings),
            ..sig.clone()
        };
        Self {
            signature: subst(&self.signature),
            modifiers: self.modifiers,
            overrides: self
                .overrides
                .iter()
                .map(|o| VersionOverride {
                    version: o.version.clone(),
                    signature: subst(&o.signature),
                })
                .collect(),
        }
    }
}

impl fmt::Display for MemberDeclaration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.signature)
    }
}

/// Wrong number of type arguments for a generic template
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{template} takes {expected} type arguments, got {actual}")]
pub struct SpecializationError {
    /// Template name
    pub template: String,
    /// Declared type parameter count
    pub expected: usize,
    /// Supplied argument count
    pub actual: usize,
}

/// A parsed template
///
/// Immutable after creation and shared as `Arc<TemplateDescriptor>`.
#[derive(Debug, Clone)]
pub struct TemplateDescriptor {
    id: DescriptorId,
    name: Arc<str>,
    type_params: Vec<Arc<str>>,
    since: VersionTag,
    members: Vec<MemberDeclaration>,
}

impl TemplateDescriptor {
    /// Create a descriptor with a fresh identity
    pub fn new(name: &str, type_params: Vec<Arc<str>>, since: VersionTag, members: Vec<MemberDeclaration>) -> Self {
        Self {
            id: DescriptorId::next(),
            name: Arc::from(name),
            type_params,
            since,
            members,
        }
    }

    /// Identity
    pub fn id(&self) -> DescriptorId {
        self.id
    }

    /// Logical owner type name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Last segment of the owner name
    pub fn simple_name(&self) -> &str {
        self.name.rsplit('.').next().unwrap_or(&self.name)
    }

    /// Declared type parameters
    pub fn type_params(&self) -> &[Arc<str>] {
        &self.type_params
    }

    /// Release the base declarations describe
    pub fn since(&self) -> &VersionTag {
        &self.since
    }

    /// Members in declaration order
    pub fn members(&self) -> &[MemberDeclaration] {
        &self.members
    }

    /// Member at an index
    pub fn member(&self, index: usize) -> Option<&MemberDeclaration> {
        self.members.get(index)
    }

    /// Number of members
    pub fn len(&self) -> usize {
        self.members.len()
    }

    /// Check if the template declares no members
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Index of the first member with the given base name
    pub fn member_index(&self, name: &str) -> Option<usize> {
        self.members.iter().position(|m| m.name() == name)
    }

    /// Bind the type parameters, producing a new descriptor
    pub fn specialize(&self, args: &[TypeRef]) -> Result<TemplateDescriptor, SpecializationError> {
        if args.len() != self.type_params.len() {
            return Err(SpecializationError {
                template: self.name.to_string(),
                expected: self.type_params.len(),
                actual: args.len(),
            });
        }
        let bindings: FxHashMap<Arc<str>, TypeRef> = self
            .type_params
            .iter()
            .cloned()
            .zip(args.iter().cloned())
            .collect();
        Ok(TemplateDescriptor::new(
            &self.name,
            Vec::new(),
            self.since.clone(),
            self.members.iter().map(|m| m.substitute(&bindings)).collect(),
        ))
    }
}

impl PartialEq for TemplateDescriptor {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
            && self.type_params == other.type_params
            && self.since == other.since
            && self.members == other.members
    }
}

impl Eq for TemplateDescriptor {}
