//! Member resolution
//!
//! Maps every declared member of a template onto a concrete member of a
//! loaded class: pick the declaration in effect for the class's release,
//! walk the remap chain to that release, then probe the class.

mod similarity;

use std::fmt;
use std::sync::Arc;

use crate::convert::{Assignability, MatchQuality, Position};
use crate::error::{BindError, BindResult};
use crate::remap::RemapTable;
use crate::runtime::{ClassLoader, ConstructorDef, FieldDef, MethodDef, RuntimeClass};
use crate::signature::{MemberKind, MemberSignature, TypeRef};
use crate::template::TemplateDescriptor;

const MAX_ALTERNATIVES: usize = 3;

/// Entry point shape of a resolved member
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AccessorKind {
    /// Instance field get/set
    Field,
    /// Static field get/set
    StaticField,
    /// Instance method invocation
    Method,
    /// Static method invocation
    StaticMethod,
    /// Constructor invocation
    Constructor,
}

impl AccessorKind {
    /// Accessor kind for a member kind and staticness
    pub fn for_member(kind: MemberKind, is_static: bool) -> Self {
        match (kind, is_static) {
            (MemberKind::Field, false) => AccessorKind::Field,
            (MemberKind::Field, true) => AccessorKind::StaticField,
            (MemberKind::Method, false) => AccessorKind::Method,
            (MemberKind::Method, true) => AccessorKind::StaticMethod,
            (MemberKind::Constructor, _) => AccessorKind::Constructor,
        }
    }
}

impl fmt::Display for AccessorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AccessorKind::Field => write!(f, "field"),
            AccessorKind::StaticField => write!(f, "static field"),
            AccessorKind::Method => write!(f, "method"),
            AccessorKind::StaticMethod => write!(f, "static method"),
            AccessorKind::Constructor => write!(f, "constructor"),
        }
    }
}

/// The host member a declaration resolved to
#[derive(Debug, Clone)]
pub enum MemberHandle {
    /// Field definition (slot layout)
    Field(Arc<FieldDef>),
    /// Method definition (vtable slot and body)
    Method(Arc<MethodDef>),
    /// Constructor definition
    Constructor(Arc<ConstructorDef>),
}

/// Outcome of resolving one member
#[derive(Debug, Clone)]
pub enum Resolution {
    /// Optional member missing on the target
    Absent,
    /// Member found
    Present {
        /// Signature as it exists on the target
        signature: MemberSignature,
        /// Entry point shape
        accessor: AccessorKind,
        /// Class declaring the member
        declaring_class: Arc<str>,
        /// Host member definition
        handle: MemberHandle,
    },
}

/// One declared member resolved against a class
#[derive(Debug, Clone)]
pub struct ResolvedMember {
    /// Declaration index in the template
    pub index: usize,
    /// Consumer-facing signature (the declaration in effect for the target)
    pub declared: MemberSignature,
    /// What it resolved to
    pub resolution: Resolution,
}

impl ResolvedMember {
    /// Check if the member exists on the target
    pub fn is_present(&self) -> bool {
        matches!(self.resolution, Resolution::Present { .. })
    }

    /// Accessor kind of a present member
    pub fn accessor(&self) -> Option<AccessorKind> {
        match &self.resolution {
            Resolution::Present { accessor, .. } => Some(*accessor),
            Resolution::Absent => None,
        }
    }

    /// Target-side signature of a present member
    pub fn actual_signature(&self) -> Option<&MemberSignature> {
        match &self.resolution {
            Resolution::Present { signature, .. } => Some(signature),
            Resolution::Absent => None,
        }
    }

    /// Accessor kind the declaration asks for
    pub fn declared_accessor(&self) -> AccessorKind {
        AccessorKind::for_member(self.declared.kind, self.declared.is_static)
    }
}

struct Candidate {
    quality: MatchQuality,
    signature: MemberSignature,
    declaring_class: Arc<str>,
    handle: MemberHandle,
}

/// Resolves templates against loaded classes
pub struct Resolver {
    remaps: Arc<RemapTable>,
    assignability: Arc<dyn Assignability>,
}

impl Resolver {
    /// Create a resolver
    pub fn new(remaps: Arc<RemapTable>, assignability: Arc<dyn Assignability>) -> Self {
        Self { remaps, assignability }
    }

    /// Resolve every member of `descriptor` against `target`, in declaration
    /// order. Fails on the first required member that cannot be found.
    pub fn resolve(&self, descriptor: &TemplateDescriptor, target: &RuntimeClass) -> BindResult<Vec<ResolvedMember>> {
        (0..descriptor.len())
            .map(|index| self.resolve_member(descriptor, index, target))
            .collect()
    }

    fn resolve_member(
        &self,
        descriptor: &TemplateDescriptor,
        index: usize,
        target: &RuntimeClass,
    ) -> BindResult<ResolvedMember> {
        let member = &descriptor.members()[index];
        let target_version = target.version();
        let (effective, declared_at) = member.effective(target_version, descriptor.since());

        let mut declared = effective.clone();
        declared.is_static = member.is_static();
        declared.is_optional = member.is_optional();

        let expected = self
            .remaps
            .lookup(descriptor.name(), &declared, declared_at, target_version)
            .map_err(|source| BindError::Remap {
                template: descriptor.name().to_string(),
                member: declared.to_string(),
                source,
            })?
            .map(|remapped| remapped.signature)
            .unwrap_or_else(|| declared.clone());

        let loader = target.loader();
        let candidate = if expected.arity() != declared.arity() {
            None
        } else {
            self.probe(&expected, target, loader.as_deref())
        };

        let resolution = match candidate {
            Some(found) => {
                tracing::trace!(
                    template = descriptor.name(),
                    member = %declared,
                    resolved = %found.signature,
                    class = &*found.declaring_class,
                    "member resolved"
                );
                Resolution::Present {
                    accessor: AccessorKind::for_member(declared.kind, declared.is_static),
                    signature: found.signature,
                    declaring_class: found.declaring_class,
                    handle: found.handle,
                }
            }
            None if declared.is_optional => Resolution::Absent,
            None => {
                let names = target.member_names(expected.kind);
                return Err(BindError::MemberNotFound {
                    template: descriptor.name().to_string(),
                    member: declared.to_string(),
                    target: format!("{} {}", target.name(), target_version),
                    alternatives: similarity::suggest(&expected.name, &names, MAX_ALTERNATIVES),
                });
            }
        };

        Ok(ResolvedMember {
            index,
            declared,
            resolution,
        })
    }

    fn probe(&self, expected: &MemberSignature, target: &RuntimeClass, loader: Option<&ClassLoader>) -> Option<Candidate> {
        let mut best: Option<Candidate> = None;
        let mut consider = |candidate: Candidate| {
            // Strictly better only: ties keep the earlier declaration
            if best.as_ref().map_or(true, |b| candidate.quality > b.quality) {
                best = Some(candidate);
            }
        };

        match expected.kind {
            MemberKind::Constructor => {
                for ctor in target.constructors() {
                    if let Some(quality) = self.params_quality(&expected.parameter_types, &ctor.parameter_types, loader) {
                        consider(Candidate {
                            quality,
                            signature: ctor.signature(),
                            declaring_class: ctor.declaring_class.clone(),
                            handle: MemberHandle::Constructor(ctor.clone()),
                        });
                    }
                }
            }
            MemberKind::Field => {
                for class in target.ancestors() {
                    for field in class.declared_fields() {
                        if *field.name != *expected.name || field.is_static != expected.is_static {
                            continue;
                        }
                        // Fields are read and written: both directions must hold
                        let declared = &expected.return_type;
                        let read = self.assignability.accepts(declared, &field.field_type, Position::Return, loader);
                        let write = self.assignability.accepts(declared, &field.field_type, Position::Parameter, loader);
                        if let (Some(read), Some(write)) = (read, write) {
                            consider(Candidate {
                                quality: read.min(write),
                                signature: field.signature(),
                                declaring_class: field.declaring_class.clone(),
                                handle: MemberHandle::Field(field.clone()),
                            });
                        }
                    }
                }
            }
            MemberKind::Method => {
                for class in target.ancestors() {
                    for method in class.declared_methods() {
                        if *method.name != *expected.name || method.is_static != expected.is_static {
                            continue;
                        }
                        let Some(params) =
                            self.params_quality(&expected.parameter_types, &method.parameter_types, loader)
                        else {
                            continue;
                        };
                        let Some(ret) = self.assignability.accepts(
                            &expected.return_type,
                            &method.return_type,
                            Position::Return,
                            loader,
                        ) else {
                            continue;
                        };
                        consider(Candidate {
                            quality: params.min(ret),
                            signature: method.signature(),
                            declaring_class: method.declaring_class.clone(),
                            handle: MemberHandle::Method(method.clone()),
                        });
                    }
                }
            }
        }
        best
    }

    fn params_quality(&self, declared: &[TypeRef], actual: &[TypeRef], loader: Option<&ClassLoader>) -> Option<MatchQuality> {
        if declared.len() != actual.len() {
            return None;
        }
        declared
            .iter()
            .zip(actual)
            .try_fold(MatchQuality::Exact, |worst, (d, a)| {
                self.assignability
                    .accepts(d, a, Position::Parameter, loader)
                    .map(|q| worst.min(q))
            })
    }
}

impl fmt::Debug for Resolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Resolver")
            .field("remaps", &self.remaps.len())
            .finish()
    }
}
