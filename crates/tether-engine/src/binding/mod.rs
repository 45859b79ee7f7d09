//! Bindings
//!
//! A [`Binding`] is the product of resolving one template against one class:
//! an index-aligned list of resolved members plus either generated accessors
//! or the reflective fallback. Members are addressed by declaration index;
//! use [`Binding::member_index`] to look an index up by name.

mod cache;

pub use cache::{BindingCache, BuildMode, CacheKey, CacheStats};

use std::fmt;
use std::sync::{Arc, Weak};

use crate::codegen::{Accessor, GeneratedImplementation};
use crate::error::{AccessError, AccessResult};
use crate::fallback::FallbackInvoker;
use crate::resolver::{AccessorKind, ResolvedMember};
use crate::runtime::{ClassId, Handle, LoaderId, ObjectRef, RuntimeClass, Value};
use crate::template::TemplateDescriptor;

/// How a binding reaches the target's members
pub enum Implementation {
    /// Accessors synthesized at bind time
    Generated(GeneratedImplementation),
    /// Per-call reflective lookup
    Fallback(FallbackInvoker),
}

impl fmt::Debug for Implementation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Implementation::Generated(generated) => write!(f, "Generated({} accessors)", generated.len()),
            Implementation::Fallback(_) => f.write_str("Fallback"),
        }
    }
}

/// A template bound to a concrete class
///
/// Immutable once built. Holds the class weakly; a binding never keeps its
/// target loaded.
pub struct Binding {
    descriptor: Arc<TemplateDescriptor>,
    target: Weak<RuntimeClass>,
    class_id: ClassId,
    loader_id: LoaderId,
    target_name: Arc<str>,
    members: Arc<[ResolvedMember]>,
    labels: Vec<Arc<str>>,
    implementation: Implementation,
}

impl Binding {
    /// Assemble a binding from resolved members and an implementation
    pub fn new(
        descriptor: Arc<TemplateDescriptor>,
        target: &Arc<RuntimeClass>,
        members: Arc<[ResolvedMember]>,
        implementation: Implementation,
    ) -> Self {
        let labels = members.iter().map(|m| Arc::from(m.declared.to_string())).collect();
        Self {
            descriptor,
            target: Arc::downgrade(target),
            class_id: target.id(),
            loader_id: target.loader_id(),
            target_name: Arc::from(target.name()),
            members,
            labels,
            implementation,
        }
    }

    /// Template this binding implements
    pub fn descriptor(&self) -> &Arc<TemplateDescriptor> {
        &self.descriptor
    }

    /// Resolved members, index-aligned with the template
    pub fn members(&self) -> &[ResolvedMember] {
        &self.members
    }

    /// Bound class, if still loaded
    pub fn target(&self) -> Option<Arc<RuntimeClass>> {
        self.target.upgrade()
    }

    /// Name of the bound class
    pub fn target_name(&self) -> &str {
        &self.target_name
    }

    /// Identity of the bound class
    pub fn class_id(&self) -> ClassId {
        self.class_id
    }

    /// Identity of the bound class's loader
    pub fn loader_id(&self) -> LoaderId {
        self.loader_id
    }

    /// Check whether this binding uses generated accessors
    pub fn is_generated(&self) -> bool {
        matches!(self.implementation, Implementation::Generated(_))
    }

    /// Index of the first member with the given declared name
    pub fn member_index(&self, name: &str) -> Option<usize> {
        self.descriptor.member_index(name)
    }

    /// Check whether the member at `member` exists on the target
    pub fn is_available(&self, member: usize) -> bool {
        self.members.get(member).is_some_and(ResolvedMember::is_present)
    }

    /// Check whether `value` is an instance of the bound class (handles are
    /// looked through)
    pub fn is_instance(&self, value: &Value) -> bool {
        value
            .as_raw_object()
            .is_some_and(|obj| obj.class().is_subclass_of_id(self.class_id))
    }

    /// Wrap a raw instance of the bound class in a handle named after the
    /// template
    pub fn create_handle(&self, value: &Value) -> AccessResult<Value> {
        let obj = value
            .as_raw_object()
            .filter(|obj| obj.class().is_subclass_of_id(self.class_id))
            .ok_or_else(|| AccessError::IncompatibleInstance {
                member: self.descriptor.name().to_string(),
                expected: self.target_name.to_string(),
                actual: value.type_name(),
            })?;
        Ok(Value::Handle(Handle::new(self.descriptor.name(), obj.clone())))
    }

    /// Read an instance field
    pub fn get(&self, member: usize, instance: &Value) -> AccessResult<Value> {
        let (resolved, label) = self.entry(member, AccessorKind::Field)?;
        let receiver = self.receiver(instance, label)?;
        match &self.implementation {
            Implementation::Generated(generated) => match generated.accessor(member) {
                Some(Accessor::Field { get, .. }) => get(receiver),
                _ => Err(self.absent(label)),
            },
            Implementation::Fallback(fallback) => fallback.get(resolved, label, receiver),
        }
    }

    /// Write an instance field
    pub fn set(&self, member: usize, instance: &Value, value: Value) -> AccessResult<()> {
        let (resolved, label) = self.entry(member, AccessorKind::Field)?;
        let receiver = self.receiver(instance, label)?;
        match &self.implementation {
            Implementation::Generated(generated) => match generated.accessor(member) {
                Some(Accessor::Field { set, .. }) => set(receiver, value),
                _ => Err(self.absent(label)),
            },
            Implementation::Fallback(fallback) => fallback.set(resolved, label, receiver, value),
        }
    }

    /// Read a static field
    pub fn get_static(&self, member: usize) -> AccessResult<Value> {
        let (resolved, label) = self.entry(member, AccessorKind::StaticField)?;
        self.ensure_loaded()?;
        match &self.implementation {
            Implementation::Generated(generated) => match generated.accessor(member) {
                Some(Accessor::StaticField { get, .. }) => get(),
                _ => Err(self.absent(label)),
            },
            Implementation::Fallback(fallback) => fallback.get_static(resolved, label),
        }
    }

    /// Write a static field
    pub fn set_static(&self, member: usize, value: Value) -> AccessResult<()> {
        let (resolved, label) = self.entry(member, AccessorKind::StaticField)?;
        self.ensure_loaded()?;
        match &self.implementation {
            Implementation::Generated(generated) => match generated.accessor(member) {
                Some(Accessor::StaticField { set, .. }) => set(value),
                _ => Err(self.absent(label)),
            },
            Implementation::Fallback(fallback) => fallback.set_static(resolved, label, value),
        }
    }

    /// Invoke an instance method
    pub fn invoke(&self, member: usize, instance: &Value, args: &[Value]) -> AccessResult<Value> {
        let (resolved, label) = self.entry(member, AccessorKind::Method)?;
        self.check_arity(resolved, label, args)?;
        let receiver = self.receiver(instance, label)?;
        match &self.implementation {
            Implementation::Generated(generated) => match generated.accessor(member) {
                Some(Accessor::Method(invoke)) => invoke(receiver, args),
                _ => Err(self.absent(label)),
            },
            Implementation::Fallback(fallback) => fallback.invoke(resolved, label, receiver, args),
        }
    }

    /// Invoke a static method
    pub fn invoke_static(&self, member: usize, args: &[Value]) -> AccessResult<Value> {
        let (resolved, label) = self.entry(member, AccessorKind::StaticMethod)?;
        self.check_arity(resolved, label, args)?;
        self.ensure_loaded()?;
        match &self.implementation {
            Implementation::Generated(generated) => match generated.accessor(member) {
                Some(Accessor::StaticMethod(invoke)) => invoke(args),
                _ => Err(self.absent(label)),
            },
            Implementation::Fallback(fallback) => fallback.invoke_static(resolved, label, args),
        }
    }

    /// Create a new instance of the bound class
    pub fn construct(&self, member: usize, args: &[Value]) -> AccessResult<Value> {
        let (resolved, label) = self.entry(member, AccessorKind::Constructor)?;
        self.check_arity(resolved, label, args)?;
        self.ensure_loaded()?;
        match &self.implementation {
            Implementation::Generated(generated) => match generated.accessor(member) {
                Some(Accessor::Constructor(construct)) => construct(args),
                _ => Err(self.absent(label)),
            },
            Implementation::Fallback(fallback) => fallback.construct(resolved, label, args),
        }
    }

    /// Look up a member and check it is usable through `requested`
    fn entry(&self, member: usize, requested: AccessorKind) -> AccessResult<(&ResolvedMember, &str)> {
        let resolved = self.members.get(member).ok_or(AccessError::NoSuchMember {
            index: member,
            count: self.members.len(),
        })?;
        let label = &*self.labels[member];

        let actual = resolved.declared_accessor();
        if actual != requested {
            return Err(AccessError::WrongAccessor {
                member: label.to_string(),
                requested,
                actual,
            });
        }
        if !resolved.is_present() {
            return Err(self.absent(label));
        }
        Ok((resolved, label))
    }

    fn check_arity(&self, resolved: &ResolvedMember, label: &str, args: &[Value]) -> AccessResult<()> {
        let expected = resolved.declared.arity();
        if args.len() != expected {
            return Err(AccessError::ArgumentCount {
                member: label.to_string(),
                expected,
                actual: args.len(),
            });
        }
        Ok(())
    }

    fn receiver<'v>(&self, instance: &'v Value, label: &str) -> AccessResult<&'v ObjectRef> {
        instance
            .as_raw_object()
            .filter(|obj| obj.class().is_subclass_of_id(self.class_id))
            .ok_or_else(|| AccessError::IncompatibleInstance {
                member: label.to_string(),
                expected: self.target_name.to_string(),
                actual: instance.type_name(),
            })
    }

    fn ensure_loaded(&self) -> AccessResult<()> {
        if self.target.strong_count() == 0 {
            return Err(AccessError::TargetUnloaded {
                target: self.target_name.to_string(),
            });
        }
        Ok(())
    }

    fn absent(&self, label: &str) -> AccessError {
        AccessError::MemberAbsent {
            member: label.to_string(),
        }
    }
}

impl fmt::Debug for Binding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Binding")
            .field("template", &self.descriptor.name())
            .field("target", &self.target_name)
            .field("members", &self.members.len())
            .field("implementation", &self.implementation)
            .finish()
    }
}
