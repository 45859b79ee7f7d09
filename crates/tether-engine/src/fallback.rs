//! Reflective fallback invoker
//!
//! Same entry points as a generated implementation, but every call looks
//! the member up by name and resolved signature on the live class: the
//! receiver's class for virtual calls, the class that declared the resolved
//! field for field access, the bound class for statics and constructors. Conversions and errors are identical to the generated
//! path; only latency differs.

use std::fmt;
use std::sync::{Arc, Weak};

use crate::codegen::marshal::{args_to_target, host, to_consumer, to_target};
use crate::convert::Converter;
use crate::error::{AccessError, AccessResult};
use crate::resolver::{Resolution, ResolvedMember};
use crate::runtime::{FieldDef, ObjectRef, RuntimeClass, Value};
use crate::signature::MemberSignature;

/// Per-call reflective dispatch
pub struct FallbackInvoker {
    target: Weak<RuntimeClass>,
    target_name: Arc<str>,
    converter: Arc<dyn Converter>,
}

impl FallbackInvoker {
    /// Create an invoker for a bound class
    pub fn new(target: &Arc<RuntimeClass>, converter: Arc<dyn Converter>) -> Self {
        Self {
            target: Arc::downgrade(target),
            target_name: Arc::from(target.name()),
            converter,
        }
    }

    fn class(&self) -> AccessResult<Arc<RuntimeClass>> {
        self.target.upgrade().ok_or_else(|| AccessError::TargetUnloaded {
            target: self.target_name.to_string(),
        })
    }

    fn actual<'a>(&self, member: &'a ResolvedMember, label: &str) -> AccessResult<&'a MemberSignature> {
        member.actual_signature().ok_or_else(|| AccessError::MemberAbsent {
            member: label.to_string(),
        })
    }

    fn vanished(label: &str) -> AccessError {
        AccessError::MemberAbsent {
            member: label.to_string(),
        }
    }

    /// Field named by the resolution, declared by the class it resolved on.
    /// Fields are not virtual: a same-named field in a subclass is skipped.
    fn locate_field<'c>(
        class: &'c RuntimeClass,
        member: &ResolvedMember,
        actual: &MemberSignature,
        is_static: bool,
    ) -> Option<(&'c RuntimeClass, &'c Arc<FieldDef>)> {
        let declaring = match &member.resolution {
            Resolution::Present { declaring_class, .. } => declaring_class,
            Resolution::Absent => return None,
        };
        class
            .ancestors()
            .filter(|c| c.name() == &**declaring)
            .find_map(|c| {
                c.declared_fields()
                    .iter()
                    .find(|f| f.name == actual.name && f.is_static == is_static)
                    .map(|f| (c, f))
            })
    }

    /// Read an instance field
    pub fn get(&self, member: &ResolvedMember, label: &str, receiver: &ObjectRef) -> AccessResult<Value> {
        let actual = self.actual(member, label)?;
        let (_, field) =
            Self::locate_field(receiver.class(), member, actual, false).ok_or_else(|| Self::vanished(label))?;
        let value = receiver.get_slot(field.slot).ok_or_else(|| Self::vanished(label))?;
        to_consumer(
            self.converter.as_ref(),
            label,
            value,
            &field.field_type,
            &member.declared.return_type,
        )
    }

    /// Write an instance field
    pub fn set(&self, member: &ResolvedMember, label: &str, receiver: &ObjectRef, value: Value) -> AccessResult<()> {
        let actual = self.actual(member, label)?;
        let (_, field) =
            Self::locate_field(receiver.class(), member, actual, false).ok_or_else(|| Self::vanished(label))?;
        let value = to_target(
            self.converter.as_ref(),
            label,
            value,
            &member.declared.return_type,
            &field.field_type,
        )?;
        if receiver.set_slot(field.slot, value) {
            Ok(())
        } else {
            Err(Self::vanished(label))
        }
    }

    /// Read a static field
    pub fn get_static(&self, member: &ResolvedMember, label: &str) -> AccessResult<Value> {
        let actual = self.actual(member, label)?;
        let class = self.class()?;
        let (declaring, field) =
            Self::locate_field(&class, member, actual, true).ok_or_else(|| Self::vanished(label))?;
        let value = declaring.statics().get(field.slot).ok_or_else(|| Self::vanished(label))?;
        to_consumer(
            self.converter.as_ref(),
            label,
            value,
            &field.field_type,
            &member.declared.return_type,
        )
    }

    /// Write a static field
    pub fn set_static(&self, member: &ResolvedMember, label: &str, value: Value) -> AccessResult<()> {
        let actual = self.actual(member, label)?;
        let class = self.class()?;
        let (declaring, field) =
            Self::locate_field(&class, member, actual, true).ok_or_else(|| Self::vanished(label))?;
        let value = to_target(
            self.converter.as_ref(),
            label,
            value,
            &member.declared.return_type,
            &field.field_type,
        )?;
        if declaring.statics().set(field.slot, value) {
            Ok(())
        } else {
            Err(Self::vanished(label))
        }
    }

    /// Invoke an instance method, dispatching on the receiver's class
    pub fn invoke(&self, member: &ResolvedMember, label: &str, receiver: &ObjectRef, args: &[Value]) -> AccessResult<Value> {
        let actual = self.actual(member, label)?;
        let args = args_to_target(
            self.converter.as_ref(),
            label,
            args,
            &member.declared.parameter_types,
            &actual.parameter_types,
        )?;
        let method = receiver
            .class()
            .find_method(&actual.name, &actual.parameter_types, false)
            .cloned()
            .ok_or_else(|| Self::vanished(label))?;
        let result = host(label, (method.body)(&Value::Object(receiver.clone()), &args))?;
        to_consumer(
            self.converter.as_ref(),
            label,
            result,
            &method.return_type,
            &member.declared.return_type,
        )
    }

    /// Invoke a static method
    pub fn invoke_static(&self, member: &ResolvedMember, label: &str, args: &[Value]) -> AccessResult<Value> {
        let actual = self.actual(member, label)?;
        let args = args_to_target(
            self.converter.as_ref(),
            label,
            args,
            &member.declared.parameter_types,
            &actual.parameter_types,
        )?;
        let class = self.class()?;
        let method = class
            .find_method(&actual.name, &actual.parameter_types, true)
            .cloned()
            .ok_or_else(|| Self::vanished(label))?;
        let result = host(label, (method.body)(&Value::Null, &args))?;
        to_consumer(
            self.converter.as_ref(),
            label,
            result,
            &method.return_type,
            &member.declared.return_type,
        )
    }

    /// Invoke a constructor
    pub fn construct(&self, member: &ResolvedMember, label: &str, args: &[Value]) -> AccessResult<Value> {
        let actual = self.actual(member, label)?;
        let args = args_to_target(
            self.converter.as_ref(),
            label,
            args,
            &member.declared.parameter_types,
            &actual.parameter_types,
        )?;
        let class = self.class()?;
        let ctor = class
            .find_constructor(&actual.parameter_types)
            .cloned()
            .ok_or_else(|| Self::vanished(label))?;
        let instance = ObjectRef::allocate(&class);
        host(label, (ctor.body)(&instance, &args))?;
        to_consumer(
            self.converter.as_ref(),
            label,
            Value::Object(instance),
            &class.type_ref(),
            &member.declared.return_type,
        )
    }
}

impl fmt::Debug for FallbackInvoker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FallbackInvoker")
            .field("target", &self.target_name)
            .finish()
    }
}
