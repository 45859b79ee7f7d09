//! Closure-based accessor generation

use std::sync::Arc;

use crate::error::{AccessError, GenerationFailure};
use crate::resolver::{MemberHandle, Resolution, ResolvedMember};
use crate::runtime::{MemberAccess, ObjectRef, Value};

use super::marshal::{args_to_target, host, to_consumer, to_target};
use super::{
    Accessor, AccessorGenerator, FieldGetter, FieldSetter, GeneratedImplementation, GenerationRequest,
    MethodInvoker, StaticGetter, StaticInvoker, StaticSetter,
};

/// Builds one boxed closure per member, capturing the resolved host member
/// (slot index, vtable slot, static storage, body) directly
#[derive(Debug, Clone, Copy, Default)]
pub struct ClosureGenerator;

impl ClosureGenerator {
    /// Create a generator
    pub fn new() -> Self {
        Self
    }
}

impl AccessorGenerator for ClosureGenerator {
    fn generate(&self, request: &GenerationRequest<'_>) -> Result<GeneratedImplementation, GenerationFailure> {
        let accessors = request
            .members
            .iter()
            .map(|member| build_accessor(request, member))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(GeneratedImplementation::new(accessors))
    }
}

fn check_access(access: MemberAccess, label: &str) -> Result<(), GenerationFailure> {
    match access {
        MemberAccess::Direct => Ok(()),
        MemberAccess::ReflectiveOnly => Err(GenerationFailure::AccessDenied {
            member: label.to_string(),
        }),
    }
}

fn build_accessor(request: &GenerationRequest<'_>, member: &ResolvedMember) -> Result<Accessor, GenerationFailure> {
    let Resolution::Present {
        signature: actual,
        handle,
        ..
    } = &member.resolution
    else {
        return Ok(Accessor::Absent);
    };

    let label: Arc<str> = Arc::from(member.declared.to_string());
    let declared = &member.declared;
    if declared.arity() > request.max_arity {
        return Err(GenerationFailure::UnsupportedShape {
            member: label.to_string(),
            arity: declared.arity(),
            max: request.max_arity,
        });
    }

    let target = request.target;
    let target_name: Arc<str> = Arc::from(target.name());
    let rejected = |reason: String| GenerationFailure::Rejected {
        member: label.to_string(),
        reason,
    };

    match handle {
        MemberHandle::Field(field) if field.is_static => {
            check_access(field.access, &label)?;
            let storage = target
                .ancestors()
                .find(|c| c.name() == &*field.declaring_class)
                .map(|c| c.statics().clone())
                .ok_or_else(|| rejected(format!("{} is not in the class chain", field.declaring_class)))?;
            let slot = field.slot;
            if slot >= storage.len() {
                return Err(rejected(format!("static slot {} outside storage", slot)));
            }

            let get: StaticGetter = {
                let (storage, converter, label) = (storage.clone(), request.converter.clone(), label.clone());
                let (actual_ty, declared_ty) = (field.field_type.clone(), declared.return_type.clone());
                let target_name = target_name.clone();
                Box::new(move || {
                    let value = storage.get(slot).ok_or_else(|| AccessError::TargetUnloaded {
                        target: target_name.to_string(),
                    })?;
                    to_consumer(converter.as_ref(), &label, value, &actual_ty, &declared_ty)
                })
            };
            let set: StaticSetter = {
                let (converter, label) = (request.converter.clone(), label.clone());
                let (actual_ty, declared_ty) = (field.field_type.clone(), declared.return_type.clone());
                Box::new(move |value: Value| {
                    let value = to_target(converter.as_ref(), &label, value, &declared_ty, &actual_ty)?;
                    storage.set(slot, value);
                    Ok(())
                })
            };
            Ok(Accessor::StaticField { get, set })
        }

        MemberHandle::Field(field) => {
            check_access(field.access, &label)?;
            let slot = field.slot;
            if slot >= target.instance_field_count() {
                return Err(rejected(format!("slot {} outside instance layout", slot)));
            }

            let get: FieldGetter = {
                let (converter, label, target_name) = (request.converter.clone(), label.clone(), target_name.clone());
                let (actual_ty, declared_ty) = (field.field_type.clone(), declared.return_type.clone());
                Box::new(move |receiver: &ObjectRef| {
                    let value = receiver
                        .get_slot(slot)
                        .ok_or_else(|| incompatible(&label, &target_name, receiver))?;
                    to_consumer(converter.as_ref(), &label, value, &actual_ty, &declared_ty)
                })
            };
            let set: FieldSetter = {
                let (converter, label) = (request.converter.clone(), label.clone());
                let (actual_ty, declared_ty) = (field.field_type.clone(), declared.return_type.clone());
                Box::new(move |receiver: &ObjectRef, value: Value| {
                    let value = to_target(converter.as_ref(), &label, value, &declared_ty, &actual_ty)?;
                    if receiver.set_slot(slot, value) {
                        Ok(())
                    } else {
                        Err(incompatible(&label, &target_name, receiver))
                    }
                })
            };
            Ok(Accessor::Field { get, set })
        }

        MemberHandle::Method(method) if method.is_static => {
            check_access(method.access, &label)?;
            let body = method.body.clone();
            let converter = request.converter.clone();
            let (declared_params, actual_params) = (declared.parameter_types.clone(), actual.parameter_types.clone());
            let (declared_ret, actual_ret) = (declared.return_type.clone(), actual.return_type.clone());
            let invoke: StaticInvoker = Box::new(move |args: &[Value]| {
                let args = args_to_target(converter.as_ref(), &label, args, &declared_params, &actual_params)?;
                let result = host(&label, body(&Value::Null, &args))?;
                to_consumer(converter.as_ref(), &label, result, &actual_ret, &declared_ret)
            });
            Ok(Accessor::StaticMethod(invoke))
        }

        MemberHandle::Method(method) => {
            check_access(method.access, &label)?;
            let slot = method
                .vtable_slot
                .ok_or_else(|| rejected("instance method without a vtable slot".to_string()))?;
            match target.vtable_entry(slot) {
                Some(entry) if entry.name == method.name => {}
                _ => return Err(rejected(format!("vtable slot {} does not hold {}", slot, method.name))),
            }

            let converter = request.converter.clone();
            let (declared_params, actual_params) = (declared.parameter_types.clone(), actual.parameter_types.clone());
            let (declared_ret, actual_ret) = (declared.return_type.clone(), actual.return_type.clone());
            let invoke: MethodInvoker = Box::new(move |receiver: &ObjectRef, args: &[Value]| {
                let args = args_to_target(converter.as_ref(), &label, args, &declared_params, &actual_params)?;
                // Dispatch through the receiver's vtable so overrides apply
                let body = receiver
                    .class()
                    .vtable_entry(slot)
                    .map(|m| m.body.clone())
                    .ok_or_else(|| incompatible(&label, &target_name, receiver))?;
                let result = host(&label, body(&Value::Object(receiver.clone()), &args))?;
                to_consumer(converter.as_ref(), &label, result, &actual_ret, &declared_ret)
            });
            Ok(Accessor::Method(invoke))
        }

        MemberHandle::Constructor(ctor) => {
            check_access(ctor.access, &label)?;
            let class = Arc::downgrade(target);
            let body = ctor.body.clone();
            let converter = request.converter.clone();
            let (declared_params, actual_params) = (declared.parameter_types.clone(), actual.parameter_types.clone());
            let (declared_ret, actual_ret) = (declared.return_type.clone(), actual.return_type.clone());
            let construct: StaticInvoker = Box::new(move |args: &[Value]| {
                let args = args_to_target(converter.as_ref(), &label, args, &declared_params, &actual_params)?;
                let class = class.upgrade().ok_or_else(|| AccessError::TargetUnloaded {
                    target: target_name.to_string(),
                })?;
                let instance = ObjectRef::allocate(&class);
                host(&label, body(&instance, &args))?;
                to_consumer(converter.as_ref(), &label, Value::Object(instance), &actual_ret, &declared_ret)
            });
            Ok(Accessor::Constructor(construct))
        }
    }
}

fn incompatible(label: &str, target: &str, receiver: &ObjectRef) -> AccessError {
    AccessError::IncompatibleInstance {
        member: label.to_string(),
        expected: target.to_string(),
        actual: receiver.class().name().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::convert::{AssignabilityMode, BasicConverter, Converter, StandardAssignability};
    use crate::remap::RemapTable;
    use crate::resolver::Resolver;
    use crate::runtime::{ClassBuilder, ClassLoader, HostError, RuntimeClass};
    use crate::signature::{PrimitiveType, TypeRef};
    use crate::template::{parse_template, TemplateDescriptor};
    use crate::version::VersionTag;

    fn int() -> TypeRef {
        TypeRef::primitive(PrimitiveType::Int)
    }

    fn class(builder: ClassBuilder) -> (Arc<ClassLoader>, Arc<RuntimeClass>) {
        let loader = ClassLoader::new("t", VersionTag::parse("1.0").unwrap());
        let class = loader.define(builder).unwrap();
        (loader, class)
    }

    fn generate(
        template: &str,
        target: &Arc<RuntimeClass>,
        max_arity: usize,
    ) -> (TemplateDescriptor, Result<GeneratedImplementation, GenerationFailure>) {
        let converter: Arc<dyn Converter> = Arc::new(BasicConverter::new());
        let resolver = Resolver::new(
            Arc::new(RemapTable::empty()),
            Arc::new(StandardAssignability::new(AssignabilityMode::Convertible, converter.clone())),
        );
        let descriptor = parse_template(template).unwrap();
        let members = resolver.resolve(&descriptor, target).unwrap();
        let result = ClosureGenerator::new().generate(&GenerationRequest {
            descriptor: &descriptor,
            target,
            members: &members,
            converter: &converter,
            max_arity,
        });
        (descriptor, result)
    }

    #[test]
    fn test_field_accessors() {
        let (_loader, point) = class(ClassBuilder::new("Point").field("x", int()));
        let (_, generated) = generate("template Point { long x; }", &point, 8);
        let generated = generated.unwrap();
        let obj = ObjectRef::allocate(&point);

        match generated.accessor(0) {
            Some(Accessor::Field { get, set }) => {
                set(&obj, Value::Long(7)).unwrap();
                assert_eq!(obj.get_slot(0), Some(Value::Int(7)));
                assert_eq!(get(&obj).unwrap(), Value::Long(7));
            }
            other => panic!("expected field accessor, got {:?}", other),
        }
    }

    #[test]
    fn test_method_failure_keeps_cause() {
        let (_loader, point) = class(ClassBuilder::new("Point").method("fail", vec![], TypeRef::void(), |_, _| {
            Err(HostError::illegal_argument("bad state"))
        }));
        let (_, generated) = generate("template Point { void fail(); }", &point, 8);
        let generated = generated.unwrap();
        let obj = ObjectRef::allocate(&point);

        match generated.accessor(0) {
            Some(Accessor::Method(invoke)) => {
                let err = invoke(&obj, &[]).unwrap_err();
                assert_eq!(err.host_error().map(|e| e.kind()), Some("IllegalArgument"));
            }
            other => panic!("expected method accessor, got {:?}", other),
        }
    }

    #[test]
    fn test_arity_limit() {
        let (_loader, point) = class(ClassBuilder::new("Point").method(
            "sum",
            vec![int(), int(), int()],
            int(),
            |_, _| Ok(Value::Int(0)),
        ));
        let (_, generated) = generate("template Point { int sum(int, int, int); }", &point, 2);
        assert!(matches!(
            generated.unwrap_err(),
            GenerationFailure::UnsupportedShape { arity: 3, max: 2, .. }
        ));
    }

    #[test]
    fn test_reflective_only_denied() {
        let (_loader, point) = class(ClassBuilder::new("Point").field("secret", int()).reflective_only());
        let (_, generated) = generate("template Point { int secret; }", &point, 8);
        assert!(matches!(generated.unwrap_err(), GenerationFailure::AccessDenied { .. }));
    }

    #[test]
    fn test_absent_member() {
        let (_loader, point) = class(ClassBuilder::new("Point"));
        let (_, generated) = generate("template Point { optional int x; }", &point, 8);
        assert!(matches!(generated.unwrap().accessor(0), Some(Accessor::Absent)));
    }
}
