//! Runtime classes
//!
//! A [`RuntimeClass`] is a concrete, loaded version of a target type: its
//! fields (instance slots and static storage), methods (with a virtual method
//! table), and constructors. Member bodies are native closures.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use parking_lot::RwLock;

use crate::signature::{MemberKind, MemberSignature, TypeRef};
use crate::version::VersionTag;

use super::error::{HostError, LoaderError};
use super::loader::{ClassLoader, LoaderId};
use super::object::ObjectRef;
use super::value::Value;

/// Native method body: `(receiver, arguments) -> result`. Static methods
/// receive [`Value::Null`] as the receiver.
pub type MethodBody = Arc<dyn Fn(&Value, &[Value]) -> Result<Value, HostError> + Send + Sync>;

/// Native constructor body, run on a freshly allocated instance
pub type ConstructorBody = Arc<dyn Fn(&ObjectRef, &[Value]) -> Result<(), HostError> + Send + Sync>;

/// Unique class identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ClassId(u64);

static NEXT_CLASS_ID: AtomicU64 = AtomicU64::new(1);

impl ClassId {
    fn next() -> Self {
        ClassId(NEXT_CLASS_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// Get the numeric ID value
    pub fn as_u64(self) -> u64 {
        self.0
    }
}

/// How the host lets accessors reach a member
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MemberAccess {
    /// Direct access allowed (accessors may be generated)
    #[default]
    Direct,
    /// Only reflective access is permitted
    ReflectiveOnly,
}

/// A field defined by a class
#[derive(Debug, Clone)]
pub struct FieldDef {
    /// Field name
    pub name: Arc<str>,
    /// Declared type
    pub field_type: TypeRef,
    /// Static field (slot indexes the declaring class's static storage)
    pub is_static: bool,
    /// Slot index (instance layout or static storage)
    pub slot: usize,
    /// Access restrictions
    pub access: MemberAccess,
    /// Name of the declaring class
    pub declaring_class: Arc<str>,
}

impl FieldDef {
    /// Signature of the field as it exists on the class
    pub fn signature(&self) -> MemberSignature {
        MemberSignature::field(&self.name, self.field_type.clone()).with_static(self.is_static)
    }
}

/// A method defined by a class
pub struct MethodDef {
    /// Method name
    pub name: Arc<str>,
    /// Parameter types
    pub parameter_types: Vec<TypeRef>,
    /// Return type
    pub return_type: TypeRef,
    /// Static method
    pub is_static: bool,
    /// Virtual method table slot (instance methods only)
    pub vtable_slot: Option<usize>,
    /// Access restrictions
    pub access: MemberAccess,
    /// Name of the declaring class
    pub declaring_class: Arc<str>,
    /// Native body
    pub body: MethodBody,
}

impl MethodDef {
    /// Signature of the method as it exists on the class
    pub fn signature(&self) -> MemberSignature {
        MemberSignature::method(&self.name, self.parameter_types.clone(), self.return_type.clone())
            .with_static(self.is_static)
    }

    fn same_shape(&self, name: &str, params: &[TypeRef]) -> bool {
        &*self.name == name
            && self.parameter_types.len() == params.len()
            && self
                .parameter_types
                .iter()
                .zip(params)
                .all(|(a, b)| a.erased_eq(b))
    }
}

impl fmt::Debug for MethodDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MethodDef")
            .field("signature", &self.signature().to_string())
            .field("vtable_slot", &self.vtable_slot)
            .field("access", &self.access)
            .field("declaring_class", &self.declaring_class)
            .finish()
    }
}

/// A constructor defined by a class
pub struct ConstructorDef {
    /// Parameter types
    pub parameter_types: Vec<TypeRef>,
    /// Access restrictions
    pub access: MemberAccess,
    /// Name of the declaring class
    pub declaring_class: Arc<str>,
    /// Native body
    pub body: ConstructorBody,
}

impl ConstructorDef {
    /// Signature of the constructor as it exists on the class
    pub fn signature(&self) -> MemberSignature {
        MemberSignature::constructor(TypeRef::named(&self.declaring_class), self.parameter_types.clone())
    }

    fn same_shape(&self, params: &[TypeRef]) -> bool {
        self.parameter_types.len() == params.len()
            && self
                .parameter_types
                .iter()
                .zip(params)
                .all(|(a, b)| a.erased_eq(b))
    }
}

impl fmt::Debug for ConstructorDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConstructorDef")
            .field("signature", &self.signature().to_string())
            .field("access", &self.access)
            .finish()
    }
}

/// Static field storage of one class
///
/// Kept behind its own `Arc` so accessors can hold it without keeping the
/// class itself alive.
#[derive(Debug, Default)]
pub struct StaticStorage {
    slots: RwLock<Vec<Value>>,
}

impl StaticStorage {
    /// Read a static slot
    pub fn get(&self, slot: usize) -> Option<Value> {
        self.slots.read().get(slot).cloned()
    }

    /// Write a static slot. Returns false if the slot does not exist.
    pub fn set(&self, slot: usize, value: Value) -> bool {
        match self.slots.write().get_mut(slot) {
            Some(s) => {
                *s = value;
                true
            }
            None => false,
        }
    }

    /// Number of static slots
    pub fn len(&self) -> usize {
        self.slots.read().len()
    }

    /// Check if the class has no static fields
    pub fn is_empty(&self) -> bool {
        self.slots.read().is_empty()
    }
}

/// A loaded class
pub struct RuntimeClass {
    id: ClassId,
    name: Arc<str>,
    loader_id: LoaderId,
    loader: Weak<ClassLoader>,
    version: VersionTag,
    parent: Option<Arc<RuntimeClass>>,
    fields: Vec<Arc<FieldDef>>,
    methods: Vec<Arc<MethodDef>>,
    constructors: Vec<Arc<ConstructorDef>>,
    vtable: Vec<Arc<MethodDef>>,
    instance_defaults: Vec<Value>,
    statics: Arc<StaticStorage>,
}

impl RuntimeClass {
    /// Class ID (unique per process)
    pub fn id(&self) -> ClassId {
        self.id
    }

    /// Fully qualified class name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Last segment of the class name
    pub fn simple_name(&self) -> &str {
        self.name.rsplit('.').next().unwrap_or(&self.name)
    }

    /// Type reference naming this class
    pub fn type_ref(&self) -> TypeRef {
        TypeRef::named(&self.name)
    }

    /// ID of the defining loader
    pub fn loader_id(&self) -> LoaderId {
        self.loader_id
    }

    /// The defining loader, if it is still alive
    pub fn loader(&self) -> Option<Arc<ClassLoader>> {
        self.loader.upgrade()
    }

    /// Release this class was loaded from
    pub fn version(&self) -> &VersionTag {
        &self.version
    }

    /// Superclass
    pub fn parent(&self) -> Option<&Arc<RuntimeClass>> {
        self.parent.as_ref()
    }

    /// This class followed by its superclass chain
    pub fn ancestors(&self) -> impl Iterator<Item = &RuntimeClass> {
        std::iter::successors(Some(self), |c| c.parent.as_deref())
    }

    /// Check if this class is `other` or derives from it
    pub fn is_subclass_of(&self, other: &RuntimeClass) -> bool {
        self.is_subclass_of_id(other.id)
    }

    /// Check if this class is, or derives from, the class with the given ID
    pub fn is_subclass_of_id(&self, id: ClassId) -> bool {
        self.ancestors().any(|c| c.id == id)
    }

    /// Check if this class is, or derives from, a class with the given name
    pub fn extends_name(&self, name: &str) -> bool {
        self.ancestors().any(|c| &*c.name == name)
    }

    /// Fields declared by this class (not inherited)
    pub fn declared_fields(&self) -> &[Arc<FieldDef>] {
        &self.fields
    }

    /// Methods declared by this class (not inherited)
    pub fn declared_methods(&self) -> &[Arc<MethodDef>] {
        &self.methods
    }

    /// Constructors of this class
    pub fn constructors(&self) -> &[Arc<ConstructorDef>] {
        &self.constructors
    }

    /// Virtual method table
    pub fn vtable(&self) -> &[Arc<MethodDef>] {
        &self.vtable
    }

    /// Method at a vtable slot
    pub fn vtable_entry(&self, slot: usize) -> Option<&Arc<MethodDef>> {
        self.vtable.get(slot)
    }

    /// Default values of every instance slot (inherited slots first)
    pub fn instance_defaults(&self) -> &[Value] {
        &self.instance_defaults
    }

    /// Number of instance slots, including inherited ones
    pub fn instance_field_count(&self) -> usize {
        self.instance_defaults.len()
    }

    /// Static field storage
    pub fn statics(&self) -> &Arc<StaticStorage> {
        &self.statics
    }

    /// Find a field by name on this class or a superclass
    ///
    /// Returns the declaring class along with the field.
    pub fn find_field(&self, name: &str) -> Option<(&RuntimeClass, &Arc<FieldDef>)> {
        self.ancestors().find_map(|class| {
            class
                .fields
                .iter()
                .find(|f| &*f.name == name)
                .map(|f| (class, f))
        })
    }

    /// Find a method by name and erased parameter types on this class or a
    /// superclass. The most derived declaration wins.
    pub fn find_method(&self, name: &str, params: &[TypeRef], is_static: bool) -> Option<&Arc<MethodDef>> {
        self.ancestors().find_map(|class| {
            class
                .methods
                .iter()
                .find(|m| m.is_static == is_static && m.same_shape(name, params))
        })
    }

    /// Find a constructor by erased parameter types (own constructors only)
    pub fn find_constructor(&self, params: &[TypeRef]) -> Option<&Arc<ConstructorDef>> {
        self.constructors.iter().find(|c| c.same_shape(params))
    }

    /// Names of all members of a kind visible on this class, most derived first
    pub fn member_names(&self, kind: MemberKind) -> Vec<Arc<str>> {
        let mut names: Vec<Arc<str>> = Vec::new();
        match kind {
            MemberKind::Constructor => {
                if !self.constructors.is_empty() {
                    names.push(self.name.clone());
                }
            }
            MemberKind::Field => {
                for class in self.ancestors() {
                    names.extend(class.fields.iter().map(|f| f.name.clone()));
                }
            }
            MemberKind::Method => {
                for class in self.ancestors() {
                    names.extend(class.methods.iter().map(|m| m.name.clone()));
                }
            }
        }
        let mut seen = rustc_hash::FxHashSet::default();
        names.retain(|n| seen.insert(n.clone()));
        names
    }
}

impl fmt::Debug for RuntimeClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RuntimeClass")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("version", &self.version.to_string())
            .field("parent", &self.parent.as_ref().map(|p| p.name().to_string()))
            .field("fields", &self.fields)
            .field("methods", &self.methods)
            .field("constructors", &self.constructors.len())
            .finish()
    }
}

#[derive(Debug, Clone, Copy)]
enum LastMember {
    Field(usize),
    Method(usize),
    Constructor(usize),
}

struct PendingField {
    name: String,
    field_type: TypeRef,
    is_static: bool,
    initial: Option<Value>,
    access: MemberAccess,
}

struct PendingMethod {
    name: String,
    parameter_types: Vec<TypeRef>,
    return_type: TypeRef,
    is_static: bool,
    access: MemberAccess,
    body: MethodBody,
}

struct PendingConstructor {
    parameter_types: Vec<TypeRef>,
    access: MemberAccess,
    body: ConstructorBody,
}

/// Builder for classes defined through [`ClassLoader::define`]
pub struct ClassBuilder {
    name: String,
    parent: Option<Arc<RuntimeClass>>,
    fields: Vec<PendingField>,
    methods: Vec<PendingMethod>,
    constructors: Vec<PendingConstructor>,
    last: Option<LastMember>,
}

impl ClassBuilder {
    /// Start a class with the given fully qualified name
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            parent: None,
            fields: Vec::new(),
            methods: Vec::new(),
            constructors: Vec::new(),
            last: None,
        }
    }

    /// Set the superclass
    pub fn extends(mut self, parent: &Arc<RuntimeClass>) -> Self {
        self.parent = Some(parent.clone());
        self
    }

    /// Add an instance field
    pub fn field(mut self, name: &str, field_type: TypeRef) -> Self {
        self.fields.push(PendingField {
            name: name.to_string(),
            field_type,
            is_static: false,
            initial: None,
            access: MemberAccess::Direct,
        });
        self.last = Some(LastMember::Field(self.fields.len() - 1));
        self
    }

    /// Add a static field with an initial value
    pub fn static_field(mut self, name: &str, field_type: TypeRef, initial: Value) -> Self {
        self.fields.push(PendingField {
            name: name.to_string(),
            field_type,
            is_static: true,
            initial: Some(initial),
            access: MemberAccess::Direct,
        });
        self.last = Some(LastMember::Field(self.fields.len() - 1));
        self
    }

    /// Add an instance method
    pub fn method<F>(mut self, name: &str, params: Vec<TypeRef>, return_type: TypeRef, body: F) -> Self
    where
        F: Fn(&Value, &[Value]) -> Result<Value, HostError> + Send + Sync + 'static,
    {
        self.methods.push(PendingMethod {
            name: name.to_string(),
            parameter_types: params,
            return_type,
            is_static: false,
            access: MemberAccess::Direct,
            body: Arc::new(body),
        });
        self.last = Some(LastMember::Method(self.methods.len() - 1));
        self
    }

    /// Add a static method
    pub fn static_method<F>(mut self, name: &str, params: Vec<TypeRef>, return_type: TypeRef, body: F) -> Self
    where
        F: Fn(&[Value]) -> Result<Value, HostError> + Send + Sync + 'static,
    {
        self.methods.push(PendingMethod {
            name: name.to_string(),
            parameter_types: params,
            return_type,
            is_static: true,
            access: MemberAccess::Direct,
            body: Arc::new(move |_: &Value, args: &[Value]| body(args)),
        });
        self.last = Some(LastMember::Method(self.methods.len() - 1));
        self
    }

    /// Add a constructor
    pub fn constructor<F>(mut self, params: Vec<TypeRef>, body: F) -> Self
    where
        F: Fn(&ObjectRef, &[Value]) -> Result<(), HostError> + Send + Sync + 'static,
    {
        self.constructors.push(PendingConstructor {
            parameter_types: params,
            access: MemberAccess::Direct,
            body: Arc::new(body),
        });
        self.last = Some(LastMember::Constructor(self.constructors.len() - 1));
        self
    }

    /// Restrict the most recently added member to reflective access
    pub fn reflective_only(mut self) -> Self {
        match self.last {
            Some(LastMember::Field(i)) => self.fields[i].access = MemberAccess::ReflectiveOnly,
            Some(LastMember::Method(i)) => self.methods[i].access = MemberAccess::ReflectiveOnly,
            Some(LastMember::Constructor(i)) => {
                self.constructors[i].access = MemberAccess::ReflectiveOnly
            }
            None => {}
        }
        self
    }

    /// Class name being built
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Lay out slots and the vtable and produce the class
    pub(crate) fn finish(
        self,
        loader_id: LoaderId,
        loader: Weak<ClassLoader>,
        version: VersionTag,
    ) -> Result<RuntimeClass, LoaderError> {
        let class_name: Arc<str> = Arc::from(self.name.as_str());
        let owner = self.name.clone();
        let duplicate = |member: String| LoaderError::DuplicateMember {
            class: owner.clone(),
            member,
        };

        let mut instance_defaults = self
            .parent
            .as_ref()
            .map(|p| p.instance_defaults.clone())
            .unwrap_or_default();
        let mut static_values = Vec::new();
        let mut fields: Vec<Arc<FieldDef>> = Vec::with_capacity(self.fields.len());

        for pending in self.fields {
            if fields.iter().any(|f| *f.name == *pending.name) {
                return Err(duplicate(pending.name));
            }
            let slot = if pending.is_static {
                let value = pending
                    .initial
                    .unwrap_or_else(|| Value::default_for(&pending.field_type));
                static_values.push(value);
                static_values.len() - 1
            } else {
                instance_defaults.push(Value::default_for(&pending.field_type));
                instance_defaults.len() - 1
            };
            fields.push(Arc::new(FieldDef {
                name: Arc::from(pending.name.as_str()),
                field_type: pending.field_type,
                is_static: pending.is_static,
                slot,
                access: pending.access,
                declaring_class: class_name.clone(),
            }));
        }

        let mut vtable: Vec<Arc<MethodDef>> = self
            .parent
            .as_ref()
            .map(|p| p.vtable.clone())
            .unwrap_or_default();
        let mut methods: Vec<Arc<MethodDef>> = Vec::with_capacity(self.methods.len());

        for pending in self.methods {
            if methods.iter().any(|m| {
                m.is_static == pending.is_static && m.same_shape(&pending.name, &pending.parameter_types)
            }) {
                let sig = MemberSignature::method(
                    &pending.name,
                    pending.parameter_types.clone(),
                    pending.return_type.clone(),
                );
                return Err(duplicate(sig.to_string()));
            }

            let vtable_slot = if pending.is_static {
                None
            } else {
                // Overrides reuse the inherited slot
                let existing = vtable
                    .iter()
                    .position(|m| m.same_shape(&pending.name, &pending.parameter_types));
                Some(existing.unwrap_or(vtable.len()))
            };

            let def = Arc::new(MethodDef {
                name: Arc::from(pending.name.as_str()),
                parameter_types: pending.parameter_types,
                return_type: pending.return_type,
                is_static: pending.is_static,
                vtable_slot,
                access: pending.access,
                declaring_class: class_name.clone(),
                body: pending.body,
            });

            if let Some(slot) = vtable_slot {
                if slot < vtable.len() {
                    vtable[slot] = def.clone();
                } else {
                    vtable.push(def.clone());
                }
            }
            methods.push(def);
        }

        let mut constructors: Vec<Arc<ConstructorDef>> = Vec::with_capacity(self.constructors.len());
        for pending in self.constructors {
            if constructors.iter().any(|c| c.same_shape(&pending.parameter_types)) {
                let sig = MemberSignature::constructor(
                    TypeRef::named(&class_name),
                    pending.parameter_types.clone(),
                );
                return Err(duplicate(sig.to_string()));
            }
            constructors.push(Arc::new(ConstructorDef {
                parameter_types: pending.parameter_types,
                access: pending.access,
                declaring_class: class_name.clone(),
                body: pending.body,
            }));
        }

        Ok(RuntimeClass {
            id: ClassId::next(),
            name: class_name,
            loader_id,
            loader,
            version,
            parent: self.parent,
            fields,
            methods,
            constructors,
            vtable,
            instance_defaults,
            statics: Arc::new(StaticStorage {
                slots: RwLock::new(static_values),
            }),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signature::PrimitiveType;

    fn int() -> TypeRef {
        TypeRef::primitive(PrimitiveType::Int)
    }

    fn loader() -> Arc<ClassLoader> {
        ClassLoader::new("test", VersionTag::parse("1.0").unwrap())
    }

    #[test]
    fn test_field_layout_includes_inherited_slots() {
        let loader = loader();
        let base = loader
            .define(ClassBuilder::new("Base").field("a", int()).field("b", int()))
            .unwrap();
        let derived = loader
            .define(ClassBuilder::new("Derived").extends(&base).field("c", TypeRef::string()))
            .unwrap();

        assert_eq!(derived.instance_field_count(), 3);
        let (declaring, field) = derived.find_field("c").unwrap();
        assert_eq!(declaring.name(), "Derived");
        assert_eq!(field.slot, 2);
        let (declaring, field) = derived.find_field("a").unwrap();
        assert_eq!(declaring.name(), "Base");
        assert_eq!(field.slot, 0);
    }

    #[test]
    fn test_override_reuses_vtable_slot() {
        let loader = loader();
        let base = loader
            .define(
                ClassBuilder::new("Base")
                    .method("id", vec![], int(), |_, _| Ok(Value::Int(1)))
                    .method("other", vec![], int(), |_, _| Ok(Value::Int(2))),
            )
            .unwrap();
        let derived = loader
            .define(
                ClassBuilder::new("Derived")
                    .extends(&base)
                    .method("id", vec![], int(), |_, _| Ok(Value::Int(10))),
            )
            .unwrap();

        assert_eq!(derived.vtable().len(), 2);
        let id = derived.find_method("id", &[], false).unwrap();
        assert_eq!(id.vtable_slot, Some(0));
        assert_eq!(&*derived.vtable_entry(0).unwrap().declaring_class, "Derived");
        assert_eq!(&*derived.vtable_entry(1).unwrap().declaring_class, "Base");
    }

    #[test]
    fn test_static_storage() {
        let loader = loader();
        let class = loader
            .define(ClassBuilder::new("Counter").static_field("count", int(), Value::Int(3)))
            .unwrap();
        let (_, field) = class.find_field("count").unwrap();
        assert!(field.is_static);
        assert_eq!(class.statics().get(field.slot), Some(Value::Int(3)));
        assert!(class.statics().set(field.slot, Value::Int(4)));
        assert_eq!(class.statics().get(field.slot), Some(Value::Int(4)));
        assert_eq!(class.instance_field_count(), 0);
    }

    #[test]
    fn test_duplicate_member_rejected() {
        let loader = loader();
        let result = loader.define(ClassBuilder::new("Dup").field("x", int()).field("x", int()));
        assert!(matches!(result, Err(LoaderError::DuplicateMember { .. })));
    }

    #[test]
    fn test_reflective_only_marks_last_member() {
        let loader = loader();
        let class = loader
            .define(
                ClassBuilder::new("Sealed")
                    .field("open", int())
                    .field("hidden", int())
                    .reflective_only(),
            )
            .unwrap();
        assert_eq!(class.find_field("open").unwrap().1.access, MemberAccess::Direct);
        assert_eq!(class.find_field("hidden").unwrap().1.access, MemberAccess::ReflectiveOnly);
    }

    #[test]
    fn test_member_names() {
        let loader = loader();
        let base = loader
            .define(ClassBuilder::new("Base").method("size", vec![], int(), |_, _| Ok(Value::Int(0))))
            .unwrap();
        let derived = loader
            .define(
                ClassBuilder::new("Derived")
                    .extends(&base)
                    .method("size", vec![], int(), |_, _| Ok(Value::Int(1)))
                    .method("clear", vec![], TypeRef::void(), |_, _| Ok(Value::Null)),
            )
            .unwrap();
        let names: Vec<String> = derived
            .member_names(MemberKind::Method)
            .iter()
            .map(|n| n.to_string())
            .collect();
        assert_eq!(names, vec!["size".to_string(), "clear".to_string()]);
    }
}
