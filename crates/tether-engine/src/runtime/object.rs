//! Heap instances of runtime classes

use std::fmt;
use std::ops::Deref;
use std::sync::Arc;

use parking_lot::RwLock;

use super::class::RuntimeClass;
use super::value::Value;

/// An instance of a runtime class
///
/// Instance field storage is a flat slot vector laid out by the class
/// (inherited fields first). The instance keeps its class alive.
pub struct Instance {
    class: Arc<RuntimeClass>,
    slots: RwLock<Vec<Value>>,
}

impl Instance {
    /// The instance's class
    pub fn class(&self) -> &Arc<RuntimeClass> {
        &self.class
    }

    /// Read a field slot
    pub fn get_slot(&self, slot: usize) -> Option<Value> {
        self.slots.read().get(slot).cloned()
    }

    /// Write a field slot. Returns false if the slot does not exist.
    pub fn set_slot(&self, slot: usize, value: Value) -> bool {
        let mut slots = self.slots.write();
        match slots.get_mut(slot) {
            Some(s) => {
                *s = value;
                true
            }
            None => false,
        }
    }

    /// Number of field slots
    pub fn slot_count(&self) -> usize {
        self.slots.read().len()
    }
}

impl fmt::Debug for Instance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Instance")
            .field("class", &self.class.name())
            .field("slots", &*self.slots.read())
            .finish()
    }
}

/// Shared reference to an instance, compared by identity
#[derive(Clone)]
pub struct ObjectRef(Arc<Instance>);

impl ObjectRef {
    /// Allocate a fresh instance with every slot at its default value
    pub fn allocate(class: &Arc<RuntimeClass>) -> Self {
        let slots = class.instance_defaults().to_vec();
        ObjectRef(Arc::new(Instance {
            class: class.clone(),
            slots: RwLock::new(slots),
        }))
    }

    /// Stable identity of the instance (address based)
    pub fn identity(&self) -> usize {
        Arc::as_ptr(&self.0) as usize
    }

    /// Check whether two references point at the same instance
    pub fn ptr_eq(&self, other: &ObjectRef) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl Deref for ObjectRef {
    type Target = Instance;

    fn deref(&self) -> &Instance {
        &self.0
    }
}

impl PartialEq for ObjectRef {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl Eq for ObjectRef {}

impl fmt::Debug for ObjectRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{:x}", self.class().name(), self.identity())
    }
}
