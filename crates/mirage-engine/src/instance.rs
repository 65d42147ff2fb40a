//! Heap instances.
//!
//! Instances are reference-counted; the interception layer holds only weak
//! references, so dropping the last strong reference collects the mock.
//! Mock allocation bypasses user constructors entirely: fields start at
//! their declared defaults and a throwing or inaccessible constructor never
//! prevents mock creation.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;

use mirage_sdk::{InstanceHandle, Thrown, Value};

use crate::error::MockError;
use crate::types::{ClassId, ClassRegistry};

/// Global counter for generating unique instance handles.
static NEXT_INSTANCE_ID: AtomicU64 = AtomicU64::new(1);

fn next_handle() -> InstanceHandle {
    InstanceHandle::from_raw(NEXT_INSTANCE_ID.fetch_add(1, Ordering::Relaxed))
}

/// Shared reference to a heap instance.
pub type InstanceRef = Arc<Instance>;

/// A heap-allocated instance of a registered class.
#[derive(Debug)]
pub struct Instance {
    handle: InstanceHandle,
    class: ClassId,
    registry_id: u64,
    is_mock: bool,
    fields: RwLock<Vec<Value>>,
}

impl Instance {
    fn alloc(registry: &ClassRegistry, class: ClassId, is_mock: bool) -> InstanceRef {
        let fields = registry
            .field_layout(class)
            .into_iter()
            .map(|slot| slot.default)
            .collect();
        Arc::new(Self {
            handle: next_handle(),
            class,
            registry_id: registry.registry_id(),
            is_mock,
            fields: RwLock::new(fields),
        })
    }

    /// Allocate an instance with default field values, without running any
    /// constructor.
    pub fn allocate(registry: &ClassRegistry, class: ClassId) -> InstanceRef {
        Self::alloc(registry, class, false)
    }

    /// Allocate a mock instance (constructor bypass, mock-flagged).
    pub(crate) fn allocate_mock(registry: &ClassRegistry, class: ClassId) -> InstanceRef {
        Self::alloc(registry, class, true)
    }

    /// Allocate and run the class constructor with `args`.
    ///
    /// Used for ordinary (seed) instances; mocks never take this path.
    pub fn construct(
        registry: &ClassRegistry,
        class: ClassId,
        args: &[Value],
    ) -> Result<InstanceRef, Thrown> {
        let instance = Self::alloc(registry, class, false);
        let ctor = registry.get(class).and_then(|c| c.constructor.clone());
        if let Some(ctor) = ctor {
            let mut fields = instance.fields.write();
            ctor(&mut fields, args)?;
        }
        Ok(instance)
    }

    /// Unique handle of this instance.
    pub fn handle(&self) -> InstanceHandle {
        self.handle
    }

    /// Class of this instance.
    pub fn class_id(&self) -> ClassId {
        self.class
    }

    /// Id of the registry this instance was allocated against.
    pub fn registry_id(&self) -> u64 {
        self.registry_id
    }

    /// Whether this instance was produced by the synthesizer.
    pub fn is_mock(&self) -> bool {
        self.is_mock
    }

    /// Number of fields in the instance layout.
    pub fn field_count(&self) -> usize {
        self.fields.read().len()
    }

    /// Read a field by layout offset.
    pub fn get_field(&self, index: usize) -> Option<Value> {
        self.fields.read().get(index).cloned()
    }

    /// Write a field by layout offset.
    pub fn set_field(&self, index: usize, value: Value) -> Result<(), MockError> {
        let mut fields = self.fields.write();
        let count = fields.len();
        match fields.get_mut(index) {
            Some(slot) => {
                *slot = value;
                Ok(())
            }
            None => Err(MockError::FieldIndex { index, count }),
        }
    }

    /// Snapshot all field values.
    pub fn snapshot_fields(&self) -> Vec<Value> {
        self.fields.read().clone()
    }

    /// Overwrite the whole field vector (spy state copy).
    pub(crate) fn overwrite_fields(&self, values: Vec<Value>) {
        *self.fields.write() = values;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ClassBuilder, FieldDef};

    #[test]
    fn test_handles_are_unique() {
        let registry = ClassRegistry::new();
        let class = ClassBuilder::class("Foo").register(&registry);
        let a = Instance::allocate(&registry, class);
        let b = Instance::allocate(&registry, class);
        assert_ne!(a.handle(), b.handle());
    }

    #[test]
    fn test_allocate_uses_field_defaults() {
        let registry = ClassRegistry::new();
        let class = ClassBuilder::class("Point")
            .field(FieldDef::new("x", "i32").with_default(Value::I32(7)))
            .field(FieldDef::new("y", "i32"))
            .register(&registry);
        let instance = Instance::allocate(&registry, class);
        assert_eq!(instance.field_count(), 2);
        assert_eq!(instance.get_field(0), Some(Value::I32(7)));
        assert_eq!(instance.get_field(1), Some(Value::Null));
    }

    #[test]
    fn test_allocate_bypasses_throwing_constructor() {
        let registry = ClassRegistry::new();
        let class = ClassBuilder::class("NonConstructable")
            .constructor(|_, _| Err(Thrown::new("constructor must not run")))
            .register(&registry);
        let instance = Instance::allocate(&registry, class);
        assert_eq!(instance.field_count(), 0);
    }

    #[test]
    fn test_construct_runs_constructor() {
        let registry = ClassRegistry::new();
        let class = ClassBuilder::class("Named")
            .field(FieldDef::new("name", "String"))
            .constructor(|fields, args| {
                fields[0] = args[0].clone();
                Ok(())
            })
            .register(&registry);
        let instance = Instance::construct(&registry, class, &[Value::str("seed")]).unwrap();
        assert_eq!(instance.get_field(0), Some(Value::str("seed")));
    }

    #[test]
    fn test_construct_propagates_thrown() {
        let registry = ClassRegistry::new();
        let class = ClassBuilder::class("Failing")
            .constructor(|_, _| Err(Thrown::new("fatal")))
            .register(&registry);
        let err = Instance::construct(&registry, class, &[]).unwrap_err();
        assert_eq!(err.message, "fatal");
    }

    #[test]
    fn test_set_field_bounds() {
        let registry = ClassRegistry::new();
        let class = ClassBuilder::class("One")
            .field(FieldDef::new("v", "i32"))
            .register(&registry);
        let instance = Instance::allocate(&registry, class);
        assert!(instance.set_field(0, Value::I32(1)).is_ok());
        assert!(matches!(
            instance.set_field(5, Value::I32(1)),
            Err(MockError::FieldIndex { index: 5, count: 1 })
        ));
    }
}
