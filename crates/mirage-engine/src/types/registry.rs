//! Concurrent class registry.
//!
//! Classes are stored as `Arc<ClassDef>` behind a concurrent map so lookups
//! never block each other. In-place transformation swaps the stored `Arc`;
//! instances reference classes by id, so every instance of a transformed
//! class observes the new method table on its next dispatch.

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;

use dashmap::DashMap;

use mirage_sdk::Value;

use super::class::{ClassDef, ClassId, ParamInfo};

/// Global counter distinguishing independent registries.
///
/// Registry ids act as the isolation boundary token: a spy seed carrying a
/// foreign registry id cannot have its fields copied.
static NEXT_REGISTRY_ID: AtomicU64 = AtomicU64::new(1);

/// One slot of a flattened instance field layout.
#[derive(Debug, Clone)]
pub struct FieldSlot {
    /// Class that declared the field
    pub declaring: ClassId,
    /// Field name
    pub name: String,
    /// Field type name
    pub type_name: String,
    /// Default value assigned at allocation
    pub default: Value,
}

/// Registry of class definitions, keyed by id.
#[derive(Debug)]
pub struct ClassRegistry {
    registry_id: u64,
    classes: DashMap<ClassId, Arc<ClassDef>>,
    next_id: AtomicUsize,
}

impl Default for ClassRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ClassRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            registry_id: NEXT_REGISTRY_ID.fetch_add(1, Ordering::Relaxed),
            classes: DashMap::new(),
            next_id: AtomicUsize::new(0),
        }
    }

    /// Unique id of this registry.
    pub fn registry_id(&self) -> u64 {
        self.registry_id
    }

    /// Allocate an id and register the class produced by `build`.
    pub(crate) fn register_class(&self, build: impl FnOnce(ClassId) -> ClassDef) -> ClassId {
        let id = ClassId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.classes.insert(id, Arc::new(build(id)));
        id
    }

    /// Look up a class by id.
    pub fn get(&self, id: ClassId) -> Option<Arc<ClassDef>> {
        self.classes.get(&id).map(|entry| entry.value().clone())
    }

    /// Replace a class definition in place (in-place transformation).
    pub(crate) fn replace(&self, id: ClassId, class: Arc<ClassDef>) {
        self.classes.insert(id, class);
    }

    /// Number of registered classes.
    pub fn len(&self) -> usize {
        self.classes.len()
    }

    /// Whether the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }

    /// Superclass chain starting at `id` (leaf first, root last).
    ///
    /// Stops on a dangling superclass id rather than failing; the dangling
    /// id is simply not included.
    pub fn superclass_chain(&self, id: ClassId) -> Vec<ClassId> {
        let mut chain = Vec::new();
        let mut current = Some(id);
        while let Some(class_id) = current {
            match self.get(class_id) {
                Some(class) => {
                    chain.push(class_id);
                    current = class.superclass;
                }
                None => break,
            }
        }
        chain
    }

    /// All interfaces reachable from `id` (declared on the class, its
    /// ancestors, and transitively on the interfaces themselves).
    pub fn all_interfaces(&self, id: ClassId) -> Vec<ClassId> {
        let mut out = Vec::new();
        let mut queue: Vec<ClassId> = Vec::new();
        for class_id in self.superclass_chain(id) {
            if let Some(class) = self.get(class_id) {
                queue.extend(class.interfaces.iter().copied());
            }
        }
        while let Some(iface_id) = queue.pop() {
            if out.contains(&iface_id) {
                continue;
            }
            if let Some(iface) = self.get(iface_id) {
                out.push(iface_id);
                queue.extend(iface.interfaces.iter().copied());
            }
        }
        out
    }

    /// Flattened instance field layout: inherited fields first (root-most
    /// ancestor at offset zero), declared fields last.
    pub fn field_layout(&self, id: ClassId) -> Vec<FieldSlot> {
        let mut chain = self.superclass_chain(id);
        chain.reverse();
        let mut layout = Vec::new();
        for class_id in chain {
            if let Some(class) = self.get(class_id) {
                for field in &class.fields {
                    layout.push(FieldSlot {
                        declaring: class_id,
                        name: field.name.clone(),
                        type_name: field.type_name.clone(),
                        default: field.default.clone(),
                    });
                }
            }
        }
        layout
    }

    /// Total instance field count, inherited fields included.
    pub fn field_count(&self, id: ClassId) -> usize {
        self.field_layout(id).len()
    }

    /// Offset of a field in the flattened layout. Shadowing fields declared
    /// closer to the leaf win.
    pub fn field_offset(&self, id: ClassId, name: &str) -> Option<usize> {
        self.field_layout(id)
            .iter()
            .rposition(|slot| slot.name == name)
    }

    /// Declared parameter metadata of a method, searching the hierarchy
    /// leaf-first.
    pub fn method_parameters(&self, id: ClassId, method: &str) -> Option<Vec<ParamInfo>> {
        for class_id in self.superclass_chain(id) {
            if let Some(class) = self.get(class_id) {
                if let Some(def) = class.declared_method(method) {
                    return Some(def.params.clone());
                }
            }
        }
        for iface_id in self.all_interfaces(id) {
            if let Some(iface) = self.get(iface_id) {
                if let Some(def) = iface.declared_method(method) {
                    return Some(def.params.clone());
                }
            }
        }
        None
    }

    /// Resolve a constant-pool entry, computing dynamic entries on first use.
    pub fn resolve_constant(&self, id: ClassId, index: usize) -> Option<Value> {
        self.get(id)
            .and_then(|class| class.constants.get(index).map(|c| c.resolve()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::class::{ClassBuilder, FieldDef, MethodDef};

    #[test]
    fn test_registry_ids_are_unique() {
        let a = ClassRegistry::new();
        let b = ClassRegistry::new();
        assert_ne!(a.registry_id(), b.registry_id());
    }

    #[test]
    fn test_register_and_get() {
        let registry = ClassRegistry::new();
        let id = ClassBuilder::class("Foo").register(&registry);
        let class = registry.get(id).unwrap();
        assert_eq!(class.name, "Foo");
        assert_eq!(registry.len(), 1);
        assert!(registry.get(ClassId(99)).is_none());
    }

    #[test]
    fn test_field_layout_flattens_hierarchy() {
        let registry = ClassRegistry::new();
        let base = ClassBuilder::class("Base")
            .field(FieldDef::new("p1", "instance"))
            .register(&registry);
        let derived = ClassBuilder::class("Derived")
            .extends(base)
            .field(FieldDef::new("p2", "instance"))
            .register(&registry);

        let layout = registry.field_layout(derived);
        assert_eq!(layout.len(), 2);
        assert_eq!(layout[0].name, "p1");
        assert_eq!(layout[0].declaring, base);
        assert_eq!(layout[1].name, "p2");
        assert_eq!(registry.field_offset(derived, "p2"), Some(1));
        assert_eq!(registry.field_offset(derived, "missing"), None);
    }

    #[test]
    fn test_superclass_chain_order() {
        let registry = ClassRegistry::new();
        let root = ClassBuilder::class("Root").register(&registry);
        let mid = ClassBuilder::class("Mid").extends(root).register(&registry);
        let leaf = ClassBuilder::class("Leaf").extends(mid).register(&registry);
        assert_eq!(registry.superclass_chain(leaf), vec![leaf, mid, root]);
    }

    #[test]
    fn test_all_interfaces_transitive() {
        let registry = ClassRegistry::new();
        let base_iface = ClassBuilder::interface("BaseIface").register(&registry);
        let iface = ClassBuilder::interface("Iface")
            .implements(base_iface)
            .register(&registry);
        let class = ClassBuilder::class("Impl")
            .implements(iface)
            .register(&registry);

        let interfaces = registry.all_interfaces(class);
        assert!(interfaces.contains(&iface));
        assert!(interfaces.contains(&base_iface));
    }

    #[test]
    fn test_method_parameters_lookup() {
        let registry = ClassRegistry::new();
        let id = ClassBuilder::class("WithParams")
            .method(MethodDef::new("foo").param("bar", "String"))
            .register(&registry);
        let params = registry.method_parameters(id, "foo").unwrap();
        assert_eq!(params.len(), 1);
        assert_eq!(params[0].name, "bar");
        assert!(registry.method_parameters(id, "missing").is_none());
    }
}
