//! Method resolution: an explicit hierarchy walk producing the resolved
//! method table the synthesizer intercepts.
//!
//! Overriding is keyed on name plus erased signature, so a generic
//! supertype method inherited without an override resolves to its declaring
//! ancestor instead of being shadowed. When a subclass overrides a generic
//! method with a specialized signature, the ancestor's erased entry is kept
//! as a bridge so erased-signature call sites still reach the override.

use rustc_hash::FxHashSet;

use super::class::ClassId;
use super::registry::ClassRegistry;

/// One entry of a class's resolved method table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedMethod {
    /// Class that declared the winning definition
    pub declaring: ClassId,
    /// Index into the declaring class's `methods`
    pub index: usize,
    /// Method name
    pub name: String,
    /// Erased signature the entry is keyed on
    pub erased_signature: String,
    /// Whether this entry bridges an erased signature to a specialized
    /// override declared lower in the hierarchy
    pub is_bridge: bool,
    /// Whether the winning definition is final
    pub is_final: bool,
}

/// Walk the hierarchy of `class` and produce its resolved method table.
///
/// Classes are visited leaf-first along the superclass chain, then every
/// reachable interface. The first definition seen for a given
/// (name, erased signature) pair wins.
pub fn resolve_methods(registry: &ClassRegistry, class: ClassId) -> Vec<ResolvedMethod> {
    let mut order: Vec<ClassId> = registry.superclass_chain(class);
    order.extend(registry.all_interfaces(class));

    let mut out: Vec<ResolvedMethod> = Vec::new();
    let mut seen: FxHashSet<(String, String)> = FxHashSet::default();

    for class_id in order {
        let Some(def) = registry.get(class_id) else {
            continue;
        };
        for (index, method) in def.methods.iter().enumerate() {
            let erased = method.erased_signature();
            let key = (method.name.clone(), erased.clone());
            if seen.contains(&key) {
                continue;
            }
            // An ancestor's generic method whose erasure differs from an
            // already-resolved same-name entry acts as a bridge to that
            // specialized override.
            let is_bridge = method.is_generic()
                && out
                    .iter()
                    .any(|r| r.name == method.name && r.erased_signature != erased);
            out.push(ResolvedMethod {
                declaring: class_id,
                index,
                name: method.name.clone(),
                erased_signature: erased,
                is_bridge,
                is_final: method.is_final,
            });
            seen.insert(key);
        }
    }

    out
}
