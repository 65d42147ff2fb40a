//! Subclass-generation strategy.
//!
//! For open classes and interfaces the synthesizer registers a fresh class
//! extending (or implementing) the target, with every non-final resolved
//! method replaced by an intercepted override that keeps the original body
//! for real-call dispatch. The target itself is left untouched.

use std::sync::atomic::{AtomicU64, Ordering};

use rustc_hash::FxHashSet;

use crate::error::MockError;
use crate::types::{
    resolve_methods, ClassDef, ClassId, ClassRegistry, MethodBody, MethodDef,
};

use super::settings::{MockCreationSettings, SerializableMode};

/// Counter making generated class names unique across all makers.
static NEXT_MOCK_SEQ: AtomicU64 = AtomicU64::new(1);

/// Register a synthesized subclass of `target` and return its id.
pub(crate) fn generate(
    registry: &ClassRegistry,
    target: ClassId,
    settings: &MockCreationSettings,
) -> Result<ClassId, MockError> {
    let target_def = registry.get(target).ok_or(MockError::UnknownClass(target))?;

    let mut interfaces: Vec<ClassId> = Vec::new();
    let superclass = if target_def.is_interface {
        interfaces.push(target);
        None
    } else {
        Some(target)
    };
    for &extra in settings.extra_interfaces() {
        if registry.get(extra).is_none() {
            return Err(MockError::UnknownClass(extra));
        }
        interfaces.push(extra);
    }

    // One intercepted override per method name; the leaf-first resolution
    // order means the winning definition's body is the one kept for real
    // calls. Final methods keep their original dispatch.
    let mut methods: Vec<MethodDef> = Vec::new();
    let mut overridden: FxHashSet<String> = FxHashSet::default();
    for resolved in resolve_methods(registry, target) {
        if resolved.is_final || resolved.is_bridge {
            continue;
        }
        if !overridden.insert(resolved.name.clone()) {
            continue;
        }
        let Some(declaring) = registry.get(resolved.declaring) else {
            continue;
        };
        let original = &declaring.methods[resolved.index];
        methods.push(MethodDef {
            name: original.name.clone(),
            params: original.params.clone(),
            return_type: original.return_type.clone(),
            erased: original.erased.clone(),
            is_final: false,
            body: MethodBody::Intercepted {
                real: original.body.real_fn(),
            },
        });
    }

    let name = format!(
        "{}$Mock${}",
        target_def.name,
        NEXT_MOCK_SEQ.fetch_add(1, Ordering::Relaxed)
    );
    let serializable = settings.serializable_mode() != SerializableMode::None;
    let constants = target_def.constants.clone();

    Ok(registry.register_class(|id| {
        ClassDef::assemble(
            id,
            name,
            superclass,
            interfaces,
            Vec::new(),
            methods,
            constants,
            false,
            false,
            true,
            serializable,
            Some(target),
            None,
        )
    }))
}
