//! In-place transformation strategy.
//!
//! Sealed classes cannot be subclassed, so the synthesizer rewrites the
//! target's own method tables instead: every method of the class and of
//! its whole superclass chain becomes intercepted, with the original body
//! retained for real-call dispatch. Existing instances observe the new
//! tables on their next dispatch; instances without a registered handler
//! run the retained bodies and behave as before.

use std::sync::Arc;

use crate::error::MockError;
use crate::types::{ClassDef, ClassId, ClassRegistry, MethodBody, MethodDef};

use super::settings::{MockCreationSettings, SerializableMode};

/// Rewrite `target` and its superclass chain for interception.
///
/// Serialization and extra interfaces cannot be expressed by rewriting an
/// existing class, so settings requesting either are rejected up front,
/// before any class is touched.
pub(crate) fn transform(
    registry: &ClassRegistry,
    target: ClassId,
    settings: &MockCreationSettings,
) -> Result<(), MockError> {
    let target_def = registry.get(target).ok_or(MockError::UnknownClass(target))?;

    if settings.serializable_mode() != SerializableMode::None
        || !settings.extra_interfaces().is_empty()
    {
        return Err(MockError::UnsupportedSettings {
            type_name: target_def.name.clone(),
        });
    }

    let chain = registry.superclass_chain(target);
    for &class_id in &chain {
        let class = registry.get(class_id).ok_or(MockError::UnknownClass(class_id))?;
        if !class.modifiable {
            return Err(MockError::CannotModify {
                type_name: class.name.clone(),
            });
        }
    }

    for class_id in chain {
        let class = registry.get(class_id).ok_or(MockError::UnknownClass(class_id))?;
        if class.methods.iter().all(|m| m.body.is_intercepted()) {
            continue;
        }
        let methods: Vec<MethodDef> = class
            .methods
            .iter()
            .map(|m| MethodDef {
                name: m.name.clone(),
                params: m.params.clone(),
                return_type: m.return_type.clone(),
                erased: m.erased.clone(),
                is_final: m.is_final,
                body: match &m.body {
                    MethodBody::Intercepted { real } => MethodBody::Intercepted {
                        real: real.clone(),
                    },
                    other => MethodBody::Intercepted {
                        real: other.real_fn(),
                    },
                },
            })
            .collect();
        let rewritten = ClassDef::assemble(
            class.id,
            class.name.clone(),
            class.superclass,
            class.interfaces.clone(),
            class.fields.clone(),
            methods,
            class.constants.clone(),
            class.is_interface,
            class.is_sealed,
            class.modifiable,
            class.serializable,
            class.synthesized_from,
            class.constructor.clone(),
        );
        registry.replace(class_id, Arc::new(rewritten));
    }

    Ok(())
}
