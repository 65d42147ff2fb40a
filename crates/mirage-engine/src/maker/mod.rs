//! The mock maker facade.
//!
//! Ties the analyzer, the two synthesis strategies, the instance heap and
//! the interception registry together behind one entry point. A maker owns
//! its class and mock registries; independent makers are fully isolated
//! and can be exercised from parallel tests without interfering.

mod inline;
mod settings;
mod subclass;

pub use settings::{MockCreationSettings, SerializableMode};

use std::path::{Path, PathBuf};
use std::sync::Arc;

use mirage_sdk::{AnsweringHandler, CallResult, MockHandler, Value};

use crate::dispatch::{Dispatcher, MockRegistry};
use crate::error::MockError;
use crate::instance::{Instance, InstanceRef};
use crate::mockability::{is_type_mockable, TypeMockability};
use crate::types::{ClassRegistry, TypeDesc};

/// Facade over mock creation, spying, and handler lifecycle.
#[derive(Debug)]
pub struct MockMaker {
    classes: Arc<ClassRegistry>,
    mocks: Arc<MockRegistry>,
    artifact_location: Option<PathBuf>,
}

impl Default for MockMaker {
    fn default() -> Self {
        Self::new()
    }
}

impl MockMaker {
    /// Create a maker with its own empty class registry.
    pub fn new() -> Self {
        Self::with_classes(Arc::new(ClassRegistry::new()))
    }

    /// Create a maker over an existing class registry.
    pub fn with_classes(classes: Arc<ClassRegistry>) -> Self {
        Self {
            classes,
            mocks: Arc::new(MockRegistry::new()),
            artifact_location: None,
        }
    }

    /// The class registry this maker synthesizes into.
    pub fn classes(&self) -> &Arc<ClassRegistry> {
        &self.classes
    }

    /// The instance-to-handler registry.
    pub fn mocks(&self) -> &Arc<MockRegistry> {
        &self.mocks
    }

    /// Set the output location for persisted generated class definitions.
    pub fn with_artifact_location(mut self, location: impl Into<PathBuf>) -> Self {
        self.artifact_location = Some(location.into());
        self
    }

    /// The configured artifact output location. There is no default: asking
    /// for one before configuring it is an error, never a guessed path.
    pub fn artifact_location(&self) -> Result<&Path, MockError> {
        self.artifact_location
            .as_deref()
            .ok_or(MockError::NoArtifactLocation)
    }

    /// Analyze whether `ty` can be mocked, and if not, why.
    pub fn is_type_mockable(&self, ty: &TypeDesc) -> TypeMockability {
        is_type_mockable(&self.classes, ty)
    }

    /// Create a mock of the type in `settings`, driven by `handler`.
    pub fn create_mock(
        &self,
        settings: &MockCreationSettings,
        handler: Arc<dyn MockHandler>,
    ) -> Result<InstanceRef, MockError> {
        let mock = self.synthesize(settings)?;
        self.mocks.register(&mock, handler);
        Ok(mock)
    }

    /// Create a mock driven by the settings' default answer.
    pub fn create_answered_mock(
        &self,
        settings: &MockCreationSettings,
    ) -> Result<InstanceRef, MockError> {
        let handler = Arc::new(AnsweringHandler::new(settings.answer()));
        self.create_mock(settings, handler)
    }

    /// Create a spy: a mock carrying a copy of `seed`'s field state.
    ///
    /// Returns `Ok(None)` when the seed cannot serve as a state source: it
    /// was allocated against a different class registry, or its field
    /// layout does not match the synthesized type's. The handler is only
    /// attached after the state copy, so no call is ever intercepted on a
    /// half-copied spy.
    pub fn create_spy(
        &self,
        settings: &MockCreationSettings,
        handler: Arc<dyn MockHandler>,
        seed: &InstanceRef,
    ) -> Result<Option<InstanceRef>, MockError> {
        let spy = self.synthesize(settings)?;
        if seed.registry_id() != self.classes.registry_id()
            || seed.field_count() != spy.field_count()
        {
            return Ok(None);
        }
        spy.overwrite_fields(seed.snapshot_fields());
        self.mocks.register(&spy, handler);
        Ok(Some(spy))
    }

    /// Current handler of `instance`, or `None` if it is not a mock known
    /// to this maker.
    pub fn get_handler(&self, instance: &InstanceRef) -> Option<Arc<dyn MockHandler>> {
        self.mocks.get_handler(instance)
    }

    /// Detach `instance`'s handler, leaving the disabled placeholder.
    pub fn clear_mock(&self, instance: &InstanceRef) {
        self.mocks.clear_mock(instance);
    }

    /// Detach every registered handler.
    pub fn clear_all_mocks(&self) {
        self.mocks.clear_all_mocks();
    }

    /// Invoke `method` on `receiver` through the interception layer.
    pub fn invoke(&self, receiver: &InstanceRef, method: &str, args: &[Value]) -> CallResult {
        Dispatcher::new(&self.classes, &self.mocks).invoke(receiver, method, args)
    }

    /// Run analysis, pick a strategy, and allocate the unregistered mock.
    fn synthesize(&self, settings: &MockCreationSettings) -> Result<InstanceRef, MockError> {
        match settings.type_to_mock() {
            TypeDesc::Array(_) => Err(MockError::ArrayType),
            ty @ TypeDesc::Primitive(_) => Err(MockError::CannotModify {
                type_name: ty.display_name(&self.classes),
            }),
            ty @ (TypeDesc::Wrapper(_) | TypeDesc::Str | TypeDesc::Meta) => {
                let mockability = is_type_mockable(&self.classes, ty);
                Err(MockError::Unmockable {
                    reason: mockability.non_mockable_reason().to_string(),
                })
            }
            TypeDesc::Class(id) => {
                let target = self
                    .classes
                    .get(*id)
                    .ok_or(MockError::UnknownClass(*id))?;
                if !target.modifiable {
                    return Err(MockError::CannotModify {
                        type_name: target.name.clone(),
                    });
                }
                if target.is_sealed {
                    inline::transform(&self.classes, *id, settings)?;
                    Ok(Instance::allocate_mock(&self.classes, *id))
                } else {
                    let mock_class = subclass::generate(&self.classes, *id, settings)?;
                    Ok(Instance::allocate_mock(&self.classes, mock_class))
                }
            }
        }
    }
}
