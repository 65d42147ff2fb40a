//! Mock creation settings.

use std::fmt;
use std::sync::Arc;

use mirage_sdk::{Answer, ReturnsAnswer, Value};

use crate::types::{ClassId, TypeDesc};

/// How instances of the synthesized type serialize.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SerializableMode {
    /// No serialization support (the default).
    #[default]
    None,
    /// Serializable within the creating registry.
    Basic,
    /// Serializable across registry boundaries.
    AcrossRegistries,
}

/// Settings describing the mock to synthesize.
pub struct MockCreationSettings {
    type_to_mock: TypeDesc,
    extra_interfaces: Vec<ClassId>,
    serializable_mode: SerializableMode,
    default_answer: Arc<dyn Answer>,
}

impl MockCreationSettings {
    /// Settings for mocking `type_to_mock` with no extras: no additional
    /// interfaces, no serialization, a null-returning default answer.
    pub fn new(type_to_mock: TypeDesc) -> Self {
        Self {
            type_to_mock,
            extra_interfaces: Vec::new(),
            serializable_mode: SerializableMode::None,
            default_answer: Arc::new(ReturnsAnswer::new(Value::Null)),
        }
    }

    /// Add an interface the synthesized type implements beyond the target's
    /// own.
    pub fn extra_interface(mut self, interface: ClassId) -> Self {
        self.extra_interfaces.push(interface);
        self
    }

    /// Set the serialization mode.
    pub fn serializable(mut self, mode: SerializableMode) -> Self {
        self.serializable_mode = mode;
        self
    }

    /// Set the default answer consulted when no handler overrides a call.
    pub fn default_answer(mut self, answer: Arc<dyn Answer>) -> Self {
        self.default_answer = answer;
        self
    }

    /// The type being mocked.
    pub fn type_to_mock(&self) -> &TypeDesc {
        &self.type_to_mock
    }

    /// Interfaces the synthesized type implements beyond the target's own.
    pub fn extra_interfaces(&self) -> &[ClassId] {
        &self.extra_interfaces
    }

    /// The serialization mode.
    pub fn serializable_mode(&self) -> SerializableMode {
        self.serializable_mode
    }

    /// The default answer.
    pub fn answer(&self) -> Arc<dyn Answer> {
        self.default_answer.clone()
    }
}

impl fmt::Debug for MockCreationSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MockCreationSettings")
            .field("type_to_mock", &self.type_to_mock)
            .field("extra_interfaces", &self.extra_interfaces)
            .field("serializable_mode", &self.serializable_mode)
            .finish()
    }
}
