//! Error types for mock creation.
//!
//! All failures here are structural decision failures surfaced synchronously
//! to the creation caller; nothing is retried. Dispatch-time failures travel
//! as `Thrown` instead and are never wrapped in these variants.

use crate::types::ClassId;

/// Errors raised by the mockability analyzer gate and the synthesizer.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MockError {
    /// The analyzer rejected the type; the reason string is reported verbatim.
    #[error("Cannot mock type: {reason}")]
    Unmockable {
        /// The analyzer's non-mockable reason
        reason: String,
    },

    /// Array types cannot be synthesized at all.
    #[error("Arrays cannot be mocked")]
    ArrayType,

    /// The target class (or one of its ancestors) cannot be structurally
    /// modified.
    #[error("Could not modify all classes [{type_name}]")]
    CannotModify {
        /// Name of the offending type
        type_name: String,
    },

    /// The in-place transformation strategy cannot honor the requested
    /// settings combination.
    #[error("Unsupported settings with this type '{type_name}': serialization and extra interfaces are not supported with in-place class transformation")]
    UnsupportedSettings {
        /// Name of the type requiring in-place transformation
        type_name: String,
    },

    /// Settings referenced a class id that is not present in the registry.
    #[error("Unknown class id {0:?}")]
    UnknownClass(ClassId),

    /// Field index outside the instance's layout.
    #[error("Field index {index} out of bounds (instance has {count} fields)")]
    FieldIndex {
        /// Requested index
        index: usize,
        /// Number of fields in the layout
        count: usize,
    },

    /// Generated-artifact persistence was requested without an explicit
    /// output location.
    #[error("No artifact location configured: generated class definitions require an explicit output location, none is defaulted")]
    NoArtifactLocation,
}
