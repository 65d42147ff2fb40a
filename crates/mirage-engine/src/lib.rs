//! Mirage Mock Engine Core
//!
//! This crate provides the mock creation and dispatch engine:
//! - Mockability analysis for arbitrary type descriptors
//! - Proxy/spy synthesis (subclass generation and in-place transformation)
//! - Call interception with a process-wide instance-to-handler registry
//! - Stack trace normalization for recursive self-dispatch
//! - Handler lifecycle management (attach / clear / clear-all)
//!
//! Settings objects, answer strategies, and handler implementations live in
//! `mirage-sdk`; the engine consumes them through traits.

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

pub mod dispatch;
pub mod error;
pub mod instance;
pub mod maker;
pub mod mockability;
pub mod stacktrace;
pub mod types;

// Re-export SDK types (canonical definitions live in mirage-sdk)
pub use mirage_sdk::{
    Answer, AnsweringHandler, CallResult, CallsRealMethods, DisabledHandler, InstanceHandle,
    Invocation, MockHandler, ReturnsAnswer, StackFrame, Thrown, Value,
};

pub use dispatch::{Dispatcher, MockRegistry};
pub use error::MockError;
pub use instance::{Instance, InstanceRef};
pub use maker::{MockCreationSettings, MockMaker, SerializableMode};
pub use mockability::{is_type_mockable, TypeMockability};
pub use stacktrace::remove_recursive_calls;
pub use types::{
    resolve_methods, ClassBuilder, ClassDef, ClassId, ClassRegistry, Constant, FieldDef,
    MethodBody, MethodDef, MethodFn, ParamInfo, PrimitiveKind, ResolvedMethod, TypeDesc,
};
