//! Mirage SDK - Lightweight SDK for writing mock handlers and answers
//!
//! This crate provides the minimal types and traits needed to implement
//! mock handlers and answer strategies without depending on the full
//! mirage-engine.
//!
//! # Example
//!
//! ```ignore
//! use mirage_sdk::{Answer, AnsweringHandler, ReturnsAnswer, Value};
//! use std::sync::Arc;
//!
//! let answer = Arc::new(ReturnsAnswer::new(Value::str("bar")));
//! let handler = Arc::new(AnsweringHandler::new(answer));
//! // pass `handler` to the engine's create_mock
//! ```

#![warn(missing_docs)]

pub mod answer;
pub mod handler;
pub mod thrown;
pub mod value;

pub use answer::{Answer, AnsweringHandler, CallsRealMethods, ReturnsAnswer};
pub use handler::{DisabledHandler, Invocation, MockHandler};
pub use thrown::{CallResult, StackFrame, Thrown};
pub use value::{InstanceHandle, Value};
