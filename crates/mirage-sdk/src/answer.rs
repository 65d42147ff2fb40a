//! Answer strategies — compute a handler's return value.
//!
//! An [`Answer`] is the stubbing-side collaborator: given an intercepted
//! invocation, it produces the call's outcome. [`AnsweringHandler`] adapts
//! an answer into a [`MockHandler`] so a mock can be driven by a single
//! default answer.

use std::sync::Arc;

use crate::handler::{Invocation, MockHandler};
use crate::thrown::CallResult;
use crate::value::Value;

/// Strategy computing the outcome of an intercepted call.
pub trait Answer: Send + Sync {
    /// Produce the call's result.
    fn answer(&self, invocation: &mut dyn Invocation) -> CallResult;
}

/// Answer returning a fixed value for every call.
pub struct ReturnsAnswer {
    value: Value,
}

impl ReturnsAnswer {
    /// Create an answer that always returns `value`.
    pub fn new(value: Value) -> Self {
        Self { value }
    }
}

impl Answer for ReturnsAnswer {
    fn answer(&self, _invocation: &mut dyn Invocation) -> CallResult {
        Ok(self.value.clone())
    }
}

/// Answer delegating every call to the real method body.
///
/// This is the default behavior of spies: the call runs the original
/// implementation, and anything it throws propagates unwrapped.
pub struct CallsRealMethods;

impl Answer for CallsRealMethods {
    fn answer(&self, invocation: &mut dyn Invocation) -> CallResult {
        invocation.call_real()
    }
}

/// Handler driven by a single answer strategy.
pub struct AnsweringHandler {
    answer: Arc<dyn Answer>,
}

impl AnsweringHandler {
    /// Create a handler that consults `answer` for every call.
    pub fn new(answer: Arc<dyn Answer>) -> Self {
        Self { answer }
    }
}

impl MockHandler for AnsweringHandler {
    fn handle(&self, invocation: &mut dyn Invocation) -> CallResult {
        self.answer.answer(invocation)
    }
}
