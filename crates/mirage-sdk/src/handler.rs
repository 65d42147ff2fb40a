//! MockHandler trait — the interception dispatch interface.
//!
//! The engine routes every intercepted method call to the `MockHandler`
//! registered for the receiver. Handler implementations compile against the
//! SDK alone; the engine supplies the concrete [`Invocation`] at dispatch
//! time.

use std::sync::Arc;

use once_cell::sync::Lazy;

use crate::thrown::CallResult;
use crate::value::{InstanceHandle, Value};

/// One intercepted method call.
///
/// Implemented by the engine; exposes the calling context to the handler,
/// including a way to run the original (real) method body.
pub trait Invocation {
    /// Handle of the receiver instance.
    fn receiver(&self) -> InstanceHandle;

    /// Name of the invoked method.
    fn method_name(&self) -> &str;

    /// Erased signature of the invoked method.
    fn signature(&self) -> &str;

    /// Declared parameter names, in order.
    fn parameter_names(&self) -> Vec<String>;

    /// Raw arguments of the call.
    fn arguments(&self) -> &[Value];

    /// Whether a real (non-abstract) implementation exists for this method.
    fn has_real_implementation(&self) -> bool;

    /// Invoke the original method body.
    ///
    /// Fails with a throwable when the method is abstract or declared on an
    /// interface with no implementation.
    fn call_real(&mut self) -> CallResult;
}

/// Pluggable policy deciding each intercepted call's outcome.
///
/// Exactly one handler is associated with a given mock instance at any
/// time. Whatever the handler returns or throws propagates verbatim to the
/// caller.
pub trait MockHandler: Send + Sync {
    /// Compute the outcome of one intercepted call.
    fn handle(&self, invocation: &mut dyn Invocation) -> CallResult;
}

/// Inert handler installed by `clear_mock` / `clear_all_mocks`.
///
/// A mock mapped to this handler is treated by the dispatcher as if it were
/// not a mock at all: calls run the real body when one exists and otherwise
/// produce `Value::Null`. The handler never recurses into mock machinery.
pub struct DisabledHandler {
    _priv: (),
}

static DISABLED: Lazy<Arc<DisabledHandler>> = Lazy::new(|| Arc::new(DisabledHandler { _priv: () }));

impl DisabledHandler {
    /// The process-wide singleton, as a handler.
    pub fn handler() -> Arc<dyn MockHandler> {
        DISABLED.clone()
    }

    /// Whether `handler` is the disabled singleton.
    pub fn is_disabled(handler: &Arc<dyn MockHandler>) -> bool {
        Arc::as_ptr(handler) as *const () == Arc::as_ptr(&*DISABLED) as *const ()
    }
}

impl MockHandler for DisabledHandler {
    fn handle(&self, _invocation: &mut dyn Invocation) -> CallResult {
        Ok(Value::Null)
    }
}
