//! Call interception and dispatch.
//!
//! Every method call on an instance of a mock-bearing class funnels through
//! [`Dispatcher::invoke`]. Intercepted methods consult the instance's
//! registered handler; real method bodies run directly. A throwable raised
//! through a real-method call chain has its frame sequence normalized
//! before it reaches the caller.

mod invocation;
mod registry;

pub use invocation::InterceptedInvocation;
pub use registry::MockRegistry;

use std::sync::Arc;

use mirage_sdk::{CallResult, DisabledHandler, StackFrame, Thrown, Value};

use crate::instance::InstanceRef;
use crate::stacktrace::remove_recursive_calls;
use crate::types::{ClassDef, ClassRegistry, MethodBody, MethodFn};

/// Type name the dispatcher's own synthetic frames carry.
pub const DISPATCHER_TYPE: &str = "mirage_engine::dispatch::Dispatcher";

/// Borrowed view over the class and mock registries, driving one or more
/// nested dispatches.
pub struct Dispatcher<'a> {
    classes: &'a ClassRegistry,
    mocks: &'a MockRegistry,
}

impl<'a> Dispatcher<'a> {
    /// Create a dispatcher over the given registries.
    pub fn new(classes: &'a ClassRegistry, mocks: &'a MockRegistry) -> Self {
        Self { classes, mocks }
    }

    /// The class registry this dispatcher resolves against.
    pub fn classes(&self) -> &ClassRegistry {
        self.classes
    }

    /// Invoke `method` on `receiver` with `args`.
    pub fn invoke(&self, receiver: &InstanceRef, method: &str, args: &[Value]) -> CallResult {
        let class = self.classes.get(receiver.class_id()).ok_or_else(|| {
            Thrown::new(format!(
                "Unknown class id {} for instance #{}",
                receiver.class_id().as_usize(),
                receiver.handle().as_u64()
            ))
        })?;
        let (declaring, index) = self.find_method(&class, method).ok_or_else(|| {
            Thrown::new(format!("No such method '{}' on '{}'", method, class.name))
        })?;
        let def = &declaring.methods[index];
        match &def.body {
            MethodBody::Real(f) => f(self, receiver, args),
            MethodBody::Abstract => Err(Thrown::new(format!(
                "Cannot invoke abstract method '{}' on '{}'",
                method, class.name
            ))),
            MethodBody::Intercepted { real } => self.dispatch_intercepted(
                receiver,
                frame_type_name(self.classes, &class),
                def.name.clone(),
                def.erased_signature(),
                def.params.clone(),
                real.clone(),
                args,
            ),
        }
    }

    /// Walk the receiver class's hierarchy for a method by name: the
    /// superclass chain leaf-first, then reachable interfaces.
    fn find_method(&self, class: &Arc<ClassDef>, method: &str) -> Option<(Arc<ClassDef>, usize)> {
        for class_id in self.classes.superclass_chain(class.id) {
            if let Some(def) = self.classes.get(class_id) {
                if let Some(index) = def.declared_method_index(method) {
                    return Some((def, index));
                }
            }
        }
        for iface_id in self.classes.all_interfaces(class.id) {
            if let Some(def) = self.classes.get(iface_id) {
                if let Some(index) = def.declared_method_index(method) {
                    return Some((def, index));
                }
            }
        }
        None
    }

    #[allow(clippy::too_many_arguments)]
    fn dispatch_intercepted(
        &self,
        receiver: &InstanceRef,
        frame_type: String,
        method_name: String,
        signature: String,
        params: Vec<crate::types::ParamInfo>,
        real: Option<MethodFn>,
        args: &[Value],
    ) -> CallResult {
        let handler = match self.mocks.handler_by_handle(receiver.handle()) {
            Some(handler) => handler,
            None if receiver.is_mock() => {
                // A mock-flagged instance with no mapping escaped
                // construction; running it without dispatch would be unsafe.
                return Err(Thrown::new(format!(
                    "Mock instance #{} of '{}' is not registered with the interception layer",
                    receiver.handle().as_u64(),
                    frame_type
                )));
            }
            // Ordinary instance of an in-place-transformed class: real call.
            None => return run_real(self, receiver, &real, args),
        };

        if DisabledHandler::is_disabled(&handler) {
            // Cleared mock: behave like a plain, non-mock instance.
            return run_real(self, receiver, &real, args);
        }

        let mut invocation = InterceptedInvocation::new(
            self,
            receiver,
            frame_type.clone(),
            method_name.clone(),
            signature,
            params,
            real,
            args,
        );
        match handler.handle(&mut invocation) {
            Ok(value) => Ok(value),
            Err(mut thrown) => {
                if invocation.called_real() {
                    thrown.push_frame(StackFrame::new(
                        &frame_type,
                        &method_name,
                        "<intercepted>",
                        -1,
                    ));
                    Err(remove_recursive_calls(thrown, &frame_type))
                } else {
                    Err(thrown)
                }
            }
        }
    }
}

/// Name frames of a class's calls are attributed to: the synthesis target
/// for generated mock classes, the class itself otherwise.
pub(crate) fn frame_type_name(classes: &ClassRegistry, class: &Arc<ClassDef>) -> String {
    match class.synthesized_from.and_then(|id| classes.get(id)) {
        Some(target) => target.name.clone(),
        None => class.name.clone(),
    }
}

fn run_real(
    dispatcher: &Dispatcher<'_>,
    receiver: &InstanceRef,
    real: &Option<MethodFn>,
    args: &[Value],
) -> CallResult {
    match real {
        Some(f) => f(dispatcher, receiver, args),
        None => Ok(Value::Null),
    }
}
