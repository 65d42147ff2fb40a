//! The engine-side `Invocation` handed to handlers.

use mirage_sdk::{CallResult, InstanceHandle, Invocation, StackFrame, Thrown, Value};

use super::{Dispatcher, DISPATCHER_TYPE};
use crate::instance::InstanceRef;
use crate::types::{MethodFn, ParamInfo};

/// One intercepted call, with access to the original method body.
pub struct InterceptedInvocation<'a> {
    dispatcher: &'a Dispatcher<'a>,
    receiver: &'a InstanceRef,
    /// Name the call's frames are attributed to (the mock's target type).
    frame_type: String,
    method_name: String,
    signature: String,
    params: Vec<ParamInfo>,
    real: Option<MethodFn>,
    args: &'a [Value],
    called_real: bool,
}

impl<'a> InterceptedInvocation<'a> {
    pub(crate) fn new(
        dispatcher: &'a Dispatcher<'a>,
        receiver: &'a InstanceRef,
        frame_type: String,
        method_name: String,
        signature: String,
        params: Vec<ParamInfo>,
        real: Option<MethodFn>,
        args: &'a [Value],
    ) -> Self {
        Self {
            dispatcher,
            receiver,
            frame_type,
            method_name,
            signature,
            params,
            real,
            args,
            called_real: false,
        }
    }

    pub(crate) fn called_real(&self) -> bool {
        self.called_real
    }
}

impl Invocation for InterceptedInvocation<'_> {
    fn receiver(&self) -> InstanceHandle {
        self.receiver.handle()
    }

    fn method_name(&self) -> &str {
        &self.method_name
    }

    fn signature(&self) -> &str {
        &self.signature
    }

    fn parameter_names(&self) -> Vec<String> {
        self.params.iter().map(|p| p.name.clone()).collect()
    }

    fn arguments(&self) -> &[Value] {
        self.args
    }

    fn has_real_implementation(&self) -> bool {
        self.real.is_some()
    }

    fn call_real(&mut self) -> CallResult {
        self.called_real = true;
        let Some(real) = self.real.clone() else {
            return Err(Thrown::new(format!(
                "Cannot call real method '{}' on '{}': no implementation exists",
                self.method_name, self.frame_type
            )));
        };
        match real(self.dispatcher, self.receiver, self.args) {
            Ok(value) => Ok(value),
            Err(mut thrown) => {
                // The real execution frame, then the machinery frame the
                // normalizer will collapse.
                thrown.push_frame(StackFrame::new(
                    &self.frame_type,
                    &self.method_name,
                    "<real>",
                    -1,
                ));
                thrown.push_frame(StackFrame::new(DISPATCHER_TYPE, "call_real", "<dispatch>", -1));
                Err(thrown)
            }
        }
    }
}
