//! Throwable model for intercepted calls.
//!
//! Handlers and real method bodies fail by producing a [`Thrown`]: a message
//! plus the captured frame sequence. The engine's stack trace normalizer
//! rewrites the frame sequence when a throwable propagates through the
//! interception machinery; the throwable itself is never wrapped or
//! replaced.

use std::fmt;

use crate::value::Value;

/// Result of a dispatched or answered call.
pub type CallResult = Result<Value, Thrown>;

/// A single captured call frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StackFrame {
    /// Name of the declaring type
    pub type_name: String,
    /// Name of the method
    pub method_name: String,
    /// Source file, or a synthetic marker such as `<dispatch>`
    pub file: String,
    /// Line number, `-1` when unknown
    pub line: i32,
}

impl StackFrame {
    /// Create a new frame.
    pub fn new(type_name: &str, method_name: &str, file: &str, line: i32) -> Self {
        Self {
            type_name: type_name.to_string(),
            method_name: method_name.to_string(),
            file: file.to_string(),
            line,
        }
    }
}

impl fmt::Display for StackFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}.{}({}:{})",
            self.type_name, self.method_name, self.file, self.line
        )
    }
}

/// A throwable raised by a handler or a real method body.
#[derive(Debug, Clone, PartialEq)]
pub struct Thrown {
    /// Error message
    pub message: String,
    /// Captured frames, most recent first
    pub frames: Vec<StackFrame>,
    /// Optional payload carried alongside the message
    pub payload: Option<Value>,
}

impl Thrown {
    /// Create a throwable with no captured frames.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            frames: Vec::new(),
            payload: None,
        }
    }

    /// Create a throwable with a pre-captured frame sequence.
    pub fn with_frames(message: impl Into<String>, frames: Vec<StackFrame>) -> Self {
        Self {
            message: message.into(),
            frames,
            payload: None,
        }
    }

    /// Attach a payload value.
    pub fn with_payload(mut self, payload: Value) -> Self {
        self.payload = Some(payload);
        self
    }

    /// Append a frame as the throwable propagates outward.
    pub fn push_frame(&mut self, frame: StackFrame) {
        self.frames.push(frame);
    }

    /// Frames whose declaring type name equals `type_name`.
    pub fn frames_of_type(&self, type_name: &str) -> Vec<&StackFrame> {
        self.frames
            .iter()
            .filter(|f| f.type_name == type_name)
            .collect()
    }
}

impl fmt::Display for Thrown {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.message)?;
        for frame in &self.frames {
            writeln!(f, "    at {}", frame)?;
        }
        Ok(())
    }
}

impl std::error::Error for Thrown {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_frame_appends() {
        let mut t = Thrown::new("fatal");
        t.push_frame(StackFrame::new("Foo", "bar", "foo.rs", 10));
        t.push_frame(StackFrame::new("Baz", "qux", "baz.rs", 20));
        assert_eq!(t.frames.len(), 2);
        assert_eq!(t.frames[0].type_name, "Foo");
        assert_eq!(t.frames[1].method_name, "qux");
    }

    #[test]
    fn test_frames_of_type() {
        let t = Thrown::with_frames(
            "fatal",
            vec![
                StackFrame::new("Foo", "a", "", -1),
                StackFrame::new("Bar", "b", "", -1),
                StackFrame::new("Foo", "c", "", -1),
            ],
        );
        let foo = t.frames_of_type("Foo");
        assert_eq!(foo.len(), 2);
        assert_eq!(foo[1].method_name, "c");
    }

    #[test]
    fn test_display_contains_frames() {
        let t = Thrown::with_frames("boom", vec![StackFrame::new("Foo", "bar", "f.rs", 3)]);
        let text = t.to_string();
        assert!(text.contains("boom"));
        assert!(text.contains("Foo.bar(f.rs:3)"));
    }
}
