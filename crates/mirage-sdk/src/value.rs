//! Runtime value model shared between the engine and handler implementations.

use std::fmt;
use std::sync::Arc;

/// Opaque identity of a heap instance.
///
/// Handles are assigned by the engine at allocation time and are unique for
/// the lifetime of the process. Handlers receive the receiver of an
/// intercepted call as a handle rather than a direct reference, so they can
/// be written against the SDK alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct InstanceHandle(u64);

impl InstanceHandle {
    /// Wrap a raw handle value.
    pub fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    /// Get the raw handle value.
    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

/// Tagged runtime value.
///
/// Primitive values are stored inline; strings are reference-counted so
/// values stay cheap to clone across the dispatch boundary. Instances are
/// referenced by handle.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Absence of a value
    Null,
    /// Boolean
    Bool(bool),
    /// 32-bit signed integer
    I32(i32),
    /// 64-bit signed integer
    I64(i64),
    /// 64-bit float
    F64(f64),
    /// Immutable string
    Str(Arc<str>),
    /// Reference to a heap instance by handle
    Handle(InstanceHandle),
}

impl Value {
    /// Convenience constructor for string values.
    pub fn str(s: &str) -> Self {
        Value::Str(Arc::from(s))
    }

    /// Check for `Value::Null`.
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Extract a bool, if this value is one.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Extract an i32, if this value is one.
    pub fn as_i32(&self) -> Option<i32> {
        match self {
            Value::I32(v) => Some(*v),
            _ => None,
        }
    }

    /// Extract an i64, if this value is one.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::I64(v) => Some(*v),
            _ => None,
        }
    }

    /// Extract an f64, if this value is one.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::F64(v) => Some(*v),
            _ => None,
        }
    }

    /// Extract a string slice, if this value is a string.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Extract an instance handle, if this value is one.
    pub fn as_handle(&self) -> Option<InstanceHandle> {
        match self {
            Value::Handle(h) => Some(*h),
            _ => None,
        }
    }

    /// Name of the value's runtime type, for diagnostics.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::I32(_) => "i32",
            Value::I64(_) => "i64",
            Value::F64(_) => "f64",
            Value::Str(_) => "string",
            Value::Handle(_) => "instance",
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Bool(b) => write!(f, "{}", b),
            Value::I32(v) => write!(f, "{}", v),
            Value::I64(v) => write!(f, "{}", v),
            Value::F64(v) => write!(f, "{}", v),
            Value::Str(s) => write!(f, "{}", s),
            Value::Handle(h) => write!(f, "instance#{}", h.as_u64()),
        }
    }
}
