//! Type descriptors consumed by the analyzer and the synthesizer.

use std::fmt;

use super::class::ClassId;
use super::registry::ClassRegistry;

/// Primitive value kinds the runtime cannot redefine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrimitiveKind {
    /// Boolean
    Bool,
    /// 32-bit signed integer
    I32,
    /// 64-bit signed integer
    I64,
    /// 64-bit float
    F64,
}

impl PrimitiveKind {
    /// All primitive kinds, for exhaustive analyzer tests.
    pub const ALL: [PrimitiveKind; 4] = [
        PrimitiveKind::Bool,
        PrimitiveKind::I32,
        PrimitiveKind::I64,
        PrimitiveKind::F64,
    ];

    /// Canonical name of the primitive.
    pub fn name(&self) -> &'static str {
        match self {
            PrimitiveKind::Bool => "bool",
            PrimitiveKind::I32 => "i32",
            PrimitiveKind::I64 => "i64",
            PrimitiveKind::F64 => "f64",
        }
    }
}

/// Descriptor of an arbitrary type a caller may ask to mock.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TypeDesc {
    /// Bare primitive type
    Primitive(PrimitiveKind),
    /// Boxed wrapper around a primitive
    Wrapper(PrimitiveKind),
    /// The string type
    Str,
    /// The meta type (the type of a type)
    Meta,
    /// Array with the given component type
    Array(Box<TypeDesc>),
    /// A class or interface registered in a [`ClassRegistry`]
    Class(ClassId),
}

impl TypeDesc {
    /// Array descriptor with the given component.
    pub fn array(component: TypeDesc) -> Self {
        TypeDesc::Array(Box::new(component))
    }

    /// Whether this is a bare primitive.
    pub fn is_primitive(&self) -> bool {
        matches!(self, TypeDesc::Primitive(_))
    }

    /// Whether this is an array type.
    pub fn is_array(&self) -> bool {
        matches!(self, TypeDesc::Array(_))
    }

    /// The class id, when this descriptor names a registered class.
    pub fn class_id(&self) -> Option<ClassId> {
        match self {
            TypeDesc::Class(id) => Some(*id),
            _ => None,
        }
    }

    /// Human-readable name, resolving class ids through `registry`.
    pub fn display_name(&self, registry: &ClassRegistry) -> String {
        match self {
            TypeDesc::Primitive(kind) => kind.name().to_string(),
            TypeDesc::Wrapper(kind) => format!("Boxed<{}>", kind.name()),
            TypeDesc::Str => "String".to_string(),
            TypeDesc::Meta => "Class".to_string(),
            TypeDesc::Array(component) => format!("{}[]", component.display_name(registry)),
            TypeDesc::Class(id) => registry
                .get(*id)
                .map(|c| c.name.clone())
                .unwrap_or_else(|| format!("class#{}", id.as_usize())),
        }
    }
}

impl fmt::Display for TypeDesc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeDesc::Primitive(kind) => write!(f, "{}", kind.name()),
            TypeDesc::Wrapper(kind) => write!(f, "Boxed<{}>", kind.name()),
            TypeDesc::Str => write!(f, "String"),
            TypeDesc::Meta => write!(f, "Class"),
            TypeDesc::Array(component) => write!(f, "{}[]", component),
            TypeDesc::Class(id) => write!(f, "class#{}", id.as_usize()),
        }
    }
}
