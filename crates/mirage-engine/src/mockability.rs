//! Mockability analysis.
//!
//! Pure function of the type descriptor and registry state; no side
//! effects. Rules are evaluated in a fixed order and the first matching
//! rule wins, including for types that would match several (a primitive
//! array is reported as a runtime restriction, not as an array).

use crate::types::{ClassRegistry, TypeDesc};

/// Outcome of analyzing a type for mockability.
///
/// The reason is the empty string exactly when the type is mockable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeMockability {
    mockable: bool,
    non_mockable_reason: String,
}

impl TypeMockability {
    fn ok() -> Self {
        Self {
            mockable: true,
            non_mockable_reason: String::new(),
        }
    }

    fn not(reason: &str) -> Self {
        Self {
            mockable: false,
            non_mockable_reason: reason.to_string(),
        }
    }

    /// Whether a mock can be constructed for the analyzed type.
    pub fn mockable(&self) -> bool {
        self.mockable
    }

    /// Why the type is not mockable; empty when it is.
    pub fn non_mockable_reason(&self) -> &str {
        &self.non_mockable_reason
    }
}

/// Whether the runtime would even attempt to transform this type.
///
/// Arrays of primitives are rejected outright by the runtime; arrays of
/// anything else can be attempted (and then rejected as arrays).
fn permits_transformation_attempt(component: &TypeDesc) -> bool {
    !component.is_primitive()
}

/// Decide whether a mock can be constructed for `ty`, and if not, why.
pub fn is_type_mockable(registry: &ClassRegistry, ty: &TypeDesc) -> TypeMockability {
    match ty {
        TypeDesc::Primitive(_) => TypeMockability::not("primitive type"),
        TypeDesc::Wrapper(_) | TypeDesc::Str | TypeDesc::Meta => {
            TypeMockability::not("Cannot mock wrapper types, String.class or Class.class")
        }
        TypeDesc::Array(component) => {
            if permits_transformation_attempt(component) {
                TypeMockability::not("Arrays cannot be mocked")
            } else {
                TypeMockability::not("VM does not support modification of given type")
            }
        }
        TypeDesc::Class(id) => match registry.get(*id) {
            Some(class) if class.modifiable => TypeMockability::ok(),
            _ => TypeMockability::not("VM does not support modification of given type"),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ClassBuilder, PrimitiveKind};

    #[test]
    fn test_primitives_are_not_mockable() {
        let registry = ClassRegistry::new();
        for kind in PrimitiveKind::ALL {
            let mockability = is_type_mockable(&registry, &TypeDesc::Primitive(kind));
            assert!(!mockability.mockable());
            assert!(mockability.non_mockable_reason().contains("primitive"));
        }
    }

    #[test]
    fn test_wrapper_string_and_meta_reason() {
        let registry = ClassRegistry::new();
        for ty in [
            TypeDesc::Wrapper(PrimitiveKind::I32),
            TypeDesc::Str,
            TypeDesc::Meta,
        ] {
            let mockability = is_type_mockable(&registry, &ty);
            assert!(!mockability.mockable());
            assert_eq!(
                mockability.non_mockable_reason(),
                "Cannot mock wrapper types, String.class or Class.class"
            );
        }
    }

    #[test]
    fn test_primitive_array_reports_runtime_restriction() {
        let registry = ClassRegistry::new();
        let mockability = is_type_mockable(
            &registry,
            &TypeDesc::array(TypeDesc::Primitive(PrimitiveKind::I32)),
        );
        assert!(!mockability.mockable());
        assert_eq!(
            mockability.non_mockable_reason(),
            "VM does not support modification of given type"
        );
    }

    #[test]
    fn test_object_array_reports_array_reason() {
        let registry = ClassRegistry::new();
        let class = ClassBuilder::class("Elem").register(&registry);
        let mockability = is_type_mockable(&registry, &TypeDesc::array(TypeDesc::Class(class)));
        assert!(!mockability.mockable());
        assert_eq!(mockability.non_mockable_reason(), "Arrays cannot be mocked");
    }

    #[test]
    fn test_unmodifiable_class_reports_runtime_restriction() {
        let registry = ClassRegistry::new();
        let class = ClassBuilder::class("Pinned").unmodifiable().register(&registry);
        let mockability = is_type_mockable(&registry, &TypeDesc::Class(class));
        assert!(!mockability.mockable());
        assert_eq!(
            mockability.non_mockable_reason(),
            "VM does not support modification of given type"
        );
    }

    #[test]
    fn test_plain_class_is_mockable_with_empty_reason() {
        let registry = ClassRegistry::new();
        let class = ClassBuilder::class("SomeClass").register(&registry);
        let mockability = is_type_mockable(&registry, &TypeDesc::Class(class));
        assert!(mockability.mockable());
        assert_eq!(mockability.non_mockable_reason(), "");
    }

    #[test]
    fn test_sealed_class_is_mockable() {
        // Sealed only forces the in-place strategy; it does not gate
        // mockability.
        let registry = ClassRegistry::new();
        let class = ClassBuilder::class("FinalClass").sealed().register(&registry);
        let mockability = is_type_mockable(&registry, &TypeDesc::Class(class));
        assert!(mockability.mockable());
        assert_eq!(mockability.non_mockable_reason(), "");
    }
}
