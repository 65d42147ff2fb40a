//! Type model: descriptors, class definitions, the class registry, and
//! method resolution.
//!
//! Everything the analyzer, synthesizer, and dispatcher operate on is
//! defined here. Classes are registered once and looked up by id; in-place
//! transformation replaces the stored definition atomically so every
//! existing instance of the class observes the rewritten method table.

mod class;
mod descriptor;
mod registry;
mod resolve;

pub use class::{
    ClassBuilder, ClassDef, ClassId, Constant, ConstantFn, ConstructorFn, FieldDef, MethodBody,
    MethodDef, MethodFn, ParamInfo,
};
pub use descriptor::{PrimitiveKind, TypeDesc};
pub use registry::{ClassRegistry, FieldSlot};
pub use resolve::{resolve_methods, ResolvedMethod};
