//! Class, method, and field definitions plus the builder API used by
//! embedders and by the proxy synthesizer.

use std::fmt;
use std::sync::Arc;

use once_cell::sync::OnceCell;
use rustc_hash::FxHashMap;

use mirage_sdk::{CallResult, Thrown, Value};

use crate::dispatch::Dispatcher;
use crate::instance::InstanceRef;

/// Identifier of a class registered in a `ClassRegistry`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ClassId(pub(crate) usize);

impl ClassId {
    /// Raw index of the class.
    pub fn as_usize(&self) -> usize {
        self.0
    }
}

/// Method body implementation.
///
/// Bodies receive the dispatcher so a real implementation can invoke other
/// methods on the same (or another) instance; such calls re-enter the
/// interception layer.
pub type MethodFn =
    Arc<dyn Fn(&Dispatcher<'_>, &InstanceRef, &[Value]) -> CallResult + Send + Sync>;

/// Constructor body: initializes the field vector from constructor arguments.
pub type ConstructorFn =
    Arc<dyn Fn(&mut [Value], &[Value]) -> Result<(), Thrown> + Send + Sync>;

/// Computation behind a dynamically computed constant-pool entry.
pub type ConstantFn = Arc<dyn Fn() -> Value + Send + Sync>;

/// Declared parameter metadata, preserved through synthesis.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParamInfo {
    /// Parameter name
    pub name: String,
    /// Parameter type name
    pub type_name: String,
}

impl ParamInfo {
    /// Create parameter metadata.
    pub fn new(name: &str, type_name: &str) -> Self {
        Self {
            name: name.to_string(),
            type_name: type_name.to_string(),
        }
    }
}

/// How a method executes.
#[derive(Clone)]
pub enum MethodBody {
    /// Concrete implementation, dispatched directly
    Real(MethodFn),
    /// No implementation (interface or abstract method)
    Abstract,
    /// Routed through the interception layer; `real` is the original body
    /// kept for real-call dispatch, `None` when the target was abstract
    Intercepted {
        /// Original body, if the target had one
        real: Option<MethodFn>,
    },
}

impl MethodBody {
    /// The original body behind this method, if any.
    pub fn real_fn(&self) -> Option<MethodFn> {
        match self {
            MethodBody::Real(f) => Some(f.clone()),
            MethodBody::Abstract => None,
            MethodBody::Intercepted { real } => real.clone(),
        }
    }

    /// Whether calls to this method consult the interception layer.
    pub fn is_intercepted(&self) -> bool {
        matches!(self, MethodBody::Intercepted { .. })
    }
}

impl fmt::Debug for MethodBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MethodBody::Real(_) => write!(f, "Real"),
            MethodBody::Abstract => write!(f, "Abstract"),
            MethodBody::Intercepted { real } => {
                write!(f, "Intercepted {{ real: {} }}", real.is_some())
            }
        }
    }
}

/// Definition of a single method.
#[derive(Clone)]
pub struct MethodDef {
    /// Method name (unique within a class)
    pub name: String,
    /// Declared parameter metadata
    pub params: Vec<ParamInfo>,
    /// Return type name
    pub return_type: String,
    /// Erased signature, when it differs from the declared one (generic
    /// methods inherited with erased parameter/return types)
    pub erased: Option<String>,
    /// Final methods cannot be overridden by a generated subclass
    pub is_final: bool,
    /// Body implementation
    pub body: MethodBody,
}

impl MethodDef {
    /// Create an abstract method returning `void`.
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            params: Vec::new(),
            return_type: "void".to_string(),
            erased: None,
            is_final: false,
            body: MethodBody::Abstract,
        }
    }

    /// Add a declared parameter.
    pub fn param(mut self, name: &str, type_name: &str) -> Self {
        self.params.push(ParamInfo::new(name, type_name));
        self
    }

    /// Set the return type.
    pub fn returns(mut self, type_name: &str) -> Self {
        self.return_type = type_name.to_string();
        self
    }

    /// Mark the method as generic with the given erased signature.
    pub fn erased_as(mut self, signature: &str) -> Self {
        self.erased = Some(signature.to_string());
        self
    }

    /// Mark the method final.
    pub fn final_method(mut self) -> Self {
        self.is_final = true;
        self
    }

    /// Install a concrete body.
    pub fn body_real<F>(mut self, f: F) -> Self
    where
        F: Fn(&Dispatcher<'_>, &InstanceRef, &[Value]) -> CallResult + Send + Sync + 'static,
    {
        self.body = MethodBody::Real(Arc::new(f));
        self
    }

    /// Signature as declared: `(types...) -> return`.
    pub fn declared_signature(&self) -> String {
        let params: Vec<&str> = self.params.iter().map(|p| p.type_name.as_str()).collect();
        format!("({}) -> {}", params.join(", "), self.return_type)
    }

    /// Erased signature; falls back to the declared one for non-generic
    /// methods.
    pub fn erased_signature(&self) -> String {
        self.erased
            .clone()
            .unwrap_or_else(|| self.declared_signature())
    }

    /// Whether the method's declared and erased signatures differ.
    pub fn is_generic(&self) -> bool {
        self.erased.is_some()
    }
}

impl fmt::Debug for MethodDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MethodDef")
            .field("name", &self.name)
            .field("signature", &self.declared_signature())
            .field("final", &self.is_final)
            .field("body", &self.body)
            .finish()
    }
}

/// Definition of a single instance field.
#[derive(Debug, Clone)]
pub struct FieldDef {
    /// Field name
    pub name: String,
    /// Field type name
    pub type_name: String,
    /// Default value assigned at allocation
    pub default: Value,
}

impl FieldDef {
    /// Create a field defaulting to `Value::Null`.
    pub fn new(name: &str, type_name: &str) -> Self {
        Self {
            name: name.to_string(),
            type_name: type_name.to_string(),
            default: Value::Null,
        }
    }

    /// Set the allocation default.
    pub fn with_default(mut self, default: Value) -> Self {
        self.default = default;
        self
    }
}

/// Constant-pool entry.
///
/// Dynamic entries are computed at most once, on first resolution;
/// synthesized classes carry their target's constant pool untouched.
#[derive(Clone)]
pub enum Constant {
    /// Plain constant value
    Value(Value),
    /// Dynamically computed constant
    Dynamic {
        /// The computation, run once
        compute: ConstantFn,
        /// Cached result of the computation
        cached: OnceCell<Value>,
    },
}

impl Constant {
    /// Create a dynamically computed constant.
    pub fn dynamic<F>(compute: F) -> Self
    where
        F: Fn() -> Value + Send + Sync + 'static,
    {
        Constant::Dynamic {
            compute: Arc::new(compute),
            cached: OnceCell::new(),
        }
    }

    /// Resolve the constant, computing and caching dynamic entries.
    pub fn resolve(&self) -> Value {
        match self {
            Constant::Value(v) => v.clone(),
            Constant::Dynamic { compute, cached } => cached.get_or_init(|| compute()).clone(),
        }
    }
}

impl fmt::Debug for Constant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Constant::Value(v) => write!(f, "Constant::Value({:?})", v),
            Constant::Dynamic { cached, .. } => {
                write!(f, "Constant::Dynamic(resolved: {})", cached.get().is_some())
            }
        }
    }
}

/// Class definition metadata.
pub struct ClassDef {
    /// Class id (assigned by the registry)
    pub id: ClassId,
    /// Class name
    pub name: String,
    /// Parent class, `None` for root classes and interfaces
    pub superclass: Option<ClassId>,
    /// Implemented interfaces
    pub interfaces: Vec<ClassId>,
    /// Declared instance fields (inherited fields live on ancestors)
    pub fields: Vec<FieldDef>,
    /// Declared methods
    pub methods: Vec<MethodDef>,
    /// Constant pool
    pub constants: Vec<Constant>,
    /// Whether this is an interface
    pub is_interface: bool,
    /// Sealed classes cannot be subclassed; mocking them requires in-place
    /// transformation
    pub is_sealed: bool,
    /// Whether the runtime permits redefining this class
    pub modifiable: bool,
    /// Whether instances serialize (set by synthesis from the settings)
    pub serializable: bool,
    /// For synthesized mock classes, the target they were generated from
    pub synthesized_from: Option<ClassId>,
    /// Constructor, if the class declares one
    pub constructor: Option<ConstructorFn>,

    field_indices: FxHashMap<String, usize>,
    method_indices: FxHashMap<String, usize>,
}

impl ClassDef {
    pub(crate) fn assemble(
        id: ClassId,
        name: String,
        superclass: Option<ClassId>,
        interfaces: Vec<ClassId>,
        fields: Vec<FieldDef>,
        methods: Vec<MethodDef>,
        constants: Vec<Constant>,
        is_interface: bool,
        is_sealed: bool,
        modifiable: bool,
        serializable: bool,
        synthesized_from: Option<ClassId>,
        constructor: Option<ConstructorFn>,
    ) -> Self {
        let mut def = Self {
            id,
            name,
            superclass,
            interfaces,
            fields,
            methods,
            constants,
            is_interface,
            is_sealed,
            modifiable,
            serializable,
            synthesized_from,
            constructor,
            field_indices: FxHashMap::default(),
            method_indices: FxHashMap::default(),
        };
        def.rebuild_indices();
        def
    }

    pub(crate) fn rebuild_indices(&mut self) {
        self.field_indices = self
            .fields
            .iter()
            .enumerate()
            .map(|(i, f)| (f.name.clone(), i))
            .collect();
        self.method_indices = self
            .methods
            .iter()
            .enumerate()
            .map(|(i, m)| (m.name.clone(), i))
            .collect();
    }

    /// Index of a declared field by name.
    pub fn declared_field_index(&self, name: &str) -> Option<usize> {
        self.field_indices.get(name).copied()
    }

    /// A declared method by name.
    pub fn declared_method(&self, name: &str) -> Option<&MethodDef> {
        self.method_indices.get(name).map(|&i| &self.methods[i])
    }

    /// Index of a declared method by name.
    pub fn declared_method_index(&self, name: &str) -> Option<usize> {
        self.method_indices.get(name).copied()
    }

    /// Whether this class was generated by the synthesizer.
    pub fn is_synthesized(&self) -> bool {
        self.synthesized_from.is_some()
    }
}

impl fmt::Debug for ClassDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClassDef")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("superclass", &self.superclass)
            .field("interfaces", &self.interfaces)
            .field("fields", &self.fields.len())
            .field("methods", &self.methods.len())
            .field("interface", &self.is_interface)
            .field("sealed", &self.is_sealed)
            .field("modifiable", &self.modifiable)
            .field("synthesized_from", &self.synthesized_from)
            .finish()
    }
}

/// Builder for defining classes and interfaces.
///
/// ```ignore
/// let id = ClassBuilder::class("Point")
///     .field(FieldDef::new("x", "i32"))
///     .field(FieldDef::new("y", "i32"))
///     .method(MethodDef::new("sum").returns("i32").body_real(|_, recv, _| {
///         // ...
///         Ok(Value::I32(0))
///     }))
///     .register(&registry);
/// ```
pub struct ClassBuilder {
    name: String,
    superclass: Option<ClassId>,
    interfaces: Vec<ClassId>,
    fields: Vec<FieldDef>,
    methods: Vec<MethodDef>,
    constants: Vec<Constant>,
    is_interface: bool,
    is_sealed: bool,
    modifiable: bool,
    constructor: Option<ConstructorFn>,
}

impl ClassBuilder {
    /// Start building a class.
    pub fn class(name: &str) -> Self {
        Self {
            name: name.to_string(),
            superclass: None,
            interfaces: Vec::new(),
            fields: Vec::new(),
            methods: Vec::new(),
            constants: Vec::new(),
            is_interface: false,
            is_sealed: false,
            modifiable: true,
            constructor: None,
        }
    }

    /// Start building an interface.
    pub fn interface(name: &str) -> Self {
        let mut builder = Self::class(name);
        builder.is_interface = true;
        builder
    }

    /// Set the superclass.
    pub fn extends(mut self, superclass: ClassId) -> Self {
        self.superclass = Some(superclass);
        self
    }

    /// Add an implemented interface.
    pub fn implements(mut self, interface: ClassId) -> Self {
        self.interfaces.push(interface);
        self
    }

    /// Add a declared field.
    pub fn field(mut self, field: FieldDef) -> Self {
        self.fields.push(field);
        self
    }

    /// Add a declared method.
    pub fn method(mut self, method: MethodDef) -> Self {
        self.methods.push(method);
        self
    }

    /// Add a constant-pool entry.
    pub fn constant(mut self, constant: Constant) -> Self {
        self.constants.push(constant);
        self
    }

    /// Mark the class sealed (no generated subclasses).
    pub fn sealed(mut self) -> Self {
        self.is_sealed = true;
        self
    }

    /// Mark the class as one the runtime refuses to redefine.
    pub fn unmodifiable(mut self) -> Self {
        self.modifiable = false;
        self
    }

    /// Install a constructor body.
    pub fn constructor<F>(mut self, f: F) -> Self
    where
        F: Fn(&mut [Value], &[Value]) -> Result<(), Thrown> + Send + Sync + 'static,
    {
        self.constructor = Some(Arc::new(f));
        self
    }

    /// Register the class and return its id.
    pub fn register(self, registry: &super::registry::ClassRegistry) -> ClassId {
        registry.register_class(|id| {
            ClassDef::assemble(
                id,
                self.name,
                self.superclass,
                self.interfaces,
                self.fields,
                self.methods,
                self.constants,
                self.is_interface,
                self.is_sealed,
                self.modifiable,
                false,
                None,
                self.constructor,
            )
        })
    }
}
