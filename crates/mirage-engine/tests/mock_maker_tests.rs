//! End-to-end mock maker behavior: creation strategies, spying, handler
//! lifecycle, and the throwable frame protocol.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;

use mirage_engine::{
    AnsweringHandler, CallResult, CallsRealMethods, ClassBuilder, ClassRegistry, Constant,
    DisabledHandler, FieldDef, Invocation, MethodDef, MockCreationSettings, MockError, MockHandler,
    MockMaker, PrimitiveKind, ReturnsAnswer, SerializableMode, StackFrame, Thrown, TypeDesc, Value,
};

fn returns(value: Value) -> Arc<dyn MockHandler> {
    Arc::new(AnsweringHandler::new(Arc::new(ReturnsAnswer::new(value))))
}

fn calls_real() -> Arc<dyn MockHandler> {
    Arc::new(AnsweringHandler::new(Arc::new(CallsRealMethods)))
}

/// Handler recording call metadata before answering.
struct Recording {
    method_names: Mutex<Vec<String>>,
    signatures: Mutex<Vec<String>>,
    parameter_names: Mutex<Vec<Vec<String>>>,
    result: Value,
}

impl Recording {
    fn new(result: Value) -> Arc<Self> {
        Arc::new(Self {
            method_names: Mutex::new(Vec::new()),
            signatures: Mutex::new(Vec::new()),
            parameter_names: Mutex::new(Vec::new()),
            result,
        })
    }
}

impl MockHandler for Recording {
    fn handle(&self, invocation: &mut dyn Invocation) -> CallResult {
        self.method_names
            .lock()
            .push(invocation.method_name().to_string());
        self.signatures
            .lock()
            .push(invocation.signature().to_string());
        self.parameter_names.lock().push(invocation.parameter_names());
        Ok(self.result.clone())
    }
}

fn sample_class(maker: &MockMaker) -> mirage_engine::ClassId {
    ClassBuilder::class("SampleClass")
        .method(
            MethodDef::new("foo")
                .returns("String")
                .body_real(|_, _, _| Ok(Value::str("foo"))),
        )
        .register(maker.classes())
}

#[test]
fn test_open_class_mock_is_stubbable() {
    let maker = MockMaker::new();
    let target = sample_class(&maker);
    let settings = MockCreationSettings::new(TypeDesc::Class(target));
    let mock = maker.create_mock(&settings, returns(Value::str("bar"))).unwrap();

    assert!(mock.is_mock());
    assert_eq!(maker.invoke(&mock, "foo", &[]), Ok(Value::str("bar")));
    // An ordinary instance of the target is unaffected.
    let plain = mirage_engine::Instance::allocate(maker.classes(), target);
    assert_eq!(maker.invoke(&plain, "foo", &[]), Ok(Value::str("foo")));
}

#[test]
fn test_sealed_class_mock_is_stubbable() {
    let maker = MockMaker::new();
    let target = ClassBuilder::class("FinalClass")
        .sealed()
        .method(
            MethodDef::new("foo")
                .returns("String")
                .body_real(|_, _, _| Ok(Value::str("foo"))),
        )
        .register(maker.classes());
    let settings = MockCreationSettings::new(TypeDesc::Class(target));
    let mock = maker.create_mock(&settings, returns(Value::str("bar"))).unwrap();

    assert_eq!(maker.invoke(&mock, "foo", &[]), Ok(Value::str("bar")));
}

#[test]
fn test_plain_instance_of_transformed_class_keeps_real_behavior() {
    let maker = MockMaker::new();
    let target = ClassBuilder::class("FinalClass")
        .sealed()
        .method(
            MethodDef::new("foo")
                .returns("String")
                .body_real(|_, _, _| Ok(Value::str("foo"))),
        )
        .register(maker.classes());
    let settings = MockCreationSettings::new(TypeDesc::Class(target));
    let _mock = maker.create_mock(&settings, returns(Value::str("bar"))).unwrap();

    // Same class, no handler mapping: the retained body runs.
    let plain = mirage_engine::Instance::allocate(maker.classes(), target);
    assert_eq!(maker.invoke(&plain, "foo", &[]), Ok(Value::str("foo")));
}

#[test]
fn test_interface_mock_is_stubbable() {
    let maker = MockMaker::new();
    let iface = ClassBuilder::interface("SampleInterface")
        .method(MethodDef::new("count").returns("i32"))
        .register(maker.classes());
    let settings = MockCreationSettings::new(TypeDesc::Class(iface));
    let mock = maker.create_mock(&settings, returns(Value::I32(10))).unwrap();

    assert_eq!(maker.invoke(&mock, "count", &[]), Ok(Value::I32(10)));
}

#[test]
fn test_mock_of_class_with_throwing_constructor() {
    let maker = MockMaker::new();
    let target = ClassBuilder::class("NonConstructableClass")
        .field(FieldDef::new("state", "String"))
        .constructor(|_, _| Err(Thrown::new("constructor must not run during mock creation")))
        .method(
            MethodDef::new("foo")
                .returns("String")
                .body_real(|_, _, _| Ok(Value::str("foo"))),
        )
        .register(maker.classes());
    let settings = MockCreationSettings::new(TypeDesc::Class(target));

    let mock = maker.create_mock(&settings, returns(Value::str("bar"))).unwrap();
    assert_eq!(maker.invoke(&mock, "foo", &[]), Ok(Value::str("bar")));
}

#[test]
fn test_generic_method_inherited_without_override_is_intercepted() {
    let maker = MockMaker::new();
    let generic = ClassBuilder::class("GenericClass")
        .method(
            MethodDef::new("value")
                .returns("T")
                .erased_as("() -> Object")
                .body_real(|_, _, _| Ok(Value::Null)),
        )
        .register(maker.classes());
    let sub = ClassBuilder::class("GenericSubClass")
        .extends(generic)
        .register(maker.classes());

    let recording = Recording::new(Value::str("stubbed"));
    let settings = MockCreationSettings::new(TypeDesc::Class(sub));
    let mock = maker.create_mock(&settings, recording.clone()).unwrap();

    assert_eq!(maker.invoke(&mock, "value", &[]), Ok(Value::str("stubbed")));
    assert_eq!(recording.method_names.lock()[0], "value");
    // The handler observes the erased signature the call resolved through.
    assert_eq!(recording.signatures.lock()[0], "() -> Object");
}

#[test]
fn test_parameter_names_are_retained_through_synthesis() {
    let maker = MockMaker::new();
    let target = ClassBuilder::class("WithParams")
        .method(
            MethodDef::new("put")
                .param("key", "String")
                .param("value", "i64")
                .returns("bool")
                .body_real(|_, _, _| Ok(Value::Bool(false))),
        )
        .register(maker.classes());

    let recording = Recording::new(Value::Bool(true));
    let settings = MockCreationSettings::new(TypeDesc::Class(target));
    let mock = maker.create_mock(&settings, recording.clone()).unwrap();

    assert_eq!(
        maker.invoke(&mock, "put", &[Value::str("k"), Value::I64(1)]),
        Ok(Value::Bool(true))
    );
    assert_eq!(
        recording.parameter_names.lock()[0],
        vec!["key".to_string(), "value".to_string()]
    );
}

#[test]
fn test_synthesized_class_resolves_dynamic_constants_once() {
    let maker = MockMaker::new();
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = calls.clone();
    let target = ClassBuilder::class("WithCondy")
        .constant(Constant::dynamic(move || {
            counter.fetch_add(1, Ordering::SeqCst);
            Value::I64(42)
        }))
        .register(maker.classes());

    let settings = MockCreationSettings::new(TypeDesc::Class(target));
    let mock = maker.create_mock(&settings, returns(Value::Null)).unwrap();

    let registry = maker.classes();
    assert_eq!(registry.resolve_constant(mock.class_id(), 0), Some(Value::I64(42)));
    assert_eq!(registry.resolve_constant(mock.class_id(), 0), Some(Value::I64(42)));
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[test]
fn test_spy_copies_seed_fields() {
    let maker = MockMaker::new();
    let target = ClassBuilder::class("Account")
        .field(FieldDef::new("owner", "String"))
        .field(FieldDef::new("balance", "i64"))
        .constructor(|fields, args| {
            fields[0] = args[0].clone();
            fields[1] = args[1].clone();
            Ok(())
        })
        .method(
            MethodDef::new("owner")
                .returns("String")
                .body_real(|_, recv, _| Ok(recv.get_field(0).unwrap_or(Value::Null))),
        )
        .register(maker.classes());

    let seed = mirage_engine::Instance::construct(
        maker.classes(),
        target,
        &[Value::str("alice"), Value::I64(250)],
    )
    .unwrap();

    let settings = MockCreationSettings::new(TypeDesc::Class(target));
    let spy = maker
        .create_spy(&settings, calls_real(), &seed)
        .unwrap()
        .expect("seed and spy layouts match");

    assert_eq!(spy.field_count(), seed.field_count());
    assert_eq!(spy.get_field(1), Some(Value::I64(250)));
    // The spy's real path reads the copied state.
    assert_eq!(maker.invoke(&spy, "owner", &[]), Ok(Value::str("alice")));
}

#[test]
fn test_spy_with_foreign_seed_yields_none() {
    let maker = MockMaker::new();
    let target = ClassBuilder::class("Account")
        .field(FieldDef::new("owner", "String"))
        .register(maker.classes());

    // Same shape, different registry.
    let foreign_registry = ClassRegistry::new();
    let foreign_class = ClassBuilder::class("Account")
        .field(FieldDef::new("owner", "String"))
        .register(&foreign_registry);
    let seed = mirage_engine::Instance::allocate(&foreign_registry, foreign_class);

    let settings = MockCreationSettings::new(TypeDesc::Class(target));
    assert!(maker.create_spy(&settings, calls_real(), &seed).unwrap().is_none());
}

#[test]
fn test_spy_with_mismatched_layout_yields_none() {
    let maker = MockMaker::new();
    let target = ClassBuilder::class("Wide")
        .field(FieldDef::new("a", "i32"))
        .field(FieldDef::new("b", "i32"))
        .register(maker.classes());
    let narrow = ClassBuilder::class("Narrow")
        .field(FieldDef::new("a", "i32"))
        .register(maker.classes());
    let seed = mirage_engine::Instance::allocate(maker.classes(), narrow);

    let settings = MockCreationSettings::new(TypeDesc::Class(target));
    assert!(maker.create_spy(&settings, calls_real(), &seed).unwrap().is_none());
}

#[test]
fn test_spy_real_throw_has_normalized_frames() {
    let maker = MockMaker::new();
    let target = ClassBuilder::class("ExceptionThrowingClass")
        .sealed()
        .method(
            MethodDef::new("throwException")
                .returns("void")
                .body_real(|_, _, _| {
                    Err(Thrown::with_frames(
                        "fatal",
                        vec![StackFrame::new("Deep", "blowUp", "deep.rs", 7)],
                    ))
                }),
        )
        .register(maker.classes());

    let settings = MockCreationSettings::new(TypeDesc::Class(target));
    let spy = maker.create_mock(&settings, calls_real()).unwrap();

    let err = maker.invoke(&spy, "throwException", &[]).unwrap_err();
    assert_eq!(err.message, "fatal");
    // Exactly one frame on the target type, none from the dispatch
    // machinery, and the real origin frame is intact.
    assert_eq!(err.frames_of_type("ExceptionThrowingClass").len(), 1);
    assert!(err
        .frames
        .iter()
        .all(|f| f.type_name != mirage_engine::dispatch::DISPATCHER_TYPE));
    assert_eq!(err.frames[0].type_name, "Deep");
}

#[test]
fn test_handler_throw_without_real_call_is_untouched() {
    struct Throwing;
    impl MockHandler for Throwing {
        fn handle(&self, _: &mut dyn Invocation) -> CallResult {
            Err(Thrown::new("stubbed failure"))
        }
    }

    let maker = MockMaker::new();
    let target = sample_class(&maker);
    let settings = MockCreationSettings::new(TypeDesc::Class(target));
    let mock = maker.create_mock(&settings, Arc::new(Throwing)).unwrap();

    let err = maker.invoke(&mock, "foo", &[]).unwrap_err();
    assert_eq!(err.message, "stubbed failure");
    assert!(err.frames.is_empty());
}

#[test]
fn test_clear_mock_restores_real_behavior() {
    let maker = MockMaker::new();
    let target = sample_class(&maker);
    let settings = MockCreationSettings::new(TypeDesc::Class(target));
    let mock = maker.create_mock(&settings, returns(Value::str("bar"))).unwrap();
    assert_eq!(maker.invoke(&mock, "foo", &[]), Ok(Value::str("bar")));

    maker.clear_mock(&mock);
    let handler = maker.get_handler(&mock).unwrap();
    assert!(DisabledHandler::is_disabled(&handler));
    // Intercepted override retained the original body.
    assert_eq!(maker.invoke(&mock, "foo", &[]), Ok(Value::str("foo")));
}

#[test]
fn test_cleared_interface_mock_answers_null() {
    let maker = MockMaker::new();
    let iface = ClassBuilder::interface("SampleInterface")
        .method(MethodDef::new("count").returns("i32"))
        .register(maker.classes());
    let settings = MockCreationSettings::new(TypeDesc::Class(iface));
    let mock = maker.create_mock(&settings, returns(Value::I32(10))).unwrap();

    maker.clear_mock(&mock);
    // No real body exists for an interface method.
    assert_eq!(maker.invoke(&mock, "count", &[]), Ok(Value::Null));
}

#[test]
fn test_clear_all_mocks_spares_later_mocks() {
    let maker = MockMaker::new();
    let target = sample_class(&maker);
    let settings = MockCreationSettings::new(TypeDesc::Class(target));
    let a = maker.create_mock(&settings, returns(Value::str("a"))).unwrap();
    let b = maker.create_mock(&settings, returns(Value::str("b"))).unwrap();

    maker.clear_all_mocks();
    assert_eq!(maker.invoke(&a, "foo", &[]), Ok(Value::str("foo")));
    assert_eq!(maker.invoke(&b, "foo", &[]), Ok(Value::str("foo")));

    let c = maker.create_mock(&settings, returns(Value::str("c"))).unwrap();
    assert_eq!(maker.invoke(&c, "foo", &[]), Ok(Value::str("c")));
}

#[test]
fn test_primitive_mock_error_message() {
    let maker = MockMaker::new();
    let settings = MockCreationSettings::new(TypeDesc::Primitive(PrimitiveKind::I32));
    let err = maker.create_mock(&settings, returns(Value::Null)).unwrap_err();
    assert_eq!(err.to_string(), "Could not modify all classes [i32]");
}

#[test]
fn test_array_mock_error_message() {
    let maker = MockMaker::new();
    let elem = ClassBuilder::class("Elem").register(maker.classes());
    let settings = MockCreationSettings::new(TypeDesc::array(TypeDesc::Class(elem)));
    let err = maker.create_mock(&settings, returns(Value::Null)).unwrap_err();
    assert_eq!(err.to_string(), "Arrays cannot be mocked");
}

#[test]
fn test_wrapper_and_string_mock_error_message() {
    let maker = MockMaker::new();
    for ty in [TypeDesc::Wrapper(PrimitiveKind::I64), TypeDesc::Str, TypeDesc::Meta] {
        let settings = MockCreationSettings::new(ty);
        let err = maker.create_mock(&settings, returns(Value::Null)).unwrap_err();
        assert_eq!(
            err,
            MockError::Unmockable {
                reason: "Cannot mock wrapper types, String.class or Class.class".to_string()
            }
        );
    }
}

#[test]
fn test_unmodifiable_class_mock_error_message() {
    let maker = MockMaker::new();
    let target = ClassBuilder::class("Pinned").unmodifiable().register(maker.classes());
    let settings = MockCreationSettings::new(TypeDesc::Class(target));
    let err = maker.create_mock(&settings, returns(Value::Null)).unwrap_err();
    assert_eq!(err.to_string(), "Could not modify all classes [Pinned]");
}

#[test]
fn test_sealed_class_with_serialization_is_unsupported() {
    let maker = MockMaker::new();
    let target = ClassBuilder::class("FinalClass").sealed().register(maker.classes());
    let settings = MockCreationSettings::new(TypeDesc::Class(target))
        .serializable(SerializableMode::Basic);
    let err = maker.create_mock(&settings, returns(Value::Null)).unwrap_err();
    assert_eq!(
        err.to_string(),
        "Unsupported settings with this type 'FinalClass': serialization and extra \
         interfaces are not supported with in-place class transformation"
    );
}

#[test]
fn test_sealed_class_with_extra_interfaces_is_unsupported() {
    let maker = MockMaker::new();
    let target = ClassBuilder::class("FinalClass").sealed().register(maker.classes());
    let iface = ClassBuilder::interface("Marker").register(maker.classes());
    let settings = MockCreationSettings::new(TypeDesc::Class(target)).extra_interface(iface);
    let err = maker.create_mock(&settings, returns(Value::Null)).unwrap_err();
    assert!(matches!(err, MockError::UnsupportedSettings { .. }));
}

#[test]
fn test_open_class_mock_with_serialization_and_extra_interfaces() {
    let maker = MockMaker::new();
    let target = sample_class(&maker);
    let iface = ClassBuilder::interface("Marker").register(maker.classes());
    let settings = MockCreationSettings::new(TypeDesc::Class(target))
        .extra_interface(iface)
        .serializable(SerializableMode::Basic);
    let mock = maker.create_mock(&settings, returns(Value::str("bar"))).unwrap();

    let mock_class = maker.classes().get(mock.class_id()).unwrap();
    assert!(mock_class.interfaces.contains(&iface));
    assert!(mock_class.serializable);
    assert_eq!(maker.invoke(&mock, "foo", &[]), Ok(Value::str("bar")));
}

#[test]
fn test_analyzer_agrees_with_creation_gate() {
    let maker = MockMaker::new();
    let target = sample_class(&maker);

    assert!(maker.is_type_mockable(&TypeDesc::Class(target)).mockable());
    assert!(!maker
        .is_type_mockable(&TypeDesc::Primitive(PrimitiveKind::Bool))
        .mockable());
    assert!(!maker.is_type_mockable(&TypeDesc::Str).mockable());
}

#[test]
fn test_dropped_mock_entry_is_pruned() {
    let maker = MockMaker::new();
    let target = sample_class(&maker);
    let settings = MockCreationSettings::new(TypeDesc::Class(target));
    let mock = maker.create_mock(&settings, returns(Value::Null)).unwrap();
    assert_eq!(maker.mocks().len(), 1);

    drop(mock);
    maker.mocks().prune_dead();
    assert!(maker.mocks().is_empty());
}
