//! Tests for session-level operations: settings, representations and the
//! function index

mod common;

use common::FakeTarget;
use svmprobe_core::config::SettingOutcome;
use svmprobe_core::error::{InspectError, InspectResult};
use svmprobe_core::functions::select;
use svmprobe_core::types::{
    FieldDescriptor, ObjectHandle, PrimitiveKind, Scalar, TypeDescriptor, TypeKind, Value, ValueType,
};
use svmprobe_core::visual::{ClassNode, DecodeContext, HighLevelRepresentation, VisualNode};
use svmprobe_core::Session;

struct PointRepresentation;

impl HighLevelRepresentation for PointRepresentation
{
    fn type_name(&self) -> &str
    {
        "com.example.Point"
    }

    fn represent(&self, ctx: &mut DecodeContext<'_>, object: &ClassNode) -> InspectResult<VisualNode>
    {
        let coordinate = |name: &str| -> InspectResult<String> {
            Ok(ctx
                .target
                .read_field(&object.handle, name)?
                .as_scalar()
                .map(|scalar| scalar.to_string())
                .unwrap_or_default())
        };
        Ok(VisualNode::ConstLabel(format!("Point({}, {})", coordinate("x")?, coordinate("y")?)))
    }
}

fn point(target: &mut FakeTarget) -> Value
{
    target.define_class("com.example.Point", &[
        ("x", ValueType::Primitive(PrimitiveKind::Int)),
        ("y", ValueType::Primitive(PrimitiveKind::Int)),
    ]);
    let point = target.new_object("com.example.Point");
    target.write_i32(point + 8, 3);
    target.write_i32(point + 16, 4);
    Value::Reference(ObjectHandle::new(point, "com.example.Point"))
}

#[test]
fn test_settings_change_rendering()
{
    let mut target = FakeTarget::new();
    let array = target.new_int_array(&[1, 2, 3, 4]);
    let value = Value::Reference(ObjectHandle::new(array, "int[]"));
    let mut session = Session::default();

    assert_eq!(
        session.apply_setting("svm-print-array-limit", "2").unwrap(),
        SettingOutcome::Changed("svm-print-array-limit".parse().unwrap())
    );
    assert_eq!(session.render(&target, &value).unwrap(), "int[4] = {1, 2, ...}");

    session.apply_setting("svm-print-address", "on").unwrap();
    assert_eq!(session.render(&target, &value).unwrap(), format!("int[4] @ {array} = {{1, 2, ...}}"));

    session.apply_setting("svm-print", "off").unwrap();
    assert_eq!(session.render(&target, &value).unwrap(), format!("(int[] *) {array}"));
}

#[test]
fn test_setting_errors()
{
    let mut session = Session::default();
    assert_eq!(
        session.apply_setting("svm-frobnicate", "on"),
        Err(InspectError::UnknownSetting("svm-frobnicate".to_string()))
    );
    assert!(matches!(
        session.apply_setting("svm-print-array-limit", "lots"),
        Err(InspectError::InvalidSetting { .. })
    ));
    assert_eq!(
        session.apply_setting("svm-selfref-check", "").unwrap(),
        SettingOutcome::Report("svm-selfref-check is enabled".to_string())
    );
}

#[test]
fn test_static_fields_switch()
{
    let mut target = FakeTarget::new();
    let storage = target.alloc(8);
    target.write_i32(storage, 5);
    target.define(
        TypeDescriptor::new("Counter", TypeKind::Object)
            .with_field(FieldDescriptor::instance("__hub__", 0, ValueType::reference(common::CLASS_TYPE)))
            .with_field(FieldDescriptor::instance("count", 8, ValueType::Primitive(PrimitiveKind::Int)))
            .with_field(FieldDescriptor::static_at(
                "INSTANCES",
                storage,
                ValueType::Primitive(PrimitiveKind::Int),
            )),
    );
    let counter = target.new_object("Counter");
    target.write_i32(counter + 8, 1);
    let value = Value::Reference(ObjectHandle::new(counter, "Counter"));

    let mut session = Session::default();
    assert_eq!(session.render(&target, &value).unwrap(), "Counter = {count = 1}");
    session.apply_setting("svm-print-static-fields", "enable").unwrap();
    assert_eq!(session.render(&target, &value).unwrap(), "Counter = {count = 1, INSTANCES = 5}");
}

#[test]
fn test_custom_representation()
{
    let mut target = FakeTarget::new();
    let value = point(&mut target);
    let mut session = Session::default();
    session.register_representation(Box::new(PointRepresentation)).unwrap();

    assert_eq!(session.render(&target, &value).unwrap(), "com.example.Point = {x = 3, y = 4}");
    session.apply_setting("svm-use-hlrep", "on").unwrap();
    assert_eq!(session.render(&target, &value).unwrap(), "Point(3, 4)");

    assert_eq!(
        session.register_representation(Box::new(PointRepresentation)),
        Err(InspectError::DuplicateRepresentation("com.example.Point".to_string()))
    );
}

#[test]
fn test_decode_through_session()
{
    let mut target = FakeTarget::new();
    let value = point(&mut target);
    let mut session = Session::default();

    let Some(VisualNode::ClassValue(node)) = session.decode(&target, &value).unwrap() else {
        panic!("expected an object node");
    };
    assert_eq!(node.type_name, "com.example.Point");
    assert_eq!(node.fields.len(), 2);
    assert_eq!(session.decode(&target, &Value::Scalar(Scalar::Long(1))).unwrap(), None);
}

#[test]
fn test_function_search()
{
    let mut target = FakeTarget::new();
    target.listing = vec![
        "All defined functions:".into(),
        "File java/util/ArrayList.java:".into(),
        "static void java.util.ArrayList.add(java.lang.Object);".into(),
        "static void java.util.ArrayList.clear();".into(),
        "static int java.util.HashMap.hash(java.lang.Object);".into(),
        "File RuntimeCompiledMethod at 0x7f0000001000:".into(),
    ];
    let mut session = Session::default();

    let found = session.search_functions(&target, "arraylist");
    assert_eq!(found, vec!["java.util.ArrayList.add(java.lang.Object)", "java.util.ArrayList.clear()"]);
    let found: Vec<&str> = found.iter().map(String::as_str).collect();
    assert_eq!(select(&found, "-1"), Some(vec!["java.util.ArrayList.clear()"]));

    assert_eq!(session.installed_code(&target), vec!["RuntimeCompiledMethod at 0x7f0000001000"]);

    // The index is cached until reset.
    target.listing.push("static void java.util.ArrayList.trimToSize();".into());
    assert_eq!(session.search_functions(&target, "trim").len(), 0);
    session.reset_functions();
    assert_eq!(session.search_functions(&target, "trim"), vec!["java.util.ArrayList.trimToSize()"]);
}

#[test]
fn test_attach_drops_state()
{
    let mut target = FakeTarget::new();
    target.set_variable("answer", Value::Scalar(Scalar::Int(42)));
    let mut session = Session::default();

    session.evaluate(&target, "answer").unwrap();
    assert!(session.last().is_some());
    session.attach(&target);
    assert!(session.last().is_none());
    assert_eq!(session.decorator().decorate(&Default::default()).function, "Unknown Frame at 0x0");
}
