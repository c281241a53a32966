//! Integration tests for key-value coding and generated accessors

mod common;

use std::sync::Arc;

use common::{bridge_with, MockRuntime, Notification};
use raya_objc::{
    Bridge, BridgeError, ChangeKind, HostMethod, HostObject, MethodKind, MethodRole,
    NotificationPolicy, ObjectId, ProxyId, Receiver, Value,
};
use tempfile::TempDir;

const OBJ: ObjectId = ObjectId(11);

/// Bridge with a host subclass `Model < NSObject`
fn model_fixture() -> (TempDir, Arc<MockRuntime>, Bridge, ProxyId) {
    let temp = TempDir::new().unwrap();
    let runtime = MockRuntime::foundation();
    let mut bridge = bridge_with(&runtime, temp.path());
    let object = bridge.require_class("NSObject").unwrap();
    let model = bridge.define_subclass("Model", object).unwrap();
    (temp, runtime, bridge, model)
}

fn change(key: &str) -> Vec<Notification> {
    vec![
        Notification::Will(OBJ, key.to_string()),
        Notification::Did(OBJ, key.to_string()),
    ]
}

#[test]
fn test_missing_key_names_type_and_key() {
    let (_temp, _runtime, bridge, model) = model_fixture();
    let mut object = HostObject::new(OBJ, model);

    let err = bridge.value_for_key(&mut object, "foo").unwrap_err();
    match &err {
        BridgeError::NotKeyValueCodingCompliant { class, key } => {
            assert_eq!(class, "Model");
            assert_eq!(key, "foo");
        }
        other => panic!("Expected NotKeyValueCodingCompliant, got {:?}", other),
    }
    assert!(err.to_string().contains("\"foo\""));

    let err = bridge
        .set_value_for_key(&mut object, Value::Int(1), "foo")
        .unwrap_err();
    assert!(matches!(err, BridgeError::NotKeyValueCodingCompliant { .. }));
}

#[test]
fn test_value_for_key_falls_back_to_predicate() {
    let (_temp, _runtime, mut bridge, model) = model_fixture();
    bridge
        .define_method(
            model,
            "enabled?",
            MethodKind::Instance,
            HostMethod::new(0, |_, _| Ok(Value::Bool(true))),
        )
        .unwrap();

    let mut object = HostObject::new(OBJ, model);
    assert_eq!(
        bridge.value_for_key(&mut object, "enabled").unwrap(),
        Value::Bool(true)
    );
}

#[test]
fn test_writer_notifies_when_runtime_asks() {
    let (_temp, runtime, mut bridge, model) = model_fixture();
    bridge.kvc_accessor(model, &["title"]).unwrap();

    let mut object = HostObject::new(OBJ, model);
    bridge
        .send(&mut object, "title=", &[Value::from("Hello")])
        .unwrap();

    assert_eq!(runtime.notifications(), change("title"));
    assert_eq!(
        bridge.value_for_key(&mut object, "title").unwrap(),
        Value::from("Hello")
    );
}

#[test]
fn test_writer_respects_notification_policy() {
    let (_temp, runtime, mut bridge, model) = model_fixture();
    bridge.kvc_accessor(model, &["title", "count", "flag"]).unwrap();
    bridge
        .set_notification_policy(model, "title", NotificationPolicy::Never)
        .unwrap();
    bridge
        .set_notification_policy(model, "count", NotificationPolicy::Always)
        .unwrap();
    runtime.set_auto_notify("count", false);
    runtime.set_auto_notify("flag", false);

    let mut object = HostObject::new(OBJ, model);

    bridge
        .send(&mut object, "title=", &[Value::from("quiet")])
        .unwrap();
    assert!(runtime.notifications().is_empty());
    assert_eq!(object.field("title"), Value::from("quiet"));

    bridge.send(&mut object, "count=", &[Value::Int(2)]).unwrap();
    assert_eq!(runtime.notifications(), change("count"));
    runtime.clear_notifications();

    // queryable and the runtime says no
    bridge.send(&mut object, "flag=", &[Value::Bool(true)]).unwrap();
    assert!(runtime.notifications().is_empty());
    assert_eq!(object.field("flag"), Value::Bool(true));
}

#[test]
fn test_policy_is_inherited() {
    let (_temp, runtime, mut bridge, model) = model_fixture();
    bridge.kvc_accessor(model, &["title"]).unwrap();
    bridge
        .set_notification_policy(model, "title", NotificationPolicy::Never)
        .unwrap();
    let sub = bridge.define_subclass("SubModel", model).unwrap();

    let mut object = HostObject::new(OBJ, sub);
    bridge.send(&mut object, "title=", &[Value::from("x")]).unwrap();
    assert!(runtime.notifications().is_empty());
}

#[test]
fn test_set_value_for_key_uses_raw_setter() {
    let (_temp, runtime, mut bridge, model) = model_fixture();
    bridge.kvc_accessor(model, &["title"]).unwrap();

    let mut object = HostObject::new(OBJ, model);
    bridge
        .set_value_for_key(&mut object, Value::from("direct"), "title")
        .unwrap();
    assert_eq!(object.field("title"), Value::from("direct"));
    assert!(runtime.notifications().is_empty());
}

#[test]
fn test_set_value_for_key_falls_back_to_setter() {
    let (_temp, runtime, mut bridge, model) = model_fixture();
    bridge.ib_outlets(model, &["delegate"]).unwrap();

    let mut object = HostObject::new(OBJ, model);
    bridge
        .set_value_for_key(&mut object, Value::Object(ObjectId(2)), "delegate")
        .unwrap();
    assert_eq!(object.field("delegate"), Value::Object(ObjectId(2)));
    assert!(runtime.notifications().is_empty());
}

#[test]
fn test_existing_setter_becomes_raw() {
    let (_temp, runtime, mut bridge, model) = model_fixture();
    bridge
        .define_method(
            model,
            "name=",
            MethodKind::Instance,
            HostMethod::new(1, |inv, args| {
                let upper = args[0].as_str().unwrap_or_default().to_uppercase();
                inv.receiver().set_field("name", Value::from(upper));
                Ok(Value::Nil)
            }),
        )
        .unwrap();
    bridge.kvc_writer(model, &["name"]).unwrap();

    let mut object = HostObject::new(OBJ, model);
    bridge.send(&mut object, "name=", &[Value::from("ada")]).unwrap();
    assert_eq!(object.field("name"), Value::from("ADA"));
    assert_eq!(runtime.notifications(), change("name"));
}

#[test]
fn test_hand_written_setter_keeps_wrapper() {
    let (_temp, runtime, mut bridge, model) = model_fixture();
    bridge.kvc_accessor(model, &["title"]).unwrap();
    let sub = bridge.define_subclass("SubModel", model).unwrap();

    bridge
        .define_method(
            sub,
            "title=",
            MethodKind::Instance,
            HostMethod::new(1, |inv, args| {
                let text = format!("sub:{}", args[0].as_str().unwrap_or_default());
                inv.receiver().set_field("title", Value::from(text));
                Ok(Value::Nil)
            }),
        )
        .unwrap();

    let mut sub_object = HostObject::new(OBJ, sub);
    bridge
        .send(&mut sub_object, "title=", &[Value::from("a")])
        .unwrap();
    assert_eq!(sub_object.field("title"), Value::from("sub:a"));
    assert_eq!(runtime.notifications(), change("title"));
    runtime.clear_notifications();

    // the superclass keeps its own raw setter
    let mut object = HostObject::new(OBJ, model);
    bridge.send(&mut object, "title=", &[Value::from("b")]).unwrap();
    assert_eq!(object.field("title"), Value::from("b"));
    assert_eq!(runtime.notifications(), change("title"));

    // raw access on the subclass uses the hand-written setter
    bridge
        .set_value_for_key(&mut sub_object, Value::from("c"), "title")
        .unwrap();
    assert_eq!(sub_object.field("title"), Value::from("sub:c"));
}

#[test]
fn test_redefining_setter_on_same_type() {
    let (_temp, runtime, mut bridge, model) = model_fixture();
    bridge.kvc_writer(model, &["title"]).unwrap();
    bridge
        .define_method(
            model,
            "title=",
            MethodKind::Instance,
            HostMethod::new(1, |inv, _| {
                inv.receiver().set_field("title", Value::from("fixed"));
                Ok(Value::Nil)
            }),
        )
        .unwrap();

    let visible = bridge
        .proxies()
        .find_method(model, "title=", MethodKind::Instance)
        .unwrap();
    let slots = bridge.proxies().find_setter_slots(model, "title").unwrap();
    assert!(visible.same_body(&slots.wrapper));
    assert!(!slots.raw.same_body(&slots.wrapper));
    assert_eq!(visible.role(), &MethodRole::KvcWrapper("title".to_string()));

    let mut object = HostObject::new(OBJ, model);
    bridge.send(&mut object, "title=", &[Value::from("x")]).unwrap();
    assert_eq!(object.field("title"), Value::from("fixed"));
    assert_eq!(runtime.notifications(), change("title"));
}

#[test]
fn test_array_accessor_operations() {
    let (_temp, runtime, mut bridge, model) = model_fixture();
    bridge.kvc_array_accessor(model, &["items"]).unwrap();

    let mut object = HostObject::new(OBJ, model);
    object.set_field("items", Value::Array(Vec::new()));

    bridge
        .send(
            &mut object,
            "insertObject_inItemsAtIndex",
            &[Value::from("a"), Value::Int(0)],
        )
        .unwrap();
    bridge
        .send(
            &mut object,
            "insertObject_inItemsAtIndex",
            &[Value::from("c"), Value::Int(1)],
        )
        .unwrap();
    assert_eq!(
        bridge.send(&mut object, "countOfItems", &[]).unwrap(),
        Value::Int(2)
    );
    assert_eq!(
        bridge
            .send(&mut object, "objectInItemsAtIndex", &[Value::Int(1)])
            .unwrap(),
        Value::from("c")
    );

    bridge
        .send(
            &mut object,
            "replaceObjectInItemsAtIndex_withObject",
            &[Value::Int(1), Value::from("b")],
        )
        .unwrap();
    bridge
        .send(&mut object, "removeObjectFromItemsAtIndex", &[Value::Int(0)])
        .unwrap();
    assert_eq!(object.field("items"), Value::Array(vec![Value::from("b")]));

    let indexed = |will: bool, kind: ChangeKind, index: usize| {
        let key = "items".to_string();
        if will {
            Notification::WillIndexed(OBJ, kind, vec![index], key)
        } else {
            Notification::DidIndexed(OBJ, kind, vec![index], key)
        }
    };
    assert_eq!(
        runtime.notifications(),
        vec![
            indexed(true, ChangeKind::Insertion, 0),
            indexed(false, ChangeKind::Insertion, 0),
            indexed(true, ChangeKind::Insertion, 1),
            indexed(false, ChangeKind::Insertion, 1),
            indexed(true, ChangeKind::Replacement, 1),
            indexed(false, ChangeKind::Replacement, 1),
            indexed(true, ChangeKind::Removal, 0),
            indexed(false, ChangeKind::Removal, 0),
        ]
    );
}

#[test]
fn test_array_accessor_exports() {
    let (_temp, runtime, mut bridge, model) = model_fixture();
    bridge.kvc_array_accessor(model, &["items"]).unwrap();

    let exported: Vec<(String, String)> = runtime
        .added_methods()
        .into_iter()
        .map(|e| (e.selector, e.encoding))
        .collect();
    for expected in [
        ("countOfItems", "i4@8:12"),
        ("objectInItemsAtIndex:", "@4@8:12i16"),
        ("insertObject:inItemsAtIndex:", "@4@8:12@16i20"),
        ("removeObjectFromItemsAtIndex:", "@4@8:12i16"),
        ("replaceObjectInItemsAtIndex:withObject:", "@4@8:12i16@20"),
    ] {
        assert!(
            exported.contains(&(expected.0.to_string(), expected.1.to_string())),
            "missing export {:?}",
            expected
        );
    }

    let mut object = HostObject::new(OBJ, model);
    object.set_field("items", Value::Array(vec![Value::Int(1), Value::Int(2)]));
    assert_eq!(
        bridge
            .dispatch_selector(&mut object, "countOfItems", &[])
            .unwrap(),
        Value::Int(2)
    );
}

#[test]
fn test_array_accessor_out_of_range() {
    let (_temp, runtime, mut bridge, model) = model_fixture();
    bridge.kvc_array_accessor(model, &["items"]).unwrap();

    let mut object = HostObject::new(OBJ, model);
    object.set_field("items", Value::Array(vec![Value::Int(1)]));

    let err = bridge
        .send(&mut object, "removeObjectFromItemsAtIndex", &[Value::Int(5)])
        .unwrap_err();
    assert!(matches!(
        err,
        BridgeError::IndexOutOfRange {
            index: 5,
            len: 1,
            ..
        }
    ));
    let err = bridge
        .send(
            &mut object,
            "insertObject_inItemsAtIndex",
            &[Value::Int(9), Value::Int(2)],
        )
        .unwrap_err();
    assert!(matches!(err, BridgeError::IndexOutOfRange { .. }));
    assert!(bridge
        .send(&mut object, "objectInItemsAtIndex", &[Value::Int(1)])
        .is_err());

    assert!(runtime.notifications().is_empty());
    assert_eq!(object.field("items"), Value::Array(vec![Value::Int(1)]));
}

#[test]
fn test_array_accessor_requires_array_field() {
    let (_temp, _runtime, mut bridge, model) = model_fixture();
    bridge.kvc_array_accessor(model, &["items"]).unwrap();

    let mut object = HostObject::new(OBJ, model);
    object.set_field("items", Value::Int(3));
    let err = bridge.send(&mut object, "countOfItems", &[]).unwrap_err();
    assert!(matches!(err, BridgeError::TypeMismatch { .. }));
}

#[test]
fn test_array_accessor_respects_policy() {
    let (_temp, runtime, mut bridge, model) = model_fixture();
    bridge.kvc_array_accessor(model, &["items"]).unwrap();
    bridge
        .set_notification_policy(model, "items", NotificationPolicy::Never)
        .unwrap();

    let mut object = HostObject::new(OBJ, model);
    object.set_field("items", Value::Array(Vec::new()));
    bridge
        .send(
            &mut object,
            "insertObject_inItemsAtIndex",
            &[Value::from("a"), Value::Int(0)],
        )
        .unwrap();
    assert!(runtime.notifications().is_empty());
    assert_eq!(object.field("items"), Value::Array(vec![Value::from("a")]));
}

#[test]
fn test_wrapper_accessors_route_to_runtime() {
    let (_temp, runtime, mut bridge, model) = model_fixture();
    runtime.set_response("valueForKey:", Value::from("from runtime"));
    bridge.kvc_wrapper(model, &["title"]).unwrap();

    let mut object = HostObject::new(OBJ, model);
    assert_eq!(
        bridge.send(&mut object, "title", &[]).unwrap(),
        Value::from("from runtime")
    );
    bridge.send(&mut object, "title=", &[Value::Int(4)]).unwrap();

    let sent = runtime.sent();
    assert_eq!(
        sent[0],
        (
            Receiver::Object(OBJ),
            "valueForKey:".to_string(),
            vec![Value::from("title")]
        )
    );
    assert_eq!(
        sent[1],
        (
            Receiver::Object(OBJ),
            "setValue:forKey:".to_string(),
            vec![Value::Int(4), Value::from("title")]
        )
    );
    assert!(object.field("title").is_nil());
}

#[test]
fn test_depends_on() {
    let (_temp, runtime, mut bridge, model) = model_fixture();
    bridge
        .kvc_depends_on(model, &["firstName", "lastName"], &["fullName", "initials"])
        .unwrap();

    let keys = Value::Array(vec![Value::from("firstName"), Value::from("lastName")]);
    let class = runtime.class("Model");
    assert_eq!(
        runtime.sent(),
        vec![
            (
                Receiver::Class(class),
                "setKeys:triggerChangeNotificationsForDependentKey:".to_string(),
                vec![keys.clone(), Value::from("fullName")]
            ),
            (
                Receiver::Class(class),
                "setKeys:triggerChangeNotificationsForDependentKey:".to_string(),
                vec![keys, Value::from("initials")]
            ),
        ]
    );
}

#[test]
fn test_array_accessor_defines_only_indexed_operations() {
    let (_temp, runtime, mut bridge, model) = model_fixture();
    bridge.kvc_array_accessor(model, &["items"]).unwrap();

    assert!(!bridge.responds_to(model, "items", MethodKind::Instance));
    assert!(!bridge.responds_to(model, "items=", MethodKind::Instance));
    assert!(bridge.proxies().find_setter_slots(model, "items").is_none());
    assert_eq!(runtime.added_methods().len(), 5);

    // a later hand-written setter stays a plain method
    bridge
        .define_method(
            model,
            "items=",
            MethodKind::Instance,
            HostMethod::new(1, |inv, args| {
                inv.receiver().set_field("items", args[0].clone());
                Ok(Value::Nil)
            }),
        )
        .unwrap();
    let mut object = HostObject::new(OBJ, model);
    bridge
        .send(&mut object, "items=", &[Value::Array(Vec::new())])
        .unwrap();
    assert_eq!(object.field("items"), Value::Array(Vec::new()));
    assert!(runtime.notifications().is_empty());
}

#[test]
fn test_array_accessor_leaves_unset_field_alone() {
    let (_temp, _runtime, mut bridge, model) = model_fixture();
    bridge.kvc_array_accessor(model, &["items"]).unwrap();

    let mut object = HostObject::new(OBJ, model);
    let err = bridge.send(&mut object, "countOfItems", &[]).unwrap_err();
    match err {
        BridgeError::TypeMismatch { expected, got } => {
            assert_eq!(expected, "array");
            assert_eq!(got, "nil");
        }
        other => panic!("Expected TypeMismatch, got {:?}", other),
    }
    assert!(!object.has_field("items"));
}

#[test]
fn test_setter_behind_wrapper_must_take_one_argument() {
    let (_temp, _runtime, mut bridge, model) = model_fixture();
    bridge.kvc_writer(model, &["title"]).unwrap();
    let before = bridge.proxies().find_setter_slots(model, "title").unwrap().raw.clone();

    let err = bridge
        .define_method(
            model,
            "title=",
            MethodKind::Instance,
            HostMethod::new(2, |_, _| Ok(Value::Nil)),
        )
        .unwrap_err();
    assert!(matches!(
        err,
        BridgeError::ArgumentCount {
            expected: 1,
            given: 2,
            ..
        }
    ));

    let slots = bridge.proxies().find_setter_slots(model, "title").unwrap();
    assert!(slots.raw.same_body(&before));
    let mut object = HostObject::new(OBJ, model);
    bridge.send(&mut object, "title=", &[Value::from("x")]).unwrap();
    assert_eq!(object.field("title"), Value::from("x"));
}
