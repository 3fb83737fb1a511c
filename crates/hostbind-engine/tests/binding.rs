//! End-to-end binding against the fixture host.

mod common;

use std::rc::Rc;

use hostbind_engine::bind::{accepts, Acceptance, OperatorOutcome, ROOT_CLASS};
use hostbind_engine::runtime::Member;
use hostbind_engine::{BindError, BindingConfig, FailurePolicy, TypeInfo, Value};
use hostbind_sdk::{HostInterface, Variant, VariantOperator, VariantType};

use common::{runtime, runtime_with};

// ============================================================================
// Module globals
// ============================================================================

#[test]
fn test_global_enum_and_utility() {
    let (_host, mut rt) = runtime();

    let failed = rt.global("FAILED").unwrap();
    assert_eq!(failed.as_int(), Some(1));

    let absf = rt.global("absf").unwrap();
    let result = rt.call(&absf, vec![Value::Int(-3)]).unwrap();
    assert_eq!(result.as_float(), Some(3.0));

    let err = rt.call(&absf, vec![Value::str("x")]).unwrap_err();
    assert!(matches!(err, BindError::Argument { .. }), "{}", err);
}

#[test]
fn test_stub_fails_only_when_invoked() {
    let (_host, mut rt) = runtime();
    // no call key: binds, but cannot run
    let print_rich = rt.global("print_rich").unwrap();
    let err = rt.call(&print_rich, vec![Value::str("hi")]).unwrap_err();
    assert!(matches!(err, BindError::NotImplemented(_)), "{}", err);

    let node = rt.global("Node").unwrap();
    let node_type = node.as_type().unwrap();
    let method = rt
        .types()
        .find_member(node_type, "queue_free")
        .and_then(|m| m.as_method().cloned())
        .unwrap();
    assert!(method.is_stub());
}

#[test]
fn test_unknown_global() {
    let (_host, mut rt) = runtime();
    let err = rt.global("NoSuchThing").unwrap_err();
    assert!(matches!(err, BindError::Attribute { .. }));
}

// ============================================================================
// Value types
// ============================================================================

#[test]
fn test_constructor_overloads() {
    let (_host, mut rt) = runtime();
    let vector = rt.global("Vector2").unwrap();

    let zero = rt.call(&vector, Vec::new()).unwrap();
    assert_eq!(rt.get_attr(&zero, "x").unwrap().as_float(), Some(0.0));

    // ints are accepted where floats are declared
    let v = rt.call(&vector, vec![Value::Int(3), Value::Float(4.0)]).unwrap();
    assert_eq!(rt.get_attr(&v, "x").unwrap().as_float(), Some(3.0));
    let length = rt.call_method(&v, "length", Vec::new()).unwrap();
    assert_eq!(length.as_float(), Some(5.0));

    let vector_i = rt.global("Vector2i").unwrap();
    let err = rt.call(&vector_i, vec![Value::str("a")]).unwrap_err();
    let text = err.to_string();
    assert!(text.contains("(int, int)"), "{}", text);
    assert!(text.contains("(Vector2)"), "{}", text);

    let from_vector = rt.call(&vector_i, vec![v]).unwrap();
    assert_eq!(rt.type_name(&from_vector), "Vector2i");
}

#[test]
fn test_component_write_keeps_identity() {
    let (_host, mut rt) = runtime();
    let vector = rt.global("Vector2").unwrap();
    let v = rt.call(&vector, vec![Value::Float(1.0), Value::Float(2.0)]).unwrap();
    let alias = v.clone();
    rt.set_attr(&v, "y", Value::Int(7)).unwrap();
    assert_eq!(rt.get_attr(&alias, "y").unwrap().as_float(), Some(7.0));
}

#[test]
fn test_equality_against_own_type_and_variant() {
    let (_host, mut rt) = runtime();
    let vector = rt.global("Vector2").unwrap();
    let a = rt.call(&vector, vec![Value::Float(1.0), Value::Float(2.0)]).unwrap();
    let b = rt.call(&vector, vec![Value::Float(1.0), Value::Float(2.0)]).unwrap();

    let same = rt.eval_binary(VariantOperator::Equal, &a, &b).unwrap();
    assert!(same.same(&Value::Bool(true)));

    // any right operand goes through the Variant entry
    let other = rt.eval_binary(VariantOperator::Equal, &a, &Value::Int(3)).unwrap();
    assert!(other.same(&Value::Bool(false)));

    let outcome = rt
        .apply_operator(VariantOperator::Less, &a, &b)
        .unwrap();
    assert!(matches!(outcome, OperatorOutcome::NotSupported));

    let err = rt.eval_binary(VariantOperator::Less, &a, &b).unwrap_err();
    assert!(matches!(err, BindError::UnsupportedOperand { .. }), "{}", err);
}

#[test]
fn test_arithmetic_operators() {
    let (_host, mut rt) = runtime();
    let vector = rt.global("Vector2").unwrap();
    let a = rt.call(&vector, vec![Value::Float(1.0), Value::Float(2.0)]).unwrap();

    let sum = rt.eval_binary(VariantOperator::Add, &a, &a).unwrap();
    assert_eq!(rt.get_attr(&sum, "y").unwrap().as_float(), Some(4.0));

    // int * Vector2 only exists on the int record
    let scaled = rt.eval_binary(VariantOperator::Multiply, &Value::Int(3), &a).unwrap();
    assert_eq!(rt.get_attr(&scaled, "x").unwrap().as_float(), Some(3.0));

    let negated = rt.eval_unary(VariantOperator::Negate, &a).unwrap();
    assert_eq!(rt.get_attr(&negated, "x").unwrap().as_float(), Some(-1.0));

    // in-place add keeps the instance
    let alias = a.clone();
    let result = rt.eval_inplace(VariantOperator::Add, &a, &sum).unwrap();
    assert!(result.same(&alias));
    assert_eq!(rt.get_attr(&alias, "x").unwrap().as_float(), Some(3.0));
}

#[test]
fn test_typed_array_element_must_match() {
    let (_host, mut rt) = runtime();
    let node_array = TypeInfo::Array(Some(Box::new(TypeInfo::Object("Node".to_string()))));
    let int_array = TypeInfo::Array(Some(Box::new(TypeInfo::Builtin(VariantType::Int))));

    let ints = rt
        .from_variant(Variant::Array(vec![Variant::Int(1)]), Some(&int_array))
        .unwrap();
    assert_eq!(accepts(&rt, &node_array, &ints), Acceptance::Rejected);
    assert_eq!(accepts(&rt, &int_array, &ints), Acceptance::Exact);
    assert_eq!(accepts(&rt, &node_array, &Value::List(vec![Value::Int(1)])), Acceptance::Rejected);

    // untyped host arrays are checked by the host on the call
    let untyped = rt.from_variant(Variant::Array(vec![Variant::Int(1)]), None).unwrap();
    assert_eq!(accepts(&rt, &node_array, &untyped), Acceptance::Implicit);
    assert_eq!(accepts(&rt, &TypeInfo::Array(None), &ints), Acceptance::Exact);
}

// ============================================================================
// Object classes
// ============================================================================

#[test]
fn test_classes_bind_lazily_with_ancestors() {
    let (_host, mut rt) = runtime();
    assert!(!rt.is_class_bound("Node"));

    let sprite = rt.global("Sprite").unwrap().as_type().unwrap();
    assert!(rt.is_class_bound("Node"));
    assert!(rt.is_class_bound(ROOT_CLASS));

    let names: Vec<String> = rt
        .types()
        .mro(sprite)
        .into_iter()
        .map(|id| rt.types().name(id).to_string())
        .collect();
    assert_eq!(names, vec!["Sprite", "Node", "Object"]);

    // inherited members resolve through the chain
    assert!(rt.types().find_member(sprite, "get_name").is_some());
    assert!(rt.types().find_member(sprite, "free").is_some());
}

#[test]
fn test_bind_is_idempotent() {
    let (_host, mut rt) = runtime();
    let first = rt.bind_class("Node").unwrap().unwrap();
    let members = rt.types().get(first).members.len();
    let second = rt.bind_class("Node").unwrap().unwrap();
    assert_eq!(first, second);
    assert_eq!(rt.types().get(second).members.len(), members);

    // a rebind keeps the identity
    let rebound = rt.rebind_class("Node").unwrap().unwrap();
    assert_eq!(rebound, first);
    assert_eq!(rt.types().get(rebound).members.len(), members);
}

#[test]
fn test_best_effort_skips_broken_member() {
    let (_host, mut rt) = runtime();
    let sprite = rt.bind_class("Sprite").unwrap().unwrap();
    assert!(rt.types().find_member(sprite, "get_texture_hint").is_none());
    assert!(rt.types().find_member(sprite, "get_position").is_some());
    assert!(rt
        .diagnostics()
        .iter()
        .any(|d| d.context == "Sprite.get_texture_hint"));
}

#[test]
fn test_strict_policy_aborts_bind() {
    let config = BindingConfig::default().with_policy(FailurePolicy::Strict);
    let (_host, mut rt) = runtime_with(config);
    let err = rt.bind_class("Sprite").unwrap_err();
    assert!(matches!(err, BindError::UnknownType(_)), "{}", err);
    assert!(!rt.is_class_bound("Sprite"));
    // ancestors were fine on their own
    assert!(rt.is_class_bound("Node"));
}

#[test]
fn test_broken_enum_is_skipped_under_best_effort() {
    let (_host, mut rt) = runtime();
    let label = rt.bind_class("Label").unwrap().unwrap();
    assert!(rt.types().find_member(label, "Align").is_some());
    assert!(rt.types().find_member(label, "ALIGN_RIGHT").is_some());
    assert!(rt.types().find_member(label, "Wrap").is_none());
    assert!(rt.diagnostics().iter().any(|d| d.context == "Label.Wrap"));

    let (_host, mut rt) = runtime();
    let err = rt
        .bind_class_with_policy("Label", FailurePolicy::Strict)
        .unwrap_err();
    assert!(matches!(err, BindError::DuplicateMember { .. }), "{}", err);
}

#[test]
fn test_policy_override_per_bind() {
    let (_host, mut rt) = runtime();
    let err = rt
        .bind_class_with_policy("Sprite", FailurePolicy::Strict)
        .unwrap_err();
    assert!(matches!(err, BindError::UnknownType(_)));
    assert_eq!(rt.policy(), FailurePolicy::BestEffort);
    assert!(rt.bind_class("Sprite").unwrap().is_some());
}

#[test]
fn test_object_properties_and_methods() {
    let (host, mut rt) = runtime();
    let node_type = rt.global("Node").unwrap();
    let node = rt.call(&node_type, Vec::new()).unwrap();

    rt.set_attr(&node, "name", Value::str("player")).unwrap();
    assert_eq!(rt.get_attr(&node, "name").unwrap().as_str(), Some("player"));

    let get_name = rt.get_attr(&node, "get_name").unwrap();
    assert_eq!(rt.call(&get_name, Vec::new()).unwrap().as_str(), Some("player"));

    // unbound form takes the receiver first
    let unbound = rt.get_attr(&node_type, "get_name").unwrap();
    let name = rt.call(&unbound, vec![node.clone()]).unwrap();
    assert_eq!(name.as_str(), Some("player"));

    let ready = rt.get_attr(&node_type, "NOTIFICATION_READY").unwrap();
    assert_eq!(ready.as_int(), Some(13));

    let obj = node.as_object().unwrap().clone();
    let id = obj.id().unwrap();
    assert!(host.is_alive(id));
    rt.call_method(&node, "free", Vec::new()).unwrap();
    assert!(!host.is_alive(id));
    assert!(obj.is_released());
}

#[test]
fn test_compound_property_writes_back() {
    let (host, mut rt) = runtime();
    let sprite_type = rt.global("Sprite").unwrap();
    let sprite = rt.call(&sprite_type, Vec::new()).unwrap();

    let position = rt.get_attr(&sprite, "position").unwrap();
    rt.set_attr(&position, "x", Value::Float(5.0)).unwrap();

    let id = sprite.as_object().unwrap().id().unwrap();
    let stored = host
        .method_bind("Sprite", "get_position", 310)
        .map(|get| get(Some(id), &[]).unwrap())
        .unwrap();
    assert_eq!(stored, common::vec2(5.0, 0.0));
}

#[test]
fn test_wrapper_identity_is_stable() {
    let (host, mut rt) = runtime();
    let id = host.construct_object("Node").unwrap();
    let a = rt.wrap_object(id).unwrap();
    let b = rt.wrap_object(id).unwrap();
    assert!(std::rc::Rc::ptr_eq(&a, &b));
    assert_eq!(rt.types().name(a.class()), "Node");
}

#[test]
fn test_dropped_wrappers_leave_the_map() {
    let (_host, mut rt) = runtime();
    let node = rt.global("Node").unwrap().as_type().unwrap();
    let first = rt.instantiate(node).unwrap();
    let count = rt.wrapper_count();
    drop(first);

    let second = rt.instantiate(node).unwrap();
    assert_eq!(rt.wrapper_count(), count);
    assert_eq!(rt.live_object_count(), count);
    assert!(Rc::ptr_eq(&rt.wrap_object(second.id().unwrap()).unwrap(), &second));
}

#[test]
fn test_value_type_surface_published() {
    let (_host, rt) = runtime();
    let id = rt.value_type_id(VariantType::Vector2);
    let record = rt.types().get(id);
    assert!(matches!(record.members.get("x"), Some(Member::Property(_))));
    assert!(matches!(record.members.get("length"), Some(Member::Method(_))));
    assert!(record.constructor.is_some());
}
