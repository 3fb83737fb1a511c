//! User classes: definition, host registration, instances and reload.

mod common;

use std::cell::Cell;
use std::rc::Rc;

use hostbind_engine::script::{
    define_class, register_extension_class, Accessor, Base, ExposeParams, MethodDecl, ParamDecl,
    PropertyDecl, ScriptFn,
};
use hostbind_engine::{
    BindError, BindResult, BindingConfig, ClassDecl, Runtime, Script, ScriptLoader, Value,
};
use hostbind_sdk::{ErrorCode, PropertyUsage};

use common::{runtime, runtime_with};

const PATH: &str = "res://mover.gd";

fn body(f: impl Fn(&mut Runtime, &Value, Vec<Value>) -> BindResult<Value> + 'static) -> ScriptFn {
    Rc::new(f)
}

/// `Mover`, a Node script. Version 2 adds `y`.
fn mover(version: u32) -> ClassDecl {
    let mut decl = ClassDecl::new(PATH, "Mover", Base::Native("Node".to_string()))
        .property(PropertyDecl::new("x", "int").with_default(Value::Int(0)))
        .method(
            MethodDecl::new(
                "step",
                body(|rt: &mut Runtime, this: &Value, args: Vec<Value>| {
                    let x = rt.get_attr(this, "x")?.as_int().unwrap_or(0);
                    let by = args.first().and_then(Value::as_int).unwrap_or(1);
                    rt.set_attr(this, "x", Value::Int(x + by))?;
                    Ok(Value::Nil)
                }),
            )
            .with_param(ParamDecl::new("by", "int")),
        );
    if version > 1 {
        decl = decl.property(PropertyDecl::new("y", "int").with_default(Value::Int(2)));
    }
    decl
}

fn versioned_loader(version: Rc<Cell<u32>>) -> Rc<dyn ScriptLoader> {
    Rc::new(
        move |_rt: &mut Runtime, _path: &str, _source: Option<&str>| -> BindResult<Option<ClassDecl>> {
            Ok(Some(mover(version.get())))
        },
    )
}

fn node(rt: &mut Runtime) -> hostbind_engine::ObjectRef {
    let node = rt.global("Node").unwrap().as_type().unwrap();
    rt.instantiate(node).unwrap()
}

// ============================================================================
// Definition
// ============================================================================

#[test]
fn test_defined_class_runs_methods_on_host_objects() {
    let (_host, mut rt) = runtime();
    let class = define_class(&mut rt, mover(1)).unwrap();
    assert_eq!(rt.types().name(class), "Mover");
    assert_eq!(rt.scripts().class_by_name("Mover"), Some(class));

    let obj = node(&mut rt);
    hostbind_engine::script::set_script_class(&mut rt, &obj, class).unwrap();
    let value = Value::Object(obj.clone());

    assert_eq!(rt.get_attr(&value, "x").unwrap().as_int(), Some(0));
    rt.call_method(&value, "step", vec![Value::Int(4)]).unwrap();
    assert_eq!(rt.get_attr(&value, "x").unwrap().as_int(), Some(4));

    // host members stay reachable
    rt.set_attr(&value, "name", Value::str("mover")).unwrap();
    assert_eq!(rt.get_attr(&value, "name").unwrap().as_str(), Some("mover"));

    let err = rt
        .call_method(&value, "step", vec![Value::str("far")])
        .unwrap_err();
    assert!(matches!(err, BindError::Argument { .. }), "{}", err);
}

#[test]
fn test_exposed_class_is_a_global() {
    let (_host, mut rt) = runtime();
    let decl = mover(1).exposed(ExposeParams {
        as_global: true,
        ..Default::default()
    });
    let class = define_class(&mut rt, decl).unwrap();
    let global = rt.global("Mover").unwrap();
    assert_eq!(global.as_type(), Some(class));
    assert!(rt.global_names().iter().any(|name| name == "Mover"));
}

#[test]
fn test_bridge_type_for_more_derived_object() {
    let (_host, mut rt) = runtime();
    let class = define_class(&mut rt, mover(1)).unwrap();
    let sprite = rt.global("Sprite").unwrap().as_type().unwrap();
    let obj = rt.instantiate(sprite).unwrap();

    hostbind_engine::script::set_script_class(&mut rt, &obj, class).unwrap();
    assert_eq!(rt.types().name(obj.class()), "Mover(Sprite)");
    assert_eq!(rt.scripts().bridge_count(), 1);
    assert_eq!(rt.scripts().instance_class(obj.id().unwrap()), Some(class));

    // both sides of the bridge resolve
    let value = Value::Object(obj.clone());
    assert!(rt.has_attr(&value, "position"));
    assert!(rt.has_attr(&value, "step"));

    // a second object reuses the bridge
    let other = rt.instantiate(sprite).unwrap();
    hostbind_engine::script::set_script_class(&mut rt, &other, class).unwrap();
    assert_eq!(rt.scripts().bridge_count(), 1);
    assert_eq!(obj.class(), other.class());
}

// ============================================================================
// Host registration
// ============================================================================

fn gadget() -> ClassDecl {
    ClassDecl::new("res://gadget.gd", "Gadget", Base::Native("Node".to_string()))
        .as_extension()
        .constant("MAX_POWER", 9)
        .property(PropertyDecl::new("power", "float").with_default(Value::Float(1.0)))
        .method(
            MethodDecl::new(
                "boost",
                body(|_rt: &mut Runtime, _this: &Value, _args: Vec<Value>| Ok(Value::Float(2.0))),
            )
            .with_return("float"),
        )
        .signal("overheated", vec![("heat".to_string(), "int".to_string())])
}

#[test]
fn test_extension_class_is_registered_once() {
    let (host, mut rt) = runtime();
    let class = define_class(&mut rt, gadget()).unwrap();

    register_extension_class(&mut rt, class).unwrap();
    register_extension_class(&mut rt, class).unwrap();
    assert_eq!(host.register_class_calls("Gadget"), 1);
    assert!(rt.scripts().is_registered("Gadget"));

    let registered = host.registered_class("Gadget").unwrap();
    assert_eq!(registered.parent, "Node");
    assert!(registered.methods.contains_key("boost"));
    assert!(registered.methods.contains_key("_get_power"));
    assert!(registered.methods.contains_key("_set_power"));
    assert!(registered.signals.contains_key("overheated"));
    assert!(registered.constants.contains_key("MAX_POWER"));

    let power = registered
        .properties
        .iter()
        .find(|p| p.info.name == "power")
        .unwrap();
    assert_eq!(power.getter, "_get_power");
    assert_eq!(power.setter, "_set_power");
}

#[test]
fn test_redefined_extension_class_is_published_again() {
    let (host, mut rt) = runtime();
    let class = define_class(&mut rt, gadget()).unwrap();
    register_extension_class(&mut rt, class).unwrap();

    let changed = gadget().property(PropertyDecl::new("heat", "int"));
    let again = define_class(&mut rt, changed).unwrap();
    assert_eq!(again, class);
    register_extension_class(&mut rt, again).unwrap();

    assert_eq!(host.register_class_calls("Gadget"), 2);
    let registered = host.registered_class("Gadget").unwrap();
    assert!(registered.properties.iter().any(|p| p.info.name == "heat"));
}

#[test]
fn test_computed_property_registers_only_declared_accessors() {
    let (host, mut rt) = runtime();
    let decl = gadget().property(
        PropertyDecl::new("heat", "int").with_getter(Accessor::Function(body(
            |_rt: &mut Runtime, _this: &Value, _args: Vec<Value>| Ok(Value::Int(40)),
        ))),
    );
    let class = define_class(&mut rt, decl).unwrap();
    register_extension_class(&mut rt, class).unwrap();

    let registered = host.registered_class("Gadget").unwrap();
    assert!(registered.methods.contains_key("_get_heat"));
    assert!(!registered.methods.contains_key("_set_heat"));
    let heat = registered
        .properties
        .iter()
        .find(|p| p.info.name == "heat")
        .unwrap();
    assert_eq!(heat.getter, "_get_heat");
    assert_eq!(heat.setter, "");
}

#[test]
fn test_plain_class_cannot_be_registered() {
    let (_host, mut rt) = runtime();
    let class = define_class(&mut rt, mover(1)).unwrap();
    let err = register_extension_class(&mut rt, class).unwrap_err();
    assert!(matches!(err, BindError::ScriptClass(_)), "{}", err);
}

// ============================================================================
// Script resources
// ============================================================================

#[test]
fn test_reload_keeps_instances_and_identity() {
    let (_host, mut rt) = runtime();
    let version = Rc::new(Cell::new(1));
    let mut script = Script::new(PATH, versioned_loader(version.clone()));
    assert_eq!(script.load(&mut rt), ErrorCode::Ok);
    let class = script.class().unwrap();

    let obj = node(&mut rt);
    let instance = script.instance_create(&mut rt, &obj).unwrap();
    assert!(instance.set(&mut rt, "x", Value::Int(5)).unwrap());
    assert_eq!(script.live_instances(), 1);

    version.set(2);
    assert_eq!(script.reload(&mut rt, true), ErrorCode::Ok);
    assert_eq!(script.class(), Some(class));
    assert_eq!(obj.class(), class);

    let value = Value::Object(obj.clone());
    assert_eq!(rt.get_attr(&value, "x").unwrap().as_int(), Some(5));
    assert_eq!(rt.get_attr(&value, "y").unwrap().as_int(), Some(2));

    let same = rt.wrap_object(obj.id().unwrap()).unwrap();
    assert!(Rc::ptr_eq(&same, &obj));
}

#[test]
fn test_failed_load_is_reported_not_raised() {
    let (host, mut rt) = runtime();
    let loader: Rc<dyn ScriptLoader> = Rc::new(
        |_rt: &mut Runtime, _path: &str, _source: Option<&str>| -> BindResult<Option<ClassDecl>> {
            Err(BindError::Script("unexpected token".to_string()))
        },
    );
    let mut script = Script::new("res://broken.gd", loader);
    assert_eq!(script.load(&mut rt), ErrorCode::Failed);
    assert!(!script.is_valid());
    assert!(!script.can_instantiate(&rt));
    assert!(host
        .printed_errors()
        .iter()
        .any(|message| message.contains("unexpected token")));

    let obj = node(&mut rt);
    assert!(script.instance_create(&mut rt, &obj).is_err());
}

#[test]
fn test_unit_without_class_fails() {
    let (host, mut rt) = runtime();
    let loader: Rc<dyn ScriptLoader> = Rc::new(
        |_rt: &mut Runtime, _path: &str, _source: Option<&str>| -> BindResult<Option<ClassDecl>> {
            Ok(None)
        },
    );
    let mut script = Script::new("res://empty.gd", loader);
    assert_eq!(script.load(&mut rt), ErrorCode::Failed);
    assert!(!script.is_valid());
    assert!(host
        .printed_errors()
        .iter()
        .any(|message| message.contains("does not expose a class")));
}

#[test]
fn test_script_property_list_keeps_groups() {
    let (_host, mut rt) = runtime();
    let loader: Rc<dyn ScriptLoader> = Rc::new(
        |_rt: &mut Runtime, _path: &str, _source: Option<&str>| -> BindResult<Option<ClassDecl>> {
            Ok(Some(
                ClassDecl::new("res://stats.gd", "Stats", Base::Native("Node".to_string()))
                    .group("Health", "hp_")
                    .property(PropertyDecl::new("hp_max", "int").with_default(Value::Int(10)))
                    .subgroup("Regen", "hp_regen_")
                    .property(PropertyDecl::new("hp_regen_rate", "float")),
            ))
        },
    );
    let mut script = Script::new("res://stats.gd", loader);
    assert_eq!(script.load(&mut rt), ErrorCode::Ok);

    let list = script.script_property_list(&rt);
    let names: Vec<&str> = list.iter().map(|p| p.name.as_str()).collect();
    assert_eq!(names, vec!["stats.gd", "Health", "hp_max", "Regen", "hp_regen_rate"]);
    assert_eq!(list[0].usage, PropertyUsage::CATEGORY);
    assert_eq!(list[1].usage, PropertyUsage::GROUP);
    assert_eq!(list[3].usage, PropertyUsage::SUBGROUP);

    assert!(script.has_property_default_value(&rt, "hp_max"));
    assert!(!script.has_property_default_value(&rt, "hp_regen_rate"));
    let rate = script.property_default_value(&mut rt, "hp_regen_rate").unwrap();
    assert_eq!(rate.as_float(), Some(0.0));
    assert!(script.property_default_value(&mut rt, "nope").unwrap().is_nil());
    assert_eq!(script.instance_base_type(&rt), "Node");
}

#[test]
fn test_placeholders_follow_reload() {
    let config = BindingConfig::default().with_editor_hint(true);
    let (_host, mut rt) = runtime_with(config);
    let version = Rc::new(Cell::new(1));
    let mut script = Script::new(PATH, versioned_loader(version.clone()));
    assert_eq!(script.load(&mut rt), ErrorCode::Ok);
    assert!(!script.can_instantiate(&rt));

    let obj = node(&mut rt);
    script.placeholder_instance_create(&mut rt, &obj);
    {
        let placeholder = script.placeholder_mut(&obj).unwrap();
        assert_eq!(placeholder.get("x").unwrap().as_int(), Some(0));
        assert!(placeholder.set("x", Value::Int(3)));
        assert!(!placeholder.set("y", Value::Int(1)));
    }

    version.set(2);
    assert_eq!(script.reload(&mut rt, true), ErrorCode::Ok);
    let placeholder = script.placeholder(&obj).unwrap();
    assert_eq!(placeholder.get("x").unwrap().as_int(), Some(3));
    assert_eq!(placeholder.get("y").unwrap().as_int(), Some(2));
    assert!(placeholder.is_live());
}

#[test]
fn test_erased_placeholders_are_forgotten() {
    let config = BindingConfig::default().with_editor_hint(true);
    let (_host, mut rt) = runtime_with(config);
    let version = Rc::new(Cell::new(1));
    let mut script = Script::new(PATH, versioned_loader(version.clone()));
    assert_eq!(script.load(&mut rt), ErrorCode::Ok);

    let kept = node(&mut rt);
    let erased = node(&mut rt);
    let released = node(&mut rt);
    script.placeholder_instance_create(&mut rt, &kept);
    script.placeholder_instance_create(&mut rt, &erased);
    script.placeholder_instance_create(&mut rt, &released);
    // one placeholder per owner
    script.placeholder_instance_create(&mut rt, &kept);
    assert_eq!(script.placeholder_count(), 3);

    assert!(script.placeholder_erased(&erased));
    assert!(!script.placeholder_erased(&erased));
    assert!(script.placeholder(&erased).is_none());
    assert_eq!(script.placeholder_count(), 2);

    // owners released without an erase are dropped on the next refresh
    rt.release(&released).unwrap();
    version.set(2);
    assert_eq!(script.reload(&mut rt, true), ErrorCode::Ok);
    assert_eq!(script.placeholder_count(), 1);
    assert_eq!(script.placeholder(&kept).unwrap().get("y").unwrap().as_int(), Some(2));
}

// ============================================================================
// Script instances
// ============================================================================

fn listener() -> ClassDecl {
    ClassDecl::new("res://listener.gd", "Listener", Base::Native("Node".to_string()))
        .method(
            MethodDecl::new(
                "_notification",
                body(|rt: &mut Runtime, this: &Value, args: Vec<Value>| {
                    let what = args.into_iter().next().unwrap_or(Value::Nil);
                    rt.set_attr(this, "last", what)?;
                    Ok(Value::Nil)
                }),
            )
            .with_param(ParamDecl::untyped("what"))
            .as_virtual(),
        )
        .method(
            MethodDecl::new(
                "_save",
                body(|_rt: &mut Runtime, _this: &Value, _args: Vec<Value>| {
                    Err(BindError::Script("disk full".to_string()))
                }),
            )
            .with_return("Error")
            .as_virtual(),
        )
        .method(
            MethodDecl::new(
                "_load",
                body(|_rt: &mut Runtime, _this: &Value, _args: Vec<Value>| {
                    Err(BindError::Script("missing file".to_string()))
                }),
            )
            .as_virtual(),
        )
}

#[test]
fn test_notification_passes_named_constant() {
    let (_host, mut rt) = runtime();
    let class = define_class(&mut rt, listener()).unwrap();
    let obj = node(&mut rt);
    hostbind_engine::script::set_script_class(&mut rt, &obj, class).unwrap();
    let instance = hostbind_engine::ScriptInstance::new(&obj, class);

    instance.notification(&mut rt, 13).unwrap();
    let last = rt.get_attr(&Value::Object(obj.clone()), "last").unwrap();
    assert!(matches!(last, Value::Constant(ref c) if c.name == "NOTIFICATION_READY"));

    instance.notification(&mut rt, 99).unwrap();
    let last = rt.get_attr(&Value::Object(obj), "last").unwrap();
    assert!(matches!(last, Value::Int(99)));
}

#[test]
fn test_virtual_returning_error_enum_reports_failure() {
    let (host, mut rt) = runtime();
    let class = define_class(&mut rt, listener()).unwrap();
    let obj = node(&mut rt);
    hostbind_engine::script::set_script_class(&mut rt, &obj, class).unwrap();
    let instance = hostbind_engine::ScriptInstance::new(&obj, class);

    let save = instance.get_virtual(&rt, "_save").unwrap();
    let result = instance.call_virtual(&mut rt, &save, Vec::new()).unwrap();
    assert_eq!(result.as_int(), Some(1));
    assert!(host
        .printed_errors()
        .iter()
        .any(|message| message.contains("disk full")));

    // other virtuals propagate their errors
    let load = instance.get_virtual(&rt, "_load").unwrap();
    let err = instance.call_virtual(&mut rt, &load, Vec::new()).unwrap_err();
    assert!(err.to_string().contains("missing file"), "{}", err);

    assert!(instance.get_virtual(&rt, "_ready").is_none());
}

#[test]
fn test_instance_property_access_falls_back_to_host() {
    let (_host, mut rt) = runtime();
    let version = Rc::new(Cell::new(2));
    let mut script = Script::new(PATH, versioned_loader(version));
    assert_eq!(script.load(&mut rt), ErrorCode::Ok);
    let obj = node(&mut rt);
    let instance = script.instance_create(&mut rt, &obj).unwrap();

    assert_eq!(instance.get(&mut rt, "y").unwrap().unwrap().as_int(), Some(2));
    assert!(instance.get(&mut rt, "unknown").unwrap().is_none());
    assert!(!instance.set(&mut rt, "get_name", Value::Nil).unwrap());

    let names: Vec<String> = instance
        .property_list(&rt)
        .into_iter()
        .map(|p| p.name)
        .collect();
    assert_eq!(names, vec!["x", "y"]);

    assert!(instance.has_method(&rt, "step"));
    instance.call(&mut rt, "step", vec![Value::Int(2)]).unwrap();
    assert_eq!(instance.get(&mut rt, "x").unwrap().unwrap().as_int(), Some(2));

    let err = instance.call(&mut rt, "jump", Vec::new()).unwrap_err();
    assert!(matches!(err, BindError::NotImplemented(_)), "{}", err);

    rt.release(&obj).unwrap();
    assert!(instance.owner().is_err());
    assert_eq!(script.live_instances(), 0);
}
