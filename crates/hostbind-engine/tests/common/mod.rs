//! Shared fixture: a small IDL document and a host wired with its handles.

#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;
use std::sync::Arc;

use hostbind_engine::{BindingConfig, IdlDocument, Runtime};
use hostbind_sdk::{HostError, MemoryHost, ObjectId, Variant, VariantOperator, VariantType};

pub const API: &str = r#"{
    "header": {"version_major": 4, "version_minor": 2},
    "global_enums": [
        {"name": "Error", "values": [
            {"name": "OK", "value": 0},
            {"name": "FAILED", "value": 1}
        ]}
    ],
    "utility_functions": [
        {"name": "absf", "return_type": "float", "hash": 100,
         "arguments": [{"name": "x", "type": "float"}]},
        {"name": "print_rich", "return_type": "void", "is_vararg": true}
    ],
    "builtin_classes": [
        {"name": "int", "operators": [
            {"name": "*", "right_type": "Vector2", "return_type": "Vector2"},
            {"name": "==", "right_type": "int", "return_type": "bool"}
        ]},
        {"name": "Vector2",
         "members": [{"name": "x", "type": "float"}, {"name": "y", "type": "float"}],
         "constructors": [
            {"index": 0, "arguments": []},
            {"index": 1, "arguments": [{"name": "x", "type": "float"}, {"name": "y", "type": "float"}]}
         ],
         "operators": [
            {"name": "==", "right_type": "Vector2", "return_type": "bool"},
            {"name": "==", "right_type": "Variant", "return_type": "bool"},
            {"name": "+", "right_type": "Vector2", "return_type": "Vector2"},
            {"name": "unary-", "return_type": "Vector2"}
         ],
         "methods": [
            {"name": "length", "return_type": "float", "is_const": true, "hash": 200}
         ]
        },
        {"name": "Vector2i",
         "constructors": [
            {"index": 0, "arguments": [{"name": "x", "type": "int"}, {"name": "y", "type": "int"}]},
            {"index": 1, "arguments": [{"name": "from", "type": "Vector2"}]}
         ]
        }
    ],
    "classes": [
        {"name": "Object",
         "methods": [
            {"name": "get_class", "is_const": true, "hash": 300, "return_value": {"type": "String"}}
         ]
        },
        {"name": "Node", "inherits": "Object",
         "constants": [{"name": "NOTIFICATION_READY", "value": 13}],
         "methods": [
            {"name": "get_name", "is_const": true, "hash": 301, "return_value": {"type": "String"}},
            {"name": "set_name", "hash": 302, "arguments": [{"name": "name", "type": "String"}]},
            {"name": "queue_free"}
         ],
         "properties": [
            {"type": "String", "name": "name", "setter": "set_name", "getter": "get_name"}
         ],
         "signals": [{"name": "renamed"}]
        },
        {"name": "Sprite", "inherits": "Node",
         "methods": [
            {"name": "get_position", "is_const": true, "hash": 310, "return_value": {"type": "Vector2"}},
            {"name": "set_position", "hash": 311, "arguments": [{"name": "position", "type": "Vector2"}]},
            {"name": "get_texture_hint", "hash": 312, "return_value": {"type": "TextureHint"}}
         ],
         "properties": [
            {"type": "Vector2", "name": "position", "setter": "set_position", "getter": "get_position"}
         ]
        },
        {"name": "Label", "inherits": "Node",
         "enums": [
            {"name": "Align", "values": [
                {"name": "ALIGN_LEFT", "value": 0},
                {"name": "ALIGN_RIGHT", "value": 1}
            ]},
            {"name": "Wrap", "values": [
                {"name": "WRAP_OFF", "value": 0},
                {"name": "WRAP_OFF", "value": 1}
            ]}
         ]
        }
    ]
}"#;

pub fn vec2(x: f64, y: f64) -> Variant {
    Variant::compound(VariantType::Vector2, vec![Variant::Float(x), Variant::Float(y)])
}

fn components(value: &Variant) -> Result<(f64, f64), HostError> {
    match value {
        Variant::Compound { fields, .. } => match fields.as_slice() {
            [Variant::Float(x), Variant::Float(y)] => Ok((*x, *y)),
            _ => Err(HostError::CallFailed("malformed vector".to_string())),
        },
        other => Err(HostError::TypeMismatch {
            expected: "Vector2".to_string(),
            got: other.variant_type().name().to_string(),
        }),
    }
}

/// Host with every handle the fixture document names, except the one for
/// `Sprite.get_texture_hint`. `Label.Wrap` repeats a value name.
pub fn host() -> Rc<MemoryHost> {
    let host = MemoryHost::shared();
    host.add_native_class("Object", None);
    host.add_native_class("Node", Some("Object"));
    host.add_native_class("Sprite", Some("Node"));
    host.add_native_class("Label", Some("Node"));

    host.add_utility("absf", 100, |args: &[Variant]| match args {
        [Variant::Float(x)] => Ok(Variant::Float(x.abs())),
        _ => Err(HostError::CallFailed("absf expects a float".to_string())),
    });

    host.add_constructor(VariantType::Vector2, 0, |_: &[Variant]| Ok(vec2(0.0, 0.0)));
    host.add_constructor(VariantType::Vector2, 1, |args: &[Variant]| match args {
        [Variant::Float(x), Variant::Float(y)] => Ok(vec2(*x, *y)),
        _ => Err(HostError::CallFailed("Vector2(x, y) expects floats".to_string())),
    });
    host.add_constructor(VariantType::Vector2i, 0, |args: &[Variant]| {
        Ok(Variant::compound(VariantType::Vector2i, args.to_vec()))
    });
    host.add_constructor(VariantType::Vector2i, 1, |args: &[Variant]| {
        let (x, y) = components(&args[0])?;
        Ok(Variant::compound(
            VariantType::Vector2i,
            vec![Variant::Int(x as i64), Variant::Int(y as i64)],
        ))
    });
    host.add_component_member(VariantType::Vector2, "x", 0);
    host.add_component_member(VariantType::Vector2, "y", 1);
    host.add_builtin_method(VariantType::Vector2, "length", 200, |receiver, _| {
        let receiver = receiver.ok_or_else(|| HostError::CallFailed("no receiver".to_string()))?;
        let (x, y) = components(receiver)?;
        Ok(Variant::Float((x * x + y * y).sqrt()))
    });

    host.add_operator(VariantOperator::Equal, VariantType::Vector2, VariantType::Vector2, |a, b| {
        Ok(Variant::Bool(a == b))
    });
    host.add_operator(VariantOperator::Equal, VariantType::Vector2, VariantType::Nil, |a, b| {
        Ok(Variant::Bool(a == b))
    });
    host.add_operator(VariantOperator::Add, VariantType::Vector2, VariantType::Vector2, |a, b| {
        let (ax, ay) = components(a)?;
        let (bx, by) = components(b)?;
        Ok(vec2(ax + bx, ay + by))
    });
    host.add_operator(VariantOperator::Negate, VariantType::Vector2, VariantType::Nil, |a, _| {
        let (x, y) = components(a)?;
        Ok(vec2(-x, -y))
    });
    host.add_operator(VariantOperator::Multiply, VariantType::Int, VariantType::Vector2, |a, b| {
        let Variant::Int(k) = a else {
            return Err(HostError::CallFailed("expected int".to_string()));
        };
        let (x, y) = components(b)?;
        Ok(vec2(*k as f64 * x, *k as f64 * y))
    });

    host.add_method_bind("Object", "get_class", 300, |_, _| {
        Ok(Variant::String("Object".to_string()))
    });

    let names: Rc<RefCell<HashMap<ObjectId, String>>> = Rc::default();
    let store = names.clone();
    host.add_method_bind("Node", "get_name", 301, move |id, _| {
        let id = id.ok_or_else(|| HostError::CallFailed("no receiver".to_string()))?;
        Ok(Variant::String(store.borrow().get(&id).cloned().unwrap_or_default()))
    });
    let store = names;
    host.add_method_bind("Node", "set_name", 302, move |id, args| {
        let id = id.ok_or_else(|| HostError::CallFailed("no receiver".to_string()))?;
        if let [Variant::String(name)] = args {
            store.borrow_mut().insert(id, name.clone());
        }
        Ok(Variant::Nil)
    });

    let positions: Rc<RefCell<HashMap<ObjectId, Variant>>> = Rc::default();
    let store = positions.clone();
    host.add_method_bind("Sprite", "get_position", 310, move |id, _| {
        let id = id.ok_or_else(|| HostError::CallFailed("no receiver".to_string()))?;
        Ok(store.borrow().get(&id).cloned().unwrap_or_else(|| vec2(0.0, 0.0)))
    });
    let store = positions;
    host.add_method_bind("Sprite", "set_position", 311, move |id, args| {
        let id = id.ok_or_else(|| HostError::CallFailed("no receiver".to_string()))?;
        if let [value] = args {
            store.borrow_mut().insert(id, value.clone());
        }
        Ok(Variant::Nil)
    });

    host
}

pub fn api() -> Arc<IdlDocument> {
    Arc::new(IdlDocument::parse(API).expect("fixture document parses"))
}

/// Initialized runtime over the fixture host.
pub fn runtime_with(config: BindingConfig) -> (Rc<MemoryHost>, Runtime) {
    let _ = env_logger::builder().is_test(true).try_init();
    let host = host();
    let mut rt = Runtime::new(host.clone(), api(), config);
    rt.initialize().expect("module initializes");
    (host, rt)
}

pub fn runtime() -> (Rc<MemoryHost>, Runtime) {
    runtime_with(BindingConfig::default())
}
