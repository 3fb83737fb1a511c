//! Attaching user classes to host instances

use crate::error::{BindError, BindResult};
use crate::runtime::{ObjectWrapper, Runtime, TypeId, TypeKind};

/// Give the live object `obj` the user class `class`.
///
/// When the object's host class is more derived than the class's native
/// base, the object gets a bridge type inheriting from both, cached per
/// (host class, user class) pair. Re-attaching the same class is a no-op.
pub fn set_script_class(rt: &mut Runtime, obj: &ObjectWrapper, class: TypeId) -> BindResult<()> {
    let user_name = rt.types.name(class).to_string();
    match rt.scripts.class_info(class) {
        Some(info) if !info.extension => {}
        _ => {
            return Err(BindError::ScriptClass(format!(
                "'{}' is not a script class",
                user_name
            )))
        }
    }

    let current = obj.class();
    if current == class || rt.types.user_class(current) == Some(class) {
        return Ok(());
    }

    let obj_base = rt.types.native_base(current).ok_or_else(|| {
        BindError::ScriptClass(format!(
            "'{}' instances cannot carry a script class",
            rt.types.name(current)
        ))
    })?;
    let cls_base = rt.types.native_base(class).ok_or_else(|| {
        BindError::ScriptClass(format!("'{}' has no native base", user_name))
    })?;

    if !rt.types.is_subtype(obj_base, cls_base) {
        return Err(BindError::ScriptClass(format!(
            "cannot assign more derived script class '{}' to object of class '{}', '{}' is more derived than '{}'",
            user_name,
            rt.types.name(obj_base),
            rt.types.name(cls_base),
            rt.types.name(obj_base)
        )));
    }

    let effective = if obj_base == cls_base {
        class
    } else {
        bridge_type(rt, obj_base, class)
    };
    obj.set_class(effective);
    let id = rt.live_id(obj)?;
    rt.scripts.attach_instance(id, class);
    log::debug!(
        "attached '{}' to {} as '{}'",
        user_name,
        id,
        rt.types.name(effective)
    );
    Ok(())
}

/// Detach any user class from `obj`, leaving its host class.
pub fn clear_script_class(rt: &mut Runtime, obj: &ObjectWrapper) -> BindResult<()> {
    let base = rt
        .types
        .native_base(obj.class())
        .ok_or_else(|| BindError::ScriptClass("object has no native base".to_string()))?;
    obj.set_class(base);
    if let Some(id) = obj.id() {
        rt.scripts.forget_instance(id);
    }
    Ok(())
}

fn bridge_type(rt: &mut Runtime, native_base: TypeId, user_class: TypeId) -> TypeId {
    if let Some(bridge) = rt.scripts.bridge(native_base, user_class) {
        return bridge;
    }
    let name = format!(
        "{}({})",
        rt.types.name(user_class),
        rt.types.name(native_base)
    );
    let bridge = rt.types.create(
        &name,
        TypeKind::Bridge {
            native_base,
            user_class,
        },
        vec![user_class, native_base],
    );
    rt.scripts.insert_bridge(native_base, user_class, bridge);
    bridge
}

#[cfg(test)]
mod tests {
    use std::rc::Rc;
    use std::sync::Arc;

    use hostbind_sdk::{MemoryHost, ObjectId};

    use super::*;
    use crate::config::BindingConfig;
    use crate::idl::IdlDocument;
    use crate::script::{define_class, Base, ClassDecl};

    fn runtime() -> (Rc<MemoryHost>, Runtime) {
        let host = MemoryHost::shared();
        host.add_native_class("Object", None);
        host.add_native_class("Node", Some("Object"));
        host.add_native_class("Sprite", Some("Node"));
        let api = IdlDocument::parse(
            r#"{"classes": [
                {"name": "Object"},
                {"name": "Node", "inherits": "Object"},
                {"name": "Sprite", "inherits": "Node"}
            ]}"#,
        )
        .unwrap();
        let rt = Runtime::new(host.clone(), Arc::new(api), BindingConfig::default());
        (host, rt)
    }

    fn wrap(rt: &mut Runtime, host: &MemoryHost, class: &str) -> Rc<ObjectWrapper> {
        let id: ObjectId = hostbind_sdk::HostInterface::construct_object(host, class).unwrap();
        rt.wrap_object(id).unwrap()
    }

    #[test]
    fn test_bridge_is_cached() {
        let (host, mut rt) = runtime();
        let player = define_class(
            &mut rt,
            ClassDecl::new("game", "Player", Base::Native("Node".into())),
        )
        .unwrap();

        let a = wrap(&mut rt, &host, "Sprite");
        let b = wrap(&mut rt, &host, "Sprite");
        set_script_class(&mut rt, &a, player).unwrap();
        set_script_class(&mut rt, &b, player).unwrap();
        assert_eq!(a.class(), b.class());
        assert_eq!(rt.scripts.bridge_count(), 1);
        assert!(rt.types().inherits_named(a.class(), "Player"));
        assert!(rt.types().inherits_named(a.class(), "Sprite"));

        // same class again is a no-op
        set_script_class(&mut rt, &a, player).unwrap();
        assert_eq!(rt.scripts.bridge_count(), 1);
    }

    #[test]
    fn test_more_derived_class_is_rejected() {
        let (host, mut rt) = runtime();
        let hero = define_class(
            &mut rt,
            ClassDecl::new("game", "Hero", Base::Native("Sprite".into())),
        )
        .unwrap();
        let node = wrap(&mut rt, &host, "Node");
        let err = set_script_class(&mut rt, &node, hero).unwrap_err();
        assert!(err.to_string().contains("cannot assign more derived script class"));
    }

    #[test]
    fn test_exact_base_uses_user_class() {
        let (host, mut rt) = runtime();
        let player = define_class(
            &mut rt,
            ClassDecl::new("game", "Player", Base::Native("Node".into())),
        )
        .unwrap();
        let node = wrap(&mut rt, &host, "Node");
        set_script_class(&mut rt, &node, player).unwrap();
        assert_eq!(node.class(), player);
        assert_eq!(rt.scripts.instance_class(node.id().unwrap()), Some(player));

        clear_script_class(&mut rt, &node).unwrap();
        assert_eq!(rt.types().name(node.class()), "Node");
        assert_eq!(rt.scripts.instance_class(node.id().unwrap()), None);
    }
}
