//! Publishing extension classes to the host class database

use std::rc::Rc;

use hostbind_sdk::{ClassCreationInfo, MethodFlags};
use rustc_hash::FxHashSet;

use super::decl::{MemberDecl, PropertyDecl};
use crate::bind::{ArgumentDescriptor, BoundMethod, MethodOwner, MethodSignature, NativeCall};
use crate::error::{BindError, BindResult};
use crate::runtime::{Member, Runtime, TypeId, Value};
use crate::types::TypeInfo;

/// Register the extension class `class` with the host.
///
/// Registering an unchanged class again does nothing. A class redefined
/// since its last registration is unregistered and published again.
pub fn register_extension_class(rt: &mut Runtime, class: TypeId) -> BindResult<()> {
    let info = rt
        .scripts
        .class_info(class)
        .cloned()
        .ok_or_else(|| BindError::ScriptClass(format!("'{}' is not a user class", rt.types.name(class))))?;
    if !info.extension {
        return Err(BindError::ScriptClass(format!(
            "'{}' is not an extension class",
            info.name
        )));
    }
    let name = info.name.as_str();

    match rt.scripts.registration(name) {
        Some((ty, revision)) if ty == class && revision == info.revision => {
            log::debug!("'{}' is already registered", name);
            return Ok(());
        }
        Some(_) => {
            log::info!("re-registering changed class '{}'", name);
            rt.host().unregister_class(name)?;
        }
        None => {}
    }

    let parent = rt
        .types
        .get(class)
        .bases
        .first()
        .map(|&base| rt.types.name(base).to_string())
        .unwrap_or_else(|| crate::bind::ROOT_CLASS.to_string());
    log::info!("registering extension class '{}' (parent '{}')", name, parent);
    rt.host().register_class(
        name,
        &parent,
        ClassCreationInfo {
            is_abstract: info.is_abstract,
            is_exposed: true,
            is_virtual: false,
            class_userdata: name.to_string(),
        },
    )?;

    // Constants and enum values
    for member in &info.decl.members {
        match member {
            MemberDecl::Enum(decl) => {
                for (value_name, value) in &decl.values {
                    rt.host().register_integer_constant(
                        name,
                        &decl.name,
                        value_name,
                        *value,
                        decl.bitfield,
                    )?;
                }
            }
            MemberDecl::Constant { name: constant, value } => {
                rt.host()
                    .register_integer_constant(name, "", constant, *value, false)?;
            }
            _ => {}
        }
    }

    // Methods first, so properties can name them as accessors
    let mut bound_names = FxHashSet::default();
    for method in info.decl.methods() {
        if !bound_names.insert(method.name.clone()) {
            return Err(BindError::ScriptClass(format!(
                "method '{}' already bound",
                method.name
            )));
        }
        let Some(bound) = own_method(rt, class, &method.name) else {
            // skipped by a best-effort definition
            continue;
        };
        let method_info = bound.signature().method_info(rt, &method.name)?;
        rt.host().register_method(name, method_info)?;
    }

    for member in &info.decl.members {
        match member {
            MemberDecl::Signal(signal) => {
                let args = match rt.types.get(class).members.get(&signal.name) {
                    Some(Member::Signal(descriptor)) => descriptor.argument_infos(),
                    _ => continue,
                };
                rt.host().register_signal(name, &signal.name, args)?;
            }
            MemberDecl::Group { name: group, prefix } => {
                rt.host().register_property_group(name, group, prefix)?;
            }
            MemberDecl::Subgroup { name: group, prefix } => {
                rt.host().register_property_subgroup(name, group, prefix)?;
            }
            MemberDecl::Property(property) => {
                register_property(rt, class, name, property, &mut bound_names)?;
            }
            _ => {}
        }
    }

    rt.scripts.mark_registered(name, class, info.revision);
    Ok(())
}

fn own_method(rt: &Runtime, class: TypeId, name: &str) -> Option<Rc<BoundMethod>> {
    rt.types
        .get(class)
        .members
        .get(name)
        .and_then(|member| member.as_method().cloned())
}

/// Register one property, synthesizing `_get_<name>` / `_set_<name>`
/// accessors where the property has no bound accessor method.
fn register_property(
    rt: &mut Runtime,
    class: TypeId,
    class_name: &str,
    decl: &PropertyDecl,
    bound_names: &mut FxHashSet<String>,
) -> BindResult<()> {
    let Some(descriptor) = rt
        .types
        .get(class)
        .members
        .get(&decl.name)
        .and_then(|member| member.as_property().cloned())
    else {
        return Ok(());
    };

    // A stored field gets both accessors; a computed one only those it declares.
    let stored = decl.getter.is_none() && decl.setter.is_none();
    let mut accessors = [String::new(), String::new()];
    for (slot, (accessor, prefix)) in [(&decl.getter, "_get_"), (&decl.setter, "_set_")]
        .into_iter()
        .enumerate()
    {
        if accessor.is_none() && !stored {
            continue;
        }
        let named = accessor
            .as_ref()
            .and_then(|a| a.method_name())
            .filter(|method| bound_names.contains(*method));
        if let Some(method) = named {
            accessors[slot] = method.to_string();
            continue;
        }

        let synthesized = format!("{}{}", prefix, decl.name);
        if !bound_names.insert(synthesized.clone()) {
            return Err(BindError::ScriptClass(format!(
                "accessor '{}' of property '{}' collides with a bound method",
                synthesized, decl.name
            )));
        }
        let is_getter = slot == 0;
        let method = accessor_method(&synthesized, class_name, &descriptor.name, &descriptor.type_info, is_getter);
        let method_info = method.signature().method_info(rt, &synthesized)?;
        rt.types
            .get_mut(class)
            .members
            .insert(synthesized.clone(), Member::Method(Rc::new(method)));
        rt.host().register_method(class_name, method_info)?;
        accessors[slot] = synthesized;
    }

    let [getter, setter] = accessors;
    rt.host()
        .register_property(class_name, descriptor.info.clone(), &setter, &getter)?;
    Ok(())
}

fn accessor_method(name: &str, class: &str, property: &str, ty: &TypeInfo, is_getter: bool) -> BoundMethod {
    let property = property.to_string();
    let owner = MethodOwner::UserClass(class.to_string());
    if is_getter {
        let call: NativeCall = Rc::new(
            move |rt: &mut Runtime, _sig: &MethodSignature, receiver: Option<&Value>, _args: Vec<Value>| {
                let receiver = receiver.cloned().unwrap_or(Value::Nil);
                rt.get_attr(&receiver, &property)
            },
        );
        let signature = MethodSignature::new(Vec::new(), ty.clone()).with_flags(MethodFlags::CONST);
        BoundMethod::new(name, owner, signature, Some(call))
    } else {
        let call: NativeCall = Rc::new(
            move |rt: &mut Runtime, _sig: &MethodSignature, receiver: Option<&Value>, mut args: Vec<Value>| {
                let receiver = receiver.cloned().unwrap_or(Value::Nil);
                let value = args.pop().unwrap_or(Value::Nil);
                rt.set_attr(&receiver, &property, value)?;
                Ok(Value::Nil)
            },
        );
        let signature = MethodSignature::new(
            vec![ArgumentDescriptor::new("value", ty.clone())],
            TypeInfo::Void,
        );
        BoundMethod::new(name, owner, signature, Some(call))
    }
}
