//! User-class definition
//!
//! [`define_class`] turns a [`ClassDecl`] into a runtime type. Defining a
//! class again under the same (module, name) reuses the type: the old
//! surface is stripped and the new one published in its place, so every
//! existing instance sees the new members.

use std::rc::Rc;

use hostbind_sdk::MethodFlags;

use super::decl::{
    Base, ClassDecl, DefaultValue, EnumDecl, MemberDecl, MethodDecl, ParamKind, PropertyDecl,
    SignalDecl,
};
use crate::bind::{
    accepts, bind_enum, enum_values, publish, safe_argument_name, ArgumentDescriptor, BoundMethod,
    MethodOwner, MethodSignature, NativeCall, PropertyAccess, PropertyDescriptor, SignalDescriptor,
};
use crate::error::{BindError, BindResult};
use crate::idl::{EnumRecord, EnumValueRecord};
use crate::runtime::{IntConstant, Member, Runtime, TypeId, TypeKind, Value};
use crate::types::TypeInfo;

/// What the script layer remembers about a user class.
#[derive(Debug, Clone)]
pub struct ClassInfo {
    pub ty: TypeId,
    pub name: String,
    pub module: String,
    /// Most-derived host class the instances are built on
    pub native_base: String,
    pub decl: Rc<ClassDecl>,
    /// Bumped on every definition
    pub revision: u32,
    pub is_abstract: bool,
    pub extension: bool,
}

impl ClassInfo {
    pub fn global_name(&self) -> Option<String> {
        self.decl.global_name()
    }

    pub fn is_tool(&self) -> bool {
        self.decl.expose.tool
    }

    pub fn property(&self, name: &str) -> Option<&PropertyDecl> {
        self.decl.properties().find(|p| p.name == name)
    }

    pub fn has_signal(&self, name: &str) -> bool {
        self.decl.signals().any(|s| s.name == name)
    }
}

/// Define (or redefine) a user class.
pub fn define_class(rt: &mut Runtime, decl: ClassDecl) -> BindResult<TypeId> {
    let base = match &decl.base {
        Base::Native(name) => rt.type_for(&TypeInfo::Object(name.clone()))?,
        Base::Script(id) => {
            if !rt.types.get(*id).is_user_class() {
                return Err(BindError::ScriptClass(format!(
                    "'{}' is not a user class",
                    rt.types.name(*id)
                )));
            }
            *id
        }
    };
    let native_base = rt
        .types
        .native_base(base)
        .map(|id| rt.types.name(id).to_string())
        .ok_or_else(|| {
            BindError::ScriptClass(format!("base of '{}' is not an object class", decl.name))
        })?;

    let (id, revision) = match rt.types.user_type(&decl.module, &decl.name) {
        Some(id) => {
            rt.types.set_bases(id, vec![base])?;
            rt.types.strip(id);
            let revision = rt.scripts.class_info(id).map_or(0, |info| info.revision);
            (id, revision + 1)
        }
        None => {
            let kind = TypeKind::UserClass {
                extension: decl.extension,
                module: decl.module.clone(),
            };
            (rt.types.create(&decl.name, kind, vec![base]), 1)
        }
    };
    log::debug!("defining class '{}' (revision {})", decl.name, revision);

    rt.resolver()
        .register_user_type(&decl.name, &native_base, decl.extension);
    let decl = Rc::new(decl);
    rt.scripts.insert_class(ClassInfo {
        ty: id,
        name: decl.name.clone(),
        module: decl.module.clone(),
        native_base,
        decl: decl.clone(),
        revision,
        is_abstract: decl.is_abstract,
        extension: decl.extension,
    });

    let class = decl.name.as_str();
    for member in &decl.members {
        let published = match member {
            MemberDecl::Method(method) => user_method(rt, id, class, method)
                .and_then(|bound| publish(rt, id, &method.name, Member::Method(Rc::new(bound)))),
            MemberDecl::Property(property) => user_property(rt, property).and_then(|bound| {
                publish(rt, id, &property.name, Member::Property(Rc::new(bound)))
            }),
            MemberDecl::Signal(signal) => user_signal(rt, signal)
                .and_then(|bound| publish(rt, id, &signal.name, Member::Signal(Rc::new(bound)))),
            MemberDecl::Constant { name, value } => publish(
                rt,
                id,
                name,
                Member::Constant(IntConstant::new(class, name.clone(), *value)),
            ),
            MemberDecl::Enum(decl) => user_enum(rt, id, class, decl),
            MemberDecl::Group { .. } | MemberDecl::Subgroup { .. } => Ok(()),
        };
        match published {
            Err(err @ BindError::ScriptClass(_)) => return Err(err),
            other => {
                rt.tolerate(|| format!("{}.{}", class, member.name()), other)?;
            }
        }
    }

    let record = rt.types.get_mut(id);
    record.doc = decl.doc.clone();
    record.traits.has_members = decl.properties().next().is_some();
    log::info!(
        "defined class '{}' from '{}' with {} members",
        class,
        decl.module,
        record.members.len()
    );
    Ok(id)
}

fn annotation(rt: &Runtime, text: Option<&str>) -> BindResult<TypeInfo> {
    match text {
        Some(text) => rt.resolve_annotation(text),
        None => Ok(TypeInfo::Dynamic),
    }
}

fn user_method(rt: &mut Runtime, id: TypeId, class: &str, decl: &MethodDecl) -> BindResult<BoundMethod> {
    let mut flags = MethodFlags::NORMAL;
    let mut arguments = Vec::with_capacity(decl.params.len());
    for param in &decl.params {
        match param.kind {
            ParamKind::KeywordOnly => {
                return Err(BindError::ScriptClass(format!(
                    "cannot bind method '{}.{}' with keyword-only argument '{}'",
                    class, decl.name, param.name
                )))
            }
            ParamKind::VarArgs => {
                flags |= MethodFlags::VARARG;
                continue;
            }
            ParamKind::Positional => {}
        }
        let declared = annotation(rt, param.annotation.as_deref())?;
        let name = safe_argument_name(&param.name, |word| rt.is_reserved_word(word));
        let mut argument = ArgumentDescriptor::new(name, declared);
        if let Some(default) = &param.default {
            argument = argument.with_default(default.clone());
        }
        arguments.push(argument);
    }
    let return_type = annotation(rt, decl.returns.as_deref())?;

    if decl.is_static {
        flags |= MethodFlags::STATIC;
    }
    if decl.is_virtual {
        flags |= MethodFlags::VIRTUAL;
    }
    if decl.is_const {
        flags |= MethodFlags::CONST;
    }
    let wraps = decl.is_virtual
        && matches!(&return_type, TypeInfo::Enum(name) if *name == rt.config().failure_enum);

    let body = decl.body.clone();
    let is_static = decl.is_static;
    let call: NativeCall = Rc::new(
        move |rt: &mut Runtime, _sig: &MethodSignature, receiver: Option<&Value>, args: Vec<Value>| {
            let receiver = match receiver {
                Some(receiver) if !is_static => receiver.clone(),
                _ => Value::Type(id),
            };
            body(rt, &receiver, args)
        },
    );

    Ok(BoundMethod::new(
        decl.name.clone(),
        MethodOwner::UserClass(class.to_string()),
        MethodSignature::new(arguments, return_type).with_flags(flags),
        Some(call),
    )
    .with_doc(decl.doc.clone())
    .with_failure_wrap(wraps))
}

fn user_property(rt: &mut Runtime, decl: &PropertyDecl) -> BindResult<PropertyDescriptor> {
    let declared = rt.resolve_annotation(&decl.annotation)?;
    if let DefaultValue::Value(value) = &decl.default {
        if !accepts(rt, &declared, value).is_accepted() {
            return Err(BindError::InvalidDefault {
                literal: rt.display(value),
                reason: format!("property '{}' is declared {}", decl.name, declared),
            });
        }
    }

    let mut info = declared.property_info(&decl.name);
    if let Some((hint, hint_string)) = &decl.hint {
        info = info.with_hint(*hint, hint_string.clone());
    }
    if let Some(usage) = decl.usage {
        info = info.with_usage(usage);
    }
    let access = PropertyAccess::Script {
        getter: decl.getter.clone(),
        setter: decl.setter.clone(),
        default: decl.default.clone(),
    };
    Ok(PropertyDescriptor::new(decl.name.clone(), declared, access)
        .with_info(info)
        .with_doc(decl.doc.clone()))
}

fn user_signal(rt: &mut Runtime, decl: &SignalDecl) -> BindResult<SignalDescriptor> {
    let mut arguments = Vec::with_capacity(decl.arguments.len());
    for (name, text) in &decl.arguments {
        arguments.push((name.clone(), rt.resolve_annotation(text)?));
    }
    Ok(SignalDescriptor::new(decl.name.clone(), arguments))
}

fn user_enum(rt: &mut Runtime, id: TypeId, class: &str, decl: &EnumDecl) -> BindResult<()> {
    let record = EnumRecord {
        name: decl.name.clone(),
        is_bitfield: decl.bitfield,
        values: decl
            .values
            .iter()
            .map(|(name, value)| EnumValueRecord {
                name: name.clone(),
                value: *value,
                description: None,
            })
            .collect(),
    };
    let enum_id = bind_enum(rt, Some(class), &record)?;
    publish(rt, id, &decl.name, Member::Enum(enum_id))?;
    for member in enum_values(rt, enum_id) {
        let name = member.name.clone();
        publish(rt, id, &name, Member::Value(Value::Enum(member)))?;
    }
    Ok(())
}
