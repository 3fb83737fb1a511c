//! Value-type binder
//!
//! Builds the full surface of every host value type: constructors,
//! constants, enums, component members, methods, operators and indexing.
//! Binding runs in two phases. Constructors come first for every type, since
//! constant and default literals of one type construct values of another
//! (`Transform2D.IDENTITY` needs `Vector2`).

use std::rc::Rc;

use hostbind_sdk::VariantType;

use super::constructor::ConstructorDispatcher;
use super::enums::bind_enum;
use super::indexing::build_indexer;
use super::literal::evaluate_literal;
use super::method::{bind_method, MethodOwner};
use super::operator::{install_operators, install_reflected};
use super::property::{PropertyAccess, PropertyDescriptor};
use super::publish;
use crate::error::{BindError, BindResult};
use crate::idl::{BuiltinClassRecord, ConstantRecord, MemberRecord};
use crate::runtime::{Member, Runtime, TypeId, TypeTraits, Value};
use crate::types::TypeInfo;

/// The language represents these natively; their records only contribute
/// reflected operators.
fn has_native_surface(ty: VariantType) -> bool {
    ty.is_primitive()
}

/// Bind every value type in the IDL document.
pub fn bind_value_types(rt: &mut Runtime) -> BindResult<()> {
    let records = rt.api().builtin_classes()?;

    let mut bound = Vec::with_capacity(records.len());
    for record in &records {
        let Some(ty) = VariantType::from_name(&record.name) else {
            log::debug!("skipping unknown value type '{}'", record.name);
            continue;
        };
        if has_native_surface(ty) || ty == VariantType::Object {
            continue;
        }
        let id = rt.value_type_id(ty);
        rt.types.strip(id);
        let constructor = ConstructorDispatcher::build(rt, ty, &record.constructors)?;
        rt.types.get_mut(id).constructor = Some(Rc::new(constructor));
        bound.push((id, ty, record));
    }

    for (id, ty, record) in bound {
        bind_surface(rt, id, ty, record)?;
    }

    for numeric in [VariantType::Int, VariantType::Float] {
        if let Some(record) = records.iter().find(|r| r.name == numeric.name()) {
            install_reflected(rt, numeric, record)?;
        }
    }
    log::info!("bound {} value types", records.len());
    Ok(())
}

fn bind_surface(rt: &mut Runtime, id: TypeId, ty: VariantType, record: &BuiltinClassRecord) -> BindResult<()> {
    for constant in &record.constants {
        let value = constant_value(rt, ty, constant);
        if let Some(value) = rt.tolerate(|| format!("{}.{}", ty, constant.name), value)? {
            let published = publish(rt, id, &constant.name, Member::Value(value));
            rt.tolerate(|| format!("{}.{}", ty, constant.name), published)?;
        }
    }

    for record_enum in &record.enums {
        let bound = bind_enum(rt, Some(ty.name()), record_enum);
        let enum_id = match rt.tolerate(|| format!("{}.{}", ty, record_enum.name), bound)? {
            Some(enum_id) => enum_id,
            None => continue,
        };
        let published = publish(rt, id, &record_enum.name, Member::Enum(enum_id));
        rt.tolerate(|| format!("{}.{}", ty, record_enum.name), published)?;
        for member in super::enums::enum_values(rt, enum_id) {
            let name = member.name.clone();
            let published = publish(rt, id, &name, Member::Value(Value::Enum(member)));
            rt.tolerate(|| format!("{}.{}", ty, name), published)?;
        }
    }

    for member in &record.members {
        let property = component(rt, ty, member);
        if let Some(property) = rt.tolerate(|| format!("{}.{}", ty, member.name), property)? {
            let published = publish(rt, id, &member.name, Member::Property(Rc::new(property)));
            rt.tolerate(|| format!("{}.{}", ty, member.name), published)?;
        }
    }

    for method in &record.methods {
        let bound = bind_method(rt, MethodOwner::ValueType(ty), method);
        if let Some(bound) = rt.tolerate(|| format!("{}.{}", ty, method.name), bound)? {
            let published = publish(rt, id, &method.name, Member::Method(Rc::new(bound)));
            rt.tolerate(|| format!("{}.{}", ty, method.name), published)?;
        }
    }

    install_operators(rt, id, ty, record)?;

    let indexer = build_indexer(rt, id, ty, record);
    let indexer = rt.tolerate(|| format!("{}[]", ty), indexer)?.flatten();

    let traits = TypeTraits {
        has_members: !record.members.is_empty(),
        has_non_const_methods: record
            .methods
            .iter()
            .any(|method| !method.is_const && !method.is_static),
        has_destructor: record.has_destructor,
    };
    let type_record = rt.types.get_mut(id);
    type_record.indexer = indexer;
    type_record.traits = traits;
    type_record.doc = record.description.clone();
    log::debug!(
        "bound value type '{}': {} members",
        ty,
        type_record.members.len()
    );
    Ok(())
}

fn constant_value(rt: &mut Runtime, ty: VariantType, constant: &ConstantRecord) -> BindResult<Value> {
    let declared = match &constant.ty {
        Some(text) => rt.resolver().resolve(text)?,
        None => TypeInfo::Builtin(ty),
    };
    let text = match &constant.value {
        serde_json::Value::String(text) => text.clone(),
        other => other.to_string(),
    };
    evaluate_literal(rt, &text, &declared)
}

fn component(rt: &mut Runtime, ty: VariantType, member: &MemberRecord) -> BindResult<PropertyDescriptor> {
    let declared = rt.resolver().resolve(&member.ty)?;
    let getter = rt
        .host()
        .member_getter(ty, &member.name)
        .ok_or_else(|| BindError::MissingNativeHandle {
            kind: "member",
            name: format!("{}.{}", ty, member.name),
        })?;
    let setter = rt.host().member_setter(ty, &member.name);
    Ok(PropertyDescriptor::new(
        member.name.clone(),
        declared,
        PropertyAccess::Member { getter, setter },
    ))
}
