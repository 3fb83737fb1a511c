//! Enum and bitfield types

use crate::error::{BindError, BindResult};
use crate::idl::EnumRecord;
use crate::runtime::{EnumMember, Member, Runtime, TypeId, TypeKind, Value};

/// Bind an enum declared by `owner` (`None` for global enums). The type is
/// named by its qualified name; binding the same enum again refreshes its
/// values in place. A record naming the same value twice is rejected
/// before anything is created.
pub fn bind_enum(rt: &mut Runtime, owner: Option<&str>, record: &EnumRecord) -> BindResult<TypeId> {
    let qualified = match owner {
        Some(owner) => format!("{}.{}", owner, record.name),
        None => record.name.clone(),
    };
    for (i, value) in record.values.iter().enumerate() {
        if record.values[..i].iter().any(|earlier| earlier.name == value.name) {
            return Err(BindError::DuplicateMember {
                kind: "enum value",
                class: qualified,
                member: value.name.clone(),
            });
        }
    }
    let id = match rt.binding.enums.get(&qualified) {
        Some(&id) => {
            rt.types.strip(id);
            id
        }
        None => {
            let int = rt.value_type_id(hostbind_sdk::VariantType::Int);
            let id = rt.types.create(
                &qualified,
                TypeKind::Enum {
                    qualified: qualified.clone(),
                    bitfield: record.is_bitfield,
                },
                vec![int],
            );
            rt.binding.enums.insert(qualified.clone(), id);
            id
        }
    };

    let enum_type = rt.types.get_mut(id);
    for value in &record.values {
        let member = EnumMember {
            enum_type: id,
            name: value.name.clone(),
            value: value.value,
        };
        enum_type
            .members
            .insert(value.name.clone(), Member::Value(Value::Enum(member)));
    }
    log::debug!(
        "bound {} '{}' with {} values",
        if record.is_bitfield { "bitfield" } else { "enum" },
        qualified,
        record.values.len()
    );
    Ok(id)
}

/// Members of a bound enum in declaration order.
pub fn enum_values(rt: &Runtime, id: TypeId) -> Vec<EnumMember> {
    rt.types()
        .get(id)
        .members
        .values()
        .filter_map(|member| match member {
            Member::Value(Value::Enum(m)) => Some(m.clone()),
            _ => None,
        })
        .collect()
}
