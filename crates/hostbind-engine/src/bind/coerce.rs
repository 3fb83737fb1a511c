//! Argument acceptance

use hostbind_sdk::VariantType;

use crate::runtime::{Runtime, TypeKind, Value};
use crate::types::TypeInfo;

/// How well a value fits a declared type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Acceptance {
    Rejected,
    /// Fits through a declared implicit conversion
    Implicit,
    Exact,
}

impl Acceptance {
    pub fn is_accepted(self) -> bool {
        self != Acceptance::Rejected
    }
}

/// Does `value` fit where `ty` is declared?
pub fn accepts(rt: &Runtime, ty: &TypeInfo, value: &Value) -> Acceptance {
    use Acceptance::*;

    match ty {
        TypeInfo::Dynamic => Exact,
        TypeInfo::Void => exact_if(value.is_nil()),
        TypeInfo::Builtin(VariantType::Bool) => exact_if(matches!(value, Value::Bool(_))),
        TypeInfo::Builtin(VariantType::Int) => match value {
            Value::Int(_) => Exact,
            Value::Enum(_) | Value::Constant(_) | Value::Bool(_) => Implicit,
            _ => Rejected,
        },
        TypeInfo::Builtin(VariantType::Float) => match value {
            Value::Float(_) => Exact,
            Value::Int(_) | Value::Constant(_) => Implicit,
            _ => Rejected,
        },
        TypeInfo::Builtin(VariantType::String)
        | TypeInfo::Builtin(VariantType::StringName)
        | TypeInfo::Builtin(VariantType::NodePath) => match value {
            Value::Str(_) if *ty == TypeInfo::Builtin(VariantType::String) => Exact,
            Value::Str(_) => Implicit,
            other => builtin_fit(other, ty),
        },
        TypeInfo::Builtin(VariantType::Callable) => match value {
            Value::Callable(_) | Value::Function(_) => Exact,
            other => builtin_fit(other, ty),
        },
        TypeInfo::Builtin(VariantType::Signal) => match value {
            Value::Signal(_) => Exact,
            other => builtin_fit(other, ty),
        },
        TypeInfo::Builtin(_) => builtin_fit(value, ty),
        TypeInfo::Array(element) => match value {
            Value::List(items) => match element {
                None => Implicit,
                Some(element) => {
                    if items.iter().all(|item| accepts(rt, element, item).is_accepted()) {
                        Implicit
                    } else {
                        Rejected
                    }
                }
            },
            Value::Builtin(builtin) => {
                if builtin.variant_type() != VariantType::Array {
                    return Rejected;
                }
                match (element, &rt.types().get(builtin.ty).kind) {
                    (None, _) => Exact,
                    (Some(expected), TypeKind::TypedArray(actual)) => exact_if(**expected == *actual),
                    (Some(_), _) => Implicit,
                }
            }
            _ => Rejected,
        },
        TypeInfo::Enum(name) | TypeInfo::Bitfield(name) => match value {
            Value::Enum(member) if rt.types().name(member.enum_type) == name => Exact,
            Value::Enum(_) | Value::Int(_) | Value::Constant(_) => Implicit,
            _ => Rejected,
        },
        TypeInfo::Object(class) => match value {
            Value::Nil => Exact,
            Value::Object(obj) => exact_if(rt.types().inherits_named(obj.class(), class)),
            _ => Rejected,
        },
        TypeInfo::Script { user_type, .. } => match value {
            Value::Nil => Exact,
            Value::Object(obj) => exact_if(rt.types().inherits_named(obj.class(), user_type)),
            _ => Rejected,
        },
        TypeInfo::Union(members) => members
            .iter()
            .map(|member| accepts(rt, member, value))
            .max()
            .unwrap_or(Rejected),
        TypeInfo::Pointer(_) => exact_if(matches!(value, Value::Int(_))),
    }
}

fn exact_if(condition: bool) -> Acceptance {
    if condition {
        Acceptance::Exact
    } else {
        Acceptance::Rejected
    }
}

fn builtin_fit(value: &Value, ty: &TypeInfo) -> Acceptance {
    match value.builtin() {
        Some(builtin) => exact_if(builtin.variant_type() == ty.variant_type()),
        None => Acceptance::Rejected,
    }
}
