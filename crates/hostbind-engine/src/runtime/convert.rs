//! Conversions across the boundary

use hostbind_sdk::{Variant, VariantType};

use super::value::{BuiltinValue, SignalValue, Value};
use super::Runtime;
use crate::error::{BindError, BindResult};
use crate::types::TypeInfo;

impl Runtime {
    /// Host representation of a value.
    pub fn to_variant(&self, value: &Value) -> BindResult<Variant> {
        Ok(match value {
            Value::Nil => Variant::Nil,
            Value::Bool(b) => Variant::Bool(*b),
            Value::Int(v) => Variant::Int(*v),
            Value::Float(v) => Variant::Float(*v),
            Value::Str(s) => Variant::String(s.clone()),
            Value::Builtin(builtin) => builtin.get(),
            Value::Proxy(proxy) => proxy.value.get(),
            Value::Object(obj) => Variant::Object(Some(self.live_id(obj)?)),
            Value::Enum(member) => Variant::Int(member.value),
            Value::Constant(constant) => Variant::Int(constant.value),
            Value::List(items) => Variant::Array(
                items
                    .iter()
                    .map(|item| self.to_variant(item))
                    .collect::<BindResult<_>>()?,
            ),
            Value::Signal(signal) => Variant::Signal {
                owner: signal.owner,
                name: signal.name.clone(),
            },
            Value::Callable(binding) => Variant::Callable {
                owner: binding.owner_id(),
                method: binding.member().to_string(),
            },
            Value::Function(method) => Variant::Callable {
                owner: None,
                method: method.name().to_string(),
            },
            Value::Type(id) => {
                return Err(BindError::Type(format!(
                    "type '{}' cannot be passed to the host",
                    self.types.name(*id)
                )))
            }
        })
    }

    /// Host representation of a value passed where `ty` is declared,
    /// applying the declared implicit conversions.
    pub fn to_variant_as(&self, value: &Value, ty: &TypeInfo) -> BindResult<Variant> {
        match (ty, value) {
            (TypeInfo::Builtin(VariantType::StringName), Value::Str(s)) => {
                Ok(Variant::StringName(s.clone()))
            }
            (TypeInfo::Builtin(VariantType::NodePath), Value::Str(s)) => {
                Ok(Variant::NodePath(s.clone()))
            }
            (TypeInfo::Builtin(VariantType::Float), other) if !matches!(other, Value::Float(_)) => {
                match other.as_int() {
                    Some(v) => Ok(Variant::Float(v as f64)),
                    None => self.to_variant(other),
                }
            }
            (TypeInfo::Array(Some(element)), Value::List(items)) => Ok(Variant::Array(
                items
                    .iter()
                    .map(|item| self.to_variant_as(item, element))
                    .collect::<BindResult<_>>()?,
            )),
            _ => self.to_variant(value),
        }
    }

    /// Language value for a host value. `hint` is the declared type, used
    /// to recover enum members and typed arrays.
    pub fn from_variant(&mut self, variant: Variant, hint: Option<&TypeInfo>) -> BindResult<Value> {
        Ok(match variant {
            Variant::Nil | Variant::Object(None) => Value::Nil,
            Variant::Bool(b) => Value::Bool(b),
            Variant::Int(v) => match hint {
                Some(TypeInfo::Enum(name)) | Some(TypeInfo::Bitfield(name)) => {
                    self.enum_member(name, v).unwrap_or(Value::Int(v))
                }
                _ => Value::Int(v),
            },
            Variant::Float(v) => Value::Float(v),
            Variant::String(s) => Value::Str(s),
            Variant::Object(Some(id)) => Value::Object(self.wrap_object(id)?),
            Variant::Signal { owner, name } => Value::Signal(SignalValue { owner, name }),
            Variant::Array(items) => {
                let ty = match hint {
                    Some(TypeInfo::Array(Some(element))) => self.typed_array_type(element),
                    _ => self.value_type_id(VariantType::Array),
                };
                Value::Builtin(BuiltinValue::new(ty, Variant::Array(items)))
            }
            other => {
                let ty = self.value_type_id(other.variant_type());
                Value::Builtin(BuiltinValue::new(ty, other))
            }
        })
    }

    /// Member of the bound enum `qualified` with the given value.
    pub fn enum_member(&self, qualified: &str, value: i64) -> Option<Value> {
        let ty = self.binding.enums.get(qualified)?;
        self.types
            .get(*ty)
            .members
            .values()
            .find_map(|member| match member {
                super::Member::Value(Value::Enum(m)) if m.value == value => {
                    Some(Value::Enum(m.clone()))
                }
                _ => None,
            })
    }

    /// The value a property of type `ty` starts with when no default is
    /// declared.
    pub fn zero_value(&mut self, ty: &TypeInfo) -> BindResult<Value> {
        Ok(match ty {
            TypeInfo::Void
            | TypeInfo::Dynamic
            | TypeInfo::Object(_)
            | TypeInfo::Script { .. }
            | TypeInfo::Union(_) => Value::Nil,
            TypeInfo::Enum(_) | TypeInfo::Bitfield(_) | TypeInfo::Pointer(_) => Value::Int(0),
            TypeInfo::Array(_) => self.from_variant(Variant::Array(Vec::new()), Some(ty))?,
            TypeInfo::Builtin(VariantType::Bool) => Value::Bool(false),
            TypeInfo::Builtin(VariantType::Int) => Value::Int(0),
            TypeInfo::Builtin(VariantType::Float) => Value::Float(0.0),
            TypeInfo::Builtin(VariantType::String) => Value::Str(String::new()),
            TypeInfo::Builtin(vt) => {
                let id = self.value_type_id(*vt);
                let has_nullary = self
                    .types
                    .get(id)
                    .constructor
                    .as_ref()
                    .map_or(false, |ctor| ctor.has_nullary());
                if has_nullary {
                    self.construct(id, Vec::new())?
                } else {
                    Value::Builtin(BuiltinValue::new(id, empty_payload(*vt)))
                }
            }
        })
    }

    /// Text form of a value.
    pub fn display(&self, value: &Value) -> String {
        match value {
            Value::Nil => "null".to_string(),
            Value::Str(s) => s.clone(),
            Value::Type(id) => format!("<type {}>", self.types.name(*id)),
            Value::Enum(member) => format!("{}.{}", self.types.name(member.enum_type), member.name),
            Value::Object(obj) => match obj.id() {
                Some(id) => format!("<{}{}>", self.types.name(obj.class()), id),
                None => format!("<{} (released)>", self.types.name(obj.class())),
            },
            other => match self.to_variant(other) {
                Ok(variant) => self.host().stringify(&variant),
                Err(_) => format!("{:?}", other),
            },
        }
    }
}

fn empty_payload(ty: VariantType) -> Variant {
    match ty {
        VariantType::StringName => Variant::StringName(String::new()),
        VariantType::NodePath => Variant::NodePath(String::new()),
        VariantType::Dictionary => Variant::Dictionary(Vec::new()),
        VariantType::Callable => Variant::Callable {
            owner: None,
            method: String::new(),
        },
        VariantType::Signal => Variant::Signal {
            owner: None,
            name: String::new(),
        },
        other => Variant::compound(other, Vec::new()),
    }
}
