//! Property and signal descriptors
//!
//! A property is read and written through one of four access paths: host
//! getter/setter methods, the same methods behind a live proxy (for compound
//! value types, so `node.position.x = 1` reaches the host), a value-type
//! component accessor, or a user-class accessor with per-instance storage.

use std::fmt;
use std::rc::Rc;

use hostbind_sdk::{MemberGetFn, MemberSetFn, PropertyInfo, VariantType};

use crate::error::{BindError, BindResult};
use crate::runtime::{PropertyProxy, Runtime, Value};
use crate::script::{Accessor, DefaultValue};
use crate::types::TypeInfo;

/// How a property reaches its value.
#[derive(Clone)]
pub enum PropertyAccess {
    /// Host accessor methods of an object class
    Methods {
        getter: Option<String>,
        setter: Option<String>,
        index: Option<i64>,
    },
    /// Host accessor methods, exposed through a live proxy
    Proxy {
        getter: Option<String>,
        setter: Option<String>,
        index: Option<i64>,
    },
    /// Component of a value type
    Member {
        getter: MemberGetFn,
        setter: Option<MemberSetFn>,
    },
    /// Property of a user class
    Script {
        getter: Option<Accessor>,
        setter: Option<Accessor>,
        default: DefaultValue,
    },
}

impl fmt::Debug for PropertyAccess {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PropertyAccess::Methods { getter, setter, .. } => {
                write!(f, "Methods({:?}, {:?})", getter, setter)
            }
            PropertyAccess::Proxy { getter, setter, .. } => {
                write!(f, "Proxy({:?}, {:?})", getter, setter)
            }
            PropertyAccess::Member { setter, .. } => {
                write!(f, "Member(writable: {})", setter.is_some())
            }
            PropertyAccess::Script {
                getter, setter, ..
            } => write!(
                f,
                "Script(getter: {}, setter: {})",
                getter.is_some(),
                setter.is_some()
            ),
        }
    }
}

/// A bound property.
#[derive(Debug)]
pub struct PropertyDescriptor {
    pub name: String,
    pub type_info: TypeInfo,
    /// What the host sees
    pub info: PropertyInfo,
    pub access: PropertyAccess,
    pub doc: Option<String>,
}

impl PropertyDescriptor {
    pub fn new(name: impl Into<String>, type_info: TypeInfo, access: PropertyAccess) -> Self {
        let name = name.into();
        let info = type_info.property_info(&name);
        Self {
            name,
            type_info,
            info,
            access,
            doc: None,
        }
    }

    pub fn with_info(mut self, info: PropertyInfo) -> Self {
        self.info = info;
        self
    }

    pub fn with_doc(mut self, doc: Option<String>) -> Self {
        self.doc = doc;
        self
    }

    pub fn is_read_only(&self) -> bool {
        match &self.access {
            PropertyAccess::Methods { setter, .. } | PropertyAccess::Proxy { setter, .. } => {
                setter.is_none()
            }
            PropertyAccess::Member { setter, .. } => setter.is_none(),
            PropertyAccess::Script { .. } => false,
        }
    }

    /// Host accessor names (setter, getter), empty when absent.
    pub fn accessor_names(&self) -> (String, String) {
        let name = |accessor: &Option<String>| accessor.clone().unwrap_or_default();
        match &self.access {
            PropertyAccess::Methods { getter, setter, .. }
            | PropertyAccess::Proxy { getter, setter, .. } => (name(setter), name(getter)),
            _ => (String::new(), String::new()),
        }
    }
}

/// A signal an object class or user class declares.
#[derive(Debug, Clone, PartialEq)]
pub struct SignalDescriptor {
    pub name: String,
    pub arguments: Vec<(String, TypeInfo)>,
}

impl SignalDescriptor {
    pub fn new(name: impl Into<String>, arguments: Vec<(String, TypeInfo)>) -> Self {
        Self {
            name: name.into(),
            arguments,
        }
    }

    /// Argument descriptors for the host.
    pub fn argument_infos(&self) -> Vec<PropertyInfo> {
        self.arguments
            .iter()
            .map(|(name, ty)| ty.property_info(name))
            .collect()
    }
}

// ============================================================================
// Reading and writing
// ============================================================================

fn index_args(index: Option<i64>) -> Vec<Value> {
    index.map(Value::Int).into_iter().collect()
}

impl Runtime {
    /// Read `property` of `receiver`.
    pub fn read_property(&mut self, receiver: &Value, property: &Rc<PropertyDescriptor>) -> BindResult<Value> {
        match &property.access {
            PropertyAccess::Methods { getter, index, .. } => {
                let getter = getter
                    .as_deref()
                    .ok_or_else(|| write_only(&property.name))?;
                self.call_method(receiver, getter, index_args(*index))
            }
            PropertyAccess::Proxy { getter, index, .. } => {
                let obj = receiver.as_object().ok_or_else(|| {
                    BindError::Type(format!("property '{}' needs an object", property.name))
                })?;
                if let Some(proxy) = obj.cached_proxy(&property.name) {
                    self.refresh_proxy(&proxy)?;
                    return Ok(Value::Proxy(proxy));
                }
                let getter = getter
                    .as_deref()
                    .ok_or_else(|| write_only(&property.name))?;
                let value = self.call_method(receiver, getter, index_args(*index))?;
                let Value::Builtin(value) = value else {
                    return Ok(value);
                };
                let proxy = PropertyProxy {
                    owner: Rc::downgrade(obj),
                    property: property.clone(),
                    value,
                };
                obj.cache_proxy(&property.name, proxy.clone());
                Ok(Value::Proxy(proxy))
            }
            PropertyAccess::Member { getter, .. } => {
                let payload = self.to_variant(receiver)?;
                let result = getter(&payload)?;
                self.from_variant(result, Some(&property.type_info))
            }
            PropertyAccess::Script {
                getter, default, ..
            } => match getter {
                Some(accessor) => accessor.call(self, receiver, Vec::new()),
                None => {
                    let obj = receiver.as_object().ok_or_else(|| {
                        BindError::Type(format!(
                            "property '{}' needs an instance",
                            property.name
                        ))
                    })?;
                    if let Some(value) = obj.stored(&property.name) {
                        return Ok(value);
                    }
                    let initial = match default {
                        DefaultValue::Value(value) => value.detached(),
                        DefaultValue::Factory(factory) => factory(self)?,
                        DefaultValue::None => self.zero_value(&property.type_info)?,
                    };
                    obj.store(&property.name, initial.clone());
                    Ok(initial)
                }
            },
        }
    }

    /// Write `property` of `receiver`.
    pub fn write_property(
        &mut self,
        receiver: &Value,
        property: &Rc<PropertyDescriptor>,
        value: Value,
    ) -> BindResult<()> {
        let read_only = || BindError::ReadOnly {
            owner: self.type_name(receiver),
            name: property.name.clone(),
        };
        match &property.access {
            PropertyAccess::Methods { setter, index, .. } => {
                let setter = setter.clone().ok_or_else(read_only)?;
                let mut args = index_args(*index);
                args.push(value);
                self.call_method(receiver, &setter, args)?;
            }
            PropertyAccess::Proxy { setter, index, .. } => {
                let setter = setter.clone().ok_or_else(read_only)?;
                let mut args = index_args(*index);
                args.push(value.detached());
                self.call_method(receiver, &setter, args)?;
                if let Some(proxy) = receiver.as_object().and_then(|obj| obj.cached_proxy(&property.name)) {
                    self.refresh_proxy(&proxy)?;
                }
            }
            PropertyAccess::Member { setter, .. } => {
                let setter = setter.clone().ok_or_else(read_only)?;
                let builtin = receiver.builtin().ok_or_else(|| {
                    BindError::Type(format!(
                        "cannot set '{}' on '{}'",
                        property.name,
                        self.type_name(receiver)
                    ))
                })?;
                let item = self.to_variant_as(&value, &property.type_info)?;
                setter(&mut builtin.data.borrow_mut(), item)?;
                if let Value::Proxy(proxy) = receiver {
                    self.write_back(proxy)?;
                }
            }
            PropertyAccess::Script { setter, .. } => match setter {
                Some(accessor) => {
                    accessor.call(self, receiver, vec![value])?;
                }
                None => {
                    let obj = receiver.as_object().ok_or_else(|| {
                        BindError::Type(format!(
                            "property '{}' needs an instance",
                            property.name
                        ))
                    })?;
                    if !super::accepts(self, &property.type_info, &value).is_accepted() {
                        return Err(BindError::Type(format!(
                            "property '{}' expects {}, got {}",
                            property.name,
                            property.type_info,
                            self.type_name(&value)
                        )));
                    }
                    let value = match (&property.type_info, &value) {
                        (TypeInfo::Builtin(VariantType::Float), Value::Int(v)) => Value::Float(*v as f64),
                        _ => value,
                    };
                    obj.store(&property.name, value);
                }
            },
        }
        Ok(())
    }

    /// Reload a proxy's value from its owner.
    pub fn refresh_proxy(&mut self, proxy: &PropertyProxy) -> BindResult<()> {
        let (getter, index) = match &proxy.property.access {
            PropertyAccess::Proxy {
                getter: Some(getter),
                index,
                ..
            } => (getter.clone(), *index),
            _ => return Ok(()),
        };
        let owner = self.proxy_owner(proxy)?;
        let fresh = self.call_method(&owner, &getter, index_args(index))?;
        proxy.value.set(self.to_variant(&fresh)?);
        Ok(())
    }

    /// Push a proxy's value back through its owner's setter.
    pub fn write_back(&mut self, proxy: &PropertyProxy) -> BindResult<()> {
        let (setter, index) = match &proxy.property.access {
            PropertyAccess::Proxy { setter, index, .. } => (setter.clone(), *index),
            _ => return Ok(()),
        };
        let setter = setter.ok_or_else(|| BindError::ReadOnly {
            owner: self.types().name(proxy.value.ty).to_string(),
            name: proxy.property.name.clone(),
        })?;
        let owner = self.proxy_owner(proxy)?;
        let mut args = index_args(index);
        args.push(Value::Builtin(proxy.value.deep_copy()));
        self.call_method(&owner, &setter, args)?;
        Ok(())
    }

    fn proxy_owner(&self, proxy: &PropertyProxy) -> BindResult<Value> {
        match proxy.owner() {
            Some(obj) if !obj.is_released() => Ok(Value::Object(obj)),
            _ => Err(BindError::ObjectReleased(format!(
                "owner of '{}'",
                proxy.property.name
            ))),
        }
    }
}

fn write_only(name: &str) -> BindError {
    BindError::Type(format!("property '{}' is write-only", name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use hostbind_sdk::{PropertyUsage, VariantType};

    #[test]
    fn test_descriptor_projection() {
        let property = PropertyDescriptor::new(
            "position",
            TypeInfo::Builtin(VariantType::Vector2),
            PropertyAccess::Proxy {
                getter: Some("get_position".into()),
                setter: None,
                index: None,
            },
        );
        assert_eq!(property.info.ty, VariantType::Vector2);
        assert_eq!(property.info.usage, PropertyUsage::DEFAULT);
        assert!(property.is_read_only());
        assert_eq!(
            property.accessor_names(),
            (String::new(), "get_position".to_string())
        );
    }

    #[test]
    fn test_signal_arguments() {
        let signal = SignalDescriptor::new(
            "hit",
            vec![("damage".into(), TypeInfo::Builtin(VariantType::Int))],
        );
        let infos = signal.argument_infos();
        assert_eq!(infos.len(), 1);
        assert_eq!(infos[0].name, "damage");
        assert_eq!(infos[0].ty, VariantType::Int);
    }
}
