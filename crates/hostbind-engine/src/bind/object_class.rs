//! Lazy object-class binding
//!
//! A class is bound the first time something refers to it: a global lookup,
//! a resolved annotation, or a host object of that class crossing the
//! boundary. Binding walks up the declared parents first, so a class is
//! never bound before its ancestors.

use std::rc::Rc;

use hostbind_sdk::VariantType;

use super::argument::MethodSignature;
use super::enums::{bind_enum, enum_values};
use super::method::{bind_method, BoundMethod, MethodOwner, NativeCall};
use super::property::{PropertyAccess, PropertyDescriptor, SignalDescriptor};
use super::publish;
use crate::config::FailurePolicy;
use crate::error::{BindError, BindResult};
use crate::idl::{ClassRecord, ConstantRecord, PropertyRecord, SignalRecord};
use crate::runtime::{IntConstant, Member, Runtime, TypeId, TypeKind, TypeTraits, Value};
use crate::types::TypeInfo;

/// Name of the root object class.
pub const ROOT_CLASS: &str = "Object";

impl Runtime {
    /// Bind object class `name` and its ancestors.
    ///
    /// Returns `Ok(None)` when the class is already being bound further up
    /// the stack; the condition is reported and the outer bind carries on.
    pub fn bind_class(&mut self, name: &str) -> BindResult<Option<TypeId>> {
        if let Some(&id) = self.binding.classes.get(name) {
            return Ok(Some(id));
        }
        if self.binding.in_progress.contains(name) {
            self.report(
                name.to_string(),
                "class is already being bound; skipping re-entrant bind".to_string(),
            );
            return Ok(None);
        }

        let record = match self.api().class(name) {
            Ok(record) => record,
            Err(err) if err.is_not_found() && name == ROOT_CLASS => ClassRecord {
                name: ROOT_CLASS.to_string(),
                ..ClassRecord::default()
            },
            Err(err) => return Err(err.into()),
        };

        self.binding.in_progress.insert(name.to_string());
        let result = self.bind_class_record(&record);
        self.binding.in_progress.remove(name);
        let id = result?;
        self.binding.classes.insert(name.to_string(), id);
        Ok(Some(id))
    }

    /// [`bind_class`](Self::bind_class) under an explicit failure policy.
    /// Ancestors bound along the way use the same policy.
    pub fn bind_class_with_policy(
        &mut self,
        name: &str,
        policy: FailurePolicy,
    ) -> BindResult<Option<TypeId>> {
        let previous = self.swap_policy(Some(policy));
        let result = self.bind_class(name);
        self.swap_policy(previous);
        result
    }

    /// Drop the bound surface of `name` and bind it again. The type keeps
    /// its identity.
    pub fn rebind_class(&mut self, name: &str) -> BindResult<Option<TypeId>> {
        self.binding.classes.remove(name);
        self.bind_class(name)
    }

    /// True once `name` is fully bound.
    pub fn is_class_bound(&self, name: &str) -> bool {
        self.binding.classes.contains_key(name)
    }

    fn bind_class_record(&mut self, record: &ClassRecord) -> BindResult<TypeId> {
        let class = record.name.as_str();
        let bases = match record.inherits.as_deref() {
            Some(parent) => match self.bind_class(parent)? {
                Some(parent) => vec![parent],
                None => Vec::new(),
            },
            None => Vec::new(),
        };

        let id = match self.types.lookup(class) {
            Some(id) if self.types.get(id).is_object_class() => {
                self.types.strip(id);
                self.types.set_bases(id, bases)?;
                id
            }
            _ => self.types.create(class, TypeKind::Object, bases),
        };
        log::debug!("binding class '{}'", class);

        for constant in &record.constants {
            let published = class_constant(class, constant)
                .and_then(|value| publish(self, id, &constant.name, Member::Constant(value)));
            self.tolerate(|| format!("{}.{}", class, constant.name), published)?;
        }

        for record_enum in &record.enums {
            let bound = bind_enum(self, Some(class), record_enum);
            let enum_id = match self.tolerate(|| format!("{}.{}", class, record_enum.name), bound)? {
                Some(enum_id) => enum_id,
                None => continue,
            };
            let published = publish(self, id, &record_enum.name, Member::Enum(enum_id));
            self.tolerate(|| format!("{}.{}", class, record_enum.name), published)?;
            for member in enum_values(self, enum_id) {
                let name = member.name.clone();
                let published = publish(self, id, &name, Member::Value(Value::Enum(member)));
                self.tolerate(|| format!("{}.{}", class, name), published)?;
            }
        }

        for method in &record.methods {
            let published = bind_method(self, MethodOwner::ObjectClass(class.to_string()), method)
                .and_then(|bound| publish(self, id, &method.name, Member::Method(Rc::new(bound))));
            self.tolerate(|| format!("{}.{}", class, method.name), published)?;
        }

        for property in &record.properties {
            let published = self
                .object_property(property)
                .and_then(|bound| publish(self, id, &property.name, Member::Property(Rc::new(bound))));
            self.tolerate(|| format!("{}.{}", class, property.name), published)?;
        }

        for signal in &record.signals {
            let published = self
                .signal_descriptor(signal)
                .and_then(|bound| publish(self, id, &signal.name, Member::Signal(Rc::new(bound))));
            self.tolerate(|| format!("{}.{}", class, signal.name), published)?;
        }

        if class == ROOT_CLASS && !self.types.get(id).members.contains_key("free") {
            publish(self, id, "free", Member::Method(Rc::new(free_method())))?;
        }

        let traits = TypeTraits {
            has_members: !record.properties.is_empty(),
            has_non_const_methods: record.methods.iter().any(|method| !method.is_const),
            has_destructor: false,
        };
        let type_record = self.types.get_mut(id);
        type_record.traits = traits;
        type_record.doc = record.description.clone();
        log::info!(
            "bound class '{}' ({} members)",
            class,
            type_record.members.len()
        );
        Ok(id)
    }

    fn object_property(&mut self, record: &PropertyRecord) -> BindResult<PropertyDescriptor> {
        let declared = self.resolver().resolve(&record.ty)?;
        let getter = record.getter.clone().filter(|name| !name.is_empty());
        let setter = record.setter.clone().filter(|name| !name.is_empty());
        let index = record.index;
        let access = if self.is_compound(&declared) {
            PropertyAccess::Proxy {
                getter,
                setter,
                index,
            }
        } else {
            PropertyAccess::Methods {
                getter,
                setter,
                index,
            }
        };
        Ok(PropertyDescriptor::new(record.name.clone(), declared, access))
    }

    /// By-value types with settable components.
    fn is_compound(&self, ty: &TypeInfo) -> bool {
        match ty {
            TypeInfo::Builtin(vt) if !vt.is_primitive() && *vt != VariantType::String => {
                self.types.get(self.value_type_id(*vt)).traits.has_members
            }
            _ => false,
        }
    }

    fn signal_descriptor(&mut self, record: &SignalRecord) -> BindResult<SignalDescriptor> {
        let mut arguments = Vec::with_capacity(record.arguments.len());
        for arg in &record.arguments {
            arguments.push((arg.name.clone(), self.resolver().resolve(&arg.ty)?));
        }
        Ok(SignalDescriptor::new(record.name.clone(), arguments))
    }
}

fn class_constant(class: &str, record: &ConstantRecord) -> BindResult<IntConstant> {
    let value = record.value.as_i64().ok_or_else(|| BindError::InvalidDefault {
        literal: record.value.to_string(),
        reason: "class constants must be integers".to_string(),
    })?;
    Ok(IntConstant::new(class, record.name.clone(), value))
}

/// Explicit release of the host object, separate from dropping the wrapper.
fn free_method() -> BoundMethod {
    let call: NativeCall = Rc::new(
        |rt: &mut Runtime, _sig: &MethodSignature, receiver: Option<&Value>, _args: Vec<Value>| {
            let obj = receiver
                .and_then(Value::as_object)
                .ok_or_else(|| BindError::Type("free() needs an object receiver".to_string()))?
                .clone();
            rt.release(&obj)?;
            Ok(Value::Nil)
        },
    );
    BoundMethod::new(
        "free",
        MethodOwner::ObjectClass(ROOT_CLASS.to_string()),
        MethodSignature::new(Vec::new(), TypeInfo::Void),
        Some(call),
    )
}
