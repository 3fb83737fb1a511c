//! Script instances
//!
//! The host talks to an object carrying a user class through a
//! [`ScriptInstance`]: property get/set by name, the property list, method
//! calls, notifications, and virtual dispatch.

use std::rc::{Rc, Weak};

use hostbind_sdk::{ErrorCode, PropertyInfo};

use crate::bind::{BoundMethod, MethodOwner};
use crate::error::{BindError, BindResult};
use crate::runtime::{Member, ObjectWrapper, Runtime, TypeId, Value};

pub struct ScriptInstance {
    owner: Weak<ObjectWrapper>,
    class: TypeId,
}

impl ScriptInstance {
    pub fn new(owner: &Rc<ObjectWrapper>, class: TypeId) -> Self {
        Self {
            owner: Rc::downgrade(owner),
            class,
        }
    }

    pub fn class(&self) -> TypeId {
        self.class
    }

    /// The owning object, while it is live.
    pub fn owner(&self) -> BindResult<Value> {
        match self.owner.upgrade() {
            Some(obj) if !obj.is_released() => Ok(Value::Object(obj)),
            _ => Err(BindError::ObjectReleased("script instance owner".to_string())),
        }
    }

    fn user_method(&self, rt: &Runtime, owner: &Value, name: &str) -> Option<Rc<BoundMethod>> {
        let ty = rt.type_of(owner);
        rt.types()
            .find_member(ty, name)
            .and_then(|member| member.as_method().cloned())
            .filter(|method| matches!(method.owner(), MethodOwner::UserClass(_)))
    }

    /// Property read on behalf of the host. `None` when the instance does
    /// not know the name, so the host falls back to its own storage.
    pub fn get(&self, rt: &mut Runtime, name: &str) -> BindResult<Option<Value>> {
        let owner = self.owner()?;
        if let Some(getter) = self.user_method(rt, &owner, "_get") {
            let value = rt.invoke_method(&owner, &getter, vec![Value::str(name)])?;
            return Ok((!value.is_nil()).then_some(value));
        }
        if !rt.has_attr(&owner, name) {
            return Ok(None);
        }
        rt.get_attr(&owner, name).map(Some)
    }

    /// Property write on behalf of the host. `false` when the name is not
    /// handled here.
    pub fn set(&self, rt: &mut Runtime, name: &str, value: Value) -> BindResult<bool> {
        let owner = self.owner()?;
        if let Some(setter) = self.user_method(rt, &owner, "_set") {
            let handled = rt.invoke_method(&owner, &setter, vec![Value::str(name), value])?;
            return Ok(rt.truthy(&handled));
        }
        match rt.set_attr(&owner, name, value) {
            Ok(()) => Ok(true),
            Err(BindError::Attribute { .. }) | Err(BindError::ReadOnly { .. }) => Ok(false),
            Err(err) => Err(err),
        }
    }

    /// Properties the user class chain declares, in declaration order.
    pub fn property_list(&self, rt: &Runtime) -> Vec<PropertyInfo> {
        let ty = match self.owner.upgrade() {
            Some(obj) => obj.class(),
            None => self.class,
        };
        let mut list = Vec::new();
        for id in rt.types().mro(ty).into_iter().rev() {
            let record = rt.types().get(id);
            if !record.is_user_class() {
                continue;
            }
            list.extend(record.members.values().filter_map(|member| match member {
                Member::Property(property) => Some(property.info.clone()),
                _ => None,
            }));
        }
        list
    }

    /// True if the user class chain defines method `name`.
    pub fn has_method(&self, rt: &Runtime, name: &str) -> bool {
        match self.owner() {
            Ok(owner) => self.user_method(rt, &owner, name).is_some(),
            Err(_) => false,
        }
    }

    /// Call `name` on the owner.
    pub fn call(&self, rt: &mut Runtime, name: &str, args: Vec<Value>) -> BindResult<Value> {
        let owner = self.owner()?;
        if !rt.has_attr(&owner, name) {
            return Err(BindError::NotImplemented(format!(
                "{}.{}",
                rt.type_name(&owner),
                name
            )));
        }
        rt.call_method(&owner, name, args)
    }

    /// Forward a host notification to `_notification`, passing the named
    /// constant when one matches.
    pub fn notification(&self, rt: &mut Runtime, what: i64) -> BindResult<()> {
        let owner = self.owner()?;
        let Some(handler) = self.user_method(rt, &owner, "_notification") else {
            return Ok(());
        };
        let what = rt
            .lookup_constant(what, "NOTIFICATION_")
            .map(Value::Constant)
            .unwrap_or(Value::Int(what));
        rt.invoke_method(&owner, &handler, vec![what])?;
        Ok(())
    }

    pub fn to_string(&self, rt: &mut Runtime) -> BindResult<String> {
        let owner = self.owner()?;
        if let Some(method) = self.user_method(rt, &owner, "_to_string") {
            let text = rt.invoke_method(&owner, &method, Vec::new())?;
            return Ok(rt.display(&text));
        }
        Ok(rt.display(&owner))
    }

    // ========================================================================
    // Virtual dispatch
    // ========================================================================

    /// The user override of virtual `name`, if the class has one.
    pub fn get_virtual(&self, rt: &Runtime, name: &str) -> Option<Rc<BoundMethod>> {
        let owner = self.owner().ok()?;
        self.user_method(rt, &owner, name)
            .filter(|method| !method.is_stub())
    }

    /// Call a virtual override. Overrides returning the host failure enum
    /// report errors through the host and return its `FAILED` value.
    pub fn call_virtual(&self, rt: &mut Runtime, method: &Rc<BoundMethod>, args: Vec<Value>) -> BindResult<Value> {
        let owner = self.owner()?;
        match rt.invoke_method(&owner, method, args) {
            Err(err) if method.wraps_failures() => {
                let message = format!("{}: {}", method.qualified_name(), err);
                log::error!("{}", message);
                rt.host().print_error(&message);
                let failed = ErrorCode::Failed.code();
                let failure_enum = rt.config().failure_enum.clone();
                Ok(rt
                    .enum_member(&failure_enum, failed)
                    .unwrap_or(Value::Int(failed)))
            }
            other => other,
        }
    }
}
