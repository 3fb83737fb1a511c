//! Method callbacks as (owner, member) pairs

use std::rc::{Rc, Weak};

use super::object::ObjectWrapper;
use super::registry::TypeId;
use super::value::Value;
use super::Runtime;
use crate::bind::BoundMethod;

/// What a callback is bound to.
#[derive(Clone)]
pub enum Receiver {
    /// A host object, held weakly
    Object(Weak<ObjectWrapper>),
    /// A value-type instance or native value
    Value(Box<Value>),
    /// A type, for static members
    Type(TypeId),
}

/// Outcome of [`MethodBinding::resolve`].
pub enum Resolved {
    Live {
        receiver: Option<Value>,
        method: Rc<BoundMethod>,
    },
    Expired,
}

/// A method bound to a receiver. Does not keep host objects alive.
#[derive(Clone)]
pub struct MethodBinding {
    receiver: Receiver,
    member: String,
}

impl MethodBinding {
    pub fn new(receiver: Receiver, member: impl Into<String>) -> Self {
        Self {
            receiver,
            member: member.into(),
        }
    }

    pub fn member(&self) -> &str {
        &self.member
    }

    pub fn receiver(&self) -> &Receiver {
        &self.receiver
    }

    /// Look the method up again on the receiver's current type.
    pub fn resolve(&self, rt: &Runtime) -> Resolved {
        let (receiver, ty) = match &self.receiver {
            Receiver::Object(weak) => match weak.upgrade() {
                Some(obj) if !obj.is_released() => {
                    let ty = obj.class();
                    (Some(Value::Object(obj)), ty)
                }
                _ => return Resolved::Expired,
            },
            Receiver::Value(value) => (Some((**value).clone()), rt.type_of(value)),
            Receiver::Type(ty) => (None, *ty),
        };
        match rt.types().find_member(ty, &self.member) {
            Some(member) => match member.as_method() {
                Some(method) => Resolved::Live {
                    receiver,
                    method: method.clone(),
                },
                None => Resolved::Expired,
            },
            None => Resolved::Expired,
        }
    }

    /// Host identity of the receiver, for conversion to a host callable.
    pub fn owner_id(&self) -> Option<hostbind_sdk::ObjectId> {
        match &self.receiver {
            Receiver::Object(weak) => weak.upgrade().and_then(|obj| obj.id()),
            _ => None,
        }
    }
}
