//! Embedded-language values

use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

use hostbind_sdk::{ObjectId, Variant, VariantType};

use super::binding::MethodBinding;
use super::object::{ObjectRef, ObjectWrapper};
use super::registry::TypeId;
use crate::bind::{BoundMethod, PropertyDescriptor};

/// A value as the embedded language sees it.
#[derive(Clone)]
pub enum Value {
    Nil,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    /// Instance of a bound value type
    Builtin(BuiltinValue),
    /// Wrapper of a host object
    Object(ObjectRef),
    /// A type object
    Type(TypeId),
    /// Member of a bound enum
    Enum(EnumMember),
    /// Named integer constant
    Constant(IntConstant),
    List(Vec<Value>),
    Signal(SignalValue),
    /// Method bound to a receiver
    Callable(MethodBinding),
    /// Free function or static method
    Function(Rc<BoundMethod>),
    /// Live view of a compound property of an object
    Proxy(PropertyProxy),
}

impl Value {
    pub fn str(s: impl Into<String>) -> Self {
        Value::Str(s.into())
    }

    pub fn is_nil(&self) -> bool {
        matches!(self, Value::Nil)
    }

    /// Integer view of ints, bools, enum members and constants.
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(v) => Some(*v),
            Value::Bool(b) => Some(i64::from(*b)),
            Value::Enum(member) => Some(member.value),
            Value::Constant(constant) => Some(constant.value),
            _ => None,
        }
    }

    /// Float view, widening integers.
    pub fn as_float(&self) -> Option<f64> {
        match self {
            Value::Float(v) => Some(*v),
            other => other.as_int().map(|v| v as f64),
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&ObjectRef> {
        match self {
            Value::Object(obj) => Some(obj),
            _ => None,
        }
    }

    pub fn as_type(&self) -> Option<TypeId> {
        match self {
            Value::Type(id) => Some(*id),
            _ => None,
        }
    }

    /// Host payload of value-type instances and proxies.
    pub fn builtin(&self) -> Option<&BuiltinValue> {
        match self {
            Value::Builtin(value) => Some(value),
            Value::Proxy(proxy) => Some(&proxy.value),
            _ => None,
        }
    }

    /// Copy that shares no value-type payload with `self`.
    pub fn detached(&self) -> Value {
        match self {
            Value::Builtin(builtin) => Value::Builtin(builtin.deep_copy()),
            Value::Proxy(proxy) => Value::Builtin(proxy.value.deep_copy()),
            Value::List(items) => Value::List(items.iter().map(Value::detached).collect()),
            other => other.clone(),
        }
    }

    /// Identity for reference values, structural equality for the rest.
    pub fn same(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Nil, Value::Nil) => true,
            (Value::Object(a), Value::Object(b)) => Rc::ptr_eq(a, b),
            (Value::Builtin(a), Value::Builtin(b)) => {
                Rc::ptr_eq(&a.data, &b.data) || *a.data.borrow() == *b.data.borrow()
            }
            (Value::Type(a), Value::Type(b)) => a == b,
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::Float(a), b) => b.as_float() == Some(*a),
            (a, Value::Float(b)) => a.as_float() == Some(*b),
            (Value::List(a), Value::List(b)) => {
                a.len() == b.len() && a.iter().zip(b).all(|(x, y)| x.same(y))
            }
            (Value::Signal(a), Value::Signal(b)) => a == b,
            (Value::Callable(a), Value::Callable(b)) => a.member() == b.member(),
            (Value::Function(a), Value::Function(b)) => Rc::ptr_eq(a, b),
            (a, b) => match (a.as_int(), b.as_int()) {
                (Some(x), Some(y)) => x == y,
                _ => false,
            },
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Nil => f.write_str("Nil"),
            Value::Bool(b) => write!(f, "Bool({})", b),
            Value::Int(v) => write!(f, "Int({})", v),
            Value::Float(v) => write!(f, "Float({})", v),
            Value::Str(s) => write!(f, "Str({:?})", s),
            Value::Builtin(b) => write!(f, "Builtin({:?})", b.get()),
            Value::Object(obj) => write!(f, "Object({:?})", obj.id()),
            Value::Type(id) => write!(f, "Type({:?})", id),
            Value::Enum(member) => write!(f, "Enum({}={})", member.name, member.value),
            Value::Constant(c) => write!(f, "Constant({}.{}={})", c.owner, c.name, c.value),
            Value::List(items) => f.debug_list().entries(items).finish(),
            Value::Signal(signal) => write!(f, "Signal({})", signal.name),
            Value::Callable(binding) => write!(f, "Callable({})", binding.member()),
            Value::Function(method) => write!(f, "Function({})", method.name()),
            Value::Proxy(proxy) => write!(f, "Proxy({})", proxy.property.name),
        }
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Str(v.to_string())
    }
}

// ============================================================================
// Value-type instances
// ============================================================================

/// Instance of a value type.
///
/// Clones alias the same payload, the way a variable bound to the instance
/// does; [`deep_copy`](Self::deep_copy) makes an independent value.
#[derive(Clone)]
pub struct BuiltinValue {
    pub ty: TypeId,
    pub data: Rc<RefCell<Variant>>,
}

impl BuiltinValue {
    pub fn new(ty: TypeId, data: Variant) -> Self {
        Self {
            ty,
            data: Rc::new(RefCell::new(data)),
        }
    }

    /// Copy of the payload.
    pub fn get(&self) -> Variant {
        self.data.borrow().clone()
    }

    /// Replace the payload in place.
    pub fn set(&self, data: Variant) {
        *self.data.borrow_mut() = data;
    }

    pub fn variant_type(&self) -> VariantType {
        self.data.borrow().variant_type()
    }

    /// Independent copy.
    pub fn deep_copy(&self) -> Self {
        Self::new(self.ty, self.get())
    }
}

// ============================================================================
// Named integers
// ============================================================================

/// Member of a bound enum type.
#[derive(Debug, Clone, PartialEq)]
pub struct EnumMember {
    pub enum_type: TypeId,
    pub name: String,
    pub value: i64,
}

/// An integer constant that remembers where it came from.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct IntConstant {
    pub owner: String,
    pub name: String,
    pub value: i64,
}

impl IntConstant {
    pub fn new(owner: impl Into<String>, name: impl Into<String>, value: i64) -> Self {
        Self {
            owner: owner.into(),
            name: name.into(),
            value,
        }
    }
}

/// A signal of a particular object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignalValue {
    pub owner: Option<ObjectId>,
    pub name: String,
}

// ============================================================================
// Property proxy
// ============================================================================

/// Live view of a by-value compound property.
///
/// Every read refreshes the cached value from the owner; every mutation
/// writes the whole value back through the owner's setter.
#[derive(Clone)]
pub struct PropertyProxy {
    pub owner: Weak<ObjectWrapper>,
    pub property: Rc<PropertyDescriptor>,
    pub value: BuiltinValue,
}

impl PropertyProxy {
    pub fn owner(&self) -> Option<ObjectRef> {
        self.owner.upgrade()
    }

    /// True if both proxies view the same property of the same object.
    pub fn same_target(&self, other: &PropertyProxy) -> bool {
        Weak::ptr_eq(&self.owner, &other.owner) && Rc::ptr_eq(&self.property, &other.property)
    }
}
