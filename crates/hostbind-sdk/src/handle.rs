//! Native call handles
//!
//! Opaque function references retrieved from the host through a stable key.
//! The binders wrap them; they never inspect them.

use std::rc::Rc;

use crate::error::HostResult;
use crate::variant::{ObjectId, Variant};

/// Free function (utility) handle.
pub type UtilityFn = Rc<dyn Fn(&[Variant]) -> HostResult<Variant>>;

/// Value-type method handle. Receives `None` for static methods.
pub type BuiltinMethodFn = Rc<dyn Fn(Option<&mut Variant>, &[Variant]) -> HostResult<Variant>>;

/// Object method handle. Receives `None` for static methods.
pub type MethodBindFn = Rc<dyn Fn(Option<ObjectId>, &[Variant]) -> HostResult<Variant>>;

/// Value-type constructor handle for one overload.
pub type ConstructorFn = Rc<dyn Fn(&[Variant]) -> HostResult<Variant>>;

/// Operator evaluator for one (operator, left, right) combination.
pub type OperatorFn = Rc<dyn Fn(&Variant, &Variant) -> HostResult<Variant>>;

/// Reads a member of a value type.
pub type MemberGetFn = Rc<dyn Fn(&Variant) -> HostResult<Variant>>;

/// Writes a member of a value type.
pub type MemberSetFn = Rc<dyn Fn(&mut Variant, Variant) -> HostResult<()>>;

/// Positional element read.
pub type IndexedGetFn = Rc<dyn Fn(&Variant, i64) -> HostResult<Variant>>;

/// Positional element write.
pub type IndexedSetFn = Rc<dyn Fn(&mut Variant, i64, Variant) -> HostResult<()>>;

/// Keyed element read.
pub type KeyedGetFn = Rc<dyn Fn(&Variant, &Variant) -> HostResult<Variant>>;

/// Keyed element write.
pub type KeyedSetFn = Rc<dyn Fn(&mut Variant, Variant, Variant) -> HostResult<()>>;
