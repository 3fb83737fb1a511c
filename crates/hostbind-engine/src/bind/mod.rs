//! Binders
//!
//! Everything that turns IDL records into live runtime types: method,
//! constructor and operator binding, value types, lazily bound object
//! classes, and the module globals.
//!
//! Every member failure goes through the runtime's failure policy. A
//! best-effort bind skips the member and records a diagnostic; a strict bind
//! aborts with the member's error.

mod argument;
mod coerce;
mod constructor;
mod enums;
mod indexing;
mod literal;
mod method;
mod module;
mod object_class;
mod operator;
mod property;
mod value_type;

pub use argument::{safe_argument_name, ArgumentDescriptor, MethodSignature, RESERVED_WORDS};
pub use coerce::{accepts, Acceptance};
pub use constructor::{ConstructorDispatcher, ConstructorOverload};
pub use enums::{bind_enum, enum_values};
pub use indexing::{build_indexer, Indexer};
pub use literal::{evaluate_literal, parse_literal, Literal};
pub use method::{bind_method, build_signature, BoundMethod, MethodOwner, NativeCall};
pub use object_class::ROOT_CLASS;
pub use operator::{
    install_operators, install_reflected, OperandKey, OperatorHandler, OperatorOutcome,
    OperatorSlot, OperatorTable,
};
pub use property::{PropertyAccess, PropertyDescriptor, SignalDescriptor};
pub use value_type::bind_value_types;

use crate::error::{BindError, BindResult};
use crate::runtime::{Member, Runtime, TypeId};

/// Add `member` to the table of `id`. Names are unique per type.
pub(crate) fn publish(rt: &mut Runtime, id: TypeId, name: &str, member: Member) -> BindResult<()> {
    let record = rt.types.get_mut(id);
    if let Some(existing) = record.members.get(name) {
        return Err(BindError::DuplicateMember {
            kind: existing.kind(),
            class: record.name.clone(),
            member: name.to_string(),
        });
    }
    record.members.insert(name.to_string(), member);
    Ok(())
}
