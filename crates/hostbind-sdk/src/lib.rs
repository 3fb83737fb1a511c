//! hostbind SDK - the host side of the binding boundary
//!
//! This crate defines what the binding engine needs from a host runtime:
//! the value representation crossing the boundary, the descriptors published
//! to the host class database, the native handle types, and the
//! [`HostInterface`] trait the engine programs against.
//!
//! [`MemoryHost`] is a complete in-process implementation used for tests and
//! offline tooling.

pub mod error;
pub mod handle;
pub mod host;
pub mod memory;
pub mod property;
pub mod variant;

pub use error::{ErrorCode, HostError, HostResult};
pub use handle::{
    BuiltinMethodFn, ConstructorFn, IndexedGetFn, IndexedSetFn, KeyedGetFn, KeyedSetFn,
    MemberGetFn, MemberSetFn, MethodBindFn, OperatorFn, UtilityFn,
};
pub use host::HostInterface;
pub use memory::{MemoryHost, RegisteredClass, RegisteredConstant, RegisteredGroup, RegisteredProperty};
pub use property::{
    ClassCreationInfo, ClassMethodInfo, MethodFlags, PropertyHint, PropertyInfo, PropertyUsage,
};
pub use variant::{ObjectId, Variant, VariantOperator, VariantType};
