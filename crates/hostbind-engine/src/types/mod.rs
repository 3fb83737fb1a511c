//! Type resolution
//!
//! [`TypeInfo`] describes a type the way both sides of the boundary need it.
//! [`TypeResolver`] turns IDL type-strings and property descriptors into
//! `TypeInfo`s, memoizing every answer (failures included) until invalidated.

mod resolver;
mod type_info;

pub use resolver::TypeResolver;
pub use type_info::{NameLookup, NamedType, NativeKind, TypeInfo, TypeInfoKind};
