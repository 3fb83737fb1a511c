//! Memoizing type resolver

use std::cell::{Cell, RefCell};
use std::sync::Arc;

use hostbind_sdk::{PropertyInfo, VariantType};
use rustc_hash::FxHashMap;

use super::type_info::{NameLookup, NamedType, TypeInfo};
use crate::error::{BindError, BindResult};
use crate::idl::IdlDocument;

#[derive(Debug, Clone)]
struct UserTypeEntry {
    native_base: String,
    extension: bool,
}

/// Resolves type-strings against the IDL document and the user classes
/// defined so far.
pub struct TypeResolver {
    api: Arc<IdlDocument>,
    user_types: RefCell<FxHashMap<String, UserTypeEntry>>,
    cache: RefCell<FxHashMap<String, Result<TypeInfo, String>>>,
    misses: Cell<usize>,
}

impl TypeResolver {
    pub fn new(api: Arc<IdlDocument>) -> Self {
        Self {
            api,
            user_types: RefCell::new(FxHashMap::default()),
            cache: RefCell::new(FxHashMap::default()),
            misses: Cell::new(0),
        }
    }

    pub fn api(&self) -> &Arc<IdlDocument> {
        &self.api
    }

    /// Resolve a type-string. Repeated calls return the memoized answer.
    pub fn resolve(&self, text: &str) -> BindResult<TypeInfo> {
        if let Some(cached) = self.cache.borrow().get(text) {
            return cached.clone().map_err(BindError::UnknownType);
        }
        self.misses.set(self.misses.get() + 1);
        let result = TypeInfo::from_type_string(text, self).map_err(|err| match err {
            BindError::UnknownType(name) => name,
            other => other.to_string(),
        });
        if let Err(name) = &result {
            log::debug!("type-string '{}' does not resolve ({})", text, name);
        }
        self.cache
            .borrow_mut()
            .insert(text.to_string(), result.clone());
        result.map_err(BindError::UnknownType)
    }

    /// Interpret a property descriptor.
    pub fn from_property_info(&self, info: &PropertyInfo) -> BindResult<TypeInfo> {
        TypeInfo::from_property_info(info, self)
    }

    /// Make a user class resolvable by name.
    pub fn register_user_type(&self, name: &str, native_base: &str, extension: bool) {
        self.user_types.borrow_mut().insert(
            name.to_string(),
            UserTypeEntry {
                native_base: native_base.to_string(),
                extension,
            },
        );
        self.invalidate();
    }

    /// Forget a user class.
    pub fn unregister_user_type(&self, name: &str) {
        if self.user_types.borrow_mut().remove(name).is_some() {
            self.invalidate();
        }
    }

    /// Drop every memoized answer.
    pub fn invalidate(&self) {
        self.cache.borrow_mut().clear();
    }

    /// Number of memoized entries.
    pub fn cached_len(&self) -> usize {
        self.cache.borrow().len()
    }

    /// How many resolutions were computed rather than served from the memo.
    pub fn miss_count(&self) -> usize {
        self.misses.get()
    }
}

impl NameLookup for TypeResolver {
    fn lookup_name(&self, name: &str) -> Option<NamedType> {
        match name {
            "Variant" => return Some(NamedType::Dynamic),
            "void" | "Nil" => return Some(NamedType::Void),
            _ => {}
        }
        let index = self.api.index();
        if name == "Object" || index.has_class(name) {
            return Some(NamedType::Class(name.to_string()));
        }
        if let Some(ty) = VariantType::from_name(name) {
            return Some(NamedType::Builtin(ty));
        }
        if let Some(entry) = self.user_types.borrow().get(name) {
            return Some(if entry.extension {
                NamedType::Class(name.to_string())
            } else {
                NamedType::Script {
                    native_base: entry.native_base.clone(),
                    user_type: name.to_string(),
                }
            });
        }
        index.enum_location(name).map(|location| NamedType::Enum {
            qualified: location.qualified_name(),
            bitfield: location.is_bitfield,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::TypeInfoKind;

    fn resolver() -> TypeResolver {
        let doc = IdlDocument::parse(
            r#"{
                "global_enums": [{"name": "Error", "values": []}],
                "classes": [
                    {"name": "Object"},
                    {"name": "Node", "inherits": "Object",
                     "enums": [{"name": "Flags", "is_bitfield": true, "values": []}]}
                ]
            }"#,
        )
        .unwrap();
        TypeResolver::new(Arc::new(doc))
    }

    #[test]
    fn test_resolution_is_memoized() {
        let resolver = resolver();
        let first = resolver.resolve("typedarray::Node").unwrap();
        let second = resolver.resolve("typedarray::Node").unwrap();
        assert_eq!(first, second);
        assert_eq!(resolver.miss_count(), 1);
    }

    #[test]
    fn test_failures_are_memoized() {
        let resolver = resolver();
        assert!(resolver.resolve("Sprite").is_err());
        assert!(resolver.resolve("Sprite").is_err());
        assert_eq!(resolver.miss_count(), 1);
        resolver.invalidate();
        assert_eq!(resolver.cached_len(), 0);
    }

    #[test]
    fn test_user_types() {
        let resolver = resolver();
        assert!(resolver.resolve("Player").is_err());
        resolver.register_user_type("Player", "Node", false);
        let info = resolver.resolve("Player").unwrap();
        assert_eq!(info.kind(), TypeInfoKind::Script);
        resolver.register_user_type("Enemy", "Node", true);
        assert_eq!(
            resolver.resolve("Enemy").unwrap(),
            TypeInfo::Object("Enemy".into())
        );
    }

    #[test]
    fn test_enums() {
        let resolver = resolver();
        assert_eq!(
            resolver.resolve("enum::Error").unwrap(),
            TypeInfo::Enum("Error".into())
        );
        assert_eq!(
            resolver.resolve("bitfield::Node.Flags").unwrap(),
            TypeInfo::Bitfield("Node.Flags".into())
        );
        assert_eq!(
            resolver.resolve("Node.Flags").unwrap(),
            TypeInfo::Bitfield("Node.Flags".into())
        );
    }
}
