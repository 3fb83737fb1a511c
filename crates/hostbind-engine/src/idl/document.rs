//! Parsed IDL document and node accessors

use std::path::Path;

use once_cell::sync::OnceCell;
use rustc_hash::FxHashMap;
use serde::de::DeserializeOwned;
use serde_json::Value;

use super::path::ObjectPath;
use super::records::{
    BuiltinClassRecord, ClassRecord, EnumRecord, MethodRecord, SingletonRecord,
};
use super::{IdlError, IdlResult};

// ============================================================================
// Document
// ============================================================================

/// A parsed IDL document.
///
/// The JSON graph keeps the document's key order. Name indexes over the
/// top-level lists are derived on first use and memoized.
#[derive(Debug)]
pub struct IdlDocument {
    root: Value,
    index: OnceCell<ApiIndex>,
}

impl IdlDocument {
    /// Parse IDL text.
    pub fn parse(text: &str) -> IdlResult<Self> {
        let root: Value = serde_json::from_str(text)?;
        Ok(Self::from_value(root))
    }

    /// Read and parse an IDL file.
    pub fn load(path: impl AsRef<Path>) -> IdlResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| IdlError::Io {
            path: path.display().to_string(),
            source,
        })?;
        log::debug!("parsing IDL document {}", path.display());
        Self::parse(&text)
    }

    /// Wrap an already-built JSON graph.
    pub fn from_value(root: Value) -> Self {
        Self {
            root,
            index: OnceCell::new(),
        }
    }

    /// The root node.
    pub fn root(&self) -> IdlNode<'_> {
        IdlNode::new(&self.root)
    }

    /// Walk a dotted/indexed path from the root.
    pub fn get_via_path(&self, path: &str) -> IdlResult<IdlNode<'_>> {
        let path: ObjectPath = path.parse()?;
        path.resolve(&self.root).map(IdlNode::new)
    }

    /// Name indexes, built on first use.
    pub fn index(&self) -> &ApiIndex {
        self.index.get_or_init(|| ApiIndex::build(&self.root))
    }

    // ========================================================================
    // Typed lookups
    // ========================================================================

    /// Object class record by name.
    pub fn class(&self, name: &str) -> IdlResult<ClassRecord> {
        self.root().attr("classes")?.named(name)?.deserialize()
    }

    /// Value-type record by name.
    pub fn builtin_class(&self, name: &str) -> IdlResult<BuiltinClassRecord> {
        self.root().attr("builtin_classes")?.named(name)?.deserialize()
    }

    /// Global enum record by name.
    pub fn global_enum(&self, name: &str) -> IdlResult<EnumRecord> {
        self.root().attr("global_enums")?.named(name)?.deserialize()
    }

    /// All records of a top-level list, empty when the list is absent.
    pub fn records<T: DeserializeOwned>(&self, key: &str) -> IdlResult<Vec<T>> {
        match self.root().get(key) {
            Some(node) => node.deserialize(),
            None => Ok(Vec::new()),
        }
    }

    /// All value-type records.
    pub fn builtin_classes(&self) -> IdlResult<Vec<BuiltinClassRecord>> {
        self.records("builtin_classes")
    }

    /// All global enums.
    pub fn global_enums(&self) -> IdlResult<Vec<EnumRecord>> {
        self.records("global_enums")
    }

    /// All utility functions.
    pub fn utility_functions(&self) -> IdlResult<Vec<MethodRecord>> {
        self.records("utility_functions")
    }

    /// All singletons.
    pub fn singletons(&self) -> IdlResult<Vec<SingletonRecord>> {
        self.records("singletons")
    }
}

// ============================================================================
// Node
// ============================================================================

/// Borrowed view of one node of the document.
#[derive(Debug, Clone, Copy)]
pub struct IdlNode<'a> {
    value: &'a Value,
}

impl<'a> IdlNode<'a> {
    pub fn new(value: &'a Value) -> Self {
        Self { value }
    }

    pub fn value(&self) -> &'a Value {
        self.value
    }

    /// Key-style access; `None` when absent.
    pub fn get(&self, key: &str) -> Option<IdlNode<'a>> {
        self.value.get(key).map(IdlNode::new)
    }

    /// Attribute-style access; a missing key is a "not found" error.
    pub fn attr(&self, key: &str) -> IdlResult<IdlNode<'a>> {
        self.get(key).ok_or_else(|| IdlError::NotFound {
            kind: "key".to_string(),
            name: key.to_string(),
        })
    }

    /// Positional access into a list.
    pub fn at(&self, index: usize) -> Option<IdlNode<'a>> {
        self.value.as_array()?.get(index).map(IdlNode::new)
    }

    /// Select the element of a list whose `name` equals `name`.
    pub fn named(&self, name: &str) -> IdlResult<IdlNode<'a>> {
        self.named_by("name", name)
    }

    /// Select the element of a list whose `key` field equals `name`.
    pub fn named_by(&self, key: &str, name: &str) -> IdlResult<IdlNode<'a>> {
        self.value
            .as_array()
            .and_then(|items| {
                items
                    .iter()
                    .find(|item| item.get(key).and_then(Value::as_str) == Some(name))
            })
            .map(IdlNode::new)
            .ok_or_else(|| IdlError::NotFound {
                kind: "object with key".to_string(),
                name: format!("{}={}", key, name),
            })
    }

    /// Like [`named`](Self::named) but falls back to `default`.
    pub fn named_or(&self, name: &str, default: IdlNode<'a>) -> IdlNode<'a> {
        self.named(name).unwrap_or(default)
    }

    pub fn as_str(&self) -> Option<&'a str> {
        self.value.as_str()
    }

    pub fn as_i64(&self) -> Option<i64> {
        self.value.as_i64()
    }

    pub fn as_bool(&self) -> Option<bool> {
        self.value.as_bool()
    }

    pub fn is_list(&self) -> bool {
        self.value.is_array()
    }

    pub fn is_map(&self) -> bool {
        self.value.is_object()
    }

    /// Element count of a list or map, zero for scalars.
    pub fn len(&self) -> usize {
        match self.value {
            Value::Array(items) => items.len(),
            Value::Object(map) => map.len(),
            _ => 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Elements of a list.
    pub fn items(&self) -> impl Iterator<Item = IdlNode<'a>> {
        self.value
            .as_array()
            .into_iter()
            .flatten()
            .map(IdlNode::new)
    }

    /// Keys of a map in document order.
    pub fn keys(&self) -> impl Iterator<Item = &'a str> {
        self.value
            .as_object()
            .into_iter()
            .flat_map(|map| map.keys().map(String::as_str))
    }

    /// Deserialize this node into a typed record.
    pub fn deserialize<T: DeserializeOwned>(&self) -> IdlResult<T> {
        Ok(T::deserialize(self.value)?)
    }
}

// ============================================================================
// Name index
// ============================================================================

/// Where an enum is declared.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumLocation {
    /// Owning class, `None` for global enums
    pub owner: Option<String>,
    /// Enum name within its owner
    pub name: String,
    pub is_bitfield: bool,
}

impl EnumLocation {
    /// `Owner.Name` or `Name`.
    pub fn qualified_name(&self) -> String {
        match &self.owner {
            Some(owner) => format!("{}.{}", owner, self.name),
            None => self.name.clone(),
        }
    }
}

/// Name lookups over the top-level lists.
#[derive(Debug, Default)]
pub struct ApiIndex {
    classes: FxHashMap<String, usize>,
    builtin_classes: FxHashMap<String, usize>,
    enums: FxHashMap<String, EnumLocation>,
    singletons: FxHashMap<String, String>,
    class_parents: FxHashMap<String, String>,
}

impl ApiIndex {
    fn build(root: &Value) -> Self {
        let mut index = ApiIndex::default();
        let list = |key: &str| -> Vec<&Value> {
            root.get(key)
                .and_then(Value::as_array)
                .map(|items| items.iter().collect())
                .unwrap_or_default()
        };
        let name_of = |item: &Value| item.get("name").and_then(Value::as_str).map(str::to_string);

        for (i, class) in list("classes").into_iter().enumerate() {
            let Some(name) = name_of(class) else { continue };
            if let Some(parent) = class.get("inherits").and_then(Value::as_str) {
                index.class_parents.insert(name.clone(), parent.to_string());
            }
            index.add_enums(Some(&name), class);
            index.classes.insert(name, i);
        }
        for (i, builtin) in list("builtin_classes").into_iter().enumerate() {
            let Some(name) = name_of(builtin) else { continue };
            index.add_enums(Some(&name), builtin);
            index.builtin_classes.insert(name, i);
        }
        for global in list("global_enums") {
            let Some(name) = name_of(global) else { continue };
            let is_bitfield = global
                .get("is_bitfield")
                .and_then(Value::as_bool)
                .unwrap_or(false);
            index.enums.insert(
                name.clone(),
                EnumLocation {
                    owner: None,
                    name,
                    is_bitfield,
                },
            );
        }
        for singleton in list("singletons") {
            let Some(name) = name_of(singleton) else { continue };
            let ty = singleton
                .get("type")
                .and_then(Value::as_str)
                .unwrap_or(&name)
                .to_string();
            index.singletons.insert(name, ty);
        }
        log::debug!(
            "indexed IDL: {} classes, {} value types, {} enums, {} singletons",
            index.classes.len(),
            index.builtin_classes.len(),
            index.enums.len(),
            index.singletons.len()
        );
        index
    }

    fn add_enums(&mut self, owner: Option<&str>, record: &Value) {
        let Some(enums) = record.get("enums").and_then(Value::as_array) else {
            return;
        };
        for e in enums {
            let Some(name) = e.get("name").and_then(Value::as_str) else {
                continue;
            };
            let location = EnumLocation {
                owner: owner.map(str::to_string),
                name: name.to_string(),
                is_bitfield: e.get("is_bitfield").and_then(Value::as_bool).unwrap_or(false),
            };
            self.enums.insert(location.qualified_name(), location);
        }
    }

    pub fn has_class(&self, name: &str) -> bool {
        self.classes.contains_key(name)
    }

    pub fn has_builtin_class(&self, name: &str) -> bool {
        self.builtin_classes.contains_key(name)
    }

    /// Enum by qualified name (`Name` or `Class.Name`).
    pub fn enum_location(&self, qualified: &str) -> Option<&EnumLocation> {
        self.enums.get(qualified)
    }

    /// Declared parent of an object class.
    pub fn class_parent(&self, name: &str) -> Option<&str> {
        self.class_parents.get(name).map(String::as_str)
    }

    /// True if `name` is `ancestor` or inherits from it.
    pub fn class_inherits(&self, name: &str, ancestor: &str) -> bool {
        let mut current = Some(name);
        while let Some(class) = current {
            if class == ancestor {
                return true;
            }
            current = self.class_parent(class);
        }
        false
    }

    /// Class of a singleton.
    pub fn singleton_type(&self, name: &str) -> Option<&str> {
        self.singletons.get(name).map(String::as_str)
    }

    pub fn class_names(&self) -> impl Iterator<Item = &str> {
        self.classes.keys().map(String::as_str)
    }

    pub fn builtin_class_names(&self) -> impl Iterator<Item = &str> {
        self.builtin_classes.keys().map(String::as_str)
    }

    pub fn singleton_names(&self) -> impl Iterator<Item = &str> {
        self.singletons.keys().map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DOC: &str = r#"{
        "header": {"version_major": 4},
        "global_enums": [{"name": "Side", "is_bitfield": false, "values": [{"name": "SIDE_LEFT", "value": 0}]}],
        "builtin_classes": [{"name": "Vector2", "enums": [{"name": "Axis", "values": []}]}],
        "classes": [
            {"name": "Object"},
            {"name": "Node", "inherits": "Object", "enums": [{"name": "ProcessMode", "values": []}]}
        ],
        "singletons": [{"name": "Engine", "type": "Engine"}]
    }"#;

    #[test]
    fn test_key_order_preserved() {
        let doc = IdlDocument::parse(DOC).unwrap();
        let keys: Vec<_> = doc.root().keys().collect();
        assert_eq!(
            keys,
            vec!["header", "global_enums", "builtin_classes", "classes", "singletons"]
        );
    }

    #[test]
    fn test_named_lookup_not_found() {
        let doc = IdlDocument::parse(DOC).unwrap();
        let classes = doc.root().attr("classes").unwrap();
        assert_eq!(classes.named("Node").unwrap().get("inherits").unwrap().as_str(), Some("Object"));
        let err = classes.named("Sprite").unwrap_err();
        assert!(err.is_not_found());
        let fallback = classes.named_or("Sprite", classes.at(0).unwrap());
        assert_eq!(fallback.get("name").unwrap().as_str(), Some("Object"));
        assert!(doc.root().attr("missing").is_err());
    }

    #[test]
    fn test_typed_records() {
        let doc = IdlDocument::parse(DOC).unwrap();
        let node = doc.class("Node").unwrap();
        assert_eq!(node.inherits.as_deref(), Some("Object"));
        assert!(node.methods.is_empty());
        assert!(doc.class("Sprite").is_err());
        assert_eq!(doc.global_enum("Side").unwrap().values.len(), 1);
    }

    #[test]
    fn test_index() {
        let doc = IdlDocument::parse(DOC).unwrap();
        let index = doc.index();
        assert!(index.has_class("Node"));
        assert!(index.has_builtin_class("Vector2"));
        assert!(index.enum_location("Node.ProcessMode").is_some());
        assert!(index.enum_location("Vector2.Axis").is_some());
        assert_eq!(index.singleton_type("Engine"), Some("Engine"));
        assert!(index.class_inherits("Node", "Object"));
        assert!(!index.class_inherits("Object", "Node"));
    }

    #[test]
    fn test_get_via_path() {
        let doc = IdlDocument::parse(DOC).unwrap();
        assert_eq!(doc.get_via_path("classes.1.name").unwrap().as_str(), Some("Node"));
        assert!(doc.get_via_path("classes.Nope").is_err());
    }
}
