//! Type registry
//!
//! Every runtime type is an explicit tagged record: kind, ordered bases and a
//! member table. Records are only created through [`TypeRegistry::create`],
//! and stripping a record clears everything it published while keeping its
//! identity, so existing values of the type see whatever is attached later.

use std::rc::Rc;

use hostbind_sdk::VariantType;
use indexmap::IndexMap;
use rustc_hash::FxHashMap;

use super::value::{IntConstant, Value};
use crate::bind::{
    BoundMethod, ConstructorDispatcher, Indexer, OperatorTable, PropertyDescriptor,
    SignalDescriptor,
};
use crate::error::{BindError, BindResult};
use crate::types::TypeInfo;

/// Handle to a [`TypeRecord`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TypeId(u32);

impl TypeId {
    fn index(self) -> usize {
        self.0 as usize
    }
}

/// What a type stands for.
#[derive(Debug, Clone, PartialEq)]
pub enum TypeKind {
    /// The nil type
    Nil,
    /// Accepts any value
    Dynamic,
    /// Host value type
    Value(VariantType),
    /// `Array` restricted to one element type
    TypedArray(TypeInfo),
    /// Enum or bitfield
    Enum { qualified: String, bitfield: bool },
    /// Host object class
    Object,
    /// Class authored in the embedded language
    UserClass { extension: bool, module: String },
    /// Native base and user class joined for one instance
    Bridge {
        native_base: TypeId,
        user_class: TypeId,
    },
}

/// Properties of a type the binders derive once.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TypeTraits {
    pub has_members: bool,
    pub has_non_const_methods: bool,
    pub has_destructor: bool,
}

/// Entry of a member table.
#[derive(Clone)]
pub enum Member {
    Method(Rc<BoundMethod>),
    Property(Rc<PropertyDescriptor>),
    Signal(Rc<SignalDescriptor>),
    Constant(IntConstant),
    Enum(TypeId),
    Value(Value),
}

impl Member {
    /// Family name used in diagnostics.
    pub fn kind(&self) -> &'static str {
        match self {
            Member::Method(_) => "method",
            Member::Property(_) => "property",
            Member::Signal(_) => "signal",
            Member::Constant(_) => "constant",
            Member::Enum(_) => "enum",
            Member::Value(_) => "value",
        }
    }

    pub fn as_method(&self) -> Option<&Rc<BoundMethod>> {
        match self {
            Member::Method(method) => Some(method),
            _ => None,
        }
    }

    pub fn as_property(&self) -> Option<&Rc<PropertyDescriptor>> {
        match self {
            Member::Property(property) => Some(property),
            _ => None,
        }
    }
}

/// A runtime type.
pub struct TypeRecord {
    pub id: TypeId,
    pub name: String,
    pub kind: TypeKind,
    pub bases: Vec<TypeId>,
    pub members: IndexMap<String, Member>,
    pub operators: OperatorTable,
    pub indexer: Option<Indexer>,
    pub constructor: Option<Rc<ConstructorDispatcher>>,
    pub traits: TypeTraits,
    pub doc: Option<String>,
}

impl TypeRecord {
    pub fn is_object_class(&self) -> bool {
        matches!(self.kind, TypeKind::Object)
    }

    pub fn is_user_class(&self) -> bool {
        matches!(self.kind, TypeKind::UserClass { .. })
    }

    /// Host value kind of instances.
    pub fn variant_type(&self) -> VariantType {
        match &self.kind {
            TypeKind::Nil | TypeKind::Dynamic => VariantType::Nil,
            TypeKind::Value(ty) => *ty,
            TypeKind::TypedArray(_) => VariantType::Array,
            TypeKind::Enum { .. } => VariantType::Int,
            TypeKind::Object | TypeKind::UserClass { .. } | TypeKind::Bridge { .. } => {
                VariantType::Object
            }
        }
    }
}

// ============================================================================
// Registry
// ============================================================================

/// Owner of every type record.
#[derive(Default)]
pub struct TypeRegistry {
    records: Vec<TypeRecord>,
    by_name: FxHashMap<String, TypeId>,
    user_keys: FxHashMap<(String, String), TypeId>,
}

impl TypeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a type. Host-described types become reachable by name; user
    /// classes by (module, name).
    pub fn create(&mut self, name: &str, kind: TypeKind, bases: Vec<TypeId>) -> TypeId {
        let id = TypeId(self.records.len() as u32);
        match &kind {
            TypeKind::Nil
            | TypeKind::Dynamic
            | TypeKind::Value(_)
            | TypeKind::Enum { .. }
            | TypeKind::Object => {
                self.by_name.insert(name.to_string(), id);
            }
            TypeKind::UserClass { module, .. } => {
                self.user_keys
                    .insert((module.clone(), name.to_string()), id);
            }
            TypeKind::TypedArray(_) | TypeKind::Bridge { .. } => {}
        }
        log::debug!("created type '{}' ({:?})", name, id);
        self.records.push(TypeRecord {
            id,
            name: name.to_string(),
            kind,
            bases,
            members: IndexMap::new(),
            operators: OperatorTable::default(),
            indexer: None,
            constructor: None,
            traits: TypeTraits::default(),
            doc: None,
        });
        id
    }

    pub fn get(&self, id: TypeId) -> &TypeRecord {
        &self.records[id.index()]
    }

    pub fn get_mut(&mut self, id: TypeId) -> &mut TypeRecord {
        &mut self.records[id.index()]
    }

    pub fn name(&self, id: TypeId) -> &str {
        &self.get(id).name
    }

    /// Host-described type by name.
    pub fn lookup(&self, name: &str) -> Option<TypeId> {
        self.by_name.get(name).copied()
    }

    /// User class by defining module and qualified name.
    pub fn user_type(&self, module: &str, name: &str) -> Option<TypeId> {
        self.user_keys
            .get(&(module.to_string(), name.to_string()))
            .copied()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Every record in creation order.
    pub fn iter(&self) -> impl Iterator<Item = &TypeRecord> {
        self.records.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Remove everything the type published. Identity and bases stay.
    pub fn strip(&mut self, id: TypeId) {
        let record = self.get_mut(id);
        log::debug!(
            "stripping {} members from '{}'",
            record.members.len(),
            record.name
        );
        record.members.clear();
        record.operators.clear();
        record.indexer = None;
        record.constructor = None;
        record.traits = TypeTraits::default();
        record.doc = None;
    }

    // ========================================================================
    // Hierarchy
    // ========================================================================

    /// Replace the bases of `id`. Fails, leaving the record unchanged, when
    /// `id` would become its own ancestor.
    pub fn set_bases(&mut self, id: TypeId, bases: Vec<TypeId>) -> BindResult<()> {
        if let Some(&base) = bases.iter().find(|&&base| self.is_subtype(base, id)) {
            return Err(BindError::Type(format!(
                "'{}' cannot inherit from '{}': it is already one of its bases",
                self.name(id),
                self.name(base)
            )));
        }
        self.get_mut(id).bases = bases;
        Ok(())
    }

    /// Linearized ancestor chain, starting with `id` itself.
    pub fn mro(&self, id: TypeId) -> Vec<TypeId> {
        match self.try_mro(id) {
            Ok(order) => order,
            Err(err) => {
                log::error!("{}", err);
                vec![id]
            }
        }
    }

    /// [`mro`](Self::mro), failing on a cyclic hierarchy.
    pub fn try_mro(&self, id: TypeId) -> BindResult<Vec<TypeId>> {
        self.linearize(id, &mut Vec::new())
    }

    fn linearize(&self, id: TypeId, visiting: &mut Vec<TypeId>) -> BindResult<Vec<TypeId>> {
        if visiting.contains(&id) {
            return Err(BindError::Type(format!(
                "'{}' inherits from itself",
                self.name(id)
            )));
        }
        visiting.push(id);
        let bases = &self.get(id).bases;
        let mut sequences = bases
            .iter()
            .map(|&base| self.linearize(base, visiting))
            .collect::<BindResult<Vec<_>>>()?;
        visiting.pop();
        sequences.push(bases.clone());

        let mut order = vec![id];
        loop {
            sequences.retain(|seq| !seq.is_empty());
            if sequences.is_empty() {
                return Ok(order);
            }
            let head = sequences
                .iter()
                .map(|seq| seq[0])
                .find(|candidate| !sequences.iter().any(|seq| seq[1..].contains(candidate)));
            match head {
                Some(next) => {
                    order.push(next);
                    for seq in sequences.iter_mut() {
                        if seq[0] == next {
                            seq.remove(0);
                        }
                    }
                }
                None => {
                    // No consistent linearization; keep depth-first order.
                    for seq in sequences {
                        for ty in seq {
                            if !order.contains(&ty) {
                                order.push(ty);
                            }
                        }
                    }
                    return Ok(order);
                }
            }
        }
    }

    /// True if `ancestor` is in the chain of `id`.
    pub fn is_subtype(&self, id: TypeId, ancestor: TypeId) -> bool {
        id == ancestor || self.mro(id).contains(&ancestor)
    }

    /// True if a type named `name` is in the chain of `id`.
    pub fn inherits_named(&self, id: TypeId, name: &str) -> bool {
        self.mro(id).into_iter().any(|ty| self.name(ty) == name)
    }

    /// First member `name` along the chain.
    pub fn find_member(&self, id: TypeId, name: &str) -> Option<Member> {
        self.mro(id)
            .into_iter()
            .find_map(|ty| self.get(ty).members.get(name).cloned())
    }

    /// Owner of the first member `name` along the chain.
    pub fn member_owner(&self, id: TypeId, name: &str) -> Option<TypeId> {
        self.mro(id)
            .into_iter()
            .find(|&ty| self.get(ty).members.contains_key(name))
    }

    /// Most-derived host class in the chain of an object type.
    pub fn native_base(&self, id: TypeId) -> Option<TypeId> {
        if let TypeKind::Bridge { native_base, .. } = self.get(id).kind {
            return Some(native_base);
        }
        self.mro(id).into_iter().find(|&ty| {
            matches!(
                self.get(ty).kind,
                TypeKind::Object | TypeKind::UserClass { extension: true, .. }
            )
        })
    }

    /// The user class an object type carries, if any.
    pub fn user_class(&self, id: TypeId) -> Option<TypeId> {
        match self.get(id).kind {
            TypeKind::Bridge { user_class, .. } => Some(user_class),
            TypeKind::UserClass { .. } => Some(id),
            _ => None,
        }
    }

    /// Describe a type the way the resolver would.
    pub fn type_info(&self, id: TypeId) -> TypeInfo {
        let record = self.get(id);
        match &record.kind {
            TypeKind::Nil => TypeInfo::Void,
            TypeKind::Dynamic => TypeInfo::Dynamic,
            TypeKind::Value(VariantType::Array) => TypeInfo::Array(None),
            TypeKind::Value(ty) => TypeInfo::Builtin(*ty),
            TypeKind::TypedArray(element) => TypeInfo::array_of(element.clone()),
            TypeKind::Enum {
                qualified,
                bitfield: false,
            } => TypeInfo::Enum(qualified.clone()),
            TypeKind::Enum {
                qualified,
                bitfield: true,
            } => TypeInfo::Bitfield(qualified.clone()),
            TypeKind::Object | TypeKind::UserClass { extension: true, .. } => {
                TypeInfo::Object(record.name.clone())
            }
            TypeKind::UserClass { .. } => TypeInfo::Script {
                native_base: self.native_base_name(id),
                user_type: record.name.clone(),
            },
            TypeKind::Bridge {
                native_base,
                user_class,
            } => TypeInfo::Script {
                native_base: self.name(*native_base).to_string(),
                user_type: self.name(*user_class).to_string(),
            },
        }
    }

    fn native_base_name(&self, id: TypeId) -> String {
        self.native_base(id)
            .map(|base| self.name(base).to_string())
            .unwrap_or_else(|| "Object".to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chain(registry: &mut TypeRegistry) -> (TypeId, TypeId, TypeId) {
        let object = registry.create("Object", TypeKind::Object, vec![]);
        let node = registry.create("Node", TypeKind::Object, vec![object]);
        let sprite = registry.create("Sprite", TypeKind::Object, vec![node]);
        (object, node, sprite)
    }

    #[test]
    fn test_single_inheritance_mro() {
        let mut registry = TypeRegistry::new();
        let (object, node, sprite) = chain(&mut registry);
        assert_eq!(registry.mro(sprite), vec![sprite, node, object]);
        assert!(registry.is_subtype(sprite, object));
        assert!(!registry.is_subtype(object, node));
        assert_eq!(registry.lookup("Node"), Some(node));
    }

    #[test]
    fn test_cyclic_bases_are_refused() {
        let mut registry = TypeRegistry::new();
        let (object, node, sprite) = chain(&mut registry);
        assert!(registry.set_bases(node, vec![sprite]).is_err());
        assert!(registry.set_bases(object, vec![object]).is_err());
        assert_eq!(registry.mro(sprite), vec![sprite, node, object]);

        // a cycle forced past the check is reported, not followed
        registry.get_mut(object).bases = vec![sprite];
        assert!(registry.try_mro(sprite).is_err());
        assert_eq!(registry.mro(sprite), vec![sprite]);
        assert!(!registry.is_subtype(sprite, node));
    }

    #[test]
    fn test_bridge_linearization() {
        let mut registry = TypeRegistry::new();
        let (object, node, sprite) = chain(&mut registry);
        let player = registry.create(
            "Player",
            TypeKind::UserClass {
                extension: false,
                module: "game".into(),
            },
            vec![node],
        );
        let bridge = registry.create(
            "Player(Sprite)",
            TypeKind::Bridge {
                native_base: sprite,
                user_class: player,
            },
            vec![player, sprite],
        );
        assert_eq!(
            registry.mro(bridge),
            vec![bridge, player, sprite, node, object]
        );
        assert_eq!(registry.native_base(bridge), Some(sprite));
        assert_eq!(registry.native_base(player), Some(node));
        assert_eq!(registry.user_class(bridge), Some(player));
        assert_eq!(registry.user_type("game", "Player"), Some(player));
        assert_eq!(
            registry.type_info(bridge),
            TypeInfo::Script {
                native_base: "Sprite".into(),
                user_type: "Player".into()
            }
        );
    }

    #[test]
    fn test_strip_keeps_identity() {
        let mut registry = TypeRegistry::new();
        let (_, node, sprite) = chain(&mut registry);
        registry
            .get_mut(node)
            .members
            .insert("MAX".into(), Member::Constant(IntConstant::new("Node", "MAX", 3)));
        assert!(registry.find_member(sprite, "MAX").is_some());
        assert_eq!(registry.member_owner(sprite, "MAX"), Some(node));
        registry.strip(node);
        assert!(registry.find_member(sprite, "MAX").is_none());
        assert_eq!(registry.lookup("Node"), Some(node));
    }
}
