//! In-process reference host
//!
//! `MemoryHost` keeps native handles, objects and the class database in plain
//! maps. Handles are installed by the embedder (or a test) with the `add_*`
//! methods; registration calls from the engine land in an inspectable class
//! database.

use std::cell::RefCell;
use std::rc::Rc;

use indexmap::IndexMap;
use rustc_hash::FxHashMap;

use crate::error::{HostError, HostResult};
use crate::handle::{
    BuiltinMethodFn, ConstructorFn, IndexedGetFn, IndexedSetFn, KeyedGetFn, KeyedSetFn,
    MemberGetFn, MemberSetFn, MethodBindFn, OperatorFn, UtilityFn,
};
use crate::host::HostInterface;
use crate::property::{ClassCreationInfo, ClassMethodInfo, PropertyInfo};
use crate::variant::{ObjectId, Variant, VariantOperator, VariantType};

// ============================================================================
// Class database records
// ============================================================================

/// A property as registered by the engine.
#[derive(Debug, Clone, PartialEq)]
pub struct RegisteredProperty {
    pub info: PropertyInfo,
    pub setter: String,
    pub getter: String,
}

/// A group or subgroup separator.
#[derive(Debug, Clone, PartialEq)]
pub struct RegisteredGroup {
    pub name: String,
    pub prefix: String,
    pub subgroup: bool,
}

/// An integer constant as registered by the engine.
#[derive(Debug, Clone, PartialEq)]
pub struct RegisteredConstant {
    pub enum_name: String,
    pub value: i64,
    pub is_bitfield: bool,
}

/// A class published into the host class database.
#[derive(Debug, Clone, Default)]
pub struct RegisteredClass {
    pub name: String,
    pub parent: String,
    pub info: ClassCreationInfo,
    pub methods: IndexMap<String, ClassMethodInfo>,
    pub properties: Vec<RegisteredProperty>,
    pub groups: Vec<RegisteredGroup>,
    pub signals: IndexMap<String, Vec<PropertyInfo>>,
    pub constants: IndexMap<String, RegisteredConstant>,
}

// ============================================================================
// State
// ============================================================================

#[derive(Default)]
struct MemoryHostState {
    utilities: FxHashMap<(String, u64), UtilityFn>,
    builtin_methods: FxHashMap<(VariantType, String, u64), BuiltinMethodFn>,
    method_binds: FxHashMap<(String, String, u64), MethodBindFn>,
    constructors: FxHashMap<(VariantType, usize), ConstructorFn>,
    operators: FxHashMap<(VariantOperator, VariantType, VariantType), OperatorFn>,
    member_getters: FxHashMap<(VariantType, String), MemberGetFn>,
    member_setters: FxHashMap<(VariantType, String), MemberSetFn>,
    indexed: FxHashMap<VariantType, (IndexedGetFn, IndexedSetFn)>,
    keyed: FxHashMap<VariantType, (KeyedGetFn, KeyedSetFn)>,

    native_classes: IndexMap<String, Option<String>>,
    native_properties: FxHashMap<String, Vec<PropertyInfo>>,
    objects: FxHashMap<ObjectId, String>,
    next_object: u64,
    singletons: FxHashMap<String, ObjectId>,

    class_db: IndexMap<String, RegisteredClass>,
    register_class_calls: FxHashMap<String, usize>,
    errors: Vec<String>,
}

/// Reference host implementation backed by in-memory maps.
#[derive(Default)]
pub struct MemoryHost {
    state: RefCell<MemoryHostState>,
}

impl MemoryHost {
    /// Create an empty host.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty host behind an `Rc`, ready to hand to the engine.
    pub fn shared() -> Rc<Self> {
        Rc::new(Self::new())
    }

    // ========================================================================
    // Handle installation
    // ========================================================================

    /// Install a free function.
    pub fn add_utility(
        &self,
        name: &str,
        hash: u64,
        f: impl Fn(&[Variant]) -> HostResult<Variant> + 'static,
    ) {
        self.state
            .borrow_mut()
            .utilities
            .insert((name.to_string(), hash), Rc::new(f));
    }

    /// Install a value-type method.
    pub fn add_builtin_method(
        &self,
        ty: VariantType,
        name: &str,
        hash: u64,
        f: impl Fn(Option<&mut Variant>, &[Variant]) -> HostResult<Variant> + 'static,
    ) {
        self.state
            .borrow_mut()
            .builtin_methods
            .insert((ty, name.to_string(), hash), Rc::new(f));
    }

    /// Install an object method.
    pub fn add_method_bind(
        &self,
        class: &str,
        name: &str,
        hash: u64,
        f: impl Fn(Option<ObjectId>, &[Variant]) -> HostResult<Variant> + 'static,
    ) {
        self.state
            .borrow_mut()
            .method_binds
            .insert((class.to_string(), name.to_string(), hash), Rc::new(f));
    }

    /// Install a constructor overload.
    pub fn add_constructor(
        &self,
        ty: VariantType,
        index: usize,
        f: impl Fn(&[Variant]) -> HostResult<Variant> + 'static,
    ) {
        self.state
            .borrow_mut()
            .constructors
            .insert((ty, index), Rc::new(f));
    }

    /// Install an operator evaluator.
    pub fn add_operator(
        &self,
        op: VariantOperator,
        left: VariantType,
        right: VariantType,
        f: impl Fn(&Variant, &Variant) -> HostResult<Variant> + 'static,
    ) {
        self.state
            .borrow_mut()
            .operators
            .insert((op, left, right), Rc::new(f));
    }

    /// Install member accessors for component `index` of a compound type.
    pub fn add_component_member(&self, ty: VariantType, member: &str, index: usize) {
        let getter: MemberGetFn = Rc::new(move |value: &Variant| match value {
            Variant::Compound { fields, .. } => fields
                .get(index)
                .cloned()
                .ok_or_else(|| HostError::IndexOutOfRange {
                    index: index as i64,
                    size: fields.len() as i64,
                }),
            other => Err(HostError::TypeMismatch {
                expected: "compound".to_string(),
                got: other.variant_type().name().to_string(),
            }),
        });
        let setter: MemberSetFn = Rc::new(move |value: &mut Variant, new: Variant| match value {
            Variant::Compound { fields, .. } if index < fields.len() => {
                fields[index] = new;
                Ok(())
            }
            other => Err(HostError::TypeMismatch {
                expected: "compound".to_string(),
                got: other.variant_type().name().to_string(),
            }),
        });
        let mut state = self.state.borrow_mut();
        state.member_getters.insert((ty, member.to_string()), getter);
        state.member_setters.insert((ty, member.to_string()), setter);
    }

    /// Install positional accessors over `Array` or compound payloads.
    pub fn add_sequence_indexing(&self, ty: VariantType) {
        let getter: IndexedGetFn = Rc::new(|value: &Variant, index: i64| {
            let items = sequence_items(value)?;
            usize::try_from(index)
                .ok()
                .and_then(|i| items.get(i))
                .cloned()
                .ok_or(HostError::IndexOutOfRange {
                    index,
                    size: items.len() as i64,
                })
        });
        let setter: IndexedSetFn = Rc::new(|value: &mut Variant, index: i64, new: Variant| {
            let items = match value {
                Variant::Array(items) => items,
                Variant::Compound { fields, .. } => fields,
                other => {
                    return Err(HostError::TypeMismatch {
                        expected: "sequence".to_string(),
                        got: other.variant_type().name().to_string(),
                    })
                }
            };
            let size = items.len() as i64;
            let slot = usize::try_from(index)
                .ok()
                .and_then(|i| items.get_mut(i))
                .ok_or(HostError::IndexOutOfRange { index, size })?;
            *slot = new;
            Ok(())
        });
        self.state.borrow_mut().indexed.insert(ty, (getter, setter));
    }

    /// Install keyed accessors over `Dictionary` payloads.
    pub fn add_dictionary_keying(&self, ty: VariantType) {
        let getter: KeyedGetFn = Rc::new(|value: &Variant, key: &Variant| match value {
            Variant::Dictionary(entries) => Ok(entries
                .iter()
                .find(|(k, _)| k == key)
                .map(|(_, v)| v.clone())
                .unwrap_or_default()),
            other => Err(HostError::TypeMismatch {
                expected: "Dictionary".to_string(),
                got: other.variant_type().name().to_string(),
            }),
        });
        let setter: KeyedSetFn = Rc::new(|value: &mut Variant, key: Variant, new: Variant| {
            match value {
                Variant::Dictionary(entries) => {
                    match entries.iter_mut().find(|(k, _)| *k == key) {
                        Some(entry) => entry.1 = new,
                        None => entries.push((key, new)),
                    }
                    Ok(())
                }
                other => Err(HostError::TypeMismatch {
                    expected: "Dictionary".to_string(),
                    got: other.variant_type().name().to_string(),
                }),
            }
        });
        self.state.borrow_mut().keyed.insert(ty, (getter, setter));
    }

    /// Declare a native class the host can construct.
    pub fn add_native_class(&self, name: &str, parent: Option<&str>) {
        self.state
            .borrow_mut()
            .native_classes
            .insert(name.to_string(), parent.map(str::to_string));
    }

    /// Declare a host-side property of a native class.
    pub fn add_native_property(&self, class: &str, info: PropertyInfo) {
        self.state
            .borrow_mut()
            .native_properties
            .entry(class.to_string())
            .or_default()
            .push(info);
    }

    /// Create a singleton instance of `class` registered under `name`.
    pub fn add_singleton(&self, name: &str, class: &str) -> ObjectId {
        let id = self.allocate(class);
        self.state
            .borrow_mut()
            .singletons
            .insert(name.to_string(), id);
        id
    }

    // ========================================================================
    // Inspection
    // ========================================================================

    /// Snapshot of a registered class.
    pub fn registered_class(&self, name: &str) -> Option<RegisteredClass> {
        self.state.borrow().class_db.get(name).cloned()
    }

    /// How many times `register_class` succeeded for `name`.
    pub fn register_class_calls(&self, name: &str) -> usize {
        self.state
            .borrow()
            .register_class_calls
            .get(name)
            .copied()
            .unwrap_or(0)
    }

    /// Errors printed through the host channel.
    pub fn printed_errors(&self) -> Vec<String> {
        self.state.borrow().errors.clone()
    }

    /// True while the object is live.
    pub fn is_alive(&self, id: ObjectId) -> bool {
        self.state.borrow().objects.contains_key(&id)
    }

    /// Number of live objects.
    pub fn object_count(&self) -> usize {
        self.state.borrow().objects.len()
    }

    fn allocate(&self, class: &str) -> ObjectId {
        let mut state = self.state.borrow_mut();
        state.next_object += 1;
        let id = ObjectId(state.next_object);
        state.objects.insert(id, class.to_string());
        id
    }

    fn class_parent(state: &MemoryHostState, class: &str) -> Option<String> {
        if let Some(registered) = state.class_db.get(class) {
            return Some(registered.parent.clone()).filter(|p| !p.is_empty());
        }
        state.native_classes.get(class).cloned().flatten()
    }

    fn class_known(state: &MemoryHostState, class: &str) -> bool {
        state.native_classes.contains_key(class) || state.class_db.contains_key(class)
    }
}

fn sequence_items(value: &Variant) -> HostResult<&[Variant]> {
    match value {
        Variant::Array(items) => Ok(items),
        Variant::Compound { fields, .. } => Ok(fields),
        other => Err(HostError::TypeMismatch {
            expected: "sequence".to_string(),
            got: other.variant_type().name().to_string(),
        }),
    }
}

fn stringify_into(value: &Variant, out: &mut String) {
    match value {
        Variant::Nil => out.push_str("<null>"),
        Variant::Bool(b) => out.push_str(if *b { "true" } else { "false" }),
        Variant::Int(v) => out.push_str(&v.to_string()),
        Variant::Float(v) => out.push_str(&v.to_string()),
        Variant::String(s) | Variant::StringName(s) | Variant::NodePath(s) => out.push_str(s),
        Variant::Object(None) => out.push_str("<Object#null>"),
        Variant::Object(Some(id)) => out.push_str(&format!("<Object{}>", id)),
        Variant::Array(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push_str(", ");
                }
                stringify_into(item, out);
            }
            out.push(']');
        }
        Variant::Dictionary(entries) => {
            out.push('{');
            for (i, (k, v)) in entries.iter().enumerate() {
                if i > 0 {
                    out.push_str(", ");
                }
                stringify_into(k, out);
                out.push_str(": ");
                stringify_into(v, out);
            }
            out.push('}');
        }
        Variant::Signal { name, .. } => out.push_str(&format!("Signal({})", name)),
        Variant::Callable { method, .. } => out.push_str(&format!("Callable({})", method)),
        Variant::Compound { fields, .. } => {
            out.push('(');
            for (i, field) in fields.iter().enumerate() {
                if i > 0 {
                    out.push_str(", ");
                }
                stringify_into(field, out);
            }
            out.push(')');
        }
    }
}

// ============================================================================
// HostInterface
// ============================================================================

impl HostInterface for MemoryHost {
    fn utility_function(&self, name: &str, hash: u64) -> Option<UtilityFn> {
        self.state
            .borrow()
            .utilities
            .get(&(name.to_string(), hash))
            .cloned()
    }

    fn builtin_method(&self, ty: VariantType, name: &str, hash: u64) -> Option<BuiltinMethodFn> {
        self.state
            .borrow()
            .builtin_methods
            .get(&(ty, name.to_string(), hash))
            .cloned()
    }

    fn method_bind(&self, class: &str, name: &str, hash: u64) -> Option<MethodBindFn> {
        self.state
            .borrow()
            .method_binds
            .get(&(class.to_string(), name.to_string(), hash))
            .cloned()
    }

    fn constructor(&self, ty: VariantType, index: usize) -> Option<ConstructorFn> {
        self.state.borrow().constructors.get(&(ty, index)).cloned()
    }

    fn operator_evaluator(
        &self,
        op: VariantOperator,
        left: VariantType,
        right: VariantType,
    ) -> Option<OperatorFn> {
        self.state
            .borrow()
            .operators
            .get(&(op, left, right))
            .cloned()
    }

    fn member_getter(&self, ty: VariantType, member: &str) -> Option<MemberGetFn> {
        self.state
            .borrow()
            .member_getters
            .get(&(ty, member.to_string()))
            .cloned()
    }

    fn member_setter(&self, ty: VariantType, member: &str) -> Option<MemberSetFn> {
        self.state
            .borrow()
            .member_setters
            .get(&(ty, member.to_string()))
            .cloned()
    }

    fn indexed_getter(&self, ty: VariantType) -> Option<IndexedGetFn> {
        self.state.borrow().indexed.get(&ty).map(|(g, _)| g.clone())
    }

    fn indexed_setter(&self, ty: VariantType) -> Option<IndexedSetFn> {
        self.state.borrow().indexed.get(&ty).map(|(_, s)| s.clone())
    }

    fn keyed_getter(&self, ty: VariantType) -> Option<KeyedGetFn> {
        self.state.borrow().keyed.get(&ty).map(|(g, _)| g.clone())
    }

    fn keyed_setter(&self, ty: VariantType) -> Option<KeyedSetFn> {
        self.state.borrow().keyed.get(&ty).map(|(_, s)| s.clone())
    }

    fn construct_object(&self, class: &str) -> HostResult<ObjectId> {
        {
            let state = self.state.borrow();
            if !Self::class_known(&state, class) {
                return Err(HostError::UnknownClass(class.to_string()));
            }
            if state
                .class_db
                .get(class)
                .map_or(false, |registered| registered.info.is_abstract)
            {
                return Err(HostError::CallFailed(format!(
                    "cannot instantiate abstract class '{}'",
                    class
                )));
            }
        }
        Ok(self.allocate(class))
    }

    fn destroy_object(&self, id: ObjectId) -> HostResult<()> {
        self.state
            .borrow_mut()
            .objects
            .remove(&id)
            .map(|_| ())
            .ok_or(HostError::InvalidObject(id))
    }

    fn object_class(&self, id: ObjectId) -> Option<String> {
        self.state.borrow().objects.get(&id).cloned()
    }

    fn object_property_list(&self, id: ObjectId) -> Vec<PropertyInfo> {
        let state = self.state.borrow();
        let mut class = state.objects.get(&id).cloned();
        let mut list = Vec::new();
        while let Some(name) = class {
            if let Some(registered) = state.class_db.get(&name) {
                list.extend(registered.properties.iter().map(|p| p.info.clone()));
            }
            if let Some(native) = state.native_properties.get(&name) {
                list.extend(native.iter().cloned());
            }
            class = Self::class_parent(&state, &name);
        }
        list
    }

    fn singleton(&self, name: &str) -> Option<ObjectId> {
        self.state.borrow().singletons.get(name).copied()
    }

    fn stringify(&self, value: &Variant) -> String {
        let mut out = String::new();
        match value {
            Variant::Compound { ty, .. } => {
                out.push_str(ty.name());
                stringify_into(value, &mut out);
            }
            _ => stringify_into(value, &mut out),
        }
        out
    }

    fn print_error(&self, message: &str) {
        log::error!("{}", message);
        self.state.borrow_mut().errors.push(message.to_string());
    }

    fn register_class(&self, name: &str, parent: &str, info: ClassCreationInfo) -> HostResult<()> {
        let mut state = self.state.borrow_mut();
        if state.class_db.contains_key(name) || state.native_classes.contains_key(name) {
            return Err(HostError::AlreadyRegistered {
                kind: "class",
                class: parent.to_string(),
                name: name.to_string(),
            });
        }
        if !Self::class_known(&state, parent) {
            return Err(HostError::UnknownClass(parent.to_string()));
        }
        state.class_db.insert(
            name.to_string(),
            RegisteredClass {
                name: name.to_string(),
                parent: parent.to_string(),
                info,
                ..Default::default()
            },
        );
        *state
            .register_class_calls
            .entry(name.to_string())
            .or_insert(0) += 1;
        Ok(())
    }

    fn unregister_class(&self, name: &str) -> HostResult<()> {
        self.state
            .borrow_mut()
            .class_db
            .shift_remove(name)
            .map(|_| ())
            .ok_or_else(|| HostError::UnknownClass(name.to_string()))
    }

    fn register_method(&self, class: &str, info: ClassMethodInfo) -> HostResult<()> {
        let mut state = self.state.borrow_mut();
        let registered = state
            .class_db
            .get_mut(class)
            .ok_or_else(|| HostError::UnknownClass(class.to_string()))?;
        if registered.methods.contains_key(&info.name) {
            return Err(HostError::AlreadyRegistered {
                kind: "method",
                class: class.to_string(),
                name: info.name,
            });
        }
        registered.methods.insert(info.name.clone(), info);
        Ok(())
    }

    fn register_property(
        &self,
        class: &str,
        info: PropertyInfo,
        setter: &str,
        getter: &str,
    ) -> HostResult<()> {
        let mut state = self.state.borrow_mut();
        let registered = state
            .class_db
            .get_mut(class)
            .ok_or_else(|| HostError::UnknownClass(class.to_string()))?;
        for accessor in [setter, getter] {
            if !accessor.is_empty() && !registered.methods.contains_key(accessor) {
                return Err(HostError::ArgumentError(format!(
                    "property '{}' refers to unknown method '{}'",
                    info.name, accessor
                )));
            }
        }
        if registered.properties.iter().any(|p| p.info.name == info.name) {
            return Err(HostError::AlreadyRegistered {
                kind: "property",
                class: class.to_string(),
                name: info.name,
            });
        }
        registered.properties.push(RegisteredProperty {
            info,
            setter: setter.to_string(),
            getter: getter.to_string(),
        });
        Ok(())
    }

    fn register_property_group(&self, class: &str, name: &str, prefix: &str) -> HostResult<()> {
        let mut state = self.state.borrow_mut();
        let registered = state
            .class_db
            .get_mut(class)
            .ok_or_else(|| HostError::UnknownClass(class.to_string()))?;
        registered.groups.push(RegisteredGroup {
            name: name.to_string(),
            prefix: prefix.to_string(),
            subgroup: false,
        });
        Ok(())
    }

    fn register_property_subgroup(
        &self,
        class: &str,
        name: &str,
        prefix: &str,
    ) -> HostResult<()> {
        let mut state = self.state.borrow_mut();
        let registered = state
            .class_db
            .get_mut(class)
            .ok_or_else(|| HostError::UnknownClass(class.to_string()))?;
        registered.groups.push(RegisteredGroup {
            name: name.to_string(),
            prefix: prefix.to_string(),
            subgroup: true,
        });
        Ok(())
    }

    fn register_signal(&self, class: &str, name: &str, args: Vec<PropertyInfo>) -> HostResult<()> {
        let mut state = self.state.borrow_mut();
        let registered = state
            .class_db
            .get_mut(class)
            .ok_or_else(|| HostError::UnknownClass(class.to_string()))?;
        if registered.signals.contains_key(name) {
            return Err(HostError::AlreadyRegistered {
                kind: "signal",
                class: class.to_string(),
                name: name.to_string(),
            });
        }
        registered.signals.insert(name.to_string(), args);
        Ok(())
    }

    fn register_integer_constant(
        &self,
        class: &str,
        enum_name: &str,
        name: &str,
        value: i64,
        is_bitfield: bool,
    ) -> HostResult<()> {
        let mut state = self.state.borrow_mut();
        let registered = state
            .class_db
            .get_mut(class)
            .ok_or_else(|| HostError::UnknownClass(class.to_string()))?;
        if registered.constants.contains_key(name) {
            return Err(HostError::AlreadyRegistered {
                kind: "constant",
                class: class.to_string(),
                name: name.to_string(),
            });
        }
        registered.constants.insert(
            name.to_string(),
            RegisteredConstant {
                enum_name: enum_name.to_string(),
                value,
                is_bitfield,
            },
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_construct_requires_known_class() {
        let host = MemoryHost::new();
        assert!(host.construct_object("Node").is_err());
        host.add_native_class("Object", None);
        host.add_native_class("Node", Some("Object"));
        let id = host.construct_object("Node").unwrap();
        assert_eq!(host.object_class(id).as_deref(), Some("Node"));
        host.destroy_object(id).unwrap();
        assert!(!host.is_alive(id));
        assert!(host.destroy_object(id).is_err());
    }

    #[test]
    fn test_register_class_rejects_duplicates() {
        let host = MemoryHost::new();
        host.add_native_class("Object", None);
        host.register_class("Player", "Object", ClassCreationInfo::default())
            .unwrap();
        assert!(host
            .register_class("Player", "Object", ClassCreationInfo::default())
            .is_err());
        assert_eq!(host.register_class_calls("Player"), 1);
    }

    #[test]
    fn test_property_accessors_must_exist() {
        let host = MemoryHost::new();
        host.add_native_class("Object", None);
        host.register_class("A", "Object", ClassCreationInfo::default())
            .unwrap();
        let info = PropertyInfo::new(VariantType::Int, "x");
        assert!(host
            .register_property("A", info.clone(), "_set_x", "_get_x")
            .is_err());
        host.register_method(
            "A",
            ClassMethodInfo {
                name: "_get_x".into(),
                ..Default::default()
            },
        )
        .unwrap();
        host.register_property("A", info, "", "_get_x").unwrap();
        assert_eq!(host.registered_class("A").unwrap().properties.len(), 1);
    }

    #[test]
    fn test_component_members() {
        let host = MemoryHost::new();
        host.add_component_member(VariantType::Vector2, "y", 1);
        let mut v = Variant::compound(VariantType::Vector2, vec![1.0.into(), 2.0.into()]);
        let get = host.member_getter(VariantType::Vector2, "y").unwrap();
        let set = host.member_setter(VariantType::Vector2, "y").unwrap();
        assert_eq!(get(&v).unwrap(), Variant::Float(2.0));
        set(&mut v, Variant::Float(5.0)).unwrap();
        assert_eq!(get(&v).unwrap(), Variant::Float(5.0));
        assert_eq!(host.stringify(&v), "Vector2(1, 5)");
    }
}
