//! User classes
//!
//! Classes authored in the embedded language: their declarations, their
//! definition as runtime types, registration into the host class database,
//! association with live host instances, and the script resources that
//! load, reload and instantiate them.

mod association;
mod class_info;
mod decl;
mod instance;
mod placeholder;
mod registration;
mod resource;

pub use association::{clear_script_class, set_script_class};
pub use class_info::{define_class, ClassInfo};
pub use decl::{
    Accessor, Base, ClassDecl, DefaultFactory, DefaultValue, EnumDecl, ExposeParams, MemberDecl,
    MethodDecl, ParamDecl, ParamKind, PropertyDecl, ScriptFn, SignalDecl,
};
pub use instance::ScriptInstance;
pub use placeholder::PlaceholderInstance;
pub use registration::register_extension_class;
pub use resource::{Script, ScriptLoader};

use hostbind_sdk::ObjectId;
use indexmap::IndexMap;
use rustc_hash::FxHashMap;

use crate::runtime::TypeId;

/// Script-side bookkeeping owned by the runtime.
#[derive(Default)]
pub struct ScriptRegistry {
    classes: FxHashMap<TypeId, ClassInfo>,
    by_name: FxHashMap<String, TypeId>,
    exposed: IndexMap<String, TypeId>,
    /// Bridge types by (native base, user class)
    bridges: FxHashMap<(TypeId, TypeId), TypeId>,
    /// Extension classes in the host class database, with the revision
    /// that was published
    registered: FxHashMap<String, (TypeId, u32)>,
    /// User class attached to each host object
    instances: FxHashMap<ObjectId, TypeId>,
}

impl ScriptRegistry {
    pub(crate) fn insert_class(&mut self, info: ClassInfo) {
        self.exposed.retain(|_, id| *id != info.ty);
        if let Some(name) = info.global_name() {
            self.exposed.insert(name, info.ty);
        }
        self.by_name.insert(info.name.clone(), info.ty);
        self.classes.insert(info.ty, info);
    }

    pub fn class_info(&self, ty: TypeId) -> Option<&ClassInfo> {
        self.classes.get(&ty)
    }

    /// Latest user class defined under `name`.
    pub fn class_by_name(&self, name: &str) -> Option<TypeId> {
        self.by_name.get(name).copied()
    }

    /// User class published as a module global.
    pub fn exposed_class(&self, name: &str) -> Option<TypeId> {
        self.exposed.get(name).copied()
    }

    pub fn exposed_names(&self) -> impl Iterator<Item = String> + '_ {
        self.exposed.keys().cloned()
    }

    pub fn class_count(&self) -> usize {
        self.classes.len()
    }

    pub(crate) fn bridge(&self, native_base: TypeId, user_class: TypeId) -> Option<TypeId> {
        self.bridges.get(&(native_base, user_class)).copied()
    }

    pub(crate) fn insert_bridge(&mut self, native_base: TypeId, user_class: TypeId, bridge: TypeId) {
        self.bridges.insert((native_base, user_class), bridge);
    }

    pub fn bridge_count(&self) -> usize {
        self.bridges.len()
    }

    pub(crate) fn registration(&self, name: &str) -> Option<(TypeId, u32)> {
        self.registered.get(name).copied()
    }

    pub(crate) fn mark_registered(&mut self, name: &str, ty: TypeId, revision: u32) {
        self.registered.insert(name.to_string(), (ty, revision));
    }

    pub fn is_registered(&self, name: &str) -> bool {
        self.registered.contains_key(name)
    }

    /// User class attached to the host object `id`.
    pub fn instance_class(&self, id: ObjectId) -> Option<TypeId> {
        self.instances.get(&id).copied()
    }

    pub(crate) fn attach_instance(&mut self, id: ObjectId, class: TypeId) {
        self.instances.insert(id, class);
    }

    pub(crate) fn forget_instance(&mut self, id: ObjectId) {
        self.instances.remove(&id);
    }
}
