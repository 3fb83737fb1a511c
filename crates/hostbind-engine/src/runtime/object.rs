//! Object wrappers
//!
//! One wrapper per live host object. The wrapper carries the object's
//! effective type (which changes when a script class is attached), per
//! instance storage for script properties, and lazily created signals and
//! property proxies.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use hostbind_sdk::ObjectId;
use indexmap::IndexMap;
use rustc_hash::FxHashMap;

use super::registry::TypeId;
use super::value::{PropertyProxy, SignalValue, Value};

/// Shared handle to a wrapper.
pub type ObjectRef = Rc<ObjectWrapper>;

pub struct ObjectWrapper {
    id: Cell<Option<ObjectId>>,
    class: Cell<TypeId>,
    state: RefCell<IndexMap<String, Value>>,
    signals: RefCell<FxHashMap<String, SignalValue>>,
    proxies: RefCell<FxHashMap<String, PropertyProxy>>,
}

impl ObjectWrapper {
    pub fn new(id: ObjectId, class: TypeId) -> Self {
        Self {
            id: Cell::new(Some(id)),
            class: Cell::new(class),
            state: RefCell::new(IndexMap::new()),
            signals: RefCell::new(FxHashMap::default()),
            proxies: RefCell::new(FxHashMap::default()),
        }
    }

    /// Host identity, `None` once released.
    pub fn id(&self) -> Option<ObjectId> {
        self.id.get()
    }

    pub fn is_released(&self) -> bool {
        self.id.get().is_none()
    }

    /// Effective type.
    pub fn class(&self) -> TypeId {
        self.class.get()
    }

    pub(crate) fn set_class(&self, class: TypeId) {
        self.class.set(class);
    }

    pub(crate) fn mark_released(&self) -> Option<ObjectId> {
        self.proxies.borrow_mut().clear();
        self.id.take()
    }

    // ========================================================================
    // Instance storage
    // ========================================================================

    pub fn stored(&self, name: &str) -> Option<Value> {
        self.state.borrow().get(name).cloned()
    }

    pub fn store(&self, name: &str, value: Value) {
        self.state.borrow_mut().insert(name.to_string(), value);
    }

    pub fn has_stored(&self, name: &str) -> bool {
        self.state.borrow().contains_key(name)
    }

    /// Names of stored attributes, in first-assignment order.
    pub fn stored_names(&self) -> Vec<String> {
        self.state.borrow().keys().cloned().collect()
    }

    // ========================================================================
    // Lazy per-instance members
    // ========================================================================

    /// Signal `name` of this object, created on first access.
    pub fn signal(&self, name: &str) -> SignalValue {
        self.signals
            .borrow_mut()
            .entry(name.to_string())
            .or_insert_with(|| SignalValue {
                owner: self.id.get(),
                name: name.to_string(),
            })
            .clone()
    }

    pub(crate) fn cached_proxy(&self, name: &str) -> Option<PropertyProxy> {
        self.proxies.borrow().get(name).cloned()
    }

    pub(crate) fn cache_proxy(&self, name: &str, proxy: PropertyProxy) {
        self.proxies.borrow_mut().insert(name.to_string(), proxy);
    }
}

impl std::fmt::Debug for ObjectWrapper {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ObjectWrapper")
            .field("id", &self.id.get())
            .field("class", &self.class.get())
            .finish()
    }
}
