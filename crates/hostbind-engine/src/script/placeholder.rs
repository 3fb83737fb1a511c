//! Placeholder instances
//!
//! Stand-ins used where user code must not run (an editor without tool
//! scripts). A placeholder only mirrors the script's property list and
//! defaults, and is refreshed whenever the script's shape changes.

use std::rc::{Rc, Weak};

use hostbind_sdk::{PropertyInfo, PropertyUsage};
use indexmap::IndexMap;

use crate::runtime::{ObjectWrapper, Runtime, Value};

pub struct PlaceholderInstance {
    owner: Weak<ObjectWrapper>,
    properties: Vec<PropertyInfo>,
    defaults: IndexMap<String, Value>,
    values: IndexMap<String, Value>,
}

impl PlaceholderInstance {
    pub fn new(owner: &Rc<ObjectWrapper>) -> Self {
        Self {
            owner: Rc::downgrade(owner),
            properties: Vec::new(),
            defaults: IndexMap::new(),
            values: IndexMap::new(),
        }
    }

    pub fn is_live(&self) -> bool {
        self.owner.upgrade().map_or(false, |obj| !obj.is_released())
    }

    pub fn is_owned_by(&self, obj: &Rc<ObjectWrapper>) -> bool {
        std::ptr::eq(self.owner.as_ptr(), Rc::as_ptr(obj))
    }

    pub fn properties(&self) -> &[PropertyInfo] {
        &self.properties
    }

    pub fn property(&self, name: &str) -> Option<&PropertyInfo> {
        self.properties.iter().find(|p| p.name == name)
    }

    pub fn default_value(&self, name: &str) -> Option<&Value> {
        self.defaults.get(name)
    }

    /// Value set on the placeholder, or the script default.
    pub fn get(&self, name: &str) -> Option<Value> {
        self.values
            .get(name)
            .or_else(|| self.defaults.get(name))
            .cloned()
    }

    /// Remember a value for a known property. `false` for unknown names.
    pub fn set(&mut self, name: &str, value: Value) -> bool {
        if self.property(name).is_none() {
            return false;
        }
        self.values.insert(name.to_string(), value);
        true
    }

    /// Replace the shape with the script's current property list.
    ///
    /// Properties the owning object has but the script no longer declares
    /// are kept with usage `NONE`: hidden and not saved, but their values
    /// come back if the script declares them again.
    pub fn update(&mut self, rt: &Runtime, script_properties: &[PropertyInfo], defaults: IndexMap<String, Value>) {
        let mut properties = Vec::new();
        if let Some(id) = self.owner.upgrade().and_then(|obj| obj.id()) {
            properties.extend(
                rt.host()
                    .object_property_list(id)
                    .into_iter()
                    .filter(|p| !p.name.is_empty())
                    .filter(|p| !script_properties.iter().any(|s| s.name == p.name))
                    .map(|p| p.with_usage(PropertyUsage::NONE)),
            );
        }
        properties.extend(script_properties.iter().cloned());
        log::debug!("placeholder updated with {} properties", properties.len());
        self.properties = properties;
        self.defaults = defaults;
    }
}
