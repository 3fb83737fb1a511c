//! Module-level globals
//!
//! Initialization binds global enums, value types and utility functions up
//! front. Object classes stay lazy: [`Runtime::global`] binds a class the
//! first time its name is looked up.

use std::rc::Rc;

use hostbind_sdk::VariantType;

use super::enums::{bind_enum, enum_values};
use super::method::{bind_method, MethodOwner};
use super::object_class::ROOT_CLASS;
use super::value_type::bind_value_types;
use crate::error::{BindError, BindResult};
use crate::runtime::{IntConstant, Member, Runtime, Value};

impl Runtime {
    /// Bind everything that is not bound lazily. Runs once.
    pub fn initialize(&mut self) -> BindResult<()> {
        if self.binding.initialized {
            return Ok(());
        }

        let enums = self.api().global_enums()?;
        for record in enums {
            let bound = bind_enum(self, None, &record);
            let id = match self.tolerate(|| record.name.clone(), bound)? {
                Some(id) => id,
                None => continue,
            };
            self.globals.insert(record.name.clone(), Value::Type(id));
            for member in enum_values(self, id) {
                self.globals.insert(member.name.clone(), Value::Enum(member));
            }
        }

        bind_value_types(self)?;
        for &ty in VariantType::all() {
            if matches!(ty, VariantType::Nil | VariantType::Object) {
                continue;
            }
            let id = self.value_type_id(ty);
            self.globals.insert(ty.name().to_string(), Value::Type(id));
        }

        let functions = self.api().utility_functions()?;
        for record in functions {
            let bound = bind_method(self, MethodOwner::Utility, &record);
            if let Some(bound) = self.tolerate(|| record.name.clone(), bound)? {
                self.globals
                    .insert(record.name.clone(), Value::Function(Rc::new(bound)));
            }
        }

        self.binding.initialized = true;
        log::info!("module initialized with {} globals", self.globals.len());
        Ok(())
    }

    pub fn is_initialized(&self) -> bool {
        self.binding.initialized
    }

    /// Look up a module global.
    ///
    /// Singletons resolve to the live instance, or `Nil` while the host has
    /// not created it; they are never cached. Object classes are bound on
    /// first lookup.
    pub fn global(&mut self, name: &str) -> BindResult<Value> {
        if self.api().index().singleton_type(name).is_some() {
            return match self.host().singleton(name) {
                Some(id) => Ok(Value::Object(self.wrap_object(id)?)),
                None => {
                    log::debug!("singleton '{}' is not active yet", name);
                    Ok(Value::Nil)
                }
            };
        }
        if let Some(value) = self.globals.get(name) {
            return Ok(value.clone());
        }
        if let Some(id) = self.scripts.exposed_class(name) {
            return Ok(Value::Type(id));
        }
        if name == ROOT_CLASS || self.api().index().has_class(name) {
            return match self.bind_class(name)? {
                Some(id) => Ok(Value::Type(id)),
                None => Err(BindError::BindingInProgress(name.to_string())),
            };
        }
        Err(BindError::attribute("module", name))
    }

    /// Every name [`global`](Self::global) can answer, sorted.
    pub fn global_names(&self) -> Vec<String> {
        let index = self.api().index();
        let mut names: Vec<String> = self
            .globals
            .keys()
            .cloned()
            .chain(index.class_names().map(str::to_string))
            .chain(index.singleton_names().map(str::to_string))
            .chain(self.scripts.exposed_names())
            .collect();
        names.push(ROOT_CLASS.to_string());
        names.sort();
        names.dedup();
        names
    }

    /// First bound integer constant with `value` whose name starts with
    /// `prefix` (`NOTIFICATION_`, ...).
    pub fn lookup_constant(&self, value: i64, prefix: &str) -> Option<IntConstant> {
        self.types().iter().find_map(|record| {
            record.members.values().find_map(|member| match member {
                Member::Constant(constant)
                    if constant.value == value && constant.name.starts_with(prefix) =>
                {
                    Some(constant.clone())
                }
                _ => None,
            })
        })
    }
}
