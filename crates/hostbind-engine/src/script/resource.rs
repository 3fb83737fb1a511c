//! Script resources
//!
//! A [`Script`] is the host-facing handle of one defining unit. It loads the
//! unit through a [`ScriptLoader`], tracks the instances and placeholders
//! created from it, and hot-reloads the class in place: the type keeps its
//! identity, so live instances pick up the new surface.

use std::rc::{Rc, Weak};

use hostbind_sdk::{ErrorCode, PropertyHint, PropertyInfo, PropertyUsage, VariantType};
use indexmap::IndexMap;

use super::association::set_script_class;
use super::class_info::{define_class, ClassInfo};
use super::decl::{ClassDecl, DefaultValue, MemberDecl};
use super::instance::ScriptInstance;
use super::placeholder::PlaceholderInstance;
use super::registration::register_extension_class;
use crate::error::{BindError, BindResult};
use crate::runtime::{Member, ObjectWrapper, Runtime, TypeId, Value};

/// Executes a defining unit and returns the class it exposes.
pub trait ScriptLoader {
    /// `Ok(None)` when the unit ran but exposes no class.
    fn load(&self, rt: &mut Runtime, path: &str, source: Option<&str>) -> BindResult<Option<ClassDecl>>;
}

impl<F> ScriptLoader for F
where
    F: Fn(&mut Runtime, &str, Option<&str>) -> BindResult<Option<ClassDecl>>,
{
    fn load(&self, rt: &mut Runtime, path: &str, source: Option<&str>) -> BindResult<Option<ClassDecl>> {
        self(rt, path, source)
    }
}

pub struct Script {
    path: String,
    source: Option<String>,
    source_changed: bool,
    valid: bool,
    class: Option<TypeId>,
    loader: Rc<dyn ScriptLoader>,
    instances: Vec<Weak<ObjectWrapper>>,
    placeholders: Vec<PlaceholderInstance>,
}

impl Script {
    pub fn new(path: impl Into<String>, loader: Rc<dyn ScriptLoader>) -> Self {
        Self {
            path: path.into(),
            source: None,
            source_changed: false,
            valid: false,
            class: None,
            loader,
            instances: Vec::new(),
            placeholders: Vec::new(),
        }
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn is_valid(&self) -> bool {
        self.valid
    }

    /// The class the last successful load produced.
    pub fn class(&self) -> Option<TypeId> {
        self.class
    }

    fn info<'a>(&self, rt: &'a Runtime) -> Option<&'a ClassInfo> {
        self.class.and_then(|ty| rt.scripts.class_info(ty))
    }

    fn require_class(&self) -> BindResult<TypeId> {
        self.class
            .filter(|_| self.valid)
            .ok_or_else(|| BindError::Script(format!("script '{}' is not loaded", self.path)))
    }

    // ========================================================================
    // Source and loading
    // ========================================================================

    pub fn has_source_code(&self) -> bool {
        self.source.is_some()
    }

    pub fn source_code(&self) -> &str {
        self.source.as_deref().unwrap_or_default()
    }

    pub fn set_source_code(&mut self, code: impl Into<String>) {
        let code = code.into();
        if self.source.as_deref() == Some(code.as_str()) {
            return;
        }
        self.source = Some(code);
        self.source_changed = true;
        self.valid = true;
    }

    /// Load the unit the first time.
    pub fn load(&mut self, rt: &mut Runtime) -> ErrorCode {
        self.reload(rt, false)
    }

    /// Re-execute the defining unit and move every live instance to the
    /// class it produces.
    ///
    /// Failures are reported and mark the script invalid; they never
    /// propagate out of the reload.
    pub fn reload(&mut self, rt: &mut Runtime, keep_state: bool) -> ErrorCode {
        self.valid = false;
        self.source_changed = true;
        if self.path.is_empty() {
            return ErrorCode::Failed;
        }
        log::info!("reloading '{}' (keep_state: {})", self.path, keep_state);

        // The type is reused, so nothing the old class published may remain.
        if let Some(old) = self.class {
            rt.types.strip(old);
        }

        let loaded = self
            .loader
            .load(rt, &self.path, self.source.as_deref())
            .and_then(|decl| {
                decl.ok_or_else(|| {
                    BindError::Script(format!("'{}' does not expose a class", self.path))
                })
            })
            .and_then(|decl| define_class(rt, decl));
        let class = match loaded {
            Ok(class) => class,
            Err(err) => {
                let message = format!("failed to load '{}': {}", self.path, err);
                log::error!("{}", message);
                rt.host().print_error(&message);
                return ErrorCode::Failed;
            }
        };

        self.class = Some(class);
        self.valid = true;

        let extension = self.info(rt).map_or(false, |info| info.extension);
        if extension {
            if let Err(err) = register_extension_class(rt, class) {
                log::error!("failed to register '{}': {}", self.path, err);
                rt.host().print_error(&err.to_string());
                self.valid = false;
                return ErrorCode::Failed;
            }
        }

        self.instances.retain(|weak| weak.strong_count() > 0);
        for obj in self.instances.iter().filter_map(Weak::upgrade) {
            if obj.is_released() {
                continue;
            }
            if let Err(err) = set_script_class(rt, &obj, class) {
                log::warn!("could not re-associate {:?}: {}", obj.id(), err);
            }
        }

        self.update_exports(rt);
        ErrorCode::Ok
    }

    // ========================================================================
    // Class surface
    // ========================================================================

    pub fn can_instantiate(&self, rt: &Runtime) -> bool {
        if !self.valid {
            return false;
        }
        let abstract_class = self.info(rt).map_or(true, |info| info.is_abstract);
        if abstract_class {
            return false;
        }
        !rt.config().editor_hint || self.is_tool(rt)
    }

    pub fn is_tool(&self, rt: &Runtime) -> bool {
        self.info(rt).map_or(false, ClassInfo::is_tool)
    }

    /// Global name, empty when the class is not exposed.
    pub fn global_name(&self, rt: &Runtime) -> String {
        self.info(rt)
            .and_then(ClassInfo::global_name)
            .unwrap_or_default()
    }

    pub fn icon_path(&self, rt: &Runtime) -> String {
        self.info(rt)
            .and_then(|info| info.decl.expose.icon.clone())
            .unwrap_or_default()
    }

    /// Host class instances are built on.
    pub fn instance_base_type(&self, rt: &Runtime) -> String {
        self.info(rt)
            .map(|info| info.native_base.clone())
            .unwrap_or_default()
    }

    pub fn has_method(&self, rt: &Runtime, name: &str) -> bool {
        self.info(rt)
            .map_or(false, |info| info.decl.methods().any(|m| m.name == name))
    }

    pub fn has_script_signal(&self, rt: &Runtime, name: &str) -> bool {
        self.info(rt).map_or(false, |info| info.has_signal(name))
    }

    /// Category entry, then properties with their group and subgroup
    /// entries in declaration order.
    pub fn script_property_list(&self, rt: &Runtime) -> Vec<PropertyInfo> {
        let Some(info) = self.info(rt) else {
            return Vec::new();
        };
        let category = self
            .path
            .rsplit('/')
            .next()
            .unwrap_or(self.path.as_str())
            .to_string();
        let mut list = vec![PropertyInfo::new(VariantType::Nil, category)
            .with_hint(PropertyHint::None, self.path.clone())
            .with_usage(PropertyUsage::CATEGORY)];

        let members = &rt.types().get(info.ty).members;
        for member in &info.decl.members {
            match member {
                MemberDecl::Property(property) => {
                    if let Some(Member::Property(descriptor)) = members.get(&property.name) {
                        list.push(descriptor.info.clone());
                    }
                }
                MemberDecl::Group { name, prefix } => list.push(
                    PropertyInfo::new(VariantType::Nil, name.clone())
                        .with_hint(PropertyHint::None, prefix.clone())
                        .with_usage(PropertyUsage::GROUP),
                ),
                MemberDecl::Subgroup { name, prefix } => list.push(
                    PropertyInfo::new(VariantType::Nil, name.clone())
                        .with_hint(PropertyHint::None, prefix.clone())
                        .with_usage(PropertyUsage::SUBGROUP),
                ),
                _ => {}
            }
        }
        list
    }

    pub fn has_property_default_value(&self, rt: &Runtime, name: &str) -> bool {
        self.info(rt)
            .and_then(|info| info.property(name))
            .map_or(false, |property| property.default.is_declared())
    }

    /// Declared default of `name`, the zero value of its type when none is
    /// declared, `Nil` for unknown names.
    pub fn property_default_value(&self, rt: &mut Runtime, name: &str) -> BindResult<Value> {
        let Some(ty) = self.class else {
            return Ok(Value::Nil);
        };
        let descriptor = rt
            .types()
            .get(ty)
            .members
            .get(name)
            .and_then(|member| member.as_property().cloned());
        let Some(descriptor) = descriptor else {
            return Ok(Value::Nil);
        };
        let default = self
            .info(rt)
            .and_then(|info| info.property(name))
            .map(|property| property.default.clone())
            .unwrap_or_default();
        match default {
            DefaultValue::Value(value) => Ok(value.detached()),
            DefaultValue::Factory(factory) => factory(rt),
            DefaultValue::None => rt.zero_value(&descriptor.type_info),
        }
    }

    fn default_values(&self, rt: &mut Runtime) -> IndexMap<String, Value> {
        let names: Vec<String> = self
            .info(rt)
            .map(|info| info.decl.properties().map(|p| p.name.clone()).collect())
            .unwrap_or_default();
        let mut defaults = IndexMap::new();
        for name in names {
            match self.property_default_value(rt, &name) {
                Ok(value) => {
                    defaults.insert(name, value);
                }
                Err(err) => log::warn!("no default for '{}': {}", name, err),
            }
        }
        defaults
    }

    // ========================================================================
    // Instances
    // ========================================================================

    /// Attach the script's class to `obj` and hand out its instance.
    pub fn instance_create(&mut self, rt: &mut Runtime, obj: &Rc<ObjectWrapper>) -> BindResult<ScriptInstance> {
        let class = self.require_class()?;
        set_script_class(rt, obj, class)?;
        self.instances.retain(|weak| weak.strong_count() > 0);
        if !self.instances.iter().any(|weak| weak.ptr_eq(&Rc::downgrade(obj))) {
            self.instances.push(Rc::downgrade(obj));
        }
        Ok(ScriptInstance::new(obj, class))
    }

    /// Create the placeholder for `obj`, or refresh the one it already has.
    pub fn placeholder_instance_create(&mut self, rt: &mut Runtime, obj: &Rc<ObjectWrapper>) -> &mut PlaceholderInstance {
        let properties = self.script_property_list(rt);
        let defaults = self.default_values(rt);
        let index = match self.placeholders.iter().position(|p| p.is_owned_by(obj)) {
            Some(index) => index,
            None => {
                self.placeholders.push(PlaceholderInstance::new(obj));
                self.placeholders.len() - 1
            }
        };
        let placeholder = &mut self.placeholders[index];
        placeholder.update(rt, &properties, defaults);
        placeholder
    }

    pub fn placeholder(&self, obj: &Rc<ObjectWrapper>) -> Option<&PlaceholderInstance> {
        self.placeholders.iter().find(|p| p.is_owned_by(obj))
    }

    pub fn placeholder_mut(&mut self, obj: &Rc<ObjectWrapper>) -> Option<&mut PlaceholderInstance> {
        self.placeholders.iter_mut().find(|p| p.is_owned_by(obj))
    }

    /// Forget the placeholder of `obj` once the host erases it.
    pub fn placeholder_erased(&mut self, obj: &Rc<ObjectWrapper>) -> bool {
        let before = self.placeholders.len();
        self.placeholders.retain(|p| !p.is_owned_by(obj));
        self.placeholders.len() != before
    }

    pub fn placeholder_count(&self) -> usize {
        self.placeholders.len()
    }

    /// Refresh placeholders after the source changed.
    pub fn update_exports(&mut self, rt: &mut Runtime) {
        if !self.source_changed {
            return;
        }
        self.source_changed = false;
        self.placeholders.retain(PlaceholderInstance::is_live);
        if self.class.is_none() {
            return;
        }
        let properties = self.script_property_list(rt);
        let defaults = self.default_values(rt);
        for placeholder in &mut self.placeholders {
            placeholder.update(rt, &properties, defaults.clone());
        }
    }

    /// Number of instances whose owner is still live.
    pub fn live_instances(&self) -> usize {
        self.instances
            .iter()
            .filter_map(Weak::upgrade)
            .filter(|obj| !obj.is_released())
            .count()
    }
}
