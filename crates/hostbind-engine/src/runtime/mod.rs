//! Embedded-language object model
//!
//! [`Runtime`] owns everything the binders build: the type registry, the
//! globals table, the wrapper map for live host objects, and the script
//! registry. It is single-threaded (`Rc`/`RefCell` throughout) and driven
//! from one call path.
//!
//! The language-level protocol (attribute access, calls, operators,
//! indexing) lives in `protocol.rs`; conversions across the boundary in
//! `convert.rs`.

mod binding;
mod convert;
mod object;
mod protocol;
mod registry;
mod value;

use std::rc::{Rc, Weak};
use std::sync::Arc;

use hostbind_sdk::{HostInterface, ObjectId, VariantType};
use indexmap::IndexMap;
use rustc_hash::{FxHashMap, FxHashSet};

pub use binding::{MethodBinding, Receiver, Resolved};
pub use object::{ObjectRef, ObjectWrapper};
pub use registry::{Member, TypeId, TypeKind, TypeRecord, TypeRegistry, TypeTraits};
pub use value::{BuiltinValue, EnumMember, IntConstant, PropertyProxy, SignalValue, Value};

use crate::bind::RESERVED_WORDS;
use crate::config::{BindingConfig, FailurePolicy};
use crate::error::{BindError, BindResult};
use crate::idl::IdlDocument;
use crate::script::ScriptRegistry;
use crate::types::{TypeInfo, TypeResolver};

/// A member a best-effort bind skipped.
#[derive(Debug, Clone, PartialEq)]
pub struct BindDiagnostic {
    /// Where the failure happened (`Node.get_name`, ...)
    pub context: String,
    pub message: String,
}

/// Bookkeeping of the binders.
#[derive(Default)]
pub(crate) struct BindState {
    /// Classes currently being bound, for cycle detection
    pub in_progress: FxHashSet<String>,
    /// Fully bound object classes
    pub classes: FxHashMap<String, TypeId>,
    /// Bound enums by qualified name
    pub enums: FxHashMap<String, TypeId>,
    /// Typed array types by canonical element
    pub typed_arrays: FxHashMap<String, TypeId>,
    pub initialized: bool,
}

/// The embedded-language side of the binding.
pub struct Runtime {
    host: Rc<dyn HostInterface>,
    config: BindingConfig,
    resolver: TypeResolver,
    pub(crate) types: TypeRegistry,
    pub(crate) globals: IndexMap<String, Value>,
    pub(crate) binding: BindState,
    pub(crate) scripts: ScriptRegistry,
    objects: FxHashMap<ObjectId, Weak<ObjectWrapper>>,
    value_types: FxHashMap<VariantType, TypeId>,
    nil_type: TypeId,
    dynamic_type: TypeId,
    reserved_words: FxHashSet<String>,
    diagnostics: Vec<BindDiagnostic>,
    active_policy: Option<FailurePolicy>,
}

impl Runtime {
    /// Create a runtime over `api`. Value-type records exist right away;
    /// their surfaces are filled in by [`initialize`](Self::initialize).
    pub fn new(host: Rc<dyn HostInterface>, api: Arc<IdlDocument>, config: BindingConfig) -> Self {
        let mut types = TypeRegistry::new();
        let nil_type = types.create("Nil", TypeKind::Nil, vec![]);
        let dynamic_type = types.create("Variant", TypeKind::Dynamic, vec![]);
        let mut value_types = FxHashMap::default();
        for &ty in VariantType::all() {
            if matches!(ty, VariantType::Nil | VariantType::Object) {
                continue;
            }
            value_types.insert(ty, types.create(ty.name(), TypeKind::Value(ty), vec![]));
        }

        let reserved_words = RESERVED_WORDS
            .iter()
            .map(|word| word.to_string())
            .chain(config.extra_reserved_words.iter().cloned())
            .collect();

        Self {
            host,
            config,
            resolver: TypeResolver::new(api),
            types,
            globals: IndexMap::new(),
            binding: BindState::default(),
            scripts: ScriptRegistry::default(),
            objects: FxHashMap::default(),
            value_types,
            nil_type,
            dynamic_type,
            reserved_words,
            diagnostics: Vec::new(),
            active_policy: None,
        }
    }

    /// Create a runtime over the process-wide cached IDL document.
    pub fn from_cached_api(host: Rc<dyn HostInterface>, config: BindingConfig) -> BindResult<Self> {
        let api = crate::idl::current_api().ok_or_else(|| {
            BindError::Config("no IDL document has been loaded".to_string())
        })?;
        Ok(Self::new(host, api, config))
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    pub fn host(&self) -> &Rc<dyn HostInterface> {
        &self.host
    }

    pub fn config(&self) -> &BindingConfig {
        &self.config
    }

    pub fn api(&self) -> &Arc<IdlDocument> {
        self.resolver.api()
    }

    pub fn resolver(&self) -> &TypeResolver {
        &self.resolver
    }

    pub fn types(&self) -> &TypeRegistry {
        &self.types
    }

    /// User classes, bridges and registrations.
    pub fn scripts(&self) -> &ScriptRegistry {
        &self.scripts
    }

    /// Members skipped by best-effort binds so far.
    pub fn diagnostics(&self) -> &[BindDiagnostic] {
        &self.diagnostics
    }

    pub fn nil_type(&self) -> TypeId {
        self.nil_type
    }

    pub fn dynamic_type(&self) -> TypeId {
        self.dynamic_type
    }

    /// Record of a host value type. `Nil` and `Object` map to the nil and
    /// dynamic types.
    pub fn value_type_id(&self, ty: VariantType) -> TypeId {
        match ty {
            VariantType::Nil => self.nil_type,
            other => self
                .value_types
                .get(&other)
                .copied()
                .unwrap_or(self.dynamic_type),
        }
    }

    pub fn is_reserved_word(&self, word: &str) -> bool {
        self.reserved_words.contains(word)
    }

    // ========================================================================
    // Failure policy
    // ========================================================================

    /// Policy in effect for the current bind.
    pub fn policy(&self) -> FailurePolicy {
        self.active_policy.unwrap_or(self.config.failure_policy)
    }

    pub(crate) fn swap_policy(&mut self, policy: Option<FailurePolicy>) -> Option<FailurePolicy> {
        std::mem::replace(&mut self.active_policy, policy)
    }

    /// Apply the failure policy to one member's outcome. Skipped members
    /// yield `Ok(None)` and a diagnostic.
    pub(crate) fn tolerate<T>(
        &mut self,
        context: impl FnOnce() -> String,
        result: BindResult<T>,
    ) -> BindResult<Option<T>> {
        match result {
            Ok(value) => Ok(Some(value)),
            Err(err) if err.is_member_failure() && self.policy() == FailurePolicy::BestEffort => {
                let context = context();
                log::warn!("skipping {}: {}", context, err);
                self.diagnostics.push(BindDiagnostic {
                    context,
                    message: err.to_string(),
                });
                Ok(None)
            }
            Err(err) => Err(err),
        }
    }

    pub(crate) fn report(&mut self, context: String, message: String) {
        log::warn!("{}: {}", context, message);
        self.diagnostics.push(BindDiagnostic { context, message });
    }

    // ========================================================================
    // Types
    // ========================================================================

    /// The type of a value.
    pub fn type_of(&self, value: &Value) -> TypeId {
        match value {
            Value::Nil => self.nil_type,
            Value::Bool(_) => self.value_type_id(VariantType::Bool),
            Value::Int(_) | Value::Constant(_) => self.value_type_id(VariantType::Int),
            Value::Float(_) => self.value_type_id(VariantType::Float),
            Value::Str(_) => self.value_type_id(VariantType::String),
            Value::Builtin(builtin) => builtin.ty,
            Value::Proxy(proxy) => proxy.value.ty,
            Value::Object(obj) => obj.class(),
            Value::Type(_) => self.dynamic_type,
            Value::Enum(member) => member.enum_type,
            Value::List(_) => self.value_type_id(VariantType::Array),
            Value::Signal(_) => self.value_type_id(VariantType::Signal),
            Value::Callable(_) | Value::Function(_) => self.value_type_id(VariantType::Callable),
        }
    }

    /// Type name as shown in error messages.
    pub fn type_name(&self, value: &Value) -> String {
        match value {
            Value::Nil => "null".to_string(),
            Value::Str(_) => "str".to_string(),
            Value::List(_) => "list".to_string(),
            Value::Type(_) => "type".to_string(),
            other => self.types.name(self.type_of(other)).to_string(),
        }
    }

    /// Resolve a type annotation. Accepts the language's own spellings
    /// besides IDL type-strings.
    pub fn resolve_annotation(&self, text: &str) -> BindResult<TypeInfo> {
        let text = match text.trim() {
            "str" => "String",
            "list" => "Array",
            "dict" => "Dictionary",
            "None" => "void",
            "object" => "Object",
            other => other,
        };
        self.resolver.resolve(text)
    }

    /// The `Array` subtype for `element`, created on first use.
    pub fn typed_array_type(&mut self, element: &TypeInfo) -> TypeId {
        let key = element.canonical();
        if let Some(&id) = self.binding.typed_arrays.get(&key) {
            return id;
        }
        let array = self.value_type_id(VariantType::Array);
        let id = self.types.create(
            &format!("Array[{}]", key),
            TypeKind::TypedArray(element.clone()),
            vec![array],
        );
        self.binding.typed_arrays.insert(key, id);
        id
    }

    /// The runtime type for a resolved type, binding object classes on
    /// demand.
    pub fn type_for(&mut self, info: &TypeInfo) -> BindResult<TypeId> {
        Ok(match info {
            TypeInfo::Void => self.nil_type,
            TypeInfo::Dynamic | TypeInfo::Union(_) => self.dynamic_type,
            TypeInfo::Builtin(ty) => self.value_type_id(*ty),
            TypeInfo::Pointer(_) => self.value_type_id(VariantType::Int),
            TypeInfo::Array(None) => self.value_type_id(VariantType::Array),
            TypeInfo::Array(Some(element)) => self.typed_array_type(element),
            TypeInfo::Enum(name) | TypeInfo::Bitfield(name) => self
                .binding
                .enums
                .get(name)
                .copied()
                .ok_or_else(|| BindError::UnknownType(info.canonical()))?,
            TypeInfo::Object(name) => match self.scripts.class_by_name(name) {
                Some(id) => id,
                None => self
                    .bind_class(name)?
                    .ok_or_else(|| BindError::BindingInProgress(name.clone()))?,
            },
            TypeInfo::Script { user_type, .. } => self
                .scripts
                .class_by_name(user_type)
                .ok_or_else(|| BindError::UnknownType(user_type.clone()))?,
        })
    }

    // ========================================================================
    // Objects
    // ========================================================================

    /// Host identity of a live wrapper.
    pub fn live_id(&self, obj: &ObjectWrapper) -> BindResult<ObjectId> {
        obj.id()
            .ok_or_else(|| BindError::ObjectReleased(self.types.name(obj.class()).to_string()))
    }

    /// Construct a host object of type `ty` and its wrapper in one step.
    pub fn instantiate(&mut self, ty: TypeId) -> BindResult<ObjectRef> {
        let record = self.types.get(ty);
        let name = record.name.clone();
        let kind = record.kind.clone();
        match kind {
            TypeKind::Object | TypeKind::UserClass { extension: true, .. } => {
                let id = self.host.construct_object(&name)?;
                Ok(self.adopt(id, ty))
            }
            TypeKind::UserClass { .. } => {
                if self.scripts.class_info(ty).map_or(false, |info| info.is_abstract) {
                    return Err(BindError::Type(format!(
                        "cannot instantiate abstract class '{}'",
                        name
                    )));
                }
                let native = self
                    .types
                    .native_base(ty)
                    .ok_or_else(|| BindError::ScriptClass(format!("'{}' has no native base", name)))?;
                let native_name = self.types.name(native).to_string();
                let id = self.host.construct_object(&native_name)?;
                let obj = self.adopt(id, native);
                if let Err(err) = crate::script::set_script_class(self, &obj, ty) {
                    self.release(&obj)?;
                    return Err(err);
                }
                Ok(obj)
            }
            _ => Err(BindError::Type(format!("'{}' is not an object class", name))),
        }
    }

    fn adopt(&mut self, id: ObjectId, ty: TypeId) -> ObjectRef {
        let obj = Rc::new(ObjectWrapper::new(id, ty));
        // wrappers dropped without a release leave dead entries behind
        self.objects.retain(|_, weak| weak.strong_count() > 0);
        self.objects.insert(id, Rc::downgrade(&obj));
        log::debug!("wrapped {} as '{}'", id, self.types.name(ty));
        obj
    }

    /// Destroy the host object. The wrapper stays usable for introspection.
    pub fn release(&mut self, obj: &ObjectWrapper) -> BindResult<()> {
        let id = obj
            .mark_released()
            .ok_or_else(|| BindError::ObjectReleased(self.types.name(obj.class()).to_string()))?;
        self.objects.remove(&id);
        self.scripts.forget_instance(id);
        self.host.destroy_object(id)?;
        Ok(())
    }

    /// The wrapper of a host object, created on first sight. The same
    /// identity always yields the same wrapper while it is alive.
    pub fn wrap_object(&mut self, id: ObjectId) -> BindResult<ObjectRef> {
        if let Some(obj) = self.objects.get(&id).and_then(Weak::upgrade) {
            if !obj.is_released() {
                return Ok(obj);
            }
        }
        let class = self
            .host
            .object_class(id)
            .ok_or(hostbind_sdk::HostError::InvalidObject(id))?;
        let native = match self.scripts.class_by_name(&class) {
            Some(ty) => ty,
            None => self
                .bind_class(&class)?
                .ok_or_else(|| BindError::BindingInProgress(class.clone()))?,
        };
        let obj = self.adopt(id, native);
        if let Some(user) = self.scripts.instance_class(id) {
            crate::script::set_script_class(self, &obj, user)?;
        }
        Ok(obj)
    }

    /// Entries in the wrapper map, dead or alive.
    pub fn wrapper_count(&self) -> usize {
        self.objects.len()
    }

    /// Number of wrappers whose host object is still live.
    pub fn live_object_count(&self) -> usize {
        self.objects
            .values()
            .filter(|weak| weak.upgrade().map_or(false, |obj| !obj.is_released()))
            .count()
    }
}
