//! Method binding
//!
//! A [`BoundMethod`] pairs a declared signature with a native call. The
//! native handle is chosen by owner kind: the free-function table for
//! utilities, the value-type method table, or the object method table. A
//! record without a call key still binds; the result fails when invoked.

use std::fmt;
use std::rc::Rc;

use hostbind_sdk::{
    BuiltinMethodFn, ClassMethodInfo, MethodBindFn, MethodFlags, UtilityFn, Variant, VariantType,
};

use super::argument::{safe_argument_name, ArgumentDescriptor, MethodSignature};
use super::coerce::accepts;
use super::literal::evaluate_literal;
use crate::error::{BindError, BindResult};
use crate::idl::MethodRecord;
use crate::runtime::{Runtime, Value};
use crate::types::TypeInfo;

/// Native side of a bound method: runtime, signature, receiver, checked
/// arguments.
pub type NativeCall =
    Rc<dyn Fn(&mut Runtime, &MethodSignature, Option<&Value>, Vec<Value>) -> BindResult<Value>>;

/// Where a method comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MethodOwner {
    Utility,
    ValueType(VariantType),
    ObjectClass(String),
    UserClass(String),
}

impl MethodOwner {
    fn prefix(&self) -> Option<&str> {
        match self {
            MethodOwner::Utility => None,
            MethodOwner::ValueType(ty) => Some(ty.name()),
            MethodOwner::ObjectClass(class) | MethodOwner::UserClass(class) => Some(class),
        }
    }
}

/// A callable member with its declared signature.
pub struct BoundMethod {
    name: String,
    owner: MethodOwner,
    signature: MethodSignature,
    doc: Option<String>,
    hash: Option<u64>,
    call: Option<NativeCall>,
    failure_wraps: bool,
}

impl BoundMethod {
    pub fn new(
        name: impl Into<String>,
        owner: MethodOwner,
        signature: MethodSignature,
        call: Option<NativeCall>,
    ) -> Self {
        Self {
            name: name.into(),
            owner,
            signature,
            doc: None,
            hash: None,
            call,
            failure_wraps: false,
        }
    }

    pub fn with_doc(mut self, doc: Option<String>) -> Self {
        self.doc = doc;
        self
    }

    pub fn with_hash(mut self, hash: Option<u64>) -> Self {
        self.hash = hash;
        self
    }

    /// Convert errors into the host failure value at virtual-call
    /// boundaries.
    pub fn with_failure_wrap(mut self, wraps: bool) -> Self {
        self.failure_wraps = wraps;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn owner(&self) -> &MethodOwner {
        &self.owner
    }

    pub fn signature(&self) -> &MethodSignature {
        &self.signature
    }

    pub fn doc(&self) -> Option<&str> {
        self.doc.as_deref()
    }

    pub fn hash(&self) -> Option<u64> {
        self.hash
    }

    pub fn is_static(&self) -> bool {
        self.signature.is_static()
    }

    /// True when there is nothing to call.
    pub fn is_stub(&self) -> bool {
        self.call.is_none()
    }

    pub fn wraps_failures(&self) -> bool {
        self.failure_wraps
    }

    /// `Owner.name`, or `name` for free functions.
    pub fn qualified_name(&self) -> String {
        match self.owner.prefix() {
            Some(prefix) => format!("{}.{}", prefix, self.name),
            None => self.name.clone(),
        }
    }

    /// Call with a receiver (`None` for static methods and functions).
    pub fn invoke(&self, rt: &mut Runtime, receiver: Option<&Value>, args: Vec<Value>) -> BindResult<Value> {
        let call = self
            .call
            .as_ref()
            .ok_or_else(|| BindError::NotImplemented(self.qualified_name()))?;
        let args = self.prepare_arguments(rt, args)?;
        call(rt, &self.signature, receiver, args)
    }

    /// Check arity, fill defaults and check every argument's type.
    pub fn prepare_arguments(&self, rt: &Runtime, args: Vec<Value>) -> BindResult<Vec<Value>> {
        let sig = &self.signature;
        let declared = sig.arguments.len();
        if args.len() < sig.required() || (!sig.vararg && args.len() > declared) {
            let expected = if sig.vararg {
                format!("at least {}", sig.required())
            } else if sig.required() == declared {
                declared.to_string()
            } else {
                format!("{} to {}", sig.required(), declared)
            };
            return Err(BindError::argument(
                self.qualified_name(),
                format!("takes {} arguments ({} given)", expected, args.len()),
            ));
        }

        let mut given = args.into_iter();
        let mut prepared = Vec::with_capacity(declared);
        for arg in &sig.arguments {
            let value = match given.next() {
                Some(value) => value,
                None => arg.default.as_ref().map(Value::detached).ok_or_else(|| {
                    BindError::argument(
                        self.qualified_name(),
                        format!("missing argument '{}'", arg.name),
                    )
                })?,
            };
            if !accepts(rt, &arg.declared, &value).is_accepted() {
                return Err(BindError::argument(
                    self.qualified_name(),
                    format!(
                        "argument '{}' expects {}, got {}",
                        arg.name,
                        arg.declared,
                        rt.type_name(&value)
                    ),
                ));
            }
            prepared.push(value);
        }
        prepared.extend(given);
        Ok(prepared)
    }

    /// Descriptor for the host class database.
    pub fn method_info(&self, rt: &Runtime) -> BindResult<ClassMethodInfo> {
        self.signature.method_info(rt, &self.name)
    }
}

impl fmt::Debug for BoundMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BoundMethod")
            .field("name", &self.qualified_name())
            .field("shape", &self.signature.shape())
            .field("stub", &self.is_stub())
            .finish()
    }
}

// ============================================================================
// Binding from IDL records
// ============================================================================

/// Declared signature of an IDL method record.
pub fn build_signature(rt: &mut Runtime, record: &MethodRecord) -> BindResult<MethodSignature> {
    let mut arguments = Vec::with_capacity(record.arguments.len());
    for arg in &record.arguments {
        let declared = rt.resolver().resolve(&arg.ty)?;
        let name = safe_argument_name(&arg.name, |word| rt.is_reserved_word(word));
        let mut descriptor = ArgumentDescriptor::new(name, declared);
        if let Some(text) = &arg.default_value {
            let value = evaluate_literal(rt, text, &descriptor.declared)?;
            descriptor = descriptor.with_default(value);
        }
        arguments.push(descriptor);
    }
    let return_type = rt.resolver().resolve(record.return_type_string())?;

    let mut flags = MethodFlags::NORMAL;
    if record.is_const {
        flags |= MethodFlags::CONST;
    }
    if record.is_static {
        flags |= MethodFlags::STATIC;
    }
    if record.is_vararg {
        flags |= MethodFlags::VARARG;
    }
    if record.is_virtual {
        flags |= MethodFlags::VIRTUAL;
    }
    Ok(MethodSignature::new(arguments, return_type).with_flags(flags))
}

/// Bind an IDL method record owned by `owner`.
pub fn bind_method(rt: &mut Runtime, owner: MethodOwner, record: &MethodRecord) -> BindResult<BoundMethod> {
    let signature = build_signature(rt, record)?;
    let missing = |kind: &'static str| BindError::MissingNativeHandle {
        kind,
        name: match owner.prefix() {
            Some(prefix) => format!("{}.{}", prefix, record.name),
            None => record.name.clone(),
        },
    };

    let call = match record.hash {
        None => {
            log::debug!("'{}' has no call key; binding a stub", record.name);
            None
        }
        Some(hash) => Some(match &owner {
            MethodOwner::Utility => {
                let handle = rt
                    .host()
                    .utility_function(&record.name, hash)
                    .ok_or_else(|| missing("utility function"))?;
                utility_call(handle)
            }
            MethodOwner::ValueType(ty) => {
                let handle = rt
                    .host()
                    .builtin_method(*ty, &record.name, hash)
                    .ok_or_else(|| missing("value-type method"))?;
                builtin_call(*ty, handle)
            }
            MethodOwner::ObjectClass(class) => {
                let handle = rt
                    .host()
                    .method_bind(class, &record.name, hash)
                    .ok_or_else(|| missing("method"))?;
                object_call(handle)
            }
            MethodOwner::UserClass(class) => {
                return Err(BindError::Type(format!(
                    "user class '{}' has no IDL methods",
                    class
                )))
            }
        }),
    };

    Ok(BoundMethod::new(record.name.clone(), owner, signature, call)
        .with_doc(record.description.clone())
        .with_hash(record.hash))
}

fn convert_arguments(rt: &Runtime, sig: &MethodSignature, args: &[Value]) -> BindResult<Vec<Variant>> {
    args.iter()
        .enumerate()
        .map(|(i, value)| match sig.arguments.get(i) {
            Some(arg) => rt.to_variant_as(value, &arg.declared),
            None => rt.to_variant(value),
        })
        .collect()
}

fn utility_call(handle: UtilityFn) -> NativeCall {
    Rc::new(
        move |rt: &mut Runtime, sig: &MethodSignature, _receiver: Option<&Value>, args: Vec<Value>| {
            let variants = convert_arguments(rt, sig, &args)?;
            let result = handle(&variants)?;
            rt.from_variant(result, Some(&sig.return_type))
        },
    )
}

fn builtin_call(ty: VariantType, handle: BuiltinMethodFn) -> NativeCall {
    Rc::new(
        move |rt: &mut Runtime, sig: &MethodSignature, receiver: Option<&Value>, args: Vec<Value>| {
            let variants = convert_arguments(rt, sig, &args)?;
            let result = if sig.is_static() {
                handle(None, &variants)?
            } else {
                let receiver = receiver.ok_or_else(|| {
                    BindError::Type(format!("{} method called without a receiver", ty))
                })?;
                match receiver.builtin() {
                    Some(builtin) => {
                        let mut payload = builtin.data.borrow_mut();
                        handle(Some(&mut *payload), &variants)?
                    }
                    None => {
                        let mut temp = rt.to_variant_as(receiver, &TypeInfo::Builtin(ty))?;
                        handle(Some(&mut temp), &variants)?
                    }
                }
            };
            rt.from_variant(result, Some(&sig.return_type))
        },
    )
}

fn object_call(handle: MethodBindFn) -> NativeCall {
    Rc::new(
        move |rt: &mut Runtime, sig: &MethodSignature, receiver: Option<&Value>, args: Vec<Value>| {
            let variants = convert_arguments(rt, sig, &args)?;
            let id = if sig.is_static() {
                None
            } else {
                let obj = receiver.and_then(Value::as_object).ok_or_else(|| {
                    BindError::Type("object method called without an object receiver".to_string())
                })?;
                Some(rt.live_id(obj)?)
            };
            let result = handle(id, &variants)?;
            rt.from_variant(result, Some(&sig.return_type))
        },
    )
}
