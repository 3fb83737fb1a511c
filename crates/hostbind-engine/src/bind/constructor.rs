//! Value-type construction

use hostbind_sdk::{ConstructorFn, VariantType};

use super::argument::{safe_argument_name, ArgumentDescriptor, MethodSignature};
use super::coerce::accepts;
use crate::error::{BindError, BindResult};
use crate::idl::ConstructorRecord;
use crate::runtime::{BuiltinValue, Runtime, TypeId, Value};
use crate::types::TypeInfo;

/// One constructor overload.
pub struct ConstructorOverload {
    pub index: usize,
    pub signature: MethodSignature,
    handle: ConstructorFn,
}

/// All overloads of a value type behind one entry point. Overloads are
/// tried in declaration order; the first whose parameter pattern accepts
/// the arguments wins.
pub struct ConstructorDispatcher {
    type_name: String,
    overloads: Vec<ConstructorOverload>,
}

impl ConstructorDispatcher {
    /// Collect the native handle of every overload. Record `index` must
    /// match the record's position.
    pub fn build(rt: &mut Runtime, ty: VariantType, records: &[ConstructorRecord]) -> BindResult<Self> {
        let mut overloads = Vec::with_capacity(records.len());
        for (position, record) in records.iter().enumerate() {
            if record.index != position {
                return Err(BindError::Type(format!(
                    "{} constructor at position {} declares index {}",
                    ty, position, record.index
                )));
            }
            let overload = Self::overload(rt, ty, record);
            if let Some(overload) = rt.tolerate(|| format!("{} constructor #{}", ty, position), overload)? {
                overloads.push(overload);
            }
        }
        Ok(Self {
            type_name: ty.name().to_string(),
            overloads,
        })
    }

    fn overload(rt: &Runtime, ty: VariantType, record: &ConstructorRecord) -> BindResult<ConstructorOverload> {
        let mut arguments = Vec::with_capacity(record.arguments.len());
        for arg in &record.arguments {
            let declared = rt.resolver().resolve(&arg.ty)?;
            let name = safe_argument_name(&arg.name, |word| rt.is_reserved_word(word));
            arguments.push(ArgumentDescriptor::new(name, declared));
        }
        let handle = rt
            .host()
            .constructor(ty, record.index)
            .ok_or_else(|| BindError::MissingNativeHandle {
                kind: "constructor",
                name: format!("{}#{}", ty, record.index),
            })?;
        Ok(ConstructorOverload {
            index: record.index,
            signature: MethodSignature::new(arguments, TypeInfo::Builtin(ty)),
            handle,
        })
    }

    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    pub fn overloads(&self) -> &[ConstructorOverload] {
        &self.overloads
    }

    /// Every accepted parameter pattern.
    pub fn shapes(&self) -> Vec<String> {
        self.overloads.iter().map(|o| o.signature.shape()).collect()
    }

    pub fn has_nullary(&self) -> bool {
        self.overloads.iter().any(|o| o.signature.arguments.is_empty())
    }

    /// First overload accepting `args`.
    pub fn select(&self, rt: &Runtime, args: &[Value]) -> Option<&ConstructorOverload> {
        self.overloads.iter().find(|overload| {
            let params = &overload.signature.arguments;
            params.len() == args.len()
                && params
                    .iter()
                    .zip(args)
                    .all(|(param, arg)| accepts(rt, &param.declared, arg).is_accepted())
        })
    }

    /// Construct an instance of `ty`.
    pub fn construct(&self, rt: &mut Runtime, ty: TypeId, args: Vec<Value>) -> BindResult<Value> {
        let overload = self.select(rt, &args).ok_or_else(|| BindError::NoMatchingOverload {
            kind: "constructor",
            target: self.type_name.clone(),
            called_with: args
                .iter()
                .map(|arg| rt.type_name(arg))
                .collect::<Vec<_>>()
                .join(", "),
            accepted: self.shapes(),
        })?;
        let variants = args
            .iter()
            .zip(&overload.signature.arguments)
            .map(|(arg, param)| rt.to_variant_as(arg, &param.declared))
            .collect::<BindResult<Vec<_>>>()?;
        log::debug!("{}: constructor #{} selected", self.type_name, overload.index);
        let result = (overload.handle)(&variants)?;
        if result.variant_type().is_primitive() || result.variant_type() == VariantType::String {
            return rt.from_variant(result, None);
        }
        Ok(Value::Builtin(BuiltinValue::new(ty, result)))
    }
}
