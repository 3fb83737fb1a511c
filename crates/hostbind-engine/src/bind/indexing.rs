//! Subscript access for indexable value types

use std::rc::Rc;

use hostbind_sdk::{IndexedGetFn, IndexedSetFn, KeyedGetFn, KeyedSetFn, VariantType};

use super::method::BoundMethod;
use crate::error::{BindError, BindResult};
use crate::idl::BuiltinClassRecord;
use crate::runtime::{Runtime, TypeId, Value};
use crate::types::TypeInfo;

/// Item access of a value type.
#[derive(Clone)]
pub enum Indexer {
    /// Integer positions. Bounds are checked when `size` is bound.
    Positional {
        get: IndexedGetFn,
        set: Option<IndexedSetFn>,
        returns: TypeInfo,
        size: Option<Rc<BoundMethod>>,
    },
    /// Arbitrary keys
    Keyed {
        get: KeyedGetFn,
        set: Option<KeyedSetFn>,
        returns: TypeInfo,
    },
}

/// Build the indexer of value type `ty` (record `id`). Methods must be bound
/// already so that `size` can be found.
pub fn build_indexer(
    rt: &mut Runtime,
    id: TypeId,
    ty: VariantType,
    record: &BuiltinClassRecord,
) -> BindResult<Option<Indexer>> {
    let Some(returns) = record.indexing_return_type.as_deref() else {
        return Ok(None);
    };
    let returns = rt.resolver().resolve(returns)?;
    let missing = || BindError::MissingNativeHandle {
        kind: "indexing",
        name: ty.name().to_string(),
    };

    let indexer = if record.is_keyed {
        Indexer::Keyed {
            get: rt.host().keyed_getter(ty).ok_or_else(missing)?,
            set: rt.host().keyed_setter(ty),
            returns,
        }
    } else {
        let size = rt
            .types()
            .get(id)
            .members
            .get("size")
            .and_then(|member| member.as_method().cloned());
        if size.is_none() {
            log::debug!("{}: positional indexing without bounds checks", ty);
        }
        Indexer::Positional {
            get: rt.host().indexed_getter(ty).ok_or_else(missing)?,
            set: rt.host().indexed_setter(ty),
            returns,
            size,
        }
    };
    Ok(Some(indexer))
}

impl Indexer {
    pub fn is_keyed(&self) -> bool {
        matches!(self, Indexer::Keyed { .. })
    }

    pub fn returns(&self) -> &TypeInfo {
        match self {
            Indexer::Positional { returns, .. } | Indexer::Keyed { returns, .. } => returns,
        }
    }

    /// `container[key]`
    pub fn get(&self, rt: &mut Runtime, container: &Value, key: &Value) -> BindResult<Value> {
        let payload = rt.to_variant(container)?;
        let result = match self {
            Indexer::Positional { get, .. } => {
                let index = self.position(rt, container, key)?;
                get(&payload, index)?
            }
            Indexer::Keyed { get, .. } => get(&payload, &rt.to_variant(key)?)?,
        };
        rt.from_variant(result, Some(self.returns()))
    }

    /// `container[key] = value`, in place.
    pub fn set(&self, rt: &mut Runtime, container: &Value, key: &Value, value: &Value) -> BindResult<()> {
        let builtin = container.builtin().ok_or_else(|| {
            BindError::Type(format!(
                "'{}' object does not support item assignment",
                rt.type_name(container)
            ))
        })?;
        let read_only = || {
            BindError::Type(format!(
                "'{}' object does not support item assignment",
                rt.type_name(container)
            ))
        };
        match self {
            Indexer::Positional { set, returns, .. } => {
                let set = set.as_ref().ok_or_else(read_only)?;
                let index = self.position(rt, container, key)?;
                let item = rt.to_variant_as(value, returns)?;
                set(&mut builtin.data.borrow_mut(), index, item)?;
            }
            Indexer::Keyed { set, returns, .. } => {
                let set = set.as_ref().ok_or_else(read_only)?;
                let key = rt.to_variant(key)?;
                let item = rt.to_variant_as(value, returns)?;
                set(&mut builtin.data.borrow_mut(), key, item)?;
            }
        }
        Ok(())
    }

    /// Normalized position. Negative indices count from the end.
    fn position(&self, rt: &mut Runtime, container: &Value, key: &Value) -> BindResult<i64> {
        let index = key.as_int().ok_or_else(|| {
            BindError::Type(format!(
                "indices must be integers, not {}",
                rt.type_name(key)
            ))
        })?;
        let Indexer::Positional {
            size: Some(size), ..
        } = self
        else {
            return Ok(index);
        };
        let len = size
            .invoke(rt, Some(container), Vec::new())?
            .as_int()
            .unwrap_or(0);
        let position = if index < 0 { index + len } else { index };
        if position < 0 || position >= len {
            return Err(BindError::IndexOutOfRange { index, size: len });
        }
        Ok(position)
    }
}
