//! Operator tables
//!
//! Each value type carries one table keyed by (slot, operator) and then by
//! the kind of the other operand, so one operator symbol serves several
//! right-hand kinds. The host's evaluators are installed from the value
//! type's operator records; in-place and reflected entries are derived from
//! the same records.

use std::rc::Rc;

use hostbind_sdk::{OperatorFn, VariantOperator, VariantType};
use indexmap::IndexMap;
use rustc_hash::FxHashMap;

use crate::error::{BindError, BindResult};
use crate::idl::{BuiltinClassRecord, OperatorRecord};
use crate::runtime::{Runtime, TypeId, Value};
use crate::types::TypeInfo;

/// Which protocol hook an entry serves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperatorSlot {
    /// `self op other`
    Binary,
    /// `other op self`, where `other` has no entry for `self`
    Reflected,
    /// `self op= other`
    InPlace,
    Unary,
    /// `other in self`
    Contains,
}

/// Kind of the other operand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperandKey {
    Type(VariantType),
    /// The language's own string
    NativeStr,
    /// The language's own list
    NativeList,
    /// Anything
    Dynamic,
}

impl OperandKey {
    /// Key of a value's own kind.
    pub fn of(value: &Value) -> OperandKey {
        match value {
            Value::Str(_) => OperandKey::NativeStr,
            Value::List(_) => OperandKey::NativeList,
            Value::Nil => OperandKey::Type(VariantType::Nil),
            Value::Bool(_) => OperandKey::Type(VariantType::Bool),
            Value::Int(_) | Value::Constant(_) | Value::Enum(_) => OperandKey::Type(VariantType::Int),
            Value::Float(_) => OperandKey::Type(VariantType::Float),
            Value::Builtin(builtin) => OperandKey::Type(builtin.variant_type()),
            Value::Proxy(proxy) => OperandKey::Type(proxy.value.variant_type()),
            Value::Object(_) | Value::Type(_) => OperandKey::Type(VariantType::Object),
            Value::Signal(_) => OperandKey::Type(VariantType::Signal),
            Value::Callable(_) | Value::Function(_) => OperandKey::Type(VariantType::Callable),
        }
    }

    /// Keys to try for a value, most specific first.
    pub fn candidates(value: &Value) -> Vec<OperandKey> {
        let own = Self::of(value);
        let mut keys = vec![own];
        if own == OperandKey::Type(VariantType::Int) {
            keys.push(OperandKey::Type(VariantType::Float));
        }
        keys.push(OperandKey::Dynamic);
        keys
    }

    pub fn label(&self) -> String {
        match self {
            OperandKey::Type(ty) => ty.name().to_string(),
            OperandKey::NativeStr => "str".to_string(),
            OperandKey::NativeList => "list".to_string(),
            OperandKey::Dynamic => "Variant".to_string(),
        }
    }
}

/// One host evaluator.
pub struct OperatorHandler {
    pub op: VariantOperator,
    pub left: VariantType,
    /// `Nil` for dynamic right operands and unary operators
    pub right: VariantType,
    pub return_type: TypeInfo,
    evaluator: OperatorFn,
}

impl OperatorHandler {
    pub fn new(
        op: VariantOperator,
        left: VariantType,
        right: VariantType,
        return_type: TypeInfo,
        evaluator: OperatorFn,
    ) -> Self {
        Self {
            op,
            left,
            right,
            return_type,
            evaluator,
        }
    }

    /// Evaluate `left op right` (operands in source order).
    pub fn evaluate(&self, rt: &mut Runtime, left: &Value, right: &Value) -> BindResult<Value> {
        let a = rt.to_variant_as(left, &TypeInfo::Builtin(self.left))?;
        let b = match self.right {
            VariantType::Nil => rt.to_variant(right)?,
            ty => rt.to_variant_as(right, &TypeInfo::Builtin(ty))?,
        };
        let result = (self.evaluator)(&a, &b)?;
        rt.from_variant(result, Some(&self.return_type))
    }
}

/// Result of a table lookup that must not raise.
#[derive(Debug)]
pub enum OperatorOutcome {
    Value(Value),
    NotSupported,
}

impl OperatorOutcome {
    pub fn is_supported(&self) -> bool {
        matches!(self, OperatorOutcome::Value(_))
    }
}

/// Per-type operator table.
#[derive(Default)]
pub struct OperatorTable {
    entries: FxHashMap<(OperatorSlot, VariantOperator), IndexMap<OperandKey, Rc<OperatorHandler>>>,
}

impl OperatorTable {
    /// Install or replace an entry.
    pub fn install(&mut self, slot: OperatorSlot, key: OperandKey, handler: Rc<OperatorHandler>) {
        self.entries
            .entry((slot, handler.op))
            .or_default()
            .insert(key, handler);
    }

    /// Install unless an entry exists. Returns true if installed.
    pub fn install_if_absent(
        &mut self,
        slot: OperatorSlot,
        key: OperandKey,
        handler: Rc<OperatorHandler>,
    ) -> bool {
        let map = self.entries.entry((slot, handler.op)).or_default();
        if map.contains_key(&key) {
            return false;
        }
        map.insert(key, handler);
        true
    }

    pub fn lookup(
        &self,
        slot: OperatorSlot,
        op: VariantOperator,
        key: OperandKey,
    ) -> Option<Rc<OperatorHandler>> {
        self.entries.get(&(slot, op))?.get(&key).cloned()
    }

    /// First entry accepting `other`.
    pub fn find(&self, slot: OperatorSlot, op: VariantOperator, other: &Value) -> Option<Rc<OperatorHandler>> {
        let map = self.entries.get(&(slot, op))?;
        OperandKey::candidates(other)
            .into_iter()
            .find_map(|key| map.get(&key).cloned())
    }

    /// Labels of the operand kinds accepted for `op`.
    pub fn accepted(&self, slot: OperatorSlot, op: VariantOperator) -> Vec<String> {
        self.entries
            .get(&(slot, op))
            .map(|map| map.keys().map(OperandKey::label).collect())
            .unwrap_or_default()
    }

    pub fn supports(&self, slot: OperatorSlot, op: VariantOperator) -> bool {
        self.entries
            .get(&(slot, op))
            .map_or(false, |map| !map.is_empty())
    }

    /// Let native strings and lists use the entries of the host string
    /// and array types, where no entry of their own exists.
    pub fn alias_native_kinds(&mut self) {
        for map in self.entries.values_mut() {
            let string = [VariantType::String, VariantType::StringName, VariantType::NodePath]
                .iter()
                .find_map(|ty| map.get(&OperandKey::Type(*ty)).cloned());
            if let Some(handler) = string {
                map.entry(OperandKey::NativeStr).or_insert(handler);
            }
            if let Some(handler) = map.get(&OperandKey::Type(VariantType::Array)).cloned() {
                map.entry(OperandKey::NativeList).or_insert(handler);
            }
        }
    }

    pub fn len(&self) -> usize {
        self.entries.values().map(IndexMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

// ============================================================================
// Installation from IDL records
// ============================================================================

fn is_logical(op: VariantOperator) -> bool {
    matches!(
        op,
        VariantOperator::And | VariantOperator::Or | VariantOperator::Xor | VariantOperator::Not
    )
}

/// Install the operators of value type `ty` (record `id`).
pub fn install_operators(rt: &mut Runtime, id: TypeId, ty: VariantType, record: &BuiltinClassRecord) -> BindResult<()> {
    for op_record in &record.operators {
        let Some(op) = VariantOperator::from_symbol(&op_record.name) else {
            log::debug!("{}: unknown operator '{}'", ty, op_record.name);
            continue;
        };
        if is_logical(op) {
            continue;
        }
        let result = install_one(rt, id, ty, op, op_record);
        rt.tolerate(|| format!("{} operator {}", ty, op_record.name), result)?;
    }
    rt.types.get_mut(id).operators.alias_native_kinds();
    Ok(())
}

fn missing(op: VariantOperator, left: VariantType, right: &str) -> BindError {
    BindError::MissingNativeHandle {
        kind: "operator",
        name: format!("{} {} {}", left, op, right),
    }
}

fn install_one(
    rt: &mut Runtime,
    id: TypeId,
    ty: VariantType,
    op: VariantOperator,
    record: &OperatorRecord,
) -> BindResult<()> {
    let return_type = rt.resolver().resolve(&record.return_type)?;
    let Some(right_name) = record.right_type.as_deref() else {
        let evaluator = rt
            .host()
            .operator_evaluator(op, ty, VariantType::Nil)
            .ok_or_else(|| missing(op, ty, ""))?;
        let handler = OperatorHandler::new(op, ty, VariantType::Nil, return_type, evaluator);
        rt.types
            .get_mut(id)
            .operators
            .install(OperatorSlot::Unary, OperandKey::Dynamic, Rc::new(handler));
        return Ok(());
    };

    let (right, key) = if right_name == "Variant" {
        (VariantType::Nil, OperandKey::Dynamic)
    } else {
        let right = rt.resolver().resolve(right_name)?.variant_type();
        (right, OperandKey::Type(right))
    };
    let evaluator = rt
        .host()
        .operator_evaluator(op, ty, right)
        .ok_or_else(|| missing(op, ty, right_name))?;
    let in_place = return_type.variant_type() == ty;
    let handler = Rc::new(OperatorHandler::new(op, ty, right, return_type, evaluator));

    if op == VariantOperator::In {
        // `self in container`: the container answers membership.
        if key == OperandKey::Dynamic || right == VariantType::Object {
            return Ok(());
        }
        let container = rt.value_type_id(right);
        rt.types.get_mut(container).operators.install(
            OperatorSlot::Contains,
            OperandKey::Type(ty),
            handler,
        );
        return Ok(());
    }

    let table = &mut rt.types.get_mut(id).operators;
    table.install(OperatorSlot::Binary, key, handler.clone());
    if in_place {
        table.install(OperatorSlot::InPlace, key, handler);
    }
    Ok(())
}

/// Install reflected entries on custom value types from the operator
/// records of a host numeric type (`int` or `float`).
pub fn install_reflected(rt: &mut Runtime, numeric: VariantType, record: &BuiltinClassRecord) -> BindResult<()> {
    for op_record in &record.operators {
        let Some(right_name) = op_record.right_type.as_deref() else {
            continue;
        };
        if op_record.return_type == "bool" {
            continue;
        }
        let Some(target) = VariantType::from_name(right_name) else {
            continue;
        };
        if target.is_primitive() || target == VariantType::String || target == VariantType::Object {
            continue;
        }
        let Some(op) = VariantOperator::from_symbol(&op_record.name) else {
            continue;
        };
        if is_logical(op) || op == VariantOperator::In {
            continue;
        }
        let result = reflected_one(rt, numeric, target, op, op_record);
        rt.tolerate(
            || format!("{} reflected operator {} {}", target, numeric, op_record.name),
            result,
        )?;
    }
    Ok(())
}

fn reflected_one(
    rt: &mut Runtime,
    numeric: VariantType,
    target: VariantType,
    op: VariantOperator,
    record: &OperatorRecord,
) -> BindResult<()> {
    let return_type = rt.resolver().resolve(&record.return_type)?;
    let evaluator = rt
        .host()
        .operator_evaluator(op, numeric, target)
        .ok_or_else(|| missing(op, numeric, target.name()))?;
    let handler = OperatorHandler::new(op, numeric, target, return_type, evaluator);
    let id = rt.value_type_id(target);
    rt.types.get_mut(id).operators.install(
        OperatorSlot::Reflected,
        OperandKey::Type(numeric),
        Rc::new(handler),
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use hostbind_sdk::Variant;

    fn handler(op: VariantOperator, right: VariantType) -> Rc<OperatorHandler> {
        Rc::new(OperatorHandler::new(
            op,
            VariantType::StringName,
            right,
            TypeInfo::Builtin(VariantType::Bool),
            Rc::new(|_: &Variant, _: &Variant| Ok(Variant::Bool(true))),
        ))
    }

    #[test]
    fn test_lookup_by_operand_kind() {
        let mut table = OperatorTable::default();
        table.install(
            OperatorSlot::Binary,
            OperandKey::Type(VariantType::StringName),
            handler(VariantOperator::Equal, VariantType::StringName),
        );
        table.install(
            OperatorSlot::Binary,
            OperandKey::Dynamic,
            handler(VariantOperator::Equal, VariantType::Nil),
        );
        let found = table
            .find(OperatorSlot::Binary, VariantOperator::Equal, &Value::Int(1))
            .unwrap();
        assert_eq!(found.right, VariantType::Nil);
        assert!(table
            .find(OperatorSlot::Binary, VariantOperator::Less, &Value::Int(1))
            .is_none());
        assert_eq!(
            table.accepted(OperatorSlot::Binary, VariantOperator::Equal),
            vec!["StringName", "Variant"]
        );
    }

    #[test]
    fn test_native_aliases_do_not_override() {
        let mut table = OperatorTable::default();
        table.install(
            OperatorSlot::Binary,
            OperandKey::Type(VariantType::StringName),
            handler(VariantOperator::Equal, VariantType::StringName),
        );
        table.install(
            OperatorSlot::Binary,
            OperandKey::Type(VariantType::String),
            handler(VariantOperator::Equal, VariantType::String),
        );
        table.alias_native_kinds();
        let found = table
            .lookup(OperatorSlot::Binary, VariantOperator::Equal, OperandKey::NativeStr)
            .unwrap();
        assert_eq!(found.right, VariantType::String);

        let native = handler(VariantOperator::Equal, VariantType::Nil);
        assert!(!table.install_if_absent(OperatorSlot::Binary, OperandKey::NativeStr, native));
        assert_eq!(table.len(), 3);
    }

    #[test]
    fn test_int_widens_to_float_key() {
        assert_eq!(
            OperandKey::candidates(&Value::Int(2)),
            vec![
                OperandKey::Type(VariantType::Int),
                OperandKey::Type(VariantType::Float),
                OperandKey::Dynamic
            ]
        );
        assert_eq!(OperandKey::of(&Value::str("a")), OperandKey::NativeStr);
    }
}
