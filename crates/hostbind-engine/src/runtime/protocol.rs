//! Language-level protocol
//!
//! Attribute access, calls, construction, subscripts and operators. Every
//! entry point looks the member up along the receiver type's ancestor
//! chain and delegates to the table entry it finds.

use std::rc::Rc;

use hostbind_sdk::VariantOperator;

use super::binding::{MethodBinding, Receiver, Resolved};
use super::registry::{Member, TypeId, TypeKind};
use super::value::{SignalValue, Value};
use super::Runtime;
use crate::bind::{BoundMethod, Indexer, MethodOwner, OperatorOutcome, OperatorSlot};
use crate::error::{BindError, BindResult};

impl Runtime {
    // ========================================================================
    // Attributes
    // ========================================================================

    /// `target.name`
    pub fn get_attr(&mut self, target: &Value, name: &str) -> BindResult<Value> {
        let ty = match target {
            Value::Type(id) => *id,
            other => self.type_of(other),
        };
        let Some(member) = self.types.find_member(ty, name) else {
            if let Value::Object(obj) = target {
                if let Some(value) = obj.stored(name) {
                    return Ok(value);
                }
            }
            return Err(BindError::attribute(self.owner_name(target), name));
        };

        Ok(match member {
            Member::Method(method) => {
                if method.is_static() || matches!(target, Value::Type(_)) {
                    Value::Function(method)
                } else {
                    Value::Callable(MethodBinding::new(self.receiver_of(target), name))
                }
            }
            Member::Property(property) => {
                if matches!(target, Value::Type(_)) {
                    return Err(BindError::Type(format!(
                        "property '{}' of '{}' needs an instance",
                        name,
                        self.types.name(ty)
                    )));
                }
                self.read_property(target, &property)?
            }
            Member::Signal(_) => match target {
                Value::Object(obj) => Value::Signal(obj.signal(name)),
                _ => Value::Signal(SignalValue {
                    owner: None,
                    name: name.to_string(),
                }),
            },
            Member::Constant(constant) => Value::Constant(constant),
            Member::Enum(id) => Value::Type(id),
            Member::Value(value) => value,
        })
    }

    /// `target.name = value`
    pub fn set_attr(&mut self, target: &Value, name: &str, value: Value) -> BindResult<()> {
        if let Value::Type(id) = target {
            return Err(BindError::ReadOnly {
                owner: self.types.name(*id).to_string(),
                name: name.to_string(),
            });
        }
        let ty = self.type_of(target);
        match self.types.find_member(ty, name) {
            Some(Member::Property(property)) => self.write_property(target, &property, value),
            Some(_) => Err(BindError::ReadOnly {
                owner: self.type_name(target),
                name: name.to_string(),
            }),
            None => match target {
                Value::Object(obj) if self.types.user_class(obj.class()).is_some() => {
                    obj.store(name, value);
                    Ok(())
                }
                _ => Err(BindError::attribute(self.owner_name(target), name)),
            },
        }
    }

    /// True if `name` resolves on `target`.
    pub fn has_attr(&self, target: &Value, name: &str) -> bool {
        let ty = match target {
            Value::Type(id) => *id,
            other => self.type_of(other),
        };
        self.types.find_member(ty, name).is_some()
            || target.as_object().map_or(false, |obj| obj.has_stored(name))
    }

    fn receiver_of(&self, target: &Value) -> Receiver {
        match target {
            Value::Object(obj) => Receiver::Object(Rc::downgrade(obj)),
            Value::Type(id) => Receiver::Type(*id),
            other => Receiver::Value(Box::new(other.clone())),
        }
    }

    fn owner_name(&self, target: &Value) -> String {
        match target {
            Value::Type(id) => self.types.name(*id).to_string(),
            other => self.type_name(other),
        }
    }

    // ========================================================================
    // Calls
    // ========================================================================

    /// `callee(args...)`
    pub fn call(&mut self, callee: &Value, mut args: Vec<Value>) -> BindResult<Value> {
        match callee {
            Value::Function(method) => {
                let unbound = !method.is_static() && *method.owner() != MethodOwner::Utility;
                if unbound {
                    if args.is_empty() {
                        return Err(BindError::argument(
                            method.qualified_name(),
                            "missing receiver argument",
                        ));
                    }
                    let receiver = args.remove(0);
                    return self.invoke_method(&receiver, method, args);
                }
                method.invoke(self, None, args)
            }
            Value::Callable(binding) => match binding.resolve(self) {
                Resolved::Live { receiver, method } => match receiver {
                    Some(receiver) => self.invoke_method(&receiver, &method, args),
                    None => method.invoke(self, None, args),
                },
                Resolved::Expired => Err(BindError::Type(format!(
                    "callable '{}' has expired",
                    binding.member()
                ))),
            },
            Value::Type(id) => self.construct(*id, args),
            other => Err(BindError::Type(format!(
                "'{}' object is not callable",
                self.type_name(other)
            ))),
        }
    }

    /// `receiver.name(args...)`
    pub fn call_method(&mut self, receiver: &Value, name: &str, args: Vec<Value>) -> BindResult<Value> {
        let ty = match receiver {
            Value::Type(id) => *id,
            other => self.type_of(other),
        };
        let member = self
            .types
            .find_member(ty, name)
            .ok_or_else(|| BindError::attribute(self.owner_name(receiver), name))?;
        let method = member.as_method().cloned().ok_or_else(|| {
            BindError::Type(format!("'{}' {} is not callable", name, member.kind()))
        })?;
        self.invoke_method(receiver, &method, args)
    }

    /// Invoke `method` on `receiver`. Proxies are refreshed before the call
    /// and written back after a mutating one.
    pub fn invoke_method(
        &mut self,
        receiver: &Value,
        method: &Rc<BoundMethod>,
        args: Vec<Value>,
    ) -> BindResult<Value> {
        if method.is_static() || matches!(receiver, Value::Type(_)) {
            return method.invoke(self, None, args);
        }
        if let Value::Proxy(proxy) = receiver {
            self.refresh_proxy(proxy)?;
        }
        let result = method.invoke(self, Some(receiver), args)?;
        if let Value::Proxy(proxy) = receiver {
            if !method.signature().is_const() {
                self.write_back(proxy)?;
            }
        }
        Ok(result)
    }

    /// `Type(args...)`
    pub fn construct(&mut self, ty: TypeId, args: Vec<Value>) -> BindResult<Value> {
        let kind = self.types.get(ty).kind.clone();
        match kind {
            TypeKind::Object | TypeKind::UserClass { .. } | TypeKind::Bridge { .. } => {
                let obj = self.instantiate(ty)?;
                let value = Value::Object(obj.clone());
                let init = self
                    .types
                    .find_member(obj.class(), "_init")
                    .and_then(|member| member.as_method().cloned());
                match init {
                    Some(init) => {
                        if let Err(err) = self.invoke_method(&value, &init, args) {
                            self.release(&obj)?;
                            return Err(err);
                        }
                    }
                    None if !args.is_empty() => {
                        self.release(&obj)?;
                        return Err(BindError::argument(
                            self.types.name(ty).to_string(),
                            format!("takes no arguments ({} given)", args.len()),
                        ));
                    }
                    None => {}
                }
                Ok(value)
            }
            TypeKind::Enum { qualified, .. } => {
                let [arg] = args.as_slice() else {
                    return Err(BindError::argument(qualified, "takes exactly one argument"));
                };
                let value = arg.as_int().ok_or_else(|| {
                    BindError::Type(format!("{} is not a valid {}", self.type_name(arg), qualified))
                })?;
                self.enum_member(&qualified, value)
                    .ok_or_else(|| BindError::Type(format!("{} is not a valid {}", value, qualified)))
            }
            TypeKind::Nil => Ok(Value::Nil),
            TypeKind::Dynamic => Ok(args.into_iter().next().unwrap_or(Value::Nil)),
            TypeKind::Value(vt) if vt.is_primitive() => {
                let arg = args.first();
                Ok(match vt {
                    hostbind_sdk::VariantType::Bool => Value::Bool(arg.map_or(false, |a| self.truthy(a))),
                    hostbind_sdk::VariantType::Int => Value::Int(match arg {
                        None => 0,
                        Some(Value::Float(v)) => *v as i64,
                        Some(Value::Str(s)) => s.trim().parse().map_err(|_| {
                            BindError::Type(format!("invalid literal for int: '{}'", s))
                        })?,
                        Some(other) => other.as_int().ok_or_else(|| {
                            BindError::Type(format!("int() argument cannot be {}", self.type_name(other)))
                        })?,
                    }),
                    _ => Value::Float(match arg {
                        None => 0.0,
                        Some(Value::Str(s)) => s.trim().parse().map_err(|_| {
                            BindError::Type(format!("invalid literal for float: '{}'", s))
                        })?,
                        Some(other) => other.as_float().ok_or_else(|| {
                            BindError::Type(format!("float() argument cannot be {}", self.type_name(other)))
                        })?,
                    }),
                })
            }
            TypeKind::Value(_) | TypeKind::TypedArray(_) => {
                let constructor = self
                    .types
                    .mro(ty)
                    .into_iter()
                    .find_map(|id| self.types.get(id).constructor.clone())
                    .ok_or_else(|| {
                        BindError::Type(format!("'{}' cannot be constructed", self.types.name(ty)))
                    })?;
                constructor.construct(self, ty, args)
            }
        }
    }

    /// Truth value of a value.
    pub fn truthy(&self, value: &Value) -> bool {
        match value {
            Value::Nil => false,
            Value::Bool(b) => *b,
            Value::Float(v) => *v != 0.0,
            Value::Str(s) => !s.is_empty(),
            Value::List(items) => !items.is_empty(),
            Value::Object(obj) => !obj.is_released(),
            other => other.as_int().map_or(true, |v| v != 0),
        }
    }

    /// True if `value` is an instance of `ty` or one of its subtypes.
    pub fn is_instance(&self, value: &Value, ty: TypeId) -> bool {
        self.types.is_subtype(self.type_of(value), ty)
    }

    // ========================================================================
    // Subscripts
    // ========================================================================

    fn indexer_of(&self, container: &Value) -> BindResult<Indexer> {
        let ty = self.type_of(container);
        self.types
            .mro(ty)
            .into_iter()
            .find_map(|id| self.types.get(id).indexer.clone())
            .ok_or_else(|| {
                BindError::Type(format!(
                    "'{}' object is not subscriptable",
                    self.type_name(container)
                ))
            })
    }

    /// `container[key]`
    pub fn get_item(&mut self, container: &Value, key: &Value) -> BindResult<Value> {
        match container {
            Value::List(items) => {
                let index = native_index(key, items.len())?;
                Ok(items[index].clone())
            }
            Value::Str(s) => {
                let chars: Vec<char> = s.chars().collect();
                let index = native_index(key, chars.len())?;
                Ok(Value::Str(chars[index].to_string()))
            }
            _ => {
                let indexer = self.indexer_of(container)?;
                indexer.get(self, container, key)
            }
        }
    }

    /// `container[key] = value`
    pub fn set_item(&mut self, container: &Value, key: &Value, value: Value) -> BindResult<()> {
        let indexer = self.indexer_of(container)?;
        indexer.set(self, container, key, &value)?;
        if let Value::Proxy(proxy) = container {
            self.write_back(proxy)?;
        }
        Ok(())
    }

    /// `len(value)`
    pub fn len(&mut self, value: &Value) -> BindResult<i64> {
        match value {
            Value::Str(s) => Ok(s.chars().count() as i64),
            Value::List(items) => Ok(items.len() as i64),
            _ => {
                let ty = self.type_of(value);
                let size = self
                    .types
                    .find_member(ty, "size")
                    .and_then(|member| member.as_method().cloned())
                    .ok_or_else(|| {
                        BindError::Type(format!(
                            "object of type '{}' has no len()",
                            self.type_name(value)
                        ))
                    })?;
                let result = self.invoke_method(value, &size, Vec::new())?;
                result
                    .as_int()
                    .ok_or_else(|| BindError::Type("size() did not return an integer".to_string()))
            }
        }
    }

    // ========================================================================
    // Operators
    // ========================================================================

    /// `left op right`, with fallbacks: the right operand's reflected
    /// table, then identity for `==` and `!=`.
    pub fn eval_binary(&mut self, op: VariantOperator, left: &Value, right: &Value) -> BindResult<Value> {
        if let Some(result) = native_binary(op, left, right) {
            return result;
        }
        if let OperatorOutcome::Value(value) = self.apply_operator(op, left, right)? {
            return Ok(value);
        }

        let right_type = self.type_of(right);
        let reflected = self
            .types
            .mro(right_type)
            .into_iter()
            .find_map(|id| self.types.get(id).operators.find(OperatorSlot::Reflected, op, left));
        if let Some(handler) = reflected {
            return handler.evaluate(self, left, right);
        }

        match op {
            VariantOperator::Equal => Ok(Value::Bool(left.same(right))),
            VariantOperator::NotEqual => Ok(Value::Bool(!left.same(right))),
            _ => Err(self.unsupported(op, left, right)),
        }
    }

    /// Look `left op right` up in the left operand's table only. A missing
    /// entry is reported as [`OperatorOutcome::NotSupported`].
    pub fn apply_operator(
        &mut self,
        op: VariantOperator,
        left: &Value,
        right: &Value,
    ) -> BindResult<OperatorOutcome> {
        let left_type = self.type_of(left);
        let handler = self
            .types
            .mro(left_type)
            .into_iter()
            .find_map(|id| self.types.get(id).operators.find(OperatorSlot::Binary, op, right));
        match handler {
            Some(handler) => Ok(OperatorOutcome::Value(handler.evaluate(self, left, right)?)),
            None => Ok(OperatorOutcome::NotSupported),
        }
    }

    /// `op operand`
    pub fn eval_unary(&mut self, op: VariantOperator, operand: &Value) -> BindResult<Value> {
        if op == VariantOperator::Not {
            return Ok(Value::Bool(!self.truthy(operand)));
        }
        if let Some(result) = native_unary(op, operand) {
            return result;
        }
        let ty = self.type_of(operand);
        let handler = self
            .types
            .mro(ty)
            .into_iter()
            .find_map(|id| self.types.get(id).operators.find(OperatorSlot::Unary, op, &Value::Nil));
        match handler {
            Some(handler) => handler.evaluate(self, operand, &Value::Nil),
            None => Err(BindError::Type(format!(
                "bad operand type for unary {}: '{}'",
                op,
                self.type_name(operand)
            ))),
        }
    }

    /// `target op= right`. Value-type instances with an in-place entry are
    /// updated in place and keep their identity; everything else rebinds to
    /// the binary result.
    pub fn eval_inplace(&mut self, op: VariantOperator, target: &Value, right: &Value) -> BindResult<Value> {
        if let Some(builtin) = target.builtin() {
            let ty = self.type_of(target);
            let handler = self
                .types
                .mro(ty)
                .into_iter()
                .find_map(|id| self.types.get(id).operators.find(OperatorSlot::InPlace, op, right));
            if let Some(handler) = handler {
                let result = handler.evaluate(self, target, right)?;
                builtin.set(self.to_variant(&result)?);
                if let Value::Proxy(proxy) = target {
                    self.write_back(proxy)?;
                }
                return Ok(target.clone());
            }
        }
        self.eval_binary(op, target, right)
    }

    /// `item in container`
    pub fn eval_contains(&mut self, container: &Value, item: &Value) -> BindResult<bool> {
        match (container, item) {
            (Value::List(items), _) => return Ok(items.iter().any(|x| x.same(item))),
            (Value::Str(s), Value::Str(needle)) => return Ok(s.contains(needle.as_str())),
            _ => {}
        }
        let ty = self.type_of(container);
        let handler = self
            .types
            .mro(ty)
            .into_iter()
            .find_map(|id| self.types.get(id).operators.find(OperatorSlot::Contains, VariantOperator::In, item));
        match handler {
            Some(handler) => {
                let result = handler.evaluate(self, item, container)?;
                Ok(self.truthy(&result))
            }
            None => Err(BindError::Type(format!(
                "argument of type '{}' is not a container of '{}'",
                self.type_name(container),
                self.type_name(item)
            ))),
        }
    }

    fn unsupported(&self, op: VariantOperator, left: &Value, right: &Value) -> BindError {
        let left_type = self.type_of(left);
        let mut accepted = Vec::new();
        for id in self.types.mro(left_type) {
            for label in self.types.get(id).operators.accepted(OperatorSlot::Binary, op) {
                if !accepted.contains(&label) {
                    accepted.push(label);
                }
            }
        }
        BindError::UnsupportedOperand {
            op: op.symbol().to_string(),
            left: self.type_name(left),
            right: self.type_name(right),
            accepted,
        }
    }
}

// ============================================================================
// Native arithmetic
// ============================================================================

fn native_index(key: &Value, len: usize) -> BindResult<usize> {
    let index = key
        .as_int()
        .ok_or_else(|| BindError::Type("indices must be integers".to_string()))?;
    let size = len as i64;
    let position = if index < 0 { index + size } else { index };
    if position < 0 || position >= size {
        return Err(BindError::IndexOutOfRange { index, size });
    }
    Ok(position as usize)
}

fn is_number(value: &Value) -> bool {
    matches!(
        value,
        Value::Int(_) | Value::Float(_) | Value::Bool(_) | Value::Enum(_) | Value::Constant(_)
    )
}

fn overflow() -> BindError {
    BindError::Type("integer overflow".to_string())
}

/// Longest string `str * int` may build.
const MAX_REPEAT_LEN: usize = 1 << 28;

fn zero_division() -> BindError {
    BindError::Type("division by zero".to_string())
}

/// Arithmetic on values the language represents natively. `None` when the
/// operands are not both native.
fn native_binary(op: VariantOperator, left: &Value, right: &Value) -> Option<BindResult<Value>> {
    use VariantOperator::*;

    if let (Value::Str(a), Value::Str(b)) = (left, right) {
        return Some(Ok(match op {
            Add => Value::Str(format!("{}{}", a, b)),
            Equal => Value::Bool(a == b),
            NotEqual => Value::Bool(a != b),
            Less => Value::Bool(a < b),
            LessEqual => Value::Bool(a <= b),
            Greater => Value::Bool(a > b),
            GreaterEqual => Value::Bool(a >= b),
            _ => return None,
        }));
    }
    if let (Value::Str(s), Value::Int(n)) = (left, right) {
        if op == Multiply {
            let count = usize::try_from((*n).max(0)).unwrap_or(usize::MAX);
            return Some(match s.len().checked_mul(count) {
                Some(len) if len <= MAX_REPEAT_LEN => Ok(Value::Str(s.repeat(count))),
                _ => Err(overflow()),
            });
        }
    }
    if !is_number(left) || !is_number(right) {
        return None;
    }

    let both_int = !matches!(left, Value::Float(_)) && !matches!(right, Value::Float(_));
    if both_int {
        let (a, b) = (left.as_int()?, right.as_int()?);
        return Some(match op {
            Add => a.checked_add(b).map(Value::Int).ok_or_else(overflow),
            Subtract => a.checked_sub(b).map(Value::Int).ok_or_else(overflow),
            Multiply => a.checked_mul(b).map(Value::Int).ok_or_else(overflow),
            Divide if b == 0 => Err(zero_division()),
            Divide => Ok(Value::Float(a as f64 / b as f64)),
            Module if b == 0 => Err(zero_division()),
            Module => a
                .checked_rem_euclid(b)
                .map(|r| Value::Int(if b < 0 && r != 0 { r + b } else { r }))
                .ok_or_else(overflow),
            Power if b < 0 => Ok(Value::Float((a as f64).powf(b as f64))),
            Power => u32::try_from(b)
                .ok()
                .and_then(|exp| a.checked_pow(exp))
                .map(Value::Int)
                .ok_or_else(overflow),
            ShiftLeft => u32::try_from(b)
                .ok()
                .and_then(|shift| a.checked_shl(shift))
                .map(Value::Int)
                .ok_or_else(overflow),
            ShiftRight => u32::try_from(b)
                .ok()
                .and_then(|shift| a.checked_shr(shift))
                .map(Value::Int)
                .ok_or_else(overflow),
            BitAnd => Ok(Value::Int(a & b)),
            BitOr => Ok(Value::Int(a | b)),
            BitXor => Ok(Value::Int(a ^ b)),
            Equal => Ok(Value::Bool(a == b)),
            NotEqual => Ok(Value::Bool(a != b)),
            Less => Ok(Value::Bool(a < b)),
            LessEqual => Ok(Value::Bool(a <= b)),
            Greater => Ok(Value::Bool(a > b)),
            GreaterEqual => Ok(Value::Bool(a >= b)),
            _ => return None,
        });
    }

    let (a, b) = (left.as_float()?, right.as_float()?);
    Some(match op {
        Add => Ok(Value::Float(a + b)),
        Subtract => Ok(Value::Float(a - b)),
        Multiply => Ok(Value::Float(a * b)),
        Divide if b == 0.0 => Err(zero_division()),
        Divide => Ok(Value::Float(a / b)),
        Module if b == 0.0 => Err(zero_division()),
        Module => Ok(Value::Float(a - b * (a / b).floor())),
        Power => Ok(Value::Float(a.powf(b))),
        Equal => Ok(Value::Bool(a == b)),
        NotEqual => Ok(Value::Bool(a != b)),
        Less => Ok(Value::Bool(a < b)),
        LessEqual => Ok(Value::Bool(a <= b)),
        Greater => Ok(Value::Bool(a > b)),
        GreaterEqual => Ok(Value::Bool(a >= b)),
        _ => return None,
    })
}

fn native_unary(op: VariantOperator, operand: &Value) -> Option<BindResult<Value>> {
    match (op, operand) {
        (VariantOperator::Negate, Value::Float(v)) => Some(Ok(Value::Float(-v))),
        (VariantOperator::Positive, Value::Float(v)) => Some(Ok(Value::Float(*v))),
        (_, Value::Float(_)) => None,
        (VariantOperator::Negate, other) if is_number(other) => {
            Some(other.as_int()?.checked_neg().map(Value::Int).ok_or_else(overflow))
        }
        (VariantOperator::Positive, other) if is_number(other) => Some(Ok(Value::Int(other.as_int()?))),
        (VariantOperator::BitNegate, other) if is_number(other) => Some(Ok(Value::Int(!other.as_int()?))),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_native_int_arithmetic() {
        let add = native_binary(VariantOperator::Add, &Value::Int(2), &Value::Int(3))
            .unwrap()
            .unwrap();
        assert!(add.same(&Value::Int(5)));
        let div = native_binary(VariantOperator::Divide, &Value::Int(3), &Value::Int(2))
            .unwrap()
            .unwrap();
        assert!(div.same(&Value::Float(1.5)));
        let modulo = native_binary(VariantOperator::Module, &Value::Int(-7), &Value::Int(3))
            .unwrap()
            .unwrap();
        assert!(modulo.same(&Value::Int(2)));
        assert!(native_binary(VariantOperator::Divide, &Value::Int(1), &Value::Int(0))
            .unwrap()
            .is_err());
        assert!(native_binary(VariantOperator::Add, &Value::Int(i64::MAX), &Value::Int(1))
            .unwrap()
            .is_err());
    }

    #[test]
    fn test_native_int_edge_cases_error_instead_of_panicking() {
        let modulo = native_binary(VariantOperator::Module, &Value::Int(i64::MIN), &Value::Int(-1)).unwrap();
        assert!(matches!(modulo, Err(BindError::Type(_))));
        let modulo = native_binary(VariantOperator::Module, &Value::Int(7), &Value::Int(-3))
            .unwrap()
            .unwrap();
        assert!(modulo.same(&Value::Int(-2)));

        let huge = native_binary(VariantOperator::Multiply, &Value::str("ab"), &Value::Int(i64::MAX)).unwrap();
        assert!(matches!(huge, Err(BindError::Type(_))));
        let repeated = native_binary(VariantOperator::Multiply, &Value::str("ab"), &Value::Int(3))
            .unwrap()
            .unwrap();
        assert_eq!(repeated.as_str(), Some("ababab"));
        let empty = native_binary(VariantOperator::Multiply, &Value::str("ab"), &Value::Int(-2))
            .unwrap()
            .unwrap();
        assert_eq!(empty.as_str(), Some(""));
    }

    #[test]
    fn test_native_mixed_and_strings() {
        let sum = native_binary(VariantOperator::Add, &Value::Int(1), &Value::Float(0.5))
            .unwrap()
            .unwrap();
        assert!(sum.same(&Value::Float(1.5)));
        let joined = native_binary(VariantOperator::Add, &Value::str("a"), &Value::str("b"))
            .unwrap()
            .unwrap();
        assert_eq!(joined.as_str(), Some("ab"));
        assert!(native_binary(VariantOperator::Add, &Value::str("a"), &Value::Int(1)).is_none());
        assert!(native_binary(VariantOperator::BitAnd, &Value::Float(1.0), &Value::Int(1)).is_none());
    }

    #[test]
    fn test_native_index() {
        assert_eq!(native_index(&Value::Int(-1), 3).unwrap(), 2);
        assert!(matches!(
            native_index(&Value::Int(3), 3),
            Err(BindError::IndexOutOfRange { index: 3, size: 3 })
        ));
    }
}
