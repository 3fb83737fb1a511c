//! Host values
//!
//! `Variant` is the by-value representation of everything that crosses the
//! host boundary. `VariantType` names the host's closed set of value kinds.

use std::fmt;

// ============================================================================
// Object identity
// ============================================================================

/// Host-side identity of an object instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectId(pub u64);

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

// ============================================================================
// Variant Type
// ============================================================================

/// Host value kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
#[repr(u8)]
pub enum VariantType {
    #[default]
    Nil,
    Bool,
    Int,
    Float,
    String,
    Vector2,
    Vector2i,
    Rect2,
    Rect2i,
    Vector3,
    Vector3i,
    Transform2D,
    Vector4,
    Vector4i,
    Plane,
    Quaternion,
    Aabb,
    Basis,
    Transform3D,
    Projection,
    Color,
    StringName,
    NodePath,
    Rid,
    Object,
    Callable,
    Signal,
    Dictionary,
    Array,
    PackedByteArray,
    PackedInt32Array,
    PackedInt64Array,
    PackedFloat32Array,
    PackedFloat64Array,
    PackedStringArray,
    PackedVector2Array,
    PackedVector3Array,
    PackedColorArray,
    PackedVector4Array,
}

const ALL_TYPES: [VariantType; 39] = [
    VariantType::Nil,
    VariantType::Bool,
    VariantType::Int,
    VariantType::Float,
    VariantType::String,
    VariantType::Vector2,
    VariantType::Vector2i,
    VariantType::Rect2,
    VariantType::Rect2i,
    VariantType::Vector3,
    VariantType::Vector3i,
    VariantType::Transform2D,
    VariantType::Vector4,
    VariantType::Vector4i,
    VariantType::Plane,
    VariantType::Quaternion,
    VariantType::Aabb,
    VariantType::Basis,
    VariantType::Transform3D,
    VariantType::Projection,
    VariantType::Color,
    VariantType::StringName,
    VariantType::NodePath,
    VariantType::Rid,
    VariantType::Object,
    VariantType::Callable,
    VariantType::Signal,
    VariantType::Dictionary,
    VariantType::Array,
    VariantType::PackedByteArray,
    VariantType::PackedInt32Array,
    VariantType::PackedInt64Array,
    VariantType::PackedFloat32Array,
    VariantType::PackedFloat64Array,
    VariantType::PackedStringArray,
    VariantType::PackedVector2Array,
    VariantType::PackedVector3Array,
    VariantType::PackedColorArray,
    VariantType::PackedVector4Array,
];

impl VariantType {
    /// Every host value kind, in host order.
    pub fn all() -> &'static [VariantType] {
        &ALL_TYPES
    }

    /// The name the IDL uses for this kind.
    pub fn name(self) -> &'static str {
        match self {
            VariantType::Nil => "Nil",
            VariantType::Bool => "bool",
            VariantType::Int => "int",
            VariantType::Float => "float",
            VariantType::String => "String",
            VariantType::Vector2 => "Vector2",
            VariantType::Vector2i => "Vector2i",
            VariantType::Rect2 => "Rect2",
            VariantType::Rect2i => "Rect2i",
            VariantType::Vector3 => "Vector3",
            VariantType::Vector3i => "Vector3i",
            VariantType::Transform2D => "Transform2D",
            VariantType::Vector4 => "Vector4",
            VariantType::Vector4i => "Vector4i",
            VariantType::Plane => "Plane",
            VariantType::Quaternion => "Quaternion",
            VariantType::Aabb => "AABB",
            VariantType::Basis => "Basis",
            VariantType::Transform3D => "Transform3D",
            VariantType::Projection => "Projection",
            VariantType::Color => "Color",
            VariantType::StringName => "StringName",
            VariantType::NodePath => "NodePath",
            VariantType::Rid => "RID",
            VariantType::Object => "Object",
            VariantType::Callable => "Callable",
            VariantType::Signal => "Signal",
            VariantType::Dictionary => "Dictionary",
            VariantType::Array => "Array",
            VariantType::PackedByteArray => "PackedByteArray",
            VariantType::PackedInt32Array => "PackedInt32Array",
            VariantType::PackedInt64Array => "PackedInt64Array",
            VariantType::PackedFloat32Array => "PackedFloat32Array",
            VariantType::PackedFloat64Array => "PackedFloat64Array",
            VariantType::PackedStringArray => "PackedStringArray",
            VariantType::PackedVector2Array => "PackedVector2Array",
            VariantType::PackedVector3Array => "PackedVector3Array",
            VariantType::PackedColorArray => "PackedColorArray",
            VariantType::PackedVector4Array => "PackedVector4Array",
        }
    }

    /// Look up a kind by its IDL name.
    pub fn from_name(name: &str) -> Option<VariantType> {
        ALL_TYPES.iter().copied().find(|ty| ty.name() == name)
    }

    /// True for the kinds the embedded language represents natively.
    pub fn is_primitive(self) -> bool {
        matches!(
            self,
            VariantType::Nil | VariantType::Bool | VariantType::Int | VariantType::Float
        )
    }
}

impl fmt::Display for VariantType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ============================================================================
// Variant
// ============================================================================

/// A host value.
///
/// Compound value types (vectors, colors, packed arrays, ...) are carried as
/// `Compound` with their components in host order.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Variant {
    #[default]
    Nil,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    StringName(String),
    NodePath(String),
    Object(Option<ObjectId>),
    Array(Vec<Variant>),
    Dictionary(Vec<(Variant, Variant)>),
    Signal { owner: Option<ObjectId>, name: String },
    Callable { owner: Option<ObjectId>, method: String },
    Compound { ty: VariantType, fields: Vec<Variant> },
}

impl Variant {
    /// The host kind of this value.
    pub fn variant_type(&self) -> VariantType {
        match self {
            Variant::Nil => VariantType::Nil,
            Variant::Bool(_) => VariantType::Bool,
            Variant::Int(_) => VariantType::Int,
            Variant::Float(_) => VariantType::Float,
            Variant::String(_) => VariantType::String,
            Variant::StringName(_) => VariantType::StringName,
            Variant::NodePath(_) => VariantType::NodePath,
            Variant::Object(_) => VariantType::Object,
            Variant::Array(_) => VariantType::Array,
            Variant::Dictionary(_) => VariantType::Dictionary,
            Variant::Signal { .. } => VariantType::Signal,
            Variant::Callable { .. } => VariantType::Callable,
            Variant::Compound { ty, .. } => *ty,
        }
    }

    /// Build a compound value.
    pub fn compound(ty: VariantType, fields: Vec<Variant>) -> Self {
        Variant::Compound { ty, fields }
    }

    /// Integer payload, if any. Bools count as integers.
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Variant::Int(v) => Some(*v),
            Variant::Bool(b) => Some(i64::from(*b)),
            _ => None,
        }
    }

    /// Float payload, widening integers.
    pub fn as_float(&self) -> Option<f64> {
        match self {
            Variant::Float(v) => Some(*v),
            Variant::Int(v) => Some(*v as f64),
            _ => None,
        }
    }

    /// Text payload of the string-like kinds.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Variant::String(s) | Variant::StringName(s) | Variant::NodePath(s) => Some(s),
            _ => None,
        }
    }

    /// Object identity, if this is a non-null object.
    pub fn as_object(&self) -> Option<ObjectId> {
        match self {
            Variant::Object(id) => *id,
            _ => None,
        }
    }

    /// True for `Nil` and null objects.
    pub fn is_nil(&self) -> bool {
        matches!(self, Variant::Nil | Variant::Object(None))
    }
}

impl From<bool> for Variant {
    fn from(v: bool) -> Self {
        Variant::Bool(v)
    }
}

impl From<i64> for Variant {
    fn from(v: i64) -> Self {
        Variant::Int(v)
    }
}

impl From<f64> for Variant {
    fn from(v: f64) -> Self {
        Variant::Float(v)
    }
}

impl From<&str> for Variant {
    fn from(v: &str) -> Self {
        Variant::String(v.to_string())
    }
}

impl From<String> for Variant {
    fn from(v: String) -> Self {
        Variant::String(v)
    }
}

// ============================================================================
// Operators
// ============================================================================

/// Host operator codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VariantOperator {
    Equal,
    NotEqual,
    Less,
    LessEqual,
    Greater,
    GreaterEqual,
    Add,
    Subtract,
    Multiply,
    Divide,
    Negate,
    Positive,
    Module,
    Power,
    ShiftLeft,
    ShiftRight,
    BitAnd,
    BitOr,
    BitXor,
    BitNegate,
    And,
    Or,
    Xor,
    Not,
    In,
}

impl VariantOperator {
    /// Map an IDL operator name to the host code.
    pub fn from_symbol(symbol: &str) -> Option<Self> {
        Some(match symbol {
            "==" => VariantOperator::Equal,
            "!=" => VariantOperator::NotEqual,
            "<" => VariantOperator::Less,
            "<=" => VariantOperator::LessEqual,
            ">" => VariantOperator::Greater,
            ">=" => VariantOperator::GreaterEqual,
            "+" => VariantOperator::Add,
            "-" => VariantOperator::Subtract,
            "*" => VariantOperator::Multiply,
            "/" => VariantOperator::Divide,
            "unary-" => VariantOperator::Negate,
            "unary+" => VariantOperator::Positive,
            "%" => VariantOperator::Module,
            "**" => VariantOperator::Power,
            "<<" => VariantOperator::ShiftLeft,
            ">>" => VariantOperator::ShiftRight,
            "&" => VariantOperator::BitAnd,
            "|" => VariantOperator::BitOr,
            "^" => VariantOperator::BitXor,
            "~" => VariantOperator::BitNegate,
            "and" => VariantOperator::And,
            "or" => VariantOperator::Or,
            "xor" => VariantOperator::Xor,
            "not" => VariantOperator::Not,
            "in" => VariantOperator::In,
            _ => return None,
        })
    }

    /// The IDL spelling of this operator.
    pub fn symbol(self) -> &'static str {
        match self {
            VariantOperator::Equal => "==",
            VariantOperator::NotEqual => "!=",
            VariantOperator::Less => "<",
            VariantOperator::LessEqual => "<=",
            VariantOperator::Greater => ">",
            VariantOperator::GreaterEqual => ">=",
            VariantOperator::Add => "+",
            VariantOperator::Subtract => "-",
            VariantOperator::Multiply => "*",
            VariantOperator::Divide => "/",
            VariantOperator::Negate => "unary-",
            VariantOperator::Positive => "unary+",
            VariantOperator::Module => "%",
            VariantOperator::Power => "**",
            VariantOperator::ShiftLeft => "<<",
            VariantOperator::ShiftRight => ">>",
            VariantOperator::BitAnd => "&",
            VariantOperator::BitOr => "|",
            VariantOperator::BitXor => "^",
            VariantOperator::BitNegate => "~",
            VariantOperator::And => "and",
            VariantOperator::Or => "or",
            VariantOperator::Xor => "xor",
            VariantOperator::Not => "not",
            VariantOperator::In => "in",
        }
    }

    /// True for operators taking a single operand.
    pub fn is_unary(self) -> bool {
        matches!(
            self,
            VariantOperator::Negate
                | VariantOperator::Positive
                | VariantOperator::BitNegate
                | VariantOperator::Not
        )
    }
}

impl fmt::Display for VariantOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_variant_type_names_round_trip() {
        for ty in VariantType::all() {
            assert_eq!(VariantType::from_name(ty.name()), Some(*ty));
        }
        assert_eq!(VariantType::from_name("Variant"), None);
    }

    #[test]
    fn test_operator_symbols() {
        assert_eq!(VariantOperator::from_symbol("unary-"), Some(VariantOperator::Negate));
        assert_eq!(VariantOperator::from_symbol("in"), Some(VariantOperator::In));
        assert!(VariantOperator::from_symbol("=>").is_none());
        assert!(VariantOperator::BitNegate.is_unary());
        assert!(!VariantOperator::Add.is_unary());
    }

    #[test]
    fn test_variant_accessors() {
        assert_eq!(Variant::Bool(true).as_int(), Some(1));
        assert_eq!(Variant::Int(3).as_float(), Some(3.0));
        assert_eq!(Variant::StringName("a".into()).as_str(), Some("a"));
        assert!(Variant::Object(None).is_nil());
        assert_eq!(
            Variant::compound(VariantType::Vector2, vec![]).variant_type(),
            VariantType::Vector2
        );
    }
}
