//! Typed views over IDL records
//!
//! Every record tolerates missing optional keys and ignores unknown ones.

use serde::Deserialize;

/// A method or function argument.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct ArgumentRecord {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: String,
    pub meta: Option<String>,
    pub default_value: Option<String>,
}

/// Return value of an object method.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct ReturnValueRecord {
    #[serde(rename = "type")]
    pub ty: String,
    pub meta: Option<String>,
}

/// A method of a class or value type, or a utility function.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct MethodRecord {
    pub name: String,
    pub is_const: bool,
    pub is_static: bool,
    pub is_vararg: bool,
    pub is_virtual: bool,
    pub hash: Option<u64>,
    /// Object methods
    pub return_value: Option<ReturnValueRecord>,
    /// Value-type methods and utility functions
    pub return_type: Option<String>,
    pub arguments: Vec<ArgumentRecord>,
    pub category: Option<String>,
    pub description: Option<String>,
}

impl MethodRecord {
    /// Declared return type string, `"void"` when absent.
    pub fn return_type_string(&self) -> &str {
        self.return_value
            .as_ref()
            .map(|r| r.ty.as_str())
            .or(self.return_type.as_deref())
            .unwrap_or("void")
    }
}

/// One enum value.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct EnumValueRecord {
    pub name: String,
    pub value: i64,
    pub description: Option<String>,
}

/// A global or class enum.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct EnumRecord {
    pub name: String,
    pub is_bitfield: bool,
    pub values: Vec<EnumValueRecord>,
}

/// A class constant (integer) or value-type constant (literal text).
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct ConstantRecord {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: Option<String>,
    pub value: serde_json::Value,
}

/// An object-class property.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct PropertyRecord {
    #[serde(rename = "type")]
    pub ty: String,
    pub name: String,
    pub setter: Option<String>,
    pub getter: Option<String>,
    pub index: Option<i64>,
}

/// A signal.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct SignalRecord {
    pub name: String,
    pub arguments: Vec<ArgumentRecord>,
}

/// An object class.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct ClassRecord {
    pub name: String,
    pub inherits: Option<String>,
    pub is_refcounted: bool,
    pub is_instantiable: bool,
    pub api_type: Option<String>,
    pub constants: Vec<ConstantRecord>,
    pub enums: Vec<EnumRecord>,
    pub methods: Vec<MethodRecord>,
    pub properties: Vec<PropertyRecord>,
    pub signals: Vec<SignalRecord>,
    pub description: Option<String>,
}

/// A value-type member (component).
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct MemberRecord {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: String,
}

/// A value-type operator.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct OperatorRecord {
    pub name: String,
    pub right_type: Option<String>,
    pub return_type: String,
}

/// A value-type constructor overload.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct ConstructorRecord {
    pub index: usize,
    pub arguments: Vec<ArgumentRecord>,
}

/// A value type.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct BuiltinClassRecord {
    pub name: String,
    pub indexing_return_type: Option<String>,
    pub is_keyed: bool,
    pub members: Vec<MemberRecord>,
    pub constants: Vec<ConstantRecord>,
    pub enums: Vec<EnumRecord>,
    pub operators: Vec<OperatorRecord>,
    pub methods: Vec<MethodRecord>,
    pub constructors: Vec<ConstructorRecord>,
    pub has_destructor: bool,
    pub description: Option<String>,
}

/// A singleton declaration.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct SingletonRecord {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: String,
}
