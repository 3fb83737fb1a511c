//! Argument descriptors and method signatures

use hostbind_sdk::{ClassMethodInfo, MethodFlags, PropertyInfo};

use crate::error::BindResult;
use crate::runtime::{Runtime, Value};
use crate::types::{NativeKind, TypeInfo};

/// Words the embedded language reserves. Argument names colliding with one
/// get a trailing underscore.
pub const RESERVED_WORDS: &[&str] = &[
    "False", "None", "True", "and", "as", "assert", "async", "await", "break", "class",
    "continue", "def", "del", "elif", "else", "except", "finally", "for", "from", "global", "if",
    "import", "in", "is", "lambda", "nonlocal", "not", "or", "pass", "raise", "return", "try",
    "while", "with", "yield",
];

/// `name`, or `name_` when it is reserved.
pub fn safe_argument_name(name: &str, is_reserved: impl Fn(&str) -> bool) -> String {
    if is_reserved(name) {
        format!("{}_", name)
    } else {
        name.to_string()
    }
}

/// One declared parameter.
#[derive(Debug, Clone)]
pub struct ArgumentDescriptor {
    pub name: String,
    pub declared: TypeInfo,
    /// Native kind accepted through an implicit conversion
    pub relaxed: Option<NativeKind>,
    pub default: Option<Value>,
}

impl ArgumentDescriptor {
    pub fn new(name: impl Into<String>, declared: TypeInfo) -> Self {
        let relaxed = declared.implicit_source();
        Self {
            name: name.into(),
            declared,
            relaxed,
            default: None,
        }
    }

    pub fn with_default(mut self, default: Value) -> Self {
        self.default = Some(default);
        self
    }

    pub fn property_info(&self) -> PropertyInfo {
        self.declared.property_info(&self.name)
    }
}

/// Declared shape of a callable.
#[derive(Debug, Clone)]
pub struct MethodSignature {
    pub arguments: Vec<ArgumentDescriptor>,
    pub vararg: bool,
    pub return_type: TypeInfo,
    pub flags: MethodFlags,
}

impl MethodSignature {
    pub fn new(arguments: Vec<ArgumentDescriptor>, return_type: TypeInfo) -> Self {
        Self {
            arguments,
            vararg: false,
            return_type,
            flags: MethodFlags::NORMAL,
        }
    }

    pub fn with_flags(mut self, flags: MethodFlags) -> Self {
        self.vararg = flags.contains(MethodFlags::VARARG);
        self.flags = flags;
        self
    }

    pub fn is_static(&self) -> bool {
        self.flags.contains(MethodFlags::STATIC)
    }

    pub fn is_const(&self) -> bool {
        self.flags.contains(MethodFlags::CONST)
    }

    pub fn is_virtual(&self) -> bool {
        self.flags.contains(MethodFlags::VIRTUAL)
    }

    /// Number of leading arguments without a default.
    pub fn required(&self) -> usize {
        self.arguments
            .iter()
            .take_while(|arg| arg.default.is_none())
            .count()
    }

    /// Parameter pattern as shown in overload errors, e.g. `(int, float)`.
    pub fn shape(&self) -> String {
        let mut parts: Vec<String> = self
            .arguments
            .iter()
            .map(|arg| arg.declared.canonical())
            .collect();
        if self.vararg {
            parts.push("...".to_string());
        }
        format!("({})", parts.join(", "))
    }

    /// Descriptor published to the host class database.
    pub fn method_info(&self, rt: &Runtime, name: &str) -> BindResult<ClassMethodInfo> {
        let default_arguments = self
            .arguments
            .iter()
            .filter_map(|arg| arg.default.as_ref().map(|value| (arg, value)))
            .map(|(arg, value)| rt.to_variant_as(value, &arg.declared))
            .collect::<BindResult<Vec<_>>>()?;
        let return_value = match self.return_type {
            TypeInfo::Void => None,
            ref ty => Some(ty.property_info("")),
        };
        Ok(ClassMethodInfo {
            name: name.to_string(),
            flags: self.flags,
            arguments: self
                .arguments
                .iter()
                .map(ArgumentDescriptor::property_info)
                .collect(),
            return_value,
            default_arguments,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hostbind_sdk::VariantType;

    #[test]
    fn test_reserved_names() {
        let reserved = |word: &str| RESERVED_WORDS.contains(&word);
        assert_eq!(safe_argument_name("in", reserved), "in_");
        assert_eq!(safe_argument_name("from", reserved), "from_");
        assert_eq!(safe_argument_name("offset", reserved), "offset");
    }

    #[test]
    fn test_required_and_shape() {
        let sig = MethodSignature::new(
            vec![
                ArgumentDescriptor::new("a", TypeInfo::Builtin(VariantType::Int)),
                ArgumentDescriptor::new("b", TypeInfo::Builtin(VariantType::Float))
                    .with_default(Value::Float(1.0)),
            ],
            TypeInfo::Void,
        );
        assert_eq!(sig.required(), 1);
        assert_eq!(sig.shape(), "(int, float)");
        let vararg = sig.with_flags(MethodFlags::VARARG);
        assert!(vararg.vararg);
        assert_eq!(vararg.shape(), "(int, float, ...)");
    }

    #[test]
    fn test_relaxed_kind() {
        let arg = ArgumentDescriptor::new("name", TypeInfo::Builtin(VariantType::StringName));
        assert_eq!(arg.relaxed, Some(NativeKind::Str));
    }
}
