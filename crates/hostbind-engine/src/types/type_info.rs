//! Type descriptors shared by the binders and the registration layer
//!
//! A `TypeInfo` can be built from an IDL type-string, from a property
//! descriptor, or from a runtime type record; the three agree for the same
//! logical type, and projecting back to a property descriptor round-trips.

use std::fmt;

use hostbind_sdk::{PropertyHint, PropertyInfo, PropertyUsage, VariantType};

use crate::error::{BindError, BindResult};

/// What a bare name in a type-string refers to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NamedType {
    Void,
    Dynamic,
    Builtin(VariantType),
    Enum { qualified: String, bitfield: bool },
    Class(String),
    Script { native_base: String, user_type: String },
}

/// Resolves bare names for the type-string parser.
pub trait NameLookup {
    fn lookup_name(&self, name: &str) -> Option<NamedType>;
}

/// Variant tag of a [`TypeInfo`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeInfoKind {
    Void,
    Dynamic,
    Builtin,
    Enum,
    Bitfield,
    Array,
    Object,
    Script,
    Pointer,
    Union,
}

/// A language-native value kind that converts implicitly into a host type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NativeKind {
    Int,
    Str,
    List,
}

/// A resolved type.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TypeInfo {
    /// No value
    Void,
    /// Any value
    Dynamic,
    /// A plain value type
    Builtin(VariantType),
    /// Enum, by qualified name
    Enum(String),
    /// Bitfield, by qualified name
    Bitfield(String),
    /// Array; `None` element means fully dynamic
    Array(Option<Box<TypeInfo>>),
    /// Host object class
    Object(String),
    /// User class attached on top of a native base
    Script {
        native_base: String,
        user_type: String,
    },
    /// Raw pointer, pointee name empty for `void*`
    Pointer(String),
    /// One of several object classes
    Union(Vec<TypeInfo>),
}

impl TypeInfo {
    /// Typed array of `element`.
    pub fn array_of(element: TypeInfo) -> Self {
        TypeInfo::Array(Some(Box::new(element)))
    }

    pub fn kind(&self) -> TypeInfoKind {
        match self {
            TypeInfo::Void => TypeInfoKind::Void,
            TypeInfo::Dynamic => TypeInfoKind::Dynamic,
            TypeInfo::Builtin(_) => TypeInfoKind::Builtin,
            TypeInfo::Enum(_) => TypeInfoKind::Enum,
            TypeInfo::Bitfield(_) => TypeInfoKind::Bitfield,
            TypeInfo::Array(_) => TypeInfoKind::Array,
            TypeInfo::Object(_) => TypeInfoKind::Object,
            TypeInfo::Script { .. } => TypeInfoKind::Script,
            TypeInfo::Pointer(_) => TypeInfoKind::Pointer,
            TypeInfo::Union(_) => TypeInfoKind::Union,
        }
    }

    /// Canonical text form. Parses back to an equal `TypeInfo`.
    pub fn canonical(&self) -> String {
        self.to_string()
    }

    /// The host value kind that carries this type.
    pub fn variant_type(&self) -> VariantType {
        match self {
            TypeInfo::Void | TypeInfo::Dynamic => VariantType::Nil,
            TypeInfo::Builtin(ty) => *ty,
            TypeInfo::Enum(_) | TypeInfo::Bitfield(_) | TypeInfo::Pointer(_) => VariantType::Int,
            TypeInfo::Array(_) => VariantType::Array,
            TypeInfo::Object(_) | TypeInfo::Script { .. } | TypeInfo::Union(_) => {
                VariantType::Object
            }
        }
    }

    /// The native kind accepted in place of this type, if any.
    pub fn implicit_source(&self) -> Option<NativeKind> {
        match self {
            TypeInfo::Builtin(VariantType::String)
            | TypeInfo::Builtin(VariantType::StringName)
            | TypeInfo::Builtin(VariantType::NodePath) => Some(NativeKind::Str),
            TypeInfo::Builtin(VariantType::Float) => Some(NativeKind::Int),
            TypeInfo::Enum(_) | TypeInfo::Bitfield(_) => Some(NativeKind::Int),
            TypeInfo::Array(_) => Some(NativeKind::List),
            _ => None,
        }
    }

    /// Element type of a typed array.
    pub fn element(&self) -> Option<&TypeInfo> {
        match self {
            TypeInfo::Array(Some(element)) => Some(element),
            _ => None,
        }
    }

    /// True when values of this type are host objects.
    pub fn is_object_like(&self) -> bool {
        matches!(
            self,
            TypeInfo::Object(_) | TypeInfo::Script { .. } | TypeInfo::Union(_)
        )
    }

    /// Project into a property descriptor named `name`.
    pub fn property_info(&self, name: &str) -> PropertyInfo {
        let info = PropertyInfo::new(self.variant_type(), name);
        match self {
            TypeInfo::Void | TypeInfo::Builtin(_) => info,
            TypeInfo::Dynamic => {
                info.with_usage(PropertyUsage::DEFAULT | PropertyUsage::NIL_IS_VARIANT)
            }
            TypeInfo::Enum(class) => info
                .with_class_name(class.as_str())
                .with_usage(PropertyUsage::DEFAULT | PropertyUsage::CLASS_IS_ENUM),
            TypeInfo::Bitfield(class) => info
                .with_class_name(class.as_str())
                .with_usage(PropertyUsage::DEFAULT | PropertyUsage::CLASS_IS_BITFIELD),
            TypeInfo::Array(None) => info,
            TypeInfo::Array(Some(element)) => {
                info.with_hint(PropertyHint::ArrayType, element.canonical())
            }
            TypeInfo::Object(class) => info.with_class_name(class.as_str()),
            TypeInfo::Script {
                native_base,
                user_type,
            } => info
                .with_class_name(native_base.as_str())
                .with_hint(PropertyHint::None, user_type.as_str()),
            TypeInfo::Pointer(pointee) => info.with_hint(PropertyHint::IntIsPointer, pointee.as_str()),
            TypeInfo::Union(members) => {
                let joined = members
                    .iter()
                    .map(TypeInfo::canonical)
                    .collect::<Vec<_>>()
                    .join(",");
                info.with_hint(PropertyHint::ResourceType, joined)
            }
        }
    }

    // ========================================================================
    // Construction
    // ========================================================================

    /// Parse an IDL type-string.
    pub fn from_type_string(text: &str, names: &dyn NameLookup) -> BindResult<TypeInfo> {
        let text = text.trim();
        if text.is_empty() || text == "void" {
            return Ok(TypeInfo::Void);
        }
        if text == "Variant" {
            return Ok(TypeInfo::Dynamic);
        }
        if text.contains(',') {
            let members = text
                .split(',')
                .map(|part| TypeInfo::from_type_string(part, names))
                .collect::<BindResult<Vec<_>>>()?;
            return Ok(TypeInfo::Union(members));
        }
        if let Some(name) = text.strip_prefix("enum::") {
            return match names.lookup_name(name) {
                Some(NamedType::Enum { qualified, .. }) => Ok(TypeInfo::Enum(qualified)),
                _ => Err(BindError::UnknownType(text.to_string())),
            };
        }
        if let Some(name) = text.strip_prefix("bitfield::") {
            return match names.lookup_name(name) {
                Some(NamedType::Enum { qualified, .. }) => Ok(TypeInfo::Bitfield(qualified)),
                _ => Err(BindError::UnknownType(text.to_string())),
            };
        }
        if let Some(rest) = text.strip_prefix("typedarray::") {
            let element = rest.rsplit(':').next().unwrap_or(rest);
            return Ok(TypeInfo::array_of(TypeInfo::from_type_string(element, names)?));
        }
        if let Some(inner) = text
            .strip_prefix("Array[")
            .and_then(|rest| rest.strip_suffix(']'))
        {
            return Ok(TypeInfo::array_of(TypeInfo::from_type_string(inner, names)?));
        }
        if let Some(pointee) = text.strip_suffix('*') {
            let pointee = pointee.trim().trim_start_matches("const ").trim();
            let pointee = if pointee == "void" { "" } else { pointee };
            return Ok(TypeInfo::Pointer(pointee.to_string()));
        }
        if text == "Array" {
            return Ok(TypeInfo::Array(None));
        }
        match names.lookup_name(text) {
            Some(named) => Ok(TypeInfo::from_named(named)),
            None => Err(BindError::UnknownType(text.to_string())),
        }
    }

    /// Interpret a property descriptor, most specific reading first.
    pub fn from_property_info(info: &PropertyInfo, names: &dyn NameLookup) -> BindResult<TypeInfo> {
        if info.ty == VariantType::Object && info.hint == PropertyHint::ResourceType {
            let mut members = info
                .hint_string
                .split(',')
                .filter(|part| !part.trim().is_empty())
                .map(|part| TypeInfo::from_type_string(part, names))
                .collect::<BindResult<Vec<_>>>()?;
            return Ok(match members.len() {
                0 => TypeInfo::Object(object_class_or_root(&info.class_name)),
                1 => members.remove(0),
                _ => TypeInfo::Union(members),
            });
        }
        if info.hint == PropertyHint::IntIsPointer {
            return Ok(TypeInfo::Pointer(info.hint_string.clone()));
        }
        if info.ty == VariantType::Array {
            if info.hint == PropertyHint::ArrayType && !info.hint_string.is_empty() {
                let element = TypeInfo::from_type_string(&info.hint_string, names)?;
                return Ok(TypeInfo::array_of(element));
            }
            return Ok(TypeInfo::Array(None));
        }
        if info.usage.contains(PropertyUsage::CLASS_IS_ENUM) {
            return Ok(TypeInfo::Enum(info.class_name.clone()));
        }
        if info.usage.contains(PropertyUsage::CLASS_IS_BITFIELD) {
            return Ok(TypeInfo::Bitfield(info.class_name.clone()));
        }
        if info.ty == VariantType::Object {
            if !info.hint_string.is_empty() && info.hint == PropertyHint::None {
                return Ok(TypeInfo::Script {
                    native_base: object_class_or_root(&info.class_name),
                    user_type: info.hint_string.clone(),
                });
            }
            return Ok(TypeInfo::Object(object_class_or_root(&info.class_name)));
        }
        if info.ty == VariantType::Nil {
            if info.usage.contains(PropertyUsage::NIL_IS_VARIANT) {
                return Ok(TypeInfo::Dynamic);
            }
            return Ok(TypeInfo::Void);
        }
        Ok(TypeInfo::Builtin(info.ty))
    }

    /// Build from a resolved name.
    pub fn from_named(named: NamedType) -> TypeInfo {
        match named {
            NamedType::Void => TypeInfo::Void,
            NamedType::Dynamic => TypeInfo::Dynamic,
            NamedType::Builtin(VariantType::Array) => TypeInfo::Array(None),
            NamedType::Builtin(VariantType::Nil) => TypeInfo::Void,
            NamedType::Builtin(ty) => TypeInfo::Builtin(ty),
            NamedType::Enum {
                qualified,
                bitfield: false,
            } => TypeInfo::Enum(qualified),
            NamedType::Enum {
                qualified,
                bitfield: true,
            } => TypeInfo::Bitfield(qualified),
            NamedType::Class(name) => TypeInfo::Object(name),
            NamedType::Script {
                native_base,
                user_type,
            } => TypeInfo::Script {
                native_base,
                user_type,
            },
        }
    }
}

fn object_class_or_root(class_name: &str) -> String {
    if class_name.is_empty() {
        "Object".to_string()
    } else {
        class_name.to_string()
    }
}

impl fmt::Display for TypeInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeInfo::Void => f.write_str("void"),
            TypeInfo::Dynamic => f.write_str("Variant"),
            TypeInfo::Builtin(ty) => f.write_str(ty.name()),
            TypeInfo::Enum(name) => write!(f, "enum::{}", name),
            TypeInfo::Bitfield(name) => write!(f, "bitfield::{}", name),
            TypeInfo::Array(None) => f.write_str("Array"),
            TypeInfo::Array(Some(element)) => write!(f, "Array[{}]", element),
            TypeInfo::Object(name) => f.write_str(name),
            TypeInfo::Script { user_type, .. } => f.write_str(user_type),
            TypeInfo::Pointer(pointee) if pointee.is_empty() => f.write_str("void*"),
            TypeInfo::Pointer(pointee) => write!(f, "{}*", pointee),
            TypeInfo::Union(members) => {
                for (i, member) in members.iter().enumerate() {
                    if i > 0 {
                        f.write_str(",")?;
                    }
                    write!(f, "{}", member)?;
                }
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Names;

    impl NameLookup for Names {
        fn lookup_name(&self, name: &str) -> Option<NamedType> {
            if let Some(ty) = VariantType::from_name(name) {
                return Some(NamedType::Builtin(ty));
            }
            match name {
                "Foo" => Some(NamedType::Enum {
                    qualified: "Foo".into(),
                    bitfield: false,
                }),
                "Bar" | "Node.Flags" => Some(NamedType::Enum {
                    qualified: name.into(),
                    bitfield: true,
                }),
                "Baz" | "Node" | "Texture" | "Mesh" => Some(NamedType::Class(name.into())),
                "Player" => Some(NamedType::Script {
                    native_base: "Node".into(),
                    user_type: "Player".into(),
                }),
                _ => None,
            }
        }
    }

    fn parse(text: &str) -> TypeInfo {
        TypeInfo::from_type_string(text, &Names).unwrap()
    }

    #[test]
    fn test_grammar() {
        assert_eq!(parse("void"), TypeInfo::Void);
        assert_eq!(parse("Variant"), TypeInfo::Dynamic);
        assert_eq!(parse("int"), TypeInfo::Builtin(VariantType::Int));
        assert_eq!(parse("enum::Foo"), TypeInfo::Enum("Foo".into()));
        assert_eq!(parse("bitfield::Node.Flags"), TypeInfo::Bitfield("Node.Flags".into()));
        assert_eq!(
            parse("typedarray::24/17:Baz"),
            TypeInfo::array_of(TypeInfo::Object("Baz".into()))
        );
        assert_eq!(parse("const void*"), TypeInfo::Pointer(String::new()));
        assert_eq!(parse("Obj*"), TypeInfo::Pointer("Obj".into()));
        assert_eq!(
            parse("Texture,Mesh"),
            TypeInfo::Union(vec![
                TypeInfo::Object("Texture".into()),
                TypeInfo::Object("Mesh".into())
            ])
        );
        assert_eq!(parse("Array"), TypeInfo::Array(None));
        assert!(TypeInfo::from_type_string("Nope", &Names).is_err());
        assert!(TypeInfo::from_type_string("enum::Nope", &Names).is_err());
    }

    #[test]
    fn test_canonical_reparses() {
        for text in [
            "int",
            "enum::Foo",
            "bitfield::Bar",
            "typedarray::Baz",
            "Obj*",
            "void*",
            "Texture,Mesh",
            "Array",
            "Variant",
            "Player",
        ] {
            let info = parse(text);
            assert_eq!(parse(&info.canonical()), info, "{}", text);
        }
    }

    #[test]
    fn test_property_projection_round_trip() {
        for text in [
            "int",
            "float",
            "String",
            "enum::Foo",
            "bitfield::Bar",
            "typedarray::Baz",
            "Obj*",
            "void",
            "Variant",
            "Array",
            "Node",
            "Player",
            "Texture,Mesh",
        ] {
            let info = parse(text);
            let projected = info.property_info("p");
            let back = TypeInfo::from_property_info(&projected, &Names).unwrap();
            assert_eq!(back.canonical(), info.canonical(), "{}", text);
            assert_eq!(back.kind(), info.kind(), "{}", text);
        }
    }

    #[test]
    fn test_implicit_sources() {
        assert_eq!(parse("String").implicit_source(), Some(NativeKind::Str));
        assert_eq!(parse("StringName").implicit_source(), Some(NativeKind::Str));
        assert_eq!(parse("float").implicit_source(), Some(NativeKind::Int));
        assert_eq!(parse("Array").implicit_source(), Some(NativeKind::List));
        assert_eq!(parse("Node").implicit_source(), None);
    }

    #[test]
    fn test_resolved_host_type() {
        assert_eq!(parse("enum::Foo").variant_type(), VariantType::Int);
        assert_eq!(parse("Obj*").variant_type(), VariantType::Int);
        assert_eq!(parse("Player").variant_type(), VariantType::Object);
        assert_eq!(parse("typedarray::Baz").variant_type(), VariantType::Array);
    }
}
