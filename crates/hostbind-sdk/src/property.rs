//! Property, method and class descriptors exchanged with the host

use bitflags::bitflags;

use crate::variant::{Variant, VariantType};

/// Editor hint attached to a property.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum PropertyHint {
    #[default]
    None,
    Range,
    Enum,
    Flags,
    ResourceType,
    ArrayType,
    IntIsPointer,
    TypeString,
}

bitflags! {
    /// How a property is used by the host.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct PropertyUsage: u32 {
        const NONE = 0;
        const STORAGE = 1 << 1;
        const EDITOR = 1 << 2;
        const INTERNAL = 1 << 3;
        const GROUP = 1 << 6;
        const CATEGORY = 1 << 7;
        const SUBGROUP = 1 << 8;
        const SCRIPT_VARIABLE = 1 << 12;
        const CLASS_IS_ENUM = 1 << 16;
        const NIL_IS_VARIANT = 1 << 17;
        const CLASS_IS_BITFIELD = 1 << 19;
        const DEFAULT = Self::STORAGE.bits() | Self::EDITOR.bits();
    }
}

impl Default for PropertyUsage {
    fn default() -> Self {
        PropertyUsage::DEFAULT
    }
}

/// A property descriptor.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PropertyInfo {
    /// Host kind of the value
    pub ty: VariantType,
    /// Property name
    pub name: String,
    /// Class name for objects, enums and bitfields
    pub class_name: String,
    /// Editor hint
    pub hint: PropertyHint,
    /// Hint payload (element type, pointee, union members, ...)
    pub hint_string: String,
    /// Usage flags
    pub usage: PropertyUsage,
}

impl PropertyInfo {
    /// Create a descriptor with default usage and no hint.
    pub fn new(ty: VariantType, name: impl Into<String>) -> Self {
        Self {
            ty,
            name: name.into(),
            ..Default::default()
        }
    }

    /// Set the class name.
    pub fn with_class_name(mut self, class_name: impl Into<String>) -> Self {
        self.class_name = class_name.into();
        self
    }

    /// Set the hint and its payload.
    pub fn with_hint(mut self, hint: PropertyHint, hint_string: impl Into<String>) -> Self {
        self.hint = hint;
        self.hint_string = hint_string.into();
        self
    }

    /// Replace the usage flags.
    pub fn with_usage(mut self, usage: PropertyUsage) -> Self {
        self.usage = usage;
        self
    }

    /// Rename the descriptor, keeping its type.
    pub fn renamed(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Group and subgroup separators carry no value.
    pub fn is_group_entry(&self) -> bool {
        self.usage
            .intersects(PropertyUsage::GROUP | PropertyUsage::SUBGROUP | PropertyUsage::CATEGORY)
    }
}

bitflags! {
    /// Method flags published with a method.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct MethodFlags: u32 {
        const NORMAL = 1;
        const EDITOR = 1 << 1;
        const CONST = 1 << 2;
        const VIRTUAL = 1 << 3;
        const VARARG = 1 << 4;
        const STATIC = 1 << 5;
    }
}

impl Default for MethodFlags {
    fn default() -> Self {
        MethodFlags::NORMAL
    }
}

/// A method as published to the host class database.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ClassMethodInfo {
    pub name: String,
    pub flags: MethodFlags,
    pub arguments: Vec<PropertyInfo>,
    pub return_value: Option<PropertyInfo>,
    pub default_arguments: Vec<Variant>,
}

impl ClassMethodInfo {
    /// Number of arguments the host must pass at minimum.
    pub fn required_arguments(&self) -> usize {
        self.arguments.len().saturating_sub(self.default_arguments.len())
    }
}

/// Creation parameters for a registered class.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ClassCreationInfo {
    /// Class cannot be instantiated directly by the host
    pub is_abstract: bool,
    /// Class is exposed to the host's editor
    pub is_exposed: bool,
    /// Class only runs inside the editor when it is a tool
    pub is_virtual: bool,
    /// Identifies the runtime type that handles instances of this class
    pub class_userdata: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_property_builder() {
        let info = PropertyInfo::new(VariantType::Array, "items")
            .with_hint(PropertyHint::ArrayType, "int")
            .with_usage(PropertyUsage::DEFAULT | PropertyUsage::SCRIPT_VARIABLE);
        assert_eq!(info.hint_string, "int");
        assert!(info.usage.contains(PropertyUsage::STORAGE));
        assert!(!info.is_group_entry());
    }

    #[test]
    fn test_required_arguments() {
        let info = ClassMethodInfo {
            name: "f".into(),
            arguments: vec![
                PropertyInfo::new(VariantType::Int, "a"),
                PropertyInfo::new(VariantType::Int, "b"),
            ],
            default_arguments: vec![Variant::Int(1)],
            ..Default::default()
        };
        assert_eq!(info.required_arguments(), 1);
    }
}
