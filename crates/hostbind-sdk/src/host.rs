//! HostInterface trait: everything the binding engine asks of the host
//!
//! The engine programs against this trait only. A real host implements it on
//! top of its extension ABI; `MemoryHost` implements it in-process.

use crate::error::HostResult;
use crate::handle::{
    BuiltinMethodFn, ConstructorFn, IndexedGetFn, IndexedSetFn, KeyedGetFn, KeyedSetFn,
    MemberGetFn, MemberSetFn, MethodBindFn, OperatorFn, UtilityFn,
};
use crate::property::{ClassCreationInfo, ClassMethodInfo, PropertyInfo};
use crate::variant::{ObjectId, Variant, VariantOperator, VariantType};

/// Abstract host runtime.
///
/// Lookups return `None` when the host has no handle for the key; the engine
/// decides whether that is fatal. Registration calls mirror the host's class
/// database operations one to one.
pub trait HostInterface {
    // ========================================================================
    // Native handle lookup
    // ========================================================================

    /// Free function by name and call key
    fn utility_function(&self, name: &str, hash: u64) -> Option<UtilityFn>;

    /// Value-type method by type, name and call key
    fn builtin_method(&self, ty: VariantType, name: &str, hash: u64) -> Option<BuiltinMethodFn>;

    /// Object method by class, name and call key
    fn method_bind(&self, class: &str, name: &str, hash: u64) -> Option<MethodBindFn>;

    /// Value-type constructor overload by position
    fn constructor(&self, ty: VariantType, index: usize) -> Option<ConstructorFn>;

    /// Operator evaluator. `right` is `Nil` for unary operators.
    fn operator_evaluator(
        &self,
        op: VariantOperator,
        left: VariantType,
        right: VariantType,
    ) -> Option<OperatorFn>;

    /// Member getter of a value type
    fn member_getter(&self, ty: VariantType, member: &str) -> Option<MemberGetFn>;

    /// Member setter of a value type
    fn member_setter(&self, ty: VariantType, member: &str) -> Option<MemberSetFn>;

    /// Positional element getter
    fn indexed_getter(&self, ty: VariantType) -> Option<IndexedGetFn>;

    /// Positional element setter
    fn indexed_setter(&self, ty: VariantType) -> Option<IndexedSetFn>;

    /// Keyed element getter
    fn keyed_getter(&self, ty: VariantType) -> Option<KeyedGetFn>;

    /// Keyed element setter
    fn keyed_setter(&self, ty: VariantType) -> Option<KeyedSetFn>;

    // ========================================================================
    // Objects
    // ========================================================================

    /// Construct a new host object of the given class
    fn construct_object(&self, class: &str) -> HostResult<ObjectId>;

    /// Destroy a host object
    fn destroy_object(&self, id: ObjectId) -> HostResult<()>;

    /// Most-derived class name of a live object
    fn object_class(&self, id: ObjectId) -> Option<String>;

    /// Host-side property list of a live object
    fn object_property_list(&self, id: ObjectId) -> Vec<PropertyInfo>;

    /// Live singleton instance, `None` if not yet registered
    fn singleton(&self, name: &str) -> Option<ObjectId>;

    // ========================================================================
    // Misc
    // ========================================================================

    /// Host string conversion of a value
    fn stringify(&self, value: &Variant) -> String;

    /// Report an error through the host's error channel
    fn print_error(&self, message: &str);

    // ========================================================================
    // Class database
    // ========================================================================

    /// Register a class
    fn register_class(&self, name: &str, parent: &str, info: ClassCreationInfo) -> HostResult<()>;

    /// Remove a previously registered class
    fn unregister_class(&self, name: &str) -> HostResult<()>;

    /// Register a method
    fn register_method(&self, class: &str, info: ClassMethodInfo) -> HostResult<()>;

    /// Register a property with its accessor method names (empty for none)
    fn register_property(
        &self,
        class: &str,
        info: PropertyInfo,
        setter: &str,
        getter: &str,
    ) -> HostResult<()>;

    /// Open a property group
    fn register_property_group(&self, class: &str, name: &str, prefix: &str) -> HostResult<()>;

    /// Open a property subgroup
    fn register_property_subgroup(&self, class: &str, name: &str, prefix: &str)
        -> HostResult<()>;

    /// Register a signal
    fn register_signal(&self, class: &str, name: &str, args: Vec<PropertyInfo>) -> HostResult<()>;

    /// Register a named integer constant, optionally inside an enum
    fn register_integer_constant(
        &self,
        class: &str,
        enum_name: &str,
        name: &str,
        value: i64,
        is_bitfield: bool,
    ) -> HostResult<()>;
}
