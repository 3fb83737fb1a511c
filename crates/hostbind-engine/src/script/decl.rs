//! User-class declarations
//!
//! A [`ClassDecl`] is the declarative surface of a class authored in the
//! embedded language: its methods, properties (with optional accessors and
//! defaults), groups, signals, constants and enums, in declaration order.

use std::fmt;
use std::rc::Rc;

use hostbind_sdk::{PropertyHint, PropertyUsage};

use crate::error::BindResult;
use crate::runtime::{Runtime, TypeId, Value};

/// Body of a user method: runtime, receiver, arguments.
pub type ScriptFn = Rc<dyn Fn(&mut Runtime, &Value, Vec<Value>) -> BindResult<Value>>;

/// Builds a fresh default value for each instance.
pub type DefaultFactory = Rc<dyn Fn(&mut Runtime) -> BindResult<Value>>;

/// Custom property accessor.
#[derive(Clone)]
pub enum Accessor {
    /// A method of the class, looked up by name at call time
    Method(String),
    /// A free function taking the receiver
    Function(ScriptFn),
}

impl Accessor {
    pub fn call(&self, rt: &mut Runtime, receiver: &Value, args: Vec<Value>) -> BindResult<Value> {
        match self {
            Accessor::Method(name) => rt.call_method(receiver, name, args),
            Accessor::Function(f) => f(rt, receiver, args),
        }
    }

    /// Method name, when the accessor is one.
    pub fn method_name(&self) -> Option<&str> {
        match self {
            Accessor::Method(name) => Some(name),
            Accessor::Function(_) => None,
        }
    }
}

impl fmt::Debug for Accessor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Accessor::Method(name) => write!(f, "Method({})", name),
            Accessor::Function(_) => f.write_str("Function"),
        }
    }
}

/// Initial value of a stored property.
#[derive(Clone, Default)]
pub enum DefaultValue {
    /// Zero value of the declared type
    #[default]
    None,
    Value(Value),
    Factory(DefaultFactory),
}

impl DefaultValue {
    pub fn is_declared(&self) -> bool {
        !matches!(self, DefaultValue::None)
    }
}

impl fmt::Debug for DefaultValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DefaultValue::None => f.write_str("None"),
            DefaultValue::Value(value) => write!(f, "Value({:?})", value),
            DefaultValue::Factory(_) => f.write_str("Factory"),
        }
    }
}

// ============================================================================
// Members
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamKind {
    Positional,
    /// Collects the remaining positional arguments
    VarArgs,
    /// Can only be passed by name; not expressible to the host
    KeywordOnly,
}

#[derive(Debug, Clone)]
pub struct ParamDecl {
    pub name: String,
    /// Type annotation; unannotated parameters accept anything
    pub annotation: Option<String>,
    pub default: Option<Value>,
    pub kind: ParamKind,
}

impl ParamDecl {
    pub fn new(name: impl Into<String>, annotation: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            annotation: Some(annotation.into()),
            default: None,
            kind: ParamKind::Positional,
        }
    }

    pub fn untyped(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            annotation: None,
            default: None,
            kind: ParamKind::Positional,
        }
    }

    pub fn with_default(mut self, default: Value) -> Self {
        self.default = Some(default);
        self
    }

    pub fn with_kind(mut self, kind: ParamKind) -> Self {
        self.kind = kind;
        self
    }
}

#[derive(Clone)]
pub struct MethodDecl {
    pub name: String,
    pub params: Vec<ParamDecl>,
    /// Return annotation; `None` means the method returns anything
    pub returns: Option<String>,
    pub body: ScriptFn,
    pub is_static: bool,
    pub is_virtual: bool,
    pub is_const: bool,
    pub doc: Option<String>,
}

impl MethodDecl {
    pub fn new(name: impl Into<String>, body: ScriptFn) -> Self {
        Self {
            name: name.into(),
            params: Vec::new(),
            returns: None,
            body,
            is_static: false,
            is_virtual: false,
            is_const: false,
            doc: None,
        }
    }

    pub fn with_param(mut self, param: ParamDecl) -> Self {
        self.params.push(param);
        self
    }

    pub fn with_return(mut self, annotation: impl Into<String>) -> Self {
        self.returns = Some(annotation.into());
        self
    }

    pub fn as_static(mut self) -> Self {
        self.is_static = true;
        self
    }

    /// Overrides a virtual the host calls into.
    pub fn as_virtual(mut self) -> Self {
        self.is_virtual = true;
        self
    }

    pub fn as_const(mut self) -> Self {
        self.is_const = true;
        self
    }

    pub fn with_doc(mut self, doc: impl Into<String>) -> Self {
        self.doc = Some(doc.into());
        self
    }
}

impl fmt::Debug for MethodDecl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MethodDecl")
            .field("name", &self.name)
            .field("params", &self.params)
            .field("returns", &self.returns)
            .finish()
    }
}

#[derive(Debug, Clone)]
pub struct PropertyDecl {
    pub name: String,
    pub annotation: String,
    pub default: DefaultValue,
    pub getter: Option<Accessor>,
    pub setter: Option<Accessor>,
    pub hint: Option<(PropertyHint, String)>,
    pub usage: Option<PropertyUsage>,
    pub doc: Option<String>,
}

impl PropertyDecl {
    pub fn new(name: impl Into<String>, annotation: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            annotation: annotation.into(),
            default: DefaultValue::None,
            getter: None,
            setter: None,
            hint: None,
            usage: None,
            doc: None,
        }
    }

    pub fn with_default(mut self, value: Value) -> Self {
        self.default = DefaultValue::Value(value);
        self
    }

    pub fn with_factory(mut self, factory: DefaultFactory) -> Self {
        self.default = DefaultValue::Factory(factory);
        self
    }

    pub fn with_getter(mut self, getter: Accessor) -> Self {
        self.getter = Some(getter);
        self
    }

    pub fn with_setter(mut self, setter: Accessor) -> Self {
        self.setter = Some(setter);
        self
    }

    pub fn with_hint(mut self, hint: PropertyHint, hint_string: impl Into<String>) -> Self {
        self.hint = Some((hint, hint_string.into()));
        self
    }

    pub fn with_usage(mut self, usage: PropertyUsage) -> Self {
        self.usage = Some(usage);
        self
    }

    pub fn with_doc(mut self, doc: impl Into<String>) -> Self {
        self.doc = Some(doc.into());
        self
    }

    /// True when neither accessor is custom and values live in instance
    /// storage.
    pub fn is_stored(&self) -> bool {
        self.getter.is_none() && self.setter.is_none()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SignalDecl {
    pub name: String,
    /// (name, annotation) pairs
    pub arguments: Vec<(String, String)>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EnumDecl {
    pub name: String,
    pub bitfield: bool,
    pub values: Vec<(String, i64)>,
}

/// One entry of a class body.
#[derive(Debug, Clone)]
pub enum MemberDecl {
    Method(MethodDecl),
    Property(PropertyDecl),
    Group { name: String, prefix: String },
    Subgroup { name: String, prefix: String },
    Signal(SignalDecl),
    Constant { name: String, value: i64 },
    Enum(EnumDecl),
}

impl MemberDecl {
    pub fn name(&self) -> &str {
        match self {
            MemberDecl::Method(m) => &m.name,
            MemberDecl::Property(p) => &p.name,
            MemberDecl::Group { name, .. } | MemberDecl::Subgroup { name, .. } => name,
            MemberDecl::Signal(s) => &s.name,
            MemberDecl::Constant { name, .. } => name,
            MemberDecl::Enum(e) => &e.name,
        }
    }
}

// ============================================================================
// Classes
// ============================================================================

/// How a class presents itself to the host.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExposeParams {
    /// Global name; the class name is used when only `as_global` is set
    pub name: Option<String>,
    pub as_global: bool,
    pub icon: Option<String>,
    /// Runs inside the editor
    pub tool: bool,
}

/// What a user class inherits from.
#[derive(Debug, Clone, PartialEq)]
pub enum Base {
    /// A host class, or a registered extension class
    Native(String),
    /// Another user class
    Script(TypeId),
}

#[derive(Debug, Clone)]
pub struct ClassDecl {
    /// Defining unit; (module, name) identifies the class across reloads
    pub module: String,
    pub name: String,
    pub base: Base,
    pub members: Vec<MemberDecl>,
    pub is_abstract: bool,
    /// Published to the host class database as a new native class
    pub extension: bool,
    pub expose: ExposeParams,
    pub doc: Option<String>,
}

impl ClassDecl {
    pub fn new(module: impl Into<String>, name: impl Into<String>, base: Base) -> Self {
        Self {
            module: module.into(),
            name: name.into(),
            base,
            members: Vec::new(),
            is_abstract: false,
            extension: false,
            expose: ExposeParams::default(),
            doc: None,
        }
    }

    pub fn method(mut self, method: MethodDecl) -> Self {
        self.members.push(MemberDecl::Method(method));
        self
    }

    pub fn property(mut self, property: PropertyDecl) -> Self {
        self.members.push(MemberDecl::Property(property));
        self
    }

    pub fn group(mut self, name: impl Into<String>, prefix: impl Into<String>) -> Self {
        self.members.push(MemberDecl::Group {
            name: name.into(),
            prefix: prefix.into(),
        });
        self
    }

    pub fn subgroup(mut self, name: impl Into<String>, prefix: impl Into<String>) -> Self {
        self.members.push(MemberDecl::Subgroup {
            name: name.into(),
            prefix: prefix.into(),
        });
        self
    }

    pub fn signal(mut self, name: impl Into<String>, arguments: Vec<(String, String)>) -> Self {
        self.members.push(MemberDecl::Signal(SignalDecl {
            name: name.into(),
            arguments,
        }));
        self
    }

    pub fn constant(mut self, name: impl Into<String>, value: i64) -> Self {
        self.members.push(MemberDecl::Constant {
            name: name.into(),
            value,
        });
        self
    }

    pub fn enumeration(mut self, decl: EnumDecl) -> Self {
        self.members.push(MemberDecl::Enum(decl));
        self
    }

    pub fn as_abstract(mut self) -> Self {
        self.is_abstract = true;
        self
    }

    pub fn as_extension(mut self) -> Self {
        self.extension = true;
        self
    }

    pub fn exposed(mut self, expose: ExposeParams) -> Self {
        self.expose = expose;
        self
    }

    pub fn with_doc(mut self, doc: impl Into<String>) -> Self {
        self.doc = Some(doc.into());
        self
    }

    pub fn methods(&self) -> impl Iterator<Item = &MethodDecl> {
        self.members.iter().filter_map(|member| match member {
            MemberDecl::Method(m) => Some(m),
            _ => None,
        })
    }

    pub fn properties(&self) -> impl Iterator<Item = &PropertyDecl> {
        self.members.iter().filter_map(|member| match member {
            MemberDecl::Property(p) => Some(p),
            _ => None,
        })
    }

    pub fn signals(&self) -> impl Iterator<Item = &SignalDecl> {
        self.members.iter().filter_map(|member| match member {
            MemberDecl::Signal(s) => Some(s),
            _ => None,
        })
    }

    /// Name the class is published under, if exposed globally.
    pub fn global_name(&self) -> Option<String> {
        match &self.expose.name {
            Some(name) if !name.is_empty() => Some(name.clone()),
            _ if self.expose.as_global => Some(self.name.clone()),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn noop() -> ScriptFn {
        Rc::new(|_rt: &mut Runtime, _receiver: &Value, _args: Vec<Value>| Ok(Value::Nil))
    }

    #[test]
    fn test_members_keep_declaration_order() {
        let decl = ClassDecl::new("game", "Player", Base::Native("Node".into()))
            .group("Stats", "stat_")
            .property(PropertyDecl::new("stat_hp", "int").with_default(Value::Int(3)))
            .method(MethodDecl::new("jump", noop()))
            .signal("died", vec![]);
        let names: Vec<&str> = decl.members.iter().map(MemberDecl::name).collect();
        assert_eq!(names, vec!["Stats", "stat_hp", "jump", "died"]);
        assert_eq!(decl.properties().count(), 1);
        assert!(decl.properties().all(PropertyDecl::is_stored));
    }

    #[test]
    fn test_global_name() {
        let decl = ClassDecl::new("game", "Player", Base::Native("Node".into()));
        assert_eq!(decl.global_name(), None);
        let decl = decl.exposed(ExposeParams {
            as_global: true,
            ..ExposeParams::default()
        });
        assert_eq!(decl.global_name().as_deref(), Some("Player"));
        let decl = decl.exposed(ExposeParams {
            name: Some("Hero".into()),
            ..ExposeParams::default()
        });
        assert_eq!(decl.global_name().as_deref(), Some("Hero"));
    }
}
