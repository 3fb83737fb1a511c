//! Binding engine errors

use hostbind_sdk::HostError;

use crate::idl::IdlError;

/// Result type for binding and runtime operations
pub type BindResult<T> = Result<T, BindError>;

/// Errors raised while binding or while running bound code
#[derive(Debug, thiserror::Error)]
pub enum BindError {
    /// IDL lookup failed
    #[error(transparent)]
    Idl(#[from] IdlError),

    /// The host reported a failure
    #[error("Host error: {0}")]
    Host(#[from] HostError),

    /// A type-string or annotation did not resolve
    #[error("Unknown type '{0}'")]
    UnknownType(String),

    /// The host has no native handle for a record that should have one
    #[error("No native {kind} handle for '{name}'")]
    MissingNativeHandle {
        /// Handle family (method, constructor, ...)
        kind: &'static str,
        /// Qualified member name
        name: String,
    },

    /// The member has no native call key yet
    #[error("'{0}' is not implemented by the host")]
    NotImplemented(String),

    /// A member name was published twice
    #[error("{kind} '{member}' already bound on '{class}'")]
    DuplicateMember {
        /// Member family
        kind: &'static str,
        /// Owning class
        class: String,
        /// The duplicate name
        member: String,
    },

    /// The class is already being bound further up the call stack
    #[error("Class '{0}' is already being bound")]
    BindingInProgress(String),

    /// No overload accepted the call's arguments
    #[error("no matching {kind} for {target} called with: ({called_with}); expected one of: {}", .accepted.join(", "))]
    NoMatchingOverload {
        /// `constructor` or `function`
        kind: &'static str,
        /// Type or function name
        target: String,
        /// Rendered argument kinds
        called_with: String,
        /// Every accepted parameter shape
        accepted: Vec<String>,
    },

    /// No operator handler accepted the operands
    #[error("unsupported operand types for {op}: '{left}' and '{right}'{}", accepted_suffix(.accepted))]
    UnsupportedOperand {
        /// Operator symbol
        op: String,
        /// Left operand type
        left: String,
        /// Right operand type
        right: String,
        /// Right-hand kinds the left type accepts
        accepted: Vec<String>,
    },

    /// Bad argument count or argument type
    #[error("{function}(): {message}")]
    Argument {
        /// Callable name
        function: String,
        /// What went wrong
        message: String,
    },

    /// Attribute lookup failed
    #[error("'{owner}' has no attribute '{name}'")]
    Attribute {
        /// Type name of the receiver
        owner: String,
        /// The missing attribute
        name: String,
    },

    /// Attribute exists but cannot be written
    #[error("attribute '{name}' of '{owner}' is read-only")]
    ReadOnly {
        /// Type name of the receiver
        owner: String,
        /// The attribute
        name: String,
    },

    /// Positional access out of bounds
    #[error("index {index} out of range for size {size}")]
    IndexOutOfRange {
        /// Requested index
        index: i64,
        /// Container size
        size: i64,
    },

    /// The wrapper's host object has been released
    #[error("{0} instance has been released")]
    ObjectReleased(String),

    /// The value cannot be used this way
    #[error("{0}")]
    Type(String),

    /// Script class association failed
    #[error("{0}")]
    ScriptClass(String),

    /// A default literal could not be evaluated
    #[error("invalid default literal '{literal}': {reason}")]
    InvalidDefault {
        /// The literal text
        literal: String,
        /// Why evaluation failed
        reason: String,
    },

    /// An error raised by user code
    #[error("{0}")]
    Script(String),

    /// The configuration file could not be read
    #[error("Invalid configuration: {0}")]
    Config(String),
}

fn accepted_suffix(accepted: &[String]) -> String {
    if accepted.is_empty() {
        String::new()
    } else {
        format!(" (accepted right operands: {})", accepted.join(", "))
    }
}

impl BindError {
    /// Shorthand for argument errors.
    pub fn argument(function: impl Into<String>, message: impl Into<String>) -> Self {
        BindError::Argument {
            function: function.into(),
            message: message.into(),
        }
    }

    /// Shorthand for attribute errors.
    pub fn attribute(owner: impl Into<String>, name: impl Into<String>) -> Self {
        BindError::Attribute {
            owner: owner.into(),
            name: name.into(),
        }
    }

    /// Failures a best-effort bind may skip.
    pub fn is_member_failure(&self) -> bool {
        matches!(
            self,
            BindError::UnknownType(_)
                | BindError::MissingNativeHandle { .. }
                | BindError::DuplicateMember { .. }
                | BindError::InvalidDefault { .. }
                | BindError::Idl(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_overload_message_lists_shapes() {
        let err = BindError::NoMatchingOverload {
            kind: "constructor",
            target: "Pair".into(),
            called_with: "str".into(),
            accepted: vec!["(int, int)".into(), "(float)".into()],
        };
        let text = err.to_string();
        assert!(text.contains("(int, int)"));
        assert!(text.contains("(float)"));
        assert!(text.contains("called with: (str)"));
    }

    #[test]
    fn test_operand_message() {
        let err = BindError::UnsupportedOperand {
            op: "<".into(),
            left: "Vector2".into(),
            right: "int".into(),
            accepted: vec!["Vector2".into()],
        };
        assert!(err.to_string().contains("accepted right operands: Vector2"));
    }
}
