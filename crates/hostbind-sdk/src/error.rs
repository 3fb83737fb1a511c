//! Error types for the host ABI

/// Result type for host calls
pub type HostResult<T> = Result<T, HostError>;

/// Host-side failures
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum HostError {
    /// A native call rejected its arguments
    #[error("Argument error: {0}")]
    ArgumentError(String),

    /// Type mismatch during conversion
    #[error("Type mismatch: expected {expected}, got {got}")]
    TypeMismatch {
        /// Expected type name
        expected: String,
        /// Actual type name
        got: String,
    },

    /// The class is not known to the host
    #[error("Unknown class '{0}'")]
    UnknownClass(String),

    /// The object identity is not live
    #[error("Object {0} does not exist")]
    InvalidObject(crate::ObjectId),

    /// Something with this name is already registered
    #[error("{kind} '{name}' is already registered on '{class}'")]
    AlreadyRegistered {
        /// What was being registered
        kind: &'static str,
        /// Owning class
        class: String,
        /// Duplicate name
        name: String,
    },

    /// Positional access outside the container
    #[error("Index {index} out of range for size {size}")]
    IndexOutOfRange {
        /// Requested index
        index: i64,
        /// Container size
        size: i64,
    },

    /// Generic native failure
    #[error("{0}")]
    CallFailed(String),
}

impl From<String> for HostError {
    fn from(s: String) -> Self {
        HostError::CallFailed(s)
    }
}

impl From<&str> for HostError {
    fn from(s: &str) -> Self {
        HostError::CallFailed(s.to_string())
    }
}

/// Status codes the host understands as results of script-facing entry points.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(i64)]
pub enum ErrorCode {
    /// Success
    Ok = 0,
    /// Generic failure
    Failed = 1,
    /// Resource could not be found
    FileNotFound = 7,
    /// Resource failed to parse or load
    ParseError = 43,
}

impl ErrorCode {
    /// The integer value the host expects.
    pub fn code(self) -> i64 {
        self as i64
    }

    /// True for `Ok`.
    pub fn is_ok(self) -> bool {
        self == ErrorCode::Ok
    }
}
