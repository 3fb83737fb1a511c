//! IDL model
//!
//! The IDL document describes every class, value type, enum, operator,
//! constructor and free function the host exposes. It is parsed once into an
//! order-preserving JSON graph; typed record views are deserialized on demand.

mod cache;
mod document;
mod path;
mod pretty;
mod records;

pub use cache::{current_api, install_api, load_api, reset_api};
pub use document::{ApiIndex, EnumLocation, IdlDocument, IdlNode};
pub use path::{ObjectPath, PathSegment};
pub use pretty::{layout, pretty_string, LayoutEntry};
pub use records::{
    ArgumentRecord, BuiltinClassRecord, ClassRecord, ConstantRecord, ConstructorRecord,
    EnumRecord, EnumValueRecord, MemberRecord, MethodRecord, OperatorRecord, PropertyRecord,
    ReturnValueRecord, SignalRecord, SingletonRecord,
};

/// Result type for IDL access
pub type IdlResult<T> = Result<T, IdlError>;

/// IDL loading and lookup errors
#[derive(Debug, thiserror::Error)]
pub enum IdlError {
    /// The document file could not be read
    #[error("Failed to read IDL document '{path}': {source}")]
    Io {
        /// File path
        path: String,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// The document is not valid JSON, or a record has the wrong shape
    #[error("Failed to parse IDL document: {0}")]
    Parse(#[from] serde_json::Error),

    /// A named record does not exist
    #[error("{kind} '{name}' not found")]
    NotFound {
        /// What was looked up
        kind: String,
        /// The missing name
        name: String,
    },

    /// A path walk hit a missing key, index or name
    #[error("Path '{path}' has no element '{segment}'")]
    PathNotFound {
        /// The full path
        path: String,
        /// First segment that failed
        segment: String,
    },

    /// The path text could not be parsed
    #[error("Invalid path '{0}'")]
    InvalidPath(String),
}

impl IdlError {
    /// True for the "not found" family, as opposed to malformed input.
    pub fn is_not_found(&self) -> bool {
        matches!(self, IdlError::NotFound { .. } | IdlError::PathNotFound { .. })
    }
}
