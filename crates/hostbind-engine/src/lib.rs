//! hostbind engine
//!
//! Binds a host object runtime, described by an IDL document, into an
//! embedded language, and lets classes defined in that language flow back
//! into the host:
//! - **IDL**: parsed document, path lookup, record views (`idl` module)
//! - **Types**: type-string and descriptor resolution (`types` module)
//! - **Binders**: methods, constructors, operators, value types and lazily
//!   bound object classes (`bind` module)
//! - **Runtime**: the language-side object model and protocol (`runtime`)
//! - **Scripts**: user classes, host registration, instances and hot
//!   reload (`script` module)
//!
//! # Example
//!
//! ```rust,ignore
//! use hostbind_engine::{BindingConfig, IdlDocument, Runtime};
//! use hostbind_sdk::MemoryHost;
//!
//! let api = IdlDocument::load("extension_api.json")?;
//! let mut rt = Runtime::new(MemoryHost::shared(), Arc::new(api), BindingConfig::default());
//! rt.initialize()?;
//! let node = rt.global("Node")?;
//! ```

#![warn(rust_2018_idioms)]
#![allow(clippy::type_complexity)]
#![allow(clippy::new_without_default)]

// ============================================================================
// Modules
// ============================================================================

/// Binding configuration
pub mod config;

/// Engine errors
pub mod error;

/// IDL document model
pub mod idl;

/// Type resolution
pub mod types;

/// Language-side object model
pub mod runtime;

/// IDL-driven binders
pub mod bind;

/// User classes and script resources
pub mod script;

// ============================================================================
// Re-exports
// ============================================================================

pub use bind::{BoundMethod, MethodOwner, MethodSignature};
pub use config::{BindingConfig, FailurePolicy};
pub use error::{BindError, BindResult};
pub use idl::{IdlDocument, IdlError, IdlResult};
pub use runtime::{BindDiagnostic, ObjectRef, Runtime, TypeId, Value};
pub use script::{ClassDecl, Script, ScriptInstance, ScriptLoader};
pub use types::{TypeInfo, TypeResolver};
