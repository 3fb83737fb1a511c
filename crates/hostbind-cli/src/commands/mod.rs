//! Subcommand implementations

pub mod bind;
pub mod broken;
pub mod layout;
pub mod query;
pub mod resolve;
