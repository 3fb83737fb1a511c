//! Process-wide cache of the parsed IDL document
//!
//! The document is parsed once and shared. Tests and tools replace it with
//! [`install_api`] and drop it with [`reset_api`].

use std::path::Path;
use std::sync::Arc;

use once_cell::sync::Lazy;
use parking_lot::RwLock;

use super::{IdlDocument, IdlResult};

static API: Lazy<RwLock<Option<Arc<IdlDocument>>>> = Lazy::new(|| RwLock::new(None));

/// Load the document at `path` unless one is already cached.
pub fn load_api(path: impl AsRef<Path>) -> IdlResult<Arc<IdlDocument>> {
    if let Some(doc) = current_api() {
        return Ok(doc);
    }
    let doc = Arc::new(IdlDocument::load(path)?);
    let mut slot = API.write();
    // Another caller may have won the race while we were parsing.
    Ok(slot.get_or_insert(doc).clone())
}

/// The cached document, if any.
pub fn current_api() -> Option<Arc<IdlDocument>> {
    API.read().clone()
}

/// Replace the cached document.
pub fn install_api(doc: IdlDocument) -> Arc<IdlDocument> {
    let doc = Arc::new(doc);
    *API.write() = Some(doc.clone());
    doc
}

/// Drop the cached document.
pub fn reset_api() {
    *API.write() = None;
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_install_load_reset() {
        reset_api();
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"classes": [{{"name": "Object"}}]}}"#).unwrap();

        let loaded = load_api(file.path()).unwrap();
        assert!(loaded.index().has_class("Object"));

        let replaced = install_api(IdlDocument::parse(r#"{"classes": []}"#).unwrap());
        let current = current_api().unwrap();
        assert!(Arc::ptr_eq(&replaced, &current));
        assert!(!current.index().has_class("Object"));

        reset_api();
        assert!(current_api().is_none());
    }
}
