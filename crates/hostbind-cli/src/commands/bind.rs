//! `hostbind bind`: dry-run the class binder.
//!
//! The host has the document's class hierarchy but no native call
//! handles, so every member with a call key shows up as missing. What is
//! left after filtering those out are the records the binder itself
//! rejects: type-strings that do not resolve, duplicate names, bad
//! default literals.

use std::rc::Rc;
use std::sync::Arc;

use anyhow::Context;
use hostbind_engine::{BindingConfig, FailurePolicy, IdlDocument, Runtime};
use hostbind_sdk::{HostInterface, MemoryHost};

/// Host mirroring the document's class hierarchy.
pub fn hierarchy_host(api: &IdlDocument) -> Rc<MemoryHost> {
    let host = MemoryHost::shared();
    let index = api.index();
    for name in index.class_names() {
        host.add_native_class(name, index.class_parent(name));
    }
    host
}

pub struct BindReport {
    pub bound: usize,
    pub failed: Vec<(String, String)>,
    pub skipped: Vec<(String, String)>,
    pub missing_handles: usize,
}

/// Bind `classes` (every class when empty). `policy` overrides the
/// configured one for the class binds only.
pub fn run(
    api: Arc<IdlDocument>,
    config: BindingConfig,
    classes: &[String],
    policy: Option<FailurePolicy>,
) -> anyhow::Result<BindReport> {
    let host: Rc<dyn HostInterface> = hierarchy_host(&api);
    let mut rt = Runtime::new(host, api.clone(), config);
    rt.initialize().context("module initialization failed")?;

    let names: Vec<String> = if classes.is_empty() {
        api.index().class_names().map(str::to_string).collect()
    } else {
        classes.to_vec()
    };

    let mut report = BindReport {
        bound: 0,
        failed: Vec::new(),
        skipped: Vec::new(),
        missing_handles: 0,
    };
    for name in &names {
        let bound = match policy {
            Some(policy) => rt.bind_class_with_policy(name, policy),
            None => rt.bind_class(name),
        };
        match bound {
            Ok(Some(_)) => report.bound += 1,
            Ok(None) => log::warn!("'{}' was not bound", name),
            Err(err) => report.failed.push((name.clone(), err.to_string())),
        }
    }
    for diagnostic in rt.diagnostics() {
        if diagnostic.message.starts_with("No native ") {
            report.missing_handles += 1;
        } else {
            report
                .skipped
                .push((diagnostic.context.clone(), diagnostic.message.clone()));
        }
    }
    Ok(report)
}

pub fn execute(
    api: Arc<IdlDocument>,
    config: BindingConfig,
    classes: &[String],
    strict: bool,
) -> anyhow::Result<()> {
    let policy = strict.then_some(FailurePolicy::Strict);
    let report = run(api, config, classes, policy)?;
    for (context, message) in &report.skipped {
        println!("skipped {}: {}", context, message);
    }
    for (class, message) in &report.failed {
        println!("failed {}: {}", class, message);
    }
    println!(
        "{} classes bound, {} failed, {} members skipped, {} without native handles",
        report.bound,
        report.failed.len(),
        report.skipped.len(),
        report.missing_handles
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const DOC: &str = r#"{
        "classes": [
            {"name": "Object"},
            {"name": "Node", "inherits": "Object",
             "methods": [
                {"name": "get_name", "hash": 1, "return_value": {"type": "String"}},
                {"name": "set_gizmo", "hash": 2, "arguments": [{"name": "g", "type": "Gizmo"}]},
                {"name": "queue_free"}
             ]}
        ]
    }"#;

    fn api() -> Arc<IdlDocument> {
        Arc::new(IdlDocument::parse(DOC).unwrap())
    }

    #[test]
    fn test_report_separates_missing_handles() {
        let report = run(api(), BindingConfig::default(), &[], None).unwrap();
        assert_eq!(report.bound, 2);
        assert!(report.failed.is_empty());
        assert_eq!(report.missing_handles, 1);
        assert_eq!(report.skipped.len(), 1);
        assert_eq!(report.skipped[0].0, "Node.set_gizmo");
    }

    #[test]
    fn test_strict_fails_the_class() {
        let names = vec!["Node".to_string()];
        let report = run(api(), BindingConfig::default(), &names, Some(FailurePolicy::Strict)).unwrap();
        assert_eq!(report.bound, 0);
        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.failed[0].0, "Node");
    }
}
