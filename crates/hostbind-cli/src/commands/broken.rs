//! `hostbind broken-properties`: property records the binders would skip.

use std::sync::Arc;

use hostbind_engine::idl::{ClassRecord, PropertyRecord};
use hostbind_engine::{IdlDocument, TypeResolver};

#[derive(Debug, Clone, PartialEq)]
pub struct BrokenProperty {
    pub class: String,
    pub property: String,
    pub reason: String,
}

/// True if `class` or one of its ancestors declares method `name`.
fn has_method(api: &IdlDocument, classes: &[ClassRecord], class: &str, name: &str) -> bool {
    let mut current = Some(class);
    while let Some(class) = current {
        let declared = classes
            .iter()
            .find(|record| record.name == class)
            .map_or(false, |record| record.methods.iter().any(|m| m.name == name));
        if declared {
            return true;
        }
        current = api.index().class_parent(class);
    }
    false
}

fn check_property(
    api: &IdlDocument,
    resolver: &TypeResolver,
    classes: &[ClassRecord],
    class: &ClassRecord,
    property: &PropertyRecord,
) -> Vec<String> {
    let mut reasons = Vec::new();
    if let Err(err) = resolver.resolve(&property.ty) {
        reasons.push(format!("type '{}' does not resolve ({})", property.ty, err));
    }
    match property.getter.as_deref() {
        None | Some("") => reasons.push("no getter".to_string()),
        Some(getter) if !has_method(api, classes, &class.name, getter) => {
            reasons.push(format!("getter '{}' is not a method of the class", getter))
        }
        _ => {}
    }
    if let Some(setter) = property.setter.as_deref().filter(|s| !s.is_empty()) {
        if !has_method(api, classes, &class.name, setter) {
            reasons.push(format!("setter '{}' is not a method of the class", setter));
        }
    }
    reasons
}

/// Every inconsistent property record, restricted to `only` when given.
pub fn find_broken(api: &Arc<IdlDocument>, only: &[String]) -> anyhow::Result<Vec<BrokenProperty>> {
    let resolver = TypeResolver::new(api.clone());
    let classes: Vec<ClassRecord> = api.records("classes")?;
    let mut broken = Vec::new();
    for class in &classes {
        if !only.is_empty() && !only.contains(&class.name) {
            continue;
        }
        for property in &class.properties {
            for reason in check_property(api, &resolver, &classes, class, property) {
                broken.push(BrokenProperty {
                    class: class.name.clone(),
                    property: property.name.clone(),
                    reason,
                });
            }
        }
    }
    Ok(broken)
}

/// Print the report; returns the number of findings.
pub fn execute(api: Arc<IdlDocument>, only: &[String]) -> anyhow::Result<usize> {
    let broken = find_broken(&api, only)?;
    for entry in &broken {
        println!("{}.{}: {}", entry.class, entry.property, entry.reason);
    }
    if broken.is_empty() {
        println!("no broken properties");
    } else {
        log::warn!("{} broken property records", broken.len());
    }
    Ok(broken.len())
}

#[cfg(test)]
mod tests {
    use super::*;

    const DOC: &str = r#"{
        "classes": [
            {"name": "Object", "methods": [{"name": "get_meta"}]},
            {"name": "Node", "inherits": "Object",
             "methods": [{"name": "get_name"}, {"name": "set_name"}],
             "properties": [
                {"type": "String", "name": "name", "getter": "get_name", "setter": "set_name"},
                {"type": "Variant", "name": "meta", "getter": "get_meta"},
                {"type": "String", "name": "path", "getter": "get_path"},
                {"type": "Gizmo", "name": "gizmo", "getter": "get_name"},
                {"type": "int", "name": "orphan"}
             ]}
        ]
    }"#;

    fn api() -> Arc<IdlDocument> {
        Arc::new(IdlDocument::parse(DOC).unwrap())
    }

    #[test]
    fn test_finds_each_kind_of_breakage() {
        let broken = find_broken(&api(), &[]).unwrap();
        let names: Vec<&str> = broken.iter().map(|b| b.property.as_str()).collect();
        assert_eq!(names, vec!["path", "gizmo", "orphan"]);
        assert!(broken[0].reason.contains("get_path"));
        assert!(broken[1].reason.contains("Gizmo"));
        assert_eq!(broken[2].reason, "no getter");
    }

    #[test]
    fn test_inherited_accessors_are_found() {
        let broken = find_broken(&api(), &[]).unwrap();
        assert!(!broken.iter().any(|b| b.property == "meta"));
    }

    #[test]
    fn test_class_filter() {
        let broken = find_broken(&api(), &["Object".to_string()]).unwrap();
        assert!(broken.is_empty());
    }
}
