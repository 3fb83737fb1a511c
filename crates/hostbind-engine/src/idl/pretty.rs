//! Human-readable rendering of IDL nodes

use serde_json::Value;

use super::{IdlDocument, IdlNode};

/// Render `node` as indented text, eliding containers deeper than `max_depth`.
pub fn pretty_string(node: IdlNode<'_>, max_depth: usize) -> String {
    let mut out = String::new();
    write_value(node.value(), 0, max_depth, &mut out);
    out
}

fn write_value(value: &Value, depth: usize, max_depth: usize, out: &mut String) {
    let indent = "  ".repeat(depth + 1);
    let closing = "  ".repeat(depth);
    match value {
        Value::Object(map) if map.is_empty() => out.push_str("{}"),
        Value::Array(items) if items.is_empty() => out.push_str("[]"),
        Value::Object(_) if depth >= max_depth => out.push_str("{...}"),
        Value::Array(_) if depth >= max_depth => out.push_str("[...]"),
        Value::Object(map) => {
            out.push_str("{\n");
            for (key, child) in map {
                out.push_str(&indent);
                out.push_str(key);
                out.push_str(": ");
                write_value(child, depth + 1, max_depth, out);
                out.push('\n');
            }
            out.push_str(&closing);
            out.push('}');
        }
        Value::Array(items) => {
            out.push_str("[\n");
            for child in items {
                out.push_str(&indent);
                write_value(child, depth + 1, max_depth, out);
                out.push('\n');
            }
            out.push_str(&closing);
            out.push(']');
        }
        Value::String(s) => out.push_str(&format!("{:?}", s)),
        other => out.push_str(&other.to_string()),
    }
}

/// One top-level entry of the document layout.
#[derive(Debug, Clone, PartialEq)]
pub struct LayoutEntry {
    pub key: String,
    pub kind: &'static str,
    /// Entry count for lists and maps
    pub len: usize,
    /// First few record names for lists of named records
    pub sample: Vec<String>,
}

/// Describe the top-level layout of the document.
pub fn layout(doc: &IdlDocument) -> Vec<LayoutEntry> {
    const SAMPLE: usize = 3;
    doc.root()
        .keys()
        .filter_map(|key| doc.root().get(key).map(|node| (key, node)))
        .map(|(key, node)| {
            let kind = match node.value() {
                Value::Array(_) => "list",
                Value::Object(_) => "map",
                Value::String(_) => "string",
                Value::Number(_) => "number",
                Value::Bool(_) => "bool",
                Value::Null => "null",
            };
            let sample = node
                .items()
                .filter_map(|item| item.get("name").and_then(|n| n.as_str()))
                .take(SAMPLE)
                .map(str::to_string)
                .collect();
            LayoutEntry {
                key: key.to_string(),
                kind,
                len: node.len(),
                sample,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pretty_string_depth_limit() {
        let doc = IdlDocument::parse(r#"{"a": {"b": {"c": 1}}, "l": [1, 2]}"#).unwrap();
        let shallow = pretty_string(doc.root(), 1);
        assert!(shallow.contains("a: {...}"));
        assert!(shallow.contains("l: [...]"));
        let deep = pretty_string(doc.root(), 5);
        assert!(deep.contains("c: 1"));
    }

    #[test]
    fn test_layout() {
        let doc = IdlDocument::parse(
            r#"{"header": {"v": 1}, "classes": [{"name": "A"}, {"name": "B"}]}"#,
        )
        .unwrap();
        let entries = layout(&doc);
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].kind, "map");
        assert_eq!(entries[1].len, 2);
        assert_eq!(entries[1].sample, vec!["A", "B"]);
    }
}
