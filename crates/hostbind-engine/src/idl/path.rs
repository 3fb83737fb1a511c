//! Dotted/indexed paths into the IDL graph
//!
//! `classes.Node.methods.0.name` walks the `classes` key, selects the record
//! named `Node`, then the first method, then its `name` field. A numeric
//! segment on a list is an index; any other segment on a list selects the
//! element whose `name` equals it.

use std::fmt;
use std::str::FromStr;

use serde_json::Value;

use super::{IdlError, IdlResult};

/// One path step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathSegment {
    Key(String),
    Index(usize),
}

impl fmt::Display for PathSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathSegment::Key(key) => f.write_str(key),
            PathSegment::Index(index) => write!(f, "{}", index),
        }
    }
}

/// A parsed path.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ObjectPath {
    segments: Vec<PathSegment>,
}

impl ObjectPath {
    /// The empty path, resolving to the root.
    pub fn root() -> Self {
        Self::default()
    }

    /// Append a segment.
    pub fn child(mut self, segment: PathSegment) -> Self {
        self.segments.push(segment);
        self
    }

    pub fn segments(&self) -> &[PathSegment] {
        &self.segments
    }

    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    /// Walk the path from `root`.
    pub fn resolve<'a>(&self, root: &'a Value) -> IdlResult<&'a Value> {
        let mut current = root;
        for segment in &self.segments {
            current = step(current, segment).ok_or_else(|| IdlError::PathNotFound {
                path: self.to_string(),
                segment: segment.to_string(),
            })?;
        }
        Ok(current)
    }
}

fn step<'a>(value: &'a Value, segment: &PathSegment) -> Option<&'a Value> {
    match (value, segment) {
        (Value::Array(items), PathSegment::Index(index)) => items.get(*index),
        (Value::Array(items), PathSegment::Key(name)) => items
            .iter()
            .find(|item| item.get("name").and_then(Value::as_str) == Some(name.as_str())),
        (Value::Object(map), PathSegment::Key(key)) => map.get(key),
        (Value::Object(map), PathSegment::Index(index)) => map.get(&index.to_string()),
        _ => None,
    }
}

impl FromStr for ObjectPath {
    type Err = IdlError;

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        let text = text.trim();
        if text.is_empty() {
            return Ok(Self::root());
        }
        let mut segments = Vec::new();
        for part in text.split('.') {
            if part.is_empty() {
                return Err(IdlError::InvalidPath(text.to_string()));
            }
            let segment = if part.bytes().all(|b| b.is_ascii_digit()) {
                part.parse::<usize>()
                    .map(PathSegment::Index)
                    .map_err(|_| IdlError::InvalidPath(text.to_string()))?
            } else {
                PathSegment::Key(part.to_string())
            };
            segments.push(segment);
        }
        Ok(Self { segments })
    }
}

impl fmt::Display for ObjectPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, segment) in self.segments.iter().enumerate() {
            if i > 0 {
                f.write_str(".")?;
            }
            write!(f, "{}", segment)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn doc() -> Value {
        json!({
            "classes": [
                {"name": "Object", "methods": [{"name": "free"}]},
                {"name": "Node", "inherits": "Object", "methods": [{"name": "get_name"}, {"name": "add_child"}]}
            ]
        })
    }

    #[test]
    fn test_parse_numeric_segments_as_indices() {
        let path: ObjectPath = "classes.Node.methods.1.name".parse().unwrap();
        assert_eq!(path.segments()[1], PathSegment::Key("Node".into()));
        assert_eq!(path.segments()[3], PathSegment::Index(1));
        assert_eq!(path.to_string(), "classes.Node.methods.1.name");
    }

    #[test]
    fn test_resolve_by_name_and_index() {
        let doc = doc();
        let path: ObjectPath = "classes.Node.methods.1.name".parse().unwrap();
        assert_eq!(path.resolve(&doc).unwrap(), &json!("add_child"));
        let path: ObjectPath = "classes.0.name".parse().unwrap();
        assert_eq!(path.resolve(&doc).unwrap(), &json!("Object"));
    }

    #[test]
    fn test_resolve_missing_segment() {
        let doc = doc();
        let path: ObjectPath = "classes.Sprite.methods".parse().unwrap();
        match path.resolve(&doc) {
            Err(IdlError::PathNotFound { segment, .. }) => assert_eq!(segment, "Sprite"),
            other => panic!("unexpected {:?}", other),
        }
        let path: ObjectPath = "classes.Node.methods.9".parse().unwrap();
        assert!(path.resolve(&doc).is_err());
    }

    #[test]
    fn test_invalid_path() {
        assert!("classes..name".parse::<ObjectPath>().is_err());
        assert!("".parse::<ObjectPath>().unwrap().is_root());
    }
}
