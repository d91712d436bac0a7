//! Dotted-path access over nested records
//!
//! A path is either a plain field name (`"age"`) addressing a top-level entry
//! or a dot-delimited path (`"address.city"`) addressing a nested value.
//! Object containers are addressed by key, arrays by numeric index.
//!
//! Missing intermediate objects are created on write. Writes never touch
//! sibling branches of the addressed leaf.

use serde_json::{Map, Value};

use crate::errors::{UpdateError, UpdateResult};

/// One entity's column values
pub type Record = Map<String, Value>;

/// Default limit on path segments
pub const DEFAULT_MAX_PATH_DEPTH: usize = 32;

/// Resolves and rewrites values addressed by dotted paths
#[derive(Debug, Clone, Copy)]
pub struct PathResolver {
    max_depth: usize,
}

impl Default for PathResolver {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_PATH_DEPTH)
    }
}

impl PathResolver {
    pub fn new(max_depth: usize) -> Self {
        Self { max_depth }
    }

    /// Whether the path addresses a nested value
    pub fn is_dotted(path: &str) -> bool {
        path.contains('.')
    }

    /// Splits a path into validated segments
    pub fn segments<'p>(&self, path: &'p str) -> UpdateResult<Vec<&'p str>> {
        let segments: Vec<&str> = path.split('.').collect();
        if segments.iter().any(|s| s.is_empty()) {
            return Err(UpdateError::path(path, "empty path segment"));
        }
        if segments.len() > self.max_depth {
            return Err(UpdateError::path(
                path,
                format!("depth {} exceeds limit {}", segments.len(), self.max_depth),
            ));
        }
        Ok(segments)
    }

    /// Reads the value at `path`.
    ///
    /// Returns `None` when any segment is missing. An explicit `null` leaf is
    /// returned as `Some(Value::Null)`.
    pub fn get<'a>(&self, record: &'a Record, path: &str) -> Option<&'a Value> {
        if !Self::is_dotted(path) {
            return record.get(path);
        }

        let mut segments = path.split('.');
        let mut current = record.get(segments.next()?)?;
        for segment in segments {
            current = match current {
                Value::Object(map) => map.get(segment)?,
                Value::Array(items) => items.get(segment.parse::<usize>().ok()?)?,
                _ => return None,
            };
        }
        Some(current)
    }

    /// Assigns `value` at `path`, creating intermediate objects as needed
    pub fn set(&self, record: &mut Record, path: &str, value: Value) -> UpdateResult<()> {
        self.update(record, path, |_| Ok(value))
    }

    /// Replaces the leaf at `path` with `transform(current)`.
    ///
    /// `current` is `None` when the leaf does not exist yet.
    pub fn update<F>(&self, record: &mut Record, path: &str, transform: F) -> UpdateResult<()>
    where
        F: FnOnce(Option<&Value>) -> UpdateResult<Value>,
    {
        if !Self::is_dotted(path) {
            let new_value = transform(record.get(path))?;
            record.insert(path.to_string(), new_value);
            return Ok(());
        }

        let segments = self.segments(path)?;
        let (leaf, parents) = match segments.split_last() {
            Some(split) => split,
            None => return Err(UpdateError::path(path, "empty path")),
        };

        let root = record
            .entry(parents[0].to_string())
            .or_insert_with(|| Value::Object(Map::new()));
        if root.is_null() {
            *root = Value::Object(Map::new());
        }

        let mut container = root;
        for segment in &parents[1..] {
            container = descend(container, segment, path)?;
        }

        match container {
            Value::Object(map) => {
                let new_value = transform(map.get(*leaf))?;
                map.insert(leaf.to_string(), new_value);
                Ok(())
            }
            Value::Array(items) => {
                let index = parse_index(leaf, items.len(), path)?;
                let new_value = transform(items.get(index))?;
                items[index] = new_value;
                Ok(())
            }
            other => Err(UpdateError::path(
                path,
                format!("parent of '{}' is {}, not an object", leaf, value_kind(other)),
            )),
        }
    }
}

/// Steps one segment down, creating an empty object for a missing key
fn descend<'a>(container: &'a mut Value, segment: &str, path: &str) -> UpdateResult<&'a mut Value> {
    match container {
        Value::Object(map) => {
            let child = map
                .entry(segment.to_string())
                .or_insert_with(|| Value::Object(Map::new()));
            if child.is_null() {
                *child = Value::Object(Map::new());
            }
            Ok(child)
        }
        Value::Array(items) => {
            let index = parse_index(segment, items.len(), path)?;
            Ok(&mut items[index])
        }
        other => Err(UpdateError::path(
            path,
            format!("segment '{}' is inside {}, not an object", segment, value_kind(other)),
        )),
    }
}

fn parse_index(segment: &str, len: usize, path: &str) -> UpdateResult<usize> {
    let index = segment
        .parse::<usize>()
        .map_err(|_| UpdateError::path(path, format!("'{}' is not an array index", segment)))?;
    if index >= len {
        return Err(UpdateError::path(
            path,
            format!("index {} out of bounds for array of length {}", index, len),
        ));
    }
    Ok(index)
}

/// JSON kind name for messages
pub fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(n) => {
            if n.is_i64() || n.is_u64() {
                "int"
            } else {
                "float"
            }
        }
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(value: Value) -> Record {
        match value {
            Value::Object(map) => map,
            _ => panic!("record must be an object"),
        }
    }

    #[test]
    fn test_get_plain_and_nested() {
        let resolver = PathResolver::default();
        let rec = record(json!({"name": "john", "address": {"city": "Oslo"}}));

        assert_eq!(resolver.get(&rec, "name"), Some(&json!("john")));
        assert_eq!(resolver.get(&rec, "address.city"), Some(&json!("Oslo")));
        assert_eq!(resolver.get(&rec, "address.zip"), None);
        assert_eq!(resolver.get(&rec, "name.first"), None);
    }

    #[test]
    fn test_get_distinguishes_null_from_missing() {
        let resolver = PathResolver::default();
        let rec = record(json!({"a": {"b": null}}));

        assert_eq!(resolver.get(&rec, "a.b"), Some(&Value::Null));
        assert_eq!(resolver.get(&rec, "a.c"), None);
    }

    #[test]
    fn test_get_through_array_index() {
        let resolver = PathResolver::default();
        let rec = record(json!({"items": [{"qty": 1}, {"qty": 2}]}));

        assert_eq!(resolver.get(&rec, "items.1.qty"), Some(&json!(2)));
        assert_eq!(resolver.get(&rec, "items.5.qty"), None);
    }

    #[test]
    fn test_set_preserves_siblings() {
        let resolver = PathResolver::default();
        let mut rec = record(json!({"a": {"b": 1, "c": 2}}));

        resolver.set(&mut rec, "a.b", json!(10)).unwrap();
        assert_eq!(Value::Object(rec), json!({"a": {"b": 10, "c": 2}}));
    }

    #[test]
    fn test_set_creates_missing_containers() {
        let resolver = PathResolver::default();
        let mut rec = record(json!({"name": "x"}));

        resolver.set(&mut rec, "meta.stats.views", json!(1)).unwrap();
        assert_eq!(
            Value::Object(rec),
            json!({"name": "x", "meta": {"stats": {"views": 1}}})
        );
    }

    #[test]
    fn test_set_replaces_null_intermediate() {
        let resolver = PathResolver::default();
        let mut rec = record(json!({"meta": null}));

        resolver.set(&mut rec, "meta.flag", json!(true)).unwrap();
        assert_eq!(resolver.get(&rec, "meta.flag"), Some(&json!(true)));
    }

    #[test]
    fn test_set_through_scalar_fails() {
        let resolver = PathResolver::default();
        let mut rec = record(json!({"name": "x"}));

        let err = resolver.set(&mut rec, "name.first", json!("y")).unwrap_err();
        assert_eq!(err.code(), "AERO_UPDATE_PATH_CONFLICT");
        assert_eq!(rec.get("name"), Some(&json!("x")));
    }

    #[test]
    fn test_update_sees_current_leaf() {
        let resolver = PathResolver::default();
        let mut rec = record(json!({"stats": {"views": 4}}));

        resolver
            .update(&mut rec, "stats.views", |current| {
                let n = current.and_then(Value::as_i64).unwrap_or(0);
                Ok(json!(n + 1))
            })
            .unwrap();
        assert_eq!(resolver.get(&rec, "stats.views"), Some(&json!(5)));

        resolver
            .update(&mut rec, "stats.likes", |current| {
                assert!(current.is_none());
                Ok(json!(1))
            })
            .unwrap();
        assert_eq!(resolver.get(&rec, "stats.likes"), Some(&json!(1)));
    }

    #[test]
    fn test_update_array_element() {
        let resolver = PathResolver::default();
        let mut rec = record(json!({"items": [1, 2, 3]}));

        resolver.set(&mut rec, "items.1", json!(20)).unwrap();
        assert_eq!(rec.get("items"), Some(&json!([1, 20, 3])));

        let err = resolver.set(&mut rec, "items.9", json!(0)).unwrap_err();
        assert!(matches!(err, UpdateError::Path { .. }));
    }

    #[test]
    fn test_rejects_empty_segments_and_deep_paths() {
        let resolver = PathResolver::new(3);
        let mut rec = Record::new();

        assert!(resolver.set(&mut rec, "a..b", json!(1)).is_err());
        assert!(resolver.set(&mut rec, "a.b.c.d", json!(1)).is_err());
        assert!(resolver.set(&mut rec, "a.b.c", json!(1)).is_ok());
    }

    #[test]
    fn test_transform_error_propagates() {
        let resolver = PathResolver::default();
        let mut rec = record(json!({"a": {"b": 1}}));

        let result = resolver.update(&mut rec, "a.b", |_| {
            Err(UpdateError::operator("$test", "a.b", "boom"))
        });
        assert!(result.is_err());
        assert_eq!(resolver.get(&rec, "a.b"), Some(&json!(1)));
    }
}
