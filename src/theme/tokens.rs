//! Immutable design token sets.

use std::fmt;
use std::sync::Arc;

use serde::{Serialize, Serializer};
use serde_json::{Map, Value};

use crate::error::{Error, Result};

/// Separator between segments of a token path (`colors.primary.main`).
pub const PATH_SEPARATOR: char = '.';

/// A named mapping of design values.
///
/// The root is always an object. Values may be strings, numbers, booleans,
/// arrays (treated as atomic leaves) or nested objects. A `TokenSet` is never
/// mutated after construction; composing produces a new set.
#[derive(Clone, PartialEq)]
pub struct TokenSet {
    root: Arc<Map<String, Value>>,
}

impl TokenSet {
    /// An empty token set.
    pub fn empty() -> Self {
        Self {
            root: Arc::new(Map::new()),
        }
    }

    /// Build a token set from an arbitrary value. Only objects are accepted,
    /// and no table key may be empty or contain the path separator.
    pub fn from_value(name: &str, value: Value) -> Result<Self> {
        match value {
            Value::Object(map) => {
                check_keys(name, &map, "")?;
                Ok(Self::from_map(map))
            }
            other => Err(Error::invalid_token_set(
                name,
                format!("expected a table of tokens, found {}", kind_of(&other)),
            )),
        }
    }

    pub(crate) fn from_map(map: Map<String, Value>) -> Self {
        Self { root: Arc::new(map) }
    }

    /// Parse a TOML document into a token set.
    pub fn from_toml_str(name: &str, content: &str) -> Result<Self> {
        let value: Value = toml::from_str(content).map_err(|e| {
            Error::invalid_token_set(name, format!("failed to parse TOML: {}", e))
        })?;
        Self::from_value(name, value)
    }

    /// Parse a JSON document into a token set.
    pub fn from_json_str(name: &str, content: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(content).map_err(|e| {
            Error::invalid_token_set(name, format!("failed to parse JSON: {}", e))
        })?;
        Self::from_value(name, value)
    }

    /// Borrow the root object.
    pub fn as_map(&self) -> &Map<String, Value> {
        &self.root
    }

    /// Number of top-level groups.
    pub fn len(&self) -> usize {
        self.root.len()
    }

    pub fn is_empty(&self) -> bool {
        self.root.is_empty()
    }

    /// Look up a value by dotted path. Returns `None` if any segment is missing
    /// or traverses a leaf.
    pub fn get(&self, path: &str) -> Option<&Value> {
        let mut segments = path.split(PATH_SEPARATOR);
        let first = segments.next()?;
        let mut current = self.root.get(first)?;
        for segment in segments {
            current = current.as_object()?.get(segment)?;
        }
        Some(current)
    }

    /// Look up a string token.
    pub fn get_str(&self, path: &str) -> Option<&str> {
        self.get(path).and_then(Value::as_str)
    }

    /// Look up a numeric token.
    pub fn get_f64(&self, path: &str) -> Option<f64> {
        self.get(path).and_then(Value::as_f64)
    }

    pub fn contains_path(&self, path: &str) -> bool {
        self.get(path).is_some()
    }

    /// Every leaf path in the set, in document order.
    ///
    /// Scalars and arrays are leaves. An empty object is reported as a leaf
    /// too, so coverage checks do not silently skip it.
    pub fn leaf_paths(&self) -> Vec<String> {
        let mut out = Vec::new();
        collect_leaf_paths(&self.root, "", &mut out);
        out
    }

    /// Render as a JSON value (for output and serialization).
    pub fn to_value(&self) -> Value {
        Value::Object((*self.root).clone())
    }
}

fn check_keys(name: &str, map: &Map<String, Value>, prefix: &str) -> Result<()> {
    for (key, value) in map {
        if key.is_empty() || key.contains(PATH_SEPARATOR) {
            let location = if prefix.is_empty() { "<root>" } else { prefix };
            return Err(Error::invalid_token_set(
                name,
                format!(
                    "token key '{}' under {} must be non-empty and must not contain '{}'",
                    key, location, PATH_SEPARATOR
                ),
            ));
        }
        if let Value::Object(child) = value {
            check_keys(name, child, &join_path(prefix, key))?;
        }
    }
    Ok(())
}

fn collect_leaf_paths(map: &Map<String, Value>, prefix: &str, out: &mut Vec<String>) {
    for (key, value) in map {
        let path = join_path(prefix, key);
        match value {
            Value::Object(child) if !child.is_empty() => collect_leaf_paths(child, &path, out),
            _ => out.push(path),
        }
    }
}

pub(crate) fn join_path(prefix: &str, key: &str) -> String {
    if prefix.is_empty() {
        key.to_string()
    } else {
        format!("{}{}{}", prefix, PATH_SEPARATOR, key)
    }
}

/// Short description of a value's kind for error messages.
pub(crate) fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "a table",
    }
}

impl Default for TokenSet {
    fn default() -> Self {
        Self::empty()
    }
}

impl fmt::Debug for TokenSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenSet")
            .field("groups", &self.root.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl Serialize for TokenSet {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        self.root.serialize(serializer)
    }
}
