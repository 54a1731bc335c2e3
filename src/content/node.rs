//! Content tree model and its JSON/TOML wire form.
//!
//! Wire form: plain JSON/TOML values map to literals, arrays and tables. A
//! table whose only key is `"$variants"` is a variant node:
//!
//! ```json
//! { "title": { "$variants": { "male": "Ready, champ?", "female": "Ready, star?", "default": "Ready?" } } }
//! ```

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::de::{self, Deserialize, Deserializer};
use serde::{Serialize, Serializer};
use serde_json::{Map, Number, Value};

use crate::error::{Error, Result};
use crate::persona::{PersonaKey, DEFAULT_VARIANT_KEY};

/// Marker key identifying a variant node in the wire form.
pub const VARIANTS_MARKER: &str = "$variants";

// ─────────────────────────────────────────────────────────────────
// Literal
// ─────────────────────────────────────────────────────────────────

/// A scalar content value.
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Null,
    Bool(bool),
    Number(Number),
    String(String),
}

impl Literal {
    fn to_value(&self) -> Value {
        match self {
            Literal::Null => Value::Null,
            Literal::Bool(b) => Value::Bool(*b),
            Literal::Number(n) => Value::Number(n.clone()),
            Literal::String(s) => Value::String(s.clone()),
        }
    }
}

// ─────────────────────────────────────────────────────────────────
// Variant Node
// ─────────────────────────────────────────────────────────────────

/// A node holding one alternative per variant key.
///
/// Keys are persona slugs, the distinguished `default` key, or any other
/// authored name (legal, but never selected by a recognized persona). Keys
/// are kept sorted so the fallback choice is deterministic. A variant node is
/// never empty.
#[derive(Debug, Clone, PartialEq)]
pub struct VariantNode {
    variants: BTreeMap<String, ContentNode>,
}

impl VariantNode {
    /// Create a variant node. Fails when `variants` is empty.
    pub fn new(variants: BTreeMap<String, ContentNode>) -> Result<Self> {
        if variants.is_empty() {
            return Err(Error::content_parse("/", "variant node declares no variants"));
        }
        Ok(Self { variants })
    }

    /// Convenience constructor from `(key, node)` pairs.
    pub fn from_pairs<K, I>(pairs: I) -> Result<Self>
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, ContentNode)>,
    {
        Self::new(pairs.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }

    pub fn get(&self, key: &str) -> Option<&ContentNode> {
        self.variants.get(key)
    }

    /// Declared keys in lexicographic order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.variants.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ContentNode)> {
        self.variants.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.variants.len()
    }

    pub fn is_empty(&self) -> bool {
        self.variants.is_empty()
    }

    /// The lexicographically first declared variant.
    pub fn first(&self) -> Option<(&str, &ContentNode)> {
        self.variants.iter().next().map(|(k, v)| (k.as_str(), v))
    }

    pub fn has_default(&self) -> bool {
        self.variants.contains_key(DEFAULT_VARIANT_KEY)
    }

    /// Recognized personas without an entry of their own.
    pub fn missing_personas(&self) -> Vec<PersonaKey> {
        PersonaKey::all()
            .iter()
            .copied()
            .filter(|p| !self.variants.contains_key(p.slug()))
            .collect()
    }

    /// Well formed means: a `default` entry, or an entry for every
    /// recognized persona.
    pub fn is_well_formed(&self) -> bool {
        self.has_default() || self.missing_personas().is_empty()
    }
}

// ─────────────────────────────────────────────────────────────────
// Content Node
// ─────────────────────────────────────────────────────────────────

/// A content tree.
#[derive(Debug, Clone, PartialEq)]
pub enum ContentNode {
    /// Scalar value with no persona dependency.
    Literal(Literal),
    /// Persona-polymorphic value.
    Variant(VariantNode),
    /// Ordered children.
    Sequence(Vec<ContentNode>),
    /// Keyed children in authored order.
    Mapping(Vec<(String, ContentNode)>),
}

impl ContentNode {
    pub fn null() -> Self {
        ContentNode::Literal(Literal::Null)
    }

    pub fn text(s: impl Into<String>) -> Self {
        ContentNode::Literal(Literal::String(s.into()))
    }

    pub fn mapping<K, I>(entries: I) -> Self
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, ContentNode)>,
    {
        ContentNode::Mapping(entries.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }

    /// Build a variant node from `(key, node)` pairs.
    pub fn variants<K, I>(pairs: I) -> Result<Self>
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, ContentNode)>,
    {
        VariantNode::from_pairs(pairs).map(ContentNode::Variant)
    }

    /// Child of a mapping by key.
    pub fn get(&self, key: &str) -> Option<&ContentNode> {
        match self {
            ContentNode::Mapping(entries) => {
                entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
            }
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            ContentNode::Literal(Literal::String(s)) => Some(s),
            _ => None,
        }
    }

    /// True when the tree contains no variant nodes.
    pub fn is_resolved(&self) -> bool {
        match self {
            ContentNode::Literal(_) => true,
            ContentNode::Variant(_) => false,
            ContentNode::Sequence(items) => items.iter().all(ContentNode::is_resolved),
            ContentNode::Mapping(entries) => entries.iter().all(|(_, v)| v.is_resolved()),
        }
    }

    // ─────────────────────────────────────────────────────────────
    // Parsing
    // ─────────────────────────────────────────────────────────────

    /// Convert a JSON value using the wire form described in the module docs.
    pub fn from_value(value: Value) -> Result<Self> {
        parse_value(value, "")
    }

    pub fn from_json_str(content: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(content)
            .map_err(|e| Error::content_parse("/", format!("invalid JSON: {}", e)))?;
        Self::from_value(value)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let value: Value = toml::from_str(content)
            .map_err(|e| Error::content_parse("/", format!("invalid TOML: {}", e)))?;
        Self::from_value(value)
    }

    /// Load a content file; `.toml` files are parsed as TOML, anything else as JSON.
    pub fn from_path(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| Error::IoRead {
            path: path.to_path_buf(),
            source: e,
        })?;
        match path.extension().and_then(|e| e.to_str()) {
            Some("toml") => Self::from_toml_str(&content),
            _ => Self::from_json_str(&content),
        }
    }

    /// Render back to the wire form.
    pub fn to_value(&self) -> Value {
        match self {
            ContentNode::Literal(lit) => lit.to_value(),
            ContentNode::Variant(node) => {
                let inner: Map<String, Value> = node
                    .iter()
                    .map(|(k, v)| (k.to_string(), v.to_value()))
                    .collect();
                let mut outer = Map::new();
                outer.insert(VARIANTS_MARKER.to_string(), Value::Object(inner));
                Value::Object(outer)
            }
            ContentNode::Sequence(items) => {
                Value::Array(items.iter().map(ContentNode::to_value).collect())
            }
            ContentNode::Mapping(entries) => Value::Object(
                entries
                    .iter()
                    .map(|(k, v)| (k.clone(), v.to_value()))
                    .collect(),
            ),
        }
    }
}

/// Display form of a node path ("" is the root).
pub(crate) fn display_path(path: &str) -> &str {
    if path.is_empty() {
        "/"
    } else {
        path
    }
}

pub(crate) fn child_path(path: &str, key: &str) -> String {
    format!("{}/{}", path, key)
}

fn parse_value(value: Value, path: &str) -> Result<ContentNode> {
    match value {
        Value::Null => Ok(ContentNode::Literal(Literal::Null)),
        Value::Bool(b) => Ok(ContentNode::Literal(Literal::Bool(b))),
        Value::Number(n) => Ok(ContentNode::Literal(Literal::Number(n))),
        Value::String(s) => Ok(ContentNode::Literal(Literal::String(s))),
        Value::Array(items) => items
            .into_iter()
            .enumerate()
            .map(|(i, item)| parse_value(item, &child_path(path, &i.to_string())))
            .collect::<Result<Vec<_>>>()
            .map(ContentNode::Sequence),
        Value::Object(map) => {
            if map.contains_key(VARIANTS_MARKER) {
                parse_variants(map, path)
            } else {
                map.into_iter()
                    .map(|(k, v)| {
                        let node = parse_value(v, &child_path(path, &k))?;
                        Ok((k, node))
                    })
                    .collect::<Result<Vec<_>>>()
                    .map(ContentNode::Mapping)
            }
        }
    }
}

fn parse_variants(mut map: Map<String, Value>, path: &str) -> Result<ContentNode> {
    if map.len() != 1 {
        return Err(Error::content_parse(
            display_path(path),
            format!("'{}' must be the only key of its table", VARIANTS_MARKER),
        ));
    }
    let inner = match map.remove(VARIANTS_MARKER) {
        Some(Value::Object(inner)) => inner,
        _ => {
            return Err(Error::content_parse(
                display_path(path),
                format!("'{}' must be a table of variants", VARIANTS_MARKER),
            ))
        }
    };
    if inner.is_empty() {
        return Err(Error::content_parse(
            display_path(path),
            "variant node declares no variants",
        ));
    }

    let mut variants = BTreeMap::new();
    for (key, value) in inner {
        let node = parse_value(value, &child_path(path, &key))?;
        variants.insert(key, node);
    }
    VariantNode::new(variants).map(ContentNode::Variant)
}

impl Serialize for ContentNode {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        self.to_value().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for ContentNode {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        ContentNode::from_value(value).map_err(de::Error::custom)
    }
}
