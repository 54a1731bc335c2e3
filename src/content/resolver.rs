//! Collapse variant nodes to the value for one persona.
//!
//! Selection order for a variant node:
//!
//! | request              | 1st           | 2nd               | otherwise                      |
//! |----------------------|---------------|-------------------|--------------------------------|
//! | recognized persona   | persona slug  | `default`         | lexicographically-first key    |
//! | unrecognized string  | `default`     | default persona   | lexicographically-first key    |
//!
//! Falling through to the last column is a `MissingVariant` content defect;
//! it is logged and reported, never returned as an error.

use std::fmt;

use tracing::warn;

use crate::error::Error;
use crate::persona::{PersonaKey, DEFAULT_VARIANT_KEY};

use super::node::{child_path, display_path, ContentNode, VariantNode};

/// A content tree with every variant node collapsed.
pub type ResolvedNode = ContentNode;

/// A `MissingVariant` fallback taken during resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariantFallback {
    /// Path of the variant node.
    pub path: String,
    /// Key that was asked for.
    pub requested: String,
    /// Key that was used instead.
    pub chosen: String,
}

impl VariantFallback {
    pub fn to_error(&self) -> Error {
        Error::MissingVariant {
            path: self.path.clone(),
            requested: self.requested.clone(),
            chosen: self.chosen.clone(),
        }
    }
}

/// A variant node that defines neither `default` nor every persona.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentDefect {
    pub path: String,
    pub declared: Vec<String>,
    pub missing: Vec<PersonaKey>,
}

impl fmt::Display for ContentDefect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let missing: Vec<&str> = self.missing.iter().map(PersonaKey::slug).collect();
        write!(
            f,
            "{}: declares [{}] but has no '{}' and no entry for [{}]",
            self.path,
            self.declared.join(", "),
            DEFAULT_VARIANT_KEY,
            missing.join(", ")
        )
    }
}

#[derive(Debug, Clone, Copy)]
enum Request<'a> {
    Persona(PersonaKey),
    Unrecognized(&'a str),
}

impl Request<'_> {
    fn label(&self) -> String {
        match self {
            Request::Persona(p) => p.slug().to_string(),
            Request::Unrecognized(raw) => raw.to_string(),
        }
    }
}

/// Stateless content resolver.
#[derive(Debug, Clone, Copy)]
pub struct ContentResolver {
    default_persona: PersonaKey,
}

impl ContentResolver {
    pub fn new(default_persona: PersonaKey) -> Self {
        Self { default_persona }
    }

    pub fn default_persona(&self) -> PersonaKey {
        self.default_persona
    }

    /// Resolve `node` for `persona`.
    pub fn resolve(&self, node: &ContentNode, persona: PersonaKey) -> ResolvedNode {
        self.resolve_with_report(node, persona).0
    }

    /// Resolve `node` for a raw persona string coming from a caller.
    pub fn resolve_str(&self, node: &ContentNode, raw: &str) -> ResolvedNode {
        let request = match raw.parse::<PersonaKey>() {
            Ok(persona) => Request::Persona(persona),
            Err(_) => {
                let diag = Error::UnrecognizedPersonaKey {
                    key: raw.to_string(),
                    fallback: DEFAULT_VARIANT_KEY.to_string(),
                };
                warn!(code = %diag.code(), key = %raw, "{}", diag);
                Request::Unrecognized(raw)
            }
        };
        let mut fallbacks = Vec::new();
        self.walk(node, request, "", &mut fallbacks)
    }

    /// Resolve and also return every `MissingVariant` fallback taken.
    pub fn resolve_with_report(
        &self,
        node: &ContentNode,
        persona: PersonaKey,
    ) -> (ResolvedNode, Vec<VariantFallback>) {
        let mut fallbacks = Vec::new();
        let resolved = self.walk(node, Request::Persona(persona), "", &mut fallbacks);
        (resolved, fallbacks)
    }

    /// List every malformed variant node in the tree.
    pub fn check(&self, node: &ContentNode) -> Vec<ContentDefect> {
        let mut defects = Vec::new();
        collect_defects(node, "", &mut defects);
        defects
    }

    fn walk(
        &self,
        node: &ContentNode,
        request: Request<'_>,
        path: &str,
        fallbacks: &mut Vec<VariantFallback>,
    ) -> ResolvedNode {
        match node {
            ContentNode::Literal(_) => node.clone(),
            ContentNode::Sequence(items) => ContentNode::Sequence(
                items
                    .iter()
                    .enumerate()
                    .map(|(i, item)| self.walk(item, request, &child_path(path, &i.to_string()), fallbacks))
                    .collect(),
            ),
            ContentNode::Mapping(entries) => ContentNode::Mapping(
                entries
                    .iter()
                    .map(|(k, v)| (k.clone(), self.walk(v, request, &child_path(path, k), fallbacks)))
                    .collect(),
            ),
            ContentNode::Variant(variants) => match self.select(variants, request) {
                Some((key, chosen)) => self.walk(chosen, request, &child_path(path, key), fallbacks),
                None => {
                    // VariantNode is never empty, so `first` always yields.
                    let Some((key, chosen)) = variants.first() else {
                        return ContentNode::null();
                    };
                    let fallback = VariantFallback {
                        path: display_path(path).to_string(),
                        requested: request.label(),
                        chosen: key.to_string(),
                    };
                    let diag = fallback.to_error();
                    warn!(code = %diag.code(), path = %fallback.path, "{}", diag);
                    fallbacks.push(fallback);
                    self.walk(chosen, request, &child_path(path, key), fallbacks)
                }
            },
        }
    }

    fn select<'n>(
        &self,
        variants: &'n VariantNode,
        request: Request<'_>,
    ) -> Option<(&'n str, &'n ContentNode)> {
        let order: [&str; 2] = match request {
            Request::Persona(p) => [p.slug(), DEFAULT_VARIANT_KEY],
            Request::Unrecognized(_) => [DEFAULT_VARIANT_KEY, self.default_persona.slug()],
        };
        order
            .iter()
            .find_map(|key| variants.get(key).map(|node| (*key, node)))
    }
}

impl Default for ContentResolver {
    fn default() -> Self {
        Self::new(PersonaKey::Male)
    }
}

fn collect_defects(node: &ContentNode, path: &str, out: &mut Vec<ContentDefect>) {
    match node {
        ContentNode::Literal(_) => {}
        ContentNode::Sequence(items) => {
            for (i, item) in items.iter().enumerate() {
                collect_defects(item, &child_path(path, &i.to_string()), out);
            }
        }
        ContentNode::Mapping(entries) => {
            for (k, v) in entries {
                collect_defects(v, &child_path(path, k), out);
            }
        }
        ContentNode::Variant(variants) => {
            if !variants.is_well_formed() {
                out.push(ContentDefect {
                    path: display_path(path).to_string(),
                    declared: variants.keys().map(str::to_string).collect(),
                    missing: variants.missing_personas(),
                });
            }
            for (key, child) in variants.iter() {
                collect_defects(child, &child_path(path, key), out);
            }
        }
    }
}
