//! Deep-merge composition of token sets.
//!
//! Merge rules:
//! - objects merge key by key, recursively
//! - every other value (scalars, arrays) from the override replaces the base
//!   value wholesale; arrays are never concatenated
//! - keys only present in the base are kept untouched

use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::{Error, Result};
use crate::persona::PersonaKey;

use super::tokens::{join_path, kind_of, TokenSet};

/// Compose `base` with `overlay`, producing a new token set.
///
/// Neither input is modified. Composing the same overlay twice is the same as
/// composing it once.
pub fn compose(base: &TokenSet, overlay: &TokenSet) -> TokenSet {
    let mut merged = base.as_map().clone();
    merge_into(&mut merged, overlay.as_map());
    TokenSet::from_map(merged)
}

fn merge_into(target: &mut Map<String, Value>, overlay: &Map<String, Value>) {
    for (key, value) in overlay {
        if let (Some(Value::Object(existing)), Value::Object(incoming)) =
            (target.get_mut(key), value)
        {
            merge_into(existing, incoming);
            continue;
        }
        target.insert(key.clone(), value.clone());
    }
}

/// Check that `overlay` cannot remove any path covered by `base`.
///
/// Replacing a base table with a leaf would drop every token below it, and
/// replacing a base leaf with a table changes the token's kind. Both are
/// rejected so that a composed theme always covers the base set.
pub fn check_overlay(name: &str, base: &TokenSet, overlay: &TokenSet) -> Result<()> {
    check_maps(name, "", base.as_map(), overlay.as_map())
}

fn check_maps(
    name: &str,
    prefix: &str,
    base: &Map<String, Value>,
    overlay: &Map<String, Value>,
) -> Result<()> {
    for (key, incoming) in overlay {
        let Some(existing) = base.get(key) else {
            continue;
        };
        let path = join_path(prefix, key);
        match (existing, incoming) {
            (Value::Object(b), Value::Object(o)) => check_maps(name, &path, b, o)?,
            (Value::Object(_), other) => {
                return Err(Error::invalid_token_set(
                    name,
                    format!("'{}' is a table in the base set but {} here", path, kind_of(other)),
                ));
            }
            (other, Value::Object(_)) => {
                return Err(Error::invalid_token_set(
                    name,
                    format!("'{}' is {} in the base set but a table here", path, kind_of(other)),
                ));
            }
            _ => {}
        }
    }
    Ok(())
}

// ─────────────────────────────────────────────────────────────────
// Theme
// ─────────────────────────────────────────────────────────────────

/// A fully resolved theme for one persona.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Theme {
    /// Persona this theme was composed for.
    pub persona: PersonaKey,

    /// Composed tokens.
    pub tokens: TokenSet,
}

impl Theme {
    pub fn new(persona: PersonaKey, tokens: TokenSet) -> Self {
        Self { persona, tokens }
    }

    pub fn get(&self, path: &str) -> Option<&Value> {
        self.tokens.get(path)
    }

    pub fn get_str(&self, path: &str) -> Option<&str> {
        self.tokens.get_str(path)
    }

    pub fn get_f64(&self, path: &str) -> Option<f64> {
        self.tokens.get_f64(path)
    }

    /// Look up a token, failing with `TokenNotFound` when absent.
    pub fn require(&self, path: &str) -> Result<&Value> {
        self.tokens.get(path).ok_or_else(|| Error::TokenNotFound {
            path: path.to_string(),
            persona: self.persona,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn set(value: Value) -> TokenSet {
        TokenSet::from_value("test", value).unwrap()
    }

    #[test]
    fn test_leaves_overwrite_and_tables_merge() {
        let base = set(json!({
            "colors": { "primary": { "main": "#111", "light": "#222" }, "text": "#000" },
            "spacing": { "lg": 24 }
        }));
        let overlay = set(json!({
            "colors": { "primary": { "main": "#e91e63" } },
            "radius": { "card": 12 }
        }));

        let merged = compose(&base, &overlay);
        assert_eq!(merged.get_str("colors.primary.main"), Some("#e91e63"));
        assert_eq!(merged.get_str("colors.primary.light"), Some("#222"));
        assert_eq!(merged.get_str("colors.text"), Some("#000"));
        assert_eq!(merged.get_f64("spacing.lg"), Some(24.0));
        assert_eq!(merged.get_f64("radius.card"), Some(12.0));
    }

    #[test]
    fn test_arrays_are_atomic() {
        let base = set(json!({ "gradients": { "hero": ["#000", "#111", "#222"] } }));
        let overlay = set(json!({ "gradients": { "hero": ["#fff"] } }));

        let merged = compose(&base, &overlay);
        assert_eq!(merged.get("gradients.hero"), Some(&json!(["#fff"])));
    }

    #[test]
    fn test_inputs_are_untouched() {
        let base = set(json!({ "colors": { "main": "#111" } }));
        let overlay = set(json!({ "colors": { "main": "#222" } }));
        let before = base.clone();

        let _ = compose(&base, &overlay);
        assert_eq!(base, before);
        assert_eq!(base.get_str("colors.main"), Some("#111"));
    }

    #[test]
    fn test_compose_is_idempotent() {
        let base = set(json!({
            "colors": { "primary": { "main": "#111" } },
            "stops": [1, 2, 3]
        }));
        let overlay = set(json!({
            "colors": { "primary": { "main": "#222", "dark": "#000" } },
            "stops": [4]
        }));

        let once = compose(&base, &overlay);
        let twice = compose(&once, &overlay);
        assert_eq!(once, twice);
    }

    #[test]
    fn test_check_overlay_rejects_table_to_leaf() {
        let base = set(json!({ "colors": { "primary": { "main": "#111" } } }));
        let overlay = set(json!({ "colors": { "primary": "#222" } }));

        let err = check_overlay("female", &base, &overlay).unwrap_err();
        assert!(err.to_string().contains("colors.primary"));
    }

    #[test]
    fn test_check_overlay_rejects_leaf_to_table() {
        let base = set(json!({ "spacing": { "lg": 24 } }));
        let overlay = set(json!({ "spacing": { "lg": { "x": 1 } } }));

        assert!(check_overlay("male", &base, &overlay).is_err());
    }

    #[test]
    fn test_check_overlay_allows_new_paths() {
        let base = set(json!({ "spacing": { "lg": 24 } }));
        let overlay = set(json!({ "spacing": { "xl": 32 }, "motion": { "fast": 120 } }));

        assert!(check_overlay("male", &base, &overlay).is_ok());
    }

    #[test]
    fn test_theme_require() {
        let theme = Theme::new(PersonaKey::Female, set(json!({ "a": { "b": 1 } })));
        assert!(theme.require("a.b").is_ok());
        assert!(matches!(
            theme.require("a.c"),
            Err(Error::TokenNotFound { persona: PersonaKey::Female, .. })
        ));
    }
}
