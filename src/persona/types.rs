//! Core types for the persona system.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::Error;

/// Distinguished key in a content variant node used when no persona-specific
/// entry matches.
pub const DEFAULT_VARIANT_KEY: &str = "default";

// ─────────────────────────────────────────────────────────────────
// Persona Key
// ─────────────────────────────────────────────────────────────────

/// The recognized personas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PersonaKey {
    /// Male-themed variant.
    Male,
    /// Female-themed variant.
    Female,
}

impl PersonaKey {
    /// Slug used in file names, content variant keys and the preference slot.
    pub fn slug(&self) -> &'static str {
        match self {
            PersonaKey::Male => "male",
            PersonaKey::Female => "female",
        }
    }

    /// Human-readable display name.
    pub fn display_name(&self) -> &'static str {
        match self {
            PersonaKey::Male => "Male",
            PersonaKey::Female => "Female",
        }
    }

    /// All recognized persona keys in declaration order.
    pub fn all() -> &'static [PersonaKey] {
        &[PersonaKey::Male, PersonaKey::Female]
    }

    /// Parse `raw`, falling back to `fallback` for anything outside the
    /// recognized set.
    ///
    /// The fallback is logged as an `UnrecognizedPersonaKey` diagnostic: it is
    /// a caller defect, not an end-user error.
    pub fn resolve_or(raw: &str, fallback: PersonaKey) -> PersonaKey {
        match raw.parse() {
            Ok(key) => key,
            Err(_) => {
                let diag = Error::UnrecognizedPersonaKey {
                    key: raw.to_string(),
                    fallback: fallback.slug().to_string(),
                };
                warn!(code = %diag.code(), key = %raw, fallback = %fallback.slug(), "{}", diag);
                fallback
            }
        }
    }
}

impl fmt::Display for PersonaKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.slug())
    }
}

impl FromStr for PersonaKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "male" => Ok(PersonaKey::Male),
            "female" => Ok(PersonaKey::Female),
            _ => Err(format!(
                "Unknown persona '{}'. Valid: male, female",
                s
            )),
        }
    }
}

// ─────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────
