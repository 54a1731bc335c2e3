//! Theme registry: base tokens plus one override set per persona.
//!
//! The bundled registry ships with the binary (`config/themes/*.toml`). A
//! registry directory on disk can replace it; it must contain `base.toml`
//! and `<persona>.toml` for every persona (`.json` is accepted as well).

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::persona::PersonaKey;

use super::compose::{check_overlay, compose, Theme};
use super::tokens::TokenSet;

const BASE_NAME: &str = "base";

/// Static registry of `{PersonaKey -> override TokenSet}` plus one base set,
/// with a per-persona cache of composed themes.
pub struct ThemeRegistry {
    base: TokenSet,
    overrides: HashMap<PersonaKey, TokenSet>,
    default_persona: PersonaKey,
    cache: RwLock<HashMap<PersonaKey, Arc<Theme>>>,
}

impl ThemeRegistry {
    /// Build a registry, validating every override against the base set.
    ///
    /// Fails with `InvalidTokenSet` when a persona has no override entry or
    /// when an override would remove base coverage.
    pub fn new(
        base: TokenSet,
        overrides: HashMap<PersonaKey, TokenSet>,
        default_persona: PersonaKey,
    ) -> Result<Self> {
        for persona in PersonaKey::all() {
            let overlay = overrides.get(persona).ok_or_else(|| {
                Error::invalid_token_set(persona.slug(), "no override token set registered")
            })?;
            check_overlay(persona.slug(), &base, overlay)?;
        }

        debug!(
            base_groups = base.len(),
            default_persona = %default_persona,
            "Theme registry validated"
        );

        Ok(Self {
            base,
            overrides,
            default_persona,
            cache: RwLock::new(HashMap::new()),
        })
    }

    /// Registry built from the token files bundled with the crate.
    pub fn bundled(default_persona: PersonaKey) -> Result<Self> {
        let base = TokenSet::from_toml_str(BASE_NAME, bundled_source(None))?;
        let mut overrides = HashMap::new();
        for persona in PersonaKey::all() {
            let overlay = TokenSet::from_toml_str(persona.slug(), bundled_source(Some(*persona)))?;
            overrides.insert(*persona, overlay);
        }
        Self::new(base, overrides, default_persona)
    }

    /// Registry loaded from `dir`.
    pub fn from_dir(dir: &Path, default_persona: PersonaKey) -> Result<Self> {
        if !dir.is_dir() {
            return Err(Error::invalid_token_set(
                BASE_NAME,
                format!("theme registry directory not found: {}", dir.display()),
            ));
        }

        let base = load_token_file(dir, BASE_NAME)?;
        let mut overrides = HashMap::new();
        for persona in PersonaKey::all() {
            overrides.insert(*persona, load_token_file(dir, persona.slug())?);
        }

        info!(path = %dir.display(), "Theme registry loaded from directory");
        Self::new(base, overrides, default_persona)
    }

    /// The persona used when a caller passes an unrecognized key.
    pub fn default_persona(&self) -> PersonaKey {
        self.default_persona
    }

    pub fn base(&self) -> &TokenSet {
        &self.base
    }

    pub fn override_for(&self, persona: PersonaKey) -> Option<&TokenSet> {
        self.overrides.get(&persona)
    }

    /// Resolve the theme for `persona`, composing on first use.
    pub fn resolve(&self, persona: PersonaKey) -> Arc<Theme> {
        if let Some(theme) = self.cache.read().get(&persona) {
            return Arc::clone(theme);
        }

        let overlay = self.overrides.get(&persona).cloned().unwrap_or_default();
        let composed = Arc::new(Theme::new(persona, compose(&self.base, &overlay)));

        let mut cache = self.cache.write();
        let theme = cache.entry(persona).or_insert(composed);
        debug!(persona = %persona, "Theme composed");
        Arc::clone(theme)
    }

    /// Resolve from a raw persona string. Unrecognized keys resolve to the
    /// default persona's theme (the same shared value).
    pub fn resolve_str(&self, raw: &str) -> Arc<Theme> {
        self.resolve(PersonaKey::resolve_or(raw, self.default_persona))
    }
}

impl std::fmt::Debug for ThemeRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ThemeRegistry")
            .field("base", &self.base)
            .field("personas", &self.overrides.keys().collect::<Vec<_>>())
            .field("default_persona", &self.default_persona)
            .finish()
    }
}

fn bundled_source(persona: Option<PersonaKey>) -> &'static str {
    match persona {
        None => include_str!("../../config/themes/base.toml"),
        Some(PersonaKey::Male) => include_str!("../../config/themes/male.toml"),
        Some(PersonaKey::Female) => include_str!("../../config/themes/female.toml"),
    }
}

/// Load `<dir>/<name>.toml`, or `<dir>/<name>.json` when no TOML file exists.
fn load_token_file(dir: &Path, name: &str) -> Result<TokenSet> {
    let toml_path = dir.join(format!("{}.toml", name));
    let json_path = dir.join(format!("{}.json", name));

    let (path, is_json): (PathBuf, bool) = if toml_path.exists() {
        (toml_path, false)
    } else if json_path.exists() {
        (json_path, true)
    } else {
        return Err(Error::invalid_token_set(
            name,
            format!("missing {}.toml in {}", name, dir.display()),
        ));
    };

    let content = fs::read_to_string(&path).map_err(|e| Error::IoRead {
        path: path.clone(),
        source: e,
    })?;

    debug!(path = %path.display(), "Loading token set");
    if is_json {
        TokenSet::from_json_str(name, &content)
    } else {
        TokenSet::from_toml_str(name, &content)
    }
}
