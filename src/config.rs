//! Configuration system for Persona Kit
//!
//! Supports multiple configuration sources with the following precedence (highest to lowest):
//! 1. CLI arguments
//! 2. Environment variables (PERSONA_KIT_* prefix)
//! 3. Configuration file (TOML)
//! 4. Default values

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::persona::PersonaKey;
use crate::preference::file::DEFAULT_SLOT;

/// Main application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Theme registry settings
    pub theme: ThemeSettings,

    /// Persona preference storage
    pub preference: PreferenceSettings,

    /// Logging configuration
    pub logging: LoggingSettings,
}

/// Theme registry settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ThemeSettings {
    /// Directory holding base.toml and one <persona>.toml per persona
    /// (unset = bundled registry)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub registry_dir: Option<String>,

    /// Persona used when a caller passes an unrecognized key
    pub default_persona: String,
}

/// Preference storage settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PreferenceSettings {
    /// Directory holding the preference slot
    pub data_dir: String,

    /// Slot (file) name inside the data directory
    pub slot: String,
}

/// Logging settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// Log level: trace, debug, info, warn, error
    pub level: String,

    /// Log file path (empty = no file logging)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,

    /// Maximum log file size in MB before rotation
    pub max_file_size_mb: u64,

    /// Number of rotated log files to keep
    pub max_files: u32,

    /// Enable JSON formatted logging
    pub json_format: bool,
}

// Default implementations

impl Default for ThemeSettings {
    fn default() -> Self {
        Self {
            registry_dir: None,
            default_persona: PersonaKey::Male.slug().to_string(),
        }
    }
}

impl Default for PreferenceSettings {
    fn default() -> Self {
        Self {
            data_dir: "~/.persona-kit".to_string(),
            slot: DEFAULT_SLOT.to_string(),
        }
    }
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
            file: None,
            max_file_size_mb: 100,
            max_files: 5,
            json_format: false,
        }
    }
}

impl AppConfig {
    /// Load configuration from file with environment variable overrides
    pub fn load(config_path: Option<&str>) -> Result<Self> {
        let mut config = Self::default();

        // 1. Load from config file if it exists
        let config_file = Self::find_config_file(config_path)?;
        if let Some(path) = config_file {
            debug!(path = %path.display(), "Loading configuration file");
            let content = fs::read_to_string(&path).map_err(|e| Error::IoRead {
                path: path.clone(),
                source: e,
            })?;
            config = toml::from_str(&content).map_err(|e| Error::ConfigParse {
                message: format!("{}: {}", path.display(), e.message()),
                source: Some(e),
            })?;
            info!(path = %path.display(), "Configuration loaded from file");
        }

        // 2. Apply environment variable overrides
        config.apply_env_overrides();

        // 3. Expand paths
        config.expand_paths();

        // 4. Validate
        config.validate()?;

        Ok(config)
    }

    /// Find the configuration file to use
    fn find_config_file(explicit_path: Option<&str>) -> Result<Option<PathBuf>> {
        // If explicit path provided, use it (error if not found)
        if let Some(path) = explicit_path {
            let path = PathBuf::from(expand_path(path));
            if path.exists() {
                return Ok(Some(path));
            } else {
                return Err(Error::config_not_found(path));
            }
        }

        // Search in standard locations
        let search_paths = [
            // Current directory
            PathBuf::from("persona-kit.toml"),
            // User config directory
            dirs::config_dir()
                .map(|p| p.join("persona-kit").join("config.toml"))
                .unwrap_or_default(),
            // Home directory
            dirs::home_dir()
                .map(|p| p.join(".persona-kit").join("config.toml"))
                .unwrap_or_default(),
        ];

        for path in &search_paths {
            if !path.as_os_str().is_empty() && path.exists() {
                debug!(path = %path.display(), "Found configuration file");
                return Ok(Some(path.clone()));
            }
        }

        debug!("No configuration file found, using defaults");
        Ok(None)
    }

    /// Apply environment variable overrides
    fn apply_env_overrides(&mut self) {
        // Theme settings
        if let Ok(val) = std::env::var("PERSONA_KIT_REGISTRY_DIR") {
            self.theme.registry_dir = Some(val);
        }
        if let Ok(val) = std::env::var("PERSONA_KIT_DEFAULT_PERSONA") {
            self.theme.default_persona = val;
        }

        // Preference settings
        if let Ok(val) = std::env::var("PERSONA_KIT_DATA_DIR") {
            self.preference.data_dir = val;
        }
        if let Ok(val) = std::env::var("PERSONA_KIT_PREFERENCE_SLOT") {
            self.preference.slot = val;
        }

        // Logging settings
        if let Ok(val) = std::env::var("PERSONA_KIT_LOG_LEVEL") {
            self.logging.level = val;
        }
        if let Ok(val) = std::env::var("PERSONA_KIT_LOG_FILE") {
            self.logging.file = Some(val);
        }
        if let Ok(val) = std::env::var("PERSONA_KIT_LOG_JSON") {
            self.logging.json_format = val.to_lowercase() == "true" || val == "1";
        }
    }

    /// Expand ~ and other path variables
    fn expand_paths(&mut self) {
        self.preference.data_dir = expand_path(&self.preference.data_dir);

        if let Some(ref dir) = self.theme.registry_dir {
            self.theme.registry_dir = Some(expand_path(dir));
        }
        if let Some(ref file) = self.logging.file {
            self.logging.file = Some(expand_path(file));
        }
    }

    /// Validate the configuration
    fn validate(&self) -> Result<()> {
        if let Err(reason) = self.theme.default_persona.parse::<PersonaKey>() {
            return Err(Error::config_field_invalid("theme.default_persona", reason));
        }

        // The slot is a bare file name inside data_dir
        let slot = self.preference.slot.trim();
        if slot.is_empty() {
            return Err(Error::config_field_invalid(
                "preference.slot",
                "Preference slot name cannot be empty",
            ));
        }
        if slot.contains('/') || slot.contains('\\') || slot == "." || slot == ".." {
            return Err(Error::config_field_invalid(
                "preference.slot",
                format!("Preference slot '{}' must be a plain file name", slot),
            ));
        }

        if self.preference.data_dir.is_empty() {
            return Err(Error::config_field_invalid(
                "preference.data_dir",
                "Preference data directory cannot be empty",
            ));
        }

        // Validate log level
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.logging.level.to_lowercase().as_str()) {
            return Err(Error::config_field_invalid(
                "logging.level",
                format!(
                    "Invalid log level '{}'. Must be one of: {}",
                    self.logging.level,
                    valid_levels.join(", ")
                ),
            ));
        }

        Ok(())
    }

    /// The configured default persona (validated on load)
    pub fn default_persona(&self) -> PersonaKey {
        self.theme
            .default_persona
            .parse()
            .unwrap_or(PersonaKey::Male)
    }

    /// Get the preference data directory as a PathBuf
    pub fn data_dir(&self) -> PathBuf {
        PathBuf::from(&self.preference.data_dir)
    }

    /// Get the theme registry directory, if one is configured
    pub fn registry_dir(&self) -> Option<&Path> {
        self.theme.registry_dir.as_deref().map(Path::new)
    }
}

/// Expand ~ and environment variables in paths
fn expand_path(path: &str) -> String {
    shellexpand::full(path)
        .unwrap_or_else(|_| std::borrow::Cow::Borrowed(path))
        .into_owned()
}

/// Initialize a new configuration file
pub fn init_config(path: Option<&str>, force: bool) -> Result<PathBuf> {
    let config_path = path
        .map(|p| PathBuf::from(expand_path(p)))
        .unwrap_or_else(|| {
            dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".persona-kit")
                .join("config.toml")
        });

    // Check if file exists
    if config_path.exists() && !force {
        return Err(Error::config_validation(format!(
            "Configuration file already exists: {}. Use --force to overwrite.",
            config_path.display()
        )));
    }

    // Create parent directories
    if let Some(parent) = config_path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).map_err(|e| Error::IoWrite {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }
    }

    fs::write(&config_path, generate_default_config()).map_err(|e| Error::IoWrite {
        path: config_path.clone(),
        source: e,
    })?;

    info!(path = %config_path.display(), "Configuration file created");
    Ok(config_path)
}

/// Generate default configuration content with comments
fn generate_default_config() -> String {
    r#"# Persona Kit Configuration

[theme]
# Directory with base.toml plus male.toml and female.toml
# (comment out to use the bundled theme registry)
# registry_dir = "~/.persona-kit/themes"

# Persona used when a caller passes an unrecognized persona key
default_persona = "male"

[preference]
# Directory holding the stored persona choice
data_dir = "~/.persona-kit"

# File name of the preference slot inside data_dir
slot = "persona"

[logging]
# Log level: trace, debug, info, warn, error
level = "warn"

# Log file path (comment out to disable file logging)
# file = "~/.persona-kit/logs/persona-kit.log"

# Maximum log file size in MB before rotation
max_file_size_mb = 100

# Number of rotated log files to keep
max_files = 5

# Enable JSON formatted logging
json_format = false
"#
    .to_string()
}
