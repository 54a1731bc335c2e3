//! Common test utilities and fixtures
//!
//! This module provides shared test infrastructure

#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use assert_cmd::Command;
use tempfile::TempDir;

/// Get the path to the test fixtures directory
pub fn fixtures_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
}

/// Get a path to a specific fixture file
pub fn fixture_path(name: &str) -> PathBuf {
    fixtures_dir().join(name)
}

/// Get the valid config fixture path
pub fn valid_config_fixture() -> PathBuf {
    fixture_path("valid_config.toml")
}

/// Get the invalid config fixture path
pub fn invalid_config_fixture() -> PathBuf {
    fixture_path("invalid_config.toml")
}

/// Bundled theme directory shipped with the crate
pub fn bundled_themes_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("config")
        .join("themes")
}

/// Isolated home, data directory and config file for one CLI test
pub struct TestEnvironment {
    pub root: TempDir,
    pub config_path: PathBuf,
    pub data_dir: PathBuf,
}

impl TestEnvironment {
    pub fn new() -> Self {
        Self::with_default_persona("male")
    }

    pub fn with_default_persona(persona: &str) -> Self {
        let root = TempDir::new().expect("Failed to create temp directory");
        let data_dir = root.path().join("data");
        let config_path = root.path().join("config.toml");

        let config = format!(
            r#"
[theme]
default_persona = "{}"

[preference]
data_dir = "{}"
slot = "persona"

[logging]
level = "warn"
"#,
            persona,
            data_dir.display()
        );
        fs::write(&config_path, config).expect("Failed to write config");

        Self {
            root,
            config_path,
            data_dir,
        }
    }

    pub fn config(&self) -> &str {
        self.config_path.to_str().unwrap()
    }

    pub fn preference_file(&self) -> PathBuf {
        self.data_dir.join("persona")
    }

    pub fn home(&self) -> &Path {
        self.root.path()
    }

    /// A persona-kit command bound to this environment
    pub fn cmd(&self) -> Command {
        let mut cmd = Command::cargo_bin("persona-kit").unwrap();
        cmd.env("HOME", self.home())
            .env_remove("PERSONA_KIT_CONFIG")
            .env_remove("PERSONA_KIT_DATA_DIR")
            .env_remove("PERSONA_KIT_DEFAULT_PERSONA")
            .env_remove("PERSONA_KIT_REGISTRY_DIR")
            .env_remove("RUST_LOG")
            .arg("--config")
            .arg(self.config());
        cmd
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixtures_dir_exists() {
        assert!(fixtures_dir().exists(), "Fixtures directory should exist");
    }

    #[test]
    fn test_valid_config_exists() {
        assert!(
            valid_config_fixture().exists(),
            "Valid config fixture should exist"
        );
    }

    #[test]
    fn test_invalid_config_exists() {
        assert!(
            invalid_config_fixture().exists(),
            "Invalid config fixture should exist"
        );
    }

    #[test]
    fn test_bundled_themes_exist() {
        for name in ["base.toml", "male.toml", "female.toml"] {
            assert!(bundled_themes_dir().join(name).exists(), "{} should exist", name);
        }
    }
}
