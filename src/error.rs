//! Error types for Persona Kit
//!
//! Provides structured error handling with:
//! - Numeric error codes for machine parsing
//! - User-friendly messages with suggestions
//! - Error context and chaining
//! - Exit codes for CLI
//!
//! Not every variant is returned to callers. `UnrecognizedPersonaKey` and
//! `MissingVariant` are recovered inside the resolvers and only surface as
//! diagnostics in the log (see [`Error::format_for_log`]).

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

use crate::onboarding::{OnboardingEvent, OnboardingState};
use crate::persona::PersonaKey;

/// Result type alias for persona-kit operations
pub type Result<T> = std::result::Result<T, Error>;

/// Numeric error codes for machine parsing and documentation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u16)]
pub enum ErrorCode {
    // Configuration errors (1xx)
    ConfigNotFound = 100,
    ConfigParseError = 101,
    ConfigValidation = 102,

    // IO errors (2xx)
    IoRead = 200,
    IoWrite = 201,
    IoPermission = 202,
    IoNotFound = 203,

    // Theme errors (3xx)
    InvalidTokenSet = 300,
    UnrecognizedPersonaKey = 301,
    TokenNotFound = 302,

    // Content errors (4xx)
    ContentParse = 400,
    MissingVariant = 401,

    // Preference errors (5xx)
    PreferenceRead = 500,
    PreferenceWrite = 501,

    // Onboarding errors (6xx)
    InvalidTransition = 600,

    // Internal errors (9xx)
    InternalError = 900,
}

impl ErrorCode {
    /// Get the string code (e.g., "E100")
    pub fn as_str(&self) -> String {
        format!("E{}", *self as u16)
    }

    /// Get the exit code for CLI (maps to 1-125 range)
    pub fn exit_code(&self) -> i32 {
        match *self as u16 {
            100..=199 => 10, // Config errors
            200..=299 => 20, // IO errors
            300..=399 => 30, // Theme errors
            400..=499 => 40, // Content errors
            500..=599 => 50, // Preference errors
            600..=699 => 60, // Onboarding errors
            900..=999 => 90, // Internal errors
            _ => 1,
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Main error type for persona-kit
#[derive(Error, Debug)]
pub enum Error {
    // ─────────────────────────────────────────────────────────────
    // Configuration Errors
    // ─────────────────────────────────────────────────────────────

    /// Configuration file not found
    #[error("Configuration file not found: {path}")]
    ConfigNotFound { path: PathBuf },

    /// Configuration parse error
    #[error("Failed to parse configuration: {message}")]
    ConfigParse {
        message: String,
        #[source]
        source: Option<toml::de::Error>,
    },

    /// Configuration validation error
    #[error("Configuration validation failed: {message}")]
    ConfigValidation { message: String, field: Option<String> },

    // ─────────────────────────────────────────────────────────────
    // IO Errors
    // ─────────────────────────────────────────────────────────────

    /// File read error
    #[error("Failed to read file: {path}")]
    IoRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// File write error
    #[error("Failed to write file: {path}")]
    IoWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Generic IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// TOML serialization error
    #[error("TOML serialization error: {0}")]
    Toml(#[from] toml::ser::Error),

    /// JSON serialization error
    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    // ─────────────────────────────────────────────────────────────
    // Theme Errors
    // ─────────────────────────────────────────────────────────────

    /// Malformed base or override token set in the theme registry
    #[error("Invalid token set '{name}': {reason}")]
    InvalidTokenSet { name: String, reason: String },

    /// Persona key outside the recognized set (recovered by fallback)
    #[error("Unrecognized persona key '{key}', falling back to '{fallback}'")]
    UnrecognizedPersonaKey { key: String, fallback: String },

    /// Token path lookup failed
    #[error("Token '{path}' not found in theme '{persona}'")]
    TokenNotFound { path: String, persona: PersonaKey },

    // ─────────────────────────────────────────────────────────────
    // Content Errors
    // ─────────────────────────────────────────────────────────────

    /// Content payload could not be parsed into a content tree
    #[error("Malformed content at '{path}': {reason}")]
    ContentParse { path: String, reason: String },

    /// Variant node lacks both the requested and the default key (recovered by fallback)
    #[error("Missing variant '{requested}' at '{path}', using '{chosen}'")]
    MissingVariant {
        path: String,
        requested: String,
        chosen: String,
    },

    /// Content file has variant nodes with neither a default nor every persona
    #[error("{count} malformed variant node(s) in {path}")]
    ContentDefects { path: PathBuf, count: usize },

    // ─────────────────────────────────────────────────────────────
    // Preference Errors
    // ─────────────────────────────────────────────────────────────

    /// Stored preference could not be read
    #[error("Failed to read persona preference: {message}")]
    PreferenceRead { message: String },

    /// Stored preference could not be written
    #[error("Failed to save persona preference '{persona}': {message}")]
    PreferenceWrite { persona: PersonaKey, message: String },

    // ─────────────────────────────────────────────────────────────
    // Onboarding Errors
    // ─────────────────────────────────────────────────────────────

    /// Event not accepted in the current onboarding state
    #[error("Onboarding event {event:?} is not valid in state {state}")]
    InvalidTransition {
        state: OnboardingState,
        event: OnboardingEvent,
    },

    // ─────────────────────────────────────────────────────────────
    // Internal Errors
    // ─────────────────────────────────────────────────────────────

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    // ─────────────────────────────────────────────────────────────
    // Error Classification
    // ─────────────────────────────────────────────────────────────

    /// Get the numeric error code
    pub fn code(&self) -> ErrorCode {
        match self {
            Error::ConfigNotFound { .. } => ErrorCode::ConfigNotFound,
            Error::ConfigParse { .. } => ErrorCode::ConfigParseError,
            Error::ConfigValidation { .. } => ErrorCode::ConfigValidation,

            Error::IoRead { .. } => ErrorCode::IoRead,
            Error::IoWrite { .. } => ErrorCode::IoWrite,
            Error::Io(e) => match e.kind() {
                std::io::ErrorKind::NotFound => ErrorCode::IoNotFound,
                std::io::ErrorKind::PermissionDenied => ErrorCode::IoPermission,
                _ => ErrorCode::IoRead,
            },
            Error::Toml(_) => ErrorCode::ConfigParseError,
            Error::Json(_) => ErrorCode::ContentParse,

            Error::InvalidTokenSet { .. } => ErrorCode::InvalidTokenSet,
            Error::UnrecognizedPersonaKey { .. } => ErrorCode::UnrecognizedPersonaKey,
            Error::TokenNotFound { .. } => ErrorCode::TokenNotFound,

            Error::ContentParse { .. } => ErrorCode::ContentParse,
            Error::MissingVariant { .. } | Error::ContentDefects { .. } => ErrorCode::MissingVariant,

            Error::PreferenceRead { .. } => ErrorCode::PreferenceRead,
            Error::PreferenceWrite { .. } => ErrorCode::PreferenceWrite,

            Error::InvalidTransition { .. } => ErrorCode::InvalidTransition,

            Error::Internal(_) => ErrorCode::InternalError,
        }
    }

    /// Check if the error is retryable
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Error::PreferenceWrite { .. }
                | Error::PreferenceRead { .. }
                | Error::Io(_)
                | Error::IoRead { .. }
                | Error::IoWrite { .. }
        )
    }

    /// Check if the error is fatal (startup must abort)
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Error::ConfigNotFound { .. }
                | Error::ConfigParse { .. }
                | Error::ConfigValidation { .. }
                | Error::InvalidTokenSet { .. }
                | Error::Internal(_)
        )
    }

    /// Whether this error should be shown to the end user rather than only logged
    pub fn is_user_facing(&self) -> bool {
        matches!(self, Error::PreferenceWrite { .. })
    }

    /// Get the exit code for CLI
    pub fn exit_code(&self) -> i32 {
        self.code().exit_code()
    }

    // ─────────────────────────────────────────────────────────────
    // User-Friendly Messages
    // ─────────────────────────────────────────────────────────────

    /// Get a user-friendly suggestion for how to fix this error
    pub fn suggestion(&self) -> Option<&'static str> {
        match self {
            Error::ConfigNotFound { .. } => Some(
                "Run 'persona-kit config init' to create a default configuration file."
            ),
            Error::ConfigParse { .. } => Some(
                "Check your configuration file syntax. Run 'persona-kit config validate' to see details."
            ),
            Error::ConfigValidation { .. } => Some(
                "Review the configuration file and fix the invalid values."
            ),

            Error::InvalidTokenSet { .. } => Some(
                "Fix the theme registry files. Run 'persona-kit theme validate' after editing."
            ),
            Error::TokenNotFound { .. } => Some(
                "Run 'persona-kit theme show' to list the available token paths."
            ),

            Error::ContentParse { .. } => Some(
                "Variant nodes must be objects of the form {\"$variants\": {\"male\": ..., \"female\": ...}}."
            ),
            Error::MissingVariant { .. } | Error::ContentDefects { .. } => Some(
                "Add a \"default\" entry or an entry for every persona to the variant node."
            ),

            Error::PreferenceRead { .. } => Some(
                "Check permissions on the preference data directory."
            ),
            Error::PreferenceWrite { .. } => Some(
                "Your choice was kept. Check free disk space and permissions, then confirm again."
            ),

            _ => None,
        }
    }

    /// Format the error for terminal display with colors
    pub fn format_for_terminal(&self) -> String {
        let code = self.code();
        let suggestion = self.suggestion();

        let mut output = format!(
            "\x1b[31mError [{}]\x1b[0m: {}\n",
            code.as_str(),
            self
        );

        if let Some(hint) = suggestion {
            output.push_str(&format!("\n\x1b[33mHint\x1b[0m: {}\n", hint));
        }

        output
    }

    /// Format the error for logging (no colors)
    pub fn format_for_log(&self) -> String {
        let code = self.code();
        format!("[{}] {}", code.as_str(), self)
    }
}

// ─────────────────────────────────────────────────────────────────
// Error Constructors (for ergonomic error creation)
// ─────────────────────────────────────────────────────────────────

impl Error {
    /// Create a config not found error
    pub fn config_not_found(path: impl Into<PathBuf>) -> Self {
        Error::ConfigNotFound { path: path.into() }
    }

    /// Create a config parse error
    pub fn config_parse(message: impl Into<String>) -> Self {
        Error::ConfigParse {
            message: message.into(),
            source: None,
        }
    }

    /// Create a config validation error
    pub fn config_validation(message: impl Into<String>) -> Self {
        Error::ConfigValidation {
            message: message.into(),
            field: None,
        }
    }

    /// Create a config validation error with field name
    pub fn config_field_invalid(field: impl Into<String>, message: impl Into<String>) -> Self {
        Error::ConfigValidation {
            message: message.into(),
            field: Some(field.into()),
        }
    }

    /// Create an invalid token set error
    pub fn invalid_token_set(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Error::InvalidTokenSet {
            name: name.into(),
            reason: reason.into(),
        }
    }

    /// Create a content parse error
    pub fn content_parse(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Error::ContentParse {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Create a preference write error
    pub fn preference_write(persona: PersonaKey, message: impl Into<String>) -> Self {
        Error::PreferenceWrite {
            persona,
            message: message.into(),
        }
    }
}

// ─────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code_format() {
        assert_eq!(ErrorCode::ConfigNotFound.as_str(), "E100");
        assert_eq!(ErrorCode::InvalidTokenSet.as_str(), "E300");
        assert_eq!(ErrorCode::PreferenceWrite.as_str(), "E501");
        assert_eq!(ErrorCode::InternalError.as_str(), "E900");
    }

    #[test]
    fn test_error_exit_codes() {
        assert_eq!(ErrorCode::ConfigNotFound.exit_code(), 10);
        assert_eq!(ErrorCode::IoRead.exit_code(), 20);
        assert_eq!(ErrorCode::InvalidTokenSet.exit_code(), 30);
        assert_eq!(ErrorCode::MissingVariant.exit_code(), 40);
        assert_eq!(ErrorCode::PreferenceWrite.exit_code(), 50);
        assert_eq!(ErrorCode::InvalidTransition.exit_code(), 60);
        assert_eq!(ErrorCode::InternalError.exit_code(), 90);
    }

    #[test]
    fn test_content_defects_share_missing_variant_code() {
        let err = Error::ContentDefects {
            path: PathBuf::from("lesson.json"),
            count: 2,
        };
        assert_eq!(err.code(), ErrorCode::MissingVariant);
        assert_eq!(err.exit_code(), 40);
        assert!(err.to_string().contains("2 malformed variant node(s) in lesson.json"));
        assert!(err.suggestion().is_some());
    }

    #[test]
    fn test_error_display() {
        let err = Error::config_not_found("/path/to/config.toml");
        assert!(err.to_string().contains("/path/to/config.toml"));

        let err = Error::invalid_token_set("female", "override replaces 'colors' with a leaf");
        assert!(err.to_string().contains("female"));
        assert!(err.to_string().contains("colors"));
    }

    #[test]
    fn test_error_retryable() {
        assert!(Error::preference_write(PersonaKey::Male, "disk full").is_retryable());
        assert!(!Error::invalid_token_set("base", "not a table").is_retryable());
        assert!(!Error::config_not_found("/test").is_retryable());
    }

    #[test]
    fn test_error_fatal() {
        assert!(Error::invalid_token_set("base", "not a table").is_fatal());
        assert!(Error::config_validation("bad").is_fatal());
        assert!(!Error::preference_write(PersonaKey::Female, "x").is_fatal());
        assert!(!Error::MissingVariant {
            path: "/".into(),
            requested: "male".into(),
            chosen: "neutral".into(),
        }
        .is_fatal());
    }

    #[test]
    fn test_only_preference_write_is_user_facing() {
        assert!(Error::preference_write(PersonaKey::Female, "x").is_user_facing());
        assert!(!Error::UnrecognizedPersonaKey {
            key: "robot".into(),
            fallback: "male".into(),
        }
        .is_user_facing());
    }

    #[test]
    fn test_format_for_terminal() {
        let err = Error::config_not_found("/test/config.toml");
        let formatted = err.format_for_terminal();

        assert!(formatted.contains("E100"));
        assert!(formatted.contains("\x1b[31m"));
        assert!(formatted.contains("Hint"));
    }

    #[test]
    fn test_format_for_log() {
        let err = Error::MissingVariant {
            path: "/title".into(),
            requested: "female".into(),
            chosen: "neutral".into(),
        };
        let formatted = err.format_for_log();

        assert!(formatted.contains("[E401]"));
        assert!(!formatted.contains("\x1b["));
    }

    #[test]
    fn test_error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: Error = io_err.into();

        assert_eq!(err.code(), ErrorCode::IoNotFound);
    }
}
