//! CLI argument parsing using clap v4
//!
//! Defines the command-line interface for persona-kit.

use clap::{Parser, Subcommand, ValueEnum};

use crate::persona::PersonaKey;

/// Persona Kit - persona-aware theming and content
///
/// Resolves design tokens and educational copy for the learner's chosen
/// persona, and runs the one-time persona onboarding.
#[derive(Parser, Debug)]
#[command(name = "persona-kit")]
#[command(author, version, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Increase logging verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Path to configuration file
    #[arg(short, long, env = "PERSONA_KIT_CONFIG", global = true)]
    pub config: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Inspect composed themes
    Theme {
        #[command(subcommand)]
        subcommand: ThemeSubcommand,
    },

    /// Resolve or check persona-variant content files
    Content {
        #[command(subcommand)]
        subcommand: ContentSubcommand,
    },

    /// Run the persona onboarding flow
    Onboard {
        /// Persona to select without prompting (male, female)
        #[arg(long)]
        persona: Option<PersonaKey>,

        /// Confirm the selection without prompting
        #[arg(short, long, requires = "persona")]
        yes: bool,
    },

    /// Manage the stored persona preference
    Preference {
        #[command(subcommand)]
        subcommand: PreferenceSubcommand,
    },

    /// Configuration management
    Config {
        #[command(subcommand)]
        subcommand: ConfigSubcommand,
    },
}

/// Output format for token dumps
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Json,
    Toml,
}

/// Theme subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum ThemeSubcommand {
    /// Print the composed theme for a persona
    Show {
        /// Persona key (defaults to the stored preference, then the default persona)
        #[arg(short, long)]
        persona: Option<String>,

        /// Output format
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Json)]
        format: OutputFormat,
    },

    /// Print a single token by dotted path (e.g. colors.primary.main)
    Get {
        /// Dotted token path
        path: String,

        /// Persona key (defaults to the stored preference, then the default persona)
        #[arg(short, long)]
        persona: Option<String>,
    },

    /// Validate the theme registry
    Validate,
}

/// Content subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum ContentSubcommand {
    /// Resolve a content file (JSON or TOML) for a persona
    Resolve {
        /// Content file
        file: String,

        /// Persona key (defaults to the stored preference, then the default persona)
        #[arg(short, long)]
        persona: Option<String>,
    },

    /// Report variant nodes missing both a default and a persona entry
    Check {
        /// Content file
        file: String,
    },
}

/// Preference subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum PreferenceSubcommand {
    /// Show the stored persona
    Show,

    /// Delete the stored persona so onboarding runs again
    Clear,
}

/// Configuration subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum ConfigSubcommand {
    /// Display the current configuration
    Show,

    /// Initialize a new configuration file
    Init {
        /// Path where to create the config file
        #[arg(short, long)]
        path: Option<String>,

        /// Overwrite existing configuration
        #[arg(short, long)]
        force: bool,
    },

    /// Validate a configuration file
    Validate,
}
