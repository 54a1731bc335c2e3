//! Persona Kit CLI
//!
//! Entry point for the `persona-kit` binary: inspect composed themes,
//! resolve persona-variant content files, run the onboarding flow and
//! manage the stored persona preference.

use std::path::Path;
use std::sync::Arc;

use clap::Parser;
use serde_json::Value;
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};
use tracing::{debug, info, warn};

use persona_kit::cli::{
    Cli, Commands, ConfigSubcommand, ContentSubcommand, OutputFormat, PreferenceSubcommand,
    ThemeSubcommand,
};
use persona_kit::config::{self, AppConfig};
use persona_kit::error::{Error, Result};
use persona_kit::logging;
use persona_kit::{
    ContentNode, Experience, FilePreferenceStore, FlowSignal, OnboardingEvent, OnboardingState,
    PersonaKey, PreferenceStore, Theme,
};

fn main() {
    // Parse CLI arguments first (before logging, so we know verbosity)
    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprint!("{}", e.format_for_terminal());
        std::process::exit(e.exit_code());
    }
}

fn run(cli: Cli) -> Result<()> {
    // Config commands use minimal logging and no runtime
    if let Commands::Config { subcommand } = &cli.command {
        logging::init_simple(tracing::Level::WARN)?;
        return handle_config_command(subcommand.clone(), cli.config.as_deref());
    }

    let config = AppConfig::load(cli.config.as_deref())?;
    let _guards = logging::init_logging(&config.logging, cli.verbose, cli.quiet)?;

    debug!(
        default_persona = %config.default_persona(),
        data_dir = %config.data_dir().display(),
        "Configuration loaded"
    );

    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|e| Error::Internal(format!("Failed to create runtime: {}", e)))?;

    rt.block_on(async {
        match cli.command {
            Commands::Theme { subcommand } => handle_theme_command(subcommand, &config).await,
            Commands::Content { subcommand } => handle_content_command(subcommand, &config).await,
            Commands::Onboard { persona, yes } => run_onboarding(&config, persona, yes).await,
            Commands::Preference { subcommand } => {
                handle_preference_command(subcommand, &config).await
            }
            Commands::Config { .. } => Ok(()),
        }
    })
}

// ─────────────────────────────────────────────────────────────────
// Theme / content
// ─────────────────────────────────────────────────────────────────

/// Persona key to use when the user did not pass one: the stored
/// preference, then the configured default.
async fn active_persona(config: &AppConfig) -> String {
    let store = preference_store(config);
    match store.load().await {
        Ok(Some(persona)) => persona.slug().to_string(),
        Ok(None) => config.default_persona().slug().to_string(),
        Err(e) => {
            warn!(error = %e, "Could not read stored persona, using default");
            config.default_persona().slug().to_string()
        }
    }
}

fn preference_store(config: &AppConfig) -> FilePreferenceStore {
    FilePreferenceStore::new(config.data_dir(), &config.preference.slot)
}

async fn handle_theme_command(subcommand: ThemeSubcommand, config: &AppConfig) -> Result<()> {
    let experience = Experience::from_config(config).await?;

    match subcommand {
        ThemeSubcommand::Show { persona, format } => {
            let raw = match persona {
                Some(p) => p,
                None => active_persona(config).await,
            };
            let theme = experience.get_theme(&raw);
            info!(requested = %raw, persona = %theme.persona, "Showing theme");
            print_theme(&theme, format)?;
        }
        ThemeSubcommand::Get { path, persona } => {
            let raw = match persona {
                Some(p) => p,
                None => active_persona(config).await,
            };
            let theme = experience.get_theme(&raw);
            let value = theme.require(&path)?;
            println!("{}", render_scalar(value)?);
        }
        ThemeSubcommand::Validate => {
            let registry = experience.registry();
            let personas: Vec<&str> = PersonaKey::all()
                .iter()
                .filter(|p| registry.override_for(**p).is_some())
                .map(|p| p.slug())
                .collect();
            println!(
                "Theme registry is valid ({} base tokens, personas: {}, default: {}).",
                registry.base().leaf_paths().len(),
                personas.join(", "),
                registry.default_persona()
            );
        }
    }

    Ok(())
}

fn print_theme(theme: &Theme, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&theme.tokens)?),
        OutputFormat::Toml => print!("{}", toml::to_string_pretty(&theme.tokens)?),
    }
    Ok(())
}

/// Strings print bare; everything else prints as JSON.
fn render_scalar(value: &Value) -> Result<String> {
    match value {
        Value::String(s) => Ok(s.clone()),
        other => Ok(serde_json::to_string_pretty(other)?),
    }
}

async fn handle_content_command(subcommand: ContentSubcommand, config: &AppConfig) -> Result<()> {
    match subcommand {
        ContentSubcommand::Resolve { file, persona } => {
            let experience = Experience::from_config(config).await?;
            let node = ContentNode::from_path(Path::new(&file))?;
            let raw = match persona {
                Some(p) => p,
                None => active_persona(config).await,
            };
            let resolved = experience.get_content(&node, &raw);
            println!("{}", serde_json::to_string_pretty(&resolved.to_value())?);
        }
        ContentSubcommand::Check { file } => {
            let node = ContentNode::from_path(Path::new(&file))?;
            let resolver = persona_kit::ContentResolver::new(config.default_persona());
            let defects = resolver.check(&node);

            if defects.is_empty() {
                println!("{}: all variant nodes are well formed.", file);
                return Ok(());
            }

            for defect in &defects {
                println!("{}", defect);
            }
            return Err(Error::ContentDefects {
                path: file.into(),
                count: defects.len(),
            });
        }
    }

    Ok(())
}

// ─────────────────────────────────────────────────────────────────
// Onboarding
// ─────────────────────────────────────────────────────────────────

type StdinLines = Lines<BufReader<Stdin>>;

async fn read_answer(lines: &mut StdinLines) -> Result<Option<String>> {
    let line = lines.next_line().await?;
    Ok(line.map(|l| l.trim().to_lowercase()))
}

async fn run_onboarding(config: &AppConfig, persona: Option<PersonaKey>, yes: bool) -> Result<()> {
    let mut experience = Experience::from_config(config).await?;
    let mut signals = experience
        .take_signals()
        .ok_or_else(|| Error::Internal("Onboarding signals already taken".to_string()))?;

    if let OnboardingState::Committed(existing) = experience.onboarding_state() {
        println!(
            "Persona already chosen: {}. Run 'persona-kit preference clear' to choose again.",
            existing
        );
        return Ok(());
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    if let Some(persona) = persona {
        experience.dispatch(OnboardingEvent::Select(persona)).await?;
        if yes {
            experience.dispatch(OnboardingEvent::Confirm).await?;
        }
    }

    loop {
        match experience.onboarding_state() {
            OnboardingState::Checking => {
                return Err(Error::Internal("Onboarding did not start".to_string()));
            }
            OnboardingState::Selection => {
                println!("Choose your persona [{}]:", persona_choices());
                let Some(answer) = read_answer(&mut lines).await? else {
                    println!("Onboarding cancelled; nothing was saved.");
                    return Ok(());
                };
                match answer.parse::<PersonaKey>() {
                    Ok(p) => {
                        experience.dispatch(OnboardingEvent::Select(p)).await?;
                    }
                    Err(e) => println!("{}", e),
                }
            }
            OnboardingState::Preview(p) => {
                print_preview(&experience.get_theme(p.slug()));
                println!("Keep {}? [y]es / [b]ack:", p.display_name());
                let Some(answer) = read_answer(&mut lines).await? else {
                    println!("Onboarding cancelled; nothing was saved.");
                    return Ok(());
                };
                let event = match answer.as_str() {
                    "y" | "yes" => OnboardingEvent::Confirm,
                    "b" | "back" => OnboardingEvent::Back,
                    _ => {
                        println!("Please answer 'y' or 'b'.");
                        continue;
                    }
                };
                match experience.dispatch(event).await {
                    Ok(_) => {}
                    // Stay in preview so the learner can retry
                    Err(e) if e.is_user_facing() => eprint!("{}", e.format_for_terminal()),
                    Err(e) => return Err(e),
                }
            }
            OnboardingState::Committed(p) => {
                println!("Persona saved: {}", p);
                break;
            }
        }
    }

    if let Ok(FlowSignal::Proceed(p)) = signals.try_recv() {
        debug!(persona = %p, "Proceeding past onboarding");
    }

    Ok(())
}

fn persona_choices() -> String {
    PersonaKey::all()
        .iter()
        .map(|p| p.slug())
        .collect::<Vec<_>>()
        .join("/")
}

fn print_preview(theme: &Arc<Theme>) {
    println!("Preview: {}", theme.persona.display_name());
    for path in ["colors.primary.main", "colors.secondary.main", "colors.background.default"] {
        if let Some(value) = theme.get_str(path) {
            println!("  {:<28} {}", path, value);
        }
    }
}

// ─────────────────────────────────────────────────────────────────
// Preference / config
// ─────────────────────────────────────────────────────────────────

async fn handle_preference_command(
    subcommand: PreferenceSubcommand,
    config: &AppConfig,
) -> Result<()> {
    let store = preference_store(config);

    match subcommand {
        PreferenceSubcommand::Show => match store.load().await? {
            Some(persona) => println!("{}", persona),
            None => println!("(none)"),
        },
        PreferenceSubcommand::Clear => {
            store.clear().await?;
            println!("Persona preference cleared.");
        }
    }

    Ok(())
}

fn handle_config_command(subcommand: ConfigSubcommand, config_path: Option<&str>) -> Result<()> {
    match subcommand {
        ConfigSubcommand::Show => {
            let cfg = AppConfig::load(config_path)?;
            print!("{}", toml::to_string_pretty(&cfg)?);
        }
        ConfigSubcommand::Init { path, force } => {
            let created = config::init_config(path.as_deref(), force)?;
            println!("Created configuration file: {}", created.display());
        }
        ConfigSubcommand::Validate => {
            AppConfig::load(config_path)?;
            println!("Configuration is valid.");
        }
    }

    Ok(())
}
