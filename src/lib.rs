//! Persona Kit: persona-aware theming, content and onboarding.
//!
//! The learner picks a persona once during onboarding. From then on every
//! visual token and every piece of written copy is resolved for that persona:
//!
//! - [`theme`]: base design tokens deep-merged with a per-persona override set
//! - [`content`]: content trees whose variant nodes collapse to one persona
//! - [`preference`]: durable storage of the choice
//! - [`onboarding`]: the `checking → selection → preview → committed` flow
//! - [`experience`]: the facade UI code talks to

pub mod cli;
pub mod config;
pub mod content;
pub mod error;
pub mod experience;
pub mod logging;
pub mod onboarding;
pub mod persona;
pub mod preference;
pub mod theme;

pub use content::{ContentNode, ContentResolver, ResolvedNode};
pub use error::{Error, ErrorCode, Result};
pub use experience::Experience;
pub use onboarding::{FlowSignal, OnboardingEvent, OnboardingFlow, OnboardingState};
pub use persona::PersonaKey;
pub use preference::{FilePreferenceStore, MemoryPreferenceStore, PreferenceStore};
pub use theme::{compose, Theme, ThemeRegistry, TokenSet};
