//! Onboarding states, events and navigation signals.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::persona::PersonaKey;

/// State of an onboarding flow instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", content = "persona", rename_all = "kebab-case")]
pub enum OnboardingState {
    /// Looking for a stored preference (transient).
    Checking,
    /// Waiting for the user to pick a persona.
    Selection,
    /// Showing the picked persona, waiting for confirm or back.
    Preview(PersonaKey),
    /// Persona stored; terminal for this flow instance.
    Committed(PersonaKey),
}

impl OnboardingState {
    /// `Selection` and `Preview` are the only states a user interacts with.
    pub fn is_interactive(&self) -> bool {
        matches!(self, OnboardingState::Selection | OnboardingState::Preview(_))
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, OnboardingState::Committed(_))
    }

    /// The persona currently previewed or committed, if any.
    pub fn persona(&self) -> Option<PersonaKey> {
        match self {
            OnboardingState::Preview(p) | OnboardingState::Committed(p) => Some(*p),
            _ => None,
        }
    }
}

impl Default for OnboardingState {
    fn default() -> Self {
        OnboardingState::Checking
    }
}

impl fmt::Display for OnboardingState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OnboardingState::Checking => write!(f, "checking"),
            OnboardingState::Selection => write!(f, "selection"),
            OnboardingState::Preview(p) => write!(f, "preview({})", p),
            OnboardingState::Committed(p) => write!(f, "committed({})", p),
        }
    }
}

/// User input driving the flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", content = "persona", rename_all = "kebab-case")]
pub enum OnboardingEvent {
    Select(PersonaKey),
    Confirm,
    Back,
}

/// Navigation emitted when a flow reaches `Committed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlowSignal {
    /// A preference already existed; go straight on.
    Skip(PersonaKey),
    /// The user just chose and the choice is stored; go on.
    Proceed(PersonaKey),
}

impl FlowSignal {
    pub fn persona(&self) -> PersonaKey {
        match self {
            FlowSignal::Skip(p) | FlowSignal::Proceed(p) => *p,
        }
    }
}
