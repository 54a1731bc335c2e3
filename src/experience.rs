//! Consumer-facing API.
//!
//! [`Experience`] bundles the theme registry, the content resolver and the
//! current onboarding flow. Rendering code gets resolved values passed in
//! explicitly (`get_theme`, `get_content`); nothing is read from global state.

use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::info;

use crate::config::AppConfig;
use crate::content::{ContentNode, ContentResolver, ResolvedNode};
use crate::error::Result;
use crate::onboarding::{FlowSignal, OnboardingEvent, OnboardingFlow, OnboardingState};
use crate::preference::{FilePreferenceStore, PreferenceStore};
use crate::theme::{Theme, ThemeRegistry};

/// Theme, content and onboarding for one running app.
pub struct Experience {
    registry: Arc<ThemeRegistry>,
    resolver: ContentResolver,
    store: Arc<dyn PreferenceStore>,
    flow: OnboardingFlow,
    signals: Option<mpsc::UnboundedReceiver<FlowSignal>>,
}

impl Experience {
    /// Build an experience and run the onboarding checking step.
    pub async fn new(registry: Arc<ThemeRegistry>, store: Arc<dyn PreferenceStore>) -> Self {
        let resolver = ContentResolver::new(registry.default_persona());
        let (mut flow, signals) = OnboardingFlow::new(Arc::clone(&store));
        flow.start().await;

        Self {
            registry,
            resolver,
            store,
            flow,
            signals: Some(signals),
        }
    }

    /// Build from configuration. A broken theme registry is fatal here.
    pub async fn from_config(config: &AppConfig) -> Result<Self> {
        let default_persona = config.default_persona();
        let registry = match config.registry_dir() {
            Some(dir) => ThemeRegistry::from_dir(dir, default_persona)?,
            None => ThemeRegistry::bundled(default_persona)?,
        };
        let store = FilePreferenceStore::new(config.data_dir(), &config.preference.slot);
        Ok(Self::new(Arc::new(registry), Arc::new(store)).await)
    }

    /// Theme for a raw persona key; unrecognized keys get the default persona's theme.
    pub fn get_theme(&self, persona: &str) -> Arc<Theme> {
        self.registry.resolve_str(persona)
    }

    /// Content resolved for a raw persona key.
    pub fn get_content(&self, node: &ContentNode, persona: &str) -> ResolvedNode {
        self.resolver.resolve_str(node, persona)
    }

    pub fn onboarding_state(&self) -> OnboardingState {
        self.flow.state()
    }

    /// Feed one user event to the current onboarding flow.
    pub async fn dispatch(&mut self, event: OnboardingEvent) -> Result<OnboardingState> {
        self.flow.dispatch(event).await
    }

    /// Take the navigation signal receiver of the current flow.
    pub fn take_signals(&mut self) -> Option<mpsc::UnboundedReceiver<FlowSignal>> {
        self.signals.take()
    }

    /// Start a fresh onboarding flow, optionally clearing the stored
    /// preference first.
    pub async fn restart_onboarding(&mut self, clear: bool) -> Result<OnboardingState> {
        if clear {
            self.store.clear().await?;
        }
        let (mut flow, signals) = OnboardingFlow::new(Arc::clone(&self.store));
        let state = flow.start().await;
        info!(previous_flow = %self.flow.id(), flow_id = %flow.id(), state = %state, "Onboarding restarted");

        self.flow = flow;
        self.signals = Some(signals);
        Ok(state)
    }

    pub fn registry(&self) -> &ThemeRegistry {
        &self.registry
    }

    pub fn resolver(&self) -> &ContentResolver {
        &self.resolver
    }
}
