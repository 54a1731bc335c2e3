//! Onboarding flow instance.

use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::preference::PreferenceStore;

use super::state::{FlowSignal, OnboardingEvent, OnboardingState};

/// One run of the persona selection flow.
///
/// Events are processed one at a time (`dispatch` takes `&mut self`). Once
/// `Committed` is reached the instance is finished; re-running onboarding
/// means creating a new instance.
pub struct OnboardingFlow {
    id: Uuid,
    state: OnboardingState,
    started: bool,
    store: Arc<dyn PreferenceStore>,
    signal_tx: mpsc::UnboundedSender<FlowSignal>,
}

impl OnboardingFlow {
    /// Create a flow in `Checking`. The receiver gets the single navigation
    /// signal emitted when the flow commits.
    pub fn new(store: Arc<dyn PreferenceStore>) -> (Self, mpsc::UnboundedReceiver<FlowSignal>) {
        let (signal_tx, signal_rx) = mpsc::unbounded_channel();
        let flow = Self {
            id: Uuid::new_v4(),
            state: OnboardingState::Checking,
            started: false,
            store,
            signal_tx,
        };
        (flow, signal_rx)
    }

    /// Unique id of this flow instance (appears in log fields).
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn state(&self) -> OnboardingState {
        self.state
    }

    /// Run the checking step.
    ///
    /// A stored preference commits immediately and emits [`FlowSignal::Skip`].
    /// No preference, or a preference that cannot be read, moves to
    /// `Selection`. Calling `start` again is a no-op.
    pub async fn start(&mut self) -> OnboardingState {
        if self.started {
            debug!(flow_id = %self.id, state = %self.state, "Onboarding already started");
            return self.state;
        }
        self.started = true;

        match self.store.load().await {
            Ok(Some(persona)) => {
                info!(flow_id = %self.id, persona = %persona, "Stored persona found, skipping onboarding");
                self.state = OnboardingState::Committed(persona);
                self.emit(FlowSignal::Skip(persona));
            }
            Ok(None) => {
                info!(flow_id = %self.id, "No stored persona, starting selection");
                self.state = OnboardingState::Selection;
            }
            Err(e) => {
                warn!(flow_id = %self.id, error = %e.format_for_log(), "Could not read stored persona, starting selection");
                self.state = OnboardingState::Selection;
            }
        }
        self.state
    }

    /// Apply one user event.
    ///
    /// Returns the new state. A failed save on `Confirm` returns
    /// `Error::PreferenceWrite` and leaves the flow in `Preview`; confirming
    /// again retries the write. Events that make no sense in the current
    /// state return `Error::InvalidTransition` without changing anything.
    pub async fn dispatch(&mut self, event: OnboardingEvent) -> Result<OnboardingState> {
        let next = match (self.state, event) {
            (OnboardingState::Selection, OnboardingEvent::Select(persona)) => {
                OnboardingState::Preview(persona)
            }
            (OnboardingState::Preview(_), OnboardingEvent::Back) => OnboardingState::Selection,
            (OnboardingState::Preview(persona), OnboardingEvent::Confirm) => {
                if let Err(e) = self.store.save(persona).await {
                    warn!(
                        flow_id = %self.id,
                        persona = %persona,
                        error = %e.format_for_log(),
                        "Saving persona failed, staying in preview"
                    );
                    return Err(match e {
                        Error::PreferenceWrite { .. } => e,
                        other => Error::preference_write(persona, other.to_string()),
                    });
                }
                self.emit(FlowSignal::Proceed(persona));
                OnboardingState::Committed(persona)
            }
            (state, event) => {
                debug!(flow_id = %self.id, state = %state, event = ?event, "Rejected onboarding event");
                return Err(Error::InvalidTransition { state, event });
            }
        };

        debug!(flow_id = %self.id, from = %self.state, to = %next, event = ?event, "Onboarding transition");
        self.state = next;
        Ok(next)
    }

    fn emit(&self, signal: FlowSignal) {
        if self.signal_tx.send(signal).is_err() {
            debug!(flow_id = %self.id, signal = ?signal, "No listener for onboarding signal");
        }
    }
}

impl std::fmt::Debug for OnboardingFlow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OnboardingFlow")
            .field("id", &self.id)
            .field("state", &self.state)
            .finish()
    }
}
