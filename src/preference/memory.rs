//! In-process preference slot, for embedding and tests.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::error::{Error, Result};
use crate::persona::PersonaKey;

use super::PreferenceStore;

/// Preference store backed by memory.
///
/// `set_fail_saves(true)` makes every `save` fail, which is how the retry
/// path of onboarding is exercised.
#[derive(Debug, Default)]
pub struct MemoryPreferenceStore {
    slot: Mutex<Option<PersonaKey>>,
    fail_saves: AtomicBool,
    save_calls: AtomicUsize,
}

impl MemoryPreferenceStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-populated with `persona`.
    pub fn with_preference(persona: PersonaKey) -> Self {
        let store = Self::default();
        *store.slot.lock() = Some(persona);
        store
    }

    pub fn set_fail_saves(&self, fail: bool) {
        self.fail_saves.store(fail, Ordering::SeqCst);
    }

    /// Number of `save` calls so far, failed ones included.
    pub fn save_calls(&self) -> usize {
        self.save_calls.load(Ordering::SeqCst)
    }

    /// Current slot contents without going through the async contract.
    pub fn peek(&self) -> Option<PersonaKey> {
        *self.slot.lock()
    }
}

#[async_trait]
impl PreferenceStore for MemoryPreferenceStore {
    async fn load(&self) -> Result<Option<PersonaKey>> {
        Ok(*self.slot.lock())
    }

    async fn save(&self, persona: PersonaKey) -> Result<()> {
        self.save_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_saves.load(Ordering::SeqCst) {
            return Err(Error::preference_write(persona, "storage unavailable"));
        }
        *self.slot.lock() = Some(persona);
        Ok(())
    }

    async fn clear(&self) -> Result<()> {
        *self.slot.lock() = None;
        Ok(())
    }
}
