//! Durable storage of the chosen persona.
//!
//! The onboarding flow only depends on the [`PreferenceStore`] contract:
//!
//! - `load` before any `save` returns `Ok(None)`, not an error
//! - `save` returns only once the value is durable; a following `load` in the
//!   same process observes it
//! - `clear` removes the stored value (no sentinel is written)

use async_trait::async_trait;

use crate::error::Result;
use crate::persona::PersonaKey;

pub mod file;
pub mod memory;

pub use file::FilePreferenceStore;
pub use memory::MemoryPreferenceStore;

/// Persistence of a single persona preference slot.
#[async_trait]
pub trait PreferenceStore: Send + Sync {
    /// Read the stored persona, if any.
    async fn load(&self) -> Result<Option<PersonaKey>>;

    /// Store `persona`, replacing any previous value.
    async fn save(&self, persona: PersonaKey) -> Result<()>;

    /// Remove the stored persona. Clearing an empty slot succeeds.
    async fn clear(&self) -> Result<()>;
}
