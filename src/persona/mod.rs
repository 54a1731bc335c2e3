//! Persona keys, the closed set of audience variants the experience is
//! themed and written for.
//!
//! Every persona-dependent lookup (theme tokens, content variants, the stored
//! preference) is keyed by [`PersonaKey`]. Raw strings coming from callers are
//! parsed once at the edge; unrecognized values fall back to a designated
//! default persona instead of failing.

pub mod types;

pub use types::{PersonaKey, DEFAULT_VARIANT_KEY};
