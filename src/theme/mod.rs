//! Theme composition: design tokens shared by every persona, overlaid with a
//! per-persona override set.
//!
//! A [`ThemeRegistry`] is built once at startup from a base [`TokenSet`] and
//! one override per [`PersonaKey`](crate::persona::PersonaKey). Resolution is
//! pure and cached, so the returned [`Theme`] can be handed to any number of
//! readers.

pub mod compose;
pub mod registry;
pub mod tokens;

pub use compose::{compose, Theme};
pub use registry::ThemeRegistry;
pub use tokens::TokenSet;
