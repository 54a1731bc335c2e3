//! Persona-polymorphic content.
//!
//! Content payloads are opaque trees supplied by authors. Any subtree may be a
//! variant node carrying one value per persona; the [`ContentResolver`]
//! collapses those to the value for the active persona while keeping the
//! surrounding shape intact.

pub mod node;
pub mod resolver;

pub use node::{ContentNode, Literal, VariantNode, VARIANTS_MARKER};
pub use resolver::{ContentDefect, ContentResolver, ResolvedNode, VariantFallback};
