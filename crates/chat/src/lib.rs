//! Grounded answer composition
//!
//! Turns a retrieval result plus trimmed conversation history into a final
//! cited answer. The source block is built mechanically from chunk metadata
//! after generation, never by the model, so every citation resolves to a
//! chunk that was actually retrieved.

pub mod citations;
pub mod composer;

pub use citations::format_citation_block;
pub use composer::{ComposedAnswer, GroundedComposer};
