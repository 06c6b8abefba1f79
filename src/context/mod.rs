//! Cursor-context classification.
//!
//! `classify` inspects the token stream and parsed statement structure
//! around a cursor and answers what kind of completion belongs there,
//! with a sub-mode and filter hints for the resolver. Synchronous and
//! metadata-free by contract.

pub mod classify;
pub mod special;
pub mod types;

pub use classify::classify;
pub use types::{ContextHints, ContextType, CursorContext, Mode, PseudoTable};
