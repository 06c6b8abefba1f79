//! Completion assembly: item sources, ranking, and the final records.

pub mod assemble;
pub mod compat;
pub mod item;
pub mod keywords;

pub use assemble::{AssembleOptions, Assembler, Assembly};
pub use compat::{Compatibility, TypeCategory};
pub use item::{CompletionItem, CompletionKind, InsertFormat, quote_ident, sort_key};
