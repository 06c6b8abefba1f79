//! Pure utilities over an immutable token stream and a cursor position.
//!
//! Everything here is synchronous, allocation-light, and byte-offset
//! driven: the engine converts the editor's (line, col) once and the
//! utilities work on offsets from there. Backward scans are paren-depth
//! aware where the classifier needs them to be.

pub mod comparison;
pub mod position;
pub mod qualified;

pub use comparison::{LeftSide, left_side_before, prefix_and_trigger};
pub use position::{
    inside_string_or_comment, last_n_before, paren_depth_before, prev_meaningful, token_at,
    token_at_or_after, token_index_before,
};
pub use qualified::{QualifiedName, TableQualification, dotted_name_before};
