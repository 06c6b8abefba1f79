//! Context-aware SQL completion core.
//!
//! Given a buffer of SQL text and a cursor position, this crate answers one
//! question: what completion items belong here, and how should each be
//! filtered and sorted? The pipeline is layered:
//!
//! - `sql`      : lenient tokenizer with line/column positions.
//! - `cursor`   : pure utilities over the token stream around a position.
//! - `parse`    : statement chunks, clause regions, scope environment.
//! - `context`  : the cursor-context classifier.
//! - `scope`    : the visible table list and alias map at the cursor.
//! - `meta`     : the metadata collaborator interface and the resolver.
//! - `fk`       : foreign-key join candidates via bounded BFS.
//! - `complete` : assembler, priority bands, item formatting.
//! - `engine`   : the two entry points, `detect_context` and `complete`.
//!
//! The crate owns no I/O: database metadata arrives through the
//! [`meta::MetadataProvider`] trait and everything up to the resolver is
//! synchronous and pure with respect to the input snapshot.

crate::reexport!(error);
crate::reexport!(config);
crate::reexport!(testing, test);

pub mod complete;
pub mod context;
pub mod cursor;
pub mod engine;
pub mod fk;
pub mod meta;
pub mod parse;
pub mod scope;
pub mod sql;

pub use engine::{Completion, CompletionRequest, Engine};

#[allow(unused_imports)]
pub(crate) use tracing::{debug, error as error_log, info, trace, warn};

#[macro_export]
macro_rules! reexport {
    ($module:ident) => {
        $crate::reexport!($module, false);
    };
    ($module:ident, test) => {
        $crate::reexport!($module, true);
    };
    ($module:ident, $is_test:literal) => {
        #[cfg_attr($is_test, cfg(test))]
        mod $module;
        #[cfg_attr($is_test, cfg(test))]
        #[allow(unused_imports)]
        pub use $module::*;
    };
}
