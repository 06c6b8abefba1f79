use std::time::Duration;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Cursor position outside the buffer. `Engine::detect_context`
    /// returns it; `Engine::complete` converts it into an empty result
    /// rather than an error dialog.
    #[error("position out of range: line {line}, column {col}")]
    Position { line: usize, col: usize },

    /// The metadata collaborator failed for one source. Carried per-source
    /// in completion diagnostics; only fatal when the whole request has no
    /// usable source left.
    #[error("metadata error for {path}: {message}")]
    Metadata { path: String, message: String },

    /// The request was superseded or dropped. No items are delivered.
    #[error("request cancelled")]
    Cancelled,

    /// An async stage exceeded its deadline.
    #[error("{stage} stage timed out after {}ms", .deadline.as_millis())]
    Timeout {
        stage: &'static str,
        deadline: Duration,
    },

    /// The metadata collaborator violated its interface contract.
    #[error("metadata contract violation: {0}")]
    Fatal(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

pub type Result<T = ()> = std::result::Result<T, Error>;

/// Non-fatal problems attached to a completion outcome. The items that
/// did resolve stay usable; these explain what is missing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Diagnostic {
    /// One metadata source failed; its items were omitted.
    Metadata { path: String, message: String },
    /// A stage hit its deadline; the outcome holds only completed items.
    Timeout { stage: &'static str },
}

impl Error {
    /// Build a per-source metadata error.
    pub fn metadata(path: impl Into<String>, message: impl Into<String>) -> Self {
        Error::Metadata {
            path: path.into(),
            message: message.into(),
        }
    }
}
