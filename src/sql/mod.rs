//! Lenient SQL tokenization building blocks.
//!
//! This module groups the pieces the completion engine uses to reason
//! about a SQL buffer near a cursor without a strict parser:
//!
//! - `dialect`    : per-server lexical differences (brackets, `GO`, `#`).
//! - `keyword`    : the structural keyword enum used for clause routing.
//! - `token_kind` : classification of lexical atoms.
//! - `token`      : token struct with byte span and 1-based position.
//! - `tokenizer`  : single pass O(n) lexer producing a `TokenStream`.
//!
//! Design principles carried through the crate:
//! 1. Accept incomplete / syntactically invalid SQL (robust for live
//!    editing); problems become diagnostics, never errors.
//! 2. Preserve original identifier casing for display & lookup.
//! 3. Keep the structural keyword set purposely small.

pub mod dialect;
pub mod keyword;
pub mod token;
pub mod token_kind;
pub mod tokenizer;

pub use dialect::Dialect;
pub use keyword::Keyword;
pub use token::{Position, Token};
pub use token_kind::TokenKind;
pub use tokenizer::{LexDiagnostic, TokenStream, tokenize};

/// Convenience prelude re-exporting the most commonly used items.
pub mod prelude {
    pub use super::{Dialect, Keyword, Position, Token, TokenKind, TokenStream, tokenize};
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tokenize_and_access() {
        let stream = tokenize("SELECT col FROM tbl", Dialect::SqlServer);
        let tokens = stream.tokens();
        assert!(tokens.iter().any(|t| t.is_keyword(Keyword::Select)));
        assert!(tokens.iter().any(|t| t.ident() == Some("col")));
        assert!(tokens.iter().any(|t| t.ident() == Some("tbl")));
    }

    #[test]
    fn prelude_import_works() {
        use super::prelude::*;
        let stream = tokenize("FROM X", Dialect::Postgres);
        assert!(stream.tokens().iter().any(|t| t.is_keyword(Keyword::From)));
    }
}
