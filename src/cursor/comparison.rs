//! Left-hand-side extraction for comparisons, and prefix/trigger capture.
//!
//! `WHERE price > │`: knowing the column on the left lets the assembler
//! annotate candidates with type compatibility. The scan is backward,
//! comment-skipping, and tolerates a partially typed right-hand value.

use crate::cursor::position::{prev_meaningful, token_index_before};
use crate::sql::{Keyword, Token, TokenKind, TokenStream};

/// The column on the left of a comparison operator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeftSide {
    /// Alias or table qualifier when the left side was `alias.col`.
    pub table: Option<String>,
    pub column: String,
    pub op: String,
}

fn comparison_op(token: &Token) -> Option<String> {
    match &token.kind {
        TokenKind::Operator(op)
            if matches!(op.as_str(), "=" | "!=" | "<>" | "<" | "<=" | ">" | ">=") =>
        {
            Some(op.clone())
        }
        TokenKind::Keyword(Keyword::Like) => Some("like".to_string()),
        TokenKind::Keyword(Keyword::In) => Some("in".to_string()),
        _ => None,
    }
}

/// Detect `identifier OP │` (or `alias.identifier OP │`) walking backward
/// from the cursor. A partially typed right-hand value is stepped over.
pub fn left_side_before(tokens: &[Token], offset: usize) -> Option<LeftSide> {
    let mut idx = token_index_before(tokens, offset)?;
    if !tokens[idx].kind.is_comment() {
        // step over a partially typed right-hand value
        if matches!(
            tokens[idx].kind,
            TokenKind::Ident(_)
                | TokenKind::BracketIdent(_)
                | TokenKind::Number(_)
                | TokenKind::StringLit(_)
        ) && comparison_op(&tokens[idx]).is_none()
        {
            idx = prev_meaningful(tokens, idx)?;
        }
    }
    if tokens[idx].kind.is_comment() {
        idx = prev_meaningful(tokens, idx + 1)?;
    }

    let op = comparison_op(&tokens[idx])?;
    let col_idx = prev_meaningful(tokens, idx)?;
    let column = tokens[col_idx].name()?;

    // Optional `alias.` qualifier before the column
    let table = prev_meaningful(tokens, col_idx)
        .filter(|&dot| matches!(tokens[dot].kind, TokenKind::Dot))
        .and_then(|dot| prev_meaningful(tokens, dot))
        .and_then(|q| tokens[q].name());

    Some(LeftSide { table, column, op })
}

/// The partial identifier under the cursor and the character that induced
/// triggering (`.`, a quote/bracket, a space, or none).
pub fn prefix_and_trigger(text: &str, stream: &TokenStream, offset: usize) -> (String, Option<char>) {
    let offset = offset.min(text.len());
    let mut prefix_start = offset;
    let mut prefix = String::new();

    if let Some(t) = stream.tokens().iter().find(|t| t.contains(offset)) {
        match &t.kind {
            TokenKind::Ident(_) | TokenKind::Keyword(_) | TokenKind::Number(_) => {
                prefix = text[t.start..offset].to_string();
                prefix_start = t.start;
            }
            TokenKind::BracketIdent(_) => {
                // strip the opening delimiter from the typed slice
                let slice = &text[t.start..offset];
                prefix = slice.chars().skip(1).collect();
                prefix_start = t.start + 1;
            }
            _ => {}
        }
    } else if let Some(t) = stream
        .tokens()
        .iter()
        .rev()
        .find(|t| t.end == offset)
    {
        // cursor right at the end of a token: a word there is the prefix
        match &t.kind {
            TokenKind::Ident(_) | TokenKind::Keyword(_) => {
                prefix = text[t.start..t.end].to_string();
                prefix_start = t.start;
            }
            TokenKind::BracketIdent(raw) if stream.unterminated_at(t.position()) => {
                prefix = raw.chars().skip(1).collect();
                prefix_start = t.start + 1;
            }
            _ => {}
        }
    }

    let trigger = text[..prefix_start].chars().next_back().and_then(|c| match c {
        '.' => Some('.'),
        '[' | '"' | '`' | '\'' => Some(c),
        c if c.is_whitespace() => Some(' '),
        _ => None,
    });

    (prefix, trigger)
}
