//! Position lookup and backward scanning over a token stream.

use crate::sql::{Token, TokenKind, TokenStream};

/// The token containing the byte offset, with its index.
pub fn token_at(tokens: &[Token], offset: usize) -> Option<(usize, &Token)> {
    tokens
        .iter()
        .enumerate()
        .find(|(_, t)| t.contains(offset))
}

/// The token containing the offset, or the first token starting at or
/// after it.
pub fn token_at_or_after(tokens: &[Token], offset: usize) -> Option<(usize, &Token)> {
    tokens
        .iter()
        .enumerate()
        .find(|(_, t)| t.contains(offset) || t.start >= offset)
}

/// Index of the last token that ends at or before the offset, i.e. lies
/// strictly before the cursor.
pub fn token_index_before(tokens: &[Token], offset: usize) -> Option<usize> {
    let mut found = None;
    for (i, t) in tokens.iter().enumerate() {
        if t.end <= offset {
            found = Some(i);
        } else {
            break;
        }
    }
    found
}

/// The last `n` tokens strictly before the cursor, in reverse order,
/// comments skipped.
pub fn last_n_before<'a>(tokens: &'a [Token], offset: usize, n: usize) -> Vec<&'a Token> {
    let Some(last) = token_index_before(tokens, offset) else {
        return Vec::new();
    };
    tokens[..=last]
        .iter()
        .rev()
        .filter(|t| !t.kind.is_comment())
        .take(n)
        .collect()
}

/// Step backward from `idx` (exclusive) to the previous non-comment token.
pub fn prev_meaningful(tokens: &[Token], idx: usize) -> Option<usize> {
    tokens[..idx]
        .iter()
        .rposition(|t| !t.kind.is_comment())
}

/// Net parenthesis depth accumulated from the start of the slice up to
/// (but not including) the byte offset.
pub fn paren_depth_before(tokens: &[Token], offset: usize) -> i32 {
    let mut depth = 0;
    for t in tokens {
        if t.start >= offset {
            break;
        }
        match t.kind {
            TokenKind::ParenOpen => depth += 1,
            TokenKind::ParenClose => depth -= 1,
            _ => {}
        }
    }
    depth
}

/// True iff the cursor lies strictly inside a string or comment token.
///
/// For an unterminated token the open span runs to end of input, so a
/// cursor sitting at the very end still counts as inside. A cursor at the
/// end of a line comment (before the newline) extends the comment and
/// counts as inside too.
pub fn inside_string_or_comment<'a>(stream: &'a TokenStream, offset: usize) -> Option<&'a Token> {
    for t in stream.tokens() {
        if t.start >= offset {
            break;
        }
        let inside = match &t.kind {
            TokenKind::LineComment(_) => offset <= t.end,
            TokenKind::BlockComment(_) | TokenKind::StringLit(_) => {
                offset < t.end || (offset == t.end && stream.unterminated_at(t.position()))
            }
            _ => false,
        };
        if inside && offset > t.start {
            return Some(t);
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sql::{Dialect, tokenize};

    fn stream(sql: &str) -> TokenStream {
        tokenize(sql, Dialect::SqlServer)
    }

    #[test]
    fn lookup_at_and_after() {
        let s = stream("SELECT name FROM t");
        let toks = s.tokens();
        let (_, t) = token_at(toks, 8).unwrap();
        assert_eq!(t.ident(), Some("name"));
        // offset 6 is the space after SELECT: no containing token
        assert!(token_at(toks, 6).is_none());
        let (_, t) = token_at_or_after(toks, 6).unwrap();
        assert_eq!(t.ident(), Some("name"));
    }

    #[test]
    fn backward_window_is_reversed_and_comment_free() {
        let s = stream("SELECT a /* c */ FROM t WHERE");
        let toks = s.tokens();
        let window = last_n_before(toks, s.len_bytes(), 3);
        let texts: Vec<_> = window
            .iter()
            .map(|t| t.name().unwrap_or_else(|| format!("{:?}", t.kind)))
            .collect();
        assert_eq!(texts.len(), 3);
        assert_eq!(window[1].ident(), Some("t"));
    }

    #[test]
    fn depth_counting() {
        let s = stream("SELECT (SELECT (1)) FROM (x");
        assert_eq!(paren_depth_before(s.tokens(), s.len_bytes()), 1);
        assert_eq!(paren_depth_before(s.tokens(), 8), 1);
    }

    #[test]
    fn string_gate() {
        let sql = "SELECT 'ab' FROM t";
        let s = stream(sql);
        assert!(inside_string_or_comment(&s, 8).is_some()); // between quotes
        assert!(inside_string_or_comment(&s, 7).is_none()); // before opening quote
        assert!(inside_string_or_comment(&s, 11).is_none()); // after closing quote
    }

    #[test]
    fn unterminated_string_gate_extends_to_end() {
        let sql = "SELECT 'ab";
        let s = stream(sql);
        assert!(inside_string_or_comment(&s, sql.len()).is_some());
    }

    #[test]
    fn line_comment_gate_holds_at_end_of_line() {
        let sql = "-- note\nSELECT 1";
        let s = stream(sql);
        assert!(inside_string_or_comment(&s, 7).is_some()); // end of comment text
        assert!(inside_string_or_comment(&s, 9).is_none()); // next line
    }
}
