//! Statement segmentation: semicolons and dialect batch separators.

use crate::sql::{Dialect, Keyword, Token, TokenKind};
use std::ops::Range;

/// A raw segment before clause parsing: byte range + token index range.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment {
    pub range: Range<usize>,
    pub token_range: Range<usize>,
}

/// Split the token stream on semicolons and (for SQL Server) on a `GO`
/// that opens its line, both at paren-depth zero. Byte ranges partition
/// the whole buffer: each segment extends to the start of the next.
pub fn split_statements(tokens: &[Token], dialect: Dialect, text_len: usize) -> Vec<Segment> {
    let mut segments = Vec::new();
    let mut depth = 0i32;
    let mut seg_token_start = 0usize;
    let mut seg_byte_start = 0usize;

    let is_batch_separator = |i: usize, t: &Token| -> bool {
        dialect.has_batch_separator()
            && t.is_keyword(Keyword::Go)
            && tokens[..i]
                .iter()
                .rev()
                .find(|p| !p.kind.is_comment())
                .map(|p| p.line < t.line)
                .unwrap_or(true)
    };

    for (i, t) in tokens.iter().enumerate() {
        match t.kind {
            TokenKind::ParenOpen => depth += 1,
            TokenKind::ParenClose => depth -= 1,
            _ => {}
        }
        let splits = depth <= 0
            && (matches!(t.kind, TokenKind::Semicolon) || is_batch_separator(i, t));
        if splits {
            segments.push(Segment {
                range: seg_byte_start..t.end,
                token_range: seg_token_start..i + 1,
            });
            seg_token_start = i + 1;
            seg_byte_start = t.end;
        }
    }

    if seg_token_start < tokens.len() || segments.is_empty() {
        segments.push(Segment {
            range: seg_byte_start..text_len,
            token_range: seg_token_start..tokens.len(),
        });
    } else if let Some(last) = segments.last_mut() {
        last.range.end = text_len;
    }

    segments
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sql::tokenize;

    fn split(sql: &str, dialect: Dialect) -> Vec<Segment> {
        let stream = tokenize(sql, dialect);
        split_statements(stream.tokens(), dialect, sql.len())
    }

    #[test]
    fn splits_on_semicolon_at_depth_zero() {
        let segs = split("SELECT 1; SELECT 2", Dialect::Postgres);
        assert_eq!(segs.len(), 2);
        assert_eq!(segs[0].range, 0..9);
        assert_eq!(segs[1].range, 9..18);
    }

    #[test]
    fn semicolon_inside_parens_does_not_split() {
        // lenient input: a stray semicolon nested in parens stays put
        let segs = split("SELECT (1;2) FROM t", Dialect::Postgres);
        assert_eq!(segs.len(), 1);
    }

    #[test]
    fn go_splits_batches_on_sqlserver_only() {
        let sql = "SELECT 1\nGO\nSELECT 2";
        assert_eq!(split(sql, Dialect::SqlServer).len(), 2);
        assert_eq!(split(sql, Dialect::Postgres).len(), 1);
    }

    #[test]
    fn go_mid_line_is_not_a_separator() {
        // an identifier named go elsewhere on a line must not split
        let segs = split("SELECT 1 GO", Dialect::SqlServer);
        assert_eq!(segs.len(), 1);
    }

    #[test]
    fn empty_buffer_yields_one_empty_segment() {
        let segs = split("", Dialect::Postgres);
        assert_eq!(segs.len(), 1);
        assert_eq!(segs[0].range, 0..0);
        assert!(segs[0].token_range.is_empty());
    }

    #[test]
    fn trailing_text_after_separator_forms_a_segment() {
        let segs = split("SELECT 1; SELECT", Dialect::Postgres);
        assert_eq!(segs.len(), 2);
        assert_eq!(segs[1].range.end, 16);
    }
}
