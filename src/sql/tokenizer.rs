//! Lenient SQL tokenizer producing a flat stream of `Token`s.
//!
//! Scope / Intent:
//! - Designed for IDE autocomplete & cursor-aware suggestions.
//! - Accepts incomplete / syntactically invalid SQL (e.g. `SELECT FROM`,
//!   `JOIN , table`); malformed constructs still yield tokens.
//! - Classifies only the structural keyword set in `keyword.rs`; the full
//!   completion vocabulary lives elsewhere.
//!
//! Behavior:
//! - Single forward pass; skips whitespace without emitting it.
//! - Tracks 1-based line/column for every token and records the byte
//!   offset of each line start, so buffer positions convert both ways.
//! - Delimited identifiers keep their delimiters (`[x]`, `"x"`), with
//!   doubled-close escapes. Strings use `''` escapes. Block comments nest.
//! - Unterminated strings / comments / brackets consume to end of input
//!   and report the opening delimiter's position as a diagnostic.
//!
//! Guarantees:
//! - Never panics on valid UTF-8; never returns an error.
//! - O(n) time, O(t) space where `t` is the number of tokens.

use crate::sql::{
    dialect::Dialect,
    keyword::Keyword,
    token::{Position, Token},
    token_kind::TokenKind,
};

/// Where a lexical problem was found; positions name the opening delimiter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LexDiagnostic {
    UnterminatedString(Position),
    UnterminatedBlockComment(Position),
    UnterminatedBracket(Position),
}

impl LexDiagnostic {
    pub const fn position(self) -> Position {
        match self {
            LexDiagnostic::UnterminatedString(p)
            | LexDiagnostic::UnterminatedBlockComment(p)
            | LexDiagnostic::UnterminatedBracket(p) => p,
        }
    }
}

/// The tokenizer output: tokens, diagnostics, and a line index that maps
/// editor positions to byte offsets and back.
#[derive(Debug, Clone, Default)]
pub struct TokenStream {
    tokens: Vec<Token>,
    diagnostics: Vec<LexDiagnostic>,
    line_starts: Vec<usize>,
    text_len: usize,
}

impl TokenStream {
    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }

    pub fn diagnostics(&self) -> &[LexDiagnostic] {
        &self.diagnostics
    }

    pub fn len_bytes(&self) -> usize {
        self.text_len
    }

    /// Byte offset of a 1-based position. Columns beyond the end of the
    /// line clamp to the line end; a line beyond the buffer is `None`.
    pub fn offset_at(&self, text: &str, pos: Position) -> Option<usize> {
        if pos.line == 0 || pos.col == 0 {
            return None;
        }
        let start = *self.line_starts.get(pos.line - 1)?;
        let line_end = self
            .line_starts
            .get(pos.line)
            .map(|next| next.saturating_sub(1))
            .unwrap_or(self.text_len);
        let mut offset = start;
        let mut remaining = pos.col - 1;
        for (i, c) in text[start..line_end].char_indices() {
            if remaining == 0 {
                return Some(start + i);
            }
            remaining -= 1;
            offset = start + i + c.len_utf8();
        }
        Some(offset.min(line_end))
    }

    /// 1-based position of a byte offset (clamped to the buffer).
    pub fn position_at(&self, text: &str, offset: usize) -> Position {
        let offset = offset.min(self.text_len);
        let line_idx = match self.line_starts.binary_search(&offset) {
            Ok(i) => i,
            Err(i) => i - 1,
        };
        let start = self.line_starts[line_idx];
        let col = text[start..offset].chars().count() + 1;
        Position::new(line_idx + 1, col)
    }

    /// True if the token starting at `pos` was reported unterminated.
    pub fn unterminated_at(&self, pos: Position) -> bool {
        self.diagnostics.iter().any(|d| d.position() == pos)
    }
}

struct Lexer<'a> {
    text: &'a str,
    chars: Vec<(usize, char)>,
    i: usize,
    line: usize,
    col: usize,
    line_starts: Vec<usize>,
}

impl<'a> Lexer<'a> {
    fn new(text: &'a str) -> Self {
        Self {
            text,
            chars: text.char_indices().collect(),
            i: 0,
            line: 1,
            col: 1,
            line_starts: vec![0],
        }
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.i).map(|&(_, c)| c)
    }

    fn peek_nth(&self, n: usize) -> Option<char> {
        self.chars.get(self.i + n).map(|&(_, c)| c)
    }

    fn offset(&self) -> usize {
        self.chars
            .get(self.i)
            .map(|&(o, _)| o)
            .unwrap_or(self.text.len())
    }

    fn bump(&mut self) -> Option<char> {
        let &(o, c) = self.chars.get(self.i)?;
        self.i += 1;
        if c == '\n' {
            self.line += 1;
            self.col = 1;
            self.line_starts.push(o + 1);
        } else {
            self.col += 1;
        }
        Some(c)
    }
}

/// Tokenize `sql` for the given dialect. Infallible; problems surface as
/// diagnostics on the returned stream.
pub fn tokenize(sql: &str, dialect: Dialect) -> TokenStream {
    let mut lx = Lexer::new(sql);
    let mut tokens = Vec::new();
    let mut diagnostics = Vec::new();

    while let Some(c) = lx.peek() {
        if c.is_whitespace() {
            lx.bump();
            continue;
        }

        let start = lx.offset();
        let (line, col) = (lx.line, lx.col);
        let pos = Position::new(line, col);

        // Delimited identifier
        if dialect.opens_bracket(c) {
            let close = dialect.closing_bracket(c);
            lx.bump();
            let mut terminated = false;
            while let Some(cc) = lx.peek() {
                lx.bump();
                if cc == close {
                    if lx.peek() == Some(close) {
                        lx.bump(); // doubled close is an escape
                    } else {
                        terminated = true;
                        break;
                    }
                }
            }
            if !terminated {
                diagnostics.push(LexDiagnostic::UnterminatedBracket(pos));
            }
            let end = lx.offset();
            tokens.push(Token::new(
                TokenKind::BracketIdent(sql[start..end].to_string()),
                start,
                end,
                line,
                col,
            ));
            continue;
        }

        // String literal
        if c == '\'' {
            lx.bump();
            let mut terminated = false;
            while let Some(cc) = lx.peek() {
                lx.bump();
                if cc == '\'' {
                    if lx.peek() == Some('\'') {
                        lx.bump();
                    } else {
                        terminated = true;
                        break;
                    }
                }
            }
            if !terminated {
                diagnostics.push(LexDiagnostic::UnterminatedString(pos));
            }
            let end = lx.offset();
            tokens.push(Token::new(
                TokenKind::StringLit(sql[start..end].to_string()),
                start,
                end,
                line,
                col,
            ));
            continue;
        }

        // Line comment
        if c == '-' && lx.peek_nth(1) == Some('-') {
            while let Some(cc) = lx.peek() {
                if cc == '\n' {
                    break;
                }
                lx.bump();
            }
            let end = lx.offset();
            tokens.push(Token::new(
                TokenKind::LineComment(sql[start..end].to_string()),
                start,
                end,
                line,
                col,
            ));
            continue;
        }

        // Block comment, nesting allowed
        if c == '/' && lx.peek_nth(1) == Some('*') {
            lx.bump();
            lx.bump();
            let mut depth = 1usize;
            while depth > 0 {
                match (lx.peek(), lx.peek_nth(1)) {
                    (Some('/'), Some('*')) => {
                        lx.bump();
                        lx.bump();
                        depth += 1;
                    }
                    (Some('*'), Some('/')) => {
                        lx.bump();
                        lx.bump();
                        depth -= 1;
                    }
                    (Some(_), _) => {
                        lx.bump();
                    }
                    (None, _) => {
                        diagnostics.push(LexDiagnostic::UnterminatedBlockComment(pos));
                        break;
                    }
                }
            }
            let end = lx.offset();
            tokens.push(Token::new(
                TokenKind::BlockComment(sql[start..end].to_string()),
                start,
                end,
                line,
                col,
            ));
            continue;
        }

        // Identifier or keyword
        if dialect.starts_ident(c) {
            lx.bump();
            if c == '@' && lx.peek() == Some('@') {
                lx.bump(); // server variables like @@identity
            }
            while let Some(cc) = lx.peek() {
                if dialect.continues_ident(cc) {
                    lx.bump();
                } else {
                    break;
                }
            }
            let end = lx.offset();
            let text = &sql[start..end];
            let lower = text.to_ascii_lowercase();
            let kind = Keyword::classify(&lower, dialect)
                .map(TokenKind::Keyword)
                .unwrap_or_else(|| TokenKind::Ident(text.to_string()));
            tokens.push(Token::new(kind, start, end, line, col));
            continue;
        }

        // Numeric literal
        if c.is_ascii_digit() {
            lx.bump();
            while let Some(cc) = lx.peek() {
                if cc.is_ascii_digit() {
                    lx.bump();
                } else if cc == '.' && lx.peek_nth(1).is_some_and(|d| d.is_ascii_digit()) {
                    lx.bump();
                } else {
                    break;
                }
            }
            let end = lx.offset();
            tokens.push(Token::new(
                TokenKind::Number(sql[start..end].to_string()),
                start,
                end,
                line,
                col,
            ));
            continue;
        }

        // Punctuation and operators
        lx.bump();
        let kind = match c {
            '.' => TokenKind::Dot,
            ',' => TokenKind::Comma,
            ';' => TokenKind::Semicolon,
            '(' => TokenKind::ParenOpen,
            ')' => TokenKind::ParenClose,
            _ => {
                let two = lx.peek().map(|n| {
                    let mut s = String::with_capacity(2);
                    s.push(c);
                    s.push(n);
                    s
                });
                match two.as_deref() {
                    Some(op @ ("<=" | ">=" | "<>" | "!=" | "||" | "::" | ":=")) => {
                        let op = op.to_string();
                        lx.bump();
                        TokenKind::Operator(op)
                    }
                    _ => TokenKind::Operator(c.to_string()),
                }
            }
        };
        let end = lx.offset();
        tokens.push(Token::new(kind, start, end, line, col));
    }

    TokenStream {
        tokens,
        diagnostics,
        line_starts: lx.line_starts,
        text_len: sql.len(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn kinds(sql: &str) -> Vec<TokenKind> {
        tokenize(sql, Dialect::SqlServer)
            .tokens()
            .iter()
            .map(|t| t.kind.clone())
            .collect()
    }

    #[test]
    fn basic_select_sequence() {
        let stream = tokenize("SELECT a, b FROM t", Dialect::SqlServer);
        let toks = stream.tokens();
        assert!(toks.iter().any(|t| t.is_keyword(Keyword::Select)));
        assert!(toks.iter().any(|t| t.is_keyword(Keyword::From)));
        assert!(toks.iter().any(|t| t.ident() == Some("a")));
        assert!(toks.iter().any(|t| t.ident() == Some("t")));
        assert!(stream.diagnostics().is_empty());
    }

    #[test]
    fn positions_are_one_based_and_line_major() {
        let stream = tokenize("SELECT a\n  FROM t", Dialect::SqlServer);
        let toks = stream.tokens();
        assert_eq!(toks[0].position(), Position::new(1, 1));
        assert_eq!(toks[1].position(), Position::new(1, 8));
        let from = toks.iter().find(|t| t.is_keyword(Keyword::From)).unwrap();
        assert_eq!(from.position(), Position::new(2, 3));
        let positions: Vec<_> = toks.iter().map(|t| t.position()).collect();
        let mut sorted = positions.clone();
        sorted.sort();
        assert_eq!(positions, sorted, "positions must be nondecreasing");
    }

    #[test]
    fn bracket_identifier_keeps_delimiters_and_escapes() {
        let stream = tokenize("SELECT * FROM [Order]] Details]", Dialect::SqlServer);
        let tok = stream
            .tokens()
            .iter()
            .find(|t| matches!(t.kind, TokenKind::BracketIdent(_)))
            .unwrap();
        assert_eq!(tok.name(), Some("Order] Details".to_string()));
    }

    #[test]
    fn double_quote_brackets_outside_sqlserver() {
        let stream = tokenize("SELECT \"col name\" FROM t", Dialect::Postgres);
        assert!(
            stream
                .tokens()
                .iter()
                .any(|t| t.name() == Some("col name".to_string()))
        );
    }

    #[rstest]
    #[case("'it''s'", true)]
    #[case("'unterminated", false)]
    fn string_literals(#[case] sql: &str, #[case] terminated: bool) {
        let stream = tokenize(sql, Dialect::SqlServer);
        assert!(matches!(
            stream.tokens()[0].kind,
            TokenKind::StringLit(_)
        ));
        assert_eq!(stream.diagnostics().is_empty(), terminated);
        if !terminated {
            assert_eq!(stream.diagnostics()[0].position(), Position::new(1, 1));
            assert!(stream.unterminated_at(Position::new(1, 1)));
        }
    }

    #[test]
    fn nested_block_comments() {
        let stream = tokenize("/* outer /* inner */ still */ SELECT", Dialect::SqlServer);
        let toks = stream.tokens();
        assert!(matches!(toks[0].kind, TokenKind::BlockComment(_)));
        assert!(toks[1].is_keyword(Keyword::Select));
        assert!(stream.diagnostics().is_empty());
    }

    #[test]
    fn line_comment_runs_to_end_of_line() {
        let stream = tokenize("-- note\nSELECT 1", Dialect::SqlServer);
        let toks = stream.tokens();
        assert!(matches!(toks[0].kind, TokenKind::LineComment(_)));
        assert_eq!(toks[1].position(), Position::new(2, 1));
    }

    #[test]
    fn temp_table_names_are_identifiers() {
        let stream = tokenize("SELECT * INTO #tmp FROM t", Dialect::SqlServer);
        assert!(
            stream
                .tokens()
                .iter()
                .any(|t| t.ident() == Some("#tmp"))
        );
        // '#' never opens an identifier outside sqlserver
        let pg = tokenize("#tmp", Dialect::Postgres);
        assert!(matches!(pg.tokens()[0].kind, TokenKind::Operator(_)));
    }

    #[test]
    fn operators_and_punctuation() {
        assert!(kinds("a <> b").contains(&TokenKind::Operator("<>".into())));
        assert!(kinds("a >= 1").contains(&TokenKind::Operator(">=".into())));
        let ks = kinds("(a.b, c);");
        assert!(ks.contains(&TokenKind::ParenOpen));
        assert!(ks.contains(&TokenKind::Dot));
        assert!(ks.contains(&TokenKind::Comma));
        assert!(ks.contains(&TokenKind::ParenClose));
        assert!(ks.contains(&TokenKind::Semicolon));
    }

    #[test]
    fn numbers() {
        assert!(kinds("1.5").contains(&TokenKind::Number("1.5".into())));
        assert!(kinds("42").contains(&TokenKind::Number("42".into())));
    }

    #[test]
    fn offset_and_position_round_trip() {
        let sql = "SELECT a\nFROM t";
        let stream = tokenize(sql, Dialect::SqlServer);
        let pos = Position::new(2, 6);
        let offset = stream.offset_at(sql, pos).unwrap();
        assert_eq!(offset, 14);
        assert_eq!(stream.position_at(sql, offset), pos);
        // Column past line end clamps, line past buffer is an input error
        assert_eq!(stream.offset_at(sql, Position::new(1, 99)), Some(8));
        assert_eq!(stream.offset_at(sql, Position::new(9, 1)), None);
    }

    #[test]
    fn incomplete_query_tokenization() {
        let stream = tokenize("SELECT ( FROM x", Dialect::SqlServer);
        let toks = stream.tokens();
        assert!(toks.iter().any(|t| t.is_keyword(Keyword::Select)));
        assert!(toks.iter().any(|t| t.is_keyword(Keyword::From)));
        assert!(toks.iter().any(|t| t.ident() == Some("x")));
    }
}
