//! Dotted-path parsing before the cursor.
//!
//! `db.schema.table`, `schema.table`, `alias.column`: the classifier
//! needs to know what the user has already typed and whether the cursor
//! sits right after a dot. Interpretation of the parts is position
//! sensitive and decided by the consumer; this module only collects and
//! counts them.

use crate::cursor::position::token_index_before;
use crate::sql::{Token, TokenKind};

/// A dotted identifier path read backward from the cursor.
///
/// `parts` are in source order with bracket delimiters stripped;
/// `has_trailing_dot` is true when the cursor sits immediately after a
/// dot (`dbo.│`). When false, the last part is the partial identifier
/// still being typed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QualifiedName {
    pub parts: Vec<String>,
    pub has_trailing_dot: bool,
}

/// One-part interpretation for table contexts: what the typed qualifiers
/// mean and what remains as a filter prefix.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TableQualification {
    pub database: Option<String>,
    pub schema: Option<String>,
    pub prefix: String,
}

impl QualifiedName {
    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }

    /// The qualifier parts, i.e. everything the user has completed with a
    /// dot. Excludes the trailing partial identifier when there is one.
    pub fn qualifiers(&self) -> &[String] {
        if self.has_trailing_dot {
            &self.parts
        } else if self.parts.is_empty() {
            &[]
        } else {
            &self.parts[..self.parts.len() - 1]
        }
    }

    /// The partial identifier under the cursor, when not dot-triggered.
    pub fn prefix_part(&self) -> Option<&str> {
        if self.has_trailing_dot {
            None
        } else {
            self.parts.last().map(String::as_str)
        }
    }

    /// The sole qualifier, for `alias.│column` style lookups.
    pub fn single_qualifier(&self) -> Option<&str> {
        match self.qualifiers() {
            [one] => Some(one.as_str()),
            _ => None,
        }
    }

    /// Position-sensitive reading for table-producing contexts:
    /// one qualifier is a schema (and potentially a database), two are
    /// database.schema, three or more keep the first two.
    pub fn for_table_context(&self) -> TableQualification {
        let quals = self.qualifiers();
        let prefix = self.prefix_part().unwrap_or("").to_string();
        match quals {
            [] => TableQualification {
                prefix,
                ..Default::default()
            },
            [schema] => TableQualification {
                database: None,
                schema: Some(schema.clone()),
                prefix,
            },
            [db, schema, ..] => TableQualification {
                database: Some(db.clone()),
                schema: Some(schema.clone()),
                prefix,
            },
        }
    }
}

/// Parse the dotted path ending at the cursor.
///
/// Scans backward while seeing identifier / bracket-identifier / dot and
/// stops at anything else. Returns the parsed name and whether the scan
/// ended on a dot (dot-triggered completion). A token containing the
/// cursor contributes the slice before the cursor as its final part.
pub fn dotted_name_before(tokens: &[Token], offset: usize) -> (QualifiedName, bool) {
    let mut parts_rev: Vec<String> = Vec::new();
    let mut has_trailing_dot = false;

    // A partially typed identifier under the cursor is the last part.
    let mut idx = match tokens.iter().position(|t| t.contains(offset)) {
        Some(i) if tokens[i].kind.is_ident() => {
            // handled by the prefix extractor; take the whole token's name
            parts_rev.push(tokens[i].name().unwrap_or_default());
            if i == 0 {
                return (
                    QualifiedName {
                        parts: parts_rev,
                        has_trailing_dot,
                    },
                    false,
                );
            }
            i - 1
        }
        _ => match token_index_before(tokens, offset) {
            Some(i) => i,
            None => return (QualifiedName::default(), false),
        },
    };

    // Backward alternation: dot expects an identifier before it; an
    // identifier expects a dot before it to keep going.
    let mut expect_ident = parts_rev.is_empty();
    loop {
        let t = &tokens[idx];
        match &t.kind {
            TokenKind::Dot if !expect_ident || parts_rev.is_empty() => {
                if parts_rev.is_empty() {
                    has_trailing_dot = true;
                }
                expect_ident = true;
            }
            kind if kind.is_ident() && expect_ident => {
                parts_rev.push(t.name().unwrap_or_default());
                expect_ident = false;
            }
            _ => break,
        }
        if idx == 0 {
            break;
        }
        idx -= 1;
    }

    let parts: Vec<String> = parts_rev.into_iter().rev().collect();
    let triggered = has_trailing_dot;
    (
        QualifiedName {
            parts,
            has_trailing_dot,
        },
        triggered,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sql::{Dialect, tokenize};
    use rstest::rstest;

    fn parse(sql: &str, offset: usize) -> (QualifiedName, bool) {
        let stream = tokenize(sql, Dialect::SqlServer);
        dotted_name_before(stream.tokens(), offset)
    }

    #[rstest]
    #[case("SELECT * FROM dbo.", 18, vec!["dbo"], true)]
    #[case("SELECT * FROM db.dbo.", 21, vec!["db", "dbo"], true)]
    #[case("SELECT * FROM dbo.Ord", 21, vec!["dbo", "Ord"], false)]
    #[case("SELECT e.", 9, vec!["e"], true)]
    #[case("SELECT * FROM t WHERE x", 23, vec!["x"], false)]
    fn dotted_paths(
        #[case] sql: &str,
        #[case] offset: usize,
        #[case] parts: Vec<&str>,
        #[case] triggered: bool,
    ) {
        let (qn, trig) = parse(sql, offset);
        assert_eq!(qn.parts, parts);
        assert_eq!(trig, triggered);
        assert_eq!(qn.has_trailing_dot, triggered);
    }

    #[test]
    fn cursor_inside_identifier_contributes_prefix_token() {
        // cursor in the middle of "Orders" after "dbo."
        let (qn, trig) = parse("SELECT * FROM dbo.Orders", 21);
        assert_eq!(qn.parts, vec!["dbo", "Orders"]);
        assert!(!trig);
        assert_eq!(qn.qualifiers(), ["dbo".to_string()]);
    }

    #[test]
    fn bracket_parts_are_unquoted() {
        let (qn, trig) = parse("SELECT * FROM [My Db].[dbo].", 28);
        assert!(trig);
        assert_eq!(qn.parts, vec!["My Db", "dbo"]);
        let q = qn.for_table_context();
        assert_eq!(q.database.as_deref(), Some("My Db"));
        assert_eq!(q.schema.as_deref(), Some("dbo"));
    }

    #[test]
    fn adjacent_identifiers_do_not_merge() {
        // "FROM Customers c": scanning back from after "c" must not
        // swallow "Customers" into the same path.
        let (qn, trig) = parse("SELECT * FROM Customers c", 25);
        assert_eq!(qn.parts, vec!["c"]);
        assert!(!trig);
    }

    #[test]
    fn table_context_interpretation() {
        let (qn, _) = parse("SELECT * FROM db.dbo.Or", 23);
        let q = qn.for_table_context();
        assert_eq!(q.database.as_deref(), Some("db"));
        assert_eq!(q.schema.as_deref(), Some("dbo"));
        assert_eq!(q.prefix, "Or");

        let (qn, _) = parse("SELECT * FROM dbo.", 18);
        let q = qn.for_table_context();
        assert_eq!(q.database, None);
        assert_eq!(q.schema.as_deref(), Some("dbo"));
        assert_eq!(q.prefix, "");
    }

    #[test]
    fn round_trips_source_spans() {
        // rebuilding the dotted path from token spans yields the original
        // substring
        let sql = "SELECT * FROM Sales.dbo.Ord";
        let stream = tokenize(sql, Dialect::SqlServer);
        let (qn, _) = dotted_name_before(stream.tokens(), sql.len());
        assert_eq!(qn.parts.join("."), &sql[14..]);
    }

    #[test]
    fn stops_at_non_path_tokens() {
        let (qn, trig) = parse("SELECT a + b.", 13);
        assert_eq!(qn.parts, vec!["b"]);
        assert!(trig);
    }
}
