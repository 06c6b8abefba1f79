//! Structural SQL keywords used for clause routing.
//!
//! This is the set the parser and classifier steer by, not the full SQL
//! vocabulary (keyword *items* offered to the user come from the
//! `sqlparser` keyword table instead, see `complete::keywords`). Matching
//! is case-insensitive via `from_lower` on a pre-lowercased slice. Extend
//! only when a new completion context demands it.

use crate::sql::dialect::Dialect;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Keyword {
    Select,
    From,
    Join,
    Inner,
    Left,
    Right,
    Full,
    Cross,
    Outer,
    On,
    As,
    Where,
    Group,
    Order,
    By,
    Having,
    Set,
    Values,
    Into,
    Insert,
    Update,
    Delete,
    Merge,
    When,
    Matched,
    Not,
    Then,
    Else,
    Case,
    End,
    And,
    Or,
    Exec,
    Execute,
    Use,
    Create,
    Table,
    With,
    Recursive,
    Union,
    Except,
    Intersect,
    Output,
    Inserted,
    Deleted,
    Using,
    Go,
    Limit,
    Offset,
    Distinct,
    All,
    Top,
    Like,
    In,
    Is,
    Null,
    Exists,
    Between,
}

impl Keyword {
    /// Keywords that terminate a FROM/JOIN table list.
    pub const TERMINATORS: [Self; 14] = [
        Keyword::Where,
        Keyword::Group,
        Keyword::Having,
        Keyword::Order,
        Keyword::Union,
        Keyword::Except,
        Keyword::Intersect,
        Keyword::On,
        Keyword::Limit,
        Keyword::Offset,
        Keyword::Set,
        Keyword::Values,
        Keyword::Output,
        Keyword::When,
    ];

    /// JOIN qualifiers that may precede the `JOIN` keyword itself.
    pub const JOIN_QUALIFIERS: [Self; 6] = [
        Keyword::Inner,
        Keyword::Left,
        Keyword::Right,
        Keyword::Full,
        Keyword::Cross,
        Keyword::Outer,
    ];

    /// Words that can never be a table alias.
    pub fn breaks_alias(self) -> bool {
        self != Keyword::As
    }

    /// Attempt to classify a *lower-cased* word slice into a `Keyword`.
    ///
    /// NOTE: the caller lowercases once per lexeme; this function never
    /// allocates.
    pub fn from_lower(word: &str) -> Option<Self> {
        use Keyword::*;
        let kw = match word {
            "select" => Select,
            "from" => From,
            "join" => Join,
            "inner" => Inner,
            "left" => Left,
            "right" => Right,
            "full" => Full,
            "cross" => Cross,
            "outer" => Outer,
            "on" => On,
            "as" => As,
            "where" => Where,
            "group" => Group,
            "order" => Order,
            "by" => By,
            "having" => Having,
            "set" => Set,
            "values" => Values,
            "into" => Into,
            "insert" => Insert,
            "update" => Update,
            "delete" => Delete,
            "merge" => Merge,
            "when" => When,
            "matched" => Matched,
            "not" => Not,
            "then" => Then,
            "else" => Else,
            "case" => Case,
            "end" => End,
            "and" => And,
            "or" => Or,
            "exec" => Exec,
            "execute" => Execute,
            "use" => Use,
            "create" => Create,
            "table" => Table,
            "with" => With,
            "recursive" => Recursive,
            "union" => Union,
            "except" => Except,
            "intersect" => Intersect,
            "output" => Output,
            "inserted" => Inserted,
            "deleted" => Deleted,
            "using" => Using,
            "go" => Go,
            "limit" => Limit,
            "offset" => Offset,
            "distinct" => Distinct,
            "all" => All,
            "top" => Top,
            "like" => Like,
            "in" => In,
            "is" => Is,
            "null" => Null,
            "exists" => Exists,
            "between" => Between,
            _ => return None,
        };
        Some(kw)
    }

    /// Dialect-aware classification: a word that is a keyword in one
    /// dialect stays an identifier in another.
    pub fn classify(word: &str, dialect: Dialect) -> Option<Self> {
        Self::from_lower(word).filter(|kw| kw.in_dialect(dialect))
    }

    /// Whether this keyword exists in the given dialect.
    pub fn in_dialect(self, dialect: Dialect) -> bool {
        use Keyword::*;
        match self {
            Go | Output | Inserted | Deleted | Top | Exec | Execute => {
                dialect == Dialect::SqlServer
            }
            Limit | Offset => dialect != Dialect::SqlServer,
            Merge | Matched => dialect != Dialect::Sqlite,
            _ => true,
        }
    }

    /// Canonical lowercase string form of the keyword.
    pub const fn as_str(self) -> &'static str {
        use Keyword::*;
        match self {
            Select => "select",
            From => "from",
            Join => "join",
            Inner => "inner",
            Left => "left",
            Right => "right",
            Full => "full",
            Cross => "cross",
            Outer => "outer",
            On => "on",
            As => "as",
            Where => "where",
            Group => "group",
            Order => "order",
            By => "by",
            Having => "having",
            Set => "set",
            Values => "values",
            Into => "into",
            Insert => "insert",
            Update => "update",
            Delete => "delete",
            Merge => "merge",
            When => "when",
            Matched => "matched",
            Not => "not",
            Then => "then",
            Else => "else",
            Case => "case",
            End => "end",
            And => "and",
            Or => "or",
            Exec => "exec",
            Execute => "execute",
            Use => "use",
            Create => "create",
            Table => "table",
            With => "with",
            Recursive => "recursive",
            Union => "union",
            Except => "except",
            Intersect => "intersect",
            Output => "output",
            Inserted => "inserted",
            Deleted => "deleted",
            Using => "using",
            Go => "go",
            Limit => "limit",
            Offset => "offset",
            Distinct => "distinct",
            All => "all",
            Top => "top",
            Like => "like",
            In => "in",
            Is => "is",
            Null => "null",
            Exists => "exists",
            Between => "between",
        }
    }

    /// True for the qualifiers that may precede `JOIN`.
    pub fn is_join_qualifier(self) -> bool {
        Self::JOIN_QUALIFIERS.contains(&self)
    }

    /// True if this keyword terminates a FROM/JOIN table list.
    pub fn is_terminator(self) -> bool {
        Self::TERMINATORS.contains(&self)
    }
}

impl std::fmt::Display for Keyword {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
