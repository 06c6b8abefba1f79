//! Keyword and built-in-function vocabularies for keyword contexts.
//!
//! Statement-start positions get a curated starter set; general positions
//! get the full SQL vocabulary from the `sqlparser` keyword table. The
//! same table backs the is-this-a-reserved-word check used for insert
//! text quoting.

use crate::context::Mode;
use crate::sql::Dialect;
use sqlparser::keywords::ALL_KEYWORDS;

/// Words that can open a statement.
const STARTERS: &[&str] = &[
    "SELECT", "INSERT", "UPDATE", "DELETE", "MERGE", "WITH", "CREATE", "ALTER", "DROP",
    "TRUNCATE", "BEGIN", "COMMIT", "ROLLBACK", "GRANT", "REVOKE", "SET",
];

const STARTERS_SQLSERVER: &[&str] = &["EXEC", "EXECUTE", "USE", "DECLARE", "GO"];

/// Common built-in scalar functions offered alongside columns.
pub fn builtin_functions(dialect: Dialect) -> &'static [&'static str] {
    const COMMON: &[&str] = &[
        "COUNT", "SUM", "AVG", "MIN", "MAX", "COALESCE", "NULLIF", "CAST", "ABS", "ROUND",
        "UPPER", "LOWER", "LTRIM", "RTRIM", "REPLACE", "CONCAT",
    ];
    const SQLSERVER: &[&str] = &[
        "COUNT", "SUM", "AVG", "MIN", "MAX", "COALESCE", "NULLIF", "CAST", "CONVERT", "ABS",
        "ROUND", "UPPER", "LOWER", "LTRIM", "RTRIM", "REPLACE", "CONCAT", "GETDATE", "GETUTCDATE",
        "DATEADD", "DATEDIFF", "ISNULL", "LEN", "NEWID", "SUBSTRING", "CHARINDEX",
    ];
    const POSTGRES: &[&str] = &[
        "COUNT", "SUM", "AVG", "MIN", "MAX", "COALESCE", "NULLIF", "CAST", "ABS", "ROUND",
        "UPPER", "LOWER", "LTRIM", "RTRIM", "REPLACE", "CONCAT", "NOW", "AGE", "LENGTH",
        "SUBSTRING", "POSITION", "GEN_RANDOM_UUID",
    ];
    match dialect {
        Dialect::SqlServer => SQLSERVER,
        Dialect::Postgres => POSTGRES,
        _ => COMMON,
    }
}

/// Keyword labels for a keyword-context mode.
pub fn keyword_labels(mode: Mode, dialect: Dialect) -> Vec<&'static str> {
    match mode {
        Mode::Start => {
            let mut v: Vec<&'static str> = STARTERS.to_vec();
            if dialect == Dialect::SqlServer {
                v.extend_from_slice(STARTERS_SQLSERVER);
            }
            v
        }
        _ => ALL_KEYWORDS.to_vec(),
    }
}

/// True when `word` is a reserved word and needs delimiting as an
/// identifier.
pub fn is_reserved(word: &str) -> bool {
    let upper = word.to_uppercase();
    ALL_KEYWORDS.binary_search(&upper.as_str()).is_ok()
}
