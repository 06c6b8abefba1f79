//! Type-compatibility checks for value positions.
//!
//! When the column on the left of a comparison (or the target of a SET /
//! VALUES slot) is known, candidates are annotated with how well their
//! type matches. Types normalize by lowercasing and stripping size and
//! precision arguments; a fixed table maps them into broad categories.

/// Broad type families; anything unrecognized is `Unknown` and draws no
/// warning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_more::Display)]
pub enum TypeCategory {
    #[display("numeric")]
    Numeric,
    #[display("string")]
    Text,
    #[display("temporal")]
    Temporal,
    #[display("binary")]
    Binary,
    #[display("boolean")]
    Boolean,
    #[display("uuid")]
    Uuid,
    #[display("json")]
    Json,
    #[display("xml")]
    Xml,
    #[display("unknown")]
    Unknown,
}

/// The verdict for a (left type, candidate type) pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Compatibility {
    Compatible,
    /// Numeric ↔ boolean works through implicit conversion.
    ImplicitConversion,
    /// String ↔ temporal works when the format matches.
    FormatSensitive,
    Incompatible,
}

impl Compatibility {
    /// Short annotation for the item detail, when one applies.
    pub fn note(self) -> Option<&'static str> {
        match self {
            Compatibility::Compatible => None,
            Compatibility::ImplicitConversion => Some("implicit conversion"),
            Compatibility::FormatSensitive => Some("format must match"),
            Compatibility::Incompatible => Some("type mismatch"),
        }
    }

    pub fn demotes(self) -> bool {
        self == Compatibility::Incompatible
    }
}

/// Lowercase and strip a trailing `(n[, m])` size/precision suffix.
pub fn normalize(raw: &str) -> String {
    let lower = raw.trim().to_lowercase();
    match lower.find('(') {
        Some(i) => lower[..i].trim_end().to_string(),
        None => lower,
    }
}

/// Category of a raw type name.
pub fn categorize(raw: &str) -> TypeCategory {
    match normalize(raw).as_str() {
        "int" | "integer" | "bigint" | "smallint" | "tinyint" | "decimal" | "numeric"
        | "float" | "real" | "double" | "double precision" | "money" | "smallmoney"
        | "serial" | "bigserial" | "number" => TypeCategory::Numeric,
        "char" | "varchar" | "nchar" | "nvarchar" | "text" | "ntext" | "character"
        | "character varying" | "string" | "clob" | "citext" => TypeCategory::Text,
        "date" | "datetime" | "datetime2" | "smalldatetime" | "datetimeoffset" | "time"
        | "timestamp" | "timestamptz" | "interval" | "year" => TypeCategory::Temporal,
        "binary" | "varbinary" | "image" | "blob" | "bytea" => TypeCategory::Binary,
        "bit" | "bool" | "boolean" => TypeCategory::Boolean,
        "uniqueidentifier" | "uuid" => TypeCategory::Uuid,
        "json" | "jsonb" => TypeCategory::Json,
        "xml" => TypeCategory::Xml,
        _ => TypeCategory::Unknown,
    }
}

/// Compatibility of a candidate type against the left-side type.
pub fn check(left: &str, candidate: &str) -> Compatibility {
    if normalize(left) == normalize(candidate) {
        return Compatibility::Compatible;
    }
    let l = categorize(left);
    let c = categorize(candidate);
    if l == TypeCategory::Unknown || c == TypeCategory::Unknown {
        return Compatibility::Compatible;
    }
    if l == c {
        return Compatibility::Compatible;
    }
    match (l, c) {
        (TypeCategory::Numeric, TypeCategory::Boolean)
        | (TypeCategory::Boolean, TypeCategory::Numeric) => Compatibility::ImplicitConversion,
        (TypeCategory::Text, TypeCategory::Temporal)
        | (TypeCategory::Temporal, TypeCategory::Text) => Compatibility::FormatSensitive,
        _ => Compatibility::Incompatible,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("NVARCHAR(50)", "nvarchar")]
    #[case("decimal(10, 2)", "decimal")]
    #[case("int", "int")]
    fn normalization(#[case] raw: &str, #[case] expect: &str) {
        assert_eq!(normalize(raw), expect);
    }

    #[rstest]
    #[case("int", "int", Compatibility::Compatible)]
    #[case("varchar(10)", "nvarchar(20)", Compatibility::Compatible)]
    #[case("int", "decimal(10,2)", Compatibility::Compatible)]
    #[case("int", "bit", Compatibility::ImplicitConversion)]
    #[case("bit", "float", Compatibility::ImplicitConversion)]
    #[case("varchar(20)", "datetime", Compatibility::FormatSensitive)]
    #[case("date", "nvarchar(30)", Compatibility::FormatSensitive)]
    #[case("varchar(10)", "int", Compatibility::Incompatible)]
    #[case("uniqueidentifier", "int", Compatibility::Incompatible)]
    #[case("xml", "json", Compatibility::Incompatible)]
    #[case("geography", "int", Compatibility::Compatible)] // unknown draws no warning
    fn verdicts(#[case] left: &str, #[case] right: &str, #[case] expect: Compatibility) {
        assert_eq!(check(left, right), expect, "{left} vs {right}");
    }

    #[test]
    fn only_incompatible_demotes() {
        assert!(Compatibility::Incompatible.demotes());
        assert!(!Compatibility::FormatSensitive.demotes());
        assert!(!Compatibility::ImplicitConversion.demotes());
        assert!(Compatibility::ImplicitConversion.note().is_some());
        assert!(Compatibility::Compatible.note().is_none());
    }
}
