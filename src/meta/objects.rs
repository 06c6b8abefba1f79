//! Metadata records shared read-only across requests.
//!
//! Objects carry their parent coordinates as plain path fields instead of
//! back-pointers, so the whole model is acyclic and trivially shareable.

use serde::{Deserialize, Serialize};

/// Kinds of database objects the completion engine distinguishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, derive_more::Display)]
pub enum ObjectKind {
    #[display("TABLE")]
    Table,
    #[display("VIEW")]
    View,
    #[display("SYNONYM")]
    Synonym,
    #[display("PROCEDURE")]
    Procedure,
    #[display("FUNCTION")]
    ScalarFunction,
    #[display("TABLE FUNCTION")]
    TableFunction,
}

/// Fully addressable object coordinates.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct ObjectPath {
    pub database: Option<String>,
    pub schema: Option<String>,
    pub name: String,
}

impl ObjectPath {
    pub fn new(
        database: Option<impl Into<String>>,
        schema: Option<impl Into<String>>,
        name: impl Into<String>,
    ) -> Self {
        Self {
            database: database.map(Into::into),
            schema: schema.map(Into::into),
            name: name.into(),
        }
    }

    /// `schema.name` under a default schema convention.
    pub fn bare(schema: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            database: None,
            schema: Some(schema.into()),
            name: name.into(),
        }
    }

    /// Display path with whatever qualification is present.
    pub fn qualified(&self) -> String {
        match (&self.database, &self.schema) {
            (Some(db), Some(s)) => format!("{db}.{s}.{}", self.name),
            (None, Some(s)) => format!("{s}.{}", self.name),
            _ => self.name.clone(),
        }
    }

    /// Lowercased `schema.name` graph/dedup key (database excluded: FK
    /// traversal stays within one database).
    pub fn key(&self) -> String {
        match &self.schema {
            Some(s) => format!("{}.{}", s.to_lowercase(), self.name.to_lowercase()),
            None => self.name.to_lowercase(),
        }
    }
}

impl std::fmt::Display for ObjectPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.qualified())
    }
}

/// One named object of a given kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DbObject {
    pub path: ObjectPath,
    pub kind: ObjectKind,
    /// Table-valued functions are usable in FROM.
    pub is_table_valued: bool,
}

impl DbObject {
    pub fn new(path: ObjectPath, kind: ObjectKind) -> Self {
        Self {
            is_table_valued: kind == ObjectKind::TableFunction,
            path,
            kind,
        }
    }
}

/// Column metadata with per-column provenance fields.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ColumnInfo {
    pub name: String,
    pub data_type: String,
    /// 1-based ordinal within the table.
    pub ordinal: u32,
    pub nullable: bool,
    pub is_primary_key: bool,
}

/// Procedure / function parameter metadata.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParameterInfo {
    pub name: String,
    pub data_type: String,
    pub ordinal: u32,
    pub has_default: bool,
    pub is_output: bool,
}

/// A foreign-key constraint of one table: local columns referencing
/// columns of another table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForeignKey {
    pub name: String,
    pub columns: Vec<String>,
    pub referenced_table: ObjectPath,
    pub referenced_columns: Vec<String>,
}

/// Which object kinds a dialect's servers expose.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeatureSet {
    pub views: bool,
    pub procedures: bool,
    pub functions: bool,
    pub synonyms: bool,
    pub schemas: bool,
}

impl Default for FeatureSet {
    fn default() -> Self {
        Self {
            views: true,
            procedures: true,
            functions: true,
            synonyms: true,
            schemas: true,
        }
    }
}

/// A user-defined snippet record, loaded through the collaborator.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snippet {
    pub label: String,
    #[serde(default)]
    pub description: String,
    pub insert_text: String,
}
