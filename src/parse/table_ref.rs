//! Table references and the named-table environment of a statement.

use std::ops::Range;

/// What kind of thing a FROM/JOIN/INTO/UPDATE target resolves to. The
/// variants are mutually exclusive by construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TableRefKind {
    #[default]
    Base,
    Cte,
    TempTable {
        global: bool,
    },
    Subquery,
    Tvf,
}

/// An entry in a statement's FROM/JOIN/INTO/UPDATE/DELETE targets.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TableReference {
    pub name: String,
    pub schema: Option<String>,
    pub database: Option<String>,
    pub alias: Option<String>,
    pub kind: TableRefKind,
    /// Projected column names, populated for CTE and subquery references.
    pub columns: Vec<String>,
    /// Base tables a `SELECT *` projection expands over (CTE/subquery
    /// bodies only); resolved against metadata later.
    pub wildcard_sources: Vec<String>,
}

impl TableReference {
    pub fn base(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn is_cte(&self) -> bool {
        self.kind == TableRefKind::Cte
    }

    pub fn is_temp_table(&self) -> bool {
        matches!(self.kind, TableRefKind::TempTable { .. })
    }

    pub fn is_subquery(&self) -> bool {
        self.kind == TableRefKind::Subquery
    }

    pub fn is_tvf(&self) -> bool {
        self.kind == TableRefKind::Tvf
    }

    /// Lowercased lookup key: the alias when present, the name otherwise.
    pub fn key(&self) -> String {
        self.alias
            .as_deref()
            .unwrap_or(&self.name)
            .to_lowercase()
    }

    /// Qualified path string (`db.schema.name`, `schema.name`, or `name`).
    pub fn qualified_path(&self) -> String {
        match (&self.database, &self.schema) {
            (Some(db), Some(schema)) => format!("{db}.{schema}.{}", self.name),
            (None, Some(schema)) => format!("{schema}.{}", self.name),
            _ => self.name.clone(),
        }
    }
}

/// A CTE introduced by `WITH name [(cols)] AS (body)`.
#[derive(Debug, Clone, PartialEq)]
pub struct CteDefinition {
    pub name: String,
    /// Declared or projected column names, in order.
    pub columns: Vec<String>,
    /// Token index range of the defining body, into the buffer stream.
    pub body: Range<usize>,
    /// FROM tables of the body when the projection was `*`.
    pub wildcard_sources: Vec<String>,
}

impl Default for CteDefinition {
    fn default() -> Self {
        Self {
            name: String::new(),
            columns: Vec::new(),
            body: 0..0,
            wildcard_sources: Vec::new(),
        }
    }
}

/// A temp table declared by `CREATE TABLE #t (…)` or `SELECT … INTO #t`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TempTable {
    pub name: String,
    pub columns: Vec<String>,
    pub is_global: bool,
}
