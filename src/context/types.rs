//! The classifier's output model: what kind of completion belongs at the
//! cursor, routed by a type + sub-mode pair plus filter hints.

use crate::cursor::LeftSide;
use crate::parse::{CteDefinition, TableReference, TempTable};
use std::collections::HashMap;

/// Primary completion category at the cursor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, derive_more::Display)]
pub enum ContextType {
    #[default]
    #[display("unknown")]
    Unknown,
    #[display("keyword")]
    Keyword,
    #[display("database")]
    Database,
    #[display("schema")]
    Schema,
    #[display("table")]
    Table,
    #[display("column")]
    Column,
    #[display("procedure")]
    Procedure,
    #[display("parameter")]
    Parameter,
    #[display("alias")]
    Alias,
}

/// Sub-mode routing the resolver to the right source bundle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, derive_more::Display)]
pub enum Mode {
    #[default]
    #[display("general")]
    General,
    #[display("start")]
    Start,
    #[display("string")]
    StringLit,
    #[display("comment")]
    Comment,
    #[display("select")]
    Select,
    #[display("from")]
    From,
    #[display("from_qualified")]
    FromQualified,
    #[display("from_cross_db_qualified")]
    FromCrossDbQualified,
    #[display("join")]
    Join,
    #[display("join_qualified")]
    JoinQualified,
    #[display("join_cross_db_qualified")]
    JoinCrossDbQualified,
    #[display("into")]
    Into,
    #[display("into_qualified")]
    IntoQualified,
    #[display("into_cross_db_qualified")]
    IntoCrossDbQualified,
    #[display("update")]
    Update,
    #[display("delete")]
    Delete,
    #[display("merge")]
    Merge,
    #[display("on")]
    On,
    #[display("qualified")]
    Qualified,
    #[display("where")]
    Where,
    #[display("group_by")]
    GroupBy,
    #[display("having")]
    Having,
    #[display("order_by")]
    OrderBy,
    #[display("set")]
    Set,
    #[display("set_value")]
    SetValue,
    #[display("values")]
    Values,
    #[display("insert_columns")]
    InsertColumns,
    #[display("merge_insert_columns")]
    MergeInsertColumns,
    #[display("output")]
    Output,
    #[display("exec")]
    Exec,
    #[display("exec_params")]
    ExecParams,
    #[display("use")]
    Use,
    #[display("database")]
    Database,
}

/// The OUTPUT clause pseudo-tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_more::Display)]
pub enum PseudoTable {
    #[display("inserted")]
    Inserted,
    #[display("deleted")]
    Deleted,
}

/// Filter hints attached to a classification. Only the fields a given
/// (type, mode) pair needs are populated.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ContextHints {
    /// Alias or table the completion is qualified by (`d.│`).
    pub table_ref: Option<String>,
    pub filter_table: Option<String>,
    pub filter_schema: Option<String>,
    pub filter_database: Option<String>,
    /// The user already typed `schema.`; insert text must not re-prefix it.
    pub omit_schema: bool,
    /// The user already typed `table.` (or `alias.`).
    pub omit_table: bool,
    pub schema: Option<String>,
    pub database: Option<String>,
    /// A lone qualifier that may name a database instead of a schema.
    pub potential_database: Option<String>,
    /// Column on the left of a comparison, for type-aware completion.
    pub left_side: Option<LeftSide>,
    /// 0-based index inside the current VALUES tuple.
    pub value_position: Option<usize>,
    pub insert_table: Option<String>,
    pub insert_schema: Option<String>,
    pub is_output_clause: bool,
    pub output_pseudo_table: Option<PseudoTable>,
    pub is_merge_insert: bool,
}

/// The classifier's answer for one cursor position.
#[derive(Debug, Clone, Default)]
pub struct CursorContext {
    pub kind: ContextType,
    pub mode: Mode,
    /// Partial identifier already typed under the cursor.
    pub prefix: String,
    /// Character that induced triggering, when one did.
    pub trigger: Option<char>,
    pub hints: ContextHints,
    pub tables_in_scope: Vec<TableReference>,
    /// Lowercased alias → qualified table path.
    pub aliases: HashMap<String, String>,
    /// Lowercased CTE name → definition (outer statement included).
    pub ctes: HashMap<String, CteDefinition>,
    /// Lowercased temp-table name → definition.
    pub temp_tables: HashMap<String, TempTable>,
    /// Tables captured from an unparsed subquery enclosing the cursor;
    /// these shadow the outer scope.
    pub subquery_tables: Vec<TableReference>,
    pub should_complete: bool,
}

impl CursorContext {
    pub fn new(kind: ContextType, mode: Mode) -> Self {
        Self {
            kind,
            mode,
            should_complete: true,
            ..Default::default()
        }
    }

    /// A context that suppresses completion (strings, comments).
    pub fn suppressed(mode: Mode) -> Self {
        Self {
            kind: ContextType::Unknown,
            mode,
            should_complete: false,
            ..Default::default()
        }
    }

    pub fn with_hints(mut self, hints: ContextHints) -> Self {
        self.hints = hints;
        self
    }
}
