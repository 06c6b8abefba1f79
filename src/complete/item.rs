//! The completion item record, priority bands, sort keys, and the LSP
//! wire conversion.
//!
//! `sort_text` encodes a 4-digit zero-padded priority (usage weight
//! subtracts from it, bounded so bands never swap) followed by a
//! secondary key: the column ordinal for columns, the lowercased label
//! for everything else. Consumers sort lexicographically.

use crate::complete::keywords::is_reserved;
use crate::sql::Dialect;

/// Domain item kinds, each owning a priority band.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CompletionKind {
    Cte,
    TempTable,
    Table,
    View,
    Synonym,
    TableFunction,
    ScalarFunction,
    Schema,
    Database,
    Column,
    Alias,
    Procedure,
    Parameter,
    FkJoin,
    BuiltinFunction,
    Keyword,
    Snippet,
}

/// Usage weight may subtract at most this much from a band; every band
/// gap is at least 10, so bands cannot swap.
pub const MAX_USAGE_ADJUST: u32 = 9;

/// Fixed offset added to the band of a type-incompatible candidate.
pub const INCOMPATIBLE_DEMOTION: u16 = 30;

impl CompletionKind {
    /// Base priority band; lower sorts earlier. FK bands add
    /// `(hop - 1) * 10` on top of `FkJoin`.
    pub const fn band(self) -> u16 {
        match self {
            CompletionKind::Cte => 100,
            CompletionKind::TempTable => 110,
            CompletionKind::Table => 120,
            CompletionKind::View => 130,
            CompletionKind::Synonym => 140,
            CompletionKind::TableFunction => 150,
            CompletionKind::ScalarFunction => 160,
            CompletionKind::Schema => 170,
            CompletionKind::Database => 180,
            CompletionKind::Column => 100,
            CompletionKind::Alias => 115,
            CompletionKind::Procedure => 120,
            CompletionKind::Parameter => 100,
            CompletionKind::FkJoin => 200,
            CompletionKind::BuiltinFunction => 300,
            CompletionKind::Keyword => 400,
            CompletionKind::Snippet => 500,
        }
    }

    pub const fn lsp_kind(self) -> lsp_types::CompletionItemKind {
        use lsp_types::CompletionItemKind as K;
        match self {
            CompletionKind::Column => K::FIELD,
            CompletionKind::Table | CompletionKind::TempTable => K::CLASS,
            CompletionKind::Cte | CompletionKind::View => K::STRUCT,
            CompletionKind::Synonym | CompletionKind::FkJoin => K::REFERENCE,
            CompletionKind::TableFunction
            | CompletionKind::ScalarFunction
            | CompletionKind::BuiltinFunction
            | CompletionKind::Procedure => K::FUNCTION,
            CompletionKind::Schema => K::MODULE,
            CompletionKind::Database => K::FOLDER,
            CompletionKind::Alias | CompletionKind::Parameter => K::VARIABLE,
            CompletionKind::Keyword => K::KEYWORD,
            CompletionKind::Snippet => K::SNIPPET,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InsertFormat {
    #[default]
    Plain,
    Snippet,
}

/// One completion item, LSP-shaped.
#[derive(Debug, Clone, Default)]
pub struct CompletionItem {
    pub label: String,
    pub kind: Option<CompletionKind>,
    pub detail: Option<String>,
    pub documentation: Option<String>,
    pub insert_text: String,
    pub insert_text_format: InsertFormat,
    pub filter_text: String,
    pub sort_text: String,
    pub data: Option<serde_json::Value>,
}

impl CompletionItem {
    pub fn new(label: impl Into<String>, kind: CompletionKind) -> Self {
        let label = label.into();
        Self {
            insert_text: label.clone(),
            filter_text: label.clone(),
            sort_text: sort_key(kind.band(), 0, &label.to_lowercase()),
            label,
            kind: Some(kind),
            ..Default::default()
        }
    }

    pub fn with_insert(mut self, text: impl Into<String>) -> Self {
        self.insert_text = text.into();
        self
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    pub fn with_documentation(mut self, doc: impl Into<String>) -> Self {
        self.documentation = Some(doc.into());
        self
    }

    pub fn with_sort(mut self, band: u16, usage: u32, secondary: &str) -> Self {
        self.sort_text = sort_key(band, usage, secondary);
        self
    }

    pub fn snippet_format(mut self) -> Self {
        self.insert_text_format = InsertFormat::Snippet;
        self
    }

    pub fn with_data(mut self, data: serde_json::Value) -> Self {
        self.data = Some(data);
        self
    }

    /// Convert into the LSP wire shape.
    pub fn into_lsp(self) -> lsp_types::CompletionItem {
        lsp_types::CompletionItem {
            label: self.label,
            kind: self.kind.map(CompletionKind::lsp_kind),
            detail: self.detail,
            documentation: self.documentation.map(|value| {
                lsp_types::Documentation::MarkupContent(lsp_types::MarkupContent {
                    kind: lsp_types::MarkupKind::Markdown,
                    value,
                })
            }),
            insert_text: Some(self.insert_text),
            insert_text_format: Some(match self.insert_text_format {
                InsertFormat::Plain => lsp_types::InsertTextFormat::PLAIN_TEXT,
                InsertFormat::Snippet => lsp_types::InsertTextFormat::SNIPPET,
            }),
            filter_text: Some(self.filter_text),
            sort_text: Some(self.sort_text),
            data: self.data,
            ..Default::default()
        }
    }
}

/// Build a lexicographically sortable key from a band, a usage weight,
/// and a secondary key.
pub fn sort_key(band: u16, usage: u32, secondary: &str) -> String {
    let adjusted = band.saturating_sub(usage.min(MAX_USAGE_ADJUST) as u16);
    format!("{adjusted:04}:{secondary}")
}

/// Secondary key for column items: ordinal-major so table order wins.
pub fn ordinal_key(ordinal: u32) -> String {
    format!("{ordinal:04}")
}

/// Delimit an identifier when the dialect requires it.
pub fn quote_ident(name: &str, dialect: Dialect) -> String {
    if !needs_quoting(name) {
        return name.to_string();
    }
    match dialect {
        Dialect::SqlServer => format!("[{}]", name.replace(']', "]]")),
        Dialect::MySql => format!("`{}`", name.replace('`', "``")),
        _ => format!("\"{}\"", name.replace('"', "\"\"")),
    }
}

/// Irregular characters or reserved words force delimiting. Temp-table
/// and variable sigils are part of the name.
fn needs_quoting(name: &str) -> bool {
    let mut chars = name.chars();
    let regular_start = chars
        .next()
        .map(|c| c.is_alphabetic() || c == '_' || c == '#' || c == '@')
        .unwrap_or(false);
    if !regular_start || !chars.all(|c| c.is_alphanumeric() || c == '_' || c == '#' || c == '@') {
        return true;
    }
    is_reserved(name)
}
