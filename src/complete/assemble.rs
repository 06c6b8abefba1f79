//! Combine resolver output, FK suggestions, keywords, and snippets into
//! ranked completion items.
//!
//! The (type, mode) pair picks the item sources; filter hints restrict
//! them; priority bands and usage weights build the sort keys. Failing
//! sources surface as diagnostics on the assembly, never as a failed
//! request.

use crate::complete::compat;
use crate::complete::item::{
    CompletionItem, CompletionKind, INCOMPATIBLE_DEMOTION, ordinal_key, quote_ident,
};
use crate::complete::keywords::{builtin_functions, keyword_labels};
use crate::context::{ContextType, CursorContext, Mode};
use crate::error::{Diagnostic, Result};
use crate::fk;
use crate::meta::{DbObject, ObjectKind, ObjectPath, ResolvedColumn, Resolver};
use crate::parse::{TableRefKind, TableReference};
use crate::scope::Scope;
use itertools::Itertools;
use serde_json::json;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Per-engine assembly knobs, read from configuration once.
#[derive(Debug, Clone)]
pub struct AssembleOptions {
    pub fk_max_depth: usize,
    pub stage_timeout: Duration,
    pub show_schema: bool,
    pub keyword_items: bool,
    pub snippet_items: bool,
    pub procedure_placeholders: bool,
}

impl Default for AssembleOptions {
    fn default() -> Self {
        Self {
            fk_max_depth: 2,
            stage_timeout: Duration::from_secs(5),
            show_schema: false,
            keyword_items: true,
            snippet_items: true,
            procedure_placeholders: false,
        }
    }
}

/// Ranked items plus whatever went wrong while gathering them.
#[derive(Debug, Default)]
pub struct Assembly {
    pub items: Vec<CompletionItem>,
    pub diagnostics: Vec<Diagnostic>,
}

pub struct Assembler<'a> {
    pub resolver: Resolver<'a>,
    pub options: AssembleOptions,
}

impl<'a> Assembler<'a> {
    pub fn new(resolver: Resolver<'a>, options: AssembleOptions) -> Self {
        Self { resolver, options }
    }

    /// Assemble the ranked item list for a classified context.
    pub async fn assemble(
        &self,
        ctx: &CursorContext,
        scope: &Scope,
        cancel: &CancellationToken,
    ) -> Result<Assembly> {
        let mut assembly = Assembly::default();
        if !ctx.should_complete {
            return Ok(assembly);
        }

        match ctx.kind {
            ContextType::Column => self.column_items(ctx, scope, cancel, &mut assembly).await?,
            ContextType::Table => self.table_items(ctx, scope, &mut assembly),
            ContextType::Schema => self.schema_items(ctx, &mut assembly),
            ContextType::Database => self.database_items(&mut assembly),
            ContextType::Procedure => self.procedure_items(ctx, &mut assembly)?,
            ContextType::Parameter => self.parameter_items(ctx, &mut assembly)?,
            ContextType::Keyword => self.keyword_items(ctx, &mut assembly),
            ContextType::Alias | ContextType::Unknown => {}
        }

        assembly.items = assembly
            .items
            .into_iter()
            .unique_by(|i| (i.kind, i.label.to_lowercase()))
            .sorted_by(|a, b| a.sort_text.cmp(&b.sort_text))
            .collect();
        Ok(assembly)
    }

    /// The references whose columns a column context draws from.
    fn column_targets(&self, ctx: &CursorContext, scope: &Scope) -> Vec<TableReference> {
        let hints = &ctx.hints;

        if let Some(table) = &hints.insert_table {
            if let Some(found) = scope.resolve(table) {
                return vec![found.clone()];
            }
            return vec![TableReference {
                name: table.clone(),
                schema: hints.insert_schema.clone(),
                ..Default::default()
            }];
        }

        if hints.output_pseudo_table.is_some() || hints.is_merge_insert {
            // the statement's write target backs the pseudo-table and the
            // merge insert column list
            return scope.tables.first().cloned().into_iter().collect();
        }

        if let Some(named) = hints.table_ref.as_ref().or(hints.filter_table.as_ref()) {
            if let Some(found) = scope.resolve(named) {
                return vec![found.clone()];
            }
            if let Some(cte) = ctx.ctes.get(&named.to_lowercase()) {
                return vec![TableReference {
                    name: cte.name.clone(),
                    kind: TableRefKind::Cte,
                    columns: cte.columns.clone(),
                    wildcard_sources: cte.wildcard_sources.clone(),
                    ..Default::default()
                }];
            }
            // not in scope: try it as a bare table name
            return vec![TableReference {
                name: named.clone(),
                schema: hints.filter_schema.clone(),
                ..Default::default()
            }];
        }

        scope.tables.clone()
    }

    async fn column_items(
        &self,
        ctx: &CursorContext,
        scope: &Scope,
        cancel: &CancellationToken,
        assembly: &mut Assembly,
    ) -> Result<()> {
        let refs = self.column_targets(ctx, scope);
        let (columns, diags) = self
            .resolver
            .columns_for(&refs, cancel, self.options.stage_timeout)
            .await?;
        assembly.diagnostics.extend(diags);

        // the type candidates are compared against: the comparison left
        // side, or the VALUES slot's own column
        let left_type = match &ctx.hints.left_side {
            Some(ls) => self
                .resolver
                .column_type(scope, ls.table.as_deref(), &ls.column),
            None => ctx.hints.value_position.and_then(|pos| {
                columns
                    .iter()
                    .find(|c| c.column.ordinal == pos as u32 + 1)
                    .map(|c| c.column.data_type.clone())
            }),
        };

        for (index, rc) in columns.iter().enumerate() {
            assembly
                .items
                .push(self.column_item(ctx, rc, index, left_type.as_deref()));
        }

        // aliases ride along in unqualified column positions
        let qualified = ctx.hints.table_ref.is_some() || ctx.hints.filter_table.is_some();
        if !qualified {
            for (alias, path) in &scope.aliases {
                assembly.items.push(
                    CompletionItem::new(alias.clone(), CompletionKind::Alias)
                        .with_detail(format!("alias for {path}")),
                );
            }
        }

        // scalar functions make sense anywhere a value expression does
        let wants_functions = matches!(
            ctx.mode,
            Mode::Select
                | Mode::Where
                | Mode::Having
                | Mode::On
                | Mode::GroupBy
                | Mode::OrderBy
                | Mode::Values
                | Mode::SetValue
        );
        if wants_functions {
            let features = self.resolver.provider.features(self.resolver.dialect);
            if features.functions {
                let (functions, diags) = self.resolver.objects_merged(
                    self.resolver.database,
                    None,
                    &[ObjectKind::ScalarFunction],
                );
                assembly.diagnostics.extend(diags);
                for f in functions {
                    assembly.items.push(self.object_item(&f, false));
                }
            }
            for name in builtin_functions(self.resolver.dialect) {
                assembly.items.push(
                    CompletionItem::new(*name, CompletionKind::BuiltinFunction)
                        .with_detail("built-in function"),
                );
            }
        }
        Ok(())
    }

    fn column_item(
        &self,
        ctx: &CursorContext,
        rc: &ResolvedColumn,
        index: usize,
        left_type: Option<&str>,
    ) -> CompletionItem {
        let col = &rc.column;
        let mut band = CompletionKind::Column.band();
        let source_label = rc
            .source_alias
            .as_deref()
            .map(|a| format!("{} ({a})", rc.source.qualified()))
            .unwrap_or_else(|| rc.source.qualified());

        let mut detail = if col.data_type.is_empty() {
            source_label.clone()
        } else {
            let mut d = col.data_type.clone();
            if !col.nullable {
                d.push_str(" NOT NULL");
            }
            if col.is_primary_key {
                d.push_str(" PK");
            }
            format!("{d} · {source_label}")
        };

        let mut doc = format!("**{}**\n\n{}", col.name, source_label);
        if !col.data_type.is_empty() {
            doc.push_str(&format!("\n\ntype: `{}`", col.data_type));
        }

        if let Some(left) = left_type
            && !col.data_type.is_empty()
        {
            let verdict = compat::check(left, &col.data_type);
            if let Some(note) = verdict.note() {
                detail.push_str(&format!(" · {note}"));
                doc.push_str(&format!("\n\n{note} against `{left}`"));
            }
            if verdict.demotes() {
                band += INCOMPATIBLE_DEMOTION;
            }
        }

        // the slot's own column sorts first in a VALUES tuple
        let secondary = match ctx.hints.value_position {
            Some(pos) => {
                let distance = (col.ordinal as i64 - (pos as i64 + 1)).unsigned_abs();
                format!("{distance:02}{}", ordinal_key(col.ordinal))
            }
            None => format!("{:04}{}", index, ordinal_key(col.ordinal)),
        };

        CompletionItem::new(col.name.clone(), CompletionKind::Column)
            .with_insert(quote_ident(&col.name, self.resolver.dialect))
            .with_detail(detail)
            .with_documentation(doc)
            .with_sort(band, 0, &secondary)
            .with_data(json!({ "path": rc.source.qualified(), "column": col.name }))
    }

    /// Objects in `filter_schema` of the current database, expanding to
    /// the database branch of the two-part ambiguity when the schema
    /// yields nothing.
    fn schema_or_database_objects(
        &self,
        ctx: &CursorContext,
        kinds: &[ObjectKind],
        assembly: &mut Assembly,
    ) -> Vec<DbObject> {
        let hints = &ctx.hints;
        match (&hints.filter_database, &hints.filter_schema) {
            (Some(db), Some(schema)) => {
                let (objects, diags) = self.resolver.objects_merged(db, Some(schema), kinds);
                assembly.diagnostics.extend(diags);
                objects
            }
            (None, Some(schema)) => {
                let (objects, diags) =
                    self.resolver
                        .objects_merged(self.resolver.database, Some(schema), kinds);
                assembly.diagnostics.extend(diags);
                if !objects.is_empty() || !self.resolver.database_exists(schema) {
                    return objects;
                }
                // the qualifier names a database: list its objects and
                // its schemas
                let (objects, diags) = self.resolver.objects_merged(schema, None, kinds);
                assembly.diagnostics.extend(diags);
                if let Ok(schemas) = self.resolver.provider.schemas(schema) {
                    for s in schemas {
                        assembly
                            .items
                            .push(CompletionItem::new(s, CompletionKind::Schema));
                    }
                }
                objects
            }
            _ => {
                let (objects, diags) =
                    self.resolver
                        .objects_merged(self.resolver.database, None, kinds);
                assembly.diagnostics.extend(diags);
                objects
            }
        }
    }

    fn table_items(&self, ctx: &CursorContext, scope: &Scope, assembly: &mut Assembly) {
        let features = self.resolver.provider.features(self.resolver.dialect);
        let writable_target = matches!(
            ctx.mode,
            Mode::Into
                | Mode::IntoQualified
                | Mode::IntoCrossDbQualified
                | Mode::Update
                | Mode::Delete
                | Mode::Merge
        );

        let mut kinds = vec![ObjectKind::Table];
        if !writable_target {
            if features.views {
                kinds.push(ObjectKind::View);
            }
            if features.synonyms {
                kinds.push(ObjectKind::Synonym);
            }
            if features.functions {
                kinds.push(ObjectKind::TableFunction);
            }
        }

        let objects = self.schema_or_database_objects(ctx, &kinds, assembly);
        for obj in &objects {
            assembly.items.push(self.object_item(obj, ctx.hints.omit_schema));
        }

        // CTEs and temp tables only exist unqualified
        if ctx.hints.filter_schema.is_none() {
            for cte in ctx.ctes.values() {
                assembly.items.push(
                    CompletionItem::new(cte.name.clone(), CompletionKind::Cte)
                        .with_detail("CTE")
                        .with_documentation(format!(
                            "**{}** (CTE)\n\ncolumns: {}",
                            cte.name,
                            if cte.columns.is_empty() {
                                "unknown".to_string()
                            } else {
                                cte.columns.join(", ")
                            }
                        )),
                );
            }
            for tmp in ctx.temp_tables.values() {
                let scope_label = if tmp.is_global { "global temp table" } else { "temp table" };
                assembly.items.push(
                    CompletionItem::new(tmp.name.clone(), CompletionKind::TempTable)
                        .with_detail(scope_label),
                );
            }

            // an unqualified FROM/JOIN also offers databases and schemas
            if !writable_target {
                if let Ok(databases) = self.resolver.provider.databases() {
                    for db in databases {
                        assembly
                            .items
                            .push(CompletionItem::new(db, CompletionKind::Database));
                    }
                }
                if features.schemas
                    && let Ok(schemas) = self.resolver.provider.schemas(self.resolver.database)
                {
                    for s in schemas {
                        assembly
                            .items
                            .push(CompletionItem::new(s, CompletionKind::Schema));
                    }
                }
            }
        }

        if matches!(
            ctx.mode,
            Mode::Join | Mode::JoinQualified | Mode::JoinCrossDbQualified
        ) {
            self.fk_items(ctx, scope, assembly);
        }
    }

    fn fk_items(&self, ctx: &CursorContext, scope: &Scope, assembly: &mut Assembly) {
        let sources: Vec<ObjectPath> = scope
            .tables
            .iter()
            .filter(|t| t.kind == TableRefKind::Base)
            .map(|t| self.resolver.path_of(t))
            .collect();
        if sources.is_empty() {
            return;
        }

        let (chains, diags) =
            fk::join_candidates(self.resolver.provider, &sources, self.options.fk_max_depth);
        assembly.diagnostics.extend(diags);

        for chain in chains {
            if let Some(schema) = &ctx.hints.filter_schema
                && !chain
                    .target
                    .schema
                    .as_deref()
                    .is_some_and(|s| s.eq_ignore_ascii_case(schema))
            {
                continue;
            }

            let label = match &chain.via {
                None => chain.target.name.clone(),
                Some(via) => format!("{} (via {})", chain.target.name, via.name),
            };
            let band = CompletionKind::FkJoin.band() + ((chain.hop_count - 1) * 10) as u16;
            let route: Vec<&str> = chain.full_path().iter().map(|p| p.name.as_str()).collect();
            let doc = format!(
                "**{}**\n\nFK path: {}\n\nconstraint `{}`: {} → {}",
                chain.target.qualified(),
                route.join(" → "),
                chain.constraint.name,
                chain.constraint.columns.join(", "),
                chain.constraint.referenced_columns.join(", "),
            );
            let insert = self.table_insert_text(
                &chain.target.name,
                chain.target.schema.as_deref(),
                ctx.hints.omit_schema,
            );
            let usage = self
                .resolver
                .usage(ObjectKind::Table, &chain.target.qualified());
            let hops = chain.hop_count;
            assembly.items.push(
                CompletionItem::new(label.clone(), CompletionKind::FkJoin)
                    .with_insert(insert)
                    .with_detail(format!(
                        "FK join, {hops} hop{}",
                        if hops == 1 { "" } else { "s" }
                    ))
                    .with_documentation(doc)
                    .with_sort(band, usage, &label.to_lowercase())
                    .with_data(json!({ "path": chain.target.qualified(), "hops": hops })),
            );
        }
    }

    fn object_item(&self, obj: &DbObject, omit_schema: bool) -> CompletionItem {
        let kind = match obj.kind {
            ObjectKind::Table => CompletionKind::Table,
            ObjectKind::View => CompletionKind::View,
            ObjectKind::Synonym => CompletionKind::Synonym,
            ObjectKind::TableFunction => CompletionKind::TableFunction,
            ObjectKind::ScalarFunction => CompletionKind::ScalarFunction,
            ObjectKind::Procedure => CompletionKind::Procedure,
        };
        let usage = self.resolver.usage(obj.kind, &obj.path.qualified());
        let insert =
            self.table_insert_text(&obj.path.name, obj.path.schema.as_deref(), omit_schema);
        CompletionItem::new(obj.path.name.clone(), kind)
            .with_insert(insert)
            .with_detail(format!("{} ({})", obj.path.qualified(), obj.kind))
            .with_documentation(format!("**{}**", obj.path.qualified()))
            .with_sort(kind.band(), usage, &obj.path.name.to_lowercase())
            .with_data(json!({ "path": obj.path.qualified() }))
    }

    /// Insert text for a table-like item: never re-prefix a schema the
    /// user already typed.
    fn table_insert_text(&self, name: &str, schema: Option<&str>, omit_schema: bool) -> String {
        let quoted = quote_ident(name, self.resolver.dialect);
        match schema {
            Some(s) if self.options.show_schema && !omit_schema => {
                format!("{}.{quoted}", quote_ident(s, self.resolver.dialect))
            }
            _ => quoted,
        }
    }

    fn schema_items(&self, ctx: &CursorContext, assembly: &mut Assembly) {
        let database = ctx
            .hints
            .database
            .as_deref()
            .or(ctx.hints.filter_database.as_deref())
            .unwrap_or(self.resolver.database);
        match self.resolver.provider.schemas(database) {
            Ok(schemas) => {
                for s in schemas {
                    assembly.items.push(
                        CompletionItem::new(s.clone(), CompletionKind::Schema)
                            .with_detail(format!("schema of {database}")),
                    );
                }
            }
            Err(err) => assembly.diagnostics.push(Diagnostic::Metadata {
                path: database.to_string(),
                message: err.to_string(),
            }),
        }
    }

    fn database_items(&self, assembly: &mut Assembly) {
        match self.resolver.provider.databases() {
            Ok(databases) => {
                for db in databases {
                    assembly
                        .items
                        .push(CompletionItem::new(db, CompletionKind::Database));
                }
            }
            Err(err) => assembly.diagnostics.push(Diagnostic::Metadata {
                path: "databases".to_string(),
                message: err.to_string(),
            }),
        }
    }

    fn procedure_items(&self, ctx: &CursorContext, assembly: &mut Assembly) -> Result<()> {
        let features = self.resolver.provider.features(self.resolver.dialect);
        // a procedure context only arises on dialects whose servers have
        // procedures; a collaborator denying the capability here has
        // broken its contract
        self.resolver.require(features.procedures, "procedures")?;
        let procedures =
            self.schema_or_database_objects(ctx, &[ObjectKind::Procedure], assembly);
        for p in procedures {
            let mut item = self.object_item(&p, ctx.hints.omit_schema);
            if self.options.procedure_placeholders
                && let Ok(params) = self.resolver.provider.parameters(&p.path)
                && !params.is_empty()
            {
                let placeholders = params
                    .iter()
                    .enumerate()
                    .map(|(i, param)| format!("${{{}:{}}}", i + 1, param.name))
                    .collect::<Vec<_>>()
                    .join(", ");
                let insert = format!("{} {placeholders}", item.insert_text);
                item = item.with_insert(insert).snippet_format();
            }
            assembly.items.push(item);
        }
        Ok(())
    }

    fn parameter_items(&self, ctx: &CursorContext, assembly: &mut Assembly) -> Result<()> {
        let features = self.resolver.provider.features(self.resolver.dialect);
        self.resolver
            .require(features.procedures, "procedure parameters")?;
        let Some(raw) = &ctx.hints.table_ref else {
            return Ok(());
        };
        let parts: Vec<&str> = raw.split('.').collect();
        let path = match parts.as_slice() {
            [name] => ObjectPath::new(Some(self.resolver.database), None::<&str>, *name),
            [schema, name] => ObjectPath::new(Some(self.resolver.database), Some(*schema), *name),
            [db, schema, name, ..] => ObjectPath::new(Some(*db), Some(*schema), *name),
            [] => return Ok(()),
        };
        match self.resolver.provider.parameters(&path) {
            Ok(params) => {
                for p in params {
                    let mut detail = p.data_type.clone();
                    if p.is_output {
                        detail.push_str(" OUTPUT");
                    }
                    if p.has_default {
                        detail.push_str(" (optional)");
                    }
                    assembly.items.push(
                        CompletionItem::new(p.name.clone(), CompletionKind::Parameter)
                            .with_detail(detail)
                            .with_sort(
                                CompletionKind::Parameter.band(),
                                0,
                                &ordinal_key(p.ordinal),
                            ),
                    );
                }
            }
            Err(err) => assembly.diagnostics.push(Diagnostic::Metadata {
                path: path.qualified(),
                message: err.to_string(),
            }),
        }
        Ok(())
    }

    fn keyword_items(&self, ctx: &CursorContext, assembly: &mut Assembly) {
        if self.options.keyword_items {
            for kw in keyword_labels(ctx.mode, self.resolver.dialect) {
                assembly
                    .items
                    .push(CompletionItem::new(kw, CompletionKind::Keyword));
            }
        }
        if self.options.snippet_items
            && let Ok(snippets) = self.resolver.provider.snippets()
        {
            for s in snippets {
                assembly.items.push(
                    CompletionItem::new(s.label.clone(), CompletionKind::Snippet)
                        .with_insert(s.insert_text)
                        .with_detail(s.description)
                        .snippet_format(),
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MemoryProvider;
    use crate::sql::Dialect;

    fn assembler(provider: &MemoryProvider, options: AssembleOptions) -> Assembler<'_> {
        Assembler::new(Resolver::new(provider, "master", Dialect::SqlServer), options)
    }

    #[tokio::test]
    async fn duplicate_labels_within_a_band_collapse() {
        // the same table reachable through two kinds of listing must not
        // appear twice
        let provider = MemoryProvider::new("master").with_table("dbo", "Orders", &[("Id", "int")]);
        let a = assembler(&provider, AssembleOptions::default());
        let mut ctx = CursorContext::new(ContextType::Table, Mode::From);
        ctx.tables_in_scope = Vec::new();
        let scope = Scope::default();
        let cancel = CancellationToken::new();
        let out = a.assemble(&ctx, &scope, &cancel).await.unwrap();
        let orders: Vec<_> = out
            .items
            .iter()
            .filter(|i| i.label == "Orders" && i.kind == Some(CompletionKind::Table))
            .collect();
        assert_eq!(orders.len(), 1);
    }

    #[test]
    fn insert_text_never_duplicates_a_typed_schema() {
        let provider = MemoryProvider::new("master");
        let show = assembler(
            &provider,
            AssembleOptions {
                show_schema: true,
                ..Default::default()
            },
        );
        assert_eq!(show.table_insert_text("Orders", Some("dbo"), false), "dbo.Orders");
        assert_eq!(
            show.table_insert_text("Orders", Some("dbo"), true),
            "Orders",
            "omit_schema wins over show_schema"
        );
        let plain = assembler(&provider, AssembleOptions::default());
        assert_eq!(plain.table_insert_text("Orders", Some("dbo"), false), "Orders");
        assert_eq!(
            plain.table_insert_text("Order Details", Some("dbo"), true),
            "[Order Details]"
        );
    }

    #[test]
    fn unknown_context_assembles_nothing() {
        let provider = MemoryProvider::new("master");
        let a = assembler(&provider, AssembleOptions::default());
        let ctx = CursorContext::suppressed(Mode::Comment);
        let scope = Scope::default();
        let cancel = CancellationToken::new();
        let out = futures::executor::block_on(a.assemble(&ctx, &scope, &cancel)).unwrap();
        assert!(out.items.is_empty());
        assert!(out.diagnostics.is_empty());
    }
}
