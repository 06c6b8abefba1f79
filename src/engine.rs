//! The two entry points: synchronous context detection and asynchronous
//! completion.
//!
//! `detect_context` runs the pure pipeline (tokenize → parse → classify)
//! over a buffer snapshot. `complete` continues through scope building,
//! metadata resolution, FK suggestion, and assembly; it honors the
//! request's cancellation token and converts a stage timeout into an
//! empty-but-diagnosed outcome instead of a corrupted partial list.
//!
//! All state is per-request; the only shared things are the read-only
//! metadata collaborator and the engine options loaded once.

use crate::complete::{AssembleOptions, Assembler, CompletionItem};
use crate::config::config;
use crate::context::{CursorContext, classify};
use crate::error::{Diagnostic, Error, Result};
use crate::meta::{MetadataProvider, Resolver};
use crate::parse::parse;
use crate::scope::build_scope;
use crate::sql::{Dialect, Position, tokenize};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// One completion request over a buffer snapshot.
pub struct CompletionRequest<'a> {
    pub text: &'a str,
    pub position: Position,
    /// The connection's current database.
    pub database: &'a str,
    /// Cancelled when a newer request supersedes this one.
    pub cancel: CancellationToken,
}

/// The outcome delivered to the consumer.
#[derive(Debug, Default)]
pub struct Completion {
    pub context: CursorContext,
    pub items: Vec<CompletionItem>,
    pub diagnostics: Vec<Diagnostic>,
}

impl Completion {
    pub fn labels(&self) -> Vec<&str> {
        self.items.iter().map(|i| i.label.as_str()).collect()
    }

    /// Convert every item into the LSP wire shape.
    pub fn into_lsp(self) -> Vec<lsp_types::CompletionItem> {
        self.items
            .into_iter()
            .map(CompletionItem::into_lsp)
            .collect()
    }
}

pub struct Engine<P> {
    provider: Arc<P>,
    dialect: Dialect,
    options: AssembleOptions,
}

impl<P: MetadataProvider> Engine<P> {
    /// Build an engine with options from the environment configuration.
    pub fn new(provider: Arc<P>, dialect: Dialect) -> Self {
        let cfg = config();
        Self::with_options(
            provider,
            dialect,
            AssembleOptions {
                fk_max_depth: cfg.fk_max_depth,
                stage_timeout: Duration::from_millis(cfg.stage_timeout_ms),
                show_schema: cfg.show_schema,
                keyword_items: cfg.keyword_items,
                snippet_items: cfg.snippet_items,
                procedure_placeholders: cfg.procedure_placeholders,
            },
        )
    }

    pub fn with_options(provider: Arc<P>, dialect: Dialect, options: AssembleOptions) -> Self {
        Self {
            provider,
            dialect,
            options,
        }
    }

    /// Classify the cursor context. Synchronous; never touches metadata.
    /// A position outside the buffer is an input error.
    pub fn detect_context(&self, text: &str, position: Position) -> Result<CursorContext> {
        let stream = tokenize(text, self.dialect);
        if stream.offset_at(text, position).is_none() {
            return Err(Error::Position {
                line: position.line,
                col: position.col,
            });
        }
        let chunks = parse(text, &stream, self.dialect);
        Ok(classify(text, &stream, &chunks, position))
    }

    /// Produce ranked completion items for the request.
    pub async fn complete(&self, request: CompletionRequest<'_>) -> Result<Completion> {
        if request.cancel.is_cancelled() {
            return Err(Error::Cancelled);
        }
        let context = match self.detect_context(request.text, request.position) {
            Ok(context) => context,
            // malformed positions yield an empty result, no diagnostic
            Err(Error::Position { line, col }) => {
                crate::trace!(line, col, "cursor outside buffer");
                return Ok(Completion::default());
            }
            Err(err) => return Err(err),
        };
        if !context.should_complete {
            crate::trace!(mode = %context.mode, "completion suppressed");
            return Ok(Completion {
                context,
                ..Default::default()
            });
        }

        let scope = build_scope(&context);
        let resolver = Resolver::new(self.provider.as_ref(), request.database, self.dialect);
        let assembler = Assembler::new(resolver, self.options.clone());

        match assembler.assemble(&context, &scope, &request.cancel).await {
            Ok(assembly) => {
                crate::debug!(
                    kind = %context.kind,
                    mode = %context.mode,
                    items = assembly.items.len(),
                    "completion assembled"
                );
                Ok(Completion {
                    context,
                    items: assembly.items,
                    diagnostics: assembly.diagnostics,
                })
            }
            Err(Error::Timeout { stage, .. }) => Ok(Completion {
                context,
                items: Vec::new(),
                diagnostics: vec![Diagnostic::Timeout { stage }],
            }),
            Err(err) => Err(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MemoryProvider;
    use crate::complete::CompletionKind;
    use crate::context::{ContextType, Mode};

    fn engine(provider: MemoryProvider) -> Engine<MemoryProvider> {
        crate::testing::common_init();
        Engine::with_options(
            Arc::new(provider),
            Dialect::SqlServer,
            AssembleOptions::default(),
        )
    }

    /// Run a completion with the cursor marked by `│`.
    async fn complete_at(engine: &Engine<MemoryProvider>, marked: &str) -> Completion {
        let offset = marked.find('│').expect("cursor marker");
        let sql = marked.replace('│', "");
        let stream = tokenize(&sql, Dialect::SqlServer);
        let position = stream.position_at(&sql, offset);
        engine
            .complete(CompletionRequest {
                text: &sql,
                position,
                database: "master",
                cancel: CancellationToken::new(),
            })
            .await
            .expect("completion should not error")
    }

    fn northwind() -> MemoryProvider {
        MemoryProvider::new("master")
            .with_table("dbo", "Orders", &[("Id", "int"), ("CustomerId", "int")])
            .with_table("dbo", "Customers", &[("Id", "int"), ("CountryId", "int"), ("Name", "nvarchar(50)")])
            .with_table("dbo", "Countries", &[("Id", "int"), ("Name", "nvarchar(50)")])
            .with_table("sales", "Invoices", &[("Id", "int")])
            .with_view("dbo", "ActiveOrders", &[("Id", "int")])
            .with_fk("dbo.Orders", &["CustomerId"], "dbo.Customers", &["Id"])
            .with_fk("dbo.Customers", &["CountryId"], "dbo.Countries", &["Id"])
    }

    #[tokio::test]
    async fn s1_schema_qualified_from() {
        let e = engine(northwind());
        let out = complete_at(&e, "SELECT * FROM dbo.│").await;
        assert_eq!(out.context.kind, ContextType::Table);
        assert_eq!(out.context.mode, Mode::FromQualified);
        assert_eq!(out.context.hints.filter_schema.as_deref(), Some("dbo"));
        assert!(out.context.hints.omit_schema);
        let labels = out.labels();
        for expected in ["Orders", "Customers", "Countries", "ActiveOrders"] {
            assert!(labels.contains(&expected), "missing {expected}");
        }
        assert!(!labels.contains(&"Invoices"), "other schemas excluded");
    }

    #[tokio::test]
    async fn s2_qualified_column_in_on() {
        let e = engine(
            MemoryProvider::new("master")
                .with_table("dbo", "Employees", &[("Id", "int"), ("DepartmentID", "int")])
                .with_table("dbo", "Departments", &[("Id", "int"), ("Name", "nvarchar(50)")]),
        );
        let out = complete_at(
            &e,
            "SELECT * FROM Employees e JOIN Departments d ON e.DepartmentID = d.│",
        )
        .await;
        assert_eq!(out.context.mode, Mode::Qualified);
        assert_eq!(out.context.hints.table_ref.as_deref(), Some("d"));
        assert_eq!(out.labels(), ["Id", "Name"], "every Departments column");
    }

    #[tokio::test]
    async fn s3_fk_join_candidates() {
        let e = engine(northwind());
        let out = complete_at(&e, "SELECT * FROM Orders o JOIN │").await;
        assert_eq!(out.context.mode, Mode::Join);
        let labels = out.labels();
        assert!(labels.contains(&"Customers"), "hop-1 FK candidate");
        assert!(
            labels.contains(&"Countries (via Customers)"),
            "hop-2 candidate labeled with its predecessor: {labels:?}"
        );
        // FK band sorts after plain tables, before keywords
        let fk_pos = out
            .items
            .iter()
            .position(|i| i.kind == Some(CompletionKind::FkJoin))
            .unwrap();
        let table_pos = out
            .items
            .iter()
            .position(|i| i.kind == Some(CompletionKind::Table))
            .unwrap();
        assert!(table_pos < fk_pos);
        let hop2 = out
            .items
            .iter()
            .find(|i| i.kind == Some(CompletionKind::FkJoin) && i.label.starts_with("Countries"))
            .unwrap();
        assert!(hop2.documentation.as_deref().unwrap().contains("Orders → Customers → Countries"));
    }

    #[tokio::test]
    async fn s4_cross_db_subquery() {
        let e = engine(
            northwind().with_table_in("TEST", "dbo", "Widgets", &[("Id", "int")]),
        );
        let out = complete_at(
            &e,
            "SELECT * FROM Employees WHERE DeptID IN (SELECT ID FROM TEST.dbo.│)",
        )
        .await;
        assert_eq!(out.context.mode, Mode::FromCrossDbQualified);
        assert_eq!(out.context.hints.filter_database.as_deref(), Some("TEST"));
        assert_eq!(out.context.hints.filter_schema.as_deref(), Some("dbo"));
        let labels = out.labels();
        assert!(labels.contains(&"Widgets"));
        assert!(!labels.contains(&"Orders"), "current-db tables excluded");
    }

    #[tokio::test]
    async fn s5_values_position_prefers_slot_column() {
        let e = engine(
            MemoryProvider::new("master").with_table(
                "dbo",
                "T",
                &[("a", "int"), ("b", "nvarchar(10)"), ("c", "int")],
            ),
        );
        let out = complete_at(&e, "INSERT INTO T (a,b,c) VALUES (1, │, 3)").await;
        assert_eq!(out.context.mode, Mode::Values);
        assert_eq!(out.context.hints.value_position, Some(1));
        assert_eq!(out.context.hints.insert_table.as_deref(), Some("T"));
        let columns: Vec<&str> = out
            .items
            .iter()
            .filter(|i| i.kind == Some(CompletionKind::Column))
            .map(|i| i.label.as_str())
            .collect();
        assert_eq!(columns[0], "b", "slot column sorts first: {columns:?}");
    }

    #[tokio::test]
    async fn s6_alias_shadows_schema() {
        let e = engine(northwind());
        let out = complete_at(&e, "SELECT dbo.│ FROM Customers dbo").await;
        assert_eq!(out.context.kind, ContextType::Column);
        assert_eq!(out.context.mode, Mode::Qualified);
        assert_eq!(out.context.hints.table_ref.as_deref(), Some("dbo"));
        let labels = out.labels();
        assert!(labels.contains(&"Name"), "Customers columns via alias: {labels:?}");
        assert!(!labels.contains(&"Orders"), "no schema objects");
    }

    #[tokio::test]
    async fn string_position_completes_nothing() {
        let e = engine(northwind());
        let out = complete_at(&e, "SELECT '│' FROM Orders").await;
        assert!(!out.context.should_complete);
        assert!(out.items.is_empty());
    }

    #[tokio::test]
    async fn out_of_range_position_is_an_input_error() {
        let e = engine(northwind());
        let err = e
            .detect_context("SELECT 1", Position::new(40, 1))
            .unwrap_err();
        assert!(matches!(err, Error::Position { line: 40, col: 1 }));

        // complete converts it into an empty result, no diagnostics
        let out = e
            .complete(CompletionRequest {
                text: "SELECT 1",
                position: Position::new(40, 1),
                database: "master",
                cancel: CancellationToken::new(),
            })
            .await
            .expect("input errors are not completion errors");
        assert!(out.items.is_empty());
        assert!(out.diagnostics.is_empty());
    }

    #[tokio::test]
    async fn procedure_context_against_denying_provider_is_fatal() {
        // EXEC only classifies on a procedure-bearing dialect, so a
        // provider denying the capability has broken its contract
        let provider = MemoryProvider::new("master").with_features(crate::meta::FeatureSet {
            procedures: false,
            ..Default::default()
        });
        let e = engine(provider);
        let err = e
            .complete(CompletionRequest {
                text: "EXEC ",
                position: Position::new(1, 6),
                database: "master",
                cancel: CancellationToken::new(),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Fatal(_)), "got {err:?}");
    }

    #[tokio::test]
    async fn cancelled_request_never_delivers() {
        let e = engine(northwind());
        let cancel = CancellationToken::new();
        cancel.cancel();
        let err = e
            .complete(CompletionRequest {
                text: "SELECT * FROM dbo.",
                position: Position::new(1, 19),
                database: "master",
                cancel,
            })
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Cancelled));
    }

    #[tokio::test]
    async fn stage_timeout_yields_diagnosed_empty_result() {
        struct Slow(MemoryProvider);
        impl MetadataProvider for Slow {
            fn features(&self, d: Dialect) -> crate::meta::FeatureSet {
                self.0.features(d)
            }
            fn databases(&self) -> Result<Vec<String>> {
                self.0.databases()
            }
            fn schemas(&self, db: &str) -> Result<Vec<String>> {
                self.0.schemas(db)
            }
            fn objects(
                &self,
                db: &str,
                schema: Option<&str>,
                kind: crate::meta::ObjectKind,
            ) -> Result<Vec<crate::meta::DbObject>> {
                self.0.objects(db, schema, kind)
            }
            fn columns(&self, p: &crate::meta::ObjectPath) -> Result<Vec<crate::meta::ColumnInfo>> {
                self.0.columns(p)
            }
            fn columns_async<'a>(
                &'a self,
                p: &'a crate::meta::ObjectPath,
            ) -> futures::future::BoxFuture<'a, Result<Vec<crate::meta::ColumnInfo>>> {
                Box::pin(async move {
                    tokio::time::sleep(Duration::from_millis(100)).await;
                    self.0.columns(p)
                })
            }
            fn parameters(
                &self,
                p: &crate::meta::ObjectPath,
            ) -> Result<Vec<crate::meta::ParameterInfo>> {
                self.0.parameters(p)
            }
            fn constraints(
                &self,
                p: &crate::meta::ObjectPath,
            ) -> Result<Vec<crate::meta::ForeignKey>> {
                self.0.constraints(p)
            }
        }

        let engine = Engine::with_options(
            Arc::new(Slow(northwind())),
            Dialect::SqlServer,
            AssembleOptions {
                stage_timeout: Duration::from_millis(5),
                ..Default::default()
            },
        );
        let out = engine
            .complete(CompletionRequest {
                text: "SELECT  FROM Orders",
                position: Position::new(1, 8),
                database: "master",
                cancel: CancellationToken::new(),
            })
            .await
            .expect("timeout is not an error");
        assert!(out.items.is_empty());
        assert!(matches!(out.diagnostics[0], Diagnostic::Timeout { stage: "columns" }));
    }

    #[tokio::test]
    async fn usage_weight_orders_within_band_only() {
        let e = engine(northwind().with_usage("dbo.countries", 5));
        let out = complete_at(&e, "SELECT * FROM dbo.│").await;
        let tables: Vec<&str> = out
            .items
            .iter()
            .filter(|i| i.kind == Some(CompletionKind::Table))
            .map(|i| i.label.as_str())
            .collect();
        assert_eq!(tables[0], "Countries", "usage weight promotes within band");
        // the weighted table must still sort after every CTE/temp band
        // item and before every view
        let view_pos = out
            .items
            .iter()
            .position(|i| i.kind == Some(CompletionKind::View))
            .unwrap();
        let first_table = out
            .items
            .iter()
            .position(|i| i.kind == Some(CompletionKind::Table))
            .unwrap();
        assert!(first_table < view_pos);
    }

    #[tokio::test]
    async fn cte_and_temp_injection_in_from() {
        let e = engine(northwind());
        let out = complete_at(
            &e,
            "WITH recent AS (SELECT Id FROM Orders) SELECT * FROM │",
        )
        .await;
        let first = &out.items[0];
        assert_eq!(first.kind, Some(CompletionKind::Cte));
        assert_eq!(first.label, "recent");
        // schema-filtered positions have no CTEs
        let out = complete_at(
            &e,
            "WITH recent AS (SELECT Id FROM Orders) SELECT * FROM dbo.│",
        )
        .await;
        assert!(out.items.iter().all(|i| i.kind != Some(CompletionKind::Cte)));
    }

    #[tokio::test]
    async fn writable_targets_exclude_views() {
        let e = engine(northwind());
        let out = complete_at(&e, "INSERT INTO dbo.│").await;
        let labels = out.labels();
        assert!(labels.contains(&"Orders"));
        assert!(!labels.contains(&"ActiveOrders"), "views are read-only");
    }

    #[tokio::test]
    async fn set_value_annotates_type_compatibility() {
        let e = engine(
            MemoryProvider::new("master").with_table(
                "dbo",
                "Products",
                &[("Id", "int"), ("Price", "decimal(10,2)"), ("Name", "nvarchar(50)")],
            ),
        );
        let out = complete_at(&e, "UPDATE Products SET Price = │").await;
        assert_eq!(out.context.mode, Mode::SetValue);
        let name_item = out.items.iter().find(|i| i.label == "Name").unwrap();
        assert!(
            name_item.detail.as_deref().unwrap().contains("type mismatch"),
            "string column against numeric left side"
        );
        let id_item = out.items.iter().find(|i| i.label == "Id").unwrap();
        assert!(!id_item.detail.as_deref().unwrap().contains("mismatch"));
        // demoted items sort after compatible ones
        let id_pos = out.items.iter().position(|i| i.label == "Id").unwrap();
        let name_pos = out.items.iter().position(|i| i.label == "Name").unwrap();
        assert!(id_pos < name_pos);
    }

    #[tokio::test]
    async fn keyword_start_and_snippets() {
        let e = engine(northwind().with_snippet("sel*", "select star", "SELECT * FROM "));
        let out = complete_at(&e, "│").await;
        assert_eq!(out.context.mode, Mode::Start);
        let labels = out.labels();
        assert!(labels.contains(&"SELECT"));
        assert!(labels.contains(&"sel*"));
        // snippets band after keywords
        let kw = out
            .items
            .iter()
            .position(|i| i.kind == Some(CompletionKind::Keyword))
            .unwrap();
        let sn = out
            .items
            .iter()
            .position(|i| i.kind == Some(CompletionKind::Snippet))
            .unwrap();
        assert!(kw < sn);
    }

    #[tokio::test]
    async fn exec_procedure_and_parameters() {
        let provider = MemoryProvider::new("master").with_procedure(
            "dbo",
            "GetOrders",
            &[("@year", "int"), ("@customer", "nvarchar(50)")],
        );
        let e = engine(provider);
        let out = complete_at(&e, "EXEC dbo.│").await;
        assert!(out.labels().contains(&"GetOrders"));

        let out = complete_at(&e, "EXEC dbo.GetOrders │").await;
        assert_eq!(out.context.kind, ContextType::Parameter);
        assert_eq!(out.labels(), ["@year", "@customer"], "ordinal order");
    }

    #[tokio::test]
    async fn failing_source_keeps_healthy_items() {
        let e = engine(northwind());
        let out = complete_at(&e, "SELECT │ FROM Orders o JOIN Missing m ON o.Id = m.Id").await;
        let labels = out.labels();
        assert!(labels.contains(&"CustomerId"), "Orders columns survive");
        assert!(
            out.diagnostics
                .iter()
                .any(|d| matches!(d, Diagnostic::Metadata { path, .. } if path.contains("Missing"))),
            "the failing source is reported: {:?}",
            out.diagnostics
        );
    }

    #[tokio::test]
    async fn lsp_conversion_round_trip() {
        let e = engine(northwind());
        let out = complete_at(&e, "SELECT * FROM dbo.│").await;
        let lsp = out.into_lsp();
        assert!(!lsp.is_empty());
        assert!(lsp.iter().all(|i| i.sort_text.is_some()));
        assert!(lsp.iter().all(|i| i.insert_text.is_some()));
    }
}
