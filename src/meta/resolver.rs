//! Name resolution and concurrent column fetching.
//!
//! The resolver maps scope entries to metadata objects, honoring the
//! alias/CTE/temp/subquery environment, and fans the per-table column
//! fetches out through the ordered primitive. Collaborator errors are
//! never swallowed: each failing source becomes a diagnostic and its
//! items are omitted.

use crate::error::{Diagnostic, Error, Result};
use crate::meta::fanout::fan_out;
use crate::meta::objects::{ColumnInfo, ObjectKind, ObjectPath};
use crate::meta::provider::MetadataProvider;
use crate::parse::{TableRefKind, TableReference};
use crate::scope::Scope;
use crate::sql::Dialect;
use futures::future::BoxFuture;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Where a resolved column came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnOrigin {
    Base,
    Cte,
    TempTable,
    Subquery,
}

/// One column with its provenance.
#[derive(Debug, Clone)]
pub struct ResolvedColumn {
    pub column: ColumnInfo,
    pub source: ObjectPath,
    pub source_alias: Option<String>,
    pub origin: ColumnOrigin,
}

pub struct Resolver<'a> {
    pub provider: &'a dyn MetadataProvider,
    pub database: &'a str,
    pub dialect: Dialect,
}

impl<'a> Resolver<'a> {
    pub fn new(provider: &'a dyn MetadataProvider, database: &'a str, dialect: Dialect) -> Self {
        Self {
            provider,
            database,
            dialect,
        }
    }

    /// Metadata coordinates of a scope reference; the current database
    /// fills in when the reference was not database-qualified.
    pub fn path_of(&self, reference: &TableReference) -> ObjectPath {
        ObjectPath {
            database: reference
                .database
                .clone()
                .or_else(|| Some(self.database.to_string())),
            schema: reference.schema.clone(),
            name: reference.name.clone(),
        }
    }

    /// Fetch columns for every reference concurrently. Results merge in
    /// reference order regardless of completion order; failing sources
    /// are omitted and reported.
    pub async fn columns_for(
        &self,
        refs: &[TableReference],
        cancel: &CancellationToken,
        deadline: Duration,
    ) -> Result<(Vec<ResolvedColumn>, Vec<Diagnostic>)> {
        let tasks: Vec<BoxFuture<'_, (String, Result<Vec<ResolvedColumn>>)>> = refs
            .iter()
            .map(|reference| self.columns_task(reference))
            .collect();

        let slots = fan_out(tasks, cancel, deadline, "columns").await?;

        let mut columns = Vec::new();
        let mut diagnostics = Vec::new();
        for (path, outcome) in slots {
            match outcome {
                Ok(cols) => columns.extend(cols),
                Err(err) => {
                    crate::warn!(source = %path, error = %err, "column source failed");
                    diagnostics.push(Diagnostic::Metadata {
                        path,
                        message: err.to_string(),
                    });
                }
            }
        }
        Ok((columns, diagnostics))
    }

    /// One slot of the fan-out: projected columns for environment-local
    /// references, a collaborator fetch for base tables.
    fn columns_task(
        &self,
        reference: &TableReference,
    ) -> BoxFuture<'a, (String, Result<Vec<ResolvedColumn>>)> {
        let provider = self.provider;
        let alias = reference.alias.clone();
        let path = self.path_of(reference);
        let label = reference.qualified_path();

        match reference.kind {
            TableRefKind::Base => Box::pin(async move {
                let outcome = provider.columns_async(&path).await.map(|cols| {
                    cols.into_iter()
                        .map(|column| ResolvedColumn {
                            column,
                            source: path.clone(),
                            source_alias: alias.clone(),
                            origin: ColumnOrigin::Base,
                        })
                        .collect()
                });
                (label, outcome)
            }),
            kind => {
                let origin = match kind {
                    TableRefKind::Cte => ColumnOrigin::Cte,
                    TableRefKind::TempTable { .. } => ColumnOrigin::TempTable,
                    _ => ColumnOrigin::Subquery,
                };
                let names = reference.columns.clone();
                let wildcard: Vec<ObjectPath> = reference
                    .wildcard_sources
                    .iter()
                    .map(|name| ObjectPath {
                        database: Some(self.database.to_string()),
                        schema: None,
                        name: name.clone(),
                    })
                    .collect();
                Box::pin(async move {
                    let mut out: Vec<ResolvedColumn> = names
                        .iter()
                        .enumerate()
                        .map(|(i, name)| ResolvedColumn {
                            column: ColumnInfo {
                                name: name.clone(),
                                ordinal: i as u32 + 1,
                                ..Default::default()
                            },
                            source: path.clone(),
                            source_alias: alias.clone(),
                            origin,
                        })
                        .collect();
                    // a `*` projection expands through the body's tables
                    for src in &wildcard {
                        match provider.columns_async(src).await {
                            Ok(cols) => out.extend(cols.into_iter().map(|column| {
                                ResolvedColumn {
                                    column,
                                    source: path.clone(),
                                    source_alias: alias.clone(),
                                    origin,
                                }
                            })),
                            Err(err) => return (label, Err(err)),
                        }
                    }
                    (label, Ok(out))
                })
            }
        }
    }

    /// Synchronous data-type lookup for the comparison left side.
    pub fn column_type(&self, scope: &Scope, table: Option<&str>, column: &str) -> Option<String> {
        let refs: Vec<&TableReference> = match table {
            Some(name) => scope.resolve(name).into_iter().collect(),
            None => scope.tables.iter().collect(),
        };
        for reference in refs {
            if reference.kind != TableRefKind::Base {
                continue;
            }
            let path = self.path_of(reference);
            if let Ok(cols) = self.provider.columns(&path)
                && let Some(c) = cols.iter().find(|c| c.name.eq_ignore_ascii_case(column))
            {
                return Some(c.data_type.clone());
            }
        }
        None
    }

    /// Objects of several kinds merged, with per-kind failures reported.
    pub fn objects_merged(
        &self,
        database: &str,
        schema: Option<&str>,
        kinds: &[ObjectKind],
    ) -> (Vec<crate::meta::objects::DbObject>, Vec<Diagnostic>) {
        let mut out = Vec::new();
        let mut diagnostics = Vec::new();
        for kind in kinds {
            match self.provider.objects(database, schema, *kind) {
                Ok(objects) => out.extend(objects),
                Err(err) => diagnostics.push(Diagnostic::Metadata {
                    path: format!("{database}.{}", schema.unwrap_or("*")),
                    message: err.to_string(),
                }),
            }
        }
        (out, diagnostics)
    }

    /// Does a database with this name exist? Used for the two-part-name
    /// ambiguity (`schema.table` vs `database.schema`).
    pub fn database_exists(&self, name: &str) -> bool {
        self.provider
            .databases()
            .map(|dbs| dbs.iter().any(|d| d.eq_ignore_ascii_case(name)))
            .unwrap_or(false)
    }

    pub fn usage(&self, kind: ObjectKind, path: &str) -> u32 {
        self.provider.usage_weight(kind, path)
    }

    /// Contract guard: the collaborator promised this capability.
    pub fn require(&self, ok: bool, what: &str) -> Result<()> {
        if ok {
            Ok(())
        } else {
            Err(Error::Fatal(format!("provider does not support {what}")))
        }
    }
}
