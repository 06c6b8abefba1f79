//! The capability set the core requires of its metadata collaborator.
//!
//! Every listing call has a synchronous form and a boxed-future async
//! form; the async defaults simply run the sync body, so an in-memory
//! collaborator only implements the sync half while a networked one
//! overrides the async methods. The core never mutates metadata.

use crate::error::Result;
use crate::meta::objects::{
    ColumnInfo, DbObject, FeatureSet, ForeignKey, ObjectKind, ObjectPath, ParameterInfo, Snippet,
};
use crate::sql::Dialect;
use futures::future::BoxFuture;

pub trait MetadataProvider: Send + Sync {
    /// Which object kinds exist for the dialect.
    fn features(&self, dialect: Dialect) -> FeatureSet;

    fn databases(&self) -> Result<Vec<String>>;

    fn schemas(&self, database: &str) -> Result<Vec<String>>;

    /// Objects of one kind, optionally restricted to a schema.
    fn objects(
        &self,
        database: &str,
        schema: Option<&str>,
        kind: ObjectKind,
    ) -> Result<Vec<DbObject>>;

    fn columns(&self, path: &ObjectPath) -> Result<Vec<ColumnInfo>>;

    fn parameters(&self, path: &ObjectPath) -> Result<Vec<ParameterInfo>>;

    fn constraints(&self, path: &ObjectPath) -> Result<Vec<ForeignKey>>;

    /// How often the user picked this path before; blended into sort keys
    /// without ever swapping priority bands.
    fn usage_weight(&self, kind: ObjectKind, path: &str) -> u32 {
        let _ = (kind, path);
        0
    }

    /// User-defined snippets owned by the collaborator.
    fn snippets(&self) -> Result<Vec<Snippet>> {
        Ok(Vec::new())
    }

    fn databases_async(&self) -> BoxFuture<'_, Result<Vec<String>>> {
        Box::pin(async move { self.databases() })
    }

    fn schemas_async<'a>(&'a self, database: &'a str) -> BoxFuture<'a, Result<Vec<String>>> {
        Box::pin(async move { self.schemas(database) })
    }

    fn objects_async<'a>(
        &'a self,
        database: &'a str,
        schema: Option<&'a str>,
        kind: ObjectKind,
    ) -> BoxFuture<'a, Result<Vec<DbObject>>> {
        Box::pin(async move { self.objects(database, schema, kind) })
    }

    fn columns_async<'a>(&'a self, path: &'a ObjectPath) -> BoxFuture<'a, Result<Vec<ColumnInfo>>> {
        Box::pin(async move { self.columns(path) })
    }

    fn parameters_async<'a>(
        &'a self,
        path: &'a ObjectPath,
    ) -> BoxFuture<'a, Result<Vec<ParameterInfo>>> {
        Box::pin(async move { self.parameters(path) })
    }

    fn constraints_async<'a>(
        &'a self,
        path: &'a ObjectPath,
    ) -> BoxFuture<'a, Result<Vec<ForeignKey>>> {
        Box::pin(async move { self.constraints(path) })
    }
}
