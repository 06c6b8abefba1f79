//! Metadata interface and resolution.
//!
//! `provider` is the boundary the editor-side collaborator implements;
//! `resolver` maps cursor scope onto it; `fanout` is the ordered
//! concurrency primitive both the resolver and the FK engine use.

pub mod fanout;
pub mod objects;
pub mod provider;
pub mod resolver;

pub use fanout::fan_out;
pub use objects::{
    ColumnInfo, DbObject, FeatureSet, ForeignKey, ObjectKind, ObjectPath, ParameterInfo, Snippet,
};
pub use provider::MetadataProvider;
pub use resolver::{ColumnOrigin, ResolvedColumn, Resolver};
