//! In-memory metadata collaborator for tests.
//!
//! A builder-style fixture: seed databases, schemas, objects, columns,
//! foreign keys, parameters, usage weights, and snippets, then hand it to
//! the engine as a `MetadataProvider`. Lookups behave like a server:
//! unknown objects error, constraint fetches can be broken on purpose.

use crate::error::{Error, Result};
use crate::meta::{
    ColumnInfo, DbObject, FeatureSet, ForeignKey, MetadataProvider, ObjectKind, ObjectPath,
    ParameterInfo, Snippet,
};
use crate::sql::Dialect;
use std::collections::{HashMap, HashSet};

#[derive(Debug, Clone)]
pub struct MemoryProvider {
    current: String,
    databases: Vec<String>,
    schemas: HashMap<String, Vec<String>>,
    objects: Vec<(String, DbObject)>,
    columns: HashMap<String, Vec<ColumnInfo>>,
    parameters: HashMap<String, Vec<ParameterInfo>>,
    constraints: HashMap<String, Vec<ForeignKey>>,
    usage: HashMap<String, u32>,
    snippets: Vec<Snippet>,
    broken_constraints: HashSet<String>,
    features: FeatureSet,
}

fn split2(path: &str) -> (String, String) {
    match path.split_once('.') {
        Some((schema, name)) => (schema.to_string(), name.to_string()),
        None => ("dbo".to_string(), path.to_string()),
    }
}

impl MemoryProvider {
    pub fn new(current: impl Into<String>) -> Self {
        let current = current.into();
        Self {
            databases: vec![current.clone()],
            schemas: HashMap::from([(current.to_lowercase(), Vec::new())]),
            current,
            objects: Vec::new(),
            columns: HashMap::new(),
            parameters: HashMap::new(),
            constraints: HashMap::new(),
            usage: HashMap::new(),
            snippets: Vec::new(),
            broken_constraints: HashSet::new(),
            features: FeatureSet::default(),
        }
    }

    fn object_key(db: &str, schema: &str, name: &str) -> String {
        format!(
            "{}|{}.{}",
            db.to_lowercase(),
            schema.to_lowercase(),
            name.to_lowercase()
        )
    }

    fn ensure_db(&mut self, db: &str) {
        if !self.databases.iter().any(|d| d.eq_ignore_ascii_case(db)) {
            self.databases.push(db.to_string());
        }
        self.schemas.entry(db.to_lowercase()).or_default();
    }

    fn register(
        mut self,
        db: &str,
        schema: &str,
        name: &str,
        kind: ObjectKind,
        columns: &[(&str, &str)],
    ) -> Self {
        self.ensure_db(db);
        let slot = self.schemas.get_mut(&db.to_lowercase()).unwrap();
        if !slot.iter().any(|s| s.eq_ignore_ascii_case(schema)) {
            slot.push(schema.to_string());
        }
        self.objects.push((
            db.to_lowercase(),
            DbObject::new(ObjectPath::bare(schema, name), kind),
        ));
        self.columns.insert(
            Self::object_key(db, schema, name),
            columns
                .iter()
                .enumerate()
                .map(|(i, (n, t))| ColumnInfo {
                    name: n.to_string(),
                    data_type: t.to_string(),
                    ordinal: i as u32 + 1,
                    nullable: i != 0,
                    is_primary_key: i == 0 && n.eq_ignore_ascii_case("id"),
                })
                .collect(),
        );
        self
    }

    pub fn with_table(self, schema: &str, name: &str, columns: &[(&str, &str)]) -> Self {
        let db = self.current.clone();
        self.register(&db, schema, name, ObjectKind::Table, columns)
    }

    pub fn with_table_in(
        self,
        db: &str,
        schema: &str,
        name: &str,
        columns: &[(&str, &str)],
    ) -> Self {
        self.register(db, schema, name, ObjectKind::Table, columns)
    }

    pub fn with_view(self, schema: &str, name: &str, columns: &[(&str, &str)]) -> Self {
        let db = self.current.clone();
        self.register(&db, schema, name, ObjectKind::View, columns)
    }

    pub fn with_synonym(self, schema: &str, name: &str) -> Self {
        let db = self.current.clone();
        self.register(&db, schema, name, ObjectKind::Synonym, &[])
    }

    pub fn with_function(self, schema: &str, name: &str, table_valued: bool) -> Self {
        let db = self.current.clone();
        let kind = if table_valued {
            ObjectKind::TableFunction
        } else {
            ObjectKind::ScalarFunction
        };
        self.register(&db, schema, name, kind, &[])
    }

    pub fn with_procedure(self, schema: &str, name: &str, params: &[(&str, &str)]) -> Self {
        let db = self.current.clone();
        let mut this = self.register(&db, schema, name, ObjectKind::Procedure, &[]);
        this.parameters.insert(
            Self::object_key(&db, schema, name),
            params
                .iter()
                .enumerate()
                .map(|(i, (n, t))| ParameterInfo {
                    name: n.to_string(),
                    data_type: t.to_string(),
                    ordinal: i as u32 + 1,
                    has_default: false,
                    is_output: false,
                })
                .collect(),
        );
        this
    }

    pub fn with_fk(
        mut self,
        from: &str,
        columns: &[&str],
        to: &str,
        referenced: &[&str],
    ) -> Self {
        let (from_schema, from_name) = split2(from);
        let (to_schema, to_name) = split2(to);
        let key = Self::object_key(&self.current.clone(), &from_schema, &from_name);
        self.constraints.entry(key).or_default().push(ForeignKey {
            name: format!("FK_{from_name}_{to_name}"),
            columns: columns.iter().map(|c| c.to_string()).collect(),
            referenced_table: ObjectPath::bare(to_schema, to_name),
            referenced_columns: referenced.iter().map(|c| c.to_string()).collect(),
        });
        self
    }

    pub fn with_usage(mut self, path: &str, weight: u32) -> Self {
        self.usage.insert(path.to_lowercase(), weight);
        self
    }

    pub fn with_snippet(mut self, label: &str, description: &str, insert_text: &str) -> Self {
        self.snippets.push(Snippet {
            label: label.to_string(),
            description: description.to_string(),
            insert_text: insert_text.to_string(),
        });
        self
    }

    pub fn with_broken_constraints(mut self, path: &str) -> Self {
        let (schema, name) = split2(path);
        self.broken_constraints
            .insert(Self::object_key(&self.current.clone(), &schema, &name));
        self
    }

    pub fn with_features(mut self, features: FeatureSet) -> Self {
        self.features = features;
        self
    }

    /// Resolve a path to its storage key, defaulting database and
    /// resolving a schema-less name through the object list.
    fn key_of(&self, path: &ObjectPath) -> Option<String> {
        let db = path.database.as_deref().unwrap_or(&self.current);
        if let Some(schema) = &path.schema {
            return Some(Self::object_key(db, schema, &path.name));
        }
        let db_key = db.to_lowercase();
        self.objects
            .iter()
            .find(|(d, o)| {
                *d == db_key && o.path.name.eq_ignore_ascii_case(&path.name)
            })
            .map(|(d, o)| {
                Self::object_key(d, o.path.schema.as_deref().unwrap_or("dbo"), &o.path.name)
            })
    }
}

impl MetadataProvider for MemoryProvider {
    fn features(&self, _dialect: Dialect) -> FeatureSet {
        self.features
    }

    fn databases(&self) -> Result<Vec<String>> {
        Ok(self.databases.clone())
    }

    fn schemas(&self, database: &str) -> Result<Vec<String>> {
        self.schemas
            .get(&database.to_lowercase())
            .cloned()
            .ok_or_else(|| Error::metadata(database, "database not found"))
    }

    fn objects(
        &self,
        database: &str,
        schema: Option<&str>,
        kind: ObjectKind,
    ) -> Result<Vec<DbObject>> {
        let db_key = database.to_lowercase();
        if !self.schemas.contains_key(&db_key) {
            return Err(Error::metadata(database, "database not found"));
        }
        Ok(self
            .objects
            .iter()
            .filter(|(d, o)| {
                *d == db_key
                    && o.kind == kind
                    && schema
                        .map(|s| {
                            o.path
                                .schema
                                .as_deref()
                                .is_some_and(|os| os.eq_ignore_ascii_case(s))
                        })
                        .unwrap_or(true)
            })
            .map(|(_, o)| o.clone())
            .collect())
    }

    fn columns(&self, path: &ObjectPath) -> Result<Vec<ColumnInfo>> {
        self.key_of(path)
            .and_then(|key| self.columns.get(&key))
            .cloned()
            .ok_or_else(|| Error::metadata(path.qualified(), "object not found"))
    }

    fn parameters(&self, path: &ObjectPath) -> Result<Vec<ParameterInfo>> {
        self.key_of(path)
            .and_then(|key| self.parameters.get(&key))
            .cloned()
            .ok_or_else(|| Error::metadata(path.qualified(), "object not found"))
    }

    fn constraints(&self, path: &ObjectPath) -> Result<Vec<ForeignKey>> {
        let key = self
            .key_of(path)
            .ok_or_else(|| Error::metadata(path.qualified(), "object not found"))?;
        if self.broken_constraints.contains(&key) {
            return Err(Error::metadata(path.qualified(), "constraint fetch failed"));
        }
        Ok(self.constraints.get(&key).cloned().unwrap_or_default())
    }

    fn usage_weight(&self, _kind: ObjectKind, path: &str) -> u32 {
        self.usage.get(&path.to_lowercase()).copied().unwrap_or(0)
    }

    fn snippets(&self) -> Result<Vec<Snippet>> {
        Ok(self.snippets.clone())
    }
}
