//! The visible table list and alias map at a cursor.
//!
//! Deduplicates by lowercased key (alias wins over name), lets an inner
//! subquery scope shadow the outer statement, and keeps CTE / temp /
//! subquery / TVF markers so the resolver knows where columns come from.

use crate::context::CursorContext;
use crate::parse::{TableRefKind, TableReference};
use std::collections::HashMap;

/// What the resolver sees: every table reference visible at the cursor
/// plus the alias bindings, already deduplicated.
#[derive(Debug, Clone, Default)]
pub struct Scope {
    pub tables: Vec<TableReference>,
    /// Lowercased alias → qualified table path.
    pub aliases: HashMap<String, String>,
}

impl Scope {
    /// Case-insensitive lookup through aliases first, then table keys.
    pub fn resolve(&self, name: &str) -> Option<&TableReference> {
        let key = name.to_lowercase();
        self.tables
            .iter()
            .find(|t| t.alias.as_deref().is_some_and(|a| a.to_lowercase() == key))
            .or_else(|| {
                self.tables
                    .iter()
                    .find(|t| t.name.to_lowercase() == key)
            })
    }
}

/// Assemble the cursor's scope from a classified context.
///
/// Subquery tables captured by the classifier come first and shadow the
/// outer statement's references of the same key.
pub fn build_scope(ctx: &CursorContext) -> Scope {
    let mut scope = Scope::default();
    let mut seen: HashMap<String, ()> = HashMap::new();

    let candidates = ctx
        .subquery_tables
        .iter()
        .chain(ctx.tables_in_scope.iter());

    for reference in candidates {
        let mut reference = reference.clone();
        // late CTE/temp marking for references the parser saw before the
        // definition (or captured from an unparsed subquery)
        if reference.kind == TableRefKind::Base {
            if let Some(cte) = ctx.ctes.get(&reference.name.to_lowercase()) {
                reference.kind = TableRefKind::Cte;
                if reference.columns.is_empty() {
                    reference.columns = cte.columns.clone();
                    reference.wildcard_sources = cte.wildcard_sources.clone();
                }
            } else if let Some(tmp) = ctx.temp_tables.get(&reference.name.to_lowercase()) {
                reference.kind = TableRefKind::TempTable {
                    global: tmp.is_global,
                };
                if reference.columns.is_empty() {
                    reference.columns = tmp.columns.clone();
                }
            }
        }

        let key = reference.key();
        if seen.contains_key(&key) {
            continue;
        }
        seen.insert(key, ());
        if let Some(alias) = &reference.alias {
            scope
                .aliases
                .insert(alias.to_lowercase(), reference.qualified_path());
        }
        scope.tables.push(reference);
    }

    scope
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::{ContextType, CursorContext, Mode};
    use crate::parse::{CteDefinition, TempTable};

    fn ctx_with(tables: Vec<TableReference>) -> CursorContext {
        let mut ctx = CursorContext::new(ContextType::Column, Mode::Select);
        ctx.tables_in_scope = tables;
        ctx
    }

    fn named(name: &str, alias: Option<&str>) -> TableReference {
        TableReference {
            name: name.to_string(),
            alias: alias.map(str::to_string),
            ..Default::default()
        }
    }

    #[test]
    fn dedupes_by_lowercased_key() {
        let ctx = ctx_with(vec![
            named("Orders", None),
            named("ORDERS", None),
            named("Customers", Some("c")),
        ]);
        let scope = build_scope(&ctx);
        assert_eq!(scope.tables.len(), 2);
    }

    #[test]
    fn subquery_tables_shadow_outer() {
        let mut ctx = ctx_with(vec![named("Orders", Some("o"))]);
        ctx.subquery_tables = vec![named("Inner1", Some("o"))];
        let scope = build_scope(&ctx);
        // inner "o" wins the key
        assert_eq!(scope.tables.len(), 1);
        assert_eq!(scope.tables[0].name, "Inner1");
        assert_eq!(scope.aliases.get("o").map(String::as_str), Some("Inner1"));
    }

    #[test]
    fn alias_shadows_same_named_table() {
        // FROM real AS fake, fake: "fake" resolves to the alias target
        let ctx = ctx_with(vec![named("real", Some("fake")), named("fake", None)]);
        let scope = build_scope(&ctx);
        assert_eq!(scope.resolve("fake").unwrap().name, "real");
    }

    #[test]
    fn late_cte_and_temp_marking() {
        let mut ctx = ctx_with(vec![named("recent", None), named("#tmp", None)]);
        ctx.ctes.insert(
            "recent".into(),
            CteDefinition {
                name: "recent".into(),
                columns: vec!["Id".into()],
                ..Default::default()
            },
        );
        ctx.temp_tables.insert(
            "#tmp".into(),
            TempTable {
                name: "#tmp".into(),
                columns: vec!["A".into()],
                is_global: false,
            },
        );
        let scope = build_scope(&ctx);
        assert!(scope.tables[0].is_cte());
        assert_eq!(scope.tables[0].columns, ["Id"]);
        assert!(scope.tables[1].is_temp_table());
        assert_eq!(scope.tables[1].columns, ["A"]);
    }

    #[test]
    fn alias_map_uses_qualified_paths() {
        let mut t = named("Orders", Some("o"));
        t.schema = Some("dbo".into());
        t.database = Some("Sales".into());
        let scope = build_scope(&ctx_with(vec![t]));
        assert_eq!(
            scope.aliases.get("o").map(String::as_str),
            Some("Sales.dbo.Orders")
        );
    }
}
