//! Foreign-key join candidates via bounded multi-source BFS.
//!
//! Starting from every in-scope table at once, follow FK edges
//! (source → referenced) up to a maximum hop depth. In-scope tables are
//! never suggested, a key never repeats within its own chain, and the
//! first (shortest) route to a table wins. Output is grouped by hop count
//! only by its `hop_count` field; ordering is the assembler's job.

use crate::error::Diagnostic;
use crate::meta::{ForeignKey, MetadataProvider, ObjectPath};
use std::collections::{HashSet, VecDeque};

/// A join candidate reached over one or more FK edges.
#[derive(Debug, Clone)]
pub struct FkChain {
    pub target: ObjectPath,
    /// Number of edges from the source table, 1-based.
    pub hop_count: usize,
    /// Tables strictly between source and target.
    pub path: Vec<ObjectPath>,
    /// The constraint of the final edge.
    pub constraint: ForeignKey,
    pub source: ObjectPath,
    /// Immediate predecessor of the target; `None` at hop 1.
    pub via: Option<ObjectPath>,
}

impl FkChain {
    /// Full chain from source to target for documentation.
    pub fn full_path(&self) -> Vec<&ObjectPath> {
        std::iter::once(&self.source)
            .chain(self.path.iter())
            .chain(std::iter::once(&self.target))
            .collect()
    }
}

/// Enumerate join candidates reachable from `sources` within `max_depth`
/// hops. Constraint-fetch failures degrade to diagnostics.
pub fn join_candidates(
    provider: &dyn MetadataProvider,
    sources: &[ObjectPath],
    max_depth: usize,
) -> (Vec<FkChain>, Vec<Diagnostic>) {
    let mut chains = Vec::new();
    let mut diagnostics = Vec::new();

    let mut visited: HashSet<String> = sources.iter().map(ObjectPath::key).collect();
    let mut queue: VecDeque<(ObjectPath, ObjectPath, Vec<ObjectPath>, usize)> = sources
        .iter()
        .map(|s| (s.clone(), s.clone(), Vec::new(), 0usize))
        .collect();

    while let Some((current, source, between, depth)) = queue.pop_front() {
        if depth >= max_depth {
            continue;
        }
        let constraints = match provider.constraints(&current) {
            Ok(c) => c,
            Err(err) => {
                diagnostics.push(Diagnostic::Metadata {
                    path: current.qualified(),
                    message: err.to_string(),
                });
                continue;
            }
        };

        for fk in constraints {
            let target = fk.referenced_table.clone();
            let key = target.key();
            if visited.contains(&key) {
                continue;
            }
            if between.iter().any(|p| p.key() == key) || current.key() == key {
                continue;
            }
            visited.insert(key);

            // intermediates between source and this target
            let chain_between = if depth == 0 {
                Vec::new()
            } else {
                let mut v = between.clone();
                v.push(current.clone());
                v
            };
            let via = (depth > 0).then(|| current.clone());
            chains.push(FkChain {
                target: target.clone(),
                hop_count: depth + 1,
                path: chain_between.clone(),
                constraint: fk,
                source: source.clone(),
                via,
            });

            queue.push_back((target, source.clone(), chain_between, depth + 1));
        }
    }

    (chains, diagnostics)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MemoryProvider;

    /// Orders ── CustomerId → Customers ── CountryId → Countries
    ///        └─ ProductId → Products
    /// Countries ── PlanetId → Planets  (hop 3 territory)
    fn provider() -> MemoryProvider {
        MemoryProvider::new("master")
            .with_table("dbo", "Orders", &[("Id", "int"), ("CustomerId", "int"), ("ProductId", "int")])
            .with_table("dbo", "Customers", &[("Id", "int"), ("CountryId", "int")])
            .with_table("dbo", "Countries", &[("Id", "int"), ("PlanetId", "int")])
            .with_table("dbo", "Products", &[("Id", "int")])
            .with_table("dbo", "Planets", &[("Id", "int")])
            .with_fk("dbo.Orders", &["CustomerId"], "dbo.Customers", &["Id"])
            .with_fk("dbo.Orders", &["ProductId"], "dbo.Products", &["Id"])
            .with_fk("dbo.Customers", &["CountryId"], "dbo.Countries", &["Id"])
            .with_fk("dbo.Countries", &["PlanetId"], "dbo.Planets", &["Id"])
    }

    fn names_at(chains: &[FkChain], hops: usize) -> Vec<String> {
        let mut v: Vec<String> = chains
            .iter()
            .filter(|c| c.hop_count == hops)
            .map(|c| c.target.name.clone())
            .collect();
        v.sort();
        v
    }

    #[test]
    fn hop_one_and_two_candidates() {
        let p = provider();
        let sources = vec![ObjectPath::bare("dbo", "Orders")];
        let (chains, diags) = join_candidates(&p, &sources, 2);
        assert!(diags.is_empty());
        assert_eq!(names_at(&chains, 1), ["Customers", "Products"]);
        assert_eq!(names_at(&chains, 2), ["Countries"]);
        assert!(names_at(&chains, 3).is_empty(), "depth bound holds");

        let countries = chains
            .iter()
            .find(|c| c.target.name == "Countries")
            .unwrap();
        assert_eq!(countries.via.as_ref().unwrap().name, "Customers");
        assert_eq!(countries.source.name, "Orders");
        assert_eq!(countries.constraint.columns, ["CountryId"]);
        let full: Vec<_> = countries.full_path().iter().map(|p| p.name.as_str()).collect();
        assert_eq!(full, ["Orders", "Customers", "Countries"]);
    }

    #[test]
    fn depth_three_reaches_planets() {
        let p = provider();
        let sources = vec![ObjectPath::bare("dbo", "Orders")];
        let (chains, _) = join_candidates(&p, &sources, 3);
        assert_eq!(names_at(&chains, 3), ["Planets"]);
    }

    #[test]
    fn in_scope_tables_are_never_suggested() {
        let p = provider();
        let sources = vec![
            ObjectPath::bare("dbo", "Orders"),
            ObjectPath::bare("dbo", "Customers"),
        ];
        let (chains, _) = join_candidates(&p, &sources, 2);
        assert!(chains.iter().all(|c| c.target.name != "Customers"));
        assert!(chains.iter().all(|c| c.target.name != "Orders"));
        // Countries is now one hop from in-scope Customers
        assert_eq!(names_at(&chains, 1), ["Countries", "Products"]);
    }

    #[test]
    fn cycles_do_not_loop() {
        let p = MemoryProvider::new("master")
            .with_table("dbo", "A", &[("BId", "int")])
            .with_table("dbo", "B", &[("AId", "int")])
            .with_fk("dbo.A", &["BId"], "dbo.B", &["Id"])
            .with_fk("dbo.B", &["AId"], "dbo.A", &["Id"]);
        let sources = vec![ObjectPath::bare("dbo", "A")];
        let (chains, _) = join_candidates(&p, &sources, 3);
        assert_eq!(chains.len(), 1);
        assert_eq!(chains[0].target.name, "B");
        // no chain repeats a key within its own path
        for c in &chains {
            let mut keys: Vec<String> = c.full_path().iter().map(|p| p.key()).collect();
            let before = keys.len();
            keys.dedup();
            assert_eq!(before, keys.len());
        }
    }

    #[test]
    fn constraint_errors_become_diagnostics() {
        let p = provider().with_broken_constraints("dbo.Customers");
        let sources = vec![ObjectPath::bare("dbo", "Orders")];
        let (chains, diags) = join_candidates(&p, &sources, 2);
        assert_eq!(names_at(&chains, 1), ["Customers", "Products"]);
        assert!(names_at(&chains, 2).is_empty(), "broken node stops expansion");
        assert_eq!(diags.len(), 1);
    }

    #[test]
    fn max_depth_zero_yields_nothing() {
        let p = provider();
        let sources = vec![ObjectPath::bare("dbo", "Orders")];
        let (chains, _) = join_candidates(&p, &sources, 0);
        assert!(chains.is_empty());
    }
}
