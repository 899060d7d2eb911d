//! Union-find clustering of strategies into correlation groups, so the
//! allocator can cap total exposure per group rather than only per
//! strategy.

use std::collections::BTreeMap;

pub struct UnionFind {
    parent: BTreeMap<String, String>,
}

impl UnionFind {
    pub fn new(ids: impl IntoIterator<Item = String>) -> Self {
        let parent = ids.into_iter().map(|id| (id.clone(), id)).collect();
        Self { parent }
    }

    pub fn find(&mut self, id: &str) -> String {
        let parent = self
            .parent
            .get(id)
            .cloned()
            .unwrap_or_else(|| id.to_string());
        if parent == id {
            return parent;
        }
        let root = self.find(&parent);
        self.parent.insert(id.to_string(), root.clone());
        root
    }

    pub fn union(&mut self, a: &str, b: &str) {
        let ra = self.find(a);
        let rb = self.find(b);
        if ra != rb {
            self.parent.insert(ra, rb);
        }
    }
}

/// Groups `ids` by the transitive closure of `correlated_pairs`. The
/// returned map sends each id to the id of its group's representative.
pub fn group_by_correlation(
    ids: &[String],
    correlated_pairs: &[(String, String)],
) -> BTreeMap<String, String> {
    let mut uf = UnionFind::new(ids.iter().cloned());
    for (a, b) in correlated_pairs {
        uf.union(a, b);
    }
    ids.iter().map(|id| (id.clone(), uf.find(id))).collect()
}
