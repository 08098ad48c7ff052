//! The unified labeled multigraph (C4) and relationship projection.

use std::collections::{BTreeMap, BTreeSet};

use crate::graph::label::RelSet;

/// A directed multigraph whose parallel edges are collapsed into a single
/// arc carrying the union of their labels (§3). Nodes use a type with a
/// total, stable order (transaction ids) so that every iteration over the
/// graph — building edges, running SCC, searching cycles — visits nodes
/// and their neighbors in one canonical, deterministic order (§5,
/// "iteration order over maps ... uses stable keys").
#[derive(Debug, Clone)]
pub struct Graph<N: Ord + Clone> {
    nodes: BTreeSet<N>,
    out: BTreeMap<N, BTreeMap<N, RelSet>>,
    incoming: BTreeMap<N, BTreeMap<N, RelSet>>,
}

impl<N: Ord + Clone> Default for Graph<N> {
    fn default() -> Self {
        Self {
            nodes: BTreeSet::new(),
            out: BTreeMap::new(),
            incoming: BTreeMap::new(),
        }
    }
}

impl<N: Ord + Clone> Graph<N> {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_node(&mut self, node: N) {
        self.nodes.insert(node.clone());
        self.out.entry(node.clone()).or_default();
        self.incoming.entry(node).or_default();
    }

    /// Adds an edge, merging into any existing parallel edge by label union.
    pub fn add_edge(&mut self, src: N, dst: N, rel: RelSet) {
        self.add_node(src.clone());
        self.add_node(dst.clone());
        self.out
            .entry(src.clone())
            .or_default()
            .entry(dst.clone())
            .or_default()
            .insert_all(rel);
        self.incoming
            .entry(dst)
            .or_default()
            .entry(src)
            .or_default()
            .insert_all(rel);
    }

    /// Unions `other` into `self`, merging parallel edges by label union.
    pub fn merge(&mut self, other: &Self) {
        for node in &other.nodes {
            self.add_node(node.clone());
        }
        for (src, edges) in &other.out {
            for (dst, rel) in edges {
                self.add_edge(src.clone(), dst.clone(), *rel);
            }
        }
    }

    #[must_use]
    pub fn nodes(&self) -> impl Iterator<Item = &N> {
        self.nodes.iter()
    }

    #[must_use]
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Out-edges of `node`, in ascending target order — the tie-break
    /// order every search primitive relies on.
    #[must_use]
    pub fn out_edges(&self, node: &N) -> impl Iterator<Item = (&N, RelSet)> {
        self.out
            .get(node)
            .into_iter()
            .flat_map(|m| m.iter().map(|(n, r)| (n, *r)))
    }

    #[must_use]
    pub fn in_edges(&self, node: &N) -> impl Iterator<Item = (&N, RelSet)> {
        self.incoming
            .get(node)
            .into_iter()
            .flat_map(|m| m.iter().map(|(n, r)| (n, *r)))
    }

    #[must_use]
    pub fn edge(&self, src: &N, dst: &N) -> Option<RelSet> {
        self.out.get(src).and_then(|m| m.get(dst)).copied()
    }

    /// All edges, in ascending `(src, dst)` order.
    pub fn edges(&self) -> impl Iterator<Item = (&N, &N, RelSet)> {
        self.out
            .iter()
            .flat_map(|(src, m)| m.iter().map(move |(dst, r)| (src, dst, *r)))
    }

    /// A view of `self` containing only edges whose label set intersects
    /// `rels` (§4.4). Idempotent: `project(project(g, r), r) == project(g, r)`.
    #[must_use]
    pub fn project(&self, rels: RelSet) -> Self {
        let mut out = Self::new();
        for node in &self.nodes {
            out.add_node(node.clone());
        }
        for (src, dst, rel) in self.edges() {
            if rel.intersects(rels) {
                out.add_edge(src.clone(), dst.clone(), rel);
            }
        }
        out
    }

    /// Restricts `self` to the given node subset (used to turn the full
    /// graph plus an SCC's node set into the small subgraph cycle search
    /// operates over).
    #[must_use]
    pub fn restrict(&self, nodes: &BTreeSet<N>) -> Self {
        let mut out = Self::new();
        for node in nodes {
            out.add_node(node.clone());
        }
        for (src, dst, rel) in self.edges() {
            if nodes.contains(src) && nodes.contains(dst) {
                out.add_edge(src.clone(), dst.clone(), rel);
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::label::Rel;

    #[test]
    fn project_keeps_only_intersecting_edges() {
        let mut g: Graph<u32> = Graph::new();
        g.add_edge(1, 2, RelSet::of(Rel::Ww));
        g.add_edge(2, 3, RelSet::of(Rel::Wr));
        let proj = g.project(RelSet::of(Rel::Ww));
        assert!(proj.edge(&1, &2).is_some());
        assert!(proj.edge(&2, &3).is_none());
    }

    #[test]
    fn projection_is_idempotent() {
        let mut g: Graph<u32> = Graph::new();
        g.add_edge(1, 2, RelSet::from_iter([Rel::Ww, Rel::Rw]));
        let once = g.project(RelSet::of(Rel::Ww));
        let twice = once.project(RelSet::of(Rel::Ww));
        assert_eq!(once.edges().count(), twice.edges().count());
        assert_eq!(once.edge(&1, &2), twice.edge(&1, &2));
    }

    #[test]
    fn parallel_edges_merge_by_label_union() {
        let mut g: Graph<u32> = Graph::new();
        g.add_edge(1, 2, RelSet::of(Rel::Ww));
        g.add_edge(1, 2, RelSet::of(Rel::Rw));
        assert_eq!(g.edges().count(), 1);
        let rel = g.edge(&1, &2).unwrap();
        assert!(rel.contains(Rel::Ww) && rel.contains(Rel::Rw));
    }

    #[test]
    fn merge_unions_two_graphs() {
        let mut a: Graph<u32> = Graph::new();
        a.add_edge(1, 2, RelSet::of(Rel::Ww));
        let mut b: Graph<u32> = Graph::new();
        b.add_edge(2, 3, RelSet::of(Rel::Wr));
        a.merge(&b);
        assert!(a.edge(&1, &2).is_some());
        assert!(a.edge(&2, &3).is_some());
    }
}
