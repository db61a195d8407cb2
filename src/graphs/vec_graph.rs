/*
 * SPDX-FileCopyrightText: 2026 Sebastiano Vigna
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

use crate::traits::Graph;

/// Vector-based mutable [`Graph`] implementation.
///
/// Arcs can carry an optional weight; unweighted arcs report the fallback
/// weight passed to
/// [`for_each_weighted_successor`](Graph::for_each_weighted_successor).
/// Parallel arcs are kept.
///
/// An inverse (incoming-arc) index is not maintained by default; call
/// [`build_inverse_index`](VecGraph::build_inverse_index) after adding arcs
/// to enable bidirectional computations.
#[derive(Clone, Debug, Default)]
pub struct VecGraph {
    /// The number of arcs in the graph.
    number_of_arcs: usize,
    /// For each node, its list of successors with an optional weight.
    succ: Vec<Vec<(usize, Option<f64>)>>,
    /// For each node, its list of predecessors, if the inverse index has
    /// been built.
    pred: Option<Vec<Vec<usize>>>,
    /// The name of the relationship type arcs belong to, if any; used in
    /// capability-error messages.
    relationship_type: Option<String>,
}

impl VecGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn empty(n: usize) -> Self {
        Self {
            number_of_arcs: 0,
            succ: Vec::from_iter((0..n).map(|_| Vec::new())),
            pred: None,
            relationship_type: None,
        }
    }

    pub fn from_arcs(arcs: impl IntoIterator<Item = (usize, usize)>) -> Self {
        let mut g = Self::new();
        g.add_arcs(arcs);
        g
    }

    /// Adds a node, extending the graph if necessary, and returns whether
    /// the graph grew.
    pub fn add_node(&mut self, node: usize) -> bool {
        let len = self.succ.len();
        self.succ.extend((len..=node).map(|_| Vec::new()));
        if let Some(pred) = &mut self.pred {
            let len = pred.len();
            pred.extend((len..=node).map(|_| Vec::new()));
        }
        len <= node
    }

    pub fn add_arc(&mut self, u: usize, v: usize) -> &mut Self {
        self.add_arc_with(u, v, None)
    }

    pub fn add_weighted_arc(&mut self, u: usize, v: usize, weight: f64) -> &mut Self {
        self.add_arc_with(u, v, Some(weight))
    }

    pub fn add_arcs(&mut self, arcs: impl IntoIterator<Item = (usize, usize)>) -> &mut Self {
        for (u, v) in arcs {
            self.add_arc(u, v);
        }
        self
    }

    fn add_arc_with(&mut self, u: usize, v: usize, weight: Option<f64>) -> &mut Self {
        self.add_node(u.max(v));
        self.succ[u].push((v, weight));
        if let Some(pred) = &mut self.pred {
            pred[v].push(u);
        }
        self.number_of_arcs += 1;
        self
    }

    /// Builds the inverse index, enabling
    /// [`indegree`](Graph::indegree) and
    /// [`for_each_predecessor`](Graph::for_each_predecessor).
    ///
    /// Arcs added afterwards keep the index up to date.
    pub fn build_inverse_index(&mut self) -> &mut Self {
        let mut pred = vec![Vec::new(); self.succ.len()];
        for (u, succ) in self.succ.iter().enumerate() {
            for &(v, _) in succ {
                pred[v].push(u);
            }
        }
        self.pred = Some(pred);
        self
    }

    /// Sets the relationship type name reported by
    /// [`relationship_types`](Graph::relationship_types).
    pub fn relationship_type(&mut self, name: impl Into<String>) -> &mut Self {
        self.relationship_type = Some(name.into());
        self
    }
}

impl Graph for VecGraph {
    fn num_nodes(&self) -> usize {
        self.succ.len()
    }

    fn num_arcs(&self) -> usize {
        self.number_of_arcs
    }

    fn outdegree(&self, node: usize) -> usize {
        self.succ[node].len()
    }

    fn for_each_successor(&self, node: usize, callback: &mut dyn FnMut(usize)) {
        for &(succ, _) in &self.succ[node] {
            callback(succ);
        }
    }

    fn for_each_weighted_successor(
        &self,
        node: usize,
        fallback_weight: f64,
        callback: &mut dyn FnMut(usize, f64),
    ) {
        for &(succ, weight) in &self.succ[node] {
            callback(succ, weight.unwrap_or(fallback_weight));
        }
    }

    fn has_inverse_index(&self) -> bool {
        self.pred.is_some()
    }

    fn indegree(&self, node: usize) -> usize {
        match &self.pred {
            Some(pred) => pred[node].len(),
            None => panic!("This graph does not maintain an inverse index"),
        }
    }

    fn for_each_predecessor(&self, node: usize, callback: &mut dyn FnMut(usize)) {
        match &self.pred {
            Some(pred) => {
                for &p in &pred[node] {
                    callback(p);
                }
            }
            None => panic!("This graph does not maintain an inverse index"),
        }
    }

    fn relationship_types(&self) -> Vec<String> {
        self.relationship_type.iter().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_arc_grows_graph() {
        let mut g = VecGraph::new();
        g.add_arc(0, 2).add_arc(2, 1);
        assert_eq!(g.num_nodes(), 3);
        assert_eq!(g.num_arcs(), 2);
        assert_eq!(g.outdegree(0), 1);
        assert_eq!(g.outdegree(1), 0);
    }

    #[test]
    fn test_weighted_successors() {
        let mut g = VecGraph::empty(3);
        g.add_weighted_arc(0, 1, 2.5).add_arc(0, 2);
        let mut arcs = Vec::new();
        g.for_each_weighted_successor(0, 1.0, &mut |succ, w| arcs.push((succ, w)));
        assert_eq!(arcs, vec![(1, 2.5), (2, 1.0)]);
    }

    #[test]
    fn test_inverse_index() {
        let mut g = VecGraph::from_arcs([(0, 2), (1, 2), (2, 0)]);
        assert!(!g.has_inverse_index());
        g.build_inverse_index();
        assert!(g.has_inverse_index());
        assert_eq!(g.indegree(2), 2);
        let mut pred = Vec::new();
        g.for_each_predecessor(2, &mut |p| pred.push(p));
        assert_eq!(pred, vec![0, 1]);
        // arcs added after the index is built keep it up to date
        g.add_arc(0, 1);
        assert_eq!(g.indegree(1), 1);
    }

    #[test]
    #[should_panic(expected = "does not maintain an inverse index")]
    fn test_missing_inverse_index() {
        let g = VecGraph::from_arcs([(0, 1)]);
        g.indegree(1);
    }
}
