/*
 * SPDX-FileCopyrightText: 2026 Sebastiano Vigna
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

/*!

Division of the node id space into contiguous batches for parallel
processing.

Partitions are computed once per run and reused by every superstep. They are
always contiguous, ordered ranges covering the whole id space exactly once,
so workers scan nodes sequentially and results do not depend on which worker
processed which partition.

*/

use crate::traits::Graph;

/// The strategy used to divide nodes into per-worker batches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Partitioning {
    /// Equally sized node ranges, regardless of degrees.
    Range,
    /// Node ranges balanced by cumulated outdegree.
    ///
    /// Best when degrees are skewed, as message fan-out is proportional to
    /// degree.
    Degree,
    /// Chooses [`Degree`](Partitioning::Degree) when more than one worker is
    /// available and the graph supports [constant-time
    /// outdegrees](Graph::has_fast_outdegree), and
    /// [`Range`](Partitioning::Range) otherwise.
    #[default]
    Auto,
}

/// Splits the id space of `graph` into at most `concurrency` contiguous
/// ranges according to `partitioning`.
///
/// The returned ranges are in increasing order, non-empty (except for the
/// single `0..0` range returned for an empty graph), and cover `0..n`
/// exactly.
pub fn partition(
    graph: &impl Graph,
    concurrency: usize,
    partitioning: Partitioning,
) -> Vec<std::ops::Range<usize>> {
    debug_assert!(concurrency > 0);
    let n = graph.num_nodes();
    if n == 0 {
        return vec![0..0];
    }
    match partitioning {
        Partitioning::Range => range_partition(n, concurrency),
        Partitioning::Degree => degree_partition(graph, concurrency),
        Partitioning::Auto => {
            if concurrency > 1 && graph.has_fast_outdegree() {
                degree_partition(graph, concurrency)
            } else {
                range_partition(n, concurrency)
            }
        }
    }
}

fn range_partition(n: usize, concurrency: usize) -> Vec<std::ops::Range<usize>> {
    let batch_size = n.div_ceil(concurrency);
    let mut partitions = Vec::with_capacity(concurrency);
    let mut start = 0;
    while start < n {
        let end = (start + batch_size).min(n);
        partitions.push(start..end);
        start = end;
    }
    partitions
}

fn degree_partition(graph: &impl Graph, concurrency: usize) -> Vec<std::ops::Range<usize>> {
    let n = graph.num_nodes();
    // Balance on arcs plus nodes so zero-degree stretches still split.
    let total_load = graph.num_arcs() + n;
    let batch_load = total_load.div_ceil(concurrency).max(1);
    let mut partitions = Vec::with_capacity(concurrency);
    let mut start = 0;
    let mut load = 0;
    for node in 0..n {
        load += graph.outdegree(node) + 1;
        if load >= batch_load {
            partitions.push(start..node + 1);
            start = node + 1;
            load = 0;
        }
    }
    if start < n {
        partitions.push(start..n);
    }
    partitions
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graphs::vec_graph::VecGraph;

    fn covers(partitions: &[std::ops::Range<usize>], n: usize) {
        let mut next = 0;
        for p in partitions {
            assert_eq!(p.start, next);
            assert!(p.end > p.start);
            next = p.end;
        }
        assert_eq!(next, n);
    }

    #[test]
    fn test_range_even_split() {
        let g = VecGraph::empty(10);
        let p = partition(&g, 4, Partitioning::Range);
        assert_eq!(p, vec![0..3, 3..6, 6..9, 9..10]);
        covers(&p, 10);
    }

    #[test]
    fn test_range_more_workers_than_nodes() {
        let g = VecGraph::empty(2);
        let p = partition(&g, 8, Partitioning::Range);
        covers(&p, 2);
        assert!(p.len() <= 2);
    }

    #[test]
    fn test_empty_graph() {
        let g = VecGraph::new();
        assert_eq!(partition(&g, 4, Partitioning::Auto), vec![0..0]);
    }

    #[test]
    fn test_degree_balances_skew() {
        // node 0 carries almost all arcs
        let mut g = VecGraph::empty(8);
        for v in 1..8 {
            g.add_arc(0, v);
        }
        let p = partition(&g, 2, Partitioning::Degree);
        covers(&p, 8);
        // the heavy node must not drag half the remaining nodes with it
        assert_eq!(p[0], 0..1);
    }

    #[test]
    fn test_auto_single_worker_is_range() {
        let g = VecGraph::from_arcs([(0, 1), (1, 2)]);
        let p = partition(&g, 1, Partitioning::Auto);
        assert_eq!(p, vec![0..3]);
    }
}
