/*
 * SPDX-FileCopyrightText: 2026 Sebastiano Vigna
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

/*!

Traits describing the collaborators the engine consumes: a graph abstraction
and a termination flag.

The engine never owns a graph representation. Any type exposing node count,
degrees, and consumer-style neighbor enumeration can drive a
[computation](crate::computation::PregelComputation); the mutable
[`VecGraph`](crate::graphs::vec_graph::VecGraph) is provided for small graphs
and tests.

*/

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// An immutable graph, as seen by the engine.
///
/// Node ids are internal, dense and zero-based; the
/// [`to_original_id`](Graph::to_original_id)/[`to_mapped_id`](Graph::to_mapped_id)
/// bijection maps them to the identifier space of the system the graph was
/// loaded from (the default is the identity).
///
/// Neighbor enumeration is consumer-style: implementations invoke a callback
/// for each successor of a node. The weighted variant has a default
/// implementation that reports the fallback weight for every arc, so
/// unweighted graphs only need to implement
/// [`for_each_successor`](Graph::for_each_successor).
///
/// Implementations must be [`Sync`]: during a superstep the same graph is
/// read concurrently from all worker threads.
pub trait Graph: Sync {
    /// Returns the number of nodes in the graph.
    fn num_nodes(&self) -> usize;

    /// Returns the number of arcs in the graph.
    fn num_arcs(&self) -> usize;

    /// Returns the number of outgoing arcs of a node.
    fn outdegree(&self, node: usize) -> usize;

    /// Invokes `callback` once per successor of `node`.
    fn for_each_successor(&self, node: usize, callback: &mut dyn FnMut(usize));

    /// Invokes `callback` once per successor of `node`, passing the arc
    /// weight, or `fallback_weight` for graphs without weights.
    fn for_each_weighted_successor(
        &self,
        node: usize,
        fallback_weight: f64,
        callback: &mut dyn FnMut(usize, f64),
    ) {
        self.for_each_successor(node, &mut |succ| callback(succ, fallback_weight));
    }

    /// Maps an internal node id to the original identifier space.
    fn to_original_id(&self, node: usize) -> u64 {
        node as u64
    }

    /// Maps an original identifier to an internal node id.
    fn to_mapped_id(&self, original_id: u64) -> usize {
        original_id as usize
    }

    /// Returns whether the graph maintains an inverse (incoming-arc) index.
    ///
    /// [Bidirectional
    /// computations](crate::computation::PregelComputation::requires_inverse_index)
    /// can only run on graphs returning true.
    fn has_inverse_index(&self) -> bool {
        false
    }

    /// Returns the number of incoming arcs of a node.
    ///
    /// # Panics
    ///
    /// The default implementation panics, as it must only be called when
    /// [`has_inverse_index`](Graph::has_inverse_index) returns true.
    fn indegree(&self, _node: usize) -> usize {
        panic!("This graph does not maintain an inverse index")
    }

    /// Invokes `callback` once per predecessor of `node`.
    ///
    /// # Panics
    ///
    /// The default implementation panics, as it must only be called when
    /// [`has_inverse_index`](Graph::has_inverse_index) returns true.
    fn for_each_predecessor(&self, _node: usize, _callback: &mut dyn FnMut(usize)) {
        panic!("This graph does not maintain an inverse index")
    }

    /// Returns the names of the relationship types the graph was built from.
    ///
    /// The list is only used to build error messages (e.g., when a
    /// bidirectional computation is run on a graph without an inverse index).
    fn relationship_types(&self) -> Vec<String> {
        Vec::new()
    }

    /// Returns whether [`outdegree`](Graph::outdegree) is a constant-time
    /// operation.
    ///
    /// Drives the choice made by
    /// [`Partitioning::Auto`](crate::partition::Partitioning::Auto).
    fn has_fast_outdegree(&self) -> bool {
        true
    }
}

/// A cloneable, externally flippable stop signal.
///
/// The engine polls the flag once per partition dispatch: when the flag stops
/// running, in-flight partitions finish their current node, no new partition
/// is taken up, and the run fails with
/// [`PregelError::Terminated`](crate::pregel::PregelError::Terminated).
///
/// # Examples
///
/// ```
/// use pregel::traits::TerminationFlag;
///
/// let flag = TerminationFlag::running_true();
/// let handle = flag.clone();
/// assert!(flag.is_running());
/// handle.stop();
/// assert!(!flag.is_running());
/// ```
#[derive(Clone, Debug)]
pub struct TerminationFlag {
    running: Arc<AtomicBool>,
}

impl TerminationFlag {
    /// Creates a flag in the running state.
    pub fn running_true() -> Self {
        Self {
            running: Arc::new(AtomicBool::new(true)),
        }
    }

    /// Creates a flag in the stopped state.
    pub fn stopped() -> Self {
        let flag = Self::running_true();
        flag.stop();
        flag
    }

    /// Flips the flag to the stopped state. All clones observe the change.
    pub fn stop(&self) {
        self.running.store(false, Ordering::Relaxed);
    }

    /// Returns whether the computation should keep running.
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Relaxed)
    }
}

impl Default for TerminationFlag {
    fn default() -> Self {
        Self::running_true()
    }
}
