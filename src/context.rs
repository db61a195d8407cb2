/*
 * SPDX-FileCopyrightText: 2026 Sebastiano Vigna
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

/*!

Contexts handed to [computation](crate::computation::PregelComputation)
hooks.

The per-node contexts ([`InitContext`], [`ComputeContext`]) restrict state
access to the node they were created for, which is what makes the parallel
phase race-free. The [`MasterComputeContext`] runs single-threaded and may
touch any node.

*/

use std::sync::atomic::{AtomicUsize, Ordering};

use sux::bits::AtomicBitVec;

use crate::messages::Mailbox;
use crate::node_value::{NodeValue, NodeValueView};
use crate::traits::Graph;

/// Context of the [`init`](crate::computation::PregelComputation::init)
/// hook: node identity plus write access to the node's own state.
pub struct InitContext<'a, G: Graph> {
    graph: &'a G,
    node_values: &'a NodeValueView<'a>,
    node_id: usize,
}

impl<'a, G: Graph> InitContext<'a, G> {
    pub(crate) fn new(graph: &'a G, node_values: &'a NodeValueView<'a>, node_id: usize) -> Self {
        Self {
            graph,
            node_values,
            node_id,
        }
    }

    /// The internal id of the node being initialized.
    pub fn node_id(&self) -> usize {
        self.node_id
    }

    /// The original identifier of the node being initialized.
    pub fn to_original_id(&self) -> u64 {
        self.graph.to_original_id(self.node_id)
    }

    /// The outdegree of the node being initialized.
    pub fn degree(&self) -> usize {
        self.graph.outdegree(self.node_id)
    }

    pub fn node_count(&self) -> usize {
        self.graph.num_nodes()
    }

    pub fn set_long(&mut self, key: &str, value: i64) {
        // SAFETY: this context is the only accessor of its node id.
        unsafe { self.node_values.set_long(key, self.node_id, value) }
    }

    pub fn set_double(&mut self, key: &str, value: f64) {
        // SAFETY: this context is the only accessor of its node id.
        unsafe { self.node_values.set_double(key, self.node_id, value) }
    }

    pub fn set_long_array(&mut self, key: &str, value: impl Into<Box<[i64]>>) {
        // SAFETY: this context is the only accessor of its node id.
        unsafe {
            self.node_values
                .set_long_array(key, self.node_id, value.into())
        }
    }

    pub fn set_double_array(&mut self, key: &str, value: impl Into<Box<[f64]>>) {
        // SAFETY: this context is the only accessor of its node id.
        unsafe {
            self.node_values
                .set_double_array(key, self.node_id, value.into())
        }
    }
}

/// Context of the
/// [`compute`](crate::computation::PregelComputation::compute) hook: node
/// identity, state access scoped to the node, message sending and halt
/// voting.
pub struct ComputeContext<'a, G: Graph> {
    graph: &'a G,
    node_values: &'a NodeValueView<'a>,
    mailbox: &'a Mailbox,
    votes: &'a AtomicBitVec,
    halted: &'a AtomicUsize,
    weight_fn: &'a (dyn Fn(f64, f64) -> f64 + Sync),
    node_id: usize,
    superstep: usize,
}

impl<'a, G: Graph> ComputeContext<'a, G> {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        graph: &'a G,
        node_values: &'a NodeValueView<'a>,
        mailbox: &'a Mailbox,
        votes: &'a AtomicBitVec,
        halted: &'a AtomicUsize,
        weight_fn: &'a (dyn Fn(f64, f64) -> f64 + Sync),
        node_id: usize,
        superstep: usize,
    ) -> Self {
        Self {
            graph,
            node_values,
            mailbox,
            votes,
            halted,
            weight_fn,
            node_id,
            superstep,
        }
    }

    /// The internal id of the node being computed.
    pub fn node_id(&self) -> usize {
        self.node_id
    }

    /// The original identifier of the node being computed.
    pub fn to_original_id(&self) -> u64 {
        self.graph.to_original_id(self.node_id)
    }

    /// The internal id corresponding to an original identifier.
    pub fn to_mapped_id(&self, original_id: u64) -> usize {
        self.graph.to_mapped_id(original_id)
    }

    /// The current superstep, starting from zero.
    pub fn superstep(&self) -> usize {
        self.superstep
    }

    /// Returns whether this is superstep zero.
    pub fn is_initial_superstep(&self) -> bool {
        self.superstep == 0
    }

    pub fn node_count(&self) -> usize {
        self.graph.num_nodes()
    }

    /// The outdegree of the node being computed.
    pub fn degree(&self) -> usize {
        self.graph.outdegree(self.node_id)
    }

    /// The indegree of the node being computed.
    ///
    /// # Panics
    ///
    /// Panics if the graph has no inverse index; the engine rejects
    /// [bidirectional
    /// computations](crate::computation::PregelComputation::requires_inverse_index)
    /// on such graphs up front.
    pub fn incoming_degree(&self) -> usize {
        self.graph.indegree(self.node_id)
    }

    pub fn long_value(&self, key: &str) -> i64 {
        // SAFETY: this context is the only accessor of its node id.
        unsafe { self.node_values.long_value(key, self.node_id) }
    }

    pub fn double_value(&self, key: &str) -> f64 {
        // SAFETY: this context is the only accessor of its node id.
        unsafe { self.node_values.double_value(key, self.node_id) }
    }

    /// Returns the array stored for this node.
    ///
    /// The slice borrows the context, so it cannot be kept across a
    /// setter call, which would replace the backing array.
    pub fn long_array_value(&self, key: &str) -> &[i64] {
        // SAFETY: this context is the only accessor of its node id.
        unsafe { self.node_values.long_array_value(key, self.node_id) }
    }

    /// Returns the array stored for this node.
    ///
    /// The slice borrows the context, so it cannot be kept across a
    /// setter call, which would replace the backing array.
    pub fn double_array_value(&self, key: &str) -> &[f64] {
        // SAFETY: this context is the only accessor of its node id.
        unsafe { self.node_values.double_array_value(key, self.node_id) }
    }

    pub fn set_long(&mut self, key: &str, value: i64) {
        // SAFETY: this context is the only accessor of its node id.
        unsafe { self.node_values.set_long(key, self.node_id, value) }
    }

    pub fn set_double(&mut self, key: &str, value: f64) {
        // SAFETY: this context is the only accessor of its node id.
        unsafe { self.node_values.set_double(key, self.node_id, value) }
    }

    pub fn set_long_array(&mut self, key: &str, value: impl Into<Box<[i64]>>) {
        // SAFETY: this context is the only accessor of its node id.
        unsafe {
            self.node_values
                .set_long_array(key, self.node_id, value.into())
        }
    }

    pub fn set_double_array(&mut self, key: &str, value: impl Into<Box<[f64]>>) {
        // SAFETY: this context is the only accessor of its node id.
        unsafe {
            self.node_values
                .set_double_array(key, self.node_id, value.into())
        }
    }

    /// Declares this node inactive.
    ///
    /// The node is skipped in subsequent supersteps until a message
    /// addressed to it arrives, which reactivates it. A node that neither
    /// votes nor receives messages stays active.
    pub fn vote_to_halt(&mut self) {
        if !self.votes.swap(self.node_id, true, Ordering::Relaxed) {
            self.halted.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Sends `message` to an arbitrary target node.
    pub fn send_to(&mut self, target: usize, message: f64) {
        self.mailbox.send_to(self.node_id, target, message);
    }

    /// Sends `message` along every outgoing arc, transformed by
    /// [`apply_relationship_weight`](crate::computation::PregelComputation::apply_relationship_weight)
    /// with the arc's weight. Arcs without a weight use `1.0`.
    pub fn send_to_neighbors(&mut self, message: f64) {
        let node = self.node_id;
        let mailbox = self.mailbox;
        let weight_fn = self.weight_fn;
        self.graph
            .for_each_weighted_successor(node, 1.0, &mut |succ, weight| {
                mailbox.send_to(node, succ, weight_fn(message, weight));
            });
    }

    /// Sends `message` along every incoming arc, untransformed.
    ///
    /// # Panics
    ///
    /// Panics if the graph has no inverse index.
    pub fn send_to_incoming_neighbors(&mut self, message: f64) {
        let node = self.node_id;
        let mailbox = self.mailbox;
        self.graph.for_each_predecessor(node, &mut |pred| {
            mailbox.send_to(node, pred, message);
        });
    }
}

/// Context of the
/// [`master_compute`](crate::computation::PregelComputation::master_compute)
/// hook: single-threaded, unrestricted access to the whole store.
pub struct MasterComputeContext<'a, G: Graph> {
    graph: &'a G,
    node_values: &'a mut NodeValue,
    superstep: usize,
}

impl<'a, G: Graph> MasterComputeContext<'a, G> {
    pub(crate) fn new(graph: &'a G, node_values: &'a mut NodeValue, superstep: usize) -> Self {
        Self {
            graph,
            node_values,
            superstep,
        }
    }

    /// The superstep that just completed, starting from zero.
    pub fn superstep(&self) -> usize {
        self.superstep
    }

    pub fn node_count(&self) -> usize {
        self.graph.num_nodes()
    }

    pub fn graph(&self) -> &G {
        self.graph
    }

    /// Invokes `callback` for every node id, stopping early if it returns
    /// `false`.
    pub fn for_each_node(&self, callback: &mut dyn FnMut(usize) -> bool) {
        for node in 0..self.graph.num_nodes() {
            if !callback(node) {
                break;
            }
        }
    }

    pub fn long_value(&self, key: &str, node: usize) -> i64 {
        self.node_values.long_value(key, node)
    }

    pub fn double_value(&self, key: &str, node: usize) -> f64 {
        self.node_values.double_value(key, node)
    }

    pub fn set_long(&mut self, key: &str, node: usize, value: i64) {
        self.node_values.set_long(key, node, value);
    }

    pub fn set_double(&mut self, key: &str, node: usize, value: f64) {
        self.node_values.set_double(key, node, value);
    }

    /// The whole node-value store.
    pub fn node_values(&self) -> &NodeValue {
        self.node_values
    }

    /// The whole node-value store, mutably.
    pub fn node_values_mut(&mut self) -> &mut NodeValue {
        self.node_values
    }
}
