/*
 * SPDX-FileCopyrightText: 2026 Sebastiano Vigna
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

use crate::context::{ComputeContext, InitContext, MasterComputeContext};
use crate::memory::MemoryEstimation;
use crate::messages::{MessageReducer, Messages};
use crate::pregel::PregelConfig;
use crate::schema::PregelSchema;
use crate::traits::Graph;

/// A vertex-centric computation, as driven by the
/// [engine](crate::pregel::Pregel).
///
/// Implementations describe the behavior of a single node:
/// [`init`](PregelComputation::init) runs once per node before the first
/// superstep, [`compute`](PregelComputation::compute) runs once per active
/// node in every superstep. Both may be invoked concurrently for different
/// nodes, so implementations only mutate state through the contexts they are
/// handed, which restrict writes to the current node.
///
/// All hooks except [`schema`](PregelComputation::schema) and
/// [`compute`](PregelComputation::compute) have defaults, so a minimal
/// computation implements just those two.
///
/// # Examples
///
/// Each node computes the minimum original id reachable by inverted paths:
///
/// ```
/// use pregel::prelude::*;
///
/// struct MinIdPropagation;
///
/// impl<G: Graph> PregelComputation<G> for MinIdPropagation {
///     fn schema(&self) -> PregelSchema {
///         PregelSchema::builder().add("min_id", ValueType::Long).build()
///     }
///
///     fn init(&self, ctx: &mut InitContext<'_, G>) {
///         ctx.set_long("min_id", ctx.node_id() as i64);
///     }
///
///     fn compute(&self, ctx: &mut ComputeContext<'_, G>, messages: &mut Messages<'_>) {
///         let mut min = ctx.long_value("min_id");
///         for m in messages.by_ref() {
///             min = min.min(m as i64);
///         }
///         if min < ctx.long_value("min_id") || ctx.is_initial_superstep() {
///             ctx.set_long("min_id", min);
///             ctx.send_to_neighbors(min as f64);
///         }
///         ctx.vote_to_halt();
///     }
///
///     fn reducer(&self) -> Option<MessageReducer> {
///         Some(MessageReducer::Min)
///     }
/// }
/// ```
pub trait PregelComputation<G: Graph>: Send + Sync {
    /// Returns the schema of the per-node state.
    ///
    /// Called once per run, before any allocation.
    fn schema(&self) -> PregelSchema;

    /// Initializes the state of a node. Runs before the first superstep.
    ///
    /// The default leaves the schema defaults in place (zeros and empty
    /// arrays).
    fn init(&self, _ctx: &mut InitContext<'_, G>) {}

    /// Processes one active node for one superstep.
    ///
    /// `messages` yields the messages addressed to this node; in synchronous
    /// mode, exactly those sent during the previous superstep.
    fn compute(&self, ctx: &mut ComputeContext<'_, G>, messages: &mut Messages<'_>);

    /// Runs single-threaded between supersteps, after the parallel phase.
    ///
    /// Returning `true` stops the run, marking it converged. The default
    /// never stops the run.
    fn master_compute(&self, _ctx: &mut MasterComputeContext<'_, G>) -> bool {
        false
    }

    /// Returns the reducer combining messages at send time, if any.
    ///
    /// Computations whose logic only depends on a combination of the
    /// incoming messages should return one: the engine then uses the
    /// constant-memory reducing mailbox.
    fn reducer(&self) -> Option<MessageReducer> {
        None
    }

    /// Maps a message through the weight of the arc it travels along.
    ///
    /// Applied by
    /// [`send_to_neighbors`](ComputeContext::send_to_neighbors); the default
    /// ignores the weight.
    fn apply_relationship_weight(&self, message: f64, _weight: f64) -> f64 {
        message
    }

    /// Returns whether the computation reads incoming arcs.
    ///
    /// When true, the engine refuses to run on graphs without an [inverse
    /// index](Graph::has_inverse_index).
    fn requires_inverse_index(&self) -> bool {
        false
    }

    /// Returns whether the computation may run on more than one thread.
    fn supports_parallel_execution(&self) -> bool {
        true
    }

    /// Returns the memory estimation of a run of this computation under
    /// `config`, applicable to arbitrary graph dimensions.
    fn estimate_memory(&self, config: &PregelConfig) -> MemoryEstimation {
        MemoryEstimation::new(
            self.schema(),
            self.reducer().is_none(),
            config.is_asynchronous(),
            config.tracks_sender(),
        )
    }

    /// The name used in log and error messages.
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }
}
