/*
 * SPDX-FileCopyrightText: 2026 Sebastiano Vigna
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

/*!

The superstep scheduler.

A [`Pregel`] job is built from a graph, a
[computation](crate::computation::PregelComputation) and a [`PregelConfig`];
construction validates the configuration against the computation's declared
capabilities and allocates the node-value store and the mailbox, so all
failures other than [termination](PregelError::Terminated) happen before the
first superstep.

Each superstep runs the compute phase in parallel over fixed node
[partitions](crate::partition), then the single-threaded master-compute
phase. The run stops when the master signals convergence, when every node
has voted to halt and no message is pending, or after
[`max_iterations`](PregelConfig) supersteps.

*/

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use crossbeam_utils::CachePadded;
use dsi_progress_logger::{no_logging, ConcurrentProgressLog, ProgressLog};
use rayon::{ThreadPool, ThreadPoolBuilder};
use sux::bits::AtomicBitVec;
use thiserror::Error;

use crate::computation::PregelComputation;
use crate::context::{ComputeContext, InitContext, MasterComputeContext};
use crate::messages::Mailbox;
use crate::node_value::NodeValue;
use crate::partition::{partition, Partitioning};
use crate::traits::{Graph, TerminationFlag};

/// Errors a [`Pregel`] job can fail with.
#[derive(Error, Debug)]
pub enum PregelError {
    /// The configured concurrency is zero.
    #[error("Invalid concurrency {0}: at least one worker thread is required")]
    InvalidConcurrency(usize),
    /// The computation forbids parallel execution but more than one worker
    /// was configured.
    #[error("The computation {computation} does not support concurrency {concurrency}")]
    ConcurrencyNotSupported {
        computation: String,
        concurrency: usize,
    },
    /// A bidirectional computation was built against a graph without an
    /// inverse index.
    #[error(
        "The computation {computation} requires an inverse index for each relationship type {missing:?}"
    )]
    MissingInverseIndex {
        computation: String,
        missing: Vec<String>,
    },
    /// The external [`TerminationFlag`] flipped during the run.
    #[error("The computation was terminated")]
    Terminated,
    /// The worker thread pool could not be built.
    #[error(transparent)]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

/// Configuration of a [`Pregel`] job.
#[derive(Debug, Clone)]
pub struct PregelConfig {
    max_iterations: usize,
    concurrency: usize,
    is_asynchronous: bool,
    partitioning: Partitioning,
    track_sender: bool,
}

impl PregelConfig {
    /// Creates a configuration running at most `max_iterations` supersteps,
    /// with as many workers as available CPU cores, synchronous message
    /// delivery, [automatic partitioning](Partitioning::Auto) and no sender
    /// tracking.
    pub fn new(max_iterations: usize) -> Self {
        Self {
            max_iterations,
            concurrency: num_cpus::get(),
            is_asynchronous: false,
            partitioning: Partitioning::Auto,
            track_sender: false,
        }
    }

    /// Sets the number of worker threads.
    pub fn concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency;
        self
    }

    /// Enables asynchronous message delivery.
    ///
    /// In asynchronous mode there is no message double-buffering: a message
    /// can be seen in the superstep it was sent in, when the target node is
    /// processed after the send. Partition processing order is not
    /// deterministic, so neither is delivery timing; computations relying on
    /// synchronous semantics must not enable this.
    pub fn asynchronous(mut self, asynchronous: bool) -> Self {
        self.is_asynchronous = asynchronous;
        self
    }

    /// Sets the partitioning strategy.
    pub fn partitioning(mut self, partitioning: Partitioning) -> Self {
        self.partitioning = partitioning;
        self
    }

    /// Enables [sender tracking](crate::messages::Messages::sender).
    ///
    /// Only effective for queue-based runs; ignored when the computation
    /// declares a [reducer](crate::computation::PregelComputation::reducer),
    /// as combined messages have no single sender.
    pub fn track_sender(mut self, track_sender: bool) -> Self {
        self.track_sender = track_sender;
        self
    }

    pub fn max_iterations(&self) -> usize {
        self.max_iterations
    }

    pub fn is_asynchronous(&self) -> bool {
        self.is_asynchronous
    }

    pub fn tracks_sender(&self) -> bool {
        self.track_sender
    }

    pub fn num_threads(&self) -> usize {
        self.concurrency
    }
}

/// The result of a completed run.
pub struct PregelResult {
    node_values: NodeValue,
    ran_iterations: usize,
    did_converge: bool,
}

impl PregelResult {
    /// The final node-value store.
    pub fn node_values(&self) -> &NodeValue {
        &self.node_values
    }

    /// Consumes the result, returning the final node-value store.
    pub fn into_node_values(self) -> NodeValue {
        self.node_values
    }

    /// The number of supersteps actually run.
    pub fn ran_iterations(&self) -> usize {
        self.ran_iterations
    }

    /// Whether
    /// [`master_compute`](crate::computation::PregelComputation::master_compute)
    /// signalled convergence before the iteration limit.
    ///
    /// A run that stops because every node halted with no pending message
    /// reports `false` here, as does one that exhausts its iterations.
    pub fn did_converge(&self) -> bool {
        self.did_converge
    }
}

/// A runnable vertex-centric computation job.
///
/// # Examples
///
/// ```
/// # fn main() -> Result<(), pregel::pregel::PregelError> {
/// use pregel::prelude::*;
///
/// struct DegreeCount;
///
/// impl<G: Graph> PregelComputation<G> for DegreeCount {
///     fn schema(&self) -> PregelSchema {
///         PregelSchema::builder().add("degree", ValueType::Long).build()
///     }
///
///     fn compute(&self, ctx: &mut ComputeContext<'_, G>, _messages: &mut Messages<'_>) {
///         ctx.set_long("degree", ctx.degree() as i64);
///         ctx.vote_to_halt();
///     }
/// }
///
/// let graph = VecGraph::from_arcs([(0, 1), (0, 2), (1, 2)]);
/// let result = Pregel::new(&graph, DegreeCount, PregelConfig::new(10))?.run()?;
/// assert_eq!(result.node_values().long_column("degree"), &[2, 1, 0]);
/// # Ok(())
/// # }
/// ```
pub struct Pregel<'a, G: Graph, C: PregelComputation<G>> {
    graph: &'a G,
    computation: C,
    config: PregelConfig,
    thread_pool: ThreadPool,
    termination_flag: TerminationFlag,
    node_values: NodeValue,
    mailbox: Mailbox,
    votes: AtomicBitVec,
    halted: CachePadded<AtomicUsize>,
}

impl<'a, G: Graph, C: PregelComputation<G>> Pregel<'a, G, C> {
    /// Builds a job, validating `config` against the computation's declared
    /// capabilities and allocating all per-node structures.
    pub fn new(graph: &'a G, computation: C, config: PregelConfig) -> Result<Self, PregelError> {
        if config.concurrency == 0 {
            return Err(PregelError::InvalidConcurrency(0));
        }
        if config.concurrency > 1 && !computation.supports_parallel_execution() {
            return Err(PregelError::ConcurrencyNotSupported {
                computation: computation.name().into(),
                concurrency: config.concurrency,
            });
        }
        if computation.requires_inverse_index() && !graph.has_inverse_index() {
            return Err(PregelError::MissingInverseIndex {
                computation: computation.name().into(),
                missing: graph.relationship_types(),
            });
        }
        let thread_pool = ThreadPoolBuilder::new()
            .num_threads(config.concurrency)
            .build()?;
        let n = graph.num_nodes();
        let node_values = NodeValue::of(&computation.schema(), n);
        let mailbox = Mailbox::new(
            n,
            computation.reducer(),
            config.track_sender,
            config.is_asynchronous,
        );
        Ok(Self {
            graph,
            computation,
            config,
            thread_pool,
            termination_flag: TerminationFlag::running_true(),
            node_values,
            mailbox,
            votes: AtomicBitVec::new(n),
            halted: CachePadded::new(AtomicUsize::new(0)),
        })
    }

    /// Sets the termination flag polled at partition dispatch.
    pub fn termination_flag(&mut self, flag: TerminationFlag) -> &mut Self {
        self.termination_flag = flag;
        self
    }

    /// Runs the job without logging.
    pub fn run(self) -> Result<PregelResult, PregelError> {
        self.run_with_logging(no_logging![], no_logging![])
    }

    /// Runs the job, logging progress.
    ///
    /// `pl` is a sequential [`ProgressLog`] counting supersteps. `cpl` is a
    /// [`ConcurrentProgressLog`] reporting the two sub-tasks of each
    /// superstep, the parallel compute phase (one unit per node) and the
    /// master-compute phase, each started and completed before the other
    /// begins. Hosts with a hierarchical progress tracker can mirror the
    /// superstep structure by mapping each started `cpl` sub-task to a
    /// child task of the current superstep. Either argument can be
    /// [`no_logging![]`](dsi_progress_logger::no_logging).
    pub fn run_with_logging(
        self,
        pl: &mut impl ProgressLog,
        cpl: &mut impl ConcurrentProgressLog,
    ) -> Result<PregelResult, PregelError> {
        let Pregel {
            graph,
            computation,
            config,
            thread_pool,
            termination_flag,
            mut node_values,
            mut mailbox,
            votes,
            halted,
        } = self;
        let n = graph.num_nodes();
        let partitions = partition(graph, config.concurrency, config.partitioning);

        log::info!("Computation: {}", computation.name());
        log::info!("Concurrency: {}", config.concurrency);
        log::info!("Partitions: {}", partitions.len());
        log::info!(
            "Mode: {}",
            if config.is_asynchronous {
                "asynchronous"
            } else {
                "synchronous"
            }
        );

        let weight_fn: &(dyn Fn(f64, f64) -> f64 + Sync) =
            &|message, weight| computation.apply_relationship_weight(message, weight);

        pl.item_name("superstep");
        pl.expected_updates(Some(config.max_iterations));
        pl.start(format!("Running {}...", computation.name()));

        let mut ran_iterations = 0;
        let mut did_converge = false;

        for superstep in 0..config.max_iterations {
            mailbox.init_iteration();
            let stopped = AtomicBool::new(false);
            {
                let view = node_values.view();
                let partition_cursor = AtomicUsize::new(0);

                cpl.item_name("node");
                cpl.expected_updates(Some(n));
                cpl.start(format!("Superstep {superstep}: compute..."));

                thread_pool.broadcast(|_| {
                    let mut local_cpl = cpl.clone();
                    loop {
                        let index = partition_cursor.fetch_add(1, Ordering::Relaxed);
                        if index >= partitions.len() {
                            break;
                        }
                        if !termination_flag.is_running() {
                            stopped.store(true, Ordering::Relaxed);
                            break;
                        }
                        let range = partitions[index].clone();
                        let batch = range.len();
                        for node in range {
                            let mut messages = mailbox.messages(node);
                            if superstep == 0 {
                                let mut ctx = InitContext::new(graph, &view, node);
                                computation.init(&mut ctx);
                            } else if votes.get(node, Ordering::Relaxed) {
                                if messages.is_empty() {
                                    continue;
                                }
                                // a message reactivates a halted node
                                if votes.swap(node, false, Ordering::Relaxed) {
                                    halted.fetch_sub(1, Ordering::Relaxed);
                                }
                            }
                            let mut ctx = ComputeContext::new(
                                graph, &view, &mailbox, &votes, &halted, weight_fn, node,
                                superstep,
                            );
                            computation.compute(&mut ctx, &mut messages);
                        }
                        local_cpl.update_with_count(batch);
                    }
                });

                cpl.done();
            }

            if stopped.load(Ordering::Relaxed) {
                return Err(PregelError::Terminated);
            }

            ran_iterations = superstep + 1;

            cpl.item_name("node");
            cpl.expected_updates(Some(n));
            cpl.start(format!("Superstep {superstep}: master compute..."));
            let master_converged = {
                let mut ctx = MasterComputeContext::new(graph, &mut node_values, superstep);
                computation.master_compute(&mut ctx)
            };
            cpl.update_with_count(n);
            cpl.done();
            pl.update();

            log::debug!(
                "Superstep {}: {} halted node(s), {} message(s) sent",
                superstep,
                halted.load(Ordering::Relaxed),
                mailbox.messages_sent()
            );

            if master_converged {
                did_converge = true;
                break;
            }
            // quiescence: every node halted and nothing left to deliver
            if halted.load(Ordering::Relaxed) == n && mailbox.messages_sent() == 0 {
                break;
            }
        }

        pl.done();
        log::info!(
            "Ran {} superstep(s), {}",
            ran_iterations,
            if did_converge {
                "converged"
            } else {
                "stopped"
            }
        );

        Ok(PregelResult {
            node_values,
            ran_iterations,
            did_converge,
        })
    }
}
