/*
 * SPDX-FileCopyrightText: 2026 Sebastiano Vigna
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use anyhow::Result;
use dsi_progress_logger::{concurrent_progress_logger, progress_logger};
use pregel::prelude::*;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

/// Propagates the minimum node id along outgoing arcs until a fixpoint.
struct MinIdPropagation;

impl<G: Graph> PregelComputation<G> for MinIdPropagation {
    fn schema(&self) -> PregelSchema {
        PregelSchema::builder().add("min_id", ValueType::Long).build()
    }

    fn init(&self, ctx: &mut InitContext<'_, G>) {
        let id = ctx.node_id() as i64;
        ctx.set_long("min_id", id);
    }

    fn compute(&self, ctx: &mut ComputeContext<'_, G>, messages: &mut Messages<'_>) {
        let mut min = ctx.long_value("min_id");
        for m in messages.by_ref() {
            min = min.min(m as i64);
        }
        if min < ctx.long_value("min_id") || ctx.is_initial_superstep() {
            ctx.set_long("min_id", min);
            ctx.send_to_neighbors(min as f64);
        }
        ctx.vote_to_halt();
    }

    fn reducer(&self) -> Option<MessageReducer> {
        Some(MessageReducer::Min)
    }
}

fn random_graph(n: usize, arcs: usize, seed: u64) -> VecGraph {
    let mut rng = SmallRng::seed_from_u64(seed);
    let mut g = VecGraph::empty(n);
    for _ in 0..arcs {
        g.add_arc(rng.random_range(0..n), rng.random_range(0..n));
    }
    g
}

fn cycle_with_chords() -> VecGraph {
    let mut g = VecGraph::empty(20);
    for u in 0..20 {
        g.add_arc(u, (u + 1) % 20);
    }
    g.add_arc(3, 17).add_arc(11, 2).add_arc(19, 5);
    g
}

#[test]
fn test_determinism() -> Result<()> {
    let _ = env_logger::builder().is_test(true).try_init();
    let graph = cycle_with_chords();
    let first = Pregel::new(&graph, MinIdPropagation, PregelConfig::new(50).concurrency(4))?
        .run()?;
    let second = Pregel::new(&graph, MinIdPropagation, PregelConfig::new(50).concurrency(4))?
        .run()?;
    assert_eq!(
        first.node_values().long_column("min_id"),
        second.node_values().long_column("min_id")
    );
    // the cycle reaches the global minimum everywhere
    assert!(first
        .node_values()
        .long_column("min_id")
        .iter()
        .all(|&m| m == 0));
    Ok(())
}

#[test]
fn test_determinism_on_random_graph() -> Result<()> {
    let graph = random_graph(200, 1000, 0);
    let config = PregelConfig::new(100).concurrency(4);
    let first = Pregel::new(&graph, MinIdPropagation, config.clone())?.run()?;
    let second = Pregel::new(&graph, MinIdPropagation, config)?.run()?;
    assert_eq!(
        first.node_values().long_column("min_id"),
        second.node_values().long_column("min_id")
    );
    Ok(())
}

#[test]
fn test_concurrency_invariance() -> Result<()> {
    let graph = cycle_with_chords();
    let serial = Pregel::new(&graph, MinIdPropagation, PregelConfig::new(50).concurrency(1))?
        .run()?;
    let parallel = Pregel::new(&graph, MinIdPropagation, PregelConfig::new(50).concurrency(4))?
        .run()?;
    assert_eq!(
        serial.node_values().long_column("min_id"),
        parallel.node_values().long_column("min_id")
    );
    assert_eq!(serial.ran_iterations(), parallel.ran_iterations());
    Ok(())
}

#[test]
fn test_asynchronous_reaches_same_fixpoint() -> Result<()> {
    let graph = cycle_with_chords();
    let sync = Pregel::new(&graph, MinIdPropagation, PregelConfig::new(50))?.run()?;
    let config = PregelConfig::new(50).concurrency(4).asynchronous(true);
    let async_run = Pregel::new(&graph, MinIdPropagation, config)?.run()?;
    assert_eq!(
        sync.node_values().long_column("min_id"),
        async_run.node_values().long_column("min_id")
    );
    Ok(())
}

/// Records whether the message iterator was empty during superstep 0.
struct InitialMessages;

impl<G: Graph> PregelComputation<G> for InitialMessages {
    fn schema(&self) -> PregelSchema {
        PregelSchema::builder().add("empty", ValueType::Long).build()
    }

    fn compute(&self, ctx: &mut ComputeContext<'_, G>, messages: &mut Messages<'_>) {
        if ctx.is_initial_superstep() {
            ctx.set_long("empty", messages.is_empty() as i64);
            ctx.send_to_neighbors(1.0);
        }
        ctx.vote_to_halt();
    }
}

#[test]
fn test_initial_superstep_messages_are_empty() -> Result<()> {
    let graph = cycle_with_chords();
    let result =
        Pregel::new(&graph, InitialMessages, PregelConfig::new(5).concurrency(4))?.run()?;
    assert!(result
        .node_values()
        .long_column("empty")
        .iter()
        .all(|&e| e == 1));
    Ok(())
}

/// Counts compute invocations per node; node 0 pings node 1 once.
struct WakeUp;

impl<G: Graph> PregelComputation<G> for WakeUp {
    fn schema(&self) -> PregelSchema {
        PregelSchema::builder().add("computed", ValueType::Long).build()
    }

    fn compute(&self, ctx: &mut ComputeContext<'_, G>, _messages: &mut Messages<'_>) {
        ctx.set_long("computed", ctx.long_value("computed") + 1);
        if ctx.is_initial_superstep() && ctx.node_id() == 0 {
            ctx.send_to(1, 1.0);
        }
        ctx.vote_to_halt();
    }
}

#[test]
fn test_message_reactivates_halted_node() -> Result<()> {
    let graph = VecGraph::from_arcs([(0, 1)]);
    let result = Pregel::new(&graph, WakeUp, PregelConfig::new(10))?.run()?;
    // node 1 halted in superstep 0 and was woken up by the message;
    // node 0 stayed halted
    assert_eq!(result.node_values().long_column("computed"), &[1, 2]);
    assert_eq!(result.ran_iterations(), 2);
    Ok(())
}

/// Sums incoming messages, counting how many the iterator yields.
struct SumIncoming;

impl<G: Graph> PregelComputation<G> for SumIncoming {
    fn schema(&self) -> PregelSchema {
        PregelSchema::builder()
            .add("sum", ValueType::Double)
            .add("received", ValueType::Long)
            .build()
    }

    fn compute(&self, ctx: &mut ComputeContext<'_, G>, messages: &mut Messages<'_>) {
        if ctx.is_initial_superstep() {
            ctx.send_to_neighbors(1.0);
        } else {
            let mut sum = 0.0;
            let mut received = 0;
            for m in messages.by_ref() {
                sum += m;
                received += 1;
            }
            ctx.set_double("sum", sum);
            ctx.set_long("received", received);
        }
        ctx.vote_to_halt();
    }

    fn reducer(&self) -> Option<MessageReducer> {
        Some(MessageReducer::Sum)
    }
}

#[test]
fn test_sum_reducer_combines_to_single_message() -> Result<()> {
    // two sources, one sink
    let graph = VecGraph::from_arcs([(0, 2), (1, 2)]);
    let result = Pregel::new(&graph, SumIncoming, PregelConfig::new(5))?.run()?;
    assert_eq!(result.node_values().double_value("sum", 2), 2.0);
    assert_eq!(result.node_values().long_value("received", 2), 1);
    Ok(())
}

/// Node 0 addresses node 2 directly; everyone else must see nothing.
struct Targeted;

impl<G: Graph> PregelComputation<G> for Targeted {
    fn schema(&self) -> PregelSchema {
        PregelSchema::builder().add("received", ValueType::Double).build()
    }

    fn init(&self, ctx: &mut InitContext<'_, G>) {
        ctx.set_double("received", f64::NAN);
    }

    fn compute(&self, ctx: &mut ComputeContext<'_, G>, messages: &mut Messages<'_>) {
        if ctx.is_initial_superstep() {
            if ctx.node_id() == 0 {
                ctx.send_to(2, 42.0);
            }
        } else if !messages.is_empty() {
            ctx.set_double("received", messages.sum());
        }
        ctx.vote_to_halt();
    }
}

#[test]
fn test_send_to_delivers_only_to_target() -> Result<()> {
    let graph = VecGraph::from_arcs([(0, 1), (1, 2), (2, 0)]);
    let result = Pregel::new(&graph, Targeted, PregelConfig::new(5))?.run()?;
    let received = result.node_values().double_column("received");
    assert!(received[0].is_nan());
    assert!(received[1].is_nan());
    assert_eq!(received[2], 42.0);
    Ok(())
}

/// Never votes; the master stops the run at a fixed superstep.
struct MasterStops {
    stop_at: usize,
}

impl<G: Graph> PregelComputation<G> for MasterStops {
    fn schema(&self) -> PregelSchema {
        PregelSchema::builder().add("steps", ValueType::Long).build()
    }

    fn compute(&self, ctx: &mut ComputeContext<'_, G>, _messages: &mut Messages<'_>) {
        ctx.set_long("steps", ctx.superstep() as i64 + 1);
    }

    fn master_compute(&self, ctx: &mut MasterComputeContext<'_, G>) -> bool {
        ctx.superstep() == self.stop_at
    }
}

/// Replaces its array property and must observe the new backing array.
struct ArrayRewrite;

impl<G: Graph> PregelComputation<G> for ArrayRewrite {
    fn schema(&self) -> PregelSchema {
        PregelSchema::builder().add("path", ValueType::LongArray).build()
    }

    fn init(&self, ctx: &mut InitContext<'_, G>) {
        ctx.set_long_array("path", vec![7; 4]);
    }

    fn compute(&self, ctx: &mut ComputeContext<'_, G>, _messages: &mut Messages<'_>) {
        let mut path = ctx.long_array_value("path").to_vec();
        assert_eq!(path, vec![7; 4]);
        path.push(ctx.node_id() as i64);
        ctx.set_long_array("path", path);
        // the read reflects the freshly stored array, not the replaced one
        assert_eq!(ctx.long_array_value("path").len(), 5);
        ctx.vote_to_halt();
    }
}

#[test]
fn test_array_rewrite_reads_current_array() -> Result<()> {
    let graph = VecGraph::empty(3);
    let result = Pregel::new(&graph, ArrayRewrite, PregelConfig::new(5))?.run()?;
    for node in 0..3 {
        assert_eq!(
            result.node_values().long_array_value("path", node),
            &[7, 7, 7, 7, node as i64]
        );
    }
    Ok(())
}

#[test]
fn test_master_compute_convergence() -> Result<()> {
    let graph = VecGraph::empty(4);
    let result = Pregel::new(&graph, MasterStops { stop_at: 3 }, PregelConfig::new(10))?.run()?;
    assert!(result.did_converge());
    assert_eq!(result.ran_iterations(), 4);
    assert_eq!(result.node_values().long_column("steps"), &[4, 4, 4, 4]);
    Ok(())
}

#[test]
fn test_run_with_logging_reports_both_phases() -> Result<()> {
    let graph = cycle_with_chords();
    let mut pl = progress_logger![item_name = "superstep"];
    let mut cpl = concurrent_progress_logger![item_name = "node"];
    let result = Pregel::new(&graph, MasterStops { stop_at: 1 }, PregelConfig::new(5))?
        .run_with_logging(&mut pl, &mut cpl)?;
    assert!(result.did_converge());
    assert_eq!(result.ran_iterations(), 2);
    Ok(())
}

#[test]
fn test_exhaustion_is_not_convergence() -> Result<()> {
    let graph = VecGraph::empty(4);
    let result = Pregel::new(&graph, MasterStops { stop_at: 99 }, PregelConfig::new(2))?.run()?;
    assert!(!result.did_converge());
    assert_eq!(result.ran_iterations(), 2);
    Ok(())
}

/// Counts every hook invocation through a shared counter.
struct Counting {
    calls: Arc<AtomicUsize>,
}

impl<G: Graph> PregelComputation<G> for Counting {
    fn schema(&self) -> PregelSchema {
        PregelSchema::builder().add("x", ValueType::Long).build()
    }

    fn init(&self, _ctx: &mut InitContext<'_, G>) {
        self.calls.fetch_add(1, Ordering::Relaxed);
    }

    fn compute(&self, ctx: &mut ComputeContext<'_, G>, _messages: &mut Messages<'_>) {
        self.calls.fetch_add(1, Ordering::Relaxed);
        ctx.vote_to_halt();
    }
}

#[test]
fn test_termination_before_first_partition() -> Result<()> {
    let graph = cycle_with_chords();
    let calls = Arc::new(AtomicUsize::new(0));
    let counting = Counting {
        calls: calls.clone(),
    };
    let mut pregel = Pregel::new(&graph, counting, PregelConfig::new(10))?;
    pregel.termination_flag(TerminationFlag::stopped());
    match pregel.run() {
        Err(PregelError::Terminated) => {}
        other => panic!(
            "expected termination, got {:?}",
            other.map(|r| r.ran_iterations())
        ),
    }
    // the flag was observed before any node was touched
    assert_eq!(calls.load(Ordering::Relaxed), 0);
    Ok(())
}

/// Requires incoming arcs and pushes its id backwards along them.
struct Backward;

impl<G: Graph> PregelComputation<G> for Backward {
    fn schema(&self) -> PregelSchema {
        PregelSchema::builder().add("sum", ValueType::Double).build()
    }

    fn compute(&self, ctx: &mut ComputeContext<'_, G>, messages: &mut Messages<'_>) {
        if ctx.is_initial_superstep() {
            ctx.send_to_incoming_neighbors(ctx.node_id() as f64);
        } else {
            ctx.set_double("sum", messages.sum());
        }
        ctx.vote_to_halt();
    }

    fn requires_inverse_index(&self) -> bool {
        true
    }
}

#[test]
fn test_bidirectional_rejected_without_inverse_index() {
    let mut graph = VecGraph::from_arcs([(0, 1), (2, 1)]);
    graph.relationship_type("LINKS");
    let err = match Pregel::new(&graph, Backward, PregelConfig::new(5)) {
        Err(err) => err,
        Ok(_) => panic!("expected a configuration error"),
    };
    let message = err.to_string();
    assert!(message.contains("Backward"), "{message}");
    assert!(message.contains("LINKS"), "{message}");
}

#[test]
fn test_bidirectional_runs_with_inverse_index() -> Result<()> {
    let mut graph = VecGraph::from_arcs([(0, 1), (2, 1)]);
    graph.build_inverse_index();
    let result = Pregel::new(&graph, Backward, PregelConfig::new(5))?.run()?;
    // node 1 pushes its id to its two predecessors
    assert_eq!(result.node_values().double_column("sum"), &[1.0, 0.0, 1.0]);
    Ok(())
}

/// Scales outgoing messages by the arc weight.
struct Weighted;

impl<G: Graph> PregelComputation<G> for Weighted {
    fn schema(&self) -> PregelSchema {
        PregelSchema::builder().add("received", ValueType::Double).build()
    }

    fn compute(&self, ctx: &mut ComputeContext<'_, G>, messages: &mut Messages<'_>) {
        if ctx.is_initial_superstep() {
            ctx.send_to_neighbors(2.0);
        } else {
            ctx.set_double("received", messages.sum());
        }
        ctx.vote_to_halt();
    }

    fn apply_relationship_weight(&self, message: f64, weight: f64) -> f64 {
        message * weight
    }
}

#[test]
fn test_relationship_weight_transform() -> Result<()> {
    let mut graph = VecGraph::empty(3);
    graph.add_weighted_arc(0, 1, 2.5).add_arc(0, 2);
    let result = Pregel::new(&graph, Weighted, PregelConfig::new(5))?.run()?;
    let received = result.node_values().double_column("received");
    assert_eq!(received[1], 5.0);
    // unweighted arcs use the fallback weight 1.0
    assert_eq!(received[2], 2.0);
    Ok(())
}

/// Remembers the sum of sender ids seen through the message iterator.
struct SenderAware;

impl<G: Graph> PregelComputation<G> for SenderAware {
    fn schema(&self) -> PregelSchema {
        PregelSchema::builder().add("senders", ValueType::Long).build()
    }

    fn compute(&self, ctx: &mut ComputeContext<'_, G>, messages: &mut Messages<'_>) {
        if ctx.is_initial_superstep() {
            ctx.send_to_neighbors(1.0);
        } else {
            let mut senders = 0;
            while messages.next().is_some() {
                senders += messages.sender().expect("sender tracking is enabled") as i64;
            }
            ctx.set_long("senders", senders);
        }
        ctx.vote_to_halt();
    }
}

#[test]
fn test_sender_tracking() -> Result<()> {
    let graph = VecGraph::from_arcs([(0, 1), (2, 1), (3, 1)]);
    let config = PregelConfig::new(5).track_sender(true);
    let result = Pregel::new(&graph, SenderAware, config)?.run()?;
    assert_eq!(result.node_values().long_value("senders", 1), 5);
    Ok(())
}

/// Forbids parallel execution.
struct SerialOnly;

impl<G: Graph> PregelComputation<G> for SerialOnly {
    fn schema(&self) -> PregelSchema {
        PregelSchema::builder().add("x", ValueType::Long).build()
    }

    fn compute(&self, ctx: &mut ComputeContext<'_, G>, _messages: &mut Messages<'_>) {
        ctx.vote_to_halt();
    }

    fn supports_parallel_execution(&self) -> bool {
        false
    }
}

#[test]
fn test_concurrency_rejected_for_serial_computation() -> Result<()> {
    let graph = VecGraph::empty(4);
    match Pregel::new(&graph, SerialOnly, PregelConfig::new(5).concurrency(4)) {
        Err(PregelError::ConcurrencyNotSupported { concurrency, .. }) => {
            assert_eq!(concurrency, 4)
        }
        _ => panic!("expected a configuration error"),
    }
    // concurrency 1 is always allowed
    Pregel::new(&graph, SerialOnly, PregelConfig::new(5).concurrency(1))?.run()?;
    Ok(())
}

#[test]
fn test_zero_concurrency_rejected() {
    let graph = VecGraph::empty(4);
    assert!(matches!(
        Pregel::new(&graph, MinIdPropagation, PregelConfig::new(5).concurrency(0)),
        Err(PregelError::InvalidConcurrency(0))
    ));
}

#[test]
fn test_empty_graph() -> Result<()> {
    let graph = VecGraph::new();
    let result = Pregel::new(&graph, MinIdPropagation, PregelConfig::new(5))?.run()?;
    assert_eq!(result.ran_iterations(), 1);
    assert!(!result.did_converge());
    Ok(())
}
