/*
 * SPDX-FileCopyrightText: 2026 Sebastiano Vigna
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

/*!

Memory estimation for [`Pregel`](crate::pregel::Pregel) jobs.

A [`MemoryEstimation`] is a pure function of the schema and the mailbox
choice; applying it to [`GraphDimensions`] and a concurrency yields a
[`MemoryRange`] of worst-case heap bytes. The same inputs always produce the
same byte counts, so estimates can be asserted exactly in regression tests.

The range's lower bound covers the structures that exist for the whole run
(columns, empty queues, accumulator slots); the upper bound adds worst-case
payloads: full message buffers sized by the relationship-count upper bound,
and a fixed average payload per stored array.

*/

use crate::schema::{PregelSchema, ValueType};

/// Size of one scalar cell and of one message payload.
const SCALAR: usize = 8;
/// Size of a boxed-slice header per stored array.
const ARRAY_HEADER: usize = 16;
/// Average number of elements assumed per stored array in the upper bound.
const AVG_ARRAY_LEN: usize = 10;
/// Size of one per-node queue: two vector headers.
const NODE_QUEUE: usize = 48;
/// Size of one locked per-node queue.
const LOCKED_NODE_QUEUE: usize = NODE_QUEUE + 8;
/// Cache-line padding of the per-run counters.
const CACHE_LINE: usize = 128;
/// Fixed engine bookkeeping outside any per-node structure.
const INSTANCE_OVERHEAD: usize = 64;

/// The graph quantities an estimate depends on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GraphDimensions {
    pub node_count: usize,
    /// An upper bound on the number of messages in flight per superstep;
    /// the relationship count is the natural choice for computations
    /// messaging their neighbors.
    pub rel_count_upper_bound: usize,
}

/// An inclusive range of estimated bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MemoryRange {
    min: usize,
    max: usize,
}

impl MemoryRange {
    pub fn min(&self) -> usize {
        self.min
    }

    pub fn max(&self) -> usize {
        self.max
    }
}

impl std::fmt::Display for MemoryRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.min == self.max {
            write!(f, "{} B", self.min)
        } else {
            write!(f, "[{} B .. {} B]", self.min, self.max)
        }
    }
}

/// A reusable estimator for one (schema, mailbox) combination.
///
/// # Examples
///
/// ```
/// use pregel::memory::{GraphDimensions, MemoryEstimation};
/// use pregel::schema::{PregelSchema, ValueType};
///
/// let schema = PregelSchema::builder().add("value", ValueType::Long).build();
/// let estimation = MemoryEstimation::new(schema, true, false, false);
/// let dimensions = GraphDimensions {
///     node_count: 10_000,
///     rel_count_upper_bound: 100_000,
/// };
/// let range = estimation.estimate(dimensions, 1);
/// assert!(range.min() <= range.max());
/// // identical inputs give identical, exact byte counts
/// assert_eq!(range, estimation.estimate(dimensions, 1));
/// ```
#[derive(Debug, Clone)]
pub struct MemoryEstimation {
    schema: PregelSchema,
    queue_based: bool,
    asynchronous: bool,
    track_sender: bool,
}

impl MemoryEstimation {
    pub fn new(
        schema: PregelSchema,
        queue_based: bool,
        asynchronous: bool,
        track_sender: bool,
    ) -> Self {
        Self {
            schema,
            queue_based,
            asynchronous,
            track_sender,
        }
    }

    /// Computes the estimated byte range for the given dimensions and
    /// concurrency.
    pub fn estimate(&self, dimensions: GraphDimensions, concurrency: usize) -> MemoryRange {
        let n = dimensions.node_count;
        let r = dimensions.rel_count_upper_bound;

        // votes bitset, halted and sent counters, partition ranges
        let mut min = INSTANCE_OVERHEAD
            + 2 * CACHE_LINE
            + n.div_ceil(64) * 8
            + concurrency * std::mem::size_of::<std::ops::Range<usize>>();
        let mut max_extra = 0;

        for element in self.schema.elements() {
            match element.value_type {
                ValueType::Long | ValueType::Double => min += SCALAR * n,
                ValueType::LongArray | ValueType::DoubleArray => {
                    min += ARRAY_HEADER * n;
                    max_extra += AVG_ARRAY_LEN * SCALAR * n;
                }
            }
        }

        if self.queue_based {
            let per_message = SCALAR * if self.track_sender { 2 } else { 1 };
            if self.asynchronous {
                min += LOCKED_NODE_QUEUE * n;
                max_extra += per_message * r;
            } else {
                min += (NODE_QUEUE + LOCKED_NODE_QUEUE) * n;
                // both halves of the double buffer full
                max_extra += 2 * per_message * r;
            }
        } else {
            let slots = if self.asynchronous { 1 } else { 2 };
            min += slots * SCALAR * n;
        }

        MemoryRange {
            min,
            max: min + max_extra,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn long_schema() -> PregelSchema {
        PregelSchema::builder().add("value", ValueType::Long).build()
    }

    #[test]
    fn test_deterministic() {
        let estimation = MemoryEstimation::new(long_schema(), true, false, false);
        let dimensions = GraphDimensions {
            node_count: 123,
            rel_count_upper_bound: 456,
        };
        assert_eq!(
            estimation.estimate(dimensions, 4),
            estimation.estimate(dimensions, 4)
        );
    }

    #[test]
    fn test_reducer_is_relationship_independent() {
        let estimation = MemoryEstimation::new(long_schema(), false, false, false);
        let small = estimation.estimate(
            GraphDimensions {
                node_count: 1000,
                rel_count_upper_bound: 10,
            },
            1,
        );
        let large = estimation.estimate(
            GraphDimensions {
                node_count: 1000,
                rel_count_upper_bound: 1_000_000,
            },
            1,
        );
        assert_eq!(small, large);
    }

    #[test]
    fn test_queue_grows_with_relationships() {
        let estimation = MemoryEstimation::new(long_schema(), true, false, false);
        let small = estimation.estimate(
            GraphDimensions {
                node_count: 1000,
                rel_count_upper_bound: 10,
            },
            1,
        );
        let large = estimation.estimate(
            GraphDimensions {
                node_count: 1000,
                rel_count_upper_bound: 1_000_000,
            },
            1,
        );
        assert_eq!(small.min(), large.min());
        assert!(small.max() < large.max());
    }
}
