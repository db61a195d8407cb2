/*
 * SPDX-FileCopyrightText: 2026 Sebastiano Vigna
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

/*!

Message transport between supersteps.

Two mailbox families are provided with the same interface. The
[queue-based](queue::QueueMailbox) mailbox keeps every message and supports
[sender tracking](Messages::sender); the [reducing](reducer::ReducingMailbox)
mailbox combines messages into a single value per node at send time with a
[`MessageReducer`], trading message fidelity for constant memory per node and
lock-free sends. The engine picks the family from
[`PregelComputation::reducer`](crate::computation::PregelComputation::reducer).

In synchronous mode both families are double-buffered, so messages sent in
superstep `s` are read exactly in superstep `s + 1`. In asynchronous mode
there is a single buffer and reading consumes it; a message can then be seen
in the superstep it was sent in, when the target is processed after the
send.

*/

pub(crate) mod queue;
pub(crate) mod reducer;

use queue::{NodeQueue, QueueMailbox};
use reducer::ReducingMailbox;

/// Commutative, associative combination of messages.
///
/// With a reducer the engine stores one combined value per target node
/// instead of a queue, so the target observes a single message per
/// superstep.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageReducer {
    /// Sum of all messages.
    Sum,
    /// Minimum of all messages.
    Min,
    /// Maximum of all messages.
    Max,
    /// Number of messages; payloads are ignored.
    Count,
}

impl MessageReducer {
    /// The value stored when a message arrives at an empty slot.
    pub fn first(&self, message: f64) -> f64 {
        match self {
            MessageReducer::Count => 1.0,
            _ => message,
        }
    }

    /// Combines the stored value with a newly arrived message.
    pub fn reduce(&self, current: f64, message: f64) -> f64 {
        match self {
            MessageReducer::Sum => current + message,
            MessageReducer::Min => current.min(message),
            MessageReducer::Max => current.max(message),
            MessageReducer::Count => current + 1.0,
        }
    }
}

/// The mailbox of a run, chosen from the computation's reducer and the
/// configuration.
pub(crate) enum Mailbox {
    Queue(QueueMailbox),
    Reducing(ReducingMailbox),
}

impl Mailbox {
    pub(crate) fn new(
        node_count: usize,
        reducer: Option<MessageReducer>,
        track_sender: bool,
        asynchronous: bool,
    ) -> Self {
        match reducer {
            Some(reducer) => {
                Mailbox::Reducing(ReducingMailbox::new(node_count, reducer, asynchronous))
            }
            None => Mailbox::Queue(QueueMailbox::new(node_count, track_sender, asynchronous)),
        }
    }

    /// Makes the messages of the previous iteration readable. Must be called
    /// before each superstep, outside the parallel phase.
    pub(crate) fn init_iteration(&mut self) {
        match self {
            Mailbox::Queue(m) => m.init_iteration(),
            Mailbox::Reducing(m) => m.init_iteration(),
        }
    }

    pub(crate) fn send_to(&self, source: usize, target: usize, message: f64) {
        match self {
            Mailbox::Queue(m) => m.send_to(source, target, message),
            Mailbox::Reducing(m) => m.send_to(target, message),
        }
    }

    /// Returns the messages readable by `node` in the current iteration.
    pub(crate) fn messages(&self, node: usize) -> Messages<'_> {
        Messages(match self {
            Mailbox::Queue(m) => {
                if m.is_asynchronous() {
                    Inner::OwnedQueue {
                        queue: m.drain_queue(node),
                        pos: 0,
                    }
                } else {
                    let queue = m.read_queue(node);
                    Inner::Queue {
                        values: &queue.values,
                        senders: &queue.senders,
                        pos: 0,
                    }
                }
            }
            Mailbox::Reducing(m) => Inner::Reduced {
                value: m.take(node),
            },
        })
    }

    /// Returns the number of messages sent in the current iteration.
    pub(crate) fn messages_sent(&self) -> usize {
        match self {
            Mailbox::Queue(m) => m.messages_sent(),
            Mailbox::Reducing(m) => m.messages_sent(),
        }
    }
}

enum Inner<'a> {
    /// A frozen queue from a synchronous, queue-based run.
    Queue {
        values: &'a [f64],
        senders: &'a [usize],
        pos: usize,
    },
    /// A drained queue from an asynchronous, queue-based run.
    OwnedQueue { queue: NodeQueue, pos: usize },
    /// At most one combined value from a reducing run.
    Reduced { value: Option<f64> },
}

/// Iterator over the messages a node can read in the current superstep.
pub struct Messages<'a>(Inner<'a>);

impl Messages<'_> {
    /// Returns whether no further message is readable.
    pub fn is_empty(&self) -> bool {
        match &self.0 {
            Inner::Queue { values, pos, .. } => *pos >= values.len(),
            Inner::OwnedQueue { queue, pos } => *pos >= queue.values.len(),
            Inner::Reduced { value } => value.is_none(),
        }
    }

    /// Returns the internal id of the sender of the most recently returned
    /// message.
    ///
    /// Only available for queue-based runs with [sender
    /// tracking](crate::pregel::PregelConfig::track_sender) enabled, and
    /// after the first message has been returned; returns `None` otherwise.
    pub fn sender(&self) -> Option<usize> {
        match &self.0 {
            Inner::Queue { senders, pos, .. } => {
                pos.checked_sub(1).and_then(|p| senders.get(p).copied())
            }
            Inner::OwnedQueue { queue, pos } => {
                pos.checked_sub(1).and_then(|p| queue.senders.get(p).copied())
            }
            Inner::Reduced { .. } => None,
        }
    }
}

impl Iterator for Messages<'_> {
    type Item = f64;

    fn next(&mut self) -> Option<f64> {
        match &mut self.0 {
            Inner::Queue { values, pos, .. } => {
                let value = values.get(*pos).copied();
                *pos += value.is_some() as usize;
                value
            }
            Inner::OwnedQueue { queue, pos } => {
                let value = queue.values.get(*pos).copied();
                *pos += value.is_some() as usize;
                value
            }
            Inner::Reduced { value } => value.take(),
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let rem = match &self.0 {
            Inner::Queue { values, pos, .. } => values.len() - pos,
            Inner::OwnedQueue { queue, pos } => queue.values.len() - pos,
            Inner::Reduced { value } => value.is_some() as usize,
        };
        (rem, Some(rem))
    }
}

impl ExactSizeIterator for Messages<'_> {}
