/*
 * SPDX-FileCopyrightText: 2026 Sebastiano Vigna
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use crossbeam_utils::CachePadded;

/// The per-node buffer of a [`QueueMailbox`].
///
/// Sender ids are kept in a parallel vector, populated only when sender
/// tracking is enabled.
#[derive(Default)]
pub(crate) struct NodeQueue {
    pub(crate) values: Vec<f64>,
    pub(crate) senders: Vec<usize>,
}

/// A mailbox keeping every message sent to a node.
///
/// One queue per node; sends lock only the target node's write queue, so
/// contention is limited to concurrent sends to the same node.
///
/// In synchronous mode two queue arrays are double-buffered: the read side
/// is frozen during the compute phase and accessed without locking, while
/// sends go to the write side. In asynchronous mode only the write side
/// exists and reading a queue drains it under its lock.
pub(crate) struct QueueMailbox {
    /// Queues read by the current iteration. Empty in asynchronous mode.
    read: Box<[NodeQueue]>,
    /// Queues written by the current iteration.
    write: Box<[Mutex<NodeQueue>]>,
    track_sender: bool,
    asynchronous: bool,
    sent: CachePadded<AtomicUsize>,
}

impl QueueMailbox {
    pub(crate) fn new(node_count: usize, track_sender: bool, asynchronous: bool) -> Self {
        let read_len = if asynchronous { 0 } else { node_count };
        Self {
            read: Vec::from_iter((0..read_len).map(|_| NodeQueue::default())).into(),
            write: Vec::from_iter((0..node_count).map(|_| Mutex::new(NodeQueue::default())))
                .into(),
            track_sender,
            asynchronous,
            sent: CachePadded::new(AtomicUsize::new(0)),
        }
    }

    /// Swaps each node's write queue into read position, recycling the
    /// previous read buffers.
    ///
    /// Must be called between iterations, when no sends are in flight. A
    /// no-op in asynchronous mode.
    pub(crate) fn init_iteration(&mut self) {
        self.sent = CachePadded::new(AtomicUsize::new(0));
        if !self.asynchronous {
            for (read, write) in self.read.iter_mut().zip(self.write.iter_mut()) {
                let write = write.get_mut().unwrap();
                // keep the allocations of the drained read queue
                read.values.clear();
                read.senders.clear();
                std::mem::swap(read, write);
            }
        }
    }

    pub(crate) fn send_to(&self, source: usize, target: usize, message: f64) {
        let mut queue = self.write[target].lock().unwrap();
        queue.values.push(message);
        if self.track_sender {
            queue.senders.push(source);
        }
        drop(queue);
        self.sent.fetch_add(1, Ordering::Relaxed);
    }

    /// Returns the frozen read queue of `node`. Synchronous mode only.
    pub(crate) fn read_queue(&self, node: usize) -> &NodeQueue {
        &self.read[node]
    }

    /// Drains and returns the write queue of `node`. Asynchronous mode only.
    pub(crate) fn drain_queue(&self, node: usize) -> NodeQueue {
        std::mem::take(&mut *self.write[node].lock().unwrap())
    }

    pub(crate) fn is_asynchronous(&self) -> bool {
        self.asynchronous
    }

    pub(crate) fn messages_sent(&self) -> usize {
        self.sent.load(Ordering::Relaxed)
    }
}
