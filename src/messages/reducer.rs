/*
 * SPDX-FileCopyrightText: 2026 Sebastiano Vigna
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

use crossbeam_utils::CachePadded;

use super::MessageReducer;

/// Bit pattern marking an empty reducer slot.
///
/// This is the canonical quiet NaN; user messages that are NaN cannot be
/// distinguished from an empty slot, which is acceptable as NaN is not a
/// meaningful message under any [`MessageReducer`].
const EMPTY: u64 = 0x7ff8_0000_0000_0000;

/// A mailbox holding at most one combined message per node.
///
/// Each slot is an [`AtomicU64`] storing the bit pattern of the combined
/// `f64`. Sends combine into the slot with a compare-and-exchange loop, so
/// any number of threads can send to the same target concurrently.
///
/// In synchronous mode two slot arrays are kept and swapped at each
/// iteration; in asynchronous mode a single array is both read and written,
/// and reading a slot consumes it.
pub(crate) struct ReducingMailbox {
    reducer: MessageReducer,
    /// Slots read by the current iteration. Unused in asynchronous mode.
    read: Box<[AtomicU64]>,
    /// Slots written by the current iteration.
    write: Box<[AtomicU64]>,
    asynchronous: bool,
    sent: CachePadded<AtomicUsize>,
}

fn empty_slots(n: usize) -> Box<[AtomicU64]> {
    Vec::from_iter((0..n).map(|_| AtomicU64::new(EMPTY))).into()
}

impl ReducingMailbox {
    pub(crate) fn new(node_count: usize, reducer: MessageReducer, asynchronous: bool) -> Self {
        Self {
            reducer,
            read: empty_slots(if asynchronous { 0 } else { node_count }),
            write: empty_slots(node_count),
            asynchronous,
            sent: CachePadded::new(AtomicUsize::new(0)),
        }
    }

    /// Swaps the write slots into read position and clears the write side.
    ///
    /// Must be called between iterations, when no sends are in flight. A
    /// no-op in asynchronous mode, where sends and reads share one array.
    pub(crate) fn init_iteration(&mut self) {
        self.sent = CachePadded::new(AtomicUsize::new(0));
        if !self.asynchronous {
            std::mem::swap(&mut self.read, &mut self.write);
            for slot in &mut self.write {
                *slot.get_mut() = EMPTY;
            }
        }
    }

    pub(crate) fn send_to(&self, target: usize, message: f64) {
        let slot = &self.write[target];
        let mut current = slot.load(Ordering::Relaxed);
        loop {
            let combined = if current == EMPTY {
                self.reducer.first(message)
            } else {
                self.reducer.reduce(f64::from_bits(current), message)
            };
            match slot.compare_exchange_weak(
                current,
                combined.to_bits(),
                Ordering::Relaxed,
                Ordering::Relaxed,
            ) {
                Ok(_) => break,
                Err(actual) => current = actual,
            }
        }
        self.sent.fetch_add(1, Ordering::Relaxed);
    }

    /// Returns the combined message for `node`, if any.
    ///
    /// In asynchronous mode this consumes the slot.
    pub(crate) fn take(&self, node: usize) -> Option<f64> {
        let bits = if self.asynchronous {
            self.write[node].swap(EMPTY, Ordering::Relaxed)
        } else {
            self.read[node].load(Ordering::Relaxed)
        };
        (bits != EMPTY).then(|| f64::from_bits(bits))
    }

    pub(crate) fn messages_sent(&self) -> usize {
        self.sent.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sum_combines() {
        let mut mailbox = ReducingMailbox::new(3, MessageReducer::Sum, false);
        mailbox.send_to(1, 1.0);
        mailbox.send_to(1, 2.5);
        mailbox.init_iteration();
        assert_eq!(mailbox.take(0), None);
        assert_eq!(mailbox.take(1), Some(3.5));
    }

    #[test]
    fn test_count_ignores_payload() {
        let mut mailbox = ReducingMailbox::new(2, MessageReducer::Count, false);
        mailbox.send_to(0, 100.0);
        mailbox.send_to(0, -3.0);
        mailbox.send_to(0, f64::NAN);
        mailbox.init_iteration();
        assert_eq!(mailbox.take(0), Some(3.0));
    }

    #[test]
    fn test_async_read_consumes() {
        let mailbox = ReducingMailbox::new(2, MessageReducer::Min, true);
        mailbox.send_to(0, 2.0);
        mailbox.send_to(0, -1.0);
        assert_eq!(mailbox.take(0), Some(-1.0));
        assert_eq!(mailbox.take(0), None);
    }

    #[test]
    fn test_double_buffering() {
        let mut mailbox = ReducingMailbox::new(1, MessageReducer::Max, false);
        mailbox.send_to(0, 1.0);
        mailbox.init_iteration();
        // new sends must not be visible until the next swap
        mailbox.send_to(0, 9.0);
        assert_eq!(mailbox.take(0), Some(1.0));
        mailbox.init_iteration();
        assert_eq!(mailbox.take(0), Some(9.0));
    }
}
