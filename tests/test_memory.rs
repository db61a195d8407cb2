/*
 * SPDX-FileCopyrightText: 2026 Sebastiano Vigna
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

use pregel::memory::{GraphDimensions, MemoryEstimation};
use pregel::schema::{PregelSchema, ValueType};

const DIMENSIONS: GraphDimensions = GraphDimensions {
    node_count: 10_000,
    rel_count_upper_bound: 100_000,
};

fn long_schema() -> PregelSchema {
    PregelSchema::builder().add("value", ValueType::Long).build()
}

// The numbers below are frozen regression expectations: any change to the
// estimation formula must update them consciously.

#[test]
fn test_queue_sync_long() {
    let estimation = MemoryEstimation::new(long_schema(), true, false, false);
    let range = estimation.estimate(DIMENSIONS, 1);
    assert_eq!(range.min(), 1_121_592);
    assert_eq!(range.max(), 2_721_592);
}

#[test]
fn test_queue_sync_long_concurrency_4() {
    let estimation = MemoryEstimation::new(long_schema(), true, false, false);
    let range = estimation.estimate(DIMENSIONS, 4);
    assert_eq!(range.min(), 1_121_640);
    assert_eq!(range.max(), 2_721_640);
}

#[test]
fn test_reducer_sync_double() {
    let schema = PregelSchema::builder().add("rank", ValueType::Double).build();
    let estimation = MemoryEstimation::new(schema, false, false, false);
    let range = estimation.estimate(DIMENSIONS, 1);
    // reducer slots are fixed-size, so the estimate is a single value
    assert_eq!(range.min(), 241_592);
    assert_eq!(range.max(), 241_592);
}

#[test]
fn test_queue_async_with_sender_tracking() {
    let estimation = MemoryEstimation::new(long_schema(), true, true, true);
    let range = estimation.estimate(DIMENSIONS, 1);
    assert_eq!(range.min(), 641_592);
    assert_eq!(range.max(), 2_241_592);
}

#[test]
fn test_queue_sync_double_array() {
    let schema = PregelSchema::builder()
        .add("embedding", ValueType::DoubleArray)
        .build();
    let estimation = MemoryEstimation::new(schema, true, false, false);
    let range = estimation.estimate(DIMENSIONS, 1);
    assert_eq!(range.min(), 1_201_592);
    assert_eq!(range.max(), 3_601_592);
}
