/*
 * SPDX-FileCopyrightText: 2026 Sebastiano Vigna
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

/*!

Schema-driven columnar storage of per-node computation state.

A [`NodeValue`] owns one dense column per
[schema](crate::schema::PregelSchema) entry: scalar columns are flat slices
indexed by node id, array columns store one independently sized array per
node. Scalars default to zero, arrays are empty until explicitly set.

All accessors validate the requested access type against the declared type
of the property and panic on mismatch: such a mismatch is a programming
error, not a runtime condition.

During the parallel compute phase the engine writes the store through a
[`NodeValueView`], which allows lock-free concurrent writes to *different*
node ids; the scheduler guarantees that each node is written by exactly one
worker per superstep.

*/

use std::cell::UnsafeCell;

use sync_cell_slice::{SyncCell, SyncSlice};

use crate::schema::{Element, PregelSchema, ValueType};

enum Column {
    Long(Box<[i64]>),
    Double(Box<[f64]>),
    LongArray(Box<[Box<[i64]>]>),
    DoubleArray(Box<[Box<[f64]>]>),
}

impl Column {
    fn of(value_type: ValueType, node_count: usize) -> Self {
        match value_type {
            ValueType::Long => Column::Long(vec![0; node_count].into_boxed_slice()),
            ValueType::Double => Column::Double(vec![0.0; node_count].into_boxed_slice()),
            ValueType::LongArray => {
                Column::LongArray(Vec::from_iter((0..node_count).map(|_| Box::default())).into())
            }
            ValueType::DoubleArray => {
                Column::DoubleArray(Vec::from_iter((0..node_count).map(|_| Box::default())).into())
            }
        }
    }

    fn value_type(&self) -> ValueType {
        match self {
            Column::Long(_) => ValueType::Long,
            Column::Double(_) => ValueType::Double,
            Column::LongArray(_) => ValueType::LongArray,
            Column::DoubleArray(_) => ValueType::DoubleArray,
        }
    }
}

#[cold]
fn type_mismatch(key: &str, declared: ValueType, requested: ValueType) -> ! {
    panic!("Property '{key}' is declared as {declared}, not accessible as {requested}")
}

#[cold]
fn unknown_property(key: &str) -> ! {
    panic!("Property '{key}' is not part of the schema")
}

/// The composite, columnar store of per-node computation state.
pub struct NodeValue {
    elements: Box<[Element]>,
    columns: Box<[Column]>,
    node_count: usize,
}

impl NodeValue {
    /// Allocates a store for `node_count` nodes with one column per schema
    /// entry.
    pub fn of(schema: &PregelSchema, node_count: usize) -> Self {
        let elements: Box<[Element]> = schema.elements().into();
        let columns = elements
            .iter()
            .map(|e| Column::of(e.value_type, node_count))
            .collect::<Vec<_>>()
            .into();
        Self {
            elements,
            columns,
            node_count,
        }
    }

    pub fn node_count(&self) -> usize {
        self.node_count
    }

    /// Returns the schema entries backing this store, in column order.
    pub fn elements(&self) -> &[Element] {
        &self.elements
    }

    fn index(&self, key: &str) -> usize {
        match self.elements.iter().position(|e| e.key == key) {
            Some(index) => index,
            None => unknown_property(key),
        }
    }

    pub fn long_value(&self, key: &str, node: usize) -> i64 {
        match &self.columns[self.index(key)] {
            Column::Long(data) => data[node],
            c => type_mismatch(key, c.value_type(), ValueType::Long),
        }
    }

    pub fn double_value(&self, key: &str, node: usize) -> f64 {
        match &self.columns[self.index(key)] {
            Column::Double(data) => data[node],
            c => type_mismatch(key, c.value_type(), ValueType::Double),
        }
    }

    /// Returns the array stored for `node`, or an empty slice if it was
    /// never set.
    pub fn long_array_value(&self, key: &str, node: usize) -> &[i64] {
        match &self.columns[self.index(key)] {
            Column::LongArray(data) => &data[node],
            c => type_mismatch(key, c.value_type(), ValueType::LongArray),
        }
    }

    /// Returns the array stored for `node`, or an empty slice if it was
    /// never set.
    pub fn double_array_value(&self, key: &str, node: usize) -> &[f64] {
        match &self.columns[self.index(key)] {
            Column::DoubleArray(data) => &data[node],
            c => type_mismatch(key, c.value_type(), ValueType::DoubleArray),
        }
    }

    pub fn set_long(&mut self, key: &str, node: usize, value: i64) {
        match &mut self.columns[self.index(key)] {
            Column::Long(data) => data[node] = value,
            c => type_mismatch(key, c.value_type(), ValueType::Long),
        }
    }

    pub fn set_double(&mut self, key: &str, node: usize, value: f64) {
        match &mut self.columns[self.index(key)] {
            Column::Double(data) => data[node] = value,
            c => type_mismatch(key, c.value_type(), ValueType::Double),
        }
    }

    pub fn set_long_array(&mut self, key: &str, node: usize, value: Box<[i64]>) {
        match &mut self.columns[self.index(key)] {
            Column::LongArray(data) => data[node] = value,
            c => type_mismatch(key, c.value_type(), ValueType::LongArray),
        }
    }

    pub fn set_double_array(&mut self, key: &str, node: usize, value: Box<[f64]>) {
        match &mut self.columns[self.index(key)] {
            Column::DoubleArray(data) => data[node] = value,
            c => type_mismatch(key, c.value_type(), ValueType::DoubleArray),
        }
    }

    /// Returns a whole scalar column, indexed by node id.
    pub fn long_column(&self, key: &str) -> &[i64] {
        match &self.columns[self.index(key)] {
            Column::Long(data) => data,
            c => type_mismatch(key, c.value_type(), ValueType::Long),
        }
    }

    /// Returns a whole scalar column, indexed by node id.
    pub fn double_column(&self, key: &str) -> &[f64] {
        match &self.columns[self.index(key)] {
            Column::Double(data) => data,
            c => type_mismatch(key, c.value_type(), ValueType::Double),
        }
    }

    /// Returns a whole array column, indexed by node id.
    pub fn long_array_column(&self, key: &str) -> &[Box<[i64]>] {
        match &self.columns[self.index(key)] {
            Column::LongArray(data) => data,
            c => type_mismatch(key, c.value_type(), ValueType::LongArray),
        }
    }

    /// Returns a whole array column, indexed by node id.
    pub fn double_array_column(&self, key: &str) -> &[Box<[f64]>] {
        match &self.columns[self.index(key)] {
            Column::DoubleArray(data) => data,
            c => type_mismatch(key, c.value_type(), ValueType::DoubleArray),
        }
    }

    /// Returns a view supporting concurrent writes to disjoint node ids.
    pub(crate) fn view(&mut self) -> NodeValueView<'_> {
        let columns = self
            .columns
            .iter_mut()
            .map(|c| match c {
                Column::Long(data) => ColumnView::Long(data.as_sync_slice()),
                Column::Double(data) => ColumnView::Double(data.as_sync_slice()),
                Column::LongArray(data) => ColumnView::LongArray(SyncArraySlice::new(data)),
                Column::DoubleArray(data) => ColumnView::DoubleArray(SyncArraySlice::new(data)),
            })
            .collect::<Vec<_>>()
            .into();
        NodeValueView {
            elements: &self.elements,
            columns,
        }
    }
}

/// Synchronized slice of per-node arrays allowing concurrent access to
/// disjoint indices from multiple threads.
///
/// Scalar columns use [`SyncCell`] slices, but array columns need to hand
/// out references into the stored arrays, which [`SyncCell`] cannot do; this
/// is the same [`UnsafeCell`] cast, with reference-returning accessors.
pub(crate) struct SyncArraySlice<'a, T>(&'a [UnsafeCell<Box<[T]>>]);

unsafe impl<T: Send + Sync> Sync for SyncArraySlice<'_, T> {}

impl<'a, T> SyncArraySlice<'a, T> {
    fn new(slice: &'a mut [Box<[T]>]) -> Self {
        #[allow(trivial_casts)]
        let ptr = slice as *mut [Box<[T]>] as *const [UnsafeCell<Box<[T]>>];
        Self(unsafe { &*ptr })
    }

    /// # Safety
    ///
    /// No other thread may access `index` concurrently.
    unsafe fn set(&self, index: usize, value: Box<[T]>) {
        *self.0[index].get() = value;
    }

    /// # Safety
    ///
    /// No other thread may write `index` concurrently.
    unsafe fn get(&self, index: usize) -> &[T] {
        &*(*self.0[index].get())
    }
}

enum ColumnView<'a> {
    Long(&'a [SyncCell<i64>]),
    Double(&'a [SyncCell<f64>]),
    LongArray(SyncArraySlice<'a, i64>),
    DoubleArray(SyncArraySlice<'a, f64>),
}

impl ColumnView<'_> {
    fn value_type(&self) -> ValueType {
        match self {
            ColumnView::Long(_) => ValueType::Long,
            ColumnView::Double(_) => ValueType::Double,
            ColumnView::LongArray(_) => ValueType::LongArray,
            ColumnView::DoubleArray(_) => ValueType::DoubleArray,
        }
    }
}

/// A view of a [`NodeValue`] store shared by the worker threads of a
/// compute phase.
///
/// # Safety
///
/// Every accessor requires that the calling thread is the only one accessing
/// the given node id during the phase. The engine guarantees this by
/// assigning each node to exactly one partition, and the
/// [contexts](crate::context) only expose the node they were created for.
pub(crate) struct NodeValueView<'a> {
    elements: &'a [Element],
    columns: Box<[ColumnView<'a>]>,
}

impl NodeValueView<'_> {
    fn index(&self, key: &str) -> usize {
        match self.elements.iter().position(|e| e.key == key) {
            Some(index) => index,
            None => unknown_property(key),
        }
    }

    pub(crate) unsafe fn long_value(&self, key: &str, node: usize) -> i64 {
        match &self.columns[self.index(key)] {
            ColumnView::Long(data) => data[node].get(),
            c => type_mismatch(key, c.value_type(), ValueType::Long),
        }
    }

    pub(crate) unsafe fn double_value(&self, key: &str, node: usize) -> f64 {
        match &self.columns[self.index(key)] {
            ColumnView::Double(data) => data[node].get(),
            c => type_mismatch(key, c.value_type(), ValueType::Double),
        }
    }

    pub(crate) unsafe fn long_array_value(&self, key: &str, node: usize) -> &[i64] {
        match &self.columns[self.index(key)] {
            ColumnView::LongArray(data) => data.get(node),
            c => type_mismatch(key, c.value_type(), ValueType::LongArray),
        }
    }

    pub(crate) unsafe fn double_array_value(&self, key: &str, node: usize) -> &[f64] {
        match &self.columns[self.index(key)] {
            ColumnView::DoubleArray(data) => data.get(node),
            c => type_mismatch(key, c.value_type(), ValueType::DoubleArray),
        }
    }

    pub(crate) unsafe fn set_long(&self, key: &str, node: usize, value: i64) {
        match &self.columns[self.index(key)] {
            ColumnView::Long(data) => data[node].set(value),
            c => type_mismatch(key, c.value_type(), ValueType::Long),
        }
    }

    pub(crate) unsafe fn set_double(&self, key: &str, node: usize, value: f64) {
        match &self.columns[self.index(key)] {
            ColumnView::Double(data) => data[node].set(value),
            c => type_mismatch(key, c.value_type(), ValueType::Double),
        }
    }

    pub(crate) unsafe fn set_long_array(&self, key: &str, node: usize, value: Box<[i64]>) {
        match &self.columns[self.index(key)] {
            ColumnView::LongArray(data) => data.set(node, value),
            c => type_mismatch(key, c.value_type(), ValueType::LongArray),
        }
    }

    pub(crate) unsafe fn set_double_array(&self, key: &str, node: usize, value: Box<[f64]>) {
        match &self.columns[self.index(key)] {
            ColumnView::DoubleArray(data) => data.set(node, value),
            c => type_mismatch(key, c.value_type(), ValueType::DoubleArray),
        }
    }
}
