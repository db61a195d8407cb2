/*
 * SPDX-FileCopyrightText: 2026 Sebastiano Vigna
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

/*!

Schemas describing the per-node state of a computation.

A [`PregelSchema`] is an ordered mapping from unique property names to
[value types](ValueType), with a [visibility flag](Visibility) per property.
It is built once, before a run, and defines the physical layout of the
[node-value store](crate::node_value::NodeValue).

*/

/// The type of a node-value property.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueType {
    Long,
    Double,
    LongArray,
    DoubleArray,
}

impl std::fmt::Display for ValueType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValueType::Long => f.write_str("Long"),
            ValueType::Double => f.write_str("Double"),
            ValueType::LongArray => f.write_str("LongArray"),
            ValueType::DoubleArray => f.write_str("DoubleArray"),
        }
    }
}

/// Whether a property is part of the computation result or internal scratch
/// state.
///
/// The engine stores both kinds identically; the flag lets result consumers
/// skip private properties.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Visibility {
    #[default]
    Public,
    Private,
}

/// A single schema entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    pub key: String,
    pub value_type: ValueType,
    pub visibility: Visibility,
}

/// An ordered, immutable mapping from property names to value types.
///
/// # Examples
///
/// ```
/// use pregel::schema::{PregelSchema, ValueType, Visibility};
///
/// let schema = PregelSchema::builder()
///     .add("rank", ValueType::Double)
///     .add_private("delta", ValueType::Double)
///     .build();
///
/// assert_eq!(schema.value_type("rank"), Some(ValueType::Double));
/// assert_eq!(schema.elements()[1].visibility, Visibility::Private);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PregelSchema {
    elements: Vec<Element>,
}

impl PregelSchema {
    pub fn builder() -> PregelSchemaBuilder {
        PregelSchemaBuilder::default()
    }

    /// Returns the schema entries, in insertion order.
    pub fn elements(&self) -> &[Element] {
        &self.elements
    }

    /// Returns the declared type of a property, or `None` if the property is
    /// not part of the schema.
    pub fn value_type(&self, key: &str) -> Option<ValueType> {
        self.elements
            .iter()
            .find(|e| e.key == key)
            .map(|e| e.value_type)
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }
}

/// Builder for [`PregelSchema`].
#[derive(Debug, Clone, Default)]
pub struct PregelSchemaBuilder {
    elements: Vec<Element>,
}

impl PregelSchemaBuilder {
    /// Adds a public property.
    ///
    /// # Panics
    ///
    /// Panics if a property with the same key was already added.
    pub fn add(self, key: impl Into<String>, value_type: ValueType) -> Self {
        self.add_with_visibility(key, value_type, Visibility::Public)
    }

    /// Adds a private property.
    ///
    /// # Panics
    ///
    /// Panics if a property with the same key was already added.
    pub fn add_private(self, key: impl Into<String>, value_type: ValueType) -> Self {
        self.add_with_visibility(key, value_type, Visibility::Private)
    }

    pub fn add_with_visibility(
        mut self,
        key: impl Into<String>,
        value_type: ValueType,
        visibility: Visibility,
    ) -> Self {
        let key = key.into();
        assert!(
            self.elements.iter().all(|e| e.key != key),
            "Duplicate schema property '{key}'"
        );
        self.elements.push(Element {
            key,
            value_type,
            visibility,
        });
        self
    }

    pub fn build(self) -> PregelSchema {
        PregelSchema {
            elements: self.elements,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insertion_order() {
        let schema = PregelSchema::builder()
            .add("b", ValueType::Long)
            .add("a", ValueType::DoubleArray)
            .build();
        let keys: Vec<_> = schema.elements().iter().map(|e| e.key.as_str()).collect();
        assert_eq!(keys, vec!["b", "a"]);
        assert_eq!(schema.value_type("a"), Some(ValueType::DoubleArray));
        assert_eq!(schema.value_type("c"), None);
    }

    #[test]
    #[should_panic(expected = "Duplicate schema property 'x'")]
    fn test_duplicate_key() {
        PregelSchema::builder()
            .add("x", ValueType::Long)
            .add("x", ValueType::Double)
            .build();
    }
}
