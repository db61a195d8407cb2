/*
 * SPDX-FileCopyrightText: 2026 Sebastiano Vigna
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

#![doc = include_str!("../README.md")]
#![deny(unstable_features)]
#![deny(trivial_casts)]
#![deny(unconditional_recursion)]
#![deny(unreachable_code)]
#![deny(unreachable_pub)]
#![deny(unreachable_patterns)]
#![deny(unused_macro_rules)]

pub mod computation;
pub mod context;
pub mod graphs;
pub mod memory;
pub mod messages;
pub mod node_value;
pub mod partition;
pub mod pregel;
pub mod schema;
pub mod traits;

/// Prelude module to import everything from this crate.
pub mod prelude {
    pub use crate::computation::*;
    pub use crate::context::*;
    pub use crate::graphs::vec_graph::VecGraph;
    pub use crate::memory::*;
    pub use crate::messages::{MessageReducer, Messages};
    pub use crate::node_value::NodeValue;
    pub use crate::partition::Partitioning;
    pub use crate::pregel::*;
    pub use crate::schema::*;
    pub use crate::traits::*;
}
