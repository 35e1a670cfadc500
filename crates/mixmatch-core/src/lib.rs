//! # mixmatch-core: inventories and type tables
//!
//! Shared building blocks for generation-mix matching:
//!
//! - [`inventory`]: node and generator inventories read from CSV
//! - [`gentype`]: resource-independent / resource-dependent classification
//! - [`table`]: [`TypeTable`], the labeled per-generator-type matrix used for
//!   generation mixes, request summaries and result summaries
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use mixmatch_core::*;
//! use std::path::Path;
//!
//! let nodes = NodeTable::from_csv_path(Path::new("nodes.csv"), None)?;
//! let generators = read_generators(Path::new("generators.csv"))?;
//! let current = TypeTable::pivot_sum(
//!     "Current Capacity (MW)",
//!     generators.iter().map(|g| (g.generator_type.clone(), g.capacity_mw)),
//! )?;
//! println!("{} nodes\n{current}", nodes.nodes().len());
//! # Ok::<(), CoreError>(())
//! ```

pub mod error;
pub mod gentype;
pub mod inventory;
pub mod table;

pub use error::{CoreError, CoreResult};
pub use gentype::{
    is_resource_independent, partition_gentypes, ResourceClass, CURTAILMENT, RESOURCE_INDEPENDENT,
};
pub use inventory::{
    nodes_columns, read_generators, read_generators_from_reader, read_swaps, write_generators,
    write_swaps, Generator, Node, NodeTable, SwappedGenerator, GENERATOR_COLUMNS,
    NODE_BASE_COLUMNS, SWAP_COLUMNS,
};
pub use table::{TypeTable, TOTAL_ROW};

/// Round to `digits` decimal places, halves away from zero.
///
/// Negative `digits` round to tens, hundreds, and so on.
pub fn round_to(value: f64, digits: i32) -> f64 {
    if !value.is_finite() {
        return value;
    }
    let scale = 10f64.powi(digits);
    (value * scale).round() / scale
}
