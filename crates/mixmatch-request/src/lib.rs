//! Matching a system's generator fleet to a scenario generation mix.
//!
//! A [`MatchRequest`] pairs a node inventory and its current generators with
//! a desired mix from a [`mixmatch_scenarios::ScenarioDataset`]. The mix is
//! scaled so its useable generation equals the system's annual load, checked
//! against what the fleet and the node ceilings allow, and handed to an
//! optimizer through a [`mixmatch_solver_common::SolverAdapter`].
//!
//! ```rust,no_run
//! use mixmatch_core::{read_generators, NodeTable};
//! use mixmatch_request::{FulfillOptions, MatchRequest};
//! use mixmatch_scenarios::ScenarioDataset;
//! use mixmatch_solver_common::CommandAdapter;
//! use std::path::Path;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let dataset = ScenarioDataset::open(Path::new("Standard Scenarios"))?;
//! let mix = dataset.get_genmix("2030", "Mid Case", &["national"])?;
//! let nodes = NodeTable::from_csv_path(Path::new("nodes.csv"), None)?;
//! let generators = read_generators(Path::new("generators.csv"))?;
//!
//! let mut request = MatchRequest::new(nodes, generators, &dataset, mix, Vec::new())?;
//! let adapter = CommandAdapter::new("julia").with_model_file("match.jl");
//! request.fulfill(&adapter, &FulfillOptions::new("run"))?;
//! request.save_results(Path::new("results"))?;
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod export;
pub mod feasibility;
pub mod gendists;
pub mod request;

pub use error::{Infeasibility, MatchError, MatchResult};
pub use export::{
    write_resource_exports, MatchManifest, DETAILS_DIR, MANIFEST_FILE, RESOURCE_EXPORTS,
    RESULT_SUMMARY_FILE,
};
pub use feasibility::{check_feasibility, CURRENT_CAPACITY, DESIRED_CAPACITY};
pub use gendists::{
    default_distance, default_gendists, drop_default_gendists, filter_gendists, load_gendists,
    write_gendists, GENDISTS_COLUMNS,
};
pub use request::{
    annual_useable_generation, compile_result_summary, FulfillOptions, MatchRequest,
    RequestState, Scaling, ADDED, CAPACITY_FRACTION, CAPACITY_GW, FINAL, GENERATION_FRACTION,
    GENERATION_TWH, KEPT, REMOVED, SWAPPED_IN, SWAPPED_OUT,
};
