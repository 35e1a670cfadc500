//! Scenario datasets for generation-mix matching.
//!
//! A dataset directory looks like:
//!
//! ```text
//! <dataset>/
//!   scenarios.csv  attributes.csv  temporal_resolutions.csv  spatial_resolutions.csv
//!   ScenarioData/
//!     <scenario>.<attribute>.<temporal>.<spatial>.csv
//! ```
//!
//! [`parse_dataset`] indexes the data files, [`ScenarioFile::get_data`]
//! reshapes one file into a [`ValueTree`], and [`ScenarioDataset`] answers
//! whole-dataset queries such as [`ScenarioDataset::get_genmix`].

pub mod catalog;
pub mod dataset;
pub mod error;
pub mod index;
pub mod record;

pub use catalog::{ConfigCatalog, ConfigEntry, ConfigSet, DEFAULT_SCENARIO_DATA_DIRNAME};
pub use dataset::{
    discover_datasets, fraction_label, ScenarioDataset, TimeseriesRecord, CAPACITY,
    DEFAULT_GENMIX_ATTRIBUTES, GENERATION, STATES,
};
pub use error::{ScenarioError, ScenarioResult};
pub use index::{parse_dataset, ScenarioGroup};
pub use record::{round4, split_filename, Leaf, ScenarioFile, ValueTree, NATIONAL};
