//! CSV file exchange with an external optimizer.
//!
//! ```text
//! <workdir>/inputs/   n.csv g.csv g_indep.csv g_dep.csv desired_capacity.csv
//!                     current_capacity.csv g_dist.csv current_indep_capacity.csv
//!                     maximum_capacity.csv manifest.json
//! <workdir>/outputs/  capacity.csv capacity_added.csv capacity_kept.csv
//!                     capacity_swapped.csv capacity_removed.csv distance.csv
//! ```
//!
//! Set files have one column named after the set. Parameter files have one
//! column per index followed by `Value`. Output tables use the generator and
//! swap schemas of `mixmatch-core` and are read by position. `distance.csv`
//! holds the objective value and is written last; its presence marks a
//! successful run.

use crate::error::{SolverError, SolverResult};
use crate::problem::{MatchProblem, ProblemManifest};
use crate::solution::MatchSolution;
use mixmatch_core::{read_generators, read_swaps, CoreError};
use serde::Serialize;
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use tracing::debug;

pub const INPUTS_DIR: &str = "inputs";
pub const OUTPUTS_DIR: &str = "outputs";
pub const MANIFEST_FILE: &str = "manifest.json";
/// Output whose presence marks a successful run.
pub const SUCCESS_ARTIFACT: &str = "distance.csv";

/// Write every set and parameter file plus the manifest into `inputs_dir`.
pub fn write_inputs(problem: &MatchProblem, inputs_dir: &Path) -> SolverResult<()> {
    fs::create_dir_all(inputs_dir)?;

    write_set(&inputs_dir.join("n.csv"), "n", &problem.nodes)?;
    write_set(&inputs_dir.join("g.csv"), "g", &problem.gentypes)?;
    write_set(&inputs_dir.join("g_indep.csv"), "g", &problem.indep_gentypes)?;
    write_set(&inputs_dir.join("g_dep.csv"), "g", &problem.dep_gentypes)?;

    write_table(
        &inputs_dir.join("desired_capacity.csv"),
        &["g", "Value"],
        &problem.desired_capacity,
    )?;
    write_table(
        &inputs_dir.join("current_capacity.csv"),
        &["n", "g", "Value"],
        &problem.current_capacity,
    )?;
    write_table(
        &inputs_dir.join("g_dist.csv"),
        &["g", "gg", "Value"],
        &problem.gendists,
    )?;
    write_table(
        &inputs_dir.join("current_indep_capacity.csv"),
        &["n", "Value"],
        &problem.current_indep_capacity,
    )?;
    write_table(
        &inputs_dir.join("maximum_capacity.csv"),
        &["n", "g_dep", "Value"],
        &problem.maximum_capacity,
    )?;

    let manifest = ProblemManifest::from(problem);
    let file = File::create(inputs_dir.join(MANIFEST_FILE))?;
    serde_json::to_writer_pretty(file, &manifest)?;
    debug!(
        dir = %inputs_dir.display(),
        nodes = manifest.num_nodes,
        gentypes = manifest.num_gentypes,
        "wrote optimizer inputs"
    );
    Ok(())
}

fn write_set(path: &Path, name: &str, members: &[String]) -> SolverResult<()> {
    let mut wtr = csv::Writer::from_path(path)?;
    wtr.write_record([name])?;
    for member in members {
        wtr.write_record([member])?;
    }
    wtr.flush()?;
    Ok(())
}

fn write_table<T: Serialize>(path: &Path, header: &[&str], rows: &[T]) -> SolverResult<()> {
    let mut wtr = csv::WriterBuilder::new()
        .has_headers(false)
        .from_path(path)?;
    wtr.write_record(header)?;
    for row in rows {
        wtr.serialize(row)?;
    }
    wtr.flush()?;
    Ok(())
}

/// Whether the optimizer left its success artifact in `outputs_dir`.
pub fn outputs_present(outputs_dir: &Path) -> bool {
    outputs_dir.join(SUCCESS_ARTIFACT).is_file()
}

/// Read the optimizer's result tables. `Ok(None)` when the run did not
/// produce its success artifact. Zero-capacity rows are dropped.
pub fn read_outputs(outputs_dir: &Path) -> SolverResult<Option<MatchSolution>> {
    if !outputs_present(outputs_dir) {
        debug!(dir = %outputs_dir.display(), "no optimizer outputs found");
        return Ok(None);
    }
    let generators = |name: &str| {
        let path = outputs_dir.join(name);
        read_generators(&path).map_err(|e| malformed(path, e))
    };
    let swaps_path = outputs_dir.join("capacity_swapped.csv");
    let mut solution = MatchSolution {
        capacity: generators("capacity.csv")?,
        capacity_added: generators("capacity_added.csv")?,
        capacity_kept: generators("capacity_kept.csv")?,
        capacity_swapped: read_swaps(&swaps_path).map_err(|e| malformed(swaps_path, e))?,
        capacity_removed: generators("capacity_removed.csv")?,
        distance: read_distance(&outputs_dir.join(SUCCESS_ARTIFACT))?,
    };
    solution.drop_zero_capacity();
    Ok(Some(solution))
}

fn malformed(file: PathBuf, err: CoreError) -> SolverError {
    SolverError::MalformedOutput {
        file,
        message: err.to_string(),
    }
}

fn read_distance(path: &Path) -> SolverResult<f64> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_path(path)?;
    let record = rdr
        .records()
        .next()
        .transpose()?
        .ok_or_else(|| SolverError::MalformedOutput {
            file: path.to_path_buf(),
            message: "no objective value".to_string(),
        })?;
    let raw = record.get(0).unwrap_or("");
    raw.parse::<f64>().map_err(|_| SolverError::MalformedOutput {
        file: path.to_path_buf(),
        message: format!("objective value '{raw}' is not a number"),
    })
}
