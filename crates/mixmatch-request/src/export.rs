//! Writing a fulfilled request to disk.
//!
//! ```text
//! <outdir>/new_generators.csv
//! <outdir>/result_summary.csv
//! <outdir>/match_manifest.json
//! <outdir>/match_details/{capacity,capacity_added,capacity_kept,capacity_swapped,capacity_removed}.csv
//! <outdir>/<resource>/{generators,nodes}.csv
//! ```
//!
//! Writes are not transactional; a failure part way leaves earlier files.

use crate::error::{MatchError, MatchResult};
use crate::request::{MatchRequest, Scaling};
use chrono::{DateTime, Utc};
use mixmatch_core::{write_generators, write_swaps, Generator, NodeTable};
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::path::Path;
use tracing::{debug, info};

pub const DETAILS_DIR: &str = "match_details";
pub const RESULT_SUMMARY_FILE: &str = "result_summary.csv";
pub const MANIFEST_FILE: &str = "match_manifest.json";

/// Renewable types exported for resource-data lookups, with the directory
/// each one is written to.
pub const RESOURCE_EXPORTS: [(&str, &str); 3] = [
    ("Land-based Wind", "wind"),
    ("Rooftop PV", "solar_rooftop"),
    ("Utility PV", "solar_one-axis-tracking"),
];

/// Record of one fulfilled request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchManifest {
    pub created_at: DateTime<Utc>,
    pub num_nodes: usize,
    pub gentypes: Vec<String>,
    pub exclusions: Vec<String>,
    pub system_load_twh: f64,
    pub genmix_generation_twh: f64,
    pub scale_factor: f64,
    pub distance: f64,
    pub final_capacity_mw: f64,
}

#[derive(Serialize)]
struct SitedCapacity<'a> {
    node_id: &'a str,
    #[serde(rename = "capacity (MW)")]
    capacity_mw: f64,
}

impl MatchRequest {
    /// Write the final fleet, the optimizer's moves, the result summary and
    /// the per-resource siting files under `outdir`.
    pub fn save_results(&self, outdir: &Path) -> MatchResult<()> {
        let (Some(solution), Some(result_summary), Some(scaling)) =
            (self.solution(), self.result_summary(), self.scaling())
        else {
            return Err(MatchError::InvalidState {
                operation: "save results of",
                state: self.state(),
            });
        };

        fs::create_dir_all(outdir)?;
        write_generators(&outdir.join("new_generators.csv"), &solution.capacity)?;

        let details = outdir.join(DETAILS_DIR);
        fs::create_dir_all(&details)?;
        write_generators(&details.join("capacity.csv"), &solution.capacity)?;
        write_generators(&details.join("capacity_added.csv"), &solution.capacity_added)?;
        write_generators(&details.join("capacity_kept.csv"), &solution.capacity_kept)?;
        write_swaps(&details.join("capacity_swapped.csv"), &solution.capacity_swapped)?;
        write_generators(&details.join("capacity_removed.csv"), &solution.capacity_removed)?;

        result_summary.write_csv_path(&outdir.join(RESULT_SUMMARY_FILE), "generator type")?;
        write_resource_exports(outdir, &solution.capacity, self.nodes())?;

        let manifest = self.manifest(scaling, solution.distance, solution.final_total());
        let file = File::create(outdir.join(MANIFEST_FILE))?;
        serde_json::to_writer_pretty(file, &manifest)?;

        info!(outdir = %outdir.display(), "saved match results");
        Ok(())
    }

    fn manifest(&self, scaling: Scaling, distance: f64, final_capacity_mw: f64) -> MatchManifest {
        MatchManifest {
            created_at: Utc::now(),
            num_nodes: self.nodes().nodes().len(),
            gentypes: self.gentypes().to_vec(),
            exclusions: self.exclusions().to_vec(),
            system_load_twh: scaling.system_load_twh,
            genmix_generation_twh: scaling.genmix_generation_twh,
            scale_factor: scaling.scale_factor,
            distance,
            final_capacity_mw,
        }
    }
}

/// For each exported renewable type present in `capacity`, write its sited
/// capacity and the node locations into `<outdir>/<resource dir>/`.
pub fn write_resource_exports(
    outdir: &Path,
    capacity: &[Generator],
    nodes: &NodeTable,
) -> MatchResult<()> {
    for (gentype, dirname) in RESOURCE_EXPORTS {
        let sited: Vec<SitedCapacity<'_>> = capacity
            .iter()
            .filter(|g| g.generator_type == gentype)
            .map(|g| SitedCapacity {
                node_id: &g.node_id,
                capacity_mw: g.capacity_mw,
            })
            .collect();
        if sited.is_empty() {
            continue;
        }
        let dir = outdir.join(dirname);
        fs::create_dir_all(&dir)?;
        let mut wtr = csv::Writer::from_path(dir.join("generators.csv"))?;
        for row in &sited {
            wtr.serialize(row)?;
        }
        wtr.flush()?;
        nodes.write_locations_csv(&dir.join("nodes.csv"))?;
        debug!(gentype, dir = %dir.display(), sites = sited.len(), "exported resource siting");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn exports_only_present_resources() {
        let dir = tempdir().unwrap();
        let nodes = NodeTable::from_reader(
            "node_id,latitude,longitude,peak load (MW),annual load (GWh)\n1,39.7,-105.2,1,1\n"
                .as_bytes(),
            None,
            "nodes",
        )
        .unwrap();
        let capacity = vec![
            Generator::new("1", "Utility PV", 25.0),
            Generator::new("1", "Coal", 100.0),
        ];
        write_resource_exports(dir.path(), &capacity, &nodes).unwrap();

        let pv = dir.path().join("solar_one-axis-tracking");
        assert_eq!(
            fs::read_to_string(pv.join("generators.csv")).unwrap(),
            "node_id,capacity (MW)\n1,25.0\n"
        );
        assert_eq!(
            fs::read_to_string(pv.join("nodes.csv")).unwrap(),
            "node_id,latitude,longitude\n1,39.7,-105.2\n"
        );
        assert!(!dir.path().join("wind").exists());
    }
}
