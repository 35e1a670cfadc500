//! Scenario data directory listing.

use crate::catalog::ConfigSet;
use crate::error::ScenarioResult;
use crate::record::{split_filename, ScenarioFile};
use std::fs;
use std::path::Path;
use tracing::debug;

/// Files of one scenario, in listing order.
#[derive(Debug, Clone)]
pub struct ScenarioGroup {
    pub files: Vec<ScenarioFile>,
}

impl ScenarioGroup {
    /// Id of the group's scenario (taken from its first file).
    pub fn scenario_id(&self) -> &str {
        self.files.first().map_or("", ScenarioFile::scenario_id)
    }

    pub fn scenario_label(&self) -> &str {
        self.files.first().map_or("", ScenarioFile::scenario_label)
    }

    /// Whether `key` names this scenario by id or by label.
    pub fn matches(&self, key: &str) -> bool {
        self.scenario_id() == key || self.scenario_label() == key
    }

    pub fn iter(&self) -> impl Iterator<Item = &ScenarioFile> + '_ {
        self.files.iter()
    }
}

/// Load the dataset catalogs and index its data files, grouped by scenario.
///
/// Hidden files are skipped; files are listed in name order so grouping is
/// reproducible across platforms.
pub fn parse_dataset(
    dataset_dir: &Path,
    scenario_data_dirname: &str,
) -> ScenarioResult<(ConfigSet, Vec<ScenarioGroup>)> {
    let config = ConfigSet::load(dataset_dir, scenario_data_dirname)?;

    let mut paths = Vec::new();
    for entry in fs::read_dir(&config.scenario_data_dir)? {
        let entry = entry?;
        let hidden = entry.file_name().to_string_lossy().starts_with('.');
        if !hidden && entry.file_type()?.is_file() {
            paths.push(entry.path());
        }
    }
    paths.sort_by(|a, b| a.file_name().cmp(&b.file_name()));

    let mut groups: Vec<ScenarioGroup> = Vec::new();
    for path in paths {
        let tokens = split_filename(&path)?;
        let file = ScenarioFile::new(&config, path, tokens);
        match groups
            .iter_mut()
            .find(|g| g.scenario_id() == file.scenario_id())
        {
            Some(group) => group.files.push(file),
            None => groups.push(ScenarioGroup { files: vec![file] }),
        }
    }
    debug!(
        dataset = %dataset_dir.display(),
        groups = groups.len(),
        "indexed scenario data files"
    );
    Ok((config, groups))
}
