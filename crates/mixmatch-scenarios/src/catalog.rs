//! Dataset configuration catalogs.
//!
//! A dataset directory carries four small CSV catalogs describing the ids that
//! may appear in scenario data filenames: `scenarios.csv`, `attributes.csv`,
//! `temporal_resolutions.csv` and `spatial_resolutions.csv`. Every catalog has
//! at least an `id` column; other columns (`label`, `units`, ...) are kept
//! verbatim.

use crate::error::{ScenarioError, ScenarioResult};
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Subdirectory holding the scenario data files unless configured otherwise.
pub const DEFAULT_SCENARIO_DATA_DIRNAME: &str = "ScenarioData";

/// One row of a catalog CSV.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConfigEntry {
    fields: BTreeMap<String, String>,
}

impl ConfigEntry {
    pub fn new<I, K, V>(fields: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            fields: fields
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.fields.get(field).map(String::as_str)
    }

    pub fn id(&self) -> &str {
        self.get("id").unwrap_or("")
    }

    /// Display label, falling back to the id.
    pub fn label(&self) -> &str {
        self.get("label").unwrap_or_else(|| self.id())
    }

    pub fn units(&self) -> Option<&str> {
        self.get("units")
    }
}

/// Ordered list of entries loaded from one catalog CSV.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigCatalog {
    path: PathBuf,
    headers: Vec<String>,
    entries: Vec<ConfigEntry>,
}

impl ConfigCatalog {
    pub fn load(path: &Path) -> ScenarioResult<Self> {
        if !path.exists() {
            return Err(ScenarioError::MissingConfigFile(path.to_path_buf()));
        }
        let unreadable = |source| ScenarioError::ConfigUnreadable {
            path: path.to_path_buf(),
            source,
        };
        let mut rdr = csv::ReaderBuilder::new()
            .has_headers(true)
            .from_path(path)
            .map_err(unreadable)?;
        let headers: Vec<String> = rdr
            .headers()
            .map_err(unreadable)?
            .iter()
            .map(str::to_string)
            .collect();
        let mut entries = Vec::new();
        for record in rdr.records() {
            let record = record.map_err(unreadable)?;
            entries.push(ConfigEntry::new(
                headers.iter().cloned().zip(record.iter().map(str::to_string)),
            ));
        }
        debug!(path = %path.display(), entries = entries.len(), "loaded config catalog");
        Ok(Self {
            path: path.to_path_buf(),
            headers,
            entries,
        })
    }

    /// Build a catalog in memory.
    pub fn from_entries(path: impl Into<PathBuf>, entries: Vec<ConfigEntry>) -> Self {
        let mut headers: Vec<String> = Vec::new();
        for entry in &entries {
            for key in entry.fields.keys() {
                if !headers.contains(key) {
                    headers.push(key.clone());
                }
            }
        }
        Self {
            path: path.into(),
            headers,
            entries,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn entries(&self) -> &[ConfigEntry] {
        &self.entries
    }

    /// Ids in file order.
    pub fn ids(&self) -> Vec<&str> {
        self.entries.iter().map(ConfigEntry::id).collect()
    }

    /// Look up an entry by id. Filename tokens cannot start with a digit in
    /// some tools, so `X2030` also matches an entry with id `2030`.
    pub fn find_by_id(&self, id: &str) -> Option<&ConfigEntry> {
        let found = self.entries.iter().find(|entry| {
            let candidate = entry.id();
            candidate == id || id.strip_prefix('X') == Some(candidate)
        });
        if found.is_none() {
            warn!(
                id,
                catalog = %self.path.display(),
                known = ?self.ids(),
                "config id not found"
            );
        }
        found
    }
}

/// The four catalogs of one dataset plus the location of its data files.
#[derive(Debug, Clone)]
pub struct ConfigSet {
    pub dataset_dir: PathBuf,
    pub scenario_data_dir: PathBuf,
    pub scenarios: ConfigCatalog,
    pub attributes: ConfigCatalog,
    pub temporal_resolutions: ConfigCatalog,
    pub spatial_resolutions: ConfigCatalog,
}

impl ConfigSet {
    pub fn load(dataset_dir: &Path, scenario_data_dirname: &str) -> ScenarioResult<Self> {
        Ok(Self {
            dataset_dir: dataset_dir.to_path_buf(),
            scenario_data_dir: dataset_dir.join(scenario_data_dirname),
            scenarios: ConfigCatalog::load(&dataset_dir.join("scenarios.csv"))?,
            attributes: ConfigCatalog::load(&dataset_dir.join("attributes.csv"))?,
            temporal_resolutions: ConfigCatalog::load(
                &dataset_dir.join("temporal_resolutions.csv"),
            )?,
            spatial_resolutions: ConfigCatalog::load(&dataset_dir.join("spatial_resolutions.csv"))?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    fn write_catalog(dir: &Path, name: &str, body: &str) -> PathBuf {
        let path = dir.join(name);
        fs::write(&path, body).unwrap();
        path
    }

    #[test]
    fn loads_entries_in_file_order() {
        let dir = tempdir().unwrap();
        let path = write_catalog(
            dir.path(),
            "attributes.csv",
            "id,label,units\ncapacity,Capacity,GW\ngeneration,Generation,TWh\n",
        );
        let catalog = ConfigCatalog::load(&path).unwrap();
        assert_eq!(catalog.ids(), vec!["capacity", "generation"]);
        let cap = catalog.find_by_id("capacity").unwrap();
        assert_eq!(cap.label(), "Capacity");
        assert_eq!(cap.units(), Some("GW"));
    }

    #[test]
    fn x_prefix_matches_bare_id() {
        let catalog = ConfigCatalog::from_entries(
            "scenarios.csv",
            vec![
                ConfigEntry::new([("id", "2016")]),
                ConfigEntry::new([("id", "X2017")]),
            ],
        );
        assert_eq!(catalog.find_by_id("X2016").map(ConfigEntry::id), Some("2016"));
        // exact match still wins
        assert_eq!(catalog.find_by_id("X2017").map(ConfigEntry::id), Some("X2017"));
        assert!(catalog.find_by_id("2018").is_none());
    }

    #[test]
    fn label_falls_back_to_id() {
        let entry = ConfigEntry::new([("id", "annual")]);
        assert_eq!(entry.label(), "annual");
        assert_eq!(entry.units(), None);
    }

    #[test]
    fn missing_catalog_is_reported() {
        let dir = tempdir().unwrap();
        let err = ConfigCatalog::load(&dir.path().join("scenarios.csv")).unwrap_err();
        assert!(matches!(err, ScenarioError::MissingConfigFile(_)));
        let err = ConfigSet::load(dir.path(), DEFAULT_SCENARIO_DATA_DIRNAME).unwrap_err();
        assert!(matches!(err, ScenarioError::MissingConfigFile(_)));
    }
}
