//! Scenario data files and their value trees.
//!
//! Each data file holds flat rows with a `value` column, an optional `time`
//! column, an optional `gid` (geography) column and at most one further
//! column naming a sub-attribute such as the generator type. [`ScenarioFile::get_data`]
//! reshapes those rows into a [`ValueTree`] whose variant is picked from the
//! file's spatial/temporal resolution and the presence of the extra column.

use crate::catalog::{ConfigEntry, ConfigSet};
use crate::error::{ScenarioError, ScenarioResult};
use polars::prelude::*;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fs::File;
use std::path::{Path, PathBuf};
use tracing::debug;

pub const GID_COLUMN: &str = "gid";
pub const VALUE_COLUMN: &str = "value";
pub const TIME_COLUMN: &str = "time";

/// Spatial resolution id meaning "one value for the whole country".
pub const NATIONAL: &str = "national";

/// Value (or per-time values) at the bottom of a tree.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Leaf {
    Scalar(f64),
    TimeSeries(BTreeMap<String, f64>),
}

impl Leaf {
    /// Value for `time`. Scalars hold for every time.
    pub fn at(&self, time: &str) -> Option<f64> {
        match self {
            Leaf::Scalar(v) => Some(*v),
            Leaf::TimeSeries(series) => series.get(time).copied(),
        }
    }

    pub fn times(&self) -> Vec<String> {
        match self {
            Leaf::Scalar(_) => Vec::new(),
            Leaf::TimeSeries(series) => series.keys().cloned().collect(),
        }
    }
}

/// Reshaped contents of one scenario data file.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ValueTree {
    /// Spatially and temporally cumulative, no extra column.
    Scalar(f64),
    /// Spatially cumulative, no extra column.
    TimeSeries(BTreeMap<String, f64>),
    /// Spatially cumulative with one extra column: extra value to leaf.
    Keyed(BTreeMap<String, Leaf>),
    /// Sub-national with one extra column: gid, then attribute id, then extra value.
    GeoKeyed(BTreeMap<String, BTreeMap<String, BTreeMap<String, Leaf>>>),
    /// Sub-national, no extra column: gid to leaf.
    Geo(BTreeMap<String, Leaf>),
}

impl ValueTree {
    pub fn shape_name(&self) -> &'static str {
        match self {
            ValueTree::Scalar(_) => "scalar",
            ValueTree::TimeSeries(_) => "time series",
            ValueTree::Keyed(_) => "keyed",
            ValueTree::GeoKeyed(_) => "geo-keyed",
            ValueTree::Geo(_) => "geo",
        }
    }

    /// Top-level keys (extra values or geography ids).
    pub fn keys(&self) -> Vec<String> {
        match self {
            ValueTree::Scalar(_) => Vec::new(),
            ValueTree::TimeSeries(series) => series.keys().cloned().collect(),
            ValueTree::Keyed(map) | ValueTree::Geo(map) => map.keys().cloned().collect(),
            ValueTree::GeoKeyed(map) => map.keys().cloned().collect(),
        }
    }
}

/// Fixed rounding applied to every value read from a data file.
pub fn round4(value: f64) -> f64 {
    mixmatch_core::round_to(value, 4)
}

/// Classified column names of a read frame.
struct Columns {
    value: String,
    time: Option<String>,
    gid: Option<String>,
    extra: Option<String>,
}

/// One scenario data file and its resolved filename components.
#[derive(Debug, Clone)]
pub struct ScenarioFile {
    pub path: PathBuf,
    /// Trimmed filename tokens: scenario, attribute, temporal, spatial.
    pub tokens: [String; 4],
    pub scenario: Option<ConfigEntry>,
    pub attribute: Option<ConfigEntry>,
    pub temporal_resolution: Option<ConfigEntry>,
    pub spatial_resolution: Option<ConfigEntry>,
    raw: Option<DataFrame>,
}

impl ScenarioFile {
    /// Resolve each token against its catalog; unresolved tokens stay `None`.
    pub fn new(config: &ConfigSet, path: PathBuf, tokens: [String; 4]) -> Self {
        let [scenario, attribute, temporal, spatial] = &tokens;
        Self {
            scenario: config.scenarios.find_by_id(scenario).cloned(),
            attribute: config.attributes.find_by_id(attribute).cloned(),
            temporal_resolution: config.temporal_resolutions.find_by_id(temporal).cloned(),
            spatial_resolution: config.spatial_resolutions.find_by_id(spatial).cloned(),
            path,
            tokens,
            raw: None,
        }
    }

    pub fn scenario_id(&self) -> &str {
        resolved_id(&self.scenario, &self.tokens[0])
    }

    pub fn scenario_label(&self) -> &str {
        self.scenario
            .as_ref()
            .map(ConfigEntry::label)
            .unwrap_or(self.tokens[0].as_str())
    }

    pub fn attribute_id(&self) -> &str {
        resolved_id(&self.attribute, &self.tokens[1])
    }

    pub fn temporal_resolution_id(&self) -> &str {
        resolved_id(&self.temporal_resolution, &self.tokens[2])
    }

    pub fn spatial_resolution_id(&self) -> &str {
        resolved_id(&self.spatial_resolution, &self.tokens[3])
    }

    pub fn cumulative_spatial(&self) -> bool {
        self.spatial_resolution
            .as_ref()
            .map_or(true, |entry| entry.id() == NATIONAL)
    }

    pub fn cumulative_temporal(&self) -> bool {
        self.temporal_resolution.is_none()
    }

    /// `"{label} ({units})"` of the attribute, used as a genmix column name.
    pub fn attribute_label(&self) -> String {
        match &self.attribute {
            Some(entry) => format!("{} ({})", entry.label(), entry.units().unwrap_or("")),
            None => self.tokens[1].clone(),
        }
    }

    pub fn is_read(&self) -> bool {
        self.raw.is_some()
    }

    /// Parse the whole file into memory, every column as text. The handle is
    /// closed before returning.
    pub fn read(&mut self) -> ScenarioResult<()> {
        let unreadable = |message: String| ScenarioError::DataFileUnreadable {
            path: self.path.clone(),
            message,
        };
        let mut file = File::open(&self.path).map_err(|e| unreadable(e.to_string()))?;
        let frame = CsvReader::new(&mut file)
            .has_header(true)
            .infer_schema(Some(0))
            .finish()
            .map_err(|e| unreadable(e.to_string()))?;
        debug!(path = %self.path.display(), rows = frame.height(), "read scenario data file");
        self.raw = Some(frame);
        Ok(())
    }

    /// Reshape the read rows into a value tree. Pure in the read content.
    pub fn get_data(&self) -> ScenarioResult<ValueTree> {
        let raw = self
            .raw
            .as_ref()
            .ok_or_else(|| ScenarioError::NotRead(self.path.clone()))?;
        let columns = self.classify(raw)?;
        let cumulative_temporal = self.cumulative_temporal();

        if !self.cumulative_spatial() && columns.gid.is_none() {
            return Err(ScenarioError::MissingColumn {
                path: self.path.clone(),
                column: GID_COLUMN.to_string(),
            });
        }
        if !cumulative_temporal && columns.time.is_none() {
            return Err(ScenarioError::MissingColumn {
                path: self.path.clone(),
                column: TIME_COLUMN.to_string(),
            });
        }

        let height = raw.height();
        let text = |name: &Option<String>| match name {
            Some(name) => self.text_column(raw, name),
            None => Ok(vec![String::new(); height]),
        };
        let values = self.text_column(raw, &columns.value)?;
        let (times, gids, extras) = (text(&columns.time)?, text(&columns.gid)?, text(&columns.extra)?);
        let mut rows = Vec::with_capacity(height);
        for (((value, time), gid), extra) in values.iter().zip(times).zip(gids).zip(extras) {
            rows.push(Row {
                value: self.parse_value(value)?,
                time,
                gid,
                extra,
            });
        }

        let tree = match (self.cumulative_spatial(), columns.extra.is_some()) {
            (true, false) => {
                if cumulative_temporal {
                    // last row wins
                    ValueTree::Scalar(rows.last().map_or(f64::NAN, |r| r.value))
                } else {
                    ValueTree::TimeSeries(rows.iter().map(|r| (r.time.clone(), r.value)).collect())
                }
            }
            (true, true) => {
                let mut keyed: BTreeMap<String, Vec<&Row>> = BTreeMap::new();
                for row in &rows {
                    keyed.entry(row.extra.clone()).or_default().push(row);
                }
                ValueTree::Keyed(
                    keyed
                        .into_iter()
                        .map(|(k, group)| (k, build_leaf(&group, cumulative_temporal)))
                        .collect(),
                )
            }
            (false, true) => {
                let mut grouped: BTreeMap<String, BTreeMap<String, Vec<&Row>>> = BTreeMap::new();
                for row in &rows {
                    grouped
                        .entry(row.gid.clone())
                        .or_default()
                        .entry(row.extra.clone())
                        .or_default()
                        .push(row);
                }
                let attribute = self.attribute_id().to_string();
                ValueTree::GeoKeyed(
                    grouped
                        .into_iter()
                        .map(|(gid, by_extra)| {
                            let leaves = by_extra
                                .into_iter()
                                .map(|(k, group)| (k, build_leaf(&group, cumulative_temporal)))
                                .collect();
                            (gid, BTreeMap::from([(attribute.clone(), leaves)]))
                        })
                        .collect(),
                )
            }
            (false, false) => {
                let mut grouped: BTreeMap<String, Vec<&Row>> = BTreeMap::new();
                for row in &rows {
                    grouped.entry(row.gid.clone()).or_default().push(row);
                }
                ValueTree::Geo(
                    grouped
                        .into_iter()
                        .map(|(gid, group)| (gid, build_leaf(&group, cumulative_temporal)))
                        .collect(),
                )
            }
        };
        Ok(tree)
    }

    fn classify(&self, raw: &DataFrame) -> ScenarioResult<Columns> {
        let headers = raw.get_column_names();
        let find = |name: &str| {
            headers
                .iter()
                .find(|h| h.trim() == name)
                .map(|h| h.to_string())
        };
        let value = find(VALUE_COLUMN).ok_or_else(|| ScenarioError::MissingColumn {
            path: self.path.clone(),
            column: VALUE_COLUMN.to_string(),
        })?;
        let extras: Vec<String> = headers
            .iter()
            .filter(|h| ![GID_COLUMN, VALUE_COLUMN, TIME_COLUMN].contains(&h.trim()))
            .map(|h| h.to_string())
            .collect();
        if extras.len() > 1 {
            return Err(ScenarioError::AmbiguousSchema {
                path: self.path.clone(),
                columns: extras,
            });
        }
        Ok(Columns {
            value,
            time: find(TIME_COLUMN),
            gid: find(GID_COLUMN),
            extra: extras.into_iter().next(),
        })
    }

    /// Trimmed cells of a text column; nulls become empty strings.
    fn text_column(&self, raw: &DataFrame, name: &str) -> ScenarioResult<Vec<String>> {
        let unreadable = |e: PolarsError| ScenarioError::DataFileUnreadable {
            path: self.path.clone(),
            message: e.to_string(),
        };
        let series = raw.column(name).map_err(unreadable)?;
        let cells = series
            .utf8()
            .map_err(unreadable)?
            .into_iter()
            .map(|cell| cell.unwrap_or_default().trim().to_string())
            .collect();
        Ok(cells)
    }

    fn parse_value(&self, raw: &str) -> ScenarioResult<f64> {
        raw.parse::<f64>()
            .map(round4)
            .map_err(|_| ScenarioError::DataFileUnreadable {
                path: self.path.clone(),
                message: format!("non-numeric value '{raw}'"),
            })
    }
}

struct Row {
    value: f64,
    time: String,
    gid: String,
    extra: String,
}

fn build_leaf(rows: &[&Row], cumulative_temporal: bool) -> Leaf {
    if cumulative_temporal {
        Leaf::Scalar(rows.last().map_or(f64::NAN, |r| r.value))
    } else {
        Leaf::TimeSeries(rows.iter().map(|r| (r.time.clone(), r.value)).collect())
    }
}

fn resolved_id<'a>(entry: &'a Option<ConfigEntry>, token: &'a str) -> &'a str {
    entry.as_ref().map_or(token, ConfigEntry::id)
}

/// Split a data filename into its four trimmed components.
pub fn split_filename(path: &Path) -> ScenarioResult<[String; 4]> {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let stem = match name.rfind('.') {
        Some(idx) if idx > 0 => &name[..idx],
        _ => name.as_str(),
    };
    let parts: Vec<&str> = stem.split('.').map(str::trim).collect();
    if parts.len() < 4 {
        return Err(ScenarioError::MalformedFilename {
            found: parts.len(),
            name,
        });
    }
    Ok([
        parts[0].to_string(),
        parts[1].to_string(),
        parts[2].to_string(),
        parts[3].to_string(),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{ConfigCatalog, ConfigEntry};
    use std::fs;
    use tempfile::{tempdir, TempDir};

    fn config_set(dir: &Path) -> ConfigSet {
        let catalog = |name: &str, entries: Vec<ConfigEntry>| {
            ConfigCatalog::from_entries(dir.join(name), entries)
        };
        ConfigSet {
            dataset_dir: dir.to_path_buf(),
            scenario_data_dir: dir.to_path_buf(),
            scenarios: catalog("scenarios.csv", vec![ConfigEntry::new([("id", "Mid"), ("label", "Mid Case")])]),
            attributes: catalog(
                "attributes.csv",
                vec![ConfigEntry::new([("id", "capacity"), ("label", "Capacity"), ("units", "GW")])],
            ),
            temporal_resolutions: catalog("temporal_resolutions.csv", vec![ConfigEntry::new([("id", "annual")])]),
            spatial_resolutions: catalog(
                "spatial_resolutions.csv",
                vec![
                    ConfigEntry::new([("id", "national")]),
                    ConfigEntry::new([("id", "states")]),
                ],
            ),
        }
    }

    fn read_file(name: &str, body: &str) -> (TempDir, ScenarioFile) {
        let dir = tempdir().unwrap();
        let path = dir.path().join(name);
        fs::write(&path, body).unwrap();
        let tokens = split_filename(&path).unwrap();
        let mut file = ScenarioFile::new(&config_set(dir.path()), path, tokens);
        file.read().unwrap();
        (dir, file)
    }

    #[test]
    fn splits_filename_components() {
        let tokens = split_filename(Path::new("/d/Mid. capacity .annual.national.csv")).unwrap();
        assert_eq!(tokens, ["Mid", "capacity", "annual", "national"].map(String::from));
        let err = split_filename(Path::new("Mid.capacity.csv")).unwrap_err();
        assert!(matches!(err, ScenarioError::MalformedFilename { found: 2, .. }));
    }

    #[test]
    fn unresolved_tokens_fall_back_to_raw_ids() {
        let dir = tempdir().unwrap();
        let tokens = ["Low", "capacity", "hourly", "counties"].map(String::from);
        let file = ScenarioFile::new(&config_set(dir.path()), dir.path().join("x"), tokens);
        assert!(file.scenario.is_none());
        assert_eq!(file.scenario_id(), "Low");
        assert_eq!(file.spatial_resolution_id(), "counties");
        // unknown spatial resolution is not cumulative
        assert!(!file.cumulative_spatial());
        // unknown temporal resolution is cumulative
        assert!(file.cumulative_temporal());
    }

    #[test]
    fn keyed_time_series_rounds_values() {
        let (_dir, file) = read_file(
            "Mid.capacity.annual.national.csv",
            "tech,time,value\nWind,2020,100.123456\nWind,2030,120\nCoal,2020,50\n",
        );
        let tree = file.get_data().unwrap();
        let ValueTree::Keyed(map) = &tree else {
            panic!("expected keyed tree, got {}", tree.shape_name());
        };
        assert_eq!(map.keys().collect::<Vec<_>>(), vec!["Coal", "Wind"]);
        assert_eq!(map["Wind"].at("2020"), Some(100.1235));
        assert_eq!(map["Wind"].at("2040"), None);
        // deterministic across calls
        assert_eq!(file.get_data().unwrap(), tree);
    }

    #[test]
    fn sub_national_nests_attribute_id() {
        let (_dir, file) = read_file(
            "Mid.capacity.annual.states.csv",
            "gid,tech,time,value\nCO,Wind,2020,3\nUT,Wind,2020,1\nCO,Coal,2020,2\n",
        );
        let ValueTree::GeoKeyed(map) = file.get_data().unwrap() else {
            panic!("expected geo-keyed tree");
        };
        assert_eq!(map["CO"]["capacity"]["Coal"].at("2020"), Some(2.0));
        assert_eq!(map["UT"]["capacity"]["Wind"].at("2020"), Some(1.0));
    }

    #[test]
    fn sub_national_without_extra_is_geo() {
        let (_dir, file) = read_file(
            "Mid.capacity.annual.states.csv",
            "gid,time,value\nCO,2020,3\nCO,2030,4\n",
        );
        let ValueTree::Geo(map) = file.get_data().unwrap() else {
            panic!("expected geo tree");
        };
        assert_eq!(map["CO"].times(), vec!["2020", "2030"]);
    }

    #[test]
    fn cumulative_file_is_scalar_last_row_wins() {
        let (_dir, file) = read_file("Mid.capacity.total.national.csv", "value\n1\n2.00004\n");
        assert_eq!(file.get_data().unwrap(), ValueTree::Scalar(2.0));
    }

    #[test]
    fn schema_errors() {
        let (_dir, file) = read_file(
            "Mid.capacity.annual.national.csv",
            "tech,region,time,value\nWind,a,2020,1\n",
        );
        assert!(matches!(
            file.get_data().unwrap_err(),
            ScenarioError::AmbiguousSchema { .. }
        ));

        let (_dir, file) = read_file("Mid.capacity.annual.states.csv", "tech,time,value\nWind,2020,1\n");
        assert!(matches!(
            file.get_data().unwrap_err(),
            ScenarioError::MissingColumn { .. }
        ));

        let (_dir, file) = read_file("Mid.capacity.annual.national.csv", "tech,time,value\nWind,2020,lots\n");
        assert!(matches!(
            file.get_data().unwrap_err(),
            ScenarioError::DataFileUnreadable { .. }
        ));
    }

    #[test]
    fn get_data_requires_read() {
        let dir = tempdir().unwrap();
        let tokens = ["Mid", "capacity", "annual", "national"].map(String::from);
        let file = ScenarioFile::new(&config_set(dir.path()), dir.path().join("x.csv"), tokens);
        assert!(matches!(file.get_data().unwrap_err(), ScenarioError::NotRead(_)));
    }

    #[test]
    fn attribute_label_includes_units() {
        let (_dir, file) = read_file("Mid.capacity.annual.national.csv", "tech,time,value\n");
        assert_eq!(file.attribute_label(), "Capacity (GW)");
        assert_eq!(file.scenario_label(), "Mid Case");
    }
}
