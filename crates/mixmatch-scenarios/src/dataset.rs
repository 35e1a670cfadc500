//! Whole-dataset queries: generator types, years, scenarios, geographies and
//! generation mixes.

use crate::catalog::{ConfigSet, DEFAULT_SCENARIO_DATA_DIRNAME};
use crate::error::{ScenarioError, ScenarioResult};
use crate::index::{parse_dataset, ScenarioGroup};
use crate::record::{Leaf, ScenarioFile, ValueTree, NATIONAL};
use mixmatch_core::TypeTable;
use serde::Serialize;
use std::cell::RefCell;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fs;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use tracing::{debug, info};

/// Attribute id whose national file defines the generator types and years.
pub const CAPACITY: &str = "capacity";
pub const GENERATION: &str = "generation";
/// Spatial resolution id of the sub-national files used for state sums.
pub const STATES: &str = "states";

/// Attributes combined into a generation mix unless configured otherwise.
pub const DEFAULT_GENMIX_ATTRIBUTES: [&str; 2] = [CAPACITY, GENERATION];

type CacheKey = (String, String, String);

/// One row of [`ScenarioDataset::get_timeseries`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimeseriesRecord {
    pub dataset: String,
    pub scenario: String,
    pub geography: String,
    pub year: String,
    pub gentype: String,
    pub variable: String,
    pub value: f64,
}

/// A parsed scenario dataset with every data file read into memory.
///
/// Value trees are memoized per `(scenario, attribute, spatial resolution)`
/// for the dataset's lifetime. The cache uses interior mutability and is not
/// shared across threads.
#[derive(Debug)]
pub struct ScenarioDataset {
    name: String,
    config: ConfigSet,
    groups: Vec<ScenarioGroup>,
    genmix_attributes: Vec<String>,
    cache: RefCell<HashMap<CacheKey, Rc<ValueTree>>>,
}

impl ScenarioDataset {
    pub fn open(dataset_dir: &Path) -> ScenarioResult<Self> {
        Self::open_with(dataset_dir, DEFAULT_SCENARIO_DATA_DIRNAME)
    }

    pub fn open_with(dataset_dir: &Path, scenario_data_dirname: &str) -> ScenarioResult<Self> {
        let (config, mut groups) = parse_dataset(dataset_dir, scenario_data_dirname)?;
        for file in groups.iter_mut().flat_map(|g| g.files.iter_mut()) {
            file.read()?;
        }
        let name = dataset_dir
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| dataset_dir.display().to_string());
        info!(dataset = %name, scenarios = groups.len(), "opened scenario dataset");
        Ok(Self {
            name,
            config,
            groups,
            genmix_attributes: DEFAULT_GENMIX_ATTRIBUTES.map(String::from).to_vec(),
            cache: RefCell::new(HashMap::new()),
        })
    }

    /// Replace the attribute ids combined by [`Self::get_genmix`].
    pub fn with_genmix_attributes<I, S>(mut self, attributes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.genmix_attributes = attributes.into_iter().map(Into::into).collect();
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn config(&self) -> &ConfigSet {
        &self.config
    }

    pub fn groups(&self) -> &[ScenarioGroup] {
        &self.groups
    }

    pub fn genmix_attributes(&self) -> &[String] {
        &self.genmix_attributes
    }

    /// Memoized value tree of `file`.
    pub fn data(&self, file: &ScenarioFile) -> ScenarioResult<Rc<ValueTree>> {
        let key = (
            file.scenario_id().to_string(),
            file.attribute_id().to_string(),
            file.spatial_resolution_id().to_string(),
        );
        if let Some(tree) = self.cache.borrow().get(&key) {
            return Ok(Rc::clone(tree));
        }
        let tree = Rc::new(file.get_data()?);
        debug!(
            scenario = %key.0,
            attribute = %key.1,
            spatial = %key.2,
            shape = tree.shape_name(),
            "cached value tree"
        );
        self.cache.borrow_mut().insert(key, Rc::clone(&tree));
        Ok(tree)
    }

    fn files_with<'a>(
        &'a self,
        attribute: &'a str,
        spatial: &'a str,
    ) -> impl Iterator<Item = &'a ScenarioFile> + 'a {
        self.groups
            .iter()
            .flat_map(|g| g.iter())
            .filter(move |f| f.attribute_id() == attribute && f.spatial_resolution_id() == spatial)
    }

    /// Sorted, duplicate-free generator types of the national capacity files.
    pub fn gentypes(&self) -> ScenarioResult<Vec<String>> {
        let mut gentypes = BTreeSet::new();
        for file in self.files_with(CAPACITY, NATIONAL) {
            let tree = self.data(file)?;
            gentypes.extend(keyed(&tree, file)?.keys().cloned());
        }
        Ok(gentypes.into_iter().collect())
    }

    /// Years of the first national capacity file. All files are assumed to
    /// share one time axis.
    pub fn years(&self) -> ScenarioResult<Vec<String>> {
        let Some(file) = self.files_with(CAPACITY, NATIONAL).next() else {
            return Ok(Vec::new());
        };
        let tree = self.data(file)?;
        Ok(keyed(&tree, file)?
            .values()
            .next()
            .map(|leaf| leaf.times())
            .unwrap_or_default())
    }

    /// Scenario ids, one per group, in group order.
    pub fn scenarios(&self) -> Vec<String> {
        self.groups
            .iter()
            .map(|g| g.scenario_id().to_string())
            .collect()
    }

    /// `(id, label)` pairs for display.
    pub fn scenario_labels(&self) -> Vec<(String, String)> {
        self.groups
            .iter()
            .map(|g| (g.scenario_id().to_string(), g.scenario_label().to_string()))
            .collect()
    }

    /// `national` followed by the state ids of the first state capacity file.
    pub fn geographies(&self) -> ScenarioResult<Vec<String>> {
        let mut result = vec![NATIONAL.to_string()];
        if let Some(file) = self.files_with(CAPACITY, STATES).next() {
            result.extend(self.data(file)?.keys());
        }
        Ok(result)
    }

    /// Generation mix of `scenario` (id or label) in `year`, one row per
    /// generator type, one column per genmix attribute plus its fraction
    /// column, and a `TOTAL` row.
    ///
    /// When `geographies` contains `national` the national files are used;
    /// otherwise the listed states are summed.
    pub fn get_genmix<S: AsRef<str>>(
        &self,
        year: &str,
        scenario: &str,
        geographies: &[S],
    ) -> ScenarioResult<TypeTable> {
        let geographies: Vec<&str> = geographies.iter().map(AsRef::as_ref).collect();
        let national = geographies.contains(&NATIONAL);
        let unavailable = || ScenarioError::NoGenerationMixAvailable {
            year: year.to_string(),
            scenario: scenario.to_string(),
            geographies: geographies.iter().map(|g| g.to_string()).collect(),
        };

        let mut table = TypeTable::new(Vec::<String>::new())?;
        let mut labels: Vec<String> = Vec::new();
        for group in self.groups.iter().filter(|g| g.matches(scenario)) {
            for file in group.iter() {
                if !self.genmix_attributes.iter().any(|a| a == file.attribute_id()) {
                    continue;
                }
                let label = file.attribute_label();
                let column = match file.spatial_resolution_id() {
                    NATIONAL if national => self.national_values(file, year, &label)?,
                    STATES if !national && !geographies.is_empty() => {
                        self.state_values(file, year, &geographies, &label)?
                    }
                    _ => continue,
                };
                let Some(column) = column else {
                    return Err(unavailable());
                };
                table = table.outer_merge(&column)?;
                labels.push(label);
            }
        }
        if labels.is_empty() {
            return Err(unavailable());
        }

        for label in &labels {
            table.push_share(label, &fraction_label(label))?;
        }
        table.push_total()?;
        debug!(year, scenario, rows = table.len(), "assembled generation mix");
        Ok(table)
    }

    /// Per-type column of a national keyed file, `None` when `year` is missing.
    fn national_values(
        &self,
        file: &ScenarioFile,
        year: &str,
        label: &str,
    ) -> ScenarioResult<Option<TypeTable>> {
        let tree = self.data(file)?;
        let mut entries = Vec::new();
        for (gentype, leaf) in keyed(&tree, file)? {
            let Some(v) = leaf.at(year) else {
                return Ok(None);
            };
            entries.push((gentype.clone(), v));
        }
        Ok(Some(TypeTable::pivot_sum(label, entries)?))
    }

    /// Per-type sums over `states`; a type missing in one state counts as 0.
    fn state_values(
        &self,
        file: &ScenarioFile,
        year: &str,
        states: &[&str],
        label: &str,
    ) -> ScenarioResult<Option<TypeTable>> {
        let tree = self.data(file)?;
        let ValueTree::GeoKeyed(by_state) = tree.as_ref() else {
            return Err(ScenarioError::UnexpectedShape {
                path: file.path.clone(),
                expected: format!("per-state generator types, found {}", tree.shape_name()),
            });
        };
        let mut entries = Vec::new();
        for state in states {
            let by_attribute = by_state
                .get(*state)
                .ok_or_else(|| ScenarioError::UnknownGeography {
                    path: file.path.clone(),
                    geography: state.to_string(),
                })?;
            let Some(by_type) = by_attribute.values().next() else {
                continue;
            };
            for (gentype, leaf) in by_type {
                let Some(v) = leaf.at(year) else {
                    return Ok(None);
                };
                entries.push((gentype.clone(), v));
            }
        }
        Ok(Some(TypeTable::pivot_sum(label, entries)?))
    }

    /// Long-format generation mixes for every year of the dataset. The
    /// geography field is the comma-joined list of requested ids.
    pub fn get_timeseries<S: AsRef<str>>(
        &self,
        scenario: &str,
        geographies: &[S],
    ) -> ScenarioResult<Vec<TimeseriesRecord>> {
        let geography = geographies
            .iter()
            .map(AsRef::as_ref)
            .collect::<Vec<_>>()
            .join(",");
        let mut records = Vec::new();
        for year in self.years()? {
            let mix = self.get_genmix(&year, scenario, geographies)?;
            let columns = mix.columns();
            let mut rows = mix.rows();
            if let Some(total) = mix.total() {
                rows.push((mixmatch_core::TOTAL_ROW.to_string(), total.to_vec()));
            }
            for (gentype, values) in rows {
                for (variable, value) in columns.iter().zip(values) {
                    records.push(TimeseriesRecord {
                        dataset: self.name.clone(),
                        scenario: scenario.to_string(),
                        geography: geography.clone(),
                        year: year.clone(),
                        gentype: gentype.clone(),
                        variable: variable.clone(),
                        value,
                    });
                }
            }
        }
        Ok(records)
    }
}

/// `"Capacity (GW)"` becomes `"Capacity Fraction"`.
pub fn fraction_label(column: &str) -> String {
    let first = column.split(' ').next().unwrap_or(column);
    format!("{first} Fraction")
}

fn keyed<'a>(
    tree: &'a ValueTree,
    file: &ScenarioFile,
) -> ScenarioResult<&'a BTreeMap<String, Leaf>> {
    match tree {
        ValueTree::Keyed(map) => Ok(map),
        other => Err(ScenarioError::UnexpectedShape {
            path: file.path.clone(),
            expected: format!("generator types keyed nationally, found {}", other.shape_name()),
        }),
    }
}

/// Dataset directories (those holding a `scenarios.csv`) directly under `root`,
/// sorted by name.
pub fn discover_datasets(root: &Path) -> ScenarioResult<Vec<PathBuf>> {
    let mut found = Vec::new();
    for entry in fs::read_dir(root)? {
        let path = entry?.path();
        if path.is_dir() && path.join("scenarios.csv").is_file() {
            found.push(path);
        }
    }
    found.sort();
    Ok(found)
}
