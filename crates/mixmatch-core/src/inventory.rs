//! Node and generator inventories of the target system.
//!
//! Both tables are read positionally: whatever headers the caller's CSV
//! carries, the leading columns are interpreted with the fixed schemas below.
//! Node files carry one trailing column per renewable type giving the maximum
//! capacity (MW) allowed at that node.

use crate::error::{CoreError, CoreResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;

/// Leading node columns; renewable maximum-capacity columns follow.
pub const NODE_BASE_COLUMNS: [&str; 5] = [
    "node_id",
    "latitude",
    "longitude",
    "peak load (MW)",
    "annual load (GWh)",
];

pub const GENERATOR_COLUMNS: [&str; 3] = ["node_id", "generator type", "capacity (MW)"];

pub const SWAP_COLUMNS: [&str; 4] = [
    "node_id",
    "from generator type",
    "to generator type",
    "capacity (MW)",
];

/// Sum that ignores `NaN` entries.
fn nan_sum<I: IntoIterator<Item = f64>>(values: I) -> f64 {
    values.into_iter().filter(|v| !v.is_nan()).sum()
}

/// Full node header for the given renewable types.
pub fn nodes_columns<S: AsRef<str>>(re_types: &[S]) -> Vec<String> {
    NODE_BASE_COLUMNS
        .iter()
        .map(|c| c.to_string())
        .chain(re_types.iter().map(|t| t.as_ref().to_string()))
        .collect()
}

#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub node_id: String,
    pub latitude: f64,
    pub longitude: f64,
    pub peak_load_mw: f64,
    pub annual_load_gwh: f64,
    /// Maximum allowed capacity (MW) per renewable type.
    pub max_capacity: BTreeMap<String, f64>,
}

/// Node inventory plus the ordered list of renewable types it constrains.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NodeTable {
    re_types: Vec<String>,
    nodes: Vec<Node>,
}

impl NodeTable {
    pub fn new(re_types: Vec<String>, nodes: Vec<Node>) -> CoreResult<Self> {
        for node in &nodes {
            if let Some(extra) = node.max_capacity.keys().find(|k| !re_types.contains(k)) {
                return Err(CoreError::schema(
                    format!("node '{}'", node.node_id),
                    format!("maximum capacity given for undeclared type '{extra}'"),
                ));
            }
        }
        Ok(Self { re_types, nodes })
    }

    /// Load nodes from a CSV file. `re_types` renames the trailing columns;
    /// when `None` the file's own header names are used.
    pub fn from_csv_path(path: &Path, re_types: Option<&[String]>) -> CoreResult<Self> {
        let file = File::open(path)?;
        Self::from_reader(file, re_types, &path.display().to_string())
    }

    pub fn from_reader<R: Read>(
        reader: R,
        re_types: Option<&[String]>,
        context: &str,
    ) -> CoreResult<Self> {
        let mut rdr = csv::ReaderBuilder::new()
            .has_headers(true)
            .trim(csv::Trim::All)
            .from_reader(reader);
        let headers = rdr.headers()?.clone();
        if headers.len() < NODE_BASE_COLUMNS.len() {
            return Err(CoreError::schema(
                context,
                format!(
                    "expected at least {} columns ({}), found {}",
                    NODE_BASE_COLUMNS.len(),
                    NODE_BASE_COLUMNS.join(", "),
                    headers.len()
                ),
            ));
        }
        let trailing: Vec<String> = headers
            .iter()
            .skip(NODE_BASE_COLUMNS.len())
            .map(str::to_string)
            .collect();
        let re_types = match re_types {
            Some(types) if types.len() != trailing.len() => {
                return Err(CoreError::schema(
                    context,
                    format!(
                        "{} renewable types given but the file has {} trailing columns",
                        types.len(),
                        trailing.len()
                    ),
                ));
            }
            Some(types) => types.to_vec(),
            None => trailing,
        };

        let mut nodes = Vec::new();
        for record in rdr.records() {
            let record = record?;
            let field = |idx: usize| record.get(idx).unwrap_or("");
            let number = |idx: usize, column: &str| parse_number(field(idx), column, context);
            let mut max_capacity = BTreeMap::new();
            for (offset, gentype) in re_types.iter().enumerate() {
                let value = number(NODE_BASE_COLUMNS.len() + offset, gentype)?;
                // an empty ceiling means nothing of that type may be placed there
                max_capacity.insert(gentype.clone(), if value.is_nan() { 0.0 } else { value });
            }
            nodes.push(Node {
                node_id: field(0).to_string(),
                latitude: number(1, NODE_BASE_COLUMNS[1])?,
                longitude: number(2, NODE_BASE_COLUMNS[2])?,
                peak_load_mw: number(3, NODE_BASE_COLUMNS[3])?,
                annual_load_gwh: number(4, NODE_BASE_COLUMNS[4])?,
                max_capacity,
            });
        }
        Ok(Self { re_types, nodes })
    }

    pub fn re_types(&self) -> &[String] {
        &self.re_types
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn node_ids(&self) -> impl Iterator<Item = &str> + '_ {
        self.nodes.iter().map(|n| n.node_id.as_str())
    }

    /// Whether the inventory carries a per-node ceiling column for `gentype`.
    pub fn has_column(&self, gentype: &str) -> bool {
        self.re_types.iter().any(|t| t == gentype)
    }

    /// Sum of the per-node ceilings for `gentype`, if the column exists.
    pub fn column_sum(&self, gentype: &str) -> Option<f64> {
        if !self.has_column(gentype) {
            return None;
        }
        Some(nan_sum(
            self.nodes
                .iter()
                .map(|n| n.max_capacity.get(gentype).copied().unwrap_or(0.0)),
        ))
    }

    /// Total annual load in GWh (missing values skipped).
    pub fn total_annual_load_gwh(&self) -> f64 {
        nan_sum(self.nodes.iter().map(|n| n.annual_load_gwh))
    }

    /// Write `node_id, latitude, longitude` for every node.
    pub fn write_locations_csv(&self, path: &Path) -> CoreResult<()> {
        let mut wtr = csv::Writer::from_path(path)?;
        wtr.write_record(&NODE_BASE_COLUMNS[..3])?;
        for node in &self.nodes {
            wtr.write_record([
                node.node_id.clone(),
                node.latitude.to_string(),
                node.longitude.to_string(),
            ])?;
        }
        wtr.flush()?;
        Ok(())
    }
}

fn parse_number(raw: &str, column: &str, context: &str) -> CoreResult<f64> {
    if raw.is_empty() {
        return Ok(f64::NAN);
    }
    raw.parse::<f64>().map_err(|_| CoreError::InvalidNumber {
        context: context.to_string(),
        column: column.to_string(),
        value: raw.to_string(),
    })
}

/// One unit (or aggregate) of generating capacity at a node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Generator {
    #[serde(rename = "node_id")]
    pub node_id: String,
    #[serde(rename = "generator type")]
    pub generator_type: String,
    #[serde(rename = "capacity (MW)")]
    pub capacity_mw: f64,
}

impl Generator {
    pub fn new(node_id: impl Into<String>, generator_type: impl Into<String>, capacity_mw: f64) -> Self {
        Self {
            node_id: node_id.into(),
            generator_type: generator_type.into(),
            capacity_mw,
        }
    }
}

/// Capacity converted from one generator type to another at a node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SwappedGenerator {
    #[serde(rename = "node_id")]
    pub node_id: String,
    #[serde(rename = "from generator type")]
    pub from_type: String,
    #[serde(rename = "to generator type")]
    pub to_type: String,
    #[serde(rename = "capacity (MW)")]
    pub capacity_mw: f64,
}

pub fn read_generators(path: &Path) -> CoreResult<Vec<Generator>> {
    read_positional(File::open(path)?, GENERATOR_COLUMNS.len(), &path.display().to_string())
}

pub fn read_generators_from_reader<R: Read>(reader: R, context: &str) -> CoreResult<Vec<Generator>> {
    read_positional(reader, GENERATOR_COLUMNS.len(), context)
}

pub fn read_swaps(path: &Path) -> CoreResult<Vec<SwappedGenerator>> {
    read_positional(File::open(path)?, SWAP_COLUMNS.len(), &path.display().to_string())
}

/// Deserialize rows by position, ignoring the file's own header names.
fn read_positional<T, R>(reader: R, width: usize, context: &str) -> CoreResult<Vec<T>>
where
    T: for<'de> Deserialize<'de>,
    R: Read,
{
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(reader);
    let found = rdr.headers()?.len();
    if found < width {
        return Err(CoreError::schema(
            context,
            format!("expected {width} columns, found {found}"),
        ));
    }
    let mut rows = Vec::new();
    for record in rdr.records() {
        let record = record?;
        let trimmed: csv::StringRecord = record.iter().take(width).collect();
        rows.push(trimmed.deserialize(None)?);
    }
    Ok(rows)
}

pub fn write_generators(path: &Path, generators: &[Generator]) -> CoreResult<()> {
    write_rows(File::create(path)?, &GENERATOR_COLUMNS, generators)
}

pub fn write_swaps(path: &Path, swaps: &[SwappedGenerator]) -> CoreResult<()> {
    write_rows(File::create(path)?, &SWAP_COLUMNS, swaps)
}

/// Header is written explicitly so empty tables still carry their schema.
fn write_rows<W: Write, T: Serialize>(writer: W, header: &[&str], rows: &[T]) -> CoreResult<()> {
    let mut wtr = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(writer);
    wtr.write_record(header)?;
    for row in rows {
        wtr.serialize(row)?;
    }
    wtr.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    const NODES: &str = "\
id,lat,lon,peak,load,Land-based Wind,Utility PV
1,39.7,-105.2,100,400,250,
2,40.1,-104.9,50,100,50,75
";

    #[test]
    fn reads_nodes_with_header_types() {
        let table = NodeTable::from_reader(NODES.as_bytes(), None, "nodes").unwrap();
        assert_eq!(table.re_types(), &["Land-based Wind", "Utility PV"]);
        assert_eq!(table.nodes().len(), 2);
        assert_eq!(table.total_annual_load_gwh(), 500.0);
        assert_eq!(table.column_sum("Land-based Wind"), Some(300.0));
        // empty ceiling counts as zero
        assert_eq!(table.column_sum("Utility PV"), Some(75.0));
        assert_eq!(table.column_sum("Coal"), None);
    }

    #[test]
    fn renames_trailing_columns() {
        let types = vec!["Wind".to_string(), "PV".to_string()];
        let table = NodeTable::from_reader(NODES.as_bytes(), Some(&types), "nodes").unwrap();
        assert!(table.has_column("Wind"));
        assert!(!table.has_column("Land-based Wind"));
    }

    #[test]
    fn rejects_mismatched_type_count() {
        let types = vec!["Wind".to_string()];
        let err = NodeTable::from_reader(NODES.as_bytes(), Some(&types), "nodes").unwrap_err();
        assert!(matches!(err, CoreError::Schema { .. }));
    }

    #[test]
    fn rejects_bad_numbers() {
        let data = "node_id,latitude,longitude,peak load (MW),annual load (GWh)\n1,a,0,0,0\n";
        let err = NodeTable::from_reader(data.as_bytes(), None, "nodes").unwrap_err();
        assert!(matches!(err, CoreError::InvalidNumber { .. }));
    }

    #[test]
    fn generators_are_read_positionally() {
        let data = "bus,kind,mw\n1,Coal,300\n2,Land-based Wind,120.5\n";
        let gens = read_generators_from_reader(data.as_bytes(), "gens").unwrap();
        assert_eq!(gens.len(), 2);
        assert_eq!(gens[1], Generator::new("2", "Land-based Wind", 120.5));
    }

    #[test]
    fn empty_tables_keep_their_header() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("swaps.csv");
        write_swaps(&path, &[]).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        assert_eq!(text.trim(), SWAP_COLUMNS.join(","));
        assert!(read_swaps(&path).unwrap().is_empty());
    }

    #[test]
    fn generators_round_trip_through_csv() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("gens.csv");
        let gens = vec![Generator::new("7", "NG-CC", 42.0)];
        write_generators(&path, &gens).unwrap();
        assert_eq!(read_generators(&path).unwrap(), gens);
    }
}
