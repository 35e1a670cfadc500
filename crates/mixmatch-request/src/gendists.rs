//! Generator-type distance tables.
//!
//! A distance weights how costly it is for the optimizer to convert capacity
//! of type `g` into type `gg`. Distance CSVs have three columns (`g, gg,
//! Value`) read by position.

use crate::error::MatchResult;
use mixmatch_core::{is_resource_independent, CoreError};
use mixmatch_solver_common::TypeDistance;
use std::path::Path;
use tracing::debug;

pub const GENDISTS_COLUMNS: [&str; 3] = ["g", "gg", "Value"];

/// Distance 0 between any two resource-independent types and between a
/// resource-dependent type and itself; 1 for every other pair.
pub fn default_distance(g: &str, gg: &str) -> f64 {
    let both_indep = is_resource_independent(g) && is_resource_independent(gg);
    if both_indep || g == gg {
        0.0
    } else {
        1.0
    }
}

/// Full square distance matrix over `gentypes`, diagonal included.
pub fn default_gendists<S: AsRef<str>>(gentypes: &[S]) -> Vec<TypeDistance> {
    let mut dists = Vec::with_capacity(gentypes.len() * gentypes.len());
    for g in gentypes {
        for gg in gentypes {
            let (g, gg) = (g.as_ref(), gg.as_ref());
            dists.push(TypeDistance {
                g: g.to_string(),
                gg: gg.to_string(),
                value: default_distance(g, gg),
            });
        }
    }
    dists
}

/// Write the default matrix for `gentypes` to `path`.
pub fn drop_default_gendists<S: AsRef<str>>(path: &Path, gentypes: &[S]) -> MatchResult<()> {
    write_gendists(path, &default_gendists(gentypes))
}

pub fn write_gendists(path: &Path, dists: &[TypeDistance]) -> MatchResult<()> {
    let mut wtr = csv::WriterBuilder::new()
        .has_headers(false)
        .from_path(path)?;
    wtr.write_record(GENDISTS_COLUMNS)?;
    for dist in dists {
        wtr.serialize(dist)?;
    }
    wtr.flush()?;
    debug!(path = %path.display(), entries = dists.len(), "wrote type distances");
    Ok(())
}

/// Read a distance CSV; header names are ignored.
pub fn load_gendists(path: &Path) -> MatchResult<Vec<TypeDistance>> {
    let context = path.display().to_string();
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_path(path)?;
    let width = rdr.headers()?.len();
    if width < GENDISTS_COLUMNS.len() {
        return Err(CoreError::Schema {
            context,
            message: format!("expected columns {}, found {width}", GENDISTS_COLUMNS.join(", ")),
        }
        .into());
    }
    let mut dists = Vec::new();
    for record in rdr.records() {
        let record = record?;
        let raw = record.get(2).unwrap_or("");
        let value = raw.parse::<f64>().map_err(|_| CoreError::InvalidNumber {
            context: context.clone(),
            column: GENDISTS_COLUMNS[2].to_string(),
            value: raw.to_string(),
        })?;
        dists.push(TypeDistance {
            g: record.get(0).unwrap_or("").to_string(),
            gg: record.get(1).unwrap_or("").to_string(),
            value,
        });
    }
    Ok(dists)
}

/// Keep only entries whose both types are in `gentypes`.
pub fn filter_gendists<S: AsRef<str>>(dists: &[TypeDistance], gentypes: &[S]) -> Vec<TypeDistance> {
    let active = |t: &str| gentypes.iter().any(|g| g.as_ref() == t);
    dists
        .iter()
        .filter(|d| active(&d.g) && active(&d.gg))
        .cloned()
        .collect()
}
