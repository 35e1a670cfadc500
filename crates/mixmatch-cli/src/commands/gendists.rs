use anyhow::{Context, Result};
use mixmatch_cli::{config::MixmatchConfig, dataset::open_dataset, DatasetArgs};
use mixmatch_request::drop_default_gendists;
use std::path::Path;
use tracing::info;

pub fn handle(
    out: &Path,
    dataset: &DatasetArgs,
    exclusions: &[String],
    config: &MixmatchConfig,
) -> Result<()> {
    let dataset = open_dataset(dataset, config)?;
    let gentypes: Vec<String> = dataset
        .gentypes()?
        .into_iter()
        .filter(|g| !exclusions.contains(g))
        .collect();
    drop_default_gendists(out, &gentypes)
        .with_context(|| format!("writing distances to {}", out.display()))?;
    info!(
        dataset = dataset.name(),
        gentypes = gentypes.len(),
        "default distances written to {}",
        out.display()
    );
    Ok(())
}
