//! Resolving dataset, scenario and geography selections against the config.

use crate::cli::{DatasetArgs, SelectionArgs};
use crate::config::MixmatchConfig;
use anyhow::{bail, Context, Result};
use mixmatch_scenarios::{discover_datasets, ScenarioDataset};
use std::path::PathBuf;
use tracing::debug;

/// Directory of the selected dataset.
///
/// `--dataset` (or the configured default) may be a path or a name under the
/// datasets directory. With neither, a lone dataset under the datasets
/// directory is picked.
pub fn resolve_dataset_dir(args: &DatasetArgs, config: &MixmatchConfig) -> Result<PathBuf> {
    let root = config.datasets_dir()?;
    let selected = args
        .dataset
        .as_deref()
        .or(config.data.default_dataset.as_deref());
    let Some(name) = selected else {
        let found = discover_datasets(&root)
            .with_context(|| format!("listing datasets under {}", root.display()))?;
        return match found.as_slice() {
            [only] => Ok(only.clone()),
            [] => bail!("no datasets found under {}", root.display()),
            _ => bail!(
                "{} datasets under {}; pick one with --dataset",
                found.len(),
                root.display()
            ),
        };
    };

    let direct = PathBuf::from(name);
    if direct.is_dir() {
        return Ok(direct);
    }
    let under_root = root.join(name);
    if under_root.is_dir() {
        return Ok(under_root);
    }
    bail!("dataset '{name}' not found (looked in {})", root.display())
}

pub fn open_dataset(args: &DatasetArgs, config: &MixmatchConfig) -> Result<ScenarioDataset> {
    let dir = resolve_dataset_dir(args, config)?;
    debug!(dataset = %dir.display(), "opening dataset");
    let dataset = ScenarioDataset::open(&dir)
        .with_context(|| format!("opening dataset {}", dir.display()))?;
    Ok(match resolve_genmix_attributes(args, config) {
        Some(attributes) => dataset.with_genmix_attributes(attributes),
        None => dataset,
    })
}

/// `--genmix-attribute` values, else the configured list. `None` keeps the
/// dataset default.
pub fn resolve_genmix_attributes(
    args: &DatasetArgs,
    config: &MixmatchConfig,
) -> Option<Vec<String>> {
    if args.genmix_attributes.is_empty() {
        config.data.genmix_attributes.clone()
    } else {
        Some(args.genmix_attributes.clone())
    }
}

/// `--scenario`, else the configured default for this dataset.
pub fn resolve_scenario(
    args: &SelectionArgs,
    dataset: &ScenarioDataset,
    config: &MixmatchConfig,
) -> Result<String> {
    if let Some(scenario) = &args.scenario {
        return Ok(scenario.clone());
    }
    match config.data.default_scenarios.get(dataset.name()) {
        Some(scenario) => Ok(scenario.clone()),
        None => bail!(
            "no scenario given for dataset '{}'; pass --scenario (one of: {})",
            dataset.name(),
            dataset.scenarios().join(", ")
        ),
    }
}

/// `--geography` values, else the configured default geography.
pub fn resolve_geographies(args: &SelectionArgs, config: &MixmatchConfig) -> Vec<String> {
    if args.geographies.is_empty() {
        vec![config.data.default_geography.clone()]
    } else {
        args.geographies.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn config_with_root(root: &std::path::Path) -> MixmatchConfig {
        let mut config = MixmatchConfig::default();
        config.data.datasets_dir = root.display().to_string();
        config
    }

    #[test]
    fn lone_dataset_is_picked() {
        let dir = tempfile::tempdir().unwrap();
        let ds = dir.path().join("Standard Scenarios");
        fs::create_dir_all(&ds).unwrap();
        fs::write(ds.join("scenarios.csv"), "id,label\n").unwrap();
        let config = config_with_root(dir.path());

        let found = resolve_dataset_dir(&DatasetArgs::default(), &config).unwrap();
        assert_eq!(found, ds);

        let named = DatasetArgs {
            dataset: Some("Standard Scenarios".into()),
            ..Default::default()
        };
        assert_eq!(resolve_dataset_dir(&named, &config).unwrap(), ds);
    }

    #[test]
    fn unknown_dataset_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_with_root(dir.path());
        let args = DatasetArgs {
            dataset: Some("missing".into()),
            ..Default::default()
        };
        let err = resolve_dataset_dir(&args, &config).unwrap_err();
        assert!(err.to_string().contains("dataset 'missing' not found"));
        assert!(resolve_dataset_dir(&DatasetArgs::default(), &config).is_err());
    }

    #[test]
    fn geographies_default_to_config() {
        let config = MixmatchConfig::default();
        assert_eq!(
            resolve_geographies(&SelectionArgs::default(), &config),
            vec!["national"]
        );
        let args = SelectionArgs {
            scenario: None,
            geographies: vec!["CO".into()],
        };
        assert_eq!(resolve_geographies(&args, &config), vec!["CO"]);
    }

    #[test]
    fn genmix_attributes_prefer_flag_over_config() {
        let mut config = MixmatchConfig::default();
        assert_eq!(resolve_genmix_attributes(&DatasetArgs::default(), &config), None);

        config.data.genmix_attributes = Some(vec!["capacity".into()]);
        assert_eq!(
            resolve_genmix_attributes(&DatasetArgs::default(), &config),
            Some(vec!["capacity".to_string()])
        );

        let args = DatasetArgs {
            genmix_attributes: vec!["generation".into()],
            ..Default::default()
        };
        assert_eq!(
            resolve_genmix_attributes(&args, &config),
            Some(vec!["generation".to_string()])
        );
    }
}
