use anyhow::{Context, Result};
use mixmatch_cli::common::{write_list, write_records, write_type_table};
use mixmatch_cli::config::MixmatchConfig;
use mixmatch_cli::dataset::{open_dataset, resolve_geographies, resolve_scenario};
use mixmatch_cli::BrowseCommands;
use mixmatch_scenarios::discover_datasets;
use serde::Serialize;

const TIMESERIES_COLUMNS: [&str; 7] = [
    "dataset",
    "scenario",
    "geography",
    "year",
    "gentype",
    "variable",
    "value",
];

#[derive(Serialize)]
struct ScenarioRow {
    id: String,
    label: String,
}

pub fn handle(command: &BrowseCommands, config: &MixmatchConfig) -> Result<()> {
    match command {
        BrowseCommands::Datasets { output } => {
            let root = config.datasets_dir()?;
            let names: Vec<String> = discover_datasets(&root)
                .with_context(|| format!("listing datasets under {}", root.display()))?
                .iter()
                .filter_map(|path| path.file_name())
                .map(|name| name.to_string_lossy().into_owned())
                .collect();
            write_list(&names, "dataset", output)
        }
        BrowseCommands::Gentypes { dataset, output } => {
            let dataset = open_dataset(dataset, config)?;
            write_list(&dataset.gentypes()?, "generator type", output)
        }
        BrowseCommands::Years { dataset, output } => {
            let dataset = open_dataset(dataset, config)?;
            write_list(&dataset.years()?, "year", output)
        }
        BrowseCommands::Scenarios { dataset, output } => {
            let dataset = open_dataset(dataset, config)?;
            let rows: Vec<ScenarioRow> = dataset
                .scenario_labels()
                .into_iter()
                .map(|(id, label)| ScenarioRow { id, label })
                .collect();
            write_records(&rows, &["id", "label"], output)
        }
        BrowseCommands::Geographies { dataset, output } => {
            let dataset = open_dataset(dataset, config)?;
            write_list(&dataset.geographies()?, "geography", output)
        }
        BrowseCommands::Mixes {
            year,
            dataset,
            selection,
            output,
        } => {
            let dataset = open_dataset(dataset, config)?;
            let scenario = resolve_scenario(selection, &dataset, config)?;
            let geographies = resolve_geographies(selection, config);
            let mix = dataset.get_genmix(year, &scenario, &geographies)?;
            write_type_table(&mix, "generator type", output)
        }
        BrowseCommands::Timeseries {
            dataset,
            selection,
            output,
        } => {
            let dataset = open_dataset(dataset, config)?;
            let scenario = resolve_scenario(selection, &dataset, config)?;
            let geographies = resolve_geographies(selection, config);
            let records = dataset.get_timeseries(&scenario, &geographies)?;
            write_records(&records, &TIMESERIES_COLUMNS, output)
        }
    }
}
