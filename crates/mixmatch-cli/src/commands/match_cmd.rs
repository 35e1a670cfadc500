use anyhow::{Context, Result};
use mixmatch_cli::config::{expand_home, MixmatchConfig};
use mixmatch_cli::dataset::{open_dataset, resolve_geographies, resolve_scenario};
use mixmatch_cli::MatchArgs;
use mixmatch_core::{read_generators, NodeTable};
use mixmatch_request::{load_gendists, FulfillOptions, MatchRequest};
use mixmatch_solver_common::CommandAdapter;
use std::path::PathBuf;
use tracing::info;

/// Working directory of the optimizer run, under the output directory.
const RUN_DIR: &str = "optimizer_run";

pub fn handle(args: &MatchArgs, config: &MixmatchConfig) -> Result<()> {
    let dataset = open_dataset(&args.dataset, config)?;
    let scenario = resolve_scenario(&args.selection, &dataset, config)?;
    let geographies = resolve_geographies(&args.selection, config);
    info!(
        dataset = dataset.name(),
        scenario = scenario.as_str(),
        year = args.year.as_str(),
        "matching generation mix"
    );

    let mix = dataset
        .get_genmix(&args.year, &scenario, &geographies)
        .context("loading the desired generation mix")?;
    let nodes = NodeTable::from_csv_path(&args.nodes, args.re_types.as_deref())
        .with_context(|| format!("reading nodes from {}", args.nodes.display()))?;
    let generators = read_generators(&args.generators)
        .with_context(|| format!("reading generators from {}", args.generators.display()))?;
    let mut request =
        MatchRequest::new(nodes, generators, &dataset, mix, args.exclusions.clone())?;

    let gendists_path: Option<PathBuf> = match &args.gendists {
        Some(path) => Some(path.clone()),
        None => config
            .matching
            .gendists
            .as_deref()
            .map(expand_home)
            .transpose()?,
    };
    let gendists = gendists_path
        .map(|path| {
            load_gendists(&path).with_context(|| format!("reading distances from {}", path.display()))
        })
        .transpose()?;

    let program = args
        .solver
        .clone()
        .unwrap_or_else(|| config.solver.program.clone());
    let mut adapter = CommandAdapter::new(program)
        .with_args(config.solver.args.iter().cloned())
        .with_search_dir(config.search_dir()?);
    if let Some(model) = &config.solver.model_file {
        adapter = adapter.with_model_file(expand_home(model)?);
    }

    let options = FulfillOptions {
        workdir: args.outdir.join(RUN_DIR),
        gendists,
        precision: args.precision.unwrap_or(config.matching.precision),
    };
    let summary = request
        .fulfill(&adapter, &options)
        .context("matching the generator fleet")?;
    println!("{summary}");

    request
        .save_results(&args.outdir)
        .with_context(|| format!("saving results to {}", args.outdir.display()))?;
    info!("Results written to {}", args.outdir.display());
    Ok(())
}
