use clap::Parser;
use mixmatch_cli::{Cli, Commands, MixmatchConfig};
use std::process::ExitCode;
use tracing::{error, info, warn};
use tracing_subscriber::FmtSubscriber;
mod commands;

fn run(cli: &Cli, config: &MixmatchConfig) -> anyhow::Result<()> {
    match &cli.command {
        Some(Commands::Browse { command }) => commands::browse::handle(command, config),
        Some(Commands::Match(args)) => commands::match_cmd::handle(args, config),
        Some(Commands::Gendists {
            out,
            dataset,
            exclusions,
        }) => commands::gendists::handle(out, dataset, exclusions, config),
        None => {
            info!("No subcommand provided. Use `mixmatch --help` for more information.");
            Ok(())
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let config = MixmatchConfig::load(cli.config.as_deref());

    let configured_level = config.as_ref().ok().map(MixmatchConfig::log_level);
    let level = cli
        .log_level
        .or_else(|| configured_level.as_ref().and_then(|l| l.as_ref().ok().copied()))
        .unwrap_or(tracing::Level::INFO);
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .finish();
    if let Err(err) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("setting default subscriber failed: {err}");
    }
    if let Some(Err(err)) = configured_level {
        warn!("{err}; using {level}");
    }

    match config.and_then(|config| run(&cli, &config)) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{err:#}");
            ExitCode::FAILURE
        }
    }
}
