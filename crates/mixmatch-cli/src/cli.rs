use crate::common::OutputArgs;
use clap::{Args, CommandFactory, Parser, Subcommand, ValueHint};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "mixmatch", author, version, about, long_about = None)]
pub struct Cli {
    /// Set the logging level (overrides the config file)
    #[arg(long, global = true)]
    pub log_level: Option<tracing::Level>,

    /// Configuration file (defaults to ~/.mixmatch/config.toml)
    #[arg(long, global = true, value_hint = ValueHint::FilePath)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Explore scenario datasets
    Browse {
        #[command(subcommand)]
        command: BrowseCommands,
    },
    /// Scale a generation mix to a system and match its fleet against it
    Match(MatchArgs),
    /// Write the default generator-type distance matrix
    Gendists {
        /// Output CSV path
        #[arg(value_hint = ValueHint::FilePath)]
        out: PathBuf,
        #[command(flatten)]
        dataset: DatasetArgs,
        /// Generator types to leave out
        #[arg(long = "exclude", value_name = "GENTYPE")]
        exclusions: Vec<String>,
    },
}

/// Dataset selection shared by every command.
#[derive(Args, Debug, Clone, Default)]
pub struct DatasetArgs {
    /// Dataset name (under the configured datasets directory) or path
    #[arg(short, long)]
    pub dataset: Option<String>,
    /// Attribute ids combined into generation mixes (default `capacity,generation`)
    #[arg(long = "genmix-attribute", value_name = "ATTRIBUTE", value_delimiter = ',')]
    pub genmix_attributes: Vec<String>,
}

/// Scenario and geography selection.
#[derive(Args, Debug, Clone, Default)]
pub struct SelectionArgs {
    /// Scenario id or label
    #[arg(short, long)]
    pub scenario: Option<String>,
    /// Geographies to sum over (`national` or state ids)
    #[arg(short, long = "geography", value_name = "GEOGRAPHY")]
    pub geographies: Vec<String>,
}

#[derive(Subcommand, Debug)]
pub enum BrowseCommands {
    /// List datasets under the datasets directory
    Datasets {
        #[command(flatten)]
        output: OutputArgs,
    },
    /// List a dataset's generator types
    Gentypes {
        #[command(flatten)]
        dataset: DatasetArgs,
        #[command(flatten)]
        output: OutputArgs,
    },
    /// List a dataset's years
    Years {
        #[command(flatten)]
        dataset: DatasetArgs,
        #[command(flatten)]
        output: OutputArgs,
    },
    /// List a dataset's scenarios
    Scenarios {
        #[command(flatten)]
        dataset: DatasetArgs,
        #[command(flatten)]
        output: OutputArgs,
    },
    /// List a dataset's geographies
    Geographies {
        #[command(flatten)]
        dataset: DatasetArgs,
        #[command(flatten)]
        output: OutputArgs,
    },
    /// Show the generation mix of one scenario year
    Mixes {
        /// Scenario year
        year: String,
        #[command(flatten)]
        dataset: DatasetArgs,
        #[command(flatten)]
        selection: SelectionArgs,
        #[command(flatten)]
        output: OutputArgs,
    },
    /// Generation mixes of every year in long format
    Timeseries {
        #[command(flatten)]
        dataset: DatasetArgs,
        #[command(flatten)]
        selection: SelectionArgs,
        #[command(flatten)]
        output: OutputArgs,
    },
}

#[derive(Args, Debug)]
pub struct MatchArgs {
    /// Scenario year to match
    pub year: String,
    /// Node inventory CSV
    #[arg(value_hint = ValueHint::FilePath)]
    pub nodes: PathBuf,
    /// Current generators CSV
    #[arg(value_hint = ValueHint::FilePath)]
    pub generators: PathBuf,
    #[command(flatten)]
    pub dataset: DatasetArgs,
    #[command(flatten)]
    pub selection: SelectionArgs,
    /// Resource-dependent types carried as node ceiling columns
    /// (defaults to every trailing column of the node inventory)
    #[arg(long = "re-types", value_delimiter = ',')]
    pub re_types: Option<Vec<String>>,
    /// Generator types to leave out
    #[arg(long = "exclude", value_name = "GENTYPE")]
    pub exclusions: Vec<String>,
    /// Directory for result files
    #[arg(short, long, default_value = "mixmatch_results", value_hint = ValueHint::DirPath)]
    pub outdir: PathBuf,
    /// Generator-type distance CSV (defaults to the built-in matrix)
    #[arg(long, value_hint = ValueHint::FilePath)]
    pub gendists: Option<PathBuf>,
    /// Decimal digits desired capacities (MW) are rounded to
    #[arg(long)]
    pub precision: Option<i32>,
    /// Optimizer program (overrides the config file)
    #[arg(long)]
    pub solver: Option<String>,
}

pub fn build_cli_command() -> clap::Command {
    Cli::command()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn command_definition_is_consistent() {
        build_cli_command().debug_assert();
    }

    #[test]
    fn parses_match_arguments() {
        let cli = Cli::parse_from([
            "mixmatch",
            "match",
            "2030",
            "nodes.csv",
            "gens.csv",
            "-s",
            "Mid Case",
            "-g",
            "CO",
            "-g",
            "UT",
            "--re-types",
            "Land-based Wind,Utility PV",
            "--exclude",
            "Storage",
        ]);
        let Some(Commands::Match(args)) = cli.command else {
            panic!("expected match command");
        };
        assert_eq!(args.selection.scenario.as_deref(), Some("Mid Case"));
        assert_eq!(args.selection.geographies, vec!["CO", "UT"]);
        assert_eq!(
            args.re_types,
            Some(vec!["Land-based Wind".to_string(), "Utility PV".to_string()])
        );
        assert_eq!(args.exclusions, vec!["Storage"]);
        assert_eq!(args.outdir, PathBuf::from("mixmatch_results"));
    }
}
