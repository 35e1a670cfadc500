pub mod cli;
pub mod common;
pub mod config;
pub mod dataset;

pub use cli::{build_cli_command, BrowseCommands, Cli, Commands, DatasetArgs, MatchArgs, SelectionArgs};
pub use config::MixmatchConfig;
