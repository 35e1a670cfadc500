//! Configuration for the mixmatch CLI.
//! Loaded from `--config <path>` or ~/.mixmatch/config.toml.

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct MixmatchConfig {
    /// Dataset locations and default selections
    #[serde(default)]
    pub data: DataConfig,
    /// Optimizer program
    #[serde(default)]
    pub solver: SolverConfig,
    /// Matching options
    #[serde(default)]
    pub matching: MatchingConfig,
    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DataConfig {
    /// Directory holding one subdirectory per dataset
    #[serde(default = "default_datasets_dir")]
    pub datasets_dir: String,
    /// Dataset used when `--dataset` is not given
    #[serde(default)]
    pub default_dataset: Option<String>,
    /// Scenario used per dataset when `--scenario` is not given
    #[serde(default)]
    pub default_scenarios: BTreeMap<String, String>,
    /// Geography used when `--geography` is not given
    #[serde(default = "default_geography")]
    pub default_geography: String,
    /// Attribute ids combined into generation mixes; the dataset default when unset
    #[serde(default)]
    pub genmix_attributes: Option<Vec<String>>,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            datasets_dir: default_datasets_dir(),
            default_dataset: None,
            default_scenarios: BTreeMap::new(),
            default_geography: default_geography(),
            genmix_attributes: None,
        }
    }
}

fn default_datasets_dir() -> String {
    "~/.mixmatch/datasets".to_string()
}

fn default_geography() -> String {
    "national".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SolverConfig {
    /// Optimizer executable, looked up on PATH when not a path
    #[serde(default = "default_program")]
    pub program: String,
    /// Extra arguments passed after the model file
    #[serde(default)]
    pub args: Vec<String>,
    /// Model copied into the working directory and passed as first argument
    #[serde(default)]
    pub model_file: Option<String>,
    /// Directory searched for the optimizer before PATH
    #[serde(default = "default_search_dir")]
    pub search_dir: String,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            program: default_program(),
            args: Vec::new(),
            model_file: None,
            search_dir: default_search_dir(),
        }
    }
}

fn default_program() -> String {
    "gams".to_string()
}

fn default_search_dir() -> String {
    "~/.mixmatch/solvers".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct MatchingConfig {
    /// Decimal digits desired capacities (MW) are rounded to
    #[serde(default)]
    pub precision: i32,
    /// Generator-type distance CSV
    #[serde(default)]
    pub gendists: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LoggingConfig {
    /// Log level: trace, debug, info, warn, error
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

impl MixmatchConfig {
    /// Load from `path`, or from the default location. A missing default
    /// file yields the defaults; a missing explicit file is an error.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = match path {
            Some(path) => path.to_path_buf(),
            None => {
                let path = config_path()?;
                if !path.exists() {
                    return Ok(Self::default());
                }
                path
            }
        };
        let contents = std::fs::read_to_string(&path)
            .with_context(|| format!("reading config {}", path.display()))?;
        toml::from_str(&contents).with_context(|| format!("parsing config {}", path.display()))
    }

    pub fn datasets_dir(&self) -> Result<PathBuf> {
        expand_home(&self.data.datasets_dir)
    }

    pub fn search_dir(&self) -> Result<PathBuf> {
        expand_home(&self.solver.search_dir)
    }

    pub fn log_level(&self) -> Result<tracing::Level> {
        self.logging
            .level
            .parse()
            .map_err(|_| anyhow!("invalid log level '{}' in config", self.logging.level))
    }
}

/// Get the mixmatch home directory (defaults to ~/.mixmatch)
pub fn mixmatch_home() -> Result<PathBuf> {
    dirs::home_dir()
        .ok_or_else(|| anyhow!("Cannot determine home directory"))
        .map(|h| h.join(".mixmatch"))
}

/// Location: ~/.mixmatch/config.toml
pub fn config_path() -> Result<PathBuf> {
    Ok(mixmatch_home()?.join("config.toml"))
}

/// Replace a leading `~` with the home directory.
pub fn expand_home(path: &str) -> Result<PathBuf> {
    match path.strip_prefix('~') {
        Some(rest) => {
            let home = dirs::home_dir().ok_or_else(|| anyhow!("Cannot determine home directory"))?;
            Ok(home.join(rest.trim_start_matches('/')))
        }
        None => Ok(PathBuf::from(path)),
    }
}
