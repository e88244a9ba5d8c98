pub mod toml_config;

use std::time::Duration;

#[cfg(feature = "cli")]
use crate::adapters::storage::LocalStorage;
#[cfg(feature = "cli")]
use crate::core::ConfigProvider;
#[cfg(feature = "cli")]
use crate::transform::duration::DurationMode;
#[cfg(feature = "cli")]
use crate::utils::error::Result;
#[cfg(feature = "cli")]
use crate::utils::logger::{LogFormat, LoggingConfig};
#[cfg(feature = "cli")]
use crate::utils::validation::{self, Validate};
#[cfg(feature = "cli")]
use clap::Parser;
#[cfg(feature = "cli")]
use serde::{Deserialize, Serialize};
#[cfg(feature = "cli")]
use std::path::PathBuf;

pub const DEFAULT_SOURCE_URL: &str = "https://bnlf-tests.s3.eu-central-1.amazonaws.com/recipes.json";
pub const DEFAULT_WORK_DIR: &str = ".";
pub const DEFAULT_INPUT_FILE: &str = "input/bi_recipes.json";
pub const DEFAULT_CHILIES_FILE: &str = "recipes-etl/Chilies.csv";
pub const DEFAULT_RESULTS_FILE: &str = "recipes-etl/Results.csv";

/// Upper bound accepted for a request timeout, in seconds.
pub const MAX_TIMEOUT_SECONDS: u64 = 3600;

pub(crate) fn timeout_from_secs(seconds: Option<u64>) -> Option<Duration> {
    seconds.map(Duration::from_secs)
}

/// Shared checks for the paths and limits every configuration source carries.
pub(crate) fn validate_common(
    url: &str,
    input_file: &str,
    chilies_file: &str,
    results_file: &str,
    timeout_seconds: Option<u64>,
) -> crate::utils::error::Result<()> {
    use crate::utils::validation as v;

    v::validate_url("source.url", url)?;
    v::validate_path("load.input_file", input_file)?;
    v::validate_path("load.chilies_file", chilies_file)?;
    v::validate_path("load.results_file", results_file)?;
    v::validate_distinct_paths(&[
        ("load.input_file", input_file),
        ("load.chilies_file", chilies_file),
        ("load.results_file", results_file),
    ])?;
    if let Some(timeout) = timeout_seconds {
        v::validate_range("source.timeout_seconds", timeout, 1, MAX_TIMEOUT_SECONDS)?;
    }
    Ok(())
}

#[cfg(feature = "cli")]
#[derive(Debug, Clone, Serialize, Deserialize, Parser)]
#[command(name = "recipes-etl")]
#[command(about = "Download the recipe feed and report on chili recipes")]
pub struct CliConfig {
    /// Newline-delimited JSON recipe feed
    #[arg(long, default_value = DEFAULT_SOURCE_URL)]
    pub url: String,

    /// Directory the file paths below are relative to
    #[arg(long, default_value = DEFAULT_WORK_DIR)]
    pub work_dir: String,

    /// Downloaded feed, repaired in place into a JSON array
    #[arg(long, default_value = DEFAULT_INPUT_FILE)]
    pub input_file: String,

    /// Detail report of chili recipes
    #[arg(long, default_value = DEFAULT_CHILIES_FILE)]
    pub chilies_file: String,

    /// Average total time per difficulty
    #[arg(long, default_value = DEFAULT_RESULTS_FILE)]
    pub results_file: String,

    /// Give up on the download after this many seconds
    #[arg(long)]
    pub timeout_seconds: Option<u64>,

    #[arg(long, value_enum, default_value_t = DurationMode::Positional)]
    pub duration_mode: DurationMode,

    #[arg(long, default_value = crate::utils::logger::DEFAULT_LOG_FILE)]
    pub log_file: String,

    /// Log to the console only
    #[arg(long)]
    pub no_log_file: bool,

    #[arg(long, default_value_t = crate::utils::logger::DEFAULT_LOG_MAX_BYTES)]
    pub log_max_bytes: u64,

    #[arg(long, default_value_t = crate::utils::logger::DEFAULT_LOG_BACKUPS)]
    pub log_backups: usize,

    #[arg(long, value_enum, default_value_t = LogFormat::Text)]
    pub log_format: LogFormat,

    #[arg(long, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, help = "Log CPU and memory usage after each phase")]
    pub monitor: bool,
}

#[cfg(feature = "cli")]
impl CliConfig {
    pub fn logging(&self) -> LoggingConfig {
        LoggingConfig {
            file: (!self.no_log_file).then(|| PathBuf::from(&self.log_file)),
            max_bytes: self.log_max_bytes,
            backups: self.log_backups,
            format: self.log_format,
            verbose: self.verbose,
        }
    }

    pub fn storage(&self) -> LocalStorage {
        LocalStorage::new(&self.work_dir)
    }
}

#[cfg(feature = "cli")]
impl ConfigProvider for CliConfig {
    fn source_url(&self) -> &str {
        &self.url
    }

    fn input_file(&self) -> &str {
        &self.input_file
    }

    fn chilies_file(&self) -> &str {
        &self.chilies_file
    }

    fn results_file(&self) -> &str {
        &self.results_file
    }

    fn request_timeout(&self) -> Option<Duration> {
        timeout_from_secs(self.timeout_seconds)
    }

    fn duration_mode(&self) -> DurationMode {
        self.duration_mode
    }
}

#[cfg(feature = "cli")]
impl Validate for CliConfig {
    fn validate(&self) -> Result<()> {
        validate_common(
            &self.url,
            &self.input_file,
            &self.chilies_file,
            &self.results_file,
            self.timeout_seconds,
        )?;
        validation::validate_path("work_dir", &self.work_dir)?;
        if !self.no_log_file {
            validation::validate_path("log_file", &self.log_file)?;
            validation::validate_positive_number("log_max_bytes", self.log_max_bytes, 1)?;
        }
        Ok(())
    }
}
