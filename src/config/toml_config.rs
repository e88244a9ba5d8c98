use crate::config::{
    timeout_from_secs, validate_common, DEFAULT_CHILIES_FILE, DEFAULT_INPUT_FILE,
    DEFAULT_RESULTS_FILE, DEFAULT_SOURCE_URL, DEFAULT_WORK_DIR,
};
use crate::core::ConfigProvider;
use crate::transform::duration::DurationMode;
use crate::utils::error::{EtlError, Result};
use crate::utils::logger::{
    LogFormat, LoggingConfig, DEFAULT_LOG_BACKUPS, DEFAULT_LOG_FILE, DEFAULT_LOG_MAX_BYTES,
};
use crate::utils::validation::{self, Validate};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use std::time::Duration;

static ENV_VAR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\$\{([^}]+)\}").expect("env var pattern is valid"));

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TomlConfig {
    pub pipeline: PipelineConfig,
    #[serde(default)]
    pub source: SourceConfig,
    #[serde(default)]
    pub transform: TransformConfig,
    #[serde(default)]
    pub load: LoadConfig,
    #[serde(default)]
    pub logging: LoggingSection,
    pub monitoring: Option<MonitoringConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    pub name: String,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    pub url: String,
    pub timeout_seconds: Option<u64>,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_SOURCE_URL.to_string(),
            timeout_seconds: None,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TransformConfig {
    pub duration_mode: DurationMode,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoadConfig {
    pub work_dir: String,
    pub input_file: String,
    pub chilies_file: String,
    pub results_file: String,
}

impl Default for LoadConfig {
    fn default() -> Self {
        Self {
            work_dir: DEFAULT_WORK_DIR.to_string(),
            input_file: DEFAULT_INPUT_FILE.to_string(),
            chilies_file: DEFAULT_CHILIES_FILE.to_string(),
            results_file: DEFAULT_RESULTS_FILE.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSection {
    /// Set to false to log to the console only.
    pub to_file: bool,
    pub file: String,
    pub max_bytes: u64,
    pub backups: usize,
    pub format: LogFormat,
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            to_file: true,
            file: DEFAULT_LOG_FILE.to_string(),
            max_bytes: DEFAULT_LOG_MAX_BYTES,
            backups: DEFAULT_LOG_BACKUPS,
            format: LogFormat::Text,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitoringConfig {
    pub enabled: bool,
}

impl TomlConfig {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(EtlError::IoError)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content);

        toml::from_str(&processed_content).map_err(|e| EtlError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// Replaces `${VAR}` with the variable's value. Unset variables are left
    /// as written so validation reports them.
    fn substitute_env_vars(content: &str) -> String {
        ENV_VAR
            .replace_all(content, |caps: &regex::Captures| {
                let var_name = &caps[1];
                std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
            })
            .into_owned()
    }

    pub fn monitoring_enabled(&self) -> bool {
        self.monitoring.as_ref().map(|m| m.enabled).unwrap_or(false)
    }

    pub fn logging(&self, verbose: bool) -> LoggingConfig {
        LoggingConfig {
            file: self.logging.to_file.then(|| PathBuf::from(&self.logging.file)),
            max_bytes: self.logging.max_bytes,
            backups: self.logging.backups,
            format: self.logging.format,
            verbose,
        }
    }

    pub fn work_dir(&self) -> &str {
        &self.load.work_dir
    }
}

impl ConfigProvider for TomlConfig {
    fn source_url(&self) -> &str {
        &self.source.url
    }

    fn input_file(&self) -> &str {
        &self.load.input_file
    }

    fn chilies_file(&self) -> &str {
        &self.load.chilies_file
    }

    fn results_file(&self) -> &str {
        &self.load.results_file
    }

    fn request_timeout(&self) -> Option<Duration> {
        timeout_from_secs(self.source.timeout_seconds)
    }

    fn duration_mode(&self) -> DurationMode {
        self.transform.duration_mode
    }
}

impl Validate for TomlConfig {
    fn validate(&self) -> Result<()> {
        validation::validate_non_empty_string("pipeline.name", &self.pipeline.name)?;
        validate_common(
            &self.source.url,
            &self.load.input_file,
            &self.load.chilies_file,
            &self.load.results_file,
            self.source.timeout_seconds,
        )?;
        validation::validate_path("load.work_dir", &self.load.work_dir)?;

        if self.logging.to_file {
            validation::validate_path("logging.file", &self.logging.file)?;
            validation::validate_positive_number("logging.max_bytes", self.logging.max_bytes, 1)?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_minimal_config_uses_defaults() {
        let config = TomlConfig::from_toml_str("[pipeline]\nname = \"recipes\"\n").unwrap();

        assert_eq!(config.source_url(), DEFAULT_SOURCE_URL);
        assert_eq!(config.input_file(), "input/bi_recipes.json");
        assert_eq!(config.chilies_file(), "recipes-etl/Chilies.csv");
        assert_eq!(config.results_file(), "recipes-etl/Results.csv");
        assert_eq!(config.work_dir(), ".");
        assert_eq!(config.duration_mode(), DurationMode::Positional);
        assert_eq!(config.request_timeout(), None);
        assert!(!config.monitoring_enabled());
        assert!(config.validate().is_ok());

        let logging = config.logging(false);
        assert_eq!(logging.file, Some(PathBuf::from("recipe_processing.log")));
        assert_eq!(logging.backups, 5);
    }

    #[test]
    fn test_parse_full_config() {
        let toml_content = r#"
[pipeline]
name = "chili-report"
description = "Nightly chili report"

[source]
url = "http://localhost:8080/recipes.json"
timeout_seconds = 30

[transform]
duration_mode = "strict"

[load]
work_dir = "/tmp/recipes"
input_file = "raw.json"
chilies_file = "out/Chilies.csv"
results_file = "out/Results.csv"

[logging]
to_file = false
format = "json"

[monitoring]
enabled = true
"#;

        let config = TomlConfig::from_toml_str(toml_content).unwrap();

        assert_eq!(config.pipeline.name, "chili-report");
        assert_eq!(config.source_url(), "http://localhost:8080/recipes.json");
        assert_eq!(config.request_timeout(), Some(Duration::from_secs(30)));
        assert_eq!(config.duration_mode(), DurationMode::Strict);
        assert_eq!(config.work_dir(), "/tmp/recipes");
        assert_eq!(config.input_file(), "raw.json");
        assert!(config.monitoring_enabled());

        let logging = config.logging(true);
        assert_eq!(logging.file, None);
        assert_eq!(logging.format, LogFormat::Json);
        assert!(logging.verbose);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_env_var_substitution() {
        std::env::set_var("RECIPES_ETL_TEST_FEED", "https://feeds.example.com/recipes.json");

        let toml_content = r#"
[pipeline]
name = "test"

[source]
url = "${RECIPES_ETL_TEST_FEED}"
"#;

        let config = TomlConfig::from_toml_str(toml_content).unwrap();
        assert_eq!(config.source_url(), "https://feeds.example.com/recipes.json");

        std::env::remove_var("RECIPES_ETL_TEST_FEED");
    }

    #[test]
    fn test_unset_env_var_fails_validation() {
        let toml_content = r#"
[pipeline]
name = "test"

[source]
url = "${RECIPES_ETL_SURELY_UNSET_VARIABLE}"
"#;

        let config = TomlConfig::from_toml_str(toml_content).unwrap();
        assert_eq!(config.source_url(), "${RECIPES_ETL_SURELY_UNSET_VARIABLE}");
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_validation() {
        let toml_content = r#"
[pipeline]
name = "test"

[load]
chilies_file = "same.csv"
results_file = "same.csv"
"#;

        let config = TomlConfig::from_toml_str(toml_content).unwrap();
        let err = config.validate().unwrap_err();
        assert!(matches!(
            err,
            EtlError::InvalidConfigValueError { ref field, .. } if field == "load.results_file"
        ));
    }

    #[test]
    fn test_unknown_duration_mode_is_rejected() {
        let toml_content = r#"
[pipeline]
name = "test"

[transform]
duration_mode = "fuzzy"
"#;

        assert!(matches!(
            TomlConfig::from_toml_str(toml_content),
            Err(EtlError::ConfigValidationError { .. })
        ));
    }

    #[test]
    fn test_config_from_file() {
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file
            .write_all(b"[pipeline]\nname = \"file-test\"\n")
            .unwrap();

        let config = TomlConfig::from_file(temp_file.path()).unwrap();
        assert_eq!(config.pipeline.name, "file-test");
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = TomlConfig::from_file("/nonexistent/etl-config.toml").unwrap_err();
        assert!(matches!(err, EtlError::IoError(_)));
    }
}
