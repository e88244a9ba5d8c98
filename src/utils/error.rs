use thiserror::Error;

#[derive(Error, Debug)]
pub enum EtlError {
    #[error("Failed to download {url}: {source}")]
    TransportError {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Failed to repair JSON file '{path}': {reason}")]
    FormatRepairError { path: String, reason: String },

    #[error("CSV processing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Configuration error in '{field}': {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Invalid value '{value}' for '{field}': {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Data processing error: {message}")]
    ProcessingError { message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Network,
    FileSystem,
    Data,
    Configuration,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Medium,
    High,
    Critical,
}

impl EtlError {
    pub fn processing(message: impl Into<String>) -> Self {
        EtlError::ProcessingError {
            message: message.into(),
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            EtlError::TransportError { .. } => ErrorCategory::Network,
            EtlError::FormatRepairError { .. } | EtlError::IoError(_) => ErrorCategory::FileSystem,
            EtlError::CsvError(_) | EtlError::ProcessingError { .. } => ErrorCategory::Data,
            EtlError::ConfigError { .. }
            | EtlError::ConfigValidationError { .. }
            | EtlError::InvalidConfigValueError { .. } => ErrorCategory::Configuration,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self.category() {
            ErrorCategory::Network => ErrorSeverity::Medium,
            ErrorCategory::Data => ErrorSeverity::High,
            ErrorCategory::FileSystem | ErrorCategory::Configuration => ErrorSeverity::Critical,
        }
    }

    /// Process exit code for a run that ended with this error. Always non-zero.
    pub fn exit_code(&self) -> i32 {
        match self.severity() {
            ErrorSeverity::High => 1,
            ErrorSeverity::Medium => 2,
            ErrorSeverity::Critical => 3,
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            EtlError::TransportError { .. } => {
                "Check the feed URL and your network connection, then run again"
            }
            EtlError::FormatRepairError { .. } => {
                "Make sure the downloaded file is readable, writable and UTF-8 encoded"
            }
            EtlError::IoError(_) => "Check that the working directory exists and is writable",
            EtlError::CsvError(_) => {
                "A report could not be rendered; inspect the repaired JSON file for unusual values"
            }
            EtlError::ProcessingError { .. } => {
                "Inspect the repaired JSON file; it must be an array of recipe objects"
            }
            EtlError::ConfigError { .. }
            | EtlError::ConfigValidationError { .. }
            | EtlError::InvalidConfigValueError { .. } => {
                "Fix the configuration value and run again (see --help)"
            }
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self.category() {
            ErrorCategory::Network => format!("Could not download the recipe feed: {}", self),
            ErrorCategory::FileSystem => format!("A file operation failed: {}", self),
            ErrorCategory::Data => format!("The recipe data could not be processed: {}", self),
            ErrorCategory::Configuration => format!("Invalid configuration: {}", self),
        }
    }
}

pub type Result<T> = std::result::Result<T, EtlError>;
