use thiserror::Error;

#[derive(Error, Debug)]
pub enum StatsError {
    #[error("CSV processing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Chart rendering error: {message}")]
    ChartError { message: String },

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Configuration validation failed for '{field}': {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Missing configuration field: {field}")]
    MissingConfigError { field: String },

    #[error("Invalid value '{value}' for '{field}': {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("None of the expected columns found: {candidates:?}")]
    MissingColumnError { candidates: Vec<String> },

    #[error("No valid data: {message}")]
    EmptyDataError { message: String },

    #[error("Insufficient data for {context}: need at least {needed}, found {found}")]
    InsufficientDataError {
        context: String,
        needed: usize,
        found: usize,
    },

    #[error("Data processing error: {message}")]
    ProcessingError { message: String },

    #[error("Validation error: {message}")]
    ValidationError { message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Io,
    Configuration,
    Data,
    Rendering,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl StatsError {
    pub fn missing_column(candidates: &[&str]) -> Self {
        StatsError::MissingColumnError {
            candidates: candidates.iter().map(|c| c.to_string()).collect(),
        }
    }

    pub fn empty_data(message: impl Into<String>) -> Self {
        StatsError::EmptyDataError {
            message: message.into(),
        }
    }

    pub fn chart(message: impl Into<String>) -> Self {
        StatsError::ChartError {
            message: message.into(),
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            StatsError::IoError(_) | StatsError::CsvError(_) => ErrorCategory::Io,
            StatsError::ConfigError { .. }
            | StatsError::ConfigValidationError { .. }
            | StatsError::MissingConfigError { .. }
            | StatsError::InvalidConfigValueError { .. } => ErrorCategory::Configuration,
            StatsError::ChartError { .. } | StatsError::SerializationError(_) => {
                ErrorCategory::Rendering
            }
            StatsError::MissingColumnError { .. }
            | StatsError::EmptyDataError { .. }
            | StatsError::InsufficientDataError { .. }
            | StatsError::ProcessingError { .. }
            | StatsError::ValidationError { .. } => ErrorCategory::Data,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self {
            // 資料不足只代表這次分析沒有結果
            StatsError::InsufficientDataError { .. } => ErrorSeverity::Medium,
            StatsError::IoError(_) => ErrorSeverity::Critical,
            _ => ErrorSeverity::High,
        }
    }

    pub fn recovery_suggestion(&self) -> String {
        match self {
            StatsError::CsvError(_) => {
                "Check that the input file is a well-formed CSV with a header row".to_string()
            }
            StatsError::IoError(_) => {
                "Check that the input path exists and the output directory is writable".to_string()
            }
            StatsError::SerializationError(_) => {
                "Report output could not be serialized; re-run with --verbose".to_string()
            }
            StatsError::ChartError { .. } => {
                "Chart rendering needs a system sans-serif font; install one or skip charts"
                    .to_string()
            }
            StatsError::ConfigError { .. }
            | StatsError::ConfigValidationError { .. }
            | StatsError::InvalidConfigValueError { .. } => {
                "Fix the configuration value and run again".to_string()
            }
            StatsError::MissingConfigError { field } => {
                format!("Add the '{}' field to the configuration", field)
            }
            StatsError::MissingColumnError { candidates } => format!(
                "Make sure the CSV has one of these columns: {}",
                candidates.join(", ")
            ),
            StatsError::EmptyDataError { .. } => {
                "The selected column has no numeric values; check the input data".to_string()
            }
            StatsError::InsufficientDataError { needed, .. } => {
                format!("Provide at least {} usable values", needed)
            }
            StatsError::ProcessingError { .. } | StatsError::ValidationError { .. } => {
                "Check the command arguments and input data".to_string()
            }
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self.category() {
            ErrorCategory::Io => format!("Could not read or write data: {}", self),
            ErrorCategory::Configuration => format!("Invalid configuration: {}", self),
            ErrorCategory::Data => format!("Analysis failed: {}", self),
            ErrorCategory::Rendering => format!("Could not produce output: {}", self),
        }
    }

    /// Process exit code used by the binaries.
    pub fn exit_code(&self) -> i32 {
        match self.severity() {
            ErrorSeverity::Low => 0,
            ErrorSeverity::Medium => 2,
            ErrorSeverity::High => 1,
            ErrorSeverity::Critical => 3,
        }
    }
}

pub type Result<T> = std::result::Result<T, StatsError>;
