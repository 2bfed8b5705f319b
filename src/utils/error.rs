use thiserror::Error;

#[derive(Error, Debug)]
pub enum RecordsError {
    #[error("CSV processing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("Input file not found: {path}")]
    MissingInput { path: String },

    #[error("Table '{table}' has no '{column}' column")]
    MissingColumn { table: String, column: String },

    #[error("Table '{table}' row {row}: '{field}' is not an integer (got '{value}')")]
    InvalidNumber {
        table: String,
        row: usize,
        field: String,
        value: String,
    },

    #[error("Unknown yard code: {code}")]
    UnknownYard { code: String },

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Invalid value '{value}' for {field}: {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Validation error: {message}")]
    ValidationError { message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Input,
    Data,
    Configuration,
    System,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Medium,
    High,
    Critical,
}

impl RecordsError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            RecordsError::MissingInput { .. } => ErrorCategory::Input,
            RecordsError::CsvError(_)
            | RecordsError::MissingColumn { .. }
            | RecordsError::InvalidNumber { .. }
            | RecordsError::UnknownYard { .. }
            | RecordsError::ValidationError { .. } => ErrorCategory::Data,
            RecordsError::TomlError(_)
            | RecordsError::ConfigError { .. }
            | RecordsError::InvalidConfigValueError { .. } => ErrorCategory::Configuration,
            RecordsError::IoError(_) | RecordsError::SerializationError(_) => {
                ErrorCategory::System
            }
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self.category() {
            ErrorCategory::Input => ErrorSeverity::Medium,
            ErrorCategory::Data | ErrorCategory::Configuration => ErrorSeverity::High,
            ErrorCategory::System => ErrorSeverity::Critical,
        }
    }

    pub fn recovery_suggestion(&self) -> String {
        match self {
            RecordsError::MissingInput { path } => {
                format!("Check that '{}' exists or pass --root to point at the records folder", path)
            }
            RecordsError::MissingColumn { table, column } => {
                format!("Add a '{}' column to {} or run fix-csv-headers if the header was displaced", column, table)
            }
            RecordsError::InvalidNumber { table, row, field, .. } => {
                format!("Correct '{}' in {} row {} to a whole number", field, table, row)
            }
            RecordsError::UnknownYard { code } => {
                format!("Add a [[yards]] entry for '{}' to the configuration", code)
            }
            RecordsError::CsvError(_) => "Check the CSV file for unbalanced quotes or ragged rows".to_string(),
            RecordsError::TomlError(_)
            | RecordsError::ConfigError { .. }
            | RecordsError::InvalidConfigValueError { .. } => {
                "Review the configuration file against cemetery.toml".to_string()
            }
            RecordsError::ValidationError { .. } => "Fix the reported records and re-run".to_string(),
            RecordsError::IoError(_) | RecordsError::SerializationError(_) => {
                "Check file permissions and free disk space".to_string()
            }
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self.category() {
            ErrorCategory::Input => format!("Missing input: {}", self),
            ErrorCategory::Data => format!("Data problem: {}", self),
            ErrorCategory::Configuration => format!("Configuration problem: {}", self),
            ErrorCategory::System => format!("System error: {}", self),
        }
    }
}

pub type Result<T> = std::result::Result<T, RecordsError>;
