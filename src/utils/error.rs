use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConverterError {
    #[error("Unknown coordinate reference system '{identifier}': {reason}")]
    CrsResolution { identifier: String, reason: String },

    #[error("Invalid input for {field}: {reason}")]
    InvalidInput { field: String, reason: String },

    #[error("Table error at row {row}: {message}")]
    Table { row: usize, message: String },

    #[error("Batch of {rows} rows exceeds the limit of {max} rows")]
    BatchTooLarge { rows: usize, max: usize },

    #[error("CSV processing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Configuration validation failed for {field}: {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Invalid value '{value}' for {field}: {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Missing required configuration: {field}")]
    MissingConfigError { field: String },

    #[error("HTTP server error: {message}")]
    ServerError { message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// 使用者輸入 (CRS、表格內容)
    Input,
    Configuration,
    Io,
    Internal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl ConverterError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            ConverterError::CrsResolution { .. }
            | ConverterError::InvalidInput { .. }
            | ConverterError::Table { .. }
            | ConverterError::BatchTooLarge { .. }
            | ConverterError::CsvError(_) => ErrorCategory::Input,
            ConverterError::ConfigError { .. }
            | ConverterError::ConfigValidationError { .. }
            | ConverterError::InvalidConfigValueError { .. }
            | ConverterError::MissingConfigError { .. } => ErrorCategory::Configuration,
            ConverterError::IoError(_) => ErrorCategory::Io,
            ConverterError::SerializationError(_) | ConverterError::ServerError { .. } => {
                ErrorCategory::Internal
            }
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self.category() {
            // 只影響這一次轉換，應用程式照常運作
            ErrorCategory::Input => ErrorSeverity::Medium,
            ErrorCategory::Configuration => ErrorSeverity::High,
            ErrorCategory::Io => ErrorSeverity::High,
            ErrorCategory::Internal => ErrorSeverity::Critical,
        }
    }

    pub fn recovery_suggestion(&self) -> String {
        match self {
            ConverterError::CrsResolution { .. } => {
                "Pick a system from the dropdown or enter a known EPSG code such as EPSG:4326"
                    .to_string()
            }
            ConverterError::InvalidInput { field, .. } => {
                format!("Provide a value for '{}' and try again", field)
            }
            ConverterError::Table { row, .. } => {
                format!("Check row {} of the input table for missing or non-numeric values", row)
            }
            ConverterError::BatchTooLarge { max, .. } => {
                format!("Split the input into batches of at most {} rows", max)
            }
            ConverterError::CsvError(_) => {
                "Paste tab or comma separated columns copied from a spreadsheet".to_string()
            }
            ConverterError::IoError(_) => "Check file paths and permissions".to_string(),
            ConverterError::ConfigError { .. }
            | ConverterError::ConfigValidationError { .. }
            | ConverterError::InvalidConfigValueError { .. } => {
                "Review the configuration file and command line flags".to_string()
            }
            ConverterError::MissingConfigError { field } => {
                format!("Provide '{}' (check the path, configuration file or environment)", field)
            }
            ConverterError::SerializationError(_) | ConverterError::ServerError { .. } => {
                "Retry the request; if it keeps failing check the server logs".to_string()
            }
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            ConverterError::CrsResolution { identifier, .. } => {
                format!("The coordinate system '{}' is not recognised", identifier)
            }
            ConverterError::Table { row, message } => {
                format!("Input table row {}: {}", row, message)
            }
            ConverterError::BatchTooLarge { rows, max } => {
                format!("{} rows were submitted but at most {} can be converted at once", rows, max)
            }
            ConverterError::SerializationError(_) | ConverterError::ServerError { .. } => {
                "An internal error occurred".to_string()
            }
            other => other.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, ConverterError>;
