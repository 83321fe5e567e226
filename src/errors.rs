/// All application errors, categorized by domain.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    // ── Configuration ──
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Data / Schema ──
    #[error("Table '{table}' is missing required column '{column}'")]
    MissingColumn { table: String, column: String },

    #[error("Column '{column}' has type {found}, expected {expected}")]
    ColumnType {
        column: String,
        expected: &'static str,
        found: String,
    },

    #[error("Column '{column}' contains {count} null values")]
    NullValues { column: String, count: usize },

    #[error("Column '{column}' contains negative values")]
    NegativeValues { column: String },

    // ── Files ──
    #[error("File not found: {0}")]
    FileNotFound(String),

    #[error("Failed to read file: {0}")]
    FileRead(String),

    #[error("Failed to write file: {0}")]
    FileWrite(String),

    #[error("Dataframe error: {0}")]
    Dataframe(String),

    // ── Timeframe ──
    #[error("Invalid timeframe '{0}', expected one of 1D, 4H, 1H, 15M, 5M, 1M")]
    InvalidTimeframe(String),

    #[error("Timeframe switching is not supported on daily charts")]
    TimeframeUnsupported,

    // ── Display ──
    #[error("Chart surface error: {0}")]
    Surface(String),
}

/// Coarse error grouping used for propagation decisions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Configuration,
    Schema,
    Io,
    Timeframe,
    Display,
}

impl AppError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            AppError::InvalidConfig(_) => ErrorCategory::Configuration,
            AppError::MissingColumn { .. }
            | AppError::ColumnType { .. }
            | AppError::NullValues { .. }
            | AppError::NegativeValues { .. } => ErrorCategory::Schema,
            AppError::FileNotFound(_)
            | AppError::FileRead(_)
            | AppError::FileWrite(_)
            | AppError::Dataframe(_) => ErrorCategory::Io,
            AppError::InvalidTimeframe(_) | AppError::TimeframeUnsupported => {
                ErrorCategory::Timeframe
            }
            AppError::Surface(_) => ErrorCategory::Display,
        }
    }

    /// Stable machine-readable code, used in log lines.
    pub fn code(&self) -> &'static str {
        match self {
            AppError::InvalidConfig(_) => "INVALID_CONFIG",
            AppError::MissingColumn { .. } => "MISSING_COLUMN",
            AppError::ColumnType { .. } => "COLUMN_TYPE",
            AppError::NullValues { .. } => "NULL_VALUES",
            AppError::NegativeValues { .. } => "NEGATIVE_VALUES",
            AppError::FileNotFound(_) => "FILE_NOT_FOUND",
            AppError::FileRead(_) => "FILE_READ",
            AppError::FileWrite(_) => "FILE_WRITE",
            AppError::Dataframe(_) => "DATAFRAME",
            AppError::InvalidTimeframe(_) => "INVALID_TIMEFRAME",
            AppError::TimeframeUnsupported => "TIMEFRAME_UNSUPPORTED",
            AppError::Surface(_) => "SURFACE",
        }
    }

    /// Errors that reject a single UI action and leave chart state intact.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            AppError::InvalidTimeframe(_) | AppError::TimeframeUnsupported | AppError::FileWrite(_)
        )
    }
}

// ── Conversions from external errors ──

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::FileRead(err.to_string())
    }
}

impl From<polars::error::PolarsError> for AppError {
    fn from(err: polars::error::PolarsError) -> Self {
        AppError::Dataframe(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_errors_are_fatal() {
        let err = AppError::MissingColumn {
            table: "bars".into(),
            column: "close".into(),
        };
        assert_eq!(err.category(), ErrorCategory::Schema);
        assert!(!err.is_recoverable());
        assert_eq!(err.to_string(), "Table 'bars' is missing required column 'close'");
    }

    #[test]
    fn test_timeframe_errors_are_recoverable() {
        let err = AppError::InvalidTimeframe("garbage".into());
        assert_eq!(err.category(), ErrorCategory::Timeframe);
        assert!(err.is_recoverable());
        assert_eq!(err.code(), "INVALID_TIMEFRAME");
    }

    #[test]
    fn test_config_errors_are_fatal() {
        let err = AppError::InvalidConfig("general.data_path is empty".into());
        assert_eq!(err.category(), ErrorCategory::Configuration);
        assert!(!err.is_recoverable());
    }
}
