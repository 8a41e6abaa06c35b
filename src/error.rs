use thiserror::Error;

/// Main error type for the portfolio trainer
#[derive(Error, Debug)]
pub enum PortfolioError {
    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    // IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // Serialization errors
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    // Data errors
    #[error("Invalid data: {0}")]
    InvalidData(String),

    #[error("Operation cancelled")]
    Cancelled,

    #[error("{0}")]
    Other(#[from] anyhow::Error),
}

/// Result type alias for PortfolioError
pub type Result<T> = std::result::Result<T, PortfolioError>;

/// Specific error types for price and table files
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DataError {
    #[error("No usable prices in {source_name}")]
    NoPrices { source_name: String },

    #[error("Column not found: {column}")]
    MissingColumn { column: String },

    #[error("Series {source_name} has {len} prices, need at least {required}")]
    SeriesTooShort {
        source_name: String,
        len: usize,
        required: usize,
    },

    #[error("Malformed Q-matrix row {row}: {reason}")]
    MalformedRow { row: usize, reason: String },

    #[error("Q-table of {states}x{actions} holds {values} values")]
    TableLength {
        states: usize,
        actions: usize,
        values: usize,
    },

    #[error("Q-matrix shape mismatch: expected {expected_states}x{expected_actions}, got {states}x{actions}")]
    ShapeMismatch {
        expected_states: usize,
        expected_actions: usize,
        states: usize,
        actions: usize,
    },
}

impl From<DataError> for PortfolioError {
    fn from(err: DataError) -> Self {
        PortfolioError::InvalidData(err.to_string())
    }
}
