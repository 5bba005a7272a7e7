use thiserror::Error;

pub type Result<T> = std::result::Result<T, ProcessingError>;

#[derive(Error, Debug)]
pub enum ProcessingError {
    #[error("File I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV write error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Parquet error: {0}")]
    Parquet(#[from] parquet::errors::ParquetError),

    #[error("Arrow error: {0}")]
    Arrow(#[from] arrow::error::ArrowError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Settings error: {0}")]
    Settings(#[from] config::ConfigError),

    #[error("Validation error: {0}")]
    Validation(#[from] validator::ValidationErrors),

    #[error("Invalid selection: {0}")]
    InvalidSelection(String),

    #[error("No data to summarise: {0}")]
    EmptyAggregate(String),

    #[error("Invalid year range: {start} > {end}")]
    InvalidRange { start: i32, end: i32 },

    #[error("Unknown variable: {0}")]
    UnknownVariable(String),

    #[error("Missing required column: {0}")]
    MissingColumn(String),

    #[error("Timestamps are not strictly increasing at row {row}: {previous} then {current}")]
    UnorderedTimestamps {
        row: usize,
        previous: chrono::NaiveDateTime,
        current: chrono::NaiveDateTime,
    },

    #[error("Invalid data format: {0}")]
    InvalidFormat(String),
}

impl ProcessingError {
    /// Request errors a page renders as a neutral "no data" state.
    pub fn is_no_data(&self) -> bool {
        matches!(
            self,
            ProcessingError::EmptyAggregate(_)
                | ProcessingError::InvalidSelection(_)
                | ProcessingError::InvalidRange { .. }
        )
    }
}
