use thiserror::Error;

#[derive(Error, Debug)]
pub enum OborotError {
    #[error("Database error: {0}")]
    Db(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Spreadsheet error: {0}")]
    Sheet(#[from] calamine::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Uploaded file not found: {0}")]
    FileNotFound(i64),

    #[error("Account number longer than 20 characters: {0}")]
    AccountNumberTooLong(String),

    #[error("Amount does not fit 20 digits with 2 decimal places: {0}")]
    AmountOutOfRange(String),

    #[error("Failed to process file. Please check the logs.")]
    IngestFailed,

    #[error("Settings error: {0}")]
    Settings(String),

    #[error("{0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, OborotError>;
