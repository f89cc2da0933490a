use thiserror::Error;

pub type Result<T> = std::result::Result<T, BacktestError>;

#[derive(Error, Debug)]
pub enum BacktestError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Data error: {0}")]
    Data(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

impl BacktestError {
    pub fn configuration(message: impl Into<String>) -> Self {
        BacktestError::Configuration(message.into())
    }

    pub fn data(message: impl Into<String>) -> Self {
        BacktestError::Data(message.into())
    }
}
