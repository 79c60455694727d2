use thiserror::Error;

#[derive(Debug, Error)]
pub enum BlinkShotError {
    #[error("Configuration error: {0}")]
    Config(String),
    #[error("Storage error: {0}")]
    Storage(String),
    #[error("Request error: {0}")]
    Request(String),
    #[error("{0}")]
    Api(String),
    #[error("Response error: {0}")]
    Response(String),
    #[error("Serialization error: {0}")]
    Serialization(String),
    #[error("Decode error: {0}")]
    Decode(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<serde_json::Error> for BlinkShotError {
    fn from(err: serde_json::Error) -> Self {
        BlinkShotError::Serialization(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, BlinkShotError>;
