use thiserror::Error;

#[derive(Error, Debug)]
pub enum HpgateError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Path not allowed: {0}")]
    PathNotAllowed(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type Error = HpgateError;
pub type Result<T> = std::result::Result<T, Error>;
