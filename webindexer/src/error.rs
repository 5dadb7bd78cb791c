use std::fmt;
use std::io;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum IndexerError {
    #[error("{0}")]
    Io(#[from] io::Error),
    #[error("{0}")]
    Parse(String),
    #[error("{0}")]
    Config(ConfigErrorKind),
    #[error("{0}")]
    Filter(String),
    #[error("{0}")]
    Image(#[from] image::ImageError),
    #[error("{0}")]
    Other(String),
}

#[derive(Debug)]
pub enum ConfigErrorKind {
    InvalidFormat(String),
    InvalidPath(String),
    InvalidValue(String, String),
}

impl fmt::Display for ConfigErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigErrorKind::InvalidFormat(msg) => write!(f, "Invalid format: {}", msg),
            ConfigErrorKind::InvalidPath(msg) => write!(f, "Invalid path: {}", msg),
            ConfigErrorKind::InvalidValue(field, msg) => {
                write!(f, "Invalid value for '{}': {}", field, msg)
            }
        }
    }
}

impl From<toml::de::Error> for IndexerError {
    fn from(err: toml::de::Error) -> Self {
        IndexerError::Config(ConfigErrorKind::InvalidFormat(err.to_string()))
    }
}

impl From<serde_json::Error> for IndexerError {
    fn from(err: serde_json::Error) -> Self {
        IndexerError::Parse(err.to_string())
    }
}

impl From<regex::Error> for IndexerError {
    fn from(err: regex::Error) -> Self {
        IndexerError::Filter(format!("Invalid filter pattern: {}", err))
    }
}

pub type Result<T> = std::result::Result<T, IndexerError>;
