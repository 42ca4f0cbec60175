//! Error types for exposer

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Invalid route: {0}")]
    InvalidRoute(String),

    #[error("Decode error: {0}")]
    Decode(String),

    #[error("Payload error: {0}")]
    Payload(String),

    #[error("Handler error: {0}")]
    Handler(String),

    #[error("Listener error: {0}")]
    Listener(String),

    #[error("Failed to spawn listener thread: {0}")]
    Spawn(String),

    #[error("Config error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub fn decode(msg: impl Into<String>) -> Self {
        Error::Decode(msg.into())
    }

    pub fn handler(msg: impl Into<String>) -> Self {
        Error::Handler(msg.into())
    }
}
