//! Top-level error type.

use thiserror::Error;

/// Errors that reach the application boundary.
#[derive(Error, Debug)]
pub enum Error {
    /// Window or event loop failure
    #[error("Window error: {0}")]
    Window(String),

    /// Anything raised while creating or driving GPU resources
    #[error("Render error: {0}")]
    Render(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed configuration file
    #[error("Config parse error: {0}")]
    ConfigParse(#[from] toml::de::Error),

    /// Configuration values outside their accepted range
    #[error("Config error: {0}")]
    Config(String),
}

/// Result type alias using the crate's Error type.
pub type Result<T> = std::result::Result<T, Error>;
