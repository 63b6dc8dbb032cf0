//! Error types for cw-core

use thiserror::Error;

/// Main error type for cw-core
#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    TomlParse(#[from] toml::de::Error),
}

/// Result type alias for cw-core
pub type Result<T> = std::result::Result<T, Error>;
