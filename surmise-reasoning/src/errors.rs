//! Error types for the reasoning core

use thiserror::Error;

/// Main error type for reasoning operations
#[derive(Error, Debug)]
pub enum ReasoningError {
    /// Invalid state or operation
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// Not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Policy value outside its valid range
    #[error("Invalid policy: {0}")]
    Config(String),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Policy file could not be parsed
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// Generic IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for reasoning operations
pub type Result<T> = std::result::Result<T, ReasoningError>;
