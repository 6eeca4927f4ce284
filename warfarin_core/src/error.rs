//! Error types for the warfarin_core library.

use std::io;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for warfarin_core operations
///
/// The regimen generator itself never returns these: invalid and infeasible
/// calculations both collapse to an empty suggestion list. They surface at
/// the boundaries (input parsing, tablet set construction, configuration).
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// IO error occurred
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML parsing error
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Configuration validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Calculation input rejected before any search was attempted
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// A tablet strength of zero mg
    #[error("Invalid tablet strength: {0} mg")]
    InvalidTablet(u32),

    /// Unrecognised special-day pattern name
    #[error("Unknown special-day pattern: {0}")]
    UnknownPattern(String),
}
