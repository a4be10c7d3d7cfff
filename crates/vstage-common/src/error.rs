//! Error types shared across vstage crates

use thiserror::Error;

/// Result type alias for vstage helper operations
pub type Result<T> = std::result::Result<T, VstageError>;

/// Main error type for shared helpers
///
/// The `Display` strings of the parsing variants are part of the external
/// contract: operators see them verbatim in CLI output and HTTP error bodies.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum VstageError {
    #[error("invalid UUID length")]
    InvalidUuidLength,

    #[error("invalid UUID hex")]
    InvalidUuidHex,

    #[error("invalid URL: {0}")]
    InvalidUrl(String),

    #[error("empty path in URL")]
    EmptyUrlPath,

    #[error("cannot extract key from path-style URL")]
    PathStyleKey,
}
