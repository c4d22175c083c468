//! Error types for the element catalog.

use thiserror::Error;

/// Errors raised while loading the element data file.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// The data file is not valid JSON for the record schema.
    #[error("element data parse error: {0}")]
    Parse(#[from] serde_json::Error),
    /// The data file parsed but breaks a catalog invariant.
    #[error("invalid element data: {0}")]
    Invalid(String),
}

/// Convenience result alias for catalog operations.
pub type CatalogResult<T> = Result<T, CatalogError>;
