//! Error types for erdlayout operations.
//!
//! Layout itself never fails. Errors only come from the boundaries around it:
//! reading input, decoding the entity list, loading configuration and
//! writing the result.

use std::io;

use thiserror::Error;

/// The main error type for erdlayout operations.
#[derive(Debug, Error)]
pub enum ErdError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Invalid entity list: {err}")]
    Schema { err: serde_json::Error, src: String },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Export error: {0}")]
    Export(Box<dyn std::error::Error>),
}

impl ErdError {
    /// Create a new `Schema` error with the source text it was raised for.
    pub fn new_schema_error(err: serde_json::Error, src: impl Into<String>) -> Self {
        Self::Schema {
            err,
            src: src.into(),
        }
    }
}
