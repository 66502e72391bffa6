//! Error taxonomy for pattern generation

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum CamoError {
    /// Unbalanced branch symbols or a rule mapping that does not parse
    #[error("Malformed grammar: {0}")]
    MalformedGrammar(String),
    /// Numeric parameters out of domain; raised before any drawing
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),
    /// Writing the finished pattern out failed
    #[error("Export failed: {0}")]
    ExportFailure(String),
}

impl CamoError {
    pub fn grammar(msg: impl Into<String>) -> Self {
        CamoError::MalformedGrammar(msg.into())
    }

    pub fn config(msg: impl Into<String>) -> Self {
        CamoError::InvalidConfiguration(msg.into())
    }
}

pub type Result<T> = std::result::Result<T, CamoError>;
