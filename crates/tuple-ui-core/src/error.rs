//! Error types for Tuple UI core.

use thiserror::Error;

use crate::action::ActionId;

/// Core error type for Tuple UI operations.
#[derive(Debug, Error)]
pub enum Error {
    #[error("{}: {reason}", action.label())]
    InvalidArgument { action: ActionId, reason: String },

    #[error("{} is not available right now", .0.label())]
    ActionDisabled(ActionId),

    #[error("Status parse error: {0}")]
    Parse(#[from] ParseError),
}

/// Reasons a status text could not be turned into a snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("Status output was empty")]
    Empty,

    #[error("Missing status field: {0}")]
    MissingField(&'static str),

    #[error("Invalid value for {field}: {value:?}")]
    InvalidValue { field: &'static str, value: String },

    #[error("Unsupported status format version: {0}")]
    UnsupportedVersion(String),

    #[error("Malformed status line: {0:?}")]
    Malformed(String),
}

/// Result type alias for Tuple UI core operations.
pub type Result<T> = std::result::Result<T, Error>;
