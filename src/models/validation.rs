//! Request validation errors.

use thiserror::Error;

/// A missing or malformed parameter, rejected before any store access.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Missing required field: {0}")]
    Missing(&'static str),

    #[error("Invalid {field}: {reason}")]
    Malformed { field: &'static str, reason: String },
}
