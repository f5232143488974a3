//! Input parameters accepted by the dashboard API.
//!
//! Parameters that are forwarded to phoenixd serialize to exactly the form
//! fields phoenixd expects, so handlers can pass them through unchanged.

use thiserror::Error;

mod auth;
pub use auth::*;

mod node;
pub use node::*;

mod payments;
pub use payments::*;

mod phoenixd;
pub use phoenixd::*;

/// A parameter failed validation before reaching storage or phoenixd.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("invalid `{field}`: {reason}")]
pub struct ParamError {
    pub field: &'static str,
    pub reason: String,
}

impl ParamError {
    pub fn new(field: &'static str, reason: impl Into<String>) -> Self {
        Self {
            field,
            reason: reason.into(),
        }
    }
}

pub(crate) fn require_non_empty(field: &'static str, value: &str) -> Result<(), ParamError> {
    if value.trim().is_empty() {
        return Err(ParamError::new(field, "must not be empty"));
    }
    Ok(())
}

pub(crate) fn require_positive(field: &'static str, value: u64) -> Result<(), ParamError> {
    if value == 0 {
        return Err(ParamError::new(field, "must be greater than zero"));
    }
    Ok(())
}
