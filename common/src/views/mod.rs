//! Output views returned by the dashboard API.
//!
//! Views that mirror a phoenixd payload keep phoenixd's camelCase field names
//! so the browser sees the same shape phoenixd documents. Views owned by the
//! dashboard itself use snake_case.

use std::fmt::Debug;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

mod auth;
pub use auth::*;

mod node;
pub use node::*;

mod payments;
pub use payments::*;

mod phoenixd;
pub use phoenixd::*;

/// An error response for an API endpoint. This is used to return errors to the
/// client in a consistent format.
#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
pub struct ApiErrorResponse {
    /// An optional error code that can be used to identify the type of error
    /// that occurred.
    pub code: Option<String>,

    /// A human-readable message describing the error that occurred.
    pub message: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

/// Liveness of the dashboard backend.
#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
pub struct Health {
    pub status: String,
    pub version: String,
}
