use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Response for the login, setup and password change endpoints.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(tag = "token_type", rename_all = "PascalCase")]
pub enum AuthLoginResponse {
    /// The session cookie has been set on the response. It must be included
    /// in subsequent requests to authenticate the operator.
    Session {
        /// CSRF token that must be included in X-CSRF-Token header for mutating requests
        csrf_token: String,

        /// When the session stops being accepted, regardless of activity.
        expires_at: DateTime<Utc>,
    },
}

/// Whether the dashboard is gated and whether the current request passed the
/// gate. Always readable, so the UI can decide between setup, login and the
/// dashboard itself.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AuthStatus {
    /// A dashboard password has been configured.
    pub password_configured: bool,

    /// The request carried a valid session, or the dashboard is open.
    pub authenticated: bool,

    /// Minutes of inactivity after which a session is locked. Zero disables
    /// the idle lock.
    pub auto_lock_minutes: u32,
}

/// Session policy of the dashboard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct AuthSettings {
    /// Minutes of inactivity after which a session is locked. Zero disables
    /// the idle lock.
    pub auto_lock_minutes: u32,

    /// Absolute lifetime of a new session, in hours.
    pub session_ttl_hours: u32,
}
