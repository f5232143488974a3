use thiserror::Error;

/// Why a provider refused a request.
///
/// `MissingCredentials` is the only variant that lets the next provider try;
/// every other variant ends authentication.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("No session presented")]
    MissingCredentials,

    #[error("Invalid or revoked session")]
    InvalidCredentials,

    #[error("Session expired")]
    Expired,

    /// Idle past the configured auto-lock.
    #[error("Session locked after inactivity")]
    Locked,

    #[error("Missing or mismatched CSRF token")]
    CsrfFailed,

    #[error(transparent)]
    Storage(#[from] pdash_db::storage::StoreError),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}
