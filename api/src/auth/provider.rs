use async_trait::async_trait;
use axum::http::request::Parts;
use pdash_common::caller::Caller;

use super::error::AuthError;

#[async_trait]
pub trait AuthProvider: Send + Sync {
    /// Authenticate from request parts.
    ///
    /// `MissingCredentials` lets the next provider try; any other error ends
    /// the chain.
    async fn authenticate(&self, parts: &Parts) -> Result<Caller, AuthError>;

    /// Name of this auth scheme, for logging.
    fn scheme(&self) -> &'static str;
}
