use axum::http::request::Parts;
use pdash_common::caller::Caller;
use tracing::{debug, instrument, trace};

use super::{error::AuthError, provider::AuthProvider};

/// Tries authentication providers in registration order.
///
/// A provider answering `MissingCredentials` passes the request on to the
/// next one. The first success wins and any other error fails the request
/// immediately.
///
/// ```rust,ignore
/// let auth_manager = AuthManager::new()
///     .with_provider(OpenAccessProvider::new(db.clone()))
///     .with_provider(SessionAuthProvider::new(signer, db.clone()));
///
/// let caller = auth_manager.authenticate(&request_parts).await?;
/// ```
pub struct AuthManager {
    providers: Vec<Box<dyn AuthProvider>>,
}

impl AuthManager {
    pub fn new() -> Self {
        Self {
            providers: Vec::new(),
        }
    }

    pub fn with_provider<P: AuthProvider + 'static>(mut self, provider: P) -> Self {
        self.providers.push(Box::new(provider));
        self
    }

    #[instrument(skip_all, fields(method = %parts.method, path = %parts.uri.path()))]
    pub async fn authenticate(&self, parts: &Parts) -> Result<Caller, AuthError> {
        for provider in &self.providers {
            trace!(scheme = provider.scheme(), "Trying auth provider");

            match provider.authenticate(parts).await {
                Ok(caller) => {
                    debug!(scheme = provider.scheme(), "Auth succeeded");
                    return Ok(caller);
                }
                Err(AuthError::MissingCredentials) => {
                    trace!(scheme = provider.scheme(), "No credentials for this scheme");
                    continue;
                }
                Err(e) => {
                    debug!(scheme = provider.scheme(), error = %e, "Auth failed");
                    return Err(e);
                }
            }
        }

        Err(AuthError::MissingCredentials)
    }
}

impl Default for AuthManager {
    fn default() -> Self {
        Self::new()
    }
}
