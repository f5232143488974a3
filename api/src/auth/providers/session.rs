//! Session cookie authentication.
//!
//! The `pdash_session` cookie holds `{session_id}.{hmac}`. A session is
//! rejected, and deleted, once it is past `expires_at` or has been idle for
//! longer than the configured auto-lock. Mutating requests must echo the
//! session's CSRF token in `X-CSRF-Token`.

use std::sync::Arc;

use async_trait::async_trait;
use axum::http::{Method, request::Parts};
use chrono::Utc;
use pdash_common::caller::Caller;
use pdash_db::{
    models::SessionId,
    storage::{SessionStore, SettingsStore, StoreError, Storage},
};
use tracing::{debug, instrument, warn};

use crate::auth::{
    cookies::{SESSION_COOKIE, find_cookie},
    error::AuthError,
    provider::AuthProvider,
    signing::SessionSigner,
};
use subtle::ConstantTimeEq;

pub const CSRF_HEADER: &str = "x-csrf-token";

pub struct SessionAuthProvider {
    signer: SessionSigner,
    db: Arc<dyn Storage>,
}

impl SessionAuthProvider {
    pub fn new(signer: SessionSigner, db: Arc<dyn Storage>) -> Self {
        Self { signer, db }
    }

    fn requires_csrf(method: &Method) -> bool {
        !matches!(method, &Method::GET | &Method::HEAD | &Method::OPTIONS)
    }

    async fn revoke(&self, id: &SessionId) {
        if let Err(e) = self.db.delete_session(id).await {
            warn!(error = %e, session_id = %id, "Failed to delete stale session");
        }
    }
}

#[async_trait]
impl AuthProvider for SessionAuthProvider {
    #[instrument(skip_all, fields(scheme = "session"))]
    async fn authenticate(&self, parts: &Parts) -> Result<Caller, AuthError> {
        let signed =
            find_cookie(&parts.headers, SESSION_COOKIE).ok_or(AuthError::MissingCredentials)?;

        let session_id = self
            .signer
            .verify(&signed)
            .ok_or(AuthError::InvalidCredentials)?;

        let session = SessionStore::get_session(&*self.db, &session_id)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        let now = Utc::now();
        if session.is_expired(now) {
            debug!(%session_id, "Session expired");
            self.revoke(&session_id).await;
            return Err(AuthError::Expired);
        }

        let settings = SettingsStore::get_settings(&*self.db).await?;
        if session.is_idle(now, settings.auto_lock()) {
            debug!(%session_id, "Session locked after inactivity");
            self.revoke(&session_id).await;
            return Err(AuthError::Locked);
        }

        if Self::requires_csrf(&parts.method) {
            let csrf_token = parts
                .headers
                .get(CSRF_HEADER)
                .and_then(|v| v.to_str().ok())
                .ok_or(AuthError::CsrfFailed)?;

            if csrf_token.as_bytes().ct_eq(session.csrf_token.as_bytes()).unwrap_u8() != 1 {
                return Err(AuthError::CsrfFailed);
            }
        }

        match SessionStore::touch_session(&*self.db, &session_id, now).await {
            Ok(()) => {}
            // deleted concurrently, e.g. by logout on another tab
            Err(StoreError::NotFound) => return Err(AuthError::InvalidCredentials),
            Err(e) => warn!(error = %e, "Failed to touch session"),
        }

        Ok(Caller::Operator {
            session_id: session_id.to_string(),
        })
    }

    fn scheme(&self) -> &'static str {
        "session"
    }
}

#[cfg(test)]
mod tests {
    use axum::http::{Request, header};
    use chrono::Duration;
    use pdash_db::{models::DbSession, storage::memory::MemoryStorage};

    use super::*;

    struct Fixture {
        db: Arc<MemoryStorage>,
        signer: SessionSigner,
        provider: SessionAuthProvider,
    }

    fn fixture() -> Fixture {
        let db = Arc::new(MemoryStorage::new());
        let signer = SessionSigner::new([7u8; 32]);
        let provider = SessionAuthProvider::new(signer.clone(), db.clone());
        Fixture {
            db,
            signer,
            provider,
        }
    }

    fn request(method: Method, cookie: Option<&str>, csrf: Option<&str>) -> Parts {
        let mut builder = Request::builder().method(method).uri("/api/v1/node/info");
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, format!("{SESSION_COOKIE}={cookie}"));
        }
        if let Some(csrf) = csrf {
            builder = builder.header(CSRF_HEADER, csrf);
        }
        builder.body(()).unwrap().into_parts().0
    }

    impl Fixture {
        async fn session(&self, session: DbSession) -> (DbSession, String) {
            self.db.create_session(session.clone()).await.unwrap();
            let signed = self.signer.sign(&session.id);
            (session, signed)
        }
    }

    #[tokio::test]
    async fn valid_session_authenticates_and_touches() {
        let f = fixture();
        let issued = Utc::now() - Duration::minutes(5);
        let (session, cookie) = f.session(DbSession::issue(issued, Duration::hours(1))).await;

        let caller = f
            .provider
            .authenticate(&request(Method::GET, Some(&cookie), None))
            .await
            .unwrap();

        assert_eq!(
            caller,
            Caller::Operator {
                session_id: session.id.to_string()
            }
        );

        let stored = f.db.get_session(&session.id).await.unwrap().unwrap();
        assert!(stored.last_used_at > session.last_used_at);
    }

    #[tokio::test]
    async fn missing_cookie_is_missing_credentials() {
        let f = fixture();
        assert!(matches!(
            f.provider.authenticate(&request(Method::GET, None, None)).await,
            Err(AuthError::MissingCredentials)
        ));
    }

    #[tokio::test]
    async fn forged_cookie_is_rejected() {
        let f = fixture();
        let (session, _) = f
            .session(DbSession::issue(Utc::now(), Duration::hours(1)))
            .await;
        let forged = SessionSigner::new([1u8; 32]).sign(&session.id);

        assert!(matches!(
            f.provider
                .authenticate(&request(Method::GET, Some(&forged), None))
                .await,
            Err(AuthError::InvalidCredentials)
        ));
    }

    #[tokio::test]
    async fn unknown_session_is_rejected() {
        let f = fixture();
        let cookie = f.signer.sign(&SessionId::generate());

        assert!(matches!(
            f.provider
                .authenticate(&request(Method::GET, Some(&cookie), None))
                .await,
            Err(AuthError::InvalidCredentials)
        ));
    }

    #[tokio::test]
    async fn expired_session_is_deleted() {
        let f = fixture();
        let issued = Utc::now() - Duration::hours(2);
        let (session, cookie) = f.session(DbSession::issue(issued, Duration::hours(1))).await;

        assert!(matches!(
            f.provider
                .authenticate(&request(Method::GET, Some(&cookie), None))
                .await,
            Err(AuthError::Expired)
        ));
        assert!(f.db.get_session(&session.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn idle_session_is_locked_and_deleted() {
        let f = fixture();
        let mut settings = f.db.get_settings().await.unwrap();
        settings.auto_lock_minutes = 10;
        f.db.put_settings(settings).await.unwrap();

        let issued = Utc::now() - Duration::minutes(30);
        let (session, cookie) = f.session(DbSession::issue(issued, Duration::hours(24))).await;

        assert!(matches!(
            f.provider
                .authenticate(&request(Method::GET, Some(&cookie), None))
                .await,
            Err(AuthError::Locked)
        ));
        assert!(f.db.get_session(&session.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn idle_session_survives_without_auto_lock() {
        let f = fixture();
        let issued = Utc::now() - Duration::minutes(30);
        let (_, cookie) = f.session(DbSession::issue(issued, Duration::hours(24))).await;

        assert!(
            f.provider
                .authenticate(&request(Method::GET, Some(&cookie), None))
                .await
                .is_ok()
        );
    }

    #[tokio::test]
    async fn mutating_requests_need_csrf() {
        let f = fixture();
        let (session, cookie) = f
            .session(DbSession::issue(Utc::now(), Duration::hours(1)))
            .await;

        assert!(matches!(
            f.provider
                .authenticate(&request(Method::POST, Some(&cookie), None))
                .await,
            Err(AuthError::CsrfFailed)
        ));
        assert!(matches!(
            f.provider
                .authenticate(&request(Method::POST, Some(&cookie), Some("wrong")))
                .await,
            Err(AuthError::CsrfFailed)
        ));
        assert!(
            f.provider
                .authenticate(&request(
                    Method::POST,
                    Some(&cookie),
                    Some(&session.csrf_token)
                ))
                .await
                .is_ok()
        );
    }

    #[tokio::test]
    async fn csrf_token_must_match_exactly() {
        let f = fixture();
        let (session, cookie) = f
            .session(DbSession::issue(Utc::now(), Duration::hours(1)))
            .await;

        let token = &session.csrf_token;
        let mut flipped = token.clone().into_bytes();
        flipped[0] = if flipped[0] == b'a' { b'b' } else { b'a' };
        let flipped = String::from_utf8(flipped).unwrap();
        let prefix = &token[..token.len() - 1];
        let extended = format!("{token}0");

        for candidate in [flipped.as_str(), prefix, extended.as_str()] {
            assert!(matches!(
                f.provider
                    .authenticate(&request(Method::POST, Some(&cookie), Some(candidate)))
                    .await,
                Err(AuthError::CsrfFailed)
            ));
        }
    }

    #[test]
    fn csrf_methods() {
        for safe in [Method::GET, Method::HEAD, Method::OPTIONS] {
            assert!(!SessionAuthProvider::requires_csrf(&safe));
        }
        for mutating in [
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::TRACE,
        ] {
            assert!(SessionAuthProvider::requires_csrf(&mutating));
        }
    }
}
