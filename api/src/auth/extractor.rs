use std::{convert::Infallible, future::Future, sync::Arc};

use axum::{extract::FromRequestParts, http::request::Parts};
use pdash_common::caller::Caller;

use crate::{context::ApiContext, error::ApiError};

/// Extractor that requires an authenticated (or open) caller.
///
/// Rejects with 401 when no provider accepts the request, with a code telling
/// an expired or locked session and a CSRF failure apart. Storage failures
/// while checking a session surface as server errors instead.
///
/// ```rust,ignore
/// pub async fn get_balance(
///     Auth(_caller): Auth,
///     State(ctx): State<ApiContext>,
/// ) -> Result<Json<Balance>, ApiError> {
///     Ok(Json(ctx.phoenixd.active().await.get_balance().await?))
/// }
/// ```
pub struct Auth(pub Caller);

impl FromRequestParts<ApiContext> for Auth {
    type Rejection = ApiError;

    fn from_request_parts(
        parts: &mut Parts,
        state: &ApiContext,
    ) -> impl Future<Output = Result<Self, Self::Rejection>> + Send {
        let auth_manager = Arc::clone(&state.auth_manager);
        async move {
            let caller = auth_manager.authenticate(parts).await?;
            Ok(Auth(caller))
        }
    }
}

/// Like [`Auth`], but never rejects. Used by endpoints that answer
/// differently for anonymous callers.
pub struct MaybeAuth(pub Option<Caller>);

impl FromRequestParts<ApiContext> for MaybeAuth {
    type Rejection = Infallible;

    fn from_request_parts(
        parts: &mut Parts,
        state: &ApiContext,
    ) -> impl Future<Output = Result<Self, Self::Rejection>> + Send {
        let auth_manager = Arc::clone(&state.auth_manager);
        async move { Ok(MaybeAuth(auth_manager.authenticate(parts).await.ok())) }
    }
}
