use axum::{
    Json,
    extract::State,
    http::{HeaderMap, HeaderName, HeaderValue, StatusCode, header::SET_COOKIE},
};
use chrono::Utc;
use pdash_common::{
    params::{
        AuthLoginParams, AuthSetupParams, ChangePasswordParams, RemovePasswordParams,
        UpdateAuthSettingsParams,
    },
    views::{AuthLoginResponse, AuthSettings, AuthStatus},
};
use pdash_db::{
    models::{DbSession, DbSettings},
    password::{hash_password, verify_password},
    storage::{SessionStore, SettingsStore},
};
use tracing::{info, instrument};

use crate::{
    auth::{
        Auth, MaybeAuth,
        cookies::{SESSION_COOKIE, clear_session_cookie, find_cookie, session_cookie},
    },
    context::ApiContext,
    error::ApiError,
};

#[cfg(test)]
mod tests;

type SetCookie = [(HeaderName, HeaderValue); 1];
type SessionResponse = (StatusCode, SetCookie, Json<AuthLoginResponse>);

async fn hash(password: String) -> Result<String, ApiError> {
    tokio::task::spawn_blocking(move || hash_password(&password))
        .await
        .map_err(|e| ApiError::internal(format!("Password hashing task failed: {e}")))?
        .map_err(|e| ApiError::internal(format!("Failed to hash password: {e}")))
}

async fn verify(password: String, hash: String) -> Result<bool, ApiError> {
    tokio::task::spawn_blocking(move || verify_password(&password, &hash))
        .await
        .map_err(|e| ApiError::internal(format!("Password verification task failed: {e}")))
}

/// Check `password` against the stored hash. 400 when no password is set.
async fn check_password(settings: &DbSettings, password: String) -> Result<(), ApiError> {
    let Some(stored) = settings.password_hash.clone() else {
        return Err(ApiError::bad_request("No dashboard password is configured"));
    };

    if verify(password, stored).await? {
        Ok(())
    } else {
        Err(ApiError::unauthorized("Invalid password"))
    }
}

/// Create a session and the cookie carrying it.
async fn start_session(
    ctx: &ApiContext,
    settings: &DbSettings,
    status: StatusCode,
) -> Result<SessionResponse, ApiError> {
    let ttl = settings.session_ttl();
    let session = DbSession::issue(Utc::now(), ttl);
    SessionStore::create_session(&*ctx.db, session.clone()).await?;

    let cookie = session_cookie(&ctx.signer.sign(&session.id), ttl, ctx.secure_cookies());

    Ok((
        status,
        [(SET_COOKIE, cookie)],
        Json(AuthLoginResponse::Session {
            csrf_token: session.csrf_token,
            expires_at: session.expires_at,
        }),
    ))
}

#[utoipa::path(
    get,
    path = "/api/v1/auth/status",
    tags = ["auth"],
    responses((status = 200, description = "Authentication status", body = AuthStatus))
)]
pub async fn auth_status(
    State(ctx): State<ApiContext>,
    MaybeAuth(caller): MaybeAuth,
) -> Result<Json<AuthStatus>, ApiError> {
    let settings = SettingsStore::get_settings(&*ctx.db).await?;

    Ok(Json(AuthStatus {
        password_configured: settings.has_password(),
        authenticated: caller.is_some(),
        auto_lock_minutes: settings.auto_lock_minutes,
    }))
}

#[utoipa::path(
    post,
    path = "/api/v1/auth/setup",
    tags = ["auth"],
    request_body(content = AuthSetupParams, content_type = "application/json"),
    responses(
        (status = 201, description = "Password set, session started", body = AuthLoginResponse),
        (status = 409, description = "A password is already configured", body = pdash_common::views::ApiErrorResponse),
    )
)]
#[instrument(skip_all)]
pub async fn auth_setup(
    State(ctx): State<ApiContext>,
    Json(body): Json<AuthSetupParams>,
) -> Result<SessionResponse, ApiError> {
    body.validate()?;

    let already_configured = || ApiError::conflict("A dashboard password is already configured");

    if SettingsStore::get_settings(&*ctx.db).await?.has_password() {
        return Err(already_configured());
    }

    let password_hash = hash(body.password).await?;
    if !SettingsStore::set_initial_password(&*ctx.db, password_hash, Utc::now()).await? {
        return Err(already_configured());
    }
    info!("Dashboard password configured");

    let settings = SettingsStore::get_settings(&*ctx.db).await?;
    start_session(&ctx, &settings, StatusCode::CREATED).await
}

#[utoipa::path(
    post,
    path = "/api/v1/auth/login",
    tags = ["auth"],
    request_body(content = AuthLoginParams, content_type = "application/json"),
    responses((status = 201, description = "Successful login", body = AuthLoginResponse))
)]
#[instrument(skip_all)]
pub async fn auth_login(
    State(ctx): State<ApiContext>,
    Json(body): Json<AuthLoginParams>,
) -> Result<SessionResponse, ApiError> {
    let settings = SettingsStore::get_settings(&*ctx.db).await?;
    check_password(&settings, body.password).await?;

    info!("Operator logged in");
    start_session(&ctx, &settings, StatusCode::CREATED).await
}

#[utoipa::path(
    post,
    path = "/api/v1/auth/logout",
    tags = ["auth"],
    responses((status = 204, description = "Session ended, cookie cleared"))
)]
pub async fn auth_logout(
    State(ctx): State<ApiContext>,
    headers: HeaderMap,
) -> Result<(StatusCode, SetCookie), ApiError> {
    if let Some(session_id) =
        find_cookie(&headers, SESSION_COOKIE).and_then(|signed| ctx.signer.verify(&signed))
    {
        SessionStore::delete_session(&*ctx.db, &session_id).await?;
    }

    Ok((
        StatusCode::NO_CONTENT,
        [(SET_COOKIE, clear_session_cookie(ctx.secure_cookies()))],
    ))
}

#[utoipa::path(
    put,
    path = "/api/v1/auth/password",
    tags = ["auth"],
    request_body(content = ChangePasswordParams, content_type = "application/json"),
    responses((status = 200, description = "Password changed, other sessions revoked", body = AuthLoginResponse))
)]
#[instrument(skip_all)]
pub async fn change_password(
    Auth(caller): Auth,
    State(ctx): State<ApiContext>,
    Json(body): Json<ChangePasswordParams>,
) -> Result<SessionResponse, ApiError> {
    let mut settings = SettingsStore::get_settings(&*ctx.db).await?;
    check_password(&settings, body.current_password.clone()).await?;
    body.validate()?;

    settings.password_hash = Some(hash(body.new_password).await?);
    settings.updated_at = Utc::now();
    SettingsStore::put_settings(&*ctx.db, settings.clone()).await?;

    let revoked = SessionStore::delete_all_sessions(&*ctx.db).await?;
    info!(revoked, session = caller.session_id(), "Dashboard password changed");

    start_session(&ctx, &settings, StatusCode::OK).await
}

#[utoipa::path(
    delete,
    path = "/api/v1/auth/password",
    tags = ["auth"],
    request_body(content = RemovePasswordParams, content_type = "application/json"),
    responses((status = 204, description = "Password removed, dashboard is open"))
)]
#[instrument(skip_all)]
pub async fn remove_password(
    Auth(caller): Auth,
    State(ctx): State<ApiContext>,
    Json(body): Json<RemovePasswordParams>,
) -> Result<(StatusCode, SetCookie), ApiError> {
    let mut settings = SettingsStore::get_settings(&*ctx.db).await?;
    check_password(&settings, body.current_password).await?;

    settings.password_hash = None;
    settings.updated_at = Utc::now();
    SettingsStore::put_settings(&*ctx.db, settings).await?;

    let revoked = SessionStore::delete_all_sessions(&*ctx.db).await?;
    info!(revoked, session = caller.session_id(), "Dashboard password removed");

    Ok((
        StatusCode::NO_CONTENT,
        [(SET_COOKIE, clear_session_cookie(ctx.secure_cookies()))],
    ))
}

#[utoipa::path(
    get,
    path = "/api/v1/auth/settings",
    tags = ["auth"],
    responses((status = 200, description = "Session policy", body = AuthSettings))
)]
pub async fn get_auth_settings(
    Auth(_caller): Auth,
    State(ctx): State<ApiContext>,
) -> Result<Json<AuthSettings>, ApiError> {
    let settings = SettingsStore::get_settings(&*ctx.db).await?;
    Ok(Json(settings.auth_settings()))
}

#[utoipa::path(
    put,
    path = "/api/v1/auth/settings",
    tags = ["auth"],
    request_body(content = UpdateAuthSettingsParams, content_type = "application/json"),
    responses((status = 200, description = "Updated session policy", body = AuthSettings))
)]
#[instrument(skip_all)]
pub async fn update_auth_settings(
    Auth(_caller): Auth,
    State(ctx): State<ApiContext>,
    Json(body): Json<UpdateAuthSettingsParams>,
) -> Result<Json<AuthSettings>, ApiError> {
    body.validate()?;

    let mut settings = SettingsStore::get_settings(&*ctx.db).await?;
    if let Some(minutes) = body.auto_lock_minutes {
        settings.auto_lock_minutes = minutes;
    }
    if let Some(hours) = body.session_ttl_hours {
        settings.session_ttl_hours = hours;
    }
    settings.updated_at = Utc::now();
    SettingsStore::put_settings(&*ctx.db, settings.clone()).await?;

    info!(
        auto_lock_minutes = settings.auto_lock_minutes,
        session_ttl_hours = settings.session_ttl_hours,
        "Session policy updated"
    );
    Ok(Json(settings.auth_settings()))
}
