use axum::{
    Json,
    extract::{
        State, WebSocketUpgrade,
        ws::{Message, WebSocket},
    },
    response::Response,
};
use chrono::Utc;
use pdash_common::{
    params::{TestPhoenixdParams, UpdatePhoenixdConfigParams},
    views::{
        DashboardEvent, PhoenixdEvent, PhoenixdMode, PhoenixdStatus, PhoenixdTestResult,
        StreamState,
    },
};
use pdash_db::storage::SettingsStore;
use tokio::sync::{
    broadcast::{self, error::RecvError},
    watch,
};
use tracing::{debug, info, instrument, warn};

use crate::{auth::Auth, context::ApiContext, error::ApiError, phoenixd::PhoenixdConnection};

#[cfg(test)]
mod tests;

async fn current_status(ctx: &ApiContext) -> PhoenixdStatus {
    let mut status = ctx.phoenixd.status().await;
    if let Some(ref launcher) = ctx.launcher {
        status.launcher = Some(launcher.status().await);
    }
    status
}

#[utoipa::path(
    get,
    path = "/api/v1/phoenixd/status",
    tags = ["phoenixd"],
    responses((status = 200, description = "Active phoenixd and event stream state", body = PhoenixdStatus))
)]
pub async fn phoenixd_status(
    Auth(_caller): Auth,
    State(ctx): State<ApiContext>,
) -> Result<Json<PhoenixdStatus>, ApiError> {
    Ok(Json(current_status(&ctx).await))
}

#[utoipa::path(
    put,
    path = "/api/v1/phoenixd/config",
    tags = ["phoenixd"],
    request_body(content = UpdatePhoenixdConfigParams, content_type = "application/json"),
    responses((status = 200, description = "Configuration saved and applied", body = PhoenixdStatus))
)]
#[instrument(skip_all, fields(mode = ?body.mode))]
pub async fn update_phoenixd_config(
    Auth(_caller): Auth,
    State(ctx): State<ApiContext>,
    Json(body): Json<UpdatePhoenixdConfigParams>,
) -> Result<Json<PhoenixdStatus>, ApiError> {
    body.validate()?;

    let mut settings = SettingsStore::get_settings(&*ctx.db).await?;
    let connection = match body.mode {
        PhoenixdMode::Local => {
            settings.phoenixd.use_external = false;
            ctx.phoenixd.local().clone()
        }
        PhoenixdMode::External => {
            let (Some(url), Some(password)) = (body.url, body.password) else {
                return Err(ApiError::bad_request(
                    "An external phoenixd needs a URL and a password",
                ));
            };

            let connection = PhoenixdConnection::external(url, password);
            settings.phoenixd.use_external = true;
            settings.phoenixd.external_url = Some(connection.url().to_string());
            settings.phoenixd.external_password = Some(connection.password().to_string());
            connection
        }
    };

    settings.updated_at = Utc::now();
    SettingsStore::put_settings(&*ctx.db, settings).await?;

    ctx.phoenixd.switch(connection).await?;
    info!("phoenixd configuration applied");

    Ok(Json(current_status(&ctx).await))
}

#[utoipa::path(
    post,
    path = "/api/v1/phoenixd/test",
    tags = ["phoenixd"],
    request_body(content = TestPhoenixdParams, content_type = "application/json"),
    responses((status = 200, description = "Probe outcome; the active instance is unchanged", body = PhoenixdTestResult))
)]
pub async fn test_phoenixd(
    Auth(_caller): Auth,
    State(ctx): State<ApiContext>,
    Json(body): Json<TestPhoenixdParams>,
) -> Result<Json<PhoenixdTestResult>, ApiError> {
    body.validate()?;

    let result = ctx
        .phoenixd
        .test(PhoenixdConnection::external(body.url, body.password))
        .await;

    Ok(Json(result))
}

#[utoipa::path(
    get,
    path = "/api/v1/events",
    tags = ["phoenixd"],
    responses((status = 101, description = "WebSocket relaying phoenixd events and connection changes"))
)]
pub async fn events(
    Auth(_caller): Auth,
    State(ctx): State<ApiContext>,
    ws: WebSocketUpgrade,
) -> Response {
    let events = ctx.phoenixd.subscribe();
    let state = ctx.phoenixd.watch_state();

    ws.on_upgrade(move |socket| relay_events(socket, events, state))
}

async fn send_event(socket: &mut WebSocket, event: &DashboardEvent) -> Result<(), axum::Error> {
    match serde_json::to_string(event) {
        Ok(text) => socket.send(Message::Text(text.into())).await,
        Err(e) => {
            warn!(error = %e, "Failed to serialize dashboard event");
            Ok(())
        }
    }
}

/// Forward events to one dashboard client until either side goes away.
///
/// The client first receives the current stream state, then every phoenixd
/// event and every state change. A client too slow to keep up gets a
/// `lagged` notice with the number of dropped events.
async fn relay_events(
    mut socket: WebSocket,
    mut events: broadcast::Receiver<PhoenixdEvent>,
    mut state: watch::Receiver<StreamState>,
) {
    let initial = DashboardEvent::Connection(state.borrow_and_update().clone());
    if send_event(&mut socket, &initial).await.is_err() {
        return;
    }

    loop {
        let event = tokio::select! {
            received = events.recv() => match received {
                Ok(event) => DashboardEvent::Phoenixd(event),
                Err(RecvError::Lagged(skipped)) => {
                    warn!(skipped, "Dashboard client lagging behind phoenixd events");
                    DashboardEvent::Lagged { skipped }
                }
                Err(RecvError::Closed) => break,
            },
            changed = state.changed() => match changed {
                Ok(()) => DashboardEvent::Connection(state.borrow_and_update().clone()),
                Err(_) => break,
            },
            incoming = socket.recv() => match incoming {
                Some(Ok(Message::Close(_))) | Some(Err(_)) | None => break,
                Some(Ok(_)) => continue,
            },
        };

        if send_event(&mut socket, &event).await.is_err() {
            break;
        }
    }

    debug!("Dashboard event client disconnected");
}
