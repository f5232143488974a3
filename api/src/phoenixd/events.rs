//! Supervisor for the phoenixd WebSocket event stream.
//!
//! One [`EventStream`] task owns the socket to one phoenixd instance. It
//! connects, forwards every event onto a broadcast channel, and when the
//! socket fails or closes it waits a fixed interval and connects again. There
//! is no backoff: phoenixd is usually a local process that comes back quickly.
//!
//! A task makes one connection attempt at a time. Switching phoenixd
//! instances stops the running task (and waits for it) before a new one is
//! spawned, so two supervisors never race for the same broadcast channel.

use std::{sync::Arc, time::Duration};

use chrono::Utc;
use futures::StreamExt;
use pdash_common::views::{PhoenixdEvent, StreamState};
use tokio::{
    sync::{broadcast, watch},
    task::JoinHandle,
};
use tokio_tungstenite::{
    connect_async,
    tungstenite::{
        self, Message,
        client::IntoClientRequest,
        handshake::client::Request,
        http::{HeaderValue, StatusCode, header::AUTHORIZATION},
    },
};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument, warn};

use super::PhoenixdConnection;

pub struct EventStream {
    cancel: CancellationToken,
    task: JoinHandle<()>,
}

impl EventStream {
    pub fn spawn(
        connection: PhoenixdConnection,
        events: broadcast::Sender<PhoenixdEvent>,
        state: Arc<watch::Sender<StreamState>>,
        retry_interval: Duration,
    ) -> Self {
        let cancel = CancellationToken::new();
        let task = tokio::spawn(supervise(
            connection,
            events,
            state,
            retry_interval,
            cancel.clone(),
        ));

        Self { cancel, task }
    }

    /// Cancels the task and waits until it has released its socket.
    pub async fn stop(self) {
        self.cancel.cancel();
        if let Err(e) = self.task.await {
            if e.is_panic() {
                error!("phoenixd event stream task panicked");
            }
        }
    }
}

/// Why a single connection ended.
struct Disconnect {
    reason: String,
    was_connected: bool,
}

impl Disconnect {
    fn before_connect(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
            was_connected: false,
        }
    }

    fn after_connect(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
            was_connected: true,
        }
    }
}

#[instrument(name = "phoenixd_events", skip_all, fields(url = connection.url()))]
async fn supervise(
    connection: PhoenixdConnection,
    events: broadcast::Sender<PhoenixdEvent>,
    state: Arc<watch::Sender<StreamState>>,
    retry_interval: Duration,
    cancel: CancellationToken,
) {
    let mut attempt: u32 = 0;

    loop {
        attempt = attempt.saturating_add(1);
        state.send_replace(StreamState::Connecting { attempt });

        let disconnect = tokio::select! {
            _ = cancel.cancelled() => break,
            disconnect = stream_once(&connection, &events, &state) => disconnect,
        };

        if disconnect.was_connected {
            attempt = 0;
        }

        warn!(
            reason = %disconnect.reason,
            retry_in = ?retry_interval,
            "phoenixd event stream disconnected"
        );
        state.send_replace(StreamState::Disconnected {
            reason: disconnect.reason,
            retry_in_secs: retry_interval.as_secs(),
        });

        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = tokio::time::sleep(retry_interval) => {}
        }
    }

    debug!("phoenixd event stream stopped");
    state.send_replace(StreamState::Stopped);
}

fn websocket_request(connection: &PhoenixdConnection) -> Result<Request, String> {
    let url = connection.websocket_url().map_err(|e| e.to_string())?;
    let mut request = url
        .into_client_request()
        .map_err(|e| format!("invalid websocket url: {e}"))?;

    let auth = HeaderValue::from_str(&connection.basic_auth_header())
        .map_err(|e| format!("invalid phoenixd password: {e}"))?;
    request.headers_mut().insert(AUTHORIZATION, auth);

    Ok(request)
}

fn describe_connect_error(err: tungstenite::Error) -> String {
    match err {
        tungstenite::Error::Http(response) if response.status() == StatusCode::UNAUTHORIZED => {
            "phoenixd rejected the HTTP password".into()
        }
        other => other.to_string(),
    }
}

async fn stream_once(
    connection: &PhoenixdConnection,
    events: &broadcast::Sender<PhoenixdEvent>,
    state: &watch::Sender<StreamState>,
) -> Disconnect {
    let request = match websocket_request(connection) {
        Ok(request) => request,
        Err(reason) => return Disconnect::before_connect(reason),
    };

    let mut socket = match connect_async(request).await {
        Ok((socket, _)) => socket,
        Err(e) => return Disconnect::before_connect(describe_connect_error(e)),
    };

    info!("Connected to phoenixd event stream");
    state.send_replace(StreamState::Connected { since: Utc::now() });

    while let Some(message) = socket.next().await {
        match message {
            Ok(Message::Text(text)) => match PhoenixdEvent::from_json(text.as_str()) {
                Ok(event) => {
                    if let Some(payment) = event.payment_received() {
                        info!(
                            amount_sat = payment.amount_sat,
                            payment_hash = %payment.payment_hash,
                            "Payment received"
                        );
                    } else {
                        debug!(kind = event.kind(), "phoenixd event");
                    }

                    // no subscribers is fine, the event is simply dropped
                    let _ = events.send(event);
                }
                Err(e) => warn!(error = %e, "Ignoring malformed phoenixd event"),
            },
            Ok(Message::Close(frame)) => {
                let reason = match frame {
                    Some(frame) if !frame.reason.is_empty() => {
                        format!("closed by phoenixd: {}", frame.reason)
                    }
                    _ => "closed by phoenixd".to_string(),
                };
                return Disconnect::after_connect(reason);
            }
            Ok(_) => {}
            Err(e) => return Disconnect::after_connect(e.to_string()),
        }
    }

    Disconnect::after_connect("stream ended")
}
