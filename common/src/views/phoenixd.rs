use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;

/// Which phoenixd instance the dashboard is talking to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum PhoenixdMode {
    /// The phoenixd instance next to the dashboard (configured at startup or
    /// launched by it).
    Local,

    /// A phoenixd instance configured by the operator at runtime.
    External,
}

/// State of the phoenixd WebSocket event stream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum StreamState {
    /// No stream is running.
    Stopped,

    /// A connection attempt is in flight.
    Connecting { attempt: u32 },

    Connected { since: DateTime<Utc> },

    /// The last attempt failed or the connection dropped; another attempt
    /// follows after `retry_in_secs`.
    Disconnected { reason: String, retry_in_secs: u64 },
}

/// A phoenixd process supervised by the dashboard.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct LauncherStatus {
    pub running: bool,
    pub pid: Option<u32>,
    pub binary: String,
    pub data_dir: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PhoenixdStatus {
    pub mode: PhoenixdMode,

    /// Base URL of the active phoenixd HTTP API.
    pub url: String,

    /// `getinfo` answered when this status was computed.
    pub http_reachable: bool,

    pub events: StreamState,

    /// Present when the dashboard launched the local phoenixd itself.
    pub launcher: Option<LauncherStatus>,
}

/// Outcome of probing a phoenixd instance without switching to it.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PhoenixdTestResult {
    pub ok: bool,
    pub node_id: Option<String>,
    pub chain: Option<String>,
    pub error: Option<String>,
}

/// An event pushed by phoenixd over its WebSocket, forwarded untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(transparent)]
#[schema(value_type = Object)]
pub struct PhoenixdEvent(Value);

impl PhoenixdEvent {
    /// Parse a text frame. Frames must be JSON objects carrying a `type`.
    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        use serde::de::Error;

        let value: Value = serde_json::from_str(text)?;
        match value.get("type") {
            Some(Value::String(_)) => Ok(Self(value)),
            _ => Err(serde_json::Error::custom("event without a string `type`")),
        }
    }

    pub fn kind(&self) -> &str {
        self.0.get("type").and_then(Value::as_str).unwrap_or_default()
    }

    /// The typed form of a `payment_received` event.
    pub fn payment_received(&self) -> Option<PaymentReceived> {
        if self.kind() != "payment_received" {
            return None;
        }
        serde_json::from_value(self.0.clone()).ok()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PaymentReceived {
    pub amount_sat: u64,
    pub payment_hash: String,
    pub external_id: Option<String>,
    pub payer_note: Option<String>,
    pub payer_key: Option<String>,
    pub timestamp: Option<i64>,
}

/// A message on the dashboard's own event socket.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(tag = "channel", content = "data", rename_all = "snake_case")]
pub enum DashboardEvent {
    /// An event forwarded from phoenixd.
    Phoenixd(PhoenixdEvent),

    /// The phoenixd event stream changed state.
    Connection(StreamState),

    /// This client fell behind and missed `skipped` events.
    Lagged { skipped: u64 },
}
