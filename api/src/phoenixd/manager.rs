use std::{sync::Arc, time::Duration};

use pdash_common::views::{
    PhoenixdEvent, PhoenixdMode, PhoenixdStatus, PhoenixdTestResult, StreamState,
};
use tokio::sync::{Mutex, RwLock, broadcast, watch};
use tracing::{info, instrument};

use super::{EventStream, PhoenixdClient, PhoenixdConnection, PhoenixdError};

/// Events buffered per subscriber before it is reported as lagging.
pub const EVENT_CHANNEL_CAPACITY: usize = 256;

/// Owns the active phoenixd connection.
///
/// Handlers grab the current [`PhoenixdClient`] through [`Self::active`];
/// switching instances swaps it atomically, so in-flight calls finish against
/// the instance they started on. Subscribers of [`Self::subscribe`] keep
/// their receiver across switches.
pub struct PhoenixdManager {
    local: PhoenixdConnection,
    client: RwLock<Arc<PhoenixdClient>>,
    events: broadcast::Sender<PhoenixdEvent>,
    state: Arc<watch::Sender<StreamState>>,
    /// `Some` while the event stream is wanted. Held across restarts so only
    /// one supervisor exists at a time.
    stream: Mutex<Option<EventStream>>,
    retry_interval: Duration,
    timeout: Duration,
}

impl PhoenixdManager {
    pub fn new(
        local: PhoenixdConnection,
        retry_interval: Duration,
        timeout: Duration,
    ) -> Result<Self, PhoenixdError> {
        let client = PhoenixdClient::new(local.clone(), timeout)?;
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        let (state, _) = watch::channel(StreamState::Stopped);

        Ok(Self {
            local,
            client: RwLock::new(Arc::new(client)),
            events,
            state: Arc::new(state),
            stream: Mutex::new(None),
            retry_interval,
            timeout,
        })
    }

    pub async fn active(&self) -> Arc<PhoenixdClient> {
        Arc::clone(&*self.client.read().await)
    }

    pub async fn connection(&self) -> PhoenixdConnection {
        self.client.read().await.connection().clone()
    }

    /// The instance configured at startup, used when no external one is set.
    pub fn local(&self) -> &PhoenixdConnection {
        &self.local
    }

    pub fn subscribe(&self) -> broadcast::Receiver<PhoenixdEvent> {
        self.events.subscribe()
    }

    #[cfg(test)]
    pub(crate) fn publish(&self, event: PhoenixdEvent) {
        let _ = self.events.send(event);
    }

    pub fn stream_state(&self) -> StreamState {
        self.state.borrow().clone()
    }

    pub fn watch_state(&self) -> watch::Receiver<StreamState> {
        self.state.subscribe()
    }

    /// Start streaming events from the active instance. No-op if running.
    pub async fn start(&self) {
        let mut stream = self.stream.lock().await;
        if stream.is_some() {
            return;
        }

        let connection = self.connection().await;
        info!(url = connection.url(), "Starting phoenixd event stream");
        *stream = Some(self.spawn_stream(connection));
    }

    pub async fn stop(&self) {
        let running = self.stream.lock().await.take();
        if let Some(running) = running {
            running.stop().await;
        }
    }

    /// Point the dashboard at another phoenixd instance.
    ///
    /// The event stream, if running, is stopped and restarted against the
    /// new instance before this returns.
    #[instrument(skip_all, fields(mode = ?connection.mode, url = connection.url()))]
    pub async fn switch(&self, connection: PhoenixdConnection) -> Result<(), PhoenixdError> {
        let client = Arc::new(PhoenixdClient::new(connection.clone(), self.timeout)?);

        let mut stream = self.stream.lock().await;

        let previous = {
            let mut active = self.client.write().await;
            std::mem::replace(&mut *active, client)
        };

        if previous.connection() == &connection {
            info!("phoenixd connection unchanged");
        } else {
            info!(from = previous.connection().url(), "Switched phoenixd instance");
        }

        if let Some(running) = stream.take() {
            running.stop().await;
            *stream = Some(self.spawn_stream(connection));
        }

        Ok(())
    }

    /// Switch back to the instance configured at startup.
    pub async fn use_local(&self) -> Result<(), PhoenixdError> {
        self.switch(self.local.clone()).await
    }

    /// Probe an instance without making it active.
    pub async fn test(&self, connection: PhoenixdConnection) -> PhoenixdTestResult {
        let outcome = match PhoenixdClient::new(connection, self.timeout) {
            Ok(client) => client.get_info().await,
            Err(e) => Err(e),
        };

        match outcome {
            Ok(info) => PhoenixdTestResult {
                ok: true,
                node_id: Some(info.node_id),
                chain: Some(info.chain),
                error: None,
            },
            Err(e) => PhoenixdTestResult {
                ok: false,
                node_id: None,
                chain: None,
                error: Some(e.to_string()),
            },
        }
    }

    /// Current connection status. `launcher` is filled in by the caller.
    pub async fn status(&self) -> PhoenixdStatus {
        let client = self.active().await;
        let connection = client.connection();

        PhoenixdStatus {
            mode: connection.mode,
            url: connection.url().to_string(),
            http_reachable: client.get_info().await.is_ok(),
            events: self.stream_state(),
            launcher: None,
        }
    }

    pub async fn mode(&self) -> PhoenixdMode {
        self.client.read().await.connection().mode
    }

    fn spawn_stream(&self, connection: PhoenixdConnection) -> EventStream {
        EventStream::spawn(
            connection,
            self.events.clone(),
            Arc::clone(&self.state),
            self.retry_interval,
        )
    }
}
