use std::{sync::Arc, time::Duration};

use chrono::Utc;
use pdash_db::storage::{SessionStore, Storage};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

/// Periodically purge sessions past their `expires_at`.
///
/// Lookups already delete the expired sessions they find; this catches the
/// ones nobody presents again.
pub fn spawn_session_sweeper(
    db: Arc<dyn Storage>,
    interval: Duration,
    cancel: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = ticker.tick() => sweep(&*db).await,
            }
        }

        debug!("Session sweeper stopped");
    })
}

#[instrument(skip_all)]
async fn sweep(db: &dyn Storage) {
    match SessionStore::delete_expired(db, Utc::now()).await {
        Ok(0) => debug!("No expired sessions"),
        Ok(count) => info!(count, "Deleted expired sessions"),
        Err(e) => warn!(error = %e, "Failed to delete expired sessions"),
    }
}
