use std::{
    path::{Path, PathBuf},
    process::Stdio,
    time::Duration,
};

use anyhow::Context;
use pdash_common::views::LauncherStatus;
use tokio::{
    process::{Child, Command},
    sync::Mutex,
    time::Instant,
};
use tracing::{info, instrument, warn};

use crate::phoenixd::connection::read_http_password;

const PASSWORD_POLL_INTERVAL: Duration = Duration::from_millis(250);

/// A phoenixd process started and owned by the dashboard.
///
/// phoenixd keeps its state in `$HOME/.phoenix`, so the process runs with
/// `HOME` pointed at the data directory. The child is killed when this value
/// is dropped.
pub struct LocalPhoenixd {
    binary: PathBuf,
    data_dir: PathBuf,
    child: Mutex<Option<Child>>,
    pid: Option<u32>,
}

impl LocalPhoenixd {
    #[instrument(skip_all, fields(binary = %binary.display(), data_dir = %data_dir.display()))]
    pub fn spawn(binary: &Path, data_dir: &Path) -> anyhow::Result<Self> {
        std::fs::create_dir_all(data_dir)
            .with_context(|| format!("Failed to create {}", data_dir.display()))?;

        let child = Command::new(binary)
            .arg("--agree-to-terms-of-service")
            .args(["--http-bind-ip", "127.0.0.1"])
            .env("HOME", data_dir)
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .with_context(|| format!("Failed to start {}", binary.display()))?;

        let pid = child.id();
        info!(?pid, "Started local phoenixd");

        Ok(Self {
            binary: binary.to_path_buf(),
            data_dir: data_dir.to_path_buf(),
            child: Mutex::new(Some(child)),
            pid,
        })
    }

    pub fn conf_path(&self) -> PathBuf {
        self.data_dir.join(".phoenix").join("phoenix.conf")
    }

    /// Wait for phoenixd to write its `http-password` on first start.
    pub async fn wait_for_password(&self, timeout: Duration) -> anyhow::Result<String> {
        let path = self.conf_path();
        let deadline = Instant::now() + timeout;

        loop {
            if let Some(password) = read_http_password(&path)
                .with_context(|| format!("Failed to read {}", path.display()))?
            {
                return Ok(password);
            }

            if !self.is_running().await {
                anyhow::bail!("phoenixd exited before writing {}", path.display());
            }

            if Instant::now() >= deadline {
                anyhow::bail!(
                    "phoenixd did not write an http-password to {} within {:?}",
                    path.display(),
                    timeout
                );
            }

            tokio::time::sleep(PASSWORD_POLL_INTERVAL).await;
        }
    }

    async fn is_running(&self) -> bool {
        match self.child.lock().await.as_mut() {
            Some(child) => matches!(child.try_wait(), Ok(None)),
            None => false,
        }
    }

    pub async fn stop(&self) {
        let Some(mut child) = self.child.lock().await.take() else {
            return;
        };

        match child.kill().await {
            Ok(()) => info!(pid = ?self.pid, "Stopped local phoenixd"),
            Err(e) => warn!(error = %e, "Failed to stop local phoenixd"),
        }
    }

    pub async fn status(&self) -> LauncherStatus {
        let running = self.is_running().await;

        LauncherStatus {
            running,
            pid: if running { self.pid } else { None },
            binary: self.binary.display().to_string(),
            data_dir: self.data_dir.display().to_string(),
        }
    }
}
