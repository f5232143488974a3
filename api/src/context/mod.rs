use std::{sync::Arc, time::Duration};

use chrono::Utc;
use pdash_db::storage::{SettingsStore, Storage};
use tracing::{info, instrument, warn};

use crate::{
    auth::{AuthManager, OpenAccessProvider, SessionAuthProvider, SessionSigner},
    config::PdashApiConfig,
    launcher::LocalPhoenixd,
    phoenixd::{PhoenixdConnection, PhoenixdManager, connection::read_http_password},
};

/// How long a launched phoenixd gets to write its `phoenix.conf`.
const LAUNCHER_PASSWORD_TIMEOUT: Duration = Duration::from_secs(60);

#[derive(Clone)]
pub struct ApiContext {
    pub config: Arc<PdashApiConfig>,
    pub db: Arc<dyn Storage>,
    pub auth_manager: Arc<AuthManager>,
    pub signer: SessionSigner,
    pub phoenixd: Arc<PhoenixdManager>,
    pub launcher: Option<Arc<LocalPhoenixd>>,
}

impl ApiContext {
    pub async fn new(
        config: PdashApiConfig,
        db: Arc<dyn Storage>,
        launcher: Option<Arc<LocalPhoenixd>>,
    ) -> anyhow::Result<Self> {
        let signer = resolve_signer(&config, &*db).await?;

        let local_password = resolve_local_password(&config, launcher.as_deref()).await?;
        let local = PhoenixdConnection::local(config.phoenixd_url.as_str(), local_password);
        let phoenixd = Arc::new(PhoenixdManager::new(
            local,
            config.phoenixd_reconnect_interval(),
            config.phoenixd_timeout(),
        )?);
        apply_persisted_connection(&phoenixd, &*db).await?;

        let auth_manager = AuthManager::new()
            .with_provider(OpenAccessProvider::new(Arc::clone(&db)))
            .with_provider(SessionAuthProvider::new(signer.clone(), Arc::clone(&db)));

        Ok(Self {
            config: Arc::new(config),
            db,
            auth_manager: Arc::new(auth_manager),
            signer,
            phoenixd,
            launcher,
        })
    }

    pub fn secure_cookies(&self) -> bool {
        self.config.secure_cookies()
    }
}

/// Configured secret first, then the one persisted in settings. Without
/// either, a fresh secret is generated and persisted so sessions survive a
/// restart.
#[instrument(skip_all)]
async fn resolve_signer(
    config: &PdashApiConfig,
    db: &dyn Storage,
) -> anyhow::Result<SessionSigner> {
    if let Some(secret) = config.session_secret_bytes()? {
        return Ok(SessionSigner::new(secret));
    }

    let mut settings = SettingsStore::get_settings(db).await?;
    if let Some(ref stored) = settings.session_secret {
        match SessionSigner::from_hex(stored) {
            Some(signer) => return Ok(signer),
            None => warn!("Stored session secret is invalid, generating a new one"),
        }
    }

    let signer = SessionSigner::new(SessionSigner::generate_secret());
    settings.session_secret = Some(signer.secret_hex());
    settings.updated_at = Utc::now();
    SettingsStore::put_settings(db, settings).await?;
    info!("Generated a new session signing secret");

    Ok(signer)
}

async fn resolve_local_password(
    config: &PdashApiConfig,
    launcher: Option<&LocalPhoenixd>,
) -> anyhow::Result<String> {
    if let Some(launcher) = launcher {
        return launcher.wait_for_password(LAUNCHER_PASSWORD_TIMEOUT).await;
    }

    if let Some(ref password) = config.phoenixd_password {
        return Ok(password.clone());
    }

    if let Some(path) = config.phoenixd_conf_path() {
        match read_http_password(&path) {
            Ok(Some(password)) => {
                info!(path = %path.display(), "Read phoenixd password from config file");
                return Ok(password);
            }
            Ok(None) => {}
            Err(e) => warn!(path = %path.display(), error = %e, "Failed to read phoenixd config"),
        }
    }

    warn!("No password for the local phoenixd; calls to it will be rejected");
    Ok(String::new())
}

/// Switch to the external instance saved by the operator, if any.
async fn apply_persisted_connection(
    phoenixd: &PhoenixdManager,
    db: &dyn Storage,
) -> anyhow::Result<()> {
    let settings = SettingsStore::get_settings(db).await?;
    if !settings.phoenixd.use_external {
        return Ok(());
    }

    match settings.phoenixd.external() {
        Some((url, password)) => {
            info!(url, "Using saved external phoenixd");
            phoenixd
                .switch(PhoenixdConnection::external(url, password))
                .await?;
        }
        None => warn!("External phoenixd selected but no URL or password saved, using local"),
    }

    Ok(())
}
