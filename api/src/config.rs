use clap::{Parser, ValueEnum};
use std::{net::SocketAddr, path::PathBuf, time::Duration};

pub const DEFAULT_PHOENIXD_URL: &str = "http://127.0.0.1:9740";

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

#[derive(Clone, Debug, Parser)]
#[command(name = "pdash-api", version, about = "phoenixd dashboard backend")]
pub struct PdashApiConfig {
    #[clap(
        short,
        long,
        env = "PDASH_BIND_ADDR",
        default_value = "0.0.0.0:4000"
    )]
    pub bind_addr: SocketAddr,

    /// Origin of the dashboard frontend. Used as the CORS origin and to
    /// decide whether session cookies are marked `Secure`.
    #[clap(
        long,
        env = "PDASH_PUBLIC_URL",
        default_value = "http://localhost:3000"
    )]
    pub public_url: String,

    #[clap(long, default_value_t = false)]
    pub dump_openapi: bool,

    #[clap(long, env = "PDASH_LOG_FORMAT", value_enum, default_value_t = LogFormat::Pretty)]
    pub log_format: LogFormat,

    /// MongoDB connection string. Without one, sessions and settings live in
    /// memory and are lost on restart.
    #[clap(long, env = "PDASH_DATABASE_URI")]
    pub database_uri: Option<String>,

    /// Hex encoded 32 byte key used to sign session cookies.
    ///
    /// When unset, a key is generated on first start and kept in the
    /// settings store.
    #[clap(long, env = "PDASH_SESSION_SECRET")]
    pub session_secret: Option<String>,

    /// How often expired sessions are purged, in seconds.
    #[clap(long, env = "PDASH_SESSION_SWEEP_SECS", default_value_t = 900)]
    pub session_sweep_secs: u64,

    /// Base URL of the local phoenixd HTTP API.
    #[clap(long, env = "PDASH_PHOENIXD_URL", default_value = DEFAULT_PHOENIXD_URL)]
    pub phoenixd_url: String,

    /// HTTP password of the local phoenixd. Read from `phoenix.conf` when
    /// unset.
    #[clap(long, env = "PDASH_PHOENIXD_PASSWORD")]
    pub phoenixd_password: Option<String>,

    /// Path of the local phoenixd's `phoenix.conf`. Defaults to
    /// `$HOME/.phoenix/phoenix.conf`.
    #[clap(long, env = "PDASH_PHOENIXD_CONF")]
    pub phoenixd_conf: Option<PathBuf>,

    /// Fixed delay between event stream reconnect attempts, in seconds.
    #[clap(long, env = "PDASH_PHOENIXD_RECONNECT_SECS", default_value_t = 5)]
    pub phoenixd_reconnect_secs: u64,

    /// Timeout of phoenixd HTTP calls, in seconds.
    #[clap(long, env = "PDASH_PHOENIXD_TIMEOUT_SECS", default_value_t = 30)]
    pub phoenixd_timeout_secs: u64,

    /// phoenixd binary to launch and supervise as the local instance.
    #[clap(long, env = "PDASH_PHOENIXD_BINARY", requires = "phoenixd_data_dir")]
    pub phoenixd_binary: Option<PathBuf>,

    /// Home directory of the launched phoenixd; its data lands in
    /// `<dir>/.phoenix`.
    #[clap(long, env = "PDASH_PHOENIXD_DATA_DIR")]
    pub phoenixd_data_dir: Option<PathBuf>,
}

impl PdashApiConfig {
    /// Session cookies carry `Secure` when the frontend is served over TLS.
    pub fn secure_cookies(&self) -> bool {
        self.public_url.starts_with("https://")
    }

    /// Decode the configured session secret, if any.
    ///
    /// # Errors
    ///
    /// Returns an error if the secret is not hex or not exactly 32 bytes.
    pub fn session_secret_bytes(&self) -> anyhow::Result<Option<[u8; 32]>> {
        let Some(ref secret) = self.session_secret else {
            return Ok(None);
        };

        let bytes = hex::decode(secret.trim())
            .map_err(|e| anyhow::anyhow!("PDASH_SESSION_SECRET is not valid hex: {}", e))?;
        let key: [u8; 32] = bytes.try_into().map_err(|b: Vec<u8>| {
            anyhow::anyhow!("PDASH_SESSION_SECRET must be 32 bytes, got {}", b.len())
        })?;

        Ok(Some(key))
    }

    pub fn phoenixd_conf_path(&self) -> Option<PathBuf> {
        self.phoenixd_conf.clone().or_else(|| {
            std::env::var_os("HOME")
                .map(|home| PathBuf::from(home).join(".phoenix").join("phoenix.conf"))
        })
    }

    pub fn session_sweep_interval(&self) -> Duration {
        Duration::from_secs(self.session_sweep_secs.max(1))
    }

    pub fn phoenixd_reconnect_interval(&self) -> Duration {
        Duration::from_secs(self.phoenixd_reconnect_secs.max(1))
    }

    pub fn phoenixd_timeout(&self) -> Duration {
        Duration::from_secs(self.phoenixd_timeout_secs.max(1))
    }
}
