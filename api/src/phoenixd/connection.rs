use std::{fmt, io, path::Path};

use base64::{Engine, engine::general_purpose::STANDARD};
use pdash_common::views::PhoenixdMode;

use super::PhoenixdError;

const HTTP_PASSWORD_KEY: &str = "http-password";

/// Where a phoenixd instance lives and how to authenticate against it.
///
/// phoenixd uses HTTP basic auth with an empty user name, both for its REST
/// API and for its `/websocket` endpoint.
#[derive(Clone, PartialEq, Eq)]
pub struct PhoenixdConnection {
    pub mode: PhoenixdMode,
    url: String,
    password: String,
}

impl fmt::Debug for PhoenixdConnection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PhoenixdConnection")
            .field("mode", &self.mode)
            .field("url", &self.url)
            .field("password", &"<redacted>")
            .finish()
    }
}

impl PhoenixdConnection {
    pub fn new(mode: PhoenixdMode, url: impl Into<String>, password: impl Into<String>) -> Self {
        let url: String = url.into();
        Self {
            mode,
            url: url.trim_end_matches('/').to_string(),
            password: password.into(),
        }
    }

    pub fn local(url: impl Into<String>, password: impl Into<String>) -> Self {
        Self::new(PhoenixdMode::Local, url, password)
    }

    pub fn external(url: impl Into<String>, password: impl Into<String>) -> Self {
        Self::new(PhoenixdMode::External, url, password)
    }

    /// Base URL without a trailing slash.
    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn password(&self) -> &str {
        &self.password
    }

    pub fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.url, path.trim_start_matches('/'))
    }

    /// The phoenixd event socket, `ws(s)://<host>/websocket`.
    pub fn websocket_url(&self) -> Result<String, PhoenixdError> {
        let rest = if let Some(rest) = self.url.strip_prefix("https://") {
            format!("wss://{rest}")
        } else if let Some(rest) = self.url.strip_prefix("http://") {
            format!("ws://{rest}")
        } else {
            return Err(PhoenixdError::Client(format!(
                "unsupported phoenixd url scheme: {}",
                self.url
            )));
        };

        Ok(format!("{rest}/websocket"))
    }

    pub fn basic_auth_header(&self) -> String {
        format!("Basic {}", STANDARD.encode(format!(":{}", self.password)))
    }
}

/// Extracts the `http-password` entry from the contents of a `phoenix.conf`.
pub fn parse_http_password(contents: &str) -> Option<String> {
    contents
        .lines()
        .map(str::trim)
        .filter(|line| !line.starts_with('#'))
        .filter_map(|line| line.split_once('='))
        .find(|(key, _)| key.trim() == HTTP_PASSWORD_KEY)
        .map(|(_, value)| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

/// Reads the phoenixd HTTP password from a `phoenix.conf`. A missing file
/// yields `Ok(None)`.
pub fn read_http_password(path: &Path) -> io::Result<Option<String>> {
    match std::fs::read_to_string(path) {
        Ok(contents) => Ok(parse_http_password(&contents)),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e),
    }
}
