use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::{ParamError, require_non_empty};
use crate::views::PhoenixdMode;

/// Checks that `url` can serve as a phoenixd base URL.
pub fn validate_phoenixd_url(url: &str) -> Result<(), ParamError> {
    let rest = url
        .strip_prefix("http://")
        .or_else(|| url.strip_prefix("https://"))
        .ok_or_else(|| ParamError::new("url", "must start with http:// or https://"))?;

    let host = rest.split('/').next().unwrap_or_default();
    if host.is_empty() {
        return Err(ParamError::new("url", "must include a host"));
    }
    if url.chars().any(char::is_whitespace) {
        return Err(ParamError::new("url", "must not contain whitespace"));
    }

    Ok(())
}

/// Selects which phoenixd instance the dashboard talks to.
#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
pub struct UpdatePhoenixdConfigParams {
    pub mode: PhoenixdMode,

    /// Base URL of the external phoenixd. Required for `external`.
    pub url: Option<String>,

    /// HTTP password of the external phoenixd. Required for `external`.
    pub password: Option<String>,
}

impl UpdatePhoenixdConfigParams {
    pub fn validate(&self) -> Result<(), ParamError> {
        if self.mode == PhoenixdMode::Local {
            return Ok(());
        }

        let url = self
            .url
            .as_deref()
            .ok_or_else(|| ParamError::new("url", "is required for an external phoenixd"))?;
        validate_phoenixd_url(url)?;

        let password = self
            .password
            .as_deref()
            .ok_or_else(|| ParamError::new("password", "is required for an external phoenixd"))?;
        require_non_empty("password", password)
    }
}

/// Probes a phoenixd instance without switching to it.
#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
pub struct TestPhoenixdParams {
    pub url: String,
    pub password: String,
}

impl TestPhoenixdParams {
    pub fn validate(&self) -> Result<(), ParamError> {
        validate_phoenixd_url(&self.url)?;
        require_non_empty("password", &self.password)
    }
}
