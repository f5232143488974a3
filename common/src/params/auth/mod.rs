use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::ParamError;

pub const MIN_PASSWORD_LENGTH: usize = 8;

/// bcrypt only hashes the first 72 bytes of its input.
pub const MAX_PASSWORD_BYTES: usize = 72;

/// Longest idle lock accepted, one week.
pub const MAX_AUTO_LOCK_MINUTES: u32 = 7 * 24 * 60;

/// Longest session lifetime accepted, one year.
pub const MAX_SESSION_TTL_HOURS: u32 = 365 * 24;

fn validate_new_password(field: &'static str, password: &str) -> Result<(), ParamError> {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(ParamError::new(
            field,
            format!("must be at least {MIN_PASSWORD_LENGTH} characters"),
        ));
    }
    if password.len() > MAX_PASSWORD_BYTES {
        return Err(ParamError::new(
            field,
            format!("must be at most {MAX_PASSWORD_BYTES} bytes"),
        ));
    }
    Ok(())
}

#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
pub struct AuthLoginParams {
    /// The dashboard password.
    pub password: String,
}

/// Sets the first dashboard password.
#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
pub struct AuthSetupParams {
    pub password: String,
}

impl AuthSetupParams {
    pub fn validate(&self) -> Result<(), ParamError> {
        validate_new_password("password", &self.password)
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
pub struct ChangePasswordParams {
    pub current_password: String,
    pub new_password: String,
}

impl ChangePasswordParams {
    pub fn validate(&self) -> Result<(), ParamError> {
        validate_new_password("new_password", &self.new_password)
    }
}

/// Removes the dashboard password, leaving the dashboard open.
#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
pub struct RemovePasswordParams {
    pub current_password: String,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, ToSchema)]
pub struct UpdateAuthSettingsParams {
    /// Minutes of inactivity after which a session is locked. Zero disables
    /// the idle lock.
    pub auto_lock_minutes: Option<u32>,

    /// Absolute lifetime of new sessions, in hours.
    pub session_ttl_hours: Option<u32>,
}

impl UpdateAuthSettingsParams {
    pub fn validate(&self) -> Result<(), ParamError> {
        if let Some(minutes) = self.auto_lock_minutes {
            if minutes > MAX_AUTO_LOCK_MINUTES {
                return Err(ParamError::new(
                    "auto_lock_minutes",
                    format!("must be at most {MAX_AUTO_LOCK_MINUTES}"),
                ));
            }
        }

        if let Some(hours) = self.session_ttl_hours {
            if hours == 0 || hours > MAX_SESSION_TTL_HOURS {
                return Err(ParamError::new(
                    "session_ttl_hours",
                    format!("must be between 1 and {MAX_SESSION_TTL_HOURS}"),
                ));
            }
        }

        Ok(())
    }
}
