use axum::{Json, http::StatusCode, response::IntoResponse};
use pdash_common::{caller::CallerError, params::ParamError, views::ApiErrorResponse};
use pdash_db::storage::StoreError;
use thiserror::Error;

use crate::{auth::AuthError, phoenixd::PhoenixdError};

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error(transparent)]
    InvalidParams(#[from] ParamError),

    #[error(transparent)]
    Storage(#[from] StoreError),

    #[error(transparent)]
    CallerError(#[from] CallerError),

    /// No provider accepted the request. Never holds `Storage` or `Other`.
    #[error(transparent)]
    Unauthenticated(AuthError),

    #[error(transparent)]
    Phoenixd(#[from] PhoenixdError),

    #[error(transparent)]
    InternalAnyhow(#[from] anyhow::Error),
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::Storage(e) => Self::Storage(e),
            AuthError::Other(e) => Self::InternalAnyhow(e),
            e => Self::Unauthenticated(e),
        }
    }
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::BadRequest(message.into())
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::Conflict(message.into())
    }

    pub fn unauthorized(reason: impl Into<String>) -> Self {
        Self::CallerError(CallerError::unauthorized(Some(reason.into())))
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::InternalAnyhow(anyhow::anyhow!(message.into()))
    }

    fn status_code(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) | Self::InvalidParams(_) => StatusCode::BAD_REQUEST,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::Storage(se) => match se {
                StoreError::NotFound => StatusCode::NOT_FOUND,
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Self::CallerError(CallerError::Unauthorized { .. }) => StatusCode::UNAUTHORIZED,
            Self::Unauthenticated(_) => StatusCode::UNAUTHORIZED,
            Self::Phoenixd(pe) => match pe {
                PhoenixdError::Unreachable(_) => StatusCode::SERVICE_UNAVAILABLE,
                PhoenixdError::NotFound => StatusCode::NOT_FOUND,
                PhoenixdError::Rejected { status, .. } if *status == 400 => {
                    StatusCode::BAD_REQUEST
                }
                _ => StatusCode::BAD_GATEWAY,
            },
            Self::InternalAnyhow(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<ApiError> for ApiErrorResponse {
    fn from(err: ApiError) -> Self {
        let internal = "Something went wrong on our end. Please try again later.";

        let (code, message): (&str, String) = match &err {
            ApiError::BadRequest(message) => ("BadRequest", message.clone()),
            ApiError::Conflict(message) => ("Conflict", message.clone()),
            ApiError::InvalidParams(pe) => ("InvalidParams", pe.to_string()),
            ApiError::Storage(se) => match se {
                StoreError::NotFound => {
                    ("NotFound", "The requested resource was not found.".into())
                }
                _ => ("InternalError", internal.into()),
            },
            ApiError::CallerError(CallerError::Unauthorized { reason }) => {
                ("Unauthorized", reason.clone())
            }
            ApiError::Unauthenticated(ae) => match ae {
                AuthError::Expired => (
                    "SessionExpired",
                    "Your session has expired. Please log in again.".into(),
                ),
                AuthError::Locked => (
                    "SessionLocked",
                    "The dashboard locked after inactivity. Please log in again.".into(),
                ),
                AuthError::CsrfFailed => (
                    "CsrfFailed",
                    "Missing or invalid CSRF token.".into(),
                ),
                _ => (
                    "Unauthorized",
                    "You are not authenticated to perform this action.".into(),
                ),
            },
            ApiError::Phoenixd(pe) => match pe {
                PhoenixdError::Unreachable(_) => {
                    ("PhoenixdUnreachable", "phoenixd is not reachable.".into())
                }
                PhoenixdError::Unauthorized => (
                    "PhoenixdUnauthorized",
                    "phoenixd rejected the configured password.".into(),
                ),
                PhoenixdError::NotFound => {
                    ("NotFound", "phoenixd does not know this resource.".into())
                }
                PhoenixdError::Rejected { message, .. } => ("PhoenixdRejected", message.clone()),
                PhoenixdError::Decode(_) | PhoenixdError::Client(_) => (
                    "PhoenixdError",
                    "phoenixd returned an unexpected response.".into(),
                ),
            },
            ApiError::InternalAnyhow(_) => ("InternalError", internal.into()),
        };

        ApiErrorResponse {
            code: Some(code.into()),
            message,

            #[cfg(debug_assertions)]
            details: Some(err.to_string()),

            #[cfg(not(debug_assertions))]
            details: None,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let status_code = self.status_code();
        if status_code.is_server_error() {
            tracing::error!("Error returned by handler: {self}");
        } else {
            tracing::debug!("Request rejected: {self}");
        }

        (status_code, Json(Into::<ApiErrorResponse>::into(self))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn phoenixd_errors_map_to_gateway_statuses() {
        assert_eq!(
            ApiError::from(PhoenixdError::Unreachable("refused".into())).status_code(),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            ApiError::from(PhoenixdError::Unauthorized).status_code(),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            ApiError::from(PhoenixdError::Rejected {
                status: 400,
                message: "invalid invoice".into()
            })
            .status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::from(PhoenixdError::Rejected {
                status: 500,
                message: "boom".into()
            })
            .status_code(),
            StatusCode::BAD_GATEWAY
        );
    }

    #[test]
    fn rejected_message_is_forwarded() {
        let response: ApiErrorResponse = ApiError::from(PhoenixdError::Rejected {
            status: 400,
            message: "invalid invoice".into(),
        })
        .into();

        assert_eq!(response.code.as_deref(), Some("PhoenixdRejected"));
        assert_eq!(response.message, "invalid invoice");
    }

    #[test]
    fn wrong_password_is_unauthorized() {
        let err = ApiError::unauthorized("Invalid password");
        assert_eq!(err.status_code(), StatusCode::UNAUTHORIZED);

        let response: ApiErrorResponse = err.into();
        assert_eq!(response.code.as_deref(), Some("Unauthorized"));
        assert_eq!(response.message, "Invalid password");
    }

    #[test]
    fn auth_failures_carry_their_own_code() {
        for (err, code) in [
            (AuthError::MissingCredentials, "Unauthorized"),
            (AuthError::InvalidCredentials, "Unauthorized"),
            (AuthError::Expired, "SessionExpired"),
            (AuthError::Locked, "SessionLocked"),
            (AuthError::CsrfFailed, "CsrfFailed"),
        ] {
            let err = ApiError::from(err);
            assert_eq!(err.status_code(), StatusCode::UNAUTHORIZED);

            let response: ApiErrorResponse = err.into();
            assert_eq!(response.code.as_deref(), Some(code));
        }
    }

    #[test]
    fn auth_storage_failures_are_server_errors() {
        let err = ApiError::from(AuthError::Storage(StoreError::Internal("down".into())));
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn invalid_params_are_bad_requests() {
        let err = ApiError::from(ParamError::new("amountSat", "must be greater than zero"));
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);

        let response: ApiErrorResponse = err.into();
        assert_eq!(response.message, "invalid `amountSat`: must be greater than zero");
    }
}
