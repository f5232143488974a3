use thiserror::Error;

#[derive(Debug, Error)]
pub enum PhoenixdError {
    #[error("phoenixd is unreachable: {0}")]
    Unreachable(String),

    #[error("phoenixd rejected the HTTP password")]
    Unauthorized,

    #[error("phoenixd has no such resource")]
    NotFound,

    #[error("phoenixd rejected the request ({status}): {message}")]
    Rejected { status: u16, message: String },

    #[error("unexpected phoenixd response: {0}")]
    Decode(String),

    #[error("phoenixd client error: {0}")]
    Client(String),
}

impl From<reqwest::Error> for PhoenixdError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_connect() || err.is_timeout() {
            Self::Unreachable(err.to_string())
        } else if err.is_decode() {
            Self::Decode(err.to_string())
        } else {
            Self::Client(err.to_string())
        }
    }
}
