use thiserror::Error;

#[derive(Debug, Error)]
pub enum CallerError {
    #[error("Unauthorized: {reason}")]
    Unauthorized { reason: String },
}

impl CallerError {
    pub fn unauthorized(reason: Option<String>) -> Self {
        Self::Unauthorized {
            reason: reason.unwrap_or_else(|| "No reason provided".to_string()),
        }
    }
}

/// Who is making a request against the dashboard.
///
/// The dashboard has a single operator. Access is only gated once a dashboard
/// password has been configured; until then every request is made by
/// [`Caller::Open`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Caller {
    /// The operator, authenticated through a dashboard session.
    Operator { session_id: String },

    /// No dashboard password is configured, so access is not gated.
    Open,
}

impl Caller {
    /// The session backing this caller, if any.
    pub fn session_id(&self) -> Option<&str> {
        match self {
            Caller::Operator { session_id } => Some(session_id),
            Caller::Open => None,
        }
    }
}
