//! Failure taxonomy for the resilient execution layer

use thiserror::Error;

/// Result type for resilient client operations
pub type ClientResult<T> = Result<T, ClientError>;

/// Fatal authentication failures; always session-ending
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("cannot acquire token for user {username} after {attempts} attempts")]
    Acquire { username: String, attempts: u32 },

    #[error("cannot refresh token for session {username} after {attempts} attempts")]
    Refresh { username: String, attempts: u32 },
}

/// Identity provider exchange failures (transient, retried by the token
/// lifecycle policies before escalating to [`AuthError`])
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("provider request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("provider returned status {status}")]
    Status { status: u16 },

    #[error("malformed provider response: {0}")]
    Payload(String),
}

/// Errors surfaced by [`crate::client::ResilientClient::execute`] once all
/// local retry policy is spent
#[derive(Debug, Error)]
pub enum ClientError {
    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error("transport failure: {0}")]
    Transport(#[source] reqwest::Error),

    #[error("server error after {attempts} attempts: status {status}")]
    Server { status: u16, attempts: u32 },

    #[error("unknown application error code {code:?}")]
    UnknownApplication { code: String, body: String },

    #[error("unclassified request failure: {0}")]
    Unclassified(#[source] reqwest::Error),
}

/// Application error codes treated as success-like no-ops: the business
/// conflict they describe means the intended state already holds.
pub(crate) const KNOWN_APPLICATION_CODES: &[&str] = &[
    "group.already_member",
    "group.joining_request.already_sent",
    "data_synchronization.error",
];

/// One classified failed attempt, before retry policy is applied
#[derive(Debug)]
pub(crate) enum Failure {
    /// Low-level network failure: connect, reset, DNS, TLS, timeout
    Transport(reqwest::Error),

    /// HTTP status >= 500
    Server { status: u16 },

    /// HTTP status 401; a token refresh must precede the next attempt
    Unauthorized,

    /// Application error body with code "forbidden"
    Forbidden,

    /// Allow-listed business conflict; absorbed as a no-op
    KnownApplication { code: String },

    /// Any other error with a response body; fatal
    UnknownApplication { code: String, body: String },

    /// No response and no recognized error code; surfaced as-is without a
    /// retry policy of its own
    Unclassified(reqwest::Error),
}

impl Failure {
    pub(crate) fn is_retryable(&self) -> bool {
        matches!(
            self,
            Failure::Transport(_) | Failure::Server { .. } | Failure::Unauthorized | Failure::Forbidden
        )
    }
}

/// Classify a request-level error (no HTTP response was produced)
pub(crate) fn classify_request_error(error: reqwest::Error) -> Failure {
    if error.is_timeout() || error.is_connect() {
        Failure::Transport(error)
    } else {
        Failure::Unclassified(error)
    }
}

/// Classify a non-success HTTP response from its status and error body
pub(crate) fn classify_response(status: u16, code: Option<&str>, body: &str) -> Failure {
    if status == 401 {
        return Failure::Unauthorized;
    }
    if status >= 500 {
        return Failure::Server { status };
    }
    match code {
        Some("forbidden") => Failure::Forbidden,
        Some(code) if KNOWN_APPLICATION_CODES.contains(&code) => Failure::KnownApplication {
            code: code.to_string(),
        },
        other => Failure::UnknownApplication {
            code: other.unwrap_or_default().to_string(),
            body: body.to_string(),
        },
    }
}
