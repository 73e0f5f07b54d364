use thiserror::Error;

/// Failures talking to the controller REST API.
#[derive(Debug, Error)]
pub enum Error {
    /// `/login` rejected the credentials.
    #[error("Authentication failed: {message}")]
    Authentication { message: String },

    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// CA bundle unreadable or client construction failed.
    #[error("TLS error: {0}")]
    Tls(String),

    #[error("Not found: {path}")]
    NotFound { path: String },

    /// HTTP 412: the object changed between read and write.
    #[error("Conflicting update on {path} (HTTP 412)")]
    Conflict { path: String },

    #[error("API error (HTTP {status}): {message}")]
    Api { status: u16, message: String },

    /// Session renewal (401/419) or page retries (412) ran out.
    #[error("Giving up after {attempts} attempts")]
    RetriesExhausted { attempts: u32 },

    /// The body was not the JSON we expected; `body` keeps it for `--verbose`.
    #[error("Deserialization error: {message}")]
    Deserialization { message: String, body: String },
}

impl Error {
    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::Conflict { .. })
    }

    /// HTTP status behind the error, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::NotFound { .. } => Some(404),
            Self::Conflict { .. } => Some(412),
            Self::Api { status, .. } => Some(*status),
            Self::Transport(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}
