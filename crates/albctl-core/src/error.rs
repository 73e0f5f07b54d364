// Errors returned by albctl-core operations. HTTP details from albctl-api
// are folded into these variants before they reach the CLI.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("Cannot connect to controller at {url}: {reason}")]
    ConnectionFailed { url: String, reason: String },

    #[error("Authentication failed: {message}")]
    AuthenticationFailed { message: String },

    #[error("Controller request timed out")]
    Timeout,

    #[error("{object_type} not found: {identifier}")]
    NotFound {
        object_type: String,
        identifier: String,
    },

    #[error("Conflicting update on {path}: {message}")]
    Conflict { path: String, message: String },

    #[error("Validation failed: {message}")]
    ValidationFailed { message: String },

    #[error("Operation failed: {message}")]
    OperationFailed { message: String },

    #[error("Unexpected response from controller: {message}")]
    UnexpectedResponse { message: String },

    /// Any other HTTP failure.
    #[error("API error: {message}")]
    Api {
        message: String,
        status: Option<u16>,
    },

    #[error("I/O error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("terraform {step} failed: {message}")]
    Terraform { step: String, message: String },

    #[error("Configuration error: {message}")]
    Config { message: String },
}

impl CoreError {
    pub fn not_found(object_type: impl Into<String>, identifier: impl Into<String>) -> Self {
        Self::NotFound {
            object_type: object_type.into(),
            identifier: identifier.into(),
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::ValidationFailed {
            message: message.into(),
        }
    }

    pub fn unexpected(message: impl Into<String>) -> Self {
        Self::UnexpectedResponse {
            message: message.into(),
        }
    }

    pub(crate) fn io(path: impl AsRef<std::path::Path>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.as_ref().display().to_string(),
            source,
        }
    }
}

// ── From the HTTP layer ──────────────────────────────────────────────

impl From<albctl_api::Error> for CoreError {
    fn from(err: albctl_api::Error) -> Self {
        use albctl_api::Error as Api;

        match err {
            Api::Authentication { message } => Self::AuthenticationFailed { message },
            Api::Transport(e) if e.is_timeout() => Self::Timeout,
            Api::Transport(e) if e.is_connect() => Self::ConnectionFailed {
                url: e.url().map_or_else(|| "<unknown>".into(), ToString::to_string),
                reason: e.to_string(),
            },
            Api::Transport(e) => Self::Api {
                status: e.status().map(|s| s.as_u16()),
                message: e.to_string(),
            },
            Api::InvalidUrl(e) => Self::Config {
                message: format!("controller address is not a valid URL: {e}"),
            },
            Api::Tls(reason) => Self::ConnectionFailed {
                url: String::new(),
                reason,
            },
            Api::NotFound { path } => Self::not_found("Object", path),
            Api::Conflict { path } => Self::Conflict {
                path,
                message: "object was modified concurrently (HTTP 412)".into(),
            },
            Api::RetriesExhausted { attempts } => Self::OperationFailed {
                message: format!("Too many retry attempts ({attempts}) - aborting!"),
            },
            Api::Api { status, message } => Self::Api {
                message,
                status: Some(status),
            },
            Api::Deserialization { message, body } => {
                tracing::debug!(%body, "undecodable response body");
                Self::UnexpectedResponse { message }
            }
        }
    }
}
