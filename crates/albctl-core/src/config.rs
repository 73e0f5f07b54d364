// ── Runtime connection configuration ──
//
// These types describe *how* to connect to a controller. They carry
// credential data and connection tuning, but never touch disk.
// The CLI constructs a `ControllerConfig` and hands it in.

use std::time::Duration;

use secrecy::SecretString;
use url::Url;

/// How to authenticate with a controller.
#[derive(Debug, Clone)]
pub enum AuthCredentials {
    /// Username and password.
    Password {
        username: String,
        password: SecretString,
    },
    /// Username and API token (ControlScripts receive one in `API_TOKEN`).
    Token {
        username: String,
        token: SecretString,
    },
}

impl AuthCredentials {
    pub fn username(&self) -> &str {
        match self {
            Self::Password { username, .. } | Self::Token { username, .. } => username,
        }
    }
}

/// TLS verification strategy.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum TlsVerification {
    /// System CA store (strict).
    SystemDefaults,
    /// Custom CA certificate file.
    CustomCa(std::path::PathBuf),
    /// Skip verification. Controllers ship with self-signed certificates.
    #[default]
    DangerAcceptInvalid,
}

/// Configuration for connecting to a single controller.
#[derive(Debug, Clone)]
pub struct ControllerConfig {
    /// Controller URL (e.g., `https://10.10.10.10`).
    pub url: Url,
    pub auth: AuthCredentials,
    /// Default tenant for requests (defaults to "admin").
    pub tenant: String,
    /// Pinned API version. Discovered from the login response when `None`.
    pub api_version: Option<String>,
    pub tls: TlsVerification,
    pub timeout: Duration,
}

impl ControllerConfig {
    pub fn new(url: Url, auth: AuthCredentials) -> Self {
        Self {
            url,
            auth,
            tenant: "admin".into(),
            api_version: None,
            tls: TlsVerification::default(),
            timeout: Duration::from_secs(60),
        }
    }
}

/// Turn a bare host or IP into a controller URL (`https://` is assumed).
pub fn controller_url(host: &str) -> Result<Url, url::ParseError> {
    let host = host.trim().trim_end_matches('/');
    if host.contains("://") {
        Url::parse(host)
    } else {
        Url::parse(&format!("https://{host}"))
    }
}
