// ── Controller handle ──
//
// Owns the authenticated `ApiSession` every operation runs against.
// Connecting logs in and, when no API version is pinned, adopts the
// version the controller reports.

use std::sync::Arc;

use albctl_api::transport::{TlsMode, TransportConfig};
use albctl_api::{ApiSession, Credentials};
use tracing::{debug, info, warn};

use crate::config::{AuthCredentials, ControllerConfig, TlsVerification};
use crate::error::CoreError;

/// A logged-in controller session. Cheaply cloneable.
#[derive(Clone)]
pub struct Controller {
    session: Arc<ApiSession>,
    config: Arc<ControllerConfig>,
}

impl Controller {
    /// Log in and discover the API version if it was not pinned.
    pub async fn connect(config: ControllerConfig) -> Result<Self, CoreError> {
        let transport = build_transport(&config);
        let session = ApiSession::new(
            config.url.clone(),
            to_api_credentials(&config.auth),
            config.tenant.clone(),
            config.api_version.clone(),
            &transport,
        )?;

        session.login().await?;

        if config.api_version.is_none() {
            match session.remote_version() {
                Some(version) => {
                    info!(%version, "discovered controller version");
                    session.set_api_version(version);
                }
                None => warn!("controller did not report its version"),
            }
        }

        Ok(Self::from_session(session, config))
    }

    /// Wrap an existing session (used by tests against mock controllers).
    pub fn from_session(session: ApiSession, config: ControllerConfig) -> Self {
        Self {
            session: Arc::new(session),
            config: Arc::new(config),
        }
    }

    pub fn session(&self) -> &ApiSession {
        &self.session
    }

    pub fn config(&self) -> &ControllerConfig {
        &self.config
    }

    /// Default tenant for this connection.
    pub fn tenant(&self) -> &str {
        self.session.tenant()
    }

    /// API version in use (pinned or discovered).
    pub fn api_version(&self) -> Option<String> {
        self.session.api_version()
    }

    /// End the session. Failures are logged, not returned.
    pub async fn disconnect(&self) {
        if let Err(e) = self.session.logout().await {
            debug!(error = %e, "logout failed");
        }
    }
}

fn to_api_credentials(auth: &AuthCredentials) -> Credentials {
    match auth {
        AuthCredentials::Password { username, password } => Credentials::Password {
            username: username.clone(),
            password: password.clone(),
        },
        AuthCredentials::Token { username, token } => Credentials::Token {
            username: username.clone(),
            token: token.clone(),
        },
    }
}

/// Build a [`TransportConfig`] from the controller configuration.
fn build_transport(config: &ControllerConfig) -> TransportConfig {
    TransportConfig {
        tls: tls_to_transport(&config.tls),
        timeout: config.timeout,
    }
}

fn tls_to_transport(tls: &TlsVerification) -> TlsMode {
    match tls {
        TlsVerification::SystemDefaults => TlsMode::System,
        TlsVerification::CustomCa(path) => TlsMode::CustomCa(path.clone()),
        TlsVerification::DangerAcceptInvalid => TlsMode::DangerAcceptInvalid,
    }
}
