// HTTP client construction for controller sessions.
//
// Controllers usually ship self-signed certificates, so verification is
// off unless a CA bundle or the system store is requested.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use reqwest::cookie::Jar;

use crate::error::Error;

const USER_AGENT: &str = concat!("albctl/", env!("CARGO_PKG_VERSION"));

/// How the controller certificate is checked.
#[derive(Debug, Clone, Default)]
pub enum TlsMode {
    System,
    /// PEM bundle holding the controller's issuing CA.
    CustomCa(PathBuf),
    #[default]
    DangerAcceptInvalid,
}

/// Connection settings shared by every request of a session.
#[derive(Debug, Clone)]
pub struct TransportConfig {
    pub tls: TlsMode,
    /// Per-request timeout. Backup exports and log pulls can be slow, so
    /// this is generous by default.
    pub timeout: Duration,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            tls: TlsMode::default(),
            timeout: Duration::from_secs(60),
        }
    }
}

impl TransportConfig {
    /// Build the client for one session. `jar` carries the `sessionid` and
    /// `csrftoken` cookies set by `/login`.
    pub fn build_client(&self, jar: Arc<Jar>) -> Result<reqwest::Client, Error> {
        let builder = reqwest::Client::builder()
            .timeout(self.timeout)
            .user_agent(USER_AGENT)
            .cookie_provider(jar);

        let builder = match &self.tls {
            TlsMode::System => builder,
            TlsMode::CustomCa(path) => builder.add_root_certificate(load_ca(path)?),
            TlsMode::DangerAcceptInvalid => builder.danger_accept_invalid_certs(true),
        };

        builder
            .build()
            .map_err(|e| Error::Tls(format!("cannot build HTTP client: {e}")))
    }
}

fn load_ca(path: &Path) -> Result<reqwest::Certificate, Error> {
    let pem = std::fs::read(path)
        .map_err(|e| Error::Tls(format!("cannot read CA bundle {}: {e}", path.display())))?;
    reqwest::Certificate::from_pem(&pem)
        .map_err(|e| Error::Tls(format!("{} is not a PEM certificate: {e}", path.display())))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_ca_bundle_is_a_tls_error() {
        let config = TransportConfig {
            tls: TlsMode::CustomCa("/nonexistent/ca.pem".into()),
            ..TransportConfig::default()
        };
        let err = config
            .build_client(Arc::new(Jar::default()))
            .expect_err("bundle does not exist");
        assert!(matches!(err, Error::Tls(msg) if msg.contains("/nonexistent/ca.pem")));
    }

    #[test]
    fn default_accepts_self_signed_controllers() {
        let config = TransportConfig::default();
        assert!(matches!(config.tls, TlsMode::DangerAcceptInvalid));
        assert!(config.build_client(Arc::new(Jar::default())).is_ok());
    }
}
