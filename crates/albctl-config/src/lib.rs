//! Configuration for albctl.
//!
//! TOML profiles, credential resolution (env + keyring + plaintext),
//! and translation to `albctl_core::ControllerConfig`. The CLI layers
//! flag overrides and interactive prompts on top.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use albctl_core::{AuthCredentials, ControllerConfig, TlsVerification, controller_url};

/// Keyring service name.
pub const KEYRING_SERVICE: &str = "albctl";

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("no credentials configured for profile '{profile}'")]
    NoCredentials { profile: String },

    #[error("profile '{profile}' not found")]
    UnknownProfile { profile: String },

    #[error("keyring error: {0}")]
    Keyring(#[from] keyring::Error),

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── TOML config structs ─────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    /// Profile used when `--profile` is not given.
    pub default_profile: Option<String>,

    #[serde(default)]
    pub defaults: Defaults,

    #[serde(default)]
    pub profiles: BTreeMap<String, Profile>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_profile: Some("default".into()),
            defaults: Defaults::default(),
            profiles: BTreeMap::new(),
        }
    }
}

impl Config {
    /// Name of the profile to use: the explicit one, else the default.
    pub fn profile_name<'a>(&'a self, explicit: Option<&'a str>) -> &'a str {
        explicit
            .or(self.default_profile.as_deref())
            .unwrap_or("default")
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Defaults {
    #[serde(default = "default_output")]
    pub output: String,

    #[serde(default = "default_color")]
    pub color: String,

    #[serde(default = "default_timeout")]
    pub timeout: u64,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            output: default_output(),
            color: default_color(),
            timeout: default_timeout(),
        }
    }
}

fn default_output() -> String {
    "table".into()
}
fn default_color() -> String {
    "auto".into()
}
fn default_timeout() -> u64 {
    60
}

/// A named controller profile.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Profile {
    /// Controller address: IP, hostname, or URL.
    pub controller: String,

    #[serde(default = "default_username")]
    pub username: String,

    #[serde(default = "default_tenant")]
    pub tenant: String,

    /// Pinned API version. Discovered at login when unset.
    pub api_version: Option<String>,

    /// Plaintext password. Prefer the keyring or `password_env`.
    pub password: Option<String>,

    /// Environment variable holding the password.
    pub password_env: Option<String>,

    /// Plaintext API token.
    pub token: Option<String>,

    /// Environment variable holding an API token.
    pub token_env: Option<String>,

    /// CA certificate used to verify the controller.
    pub ca_cert: Option<PathBuf>,

    /// `Some(false)` forces certificate verification. Unset accepts the
    /// self-signed certificate controllers ship with.
    pub insecure: Option<bool>,

    pub timeout: Option<u64>,
}

fn default_username() -> String {
    "admin".into()
}
fn default_tenant() -> String {
    "admin".into()
}

// ── Config file path ────────────────────────────────────────────────

/// Config file location. `ALBCTL_CONFIG` overrides the platform default.
pub fn config_path() -> PathBuf {
    if let Some(path) = std::env::var_os("ALBCTL_CONFIG") {
        return PathBuf::from(path);
    }
    ProjectDirs::from("com", "albctl", "albctl").map_or_else(
        || {
            let mut p = dirs_fallback();
            p.push("config.toml");
            p
        },
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

fn dirs_fallback() -> PathBuf {
    let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
    p.push(".config");
    p.push("albctl");
    p
}

// ── Loading / saving ────────────────────────────────────────────────

/// Load from the canonical path plus `ALBCTL_` environment overrides
/// (`ALBCTL_DEFAULTS__OUTPUT=json`).
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from(&config_path())
}

pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    debug!(path = %path.display(), "loading config");
    let figment = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed("ALBCTL_").split("__"));
    Ok(figment.extract()?)
}

/// Load config, falling back to defaults when missing or unreadable.
pub fn load_config_or_default() -> Config {
    load_config().unwrap_or_default()
}

pub fn save_config(cfg: &Config) -> Result<PathBuf, ConfigError> {
    let path = config_path();
    save_config_to(&path, cfg)?;
    Ok(path)
}

pub fn save_config_to(path: &Path, cfg: &Config) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, toml::to_string_pretty(cfg)?)?;
    Ok(())
}

// ── Credential resolution ───────────────────────────────────────────

/// Which secret to look up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SecretKind {
    Password,
    Token,
}

impl SecretKind {
    /// Global environment variable for this secret.
    pub fn env_var(self) -> &'static str {
        match self {
            Self::Password => "ALBCTL_PASSWORD",
            Self::Token => "ALBCTL_TOKEN",
        }
    }

    /// Keyring account for a profile.
    pub fn keyring_key(self, profile_name: &str) -> String {
        match self {
            Self::Password => format!("{profile_name}/password"),
            Self::Token => format!("{profile_name}/token"),
        }
    }

    fn profile_env(self, profile: &Profile) -> Option<&str> {
        match self {
            Self::Password => profile.password_env.as_deref(),
            Self::Token => profile.token_env.as_deref(),
        }
    }

    fn plaintext(self, profile: &Profile) -> Option<&str> {
        match self {
            Self::Password => profile.password.as_deref(),
            Self::Token => profile.token.as_deref(),
        }
    }
}

fn keyring_get(key: &str) -> Option<String> {
    keyring::Entry::new(KEYRING_SERVICE, key)
        .and_then(|entry| entry.get_password())
        .ok()
}

/// Resolve a secret: global env var, the profile's env var, the system
/// keyring, then plaintext in the profile.
pub fn resolve_secret(kind: SecretKind, profile: &Profile, profile_name: &str) -> Option<SecretString> {
    resolve_secret_with(
        kind,
        profile,
        profile_name,
        |var| std::env::var(var).ok(),
        keyring_get,
    )
}

fn resolve_secret_with(
    kind: SecretKind,
    profile: &Profile,
    profile_name: &str,
    env: impl Fn(&str) -> Option<String>,
    keyring: impl Fn(&str) -> Option<String>,
) -> Option<SecretString> {
    let non_empty = |v: &String| !v.is_empty();
    env(kind.env_var())
        .filter(non_empty)
        .or_else(|| kind.profile_env(profile).and_then(&env).filter(non_empty))
        .or_else(|| keyring(&kind.keyring_key(profile_name)))
        .or_else(|| kind.plaintext(profile).map(str::to_owned))
        .map(SecretString::from)
}

/// Store a secret in the system keyring.
pub fn store_secret(kind: SecretKind, profile_name: &str, secret: &str) -> Result<(), ConfigError> {
    keyring::Entry::new(KEYRING_SERVICE, &kind.keyring_key(profile_name))?.set_password(secret)?;
    Ok(())
}

/// Credentials for a profile. A token wins over a password.
pub fn resolve_auth(profile: &Profile, profile_name: &str) -> Result<AuthCredentials, ConfigError> {
    let username = profile.username.clone();
    if let Some(token) = resolve_secret(SecretKind::Token, profile, profile_name) {
        return Ok(AuthCredentials::Token { username, token });
    }
    resolve_secret(SecretKind::Password, profile, profile_name)
        .map(|password| AuthCredentials::Password { username, password })
        .ok_or_else(|| ConfigError::NoCredentials {
            profile: profile_name.into(),
        })
}

/// TLS mode for a profile.
pub fn tls_for(profile: &Profile) -> TlsVerification {
    match (profile.insecure, &profile.ca_cert) {
        (Some(true), _) => TlsVerification::DangerAcceptInvalid,
        (_, Some(ca)) => TlsVerification::CustomCa(ca.clone()),
        (Some(false), None) => TlsVerification::SystemDefaults,
        (None, None) => TlsVerification::DangerAcceptInvalid,
    }
}

/// Build a `ControllerConfig` from a profile, without CLI overrides.
pub fn profile_to_controller_config(
    profile: &Profile,
    profile_name: &str,
    defaults: &Defaults,
) -> Result<ControllerConfig, ConfigError> {
    let url = controller_url(&profile.controller).map_err(|e| ConfigError::Validation {
        field: "controller".into(),
        reason: format!("invalid address {:?}: {e}", profile.controller),
    })?;
    let mut config = ControllerConfig::new(url, resolve_auth(profile, profile_name)?);
    config.tenant.clone_from(&profile.tenant);
    config.api_version.clone_from(&profile.api_version);
    config.tls = tls_for(profile);
    config.timeout = Duration::from_secs(profile.timeout.unwrap_or(defaults.timeout));
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use secrecy::ExposeSecret;
    use std::collections::HashMap;

    fn profile() -> Profile {
        Profile {
            controller: "10.0.0.1".into(),
            username: "admin".into(),
            tenant: "admin".into(),
            password: Some("plain".into()),
            password_env: Some("LAB_PW".into()),
            ..Profile::default()
        }
    }

    fn resolve(env: &HashMap<&str, &str>, keyring: Option<&str>) -> Option<String> {
        resolve_secret_with(
            SecretKind::Password,
            &profile(),
            "lab",
            |k| env.get(k).map(|v| (*v).to_owned()),
            |k| {
                assert_eq!(k, "lab/password");
                keyring.map(str::to_owned)
            },
        )
        .map(|s| s.expose_secret().to_owned())
    }

    #[test]
    fn secret_precedence() {
        let mut env = HashMap::new();
        assert_eq!(resolve(&env, None).as_deref(), Some("plain"));
        assert_eq!(resolve(&env, Some("stored")).as_deref(), Some("stored"));
        env.insert("LAB_PW", "from-profile-env");
        assert_eq!(resolve(&env, Some("stored")).as_deref(), Some("from-profile-env"));
        env.insert("ALBCTL_PASSWORD", "from-env");
        assert_eq!(resolve(&env, Some("stored")).as_deref(), Some("from-env"));
    }

    #[test]
    fn tls_modes() {
        let mut p = profile();
        assert_eq!(tls_for(&p), TlsVerification::DangerAcceptInvalid);
        p.insecure = Some(false);
        assert_eq!(tls_for(&p), TlsVerification::SystemDefaults);
        p.ca_cert = Some(PathBuf::from("/etc/ca.pem"));
        assert_eq!(tls_for(&p), TlsVerification::CustomCa(PathBuf::from("/etc/ca.pem")));
        p.insecure = Some(true);
        assert_eq!(tls_for(&p), TlsVerification::DangerAcceptInvalid);
    }

    #[test]
    fn config_file_round_trip() {
        let dir = tempfile::tempdir().unwrap_or_else(|e| panic!("{e}"));
        let path = dir.path().join("nested/config.toml");

        let mut cfg = Config::default();
        cfg.profiles.insert("lab".into(), profile());
        cfg.default_profile = Some("lab".into());
        save_config_to(&path, &cfg).unwrap_or_else(|e| panic!("{e}"));

        let loaded = load_config_from(&path).unwrap_or_else(|e| panic!("{e}"));
        assert_eq!(loaded.profile_name(None), "lab");
        assert_eq!(loaded.profile_name(Some("other")), "other");
        let lab = &loaded.profiles["lab"];
        assert_eq!(lab.controller, "10.0.0.1");
        assert_eq!(lab.tenant, "admin");
        assert_eq!(loaded.defaults.timeout, 60);
    }

    #[test]
    fn profile_becomes_controller_config() {
        let mut p = profile();
        p.api_version = Some("22.1.5".into());
        p.tenant = "team-a".into();
        p.timeout = Some(5);
        let cfg = profile_to_controller_config(&p, "lab-no-keyring-entry", &Defaults::default())
            .unwrap_or_else(|e| panic!("{e}"));
        assert_eq!(cfg.url.as_str(), "https://10.0.0.1/");
        assert_eq!(cfg.tenant, "team-a");
        assert_eq!(cfg.api_version.as_deref(), Some("22.1.5"));
        assert_eq!(cfg.timeout, Duration::from_secs(5));
    }
}
