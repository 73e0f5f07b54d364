//! CLI configuration: a thin layer over `albctl_config`.
//!
//! Adds `GlobalOpts` flag overrides (--controller, --user, --password, ...)
//! and interactive prompts for anything still missing.

use std::io::IsTerminal;
use std::time::Duration;

use dialoguer::Input;
use secrecy::SecretString;

use albctl_core::{AuthCredentials, ControllerConfig, TlsVerification, controller_url};

use crate::cli::GlobalOpts;
use crate::error::{CliError, prompt_err};

pub use albctl_config::{
    Config, Profile, SecretKind, config_path, load_config_or_default, save_config, store_secret,
};

/// Resolve the active profile name from CLI flags and config.
pub fn active_profile_name(global: &GlobalOpts, config: &Config) -> String {
    config.profile_name(global.profile.as_deref()).to_owned()
}

fn interactive() -> bool {
    std::io::stdin().is_terminal()
}

/// Build a `ControllerConfig` from flags, the active profile and prompts.
///
/// Flags win over the profile. Without a profile, `--controller` and a
/// password (flag, env or prompt) are enough.
pub fn build_controller_config(global: &GlobalOpts) -> Result<ControllerConfig, CliError> {
    let cfg = load_config_or_default();
    let profile_name = active_profile_name(global, &cfg);
    let stored = cfg.profiles.get(&profile_name);
    if global.profile.is_some() && stored.is_none() {
        return Err(CliError::ProfileNotFound {
            name: profile_name,
            available: available_profiles(&cfg),
        });
    }
    let fallback = Profile::default();
    let profile = stored.unwrap_or(&fallback);

    // 1. Controller (flag > env > profile > prompt)
    let controller = match global
        .controller
        .clone()
        .or_else(|| Some(profile.controller.clone()).filter(|c| !c.is_empty()))
    {
        Some(c) => c,
        None if interactive() => Input::<String>::new()
            .with_prompt("Controller")
            .interact_text()
            .map_err(prompt_err)?,
        None => {
            return Err(CliError::NoConfig {
                path: config_path().display().to_string(),
            });
        }
    };
    let url = controller_url(&controller).map_err(|e| CliError::Validation {
        field: "controller".into(),
        reason: format!("invalid address {controller:?}: {e}"),
    })?;

    // 2. Credentials
    let username = global
        .user
        .clone()
        .or_else(|| Some(profile.username.clone()).filter(|u| !u.is_empty()))
        .unwrap_or_else(|| "admin".into());
    let auth = resolve_auth(global, profile, &profile_name, username, &controller)?;

    // 3. TLS
    let tls = if global.insecure {
        TlsVerification::DangerAcceptInvalid
    } else if let Some(ref ca) = global.ca_cert {
        TlsVerification::CustomCa(ca.clone())
    } else {
        albctl_config::tls_for(profile)
    };

    let mut config = ControllerConfig::new(url, auth);
    config.tenant = global
        .tenant
        .clone()
        .or_else(|| Some(profile.tenant.clone()).filter(|t| !t.is_empty()))
        .unwrap_or_else(|| "admin".into());
    config.api_version = global.api_version.clone().or_else(|| profile.api_version.clone());
    config.tls = tls;
    config.timeout = Duration::from_secs(
        global
            .timeout
            .or(profile.timeout)
            .unwrap_or(cfg.defaults.timeout),
    );
    Ok(config)
}

fn resolve_auth(
    global: &GlobalOpts,
    profile: &Profile,
    profile_name: &str,
    username: String,
    controller: &str,
) -> Result<AuthCredentials, CliError> {
    if let Some(ref token) = global.token {
        return Ok(AuthCredentials::Token {
            username,
            token: SecretString::from(token.clone()),
        });
    }
    if let Some(ref password) = global.password {
        return Ok(AuthCredentials::Password {
            username,
            password: SecretString::from(password.clone()),
        });
    }
    if let Some(token) = albctl_config::resolve_secret(SecretKind::Token, profile, profile_name) {
        return Ok(AuthCredentials::Token { username, token });
    }
    if let Some(password) =
        albctl_config::resolve_secret(SecretKind::Password, profile, profile_name)
    {
        return Ok(AuthCredentials::Password { username, password });
    }
    if interactive() {
        let password = rpassword::prompt_password(format!("Password for {username}@{controller}: "))
            .map_err(prompt_err)?;
        return Ok(AuthCredentials::Password {
            username,
            password: SecretString::from(password),
        });
    }
    Err(CliError::NoCredentials {
        profile: profile_name.into(),
    })
}

pub fn available_profiles(cfg: &Config) -> String {
    if cfg.profiles.is_empty() {
        "(none)".into()
    } else {
        cfg.profiles.keys().cloned().collect::<Vec<_>>().join(", ")
    }
}
