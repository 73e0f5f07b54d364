//! ControlScript support.
//!
//! The controller runs a ControlScript with the triggering alert as a JSON
//! argument and connection details in the environment: `API_TOKEN`,
//! `USER`, `DOCKER_GATEWAY` (controller address as seen from the script
//! container) and `TENANT`.

use albctl_api::RequestOptions;
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{info, warn};

use super::analytics::{self, ActionReport, AnalyticsAction, ResetOptions};
use super::{array, text};
use crate::config::{AuthCredentials, ControllerConfig, controller_url};
use crate::controller::Controller;
use crate::error::CoreError;

/// One event carried by an alert.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct AlertEvent {
    pub event_id: String,
    #[serde(default)]
    pub obj_uuid: String,
    #[serde(default)]
    pub obj_name: String,
}

/// The alert payload passed to a ControlScript.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Alert {
    #[serde(default)]
    pub events: Vec<AlertEvent>,
}

impl Alert {
    pub fn parse(json: &str) -> Result<Self, CoreError> {
        serde_json::from_str(json)
            .map_err(|e| CoreError::validation(format!("invalid alert payload: {e}")))
    }

    /// First event with the given id.
    pub fn event(&self, event_id: &str) -> Option<&AlertEvent> {
        self.events.iter().find(|e| e.event_id == event_id)
    }
}

/// Connection settings handed to a ControlScript.
#[derive(Debug, Clone)]
pub struct ScriptEnv {
    pub token: Option<SecretString>,
    pub user: String,
    pub endpoint: String,
    pub tenant: Option<String>,
}

impl ScriptEnv {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any variable source. Empty values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let get = |key: &str| lookup(key).filter(|v| !v.is_empty());
        Self {
            token: get("API_TOKEN").map(SecretString::from),
            user: get("USER").unwrap_or_else(|| "admin".into()),
            endpoint: get("DOCKER_GATEWAY").unwrap_or_else(|| "localhost".into()),
            tenant: get("TENANT"),
        }
    }

    /// Token-authenticated connection in `tenant`.
    pub fn controller_config(&self, tenant: &str) -> Result<ControllerConfig, CoreError> {
        let token = self.token.clone().ok_or_else(|| CoreError::Config {
            message: "API_TOKEN is not set".into(),
        })?;
        let url = controller_url(&self.endpoint).map_err(|e| CoreError::Config {
            message: format!("invalid controller address {:?}: {e}", self.endpoint),
        })?;
        let mut config = ControllerConfig::new(
            url,
            AuthCredentials::Token {
                username: self.user.clone(),
                token,
            },
        );
        tenant.clone_into(&mut config.tenant);
        Ok(config)
    }

    /// `TENANT`, or `admin` when unset.
    pub fn tenant(&self) -> &str {
        self.tenant.as_deref().unwrap_or("admin")
    }

    /// Tenant for alert clean-up: alerts raised in `admin` may belong to
    /// objects in any tenant.
    pub fn alert_tenant(&self) -> &str {
        match self.tenant() {
            "admin" => "*",
            other => other,
        }
    }
}

/// Delete the `VS_DOWN` alerts of a virtual service. Returns the UUIDs of
/// the cleared alerts.
pub async fn clear_vs_down_alerts(
    ctrl: &Controller,
    vs_uuid: &str,
) -> Result<Vec<String>, CoreError> {
    let session = ctrl.session();
    let alerts: Value = session
        .get_json(
            "alert",
            &RequestOptions::new()
                .param("obj_ref", vs_uuid)
                .param("search", "(event_id,VS_DOWN)"),
        )
        .await?;

    let mut cleared = Vec::new();
    for alert in array(&alerts, "results") {
        let uuid = text(alert, "uuid");
        if uuid.is_empty() {
            continue;
        }
        info!(alert = %uuid, vs = %vs_uuid, "clearing alert");
        match session
            .delete(&format!("alert/{uuid}"), &RequestOptions::new())
            .await
        {
            Ok(()) => cleared.push(uuid.to_owned()),
            Err(e) => warn!(alert = %uuid, error = %e, "failed to clear alert"),
        }
    }
    Ok(cleared)
}

/// Switch client insights off on every virtual service the session can see.
pub async fn disable_client_insights(ctrl: &Controller) -> Result<ActionReport, CoreError> {
    analytics::reset(ctrl, &[AnalyticsAction::ClientInsights], &ResetOptions::default())
        .await?
        .pop()
        .ok_or_else(|| CoreError::unexpected("analytics reset returned no report"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn alert_events() {
        let alert = Alert::parse(
            r#"{"name": "vs-up", "events": [
                {"event_id": "VS_HEALTH_CHANGE", "obj_uuid": "virtualservice-1"},
                {"event_id": "VS_UP", "obj_uuid": "virtualservice-2", "obj_name": "web"}
            ]}"#,
        )
        .unwrap_or_else(|e| panic!("{e}"));
        let up = alert.event("VS_UP").map(|e| e.obj_uuid.as_str());
        assert_eq!(up, Some("virtualservice-2"));
        assert!(alert.event("VS_DOWN").is_none());

        let empty = Alert::parse("{}").unwrap_or_else(|e| panic!("{e}"));
        assert!(empty.events.is_empty());
        assert!(Alert::parse("not json").is_err());
    }

    #[test]
    fn environment_defaults() {
        let env = ScriptEnv::from_lookup(|_| None);
        assert_eq!(env.endpoint, "localhost");
        assert_eq!(env.tenant(), "admin");
        assert_eq!(env.alert_tenant(), "*");
        assert!(env.controller_config("admin").is_err());

        let vars: HashMap<&str, &str> = [
            ("API_TOKEN", "tok"),
            ("USER", "script-user"),
            ("DOCKER_GATEWAY", "172.17.0.1"),
            ("TENANT", "team-a"),
        ]
        .into_iter()
        .collect();
        let env = ScriptEnv::from_lookup(|k| vars.get(k).map(|v| (*v).to_owned()));
        assert_eq!(env.alert_tenant(), "team-a");
        let config = env
            .controller_config(env.tenant())
            .unwrap_or_else(|e| panic!("{e}"));
        assert_eq!(config.url.as_str(), "https://172.17.0.1/");
        assert_eq!(config.tenant, "team-a");
        assert_eq!(config.auth.username(), "script-user");
    }
}
