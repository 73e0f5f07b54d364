//! Turn off expensive analytics settings on virtual services.

use albctl_api::refs::ref_name_or_empty;
use albctl_api::{JsonPatch, RequestOptions};
use serde::Serialize;
use serde_json::Value;
use strum::{Display, EnumIter, EnumString, IntoEnumIterator};
use tracing::{info, warn};

use super::text;
use crate::controller::Controller;
use crate::error::CoreError;

/// An analytics setting that can be reset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Display, EnumString, EnumIter)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum AnalyticsAction {
    /// Client insights (active or passive) -> `NO_INSIGHTS`.
    ClientInsights,
    /// Non-significant (full client) logs -> disabled.
    NonSigLogs,
    /// Real-time metrics -> disabled.
    RealtimeMetrics,
}

impl AnalyticsAction {
    /// Every action, in a stable order.
    pub fn all() -> Vec<Self> {
        Self::iter().collect()
    }

    /// Query parameters selecting the VSs that have this setting on.
    pub fn filter(self) -> (&'static str, &'static str) {
        match self {
            Self::ClientInsights => ("search", "(client_insights,IVE)"),
            Self::NonSigLogs => ("analytics_policy.full_client_logs.enabled", "True"),
            Self::RealtimeMetrics => ("analytics_policy.metrics_realtime_update.enabled", "True"),
        }
    }

    /// Patch that switches the setting off.
    pub fn patch(self) -> JsonPatch {
        match self {
            Self::ClientInsights => {
                JsonPatch::replace("/analytics_policy/client_insights", "NO_INSIGHTS")
            }
            Self::NonSigLogs => {
                JsonPatch::replace("/analytics_policy/full_client_logs/enabled", false)
            }
            Self::RealtimeMetrics => {
                JsonPatch::replace("/analytics_policy/metrics_realtime_update/enabled", false)
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum VsOutcome {
    /// Reported only (`list_only`).
    Listed,
    Excluded,
    Updated,
    Failed { error: String },
}

#[derive(Debug, Clone, Serialize)]
pub struct VsResult {
    pub virtual_service: String,
    pub tenant: String,
    #[serde(flatten)]
    pub outcome: VsOutcome,
}

#[derive(Debug, Clone, Serialize)]
pub struct ActionReport {
    pub action: AnalyticsAction,
    pub virtual_services: Vec<VsResult>,
}

/// What to do for each matching VS.
#[derive(Debug, Clone, Default)]
pub struct ResetOptions {
    pub exclude: Vec<String>,
    pub list_only: bool,
}

/// For each action, find VSs with the setting enabled and switch it off.
/// Each VS is patched in its own tenant, so `tenant = "*"` covers all.
pub async fn reset(
    ctrl: &Controller,
    actions: &[AnalyticsAction],
    options: &ResetOptions,
) -> Result<Vec<ActionReport>, CoreError> {
    let session = ctrl.session();
    let mut reports = Vec::with_capacity(actions.len());

    for &action in actions {
        let (key, value) = action.filter();
        let vss: Vec<Value> = session
            .get_all(
                "virtualservice",
                RequestOptions::new()
                    .param(key, value)
                    .param("fields", "uuid,tenant_ref")
                    .param("include_name", true),
            )
            .await?;
        info!(%action, count = vss.len(), "virtual services matched");

        let patch = action.patch();
        let mut results = Vec::with_capacity(vss.len());
        for vs in &vss {
            let name = text(vs, "name").to_owned();
            let tenant = ref_name_or_empty(text(vs, "tenant_ref")).to_owned();

            let outcome = if options.list_only {
                VsOutcome::Listed
            } else if options.exclude.contains(&name) {
                VsOutcome::Excluded
            } else {
                let opts = RequestOptions::new().tenant(tenant.clone());
                match session
                    .patch_json::<Value>(&format!("virtualservice/{}", text(vs, "uuid")), &patch, &opts)
                    .await
                {
                    Ok(_) => VsOutcome::Updated,
                    Err(e) => {
                        warn!(vs = %name, error = %e, "failed to update virtual service");
                        VsOutcome::Failed {
                            error: e.to_string(),
                        }
                    }
                }
            };
            results.push(VsResult {
                virtual_service: name,
                tenant,
                outcome,
            });
        }
        reports.push(ActionReport {
            action,
            virtual_services: results,
        });
    }
    Ok(reports)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn action_names_round_trip_through_cli_spelling() {
        assert_eq!("clientinsights".parse::<AnalyticsAction>().ok(), Some(AnalyticsAction::ClientInsights));
        assert_eq!("nonsiglogs".parse::<AnalyticsAction>().ok(), Some(AnalyticsAction::NonSigLogs));
        assert_eq!(AnalyticsAction::RealtimeMetrics.to_string(), "realtimemetrics");
        assert_eq!(AnalyticsAction::all().len(), 3);
    }

    #[test]
    fn patches_switch_settings_off() {
        let patch = serde_json::to_value(AnalyticsAction::NonSigLogs.patch()).unwrap_or_default();
        assert_eq!(
            patch,
            json!({"json_patch": [{
                "op": "replace",
                "path": "/analytics_policy/full_client_logs/enabled",
                "value": false
            }]})
        );
        assert_eq!(
            AnalyticsAction::ClientInsights.filter(),
            ("search", "(client_insights,IVE)")
        );
    }
}
