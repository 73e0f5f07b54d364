//! Which virtual services use which WAF policy.

use albctl_api::RequestOptions;
use serde::Serialize;

use super::{scalar, text};
use crate::controller::Controller;
use crate::error::CoreError;

#[derive(Debug, Clone, Serialize)]
pub struct WafPolicyUsage {
    pub policy: String,
    /// Comma-joined names of the referencing virtual services.
    pub virtual_services: String,
    pub mode: String,
    pub paranoia_level: String,
}

/// One row per WAF policy in the session tenant.
pub async fn report(ctrl: &Controller) -> Result<Vec<WafPolicyUsage>, CoreError> {
    let session = ctrl.session();
    let policies = session
        .get_all(
            "wafpolicy",
            RequestOptions::new().param("fields", "name,uuid,mode,paranoia_level"),
        )
        .await?;

    let mut rows = Vec::with_capacity(policies.len());
    for policy in &policies {
        let uuid = text(policy, "uuid");
        let vss = session
            .get_all(
                "virtualservice",
                RequestOptions::new()
                    .param("refers_to", format!("wafpolicy:{uuid}"))
                    .param("fields", "name"),
            )
            .await?;
        let names: Vec<&str> = vss.iter().map(|vs| text(vs, "name")).collect();

        rows.push(WafPolicyUsage {
            policy: text(policy, "name").to_owned(),
            virtual_services: names.join(","),
            mode: text(policy, "mode").to_owned(),
            paranoia_level: scalar(policy.get("paranoia_level")),
        });
    }
    Ok(rows)
}
