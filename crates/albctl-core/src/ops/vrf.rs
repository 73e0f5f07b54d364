//! VRF context to SE network namespace mapping.

use albctl_api::RequestOptions;
use serde::Serialize;
use serde_json::Value;

use super::{array, text, text_at};
use crate::controller::Controller;
use crate::error::CoreError;
use crate::glob::Glob;

/// Namespace of the SE agent itself; never user-facing.
const AGENT_VRF: &str = "seagent-default";

#[derive(Debug, Clone, Serialize)]
pub struct VrfNamespace {
    pub vrf: String,
    pub namespace: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct SeVrfMap {
    pub service_engine: String,
    pub vrfs: Vec<VrfNamespace>,
}

pub fn se_vrf_map(se: &Value) -> SeVrfMap {
    let vrfs = array(se, "vnicdb")
        .first()
        .map(|db| array(db, "vrf"))
        .unwrap_or_default()
        .iter()
        .map(|vrf| VrfNamespace {
            vrf: text_at(vrf, "/vrf_context/name").to_owned(),
            namespace: text(vrf, "ns").to_owned(),
        })
        .filter(|v| v.vrf != AGENT_VRF)
        .collect();
    SeVrfMap {
        service_engine: text(se, "name").to_owned(),
        vrfs,
    }
}

/// Mapping for every service engine whose name matches `pattern`.
pub async fn report(ctrl: &Controller, pattern: &Glob) -> Result<Vec<SeVrfMap>, CoreError> {
    let engines = ctrl
        .session()
        .get_all(
            "serviceengine",
            RequestOptions::new().param("join_subresources", "vnicdb"),
        )
        .await?;
    Ok(engines
        .iter()
        .filter(|se| pattern.is_match(text(se, "name")))
        .map(se_vrf_map)
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn agent_namespace_is_hidden() {
        let se = json!({
            "name": "se-1",
            "vnicdb": [{"vrf": [
                {"vrf_context": {"name": "seagent-default"}, "ns": "ns0"},
                {"vrf_context": {"name": "global"}, "ns": "ns1"},
                {"vrf_context": {"name": "tenant-a"}, "ns": "ns2"}
            ]}]
        });
        let map = se_vrf_map(&se);
        let names: Vec<&str> = map.vrfs.iter().map(|v| v.vrf.as_str()).collect();
        assert_eq!(names, vec!["global", "tenant-a"]);
        assert_eq!(map.vrfs[0].namespace, "ns1");
    }

    #[test]
    fn se_without_vnicdb_has_no_vrfs() {
        assert!(se_vrf_map(&json!({"name": "se-2"})).vrfs.is_empty());
    }
}
