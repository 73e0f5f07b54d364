//! Virtual MAC addresses of network-service floating interface IPs.
//!
//! The SE derives the VMAC deterministically from the SE group UUID and
//! the floating IP, so it can be computed offline for firewall and
//! switch configuration.

use std::fmt::Write as _;

use albctl_api::RequestOptions;
use albctl_api::refs::{ref_name_or_empty, ref_uuid};
use md5::{Digest, Md5};
use serde::Serialize;
use serde_json::Value;

use super::{array, ref_name_of, text};
use crate::controller::Controller;
use crate::error::CoreError;

#[derive(Debug, Clone, Serialize)]
pub struct VmacEntry {
    pub network_service: String,
    pub cloud: String,
    pub vrf: String,
    pub se_group: String,
    pub floating_ip: String,
    pub vmac: String,
    pub vmac_enabled: bool,
}

/// `0e:` followed by the first five bytes of `md5(se_group_uuid + ip)`,
/// each inverted.
pub fn vmac(se_group_uuid: &str, floating_ip: &str) -> String {
    let digest = Md5::new()
        .chain_update(se_group_uuid.as_bytes())
        .chain_update(floating_ip.as_bytes())
        .finalize();
    let mut mac = String::from("0e");
    for byte in digest.iter().take(5) {
        let _ = write!(mac, ":{:02x}", byte ^ 0xff);
    }
    mac
}

/// Rows for one `networkservice` object, one per floating IP.
pub fn entries(network_service: &Value) -> Vec<VmacEntry> {
    let seg_ref = text(network_service, "se_group_ref");
    let seg_uuid = ref_uuid(seg_ref).unwrap_or("");
    let routing = network_service.get("routing_service").unwrap_or(&Value::Null);
    let enabled = routing
        .get("enable_vmac")
        .and_then(Value::as_bool)
        .unwrap_or(false);

    array(routing, "floating_intf_ip")
        .iter()
        .chain(array(routing, "floating_intf_ip_se_2"))
        .map(|fip| {
            let ip = text(fip, "addr");
            VmacEntry {
                network_service: text(network_service, "name").to_owned(),
                cloud: ref_name_of(network_service, "cloud_ref"),
                vrf: ref_name_of(network_service, "vrf_ref"),
                se_group: ref_name_or_empty(seg_ref).to_owned(),
                floating_ip: ip.to_owned(),
                vmac: vmac(seg_uuid, ip),
                vmac_enabled: enabled,
            }
        })
        .collect()
}

/// VMACs for every network service, or only the one named.
pub async fn report(ctrl: &Controller, name: Option<&str>) -> Result<Vec<VmacEntry>, CoreError> {
    let opts = RequestOptions::new().param("include_name", true);
    let services = match name {
        Some(name) => ctrl
            .session()
            .get_object_by_name("networkservice", name, opts)
            .await?
            .into_iter()
            .collect(),
        None => ctrl.session().get_all("networkservice", opts).await?,
    };
    Ok(services.iter().flat_map(entries).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn vmac_is_inverted_md5_prefix() {
        // md5("") = d41d8cd98f00b204e9800998ecf8427e
        assert_eq!(vmac("", ""), "0e:2b:e2:73:26:70");
    }

    #[test]
    fn vmac_shape() {
        let mac = vmac("serviceenginegroup-abc", "10.10.10.10");
        assert_eq!(mac.len(), 17);
        assert!(mac.starts_with("0e:"));
        assert_eq!(mac, vmac("serviceenginegroup-abc", "10.10.10.10"));
        assert_ne!(mac, vmac("serviceenginegroup-abc", "10.10.10.11"));
    }

    #[test]
    fn one_entry_per_floating_ip() {
        let ns = json!({
            "name": "ns-1",
            "se_group_ref": "https://c/api/serviceenginegroup/seg-1#Default-Group",
            "cloud_ref": "https://c/api/cloud/cloud-1#Default-Cloud",
            "vrf_ref": "https://c/api/vrfcontext/vrf-1#global",
            "routing_service": {
                "enable_vmac": true,
                "floating_intf_ip": [{"addr": "10.0.0.1", "type": "V4"}],
                "floating_intf_ip_se_2": [{"addr": "10.0.0.2", "type": "V4"}]
            }
        });
        let rows = entries(&ns);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].se_group, "Default-Group");
        assert_eq!(rows[1].floating_ip, "10.0.0.2");
        assert_eq!(rows[1].vmac, vmac("seg-1", "10.0.0.2"));
        assert!(rows[0].vmac_enabled);
    }
}
