//! Flattened inventory reports for virtual services, pools and service
//! engines, built from the controller's `*-inventory` endpoints.

use albctl_api::RequestOptions;
use albctl_api::refs::{ref_name_or_empty, strip_enum_prefix};
use futures_util::TryStreamExt;
use indexmap::IndexSet;
use serde::Serialize;
use serde_json::Value;
use strum::{Display, EnumString};
use tracing::debug;

use super::{array, ref_name_of, ref_names_joined, scalar, text, text_at};
use crate::controller::Controller;
use crate::error::CoreError;

/// Which inventory to build.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString)]
#[strum(serialize_all = "kebab-case")]
pub enum InventoryKind {
    Vs,
    Pool,
    #[strum(to_string = "pool-detail", serialize = "pooldetail")]
    PoolDetail,
    Se,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VsInventory {
    pub name: String,
    pub uuid: String,
    pub tenant: String,
    pub cloud: String,
    pub vrf: String,
    pub vs_type: String,
    pub se_group: String,
    pub vips: String,
    pub fqdns: String,
    pub ports: String,
    pub pools: String,
    pub pool_groups: String,
    pub app_type: String,
    pub waf: String,
    pub state: String,
    pub oper_state: String,
    pub health_score: String,
    pub service_engines: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PoolInventory {
    pub name: String,
    pub uuid: String,
    pub tenant: String,
    pub cloud: String,
    pub vrf: String,
    pub port: String,
    pub server_count: String,
    pub state: String,
    pub health_score: String,
    pub virtual_services: String,
    /// Only filled for the detailed pool report.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub servers: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeInventory {
    pub name: String,
    pub uuid: String,
    pub tenant: String,
    pub cloud: String,
    pub se_group: String,
    pub state: String,
    pub oper_state: String,
    pub connectivity: String,
    pub version: String,
    pub online_since: String,
    pub health_score: String,
    pub virtual_services: String,
}

/// Result of an inventory run.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum Inventory {
    VirtualServices(Vec<VsInventory>),
    Pools(Vec<PoolInventory>),
    ServiceEngines(Vec<SeInventory>),
}

// ── Row extraction ───────────────────────────────────────────────────

fn addresses(vips: &[Value]) -> String {
    vips.iter()
        .map(|v| text_at(v, "/ip_address/addr"))
        .filter(|a| !a.is_empty())
        .collect::<Vec<_>>()
        .join(",")
}

/// `80,443*,8000-8010`: ranges collapse when start equals end, `*` marks SSL.
fn service_ports(services: &[Value]) -> String {
    services
        .iter()
        .map(|s| {
            let start = scalar(s.get("port"));
            let end = s.get("port_range_end").map_or_else(|| start.clone(), |v| scalar(Some(v)));
            let ssl = s.get("enable_ssl").and_then(Value::as_bool).unwrap_or(false);
            let mut port = start.clone();
            if end != start {
                port.push('-');
                port.push_str(&end);
            }
            if ssl {
                port.push('*');
            }
            port
        })
        .collect::<Vec<_>>()
        .join(",")
}

fn health(object: &Value) -> String {
    scalar(object.pointer("/health_score/health_score"))
}

pub fn vs_row(vs: &Value) -> VsInventory {
    let config = vs.get("config").unwrap_or(&Value::Null);
    let runtime = vs.get("runtime").unwrap_or(&Value::Null);
    let raw_type = text(config, "type");

    let (vips, fqdns) = if raw_type == "VS_TYPE_VH_CHILD" {
        let domains: Vec<&str> = array(config, "vh_domain_name")
            .iter()
            .filter_map(Value::as_str)
            .collect();
        (addresses(array(vs, "parent_vs_vip")), domains.join(","))
    } else {
        let fqdns: Vec<&str> = array(config, "dns_info")
            .iter()
            .map(|d| text(d, "fqdn"))
            .collect();
        (addresses(array(config, "vip")), fqdns.join(","))
    };

    let mut engines = IndexSet::new();
    for summary in array(runtime, "vip_summary") {
        for se in array(summary, "service_engine") {
            engines.insert(ref_name_or_empty(text(se, "url")).to_owned());
        }
    }

    let app_type = vs
        .get("app_profile_type")
        .and_then(Value::as_str)
        .unwrap_or("APPLICATION_PROFILE_TYPE_UNKNOWN");
    let enabled = config.get("enabled").and_then(Value::as_bool).unwrap_or(false);

    VsInventory {
        name: text(config, "name").to_owned(),
        uuid: text(config, "uuid").to_owned(),
        tenant: ref_name_of(config, "tenant_ref"),
        cloud: ref_name_of(config, "cloud_ref"),
        vrf: ref_name_of(config, "vrf_context_ref"),
        vs_type: strip_enum_prefix(raw_type, "VS_TYPE_").to_owned(),
        se_group: ref_name_of(config, "se_group_ref"),
        vips,
        fqdns,
        ports: service_ports(array(config, "services")),
        pools: ref_names_joined(vs, "pools"),
        pool_groups: ref_names_joined(vs, "poolgroups"),
        app_type: strip_enum_prefix(app_type, "APPLICATION_PROFILE_TYPE_").to_owned(),
        waf: ref_name_of(config, "waf_policy_ref"),
        state: if enabled { "Enabled" } else { "Disabled" }.to_owned(),
        oper_state: strip_enum_prefix(text_at(runtime, "/oper_status/state"), "OPER_").to_owned(),
        health_score: health(vs),
        service_engines: engines.into_iter().collect::<Vec<_>>().join(","),
    }
}

pub fn pool_row(pool: &Value) -> PoolInventory {
    let config = pool.get("config").unwrap_or(&Value::Null);
    let runtime = pool.get("runtime").unwrap_or(&Value::Null);
    PoolInventory {
        name: text(config, "name").to_owned(),
        uuid: text(config, "uuid").to_owned(),
        tenant: ref_name_of(config, "tenant_ref"),
        cloud: ref_name_of(config, "cloud_ref"),
        vrf: ref_name_of(config, "vrf_ref"),
        port: scalar(config.get("default_server_port")),
        server_count: scalar(config.get("num_servers")),
        state: strip_enum_prefix(text_at(runtime, "/oper_status/state"), "OPER_").to_owned(),
        health_score: health(pool),
        virtual_services: ref_names_joined(pool, "virtualservices"),
        servers: None,
    }
}

/// `10.0.0.1 [UP,100],10.0.0.2:8080 [DOWN,0]`; the port is shown only
/// when it differs from the pool's default server port.
pub fn server_summary(servers: &[Value], default_port: &str) -> String {
    servers
        .iter()
        .map(|s| {
            let addr = text_at(s, "/config/ip/addr");
            let port = scalar(s.pointer("/config/port"));
            let state = strip_enum_prefix(text_at(s, "/runtime/oper_status/state"), "OPER_");
            let hs = health(s);
            if port == default_port {
                format!("{addr} [{state},{hs}]")
            } else {
                format!("{addr}:{port} [{state},{hs}]")
            }
        })
        .collect::<Vec<_>>()
        .join(",")
}

pub fn se_row(se: &Value) -> SeInventory {
    let config = se.get("config").unwrap_or(&Value::Null);
    let runtime = se.get("runtime").unwrap_or(&Value::Null);
    let connected = runtime
        .get("se_connected")
        .and_then(Value::as_bool)
        .unwrap_or(false);
    SeInventory {
        name: text(config, "name").to_owned(),
        uuid: text(config, "uuid").to_owned(),
        tenant: ref_name_of(config, "tenant_ref"),
        cloud: ref_name_of(config, "cloud_ref"),
        se_group: ref_name_of(config, "se_group_ref"),
        state: strip_enum_prefix(text(config, "enable_state"), "SE_STATE_").to_owned(),
        oper_state: strip_enum_prefix(text_at(runtime, "/oper_status/state"), "OPER_").to_owned(),
        connectivity: if connected { "Connected" } else { "Not connected" }.to_owned(),
        version: text(runtime, "version").to_owned(),
        online_since: text(runtime, "online_since").to_owned(),
        health_score: health(se),
        virtual_services: ref_names_joined(config, "virtualservice_refs"),
    }
}

// ── Fetch ────────────────────────────────────────────────────────────

async fn fetch(ctrl: &Controller, path: &str) -> Result<Vec<Value>, CoreError> {
    let opts = RequestOptions::new().param("include_name", true);
    Ok(ctrl.session().objects(path, opts).try_collect().await?)
}

/// Build the requested inventory.
pub async fn collect(ctrl: &Controller, kind: InventoryKind) -> Result<Inventory, CoreError> {
    match kind {
        InventoryKind::Vs => {
            let objects = fetch(ctrl, "virtualservice-inventory").await?;
            Ok(Inventory::VirtualServices(objects.iter().map(vs_row).collect()))
        }
        InventoryKind::Pool | InventoryKind::PoolDetail => {
            let objects = fetch(ctrl, "pool-inventory").await?;
            let mut rows = Vec::with_capacity(objects.len());
            for object in &objects {
                let mut row = pool_row(object);
                if kind == InventoryKind::PoolDetail {
                    debug!(pool = %row.name, "fetching server inventory");
                    let servers = fetch(ctrl, &format!("pool-inventory/{}/server", row.uuid)).await?;
                    row.servers = Some(server_summary(&servers, &row.port));
                }
                rows.push(row);
            }
            Ok(Inventory::Pools(rows))
        }
        InventoryKind::Se => {
            let objects = fetch(ctrl, "serviceengine-inventory").await?;
            Ok(Inventory::ServiceEngines(objects.iter().map(se_row).collect()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn vs_row_flattens_inventory_object() {
        let vs = json!({
            "config": {
                "name": "web-vs",
                "uuid": "virtualservice-1",
                "type": "VS_TYPE_NORMAL",
                "enabled": true,
                "tenant_ref": "https://c/api/tenant/admin#admin",
                "cloud_ref": "https://c/api/cloud/cloud-1#Default-Cloud",
                "vrf_context_ref": "https://c/api/vrfcontext/vrf-1#global",
                "se_group_ref": "https://c/api/serviceenginegroup/seg-1#Default-Group",
                "vip": [{"ip_address": {"addr": "10.0.0.10"}}],
                "dns_info": [{"fqdn": "web.example.com"}],
                "services": [
                    {"port": 80, "port_range_end": 80, "enable_ssl": false},
                    {"port": 443, "port_range_end": 443, "enable_ssl": true},
                    {"port": 8000, "port_range_end": 8010, "enable_ssl": false}
                ]
            },
            "runtime": {
                "oper_status": {"state": "OPER_UP"},
                "vip_summary": [{"service_engine": [
                    {"url": "https://c/api/serviceengine/se-1#se-a"},
                    {"url": "https://c/api/serviceengine/se-2#se-b"},
                    {"url": "https://c/api/serviceengine/se-1#se-a"}
                ]}]
            },
            "health_score": {"health_score": 95},
            "pools": ["https://c/api/pool/pool-1#web-pool"],
            "poolgroups": [],
            "app_profile_type": "APPLICATION_PROFILE_TYPE_HTTP"
        });
        let row = vs_row(&vs);
        assert_eq!(row.vs_type, "NORMAL");
        assert_eq!(row.vips, "10.0.0.10");
        assert_eq!(row.fqdns, "web.example.com");
        assert_eq!(row.ports, "80,443*,8000-8010");
        assert_eq!(row.pools, "web-pool");
        assert_eq!(row.pool_groups, "");
        assert_eq!(row.app_type, "HTTP");
        assert_eq!(row.waf, "");
        assert_eq!(row.state, "Enabled");
        assert_eq!(row.oper_state, "UP");
        assert_eq!(row.health_score, "95");
        assert_eq!(row.service_engines, "se-a,se-b");
    }

    #[test]
    fn vh_child_takes_parent_vips_and_domains() {
        let vs = json!({
            "config": {
                "type": "VS_TYPE_VH_CHILD",
                "vh_domain_name": ["a.example.com", "b.example.com"],
                "vip": [{"ip_address": {"addr": "ignored"}}]
            },
            "parent_vs_vip": [{"ip_address": {"addr": "10.0.0.1"}}]
        });
        let row = vs_row(&vs);
        assert_eq!(row.vips, "10.0.0.1");
        assert_eq!(row.fqdns, "a.example.com,b.example.com");
        assert_eq!(row.app_type, "UNKNOWN");
        assert_eq!(row.state, "Disabled");
    }

    #[test]
    fn server_summary_hides_default_port() {
        let servers = vec![
            json!({
                "config": {"ip": {"addr": "10.1.1.1"}, "port": 80},
                "runtime": {"oper_status": {"state": "OPER_UP"}},
                "health_score": {"health_score": 100}
            }),
            json!({
                "config": {"ip": {"addr": "10.1.1.2"}, "port": 8080},
                "runtime": {"oper_status": {"state": "OPER_DOWN"}},
                "health_score": {"health_score": 0}
            }),
        ];
        assert_eq!(
            server_summary(&servers, "80"),
            "10.1.1.1 [UP,100],10.1.1.2:8080 [DOWN,0]"
        );
    }

    #[test]
    fn se_row_reports_connectivity() {
        let row = se_row(&json!({
            "config": {
                "name": "se-a",
                "enable_state": "SE_STATE_ENABLED",
                "virtualservice_refs": ["https://c/api/virtualservice/vs-1#web-vs"]
            },
            "runtime": {"se_connected": true, "oper_status": {"state": "OPER_UP"}, "version": "22.1.5"}
        }));
        assert_eq!(row.state, "ENABLED");
        assert_eq!(row.connectivity, "Connected");
        assert_eq!(row.virtual_services, "web-vs");
    }

    #[test]
    fn kind_parses_both_spellings() {
        assert_eq!("pool-detail".parse::<InventoryKind>().ok(), Some(InventoryKind::PoolDetail));
        assert_eq!("pooldetail".parse::<InventoryKind>().ok(), Some(InventoryKind::PoolDetail));
        assert_eq!("vs".parse::<InventoryKind>().ok(), Some(InventoryKind::Vs));
    }
}
