//! Inventory report handler. Prints a table or writes CSV with `--file`.

use std::path::Path;

use tabled::Tabled;

use albctl_core::Controller;
use albctl_core::ops::inventory::{
    self, Inventory, InventoryKind, PoolInventory, SeInventory, VsInventory,
};

use crate::cli::{GlobalOpts, InventoryArgs, InventoryKindArg};
use crate::error::CliError;
use crate::output;

use super::util;

// ── Table rows ──────────────────────────────────────────────────────

#[derive(Tabled)]
struct VsRow {
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "UUID")]
    uuid: String,
    #[tabled(rename = "Tenant")]
    tenant: String,
    #[tabled(rename = "Cloud")]
    cloud: String,
    #[tabled(rename = "VRF")]
    vrf: String,
    #[tabled(rename = "Type")]
    vs_type: String,
    #[tabled(rename = "SEG")]
    se_group: String,
    #[tabled(rename = "VIPs")]
    vips: String,
    #[tabled(rename = "FQDNs")]
    fqdns: String,
    #[tabled(rename = "Ports")]
    ports: String,
    #[tabled(rename = "Pools")]
    pools: String,
    #[tabled(rename = "Pool Groups")]
    pool_groups: String,
    #[tabled(rename = "App Type")]
    app_type: String,
    #[tabled(rename = "WAF")]
    waf: String,
    #[tabled(rename = "State")]
    state: String,
    #[tabled(rename = "Oper State")]
    oper_state: String,
    #[tabled(rename = "Health Score")]
    health_score: String,
    #[tabled(rename = "Service Engines")]
    service_engines: String,
}

impl From<&VsInventory> for VsRow {
    fn from(v: &VsInventory) -> Self {
        Self {
            name: v.name.clone(),
            uuid: v.uuid.clone(),
            tenant: v.tenant.clone(),
            cloud: v.cloud.clone(),
            vrf: v.vrf.clone(),
            vs_type: v.vs_type.clone(),
            se_group: v.se_group.clone(),
            vips: v.vips.clone(),
            fqdns: v.fqdns.clone(),
            ports: v.ports.clone(),
            pools: v.pools.clone(),
            pool_groups: v.pool_groups.clone(),
            app_type: v.app_type.clone(),
            waf: v.waf.clone(),
            state: v.state.clone(),
            oper_state: v.oper_state.clone(),
            health_score: v.health_score.clone(),
            service_engines: v.service_engines.clone(),
        }
    }
}

#[derive(Tabled)]
struct PoolRow {
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "UUID")]
    uuid: String,
    #[tabled(rename = "Tenant")]
    tenant: String,
    #[tabled(rename = "Cloud")]
    cloud: String,
    #[tabled(rename = "VRF")]
    vrf: String,
    #[tabled(rename = "Port")]
    port: String,
    #[tabled(rename = "#Servers")]
    server_count: String,
    #[tabled(rename = "State")]
    state: String,
    #[tabled(rename = "Health Score")]
    health_score: String,
    #[tabled(rename = "Virtual Services")]
    virtual_services: String,
}

impl From<&PoolInventory> for PoolRow {
    fn from(p: &PoolInventory) -> Self {
        Self {
            name: p.name.clone(),
            uuid: p.uuid.clone(),
            tenant: p.tenant.clone(),
            cloud: p.cloud.clone(),
            vrf: p.vrf.clone(),
            port: p.port.clone(),
            server_count: p.server_count.clone(),
            state: p.state.clone(),
            health_score: p.health_score.clone(),
            virtual_services: p.virtual_services.clone(),
        }
    }
}

#[derive(Tabled)]
struct PoolDetailRow {
    #[tabled(inline)]
    pool: PoolRow,
    #[tabled(rename = "Servers")]
    servers: String,
}

impl From<&PoolInventory> for PoolDetailRow {
    fn from(p: &PoolInventory) -> Self {
        Self {
            pool: PoolRow::from(p),
            servers: p.servers.clone().unwrap_or_default(),
        }
    }
}

#[derive(Tabled)]
struct SeRow {
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "UUID")]
    uuid: String,
    #[tabled(rename = "Tenant")]
    tenant: String,
    #[tabled(rename = "Cloud")]
    cloud: String,
    #[tabled(rename = "SEG")]
    se_group: String,
    #[tabled(rename = "State")]
    state: String,
    #[tabled(rename = "Oper State")]
    oper_state: String,
    #[tabled(rename = "Connectivity")]
    connectivity: String,
    #[tabled(rename = "Version")]
    version: String,
    #[tabled(rename = "Online Since")]
    online_since: String,
    #[tabled(rename = "Health Score")]
    health_score: String,
    #[tabled(rename = "Virtual Services")]
    virtual_services: String,
}

impl From<&SeInventory> for SeRow {
    fn from(s: &SeInventory) -> Self {
        Self {
            name: s.name.clone(),
            uuid: s.uuid.clone(),
            tenant: s.tenant.clone(),
            cloud: s.cloud.clone(),
            se_group: s.se_group.clone(),
            state: s.state.clone(),
            oper_state: s.oper_state.clone(),
            connectivity: s.connectivity.clone(),
            version: s.version.clone(),
            online_since: s.online_since.clone(),
            health_score: s.health_score.clone(),
            virtual_services: s.virtual_services.clone(),
        }
    }
}

// ── Handler ─────────────────────────────────────────────────────────

fn core_kind(kind: InventoryKindArg) -> InventoryKind {
    match kind {
        InventoryKindArg::Vs => InventoryKind::Vs,
        InventoryKindArg::Pool => InventoryKind::Pool,
        InventoryKindArg::PoolDetail => InventoryKind::PoolDetail,
        InventoryKindArg::Se => InventoryKind::Se,
    }
}

/// Print `data` in the selected format, or write it to `file` as CSV.
fn emit<T, R>(
    data: &[T],
    file: Option<&Path>,
    to_row: impl Fn(&T) -> R,
    id_fn: impl Fn(&T) -> String,
    global: &GlobalOpts,
) -> Result<(), CliError>
where
    T: serde::Serialize,
    R: Tabled,
{
    if let Some(path) = file {
        util::note(global, &format!("Outputting data to {}", path.display()));
        let rows: Vec<R> = data.iter().map(to_row).collect();
        return output::write_csv(&rows, output::create_file(path)?);
    }
    let out = output::render_list(global.output, data, to_row, id_fn);
    output::print_output(&out, global.quiet);
    Ok(())
}

pub async fn handle(
    controller: &Controller,
    args: InventoryArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let kind = core_kind(args.kind);
    let file = args.file.as_deref();
    match inventory::collect(controller, kind).await? {
        Inventory::VirtualServices(vss) => {
            emit(&vss, file, |v| VsRow::from(v), |v| v.name.clone(), global)
        }
        Inventory::Pools(pools) if kind == InventoryKind::PoolDetail => {
            emit(&pools, file, |p| PoolDetailRow::from(p), |p| p.name.clone(), global)
        }
        Inventory::Pools(pools) => {
            emit(&pools, file, |p| PoolRow::from(p), |p| p.name.clone(), global)
        }
        Inventory::ServiceEngines(ses) => {
            emit(&ses, file, |s| SeRow::from(s), |s| s.name.clone(), global)
        }
    }
}
