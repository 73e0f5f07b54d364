//! Virtual MAC report handler.

use tabled::Tabled;

use albctl_core::Controller;
use albctl_core::ops::vmac::{self, VmacEntry};

use crate::cli::{GlobalOpts, VmacArgs};
use crate::error::CliError;
use crate::output;

use super::util;

#[derive(Tabled)]
struct VmacRow {
    #[tabled(rename = "Network Service")]
    network_service: String,
    #[tabled(rename = "Cloud")]
    cloud: String,
    #[tabled(rename = "VRF")]
    vrf: String,
    #[tabled(rename = "SE Group")]
    se_group: String,
    #[tabled(rename = "Floating IP")]
    floating_ip: String,
    #[tabled(rename = "VMAC")]
    vmac: String,
    #[tabled(rename = "VMAC Enabled")]
    vmac_enabled: bool,
}

impl From<&VmacEntry> for VmacRow {
    fn from(e: &VmacEntry) -> Self {
        Self {
            network_service: e.network_service.clone(),
            cloud: e.cloud.clone(),
            vrf: e.vrf.clone(),
            se_group: e.se_group.clone(),
            floating_ip: e.floating_ip.clone(),
            vmac: e.vmac.clone(),
            vmac_enabled: e.vmac_enabled,
        }
    }
}

pub async fn handle(
    controller: &Controller,
    args: VmacArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let entries = vmac::report(controller, args.network_service.as_deref()).await?;
    if entries.is_empty() {
        util::note(global, "No network services found.");
        return Ok(());
    }
    let out = output::render_list(
        global.output,
        &entries,
        |e| VmacRow::from(e),
        |e| e.vmac.clone(),
    );
    output::print_output(&out, global.quiet);
    Ok(())
}
