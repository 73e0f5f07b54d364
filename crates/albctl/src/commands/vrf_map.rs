//! VRF to namespace map handler.

use tabled::Tabled;

use albctl_core::Controller;
use albctl_core::ops::vrf::{self, SeVrfMap, VrfNamespace};

use crate::cli::{GlobalOpts, VrfMapArgs};
use crate::error::CliError;
use crate::output;

use super::util;

#[derive(Tabled)]
struct VrfRow {
    #[tabled(rename = "VRF")]
    vrf: String,
    #[tabled(rename = "Namespace")]
    namespace: String,
}

impl From<&VrfNamespace> for VrfRow {
    fn from(v: &VrfNamespace) -> Self {
        Self {
            vrf: v.vrf.clone(),
            namespace: v.namespace.clone(),
        }
    }
}

fn render_sections(maps: &[SeVrfMap]) -> String {
    maps.iter()
        .map(|se| {
            let rows: Vec<VrfRow> = se.vrfs.iter().map(VrfRow::from).collect();
            format!("Service Engine {}:\n{}", se.service_engine, output::render_table(&rows))
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

pub async fn handle(
    controller: &Controller,
    args: VrfMapArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let pattern = util::glob("se", &args.se)?;
    let maps = vrf::report(controller, &pattern).await?;
    let out = output::render_single(global.output, &maps, |m| render_sections(m), |m| {
        m.iter()
            .map(|se| se.service_engine.clone())
            .collect::<Vec<_>>()
            .join("\n")
    });
    output::print_output(&out, global.quiet);
    Ok(())
}
