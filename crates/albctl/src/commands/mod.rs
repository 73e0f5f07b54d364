//! Command dispatch: bridges CLI args -> core operations -> output formatting.

pub mod analytics;
pub mod backup;
pub mod certs;
pub mod config_cmd;
pub mod controlscript;
pub mod inventory;
pub mod licenses;
pub mod logs;
pub mod metrics;
pub mod ssl_profiles;
pub mod terraform;
pub mod tokens;
pub mod unused;
pub mod upgrades;
pub mod util;
pub mod vmac;
pub mod vrf_map;
pub mod vs;
pub mod waf;

use albctl_core::Controller;

use crate::cli::{Command, GlobalOpts};
use crate::error::CliError;

/// Dispatch a controller-bound command to its handler.
pub async fn dispatch(
    cmd: Command,
    controller: &Controller,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match cmd {
        Command::Licenses(args) => licenses::handle(controller, args, global).await,
        Command::Tokens(args) => tokens::handle(controller, args, global).await,
        Command::Upgrades(args) => upgrades::handle(controller, args, global).await,
        Command::Inventory(args) => inventory::handle(controller, args, global).await,
        Command::Waf(args) => waf::handle(controller, args, global).await,
        Command::Vmac(args) => vmac::handle(controller, args, global).await,
        Command::VrfMap(args) => vrf_map::handle(controller, args, global).await,
        Command::Certs(args) => certs::handle(controller, args, global).await,
        Command::SslProfiles(args) => ssl_profiles::handle(controller, args, global).await,
        Command::Analytics(args) => analytics::handle(controller, args, global).await,
        Command::Vs(args) => vs::handle(controller, args, global).await,
        Command::Unused(args) => unused::handle(controller, args, global).await,
        Command::Backup(args) => backup::handle_backup(controller, args, global).await,
        Command::Restore(args) => backup::handle_restore(controller, args, global).await,
        Command::Metrics(args) => metrics::handle(controller, args, global).await,
        Command::Logs(args) => logs::handle(controller, args, global).await,
        Command::Terraform(args) => terraform::handle(controller, args, global).await,
        // Config, Completions and ControlScripts are handled before connecting
        Command::Config(_) | Command::Completions(_) | Command::Controlscript(_) => {
            unreachable!()
        }
    }
}
