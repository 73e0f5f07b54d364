//! Certificate replacement handler.

use std::fmt::Write as _;

use albctl_core::Controller;
use albctl_core::ops::certificates::{self, PairOutcome};

use crate::cli::{CertsArgs, CertsCommand, GlobalOpts};
use crate::error::CliError;
use crate::output::{self, Status};

fn describe(outcomes: &[PairOutcome], color: bool) -> String {
    let mut out = String::new();
    for pair in outcomes {
        for missing in &pair.missing {
            let _ = writeln!(out, "Unable to find certificate {missing}");
        }
        for update in &pair.updates {
            let _ = writeln!(
                out,
                "Updating VS {}: {} -> {}",
                update.virtual_service, update.from, update.to
            );
            let line = match &update.error {
                None => output::paint(
                    &format!("Updated Virtual Service {}", update.virtual_service),
                    Status::Ok,
                    color,
                ),
                Some(e) => output::paint(
                    &format!("Failed to update Virtual Service {}: {e}", update.virtual_service),
                    Status::Failed,
                    color,
                ),
            };
            let _ = writeln!(out, "{line}");
        }
    }
    out.trim_end().to_owned()
}

pub async fn handle(
    controller: &Controller,
    args: CertsArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match args.command {
        CertsCommand::Replace { search, replace } => {
            let outcomes = certificates::replace(controller, &search, &replace).await?;
            let color = output::should_color(global.color);
            let out = output::render_single(
                global.output,
                &outcomes,
                |o| describe(o, color),
                |o| describe(o, false),
            );
            output::print_output(&out, global.quiet);
            Ok(())
        }
    }
}
