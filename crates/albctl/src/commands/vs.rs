//! Virtual service handlers.

use std::fmt::Write as _;

use albctl_core::Controller;
use albctl_core::ops::segroup::{self, MoveSummary, VsFilter};

use crate::cli::{GlobalOpts, VsArgs, VsCommand};
use crate::error::CliError;
use crate::output::{self, Status};

fn plural(n: usize) -> &'static str {
    if n == 1 { "" } else { "s" }
}

fn describe(summary: &MoveSummary, color: bool) -> String {
    let mut out = String::new();
    for skipped in &summary.skipped {
        let line = format!("Skipping VS {} as it is {}", skipped.virtual_service, skipped.reason);
        let _ = writeln!(out, "{}", output::paint(&line, Status::Skipped, color));
    }
    for name in &summary.updated {
        let line = format!("Updated Virtual Service {name}");
        let _ = writeln!(out, "{}", output::paint(&line, Status::Ok, color));
    }
    for failed in &summary.failed {
        let line = format!(
            "Failed to update Virtual Service {}: {}",
            failed.virtual_service, failed.error
        );
        let _ = writeln!(out, "{}", output::paint(&line, Status::Failed, color));
    }

    let (ok, skipped, failed) = (
        summary.updated.len(),
        summary.skipped.len(),
        summary.failed.len(),
    );
    let _ = writeln!(out, "Finished.");
    let _ = writeln!(out, "{ok} Virtual Service{} moved.", plural(ok));
    let _ = writeln!(out, "{skipped} Virtual Service{} skipped.", plural(skipped));
    let _ = writeln!(out, "{failed} Virtual Service{} failed.", plural(failed));
    if failed > 0 {
        let names: Vec<&str> = summary
            .failed
            .iter()
            .map(|f| f.virtual_service.as_str())
            .collect();
        let _ = writeln!(out, "{}", names.join(","));
    }
    out.trim_end().to_owned()
}

pub async fn handle(
    controller: &Controller,
    args: VsArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match args.command {
        VsCommand::MoveSeGroup {
            source,
            dest,
            include,
            exclude,
        } => {
            let filter = VsFilter { include, exclude };
            let summary = segroup::move_virtual_services(controller, &source, &dest, &filter).await?;
            let color = output::should_color(global.color);
            let out = output::render_single(
                global.output,
                &summary,
                |s| describe(s, color),
                |s| s.updated.join("\n"),
            );
            output::print_output(&out, global.quiet);
            Ok(())
        }
    }
}
