//! Analytics reset handler.

use std::fmt::Write as _;

use albctl_core::Controller;
use albctl_core::ops::analytics::{self, ActionReport, AnalyticsAction, ResetOptions, VsOutcome};

use crate::cli::{AnalyticsActionArg, AnalyticsArgs, AnalyticsCommand, GlobalOpts};
use crate::error::CliError;
use crate::output::{self, Status};

fn core_action(arg: AnalyticsActionArg) -> AnalyticsAction {
    match arg {
        AnalyticsActionArg::Clientinsights => AnalyticsAction::ClientInsights,
        AnalyticsActionArg::Nonsiglogs => AnalyticsAction::NonSigLogs,
        AnalyticsActionArg::Realtimemetrics => AnalyticsAction::RealtimeMetrics,
    }
}

fn describe(reports: &[ActionReport], color: bool) -> String {
    let mut out = String::new();
    for report in reports {
        let _ = writeln!(out, "Checking {}...", report.action);
        match report.virtual_services.len() {
            0 => {
                let _ = writeln!(out, "No Virtual Services found\n");
                continue;
            }
            n => {
                let _ = writeln!(out, "{n} Virtual Service(s) found");
            }
        }
        for vs in &report.virtual_services {
            let _ = writeln!(out, "Found VS: {} (tenant {})", vs.virtual_service, vs.tenant);
            let line = match &vs.outcome {
                VsOutcome::Listed => continue,
                VsOutcome::Excluded => output::paint(
                    "VS is in exclusion list: Skipping",
                    Status::Skipped,
                    color,
                ),
                VsOutcome::Updated => output::paint(
                    &format!("Updated Virtual Service {}", vs.virtual_service),
                    Status::Ok,
                    color,
                ),
                VsOutcome::Failed { error } => output::paint(
                    &format!("Failed to update Virtual Service {}: {error}", vs.virtual_service),
                    Status::Failed,
                    color,
                ),
            };
            let _ = writeln!(out, "{line}");
        }
        out.push('\n');
    }
    out.trim_end().to_owned()
}

pub async fn handle(
    controller: &Controller,
    args: AnalyticsArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match args.command {
        AnalyticsCommand::Reset {
            action,
            exclude,
            list,
        } => {
            let actions = if action.is_empty() {
                AnalyticsAction::all()
            } else {
                action.into_iter().map(core_action).collect()
            };
            let options = ResetOptions {
                exclude,
                list_only: list,
            };
            let reports = analytics::reset(controller, &actions, &options).await?;
            let color = output::should_color(global.color);
            let out = output::render_single(
                global.output,
                &reports,
                |r| describe(r, color),
                |r| describe(r, false),
            );
            output::print_output(&out, global.quiet);
            Ok(())
        }
    }
}
