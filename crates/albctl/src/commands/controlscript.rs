//! ControlScript entry points.
//!
//! The controller runs these with the alert JSON as the argument and a
//! short-lived API token in the environment, so they never read profiles.

use std::fmt::Write as _;

use albctl_core::Controller;
use albctl_core::ops::alerts::{self, Alert, ScriptEnv};
use albctl_core::ops::analytics::VsOutcome;
use albctl_core::ops::failover;

use crate::cli::{ControlscriptArgs, ControlscriptCommand, GlobalOpts};
use crate::error::CliError;
use crate::output;

async fn connect(env: &ScriptEnv, tenant: &str) -> Result<Controller, CliError> {
    Ok(Controller::connect(env.controller_config(tenant)?).await?)
}

async fn sticky_pool_group(env: &ScriptEnv, alert: &Alert) -> Result<String, CliError> {
    let Some(event) = alert.events.first() else {
        return Ok("No event data for ControlScript".into());
    };
    let controller = connect(env, env.tenant()).await?;
    let outcome = failover::failover(&controller, &event.obj_uuid, &event.obj_name).await;
    controller.disconnect().await;
    Ok(outcome?.to_string())
}

async fn clear_alerts(env: &ScriptEnv, alert: &Alert) -> Result<String, CliError> {
    let Some(event) = alert.event("VS_UP") else {
        return Ok("No VS_UP Event found in alert data".into());
    };
    let controller = connect(env, env.alert_tenant()).await?;
    let cleared = alerts::clear_vs_down_alerts(&controller, &event.obj_uuid).await;
    controller.disconnect().await;
    Ok(cleared?
        .iter()
        .map(|uuid| format!("Clearing alert {uuid}"))
        .collect::<Vec<_>>()
        .join("\n"))
}

async fn disable_client_insights(env: &ScriptEnv) -> Result<String, CliError> {
    let controller = connect(env, "*").await?;
    let report = alerts::disable_client_insights(&controller).await;
    controller.disconnect().await;
    let report = report?;

    let vss = &report.virtual_services;
    if vss.is_empty() {
        return Ok("No Virtual Services found with Client Insights enabled".into());
    }
    let mut out = format!("{} Virtual Service(s) with Client Insights enabled | ", vss.len());
    for vs in vss {
        let _ = match &vs.outcome {
            VsOutcome::Failed { error } => write!(
                out,
                "Failed to disable CI for Virtual Service {}: {error} || ",
                vs.virtual_service
            ),
            _ => write!(out, "CI disabled for Virtual Service {} || ", vs.virtual_service),
        };
    }
    Ok(out.trim_end().trim_end_matches("||").trim_end().to_owned())
}

pub async fn handle(args: ControlscriptArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let env = ScriptEnv::from_env();
    let message = match args.command {
        ControlscriptCommand::StickyPoolGroup { alert } => {
            sticky_pool_group(&env, &Alert::parse(&alert)?).await?
        }
        ControlscriptCommand::ClearAlerts { alert } => {
            clear_alerts(&env, &Alert::parse(&alert)?).await?
        }
        ControlscriptCommand::DisableClientInsights => disable_client_insights(&env).await?,
    };
    output::print_output(&message, global.quiet);
    Ok(())
}
