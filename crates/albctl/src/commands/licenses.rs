//! License command handlers.

use chrono::Local;
use tabled::Tabled;

use albctl_core::Controller;
use albctl_core::ops::licenses::{self, License};

use crate::cli::{GlobalOpts, LicensesArgs, LicensesCommand};
use crate::error::CliError;
use crate::output::{self, Status};

use super::util;

// ── Table row ───────────────────────────────────────────────────────

#[derive(Tabled)]
struct LicenseRow {
    #[tabled(rename = "Expires")]
    expires: String,
    #[tabled(rename = "SUs")]
    service_units: String,
    #[tabled(rename = "License ID")]
    license_id: String,
    #[tabled(rename = "Name")]
    name: String,
}

impl From<&License> for LicenseRow {
    fn from(l: &License) -> Self {
        Self {
            expires: l
                .expires
                .map_or_else(|| "???".into(), |t| t.format("%Y-%m-%d %H:%M:%S").to_string()),
            service_units: l
                .service_units
                .map_or_else(|| "N/A".into(), |su| su.to_string()),
            license_id: l.license_id.clone(),
            name: l.name.clone(),
        }
    }
}

// ── Handler ─────────────────────────────────────────────────────────

pub async fn handle(
    controller: &Controller,
    args: LicensesArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match args.command {
        LicensesCommand::List => {
            let licenses = licenses::list(controller).await?;
            let out = output::render_list(global.output, &licenses, |l| LicenseRow::from(l), |l| {
                l.license_id.clone()
            });
            output::print_output(&out, global.quiet);
            Ok(())
        }

        LicensesCommand::Delete { license_id } => {
            if !util::confirm(&format!("Delete license {license_id}?"), global.yes)? {
                return Ok(());
            }
            licenses::delete(controller, &license_id).await?;
            util::status(global, &format!("Deleted license {license_id}"), Status::Ok);
            Ok(())
        }

        LicensesCommand::DeleteExpired => {
            let now = Local::now().naive_local();
            let deletions = licenses::delete_expired(controller, now).await?;
            if deletions.is_empty() {
                util::note(global, "No expired licenses");
            }
            for d in &deletions {
                let line = format!("Deleting license {} : {}", d.license.license_id, d.license.name);
                match &d.error {
                    None => util::status(global, &line, Status::Ok),
                    Some(e) => util::status(global, &format!("{line} failed: {e}"), Status::Failed),
                }
            }
            Ok(())
        }
    }
}
