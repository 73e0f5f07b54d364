//! Terraform export handler.

use tabled::Tabled;

use albctl_core::Controller;
use albctl_core::ops::terraform::{self, ExportRequest, ExportedObject, Selection};

use crate::cli::{GlobalOpts, TerraformArgs, TerraformCommand};
use crate::error::CliError;
use crate::output::{self, Status};

use super::util;

#[derive(Tabled)]
struct ObjectRow {
    #[tabled(rename = "UUID")]
    uuid: String,
    #[tabled(rename = "Name")]
    name: String,
}

impl From<&ExportedObject> for ObjectRow {
    fn from(o: &ExportedObject) -> Self {
        Self {
            uuid: o.uuid.clone(),
            name: o.name.clone(),
        }
    }
}

pub async fn handle(
    controller: &Controller,
    args: TerraformArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match args.command {
        TerraformCommand::Export {
            object_type,
            file,
            search,
            names,
            tf_version,
            legacy_import,
            terraform,
        } => {
            let selection = match (search, names.is_empty()) {
                (Some(s), _) => Selection::Search(s),
                (None, false) => Selection::Names(names),
                (None, true) => Selection::All,
            };
            let request = ExportRequest {
                object_type,
                selection,
                output: file,
                provider_version: tf_version,
                legacy_import,
                terraform,
            };

            let spinner = util::spinner("Running terraform...", global);
            let report = terraform::export(controller, &request).await;
            spinner.finish_and_clear();
            let report = report?;

            let out = output::render_list(global.output, &report.objects, |o| ObjectRow::from(o), |o| {
                o.uuid.clone()
            });
            output::print_output(&out, global.quiet);
            for (name, error) in &report.failures {
                util::status(global, &format!("Failed to import {name}: {error}"), Status::Failed);
            }
            util::status(
                global,
                &format!("Output written to {}", report.output.display()),
                Status::Ok,
            );
            Ok(())
        }
    }
}
