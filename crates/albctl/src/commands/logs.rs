//! Log export handler.

use std::io::Write;

use albctl_core::Controller;
use albctl_core::ops::logs::{self, ExportEvent, LogQuery};

use crate::cli::{GlobalOpts, LogsArgs, LogsCommand};
use crate::error::CliError;
use crate::output::{self, Status};

use super::util;

pub async fn handle(
    controller: &Controller,
    args: LogsArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match args.command {
        LogsCommand::Export {
            virtual_service,
            start,
            end,
            file,
            include_non_significant,
            include_user_defined,
            exclude_significant,
        } => {
            let query = LogQuery {
                virtual_service,
                start: logs::parse_timestamp(&start)?,
                end: logs::parse_timestamp(&end)?,
                include_non_significant,
                include_user_defined,
                exclude_significant,
            };
            if query.start >= query.end {
                return Err(CliError::Validation {
                    field: "start".into(),
                    reason: "the start of the window must be before its end".into(),
                });
            }

            let writer: Box<dyn Write + Send> = match file {
                Some(ref path) => {
                    util::note(global, &format!("Writing to file {}...", path.display()));
                    Box::new(output::create_file(path)?)
                }
                None => Box::new(std::io::stdout()),
            };

            let spinner = util::spinner(
                &format!("Locating Virtual Service {}...", query.virtual_service),
                global,
            );
            let mut fetched = 0usize;
            let total = logs::export(controller, &query, writer, |event| match event {
                ExportEvent::Fields(n) => spinner.set_message(format!("Found {n} fields")),
                ExportEvent::Page { end, count } => {
                    fetched += count;
                    spinner.set_message(format!(
                        "Retrieved {fetched} logs (page ending {})",
                        end.format("%Y-%m-%dT%H:%M:%S")
                    ));
                }
            })
            .await?;
            spinner.finish_and_clear();

            util::status(global, &format!("{total} logs were retrieved."), Status::Ok);
            Ok(())
        }
    }
}
