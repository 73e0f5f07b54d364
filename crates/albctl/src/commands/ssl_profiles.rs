//! SSL profile cipher clean-up handler.

use albctl_core::Controller;
use albctl_core::ops::ciphers::{self, ProfileOutcome, ProfileResult};

use crate::cli::{GlobalOpts, SslProfilesArgs, SslProfilesCommand};
use crate::error::CliError;
use crate::output::{self, Status};

fn describe(result: &ProfileResult, color: bool) -> String {
    let head = format!("Processing SSL Profile {}...", result.profile);
    match &result.outcome {
        ProfileOutcome::Excluded => {
            format!("{head}{}", output::paint("Skipping", Status::Skipped, color))
        }
        ProfileOutcome::Clean => format!("{head}No unsafe ciphers"),
        ProfileOutcome::Updated { removed } => format!(
            "{head}\nRemoving the following ciphers:\n{}...{}",
            removed.join(", "),
            output::paint("OK!", Status::Ok, color)
        ),
        ProfileOutcome::Failed { removed, error } => format!(
            "{head}\nRemoving the following ciphers:\n{}...{}",
            removed.join(", "),
            output::paint(&format!("Got error {error}"), Status::Failed, color)
        ),
    }
}

pub async fn handle(
    controller: &Controller,
    args: SslProfilesArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match args.command {
        SslProfilesCommand::RemoveCiphers { name, exclude } => {
            let results = ciphers::remove_unsafe(controller, &name, &exclude).await?;
            let color = output::should_color(global.color);
            let text = |rs: &Vec<ProfileResult>, color: bool| {
                rs.iter().map(|r| describe(r, color)).collect::<Vec<_>>().join("\n")
            };
            let out = output::render_single(
                global.output,
                &results,
                |rs| text(rs, color),
                |rs| text(rs, false),
            );
            output::print_output(&out, global.quiet);
            Ok(())
        }
    }
}
