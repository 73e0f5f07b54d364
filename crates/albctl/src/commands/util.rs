//! Shared helpers for command handlers.

use std::io::IsTerminal;
use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};

use albctl_core::Glob;

use crate::cli::GlobalOpts;
use crate::error::{CliError, prompt_err};
use crate::output;

/// Prompt for confirmation, auto-approving if `--yes` was passed.
pub fn confirm(message: &str, yes_flag: bool) -> Result<bool, CliError> {
    if yes_flag {
        return Ok(true);
    }
    if !std::io::stdin().is_terminal() {
        return Err(CliError::NonInteractiveRequiresYes {
            action: message.trim_end_matches('?').to_owned(),
        });
    }
    dialoguer::Confirm::new()
        .with_prompt(message)
        .default(false)
        .interact()
        .map_err(prompt_err)
}

/// Parse a `--vs` / `--se` style name pattern.
pub fn glob(field: &str, pattern: &str) -> Result<Glob, CliError> {
    Glob::new(pattern).map_err(|e| CliError::Validation {
        field: field.into(),
        reason: e.to_string(),
    })
}

/// Spinner on stderr; hidden in quiet mode.
pub fn spinner(message: &str, global: &GlobalOpts) -> ProgressBar {
    if global.quiet {
        return ProgressBar::hidden();
    }
    let bar = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::with_template("{spinner} {msg}") {
        bar.set_style(style);
    }
    bar.set_message(message.to_owned());
    bar.enable_steady_tick(Duration::from_millis(120));
    bar
}

/// Counted progress bar on stderr; hidden in quiet mode.
pub fn progress(len: usize, global: &GlobalOpts) -> ProgressBar {
    if global.quiet {
        return ProgressBar::hidden();
    }
    let bar = ProgressBar::new(u64::try_from(len).unwrap_or(u64::MAX));
    if let Ok(style) = ProgressStyle::with_template("[{bar:30}] {pos}/{len} {msg}") {
        bar.set_style(style.progress_chars("=> "));
    }
    bar
}

/// Status line on stderr, suppressed by `--quiet`.
pub fn note(global: &GlobalOpts, message: &str) {
    if !global.quiet {
        eprintln!("{message}");
    }
}

/// Colored status line on stderr.
pub fn status(global: &GlobalOpts, message: &str, status: output::Status) {
    if !global.quiet {
        let color = output::should_color(global.color);
        eprintln!("{}", output::paint(message, status, color));
    }
}
