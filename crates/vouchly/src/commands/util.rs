//! Shared helpers for command handlers.

use std::io::IsTerminal;
use std::path::Path;
use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};

use vouchly_core::{Console, CoreError, StatusFilter};

use crate::cli::StatusArg;
use crate::error::CliError;

pub fn status_filter(arg: StatusArg) -> StatusFilter {
    match arg {
        StatusArg::All => StatusFilter::All,
        StatusArg::Used => StatusFilter::Used,
        StatusArg::Unused => StatusFilter::Unused,
    }
}

/// Resume the remembered session or fail with `NotLoggedIn`.
pub fn require_session(console: &Console) -> Result<(), CliError> {
    if console.restore()? {
        Ok(())
    } else {
        Err(CoreError::NotLoggedIn.into())
    }
}

/// Prompt for confirmation, auto-approving if `--yes` was passed.
pub fn confirm(message: &str, action: &str, yes_flag: bool) -> Result<bool, CliError> {
    if yes_flag {
        return Ok(true);
    }
    if !std::io::stdin().is_terminal() {
        return Err(CliError::NonInteractiveRequiresYes {
            action: action.into(),
        });
    }
    dialoguer::Confirm::new()
        .with_prompt(message)
        .default(false)
        .interact()
        .map_err(prompt_err)
}

/// Map a dialoguer / interactive I/O failure into CliError.
pub fn prompt_err(e: impl std::fmt::Display) -> CliError {
    CliError::Validation {
        field: "interactive".into(),
        reason: format!("prompt failed: {e}"),
    }
}

/// Spinner on stderr; hidden in quiet mode or when stderr is not a terminal.
pub fn spinner(message: &str, quiet: bool) -> ProgressBar {
    if quiet || !std::io::stderr().is_terminal() {
        return ProgressBar::hidden();
    }
    let bar = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::with_template("{spinner} {msg}") {
        bar.set_style(style);
    }
    bar.set_message(message.to_owned());
    bar.enable_steady_tick(Duration::from_millis(100));
    bar
}

/// Write exported text to `file`, or to stdout when no file is given.
pub fn write_export(file: Option<&Path>, content: &str, quiet: bool) -> Result<(), CliError> {
    match file {
        Some(path) => {
            std::fs::write(path, content)?;
            if !quiet {
                eprintln!("✓ Wrote {}", path.display());
            }
        }
        None => print!("{content}"),
    }
    Ok(())
}

/// Success line on stderr unless quiet.
pub fn report(message: &str, quiet: bool) {
    if !quiet {
        eprintln!("✓ {message}");
    }
}
