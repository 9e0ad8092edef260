//! Command dispatch: bridges CLI args -> core Commands -> output formatting.

pub mod auth;
pub mod config_cmd;
pub mod pay;
pub mod sales;
pub mod stats;
pub mod util;
pub mod vouchers;

use vouchly_core::Console;

use crate::cli::{Command, GlobalOpts};
use crate::config::Profile;
use crate::error::CliError;

/// Dispatch a backend-bound admin command to its handler.
///
/// Everything except `login`/`logout`/`whoami` needs a remembered session.
pub async fn dispatch(
    cmd: Command,
    console: &Console,
    profile_name: &str,
    profile: &Profile,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match cmd {
        Command::Login(args) => auth::login(console, args, profile_name, profile, global).await,
        Command::Logout => auth::logout(console, profile_name, global),
        Command::Whoami => auth::whoami(console, profile_name, profile, global),
        cmd => {
            util::require_session(console)?;
            match cmd {
                Command::Vouchers(args) => vouchers::handle(console, args, global).await,
                Command::Sales(args) => sales::handle(console, args, global).await,
                Command::Stats => stats::handle(console, global).await,
                // Handled before dispatch
                Command::Login(_)
                | Command::Logout
                | Command::Whoami
                | Command::Pay(_)
                | Command::Config(_)
                | Command::Completions(_) => Err(CliError::Internal(
                    "command routed to the admin dispatcher by mistake".into(),
                )),
            }
        }
    }
}
