//! Session command handlers: login, logout, whoami.

use std::io::IsTerminal;

use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;

use vouchly_core::Console;

use crate::cli::{GlobalOpts, LoginArgs};
use crate::config::Profile;
use crate::error::CliError;
use crate::output;

use super::util;

fn read_password(profile: &Profile, profile_name: &str) -> Result<SecretString, CliError> {
    if let Some(password) = vouchly_config::resolve_password(profile, profile_name) {
        return Ok(password);
    }
    if !std::io::stdin().is_terminal() {
        return Err(CliError::NoCredentials {
            profile: profile_name.into(),
        });
    }
    let typed = rpassword::prompt_password("Admin password: ").map_err(util::prompt_err)?;
    Ok(SecretString::from(typed))
}

pub async fn login(
    console: &Console,
    args: LoginArgs,
    profile_name: &str,
    profile: &Profile,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let password = read_password(profile, profile_name)?;
    if password.expose_secret().is_empty() {
        return Err(CliError::Validation {
            field: "password".into(),
            reason: "password cannot be empty".into(),
        });
    }

    let username = args.username.or_else(|| profile.username.clone());
    let remember = !args.no_remember;

    let spinner = util::spinner("Logging in...", global.quiet);
    let result = console.login(username.as_deref(), &password, remember).await;
    spinner.finish_and_clear();
    result?;

    if remember {
        util::report(
            &format!("Logged in to {} (profile '{profile_name}')", profile.backend),
            global.quiet,
        );
    } else {
        util::report(
            "Credentials accepted; session not saved (--no-remember)",
            global.quiet,
        );
    }
    Ok(())
}

pub fn logout(console: &Console, profile_name: &str, global: &GlobalOpts) -> Result<(), CliError> {
    console.logout();
    util::report(&format!("Logged out of profile '{profile_name}'"), global.quiet);
    Ok(())
}

#[derive(Serialize)]
struct WhoAmI {
    profile: String,
    backend: String,
    api_layout: String,
    listing: String,
    upload: String,
    logged_in: bool,
}

pub fn whoami(
    console: &Console,
    profile_name: &str,
    profile: &Profile,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let config = console.config();
    let info = WhoAmI {
        profile: profile_name.into(),
        backend: profile.backend.clone(),
        api_layout: config.layout.to_string(),
        listing: config.listing.to_string(),
        upload: config.upload.to_string(),
        logged_in: console.restore()?,
    };

    let color = output::should_color(&global.color);
    let out = output::render_single(
        &global.output,
        &info,
        |w| {
            [
                ("Profile", w.profile.clone()),
                ("Backend", w.backend.clone()),
                ("Layout", format!("{} / {} / {}", w.api_layout, w.listing, w.upload)),
                (
                    "Session",
                    if w.logged_in { "logged in" } else { "not logged in" }.into(),
                ),
            ]
            .iter()
            .map(|(k, v)| format!("{} {v}", output::paint_label(&format!("{k:<8}"), color)))
            .collect::<Vec<_>>()
            .join("\n")
        },
        |w| w.logged_in.to_string(),
    )?;
    output::print_output(&out, global.quiet);
    Ok(())
}
