//! `vouchly-tui` -- terminal dashboard for the voucher store admin console.
//!
//! Built on [ratatui](https://ratatui.rs) with reactive data from
//! `vouchly-core`'s [`DataStore`](vouchly_core::DataStore). Screens are
//! navigable via number keys (1-3): Dashboard, Vouchers and Sales. A login
//! view is shown first whenever no remembered session exists.
//!
//! Logs are written to a file (default `/tmp/vouchly-tui.log`) so they never
//! corrupt the terminal.

mod action;
mod app;
mod component;
mod data_bridge;
mod event;
mod form;
mod screen;
mod screens;
mod theme;
mod tui;

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use color_eyre::eyre::{Result, WrapErr, eyre};
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use vouchly_core::Console;

use crate::app::{App, LoginDefaults};

/// Terminal dashboard for the voucher store.
#[derive(Parser, Debug)]
#[command(name = "vouchly-tui", version, about)]
struct Cli {
    /// Profile to use (defaults to the config's default profile)
    #[arg(short, long, env = "VOUCHLY_PROFILE")]
    profile: Option<String>,

    /// Backend URL, overriding the profile
    #[arg(short, long, env = "VOUCHLY_BACKEND")]
    backend: Option<String>,

    /// Seconds between background refreshes (0 disables)
    #[arg(long)]
    refresh: Option<u64>,

    /// Log file path
    #[arg(long, default_value = "/tmp/vouchly-tui.log")]
    log_file: PathBuf,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

/// File-based tracing. Logging to stdout/stderr would corrupt the UI.
/// The returned guard must live until exit so buffered lines are flushed.
fn setup_tracing(cli: &Cli) -> WorkerGuard {
    let level = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!("vouchly_tui={level},vouchly_core={level},vouchly_api={level}"))
    });

    let dir = cli.log_file.parent().unwrap_or(std::path::Path::new("/tmp"));
    let file_name = cli
        .log_file
        .file_name()
        .unwrap_or(std::ffi::OsStr::new("vouchly-tui.log"));

    let appender = tracing_appender::rolling::never(dir, file_name);
    let (non_blocking, guard) = tracing_appender::non_blocking(appender);

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_writer(non_blocking)
                .with_ansi(false)
                .with_target(true),
        )
        .init();

    guard
}

/// Build the console for the selected profile. Flags win over the file.
fn build_console(cli: &Cli) -> Result<(Console, LoginDefaults)> {
    let cfg = vouchly_config::load_config_or_default();
    let name = cfg.profile_name(cli.profile.as_deref());

    let mut profile = match (cfg.profiles.get(&name), cli.backend.as_deref()) {
        (Some(profile), _) => profile.clone(),
        (None, Some(backend)) => vouchly_config::Profile::new(backend),
        (None, None) => {
            return Err(eyre!(
                "no profile '{name}' in {}; run `vouchly config init` or pass --backend",
                vouchly_config::config_path().display()
            ));
        }
    };
    if let Some(ref backend) = cli.backend {
        profile.backend.clone_from(backend);
    }

    let mut config = vouchly_config::profile_to_console_config(&profile)
        .wrap_err_with(|| format!("invalid settings in profile '{name}'"))?;
    if let Some(secs) = cli.refresh {
        config.refresh_interval_secs = secs;
    }
    let refresh = Duration::from_secs(config.refresh_interval_secs);

    let tokens = vouchly_config::token_store(&profile, &name)?;
    let console = Console::new(config, tokens)?;

    let defaults = LoginDefaults {
        username: profile.username.clone().unwrap_or_default(),
        password: vouchly_config::resolve_password(&profile, &name),
        profile: name,
    };
    info!(backend = %profile.backend, ?refresh, "console ready");
    Ok((console, defaults))
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Hooks go in before the terminal switches modes so early panics print cleanly.
    tui::install_hooks()?;
    let _log_guard = setup_tracing(&cli);

    let (console, defaults) = build_console(&cli)?;
    info!(profile = %defaults.profile, "starting vouchly-tui");

    let mut app = App::new(console, defaults);
    app.run().await?;

    Ok(())
}
