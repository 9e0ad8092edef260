mod cli;
mod commands;
mod config;
mod error;
mod output;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use vouchly_core::Console;

use crate::cli::{Cli, Command};
use crate::error::CliError;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    init_tracing(cli.global.verbose);

    if let Err(err) = run(cli).await {
        let code = err.exit_code();
        eprintln!("{:?}", miette::Report::new(err));
        std::process::exit(code);
    }
}

fn init_tracing(verbosity: u8) {
    let filter = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

async fn run(cli: Cli) -> Result<(), CliError> {
    let global = &cli.global;

    match cli.command {
        // Config commands don't need a backend
        Command::Config(args) => commands::config_cmd::handle(args, global),

        Command::Completions(args) => {
            use clap::CommandFactory;
            use clap_complete::generate;

            let mut cmd = Cli::command();
            generate(args.shell, &mut cmd, "vouchly", &mut std::io::stdout());
            Ok(())
        }

        cmd => {
            let cfg = config::load_config_or_default();
            let (name, profile) = config::resolve_profile(global, &cfg)?;

            let result = match cmd {
                Command::Pay(args) => commands::pay::handle(args, &profile, &name, global).await,
                cmd => {
                    let console_config = config::console_config(&profile, global)?;
                    let tokens = vouchly_config::token_store(&profile, &name)?;
                    let console = Console::new(console_config, tokens)?;

                    tracing::debug!(command = ?cmd, profile = %name, "dispatching command");
                    commands::dispatch(cmd, &console, &name, &profile, global).await
                }
            };
            result.map_err(|e| e.with_context(&name, global.timeout))
        }
    }
}
