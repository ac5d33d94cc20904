use clap::Parser;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

mod cli;
mod commands;
mod dispatch;
mod output;

use cli::{Cli, Commands, ConfigCommands};
use commands::config::load_config;
use commands::credentials::{load_credentials_file, resolve_credentials};
use commands::CommandContext;
use dispatch::{LocalCommand, LocalDispatch, RemoteCommand, RemoteDispatch};

/// Environment variable holding a tracing filter directive.
const LOG_ENV: &str = "ZM_LOG";

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    // Before parsing, so clap's env fallbacks see the file's values.
    if let Ok(dir) = std::env::current_dir() {
        load_credentials_file(&dir);
    }
    let cli = Cli::parse();
    init_tracing(&cli);

    match run(&cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::from(e.exit_code())
        }
    }
}

/// Default log level when `ZM_LOG` is unset or invalid.
fn default_level(cli: &Cli) -> &'static str {
    if cli.quiet {
        "error"
    } else if cli.verbose {
        "debug"
    } else {
        "warn"
    }
}

fn init_tracing(cli: &Cli) {
    let filter =
        EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(default_level(cli)));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

async fn run(cli: &Cli) -> commands::Result<()> {
    let ctx = CommandContext::from_cli(cli);

    if matches!(
        &cli.command,
        Some(Commands::Config {
            command: Some(ConfigCommands::Edit)
        })
    ) {
        return commands::config::execute_edit(&ctx).await;
    }

    if let Some(dispatch) = LocalDispatch::try_from_cli(cli) {
        return dispatch.execute(&ctx);
    }

    let config = load_config()?;
    let credentials = resolve_credentials(cli, &config)?;

    match RemoteDispatch::from_cli(cli) {
        Some(dispatch) => dispatch.execute(&ctx, &credentials, &config).await,
        None => Ok(()),
    }
}
