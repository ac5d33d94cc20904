//! Command implementations for the zm CLI.
//!
//! This module contains the actual command handlers that are invoked by the CLI.

pub mod check;
pub mod completions;
pub mod config;
pub mod credentials;
pub mod fields;
pub mod harvest;
pub mod menu;

use crate::cli::Cli;

/// Error type for command execution.
#[derive(Debug, thiserror::Error)]
pub enum CommandError {
    /// Harvest run failed.
    #[error("{0}")]
    Harvest(#[from] zendesk_harvest_rs::HarvestError),

    /// Filter compilation error.
    #[error("filter error: {0}")]
    Filter(#[from] zendesk_harvest_rs::FilterError),

    /// API error.
    #[error("{0}")]
    Api(#[from] zendesk_api_rs::error::Error),

    /// Batch output error.
    #[error("output error: {0}")]
    Output(#[from] zendesk_harvest_rs::OutputError),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl CommandError {
    /// Returns the process exit code for this error.
    pub fn exit_code(&self) -> u8 {
        let code = match self {
            CommandError::Config(_) => 5,
            CommandError::Filter(_) => 1,
            CommandError::Api(e) => e.exit_code(),
            CommandError::Harvest(e) => e.exit_code(),
            CommandError::Output(_) | CommandError::Io(_) => 3,
        };
        u8::try_from(code).unwrap_or(1)
    }
}

/// Wraps a prompt failure (closed stdin, no terminal) as an I/O error.
pub(crate) fn prompt_error(e: dialoguer::Error) -> CommandError {
    CommandError::Io(std::io::Error::other(e.to_string()))
}

/// Result type for command execution.
pub type Result<T> = std::result::Result<T, CommandError>;

/// Context for command execution, containing common dependencies.
pub struct CommandContext {
    /// Whether to use colors.
    pub use_colors: bool,
    /// Whether to be quiet (errors only).
    pub quiet: bool,
    /// Whether to be verbose.
    pub verbose: bool,
}

impl CommandContext {
    /// Creates a new command context from CLI arguments.
    pub fn from_cli(cli: &Cli) -> Self {
        let no_color_env = std::env::var_os("NO_COLOR").is_some_and(|v| !v.is_empty());
        Self {
            use_colors: !cli.no_color && !no_color_env,
            quiet: cli.quiet,
            verbose: cli.verbose,
        }
    }
}
