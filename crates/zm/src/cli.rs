//! CLI argument parsing using clap derive macros.
//!
//! This module defines the command-line interface for the zm CLI.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use zendesk_harvest_rs::Combinator;

/// zm - harvest, filter and export Zendesk tickets
#[derive(Parser, Debug)]
#[command(name = "zm")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Verbose output (show debug information)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Quiet mode (errors only)
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Disable colors in output (also honours NO_COLOR)
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Zendesk subdomain (the `acme` in acme.zendesk.com). A credentials.env
    /// file in the working directory overrides the environment variables
    #[arg(long, global = true, env = "ZENDESK_SUBDOMAIN")]
    pub subdomain: Option<String>,

    /// Agent email used for API token authentication
    #[arg(long, global = true, env = "ZENDESK_EMAIL")]
    pub email: Option<String>,

    /// Override API token (default: credentials.env, then env, then config)
    #[arg(long, global = true, env = "ZENDESK_API_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Harvest tickets for every role and write filtered batches
    #[command(alias = "h")]
    Harvest {
        /// Filter entry as field=expression, or `all` (repeatable; skips the menu)
        #[arg(short, long, action = clap::ArgAction::Append)]
        filter: Vec<String>,

        /// How repeated --filter entries combine
        #[arg(short, long, value_enum, default_value = "and")]
        join: JoinArg,

        /// Start harvesting without the interactive menu
        #[arg(short = 'y', long)]
        yes: bool,

        /// Records per batch (default: from config, else 100)
        #[arg(short, long, value_parser = clap::value_parser!(u64).range(1..))]
        batch_size: Option<u64>,

        /// Records requested per page (default: from config, else 100)
        #[arg(long, value_parser = clap::value_parser!(u32).range(1..=100))]
        page_size: Option<u32>,

        /// Directory batch files are written to (default: from config, else .)
        #[arg(short, long)]
        output_dir: Option<PathBuf>,

        /// Do not write the ticket-variable (.env) file per batch
        #[arg(long)]
        no_env_file: bool,
    },

    /// List every filterable field
    Fields,

    /// Compile a filter expression and show its postfix form
    Check {
        /// Field key (see `zm fields`)
        field: String,

        /// Expression, or start..end for range fields
        expression: String,
    },

    /// View and edit configuration
    Config {
        #[command(subcommand)]
        command: Option<ConfigCommands>,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Combinator for repeated `--filter` entries
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum JoinArg {
    And,
    Or,
}

impl From<JoinArg> for Combinator {
    fn from(join: JoinArg) -> Self {
        match join {
            JoinArg::And => Combinator::And,
            JoinArg::Or => Combinator::Or,
        }
    }
}

/// Config subcommands
#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Show current configuration
    Show,

    /// Open config in $EDITOR
    Edit,

    /// Set a configuration value
    Set {
        /// Configuration key (e.g. zendesk.subdomain, harvest.batch_size)
        key: String,

        /// Configuration value
        value: String,
    },

    /// Print config file path
    Path,
}

/// Supported shells for completions
#[derive(ValueEnum, Clone, Copy, Debug)]
pub enum Shell {
    Bash,
    Zsh,
    Fish,
    Powershell,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn verify_cli() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_no_command() {
        let cli = Cli::try_parse_from(["zm"]).unwrap();
        assert!(cli.command.is_none());
    }

    #[test]
    fn test_harvest_filters() {
        let cli = Cli::parse_from([
            "zm",
            "harvest",
            "-f",
            "status=open OR pending",
            "--filter",
            "subject=outage",
            "--join",
            "or",
            "--batch-size",
            "50",
            "--no-env-file",
        ]);
        if let Some(Commands::Harvest {
            filter,
            join,
            batch_size,
            no_env_file,
            yes,
            ..
        }) = cli.command
        {
            assert_eq!(filter, vec!["status=open OR pending", "subject=outage"]);
            assert_eq!(join, JoinArg::Or);
            assert_eq!(batch_size, Some(50));
            assert!(no_env_file);
            assert!(!yes);
        } else {
            panic!("Expected Harvest command");
        }
    }

    #[test]
    fn test_harvest_defaults() {
        let cli = Cli::parse_from(["zm", "h"]);
        if let Some(Commands::Harvest {
            filter,
            join,
            batch_size,
            page_size,
            output_dir,
            ..
        }) = cli.command
        {
            assert!(filter.is_empty());
            assert_eq!(join, JoinArg::And);
            assert!(batch_size.is_none());
            assert!(page_size.is_none());
            assert!(output_dir.is_none());
        } else {
            panic!("Expected Harvest command");
        }
    }

    #[test]
    fn test_batch_and_page_size_ranges() {
        assert!(Cli::try_parse_from(["zm", "harvest", "--batch-size", "0"]).is_err());
        assert!(Cli::try_parse_from(["zm", "harvest", "--page-size", "101"]).is_err());
        assert!(Cli::try_parse_from(["zm", "harvest", "--page-size", "100"]).is_ok());
    }

    #[test]
    fn test_check_command() {
        let cli = Cli::parse_from(["zm", "check", "status", "open OR pending"]);
        if let Some(Commands::Check { field, expression }) = cli.command {
            assert_eq!(field, "status");
            assert_eq!(expression, "open OR pending");
        } else {
            panic!("Expected Check command");
        }
    }

    #[test]
    fn test_config_subcommands() {
        let cli = Cli::parse_from(["zm", "config", "set", "harvest.batch_size", "50"]);
        if let Some(Commands::Config {
            command: Some(ConfigCommands::Set { key, value }),
        }) = cli.command
        {
            assert_eq!(key, "harvest.batch_size");
            assert_eq!(value, "50");
        } else {
            panic!("Expected Config Set command");
        }
    }

    #[test]
    fn test_completions() {
        let cli = Cli::parse_from(["zm", "completions", "zsh"]);
        if let Some(Commands::Completions { shell }) = cli.command {
            assert!(matches!(shell, Shell::Zsh));
        } else {
            panic!("Expected Completions command");
        }
    }

    #[test]
    fn test_join_converts_to_combinator() {
        assert_eq!(Combinator::from(JoinArg::And), Combinator::And);
        assert_eq!(Combinator::from(JoinArg::Or), Combinator::Or);
    }
}
