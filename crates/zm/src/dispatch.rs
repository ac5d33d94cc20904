//! Command dispatch module for routing CLI commands to their handlers.
//!
//! Local commands run without credentials; remote commands talk to Zendesk
//! and get resolved credentials plus the loaded config.

use crate::cli::{Cli, Commands, ConfigCommands, Shell};
use crate::commands::config::Config;
use crate::commands::credentials::Credentials;
use crate::commands::harvest::HarvestOptions;
use crate::commands::{self, CommandContext, CommandError, Result};

/// Trait for commands that run without Zendesk credentials.
pub trait LocalCommand {
    fn execute(&self, ctx: &CommandContext) -> Result<()>;
}

/// Trait for commands that need Zendesk credentials.
#[allow(async_fn_in_trait)]
pub trait RemoteCommand {
    async fn execute(
        &self,
        ctx: &CommandContext,
        credentials: &Credentials,
        config: &Config,
    ) -> Result<()>;
}

/// Commands that don't contact Zendesk.
pub enum LocalDispatch<'a> {
    Config(&'a Option<ConfigCommands>),
    Completions(Shell),
    Fields,
    Check { field: &'a str, expression: &'a str },
}

impl<'a> LocalDispatch<'a> {
    /// Returns None if the command needs credentials.
    pub fn try_from_cli(cli: &'a Cli) -> Option<Self> {
        match &cli.command {
            Some(Commands::Config { command }) => Some(Self::Config(command)),
            Some(Commands::Completions { shell }) => Some(Self::Completions(*shell)),
            Some(Commands::Fields) => Some(Self::Fields),
            Some(Commands::Check { field, expression }) => Some(Self::Check {
                field: field.as_str(),
                expression: expression.as_str(),
            }),
            Some(Commands::Harvest { .. }) | None => None,
        }
    }
}

impl LocalCommand for LocalDispatch<'_> {
    fn execute(&self, ctx: &CommandContext) -> Result<()> {
        match self {
            Self::Config(command) => dispatch_config(ctx, command),
            Self::Completions(shell) => {
                commands::completions::execute(*shell).map_err(CommandError::Io)
            }
            Self::Fields => commands::fields::execute(ctx),
            Self::Check { field, expression } => commands::check::execute(ctx, field, expression),
        }
    }
}

/// Dispatch the synchronous config subcommands.
fn dispatch_config(ctx: &CommandContext, command: &Option<ConfigCommands>) -> Result<()> {
    match command {
        Some(ConfigCommands::Show) | None => commands::config::execute_show(ctx),
        Some(ConfigCommands::Set { key, value }) => {
            let opts = commands::config::ConfigSetOptions {
                key: key.clone(),
                value: value.clone(),
            };
            commands::config::execute_set(ctx, &opts)
        }
        Some(ConfigCommands::Path) => commands::config::execute_path(ctx),
        // Spawns $EDITOR; run() awaits it before local dispatch.
        Some(ConfigCommands::Edit) => {
            Err(CommandError::Config("edit requires async context".into()))
        }
    }
}

/// Commands that contact Zendesk.
pub enum RemoteDispatch {
    Harvest(HarvestOptions),
}

impl RemoteDispatch {
    /// Builds the remote dispatch. No subcommand means an interactive harvest.
    pub fn from_cli(cli: &Cli) -> Option<Self> {
        match &cli.command {
            Some(Commands::Harvest {
                filter,
                join,
                yes,
                batch_size,
                page_size,
                output_dir,
                no_env_file,
            }) => Some(Self::Harvest(HarvestOptions {
                filters: filter.clone(),
                join: Some((*join).into()),
                yes: *yes,
                batch_size: batch_size.map(|n| usize::try_from(n).unwrap_or(usize::MAX)),
                page_size: *page_size,
                output_dir: output_dir.clone(),
                no_env_file: *no_env_file,
            })),
            None => Some(Self::Harvest(HarvestOptions::default())),
            _ => None,
        }
    }
}

impl RemoteCommand for RemoteDispatch {
    async fn execute(
        &self,
        ctx: &CommandContext,
        credentials: &Credentials,
        config: &Config,
    ) -> Result<()> {
        match self {
            Self::Harvest(opts) => {
                commands::harvest::execute(ctx, opts, credentials, config).await
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use std::path::PathBuf;
    use zendesk_harvest_rs::Combinator;

    #[test]
    fn test_local_commands() {
        for args in [
            vec!["zm", "fields"],
            vec!["zm", "check", "status", "open"],
            vec!["zm", "config", "path"],
            vec!["zm", "completions", "zsh"],
        ] {
            let cli = Cli::parse_from(args.iter().copied());
            assert!(LocalDispatch::try_from_cli(&cli).is_some(), "{args:?}");
            assert!(RemoteDispatch::from_cli(&cli).is_none(), "{args:?}");
        }
    }

    #[test]
    fn test_bare_invocation_is_interactive_harvest() {
        let cli = Cli::parse_from(["zm"]);
        assert!(LocalDispatch::try_from_cli(&cli).is_none());
        let Some(RemoteDispatch::Harvest(opts)) = RemoteDispatch::from_cli(&cli) else {
            panic!("Expected Harvest dispatch");
        };
        assert!(opts.filters.is_empty());
        assert!(!opts.yes);
        assert_eq!(opts.join, None);
    }

    #[test]
    fn test_harvest_options_from_flags() {
        let cli = Cli::parse_from([
            "zm",
            "harvest",
            "-f",
            "status=open",
            "-j",
            "or",
            "-y",
            "-b",
            "25",
            "-o",
            "exports",
        ]);
        let Some(RemoteDispatch::Harvest(opts)) = RemoteDispatch::from_cli(&cli) else {
            panic!("Expected Harvest dispatch");
        };
        assert_eq!(opts.filters, vec!["status=open"]);
        assert_eq!(opts.join, Some(Combinator::Or));
        assert!(opts.yes);
        assert_eq!(opts.batch_size, Some(25));
        assert_eq!(opts.output_dir, Some(PathBuf::from("exports")));
    }
}
