//! Harvest command implementation.
//!
//! Builds the proposition (from `--filter` entries or the interactive
//! menu), then walks every role and writes filtered batches to disk.

use std::path::PathBuf;
use std::time::Duration;

use chrono::Utc;
use owo_colors::OwoColorize;
use tracing::{debug, info};
use zendesk_api_rs::client::ZendeskClient;
use zendesk_harvest_rs::{
    Combinator, FieldCatalog, HarvestSummary, Harvester, MergeMode, Proposition,
    DEFAULT_BATCH_SIZE,
};

use super::config::{Config, HarvestConfig};
use super::credentials::Credentials;
use super::menu::{run_menu, MenuOutcome, TerminalPrompt};
use super::{CommandContext, Result};
use crate::output::helpers::file_stamp;
use crate::output::BatchFileWriter;

/// Options for the harvest command, as given on the command line.
#[derive(Debug, Default)]
pub struct HarvestOptions {
    /// `field=expression` entries.
    pub filters: Vec<String>,
    /// How entries after the first combine.
    pub join: Option<Combinator>,
    /// Skip the interactive menu.
    pub yes: bool,
    pub batch_size: Option<usize>,
    pub page_size: Option<u32>,
    pub output_dir: Option<PathBuf>,
    pub no_env_file: bool,
}

/// Settings after applying config defaults to the options.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HarvestSettings {
    pub batch_size: usize,
    pub output_dir: PathBuf,
    pub write_env: bool,
}

impl HarvestSettings {
    /// Flag beats config beats built-in default.
    pub fn resolve(opts: &HarvestOptions, config: &HarvestConfig) -> Self {
        Self {
            batch_size: opts
                .batch_size
                .or(config.batch_size)
                .unwrap_or(DEFAULT_BATCH_SIZE),
            output_dir: opts
                .output_dir
                .clone()
                .or_else(|| config.output_dir.clone())
                .unwrap_or_else(|| PathBuf::from(".")),
            write_env: !opts.no_env_file,
        }
    }
}

/// Compiles `field=expression` entries into a proposition.
///
/// The first entry anchors; each later one is added with `join`.
///
/// # Errors
///
/// The first entry that fails to compile.
pub fn build_proposition(
    catalog: &FieldCatalog,
    filters: &[String],
    join: Combinator,
) -> Result<Proposition> {
    let mut proposition = Proposition::new();
    for entry in filters {
        let atom = catalog.compile_assignment(entry)?;
        proposition.merge(atom, MergeMode::Add(join));
    }
    Ok(proposition)
}

/// Builds the API client from credentials, flags and config.
pub fn build_client(
    credentials: &Credentials,
    opts: &HarvestOptions,
    config: &HarvestConfig,
) -> Result<ZendeskClient> {
    let mut builder = ZendeskClient::builder(
        credentials.subdomain.as_str(),
        credentials.email.as_str(),
        credentials.token.as_str(),
    );
    if let Some(page_size) = opts.page_size.or(config.page_size) {
        builder = builder.page_size(page_size);
    }
    if let Some(secs) = config.request_timeout_secs {
        builder = builder.request_timeout(Duration::from_secs(secs));
    }
    if let Some(max_attempts) = config.max_attempts {
        builder = builder.max_attempts(max_attempts);
    }
    Ok(builder.build()?)
}

/// Runs a harvest with a ready client and proposition.
pub async fn run_harvest(
    ctx: &CommandContext,
    client: &ZendeskClient,
    proposition: Proposition,
    settings: &HarvestSettings,
) -> Result<HarvestSummary> {
    let mut writer = BatchFileWriter::new(&settings.output_dir, file_stamp(Utc::now()))?
        .with_env_file(settings.write_env)
        .with_reporting(ctx.quiet, ctx.use_colors);

    info!(
        proposition = %proposition,
        batch_size = settings.batch_size,
        output_dir = %settings.output_dir.display(),
        "starting harvest"
    );
    let mut harvester = Harvester::new(client, proposition, settings.batch_size);
    let summary = harvester.run(&mut writer).await?;
    debug!(files = writer.written_files().len(), "harvest finished");
    Ok(summary)
}

/// Executes the harvest command.
pub async fn execute(
    ctx: &CommandContext,
    opts: &HarvestOptions,
    credentials: &Credentials,
    config: &Config,
) -> Result<()> {
    let catalog = FieldCatalog::with_custom_fields(&config.custom_field_specs());
    let mut proposition = build_proposition(
        &catalog,
        &opts.filters,
        opts.join.unwrap_or(Combinator::And),
    )?;

    if opts.filters.is_empty() && !opts.yes {
        match TerminalPrompt::detect() {
            Some(mut prompt) => {
                if run_menu(&mut prompt, &catalog, &mut proposition, ctx.use_colors)?
                    == MenuOutcome::Exit
                {
                    if !ctx.quiet {
                        println!("Exiting.");
                    }
                    return Ok(());
                }
            }
            None => info!("stdin is not a terminal, harvesting without filters"),
        }
    }

    let client = build_client(credentials, opts, &config.harvest)?;
    let settings = HarvestSettings::resolve(opts, &config.harvest);
    let summary = run_harvest(ctx, &client, proposition, &settings).await?;

    if ctx.verbose {
        for role in &summary.roles {
            eprintln!(
                "{}: {} records over {} pages",
                role.role, role.records, role.pages
            );
        }
    }
    if !ctx.quiet {
        let total = summary.total_written.to_string();
        let total = if ctx.use_colors {
            total.green().to_string()
        } else {
            total
        };
        println!("Total tickets written across batches: {}", total);
    }
    Ok(())
}
