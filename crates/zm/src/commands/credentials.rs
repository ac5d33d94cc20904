//! Credential resolution.
//!
//! Each of the three values resolves independently with priority:
//! 1. `--subdomain` / `--email` / `--token` flags
//! 2. a `credentials.env` file in the working directory, loaded into the
//!    environment at start-up and replacing `ZENDESK_*` values already set
//! 3. the `ZENDESK_*` environment variables (clap reads them)
//! 4. the `[zendesk]` table of the config file

use std::fmt;
use std::path::Path;

use tracing::{debug, warn};

use super::config::Config;
use super::{CommandError, Result};
use crate::cli::Cli;

/// Dotenv-style file read from the working directory at start-up.
pub const CREDENTIALS_FILE: &str = "credentials.env";

const MISSING_CREDENTIALS: &str = "Missing Zendesk credentials. Set ZENDESK_SUBDOMAIN, \
ZENDESK_EMAIL and ZENDESK_API_TOKEN in the environment, in credentials.env, or under \
[zendesk] in the config file.";

/// The three opaque strings a session is built from.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub subdomain: String,
    pub email: String,
    pub token: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("subdomain", &self.subdomain)
            .field("email", &self.email)
            .field("token", &"[REDACTED]")
            .finish()
    }
}

/// Loads `credentials.env` from `dir` into the process environment.
///
/// Values in the file replace variables already set in the environment.
/// A missing file is not an error; an unreadable or malformed one is logged
/// and skipped.
pub fn load_credentials_file(dir: &Path) {
    let path = dir.join(CREDENTIALS_FILE);
    match dotenvy::from_path_override(&path) {
        Ok(()) => debug!(path = %path.display(), "loaded credentials file"),
        Err(e) if e.not_found() => {}
        Err(e) => warn!(path = %path.display(), error = %e, "ignoring credentials file"),
    }
}

/// Resolves credentials from the CLI (flags and env) and the config file.
///
/// # Errors
///
/// [`CommandError::Config`] naming the three variables when any value is
/// missing or blank.
pub fn resolve_credentials(cli: &Cli, config: &Config) -> Result<Credentials> {
    let pick = |flag: &Option<String>, configured: &Option<String>| {
        flag.iter()
            .chain(configured.iter())
            .map(|v| v.trim())
            .find(|v| !v.is_empty())
            .map(str::to_string)
    };

    let subdomain = pick(&cli.subdomain, &config.zendesk.subdomain);
    let email = pick(&cli.email, &config.zendesk.email);
    let token = pick(&cli.token, &config.zendesk.token);

    match (subdomain, email, token) {
        (Some(subdomain), Some(email), Some(token)) => Ok(Credentials {
            subdomain,
            email,
            token,
        }),
        _ => Err(CommandError::Config(MISSING_CREDENTIALS.to_string())),
    }
}
