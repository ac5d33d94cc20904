//! Config command implementation.
//!
//! View and manage configuration settings.
//! Config file is located at ~/.config/zm/config.toml.

use std::env;
use std::fs;
use std::path::PathBuf;

use tokio::process::Command;

use directories::BaseDirs;
use owo_colors::OwoColorize;
use serde::{Deserialize, Serialize};
use zendesk_harvest_rs::{CustomFieldKind, CustomFieldSpec};

use super::{CommandContext, CommandError, Result};

/// Current config file version. Increment when making breaking changes to schema.
const CONFIG_VERSION: u32 = 1;

/// Environment variable overriding the config file location.
pub const CONFIG_ENV: &str = "ZM_CONFIG";

const TOKEN_MASK_MIN_LENGTH: usize = 8;
const TOKEN_MASK_VISIBLE_CHARS: usize = 4;

/// Default config file contents.
const DEFAULT_CONFIG: &str = r#"# zm - Zendesk ticket harvester configuration

# Config schema version (do not modify)
version = 1

# Credentials (ZENDESK_SUBDOMAIN / ZENDESK_EMAIL / ZENDESK_API_TOKEN
# or a credentials.env file take precedence)
[zendesk]
# subdomain = "acme"
# email = "agent@acme.com"
# token = "your-api-token-here"

[harvest]
# batch_size = 100
# page_size = 100
# output_dir = "."
# request_timeout_secs = 30
# max_attempts = 6

# Custom fields, filterable by name. kind: dropdown, contains, ipv4, hash, datetime
# [[custom_fields]]
# name = "analyst"
# id = 900003000000
# kind = "dropdown"
"#;

/// Configuration file structure.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct Config {
    /// Config schema version for migrations.
    #[serde(default = "default_version")]
    pub version: u32,

    #[serde(default)]
    pub zendesk: ZendeskConfig,

    #[serde(default)]
    pub harvest: HarvestConfig,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub custom_fields: Vec<CustomFieldConfig>,
}

/// Returns the current config version (used by serde default).
fn default_version() -> u32 {
    CONFIG_VERSION
}

/// Credential settings.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct ZendeskConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subdomain: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
}

/// Harvest settings. Unset values fall back to built-in defaults.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct HarvestConfig {
    /// Records per flushed batch.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub batch_size: Option<usize>,

    /// Records requested per page.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_size: Option<u32>,

    /// Directory batch files are written to.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_dir: Option<PathBuf>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_timeout_secs: Option<u64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_attempts: Option<u32>,
}

/// A `[[custom_fields]]` entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomFieldConfig {
    pub name: String,
    pub id: u64,
    pub kind: CustomFieldKind,
}

impl Config {
    /// Custom fields in the form the filter catalogue takes.
    pub fn custom_field_specs(&self) -> Vec<CustomFieldSpec> {
        self.custom_fields
            .iter()
            .map(|field| CustomFieldSpec {
                name: field.name.clone(),
                id: field.id,
                kind: field.kind,
            })
            .collect()
    }
}

/// Gets the config file path.
///
/// `$ZM_CONFIG`, else `$XDG_CONFIG_HOME/zm/config.toml`, else
/// `~/.config/zm/config.toml` on all platforms.
pub fn get_config_path() -> Result<PathBuf> {
    if let Ok(path) = env::var(CONFIG_ENV) {
        return Ok(PathBuf::from(path));
    }

    if let Ok(xdg_config) = env::var("XDG_CONFIG_HOME") {
        return Ok(PathBuf::from(xdg_config).join("zm").join("config.toml"));
    }

    BaseDirs::new()
        .map(|dirs| dirs.home_dir().join(".config").join("zm").join("config.toml"))
        .ok_or_else(|| CommandError::Config("Could not determine config directory".to_string()))
}

/// Loads the configuration from disk. A missing file yields defaults.
pub fn load_config() -> Result<Config> {
    let path = get_config_path()?;

    if !path.exists() {
        return Ok(Config {
            version: CONFIG_VERSION,
            ..Config::default()
        });
    }

    let content = fs::read_to_string(&path)
        .map_err(|e| CommandError::Config(format!("Failed to read config: {}", e)))?;

    let config: Config = toml::from_str(&content)
        .map_err(|e| CommandError::Config(format!("Failed to parse config: {}", e)))?;

    migrate_config(config)
}

/// Migrates config to current version if needed.
fn migrate_config(mut config: Config) -> Result<Config> {
    if config.version > CONFIG_VERSION {
        tracing::warn!(
            version = config.version,
            supported = CONFIG_VERSION,
            "config file is newer than this zm; unknown settings are ignored"
        );
    }
    config.version = CONFIG_VERSION;
    Ok(config)
}

/// Saves the configuration to disk.
fn save_config(config: &Config) -> Result<()> {
    let path = get_config_path()?;

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| {
            CommandError::Config(format!("Failed to create config directory: {}", e))
        })?;
    }

    let content = toml::to_string_pretty(config)
        .map_err(|e| CommandError::Config(format!("Failed to serialize config: {}", e)))?;

    fs::write(&path, content)
        .map_err(|e| CommandError::Config(format!("Failed to write config: {}", e)))?;

    Ok(())
}

/// Executes the config show command.
pub fn execute_show(ctx: &CommandContext) -> Result<()> {
    let config = load_config()?;
    let path = get_config_path()?;

    if ctx.quiet {
        return Ok(());
    }

    let header = "Configuration";
    if ctx.use_colors {
        println!("{}\n", header.green().bold());
    } else {
        println!("{}\n", header);
    }

    println!("File: {}", path.display());
    println!("Exists: {}\n", path.exists());

    if !path.exists() {
        println!("(No config file exists. Run 'zm config edit' to create one.)");
        return Ok(());
    }

    println!("[zendesk]");
    if let Some(ref subdomain) = config.zendesk.subdomain {
        println!("  subdomain: {}", subdomain);
    }
    if let Some(ref email) = config.zendesk.email {
        println!("  email: {}", email);
    }
    if let Some(ref token) = config.zendesk.token {
        println!("  token: {}", mask_token(token));
    }

    println!("\n[harvest]");
    let h = &config.harvest;
    if let Some(v) = h.batch_size {
        println!("  batch_size: {}", v);
    }
    if let Some(v) = h.page_size {
        println!("  page_size: {}", v);
    }
    if let Some(ref v) = h.output_dir {
        println!("  output_dir: {}", v.display());
    }
    if let Some(v) = h.request_timeout_secs {
        println!("  request_timeout_secs: {}", v);
    }
    if let Some(v) = h.max_attempts {
        println!("  max_attempts: {}", v);
    }

    if !config.custom_fields.is_empty() {
        println!("\n[[custom_fields]]");
        for field in &config.custom_fields {
            println!("  {} (id {}, {:?})", field.name, field.id, field.kind);
        }
    }

    Ok(())
}

/// Executes the config edit command.
pub async fn execute_edit(ctx: &CommandContext) -> Result<()> {
    let path = get_config_path()?;

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| {
            CommandError::Config(format!("Failed to create config directory: {}", e))
        })?;
    }

    if !path.exists() {
        fs::write(&path, DEFAULT_CONFIG)
            .map_err(|e| CommandError::Config(format!("Failed to create config file: {}", e)))?;

        if !ctx.quiet {
            eprintln!("Created default config at: {}", path.display());
        }
    }

    let editor = env::var("EDITOR")
        .or_else(|_| env::var("VISUAL"))
        .unwrap_or_else(|_| "vi".to_string());

    if ctx.verbose {
        eprintln!("Opening {} with {}", path.display(), editor);
    }

    let status = Command::new(&editor)
        .arg(&path)
        .status()
        .await
        .map_err(|e| CommandError::Config(format!("Failed to open editor '{}': {}", editor, e)))?;

    if !ctx.quiet {
        if status.success() {
            println!("Config saved.");
        } else {
            eprintln!("Editor exited with error");
        }
    }

    Ok(())
}

/// Options for the config set command.
pub struct ConfigSetOptions {
    /// Configuration key, `section.field`.
    pub key: String,
    /// Configuration value.
    pub value: String,
}

/// Valid keys for `zm config set`.
const SETTABLE_KEYS: &str = "zendesk.subdomain, zendesk.email, zendesk.token, \
harvest.batch_size, harvest.page_size, harvest.output_dir, \
harvest.request_timeout_secs, harvest.max_attempts";

/// Applies one `key = value` assignment to a config.
fn apply_setting(config: &mut Config, key: &str, value: &str) -> Result<()> {
    match key.split_once('.') {
        Some(("zendesk", "subdomain")) => config.zendesk.subdomain = Some(value.to_string()),
        Some(("zendesk", "email")) => config.zendesk.email = Some(value.to_string()),
        Some(("zendesk", "token")) => config.zendesk.token = Some(value.to_string()),
        Some(("harvest", "batch_size")) => {
            config.harvest.batch_size = Some(parse_positive(key, value)?);
        }
        Some(("harvest", "page_size")) => {
            let size = parse_positive(key, value)?;
            if size > 100 {
                return Err(CommandError::Config(format!(
                    "Invalid {} value '{}'. Zendesk allows at most 100 per page",
                    key, value
                )));
            }
            config.harvest.page_size = Some(size as u32);
        }
        Some(("harvest", "output_dir")) => config.harvest.output_dir = Some(PathBuf::from(value)),
        Some(("harvest", "request_timeout_secs")) => {
            config.harvest.request_timeout_secs = Some(parse_positive(key, value)? as u64);
        }
        Some(("harvest", "max_attempts")) => {
            config.harvest.max_attempts = Some(parse_positive(key, value)? as u32);
        }
        _ => {
            return Err(CommandError::Config(format!(
                "Unknown config key '{}'. Valid keys: {}",
                key, SETTABLE_KEYS
            )));
        }
    }
    Ok(())
}

/// Executes the config set command.
pub fn execute_set(ctx: &CommandContext, opts: &ConfigSetOptions) -> Result<()> {
    let mut config = load_config()?;
    apply_setting(&mut config, &opts.key, &opts.value)?;
    save_config(&config)?;

    if !ctx.quiet {
        let shown = if opts.key == "zendesk.token" {
            mask_token(&opts.value)
        } else {
            opts.value.clone()
        };
        println!("Set {} = {}", opts.key, shown);
    }

    Ok(())
}

/// Executes the config path command.
pub fn execute_path(_ctx: &CommandContext) -> Result<()> {
    let path = get_config_path()?;
    println!("{}", path.display());
    Ok(())
}

/// Masks a token for display, showing only the first and last N characters.
///
/// Uses character-based (not byte-based) indexing to safely handle
/// multi-byte UTF-8 characters.
pub(crate) fn mask_token(token: &str) -> String {
    let char_count = token.chars().count();
    if char_count > TOKEN_MASK_MIN_LENGTH {
        let prefix: String = token.chars().take(TOKEN_MASK_VISIBLE_CHARS).collect();
        let suffix: String = token
            .chars()
            .skip(char_count - TOKEN_MASK_VISIBLE_CHARS)
            .collect();
        format!("{}...{}", prefix, suffix)
    } else {
        "****".to_string()
    }
}

/// Parses a strictly positive integer setting.
fn parse_positive(key: &str, value: &str) -> Result<usize> {
    match value.trim().parse::<usize>() {
        Ok(n) if n > 0 => Ok(n),
        _ => Err(CommandError::Config(format!(
            "Invalid {} value '{}'. Use a positive whole number",
            key, value
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use tempfile::TempDir;

    /// Points ZM_CONFIG at a temp file for the duration of a test.
    struct ConfigEnv {
        _dir: TempDir,
        path: PathBuf,
        original: Option<String>,
    }

    impl ConfigEnv {
        fn new() -> Self {
            let dir = TempDir::new().unwrap();
            let path = dir.path().join("zm").join("config.toml");
            let original = env::var(CONFIG_ENV).ok();
            env::set_var(CONFIG_ENV, &path);
            Self {
                _dir: dir,
                path,
                original,
            }
        }
    }

    impl Drop for ConfigEnv {
        fn drop(&mut self) {
            match &self.original {
                Some(val) => env::set_var(CONFIG_ENV, val),
                None => env::remove_var(CONFIG_ENV),
            }
        }
    }

    fn quiet_ctx() -> CommandContext {
        CommandContext {
            use_colors: false,
            quiet: true,
            verbose: false,
        }
    }

    #[test]
    fn test_config_deserialization() {
        let toml_str = r#"
version = 1

[zendesk]
subdomain = "acme"
email = "agent@acme.com"

[harvest]
batch_size = 50
output_dir = "exports"

[[custom_fields]]
name = "analyst"
id = 900003000000
kind = "dropdown"

[[custom_fields]]
name = "initial-response"
id = 900012000000
kind = "datetime"
"#;
        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.zendesk.subdomain.as_deref(), Some("acme"));
        assert!(config.zendesk.token.is_none());
        assert_eq!(config.harvest.batch_size, Some(50));
        assert_eq!(config.harvest.output_dir, Some(PathBuf::from("exports")));
        assert!(config.harvest.page_size.is_none());

        let specs = config.custom_field_specs();
        assert_eq!(specs.len(), 2);
        assert_eq!(specs[0].kind, CustomFieldKind::Dropdown);
        assert_eq!(specs[1].id, 900012000000);
        assert_eq!(specs[1].kind, CustomFieldKind::Datetime);
    }

    #[test]
    fn test_config_deserialization_empty() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.version, CONFIG_VERSION);
        assert!(config.zendesk.subdomain.is_none());
        assert!(config.custom_fields.is_empty());
    }

    #[test]
    fn test_unknown_custom_field_kind_is_rejected() {
        let toml_str = r#"
[[custom_fields]]
name = "x"
id = 1
kind = "checkbox"
"#;
        assert!(toml::from_str::<Config>(toml_str).is_err());
    }

    #[test]
    fn test_default_config_template_parses() {
        let config: Config = toml::from_str(DEFAULT_CONFIG).unwrap();
        assert_eq!(config.version, 1);
        assert!(config.harvest.batch_size.is_none());
    }

    #[test]
    fn test_config_serialization_skips_unset() {
        let mut config = Config::default();
        config.version = CONFIG_VERSION;
        config.harvest.batch_size = Some(50);
        let toml_str = toml::to_string_pretty(&config).unwrap();
        assert!(toml_str.contains("version = 1"));
        assert!(toml_str.contains("batch_size = 50"));
        assert!(!toml_str.contains("token"));
        assert!(!toml_str.contains("custom_fields"));
    }

    #[test]
    fn test_apply_setting() {
        let mut config = Config::default();
        apply_setting(&mut config, "zendesk.subdomain", "acme").unwrap();
        apply_setting(&mut config, "harvest.batch_size", "50").unwrap();
        apply_setting(&mut config, "harvest.page_size", "100").unwrap();
        assert_eq!(config.zendesk.subdomain.as_deref(), Some("acme"));
        assert_eq!(config.harvest.batch_size, Some(50));
        assert_eq!(config.harvest.page_size, Some(100));

        assert!(apply_setting(&mut config, "harvest.batch_size", "0").is_err());
        assert!(apply_setting(&mut config, "harvest.page_size", "500").is_err());
        assert!(apply_setting(&mut config, "harvest.max_attempts", "many").is_err());
        let err = apply_setting(&mut config, "token", "x").unwrap_err();
        assert!(err.to_string().contains("Unknown config key 'token'"));
    }

    #[test]
    fn test_mask_token() {
        assert_eq!(mask_token("abcdefghijklmnop"), "abcd...mnop");
        assert_eq!(mask_token("123456789"), "1234...6789");
        assert_eq!(mask_token("12345678"), "****");
        assert_eq!(mask_token("密码钥匙令牌凭证安全"), "密码钥匙...凭证安全");
    }

    #[test]
    fn test_migrate_config_normalizes_version() {
        let config = Config {
            version: 999,
            ..Config::default()
        };
        assert_eq!(migrate_config(config).unwrap().version, CONFIG_VERSION);
    }

    #[test]
    #[serial]
    fn test_config_path_from_env() {
        let env = ConfigEnv::new();
        assert_eq!(get_config_path().unwrap(), env.path);
    }

    #[test]
    #[serial]
    fn test_load_missing_config_yields_defaults() {
        let _env = ConfigEnv::new();
        let config = load_config().unwrap();
        assert_eq!(config.version, CONFIG_VERSION);
        assert!(config.zendesk.subdomain.is_none());
    }

    #[test]
    #[serial]
    fn test_set_then_load_round_trip() {
        let env = ConfigEnv::new();
        let ctx = quiet_ctx();
        execute_set(
            &ctx,
            &ConfigSetOptions {
                key: "zendesk.email".to_string(),
                value: "agent@acme.com".to_string(),
            },
        )
        .unwrap();
        execute_set(
            &ctx,
            &ConfigSetOptions {
                key: "harvest.output_dir".to_string(),
                value: "/tmp/exports".to_string(),
            },
        )
        .unwrap();

        assert!(env.path.exists());
        let config = load_config().unwrap();
        assert_eq!(config.zendesk.email.as_deref(), Some("agent@acme.com"));
        assert_eq!(config.harvest.output_dir, Some(PathBuf::from("/tmp/exports")));
    }

    #[test]
    #[serial]
    fn test_malformed_config_is_a_config_error() {
        let env = ConfigEnv::new();
        fs::create_dir_all(env.path.parent().unwrap()).unwrap();
        fs::write(&env.path, "version = \"one\"").unwrap();
        assert!(matches!(load_config(), Err(CommandError::Config(_))));
    }
}
