//! Configuration loading
//!
//! Bootstrap settings come from a TOML file (port, bind address, database
//! path, logging, sign-in assertion age, optional subject list). Command-line
//! values override the file; anything unset falls back to compiled defaults.
//!
//! # Config file resolution
//!
//! 1. `--config` command-line argument
//! 2. `RUC_CONFIG` environment variable
//! 3. `~/.config/ruclasses/config.toml`
//! 4. `/etc/ruclasses/config.toml`
//! 5. None (compiled defaults)

use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::identity::DEFAULT_SESSION_IDLE_SECS;
use crate::reference::{Catalog, Subject};
use crate::{Error, Result};

/// Environment variable naming the config file
pub const CONFIG_ENV_VAR: &str = "RUC_CONFIG";

pub const DEFAULT_PORT: u16 = 5780;
pub const DEFAULT_BIND_ADDRESS: &str = "127.0.0.1";
pub const DEFAULT_MAX_ASSERTION_AGE_MS: i64 = 60_000;

/// Contents of the TOML bootstrap file; every key is optional
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct TomlConfig {
    pub port: Option<u16>,
    pub bind_address: Option<String>,
    /// Path to SQLite database file
    pub database_path: Option<PathBuf>,
    pub logging: LoggingConfig,
    pub auth: AuthConfig,
    /// Replaces the compiled subject list when non-empty
    pub subjects: Vec<Subject>,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error); `RUST_LOG` wins
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    /// Oldest sign-in assertion accepted, in milliseconds
    pub max_assertion_age_ms: i64,
    /// Seconds a session may go unused before it ends
    pub session_idle_secs: u32,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            max_assertion_age_ms: DEFAULT_MAX_ASSERTION_AGE_MS,
            session_idle_secs: DEFAULT_SESSION_IDLE_SECS,
        }
    }
}

/// Values given on the command line, each overriding the file
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub config: Option<PathBuf>,
    pub port: Option<u16>,
    pub database: Option<PathBuf>,
}

/// Resolved, immutable service configuration
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub port: u16,
    pub bind_address: String,
    pub database_path: PathBuf,
    pub log_level: String,
    pub max_assertion_age_ms: i64,
    pub session_idle_secs: u32,
    pub catalog: Catalog,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self::from_parts(TomlConfig::default(), &CliOverrides::default())
    }
}

impl AppConfig {
    /// Resolve the config file, read it, and apply command-line overrides
    ///
    /// A missing or unreadable file is logged and replaced by defaults.
    pub fn load(cli: &CliOverrides) -> Self {
        let toml_config = match resolve_config_path(cli.config.as_deref()) {
            Some(path) => match load_toml_config(&path) {
                Ok(config) => {
                    info!("Loaded configuration from {}", path.display());
                    config
                }
                Err(e) => {
                    warn!("{}; using defaults", e);
                    TomlConfig::default()
                }
            },
            None => {
                info!("No config file found, using defaults");
                TomlConfig::default()
            }
        };

        Self::from_parts(toml_config, cli)
    }

    pub fn session_idle_timeout(&self) -> chrono::Duration {
        chrono::Duration::seconds(i64::from(self.session_idle_secs))
    }

    /// Merge file values with command-line overrides and defaults
    pub fn from_parts(file: TomlConfig, cli: &CliOverrides) -> Self {
        let catalog = if file.subjects.is_empty() {
            Catalog::default()
        } else {
            Catalog::new(file.subjects)
        };

        Self {
            port: cli.port.or(file.port).unwrap_or(DEFAULT_PORT),
            bind_address: file
                .bind_address
                .unwrap_or_else(|| DEFAULT_BIND_ADDRESS.to_string()),
            database_path: cli
                .database
                .clone()
                .or(file.database_path)
                .unwrap_or_else(default_database_path),
            log_level: file.logging.level,
            max_assertion_age_ms: file.auth.max_assertion_age_ms,
            session_idle_secs: file.auth.session_idle_secs,
            catalog,
        }
    }
}

/// Read and parse one TOML config file
pub fn load_toml_config(path: &Path) -> Result<TomlConfig> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| Error::Config(format!("Failed to read {}: {}", path.display(), e)))?;

    toml::from_str(&content)
        .map_err(|e| Error::Config(format!("Failed to parse {}: {}", path.display(), e)))
}

/// Pick the config file to read, if any
pub fn resolve_config_path(cli_arg: Option<&Path>) -> Option<PathBuf> {
    // Explicit choices are returned even if missing so the read error is reported
    if let Some(path) = cli_arg {
        return Some(path.to_path_buf());
    }

    if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
        if !path.is_empty() {
            return Some(PathBuf::from(path));
        }
    }

    let user_config = dirs::config_dir().map(|d| d.join("ruclasses").join("config.toml"));
    if let Some(path) = user_config {
        if path.exists() {
            return Some(path);
        }
    }

    let system_config = PathBuf::from("/etc/ruclasses/config.toml");
    if system_config.exists() {
        return Some(system_config);
    }

    None
}

/// OS-dependent default database location
pub fn default_database_path() -> PathBuf {
    dirs::data_local_dir()
        .map(|d| d.join("ruclasses"))
        .unwrap_or_else(|| PathBuf::from("./ruclasses_data"))
        .join("ruclasses.db")
}
