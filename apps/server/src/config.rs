//! # Server Configuration
//!
//! ## Configuration Sources
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Configuration Priority                               │
//! │                                                                         │
//! │  1. Environment Variables (highest priority)                           │
//! │     KULINO_PORT=8080                                                   │
//! │     KULINO_DATABASE_PATH=/var/lib/kulino/kulino.db                     │
//! │                                                                         │
//! │  2. TOML Config File                                                   │
//! │     --config <path>, or                                                │
//! │     ~/.config/kulino-pos/kulino.toml (Linux)                           │
//! │     ~/Library/Application Support/com.kulino.pos/kulino.toml (macOS)   │
//! │                                                                         │
//! │  3. Default Values (lowest priority)                                   │
//! │     127.0.0.1:3000, kulino.db in the platform data dir                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration File Format
//! ```toml
//! # kulino.toml
//! [server]
//! bind_addr = "0.0.0.0"
//! port = 3000
//!
//! [database]
//! path = "/var/lib/kulino/kulino.db"
//! max_connections = 5
//! busy_timeout_secs = 5
//!
//! [store]
//! name = "Kulino Ngemil"
//! address = "Jl. Melati 12, Bandung"
//! footer = "Terima kasih!"
//!
//! [logging]
//! filter = "info,kulino=debug,sqlx=warn"
//! ```

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

use kulino_core::render::StoreInfo;
use kulino_db::DbConfig;

/// Default tracing filter when neither `RUST_LOG` nor `[logging]` set one.
pub const DEFAULT_LOG_FILTER: &str = "info,kulino=debug,sqlx=warn";

// =============================================================================
// Error
// =============================================================================

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid environment variable {name}: {value}")]
    InvalidEnv { name: &'static str, value: String },

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

pub type ConfigResult<T> = Result<T, ConfigError>;

// =============================================================================
// Sections
// =============================================================================

/// `[server]`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerSettings {
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,

    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_bind_addr() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3000
}

impl Default for ServerSettings {
    fn default() -> Self {
        ServerSettings {
            bind_addr: default_bind_addr(),
            port: default_port(),
        }
    }
}

impl ServerSettings {
    /// Returns the full bind address.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.bind_addr, self.port)
    }
}

/// `[database]`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseSettings {
    /// SQLite file. Defaults to `kulino.db` in the platform data dir.
    #[serde(default = "default_database_path")]
    pub path: PathBuf,

    #[serde(default = "default_max_connections")]
    pub max_connections: u32,

    /// How long a writer waits for the SQLite lock before giving up.
    #[serde(default = "default_busy_timeout")]
    pub busy_timeout_secs: u64,
}

fn default_database_path() -> PathBuf {
    directories::ProjectDirs::from("com", "kulino", "pos")
        .map(|dirs| dirs.data_dir().join("kulino.db"))
        .unwrap_or_else(|| PathBuf::from("kulino.db"))
}

fn default_max_connections() -> u32 {
    5
}

fn default_busy_timeout() -> u64 {
    5
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        DatabaseSettings {
            path: default_database_path(),
            max_connections: default_max_connections(),
            busy_timeout_secs: default_busy_timeout(),
        }
    }
}

/// `[logging]`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingSettings {
    #[serde(default = "default_filter")]
    pub filter: String,
}

fn default_filter() -> String {
    DEFAULT_LOG_FILTER.to_string()
}

impl Default for LoggingSettings {
    fn default() -> Self {
        LoggingSettings {
            filter: default_filter(),
        }
    }
}

// =============================================================================
// Server Config
// =============================================================================

/// Complete server configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default)]
    pub server: ServerSettings,

    #[serde(default)]
    pub database: DatabaseSettings,

    /// Store identity printed on receipts and reports.
    #[serde(default)]
    pub store: StoreInfo,

    #[serde(default)]
    pub logging: LoggingSettings,
}

impl ServerConfig {
    /// Loads configuration: defaults, then the TOML file (if it exists),
    /// then `KULINO_*` environment overrides, then validation.
    pub fn load(config_path: Option<PathBuf>) -> ConfigResult<Self> {
        let mut config = Self::default();

        if let Some(path) = config_path.or_else(Self::default_config_path) {
            if path.exists() {
                info!(?path, "Loading config from file");
                let contents = std::fs::read_to_string(&path).map_err(|source| {
                    ConfigError::Read {
                        path: path.clone(),
                        source,
                    }
                })?;
                config = Self::from_toml(&contents)?;
            } else {
                debug!(?path, "Config file not found, using defaults");
            }
        }

        config.apply_env_overrides()?;
        config.validate()?;

        Ok(config)
    }

    /// Parses a TOML document; missing sections keep their defaults.
    pub fn from_toml(contents: &str) -> ConfigResult<Self> {
        Ok(toml::from_str(contents)?)
    }

    /// Validates the configuration.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.server.port == 0 {
            return Err(ConfigError::Invalid("server.port must not be 0".into()));
        }
        if self.database.max_connections == 0 {
            return Err(ConfigError::Invalid(
                "database.max_connections must be greater than 0".into(),
            ));
        }
        if self.database.path.as_os_str().is_empty() {
            return Err(ConfigError::Invalid("database.path is required".into()));
        }
        if self.store.name.trim().is_empty() {
            return Err(ConfigError::Invalid("store.name is required".into()));
        }
        Ok(())
    }

    /// Database settings as a pool configuration.
    pub fn db_config(&self) -> DbConfig {
        DbConfig::new(&self.database.path)
            .max_connections(self.database.max_connections)
            .busy_timeout(Duration::from_secs(self.database.busy_timeout_secs))
    }

    fn apply_env_overrides(&mut self) -> ConfigResult<()> {
        if let Ok(addr) = std::env::var("KULINO_BIND_ADDR") {
            debug!(addr = %addr, "Overriding bind address from environment");
            self.server.bind_addr = addr;
        }

        if let Ok(port) = std::env::var("KULINO_PORT") {
            self.server.port = port.parse().map_err(|_| ConfigError::InvalidEnv {
                name: "KULINO_PORT",
                value: port.clone(),
            })?;
        }

        if let Ok(path) = std::env::var("KULINO_DATABASE_PATH") {
            debug!(path = %path, "Overriding database path from environment");
            self.database.path = PathBuf::from(path);
        }

        if let Ok(max) = std::env::var("KULINO_MAX_CONNECTIONS") {
            self.database.max_connections =
                max.parse().map_err(|_| ConfigError::InvalidEnv {
                    name: "KULINO_MAX_CONNECTIONS",
                    value: max.clone(),
                })?;
        }

        if let Ok(name) = std::env::var("KULINO_STORE_NAME") {
            self.store.name = name;
        }

        if let Ok(filter) = std::env::var("KULINO_LOG") {
            self.logging.filter = filter;
        }

        Ok(())
    }

    fn default_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("com", "kulino", "pos")
            .map(|dirs| dirs.config_dir().join("kulino.toml"))
    }
}
