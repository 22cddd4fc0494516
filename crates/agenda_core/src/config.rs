//! Store and logging configuration.
//!
//! # Responsibility
//! - Read the store connection string from the environment or a TOML
//!   document; nothing is hard-coded.
//! - Resolve connection strings into a `StoreLocation`.
//!
//! # Invariants
//! - A configuration without a database URL is rejected.
//! - Only SQLite URLs and plain file paths are accepted.

use crate::logging::default_log_level;
use serde::Deserialize;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;
use std::str::FromStr;

pub const DATABASE_URL_ENV: &str = "AGENDA_DATABASE_URL";
pub const LOG_LEVEL_ENV: &str = "AGENDA_LOG_LEVEL";
pub const LOG_DIR_ENV: &str = "AGENDA_LOG_DIR";

pub type ConfigResult<T> = Result<T, ConfigError>;

#[derive(Debug)]
pub enum ConfigError {
    MissingVariable(&'static str),
    InvalidDatabaseUrl(String),
    Toml(toml::de::Error),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingVariable(name) => write!(f, "environment variable `{name}` is not set"),
            Self::InvalidDatabaseUrl(url) => write!(
                f,
                "unsupported database url `{url}`; expected sqlite::memory:, sqlite://<path> or a file path"
            ),
            Self::Toml(err) => write!(f, "invalid configuration document: {err}"),
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Toml(err) => Some(err),
            Self::MissingVariable(_) | Self::InvalidDatabaseUrl(_) => None,
        }
    }
}

impl From<toml::de::Error> for ConfigError {
    fn from(value: toml::de::Error) -> Self {
        Self::Toml(value)
    }
}

/// Where the SQLite store lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreLocation {
    /// Private database that disappears with its connection.
    InMemory,
    File(PathBuf),
}

impl StoreLocation {
    /// Resolves a connection string such as `sqlite://data/agenda.db`.
    pub fn parse(url: &str) -> ConfigResult<Self> {
        let trimmed = url.trim();
        let invalid = || ConfigError::InvalidDatabaseUrl(trimmed.to_string());

        let without_query = trimmed.split('?').next().unwrap_or_default();
        let path = if let Some(rest) = without_query.strip_prefix("sqlite://") {
            rest
        } else if let Some(rest) = without_query.strip_prefix("sqlite:") {
            rest
        } else if without_query.contains("://") {
            return Err(invalid());
        } else {
            without_query
        };

        match path {
            "" => Err(invalid()),
            ":memory:" => Ok(Self::InMemory),
            path => Ok(Self::File(PathBuf::from(path))),
        }
    }
}

impl FromStr for StoreLocation {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::parse(value)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct LoggingConfig {
    pub level: Option<String>,
    /// Absolute directory for rolling log files; stderr when unset.
    pub dir: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AgendaConfig {
    pub database: DatabaseConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl AgendaConfig {
    /// Reads `AGENDA_DATABASE_URL`, `AGENDA_LOG_LEVEL` and `AGENDA_LOG_DIR`.
    pub fn from_env() -> ConfigResult<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Builds a configuration from any variable source. Empty values count
    /// as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> ConfigResult<Self> {
        let read = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());

        let url = read(DATABASE_URL_ENV).ok_or(ConfigError::MissingVariable(DATABASE_URL_ENV))?;
        StoreLocation::parse(&url)?;

        Ok(Self {
            database: DatabaseConfig { url },
            logging: LoggingConfig {
                level: read(LOG_LEVEL_ENV),
                dir: read(LOG_DIR_ENV).map(PathBuf::from),
            },
        })
    }

    /// Parses a TOML document with `[database]` and optional `[logging]` tables.
    pub fn from_toml_str(text: &str) -> ConfigResult<Self> {
        let config: Self = toml::from_str(text)?;
        StoreLocation::parse(&config.database.url)?;
        Ok(config)
    }

    pub fn store_location(&self) -> ConfigResult<StoreLocation> {
        StoreLocation::parse(&self.database.url)
    }

    /// Configured log level, or the build-mode default.
    pub fn log_level(&self) -> &str {
        self.logging.level.as_deref().unwrap_or(default_log_level())
    }
}
