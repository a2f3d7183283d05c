//! Layered settings: command-line flags, then `STOCKWATCH_*` environment variables,
//! then `$STOCKWATCH_HOME/config.toml`, then built-in defaults.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use stockwatch_core::Locale;
use stockwatch_warehouse::{resolve_stockwatch_home, WarehouseConfig};

use crate::cli::Cli;
use crate::error::CliError;
use crate::logging::LogFormat;

pub const CONFIG_FILE: &str = "config.toml";
pub const LOCALE_VAR: &str = "STOCKWATCH_LOCALE";
pub const LOG_VAR: &str = "STOCKWATCH_LOG";

const DEFAULT_LOG_LEVEL: &str = "warn";

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    pub log: LogSection,
    pub warehouse: WarehouseSection,
    pub messages: MessagesSection,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LogSection {
    pub level: Option<String>,
    pub format: Option<LogFormat>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct WarehouseSection {
    /// Relative paths are resolved against the stockwatch home.
    pub db_path: Option<PathBuf>,
    pub max_pool_size: Option<usize>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MessagesSection {
    pub locale: Option<String>,
}

impl FileConfig {
    pub fn parse(source: &str) -> Result<Self, CliError> {
        toml::from_str(source).map_err(|err| CliError::Config(err.to_string()))
    }

    /// Reads `config.toml` from `home`. A missing file yields the defaults.
    pub fn load(home: &Path) -> Result<Self, CliError> {
        let path = home.join(CONFIG_FILE);
        if !path.is_file() {
            return Ok(Self::default());
        }

        let source = fs::read_to_string(&path)?;
        Self::parse(&source)
            .map_err(|err| CliError::Config(format!("{}: {err}", path.display())))
    }
}

/// Values given on the command line.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub locale: Option<String>,
    pub log_level: Option<String>,
    pub log_format: Option<LogFormat>,
    pub db: Option<PathBuf>,
}

impl From<&Cli> for Overrides {
    fn from(cli: &Cli) -> Self {
        Self {
            locale: cli.locale.clone(),
            log_level: cli.log_level.clone(),
            log_format: cli.log_format,
            db: cli.db.clone(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Settings {
    pub log_level: String,
    pub log_format: LogFormat,
    pub locale: Locale,
    pub warehouse: WarehouseConfig,
}

impl Settings {
    pub fn resolve(cli: &Cli) -> Result<Self, CliError> {
        let home = resolve_stockwatch_home();
        let file = FileConfig::load(&home)?;
        Self::from_sources(
            home,
            file,
            |name| std::env::var(name).ok(),
            &Overrides::from(cli),
        )
    }

    pub fn from_sources(
        home: PathBuf,
        file: FileConfig,
        env: impl Fn(&str) -> Option<String>,
        overrides: &Overrides,
    ) -> Result<Self, CliError> {
        let non_empty = |value: Option<String>| value.filter(|value| !value.trim().is_empty());

        let log_level = overrides
            .log_level
            .clone()
            .or_else(|| non_empty(env(LOG_VAR)))
            .or(file.log.level)
            .unwrap_or_else(|| DEFAULT_LOG_LEVEL.to_owned());
        let log_format = overrides.log_format.or(file.log.format).unwrap_or_default();

        let locale = match overrides
            .locale
            .clone()
            .or_else(|| non_empty(env(LOCALE_VAR)))
            .or(file.messages.locale)
        {
            Some(value) => value.parse()?,
            None => Locale::En,
        };

        let mut warehouse = WarehouseConfig::in_home(&home);
        if let Some(db_path) = overrides.db.clone().or(file.warehouse.db_path) {
            warehouse.db_path = if db_path.is_relative() && overrides.db.is_none() {
                home.join(db_path)
            } else {
                db_path
            };
        }
        if let Some(max_pool_size) = file.warehouse.max_pool_size {
            if max_pool_size == 0 {
                return Err(CliError::Config(String::from(
                    "warehouse.max_pool_size must be at least 1",
                )));
            }
            warehouse.max_pool_size = max_pool_size;
        }

        Ok(Self {
            log_level,
            log_format,
            locale,
            warehouse,
        })
    }
}
