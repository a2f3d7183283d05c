//! DuckDB-backed persistence for stockwatch.
//!
//! [`Warehouse`] implements [`stockwatch_core::Dao`] for statistics, price alerts and
//! horizontal lines. Updates read the stored row and write the new one inside one
//! transaction, refusing the write when no field changed.

mod horizontal_line_dao;
pub mod migrations;
pub mod pool;
mod price_alert_dao;
mod statistic_dao;

use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use ::duckdb::Connection;
use rust_decimal::Decimal;
use stockwatch_core::PersistenceError;
use thiserror::Error;
use time::macros::format_description;
use time::Date;
use tracing::warn;

pub use pool::{ConnectionPool, PooledConnection};

#[derive(Debug, Error)]
pub enum WarehouseError {
    #[error(transparent)]
    DuckDb(#[from] ::duckdb::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("connection pool lock was poisoned")]
    PoolPoisoned,

    #[error("corrupt {table} row: {detail}")]
    CorruptRow { table: &'static str, detail: String },
}

impl From<WarehouseError> for PersistenceError {
    fn from(error: WarehouseError) -> Self {
        PersistenceError::storage(error)
    }
}

#[derive(Debug, Clone)]
pub struct WarehouseConfig {
    pub stockwatch_home: PathBuf,
    pub db_path: PathBuf,
    pub max_pool_size: usize,
}

impl Default for WarehouseConfig {
    fn default() -> Self {
        Self::in_home(resolve_stockwatch_home())
    }
}

impl WarehouseConfig {
    pub fn in_home(stockwatch_home: impl Into<PathBuf>) -> Self {
        let stockwatch_home = stockwatch_home.into();
        let db_path = stockwatch_home.join("data").join("stockwatch.duckdb");
        Self {
            stockwatch_home,
            db_path,
            max_pool_size: 4,
        }
    }
}

#[derive(Clone)]
pub struct Warehouse {
    config: WarehouseConfig,
    pool: ConnectionPool,
}

impl Warehouse {
    pub fn open_default() -> Result<Self, WarehouseError> {
        Self::open(WarehouseConfig::default())
    }

    pub fn open(config: WarehouseConfig) -> Result<Self, WarehouseError> {
        if let Some(parent) = config.db_path.parent() {
            fs::create_dir_all(parent)?;
        }

        let pool = ConnectionPool::open(config.db_path.clone(), config.max_pool_size)?;
        let warehouse = Self { config, pool };
        warehouse.initialize()?;
        Ok(warehouse)
    }

    /// Opens a throwaway database that lives as long as the returned value.
    pub fn open_in_memory() -> Result<Self, WarehouseError> {
        let config = WarehouseConfig::in_home(resolve_stockwatch_home());
        let pool = ConnectionPool::open_in_memory(config.max_pool_size)?;
        let warehouse = Self { config, pool };
        warehouse.initialize()?;
        Ok(warehouse)
    }

    pub fn initialize(&self) -> Result<(), WarehouseError> {
        let connection = self.pool.acquire()?;
        migrations::apply_migrations(&connection)?;
        Ok(())
    }

    pub fn config(&self) -> &WarehouseConfig {
        &self.config
    }

    pub fn db_path(&self) -> Option<&Path> {
        self.pool.db_path()
    }

    pub fn migration_versions(&self) -> Result<Vec<String>, WarehouseError> {
        let connection = self.pool.acquire()?;
        Ok(migrations::applied_versions(&connection)?)
    }

    fn connection(&self) -> Result<PooledConnection, WarehouseError> {
        self.pool.acquire()
    }

    /// Runs `work` inside one transaction, committing only when it succeeds.
    fn in_transaction<T>(
        &self,
        work: impl FnOnce(&Connection) -> Result<T, PersistenceError>,
    ) -> Result<T, PersistenceError> {
        let mut connection = self.connection()?;
        connection.execute_batch("BEGIN TRANSACTION").map_err(storage)?;
        let result = work(&connection);
        finalize_transaction(&mut connection, result)
    }
}

/// Commits on success and rolls back on failure. A connection whose transaction could
/// not be closed is discarded instead of going back to the pool.
fn finalize_transaction<T>(
    connection: &mut PooledConnection,
    result: Result<T, PersistenceError>,
) -> Result<T, PersistenceError> {
    let result = result.and_then(|value| {
        connection.execute_batch("COMMIT").map_err(storage)?;
        Ok(value)
    });

    if result.is_err() {
        if let Err(error) = connection.execute_batch("ROLLBACK") {
            warn!(%error, "rollback failed, discarding connection");
            connection.discard();
        }
    }
    result
}

fn storage(error: ::duckdb::Error) -> PersistenceError {
    WarehouseError::from(error).into()
}

/// `$STOCKWATCH_HOME`, falling back to `$HOME/.stockwatch`.
pub fn resolve_stockwatch_home() -> PathBuf {
    if let Some(path) = env::var_os("STOCKWATCH_HOME") {
        let path = PathBuf::from(path);
        if !path.as_os_str().is_empty() {
            return path;
        }
    }

    if let Some(home) = env::var_os("HOME") {
        return PathBuf::from(home).join(".stockwatch");
    }

    PathBuf::from(".stockwatch")
}

fn parse_code<T: FromStr>(table: &'static str, value: &str) -> Result<T, WarehouseError>
where
    T::Err: std::fmt::Display,
{
    value.parse().map_err(|err: T::Err| WarehouseError::CorruptRow {
        table,
        detail: err.to_string(),
    })
}

fn parse_optional_code<T: FromStr>(
    table: &'static str,
    value: Option<&str>,
) -> Result<Option<T>, WarehouseError>
where
    T::Err: std::fmt::Display,
{
    value.map(|value| parse_code(table, value)).transpose()
}

fn parse_price(table: &'static str, value: &str) -> Result<Decimal, WarehouseError> {
    Decimal::from_str(value).map_err(|err| WarehouseError::CorruptRow {
        table,
        detail: format!("price '{value}': {err}"),
    })
}

fn parse_date(table: &'static str, value: &str) -> Result<Date, WarehouseError> {
    Date::parse(value, format_description!("[year]-[month]-[day]")).map_err(|err| {
        WarehouseError::CorruptRow {
            table,
            detail: format!("date '{value}': {err}"),
        }
    })
}
