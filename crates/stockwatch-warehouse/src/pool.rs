//! DuckDB connection pool.
//!
//! Every pooled connection is cloned from one root connection, so all of them share
//! a single database instance and see each other's committed writes.

use std::ops::Deref;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use ::duckdb::Connection;

use crate::WarehouseError;

struct PoolInner {
    db_path: Option<PathBuf>,
    max_pool_size: usize,
    root: Mutex<Connection>,
    idle: Mutex<Vec<Connection>>,
}

#[derive(Clone)]
pub struct ConnectionPool {
    inner: Arc<PoolInner>,
}

impl ConnectionPool {
    pub fn open(path: impl Into<PathBuf>, max_pool_size: usize) -> Result<Self, WarehouseError> {
        let path = path.into();
        let root = Connection::open(&path)?;
        Self::from_root(root, Some(path), max_pool_size)
    }

    pub fn open_in_memory(max_pool_size: usize) -> Result<Self, WarehouseError> {
        Self::from_root(Connection::open_in_memory()?, None, max_pool_size)
    }

    fn from_root(
        root: Connection,
        db_path: Option<PathBuf>,
        max_pool_size: usize,
    ) -> Result<Self, WarehouseError> {
        configure_connection(&root)?;
        Ok(Self {
            inner: Arc::new(PoolInner {
                db_path,
                max_pool_size: max_pool_size.max(1),
                root: Mutex::new(root),
                idle: Mutex::new(Vec::new()),
            }),
        })
    }

    pub fn acquire(&self) -> Result<PooledConnection, WarehouseError> {
        let idle = self
            .inner
            .idle
            .lock()
            .map_err(|_| WarehouseError::PoolPoisoned)?
            .pop();

        let connection = match idle {
            Some(connection) => connection,
            None => {
                let root = self
                    .inner
                    .root
                    .lock()
                    .map_err(|_| WarehouseError::PoolPoisoned)?;
                let connection = root.try_clone()?;
                configure_connection(&connection)?;
                connection
            }
        };

        Ok(PooledConnection {
            pool: Arc::clone(&self.inner),
            connection: Some(connection),
            discarded: false,
        })
    }

    /// `None` for in-memory databases.
    pub fn db_path(&self) -> Option<&Path> {
        self.inner.db_path.as_deref()
    }

    pub fn idle_connections(&self) -> usize {
        self.inner
            .idle
            .lock()
            .map(|idle| idle.len())
            .unwrap_or_default()
    }
}

/// Connection that goes back to the pool when dropped, unless it was discarded.
pub struct PooledConnection {
    pool: Arc<PoolInner>,
    connection: Option<Connection>,
    discarded: bool,
}

impl PooledConnection {
    /// Closes the connection on drop instead of returning it to the pool.
    pub fn discard(&mut self) {
        self.discarded = true;
    }
}

impl Deref for PooledConnection {
    type Target = Connection;

    fn deref(&self) -> &Self::Target {
        match self.connection.as_ref() {
            Some(connection) => connection,
            None => unreachable!("pooled connection is only taken on drop"),
        }
    }
}

impl Drop for PooledConnection {
    fn drop(&mut self) {
        let Some(connection) = self.connection.take() else {
            return;
        };
        if self.discarded {
            return;
        }

        if let Ok(mut idle) = self.pool.idle.lock() {
            if idle.len() < self.pool.max_pool_size {
                idle.push(connection);
            }
        }
    }
}

fn configure_connection(connection: &Connection) -> Result<(), ::duckdb::Error> {
    connection.execute_batch("PRAGMA disable_progress_bar;")
}
