//! Persistence interface consumed by the entity service.
//!
//! Implementations must apply [`crate::change::ensure_changed`] on update, reading the
//! stored value and writing the new one as a single unit.

use std::collections::BTreeMap;
use std::error::Error as StdError;
use std::fmt::Debug;
use std::sync::{Mutex, MutexGuard};

use thiserror::Error;

use crate::change::{describe_key, ensure_changed, Tracked};
use crate::error::Entity;

#[derive(Debug, Error)]
pub enum PersistenceError {
    /// Update carried no field change. Callers treat this as a no-op.
    #[error("{entity} '{key}' is unchanged")]
    ObjectUnchanged { entity: Entity, key: String },

    #[error("{entity} '{key}' was not found")]
    NotFound { entity: Entity, key: String },

    #[error("{entity} has no identity assigned")]
    MissingKey { entity: Entity },

    #[error("storage failure: {0}")]
    Storage(#[source] Box<dyn StdError + Send + Sync + 'static>),
}

impl PersistenceError {
    pub fn storage(source: impl Into<Box<dyn StdError + Send + Sync + 'static>>) -> Self {
        Self::Storage(source.into())
    }

    pub fn not_found(entity: Entity, key: impl ToString) -> Self {
        Self::NotFound {
            entity,
            key: key.to_string(),
        }
    }

    pub const fn is_unchanged(&self) -> bool {
        matches!(self, Self::ObjectUnchanged { .. })
    }
}

/// An entity that can be stored and listed.
pub trait Record: Tracked {
    type Filter: Default + Debug;

    /// Whether storage hands out the identity on insert.
    const GENERATED_KEY: bool = false;

    fn matches(&self, filter: &Self::Filter) -> bool;

    /// Applies an identity generated by storage. Entities with natural keys ignore it.
    fn with_generated_id(self, _id: i64) -> Self {
        self
    }
}

pub trait Dao<T: Record> {
    /// Stores a new entity and returns it with its identity assigned.
    ///
    /// Entities with a generated key always receive a fresh identity; an id already
    /// set on `value` is replaced.
    fn insert(&self, value: &T) -> Result<T, PersistenceError>;

    fn update(&self, value: &T) -> Result<(), PersistenceError>;

    fn delete(&self, value: &T) -> Result<(), PersistenceError>;

    fn get(&self, key: &T::Key) -> Result<T, PersistenceError>;

    fn list(&self, filter: &T::Filter) -> Result<Vec<T>, PersistenceError>;
}

#[derive(Debug, Error)]
#[error("in-memory store lock was poisoned")]
struct PoisonedStore;

/// Mutex-guarded map honouring the same contract as the warehouse.
#[derive(Debug)]
pub struct InMemoryDao<T: Record> {
    state: Mutex<MemoryState<T>>,
}

#[derive(Debug)]
struct MemoryState<T: Record> {
    rows: BTreeMap<T::Key, T>,
    next_id: i64,
}

impl<T: Record> Default for InMemoryDao<T> {
    fn default() -> Self {
        Self {
            state: Mutex::new(MemoryState {
                rows: BTreeMap::new(),
                next_id: 1,
            }),
        }
    }
}

impl<T: Record> InMemoryDao<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.lock().map(|state| state.rows.len()).unwrap_or_default()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> Result<MutexGuard<'_, MemoryState<T>>, PersistenceError> {
        self.state
            .lock()
            .map_err(|_| PersistenceError::storage(PoisonedStore))
    }
}

fn key_of<T: Tracked>(value: &T) -> Result<T::Key, PersistenceError> {
    value
        .key()
        .ok_or(PersistenceError::MissingKey { entity: T::ENTITY })
}

impl<T: Record> Dao<T> for InMemoryDao<T> {
    fn insert(&self, value: &T) -> Result<T, PersistenceError> {
        let mut state = self.lock()?;
        let stored = if T::GENERATED_KEY {
            let id = state.next_id;
            state.next_id += 1;
            value.clone().with_generated_id(id)
        } else {
            value.clone()
        };
        let key = key_of(&stored)?;
        if state.rows.contains_key(&key) {
            return Err(PersistenceError::storage(format!(
                "{} '{key}' already exists",
                T::ENTITY
            )));
        }
        state.rows.insert(key, stored.clone());
        Ok(stored)
    }

    fn update(&self, value: &T) -> Result<(), PersistenceError> {
        let key = key_of(value)?;
        let mut state = self.lock()?;
        let stored = state
            .rows
            .get(&key)
            .ok_or_else(|| PersistenceError::not_found(T::ENTITY, describe_key(value)))?;
        ensure_changed(value, stored)?;
        state.rows.insert(key, value.clone());
        Ok(())
    }

    fn delete(&self, value: &T) -> Result<(), PersistenceError> {
        let key = key_of(value)?;
        let mut state = self.lock()?;
        state
            .rows
            .remove(&key)
            .map(|_| ())
            .ok_or_else(|| PersistenceError::not_found(T::ENTITY, key))
    }

    fn get(&self, key: &T::Key) -> Result<T, PersistenceError> {
        let state = self.lock()?;
        state
            .rows
            .get(key)
            .cloned()
            .ok_or_else(|| PersistenceError::not_found(T::ENTITY, key))
    }

    fn list(&self, filter: &T::Filter) -> Result<Vec<T>, PersistenceError> {
        let state = self.lock()?;
        Ok(state
            .rows
            .values()
            .filter(|value| value.matches(filter))
            .cloned()
            .collect())
    }
}
