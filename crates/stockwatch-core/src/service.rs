//! Validate-then-persist flow behind the outward-facing request handlers.

use std::marker::PhantomData;

use thiserror::Error;

use crate::change::{describe_key, Tracked};
use crate::envelope::{WebServiceMessage, WebServiceResult};
use crate::error::ValidationError;
use crate::persistence::{Dao, PersistenceError, Record};
use crate::validation::Validate;

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Persistence(#[from] PersistenceError),
}

impl ServiceError {
    pub const fn is_unchanged(&self) -> bool {
        matches!(
            self,
            Self::Persistence(PersistenceError::ObjectUnchanged { .. })
        )
    }

    /// Message shown to the user for this outcome.
    pub fn to_message(&self) -> WebServiceMessage {
        match self {
            Self::Validation(err) => WebServiceMessage::error(err.message()),
            Self::Persistence(err @ PersistenceError::ObjectUnchanged { .. }) => {
                WebServiceMessage::info(err.to_string())
            }
            Self::Persistence(err @ PersistenceError::NotFound { .. }) => {
                WebServiceMessage::warning(err.to_string())
            }
            Self::Persistence(err) => WebServiceMessage::error(err.to_string()),
        }
    }
}

/// Runs validation before every write to the wrapped DAO.
#[derive(Debug)]
pub struct EntityService<T, D> {
    dao: D,
    entity: PhantomData<fn() -> T>,
}

impl<T, D> EntityService<T, D>
where
    T: Record + Validate,
    D: Dao<T>,
{
    pub fn new(dao: D) -> Self {
        Self {
            dao,
            entity: PhantomData,
        }
    }

    pub fn dao(&self) -> &D {
        &self.dao
    }

    pub fn create(&self, value: &T) -> Result<T, ServiceError> {
        value.validate()?;
        Ok(self.dao.insert(value)?)
    }

    pub fn modify(&self, value: &T) -> Result<(), ServiceError> {
        value.validate()?;
        if value.key().is_none() {
            return Err(PersistenceError::MissingKey { entity: T::ENTITY }.into());
        }
        Ok(self.dao.update(value)?)
    }

    pub fn remove(&self, value: &T) -> Result<(), ServiceError> {
        Ok(self.dao.delete(value)?)
    }

    pub fn find(&self, key: &T::Key) -> Result<T, ServiceError> {
        Ok(self.dao.get(key)?)
    }

    pub fn list(&self, filter: &T::Filter) -> Result<Vec<T>, ServiceError> {
        Ok(self.dao.list(filter)?)
    }

    pub fn create_result(&self, value: &T) -> WebServiceResult<T> {
        into_result(self.create(value), |stored| Action::Created.describe(stored))
    }

    pub fn modify_result(&self, value: &T) -> WebServiceResult<T> {
        let outcome = self.modify(value).map(|()| value.clone());
        into_result(outcome, |stored| Action::Updated.describe(stored))
    }

    pub fn remove_result(&self, value: &T) -> WebServiceResult<T> {
        let outcome = self.remove(value).map(|()| value.clone());
        into_result(outcome, |removed| Action::Deleted.describe(removed))
    }
}

/// Write operation reported back to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Created,
    Updated,
    Deleted,
}

impl Action {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::Updated => "updated",
            Self::Deleted => "deleted",
        }
    }

    /// Success text such as `priceAlert '7' was created.`
    pub fn describe<T: Tracked>(self, value: &T) -> String {
        format!("{} '{}' was {}.", T::ENTITY, describe_key(value), self.as_str())
    }
}

/// Wraps an outcome into a result envelope with a single message.
pub fn into_result<T>(
    outcome: Result<T, ServiceError>,
    success: impl FnOnce(&T) -> String,
) -> WebServiceResult<T> {
    match outcome {
        Ok(data) => {
            let mut result = WebServiceResult::empty();
            result.add_message(WebServiceMessage::success(success(&data)));
            result.set_data(data);
            result
        }
        Err(err) => {
            let mut result = WebServiceResult::empty();
            result.add_message(err.to_message());
            result
        }
    }
}
