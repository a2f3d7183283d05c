use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::messages::{self, MessageCatalog, MessageKey};

/// Entities that can be validated and persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Entity {
    Statistic,
    PriceAlert,
    HorizontalLine,
}

impl Entity {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Statistic => "statistic",
            Self::PriceAlert => "priceAlert",
            Self::HorizontalLine => "horizontalLine",
        }
    }
}

impl Display for Entity {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Constraint violated by a field, carrying the constraint parameter where one exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Constraint {
    Required,
    Min(i64),
    Positive,
    NonNegative,
    MutuallyExclusive,
}

impl Constraint {
    /// Catalog name of the constraint, independent of its parameter.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Required => "required",
            Self::Min(_) => "min",
            Self::Positive => "positive",
            Self::NonNegative => "nonNegative",
            Self::MutuallyExclusive => "mutuallyExclusive",
        }
    }
}

/// A single violated invariant of an entity, with its localized message.
///
/// The message is rendered from the active [`MessageCatalog`] when the error is
/// created. [`ValidationError::message_in`] renders it again for another catalog.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct ValidationError {
    entity: Entity,
    field: &'static str,
    constraint: Constraint,
    message: String,
}

impl ValidationError {
    pub fn new(entity: Entity, field: &'static str, constraint: Constraint) -> Self {
        let message = messages::render(messages::active(), entity, field, constraint);
        Self {
            entity,
            field,
            constraint,
            message,
        }
    }

    pub fn required(entity: Entity, field: &'static str) -> Self {
        Self::new(entity, field, Constraint::Required)
    }

    pub fn min(entity: Entity, field: &'static str, min: i64) -> Self {
        Self::new(entity, field, Constraint::Min(min))
    }

    pub fn positive(entity: Entity, field: &'static str) -> Self {
        Self::new(entity, field, Constraint::Positive)
    }

    pub fn non_negative(entity: Entity, field: &'static str) -> Self {
        Self::new(entity, field, Constraint::NonNegative)
    }

    pub fn mutually_exclusive(entity: Entity, field: &'static str) -> Self {
        Self::new(entity, field, Constraint::MutuallyExclusive)
    }

    pub const fn entity(&self) -> Entity {
        self.entity
    }

    pub const fn field(&self) -> &'static str {
        self.field
    }

    pub const fn constraint(&self) -> Constraint {
        self.constraint
    }

    pub fn key(&self) -> MessageKey {
        MessageKey::new(self.entity, self.field, self.constraint)
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn message_in(&self, catalog: &dyn MessageCatalog) -> String {
        messages::render(catalog, self.entity, self.field, self.constraint)
    }
}

/// Error for a textual code that does not belong to a closed set.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("invalid {kind} '{value}', expected one of {expected}")]
pub struct ParseCodeError {
    pub kind: &'static str,
    pub value: String,
    pub expected: &'static str,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constraint_names_ignore_parameters() {
        assert_eq!(Constraint::Min(1).as_str(), Constraint::Min(50).as_str());
    }

    #[test]
    fn carries_entity_field_and_constraint() {
        let err = ValidationError::min(Entity::PriceAlert, "id", 1);
        assert_eq!(err.entity(), Entity::PriceAlert);
        assert_eq!(err.field(), "id");
        assert_eq!(err.constraint(), Constraint::Min(1));
        assert_eq!(err.to_string(), err.message());
    }
}
