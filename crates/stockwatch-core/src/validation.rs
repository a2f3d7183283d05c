//! Validation contract shared by all entities.
//!
//! `validate` inspects state only and stops at the first violated rule. Each entity
//! documents its check order, because the first failure decides the surfaced message.

use rust_decimal::Decimal;

use crate::error::{Entity, ValidationError};

pub trait Validate {
    fn validate(&self) -> Result<(), ValidationError>;
}

pub fn require<'a, T>(
    entity: Entity,
    field: &'static str,
    value: Option<&'a T>,
) -> Result<&'a T, ValidationError> {
    value.ok_or_else(|| ValidationError::required(entity, field))
}

pub fn require_text(
    entity: Entity,
    field: &'static str,
    value: &str,
) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::required(entity, field));
    }
    Ok(())
}

pub fn require_min(
    entity: Entity,
    field: &'static str,
    value: i64,
    min: i64,
) -> Result<(), ValidationError> {
    if value < min {
        return Err(ValidationError::min(entity, field, min));
    }
    Ok(())
}

/// Identity fields are optional until storage assigns them.
pub fn require_optional_min(
    entity: Entity,
    field: &'static str,
    value: Option<i64>,
    min: i64,
) -> Result<(), ValidationError> {
    if let Some(value) = value {
        require_min(entity, field, value, min)?;
    }
    Ok(())
}

pub fn require_non_negative(
    entity: Entity,
    field: &'static str,
    value: i64,
) -> Result<(), ValidationError> {
    if value < 0 {
        return Err(ValidationError::non_negative(entity, field));
    }
    Ok(())
}

pub fn require_positive(
    entity: Entity,
    field: &'static str,
    value: Decimal,
) -> Result<(), ValidationError> {
    if value <= Decimal::ZERO {
        return Err(ValidationError::positive(entity, field));
    }
    Ok(())
}
