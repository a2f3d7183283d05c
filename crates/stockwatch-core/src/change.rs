//! Change detection applied before an update reaches storage.
//!
//! Every persisted entity implements [`Tracked`] and compares itself field by field
//! against the stored counterpart with the same key. An update whose field set is
//! identical is refused with [`PersistenceError::ObjectUnchanged`].

use std::fmt::{Debug, Display};

use crate::error::Entity;
use crate::persistence::PersistenceError;

pub trait Tracked: Clone {
    /// Identity shared by the incoming value and its stored counterpart.
    type Key: Clone + Ord + Display + Debug;

    const ENTITY: Entity;

    /// `None` while storage has not assigned an identity yet.
    fn key(&self) -> Option<Self::Key>;

    /// Names of the fields whose values differ from `stored`, in declaration order.
    fn changed_fields(&self, stored: &Self) -> Vec<&'static str>;
}

/// Collects the names of differing fields.
#[derive(Debug, Default)]
pub struct FieldDiff {
    changed: Vec<&'static str>,
}

impl FieldDiff {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn field<V>(mut self, name: &'static str, incoming: &V, stored: &V) -> Self
    where
        V: PartialEq + ?Sized,
    {
        if incoming != stored {
            self.changed.push(name);
        }
        self
    }

    pub fn finish(self) -> Vec<&'static str> {
        self.changed
    }
}

pub fn is_unchanged<T: Tracked>(incoming: &T, stored: &T) -> bool {
    incoming.changed_fields(stored).is_empty()
}

/// Returns the changed field names, or `ObjectUnchanged` when there are none.
pub fn ensure_changed<T: Tracked>(
    incoming: &T,
    stored: &T,
) -> Result<Vec<&'static str>, PersistenceError> {
    let changed = incoming.changed_fields(stored);
    if changed.is_empty() {
        return Err(PersistenceError::ObjectUnchanged {
            entity: T::ENTITY,
            key: describe_key(incoming),
        });
    }
    Ok(changed)
}

pub(crate) fn describe_key<T: Tracked>(value: &T) -> String {
    value
        .key()
        .map(|key| key.to_string())
        .unwrap_or_else(|| String::from("<unassigned>"))
}
