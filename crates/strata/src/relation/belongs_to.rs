use super::Single;
use crate::Model;

use strata_core::{
    stmt::{Key, Value},
    Result,
};
use std::fmt;

/// The owning side of a relation whose key is stored on this entity and
/// whose target is shared with others.
pub struct BelongsTo<T> {
    value: Single<T>,
}

impl<T: Model> BelongsTo<T> {
    pub fn new(value: T) -> BelongsTo<T> {
        BelongsTo {
            value: Single::Loaded(Box::new(value)),
        }
    }

    /// References an already persisted entity by key.
    pub fn key(key: impl Into<Key>) -> BelongsTo<T> {
        BelongsTo {
            value: Single::Absent(key.into()),
        }
    }

    /// Loads the relation from the field value of a record. `None` means the
    /// field was not part of the record.
    pub fn load(value: Option<Value>) -> Result<BelongsTo<T>> {
        Ok(BelongsTo {
            value: Single::load(value)?,
        })
    }

    /// Field value to store in a record, `None` when not loaded.
    pub fn to_value(&self) -> Option<Value> {
        self.value.to_value()
    }

    /// Get the related entity.
    ///
    /// # Panics
    ///
    /// Panics if the related entity was not loaded.
    #[track_caller]
    pub fn get(&self) -> &T {
        self.value.get()
    }

    pub fn try_get(&self) -> Option<&T> {
        self.value.try_get()
    }

    pub fn get_mut(&mut self) -> Option<&mut T> {
        self.value.get_mut()
    }

    /// Key of a referenced entity that was not loaded. For a relation
    /// declared with `by`, this is the referenced field's value.
    pub fn referenced_key(&self) -> Option<&Key> {
        self.value.key()
    }

    pub fn is_loaded(&self) -> bool {
        matches!(self.value, Single::Loaded(_))
    }
}

impl<T> Default for BelongsTo<T> {
    fn default() -> Self {
        BelongsTo {
            value: Single::Unloaded,
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for BelongsTo<T> {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.value.fmt(fmt)
    }
}
