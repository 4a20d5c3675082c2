use super::Single;
use crate::Model;

use strata_core::{
    stmt::{Key, Value},
    Result,
};
use std::fmt;

/// A single related entity owned by this one, e.g. a localisation record.
///
/// Deleting the owner with a cascading scope deletes the owned entity.
pub struct OwnsOne<T> {
    value: Single<T>,
}

impl<T: Model> OwnsOne<T> {
    pub fn new(value: T) -> OwnsOne<T> {
        OwnsOne {
            value: Single::Loaded(Box::new(value)),
        }
    }

    pub fn key(key: impl Into<Key>) -> OwnsOne<T> {
        OwnsOne {
            value: Single::Absent(key.into()),
        }
    }

    pub fn load(value: Option<Value>) -> Result<OwnsOne<T>> {
        Ok(OwnsOne {
            value: Single::load(value)?,
        })
    }

    pub fn to_value(&self) -> Option<Value> {
        self.value.to_value()
    }

    /// # Panics
    ///
    /// Panics if the owned entity was not loaded.
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

    pub fn referenced_key(&self) -> Option<&Key> {
        self.value.key()
    }

    pub fn is_loaded(&self) -> bool {
        matches!(self.value, Single::Loaded(_))
    }
}

impl<T> Default for OwnsOne<T> {
    fn default() -> Self {
        OwnsOne {
            value: Single::Unloaded,
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for OwnsOne<T> {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.value.fmt(fmt)
    }
}
