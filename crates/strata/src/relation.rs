mod belongs_to;
pub use belongs_to::BelongsTo;

mod has_many;
pub use has_many::HasMany;

mod owns_one;
pub use owns_one::OwnsOne;

use crate::Model;

use strata_core::{
    stmt::{Entity, Key, Value},
    Result,
};
use std::fmt;

/// Shared state of the single-valued relation wrappers.
enum Single<T> {
    /// The relation was not part of the read, or is unset
    Unloaded,

    /// Only the key of the related entity is known
    Absent(Key),

    Loaded(Box<T>),
}

impl<T: Model> Single<T> {
    fn load(value: Option<Value>) -> Result<Single<T>> {
        let Some(value) = value else {
            return Ok(Single::Unloaded);
        };

        Ok(match value {
            Value::Entity(entity) => match *entity {
                Entity::Present(record) => Single::Loaded(Box::new(T::load(record)?)),
                Entity::Absent { key, .. } => match key.to_key() {
                    Some(key) => Single::Absent(key),
                    None => Single::Unloaded,
                },
            },
            value => match value.to_key() {
                Some(key) => Single::Absent(key),
                None => Single::Unloaded,
            },
        })
    }

    fn to_value(&self) -> Option<Value> {
        match self {
            Single::Unloaded => None,
            Single::Absent(key) => Some(key.to_value()),
            Single::Loaded(value) => Some(Value::from(value.to_record())),
        }
    }

    #[track_caller]
    fn get(&self) -> &T {
        match self {
            Single::Loaded(value) => value,
            _ => panic!("association not loaded"),
        }
    }

    fn try_get(&self) -> Option<&T> {
        match self {
            Single::Loaded(value) => Some(value),
            _ => None,
        }
    }

    fn get_mut(&mut self) -> Option<&mut T> {
        match self {
            Single::Loaded(value) => Some(value),
            _ => None,
        }
    }

    fn key(&self) -> Option<&Key> {
        match self {
            Single::Absent(key) => Some(key),
            _ => None,
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for Single<T> {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Single::Unloaded => fmt.write_str("<not loaded>"),
            Single::Absent(key) => write!(fmt, "<key {key:?}>"),
            Single::Loaded(value) => value.fmt(fmt),
        }
    }
}

impl<T> Default for Single<T> {
    fn default() -> Self {
        Single::Unloaded
    }
}
