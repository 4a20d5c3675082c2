use crate::Model;

use strata_core::{
    stmt::{Entity, Value},
    Result,
};
use std::fmt;

/// A collection of related entities.
///
/// An unloaded collection is left out of writes, so updating an entity that
/// was read without its members does not unlink them.
pub struct HasMany<T> {
    values: Option<Vec<T>>,
}

impl<T: Model> HasMany<T> {
    pub fn new(values: impl IntoIterator<Item = T>) -> HasMany<T> {
        HasMany {
            values: Some(values.into_iter().collect()),
        }
    }

    /// Loads the members from the field value of a record.
    ///
    /// Absent members, e.g. back-references cut by the identity cache, are
    /// skipped.
    pub fn load(value: Option<Value>) -> Result<HasMany<T>> {
        let values = match value {
            None | Some(Value::Null) => None,
            Some(Value::List(members)) => {
                let mut values = Vec::with_capacity(members.len());
                for member in members {
                    if let Some(Entity::Present(record)) = member.into_entity() {
                        values.push(T::load(record)?);
                    }
                }
                Some(values)
            }
            Some(value) => {
                strata_core::bail!("expected a list of members; actual={value:?}")
            }
        };

        Ok(HasMany { values })
    }

    pub fn to_value(&self) -> Option<Value> {
        let values = self.values.as_ref()?;
        Some(Value::List(
            values.iter().map(|v| Value::from(v.to_record())).collect(),
        ))
    }

    /// # Panics
    ///
    /// Panics if the members were not loaded.
    #[track_caller]
    pub fn get(&self) -> &[T] {
        match &self.values {
            Some(values) => values,
            None => panic!("association not loaded"),
        }
    }

    pub fn try_get(&self) -> Option<&[T]> {
        self.values.as_deref()
    }

    pub fn get_mut(&mut self) -> Option<&mut Vec<T>> {
        self.values.as_mut()
    }

    /// Adds a member, marking the collection loaded.
    pub fn push(&mut self, value: T) {
        self.values.get_or_insert_with(Vec::new).push(value);
    }

    pub fn is_loaded(&self) -> bool {
        self.values.is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.values.iter().flatten()
    }
}

impl<T> Default for HasMany<T> {
    fn default() -> Self {
        HasMany { values: None }
    }
}

impl<T: fmt::Debug> fmt::Debug for HasMany<T> {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.values {
            Some(values) => values.fmt(fmt),
            None => fmt.write_str("<not loaded>"),
        }
    }
}
