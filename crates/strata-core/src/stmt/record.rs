use super::{FromValue, Value};
use crate::Result;

use indexmap::IndexMap;

/// The field values of one entity, keyed by field name.
///
/// Records are what typed models convert into and out of; the mapper only
/// ever sees records.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    /// Name of the model the record belongs to
    model: String,

    fields: IndexMap<String, Value>,
}

impl Record {
    pub fn new(model: impl Into<String>) -> Record {
        Record {
            model: model.into(),
            fields: IndexMap::new(),
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Builder-style [`set`](Self::set).
    pub fn with(mut self, field: impl Into<String>, value: impl Into<Value>) -> Record {
        self.set(field, value);
        self
    }

    pub fn set(&mut self, field: impl Into<String>, value: impl Into<Value>) {
        self.fields.insert(field.into(), value.into());
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }

    pub fn get_mut(&mut self, field: &str) -> Option<&mut Value> {
        self.fields.get_mut(field)
    }

    /// Returns the field value, `Null` when unset.
    pub fn value(&self, field: &str) -> &Value {
        static NULL: Value = Value::Null;
        self.fields.get(field).unwrap_or(&NULL)
    }

    /// Removes the field and returns its value, `Null` when unset.
    pub fn take(&mut self, field: &str) -> Value {
        self.fields.shift_remove(field).unwrap_or_default()
    }

    /// Removes the field, `None` when it was never set.
    pub fn remove(&mut self, field: &str) -> Option<Value> {
        self.fields.shift_remove(field)
    }

    /// Removes the field and converts it into `T`.
    pub fn load<T: FromValue>(&mut self, field: &str) -> Result<T> {
        let value = self.take(field);
        value
            .load()
            .map_err(|err| err.context(crate::err!("field `{}.{field}`", self.model)))
    }

    pub fn contains(&self, field: &str) -> bool {
        self.fields.contains_key(field)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }
}
