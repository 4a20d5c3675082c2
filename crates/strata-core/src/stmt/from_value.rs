use super::{Key, Value};
use crate::{Error, Result};

use chrono::{DateTime, Utc};

/// Conversion from a field value read out of a [`Record`](super::Record).
///
/// Hand-written `Model::load` implementations use this to pull typed fields
/// out of the record the mapper produced.
pub trait FromValue: Sized {
    fn from_value(value: Value) -> Result<Self>;
}

impl Value {
    /// Converts the value into `T`.
    pub fn load<T: FromValue>(self) -> Result<T> {
        T::from_value(self)
    }
}

impl FromValue for Value {
    fn from_value(value: Value) -> Result<Value> {
        Ok(value)
    }
}

impl FromValue for i64 {
    fn from_value(value: Value) -> Result<i64> {
        match value {
            Value::I64(v) => Ok(v),
            Value::Bool(v) => Ok(v as i64),
            value => Err(Error::type_conversion(value, "i64")),
        }
    }
}

impl FromValue for i32 {
    fn from_value(value: Value) -> Result<i32> {
        let v = i64::from_value(value)?;
        i32::try_from(v).map_err(|_| Error::type_conversion(Value::I64(v), "i32"))
    }
}

impl FromValue for f64 {
    fn from_value(value: Value) -> Result<f64> {
        match value.as_f64() {
            Some(v) => Ok(v),
            None => Err(Error::type_conversion(value, "f64")),
        }
    }
}

impl FromValue for bool {
    fn from_value(value: Value) -> Result<bool> {
        match value.as_bool() {
            Some(v) => Ok(v),
            None => Err(Error::type_conversion(value, "bool")),
        }
    }
}

impl FromValue for String {
    fn from_value(value: Value) -> Result<String> {
        match value {
            Value::String(v) => Ok(v),
            value => Err(Error::type_conversion(value, "String")),
        }
    }
}

impl FromValue for DateTime<Utc> {
    fn from_value(value: Value) -> Result<DateTime<Utc>> {
        match value {
            Value::DateTime(v) => Ok(v),
            value => Err(Error::type_conversion(value, "DateTime")),
        }
    }
}

impl FromValue for serde_json::Value {
    fn from_value(value: Value) -> Result<serde_json::Value> {
        match value {
            Value::Json(v) => Ok(v),
            Value::Null => Ok(serde_json::Value::Null),
            value => Err(Error::type_conversion(value, "Json")),
        }
    }
}

impl FromValue for Key {
    fn from_value(value: Value) -> Result<Key> {
        match value.to_key() {
            Some(key) => Ok(key),
            None => Err(Error::type_conversion(value, "Key")),
        }
    }
}

impl<T: FromValue> FromValue for Option<T> {
    fn from_value(value: Value) -> Result<Option<T>> {
        match value {
            Value::Null => Ok(None),
            value => T::from_value(value).map(Some),
        }
    }
}
