use crate::{
    stmt::{Entity, Value},
    Error, Result,
};

use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use std::{fmt, str::FromStr};

/// Storage format of date-time columns.
pub const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// The semantic type of a column.
///
/// Each tag pairs a coercion from the entity field value to the value bound
/// into a statement with the inverse coercion applied to values read back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ColumnType {
    Int,
    String,
    Float,
    Bool,
    DateTime,
    DateTimeImmutable,

    /// Structured value stored as JSON text
    Json,

    /// Value stored through [`Serializable::serialize`](crate::stmt::Serializable)
    Serializable,

    /// Opaque object stored by its identity
    Reference,

    /// A tag this crate does not know. Written unchanged, rejected on read.
    Unknown(Box<str>),
}

impl ColumnType {
    /// Coerces an entity field value into its storage representation.
    pub fn to_storage(&self, value: &Value) -> Result<Value> {
        if value.is_null() {
            return Ok(Value::Null);
        }

        let ret = match (self, value) {
            (ColumnType::Int, Value::I64(_)) => value.clone(),
            (ColumnType::Int, Value::Bool(v)) => Value::I64(*v as i64),
            (ColumnType::Int, Value::String(v)) => Value::I64(parse(v, self)?),

            (ColumnType::String, Value::String(_)) => value.clone(),
            (ColumnType::String, Value::I64(v)) => Value::String(v.to_string()),
            (ColumnType::String, Value::F64(v)) => Value::String(v.to_string()),
            (ColumnType::String, Value::Bool(v)) => Value::String(v.to_string()),

            (ColumnType::Float, Value::F64(_)) => value.clone(),
            (ColumnType::Float, Value::I64(v)) => Value::F64(*v as f64),

            (ColumnType::Bool, Value::Bool(_)) => value.clone(),
            (ColumnType::Bool, Value::I64(v)) => Value::Bool(*v != 0),

            (ColumnType::DateTime | ColumnType::DateTimeImmutable, Value::DateTime(v)) => {
                Value::String(v.format(DATETIME_FORMAT).to_string())
            }
            (ColumnType::DateTime | ColumnType::DateTimeImmutable, Value::String(v)) => {
                Value::String(parse_datetime(v)?.format(DATETIME_FORMAT).to_string())
            }

            (ColumnType::Json, Value::Json(v)) => Value::String(serde_json::to_string(v)?),

            (ColumnType::Serializable, Value::Custom(v)) => Value::String(v.serialize()),
            (ColumnType::Serializable, Value::String(_)) => value.clone(),

            (ColumnType::Reference, Value::I64(_) | Value::String(_)) => value.clone(),
            (ColumnType::Reference, Value::Custom(v)) => match v.identity() {
                Some(identity) => identity,
                None => return Err(Error::type_conversion(value.clone(), "Reference")),
            },
            (ColumnType::Reference, Value::Entity(entity)) => match &**entity {
                Entity::Absent { key, .. } => key.clone(),
                Entity::Present(_) => return Err(Error::type_conversion(value.clone(), "Reference")),
            },

            (ColumnType::Unknown(_), _) => value.clone(),

            _ => return Err(Error::type_conversion(value.clone(), self.to_string())),
        };

        Ok(ret)
    }

    /// Coerces a value read from the store into the entity field value.
    pub fn from_storage(&self, value: Value) -> Result<Value> {
        if let ColumnType::Unknown(tag) = self {
            return Err(Error::type_conversion(value, format!("unknown column type `{tag}`")));
        }

        if value.is_null() {
            return Ok(Value::Null);
        }

        let ret = match (self, value) {
            (ColumnType::Int, value @ Value::I64(_)) => value,
            (ColumnType::Int, Value::Bool(v)) => Value::I64(v as i64),
            (ColumnType::Int, Value::String(v)) => Value::I64(parse(&v, self)?),

            (ColumnType::String, value @ Value::String(_)) => value,
            (ColumnType::String, Value::I64(v)) => Value::String(v.to_string()),
            (ColumnType::String, Value::F64(v)) => Value::String(v.to_string()),
            (ColumnType::String, Value::Bytes(v)) => match String::from_utf8(v) {
                Ok(v) => Value::String(v),
                Err(err) => return Err(Error::type_conversion(Value::Bytes(err.into_bytes()), "String")),
            },

            (ColumnType::Float, value @ Value::F64(_)) => value,
            (ColumnType::Float, Value::I64(v)) => Value::F64(v as f64),
            (ColumnType::Float, Value::String(v)) => Value::F64(parse(&v, self)?),

            (ColumnType::Bool, value @ Value::Bool(_)) => value,
            (ColumnType::Bool, Value::I64(v)) => Value::Bool(v != 0),
            (ColumnType::Bool, Value::String(v)) => match v.as_str() {
                "1" | "true" => Value::Bool(true),
                "0" | "false" | "" => Value::Bool(false),
                _ => return Err(Error::type_conversion(Value::String(v), "Bool")),
            },

            (ColumnType::DateTime | ColumnType::DateTimeImmutable, Value::String(v)) => {
                Value::DateTime(parse_datetime(&v)?)
            }
            (ColumnType::DateTime | ColumnType::DateTimeImmutable, Value::I64(v)) => {
                match Utc.timestamp_opt(v, 0).single() {
                    Some(v) => Value::DateTime(v),
                    None => return Err(Error::type_conversion(Value::I64(v), "DateTime")),
                }
            }
            (ColumnType::DateTime | ColumnType::DateTimeImmutable, value @ Value::DateTime(_)) => {
                value
            }

            (ColumnType::Json, Value::String(v)) => Value::Json(serde_json::from_str(&v)?),

            (ColumnType::Serializable, value @ Value::String(_)) => value,

            (ColumnType::Reference, value @ (Value::I64(_) | Value::String(_))) => value,

            (_, value) => return Err(Error::type_conversion(value, self.to_string())),
        };

        Ok(ret)
    }
}

fn parse<T: FromStr>(text: &str, ty: &ColumnType) -> Result<T> {
    text.trim()
        .parse()
        .map_err(|_| Error::type_conversion(Value::String(text.to_string()), ty.to_string()))
}

fn parse_datetime(text: &str) -> Result<DateTime<Utc>> {
    if let Ok(naive) = NaiveDateTime::parse_from_str(text, DATETIME_FORMAT) {
        return Ok(naive.and_utc());
    }

    DateTime::parse_from_rfc3339(text)
        .map(|v| v.with_timezone(&Utc))
        .map_err(|_| Error::type_conversion(Value::String(text.to_string()), "DateTime"))
}

impl FromStr for ColumnType {
    type Err = std::convert::Infallible;

    /// Parses a type tag. Unrecognised tags become [`ColumnType::Unknown`].
    fn from_str(tag: &str) -> std::result::Result<ColumnType, Self::Err> {
        Ok(match tag.to_ascii_lowercase().as_str() {
            "int" | "integer" => ColumnType::Int,
            "string" => ColumnType::String,
            "float" => ColumnType::Float,
            "bool" | "boolean" => ColumnType::Bool,
            "datetime" => ColumnType::DateTime,
            "datetimeimmutable" => ColumnType::DateTimeImmutable,
            "json" => ColumnType::Json,
            "serializable" => ColumnType::Serializable,
            "reference" | "object" => ColumnType::Reference,
            _ => ColumnType::Unknown(tag.into()),
        })
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ColumnType::Int => "int",
            ColumnType::String => "string",
            ColumnType::Float => "float",
            ColumnType::Bool => "bool",
            ColumnType::DateTime => "DateTime",
            ColumnType::DateTimeImmutable => "DateTimeImmutable",
            ColumnType::Json => "Json",
            ColumnType::Serializable => "Serializable",
            ColumnType::Reference => "Reference",
            ColumnType::Unknown(tag) => tag,
        })
    }
}
