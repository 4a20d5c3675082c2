use super::{Entity, Key, Record};

use chrono::{DateTime, Utc};
use std::{fmt, sync::Arc};

/// A value stored in an entity field, bound as a statement parameter, or
/// returned by the store.
#[derive(Clone, Default)]
pub enum Value {
    /// Unset / SQL `NULL`
    #[default]
    Null,

    Bool(bool),

    I64(i64),

    F64(f64),

    String(String),

    Bytes(Vec<u8>),

    /// An instant in time, always normalised to UTC
    DateTime(DateTime<Utc>),

    /// A structured value persisted as serialized JSON text
    Json(serde_json::Value),

    /// A value that knows how to serialize itself for storage
    Custom(Arc<dyn Serializable>),

    /// A related entity, present or absent
    Entity(Box<Entity>),

    /// A collection of values, used for has-many members and `IN` lists
    List(Vec<Value>),
}

/// A field value that provides its own storage representation.
pub trait Serializable: fmt::Debug + Send + Sync {
    /// Returns the representation written to the column.
    fn serialize(&self) -> String;

    /// The value stored when this object sits in a `Reference` column.
    fn identity(&self) -> Option<Value> {
        None
    }
}

impl Value {
    pub const fn null() -> Value {
        Value::Null
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// `true` for values that can be bound as a single statement parameter.
    pub fn is_scalar(&self) -> bool {
        !matches!(self, Value::Entity(_) | Value::List(_) | Value::Custom(_))
    }

    /// A short name for the variant, used in error messages.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Value::Null => "Null",
            Value::Bool(_) => "Bool",
            Value::I64(_) => "I64",
            Value::F64(_) => "F64",
            Value::String(_) => "String",
            Value::Bytes(_) => "Bytes",
            Value::DateTime(_) => "DateTime",
            Value::Json(_) => "Json",
            Value::Custom(_) => "Custom",
            Value::Entity(_) => "Entity",
            Value::List(_) => "List",
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match *self {
            Value::Bool(v) => Some(v),
            Value::I64(v) => Some(v != 0),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match *self {
            Value::I64(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match *self {
            Value::F64(v) => Some(v),
            Value::I64(v) => Some(v as f64),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_entity(&self) -> Option<&Entity> {
        match self {
            Value::Entity(entity) => Some(entity),
            _ => None,
        }
    }

    pub fn as_entity_mut(&mut self) -> Option<&mut Entity> {
        match self {
            Value::Entity(entity) => Some(entity),
            _ => None,
        }
    }

    pub fn into_entity(self) -> Option<Entity> {
        match self {
            Value::Entity(entity) => Some(*entity),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(values) => Some(values),
            _ => None,
        }
    }

    pub fn as_list_mut(&mut self) -> Option<&mut Vec<Value>> {
        match self {
            Value::List(values) => Some(values),
            _ => None,
        }
    }

    /// Interprets the value as an entity key.
    ///
    /// Integers, text and the key of a nested entity qualify. Returns `None`
    /// for `Null`, zero and everything else.
    pub fn to_key(&self) -> Option<Key> {
        match self {
            Value::I64(0) => None,
            Value::I64(v) => Some(Key::I64(*v)),
            Value::String(v) if v.is_empty() => None,
            Value::String(v) => Some(Key::String(v.clone())),
            _ => None,
        }
    }

    #[track_caller]
    pub fn expect_i64(&self) -> i64 {
        match self {
            Value::I64(v) => *v,
            _ => panic!("expected Value::I64; actual={self:?}"),
        }
    }

    #[track_caller]
    pub fn expect_string(&self) -> &str {
        match self {
            Value::String(v) => v,
            _ => panic!("expected Value::String; actual={self:?}"),
        }
    }

    #[track_caller]
    pub fn expect_entity(&self) -> &Entity {
        match self {
            Value::Entity(v) => v,
            _ => panic!("expected Value::Entity; actual={self:?}"),
        }
    }

    #[track_caller]
    pub fn expect_list(&self) -> &[Value] {
        match self {
            Value::List(v) => v,
            _ => panic!("expected Value::List; actual={self:?}"),
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Value) -> bool {
        use Value::*;

        match (self, other) {
            (Null, Null) => true,
            (Bool(a), Bool(b)) => a == b,
            (I64(a), I64(b)) => a == b,
            (F64(a), F64(b)) => a == b,
            (String(a), String(b)) => a == b,
            (Bytes(a), Bytes(b)) => a == b,
            (DateTime(a), DateTime(b)) => a == b,
            (Json(a), Json(b)) => a == b,
            (Custom(a), Custom(b)) => a.serialize() == b.serialize(),
            (Entity(a), Entity(b)) => a == b,
            (List(a), List(b)) => a == b,
            _ => false,
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("Null"),
            Value::Bool(v) => fmt::Debug::fmt(v, f),
            Value::I64(v) => fmt::Debug::fmt(v, f),
            Value::F64(v) => fmt::Debug::fmt(v, f),
            Value::String(v) => fmt::Debug::fmt(v, f),
            Value::Bytes(v) => write!(f, "<{} bytes>", v.len()),
            Value::DateTime(v) => write!(f, "{}", v.to_rfc3339()),
            Value::Json(v) => write!(f, "json({v})"),
            Value::Custom(v) => fmt::Debug::fmt(v, f),
            Value::Entity(v) => fmt::Debug::fmt(v, f),
            Value::List(v) => f.debug_list().entries(v).finish(),
        }
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Value {
        Value::Bool(value)
    }
}

macro_rules! impl_from_int {
    ( $($t:ty),+ ) => {
        $(
            impl From<$t> for Value {
                fn from(value: $t) -> Value {
                    Value::I64(value as i64)
                }
            }
        )+
    };
}

impl_from_int!(i8, i16, i32, i64, u8, u16, u32);

impl From<f64> for Value {
    fn from(value: f64) -> Value {
        Value::F64(value)
    }
}

impl From<f32> for Value {
    fn from(value: f32) -> Value {
        Value::F64(value as f64)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Value {
        Value::String(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Value {
        Value::String(value)
    }
}

impl From<&String> for Value {
    fn from(value: &String) -> Value {
        Value::String(value.clone())
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(value: DateTime<Utc>) -> Value {
        Value::DateTime(value)
    }
}

impl From<serde_json::Value> for Value {
    fn from(value: serde_json::Value) -> Value {
        Value::Json(value)
    }
}

impl From<Entity> for Value {
    fn from(value: Entity) -> Value {
        Value::Entity(Box::new(value))
    }
}

impl From<Record> for Value {
    fn from(value: Record) -> Value {
        Value::Entity(Box::new(Entity::Present(value)))
    }
}

impl From<Key> for Value {
    fn from(value: Key) -> Value {
        match value {
            Key::I64(v) => Value::I64(v),
            Key::String(v) => Value::String(v),
        }
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Value {
        match value {
            Some(value) => value.into(),
            None => Value::Null,
        }
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(value: Vec<T>) -> Value {
        Value::List(value.into_iter().map(Into::into).collect())
    }
}
