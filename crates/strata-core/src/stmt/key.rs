use super::Value;

use std::fmt;

/// The identity of a persisted entity within its model.
///
/// Unlike [`Value`], keys are hashable and totally ordered so they can index
/// the identity cache and membership sets.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Key {
    I64(i64),
    String(String),
}

impl Key {
    pub fn to_value(&self) -> Value {
        Value::from(self.clone())
    }
}

impl fmt::Debug for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Key::I64(v) => fmt::Debug::fmt(v, f),
            Key::String(v) => fmt::Debug::fmt(v, f),
        }
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Key::I64(v) => fmt::Display::fmt(v, f),
            Key::String(v) => f.write_str(v),
        }
    }
}

impl From<i64> for Key {
    fn from(value: i64) -> Key {
        Key::I64(value)
    }
}

impl From<i32> for Key {
    fn from(value: i32) -> Key {
        Key::I64(value.into())
    }
}

impl From<&str> for Key {
    fn from(value: &str) -> Key {
        Key::String(value.to_string())
    }
}

impl From<String> for Key {
    fn from(value: String) -> Key {
        Key::String(value)
    }
}
