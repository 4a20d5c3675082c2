use super::{Key, Record, Value};

/// An entity as seen by the mapper: either a populated record or the
/// absent-entity sentinel.
///
/// `Absent` is what reads return for keys that were not found, when the
/// relation depth is exhausted, and for cyclic back-references. It still
/// carries the key that was asked for, so callers can tell which entity is
/// missing.
#[derive(Debug, Clone, PartialEq)]
pub enum Entity {
    Present(Record),
    Absent { model: String, key: Value },
}

impl Entity {
    pub fn absent(model: impl Into<String>, key: impl Into<Value>) -> Entity {
        Entity::Absent {
            model: model.into(),
            key: key.into(),
        }
    }

    pub fn model(&self) -> &str {
        match self {
            Entity::Present(record) => record.model(),
            Entity::Absent { model, .. } => model,
        }
    }

    pub fn is_present(&self) -> bool {
        matches!(self, Entity::Present(_))
    }

    pub fn is_absent(&self) -> bool {
        matches!(self, Entity::Absent { .. })
    }

    /// Returns the key held by the entity, reading `primary_key` from a
    /// present record.
    pub fn key(&self, primary_key: &str) -> Option<Key> {
        match self {
            Entity::Present(record) => record.value(primary_key).to_key(),
            Entity::Absent { key, .. } => key.to_key(),
        }
    }

    pub fn as_record(&self) -> Option<&Record> {
        match self {
            Entity::Present(record) => Some(record),
            Entity::Absent { .. } => None,
        }
    }

    pub fn as_record_mut(&mut self) -> Option<&mut Record> {
        match self {
            Entity::Present(record) => Some(record),
            Entity::Absent { .. } => None,
        }
    }

    pub fn into_record(self) -> Option<Record> {
        match self {
            Entity::Present(record) => Some(record),
            Entity::Absent { .. } => None,
        }
    }

    #[track_caller]
    pub fn expect_record(&self) -> &Record {
        match self {
            Entity::Present(record) => record,
            Entity::Absent { model, key } => {
                panic!("expected a present entity; model={model} key={key:?}")
            }
        }
    }
}

impl From<Record> for Entity {
    fn from(record: Record) -> Entity {
        Entity::Present(record)
    }
}
