mod builder;
pub use builder::Builder;

mod column;
pub use column::Column;

mod model;
pub use model::{Model, RelationRef};

mod relation;
pub use relation::{BelongsTo, HasMany, OwnsOne, Sort};

mod ty;
pub use ty::{ColumnType, DATETIME_FORMAT};

mod verify;

use crate::{Error, Result};

use indexmap::IndexMap;

/// The registry of every mapping descriptor known to a database handle.
#[derive(Debug, Default)]
pub struct Schema {
    models: IndexMap<String, Model>,

    /// Prefix applied to every table name at build time
    table_name_prefix: Option<String>,
}

impl Schema {
    pub fn builder() -> Builder {
        Builder::default()
    }

    /// Returns the descriptor registered as `name`.
    ///
    /// A missing descriptor means a relation points at a model that was
    /// never registered, which is a configuration defect.
    pub fn model(&self, name: &str) -> Result<&Model> {
        self.models
            .get(name)
            .ok_or_else(|| Error::invalid_schema(format!("model `{name}` is not registered")))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.models.contains_key(name)
    }

    pub fn models(&self) -> impl ExactSizeIterator<Item = &Model> {
        self.models.values()
    }

    pub fn table_name_prefix(&self) -> Option<&str> {
        self.table_name_prefix.as_deref()
    }
}
