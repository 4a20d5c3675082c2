pub mod db;
pub use db::{Builder, Db, Session};

mod engine;

mod model;
pub use model::Model;

mod read;
pub use read::Read;

pub mod relation;
pub use relation::{BelongsTo, HasMany, OwnsOne};

mod scope;
pub use scope::RelationScope;

pub use strata_core::{driver, schema, stmt, Error, Result};
