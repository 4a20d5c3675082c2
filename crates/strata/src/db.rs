mod builder;
pub use builder::Builder;

mod connect;
pub use connect::Connect;

mod session;
pub use session::Session;

use crate::{
    engine::{Cx, CxHandle, Engine},
    read::Read,
    Model, RelationScope, Result,
};

use strata_core::{
    driver::{operation::Transaction, Response},
    stmt::{Key, Query, Record, Value},
    Schema,
};

/// A database handle.
///
/// Every operation is one top-level mapper call: it gets its own identity
/// cache, which is dropped when the call returns. Use a [`Session`] to
/// share one cache across several calls. Cloning the handle shares the
/// connection.
#[derive(Debug, Clone)]
pub struct Db {
    engine: Engine,
}

impl Db {
    pub fn builder() -> Builder {
        Builder::default()
    }

    /// Starts a session whose calls share an identity cache.
    pub fn session(&self) -> Session<'_> {
        Session::new(&self.engine)
    }

    pub fn read<M: Model>(&self) -> Read<'_, M> {
        Read::new(&self.engine, CxHandle::Owned(Cx::default()), M::NAME, M::load)
    }

    /// Reads the model registered as `model` without a Rust type.
    pub fn read_records(&self, model: &str) -> Read<'_, Record> {
        Read::new(&self.engine, CxHandle::Owned(Cx::default()), model, Ok)
    }

    /// Loads the entity of `M` stored under `key` with the default depth
    /// and every relation.
    pub async fn get<M: Model>(&self, key: impl Into<Key>) -> Result<Option<M>> {
        self.read::<M>().get(key).await
    }

    /// Inserts `entity` and the relations it carries. Generated keys are
    /// written back into `entity`.
    pub async fn create<M: Model>(&self, entity: &mut M, scope: RelationScope) -> Result<Value> {
        self.session().create(entity, scope).await
    }

    pub async fn create_record(&self, record: &mut Record, scope: RelationScope) -> Result<Value> {
        self.session().create_record(record, scope).await
    }

    /// Writes `entity` back, or creates it when it has no key.
    pub async fn update<M: Model>(
        &self,
        entity: &mut M,
        scope: RelationScope,
        depth: u8,
    ) -> Result<Value> {
        self.session().update(entity, scope, depth).await
    }

    pub async fn update_record(
        &self,
        record: &mut Record,
        scope: RelationScope,
        depth: u8,
    ) -> Result<Value> {
        self.session().update_record(record, scope, depth).await
    }

    /// Deletes `entity`. Returns `None` when it was never persisted.
    pub async fn delete<M: Model>(&self, entity: &M, scope: RelationScope) -> Result<Option<Key>> {
        self.session().delete(entity, scope).await
    }

    pub async fn delete_record(&self, record: &Record, scope: RelationScope) -> Result<Option<Key>> {
        self.session().delete_record(record, scope).await
    }

    /// Loads the entity of `M` stored under `key`, then deletes it.
    pub async fn delete_by_key<M: Model>(
        &self,
        key: impl Into<Key>,
        scope: RelationScope,
    ) -> Result<Option<Key>> {
        self.session().delete_by_key::<M>(key, scope).await
    }

    pub async fn begin(&self) -> Result<()> {
        self.engine.transaction(Transaction::Start).await
    }

    pub async fn commit(&self) -> Result<()> {
        self.engine.transaction(Transaction::Commit).await
    }

    pub async fn rollback(&self) -> Result<()> {
        self.engine.transaction(Transaction::Rollback).await
    }

    /// Executes a statement built with the query builder.
    pub async fn execute(&self, query: Query) -> Result<Response> {
        self.engine.exec(query).await
    }

    /// Executes `;`-separated statements without parameters, e.g. DDL.
    pub async fn execute_batch(&self, sql: &str) -> Result<()> {
        self.engine.execute_batch(sql).await
    }

    pub fn schema(&self) -> &Schema {
        &self.engine.schema
    }

    pub fn table_name_prefix(&self) -> Option<&str> {
        self.engine.schema.table_name_prefix()
    }
}
