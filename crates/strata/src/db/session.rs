use crate::{
    engine::{Cx, CxHandle, Engine},
    read::Read,
    Model, RelationScope, Result,
};

use strata_core::stmt::{Key, Record, Value};

/// Mapper calls sharing one identity cache.
///
/// Entities loaded by an earlier call are reused by later reads that ask
/// for no more depth or relation scope than they were loaded with. A write
/// empties the cache, since cached owners may embed what it changed.
#[derive(Debug)]
pub struct Session<'a> {
    engine: &'a Engine,
    cx: Cx,
}

impl<'a> Session<'a> {
    pub(crate) fn new(engine: &'a Engine) -> Session<'a> {
        Session {
            engine,
            cx: Cx::default(),
        }
    }

    pub fn read<M: Model>(&mut self) -> Read<'_, M> {
        Read::new(self.engine, CxHandle::Borrowed(&mut self.cx), M::NAME, M::load)
    }

    pub fn read_records(&mut self, model: &str) -> Read<'_, Record> {
        Read::new(self.engine, CxHandle::Borrowed(&mut self.cx), model, Ok)
    }

    pub async fn get<M: Model>(&mut self, key: impl Into<Key>) -> Result<Option<M>> {
        self.read::<M>().get(key).await
    }

    pub async fn create<M: Model>(&mut self, entity: &mut M, scope: RelationScope) -> Result<Value> {
        let mut record = entity.to_record();
        let key = self.create_record(&mut record, scope).await?;
        *entity = M::load(record)?;
        Ok(key)
    }

    pub async fn create_record(
        &mut self,
        record: &mut Record,
        scope: RelationScope,
    ) -> Result<Value> {
        let engine = self.engine;
        let model = engine.schema.model(record.model())?;

        let ret = engine.create(&mut self.cx, model, record, scope).await;
        self.cx.end_write();
        ret
    }

    pub async fn update<M: Model>(
        &mut self,
        entity: &mut M,
        scope: RelationScope,
        depth: u8,
    ) -> Result<Value> {
        let mut record = entity.to_record();
        let key = self.update_record(&mut record, scope, depth).await?;
        *entity = M::load(record)?;
        Ok(key)
    }

    pub async fn update_record(
        &mut self,
        record: &mut Record,
        scope: RelationScope,
        depth: u8,
    ) -> Result<Value> {
        let engine = self.engine;
        let model = engine.schema.model(record.model())?;

        let ret = engine.update(&mut self.cx, model, record, scope, depth).await;
        self.cx.end_write();
        ret
    }

    pub async fn delete<M: Model>(&mut self, entity: &M, scope: RelationScope) -> Result<Option<Key>> {
        self.delete_record(&entity.to_record(), scope).await
    }

    pub async fn delete_record(
        &mut self,
        record: &Record,
        scope: RelationScope,
    ) -> Result<Option<Key>> {
        let engine = self.engine;
        let model = engine.schema.model(record.model())?;

        let ret = engine.delete(&mut self.cx, model, record, scope).await;
        self.cx.end_write();
        ret
    }

    pub async fn delete_by_key<M: Model>(
        &mut self,
        key: impl Into<Key>,
        scope: RelationScope,
    ) -> Result<Option<Key>> {
        self.delete_record_by_key(M::NAME, key, scope).await
    }

    pub async fn delete_record_by_key(
        &mut self,
        model: &str,
        key: impl Into<Key>,
        scope: RelationScope,
    ) -> Result<Option<Key>> {
        let engine = self.engine;
        let model = engine.schema.model(model)?;

        let ret = engine
            .delete_by_key(&mut self.cx, model, key.into(), scope)
            .await;
        self.cx.end_write();
        ret
    }
}
