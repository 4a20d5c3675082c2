use super::{key_param, Clauses, Cx, Engine};
use crate::RelationScope;

use strata_core::{
    schema::{Model, RelationRef},
    stmt::{Entity, Key, Op, Query, Record, Value},
    Result,
};

use async_recursion::async_recursion;

impl Engine {
    /// Deletes the entity of `record`, cascading to the persisted members
    /// it carries unless the scope is `NONE` or includes `REFERENCE`.
    #[async_recursion]
    pub(crate) async fn delete(
        &self,
        cx: &mut Cx,
        model: &Model,
        record: &Record,
        scope: RelationScope,
    ) -> Result<Option<Key>> {
        let Some(key) = model.key_of(record) else {
            return Ok(None);
        };

        let key_value = record.value(&model.primary_key).clone();
        let cascade = scope.cascades();

        if cascade {
            for rel in &model.has_many {
                if rel.read_only {
                    continue;
                }

                // Links go first, they reference both sides
                if rel.is_join_table() {
                    let delete = Query::delete().from(&rel.table).where_(
                        &rel.self_column,
                        Op::Eq,
                        key_value.clone(),
                    );
                    self.exec(delete).await?;
                    cx.memo.invalidate(&rel.table);
                }

                let Some(Value::List(members)) = record.get(&rel.field) else {
                    continue;
                };

                let target = self.target(model, RelationRef::HasMany(rel))?;

                for member in members {
                    if let Some(Entity::Present(member)) = member.as_entity() {
                        self.delete(cx, target, member, scope).await?;
                    }
                }
            }
        }

        let delete = Query::delete().from(&model.table).where_(
            &model.primary_key_column,
            Op::Eq,
            key_param(model, &key_value)?,
        );
        self.exec(delete).await?;

        if cascade && scope.contains(RelationScope::OWNS_ONE) {
            for rel in &model.owns_one {
                let Some(Entity::Present(owned)) = record.value(&rel.field).as_entity() else {
                    continue;
                };

                let target = self.target(model, RelationRef::OwnsOne(rel))?;
                self.delete(cx, target, owned, scope).await?;
            }
        }

        cx.cache.evict(&model.name, &key);

        Ok(Some(key))
    }

    /// Loads the entity with its direct relations, then deletes it.
    pub(crate) async fn delete_by_key(
        &self,
        cx: &mut Cx,
        model: &Model,
        key: Key,
        scope: RelationScope,
    ) -> Result<Option<Key>> {
        let load_scope = if scope.cascades() {
            scope & RelationScope::ALL
        } else {
            RelationScope::NONE
        };

        let loaded = self
            .get_many(cx, model, &[key], 2, load_scope, Clauses::default())
            .await?;

        match loaded.into_values().next() {
            Some(Entity::Present(record)) => self.delete(cx, model, &record, scope).await,
            _ => Ok(None),
        }
    }
}
