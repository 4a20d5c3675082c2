use super::{create::referenced_value, key_param, Cx, Engine};
use crate::RelationScope;

use strata_core::{
    schema::{HasMany, Model, RelationRef},
    stmt::{Entity, Key, Op, Query, Record, Value},
    Result,
};

use async_recursion::async_recursion;
use indexmap::IndexSet;

impl Engine {
    /// Writes `record` back, creating it when it has no key yet.
    ///
    /// Fields missing from the record are left untouched. Has-many members
    /// are only written with the full relation scope.
    #[async_recursion]
    pub(crate) async fn update(
        &self,
        cx: &mut Cx,
        model: &Model,
        record: &mut Record,
        scope: RelationScope,
        depth: u8,
    ) -> Result<Value> {
        let Some(key) = model.key_of(record) else {
            return self.create(cx, model, record, scope).await;
        };

        let key_value = record.value(&model.primary_key).clone();

        if depth < 1 {
            return Ok(key_value);
        }

        if scope.contains(RelationScope::ALL) {
            for rel in &model.has_many {
                if rel.read_only {
                    continue;
                }

                let Some(Value::List(members)) = record.get_mut(&rel.field) else {
                    continue;
                };

                let target = self.target(model, RelationRef::HasMany(rel))?;
                let owner_field = if rel.is_join_table() {
                    None
                } else {
                    target
                        .column_by_name(&rel.self_column)
                        .map(|column| column.field.clone())
                };

                let mut keys = IndexSet::new();

                for member in members.iter_mut() {
                    if let Some(field) = &owner_field {
                        if let Some(Entity::Present(record)) = member.as_entity_mut() {
                            record.set(field, key_value.clone());
                        }
                    }

                    let member_key = self
                        .update_related(cx, target, member, scope, depth - 1)
                        .await?;

                    if let Some(member_key) = member_key.to_key() {
                        keys.insert(member_key);
                    }
                }

                if rel.is_join_table() {
                    self.sync_join_table(cx, rel, &key_value, keys).await?;
                }
            }
        }

        let mut update = Query::update(&model.table);

        for column in model.writable_columns() {
            if column.name == model.primary_key_column {
                continue;
            }

            let stored = match model.single_relation_for_column(&column.name) {
                Some(rel) => {
                    let Some(value) = record.get_mut(rel.field()) else {
                        continue;
                    };

                    let target = self.target(model, rel)?;
                    let traverse = match rel {
                        RelationRef::OwnsOne(_) => scope.contains(RelationScope::OWNS_ONE),
                        RelationRef::BelongsTo(_) => scope.contains(RelationScope::BELONGS_TO),
                        RelationRef::HasMany(_) => false,
                    };

                    let related = if traverse {
                        self.update_related(cx, target, value, scope, depth - 1)
                            .await?
                    } else {
                        self.reference(cx, target, value, scope).await?
                    };

                    let related = referenced_value(rel, value, related);
                    column.ty.to_storage(&related)?
                }
                None => {
                    let Some(value) = record.get(&column.field) else {
                        continue;
                    };

                    column.ty.to_storage(value).map_err(|err| {
                        err.context(strata_core::err!("field `{}.{}`", model.name, column.field))
                    })?
                }
            };

            update = update.set(&column.name, stored);
        }

        if !update.set.is_empty() {
            let update = update.where_(
                &model.primary_key_column,
                Op::Eq,
                key_param(model, &key_value)?,
            );
            self.exec(update).await?;
        }

        cx.cache.evict(&model.name, &key);

        Ok(key_value)
    }

    async fn update_related(
        &self,
        cx: &mut Cx,
        target: &Model,
        value: &mut Value,
        scope: RelationScope,
        depth: u8,
    ) -> Result<Value> {
        match value {
            Value::Entity(entity) => match &mut **entity {
                Entity::Absent { key, .. } => Ok(key.clone()),
                Entity::Present(record) => self.update(cx, target, record, scope, depth).await,
            },
            value => Ok(value.clone()),
        }
    }

    /// Key of a related entity that is not written itself. Entities without
    /// a key are created.
    async fn reference(
        &self,
        cx: &mut Cx,
        target: &Model,
        value: &mut Value,
        scope: RelationScope,
    ) -> Result<Value> {
        if let Some(Entity::Present(record)) = value.as_entity() {
            if target.key_of(record).is_some() {
                return Ok(record.value(&target.primary_key).clone());
            }
        }

        self.create_related(cx, target, value, scope).await
    }

    /// Applies the difference between the stored links of `owner` and
    /// `members` to the join table.
    async fn sync_join_table(
        &self,
        cx: &mut Cx,
        rel: &HasMany,
        owner: &Value,
        members: IndexSet<Key>,
    ) -> Result<()> {
        let Some(external) = &rel.external_column else {
            return Ok(());
        };

        let current: IndexSet<Key> = self
            .exec(
                Query::select([external.as_str()])
                    .from(&rel.table)
                    .where_(&rel.self_column, Op::Eq, owner.clone()),
            )
            .await?
            .into_rows()
            .iter()
            .filter_map(|row| row.get_index(0).and_then(Value::to_key))
            .collect();

        let (removed, added) = diff(&current, &members);

        for member in &removed {
            let delete = Query::delete()
                .from(&rel.table)
                .where_(&rel.self_column, Op::Eq, owner.clone())
                .and_where(external, Op::Eq, member.to_value());
            self.exec(delete).await?;
        }

        if !added.is_empty() {
            let mut insert =
                Query::insert([rel.self_column.clone(), external.clone()]).into_table(&rel.table);

            for member in &added {
                insert = insert.value([owner.clone(), member.to_value()]);
            }

            self.exec(insert).await?;
        }

        if !removed.is_empty() || !added.is_empty() {
            cx.memo.invalidate(&rel.table);
        }

        Ok(())
    }
}

/// Returns the links to remove and the links to add, in membership order.
fn diff(current: &IndexSet<Key>, members: &IndexSet<Key>) -> (Vec<Key>, Vec<Key>) {
    let removed = current.difference(members).cloned().collect();
    let added = members.difference(current).cloned().collect();
    (removed, added)
}
