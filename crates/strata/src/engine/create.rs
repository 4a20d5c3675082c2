use super::{Cx, Engine};
use crate::RelationScope;

use strata_core::{
    bail,
    schema::{Model, RelationRef},
    stmt::{Entity, Query, Record, Value},
    Result,
};

use async_recursion::async_recursion;

impl Engine {
    /// Inserts `record` and the relations it carries, returning its key.
    ///
    /// Generated keys are written back into the record and into every
    /// nested record that was created along the way.
    #[async_recursion]
    pub(crate) async fn create(
        &self,
        cx: &mut Cx,
        model: &Model,
        record: &mut Record,
        scope: RelationScope,
    ) -> Result<Value> {
        // A store-generated key that is already set means the entity exists
        if model.auto && model.key_of(record).is_some() {
            return Ok(record.value(&model.primary_key).clone());
        }

        let mut columns = vec![];
        let mut values = vec![];

        for column in model.writable_columns() {
            if model.auto && column.name == model.primary_key_column {
                continue;
            }

            let stored = match model.single_relation_for_column(&column.name) {
                Some(rel) => {
                    let Some(value) = record.get_mut(rel.field()) else {
                        continue;
                    };

                    let target = self.target(model, rel)?;
                    let key = self.create_related(cx, target, value, scope).await?;
                    let key = referenced_value(rel, value, key);
                    column.ty.to_storage(&key)?
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

            columns.push(column.name.clone());
            values.push(stored);
        }

        // Only a key: insert a row with a generated one
        if columns.is_empty() {
            columns.push(model.primary_key_column.clone());
            values.push(Value::Null);
        }

        let returning = model.auto && self.capability.insert_returning;

        let mut insert = Query::insert(columns)
            .into_table(&model.table)
            .value(values);

        if returning {
            insert = insert.returning(&model.primary_key_column);
        }

        let response = self.exec(insert).await?;

        let key = if !model.auto {
            record.value(&model.primary_key).clone()
        } else {
            let key = if returning {
                response.into_scalar()?
            } else {
                response.last_insert_id.unwrap_or_default()
            };

            let key = match model.column_by_name(&model.primary_key_column) {
                Some(column) => column.ty.from_storage(key)?,
                None => key,
            };

            if key.to_key().is_none() {
                bail!("the store returned no key for the new `{}`", model.name);
            }

            record.set(&model.primary_key, key.clone());
            key
        };

        for rel in &model.has_many {
            if rel.read_only {
                continue;
            }

            let Some(Value::List(members)) = record.get_mut(&rel.field) else {
                continue;
            };

            let target = self.target(model, RelationRef::HasMany(rel))?;

            // Field of the target that holds the owner's key
            let owner_field = if rel.is_join_table() {
                None
            } else {
                target
                    .column_by_name(&rel.self_column)
                    .map(|column| column.field.clone())
            };

            let mut keys = vec![];

            for member in members.iter_mut() {
                if let Some(field) = &owner_field {
                    if let Some(Entity::Present(record)) = member.as_entity_mut() {
                        record.set(field, key.clone());
                    }
                }

                let member_key = self.create_related(cx, target, member, scope).await?;

                if !member_key.is_null() {
                    keys.push(member_key);
                }
            }

            let Some(external) = &rel.external_column else {
                continue;
            };

            if !keys.is_empty() {
                let mut insert = Query::insert([rel.self_column.clone(), external.clone()])
                    .into_table(&rel.table);

                for member_key in keys {
                    insert = insert.value([key.clone(), member_key]);
                }

                self.exec(insert).await?;
                cx.memo.invalidate(&rel.table);
            }
        }

        Ok(key)
    }

    /// Resolves the key of a related entity, creating it when needed.
    pub(super) async fn create_related(
        &self,
        cx: &mut Cx,
        target: &Model,
        value: &mut Value,
        scope: RelationScope,
    ) -> Result<Value> {
        match value {
            Value::Entity(entity) => match &mut **entity {
                Entity::Absent { key, .. } => Ok(key.clone()),
                Entity::Present(record) => self.create(cx, target, record, scope).await,
            },
            value => Ok(value.clone()),
        }
    }
}

/// The value stored for a single relation.
///
/// A belongs-to relation declared `by` a field stores that field of the
/// target instead of its key.
pub(super) fn referenced_value(rel: RelationRef<'_>, value: &Value, key: Value) -> Value {
    let RelationRef::BelongsTo(rel) = rel else {
        return key;
    };

    match (&rel.by, value.as_entity()) {
        (Some(by), Some(Entity::Present(record))) => record.value(by).clone(),
        _ => key,
    }
}
