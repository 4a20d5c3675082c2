use super::{Model, Schema};
use crate::{Error, Result};

use std::collections::HashSet;

struct Verify<'a> {
    schema: &'a Schema,
}

impl Schema {
    pub(super) fn verify(&self) -> Result<()> {
        Verify { schema: self }.verify()
    }
}

impl Verify<'_> {
    fn verify(&self) -> Result<()> {
        for model in self.schema.models() {
            self.verify_primary_key(model)?;
            self.verify_fields_are_unique(model)?;
            self.verify_single_relations(model)?;
            self.verify_has_many(model)?;
        }

        Ok(())
    }

    fn verify_primary_key(&self, model: &Model) -> Result<()> {
        if model.primary_key.is_empty() {
            return Err(invalid(model, "no primary key declared"));
        }

        match model.column_by_name(&model.primary_key_column) {
            Some(column) if column.field == model.primary_key => Ok(()),
            _ => Err(invalid(
                model,
                format!("primary key column `{}` is not mapped", model.primary_key_column),
            )),
        }
    }

    fn verify_fields_are_unique(&self, model: &Model) -> Result<()> {
        let mut columns = HashSet::new();

        for column in &model.columns {
            if !columns.insert(&column.name) {
                return Err(invalid(model, format!("column `{}` is declared twice", column.name)));
            }
        }

        let mut relations = HashSet::new();
        let fields = model
            .owns_one
            .iter()
            .map(|rel| &rel.field)
            .chain(model.belongs_to.iter().map(|rel| &rel.field))
            .chain(model.has_many.iter().map(|rel| &rel.field));

        for field in fields {
            if !relations.insert(field) {
                return Err(invalid(model, format!("relation `{field}` is declared twice")));
            }
        }

        Ok(())
    }

    fn verify_single_relations(&self, model: &Model) -> Result<()> {
        let single = model
            .owns_one
            .iter()
            .map(|rel| (&rel.field, &rel.target, &rel.column, None))
            .chain(
                model
                    .belongs_to
                    .iter()
                    .map(|rel| (&rel.field, &rel.target, &rel.column, rel.by.as_ref())),
            );

        for (field, target, column, by) in single {
            let target = self.target(model, field, target)?;

            if model.column_by_name(column).is_none() {
                return Err(invalid(
                    model,
                    format!("relation `{field}` is stored in unmapped column `{column}`"),
                ));
            }

            if let Some(by) = by {
                if target.column_for_field(by).is_none() {
                    return Err(invalid(
                        model,
                        format!("relation `{field}` references unknown field `{}.{by}`", target.name),
                    ));
                }
            }
        }

        Ok(())
    }

    fn verify_has_many(&self, model: &Model) -> Result<()> {
        for rel in &model.has_many {
            let target = self.target(model, &rel.field, &rel.target)?;

            if rel.is_join_table() {
                continue;
            }

            if rel.table != target.table {
                return Err(invalid(
                    model,
                    format!(
                        "relation `{}` has no join table but names table `{}` instead of `{}`",
                        rel.field, rel.table, target.table
                    ),
                ));
            }

            if target.column_by_name(&rel.self_column).is_none() {
                return Err(invalid(
                    model,
                    format!(
                        "relation `{}` uses unmapped foreign key `{}.{}`",
                        rel.field, target.name, rel.self_column
                    ),
                ));
            }
        }

        Ok(())
    }

    fn target(&self, model: &Model, field: &str, target: &str) -> Result<&Model> {
        self.schema.model(target).map_err(|err| {
            err.context(Error::from_args(format_args!(
                "relation `{}.{field}`",
                model.name
            )))
        })
    }
}

fn invalid(model: &Model, message: impl std::fmt::Display) -> Error {
    Error::invalid_schema(format!("model `{}`: {message}", model.name))
}
