use super::{Model, Schema};
use crate::{Error, Result};

use indexmap::IndexMap;

#[derive(Debug, Default)]
pub struct Builder {
    models: Vec<Model>,

    /// If set, prefix all table names with this string
    table_name_prefix: Option<String>,
}

impl Builder {
    pub fn new() -> Builder {
        Builder::default()
    }

    pub fn register(&mut self, model: Model) -> &mut Self {
        self.models.push(model);
        self
    }

    pub fn table_name_prefix(&mut self, prefix: &str) -> &mut Self {
        self.table_name_prefix = Some(prefix.to_string());
        self
    }

    pub fn build(&self) -> Result<Schema> {
        let mut models = IndexMap::with_capacity(self.models.len());

        for model in &self.models {
            let mut model = model.clone();

            if let Some(prefix) = &self.table_name_prefix {
                model.table = format!("{prefix}{}", model.table);

                for has_many in &mut model.has_many {
                    has_many.table = format!("{prefix}{}", has_many.table);
                }
            }

            if models.contains_key(&model.name) {
                return Err(Error::invalid_schema(format!(
                    "model `{}` is registered twice",
                    model.name
                )));
            }

            models.insert(model.name.clone(), model);
        }

        let schema = Schema {
            models,
            table_name_prefix: self.table_name_prefix.clone(),
        };

        schema.verify()?;

        Ok(schema)
    }
}
