use super::{Connect, Db};
use crate::{engine::Engine, Model, Result};

use strata_core::{driver::Driver, schema};
use tracing::debug;

/// Depth of reads that do not set one
const DEFAULT_DEPTH: u8 = 3;

pub struct Builder {
    /// Schema builder
    core: schema::Builder,

    default_depth: u8,
}

impl Builder {
    pub fn register<T: Model>(&mut self) -> &mut Self {
        let model = T::schema();
        assert_eq!(
            model.name,
            T::NAME,
            "mapping descriptor name does not match `Model::NAME`"
        );
        self.core.register(model);
        self
    }

    /// Registers a descriptor that has no Rust type. Its entities are
    /// accessed through the `*_record` operations.
    pub fn register_model(&mut self, model: schema::Model) -> &mut Self {
        self.core.register(model);
        self
    }

    /// Set the table name prefix for all tables
    pub fn table_name_prefix(&mut self, prefix: &str) -> &mut Self {
        self.core.table_name_prefix(prefix);
        self
    }

    /// Depth used by reads that do not set one.
    pub fn default_depth(&mut self, depth: u8) -> &mut Self {
        self.default_depth = depth;
        self
    }

    pub async fn connect(&mut self, url: &str) -> Result<Db> {
        self.build(Connect::new(url)?).await
    }

    pub async fn build(&mut self, driver: impl Driver) -> Result<Db> {
        let schema = self.core.build()?;
        let connection = driver.connect().await?;

        debug!(url = %driver.url(), models = schema.models().len(), "connected");

        Ok(Db {
            engine: Engine::new(schema, connection, self.default_depth),
        })
    }
}

impl Default for Builder {
    fn default() -> Builder {
        Builder {
            core: schema::Builder::default(),
            default_depth: DEFAULT_DEPTH,
        }
    }
}
