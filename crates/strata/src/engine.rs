mod create;
mod cx;
pub(crate) use cx::{Cx, CxHandle};

mod delete;
mod directive;
pub(crate) use directive::{Directives, Scoped};

mod read;
pub(crate) use read::{root_alias, Clauses};

mod update;

use strata_core::{
    driver::{operation::Transaction, Capability, Operation, Response},
    schema::{Model, RelationRef},
    stmt::{Query, Value},
    Connection, Result, Schema,
};
use strata_sql::Serializer;

use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, warn, Level};

/// Runs mapper operations against one connection.
#[derive(Debug, Clone)]
pub(crate) struct Engine {
    /// The schema being managed by this DB instance
    pub(crate) schema: Arc<Schema>,

    connection: Arc<Mutex<Box<dyn Connection>>>,

    /// The capability of the store the connection talks to
    pub(crate) capability: &'static Capability,

    /// Renders statements for the log
    serializer: Serializer,

    /// Depth of reads that do not set one
    pub(crate) default_depth: u8,
}

impl Engine {
    pub(crate) fn new(
        schema: Schema,
        connection: Box<dyn Connection>,
        default_depth: u8,
    ) -> Engine {
        let capability = connection.capability();

        Engine {
            schema: Arc::new(schema),
            connection: Arc::new(Mutex::new(connection)),
            capability,
            serializer: Serializer::for_dialect(capability.dialect),
            default_depth,
        }
    }

    /// Every statement the mapper issues goes through here.
    pub(crate) async fn exec(&self, query: Query) -> Result<Response> {
        if tracing::enabled!(Level::DEBUG) {
            let mut params = Vec::<Value>::new();
            if let Ok(sql) = self.serializer.serialize(&query, &mut params) {
                debug!(sql = %sql, params = params.len(), "exec");
            }
        }

        let mut connection = self.connection.lock().await;
        let ret = connection.exec(query.into()).await;

        if let Err(err) = &ret {
            warn!(sql = err.sql().unwrap_or_default(), error = %err, "statement failed");
        }

        ret
    }

    pub(crate) async fn transaction(&self, op: Transaction) -> Result<()> {
        debug!(sql = self.serializer.serialize_transaction(op), "exec");

        let mut connection = self.connection.lock().await;
        connection.exec(Operation::Transaction(op)).await?;
        Ok(())
    }

    pub(crate) async fn execute_batch(&self, sql: &str) -> Result<()> {
        debug!(sql, "exec batch");

        let mut connection = self.connection.lock().await;
        connection.execute_batch(sql).await
    }

    /// Target model of a relation declared on `model`.
    fn target(&self, model: &Model, rel: RelationRef<'_>) -> Result<&Model> {
        self.schema.model(rel.target()).map_err(|err| {
            err.context(strata_core::err!("relation `{}.{}`", model.name, rel.field()))
        })
    }
}

/// Key value bound for the primary key column of `model`.
fn key_param(model: &Model, key: &Value) -> Result<Value> {
    match model.column_by_name(&model.primary_key_column) {
        Some(column) => column.ty.to_storage(key),
        None => Ok(key.clone()),
    }
}
