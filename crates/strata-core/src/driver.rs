mod capability;
pub use capability::{Capability, Dialect};

mod response;
pub use response::{Response, Row, Rows};

pub mod operation;
pub use operation::Operation;

use crate::async_trait;

use std::{borrow::Cow, fmt::Debug};

#[async_trait]
pub trait Driver: Debug + Send + Sync + 'static {
    /// The URL the driver connects to.
    fn url(&self) -> Cow<'_, str>;

    /// Describes the driver's capability, which selects the SQL flavor.
    fn capability(&self) -> &'static Capability;

    /// Opens a new connection.
    async fn connect(&self) -> crate::Result<Box<dyn Connection>>;
}

/// One physical handle to the store.
///
/// The mapper needs nothing beyond "run this statement and give me the rows
/// or the affected count", plus the last generated key.
#[async_trait]
pub trait Connection: Debug + Send + 'static {
    fn capability(&self) -> &'static Capability;

    /// Executes a database operation.
    async fn exec(&mut self, op: Operation) -> crate::Result<Response>;

    /// Executes a string of `;`-separated statements without parameters,
    /// e.g. DDL.
    async fn execute_batch(&mut self, sql: &str) -> crate::Result<()>;
}
