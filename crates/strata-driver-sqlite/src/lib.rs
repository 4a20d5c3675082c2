mod value;
pub(crate) use value::Value;

use rusqlite::Connection as RusqliteConnection;
use std::{
    borrow::Cow,
    path::{Path, PathBuf},
    sync::Arc,
};
use strata_core::{
    async_trait,
    driver::{
        operation::{Operation, Transaction},
        Capability, Driver, Response, Row,
    },
    stmt::{self, Query, QueryKind},
    Error, Result,
};
use strata_sql::Serializer;
use url::Url;

#[derive(Debug)]
pub enum Sqlite {
    File(PathBuf),
    InMemory,
}

impl Sqlite {
    /// Create a new SQLite driver with an arbitrary connection URL
    pub fn new(url: impl Into<String>) -> Result<Self> {
        let url_str = url.into();
        let url = Url::parse(&url_str).map_err(|err| {
            Error::invalid_connection_url(format!("{err}; url={url_str}"))
        })?;

        if url.scheme() != "sqlite" {
            return Err(Error::invalid_connection_url(format!(
                "connection URL does not have a `sqlite` scheme; url={url_str}"
            )));
        }

        if url.path() == ":memory:" {
            Ok(Self::InMemory)
        } else {
            Ok(Self::File(PathBuf::from(url.path())))
        }
    }

    /// Create an in-memory SQLite database
    pub fn in_memory() -> Self {
        Self::InMemory
    }

    /// Open a SQLite database at the specified file path
    pub fn open<P: AsRef<Path>>(path: P) -> Self {
        Self::File(path.as_ref().to_path_buf())
    }
}

#[async_trait]
impl Driver for Sqlite {
    fn url(&self) -> Cow<'_, str> {
        match self {
            Sqlite::InMemory => Cow::Borrowed("sqlite::memory:"),
            Sqlite::File(path) => Cow::Owned(format!("sqlite:{}", path.display())),
        }
    }

    fn capability(&self) -> &'static Capability {
        &Capability::SQLITE
    }

    async fn connect(&self) -> Result<Box<dyn strata_core::Connection>> {
        let connection = match self {
            Sqlite::File(path) => Connection::open(path)?,
            Sqlite::InMemory => Connection::in_memory()?,
        };
        Ok(Box::new(connection))
    }
}

#[derive(Debug)]
pub struct Connection {
    connection: RusqliteConnection,
}

impl Connection {
    pub fn in_memory() -> Result<Self> {
        let connection =
            RusqliteConnection::open_in_memory().map_err(Error::driver_operation_failed)?;

        Ok(Self { connection })
    }

    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let connection = RusqliteConnection::open(path).map_err(Error::driver_operation_failed)?;
        Ok(Self { connection })
    }

    fn transaction(&mut self, op: Transaction) -> Result<Response> {
        let sql = Serializer::sqlite().serialize_transaction(op);

        self.connection
            .execute_batch(sql)
            .map_err(|err| Error::statement_failed(sql, err))?;

        Ok(Response::count(0))
    }

    fn query(&mut self, query: Query) -> Result<Response> {
        let mut params: Vec<stmt::Value> = vec![];
        let sql = Serializer::sqlite().serialize(&query, &mut params)?;

        self.run(&query, &sql, params)
            .map_err(|err| Error::statement_failed(&*sql, err))
    }

    fn run(
        &self,
        query: &Query,
        sql: &str,
        params: Vec<stmt::Value>,
    ) -> rusqlite::Result<Response> {
        let mut stmt = self.connection.prepare_cached(sql)?;

        let params = params.into_iter().map(Value::from).collect::<Vec<_>>();

        if !query.returns_rows() {
            let count = stmt.execute(rusqlite::params_from_iter(params.iter()))?;
            let response = Response::count(count as _);

            if query.kind == QueryKind::Insert {
                return Ok(response.with_last_insert_id(self.connection.last_insert_rowid()));
            }

            return Ok(response);
        }

        let columns: Arc<[String]> = stmt
            .column_names()
            .into_iter()
            .map(str::to_string)
            .collect();

        let mut rows = stmt.query(rusqlite::params_from_iter(params.iter()))?;
        let mut ret = vec![];

        while let Some(row) = rows.next()? {
            let mut values = Vec::with_capacity(columns.len());

            for index in 0..columns.len() {
                values.push(Value::from_sql(row, index)?.into_inner());
            }

            ret.push(Row::new(columns.clone(), values));
        }

        Ok(Response::rows(ret))
    }
}

#[async_trait]
impl strata_core::driver::Connection for Connection {
    fn capability(&self) -> &'static Capability {
        &Capability::SQLITE
    }

    async fn exec(&mut self, op: Operation) -> Result<Response> {
        match op {
            Operation::QuerySql(op) => self.query(op.query),
            Operation::Transaction(op) => self.transaction(op),
        }
    }

    async fn execute_batch(&mut self, sql: &str) -> Result<()> {
        self.connection
            .execute_batch(sql)
            .map_err(|err| Error::statement_failed(sql, err))
    }
}
