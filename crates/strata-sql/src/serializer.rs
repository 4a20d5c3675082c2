#[macro_use]
mod fmt;
use fmt::ToSql;

mod delim;
use delim::{Comma, Delimited};

mod flavor;
pub use flavor::Flavor;
use flavor::Component;

mod ident;
use ident::Ident;

mod params;
pub use params::{Params, Placeholder};

// Fragment serializers
mod expr;
mod query;

use strata_core::{
    driver::{operation::Transaction, Dialect},
    stmt::Query,
    Error, Result,
};

/// Serialize a query to a SQL string
#[derive(Debug, Clone, Copy)]
pub struct Serializer {
    /// The database flavor handles the differences between SQL dialects and
    /// supported features.
    flavor: Flavor,
}

struct Formatter<'a, T> {
    /// Handle to the serializer
    serializer: &'a Serializer,

    /// Where to write the serialized SQL
    dst: &'a mut String,

    /// Where to store parameters
    params: &'a mut T,

    /// First error hit while rendering. Rendering continues so the fragment
    /// serializers stay infallible, the error is returned at the end.
    error: Option<Error>,
}

impl Serializer {
    pub fn new(flavor: Flavor) -> Serializer {
        Serializer { flavor }
    }

    pub fn sqlite() -> Serializer {
        Serializer::new(Flavor::Sqlite)
    }

    pub fn postgresql() -> Serializer {
        Serializer::new(Flavor::Postgresql)
    }

    pub fn mysql() -> Serializer {
        Serializer::new(Flavor::Mysql)
    }

    pub fn for_dialect(dialect: Dialect) -> Serializer {
        Serializer::new(match dialect {
            Dialect::Sqlite => Flavor::Sqlite,
            Dialect::Postgresql => Flavor::Postgresql,
            Dialect::Mysql => Flavor::Mysql,
        })
    }

    pub fn flavor(&self) -> Flavor {
        self.flavor
    }

    /// Renders `query` in a single pass, pushing bound values into `params`.
    ///
    /// # Panics
    ///
    /// Panics when the query carries a clause the flavor has no place for,
    /// e.g. `RETURNING` on MySQL.
    pub fn serialize(&self, query: &Query, params: &mut impl Params) -> Result<String> {
        let mut ret = String::new();

        let mut fmt = Formatter {
            serializer: self,
            dst: &mut ret,
            params,
            error: None,
        };

        query::Statement(query).to_sql(&mut fmt);

        if let Some(err) = fmt.error {
            return Err(err);
        }

        Ok(ret)
    }

    /// Serialize a transaction control operation to a SQL string.
    pub fn serialize_transaction(&self, op: Transaction) -> &'static str {
        match (op, self.flavor) {
            (Transaction::Start, Flavor::Mysql) => "START TRANSACTION",
            (Transaction::Start, _) => "BEGIN",
            (Transaction::Commit, _) => "COMMIT",
            (Transaction::Rollback, _) => "ROLLBACK",
        }
    }

    /// Quotes an identifier, honouring the function and wildcard exceptions.
    pub fn quote_ident(&self, ident: &str) -> String {
        let mut ret = String::new();
        let mut params: Vec<strata_core::stmt::Value> = vec![];
        let mut fmt = Formatter {
            serializer: self,
            dst: &mut ret,
            params: &mut params,
            error: None,
        };

        Ident(ident).to_sql(&mut fmt);
        ret
    }

    /// Quotes a string literal for inclusion in raw SQL.
    pub fn quote_literal(&self, literal: &str) -> String {
        self.flavor.quote_literal(literal)
    }
}

impl<T> Formatter<'_, T> {
    fn fail(&mut self, err: Error) {
        if self.error.is_none() {
            self.error = Some(err);
        }
    }
}
