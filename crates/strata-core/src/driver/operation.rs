use crate::stmt::Query;

#[derive(Debug, Clone)]
pub enum Operation {
    /// Execute a SQL query
    QuerySql(QuerySql),

    /// Transaction control
    Transaction(Transaction),
}

#[derive(Debug, Clone)]
pub struct QuerySql {
    /// The query to execute
    pub query: Query,
}

impl QuerySql {
    pub fn new(query: Query) -> QuerySql {
        QuerySql { query }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transaction {
    Start,
    Commit,
    Rollback,
}

impl From<QuerySql> for Operation {
    fn from(value: QuerySql) -> Operation {
        Operation::QuerySql(value)
    }
}

impl From<Query> for Operation {
    fn from(value: Query) -> Operation {
        Operation::QuerySql(QuerySql::new(value))
    }
}

impl From<Transaction> for Operation {
    fn from(value: Transaction) -> Operation {
        Operation::Transaction(value)
    }
}
