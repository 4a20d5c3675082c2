use crate::logging_driver::DriverOp;
use std::sync::{Arc, Mutex};
use strata_core::{
    driver::Operation,
    stmt::{Query, QueryKind},
};

/// A wrapper around the operations log that provides a clean API for tests
pub struct ExecLog {
    ops: Arc<Mutex<Vec<DriverOp>>>,
}

impl ExecLog {
    pub(crate) fn new(ops: Arc<Mutex<Vec<DriverOp>>>) -> Self {
        Self { ops }
    }

    /// Get the number of logged operations
    pub fn len(&self) -> usize {
        self.ops.lock().unwrap().len()
    }

    /// Check if the log is empty
    pub fn is_empty(&self) -> bool {
        self.ops.lock().unwrap().is_empty()
    }

    /// Forget everything logged so far
    pub fn clear(&self) {
        self.ops.lock().unwrap().clear();
    }

    /// The queries executed so far, in order
    pub fn queries(&self) -> Vec<Query> {
        self.ops
            .lock()
            .unwrap()
            .iter()
            .filter_map(|op| match &op.operation {
                Operation::QuerySql(sql) => Some(sql.query.clone()),
                Operation::Transaction(_) => None,
            })
            .collect()
    }

    /// Queries of `kind` that target `table`
    pub fn queries_on(&self, kind: QueryKind, table: &str) -> Vec<Query> {
        self.queries()
            .into_iter()
            .filter(|query| query.kind == kind && targets(query, table))
            .collect()
    }

    /// Count queries of the given kind
    pub fn count(&self, kind: QueryKind) -> usize {
        self.queries()
            .iter()
            .filter(|query| query.kind == kind)
            .count()
    }

    pub fn selects(&self) -> usize {
        self.count(QueryKind::Select)
    }

    pub fn inserts(&self) -> usize {
        self.count(QueryKind::Insert)
    }

    pub fn updates(&self) -> usize {
        self.count(QueryKind::Update)
    }

    pub fn deletes(&self) -> usize {
        self.count(QueryKind::Delete)
    }

    /// Check if any operation matches the given predicate
    pub fn any<F>(&self, predicate: F) -> bool
    where
        F: Fn(&Operation) -> bool,
    {
        self.ops
            .lock()
            .unwrap()
            .iter()
            .any(|op| predicate(&op.operation))
    }
}

fn targets(query: &Query, table: &str) -> bool {
    query
        .from
        .first()
        .is_some_and(|from| from.name == table)
}
