use crate::{stmt::Value, Result};

use std::sync::Arc;

#[derive(Debug, Clone)]
pub struct Response {
    pub rows: Rows,

    /// Key generated by the last `INSERT`, when the store reports one
    pub last_insert_id: Option<Value>,
}

#[derive(Debug, Clone)]
pub enum Rows {
    /// Number of rows impacted by the operation
    Count(u64),

    /// Operation result
    Values(Vec<Row>),
}

/// One result row; values are addressable by column label or position.
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    columns: Arc<[String]>,
    values: Vec<Value>,
}

impl Response {
    pub fn count(count: u64) -> Self {
        Self {
            rows: Rows::Count(count),
            last_insert_id: None,
        }
    }

    pub fn rows(rows: Vec<Row>) -> Self {
        Self {
            rows: Rows::Values(rows),
            last_insert_id: None,
        }
    }

    pub fn with_last_insert_id(mut self, id: impl Into<Value>) -> Self {
        self.last_insert_id = Some(id.into());
        self
    }

    /// Returns the result rows; an affected-row count yields none.
    pub fn into_rows(self) -> Vec<Row> {
        match self.rows {
            Rows::Values(rows) => rows,
            Rows::Count(_) => vec![],
        }
    }

    /// Returns the first column of the first row.
    pub fn into_scalar(self) -> Result<Value> {
        match self.rows {
            Rows::Values(rows) => Ok(rows
                .into_iter()
                .next()
                .and_then(|row| row.values.into_iter().next())
                .unwrap_or_default()),
            Rows::Count(count) => {
                crate::bail!("expected a row, the statement affected {count} row(s)")
            }
        }
    }

    /// Number of affected rows, or the number of returned rows.
    pub fn affected(&self) -> u64 {
        match &self.rows {
            Rows::Count(count) => *count,
            Rows::Values(rows) => rows.len() as u64,
        }
    }
}

impl Rows {
    pub fn is_count(&self) -> bool {
        matches!(self, Self::Count(_))
    }

    pub fn is_values(&self) -> bool {
        matches!(self, Self::Values(_))
    }
}

impl Row {
    #[track_caller]
    pub fn new(columns: Arc<[String]>, values: Vec<Value>) -> Row {
        assert_eq!(columns.len(), values.len(), "row width mismatch");
        Row { columns, values }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Value of the column labelled `name`.
    pub fn get(&self, name: &str) -> Option<&Value> {
        let index = self.columns.iter().position(|column| column == name)?;
        self.values.get(index)
    }

    pub fn get_index(&self, index: usize) -> Option<&Value> {
        self.values.get(index)
    }

    pub fn into_values(self) -> Vec<Value> {
        self.values
    }
}
