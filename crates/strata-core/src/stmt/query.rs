use super::{
    expr::compare, Condition, Connective, Direction, Expr, Filter, IntoExpr, Join, JoinKind, Op,
    OrderBy,
};
use crate::driver::{operation::QuerySql, Connection, Operation, Response};

/// The statement kind a [`Query`] renders as.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryKind {
    Select,
    Insert,
    Update,
    Delete,

    /// Literal SQL, bypasses clause composition
    Raw,
}

/// A table referenced in `FROM`, `INTO`, `UPDATE` or a join.
#[derive(Debug, Clone, PartialEq)]
pub struct TableRef {
    pub name: String,
    pub alias: Option<String>,
}

/// One entry of a select list.
#[derive(Debug, Clone, PartialEq)]
pub struct Selection {
    pub expr: Expr,
    pub alias: Option<String>,
}

/// A single top-level SQL statement under construction.
///
/// Queries are built with a fluent, by-value API and rendered once by a
/// flavor-specific serializer. Clauses that do not belong to the statement
/// kind are rejected eagerly: calling `set` on a `SELECT` is a bug in the
/// caller and panics.
#[derive(Debug, Clone, PartialEq)]
pub struct Query {
    pub kind: QueryKind,

    pub distinct: bool,

    /// `SELECT` list
    pub select: Vec<Selection>,

    /// Source tables. For `INSERT` and `UPDATE` this is the single target.
    pub from: Vec<TableRef>,

    /// `INSERT` column list
    pub columns: Vec<String>,

    /// `INSERT` rows
    pub values: Vec<Vec<Expr>>,

    /// `UPDATE` assignments
    pub set: Vec<(String, Expr)>,

    pub joins: Vec<Join>,

    /// `WHERE` clause
    pub filter: Filter,

    pub group_by: Vec<String>,

    pub order_by: Vec<OrderBy>,

    pub limit: Option<u64>,

    pub offset: Option<u64>,

    pub returning: Vec<String>,

    /// SQL of a `Raw` query
    pub raw: String,
}

impl Query {
    fn new(kind: QueryKind) -> Query {
        Query {
            kind,
            distinct: false,
            select: vec![],
            from: vec![],
            columns: vec![],
            values: vec![],
            set: vec![],
            joins: vec![],
            filter: Filter::default(),
            group_by: vec![],
            order_by: vec![],
            limit: None,
            offset: None,
            returning: vec![],
            raw: String::new(),
        }
    }

    pub fn select<I, S>(columns: I) -> Query
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut query = Query::new(QueryKind::Select);
        query.select = columns
            .into_iter()
            .map(|column| Selection {
                expr: Expr::Column(column.into()),
                alias: None,
            })
            .collect();
        query
    }

    /// `SELECT COUNT(*) FROM table`
    pub fn count(table: impl Into<String>) -> Query {
        Query::select(["COUNT(*)"]).from(table)
    }

    pub fn insert<I, S>(columns: I) -> Query
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut query = Query::new(QueryKind::Insert);
        query.columns = columns.into_iter().map(Into::into).collect();
        query
    }

    pub fn update(table: impl Into<String>) -> Query {
        let mut query = Query::new(QueryKind::Update);
        query.from.push(TableRef {
            name: table.into(),
            alias: None,
        });
        query
    }

    pub fn delete() -> Query {
        Query::new(QueryKind::Delete)
    }

    pub fn raw(sql: impl Into<String>) -> Query {
        let mut query = Query::new(QueryKind::Raw);
        query.raw = sql.into();
        query
    }

    /// `true` when executing the query produces rows.
    pub fn returns_rows(&self) -> bool {
        match self.kind {
            QueryKind::Select => true,
            QueryKind::Raw => {
                let head = self.raw.trim_start();
                head.get(..6)
                    .is_some_and(|head| head.eq_ignore_ascii_case("select"))
            }
            _ => !self.returning.is_empty(),
        }
    }

    #[track_caller]
    fn expect_kind(&self, clause: &str, kinds: &[QueryKind]) {
        assert!(
            kinds.contains(&self.kind),
            "`{clause}` is not supported for {:?} queries",
            self.kind
        );
    }

    #[track_caller]
    pub fn select_as(mut self, column: impl Into<String>, alias: impl Into<String>) -> Query {
        self.expect_kind("SELECT", &[QueryKind::Select]);
        self.select.push(Selection {
            expr: Expr::Column(column.into()),
            alias: Some(alias.into()),
        });
        self
    }

    /// Adds an arbitrary expression, e.g. a sub-select, to the select list.
    #[track_caller]
    pub fn select_expr(mut self, expr: impl IntoExpr, alias: Option<&str>) -> Query {
        self.expect_kind("SELECT", &[QueryKind::Select]);
        self.select.push(Selection {
            expr: expr.into_expr(),
            alias: alias.map(str::to_string),
        });
        self
    }

    #[track_caller]
    pub fn distinct(mut self) -> Query {
        self.expect_kind("DISTINCT", &[QueryKind::Select]);
        self.distinct = true;
        self
    }

    #[track_caller]
    pub fn from(self, table: impl Into<String>) -> Query {
        self.push_from(table.into(), None)
    }

    #[track_caller]
    pub fn from_as(self, table: impl Into<String>, alias: impl Into<String>) -> Query {
        self.push_from(table.into(), Some(alias.into()))
    }

    #[track_caller]
    fn push_from(mut self, name: String, alias: Option<String>) -> Query {
        self.expect_kind("FROM", &[QueryKind::Select, QueryKind::Delete]);
        self.from.push(TableRef { name, alias });
        self
    }

    /// Sets the `INSERT` target table.
    #[track_caller]
    pub fn into_table(mut self, table: impl Into<String>) -> Query {
        self.expect_kind("INTO", &[QueryKind::Insert]);
        self.from = vec![TableRef {
            name: table.into(),
            alias: None,
        }];
        self
    }

    /// Appends one `INSERT` row. The row must match the column list.
    #[track_caller]
    pub fn value<I>(mut self, row: I) -> Query
    where
        I: IntoIterator,
        I::Item: IntoExpr,
    {
        self.expect_kind("VALUES", &[QueryKind::Insert]);
        let row: Vec<_> = row.into_iter().map(IntoExpr::into_expr).collect();
        assert_eq!(
            row.len(),
            self.columns.len(),
            "INSERT row width does not match the column list"
        );
        self.values.push(row);
        self
    }

    #[track_caller]
    pub fn set(mut self, column: impl Into<String>, value: impl IntoExpr) -> Query {
        self.expect_kind("SET", &[QueryKind::Update]);
        self.set.push((column.into(), value.into_expr()));
        self
    }

    #[track_caller]
    pub fn where_(self, column: impl Into<String>, op: Op, value: impl IntoExpr) -> Query {
        self.and_where(column, op, value)
    }

    #[track_caller]
    pub fn and_where(mut self, column: impl Into<String>, op: Op, value: impl IntoExpr) -> Query {
        self.expect_filterable();
        self.filter.push(Connective::And, compare(column, op, value));
        self
    }

    #[track_caller]
    pub fn or_where(mut self, column: impl Into<String>, op: Op, value: impl IntoExpr) -> Query {
        self.expect_filterable();
        self.filter.push(Connective::Or, compare(column, op, value));
        self
    }

    /// Adds a parenthesised group of conditions.
    #[track_caller]
    pub fn where_group(mut self, connective: Connective, group: Filter) -> Query {
        self.expect_filterable();
        if !group.is_empty() {
            self.filter.push(connective, Condition::Group(group));
        }
        self
    }

    #[track_caller]
    fn expect_filterable(&self) {
        self.expect_kind(
            "WHERE",
            &[QueryKind::Select, QueryKind::Update, QueryKind::Delete],
        );
    }

    #[track_caller]
    pub fn join(self, table: impl Into<String>) -> Query {
        self.push_join(JoinKind::Inner, table.into(), None)
    }

    #[track_caller]
    pub fn left_join(self, table: impl Into<String>) -> Query {
        self.push_join(JoinKind::Left, table.into(), None)
    }

    #[track_caller]
    pub fn right_join(self, table: impl Into<String>) -> Query {
        self.push_join(JoinKind::Right, table.into(), None)
    }

    #[track_caller]
    pub fn join_as(
        self,
        kind: JoinKind,
        table: impl Into<String>,
        alias: impl Into<String>,
    ) -> Query {
        self.push_join(kind, table.into(), Some(alias.into()))
    }

    #[track_caller]
    fn push_join(mut self, kind: JoinKind, name: String, alias: Option<String>) -> Query {
        self.expect_kind("JOIN", &[QueryKind::Select]);
        self.joins.push(Join {
            kind,
            table: TableRef { name, alias },
            on: Filter::default(),
        });
        self
    }

    /// Adds a column-to-column condition to the most recent join.
    #[track_caller]
    pub fn on(self, lhs: impl Into<String>, op: Op, rhs: impl Into<String>) -> Query {
        self.push_on(Connective::And, lhs.into(), op, Expr::Column(rhs.into()))
    }

    #[track_caller]
    pub fn or_on(self, lhs: impl Into<String>, op: Op, rhs: impl Into<String>) -> Query {
        self.push_on(Connective::Or, lhs.into(), op, Expr::Column(rhs.into()))
    }

    /// Adds a column-to-value condition to the most recent join.
    #[track_caller]
    pub fn on_value(self, lhs: impl Into<String>, op: Op, value: impl IntoExpr) -> Query {
        self.push_on(Connective::And, lhs.into(), op, value.into_expr())
    }

    #[track_caller]
    fn push_on(mut self, connective: Connective, lhs: String, op: Op, rhs: Expr) -> Query {
        let Some(join) = self.joins.last_mut() else {
            panic!("`ON` requires a preceding join");
        };
        join.on.push(
            connective,
            Condition::Compare {
                lhs: Expr::Column(lhs),
                op,
                rhs,
            },
        );
        self
    }

    #[track_caller]
    pub fn group_by(mut self, column: impl Into<String>) -> Query {
        self.expect_kind("GROUP BY", &[QueryKind::Select]);
        self.group_by.push(column.into());
        self
    }

    #[track_caller]
    pub fn order_by(mut self, column: impl Into<String>, direction: Direction) -> Query {
        self.expect_kind("ORDER BY", &[QueryKind::Select]);
        self.order_by.push(OrderBy {
            expr: Expr::Column(column.into()),
            direction,
        });
        self
    }

    #[track_caller]
    pub fn order_by_random(mut self) -> Query {
        self.expect_kind("ORDER BY", &[QueryKind::Select]);
        self.order_by.push(OrderBy {
            expr: Expr::Random,
            direction: Direction::Asc,
        });
        self
    }

    #[track_caller]
    pub fn limit(mut self, limit: u64) -> Query {
        self.expect_kind("LIMIT", &[QueryKind::Select]);
        self.limit = Some(limit);
        self
    }

    #[track_caller]
    pub fn offset(mut self, offset: u64) -> Query {
        self.expect_kind("OFFSET", &[QueryKind::Select]);
        self.offset = Some(offset);
        self
    }

    #[track_caller]
    pub fn returning(mut self, column: impl Into<String>) -> Query {
        self.expect_kind(
            "RETURNING",
            &[QueryKind::Insert, QueryKind::Update, QueryKind::Delete],
        );
        self.returning.push(column.into());
        self
    }

    /// Sends the query through `connection`.
    pub async fn execute(self, connection: &mut dyn Connection) -> crate::Result<Response> {
        connection
            .exec(Operation::QuerySql(QuerySql::new(self)))
            .await
    }
}
