use super::{Query, Value};

use chrono::{DateTime, Utc};

/// An operand in a select list, predicate, assignment or ordering.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// A column reference, optionally qualified (`alias.column`)
    Column(String),

    /// A value bound as a statement parameter
    Value(Value),

    /// A nested sub-select
    Query(Box<Query>),

    /// Literal SQL emitted as is
    Raw(String),

    /// The flavor's random-number function, used for random ordering
    Random,
}

impl Expr {
    pub fn column(name: impl Into<String>) -> Expr {
        Expr::Column(name.into())
    }

    pub fn value(value: impl Into<Value>) -> Expr {
        Expr::Value(value.into())
    }

    pub fn raw(sql: impl Into<String>) -> Expr {
        Expr::Raw(sql.into())
    }

    /// Literal SQL produced by a closure.
    pub fn from_fn(f: impl FnOnce() -> String) -> Expr {
        Expr::Raw(f())
    }

    pub fn is_value(&self) -> bool {
        matches!(self, Expr::Value(_))
    }
}

/// Conversion into an [`Expr`] operand.
///
/// Plain Rust values become bound parameters; use [`Expr::column`] to
/// reference a column.
pub trait IntoExpr {
    fn into_expr(self) -> Expr;
}

impl IntoExpr for Expr {
    fn into_expr(self) -> Expr {
        self
    }
}

impl IntoExpr for Value {
    fn into_expr(self) -> Expr {
        Expr::Value(self)
    }
}

impl IntoExpr for &Value {
    fn into_expr(self) -> Expr {
        Expr::Value(self.clone())
    }
}

impl IntoExpr for Query {
    fn into_expr(self) -> Expr {
        Expr::Query(Box::new(self))
    }
}

macro_rules! impl_into_expr_for_value {
    ( $($t:ty),+ ) => {
        $(
            impl IntoExpr for $t {
                fn into_expr(self) -> Expr {
                    Expr::Value(Value::from(self))
                }
            }
        )+
    };
}

impl_into_expr_for_value!(
    bool,
    i8,
    i16,
    i32,
    i64,
    u8,
    u16,
    u32,
    f32,
    f64,
    &str,
    String,
    &String,
    DateTime<Utc>,
    super::Key
);

impl<T: Into<Value>> IntoExpr for Vec<T> {
    fn into_expr(self) -> Expr {
        Expr::Value(Value::List(self.into_iter().map(Into::into).collect()))
    }
}

impl<T: Into<Value>> IntoExpr for Option<T> {
    fn into_expr(self) -> Expr {
        Expr::Value(Value::from(self))
    }
}

/// Comparison operators usable in `WHERE` and `ON` clauses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Op {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    Like,
    In,
    NotIn,
    IsNull,
    IsNotNull,
}

impl Op {
    pub fn as_sql(self) -> &'static str {
        match self {
            Op::Eq => "=",
            Op::Ne => "!=",
            Op::Lt => "<",
            Op::Le => "<=",
            Op::Gt => ">",
            Op::Ge => ">=",
            Op::Like => "LIKE",
            Op::In => "IN",
            Op::NotIn => "NOT IN",
            Op::IsNull => "IS NULL",
            Op::IsNotNull => "IS NOT NULL",
        }
    }

    /// `true` for operators that take no right-hand side.
    pub fn is_unary(self) -> bool {
        matches!(self, Op::IsNull | Op::IsNotNull)
    }
}

impl std::str::FromStr for Op {
    type Err = crate::Error;

    fn from_str(s: &str) -> crate::Result<Op> {
        Ok(match s.trim().to_ascii_uppercase().as_str() {
            "=" => Op::Eq,
            "!=" | "<>" => Op::Ne,
            "<" => Op::Lt,
            "<=" => Op::Le,
            ">" => Op::Gt,
            ">=" => Op::Ge,
            "LIKE" => Op::Like,
            "IN" => Op::In,
            "NOT IN" => Op::NotIn,
            "IS NULL" => Op::IsNull,
            "IS NOT NULL" => Op::IsNotNull,
            _ => return Err(crate::Error::invalid_statement(format!("unknown operator `{s}`"))),
        })
    }
}

/// How a condition combines with the one before it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Connective {
    And,
    Or,
}

impl Connective {
    pub fn as_sql(self) -> &'static str {
        match self {
            Connective::And => "AND",
            Connective::Or => "OR",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    Compare { lhs: Expr, op: Op, rhs: Expr },

    /// A parenthesised sub-condition
    Group(Filter),
}

/// An ordered list of conditions joined by `AND` / `OR`.
///
/// The connective of the first condition is ignored when rendering.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Filter {
    pub conditions: Vec<(Connective, Condition)>,
}

impl Filter {
    pub fn new() -> Filter {
        Filter::default()
    }

    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }

    pub fn push(&mut self, connective: Connective, condition: Condition) {
        self.conditions.push((connective, condition));
    }

    pub fn and(mut self, column: impl Into<String>, op: Op, value: impl IntoExpr) -> Filter {
        self.push(Connective::And, compare(column, op, value));
        self
    }

    pub fn or(mut self, column: impl Into<String>, op: Op, value: impl IntoExpr) -> Filter {
        self.push(Connective::Or, compare(column, op, value));
        self
    }
}

pub(crate) fn compare(column: impl Into<String>, op: Op, value: impl IntoExpr) -> Condition {
    Condition::Compare {
        lhs: Expr::Column(column.into()),
        op,
        rhs: value.into_expr(),
    }
}
