use super::{query::Body, Comma, Formatter, Ident, Params, ToSql};

use strata_core::{
    stmt::{Condition, Expr, Filter, Op, Value},
    Error,
};

impl ToSql for &Expr {
    fn to_sql<P: Params>(self, f: &mut Formatter<'_, P>) {
        match self {
            Expr::Column(name) => fmt!(f, Ident(name)),
            Expr::Value(value) => value.to_sql(f),
            Expr::Query(query) => fmt!(f, "(" Body(&**query) ")"),
            Expr::Raw(sql) => fmt!(f, sql),
            Expr::Random => {
                let random = f.serializer.flavor.random_fn();
                fmt!(f, random);
            }
        }
    }
}

impl ToSql for &Value {
    fn to_sql<P: Params>(self, f: &mut Formatter<'_, P>) {
        match self {
            Value::List(values) => {
                if values.is_empty() {
                    f.fail(Error::invalid_statement("empty value list"));
                }

                fmt!(f, "(" Comma(values) ")");
            }
            value if value.is_scalar() => {
                let placeholder = f.params.push(value);
                fmt!(f, placeholder);
            }
            value => {
                f.fail(Error::invalid_statement(format!(
                    "{} values cannot be used in an expression",
                    value.kind_name()
                )));
                f.dst.push_str("NULL");
            }
        }
    }
}

impl ToSql for &Filter {
    fn to_sql<P: Params>(self, f: &mut Formatter<'_, P>) {
        for (i, (connective, condition)) in self.conditions.iter().enumerate() {
            if i > 0 {
                fmt!(f, " " connective.as_sql() " ");
            }

            fmt!(f, condition);
        }
    }
}

impl ToSql for &Condition {
    fn to_sql<P: Params>(self, f: &mut Formatter<'_, P>) {
        match self {
            Condition::Group(filter) => fmt!(f, "(" filter ")"),
            Condition::Compare { lhs, op, rhs } => compare(lhs, *op, rhs, f),
        }
    }
}

fn compare<P: Params>(lhs: &Expr, op: Op, rhs: &Expr, f: &mut Formatter<'_, P>) {
    match (op, rhs) {
        (op, _) if op.is_unary() => fmt!(f, lhs " " op.as_sql()),

        // Comparing against NULL with `=` never matches.
        (Op::Eq, Expr::Value(Value::Null)) => fmt!(f, lhs " IS NULL"),
        (Op::Ne, Expr::Value(Value::Null)) => fmt!(f, lhs " IS NOT NULL"),

        (Op::In | Op::NotIn, Expr::Value(value)) if value.is_scalar() => {
            fmt!(f, lhs " " op.as_sql() " (" rhs ")")
        }
        (Op::In | Op::NotIn, Expr::Value(Value::List(_)) | Expr::Query(_) | Expr::Raw(_)) => {
            fmt!(f, lhs " " op.as_sql() " " rhs)
        }
        (Op::In | Op::NotIn, _) => {
            f.fail(Error::invalid_statement(format!(
                "`{}` requires a value list or a sub-select",
                op.as_sql()
            )));
        }

        (op, rhs) => fmt!(f, lhs " " op.as_sql() " " rhs),
    }
}
