use super::{Comma, Component, Delimited, Formatter, Ident, Params, ToSql};

use strata_core::{
    stmt::{Expr, Join, OrderBy, Query, QueryKind, Selection, TableRef},
    Error,
};

/// A top-level statement, terminated with `;`.
pub(super) struct Statement<'a>(pub(super) &'a Query);

/// A statement without the terminator, used for sub-selects.
pub(super) struct Body<'a>(pub(super) &'a Query);

struct Clause<'a>(&'a Query, Component);

struct Assignment<'a>(&'a str, &'a Expr);

struct Row<'a>(&'a [Expr]);

impl ToSql for Statement<'_> {
    fn to_sql<P: Params>(self, f: &mut Formatter<'_, P>) {
        if self.0.kind == QueryKind::Raw {
            fmt!(f, &self.0.raw);
            return;
        }

        fmt!(f, Body(self.0) ";");
    }
}

impl ToSql for Body<'_> {
    fn to_sql<P: Params>(self, f: &mut Formatter<'_, P>) {
        let query = self.0;

        if query.kind == QueryKind::Raw {
            fmt!(f, query.raw.trim_end().trim_end_matches(';'));
            return;
        }

        let flavor = f.serializer.flavor;
        let components = flavor.components(query.kind);

        assert!(
            query.returning.is_empty() || components.contains(&Component::Returning),
            "`RETURNING` is not supported by {flavor:?}"
        );

        let mut s = "";
        for &component in components {
            if !is_present(query, component, f) {
                continue;
            }

            fmt!(f, s Clause(query, component));
            s = " ";
        }
    }
}

fn is_present<P>(query: &Query, component: Component, f: &Formatter<'_, P>) -> bool {
    use Component::*;

    match component {
        Select | Delete | Insert | Update | Values | Set => true,
        From => !query.from.is_empty() && query.kind != QueryKind::Insert,
        Joins => !query.joins.is_empty(),
        Columns => !query.columns.is_empty(),
        Where => !query.filter.is_empty(),
        GroupBy => !query.group_by.is_empty(),
        OrderBy => !query.order_by.is_empty(),
        Limit => {
            query.limit.is_some()
                || (query.offset.is_some() && f.serializer.flavor.unbounded_limit().is_some())
        }
        Offset => query.offset.is_some(),
        Returning => !query.returning.is_empty(),
    }
}

impl ToSql for Clause<'_> {
    fn to_sql<P: Params>(self, f: &mut Formatter<'_, P>) {
        let Clause(query, component) = self;

        match component {
            Component::Select => {
                let distinct = if query.distinct { "DISTINCT " } else { "" };

                if query.select.is_empty() {
                    fmt!(f, "SELECT " distinct "*");
                } else {
                    fmt!(f, "SELECT " distinct Comma(&query.select));
                }
            }
            Component::Delete => fmt!(f, "DELETE"),
            Component::Insert => {
                fmt!(f, "INSERT INTO ");
                target(query, f);
            }
            Component::Update => {
                fmt!(f, "UPDATE ");
                target(query, f);
            }
            Component::From => fmt!(f, "FROM " Comma(&query.from)),
            Component::Joins => fmt!(f, Delimited(&query.joins, " ")),
            Component::Columns => {
                fmt!(f, "(" Comma(query.columns.iter().map(Ident)) ")");
            }
            Component::Values => {
                if query.values.is_empty() && !query.columns.is_empty() {
                    f.fail(Error::invalid_statement("INSERT without rows"));
                } else if query.columns.is_empty() {
                    match f.serializer.flavor {
                        super::Flavor::Mysql => fmt!(f, "() VALUES ()"),
                        _ => fmt!(f, "DEFAULT VALUES"),
                    }
                } else {
                    let rows = query.values.iter().map(|row| Row(row));
                    fmt!(f, "VALUES " Comma(rows));
                }
            }
            Component::Set => {
                if query.set.is_empty() {
                    f.fail(Error::invalid_statement("UPDATE without assignments"));
                }

                let assignments = query
                    .set
                    .iter()
                    .map(|(column, expr)| Assignment(column, expr));
                fmt!(f, "SET " Comma(assignments));
            }
            Component::Where => {
                let filter = &query.filter;
                fmt!(f, "WHERE " filter);
            }
            Component::GroupBy => {
                fmt!(f, "GROUP BY " Comma(query.group_by.iter().map(Ident)));
            }
            Component::OrderBy => fmt!(f, "ORDER BY " Comma(&query.order_by)),
            Component::Limit => match query.limit {
                Some(limit) => fmt!(f, "LIMIT " limit),
                None => {
                    let unbounded = f.serializer.flavor.unbounded_limit();
                    fmt!(f, "LIMIT " unbounded);
                }
            },
            Component::Offset => fmt!(f, "OFFSET " query.offset),
            Component::Returning => {
                fmt!(f, "RETURNING " Comma(query.returning.iter().map(Ident)));
            }
        }
    }
}

fn target<P: Params>(query: &Query, f: &mut Formatter<'_, P>) {
    match query.from.first() {
        Some(table) => fmt!(f, table),
        None => f.fail(Error::invalid_statement(format!(
            "{:?} query without a target table",
            query.kind
        ))),
    }
}

impl ToSql for &TableRef {
    fn to_sql<P: Params>(self, f: &mut Formatter<'_, P>) {
        fmt!(f, Ident(&self.name));

        if let Some(alias) = &self.alias {
            fmt!(f, " AS " Ident(alias));
        }
    }
}

impl ToSql for &Selection {
    fn to_sql<P: Params>(self, f: &mut Formatter<'_, P>) {
        fmt!(f, &self.expr);

        if let Some(alias) = &self.alias {
            fmt!(f, " AS " Ident(alias));
        }
    }
}

impl ToSql for &Join {
    fn to_sql<P: Params>(self, f: &mut Formatter<'_, P>) {
        let table = &self.table;
        fmt!(f, self.kind.as_sql() " " table);

        if !self.on.is_empty() {
            let on = &self.on;
            fmt!(f, " ON " on);
        }
    }
}

impl ToSql for &OrderBy {
    fn to_sql<P: Params>(self, f: &mut Formatter<'_, P>) {
        match self.expr {
            Expr::Random => fmt!(f, &self.expr),
            _ => fmt!(f, &self.expr " " self.direction.as_sql()),
        }
    }
}

impl ToSql for Assignment<'_> {
    fn to_sql<P: Params>(self, f: &mut Formatter<'_, P>) {
        fmt!(f, Ident(self.0) " = " self.1);
    }
}

impl ToSql for Row<'_> {
    fn to_sql<P: Params>(self, f: &mut Formatter<'_, P>) {
        fmt!(f, "(" Comma(self.0) ")");
    }
}
