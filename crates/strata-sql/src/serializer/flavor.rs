use strata_core::stmt::QueryKind;

/// A SQL dialect.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flavor {
    Postgresql,
    Sqlite,
    Mysql,
}

/// A clause of a statement, in the order the grammar renders it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum Component {
    Select,
    Delete,
    Insert,
    Update,
    From,
    Joins,
    Columns,
    Values,
    Set,
    Where,
    GroupBy,
    OrderBy,
    Limit,
    Offset,
    Returning,
}

impl Flavor {
    /// The clause components of `kind`, in rendering order.
    pub(super) fn components(self, kind: QueryKind) -> &'static [Component] {
        use Component::*;

        match (kind, self) {
            (QueryKind::Select, _) => &[
                Select, From, Joins, Where, GroupBy, OrderBy, Limit, Offset,
            ],
            (QueryKind::Insert, Flavor::Mysql) => &[Insert, Columns, Values],
            (QueryKind::Insert, _) => &[Insert, Columns, Values, Returning],
            (QueryKind::Update, Flavor::Mysql) => &[Update, Set, Where],
            (QueryKind::Update, _) => &[Update, Set, Where, Returning],
            (QueryKind::Delete, Flavor::Mysql) => &[Delete, From, Where],
            (QueryKind::Delete, _) => &[Delete, From, Where, Returning],
            (QueryKind::Raw, _) => &[],
        }
    }

    pub(super) fn quote_char(self) -> char {
        match self {
            Flavor::Mysql => '`',
            Flavor::Postgresql | Flavor::Sqlite => '"',
        }
    }

    pub(super) fn random_fn(self) -> &'static str {
        match self {
            Flavor::Mysql => "RAND()",
            Flavor::Postgresql | Flavor::Sqlite => "RANDOM()",
        }
    }

    /// `LIMIT` value used when only an `OFFSET` is given. SQLite and MySQL
    /// reject a bare `OFFSET`.
    pub(super) fn unbounded_limit(self) -> Option<&'static str> {
        match self {
            Flavor::Sqlite => Some("-1"),
            Flavor::Mysql => Some("18446744073709551615"),
            Flavor::Postgresql => None,
        }
    }

    pub fn quote_literal(self, literal: &str) -> String {
        let mut ret = String::with_capacity(literal.len() + 2);
        ret.push('\'');

        for ch in literal.chars() {
            match ch {
                '\'' => ret.push_str("''"),
                '\\' if self == Flavor::Mysql => ret.push_str("\\\\"),
                ch => ret.push(ch),
            }
        }

        ret.push('\'');
        ret
    }
}
