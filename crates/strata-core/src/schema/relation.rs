use crate::stmt::{Direction, Value};

/// A single related entity owned by this one. The key of the related entity
/// is stored in `column` on this model's table.
#[derive(Debug, Clone, PartialEq)]
pub struct OwnsOne {
    pub field: String,
    pub target: String,
    pub column: String,

    /// Only traversed when a filter directive names the relation
    pub conditional: bool,
}

/// A single related entity this one refers to. The referenced value is
/// stored in `column` on this model's table.
#[derive(Debug, Clone, PartialEq)]
pub struct BelongsTo {
    pub field: String,
    pub target: String,
    pub column: String,

    /// Field of the target referenced instead of its primary key
    pub by: Option<String>,
}

/// A collection of related entities.
///
/// With `external_column` set the relation goes through the join table
/// `table`, whose `self_column` holds this entity's key and whose
/// `external_column` holds the member's key. Without it, `table` is the
/// target's own table and `self_column` is its foreign key column.
#[derive(Debug, Clone, PartialEq)]
pub struct HasMany {
    pub field: String,
    pub target: String,
    pub table: String,
    pub self_column: String,
    pub external_column: Option<String>,

    /// Default ordering of members
    pub sort: Option<Sort>,

    /// Static filter applied to the member table
    pub condition: Option<(String, Value)>,

    /// Members are loaded but never written
    pub read_only: bool,

    /// Members are written but never loaded
    pub write_only: bool,

    /// Only traversed when a filter directive names the relation
    pub conditional: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Sort {
    pub column: String,
    pub direction: Direction,
}

impl OwnsOne {
    pub fn new(
        field: impl Into<String>,
        target: impl Into<String>,
        column: impl Into<String>,
    ) -> OwnsOne {
        OwnsOne {
            field: field.into(),
            target: target.into(),
            column: column.into(),
            conditional: false,
        }
    }

    pub fn conditional(mut self) -> OwnsOne {
        self.conditional = true;
        self
    }
}

impl BelongsTo {
    pub fn new(
        field: impl Into<String>,
        target: impl Into<String>,
        column: impl Into<String>,
    ) -> BelongsTo {
        BelongsTo {
            field: field.into(),
            target: target.into(),
            column: column.into(),
            by: None,
        }
    }

    /// Stores `field` of the target in `column` instead of its key.
    ///
    /// When the relation is not joined, the absent entity read for it
    /// carries the stored `field` value rather than the target's key.
    pub fn by(mut self, field: impl Into<String>) -> BelongsTo {
        self.by = Some(field.into());
        self
    }
}

impl HasMany {
    /// Members carry this entity's key in `foreign_column` of their table.
    pub fn inline(
        field: impl Into<String>,
        target: impl Into<String>,
        table: impl Into<String>,
        foreign_column: impl Into<String>,
    ) -> HasMany {
        HasMany {
            field: field.into(),
            target: target.into(),
            table: table.into(),
            self_column: foreign_column.into(),
            external_column: None,
            sort: None,
            condition: None,
            read_only: false,
            write_only: false,
            conditional: false,
        }
    }

    /// Members are linked through the join table `table`.
    pub fn through(
        field: impl Into<String>,
        target: impl Into<String>,
        table: impl Into<String>,
        self_column: impl Into<String>,
        external_column: impl Into<String>,
    ) -> HasMany {
        HasMany {
            external_column: Some(external_column.into()),
            ..HasMany::inline(field, target, table, self_column)
        }
    }

    pub fn is_join_table(&self) -> bool {
        self.external_column.is_some()
    }

    pub fn sort(mut self, column: impl Into<String>, direction: Direction) -> HasMany {
        self.sort = Some(Sort {
            column: column.into(),
            direction,
        });
        self
    }

    pub fn condition(mut self, column: impl Into<String>, value: impl Into<Value>) -> HasMany {
        self.condition = Some((column.into(), value.into()));
        self
    }

    pub fn read_only(mut self) -> HasMany {
        self.read_only = true;
        self
    }

    pub fn write_only(mut self) -> HasMany {
        self.write_only = true;
        self
    }

    pub fn conditional(mut self) -> HasMany {
        self.conditional = true;
        self
    }
}
