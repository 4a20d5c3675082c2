use super::ColumnType;

/// One persisted column of a model.
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    /// Storage name of the column
    pub name: String,

    /// Semantic type driving value coercion
    pub ty: ColumnType,

    /// Entity field backed by the column
    pub field: String,

    /// Never written by inserts or updates
    pub read_only: bool,

    /// Never selected by reads
    pub write_only: bool,

    /// Searched by free-text `find`
    pub autocomplete: bool,
}

impl Column {
    pub fn new(name: impl Into<String>, ty: ColumnType, field: impl Into<String>) -> Column {
        Column {
            name: name.into(),
            ty,
            field: field.into(),
            read_only: false,
            write_only: false,
            autocomplete: false,
        }
    }

    pub fn read_only(mut self) -> Column {
        self.read_only = true;
        self
    }

    pub fn write_only(mut self) -> Column {
        self.write_only = true;
        self
    }

    pub fn autocomplete(mut self) -> Column {
        self.autocomplete = true;
        self
    }
}
