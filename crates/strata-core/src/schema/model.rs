use super::{BelongsTo, Column, ColumnType, HasMany, OwnsOne};
use crate::stmt::{Key, Record};

/// The mapping descriptor of one entity type.
///
/// Descriptors are plain data. They are declared once per type, usually in
/// the type's `Model::schema` implementation, and are immutable after the
/// schema is built.
///
/// ```
/// use strata_core::schema::{ColumnType, HasMany, Model};
///
/// let tag = Model::new("Tag", "tag")
///     .key("tag_id", "id", ColumnType::Int)
///     .column("tag_name", ColumnType::String, "name")
///     .has_many(HasMany::inline("l11n", "TagL11n", "tag_l11n", "tag_l11n_tag"));
///
/// assert_eq!(tag.primary_key_column, "tag_id");
/// assert!(tag.auto);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Model {
    /// Name the model is registered under
    pub name: String,

    pub table: String,

    /// Field holding the primary key
    pub primary_key: String,

    /// Column holding the primary key
    pub primary_key_column: String,

    /// The key is generated by the store on insert
    pub auto: bool,

    /// Columns in declaration order, the key column included
    pub columns: Vec<Column>,

    pub owns_one: Vec<OwnsOne>,

    pub belongs_to: Vec<BelongsTo>,

    pub has_many: Vec<HasMany>,
}

/// A relation of a model, looked up by field.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RelationRef<'a> {
    OwnsOne(&'a OwnsOne),
    BelongsTo(&'a BelongsTo),
    HasMany(&'a HasMany),
}

impl Model {
    pub fn new(name: impl Into<String>, table: impl Into<String>) -> Model {
        Model {
            name: name.into(),
            table: table.into(),
            primary_key: String::new(),
            primary_key_column: String::new(),
            auto: true,
            columns: vec![],
            owns_one: vec![],
            belongs_to: vec![],
            has_many: vec![],
        }
    }

    /// Declares the primary key column.
    pub fn key(mut self, column: impl Into<String>, field: impl Into<String>, ty: ColumnType) -> Model {
        let column = Column::new(column, ty, field);
        self.primary_key = column.field.clone();
        self.primary_key_column = column.name.clone();
        self.columns.push(column);
        self
    }

    /// Sets whether the store generates the key. Defaults to `true`.
    pub fn auto(mut self, auto: bool) -> Model {
        self.auto = auto;
        self
    }

    pub fn column(self, name: impl Into<String>, ty: ColumnType, field: impl Into<String>) -> Model {
        self.column_def(Column::new(name, ty, field))
    }

    /// Adds a column built with flags, e.g. `Column::new(..).autocomplete()`.
    pub fn column_def(mut self, column: Column) -> Model {
        self.columns.push(column);
        self
    }

    pub fn owns_one(mut self, relation: OwnsOne) -> Model {
        self.owns_one.push(relation);
        self
    }

    pub fn belongs_to(mut self, relation: BelongsTo) -> Model {
        self.belongs_to.push(relation);
        self
    }

    pub fn has_many(mut self, relation: HasMany) -> Model {
        self.has_many.push(relation);
        self
    }

    pub fn column_by_name(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|column| column.name == name)
    }

    pub fn column_for_field(&self, field: &str) -> Option<&Column> {
        self.columns.iter().find(|column| column.field == field)
    }

    /// Maps a field name to its column name, passing column names through.
    pub fn resolve_column<'a>(&'a self, field_or_column: &'a str) -> &'a str {
        match self.column_for_field(field_or_column) {
            Some(column) => &column.name,
            None => field_or_column,
        }
    }

    /// Reads the key from `record`. Unset and zero keys yield `None`.
    pub fn key_of(&self, record: &Record) -> Option<Key> {
        record.value(&self.primary_key).to_key()
    }

    pub fn relation(&self, field: &str) -> Option<RelationRef<'_>> {
        if let Some(rel) = self.owns_one.iter().find(|rel| rel.field == field) {
            return Some(RelationRef::OwnsOne(rel));
        }

        if let Some(rel) = self.belongs_to.iter().find(|rel| rel.field == field) {
            return Some(RelationRef::BelongsTo(rel));
        }

        self.has_many
            .iter()
            .find(|rel| rel.field == field)
            .map(RelationRef::HasMany)
    }

    /// Owns-one or belongs-to relation stored in `column`.
    pub fn single_relation_for_column(&self, column: &str) -> Option<RelationRef<'_>> {
        if let Some(rel) = self.owns_one.iter().find(|rel| rel.column == column) {
            return Some(RelationRef::OwnsOne(rel));
        }

        self.belongs_to
            .iter()
            .find(|rel| rel.column == column)
            .map(RelationRef::BelongsTo)
    }

    /// Columns selected by reads.
    pub fn readable_columns(&self) -> impl Iterator<Item = &Column> {
        self.columns.iter().filter(|column| !column.write_only)
    }

    /// Columns written by inserts and updates.
    pub fn writable_columns(&self) -> impl Iterator<Item = &Column> {
        self.columns.iter().filter(|column| !column.read_only)
    }

    pub fn autocomplete_columns(&self) -> impl Iterator<Item = &Column> {
        self.columns.iter().filter(|column| column.autocomplete)
    }
}

impl RelationRef<'_> {
    pub fn field(&self) -> &str {
        match self {
            RelationRef::OwnsOne(rel) => &rel.field,
            RelationRef::BelongsTo(rel) => &rel.field,
            RelationRef::HasMany(rel) => &rel.field,
        }
    }

    pub fn target(&self) -> &str {
        match self {
            RelationRef::OwnsOne(rel) => &rel.target,
            RelationRef::BelongsTo(rel) => &rel.target,
            RelationRef::HasMany(rel) => &rel.target,
        }
    }

    pub fn is_has_many(&self) -> bool {
        matches!(self, RelationRef::HasMany(_))
    }
}
