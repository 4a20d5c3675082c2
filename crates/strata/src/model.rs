use strata_core::{schema, stmt::Record, Result};

/// A Rust type persisted by the mapper.
///
/// Implementations are written by hand: `schema` declares the mapping
/// descriptor, `load` and `to_record` convert between the type and the
/// dynamic [`Record`] the mapper works on.
pub trait Model: Sized + Send {
    /// Name the model is registered under
    const NAME: &'static str;

    /// Mapping descriptor. Its name must be [`Model::NAME`].
    fn schema() -> schema::Model;

    /// Load an instance of the model from a record the mapper produced
    fn load(record: Record) -> Result<Self>;

    /// Convert the instance into a record.
    ///
    /// Relations that are not loaded must be left out of the record so
    /// writes do not touch them.
    fn to_record(&self) -> Record;
}
