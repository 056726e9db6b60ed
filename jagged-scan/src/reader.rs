use jagged_error::JaggedResult;
use jagged_layout::Layout;
use jagged_schema::Schema;

/// Decodes one partition of a dataset.
///
/// A reader is given the projected schema and the stored names of the columns it must read, and
/// returns a layout that conforms to some projection of the full schema. It may wrap columns in
/// `Unmasked` nodes the schema does not ask for; reconciliation removes them.
pub trait PartitionReader: Send + Sync {
    /// Identifies a partition, e.g. a file and a row group.
    type Partition: Send + Sync;

    /// Read `columns` of `partition`.
    fn read(
        &self,
        partition: &Self::Partition,
        projected: &Schema,
        columns: &[String],
    ) -> JaggedResult<Layout>;

    /// The number of rows of `partition`, when known without reading it.
    fn row_count(&self, _partition: &Self::Partition) -> Option<usize> {
        None
    }
}
