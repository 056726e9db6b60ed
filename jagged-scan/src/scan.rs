use std::sync::Arc;

use jagged_error::{JaggedResult, jagged_bail};
use jagged_layout::{Layout, MetaBackend, empty_layout, reconcile, verify_schema};
use jagged_schema::{ColumnConvention, Schema};
use rayon::prelude::*;

use crate::{PartitionReader, ScanOptions};

/// A scan of a dataset through a column projection.
///
/// The full schema never changes. Projecting returns a new scan that shares it.
#[derive(Clone, Debug)]
pub struct ProjectedScan {
    original: Arc<Schema>,
    projected: Arc<Schema>,
    convention: ColumnConvention,
    columns: Arc<[String]>,
    options: ScanOptions,
}

impl ProjectedScan {
    /// A scan of every column of a dataset with the given full schema.
    pub fn try_new(original: impl Into<Arc<Schema>>, options: ScanOptions) -> JaggedResult<Self> {
        let original = original.into();
        original.validate()?;
        let convention = ColumnConvention::new(options.list_separator().unwrap_or_default(), false);
        let columns = convention.column_names(&original).into();
        Ok(Self {
            projected: original.clone(),
            original,
            convention,
            columns,
            options,
        })
    }

    /// Detect the column naming convention from the names of the columns the dataset stores. A
    /// list separator forced by the options takes precedence.
    pub fn with_stored_columns<S: AsRef<str>>(mut self, stored: &[S]) -> Self {
        let detected = ColumnConvention::detect(stored);
        self.convention = ColumnConvention::new(
            self.options
                .list_separator()
                .unwrap_or_else(|| detected.separator()),
            detected.unnamed_root(),
        );
        self.columns = self.convention.column_names(&self.projected).into();
        log::debug!(
            "detected column convention with separator {} (unnamed root: {})",
            self.convention.separator(),
            self.convention.unnamed_root()
        );
        self
    }

    /// A scan reading only what `required` columns need, or every column for `None`.
    pub fn project_columns<S: AsRef<str>>(&self, required: Option<&[S]>) -> JaggedResult<Self> {
        let projected = match required {
            Some(required) => Arc::new(self.original.select_columns(required)?),
            None => self.original.clone(),
        };
        let columns: Arc<[String]> = self.convention.column_names(&projected).into();
        log::debug!("projected {} to {projected} reading {} columns", self.original, columns.len());
        Ok(Self {
            original: self.original.clone(),
            projected,
            convention: self.convention,
            columns,
            options: self.options.clone(),
        })
    }

    /// Read one partition and reconcile it to the full schema.
    ///
    /// The row count of the partition is `expected_rows`, else what the reader reports, else the
    /// length of what it read. A layout of a different length is an assertion violation.
    pub fn read_partition<R: PartitionReader>(
        &self,
        reader: &R,
        partition: &R::Partition,
        expected_rows: Option<usize>,
    ) -> JaggedResult<Layout> {
        let partial = reader.read(partition, &self.projected, &self.columns)?;
        if let Some(rows) = expected_rows.or_else(|| reader.row_count(partition)) {
            if rows != partial.len() {
                jagged_bail!(
                    AssertionViolation: "reader returned {} rows for a partition of {rows}",
                    partial.len()
                );
            }
        }
        log::debug!(
            "read {} rows of {} columns",
            partial.len(),
            self.columns.len()
        );

        let reconciled = reconcile(
            &self.original,
            Some(&partial),
            partial.len(),
            self.options.backend(),
        )?;
        if self.options.verify_output() {
            verify_schema(&self.original, &reconciled)?;
        }
        Ok(reconciled)
    }

    /// Read every partition, in order.
    ///
    /// On failure the error of the first failing partition in partition order is returned, also
    /// when partitions are read in parallel.
    pub fn read_partitions<R: PartitionReader>(
        &self,
        reader: &R,
        partitions: &[R::Partition],
    ) -> JaggedResult<Vec<Layout>> {
        let read = |(idx, partition): (usize, &R::Partition)| {
            log::debug!("reading partition {idx}");
            self.read_partition(reader, partition, None)
                .map_err(|err| err.with_context(format!("partition {idx}")))
        };
        if self.options.parallel() {
            partitions
                .par_iter()
                .enumerate()
                .map(read)
                .collect::<Vec<_>>()
                .into_iter()
                .collect()
        } else {
            partitions.iter().enumerate().map(read).collect()
        }
    }

    /// A layout of the full schema without rows, all of whose buffers are placeholders.
    pub fn meta(&self) -> JaggedResult<Layout> {
        empty_layout(&self.original, &MetaBackend)
    }

    /// The full schema.
    pub fn original(&self) -> &Arc<Schema> {
        &self.original
    }

    /// The schema readers are asked to produce.
    pub fn projected(&self) -> &Arc<Schema> {
        &self.projected
    }

    /// The column naming convention of the dataset.
    pub fn convention(&self) -> ColumnConvention {
        self.convention
    }

    /// The stored names of the columns readers are asked to read.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// The options of this scan.
    pub fn options(&self) -> &ScanOptions {
        &self.options
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use jagged_buffer::Buffer;
    use jagged_error::JaggedError;
    use jagged_layout::{Index, ListOffsetLayout};
    use jagged_schema::{ListSeparator, PType};
    use rstest::rstest;

    use super::*;

    fn schema() -> Schema {
        Schema::record([
            ("run", Schema::primitive(PType::I64)),
            (
                "muon",
                Schema::list_offset(
                    Schema::record([
                        ("pt", Schema::primitive(PType::F32)),
                        ("eta", Schema::primitive(PType::F32)),
                    ])
                    .unwrap(),
                ),
            ),
        ])
        .unwrap()
    }

    /// Serves `muon.pt` for partitions given as row counts and records what it was asked for.
    #[derive(Default)]
    struct MuonReader {
        requests: Mutex<Vec<Vec<String>>>,
    }

    impl PartitionReader for MuonReader {
        type Partition = usize;

        fn read(&self, rows: &usize, projected: &Schema, columns: &[String]) -> JaggedResult<Layout> {
            self.requests.lock().unwrap().push(columns.to_vec());
            if projected.to_string() != "{muon: var * {pt: float32}}" {
                jagged_bail!("cannot read {projected}");
            }
            let offsets: Buffer<i64> = (0..=*rows).map(|row| i64::try_from(row).unwrap()).collect();
            let pt: Buffer<f32> = (0..*rows).map(|row| row as f32).collect();
            let muons = ListOffsetLayout::try_new(
                Index::from(offsets),
                Layout::record([("pt", Layout::primitive(pt)?)], *rows)?,
            )?;
            Layout::record([("muon", muons.into())], *rows)
        }
    }

    #[test]
    fn projection_keeps_the_original() {
        let scan = ProjectedScan::try_new(schema(), ScanOptions::default()).unwrap();
        assert_eq!(scan.columns(), &["run", "muon.list.item.pt", "muon.list.item.eta"]);

        let projected = scan.project_columns(Some(["muon.pt"].as_slice())).unwrap();
        assert_eq!(projected.original().as_ref(), &schema());
        assert_eq!(projected.projected().to_string(), "{muon: var * {pt: float32}}");
        assert_eq!(projected.columns(), &["muon.list.item.pt"]);

        let all = projected.project_columns::<&str>(None).unwrap();
        assert_eq!(all.projected(), all.original());
        assert!(scan.project_columns(Some(["muon.phi"].as_slice())).is_err());
    }

    #[rstest]
    #[case(&["run", "muon.list.element.pt"], None, "muon.list.element.pt")]
    #[case(&[".run", ".muon.list.item.pt"], None, ".muon.list.item.pt")]
    #[case(&["run", "muon.list.element.pt"], Some(ListSeparator::ListItem), "muon.list.item.pt")]
    fn stored_column_conventions(
        #[case] stored: &[&str],
        #[case] forced: Option<ListSeparator>,
        #[case] expected: &str,
    ) {
        let options = match forced {
            Some(separator) => ScanOptions::default().with_list_separator(separator),
            None => ScanOptions::default(),
        };
        let scan = ProjectedScan::try_new(schema(), options)
            .unwrap()
            .with_stored_columns(stored)
            .project_columns(Some(["muon.pt"].as_slice()))
            .unwrap();
        assert_eq!(scan.columns(), &[expected]);
    }

    #[test]
    fn partitions_are_reconciled() {
        let reader = MuonReader::default();
        let scan = ProjectedScan::try_new(schema(), ScanOptions::default())
            .unwrap()
            .project_columns(Some(["muon.pt"].as_slice()))
            .unwrap();
        let layout = scan.read_partition(&reader, &3, Some(3)).unwrap();
        assert_eq!(layout.schema(), schema());
        assert_eq!(layout.len(), 3);
        assert!(layout.field("run").unwrap().as_primitive().unwrap().data().is_placeholder());
        let muons = layout.field("muon").unwrap().content().unwrap();
        assert!(muons.field("pt").unwrap().is_fully_materialized());
        assert!(!muons.field("eta").unwrap().is_fully_materialized());
        assert_eq!(
            reader.requests.lock().unwrap().as_slice(),
            &[vec!["muon.list.item.pt".to_string()]]
        );
    }

    #[test]
    fn row_count_mismatch() {
        let scan = ProjectedScan::try_new(schema(), ScanOptions::default())
            .unwrap()
            .project_columns(Some(["muon.pt"].as_slice()))
            .unwrap();
        let err = scan.read_partition(&MuonReader::default(), &3, Some(4)).unwrap_err();
        assert!(matches!(err, JaggedError::AssertionViolation(..)));
    }

    #[rstest]
    #[case(true)]
    #[case(false)]
    fn many_partitions(#[case] parallel: bool) {
        let scan = ProjectedScan::try_new(schema(), ScanOptions::default().with_parallel(parallel))
            .unwrap()
            .project_columns(Some(["muon.pt"].as_slice()))
            .unwrap();
        let layouts = scan.read_partitions(&MuonReader::default(), &[0, 5, 2]).unwrap();
        assert_eq!(layouts.iter().map(Layout::len).collect::<Vec<_>>(), vec![0, 5, 2]);
        assert!(layouts.iter().all(|layout| layout.schema() == schema()));
    }

    /// Fails on partitions with an odd number of rows.
    struct EvenReader(MuonReader);

    impl PartitionReader for EvenReader {
        type Partition = usize;

        fn read(&self, rows: &usize, projected: &Schema, columns: &[String]) -> JaggedResult<Layout> {
            if rows % 2 == 1 {
                jagged_bail!("odd partition of {rows} rows");
            }
            self.0.read(rows, projected, columns)
        }
    }

    #[rstest]
    #[case(true)]
    #[case(false)]
    fn earliest_failure_is_reported(#[case] parallel: bool) {
        let scan = ProjectedScan::try_new(schema(), ScanOptions::default().with_parallel(parallel))
            .unwrap()
            .project_columns(Some(["muon.pt"].as_slice()))
            .unwrap();
        let reader = EvenReader(MuonReader::default());
        for _ in 0..8 {
            let err = scan.read_partitions(&reader, &[2, 3, 4, 5, 7]).unwrap_err();
            assert!(err.to_string().starts_with("partition 1: odd partition of 3 rows"), "{err}");
        }
    }

    #[test]
    fn failures_name_the_partition() {
        let scan = ProjectedScan::try_new(schema(), ScanOptions::default()).unwrap();
        let err = scan.read_partitions(&MuonReader::default(), &[1]).unwrap_err();
        assert!(err.to_string().starts_with("partition 0: cannot read"), "{err}");
    }

    #[test]
    fn meta_layout() {
        let scan = ProjectedScan::try_new(schema(), ScanOptions::default()).unwrap();
        let meta = scan.meta().unwrap();
        assert_eq!(meta.len(), 0);
        assert_eq!(meta.schema(), schema());
        assert_eq!(meta.placeholder_count(), 4);
    }
}
