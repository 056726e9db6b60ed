use std::sync::Arc;

use jagged_layout::{Backend, HostBackend};
use jagged_schema::ListSeparator;

/// Options of a [`crate::ProjectedScan`].
#[derive(Clone, Debug)]
pub struct ScanOptions {
    list_separator: Option<ListSeparator>,
    verify_output: bool,
    parallel: bool,
    backend: Arc<dyn Backend>,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            list_separator: None,
            verify_output: true,
            parallel: true,
            backend: Arc::new(HostBackend),
        }
    }
}

impl ScanOptions {
    /// Use `separator` for list levels instead of detecting it from the stored column names.
    pub fn with_list_separator(mut self, separator: ListSeparator) -> Self {
        self.list_separator = Some(separator);
        self
    }

    /// Whether to check every reconciled partition against the full schema.
    pub fn with_verify_output(mut self, verify_output: bool) -> Self {
        self.verify_output = verify_output;
        self
    }

    /// Whether to read partitions on the rayon thread pool.
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// The backend that allocates the buffers of columns that were not read.
    pub fn with_backend(mut self, backend: Arc<dyn Backend>) -> Self {
        self.backend = backend;
        self
    }

    /// The forced list separator, if any.
    pub fn list_separator(&self) -> Option<ListSeparator> {
        self.list_separator
    }

    /// Whether reconciled partitions are checked.
    pub fn verify_output(&self) -> bool {
        self.verify_output
    }

    /// Whether partitions are read in parallel.
    pub fn parallel(&self) -> bool {
        self.parallel
    }

    /// The backend in use.
    pub fn backend(&self) -> &dyn Backend {
        self.backend.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use jagged_layout::MetaBackend;

    use super::*;

    #[test]
    fn defaults() {
        let options = ScanOptions::default();
        assert_eq!(options.list_separator(), None);
        assert!(options.verify_output());
        assert!(options.parallel());
    }

    #[test]
    fn builders() {
        let options = ScanOptions::default()
            .with_list_separator(ListSeparator::ListElement)
            .with_verify_output(false)
            .with_parallel(false)
            .with_backend(Arc::new(MetaBackend));
        assert_eq!(options.list_separator(), Some(ListSeparator::ListElement));
        assert!(!options.verify_output());
        assert!(!options.parallel());
        assert_eq!(format!("{:?}", options.backend()), "MetaBackend");
    }
}
