#![deny(missing_docs)]

//! Reads of a jagged dataset, one partition at a time, through a column projection.
//!
//! A [`ProjectedScan`] owns the full schema of a dataset and the projection a computation asked
//! for. It hands the projected schema and the matching stored column names to a
//! [`PartitionReader`] and reconciles whatever the reader returns back to the full schema, so that
//! every partition has the same structure no matter which columns were read.

pub use options::*;
pub use reader::*;
pub use scan::*;

mod options;
mod reader;
mod scan;
