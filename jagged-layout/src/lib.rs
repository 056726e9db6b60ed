#![deny(missing_docs)]

//! Materialized jagged layouts and their reconciliation against a full schema.
//!
//! A reader that only decodes the columns a computation needs produces a [`Layout`] whose
//! structure follows a projected [`Schema`]. [`unproject_layout`] restores such a layout to the
//! structure of the full schema, filling every dropped branch with placeholder buffers, so that
//! every partition of a dataset looks the same to downstream consumers.

use jagged_error::{JaggedResult, jagged_bail};
use jagged_schema::Schema;

pub use backend::*;
pub use compatible::*;
pub use index::*;
pub use layout::*;
pub use reconcile::*;

mod backend;
mod compatible;
mod index;
mod layout;
mod reconcile;

/// Reconcile `layout` against `schema` at the layout's own length and check the result.
pub fn unproject_layout(
    schema: &Schema,
    layout: &Layout,
    backend: &dyn Backend,
) -> JaggedResult<Layout> {
    let reconciled = reconcile(schema, Some(layout), layout.len(), backend)?;
    verify_schema(schema, &reconciled)?;
    Ok(reconciled)
}

/// A layout of `schema` without elements.
pub fn empty_layout(schema: &Schema, backend: &dyn Backend) -> JaggedResult<Layout> {
    reconcile(schema, None, 0, backend)
}

/// Fail unless `layout` conforms to exactly `schema`.
pub fn verify_schema(schema: &Schema, layout: &Layout) -> JaggedResult<()> {
    let derived = layout.schema();
    if &derived != schema {
        jagged_bail!(
            AssertionViolation: "reconciled layout has schema {derived} instead of {schema}"
        );
    }
    Ok(())
}
