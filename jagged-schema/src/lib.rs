#![deny(missing_docs)]

//! A type system for jagged, nested columnar data.
//!
//! A [`Schema`] describes the structure of a dataset the way a file's metadata does: nested
//! records, variable and fixed length lists, several flavours of optionality, and unions. Schemas
//! are immutable and cheap to clone. This crate also knows how to enumerate a schema's leaf
//! [`ColumnPath`]s and how to reduce a schema to the branches a set of paths requires.

pub use columns::*;
pub use field::*;
pub use half;
pub use index_type::*;
pub use kind::*;
pub use parameters::*;
pub use ptype::*;
pub use schema::*;

mod columns;
mod display;
mod field;
mod index_type;
mod kind;
mod parameters;
mod ptype;
mod schema;
mod select;
