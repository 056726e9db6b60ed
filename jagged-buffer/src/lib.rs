#![deny(missing_docs)]

//! Typed buffers for jagged layouts.
//!
//! A [`Buffer`] is either materialized, backed by decoded values, or a placeholder that only
//! knows its length. Placeholders stand in for columns that were never read. They cost nothing
//! to create regardless of their length, and any attempt to read their values fails with
//! [`jagged_error::JaggedError::PlaceholderAccess`].

pub use buffer::*;

mod buffer;
mod debug;
mod macros;

/// A buffer of untyped bytes.
pub type ByteBuffer = Buffer<u8>;
