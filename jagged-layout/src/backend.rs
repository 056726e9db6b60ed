//! Allocation of the buffers reconciliation has to invent.
//!
//! Reconciliation never reads values. It only needs buffers of the right type and length for the
//! parts of a schema that were not read, plus a handful of trivial structural buffers (masks that
//! are all valid, identity indices, union tags). A [`Backend`] decides how those are represented.

use std::fmt::Debug;

use jagged_buffer::{Buffer, ByteBuffer};
use jagged_error::{JaggedResult, jagged_err};
use jagged_schema::{IndexType, PType};

use crate::Index;
use crate::index::check_identity_len;

/// Allocates the buffers of synthesized layout nodes.
///
/// Implementations are shared between concurrent reconciliations and must not hold mutable state.
pub trait Backend: Send + Sync + Debug {
    /// An index of `len` values that must never be read.
    fn placeholder_index(&self, index_type: IndexType, len: usize) -> Index {
        Index::placeholder(index_type, len)
    }

    /// Data for `len` values of `ptype` that must never be read.
    fn placeholder_data(&self, ptype: PType, len: usize) -> ByteBuffer {
        ByteBuffer::placeholder(len.saturating_mul(ptype.byte_width()))
    }

    /// A byte mask of `len` entries, all marking a valid element.
    fn valid_byte_mask(&self, len: usize, valid_when: bool) -> Index;

    /// A bit mask covering `len` elements, all marking a valid element.
    fn valid_bit_mask(&self, len: usize, valid_when: bool) -> Index;

    /// The index `0..len`.
    fn identity_index(&self, index_type: IndexType, len: usize) -> JaggedResult<Index>;

    /// `len` union tags, all equal to `tag`.
    fn constant_tags(&self, len: usize, tag: i8) -> Index;

    /// Union tags with every `tag` replaced by `mapping[tag]`.
    fn remap_tags(&self, tags: &Index, mapping: &[i8]) -> JaggedResult<Index>;
}

/// Materializes structural buffers in host memory. Unread data stays a placeholder.
#[derive(Clone, Copy, Debug, Default)]
pub struct HostBackend;

impl Backend for HostBackend {
    fn valid_byte_mask(&self, len: usize, valid_when: bool) -> Index {
        Index::I8(Buffer::full(i8::from(valid_when), len))
    }

    fn valid_bit_mask(&self, len: usize, valid_when: bool) -> Index {
        let byte = if valid_when { u8::MAX } else { 0 };
        Index::U8(Buffer::full(byte, len.div_ceil(8)))
    }

    fn identity_index(&self, index_type: IndexType, len: usize) -> JaggedResult<Index> {
        Index::identity(index_type, len)
    }

    fn constant_tags(&self, len: usize, tag: i8) -> Index {
        Index::I8(Buffer::full(tag, len))
    }

    fn remap_tags(&self, tags: &Index, mapping: &[i8]) -> JaggedResult<Index> {
        if tags.is_placeholder() {
            return Ok(Index::placeholder(IndexType::I8, tags.len()));
        }
        tags.to_i64_vec()?
            .into_iter()
            .map(|tag| {
                usize::try_from(tag)
                    .ok()
                    .and_then(|tag| mapping.get(tag).copied())
                    .ok_or_else(|| {
                        jagged_err!(
                            AssertionViolation: "union tag {tag} is outside of {} alternatives",
                            mapping.len()
                        )
                    })
            })
            .collect::<JaggedResult<Buffer<i8>>>()
            .map(Index::I8)
    }
}

/// Allocates nothing: every buffer is a placeholder. Layouts built with it carry structure and
/// lengths only, for type tracing and for schema-driven consumers that never touch values.
#[derive(Clone, Copy, Debug, Default)]
pub struct MetaBackend;

impl Backend for MetaBackend {
    fn valid_byte_mask(&self, len: usize, _valid_when: bool) -> Index {
        Index::placeholder(IndexType::I8, len)
    }

    fn valid_bit_mask(&self, len: usize, _valid_when: bool) -> Index {
        Index::placeholder(IndexType::U8, len.div_ceil(8))
    }

    fn identity_index(&self, index_type: IndexType, len: usize) -> JaggedResult<Index> {
        check_identity_len(index_type, len)?;
        Ok(Index::placeholder(index_type, len))
    }

    fn constant_tags(&self, len: usize, _tag: i8) -> Index {
        Index::placeholder(IndexType::I8, len)
    }

    fn remap_tags(&self, tags: &Index, _mapping: &[i8]) -> JaggedResult<Index> {
        Ok(Index::placeholder(IndexType::I8, tags.len()))
    }
}
