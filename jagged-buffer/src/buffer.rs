use std::collections::Bound;
use std::fmt::{Debug, Formatter};
use std::ops::RangeBounds;

use arrow_buffer::{ArrowNativeType, MutableBuffer, ScalarBuffer};
use jagged_error::{JaggedExpect, JaggedResult, jagged_bail, jagged_err, jagged_panic};

use crate::ByteBuffer;
use crate::debug::TruncatedDebug;

/// An immutable, cheaply cloneable buffer of items of `T`.
///
/// A materialized buffer shares an Arrow allocation. A placeholder buffer has a length but no
/// values; its length and element type are observable, its values are not.
#[derive(Clone)]
pub struct Buffer<T: ArrowNativeType> {
    inner: Inner<T>,
}

#[derive(Clone)]
enum Inner<T: ArrowNativeType> {
    Materialized(ScalarBuffer<T>),
    Placeholder(usize),
}

impl<T: ArrowNativeType> Buffer<T> {
    /// Returns a new materialized `Buffer<T>` copied from the provided `Vec<T>`, `&[T]`, etc.
    pub fn copy_from(values: impl AsRef<[T]>) -> Self {
        Self::from(values.as_ref().to_vec())
    }

    /// Create a new empty materialized buffer.
    pub fn empty() -> Self {
        Self::from(Vec::new())
    }

    /// Create a new materialized buffer of `len` copies of `item`.
    pub fn full(item: T, len: usize) -> Self {
        Self::from(vec![item; len])
    }

    /// Create a placeholder of `len` items. Nothing is allocated.
    pub fn placeholder(len: usize) -> Self {
        Self {
            inner: Inner::Placeholder(len),
        }
    }

    /// Returns the length of the buffer in elements of type T.
    #[inline]
    pub fn len(&self) -> usize {
        match &self.inner {
            Inner::Materialized(values) => values.len(),
            Inner::Placeholder(len) => *len,
        }
    }

    /// Returns whether the buffer is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns whether this buffer is a placeholder.
    #[inline]
    pub fn is_placeholder(&self) -> bool {
        matches!(self.inner, Inner::Placeholder(_))
    }

    /// Returns a slice over the values of the buffer.
    ///
    /// Fails with `PlaceholderAccess` for placeholders.
    pub fn as_slice(&self) -> JaggedResult<&[T]> {
        match &self.inner {
            Inner::Materialized(values) => Ok(&values[..]),
            Inner::Placeholder(len) => Err(jagged_err!(
                PlaceholderAccess: "cannot read the values of a placeholder buffer of {len} {}",
                std::any::type_name::<T>()
            )),
        }
    }

    /// Copy the values of the buffer into a `Vec`.
    pub fn to_vec(&self) -> JaggedResult<Vec<T>> {
        self.as_slice().map(<[T]>::to_vec)
    }

    /// Returns the value at `index`.
    pub fn value(&self, index: usize) -> JaggedResult<T> {
        if index >= self.len() {
            jagged_bail!(OutOfBounds: index, 0, self.len());
        }
        Ok(self.as_slice()?[index])
    }

    /// Returns a slice of self for the provided range. Slicing a placeholder yields a
    /// placeholder.
    ///
    /// # Panics
    ///
    /// Requires that `begin <= end` and `end <= self.len()`.
    pub fn slice(&self, range: impl RangeBounds<usize>) -> Self {
        let len = self.len();
        let begin = match range.start_bound() {
            Bound::Included(&n) => n,
            Bound::Excluded(&n) => n.checked_add(1).jagged_expect("out of range"),
            Bound::Unbounded => 0,
        };
        let end = match range.end_bound() {
            Bound::Included(&n) => n.checked_add(1).jagged_expect("out of range"),
            Bound::Excluded(&n) => n,
            Bound::Unbounded => len,
        };

        if begin > end {
            jagged_panic!("range start must not be greater than end: {begin} <= {end}");
        }
        if end > len {
            jagged_panic!("range end out of bounds: {end} <= {len}");
        }

        match &self.inner {
            Inner::Materialized(values) => Self::from(values.slice(begin, end - begin)),
            Inner::Placeholder(_) => Self::placeholder(end - begin),
        }
    }

    /// Return the untyped bytes of this buffer, zero-copy.
    ///
    /// Fails when the byte length of a placeholder does not fit in `usize`.
    pub fn into_byte_buffer(self) -> JaggedResult<ByteBuffer> {
        match self.inner {
            Inner::Materialized(values) => {
                let bytes = values.into_inner();
                let len = bytes.len();
                Ok(ByteBuffer::from(ScalarBuffer::new(bytes, 0, len)))
            }
            Inner::Placeholder(len) => len
                .checked_mul(size_of::<T>())
                .map(ByteBuffer::placeholder)
                .ok_or_else(|| {
                    jagged_err!(
                        AssertionViolation: "placeholder of {len} {} overflows its byte length",
                        std::any::type_name::<T>()
                    )
                }),
        }
    }
}

impl ByteBuffer {
    /// View these bytes as a buffer of `T`.
    ///
    /// The length must be a multiple of the size of `T`. Bytes that are not aligned to `T` are
    /// copied into an aligned allocation.
    pub fn reinterpret<T: ArrowNativeType>(self) -> JaggedResult<Buffer<T>> {
        let width = size_of::<T>();
        let len = self.len();
        if !len.is_multiple_of(width) {
            jagged_bail!(
                "byte length {len} is not a multiple of the size of {}",
                std::any::type_name::<T>()
            );
        }
        match self.inner {
            Inner::Materialized(values) => {
                let mut bytes = values.into_inner();
                if bytes.as_ptr().align_offset(align_of::<T>()) != 0 {
                    log::trace!(
                        "copying {len} bytes to align them to {}",
                        std::any::type_name::<T>()
                    );
                    let mut aligned = MutableBuffer::new(len);
                    aligned.extend_from_slice(bytes.as_slice());
                    bytes = aligned.into();
                }
                Ok(Buffer::from(ScalarBuffer::new(bytes, 0, len / width)))
            }
            Inner::Placeholder(_) => Ok(Buffer::placeholder(len / width)),
        }
    }
}

impl<T: ArrowNativeType> Debug for Buffer<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let mut binding = f.debug_struct("Buffer");
        let fields = binding.field("length", &self.len());
        match &self.inner {
            Inner::Materialized(values) => fields.field("values", &TruncatedDebug(&values[..])),
            Inner::Placeholder(_) => fields.field("placeholder", &true),
        }
        .finish()
    }
}

impl<T: ArrowNativeType> PartialEq for Buffer<T> {
    fn eq(&self, other: &Self) -> bool {
        match (&self.inner, &other.inner) {
            (Inner::Materialized(a), Inner::Materialized(b)) => a[..] == b[..],
            (Inner::Placeholder(a), Inner::Placeholder(b)) => a == b,
            _ => false,
        }
    }
}

impl<T: ArrowNativeType> From<ScalarBuffer<T>> for Buffer<T> {
    fn from(values: ScalarBuffer<T>) -> Self {
        Self {
            inner: Inner::Materialized(values),
        }
    }
}

impl<T: ArrowNativeType> From<Vec<T>> for Buffer<T> {
    fn from(values: Vec<T>) -> Self {
        Self::from(ScalarBuffer::from(values))
    }
}

impl<T: ArrowNativeType> FromIterator<T> for Buffer<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Self::from(iter.into_iter().collect::<Vec<T>>())
    }
}
