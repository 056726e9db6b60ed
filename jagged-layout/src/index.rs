use jagged_buffer::Buffer;
use jagged_error::{JaggedResult, jagged_bail, jagged_err};
use jagged_schema::{IndexType, NativePType};

/// A structural buffer of a layout node: offsets, starts/stops, masks, indices or tags.
#[derive(Clone, Debug, PartialEq)]
pub enum Index {
    /// Signed 8-bit values.
    I8(Buffer<i8>),
    /// Unsigned 8-bit values.
    U8(Buffer<u8>),
    /// Signed 32-bit values.
    I32(Buffer<i32>),
    /// Unsigned 32-bit values.
    U32(Buffer<u32>),
    /// Signed 64-bit values.
    I64(Buffer<i64>),
}

macro_rules! match_each_index {
    ($self:expr, | $buffer:ident | $body:expr) => {
        match $self {
            Index::I8($buffer) => $body,
            Index::U8($buffer) => $body,
            Index::I32($buffer) => $body,
            Index::U32($buffer) => $body,
            Index::I64($buffer) => $body,
        }
    };
}

impl Index {
    /// A placeholder index of the given type. Nothing is allocated.
    pub fn placeholder(index_type: IndexType, len: usize) -> Self {
        match index_type {
            IndexType::I8 => Index::I8(Buffer::placeholder(len)),
            IndexType::U8 => Index::U8(Buffer::placeholder(len)),
            IndexType::I32 => Index::I32(Buffer::placeholder(len)),
            IndexType::U32 => Index::U32(Buffer::placeholder(len)),
            IndexType::I64 => Index::I64(Buffer::placeholder(len)),
        }
    }

    /// The index `0, 1, ..., len - 1`.
    pub fn identity(index_type: IndexType, len: usize) -> JaggedResult<Self> {
        check_identity_len(index_type, len)?;
        Ok(match index_type {
            IndexType::I8 => Index::I8(identity(len)?),
            IndexType::U8 => Index::U8(identity(len)?),
            IndexType::I32 => Index::I32(identity(len)?),
            IndexType::U32 => Index::U32(identity(len)?),
            IndexType::I64 => Index::I64(identity(len)?),
        })
    }

    /// The type of the values.
    pub fn index_type(&self) -> IndexType {
        match self {
            Index::I8(_) => IndexType::I8,
            Index::U8(_) => IndexType::U8,
            Index::I32(_) => IndexType::I32,
            Index::U32(_) => IndexType::U32,
            Index::I64(_) => IndexType::I64,
        }
    }

    /// The number of values.
    pub fn len(&self) -> usize {
        match_each_index!(self, |buffer| buffer.len())
    }

    /// Whether there are no values.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether the values are a placeholder.
    pub fn is_placeholder(&self) -> bool {
        match_each_index!(self, |buffer| buffer.is_placeholder())
    }

    /// The value at `index`, widened to `i64`.
    pub fn value(&self, index: usize) -> JaggedResult<i64> {
        match self {
            Index::I8(buffer) => buffer.value(index).map(i64::from),
            Index::U8(buffer) => buffer.value(index).map(i64::from),
            Index::I32(buffer) => buffer.value(index).map(i64::from),
            Index::U32(buffer) => buffer.value(index).map(i64::from),
            Index::I64(buffer) => buffer.value(index),
        }
    }

    /// All values, widened to `i64`.
    pub fn to_i64_vec(&self) -> JaggedResult<Vec<i64>> {
        Ok(match self {
            Index::I8(buffer) => buffer.as_slice()?.iter().map(|v| i64::from(*v)).collect(),
            Index::U8(buffer) => buffer.as_slice()?.iter().map(|v| i64::from(*v)).collect(),
            Index::I32(buffer) => buffer.as_slice()?.iter().map(|v| i64::from(*v)).collect(),
            Index::U32(buffer) => buffer.as_slice()?.iter().map(|v| i64::from(*v)).collect(),
            Index::I64(buffer) => buffer.to_vec()?,
        })
    }
}

/// Fails when `0..len` does not fit in `index_type`.
pub(crate) fn check_identity_len(index_type: IndexType, len: usize) -> JaggedResult<()> {
    if len > 0 && len - 1 > index_type.max_value() {
        jagged_bail!(
            AssertionViolation: "an identity index of length {len} does not fit in {index_type}"
        );
    }
    Ok(())
}

fn identity<T: NativePType + TryFrom<usize>>(len: usize) -> JaggedResult<Buffer<T>> {
    (0..len)
        .map(|i| {
            T::try_from(i).map_err(|_| jagged_err!(AssertionViolation: "index {i} overflows"))
        })
        .collect::<JaggedResult<Vec<T>>>()
        .map(Buffer::from)
}

macro_rules! index_from_buffer {
    ($T:ty, $variant:ident) => {
        impl From<Buffer<$T>> for Index {
            fn from(buffer: Buffer<$T>) -> Self {
                Index::$variant(buffer)
            }
        }
    };
}

index_from_buffer!(i8, I8);
index_from_buffer!(u8, U8);
index_from_buffer!(i32, I32);
index_from_buffer!(u32, U32);
index_from_buffer!(i64, I64);
