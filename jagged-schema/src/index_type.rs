use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};

/// The integer type of a structural buffer: offsets, starts/stops, masks, indices and tags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IndexType {
    /// Signed 8-bit, used by byte masks and union tags.
    I8,
    /// Unsigned 8-bit, used by bit masks.
    U8,
    /// Signed 32-bit.
    I32,
    /// Unsigned 32-bit.
    U32,
    /// Signed 64-bit.
    I64,
}

impl IndexType {
    /// Width of a single index value in bytes.
    pub const fn byte_width(self) -> usize {
        match self {
            IndexType::I8 | IndexType::U8 => 1,
            IndexType::I32 | IndexType::U32 => 4,
            IndexType::I64 => 8,
        }
    }

    /// Types accepted for list offsets, list starts/stops, indirections and union indices.
    pub const fn is_offset_type(self) -> bool {
        matches!(self, IndexType::I32 | IndexType::U32 | IndexType::I64)
    }

    /// Types accepted for the index of an indexed option, where negative values mark missing
    /// entries.
    pub const fn is_signed_offset_type(self) -> bool {
        matches!(self, IndexType::I32 | IndexType::I64)
    }

    /// The largest non-negative value representable by this type.
    pub const fn max_value(self) -> usize {
        match self {
            IndexType::I8 => i8::MAX as usize,
            IndexType::U8 => u8::MAX as usize,
            IndexType::I32 => i32::MAX as usize,
            IndexType::U32 => u32::MAX as usize,
            IndexType::I64 => isize::MAX as usize,
        }
    }
}

impl Display for IndexType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            IndexType::I8 => write!(f, "i8"),
            IndexType::U8 => write!(f, "u8"),
            IndexType::I32 => write!(f, "i32"),
            IndexType::U32 => write!(f, "u32"),
            IndexType::I64 => write!(f, "i64"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serialized_names() {
        assert_eq!(serde_json::to_string(&IndexType::U32).unwrap(), "\"u32\"");
        assert_eq!(
            serde_json::from_str::<IndexType>("\"i64\"").unwrap(),
            IndexType::I64
        );
        assert_eq!(IndexType::I8.to_string(), "i8");
    }

    #[test]
    fn offset_types() {
        assert!(IndexType::U32.is_offset_type());
        assert!(!IndexType::U32.is_signed_offset_type());
        assert!(!IndexType::I8.is_offset_type());
        assert_eq!(IndexType::I32.byte_width(), 4);
    }
}
