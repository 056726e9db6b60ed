use std::fmt::{Display, Formatter};

/// The kind of a schema or layout node, without any of its contents.
///
/// Reconciliation is driven by comparing the kind of a layout node with the kind of the schema
/// node at the same position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    /// Fixed-width values.
    Primitive,
    /// A node with no values and no type.
    Empty,
    /// Variable-length lists addressed by start/stop pairs.
    List,
    /// Variable-length lists addressed by a monotonic offsets buffer.
    ListOffset,
    /// Fixed-size lists.
    RegularList,
    /// Named fields or, for tuples, positional fields.
    Record,
    /// Optional values with one mask byte per value.
    ByteMaskedOption,
    /// Optional values with one mask bit per value.
    BitMaskedOption,
    /// Optional values addressed through an index where negative entries are missing.
    IndexedOption,
    /// Non-optional indirection through an index.
    Indexed,
    /// Optional values that are all valid.
    Unmasked,
    /// Tagged union of alternatives.
    Union,
}

impl NodeKind {
    /// Whether nodes of this kind represent optional values.
    pub const fn is_option(self) -> bool {
        matches!(
            self,
            NodeKind::ByteMaskedOption
                | NodeKind::BitMaskedOption
                | NodeKind::IndexedOption
                | NodeKind::Unmasked
        )
    }

    /// Whether nodes of this kind represent lists.
    pub const fn is_list(self) -> bool {
        matches!(
            self,
            NodeKind::List | NodeKind::ListOffset | NodeKind::RegularList
        )
    }
}

impl Display for NodeKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        std::fmt::Debug::fmt(self, f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classification() {
        assert!(NodeKind::Unmasked.is_option());
        assert!(!NodeKind::Indexed.is_option());
        assert!(NodeKind::RegularList.is_list());
        assert!(!NodeKind::Indexed.is_list());
        assert_eq!(NodeKind::ByteMaskedOption.to_string(), "ByteMaskedOption");
    }
}
