use std::sync::Arc;

/// A name for a field in a record
pub type FieldName = Arc<str>;
/// An ordered list of field names in a record
pub type FieldNames = Arc<[FieldName]>;

/// The name tuple fields are addressed by: their position, rendered in decimal.
pub fn tuple_field_name(index: usize) -> FieldName {
    index.to_string().into()
}

/// Resolve a tuple field name back to its position.
pub fn tuple_field_index(name: &str, nfields: usize) -> Option<usize> {
    name.parse::<usize>().ok().filter(|idx| *idx < nfields)
}
