use std::fmt::Display;

use itertools::Itertools;
use jagged_schema::{NodeKind, Schema};

use crate::Layout;

/// Whether `layout` could have been read from a projection of `schema`.
///
/// Only structure is compared, never values. A missing layout is compatible with everything. Record
/// fields the layout lacks are ignored, fields the schema lacks are not. An `Unmasked` layout is
/// compatible with any option schema whose content it fits, and a union schema accepts any layout
/// one of its alternatives accepts.
pub fn compatible(schema: &Schema, layout: Option<&Layout>) -> bool {
    layout.is_none_or(|layout| compatible_layout(schema, layout))
}

fn compatible_layout(schema: &Schema, layout: &Layout) -> bool {
    if schema.kind() == layout.kind() {
        if node_mismatch(schema, layout).is_some() {
            return false;
        }
        return match (schema, layout) {
            (Schema::Record(record), Layout::Record(fields)) => fields
                .field_names()
                .iter()
                .zip(fields.contents())
                .all(|(name, field)| {
                    record
                        .field(name)
                        .is_some_and(|child| compatible_layout(child, field))
                }),
            (Schema::Union(union), Layout::Union(alternatives)) => {
                alternatives.contents().iter().all(|alternative| {
                    union
                        .contents()
                        .iter()
                        .any(|child| compatible_layout(child, alternative))
                })
            }
            _ => compatible_contents(schema, layout),
        };
    }

    if layout.kind() == NodeKind::Unmasked && schema.is_option() {
        return compatible_contents(schema, layout);
    }

    schema.as_union().is_some_and(|union| {
        union
            .contents()
            .iter()
            .any(|child| compatible_layout(child, layout))
    })
}

fn compatible_contents(schema: &Schema, layout: &Layout) -> bool {
    match (schema.content(), layout.content()) {
        (Some(schema), Some(layout)) => compatible_layout(schema, layout),
        (None, None) => true,
        _ => false,
    }
}

/// Describes how a layout node differs from a schema node of the same kind, ignoring children and
/// parameters.
pub(crate) fn node_mismatch(schema: &Schema, layout: &Layout) -> Option<String> {
    match (schema, layout) {
        (Schema::Primitive(expected), Layout::Primitive(actual)) => {
            differs("primitive type", expected.ptype(), actual.ptype()).or_else(|| {
                differs(
                    "inner shape",
                    expected.inner_shape().iter().format(" * "),
                    actual.inner_shape().iter().format(" * "),
                )
            })
        }
        (Schema::List(expected), Layout::List(actual)) => {
            differs("starts", expected.starts(), actual.starts().index_type())
                .or_else(|| differs("stops", expected.stops(), actual.stops().index_type()))
        }
        (Schema::ListOffset(expected), Layout::ListOffset(actual)) => {
            differs("offsets", expected.offsets(), actual.offsets().index_type())
        }
        (Schema::RegularList(expected), Layout::RegularList(actual)) => {
            differs("list size", expected.size(), actual.size())
        }
        (Schema::Record(expected), Layout::Record(actual)) => {
            if expected.is_tuple() != actual.is_tuple() {
                return Some(if expected.is_tuple() {
                    "named fields where a tuple is expected".to_string()
                } else {
                    "a tuple where named fields are expected".to_string()
                });
            }
            actual
                .field_names()
                .iter()
                .find(|name| expected.field(name).is_none())
                .map(|name| format!("field {name} is not part of the schema"))
        }
        (Schema::ByteMaskedOption(expected), Layout::ByteMaskedOption(actual)) => {
            differs("valid_when", expected.valid_when(), actual.valid_when())
        }
        (Schema::BitMaskedOption(expected), Layout::BitMaskedOption(actual)) => {
            differs("valid_when", expected.valid_when(), actual.valid_when())
                .or_else(|| differs("lsb_order", expected.lsb_order(), actual.lsb_order()))
        }
        (Schema::IndexedOption(expected), Layout::IndexedOption(actual)) => {
            differs("index", expected.index(), actual.index().index_type())
        }
        (Schema::Indexed(expected), Layout::Indexed(actual)) => {
            differs("index", expected.index(), actual.index().index_type())
        }
        (Schema::Union(expected), Layout::Union(actual)) => {
            differs("index", expected.index(), actual.index().index_type())
        }
        (Schema::Empty(_), Layout::Empty(_)) | (Schema::Unmasked(_), Layout::Unmasked(_)) => None,
        _ => Some(format!("{} is not {}", layout.kind(), schema.kind())),
    }
}

fn differs<T: Display>(what: &str, expected: T, actual: T) -> Option<String> {
    let (expected, actual) = (expected.to_string(), actual.to_string());
    (expected != actual).then(|| format!("{what} is {actual}, expected {expected}"))
}
