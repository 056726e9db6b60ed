//! Restore a layout read through a projected schema to the shape of the full schema.

use jagged_error::{JaggedResult, jagged_bail, jagged_err};
use jagged_schema::{IndexType, NodeKind, Schema, UnionSchema};

use crate::compatible::node_mismatch;
use crate::{
    Backend, BitMaskedLayout, ByteMaskedLayout, IndexedLayout, IndexedOptionLayout, Layout,
    ListLayout, ListOffsetLayout, PrimitiveLayout, RecordLayout, RegularListLayout, UnionLayout,
    UnmaskedLayout, compatible,
};

/// Reconcile `layout` against `schema` so that the result has exactly the structure and
/// parameters of `schema` and `length` elements.
///
/// Buffers of `layout` are kept as they are. Whatever `schema` has and `layout` lacks is
/// synthesized by `backend` from placeholders, so no values are ever invented. The cases, in
/// order:
///
/// 1. no layout: synthesize the smallest tree of `schema` with `length` elements;
/// 2. same kind: keep the node, reconcile its children and add missing record fields;
/// 3. `Unmasked` layout, option schema: wrap the content with an all-valid mask or index;
/// 4. `Unmasked` layout, other schema: drop the wrapper;
/// 5. union schema, other layout: put the layout in the first compatible alternative;
/// 6. anything else is a schema mismatch.
pub fn reconcile(
    schema: &Schema,
    layout: Option<&Layout>,
    length: usize,
    backend: &dyn Backend,
) -> JaggedResult<Layout> {
    let reconciled = match layout {
        None => {
            log::trace!("synthesizing {} of length {length}", schema.kind());
            synthesize(schema, length, backend)?
        }
        Some(layout) if layout.kind() == schema.kind() => {
            log::trace!("reconciling {} of length {length}", schema.kind());
            check_length(layout, length)?;
            reconcile_node(schema, layout, backend)?
        }
        Some(layout) if layout.kind() == NodeKind::Unmasked && schema.is_option() => {
            log::trace!("wrapping unmasked layout as {}", schema.kind());
            check_length(layout, length)?;
            wrap_option(schema, layout, backend)?
        }
        Some(layout) if layout.kind() == NodeKind::Unmasked => {
            check_length(layout, length)?;
            let Some(read) = layout.content() else {
                jagged_bail!(AssertionViolation: "unmasked layout has no content");
            };
            log::debug!(
                "discarding unmasked wrapper around {} where {} is expected",
                read.kind(),
                schema.kind()
            );
            return reconcile(schema, Some(read), read.len(), backend);
        }
        Some(layout) if schema.kind() == NodeKind::Union => {
            log::trace!("placing {} layout into {}", layout.kind(), schema);
            check_length(layout, length)?;
            let union = schema
                .as_union()
                .ok_or_else(|| jagged_err!(AssertionViolation: "{} is not a union", schema))?;
            wrap_union(union, layout, backend)?
        }
        Some(layout) => jagged_bail!(
            SchemaMismatch: "cannot reconcile a {} layout with a {} schema",
            layout.kind(),
            schema.kind()
        ),
    };
    Ok(reconciled.with_parameters(schema.parameters().clone()))
}

fn check_length(layout: &Layout, length: usize) -> JaggedResult<()> {
    if layout.len() != length {
        jagged_bail!(
            AssertionViolation: "{} layout has length {} where {length} is required",
            layout.kind(),
            layout.len()
        );
    }
    Ok(())
}

/// Case 1.
fn synthesize(schema: &Schema, length: usize, backend: &dyn Backend) -> JaggedResult<Layout> {
    let absent = |child: &Schema, length: usize| reconcile(child, None, length, backend);
    Ok(match schema {
        Schema::Primitive(node) => {
            let values = length.checked_mul(node.inner_size()).ok_or_else(
                || jagged_err!(AssertionViolation: "{length} values of {schema} overflow"),
            )?;
            PrimitiveLayout::try_new(
                node.ptype(),
                node.inner_shape(),
                backend.placeholder_data(node.ptype(), values),
                length,
            )?
            .into()
        }
        Schema::Empty(_) => {
            if length != 0 {
                jagged_bail!(AssertionViolation: "cannot synthesize {length} empty elements");
            }
            Layout::empty()
        }
        Schema::List(node) => ListLayout::try_new(
            backend.placeholder_index(node.starts(), length),
            backend.placeholder_index(node.stops(), length),
            absent(node.content(), 0)?,
        )?
        .into(),
        Schema::ListOffset(node) => {
            let offsets = length.checked_add(1).ok_or_else(
                || jagged_err!(AssertionViolation: "{length} lists overflow their offsets"),
            )?;
            ListOffsetLayout::try_new(
                backend.placeholder_index(node.offsets(), offsets),
                absent(node.content(), 0)?,
            )?
            .into()
        }
        Schema::RegularList(node) => {
            let items = length.checked_mul(node.size()).ok_or_else(|| {
                jagged_err!(AssertionViolation: "{length} lists of size {} overflow", node.size())
            })?;
            RegularListLayout::try_new(absent(node.content(), items)?, node.size(), length)?.into()
        }
        Schema::Record(node) => RecordLayout::try_new(
            node.names().cloned(),
            node.contents()
                .iter()
                .map(|field| absent(field, length))
                .collect::<JaggedResult<Vec<_>>>()?,
            length,
        )?
        .into(),
        Schema::ByteMaskedOption(node) => ByteMaskedLayout::try_new(
            backend.placeholder_index(IndexType::I8, length),
            absent(node.content(), length)?,
            node.valid_when(),
        )?
        .into(),
        Schema::BitMaskedOption(node) => BitMaskedLayout::try_new(
            backend.placeholder_index(IndexType::U8, length.div_ceil(8)),
            absent(node.content(), length)?,
            node.valid_when(),
            length,
            node.lsb_order(),
        )?
        .into(),
        Schema::IndexedOption(node) => IndexedOptionLayout::try_new(
            backend.placeholder_index(node.index(), length),
            absent(node.content(), 0)?,
        )?
        .into(),
        Schema::Indexed(node) => IndexedLayout::try_new(
            backend.placeholder_index(node.index(), length),
            absent(node.content(), 0)?,
        )?
        .into(),
        Schema::Unmasked(node) => UnmaskedLayout::new(absent(node.content(), length)?).into(),
        Schema::Union(node) => UnionLayout::try_new(
            backend.placeholder_index(IndexType::I8, length),
            backend.placeholder_index(node.index(), length),
            node.contents()
                .iter()
                .map(|alternative| absent(alternative, 0))
                .collect::<JaggedResult<Vec<_>>>()?,
        )?
        .into(),
    })
}

/// Case 2.
fn reconcile_node(schema: &Schema, layout: &Layout, backend: &dyn Backend) -> JaggedResult<Layout> {
    if let Some(reason) = node_mismatch(schema, layout) {
        jagged_bail!(SchemaMismatch: "{} layout does not match {schema}: {reason}", layout.kind());
    }
    match (schema, layout) {
        (Schema::Primitive(_), Layout::Primitive(_)) | (Schema::Empty(_), Layout::Empty(_)) => {
            Ok(layout.clone())
        }
        (Schema::Record(expected), Layout::Record(actual)) => {
            let contents = expected
                .fields()
                .map(|(name, field)| match actual.field(&name) {
                    Some(read) => reconcile(field, Some(read), read.len(), backend),
                    None => {
                        log::trace!("restoring field {name}");
                        reconcile(field, None, layout.len(), backend)
                    }
                })
                .collect::<JaggedResult<Vec<_>>>()?;
            Ok(RecordLayout::try_new(expected.names().cloned(), contents, layout.len())?.into())
        }
        (Schema::Union(expected), Layout::Union(actual)) => reconcile_union(expected, actual, backend),
        _ => match (schema.content(), layout.content()) {
            (Some(expected), Some(actual)) => {
                layout.with_content(reconcile(expected, Some(actual), actual.len(), backend)?)
            }
            _ => jagged_bail!(
                AssertionViolation: "{} nodes of schema and layout disagree on their content",
                schema.kind()
            ),
        },
    }
}

/// Case 2 for unions: every schema alternative takes the first compatible layout alternative that
/// is still unclaimed, and tags are rewritten to the schema's order.
fn reconcile_union(
    schema: &UnionSchema,
    layout: &UnionLayout,
    backend: &dyn Backend,
) -> JaggedResult<Layout> {
    let mut unclaimed = layout.contents().iter().enumerate().collect::<Vec<_>>();
    let mut mapping = vec![0i8; layout.contents().len()];
    let mut contents = Vec::with_capacity(schema.nalternatives());

    for (new_tag, alternative) in schema.contents().iter().enumerate() {
        let claimed = unclaimed
            .iter()
            .position(|(_, read)| compatible(alternative, Some(*read)));
        match claimed {
            Some(position) => {
                let (old_tag, read) = unclaimed.remove(position);
                mapping[old_tag] = i8::try_from(new_tag)
                    .map_err(|_| jagged_err!(AssertionViolation: "union tag {new_tag} overflows"))?;
                contents.push(reconcile(alternative, Some(read), read.len(), backend)?);
            }
            None => {
                log::debug!("synthesizing union alternative {new_tag} ({alternative})");
                contents.push(reconcile(alternative, None, 0, backend)?);
            }
        }
    }

    if let Some((old_tag, read)) = unclaimed.first() {
        jagged_bail!(
            SchemaMismatch: "union alternative {old_tag} ({}) matches no alternative of {}",
            read.schema(),
            Schema::Union(schema.clone())
        );
    }

    let is_identity = mapping
        .iter()
        .enumerate()
        .all(|(old_tag, new_tag)| usize::try_from(*new_tag).is_ok_and(|new_tag| new_tag == old_tag));
    let tags = if is_identity {
        layout.tags().clone()
    } else {
        backend.remap_tags(layout.tags(), &mapping)?
    };
    Ok(UnionLayout::try_new(tags, layout.index().clone(), contents)?.into())
}

/// Case 3.
fn wrap_option(schema: &Schema, layout: &Layout, backend: &dyn Backend) -> JaggedResult<Layout> {
    let length = layout.len();
    let content = match (schema.content(), layout.content()) {
        (Some(expected), Some(read)) => reconcile(expected, Some(read), read.len(), backend)?,
        _ => jagged_bail!(AssertionViolation: "option {} has no content", schema.kind()),
    };
    Ok(match schema {
        Schema::ByteMaskedOption(node) => ByteMaskedLayout::try_new(
            backend.valid_byte_mask(length, node.valid_when()),
            content,
            node.valid_when(),
        )?
        .into(),
        Schema::BitMaskedOption(node) => BitMaskedLayout::try_new(
            backend.valid_bit_mask(length, node.valid_when()),
            content,
            node.valid_when(),
            length,
            node.lsb_order(),
        )?
        .into(),
        Schema::IndexedOption(node) => {
            IndexedOptionLayout::try_new(backend.identity_index(node.index(), length)?, content)?
                .into()
        }
        _ => jagged_bail!(
            AssertionViolation: "cannot wrap an unmasked layout as {}",
            schema.kind()
        ),
    })
}

/// Case 5.
fn wrap_union(schema: &UnionSchema, layout: &Layout, backend: &dyn Backend) -> JaggedResult<Layout> {
    let Some(chosen) = schema
        .contents()
        .iter()
        .position(|alternative| compatible(alternative, Some(layout)))
    else {
        jagged_bail!(
            UnresolvedUnion: "no alternative of {} is compatible with {}",
            Schema::Union(schema.clone()),
            layout.schema()
        );
    };

    let contents = schema
        .contents()
        .iter()
        .enumerate()
        .map(|(tag, alternative)| {
            if tag == chosen {
                reconcile(alternative, Some(layout), layout.len(), backend)
            } else {
                log::debug!("synthesizing union alternative {tag} ({alternative})");
                reconcile(alternative, None, 0, backend)
            }
        })
        .collect::<JaggedResult<Vec<_>>>()?;

    let tag = i8::try_from(chosen)
        .map_err(|_| jagged_err!(AssertionViolation: "union tag {chosen} overflows"))?;
    Ok(UnionLayout::try_new(
        backend.constant_tags(layout.len(), tag),
        backend.identity_index(schema.index(), layout.len())?,
        contents,
    )?
    .into())
}

#[cfg(test)]
mod tests {
    use jagged_buffer::{Buffer, buffer};
    use jagged_error::JaggedError;
    use jagged_schema::{ARRAY_PARAMETER, PType, Parameters};
    use rstest::rstest;

    use super::*;
    use crate::{HostBackend, Index, MetaBackend, unproject_layout};

    fn ints(values: &[i64]) -> Layout {
        Layout::primitive(Buffer::copy_from(values)).unwrap()
    }

    fn offsets(offsets: &[i64], content: Layout) -> Layout {
        ListOffsetLayout::try_new(Index::from(Buffer::copy_from(offsets)), content)
            .unwrap()
            .into()
    }

    fn string() -> Schema {
        Schema::list_offset(Schema::primitive(PType::U8)).with_parameter(ARRAY_PARAMETER, "string")
    }

    #[test]
    fn missing_record_field_is_synthesized() {
        let schema = Schema::record([
            ("x", Schema::primitive(PType::I64)),
            ("y", Schema::list(Schema::primitive(PType::F64))),
        ])
        .unwrap();
        let partial = Layout::record([("x", ints(&[1, 2, 3, 4]))], 4).unwrap();

        let reconciled = unproject_layout(&schema, &partial, &HostBackend).unwrap();
        assert_eq!(reconciled.schema(), schema);
        assert_eq!(reconciled.len(), 4);
        assert_eq!(reconciled.field("x").unwrap(), &ints(&[1, 2, 3, 4]));

        let Layout::List(y) = reconciled.field("y").unwrap() else {
            panic!("y is not a list")
        };
        assert_eq!(y.starts().len(), 4);
        assert!(y.starts().is_placeholder());
        assert!(y.stops().is_placeholder());
        assert_eq!(y.content().len(), 0);
        assert_eq!(y.content().kind(), NodeKind::Primitive);
        assert!(y.content().as_primitive().unwrap().data().is_placeholder());
    }

    #[test]
    fn field_order_follows_schema() {
        let schema = Schema::record([
            ("a", Schema::primitive(PType::I64)),
            ("b", Schema::primitive(PType::I64)),
            ("c", Schema::primitive(PType::I64)),
        ])
        .unwrap();
        let partial = Layout::record([("c", ints(&[3])), ("a", ints(&[1]))], 1).unwrap();
        let reconciled = unproject_layout(&schema, &partial, &HostBackend).unwrap();
        let record = reconciled.as_record().unwrap();
        assert_eq!(
            record.field_names().iter().map(AsRef::as_ref).collect::<Vec<&str>>(),
            vec!["a", "b", "c"]
        );
        assert_eq!(record.field("a").unwrap(), &ints(&[1]));
        assert_eq!(record.field("c").unwrap(), &ints(&[3]));
        assert!(!record.field("b").unwrap().is_fully_materialized());
    }

    #[rstest]
    #[case(true, 1)]
    #[case(false, 0)]
    fn unmasked_becomes_byte_masked(#[case] valid_when: bool, #[case] mask: i64) {
        let schema = Schema::byte_masked(Schema::primitive(PType::I32), valid_when);
        let partial = Layout::unmasked(Layout::primitive(buffer![1i32, 2, 3]).unwrap());

        let reconciled = unproject_layout(&schema, &partial, &HostBackend).unwrap();
        let Layout::ByteMaskedOption(node) = &reconciled else {
            panic!("not byte masked")
        };
        assert_eq!(node.mask().to_i64_vec().unwrap(), vec![mask; 3]);
        assert_eq!(node.content(), &Layout::primitive(buffer![1i32, 2, 3]).unwrap());
        assert_eq!(reconciled.len(), 3);
    }

    #[test]
    fn unmasked_becomes_bit_masked() {
        let schema = Schema::bit_masked(Schema::primitive(PType::I64), true, true);
        let partial = Layout::unmasked(ints(&[1; 10]));
        let reconciled = unproject_layout(&schema, &partial, &HostBackend).unwrap();
        let Layout::BitMaskedOption(node) = &reconciled else {
            panic!("not bit masked")
        };
        assert_eq!(node.mask().to_i64_vec().unwrap(), vec![0xff, 0xff]);
        assert_eq!(reconciled.len(), 10);
    }

    #[test]
    fn unmasked_becomes_indexed_option() {
        let schema = Schema::indexed_option(string());
        let partial = Layout::unmasked(offsets(
            &[0, 1, 3],
            Layout::primitive(buffer![b'a', b'b', b'c']).unwrap(),
        ));
        let reconciled = unproject_layout(&schema, &partial, &HostBackend).unwrap();
        let Layout::IndexedOption(node) = &reconciled else {
            panic!("not indexed")
        };
        assert_eq!(node.index().index_type(), IndexType::I64);
        assert_eq!(node.index().to_i64_vec().unwrap(), vec![0, 1]);
        assert_eq!(node.content().parameters().array_name(), Some("string"));
    }

    #[test]
    fn unmasked_artifact_is_discarded() {
        let schema = Schema::list_offset(Schema::primitive(PType::I64));
        let partial = Layout::unmasked(offsets(&[0, 2], ints(&[5, 6])));
        let reconciled = unproject_layout(&schema, &partial, &HostBackend).unwrap();
        assert_eq!(reconciled, offsets(&[0, 2], ints(&[5, 6])));
    }

    #[test]
    fn plain_layout_is_placed_into_union() {
        let schema = Schema::union([
            Schema::record([("a", Schema::primitive(PType::I64))]).unwrap(),
            Schema::primitive(PType::F64),
        ])
        .unwrap();
        let floats = Layout::primitive(buffer![0.5f64, 1.5, 2.5, 3.5, 4.5]).unwrap();

        let reconciled = unproject_layout(&schema, &floats, &HostBackend).unwrap();
        let union = reconciled.as_union().unwrap();
        assert_eq!(reconciled.len(), 5);
        assert_eq!(union.tags().to_i64_vec().unwrap(), vec![1; 5]);
        assert_eq!(union.index().to_i64_vec().unwrap(), vec![0, 1, 2, 3, 4]);
        assert_eq!(union.contents()[1], floats);
        assert_eq!(union.contents()[0].len(), 0);
        assert_eq!(union.contents()[0].kind(), NodeKind::Record);
        assert!(!union.contents()[0].is_fully_materialized());
    }

    #[test]
    fn first_compatible_alternative_wins() {
        let schema = Schema::union([
            Schema::primitive(PType::I64),
            Schema::record([("a", Schema::primitive(PType::I64))]).unwrap(),
            Schema::record([
                ("a", Schema::primitive(PType::I64)),
                ("b", Schema::primitive(PType::Bool)),
            ])
            .unwrap(),
        ])
        .unwrap();
        let partial = Layout::record([("a", ints(&[7]))], 1).unwrap();
        let reconciled = unproject_layout(&schema, &partial, &HostBackend).unwrap();
        let union = reconciled.as_union().unwrap();
        assert_eq!(union.tags().to_i64_vec().unwrap(), vec![1]);
        assert_eq!(union.contents()[1], partial);
        assert_eq!(union.contents()[2].len(), 0);
    }

    #[test]
    fn union_alternatives_are_remapped() {
        let schema = Schema::union([
            Schema::primitive(PType::I64),
            string(),
            Schema::primitive(PType::F64),
        ])
        .unwrap();
        let partial: Layout = UnionLayout::try_new(
            Index::from(buffer![0i8, 1, 0]),
            Index::from(buffer![0i64, 0, 1]),
            vec![
                Layout::primitive(buffer![1.0f64, 2.0]).unwrap(),
                ints(&[9]),
            ],
        )
        .unwrap()
        .into();

        let reconciled = unproject_layout(&schema, &partial, &HostBackend).unwrap();
        let union = reconciled.as_union().unwrap();
        assert_eq!(union.tags().to_i64_vec().unwrap(), vec![2, 0, 2]);
        assert_eq!(union.index(), partial.as_union().unwrap().index());
        assert_eq!(union.contents()[0], ints(&[9]));
        assert_eq!(union.contents()[1].len(), 0);
        assert_eq!(union.contents()[1].parameters().array_name(), Some("string"));
        assert_eq!(union.contents()[2], Layout::primitive(buffer![1.0f64, 2.0]).unwrap());
    }

    #[test]
    fn claimed_union_alternative_is_reconciled() {
        let schema = Schema::union([
            Schema::primitive(PType::F64),
            Schema::record([
                ("a", Schema::primitive(PType::I64)),
                ("b", Schema::list_offset(Schema::primitive(PType::F32))),
            ])
            .unwrap(),
        ])
        .unwrap();
        let partial: Layout = UnionLayout::try_new(
            Index::from(buffer![0i8, 1, 0]),
            Index::from(buffer![0i64, 0, 1]),
            vec![
                Layout::record([("a", ints(&[4, 5]))], 2).unwrap(),
                Layout::primitive(buffer![0.5f64]).unwrap(),
            ],
        )
        .unwrap()
        .into();

        let reconciled = unproject_layout(&schema, &partial, &HostBackend).unwrap();
        assert_eq!(reconciled.schema(), schema);
        let union = reconciled.as_union().unwrap();
        assert_eq!(union.tags().to_i64_vec().unwrap(), vec![1, 0, 1]);
        assert_eq!(union.index(), partial.as_union().unwrap().index());
        assert_eq!(union.contents()[0], Layout::primitive(buffer![0.5f64]).unwrap());

        let record = &union.contents()[1];
        assert_eq!(record.len(), 2);
        assert_eq!(record.field("a").unwrap(), &ints(&[4, 5]));
        let b = record.field("b").unwrap();
        assert_eq!(b.kind(), NodeKind::ListOffset);
        assert_eq!(b.len(), 2);
        assert!(!b.is_fully_materialized());
    }

    #[test]
    fn indexed_content_is_reconciled() {
        let schema = Schema::indexed(
            Schema::record([
                ("p", Schema::primitive(PType::I64)),
                ("q", Schema::primitive(PType::F64)),
            ])
            .unwrap(),
        );
        let q = Layout::primitive(buffer![0.5f64, 1.5, 2.5]).unwrap();
        let partial: Layout = IndexedLayout::try_new(
            Index::from(buffer![2i64, 0]),
            Layout::record([("q", q.clone())], 3).unwrap(),
        )
        .unwrap()
        .into();

        let reconciled = unproject_layout(&schema, &partial, &HostBackend).unwrap();
        assert_eq!(reconciled.schema(), schema);
        let Layout::Indexed(node) = &reconciled else {
            panic!("not indexed")
        };
        assert_eq!(node.index().to_i64_vec().unwrap(), vec![2, 0]);
        assert_eq!(node.content().field("q").unwrap(), &q);
        let p = node.content().field("p").unwrap();
        assert_eq!(p.len(), 3);
        assert!(p.as_primitive().unwrap().data().is_placeholder());
    }

    #[test]
    fn union_tags_are_kept_when_order_agrees() {
        let schema = Schema::union([Schema::primitive(PType::I64), Schema::primitive(PType::F64)])
            .unwrap();
        let tags = Index::placeholder(IndexType::I8, 2);
        let partial: Layout = UnionLayout::try_new(
            tags.clone(),
            Index::from(buffer![0i64, 1]),
            vec![ints(&[1, 2])],
        )
        .unwrap()
        .into();
        let reconciled = unproject_layout(&schema, &partial, &HostBackend).unwrap();
        assert_eq!(reconciled.as_union().unwrap().tags(), &tags);
    }

    #[test]
    fn unmatched_union_alternative_is_a_mismatch() {
        let schema = Schema::union([Schema::primitive(PType::I64), Schema::primitive(PType::F64)])
            .unwrap();
        let partial: Layout = UnionLayout::try_new(
            Index::from(buffer![0i8, 1]),
            Index::from(buffer![0i64, 0]),
            vec![ints(&[1]), Layout::primitive(buffer![1u8]).unwrap()],
        )
        .unwrap()
        .into();
        let err = unproject_layout(&schema, &partial, &HostBackend).unwrap_err();
        assert!(matches!(err, JaggedError::SchemaMismatch(..)), "{err}");
    }

    #[test]
    fn no_compatible_alternative() {
        let schema = Schema::union([Schema::primitive(PType::I64), string()]).unwrap();
        let err = unproject_layout(&schema, &Layout::primitive(buffer![1.0f32]).unwrap(), &HostBackend)
            .unwrap_err();
        assert!(matches!(err, JaggedError::UnresolvedUnion(..)), "{err}");
        assert!(err.is_schema_mismatch());
    }

    #[rstest]
    #[case(Schema::list_offset(Schema::primitive(PType::I64)), "cannot reconcile a Primitive layout with a ListOffset schema")]
    #[case(Schema::primitive(PType::F64), "primitive type is int64, expected float64")]
    #[case(Schema::regular(Schema::primitive(PType::I64), 2), "cannot reconcile a Primitive layout with a RegularList schema")]
    fn mismatches(#[case] schema: Schema, #[case] message: &str) {
        let err = unproject_layout(&schema, &ints(&[1, 2]), &HostBackend).unwrap_err();
        assert!(matches!(err, JaggedError::SchemaMismatch(..)), "{err}");
        assert!(err.to_string().contains(message), "{err}");
    }

    #[test]
    fn extra_record_field_is_a_mismatch() {
        let schema = Schema::record([("x", Schema::primitive(PType::I64))]).unwrap();
        let partial = Layout::record([("x", ints(&[1])), ("z", ints(&[1]))], 1).unwrap();
        let err = unproject_layout(&schema, &partial, &HostBackend).unwrap_err();
        assert!(err.to_string().contains("field z is not part of the schema"), "{err}");
    }

    #[test]
    fn full_layout_is_unchanged() {
        let schema = Schema::record([
            ("run", Schema::primitive(PType::I64)),
            ("muon", Schema::list_offset(Schema::byte_masked(Schema::primitive(PType::F32), true))),
        ])
        .unwrap();
        let muons = ByteMaskedLayout::try_new(
            Index::from(buffer![1i8, 0, 1]),
            Layout::primitive(buffer![1.0f32, 0.0, 3.0]).unwrap(),
            true,
        )
        .unwrap();
        let full = Layout::record(
            [("run", ints(&[1, 2])), ("muon", offsets(&[0, 1, 3], muons.into()))],
            2,
        )
        .unwrap();
        assert_eq!(unproject_layout(&schema, &full, &HostBackend).unwrap(), full);
    }

    #[test]
    fn parameters_come_from_the_schema() {
        let schema = string();
        let partial = offsets(&[0, 2], Layout::primitive(buffer![b'h', b'i']).unwrap());
        let reconciled = unproject_layout(&schema, &partial, &HostBackend).unwrap();
        assert_eq!(reconciled.parameters().array_name(), Some("string"));

        let tagged = partial.with_parameters(Parameters::new().with("other", 1));
        let reconciled = unproject_layout(&schema, &tagged, &HostBackend).unwrap();
        assert_eq!(reconciled.parameters(), schema.parameters());
    }

    #[test]
    fn absent_lengths() {
        let schema = Schema::record([
            ("masked", Schema::byte_masked(Schema::primitive(PType::I64), true)),
            ("bits", Schema::bit_masked(Schema::primitive(PType::I64), true, false)),
            ("indexed", Schema::indexed_option(Schema::primitive(PType::I64))),
            ("regular", Schema::regular(Schema::primitive_with_shape(PType::F32, [3]), 2)),
            ("unmasked", Schema::unmasked(Schema::primitive(PType::I64))),
            ("offsets", Schema::list_offset(Schema::primitive(PType::I64))),
            ("union", Schema::union([Schema::primitive(PType::I64), string()]).unwrap()),
            ("lookup", Schema::indexed(Schema::primitive(PType::I64))),
        ])
        .unwrap();
        let layout = reconcile(&schema, None, 9, &HostBackend).unwrap();
        assert_eq!(layout.schema(), schema);
        assert_eq!(layout.len(), 9);

        let child = |name: &str| layout.field(name).unwrap();
        assert_eq!(child("masked").len(), 9);
        assert_eq!(child("masked").content().unwrap().len(), 9);
        let Layout::BitMaskedOption(bits) = child("bits") else {
            panic!("not bit masked")
        };
        assert_eq!(bits.mask().len(), 2);
        assert_eq!(bits.content().len(), 9);
        assert_eq!(child("indexed").content().unwrap().len(), 0);
        assert_eq!(child("regular").content().unwrap().len(), 18);
        let regular = child("regular").content().unwrap().as_primitive().unwrap();
        assert_eq!(regular.data().len(), 18 * 3 * 4);
        assert_eq!(child("unmasked").content().unwrap().len(), 9);
        let Layout::ListOffset(lists) = child("offsets") else {
            panic!("not a list")
        };
        assert_eq!(lists.offsets().len(), 10);
        let union = child("union").as_union().unwrap();
        assert_eq!(union.tags().len(), 9);
        assert!(union.contents().iter().all(Layout::is_empty));
        assert_eq!(union.contents()[1].parameters().array_name(), Some("string"));
        let Layout::Indexed(lookup) = child("lookup") else {
            panic!("not indexed")
        };
        assert_eq!(lookup.index().len(), 9);
        assert!(lookup.index().is_placeholder());
        assert_eq!(lookup.content().len(), 0);
    }

    #[test]
    fn empty_cannot_have_elements() {
        let err = reconcile(&Schema::empty(), None, 1, &HostBackend).unwrap_err();
        assert!(matches!(err, JaggedError::AssertionViolation(..)));
        assert_eq!(reconcile(&Schema::empty(), None, 0, &HostBackend).unwrap(), Layout::empty());
        let regular = Schema::regular(Schema::empty(), 0);
        assert_eq!(reconcile(&regular, None, 5, &HostBackend).unwrap().len(), 5);
    }

    #[test]
    fn lengths_must_agree() {
        let err = reconcile(&Schema::primitive(PType::I64), Some(&ints(&[1])), 2, &HostBackend)
            .unwrap_err();
        assert!(matches!(err, JaggedError::AssertionViolation(..)));

        let schema = Schema::list_offset(Schema::primitive(PType::I64));
        let unmasked = Layout::unmasked(offsets(&[0, 2], ints(&[5, 6])));
        let err = reconcile(&schema, Some(&unmasked), 3, &HostBackend).unwrap_err();
        assert!(matches!(err, JaggedError::AssertionViolation(..)), "{err}");
        assert!(reconcile(&schema, Some(&unmasked), 1, &HostBackend).is_ok());
    }

    #[test]
    fn meta_backend_allocates_nothing() {
        let schema = Schema::record([
            ("x", Schema::byte_masked(Schema::primitive(PType::I64), true)),
            ("y", Schema::union([Schema::primitive(PType::I64), string()]).unwrap()),
        ])
        .unwrap();
        let partial = Layout::record(
            [
                ("x", Layout::unmasked(ints(&[1, 2]))),
                ("y", ints(&[3, 4])),
            ],
            2,
        )
        .unwrap();
        let reconciled = unproject_layout(&schema, &partial, &MetaBackend).unwrap();
        let Layout::ByteMaskedOption(x) = reconciled.field("x").unwrap() else {
            panic!("not byte masked")
        };
        assert!(x.mask().is_placeholder());
        assert_eq!(x.content(), &ints(&[1, 2]));
        let y = reconciled.field("y").unwrap().as_union().unwrap();
        assert!(y.tags().is_placeholder());
        assert!(y.index().is_placeholder());
        assert_eq!(y.contents()[0], ints(&[3, 4]));
    }
}
