#![allow(dead_code)]

use jagged::buffer::{Buffer, ByteBuffer};
use jagged::error::{JaggedResult, jagged_bail};
use jagged::layout::{
    Index, IndexedLayout, Layout, ListLayout, ListOffsetLayout, PrimitiveLayout, RecordLayout,
    RegularListLayout,
};
use jagged::scan::PartitionReader;
use jagged::schema::{IndexType, Schema};
use log::LevelFilter;
use simplelog::{Config, TestLogger};

pub fn init_logging() {
    TestLogger::init(LevelFilter::Trace, Config::default()).ok();
}

/// Decodes whatever projection it is asked for, with every list holding two items. Like a
/// Parquet reader it returns option columns as `Unmasked` and cannot represent unions, which come
/// back as their first alternative.
#[derive(Debug, Default)]
pub struct SyntheticReader;

impl PartitionReader for SyntheticReader {
    type Partition = usize;

    fn read(&self, rows: &usize, projected: &Schema, _columns: &[String]) -> JaggedResult<Layout> {
        generate(projected, *rows)
    }

    fn row_count(&self, rows: &usize) -> Option<usize> {
        Some(*rows)
    }
}

pub fn generate(schema: &Schema, length: usize) -> JaggedResult<Layout> {
    let layout = match schema {
        Schema::Primitive(node) => {
            let nbytes = length * node.inner_size() * node.ptype().byte_width();
            let bytes: ByteBuffer = (0..nbytes).map(|i| u8::try_from(i % 251).unwrap()).collect();
            PrimitiveLayout::try_new(node.ptype(), node.inner_shape(), bytes, length)?.into()
        }
        Schema::Empty(_) => {
            if length > 0 {
                jagged_bail!("cannot generate {length} empty values");
            }
            Layout::empty()
        }
        Schema::List(node) => ListLayout::try_new(
            index(node.starts(), (0..length).map(|i| 2 * i)),
            index(node.stops(), (0..length).map(|i| 2 * i + 2)),
            generate(node.content(), 2 * length)?,
        )?
        .into(),
        Schema::ListOffset(node) => ListOffsetLayout::try_new(
            index(node.offsets(), (0..=length).map(|i| 2 * i)),
            generate(node.content(), 2 * length)?,
        )?
        .into(),
        Schema::RegularList(node) => RegularListLayout::try_new(
            generate(node.content(), length * node.size())?,
            node.size(),
            length,
        )?
        .into(),
        Schema::Record(node) => RecordLayout::try_new(
            node.names().cloned(),
            node.contents()
                .iter()
                .map(|field| generate(field, length))
                .collect::<JaggedResult<Vec<_>>>()?,
            length,
        )?
        .into(),
        Schema::Indexed(node) => IndexedLayout::try_new(
            Index::identity(node.index(), length)?,
            generate(node.content(), length)?,
        )?
        .into(),
        Schema::ByteMaskedOption(_)
        | Schema::BitMaskedOption(_)
        | Schema::IndexedOption(_)
        | Schema::Unmasked(_) => {
            let content = schema.content().unwrap();
            return Ok(Layout::unmasked(generate(content, length)?));
        }
        Schema::Union(node) => return generate(&node.contents()[0], length),
    };
    Ok(layout.with_parameters(schema.parameters().clone()))
}

fn index(index_type: IndexType, values: impl Iterator<Item = usize>) -> Index {
    match index_type {
        IndexType::I32 => Index::from(
            values
                .map(|v| i32::try_from(v).unwrap())
                .collect::<Buffer<i32>>(),
        ),
        IndexType::U32 => Index::from(
            values
                .map(|v| u32::try_from(v).unwrap())
                .collect::<Buffer<u32>>(),
        ),
        IndexType::I64 => Index::from(
            values
                .map(|v| i64::try_from(v).unwrap())
                .collect::<Buffer<i64>>(),
        ),
        other => panic!("{other} is not an offset type"),
    }
}

/// Descend through record fields by name and through every single-content node.
pub fn leaf<'a>(layout: &'a Layout, path: &[&str]) -> &'a Layout {
    match (layout, path) {
        (Layout::Primitive(_), []) => layout,
        (Layout::Record(_), [name, rest @ ..]) => leaf(layout.field(name).unwrap(), rest),
        _ => leaf(
            layout
                .content()
                .unwrap_or_else(|| panic!("no path into {}", layout.kind())),
            path,
        ),
    }
}

pub fn leaf_bytes(layout: &Layout, path: &[&str]) -> ByteBuffer {
    leaf(layout, path).as_primitive().unwrap().data().clone()
}
