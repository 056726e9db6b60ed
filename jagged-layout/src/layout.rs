use std::sync::Arc;

use itertools::Itertools;
use jagged_buffer::{Buffer, ByteBuffer};
use jagged_error::{JaggedExpect, JaggedResult, jagged_bail, jagged_err};
use jagged_schema::{
    FieldName, FieldNames, IndexType, IndexedOptionSchema, IndexedSchema, ListOffsetSchema,
    ListSchema, MAX_UNION_ALTERNATIVES, NativePType, NodeKind, PType, Parameters, RecordSchema,
    Schema, UnionSchema, tuple_field_index, tuple_field_name,
};

use crate::Index;

/// A materialized tree of buffers conforming to a [`Schema`].
///
/// Layouts are immutable. Every node has a length, the number of logical elements it holds, and
/// the constructors of the per-kind nodes check the length relations between a node, its
/// structural buffers and its children. Buffers may be placeholders.
#[derive(Clone, Debug, PartialEq)]
pub enum Layout {
    /// Fixed-width values.
    Primitive(PrimitiveLayout),
    /// No values.
    Empty(EmptyLayout),
    /// Lists addressed by starts and stops.
    List(ListLayout),
    /// Lists addressed by offsets.
    ListOffset(ListOffsetLayout),
    /// Lists of a fixed size.
    RegularList(RegularListLayout),
    /// Named or positional fields.
    Record(RecordLayout),
    /// Optional values with a byte mask.
    ByteMaskedOption(ByteMaskedLayout),
    /// Optional values with a bit mask.
    BitMaskedOption(BitMaskedLayout),
    /// Optional values through a signed index.
    IndexedOption(IndexedOptionLayout),
    /// Indirection through an index.
    Indexed(IndexedLayout),
    /// Optional values that are all valid.
    Unmasked(UnmaskedLayout),
    /// Tagged union of alternatives.
    Union(UnionLayout),
}

/// Layout of a [`Layout::Primitive`] node.
#[derive(Clone, Debug, PartialEq)]
pub struct PrimitiveLayout {
    ptype: PType,
    inner_shape: Arc<[usize]>,
    data: ByteBuffer,
    length: usize,
    parameters: Parameters,
}

impl PrimitiveLayout {
    /// Create a primitive node of `length` elements of `inner_shape` values each.
    pub fn try_new(
        ptype: PType,
        inner_shape: impl Into<Arc<[usize]>>,
        data: ByteBuffer,
        length: usize,
    ) -> JaggedResult<Self> {
        let inner_shape = inner_shape.into();
        let nbytes = length
            .checked_mul(inner_shape.iter().product())
            .and_then(|values| values.checked_mul(ptype.byte_width()))
            .ok_or_else(|| jagged_err!("{ptype} layout of length {length} overflows"))?;
        if data.len() != nbytes {
            jagged_bail!(
                "{ptype} layout of length {length} needs {nbytes} bytes, got {}",
                data.len()
            );
        }
        Ok(Self {
            ptype,
            inner_shape,
            data,
            length,
            parameters: Parameters::default(),
        })
    }

    /// A scalar primitive node holding `values`.
    pub fn from_values<T: NativePType>(values: Buffer<T>) -> JaggedResult<Self> {
        Ok(Self {
            ptype: T::PTYPE,
            inner_shape: Arc::default(),
            length: values.len(),
            data: values.into_byte_buffer()?,
            parameters: Parameters::default(),
        })
    }

    /// The physical type of the values.
    pub fn ptype(&self) -> PType {
        self.ptype
    }

    /// The fixed shape of each element.
    pub fn inner_shape(&self) -> &[usize] {
        &self.inner_shape
    }

    /// The raw bytes of the values.
    pub fn data(&self) -> &ByteBuffer {
        &self.data
    }

    /// The values as a typed buffer. `T` must be the storage type of [`Self::ptype`].
    pub fn values<T: NativePType>(&self) -> JaggedResult<Buffer<T>> {
        if T::PTYPE != self.ptype.storage() {
            jagged_bail!("cannot read {} values as {}", self.ptype, T::PTYPE);
        }
        self.data.clone().reinterpret::<T>()
    }
}

/// Layout of a [`Layout::Empty`] node, always of length 0.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct EmptyLayout {
    parameters: Parameters,
}

/// Layout of a [`Layout::List`] node.
#[derive(Clone, Debug, PartialEq)]
pub struct ListLayout {
    starts: Index,
    stops: Index,
    content: Arc<Layout>,
    parameters: Parameters,
}

impl ListLayout {
    /// Create a list node from equally long `starts` and `stops` of the same offset type.
    pub fn try_new(starts: Index, stops: Index, content: Layout) -> JaggedResult<Self> {
        if starts.index_type() != stops.index_type() || !starts.index_type().is_offset_type() {
            jagged_bail!(
                "list starts and stops must share an offset type, got {} and {}",
                starts.index_type(),
                stops.index_type()
            );
        }
        if starts.len() != stops.len() {
            jagged_bail!(
                "list has {} starts but {} stops",
                starts.len(),
                stops.len()
            );
        }
        Ok(Self {
            starts,
            stops,
            content: Arc::new(content),
            parameters: Parameters::default(),
        })
    }

    /// The starts buffer.
    pub fn starts(&self) -> &Index {
        &self.starts
    }

    /// The stops buffer.
    pub fn stops(&self) -> &Index {
        &self.stops
    }

    /// The list items.
    pub fn content(&self) -> &Layout {
        &self.content
    }
}

/// Layout of a [`Layout::ListOffset`] node.
#[derive(Clone, Debug, PartialEq)]
pub struct ListOffsetLayout {
    offsets: Index,
    content: Arc<Layout>,
    parameters: Parameters,
}

impl ListOffsetLayout {
    /// Create a list node from `length + 1` offsets.
    pub fn try_new(offsets: Index, content: Layout) -> JaggedResult<Self> {
        if !offsets.index_type().is_offset_type() {
            jagged_bail!("list offsets cannot be {}", offsets.index_type());
        }
        if offsets.is_empty() {
            jagged_bail!("list offsets must hold at least one value");
        }
        Ok(Self {
            offsets,
            content: Arc::new(content),
            parameters: Parameters::default(),
        })
    }

    /// The offsets buffer.
    pub fn offsets(&self) -> &Index {
        &self.offsets
    }

    /// The list items.
    pub fn content(&self) -> &Layout {
        &self.content
    }
}

/// Layout of a [`Layout::RegularList`] node.
#[derive(Clone, Debug, PartialEq)]
pub struct RegularListLayout {
    content: Arc<Layout>,
    size: usize,
    length: usize,
    parameters: Parameters,
}

impl RegularListLayout {
    /// Create `length` lists of `size` items each.
    pub fn try_new(content: Layout, size: usize, length: usize) -> JaggedResult<Self> {
        let needed = length
            .checked_mul(size)
            .ok_or_else(|| jagged_err!("{length} lists of size {size} overflow"))?;
        if content.len() < needed {
            jagged_bail!(
                "{length} lists of size {size} need {needed} items, got {}",
                content.len()
            );
        }
        Ok(Self {
            content: Arc::new(content),
            size,
            length,
            parameters: Parameters::default(),
        })
    }

    /// The number of items in every list.
    pub fn size(&self) -> usize {
        self.size
    }

    /// The list items.
    pub fn content(&self) -> &Layout {
        &self.content
    }
}

/// Layout of a [`Layout::Record`] node.
#[derive(Clone, Debug, PartialEq)]
pub struct RecordLayout {
    names: Option<FieldNames>,
    contents: Arc<[Layout]>,
    length: usize,
    parameters: Parameters,
}

impl RecordLayout {
    /// Create a record of `length` elements. Fields may be longer than the record.
    pub fn try_new(
        names: Option<FieldNames>,
        contents: Vec<Layout>,
        length: usize,
    ) -> JaggedResult<Self> {
        if let Some(names) = &names {
            if names.len() != contents.len() {
                jagged_bail!(
                    "record has {} field names but {} fields",
                    names.len(),
                    contents.len()
                );
            }
            if let Some(dup) = names.iter().duplicates().next() {
                jagged_bail!("duplicate record field name {dup}");
            }
        }
        if let Some((idx, short)) = contents.iter().find_position(|c| c.len() < length) {
            jagged_bail!(
                "record field {idx} has length {} but the record has length {length}",
                short.len()
            );
        }
        Ok(Self {
            names,
            contents: contents.into(),
            length,
            parameters: Parameters::default(),
        })
    }

    /// Whether the fields are positional.
    pub fn is_tuple(&self) -> bool {
        self.names.is_none()
    }

    /// The field names, `None` for tuples.
    pub fn names(&self) -> Option<&FieldNames> {
        self.names.as_ref()
    }

    /// The fields, in order.
    pub fn contents(&self) -> &[Layout] {
        &self.contents
    }

    /// The names of every field, positional for tuples.
    pub fn field_names(&self) -> FieldNames {
        match &self.names {
            Some(names) => names.clone(),
            None => (0..self.contents.len()).map(tuple_field_name).collect(),
        }
    }

    /// The named field, if present.
    pub fn field(&self, name: &str) -> Option<&Layout> {
        let idx = match &self.names {
            Some(names) => names.iter().position(|n| n.as_ref() == name),
            None => tuple_field_index(name, self.contents.len()),
        };
        idx.map(|idx| &self.contents[idx])
    }
}

/// Layout of a [`Layout::ByteMaskedOption`] node.
#[derive(Clone, Debug, PartialEq)]
pub struct ByteMaskedLayout {
    mask: Index,
    content: Arc<Layout>,
    valid_when: bool,
    parameters: Parameters,
}

impl ByteMaskedLayout {
    /// Create an option node with one `i8` mask value per element.
    pub fn try_new(mask: Index, content: Layout, valid_when: bool) -> JaggedResult<Self> {
        if mask.index_type() != IndexType::I8 {
            jagged_bail!("byte mask must be i8, got {}", mask.index_type());
        }
        if content.len() < mask.len() {
            jagged_bail!(
                "byte masked content of length {} is shorter than its mask of {}",
                content.len(),
                mask.len()
            );
        }
        Ok(Self {
            mask,
            content: Arc::new(content),
            valid_when,
            parameters: Parameters::default(),
        })
    }

    /// The mask buffer.
    pub fn mask(&self) -> &Index {
        &self.mask
    }

    /// The mask value marking a valid element.
    pub fn valid_when(&self) -> bool {
        self.valid_when
    }

    /// The values.
    pub fn content(&self) -> &Layout {
        &self.content
    }
}

/// Layout of a [`Layout::BitMaskedOption`] node.
#[derive(Clone, Debug, PartialEq)]
pub struct BitMaskedLayout {
    mask: Index,
    content: Arc<Layout>,
    valid_when: bool,
    length: usize,
    lsb_order: bool,
    parameters: Parameters,
}

impl BitMaskedLayout {
    /// Create an option node of `length` elements with one mask bit per element.
    pub fn try_new(
        mask: Index,
        content: Layout,
        valid_when: bool,
        length: usize,
        lsb_order: bool,
    ) -> JaggedResult<Self> {
        if mask.index_type() != IndexType::U8 {
            jagged_bail!("bit mask must be u8, got {}", mask.index_type());
        }
        if mask.len() < length.div_ceil(8) {
            jagged_bail!(
                "bit mask of {} bytes cannot cover {length} elements",
                mask.len()
            );
        }
        if content.len() < length {
            jagged_bail!(
                "bit masked content of length {} is shorter than {length}",
                content.len()
            );
        }
        Ok(Self {
            mask,
            content: Arc::new(content),
            valid_when,
            length,
            lsb_order,
            parameters: Parameters::default(),
        })
    }

    /// The mask buffer.
    pub fn mask(&self) -> &Index {
        &self.mask
    }

    /// The bit value marking a valid element.
    pub fn valid_when(&self) -> bool {
        self.valid_when
    }

    /// Whether bits are numbered from the least significant bit.
    pub fn lsb_order(&self) -> bool {
        self.lsb_order
    }

    /// The values.
    pub fn content(&self) -> &Layout {
        &self.content
    }
}

/// Layout of a [`Layout::IndexedOption`] node.
#[derive(Clone, Debug, PartialEq)]
pub struct IndexedOptionLayout {
    index: Index,
    content: Arc<Layout>,
    parameters: Parameters,
}

impl IndexedOptionLayout {
    /// Create an option node, negative index values mark missing elements.
    pub fn try_new(index: Index, content: Layout) -> JaggedResult<Self> {
        if !index.index_type().is_signed_offset_type() {
            jagged_bail!("option index must be i32 or i64, got {}", index.index_type());
        }
        Ok(Self {
            index,
            content: Arc::new(content),
            parameters: Parameters::default(),
        })
    }

    /// The index buffer.
    pub fn index(&self) -> &Index {
        &self.index
    }

    /// The values.
    pub fn content(&self) -> &Layout {
        &self.content
    }
}

/// Layout of a [`Layout::Indexed`] node.
#[derive(Clone, Debug, PartialEq)]
pub struct IndexedLayout {
    index: Index,
    content: Arc<Layout>,
    parameters: Parameters,
}

impl IndexedLayout {
    /// Create an indirection node.
    pub fn try_new(index: Index, content: Layout) -> JaggedResult<Self> {
        if !index.index_type().is_offset_type() {
            jagged_bail!("index cannot be {}", index.index_type());
        }
        Ok(Self {
            index,
            content: Arc::new(content),
            parameters: Parameters::default(),
        })
    }

    /// The index buffer.
    pub fn index(&self) -> &Index {
        &self.index
    }

    /// The values.
    pub fn content(&self) -> &Layout {
        &self.content
    }
}

/// Layout of a [`Layout::Unmasked`] node, as long as its content.
#[derive(Clone, Debug, PartialEq)]
pub struct UnmaskedLayout {
    content: Arc<Layout>,
    parameters: Parameters,
}

impl UnmaskedLayout {
    /// Wrap `content` as optional values without missing elements.
    pub fn new(content: Layout) -> Self {
        Self {
            content: Arc::new(content),
            parameters: Parameters::default(),
        }
    }

    /// The values.
    pub fn content(&self) -> &Layout {
        &self.content
    }
}

/// Layout of a [`Layout::Union`] node.
#[derive(Clone, Debug, PartialEq)]
pub struct UnionLayout {
    tags: Index,
    index: Index,
    contents: Arc<[Layout]>,
    parameters: Parameters,
}

impl UnionLayout {
    /// Create a union. Element `i` is `contents[tags[i]][index[i]]`.
    pub fn try_new(tags: Index, index: Index, contents: Vec<Layout>) -> JaggedResult<Self> {
        if tags.index_type() != IndexType::I8 {
            jagged_bail!("union tags must be i8, got {}", tags.index_type());
        }
        if !index.index_type().is_offset_type() {
            jagged_bail!("union index cannot be {}", index.index_type());
        }
        if tags.len() != index.len() {
            jagged_bail!(
                "union has {} tags but {} index values",
                tags.len(),
                index.len()
            );
        }
        if contents.is_empty() || contents.len() > MAX_UNION_ALTERNATIVES {
            jagged_bail!(
                "union must have between 1 and {MAX_UNION_ALTERNATIVES} alternatives, got {}",
                contents.len()
            );
        }
        Ok(Self {
            tags,
            index,
            contents: contents.into(),
            parameters: Parameters::default(),
        })
    }

    /// The tags buffer.
    pub fn tags(&self) -> &Index {
        &self.tags
    }

    /// The index buffer.
    pub fn index(&self) -> &Index {
        &self.index
    }

    /// The alternatives, in tag order.
    pub fn contents(&self) -> &[Layout] {
        &self.contents
    }
}

macro_rules! layout_from_node {
    ($node:ident, $variant:ident) => {
        impl From<$node> for Layout {
            fn from(node: $node) -> Self {
                Layout::$variant(node)
            }
        }
    };
}

layout_from_node!(PrimitiveLayout, Primitive);
layout_from_node!(EmptyLayout, Empty);
layout_from_node!(ListLayout, List);
layout_from_node!(ListOffsetLayout, ListOffset);
layout_from_node!(RegularListLayout, RegularList);
layout_from_node!(RecordLayout, Record);
layout_from_node!(ByteMaskedLayout, ByteMaskedOption);
layout_from_node!(BitMaskedLayout, BitMaskedOption);
layout_from_node!(IndexedOptionLayout, IndexedOption);
layout_from_node!(IndexedLayout, Indexed);
layout_from_node!(UnmaskedLayout, Unmasked);
layout_from_node!(UnionLayout, Union);

impl Layout {
    /// A scalar primitive node holding `values`.
    pub fn primitive<T: NativePType>(values: impl Into<Buffer<T>>) -> JaggedResult<Self> {
        PrimitiveLayout::from_values(values.into()).map(Layout::Primitive)
    }

    /// An empty node.
    pub fn empty() -> Self {
        Layout::Empty(EmptyLayout::default())
    }

    /// A record of `length` elements with named fields.
    pub fn record<N, I>(fields: I, length: usize) -> JaggedResult<Self>
    where
        N: Into<FieldName>,
        I: IntoIterator<Item = (N, Layout)>,
    {
        let (names, contents): (Vec<FieldName>, Vec<Layout>) = fields
            .into_iter()
            .map(|(name, layout)| (name.into(), layout))
            .unzip();
        RecordLayout::try_new(Some(names.into()), contents, length).map(Layout::Record)
    }

    /// A record of `length` elements with positional fields.
    pub fn tuple(contents: Vec<Layout>, length: usize) -> JaggedResult<Self> {
        RecordLayout::try_new(None, contents, length).map(Layout::Record)
    }

    /// Wrap `content` as optional values without missing elements.
    pub fn unmasked(content: Layout) -> Self {
        Layout::Unmasked(UnmaskedLayout::new(content))
    }

    /// The kind of this node.
    pub fn kind(&self) -> NodeKind {
        match self {
            Layout::Primitive(_) => NodeKind::Primitive,
            Layout::Empty(_) => NodeKind::Empty,
            Layout::List(_) => NodeKind::List,
            Layout::ListOffset(_) => NodeKind::ListOffset,
            Layout::RegularList(_) => NodeKind::RegularList,
            Layout::Record(_) => NodeKind::Record,
            Layout::ByteMaskedOption(_) => NodeKind::ByteMaskedOption,
            Layout::BitMaskedOption(_) => NodeKind::BitMaskedOption,
            Layout::IndexedOption(_) => NodeKind::IndexedOption,
            Layout::Indexed(_) => NodeKind::Indexed,
            Layout::Unmasked(_) => NodeKind::Unmasked,
            Layout::Union(_) => NodeKind::Union,
        }
    }

    /// The number of logical elements.
    pub fn len(&self) -> usize {
        match self {
            Layout::Primitive(node) => node.length,
            Layout::Empty(_) => 0,
            Layout::List(node) => node.starts.len(),
            Layout::ListOffset(node) => node.offsets.len().saturating_sub(1),
            Layout::RegularList(node) => node.length,
            Layout::Record(node) => node.length,
            Layout::ByteMaskedOption(node) => node.mask.len(),
            Layout::BitMaskedOption(node) => node.length,
            Layout::IndexedOption(node) => node.index.len(),
            Layout::Indexed(node) => node.index.len(),
            Layout::Unmasked(node) => node.content.len(),
            Layout::Union(node) => node.tags.len(),
        }
    }

    /// Whether there are no elements.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The parameters of this node.
    pub fn parameters(&self) -> &Parameters {
        match self {
            Layout::Primitive(node) => &node.parameters,
            Layout::Empty(node) => &node.parameters,
            Layout::List(node) => &node.parameters,
            Layout::ListOffset(node) => &node.parameters,
            Layout::RegularList(node) => &node.parameters,
            Layout::Record(node) => &node.parameters,
            Layout::ByteMaskedOption(node) => &node.parameters,
            Layout::BitMaskedOption(node) => &node.parameters,
            Layout::IndexedOption(node) => &node.parameters,
            Layout::Indexed(node) => &node.parameters,
            Layout::Unmasked(node) => &node.parameters,
            Layout::Union(node) => &node.parameters,
        }
    }

    /// This node with its parameters replaced.
    pub fn with_parameters(mut self, parameters: Parameters) -> Self {
        let slot = match &mut self {
            Layout::Primitive(node) => &mut node.parameters,
            Layout::Empty(node) => &mut node.parameters,
            Layout::List(node) => &mut node.parameters,
            Layout::ListOffset(node) => &mut node.parameters,
            Layout::RegularList(node) => &mut node.parameters,
            Layout::Record(node) => &mut node.parameters,
            Layout::ByteMaskedOption(node) => &mut node.parameters,
            Layout::BitMaskedOption(node) => &mut node.parameters,
            Layout::IndexedOption(node) => &mut node.parameters,
            Layout::Indexed(node) => &mut node.parameters,
            Layout::Unmasked(node) => &mut node.parameters,
            Layout::Union(node) => &mut node.parameters,
        };
        *slot = parameters;
        self
    }

    /// The child of a single-content node.
    pub fn content(&self) -> Option<&Layout> {
        match self {
            Layout::List(node) => Some(node.content()),
            Layout::ListOffset(node) => Some(node.content()),
            Layout::RegularList(node) => Some(node.content()),
            Layout::ByteMaskedOption(node) => Some(node.content()),
            Layout::BitMaskedOption(node) => Some(node.content()),
            Layout::IndexedOption(node) => Some(node.content()),
            Layout::Indexed(node) => Some(node.content()),
            Layout::Unmasked(node) => Some(node.content()),
            Layout::Primitive(_) | Layout::Empty(_) | Layout::Record(_) | Layout::Union(_) => None,
        }
    }

    /// A single-content node with its child replaced. Structural buffers and parameters are kept
    /// and the length relations are checked again.
    pub fn with_content(&self, content: Layout) -> JaggedResult<Layout> {
        let layout: Layout = match self {
            Layout::List(node) => {
                ListLayout::try_new(node.starts.clone(), node.stops.clone(), content)?.into()
            }
            Layout::ListOffset(node) => {
                ListOffsetLayout::try_new(node.offsets.clone(), content)?.into()
            }
            Layout::RegularList(node) => {
                RegularListLayout::try_new(content, node.size, node.length)?.into()
            }
            Layout::ByteMaskedOption(node) => {
                ByteMaskedLayout::try_new(node.mask.clone(), content, node.valid_when)?.into()
            }
            Layout::BitMaskedOption(node) => BitMaskedLayout::try_new(
                node.mask.clone(),
                content,
                node.valid_when,
                node.length,
                node.lsb_order,
            )?
            .into(),
            Layout::IndexedOption(node) => {
                IndexedOptionLayout::try_new(node.index.clone(), content)?.into()
            }
            Layout::Indexed(node) => IndexedLayout::try_new(node.index.clone(), content)?.into(),
            Layout::Unmasked(_) => UnmaskedLayout::new(content).into(),
            Layout::Primitive(_) | Layout::Empty(_) | Layout::Record(_) | Layout::Union(_) => {
                jagged_bail!("{} layout has no single content", self.kind())
            }
        };
        Ok(layout.with_parameters(self.parameters().clone()))
    }

    /// Every direct child, in order.
    pub fn children(&self) -> &[Layout] {
        match self {
            Layout::Primitive(_) | Layout::Empty(_) => &[],
            Layout::Record(node) => &node.contents,
            Layout::Union(node) => &node.contents,
            _ => self.content().map(std::slice::from_ref).unwrap_or_default(),
        }
    }

    /// The record node, if this is one.
    pub fn as_record(&self) -> Option<&RecordLayout> {
        match self {
            Layout::Record(node) => Some(node),
            _ => None,
        }
    }

    /// The union node, if this is one.
    pub fn as_union(&self) -> Option<&UnionLayout> {
        match self {
            Layout::Union(node) => Some(node),
            _ => None,
        }
    }

    /// The primitive node, if this is one.
    pub fn as_primitive(&self) -> Option<&PrimitiveLayout> {
        match self {
            Layout::Primitive(node) => Some(node),
            _ => None,
        }
    }

    /// The named field of a record node.
    pub fn field(&self, name: &str) -> JaggedResult<&Layout> {
        self.as_record()
            .ok_or_else(|| jagged_err!("{} layout has no fields", self.kind()))?
            .field(name)
            .ok_or_else(|| jagged_err!("no field named {name}"))
    }

    /// The schema this layout conforms to.
    pub fn schema(&self) -> Schema {
        let schema = match self {
            Layout::Primitive(node) => Schema::primitive_with_shape(node.ptype, node.inner_shape.clone()),
            Layout::Empty(_) => Schema::empty(),
            Layout::List(node) => Schema::List(
                ListSchema::try_new(
                    node.starts.index_type(),
                    node.stops.index_type(),
                    node.content.schema(),
                )
                .jagged_expect("list layout index types are checked on construction"),
            ),
            Layout::ListOffset(node) => Schema::ListOffset(
                ListOffsetSchema::try_new(node.offsets.index_type(), node.content.schema())
                    .jagged_expect("list layout offsets type is checked on construction"),
            ),
            Layout::RegularList(node) => Schema::regular(node.content.schema(), node.size),
            Layout::Record(node) => Schema::Record(
                RecordSchema::try_new(
                    node.names.clone(),
                    node.contents.iter().map(Layout::schema).collect(),
                )
                .jagged_expect("record layout names are checked on construction"),
            ),
            Layout::ByteMaskedOption(node) => {
                Schema::byte_masked(node.content.schema(), node.valid_when)
            }
            Layout::BitMaskedOption(node) => {
                Schema::bit_masked(node.content.schema(), node.valid_when, node.lsb_order)
            }
            Layout::IndexedOption(node) => Schema::IndexedOption(
                IndexedOptionSchema::try_new(node.index.index_type(), node.content.schema())
                    .jagged_expect("option layout index type is checked on construction"),
            ),
            Layout::Indexed(node) => Schema::Indexed(
                IndexedSchema::try_new(node.index.index_type(), node.content.schema())
                    .jagged_expect("layout index type is checked on construction"),
            ),
            Layout::Unmasked(node) => Schema::unmasked(node.content.schema()),
            Layout::Union(node) => Schema::Union(
                UnionSchema::try_new(
                    node.index.index_type(),
                    node.contents.iter().map(Layout::schema).collect(),
                )
                .jagged_expect("union layout is checked on construction"),
            ),
        };
        schema.with_parameters(self.parameters().clone())
    }

    /// The number of placeholder buffers in this tree.
    pub fn placeholder_count(&self) -> usize {
        let own = match self {
            Layout::Primitive(node) => usize::from(node.data.is_placeholder()),
            Layout::Empty(_) | Layout::RegularList(_) | Layout::Record(_) | Layout::Unmasked(_) => 0,
            Layout::List(node) => {
                usize::from(node.starts.is_placeholder()) + usize::from(node.stops.is_placeholder())
            }
            Layout::ListOffset(node) => usize::from(node.offsets.is_placeholder()),
            Layout::ByteMaskedOption(node) => usize::from(node.mask.is_placeholder()),
            Layout::BitMaskedOption(node) => usize::from(node.mask.is_placeholder()),
            Layout::IndexedOption(node) => usize::from(node.index.is_placeholder()),
            Layout::Indexed(node) => usize::from(node.index.is_placeholder()),
            Layout::Union(node) => {
                usize::from(node.tags.is_placeholder()) + usize::from(node.index.is_placeholder())
            }
        };
        own + self
            .children()
            .iter()
            .map(Layout::placeholder_count)
            .sum::<usize>()
    }

    /// Whether every buffer in this tree holds real values.
    pub fn is_fully_materialized(&self) -> bool {
        self.placeholder_count() == 0
    }
}
