use std::sync::Arc;

use itertools::Itertools;
use jagged_error::{JaggedResult, jagged_bail, jagged_err};
use serde::{Deserialize, Serialize};

use crate::field::{FieldName, FieldNames, tuple_field_index, tuple_field_name};
use crate::{IndexType, NodeKind, PType, Parameters};

/// The largest number of alternatives a union can have, bounded by its `i8` tags.
pub const MAX_UNION_ALTERNATIVES: usize = i8::MAX as usize;

/// Immutable recursive description of a nested, jagged type.
///
/// Every node carries [`Parameters`]. Children are reference counted so that cloning a schema
/// (or re-wrapping a child during projection) never copies a subtree.
///
/// The JSON form is tagged by `"class"`, e.g.
/// `{"class": "ListOffsetArray", "offsets": "i64", "content": {"class": "NumpyArray", "primitive": "float64"}}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "class")]
pub enum Schema {
    /// Fixed-width values, possibly with a fixed inner shape.
    #[serde(rename = "NumpyArray")]
    Primitive(PrimitiveSchema),
    /// No values and no type.
    #[serde(rename = "EmptyArray")]
    Empty(EmptySchema),
    /// Variable-length lists addressed by start/stop pairs.
    #[serde(rename = "ListArray")]
    List(ListSchema),
    /// Variable-length lists addressed by monotonic offsets.
    #[serde(rename = "ListOffsetArray")]
    ListOffset(ListOffsetSchema),
    /// Fixed-size lists.
    #[serde(rename = "RegularArray")]
    RegularList(RegularListSchema),
    /// Named or positional fields.
    #[serde(rename = "RecordArray")]
    Record(RecordSchema),
    /// Optional values with a byte mask.
    #[serde(rename = "ByteMaskedArray")]
    ByteMaskedOption(ByteMaskedSchema),
    /// Optional values with a bit mask.
    #[serde(rename = "BitMaskedArray")]
    BitMaskedOption(BitMaskedSchema),
    /// Optional values through an index, negative entries are missing.
    #[serde(rename = "IndexedOptionArray")]
    IndexedOption(IndexedOptionSchema),
    /// Non-optional indirection through an index.
    #[serde(rename = "IndexedArray")]
    Indexed(IndexedSchema),
    /// Optional values without any missing entries.
    #[serde(rename = "UnmaskedArray")]
    Unmasked(UnmaskedSchema),
    /// Tagged union of alternatives.
    #[serde(rename = "UnionArray")]
    Union(UnionSchema),
}

/// Schema of a [`Schema::Primitive`] node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrimitiveSchema {
    primitive: PType,
    #[serde(default)]
    inner_shape: Arc<[usize]>,
    #[serde(default, skip_serializing_if = "Parameters::is_empty")]
    parameters: Parameters,
}

impl PrimitiveSchema {
    /// A primitive node whose elements each hold `product(inner_shape)` values.
    pub fn new(primitive: PType, inner_shape: impl Into<Arc<[usize]>>) -> Self {
        Self {
            primitive,
            inner_shape: inner_shape.into(),
            parameters: Parameters::default(),
        }
    }

    /// The physical type of the values.
    pub fn ptype(&self) -> PType {
        self.primitive
    }

    /// The fixed shape of each element, empty for scalars.
    pub fn inner_shape(&self) -> &[usize] {
        &self.inner_shape
    }

    /// The number of values making up a single element.
    pub fn inner_size(&self) -> usize {
        self.inner_shape.iter().product()
    }
}

/// Schema of a [`Schema::Empty`] node.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmptySchema {
    #[serde(default, skip_serializing_if = "Parameters::is_empty")]
    parameters: Parameters,
}

/// Schema of a [`Schema::List`] node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListSchema {
    starts: IndexType,
    stops: IndexType,
    content: Arc<Schema>,
    #[serde(default, skip_serializing_if = "Parameters::is_empty")]
    parameters: Parameters,
}

impl ListSchema {
    /// Create a list node, `starts` and `stops` must share an offset type.
    pub fn try_new(starts: IndexType, stops: IndexType, content: Schema) -> JaggedResult<Self> {
        let node = Self {
            starts,
            stops,
            content: Arc::new(content),
            parameters: Parameters::default(),
        };
        node.check()?;
        Ok(node)
    }

    fn check(&self) -> JaggedResult<()> {
        if self.starts != self.stops || !self.starts.is_offset_type() {
            jagged_bail!(
                "list starts and stops must share an offset type, got {} and {}",
                self.starts,
                self.stops
            );
        }
        Ok(())
    }

    /// The index type of the starts buffer.
    pub fn starts(&self) -> IndexType {
        self.starts
    }

    /// The index type of the stops buffer.
    pub fn stops(&self) -> IndexType {
        self.stops
    }

    /// The schema of the list items.
    pub fn content(&self) -> &Schema {
        &self.content
    }
}

/// Schema of a [`Schema::ListOffset`] node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListOffsetSchema {
    offsets: IndexType,
    content: Arc<Schema>,
    #[serde(default, skip_serializing_if = "Parameters::is_empty")]
    parameters: Parameters,
}

impl ListOffsetSchema {
    /// Create a list node addressed by offsets of the given type.
    pub fn try_new(offsets: IndexType, content: Schema) -> JaggedResult<Self> {
        let node = Self {
            offsets,
            content: Arc::new(content),
            parameters: Parameters::default(),
        };
        node.check()?;
        Ok(node)
    }

    fn check(&self) -> JaggedResult<()> {
        if !self.offsets.is_offset_type() {
            jagged_bail!("list offsets cannot be {}", self.offsets);
        }
        Ok(())
    }

    /// The index type of the offsets buffer.
    pub fn offsets(&self) -> IndexType {
        self.offsets
    }

    /// The schema of the list items.
    pub fn content(&self) -> &Schema {
        &self.content
    }
}

/// Schema of a [`Schema::RegularList`] node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegularListSchema {
    content: Arc<Schema>,
    size: usize,
    #[serde(default, skip_serializing_if = "Parameters::is_empty")]
    parameters: Parameters,
}

impl RegularListSchema {
    /// Create a node of lists that all have `size` items.
    pub fn new(content: Schema, size: usize) -> Self {
        Self {
            content: Arc::new(content),
            size,
            parameters: Parameters::default(),
        }
    }

    /// The number of items in every list.
    pub fn size(&self) -> usize {
        self.size
    }

    /// The schema of the list items.
    pub fn content(&self) -> &Schema {
        &self.content
    }
}

/// Schema of a [`Schema::Record`] node.
///
/// A record without names is a tuple; its fields are addressed by position, rendered as `"0"`,
/// `"1"`, and so on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordSchema {
    #[serde(rename = "fields")]
    names: Option<FieldNames>,
    contents: Arc<[Schema]>,
    #[serde(default, skip_serializing_if = "Parameters::is_empty")]
    parameters: Parameters,
}

impl RecordSchema {
    /// Create a record node. `names` must be unique and as many as `contents`, or `None` for a
    /// tuple.
    pub fn try_new(names: Option<FieldNames>, contents: Vec<Schema>) -> JaggedResult<Self> {
        let node = Self {
            names,
            contents: contents.into(),
            parameters: Parameters::default(),
        };
        node.check()?;
        Ok(node)
    }

    fn check(&self) -> JaggedResult<()> {
        if let Some(names) = &self.names {
            if names.len() != self.contents.len() {
                jagged_bail!(
                    "record has {} field names but {} fields",
                    names.len(),
                    self.contents.len()
                );
            }
            if let Some(dup) = names.iter().duplicates().next() {
                jagged_bail!("duplicate record field name {dup}");
            }
        }
        Ok(())
    }

    /// Whether the fields are positional.
    pub fn is_tuple(&self) -> bool {
        self.names.is_none()
    }

    /// The declared field names, `None` for tuples.
    pub fn names(&self) -> Option<&FieldNames> {
        self.names.as_ref()
    }

    /// The number of fields.
    pub fn nfields(&self) -> usize {
        self.contents.len()
    }

    /// The field schemas, in declaration order.
    pub fn contents(&self) -> &[Schema] {
        &self.contents
    }

    /// The name of the field at `index`, positional for tuples.
    pub fn field_name(&self, index: usize) -> Option<FieldName> {
        match &self.names {
            Some(names) => names.get(index).cloned(),
            None => (index < self.contents.len()).then(|| tuple_field_name(index)),
        }
    }

    /// The names of every field, positional for tuples.
    pub fn field_names(&self) -> FieldNames {
        match &self.names {
            Some(names) => names.clone(),
            None => (0..self.contents.len()).map(tuple_field_name).collect(),
        }
    }

    /// The position of the named field.
    pub fn field_index(&self, name: &str) -> Option<usize> {
        match &self.names {
            Some(names) => names.iter().position(|n| n.as_ref() == name),
            None => tuple_field_index(name, self.contents.len()),
        }
    }

    /// The schema of the named field.
    pub fn field(&self, name: &str) -> Option<&Schema> {
        self.field_index(name).map(|idx| &self.contents[idx])
    }

    /// Iterate `(name, schema)` pairs in declaration order.
    pub fn fields(&self) -> impl Iterator<Item = (FieldName, &Schema)> + '_ {
        let names = self.field_names();
        (0..names.len())
            .map(move |idx| names[idx].clone())
            .zip(self.contents.iter())
    }
}

/// Schema of a [`Schema::ByteMaskedOption`] node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ByteMaskedSchema {
    mask: IndexType,
    valid_when: bool,
    content: Arc<Schema>,
    #[serde(default, skip_serializing_if = "Parameters::is_empty")]
    parameters: Parameters,
}

impl ByteMaskedSchema {
    /// Create a byte-masked option node, an entry is valid when its mask byte equals
    /// `valid_when`.
    pub fn new(content: Schema, valid_when: bool) -> Self {
        Self {
            mask: IndexType::I8,
            valid_when,
            content: Arc::new(content),
            parameters: Parameters::default(),
        }
    }

    fn check(&self) -> JaggedResult<()> {
        if self.mask != IndexType::I8 {
            jagged_bail!("byte mask must be i8, got {}", self.mask);
        }
        Ok(())
    }

    /// The mask value marking a valid entry.
    pub fn valid_when(&self) -> bool {
        self.valid_when
    }

    /// The schema of the values.
    pub fn content(&self) -> &Schema {
        &self.content
    }
}

/// Schema of a [`Schema::BitMaskedOption`] node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BitMaskedSchema {
    mask: IndexType,
    valid_when: bool,
    lsb_order: bool,
    content: Arc<Schema>,
    #[serde(default, skip_serializing_if = "Parameters::is_empty")]
    parameters: Parameters,
}

impl BitMaskedSchema {
    /// Create a bit-masked option node.
    pub fn new(content: Schema, valid_when: bool, lsb_order: bool) -> Self {
        Self {
            mask: IndexType::U8,
            valid_when,
            lsb_order,
            content: Arc::new(content),
            parameters: Parameters::default(),
        }
    }

    fn check(&self) -> JaggedResult<()> {
        if self.mask != IndexType::U8 {
            jagged_bail!("bit mask must be u8, got {}", self.mask);
        }
        Ok(())
    }

    /// The bit value marking a valid entry.
    pub fn valid_when(&self) -> bool {
        self.valid_when
    }

    /// Whether bits are numbered from the least significant bit of each byte.
    pub fn lsb_order(&self) -> bool {
        self.lsb_order
    }

    /// The schema of the values.
    pub fn content(&self) -> &Schema {
        &self.content
    }
}

/// Schema of a [`Schema::IndexedOption`] node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexedOptionSchema {
    index: IndexType,
    content: Arc<Schema>,
    #[serde(default, skip_serializing_if = "Parameters::is_empty")]
    parameters: Parameters,
}

impl IndexedOptionSchema {
    /// Create an indexed option node, the index must be signed.
    pub fn try_new(index: IndexType, content: Schema) -> JaggedResult<Self> {
        let node = Self {
            index,
            content: Arc::new(content),
            parameters: Parameters::default(),
        };
        node.check()?;
        Ok(node)
    }

    fn check(&self) -> JaggedResult<()> {
        if !self.index.is_signed_offset_type() {
            jagged_bail!("option index must be i32 or i64, got {}", self.index);
        }
        Ok(())
    }

    /// The index type.
    pub fn index(&self) -> IndexType {
        self.index
    }

    /// The schema of the values.
    pub fn content(&self) -> &Schema {
        &self.content
    }
}

/// Schema of a [`Schema::Indexed`] node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexedSchema {
    index: IndexType,
    content: Arc<Schema>,
    #[serde(default, skip_serializing_if = "Parameters::is_empty")]
    parameters: Parameters,
}

impl IndexedSchema {
    /// Create an indirection node.
    pub fn try_new(index: IndexType, content: Schema) -> JaggedResult<Self> {
        let node = Self {
            index,
            content: Arc::new(content),
            parameters: Parameters::default(),
        };
        node.check()?;
        Ok(node)
    }

    fn check(&self) -> JaggedResult<()> {
        if !self.index.is_offset_type() {
            jagged_bail!("index cannot be {}", self.index);
        }
        Ok(())
    }

    /// The index type.
    pub fn index(&self) -> IndexType {
        self.index
    }

    /// The schema of the values.
    pub fn content(&self) -> &Schema {
        &self.content
    }
}

/// Schema of a [`Schema::Unmasked`] node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnmaskedSchema {
    content: Arc<Schema>,
    #[serde(default, skip_serializing_if = "Parameters::is_empty")]
    parameters: Parameters,
}

impl UnmaskedSchema {
    /// Wrap `content` as an option type without missing values.
    pub fn new(content: Schema) -> Self {
        Self {
            content: Arc::new(content),
            parameters: Parameters::default(),
        }
    }

    /// The schema of the values.
    pub fn content(&self) -> &Schema {
        &self.content
    }
}

/// Schema of a [`Schema::Union`] node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnionSchema {
    tags: IndexType,
    index: IndexType,
    contents: Arc<[Schema]>,
    #[serde(default, skip_serializing_if = "Parameters::is_empty")]
    parameters: Parameters,
}

impl UnionSchema {
    /// Create a union of `contents`, addressed by `i8` tags and an index of type `index`.
    pub fn try_new(index: IndexType, contents: Vec<Schema>) -> JaggedResult<Self> {
        let node = Self {
            tags: IndexType::I8,
            index,
            contents: contents.into(),
            parameters: Parameters::default(),
        };
        node.check()?;
        Ok(node)
    }

    fn check(&self) -> JaggedResult<()> {
        if self.tags != IndexType::I8 {
            jagged_bail!("union tags must be i8, got {}", self.tags);
        }
        if !self.index.is_offset_type() {
            jagged_bail!("union index cannot be {}", self.index);
        }
        if self.contents.is_empty() || self.contents.len() > MAX_UNION_ALTERNATIVES {
            jagged_bail!(
                "union must have between 1 and {MAX_UNION_ALTERNATIVES} alternatives, got {}",
                self.contents.len()
            );
        }
        Ok(())
    }

    /// The index type of the index buffer.
    pub fn index(&self) -> IndexType {
        self.index
    }

    /// The alternatives, in tag order.
    pub fn contents(&self) -> &[Schema] {
        &self.contents
    }

    /// The number of alternatives.
    pub fn nalternatives(&self) -> usize {
        self.contents.len()
    }
}

impl Schema {
    /// A scalar primitive node.
    pub fn primitive(ptype: PType) -> Self {
        Schema::Primitive(PrimitiveSchema::new(ptype, []))
    }

    /// A primitive node with a fixed inner shape per element.
    pub fn primitive_with_shape(ptype: PType, inner_shape: impl Into<Arc<[usize]>>) -> Self {
        Schema::Primitive(PrimitiveSchema::new(ptype, inner_shape))
    }

    /// An empty node.
    pub fn empty() -> Self {
        Schema::Empty(EmptySchema::default())
    }

    /// Variable-length lists with `i64` starts and stops.
    pub fn list(content: Schema) -> Self {
        Schema::List(ListSchema {
            starts: IndexType::I64,
            stops: IndexType::I64,
            content: Arc::new(content),
            parameters: Parameters::default(),
        })
    }

    /// Variable-length lists with `i64` offsets.
    pub fn list_offset(content: Schema) -> Self {
        Schema::ListOffset(ListOffsetSchema {
            offsets: IndexType::I64,
            content: Arc::new(content),
            parameters: Parameters::default(),
        })
    }

    /// Lists of exactly `size` items.
    pub fn regular(content: Schema, size: usize) -> Self {
        Schema::RegularList(RegularListSchema::new(content, size))
    }

    /// A record with named fields.
    pub fn record<N, I>(fields: I) -> JaggedResult<Self>
    where
        N: Into<FieldName>,
        I: IntoIterator<Item = (N, Schema)>,
    {
        let (names, contents): (Vec<FieldName>, Vec<Schema>) = fields
            .into_iter()
            .map(|(name, schema)| (name.into(), schema))
            .unzip();
        RecordSchema::try_new(Some(names.into()), contents).map(Schema::Record)
    }

    /// A record with positional fields.
    pub fn tuple(contents: impl IntoIterator<Item = Schema>) -> Self {
        Schema::Record(RecordSchema {
            names: None,
            contents: contents.into_iter().collect(),
            parameters: Parameters::default(),
        })
    }

    /// Optional values with a byte mask.
    pub fn byte_masked(content: Schema, valid_when: bool) -> Self {
        Schema::ByteMaskedOption(ByteMaskedSchema::new(content, valid_when))
    }

    /// Optional values with a bit mask.
    pub fn bit_masked(content: Schema, valid_when: bool, lsb_order: bool) -> Self {
        Schema::BitMaskedOption(BitMaskedSchema::new(content, valid_when, lsb_order))
    }

    /// Optional values with an `i64` index.
    pub fn indexed_option(content: Schema) -> Self {
        Schema::IndexedOption(IndexedOptionSchema {
            index: IndexType::I64,
            content: Arc::new(content),
            parameters: Parameters::default(),
        })
    }

    /// Indirection through an `i64` index.
    pub fn indexed(content: Schema) -> Self {
        Schema::Indexed(IndexedSchema {
            index: IndexType::I64,
            content: Arc::new(content),
            parameters: Parameters::default(),
        })
    }

    /// Optional values that are never missing.
    pub fn unmasked(content: Schema) -> Self {
        Schema::Unmasked(UnmaskedSchema::new(content))
    }

    /// A union of `contents` with an `i64` index.
    pub fn union(contents: impl IntoIterator<Item = Schema>) -> JaggedResult<Self> {
        UnionSchema::try_new(IndexType::I64, contents.into_iter().collect()).map(Schema::Union)
    }

    /// Parse a schema from its JSON form and validate every node.
    pub fn from_json(json: &str) -> JaggedResult<Self> {
        let schema: Schema = serde_json::from_str(json)?;
        schema.validate()?;
        Ok(schema)
    }

    /// Serialize this schema to its JSON form.
    pub fn to_json(&self) -> JaggedResult<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Check the per-node rules of every node in this schema.
    pub fn validate(&self) -> JaggedResult<()> {
        match self {
            Schema::Primitive(_)
            | Schema::Empty(_)
            | Schema::RegularList(_)
            | Schema::Unmasked(_) => {}
            Schema::List(node) => node.check()?,
            Schema::ListOffset(node) => node.check()?,
            Schema::Record(node) => node.check()?,
            Schema::ByteMaskedOption(node) => node.check()?,
            Schema::BitMaskedOption(node) => node.check()?,
            Schema::IndexedOption(node) => node.check()?,
            Schema::Indexed(node) => node.check()?,
            Schema::Union(node) => node.check()?,
        }
        self.children().iter().try_for_each(Schema::validate)
    }

    /// The kind of this node.
    pub fn kind(&self) -> NodeKind {
        match self {
            Schema::Primitive(_) => NodeKind::Primitive,
            Schema::Empty(_) => NodeKind::Empty,
            Schema::List(_) => NodeKind::List,
            Schema::ListOffset(_) => NodeKind::ListOffset,
            Schema::RegularList(_) => NodeKind::RegularList,
            Schema::Record(_) => NodeKind::Record,
            Schema::ByteMaskedOption(_) => NodeKind::ByteMaskedOption,
            Schema::BitMaskedOption(_) => NodeKind::BitMaskedOption,
            Schema::IndexedOption(_) => NodeKind::IndexedOption,
            Schema::Indexed(_) => NodeKind::Indexed,
            Schema::Unmasked(_) => NodeKind::Unmasked,
            Schema::Union(_) => NodeKind::Union,
        }
    }

    /// Whether this node represents optional values.
    pub fn is_option(&self) -> bool {
        self.kind().is_option()
    }

    /// Whether this node represents lists.
    pub fn is_list(&self) -> bool {
        self.kind().is_list()
    }

    /// The parameters of this node.
    pub fn parameters(&self) -> &Parameters {
        match self {
            Schema::Primitive(node) => &node.parameters,
            Schema::Empty(node) => &node.parameters,
            Schema::List(node) => &node.parameters,
            Schema::ListOffset(node) => &node.parameters,
            Schema::RegularList(node) => &node.parameters,
            Schema::Record(node) => &node.parameters,
            Schema::ByteMaskedOption(node) => &node.parameters,
            Schema::BitMaskedOption(node) => &node.parameters,
            Schema::IndexedOption(node) => &node.parameters,
            Schema::Indexed(node) => &node.parameters,
            Schema::Unmasked(node) => &node.parameters,
            Schema::Union(node) => &node.parameters,
        }
    }

    fn parameters_mut(&mut self) -> &mut Parameters {
        match self {
            Schema::Primitive(node) => &mut node.parameters,
            Schema::Empty(node) => &mut node.parameters,
            Schema::List(node) => &mut node.parameters,
            Schema::ListOffset(node) => &mut node.parameters,
            Schema::RegularList(node) => &mut node.parameters,
            Schema::Record(node) => &mut node.parameters,
            Schema::ByteMaskedOption(node) => &mut node.parameters,
            Schema::BitMaskedOption(node) => &mut node.parameters,
            Schema::IndexedOption(node) => &mut node.parameters,
            Schema::Indexed(node) => &mut node.parameters,
            Schema::Unmasked(node) => &mut node.parameters,
            Schema::Union(node) => &mut node.parameters,
        }
    }

    /// This node with its parameters replaced.
    pub fn with_parameters(mut self, parameters: Parameters) -> Self {
        *self.parameters_mut() = parameters;
        self
    }

    /// This node with a single parameter set, `null` removes it.
    pub fn with_parameter(self, key: &str, value: impl Into<serde_json::Value>) -> Self {
        let parameters = self.parameters().with(key, value);
        self.with_parameters(parameters)
    }

    /// The child of a single-content node: lists, options and indirections.
    pub fn content(&self) -> Option<&Schema> {
        match self {
            Schema::List(node) => Some(node.content.as_ref()),
            Schema::ListOffset(node) => Some(node.content.as_ref()),
            Schema::RegularList(node) => Some(node.content.as_ref()),
            Schema::ByteMaskedOption(node) => Some(node.content.as_ref()),
            Schema::BitMaskedOption(node) => Some(node.content.as_ref()),
            Schema::IndexedOption(node) => Some(node.content.as_ref()),
            Schema::Indexed(node) => Some(node.content.as_ref()),
            Schema::Unmasked(node) => Some(node.content.as_ref()),
            Schema::Primitive(_) | Schema::Empty(_) | Schema::Record(_) | Schema::Union(_) => None,
        }
    }

    /// A single-content node with its child replaced, keeping everything else.
    pub fn with_content(&self, content: Schema) -> JaggedResult<Self> {
        let content = Arc::new(content);
        let mut schema = self.clone();
        match &mut schema {
            Schema::List(node) => node.content = content,
            Schema::ListOffset(node) => node.content = content,
            Schema::RegularList(node) => node.content = content,
            Schema::ByteMaskedOption(node) => node.content = content,
            Schema::BitMaskedOption(node) => node.content = content,
            Schema::IndexedOption(node) => node.content = content,
            Schema::Indexed(node) => node.content = content,
            Schema::Unmasked(node) => node.content = content,
            Schema::Primitive(_) | Schema::Empty(_) | Schema::Record(_) | Schema::Union(_) => {
                jagged_bail!("{} schema has no single content", self.kind())
            }
        }
        Ok(schema)
    }

    /// Every direct child, in order.
    pub fn children(&self) -> &[Schema] {
        match self {
            Schema::Primitive(_) | Schema::Empty(_) => &[],
            Schema::Record(node) => &node.contents,
            Schema::Union(node) => &node.contents,
            _ => self.content().map(std::slice::from_ref).unwrap_or_default(),
        }
    }

    /// The record node, if this is one.
    pub fn as_record(&self) -> Option<&RecordSchema> {
        match self {
            Schema::Record(node) => Some(node),
            _ => None,
        }
    }

    /// The union node, if this is one.
    pub fn as_union(&self) -> Option<&UnionSchema> {
        match self {
            Schema::Union(node) => Some(node),
            _ => None,
        }
    }

    /// The named field of a record node.
    pub fn field(&self, name: &str) -> JaggedResult<&Schema> {
        self.as_record()
            .ok_or_else(|| jagged_err!("{} schema has no fields", self.kind()))?
            .field(name)
            .ok_or_else(|| jagged_err!("no field named {name}"))
    }
}

/// Construct a record schema from owned parts, used when rebuilding projected records.
pub(crate) fn record_from_parts(
    template: &RecordSchema,
    names: Option<FieldNames>,
    contents: Vec<Schema>,
) -> Schema {
    Schema::Record(RecordSchema {
        names,
        contents: contents.into(),
        parameters: template.parameters.clone(),
    })
}

/// Construct a union schema from owned parts, used when dropping unselected alternatives.
pub(crate) fn union_from_parts(template: &UnionSchema, contents: Vec<Schema>) -> Schema {
    Schema::Union(UnionSchema {
        tags: template.tags,
        index: template.index,
        contents: contents.into(),
        parameters: template.parameters.clone(),
    })
}
