//! Column paths address the leaves of a [`Schema`].
//!
//! A path descends through record fields by name (tuples by position). File formats that store
//! nested lists name the list level explicitly, with one of two conventions, e.g.
//! `muon.list.item.pt` or `muon.list.element.pt`. The convention is a property of a dataset and is
//! detected once from the names of its stored columns.

use std::fmt::{Display, Formatter};
use std::str::FromStr;

use itertools::Itertools;
use jagged_error::{JaggedError, JaggedResult, jagged_bail};

use crate::{FieldName, Schema};

/// A dotted path of tokens from the root of a schema to one of its nodes.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ColumnPath(Vec<FieldName>);

impl ColumnPath {
    /// The path of the root node itself.
    pub fn root() -> Self {
        Self(vec![])
    }

    /// Whether this path addresses the root.
    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    /// The tokens of this path.
    pub fn path(&self) -> &[FieldName] {
        &self.0
    }

    /// Append a token.
    pub fn push<F: Into<FieldName>>(&mut self, token: F) {
        self.0.push(token.into());
    }

    /// A copy of this path with `token` appended.
    pub fn join<F: Into<FieldName>>(&self, token: F) -> Self {
        let mut path = self.clone();
        path.push(token);
        path
    }

    /// The first token, if any.
    pub fn head(&self) -> Option<&FieldName> {
        self.0.first()
    }

    /// This path without its first token, `None` at the root.
    pub fn step_into(&self) -> Option<Self> {
        (!self.is_root()).then(|| Self(self.0[1..].to_vec()))
    }
}

impl<F: Into<FieldName>> FromIterator<F> for ColumnPath {
    fn from_iter<T: IntoIterator<Item = F>>(iter: T) -> Self {
        ColumnPath(iter.into_iter().map(Into::into).collect())
    }
}

impl FromStr for ColumnPath {
    type Err = JaggedError;

    fn from_str(s: &str) -> JaggedResult<Self> {
        if s.is_empty() {
            return Ok(ColumnPath::root());
        }
        if s.split('.').any(str::is_empty) {
            jagged_bail!("column path \"{s}\" has an empty token");
        }
        Ok(s.split('.').collect())
    }
}

impl Display for ColumnPath {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        Display::fmt(&self.0.iter().format("."), f)
    }
}

/// The tokens that name the list level in stored column names.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum ListSeparator {
    /// `list.item`
    #[default]
    ListItem,
    /// `list.element`
    ListElement,
}

impl ListSeparator {
    /// The separator as path tokens.
    pub const fn tokens(self) -> [&'static str; 2] {
        match self {
            ListSeparator::ListItem => ["list", "item"],
            ListSeparator::ListElement => ["list", "element"],
        }
    }

    /// Whether `path` starts with this separator.
    pub fn is_prefix_of(self, path: &[FieldName]) -> bool {
        let [list, item] = self.tokens();
        matches!(path, [a, b, ..] if a.as_ref() == list && b.as_ref() == item)
    }
}

impl Display for ListSeparator {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let [list, item] = self.tokens();
        write!(f, "{list}.{item}")
    }
}

/// How a dataset names its stored columns.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct ColumnConvention {
    separator: ListSeparator,
    unnamed_root: bool,
}

impl ColumnConvention {
    /// A convention with the given list separator and root naming.
    pub fn new(separator: ListSeparator, unnamed_root: bool) -> Self {
        Self {
            separator,
            unnamed_root,
        }
    }

    /// Detect the convention from the stored column names of a dataset.
    ///
    /// Any name containing `.list.element.` selects [`ListSeparator::ListElement`]. Any name
    /// starting with `.` marks a dataset whose root column has an empty name.
    pub fn detect<S: AsRef<str>>(column_names: impl IntoIterator<Item = S>) -> Self {
        column_names
            .into_iter()
            .fold(Self::default(), |convention, name| {
                let name = name.as_ref();
                Self {
                    separator: if name.contains(".list.element.") {
                        ListSeparator::ListElement
                    } else {
                        convention.separator
                    },
                    unnamed_root: convention.unnamed_root || name.starts_with('.'),
                }
            })
    }

    /// The list separator in use.
    pub fn separator(&self) -> ListSeparator {
        self.separator
    }

    /// Whether column names are prefixed by an empty root name.
    pub fn unnamed_root(&self) -> bool {
        self.unnamed_root
    }

    /// Render a path as a stored column name.
    pub fn format(&self, path: &ColumnPath) -> String {
        if self.unnamed_root {
            format!(".{path}")
        } else {
            path.to_string()
        }
    }

    /// The stored column names of every leaf of `schema`.
    pub fn column_names(&self, schema: &Schema) -> Vec<String> {
        schema
            .columns(Some(self.separator))
            .iter()
            .map(|path| self.format(path))
            .collect()
    }
}

impl Schema {
    /// Every leaf path of this schema in schema order.
    ///
    /// With a separator, list levels contribute its tokens; strings and bytestrings are leaves and
    /// never do. Option and indirection nodes are transparent. Union alternatives share the path
    /// of the union, duplicates are reported once.
    pub fn columns(&self, separator: Option<ListSeparator>) -> Vec<ColumnPath> {
        let mut columns = Vec::new();
        collect_columns(self, separator, ColumnPath::root(), &mut columns);
        columns
    }
}

fn collect_columns(
    schema: &Schema,
    separator: Option<ListSeparator>,
    path: ColumnPath,
    columns: &mut Vec<ColumnPath>,
) {
    match schema {
        Schema::Primitive(_) | Schema::Empty(_) => {
            if !columns.contains(&path) {
                columns.push(path);
            }
        }
        Schema::List(_) | Schema::ListOffset(_) | Schema::RegularList(_) => {
            let is_string = matches!(
                schema.parameters().array_name(),
                Some("string" | "bytestring")
            );
            let path = match separator {
                Some(separator) if !is_string => separator
                    .tokens()
                    .into_iter()
                    .fold(path, |path, token| path.join(token)),
                _ => path,
            };
            for child in schema.children() {
                collect_columns(child, separator, path.clone(), columns);
            }
        }
        Schema::Record(record) => {
            for (name, child) in record.fields() {
                collect_columns(child, separator, path.join(name), columns);
            }
        }
        Schema::ByteMaskedOption(_)
        | Schema::BitMaskedOption(_)
        | Schema::IndexedOption(_)
        | Schema::Indexed(_)
        | Schema::Unmasked(_)
        | Schema::Union(_) => {
            for child in schema.children() {
                collect_columns(child, separator, path.clone(), columns);
            }
        }
    }
}
