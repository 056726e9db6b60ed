use itertools::Itertools;
use jagged_error::{JaggedResult, jagged_bail};

use crate::schema::{record_from_parts, union_from_parts};
use crate::{ColumnPath, ListSeparator, Schema};

impl Schema {
    /// Reduce this schema to the nodes on the way to the given column paths.
    ///
    /// Paths are dotted, may contain the tokens of either [`ListSeparator`] at list levels and may
    /// use `*` within a token to match any part of a field name. A path that ends on an interior
    /// node keeps that node's whole subtree. Unselected record fields and union alternatives are
    /// dropped, and a union left with a single alternative is replaced by it. Tuple fields are
    /// addressed by position, so unselected tuple fields are kept whole.
    ///
    /// Every path must select something.
    pub fn select_columns<S: AsRef<str>>(&self, columns: &[S]) -> JaggedResult<Schema> {
        if columns.is_empty() {
            jagged_bail!("cannot select an empty set of columns");
        }
        let paths: Vec<ColumnPath> = columns
            .iter()
            .map(|column| column.as_ref().parse::<ColumnPath>())
            .try_collect()?;

        for path in &paths {
            if select(self, std::slice::from_ref(path))?.is_none() {
                jagged_bail!("no column matches {path}");
            }
        }

        match select(self, &paths)? {
            Some(schema) => Ok(schema),
            None => jagged_bail!(
                "no column matches any of {}",
                paths.iter().format(", ")
            ),
        }
    }
}

/// Select the paths, relative to `schema`, returning `None` when none of them match.
fn select(schema: &Schema, paths: &[ColumnPath]) -> JaggedResult<Option<Schema>> {
    if paths.is_empty() {
        return Ok(None);
    }
    if paths.iter().any(ColumnPath::is_root) {
        return Ok(Some(schema.clone()));
    }

    match schema {
        Schema::Primitive(_) | Schema::Empty(_) => Ok(None),
        Schema::List(_) | Schema::ListOffset(_) | Schema::RegularList(_) => {
            let paths = paths.iter().map(skip_separator).collect_vec();
            select_content(schema, &paths)
        }
        Schema::ByteMaskedOption(_)
        | Schema::BitMaskedOption(_)
        | Schema::IndexedOption(_)
        | Schema::Indexed(_)
        | Schema::Unmasked(_) => select_content(schema, paths),
        Schema::Record(record) => {
            let mut names = Vec::new();
            let mut contents = Vec::new();
            for (name, child) in record.fields() {
                let matching = paths
                    .iter()
                    .filter(|path| path.head().is_some_and(|head| glob_match(head, &name)))
                    .filter_map(ColumnPath::step_into)
                    .collect_vec();
                match select(child, &matching)? {
                    Some(selected) => {
                        names.push(name);
                        contents.push(selected);
                    }
                    None if record.is_tuple() => contents.push(child.clone()),
                    None => {}
                }
            }
            if names.is_empty() {
                return Ok(None);
            }
            let names = (!record.is_tuple()).then(|| names.into());
            Ok(Some(record_from_parts(record, names, contents)))
        }
        Schema::Union(union) => {
            let mut contents = union
                .contents()
                .iter()
                .map(|alternative| select(alternative, paths))
                .filter_map_ok(|selected| selected)
                .collect::<JaggedResult<Vec<_>>>()?;
            match contents.len() {
                0 => Ok(None),
                1 => Ok(contents.pop()),
                _ => Ok(Some(union_from_parts(union, contents))),
            }
        }
    }
}

fn select_content(schema: &Schema, paths: &[ColumnPath]) -> JaggedResult<Option<Schema>> {
    let Some(content) = schema.content() else {
        return Ok(None);
    };
    select(content, paths)?
        .map(|selected| schema.with_content(selected))
        .transpose()
}

fn skip_separator(path: &ColumnPath) -> ColumnPath {
    [ListSeparator::ListItem, ListSeparator::ListElement]
        .into_iter()
        .find(|separator| separator.is_prefix_of(path.path()))
        .map(|_| path.path()[2..].iter().cloned().collect())
        .unwrap_or_else(|| path.clone())
}

/// Match a field name against a pattern where `*` stands for any run of characters.
fn glob_match(pattern: &str, name: &str) -> bool {
    let pattern = pattern.as_bytes();
    let name = name.as_bytes();
    let (mut p, mut n) = (0, 0);
    let mut backtrack: Option<(usize, usize)> = None;
    while n < name.len() {
        if p < pattern.len() && pattern[p] == b'*' {
            backtrack = Some((p, n));
            p += 1;
        } else if p < pattern.len() && pattern[p] == name[n] {
            p += 1;
            n += 1;
        } else if let Some((star, matched)) = backtrack {
            p = star + 1;
            n = matched + 1;
            backtrack = Some((star, matched + 1));
        } else {
            return false;
        }
    }
    pattern[p..].iter().all(|c| *c == b'*')
}
