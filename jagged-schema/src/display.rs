use std::fmt::{Display, Formatter};

use itertools::Itertools;

use crate::Schema;

impl Display for Schema {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let array_name = self.parameters().array_name();
        match self {
            Schema::Primitive(node) => {
                for dim in node.inner_shape() {
                    write!(f, "{dim} * ")?;
                }
                match array_name {
                    Some(name @ ("char" | "byte")) => write!(f, "{name}"),
                    _ => write!(f, "{}", node.ptype()),
                }
            }
            Schema::Empty(_) => write!(f, "unknown"),
            Schema::List(node) => fmt_list(f, array_name, "var", node.content()),
            Schema::ListOffset(node) => fmt_list(f, array_name, "var", node.content()),
            Schema::RegularList(node) => {
                fmt_list(f, array_name, &node.size().to_string(), node.content())
            }
            Schema::Record(node) => {
                if let Some(name) = self.parameters().record_name() {
                    write!(f, "{name}")?;
                }
                match node.names() {
                    Some(names) => {
                        let (open, close) = if self.parameters().record_name().is_some() {
                            ("[", "]")
                        } else {
                            ("{", "}")
                        };
                        write!(
                            f,
                            "{open}{}{close}",
                            names
                                .iter()
                                .zip(node.contents())
                                .map(|(n, c)| format!("{n}: {c}"))
                                .join(", ")
                        )
                    }
                    None => write!(f, "({})", node.contents().iter().join(", ")),
                }
            }
            Schema::ByteMaskedOption(_)
            | Schema::BitMaskedOption(_)
            | Schema::IndexedOption(_)
            | Schema::Unmasked(_) => {
                let content = self.content().map(ToString::to_string).unwrap_or_default();
                if content.starts_with(|c: char| c.is_ascii_digit()) || content.starts_with("var") {
                    write!(f, "option[{content}]")
                } else {
                    write!(f, "?{content}")
                }
            }
            Schema::Indexed(node) => write!(f, "{}", node.content()),
            Schema::Union(node) => write!(f, "union[{}]", node.contents().iter().join(", ")),
        }
    }
}

fn fmt_list(
    f: &mut Formatter<'_>,
    array_name: Option<&str>,
    dim: &str,
    content: &Schema,
) -> std::fmt::Result {
    match array_name {
        Some("string") if dim == "var" => write!(f, "string"),
        Some("bytestring") if dim == "var" => write!(f, "bytes"),
        Some("string") => write!(f, "string[{dim}]"),
        Some("bytestring") => write!(f, "bytes[{dim}]"),
        _ => write!(f, "{dim} * {content}"),
    }
}
