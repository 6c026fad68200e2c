use crate::error::ParseError;
use crate::parse::{Dialect, children, line_indent, parse, text};
use crate::shape::{ExportShape, locate_export};
use std::collections::BTreeSet;
use tree_sitter::Node;

/// One entry of an object literal, carried as source text.
///
/// `key` is the normalized key (quotes stripped). `text` is the full entry as written, so
/// untouched entries are reproduced byte-for-byte when the object is printed again.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Property {
    key: String,
    text: String,
    value: String,
    leading_comments: Vec<String>,
    trailing_comment: Option<String>,
}

/// Ordered property sequence of an exported object.
pub type PropertyList = Vec<Property>;

impl Property {
    /// A `key: value` pair. `value` is JavaScript source text.
    pub fn pair(key: &str, value: impl Into<String>) -> Self {
        let value = value.into();
        Self {
            key: key.to_string(),
            text: format!("{}: {}", render_key(key), value),
            value,
            leading_comments: Vec::new(),
            trailing_comment: None,
        }
    }

    /// A `key: 'value'` pair with a single-quoted string literal.
    pub fn string(key: &str, value: &str) -> Self {
        Self::pair(key, quote(value))
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// The entry as written, e.g. `preset: 'ts-jest'`.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Source text of the value. For entries without a separate value (spreads, methods) this
    /// is the whole entry.
    pub fn value(&self) -> &str {
        &self.value
    }

    /// The value as a plain string when it is a string literal without interpolation.
    pub fn string_value(&self) -> Option<String> {
        unquote(&self.value)
    }

    fn has_comments(&self) -> bool {
        !self.leading_comments.is_empty() || self.trailing_comment.is_some()
    }

    fn same_entry(&self, other: &Property) -> bool {
        self.key == other.key && self.text == other.text
    }
}

/// Parse a bare object literal such as `{ a: 1, b: 'x' }` into a property list.
pub fn parse_properties(snippet: &str) -> Result<PropertyList, ParseError> {
    let wrapped = format!("export default {snippet}\n");
    let tree = parse(&wrapped, Dialect::JavaScript)?;
    let site = locate_export(tree.root_node(), &wrapped);
    match (site.shape, site.object) {
        (ExportShape::ObjectLiteral, Some(object)) => Ok(extract(object, &wrapped).0),
        _ => Err(ParseError::NotObjectLiteral {
            found: snippet.trim().chars().take(40).collect(),
        }),
    }
}

/// Appends `additions` to an existing property list.
///
/// Keys already present keep their position; an addition with such a key replaces the
/// existing entry in place (keeping its comments when the addition has none). New keys go to
/// the end in the order given. Applying the same additions twice is a no-op.
pub fn appender(
    additions: impl IntoIterator<Item = Property>,
) -> impl FnOnce(&ExportShape, PropertyList) -> PropertyList {
    let additions: Vec<Property> = additions.into_iter().collect();
    move |_shape, existing| append(existing, additions)
}

/// Keeps only properties whose key is in `allowed`, in their original order.
pub fn filter<I, S>(allowed: I) -> impl FnOnce(&ExportShape, PropertyList) -> PropertyList
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let allowed: BTreeSet<String> = allowed.into_iter().map(Into::into).collect();
    move |_shape, existing| {
        existing
            .into_iter()
            .filter(|p| allowed.contains(p.key()))
            .collect()
    }
}

/// Drops properties whose key is in `removed`.
pub fn remover<I, S>(removed: I) -> impl FnOnce(&ExportShape, PropertyList) -> PropertyList
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let removed: BTreeSet<String> = removed.into_iter().map(Into::into).collect();
    move |_shape, existing| {
        existing
            .into_iter()
            .filter(|p| !removed.contains(p.key()))
            .collect()
    }
}

fn append(existing: PropertyList, additions: Vec<Property>) -> PropertyList {
    let mut out: PropertyList = Vec::with_capacity(existing.len() + additions.len());
    let mut pending = additions;
    let mut overridden: BTreeSet<String> = BTreeSet::new();

    for prop in existing {
        if overridden.contains(&prop.key) {
            // A later duplicate would shadow the in-place override.
            continue;
        }
        match pending.iter().position(|a| a.key == prop.key) {
            Some(idx) => {
                let mut addition = pending.remove(idx);
                overridden.insert(prop.key.clone());
                if prop.same_entry(&addition) {
                    out.push(prop);
                } else {
                    if !addition.has_comments() {
                        addition.leading_comments = prop.leading_comments;
                        addition.trailing_comment = prop.trailing_comment;
                    }
                    out.push(addition);
                }
            }
            None => out.push(prop),
        }
    }

    for addition in pending {
        match out.iter_mut().find(|p| p.key == addition.key) {
            Some(slot) => *slot = addition,
            None => out.push(addition),
        }
    }
    out
}

/// Layout facts about an object literal that printing must honor.
#[derive(Debug, Clone)]
pub(crate) struct ObjectLayout {
    multiline: bool,
    indent: String,
    closing_indent: String,
    trailing_comma: bool,
    newline: &'static str,
    dangling_comments: Vec<String>,
}

/// Read the properties and layout of an `object` node.
pub(crate) fn extract(object: Node<'_>, source: &str) -> (PropertyList, ObjectLayout) {
    let object_text = text(object, source);
    let multiline = object_text.contains('\n');
    let newline = if source.contains("\r\n") { "\r\n" } else { "\n" };

    let mut props: PropertyList = Vec::new();
    let mut pending_comments: Vec<String> = Vec::new();
    let mut last_row: Option<usize> = None;
    let mut trailing_comma = true;
    let mut first_entry_start: Option<usize> = None;

    for child in children(object) {
        match child.kind() {
            "{" => {}
            "}" => {}
            "," => {
                trailing_comma = true;
                last_row = Some(child.end_position().row);
            }
            "comment" => {
                let comment = text(child, source).to_string();
                let same_line = last_row == Some(child.start_position().row);
                match props.last_mut() {
                    Some(prev) if same_line && prev.trailing_comment.is_none() => {
                        prev.trailing_comment = Some(comment);
                    }
                    _ => pending_comments.push(comment),
                }
            }
            _ if child.is_named() => {
                first_entry_start.get_or_insert(child.start_byte());
                trailing_comma = false;
                last_row = Some(child.end_position().row);
                props.push(Property {
                    key: property_key(child, source),
                    text: text(child, source).to_string(),
                    value: property_value(child, source),
                    leading_comments: std::mem::take(&mut pending_comments),
                    trailing_comment: None,
                });
            }
            _ => {}
        }
    }

    let opening_indent = line_indent(source, object.start_byte())
        .map(str::to_string)
        .unwrap_or_else(|| statement_indent(source, object.start_byte()));
    let closing_indent = if multiline {
        let close = object.end_byte().saturating_sub(1);
        line_indent(source, close)
            .map(str::to_string)
            .unwrap_or_else(|| opening_indent.clone())
    } else {
        opening_indent
    };
    let indent = first_entry_start
        .filter(|_| multiline)
        .and_then(|start| line_indent(source, start))
        .map(str::to_string)
        .unwrap_or_else(|| format!("{closing_indent}  "));

    (
        props,
        ObjectLayout {
            multiline,
            indent,
            closing_indent,
            trailing_comma: trailing_comma || first_entry_start.is_none(),
            newline,
            dangling_comments: pending_comments,
        },
    )
}

fn statement_indent(source: &str, offset: usize) -> String {
    let line_start = source[..offset].rfind('\n').map(|i| i + 1).unwrap_or(0);
    source[line_start..offset]
        .chars()
        .take_while(|c| *c == ' ' || *c == '\t')
        .collect()
}

/// Print a property list back into an object literal using the original layout.
pub(crate) fn render(props: &[Property], layout: &ObjectLayout) -> String {
    if props.is_empty() && layout.dangling_comments.is_empty() {
        return "{}".to_string();
    }

    let needs_lines = layout.multiline
        || !layout.dangling_comments.is_empty()
        || props.iter().any(Property::has_comments);
    if !needs_lines {
        let body: Vec<&str> = props.iter().map(Property::text).collect();
        return format!("{{ {} }}", body.join(", "));
    }

    let nl = layout.newline;
    let mut out = String::from("{");
    out.push_str(nl);
    for (i, prop) in props.iter().enumerate() {
        for comment in &prop.leading_comments {
            out.push_str(&layout.indent);
            out.push_str(comment);
            out.push_str(nl);
        }
        out.push_str(&layout.indent);
        out.push_str(&prop.text);
        if i + 1 < props.len() || layout.trailing_comma {
            out.push(',');
        }
        if let Some(comment) = &prop.trailing_comment {
            out.push(' ');
            out.push_str(comment);
        }
        out.push_str(nl);
    }
    for comment in &layout.dangling_comments {
        out.push_str(&layout.indent);
        out.push_str(comment);
        out.push_str(nl);
    }
    out.push_str(&layout.closing_indent);
    out.push('}');
    out
}

fn property_key(node: Node<'_>, source: &str) -> String {
    let key = match node.kind() {
        "pair" => node.child_by_field_name("key"),
        "method_definition" => node.child_by_field_name("name"),
        _ => None,
    };
    match key {
        Some(k) if k.kind() == "string" => {
            unquote(text(k, source)).unwrap_or_else(|| text(k, source).to_string())
        }
        Some(k) => text(k, source).to_string(),
        None => text(node, source).to_string(),
    }
}

fn property_value(node: Node<'_>, source: &str) -> String {
    node.child_by_field_name("value")
        .filter(|_| node.kind() == "pair")
        .map(|v| text(v, source))
        .unwrap_or_else(|| text(node, source))
        .to_string()
}

fn is_identifier(key: &str) -> bool {
    let mut chars = key.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' || c == '$' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$')
}

fn render_key(key: &str) -> String {
    if is_identifier(key) {
        key.to_string()
    } else {
        quote(key)
    }
}

/// Single-quoted JavaScript string literal.
pub fn quote(value: &str) -> String {
    let escaped = value.replace('\\', "\\\\").replace('\'', "\\'");
    format!("'{escaped}'")
}

fn unquote(literal: &str) -> Option<String> {
    let literal = literal.trim();
    let first = literal.chars().next()?;
    if !matches!(first, '\'' | '"') || literal.len() < 2 || !literal.ends_with(first) {
        return None;
    }
    let inner = &literal[1..literal.len() - 1];
    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            out.extend(chars.next());
        } else {
            out.push(c);
        }
    }
    Some(out)
}
