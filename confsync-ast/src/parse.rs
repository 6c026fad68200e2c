use crate::error::ParseError;
use camino::Utf8Path;
use std::fmt;
use std::ops::Range;
use tree_sitter::{Node, Parser, Tree};

/// Source dialect of a config module, which picks the grammar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Dialect {
    JavaScript,
    TypeScript,
}

impl Dialect {
    /// `.ts`, `.mts` and `.cts` parse as TypeScript; everything else as JavaScript.
    pub fn from_path(path: &Utf8Path) -> Self {
        match path.extension() {
            Some("ts" | "mts" | "cts") => Dialect::TypeScript,
            _ => Dialect::JavaScript,
        }
    }

    fn language(self) -> tree_sitter::Language {
        match self {
            Dialect::JavaScript => tree_sitter_javascript::LANGUAGE.into(),
            Dialect::TypeScript => tree_sitter_typescript::LANGUAGE_TYPESCRIPT.into(),
        }
    }
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Dialect::JavaScript => f.write_str("javascript"),
            Dialect::TypeScript => f.write_str("typescript"),
        }
    }
}

/// Parse `source`, rejecting trees that contain error or missing nodes.
pub(crate) fn parse(source: &str, dialect: Dialect) -> Result<Tree, ParseError> {
    let mut parser = Parser::new();
    parser
        .set_language(&dialect.language())
        .map_err(|e| ParseError::Grammar {
            dialect,
            message: e.to_string(),
        })?;

    let tree = parser
        .parse(source, None)
        .ok_or(ParseError::Aborted { dialect })?;

    let root = tree.root_node();
    if root.has_error() {
        let bad = first_error(root).unwrap_or(root);
        let pos = bad.start_position();
        let near: String = source[bad.byte_range()]
            .lines()
            .next()
            .unwrap_or_default()
            .chars()
            .take(40)
            .collect();
        return Err(ParseError::Syntax {
            dialect,
            line: pos.row + 1,
            column: pos.column + 1,
            near,
        });
    }

    Ok(tree)
}

fn first_error(node: Node<'_>) -> Option<Node<'_>> {
    if node.is_error() || node.is_missing() {
        return Some(node);
    }
    if !node.has_error() {
        return None;
    }
    children(node).into_iter().find_map(first_error)
}

pub(crate) fn text<'s>(node: Node<'_>, source: &'s str) -> &'s str {
    &source[node.byte_range()]
}

/// All children, including anonymous tokens and comments.
pub(crate) fn children(node: Node<'_>) -> Vec<Node<'_>> {
    let mut cursor = node.walk();
    node.children(&mut cursor).collect()
}

/// Named children, excluding comments and other extras.
pub(crate) fn named_children(node: Node<'_>) -> Vec<Node<'_>> {
    let mut cursor = node.walk();
    node.named_children(&mut cursor)
        .filter(|n| !n.is_extra())
        .collect()
}

/// Replacement of one byte range of the original source.
#[derive(Debug, Clone)]
pub(crate) struct Edit {
    pub range: Range<usize>,
    pub replacement: String,
}

/// Apply non-overlapping edits; bytes outside the edited ranges are copied verbatim.
pub(crate) fn splice(source: &str, mut edits: Vec<Edit>) -> String {
    edits.sort_by_key(|e| e.range.start);

    let mut out = String::with_capacity(source.len());
    let mut cursor = 0;
    for edit in edits {
        if edit.range.start < cursor {
            continue;
        }
        out.push_str(&source[cursor..edit.range.start]);
        out.push_str(&edit.replacement);
        cursor = edit.range.end;
    }
    out.push_str(&source[cursor..]);
    out
}

/// Leading whitespace of the line containing byte `offset`, if only whitespace precedes it.
pub(crate) fn line_indent(source: &str, offset: usize) -> Option<&str> {
    let line_start = source[..offset].rfind('\n').map(|i| i + 1).unwrap_or(0);
    let prefix = &source[line_start..offset];
    prefix
        .chars()
        .all(|c| c == ' ' || c == '\t')
        .then_some(prefix)
}
