use crate::error::ParseError;
use crate::parse::{Dialect, Edit, named_children, parse, splice, text};
use crate::shape::{ExportShape, classify, module_exports_value};
use tree_sitter::Node;

/// Rewrite top-level CommonJS module syntax to ES module syntax.
///
/// * `const x = require('m')` becomes `import x from 'm'`.
/// * `const { a, b: c } = require('m')` becomes `import { a, b as c } from 'm'`.
/// * `module.exports = <config>` becomes `export default <config>` when the exported value is
///   an object literal, a call wrapper, a function or a call with several arguments.
///
/// Other statements, and requires nested inside functions, are left alone.
pub fn normalize_module_syntax(source: &str, dialect: Dialect) -> Result<String, ParseError> {
    let tree = parse(source, dialect)?;
    let root = tree.root_node();

    let mut edits = Vec::new();
    for statement in named_children(root) {
        match statement.kind() {
            "lexical_declaration" | "variable_declaration" => {
                if let Some(replacement) = require_to_import(statement, source) {
                    edits.push(Edit {
                        range: statement.byte_range(),
                        replacement,
                    });
                }
            }
            "expression_statement" => {
                let Some(right) = module_exports_value(statement, source) else {
                    continue;
                };
                let (shape, _) = classify(right, source);
                if matches!(
                    shape,
                    ExportShape::ObjectLiteral | ExportShape::CallWrapper { .. } | ExportShape::Function
                ) {
                    edits.push(Edit {
                        range: statement.start_byte()..right.start_byte(),
                        replacement: "export default ".to_string(),
                    });
                }
            }
            _ => {}
        }
    }

    if edits.is_empty() {
        return Ok(source.to_string());
    }
    tracing::debug!(edits = edits.len(), "normalized module syntax");
    Ok(splice(source, edits))
}

fn require_to_import(statement: Node<'_>, source: &str) -> Option<String> {
    let declarators: Vec<Node<'_>> = named_children(statement)
        .into_iter()
        .filter(|n| n.kind() == "variable_declarator")
        .collect();
    let [declarator] = declarators.as_slice() else {
        return None;
    };

    let module = required_module(declarator.child_by_field_name("value")?, source)?;
    let name = declarator.child_by_field_name("name")?;
    let binding = match name.kind() {
        "identifier" => text(name, source).to_string(),
        "object_pattern" => format!("{{ {} }}", named_bindings(name, source)?.join(", ")),
        _ => return None,
    };

    let semicolon = if text(statement, source).trim_end().ends_with(';') {
        ";"
    } else {
        ""
    };
    Some(format!("import {binding} from {module}{semicolon}"))
}

/// The quoted module specifier of a `require('m')` call, as written.
fn required_module<'s>(value: Node<'_>, source: &'s str) -> Option<&'s str> {
    if value.kind() != "call_expression" {
        return None;
    }
    let callee = value.child_by_field_name("function")?;
    if text(callee, source) != "require" {
        return None;
    }
    let args = named_children(value.child_by_field_name("arguments")?);
    match args.as_slice() {
        [arg] if arg.kind() == "string" => Some(text(*arg, source)),
        _ => None,
    }
}

/// `{ a, b: c }` as import specifiers. Defaults, rest elements and nested patterns are not
/// expressible as import bindings.
fn named_bindings(pattern: Node<'_>, source: &str) -> Option<Vec<String>> {
    let mut bindings = Vec::new();
    for entry in named_children(pattern) {
        match entry.kind() {
            "shorthand_property_identifier_pattern" => {
                bindings.push(text(entry, source).to_string());
            }
            "pair_pattern" => {
                let key = entry.child_by_field_name("key")?;
                let value = entry.child_by_field_name("value")?;
                if key.kind() != "property_identifier" || value.kind() != "identifier" {
                    return None;
                }
                let (key, value) = (text(key, source), text(value, source));
                if key == value {
                    bindings.push(key.to_string());
                } else {
                    bindings.push(format!("{key} as {value}"));
                }
            }
            _ => return None,
        }
    }
    (!bindings.is_empty()).then_some(bindings)
}
