use crate::parse::{named_children, text};
use tree_sitter::Node;

/// Structural shape of a module's default export.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ExportShape {
    /// `export default { ... }` or `module.exports = { ... }`.
    ObjectLiteral,
    /// A call whose single argument is an object literal, e.g. `defineConfig({ ... })`.
    CallWrapper { callee: String },
    /// A function, or a call with several arguments, producing the config at load time.
    /// Opaque.
    Function,
    /// Only named exports; there is no default export.
    NamedExports,
    /// Anything else, including modules with no recognizable export.
    Unknown,
}

impl ExportShape {
    /// Whether property transforms can act on this shape.
    pub fn has_properties(&self) -> bool {
        matches!(
            self,
            ExportShape::ObjectLiteral | ExportShape::CallWrapper { .. }
        )
    }
}

#[derive(Debug, Clone)]
pub(crate) struct ExportSite<'t> {
    /// The object literal holding the config's properties.
    pub object: Option<Node<'t>>,
    pub shape: ExportShape,
}

/// Find the module's default export among top-level statements. The first default wins.
pub(crate) fn locate_export<'t>(root: Node<'t>, source: &str) -> ExportSite<'t> {
    let mut saw_named = false;

    for statement in named_children(root) {
        match statement.kind() {
            "expression_statement" => {
                if let Some(right) = module_exports_value(statement, source) {
                    let (shape, object) = classify(right, source);
                    return ExportSite { object, shape };
                }
            }
            "export_statement" => {
                if !is_default_export(statement) {
                    saw_named = true;
                    continue;
                }
                if let Some(value) = statement.child_by_field_name("value") {
                    let (shape, object) = classify(value, source);
                    return ExportSite { object, shape };
                }
                let shape = match statement.child_by_field_name("declaration").map(|d| d.kind()) {
                    Some("function_declaration" | "generator_function_declaration") => {
                        ExportShape::Function
                    }
                    _ => ExportShape::Unknown,
                };
                return ExportSite {
                    object: None,
                    shape,
                };
            }
            _ => {}
        }
    }

    ExportSite {
        object: None,
        shape: if saw_named {
            ExportShape::NamedExports
        } else {
            ExportShape::Unknown
        },
    }
}

fn is_default_export(statement: Node<'_>) -> bool {
    let mut cursor = statement.walk();
    statement
        .children(&mut cursor)
        .any(|child| child.kind() == "default")
}

/// Right-hand side of a top-level `module.exports = <expr>` statement.
pub(crate) fn module_exports_value<'t>(statement: Node<'t>, source: &str) -> Option<Node<'t>> {
    let expr = named_children(statement).into_iter().next()?;
    if expr.kind() != "assignment_expression" {
        return None;
    }
    let left = expr.child_by_field_name("left")?;
    if left.kind() != "member_expression" {
        return None;
    }
    let object = left.child_by_field_name("object")?;
    let property = left.child_by_field_name("property")?;
    if text(object, source) == "module" && text(property, source) == "exports" {
        expr.child_by_field_name("right")
    } else {
        None
    }
}

/// Strip parentheses and TypeScript `satisfies`/`as` wrappers.
pub(crate) fn unwrap_expression(mut node: Node<'_>) -> Node<'_> {
    loop {
        match node.kind() {
            "parenthesized_expression" | "satisfies_expression" | "as_expression" => {
                match named_children(node).into_iter().next() {
                    Some(inner) => node = inner,
                    None => return node,
                }
            }
            _ => return node,
        }
    }
}

pub(crate) fn classify<'t>(expression: Node<'t>, source: &str) -> (ExportShape, Option<Node<'t>>) {
    let node = unwrap_expression(expression);
    match node.kind() {
        "object" => (ExportShape::ObjectLiteral, Some(node)),
        "call_expression" => {
            let args = node
                .child_by_field_name("arguments")
                .filter(|a| a.kind() == "arguments")
                .map(named_children)
                .unwrap_or_default();
            match args.as_slice() {
                [only] => {
                    let arg = unwrap_expression(*only);
                    match node.child_by_field_name("function") {
                        Some(callee) if arg.kind() == "object" => (
                            ExportShape::CallWrapper {
                                callee: text(callee, source).to_string(),
                            },
                            Some(arg),
                        ),
                        // `require('m')` re-exports and similar single-argument calls.
                        _ => (ExportShape::Unknown, None),
                    }
                }
                [] => (ExportShape::Unknown, None),
                _ => (ExportShape::Function, None),
            }
        }
        "arrow_function" | "function_expression" | "function" | "generator_function" => {
            (ExportShape::Function, None)
        }
        _ => (ExportShape::Unknown, None),
    }
}
