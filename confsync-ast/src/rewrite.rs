use crate::error::ParseError;
use crate::normalize::normalize_module_syntax;
use crate::parse::{Dialect, Edit, parse, splice};
use crate::props::{Property, PropertyList, extract, render};
use crate::shape::{ExportShape, locate_export};

/// Classify the default export of `source`.
pub fn export_shape(source: &str, dialect: Dialect) -> Result<ExportShape, ParseError> {
    let tree = parse(source, dialect)?;
    Ok(locate_export(tree.root_node(), source).shape)
}

/// The exported properties, or `None` when the export has no property list.
pub fn read_properties(
    source: &str,
    dialect: Dialect,
) -> Result<Option<PropertyList>, ParseError> {
    let tree = parse(source, dialect)?;
    let site = locate_export(tree.root_node(), source);
    Ok(site.object.map(|object| extract(object, source).0))
}

/// A single exported property by key.
pub fn read_property(
    source: &str,
    dialect: Dialect,
    key: &str,
) -> Result<Option<Property>, ParseError> {
    Ok(read_properties(source, dialect)?
        .and_then(|props| props.into_iter().find(|p| p.key() == key)))
}

/// Rewrite the exported config object of `source` through `prop_transform`.
///
/// Only the object literal is reprinted; every byte outside it is preserved. When the shape
/// carries no property list (functions, named exports, unknown) the source is returned
/// unchanged, and so is it when the transform returns the list it was given.
pub fn transform<F>(source: &str, dialect: Dialect, prop_transform: F) -> Result<String, ParseError>
where
    F: FnOnce(&ExportShape, PropertyList) -> PropertyList,
{
    let tree = parse(source, dialect)?;
    let site = locate_export(tree.root_node(), source);
    let Some(object) = site.object else {
        tracing::trace!(shape = ?site.shape, "export has no property list");
        return Ok(source.to_string());
    };

    let (existing, layout) = extract(object, source);
    let updated = prop_transform(&site.shape, existing.clone());
    if updated == existing {
        return Ok(source.to_string());
    }

    let replacement = render(&updated, &layout);
    Ok(splice(
        source,
        vec![Edit {
            range: object.byte_range(),
            replacement,
        }],
    ))
}

/// Normalize module syntax, then apply `prop_transform` to the result.
pub fn rewrite_config<F>(
    source: &str,
    dialect: Dialect,
    prop_transform: F,
) -> Result<String, ParseError>
where
    F: FnOnce(&ExportShape, PropertyList) -> PropertyList,
{
    let normalized = normalize_module_syntax(source, dialect)?;
    transform(&normalized, dialect, prop_transform)
}
