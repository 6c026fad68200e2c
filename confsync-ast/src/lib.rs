//! Format-preserving rewriter for JavaScript/TypeScript config modules.
//!
//! A config module (`jest.config.ts`, `eslint.config.mjs`, ...) is parsed with tree-sitter,
//! its default export is located and classified ([`ExportShape`]), and the exported object's
//! properties can be rewritten through a property transform such as [`appender`] or
//! [`filter`]. Only the exported object is reprinted, so comments and formatting elsewhere in
//! the file survive untouched.
//!
//! ```
//! use confsync_ast::{Dialect, Property, appender, transform};
//!
//! let out = transform(
//!     "export default { a: 1 };\n",
//!     Dialect::JavaScript,
//!     appender([Property::pair("b", "2")]),
//! )
//! .unwrap();
//! assert_eq!(out, "export default { a: 1, b: 2 };\n");
//! ```

pub mod error;
mod normalize;
mod parse;
mod props;
mod rewrite;
mod shape;

pub use error::ParseError;
pub use normalize::normalize_module_syntax;
pub use parse::Dialect;
pub use props::{Property, PropertyList, appender, filter, parse_properties, quote, remover};
pub use rewrite::{export_shape, read_properties, read_property, rewrite_config, transform};
pub use shape::ExportShape;
