//! Error types for confsync-ast.

use crate::parse::Dialect;
use thiserror::Error;

/// A source file could not be turned into a usable syntax tree.
///
/// Callers must not attempt partial application after this error; the usual recovery is to pass
/// the file through unchanged and log a warning.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// The grammar for the dialect could not be loaded into the parser.
    #[error("failed to load {dialect} grammar: {message}")]
    Grammar { dialect: Dialect, message: String },

    /// The parser gave up without producing a tree.
    #[error("{dialect} parser produced no tree")]
    Aborted { dialect: Dialect },

    /// The tree contains error or missing nodes.
    #[error("{dialect} syntax error at {line}:{column} near `{near}`")]
    Syntax {
        dialect: Dialect,
        line: usize,
        column: usize,
        near: String,
    },

    /// A snippet expected to be an object literal was something else.
    #[error("expected an object literal, found `{found}`")]
    NotObjectLiteral { found: String },
}

impl ParseError {
    /// 1-based (line, column) of a syntax error, if this is one.
    pub fn location(&self) -> Option<(usize, usize)> {
        match self {
            ParseError::Syntax { line, column, .. } => Some((*line, *column)),
            _ => None,
        }
    }
}
