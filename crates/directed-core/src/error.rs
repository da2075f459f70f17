//! Load-time error types.
//!
//! Uses `thiserror` for structured, matchable variants covering every
//! failure the front end can hit while building a program: name resolution,
//! arity and parameterization checks, entry-point validation, and import
//! handling. Every variant carries the source position it should be
//! reported at; [`LoadError::to_diagnostic`] produces the rendered form.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::diagnostics::{Diagnostic, SourcePos};
use crate::node_type::Arity;

/// Errors surfaced while loading and linking a program.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum LoadError {
    /// A parse failure, constructed by the front end.
    #[error("{message}")]
    Syntax { message: String, pos: SourcePos },

    /// A node references a type name the registry does not know.
    #[error("undefined type '{name}'")]
    UndefinedType { name: String, pos: SourcePos },

    /// The same type name is declared twice in one unit.
    #[error("type '{name}' is declared twice")]
    RedeclaredType { name: String, pos: SourcePos },

    /// The same variable name is declared twice in one graph.
    #[error("variable '{name}' is declared twice")]
    RedeclaredName { name: String, pos: SourcePos },

    /// An edge references a variable that was never declared.
    #[error("unknown variable '{name}'")]
    UnknownVariable { name: String, pos: SourcePos },

    /// A node's in-edge count falls outside the range its type accepts.
    #[error("node type '{type_name}' takes {expected} in-edges, found {found}")]
    InEdgeCount {
        type_name: String,
        expected: Arity,
        found: usize,
        pos: SourcePos,
    },

    /// A parameter list's length falls outside the range the type accepts.
    #[error("node type '{type_name}' takes {expected} parameters, found {found}")]
    ParameterCount {
        type_name: String,
        expected: Arity,
        found: usize,
        pos: SourcePos,
    },

    /// Parameters were supplied to a type that takes none.
    #[error("node type '{type_name}' is not parameterizable")]
    NotParameterizable { type_name: String, pos: SourcePos },

    /// A type that demands parameters was used without any.
    #[error("node type '{type_name}' must be parameterized")]
    MissingParameters { type_name: String, pos: SourcePos },

    /// A parameter value the type cannot accept (e.g. a negative selector).
    #[error("invalid parameter for '{type_name}': {reason}")]
    InvalidParameter {
        type_name: String,
        reason: String,
        pos: SourcePos,
    },

    /// No graph named `Main` was declared.
    #[error("no 'Main' graph declared")]
    MissingMain { pos: SourcePos },

    /// `Main` exists but its signature is wrong.
    #[error("'Main' must take no parameters and at most one argument")]
    MainSignature { pos: SourcePos },

    /// An import chain revisits a file.
    #[error("cyclic import of '{path}'")]
    CyclicImport { path: String, pos: SourcePos },

    /// An imported file cannot be opened.
    #[error("cannot read import '{path}': {reason}")]
    UnreadableImport {
        path: String,
        reason: String,
        pos: SourcePos,
    },
}

impl LoadError {
    /// The position this error should be reported at.
    pub fn pos(&self) -> &SourcePos {
        match self {
            LoadError::Syntax { pos, .. }
            | LoadError::UndefinedType { pos, .. }
            | LoadError::RedeclaredType { pos, .. }
            | LoadError::RedeclaredName { pos, .. }
            | LoadError::UnknownVariable { pos, .. }
            | LoadError::InEdgeCount { pos, .. }
            | LoadError::ParameterCount { pos, .. }
            | LoadError::NotParameterizable { pos, .. }
            | LoadError::MissingParameters { pos, .. }
            | LoadError::InvalidParameter { pos, .. }
            | LoadError::MissingMain { pos }
            | LoadError::MainSignature { pos }
            | LoadError::CyclicImport { pos, .. }
            | LoadError::UnreadableImport { pos, .. } => pos,
        }
    }

    pub fn to_diagnostic(&self) -> Diagnostic {
        Diagnostic::new(self.pos().clone(), self.to_string())
    }
}
