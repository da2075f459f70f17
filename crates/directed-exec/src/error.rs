//! Runtime error types.
//!
//! `Die` and `DieAll` outcomes are normal control flow, not errors. The
//! variants here are the conditions that abort the whole program; fatal
//! arithmetic carries the source position of the executing node.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use directed_core::diagnostics::{Diagnostic, SourcePos};

/// Fatal conditions raised while running a graph instance.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum RuntimeError {
    /// `/` or `%` with a zero divisor.
    #[error("division by zero")]
    DivideByZero { pos: SourcePos },

    /// The host output stream failed.
    #[error("output error: {message}")]
    Output { message: String },

    /// A state the scheduler cannot reach through a validated graph.
    #[error("internal error: {message}")]
    Internal { message: String },
}

impl RuntimeError {
    /// The source position to report, when the error has one.
    pub fn pos(&self) -> Option<&SourcePos> {
        match self {
            RuntimeError::DivideByZero { pos } => Some(pos),
            RuntimeError::Output { .. } | RuntimeError::Internal { .. } => None,
        }
    }

    pub fn to_diagnostic(&self) -> Diagnostic {
        let pos = self.pos().cloned().unwrap_or_else(SourcePos::builtin);
        Diagnostic::new(pos, self.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn divide_by_zero_reports_the_node_position() {
        let err = RuntimeError::DivideByZero {
            pos: SourcePos::new("main.dg", 7, 3),
        };
        let diag = err.to_diagnostic();
        assert_eq!(diag.render(None), "main.dg:7:3: division by zero");
    }

    #[test]
    fn serde_roundtrip() {
        let err = RuntimeError::Internal {
            message: "boom".into(),
        };
        let json = serde_json::to_string(&err).unwrap();
        let back: RuntimeError = serde_json::from_str(&json).unwrap();
        assert_eq!(err, back);
    }
}
