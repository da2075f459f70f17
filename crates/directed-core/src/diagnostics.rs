//! Source positions and diagnostic rendering.
//!
//! Every load-time error and every fatal runtime error points at a source
//! position; [`Diagnostic`] renders the conventional one-line form
//! `filename:line:column: message`, optionally followed by the offending
//! source line with a caret under the column.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A position in a source unit. Lines and columns are 1-based.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourcePos {
    pub file: String,
    pub line: u32,
    pub column: u32,
}

impl SourcePos {
    pub fn new(file: impl Into<String>, line: u32, column: u32) -> Self {
        SourcePos {
            file: file.into(),
            line,
            column,
        }
    }

    /// Position for entities synthesized outside any source unit.
    pub fn builtin() -> Self {
        SourcePos::new("<builtin>", 0, 0)
    }
}

impl fmt::Display for SourcePos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.file, self.line, self.column)
    }
}

/// A positioned message ready for the error stream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub pos: SourcePos,
    pub message: String,
}

impl Diagnostic {
    pub fn new(pos: SourcePos, message: impl Into<String>) -> Self {
        Diagnostic {
            pos,
            message: message.into(),
        }
    }

    /// Renders the diagnostic. When the offending source line is supplied,
    /// it is echoed below the message with a caret marking the column.
    pub fn render(&self, source_line: Option<&str>) -> String {
        let mut out = format!("{}: {}", self.pos, self.message);
        if let Some(line) = source_line {
            out.push('\n');
            out.push_str(line);
            out.push('\n');
            for _ in 1..self.pos.column {
                out.push(' ');
            }
            out.push('^');
        }
        out
    }
}
