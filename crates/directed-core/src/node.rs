//! Graph vertices.

use serde::{Deserialize, Serialize};

use crate::diagnostics::SourcePos;
use crate::node_type::NodeType;

/// One vertex of a program graph.
///
/// Topology (parents and children) lives in the surrounding graph's edges;
/// a node carries its operator, its optional label, and the source position
/// used for diagnostics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Node {
    pub ty: NodeType,
    pub name: Option<String>,
    pub pos: SourcePos,
}

impl Node {
    pub fn new(ty: NodeType, pos: SourcePos) -> Self {
        Node {
            ty,
            name: None,
            pos,
        }
    }

    pub fn named(ty: NodeType, name: impl Into<String>, pos: SourcePos) -> Self {
        Node {
            ty,
            name: Some(name.into()),
            pos,
        }
    }

    /// The label shown in diagnostics and debug traces: the declared name
    /// when there is one, otherwise the type's surface form.
    pub fn label(&self) -> String {
        match &self.name {
            Some(name) => name.clone(),
            None => self.ty.to_string(),
        }
    }
}
