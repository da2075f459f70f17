//! Name resolution for node types and linked units.
//!
//! Each compilation unit owns a [`NodeTypeRegistry`] pre-populated with the
//! built-in operator set. User graphs register under their declared names as
//! sub-graph node types; imports splice another unit's graphs in under a
//! namespace. The [`ImportStack`] is the loader's guard against cyclic
//! import chains.

use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::diagnostics::SourcePos;
use crate::error::LoadError;
use crate::graph::Program;
use crate::id::GraphId;
use crate::node_type::NodeType;
use crate::ops::{FoldOp, RelOp};

/// Mapping from surface type name to node type for one unit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeTypeRegistry {
    types: IndexMap<String, NodeType>,
}

impl NodeTypeRegistry {
    /// Registry pre-populated with the built-in operator set: `Nop`, `Die`,
    /// `Return`, `Out`, the fold operators and relational filters under
    /// their symbols, and `Use`.
    pub fn with_builtins() -> Self {
        let mut types = IndexMap::new();
        types.insert("Nop".to_string(), NodeType::Nop);
        types.insert("Die".to_string(), NodeType::Die);
        types.insert("Return".to_string(), NodeType::Return);
        types.insert("Out".to_string(), NodeType::Out);
        for op in FoldOp::ALL {
            types.insert(
                op.symbol().to_string(),
                NodeType::Fold {
                    op,
                    params: Vec::new(),
                },
            );
        }
        for rel in RelOp::ALL {
            types.insert(
                rel.symbol().to_string(),
                NodeType::Filter {
                    rel,
                    params: Vec::new(),
                },
            );
        }
        types.insert("Use".to_string(), NodeType::Select);
        NodeTypeRegistry { types }
    }

    pub fn resolve(&self, name: &str, pos: &SourcePos) -> Result<&NodeType, LoadError> {
        self.types
            .get(name)
            .ok_or_else(|| LoadError::UndefinedType {
                name: name.to_string(),
                pos: pos.clone(),
            })
    }

    pub fn contains(&self, name: &str) -> bool {
        self.types.contains_key(name)
    }

    /// Registers a type under a fresh name.
    pub fn define(&mut self, name: &str, ty: NodeType, pos: &SourcePos) -> Result<(), LoadError> {
        if self.types.contains_key(name) {
            return Err(LoadError::RedeclaredType {
                name: name.to_string(),
                pos: pos.clone(),
            });
        }
        self.types.insert(name.to_string(), ty);
        Ok(())
    }

    /// Registers a user graph under its declared name.
    ///
    /// The resulting type is a junction exactly when the graph takes more
    /// than one runtime argument, and demands exactly `nparameters`
    /// parameters.
    pub fn define_graph(
        &mut self,
        program: &Program,
        id: GraphId,
        pos: &SourcePos,
    ) -> Result<(), LoadError> {
        let graph = program.graph(id);
        let ty = NodeType::Call {
            graph: id,
            name: graph.name().to_string(),
            nparameters: graph.nparameters(),
            nargs: graph.nargs(),
            params: Vec::new(),
        };
        self.define(graph.name(), ty, pos)
    }

    /// Splices another unit's user-defined graphs in under `namespace`.
    ///
    /// Each graph `G` becomes visible as `<namespace>.<G>`, except `Main`,
    /// which imports bare as `<namespace>` itself. Built-ins are not
    /// re-exported.
    pub fn import(
        &mut self,
        namespace: &str,
        exported: &NodeTypeRegistry,
        pos: &SourcePos,
    ) -> Result<(), LoadError> {
        for (name, ty) in &exported.types {
            if !matches!(ty, NodeType::Call { .. }) {
                continue;
            }
            let visible = if name.as_str() == "Main" {
                namespace.to_string()
            } else {
                format!("{namespace}.{name}")
            };
            self.define(&visible, ty.clone(), pos)?;
        }
        Ok(())
    }

    /// Finds the entry graph and checks its signature: `Main` must take no
    /// parameters and at most one argument.
    pub fn main_graph(&self, unit_pos: &SourcePos) -> Result<GraphId, LoadError> {
        match self.types.get("Main") {
            Some(NodeType::Call {
                graph,
                nparameters,
                nargs,
                ..
            }) => {
                if *nparameters != 0 || *nargs > 1 {
                    return Err(LoadError::MainSignature {
                        pos: unit_pos.clone(),
                    });
                }
                Ok(*graph)
            }
            _ => Err(LoadError::MissingMain {
                pos: unit_pos.clone(),
            }),
        }
    }

    /// Registered names in registration order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.types.keys().map(String::as_str)
    }
}

/// Tracks the chain of units being loaded to reject import cycles.
#[derive(Debug, Default)]
pub struct ImportStack {
    chain: Vec<PathBuf>,
}

impl ImportStack {
    pub fn new() -> Self {
        ImportStack::default()
    }

    /// Pushes a unit onto the chain; fails when the chain already holds it.
    pub fn enter(&mut self, path: &Path, pos: &SourcePos) -> Result<(), LoadError> {
        if self.chain.iter().any(|entry| entry == path) {
            return Err(LoadError::CyclicImport {
                path: path.display().to_string(),
                pos: pos.clone(),
            });
        }
        self.chain.push(path.to_path_buf());
        Ok(())
    }

    /// Pops the most recent unit once it finished loading.
    pub fn leave(&mut self) {
        self.chain.pop();
    }

    pub fn depth(&self) -> usize {
        self.chain.len()
    }
}
