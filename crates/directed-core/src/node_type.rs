//! The node-type algebra: every operator a graph vertex can carry.
//!
//! A [`NodeType`] is immutable once constructed. Parameterization is purely
//! functional: [`NodeType::parameterize`] returns a new type value holding
//! the bound parameters, and the original is untouched. The two capability
//! queries -- [`junction_range`](NodeType::junction_range) and
//! [`parameter_range`](NodeType::parameter_range) -- replace the capability
//! interfaces of a class hierarchy with plain predicates on the sum.
//!
//! Execution of the algebra lives in the runtime crate: the `Call` and
//! `Out` variants need the graph arena and the output stream. The pure
//! pieces (operator folds, relational filters, arity rules) are fully
//! defined here.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::diagnostics::SourcePos;
use crate::error::LoadError;
use crate::id::GraphId;
use crate::integer::{self, Int};
use crate::ops::{FoldOp, RelOp};

/// Inclusive arity range; `max == None` means unbounded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Arity {
    pub min: usize,
    pub max: Option<usize>,
}

impl Arity {
    pub const fn at_least(min: usize) -> Self {
        Arity { min, max: None }
    }

    pub const fn exactly(n: usize) -> Self {
        Arity { min: n, max: Some(n) }
    }

    pub fn contains(&self, n: usize) -> bool {
        n >= self.min && self.max.map_or(true, |max| n <= max)
    }
}

impl fmt::Display for Arity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.max {
            Some(max) if max == self.min => write!(f, "exactly {}", self.min),
            Some(max) => write!(f, "between {} and {}", self.min, max),
            None => write!(f, "at least {}", self.min),
        }
    }
}

/// Result of executing a node type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Outcome {
    /// Produce a new accumulator and keep walking.
    Value(Int),
    /// Terminate the enclosing graph instance with a result.
    Return(Int),
    /// Remove the executing token.
    Die,
    /// Remove every token in the enclosing instance.
    DieAll,
}

/// A graph operator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum NodeType {
    /// Passes the accumulator through unchanged.
    Nop,
    /// Kills every executor in the instance.
    Die,
    /// Terminates the instance, delivering the accumulator.
    Return,
    /// Writes the low byte of the accumulator to the output stream, then
    /// passes the accumulator through.
    Out,
    /// Produces a fixed value, ignoring the incoming accumulator.
    Literal(Int),
    /// Left-fold of `args ++ params` with an integer operator.
    Fold { op: FoldOp, params: Vec<Int> },
    /// Pairwise relational filter over `args ++ params`: passes the first
    /// argument through when every adjacent pair satisfies the relation,
    /// otherwise kills the executor.
    Filter { rel: RelOp, params: Vec<Int> },
    /// `Use` before parameterization. Never valid on a finished graph.
    Select,
    /// `Use(i)`: passes argument `i` through.
    SelectAt(usize),
    /// Invokes a sub-graph with `params ++ args` as its inputs.
    Call {
        graph: GraphId,
        name: String,
        nparameters: usize,
        nargs: usize,
        params: Vec<Int>,
    },
}

impl NodeType {
    /// In-edge range when this type synchronizes multiple inputs.
    ///
    /// `None` means the type takes a single in-edge and never parks
    /// executors.
    pub fn junction_range(&self) -> Option<Arity> {
        match self {
            NodeType::Fold { .. } | NodeType::Filter { .. } => Some(Arity::at_least(1)),
            NodeType::SelectAt(index) => Some(Arity::at_least(index + 1)),
            NodeType::Call { nargs, .. } if *nargs > 1 => Some(Arity::exactly(*nargs)),
            _ => None,
        }
    }

    /// Parameter-count range accepted by [`parameterize`](Self::parameterize).
    ///
    /// `None` means the type is not parameterizable (`Out` included).
    pub fn parameter_range(&self) -> Option<Arity> {
        match self {
            NodeType::Fold { .. } | NodeType::Filter { .. } => Some(Arity::at_least(0)),
            NodeType::Select => Some(Arity::exactly(1)),
            NodeType::Call { nparameters, .. } => Some(Arity::exactly(*nparameters)),
            _ => None,
        }
    }

    /// True when this type may not appear on a node without parameters.
    pub fn requires_parameters(&self) -> bool {
        match self {
            NodeType::Select => true,
            NodeType::Call {
                nparameters,
                params,
                ..
            } => *nparameters > 0 && params.is_empty(),
            _ => false,
        }
    }

    /// Binds parameters, producing a new type.
    pub fn parameterize(&self, params: Vec<Int>, pos: &SourcePos) -> Result<NodeType, LoadError> {
        let range = self
            .parameter_range()
            .ok_or_else(|| LoadError::NotParameterizable {
                type_name: self.to_string(),
                pos: pos.clone(),
            })?;
        if !range.contains(params.len()) {
            return Err(LoadError::ParameterCount {
                type_name: self.to_string(),
                expected: range,
                found: params.len(),
                pos: pos.clone(),
            });
        }

        match self {
            NodeType::Fold { op, .. } => Ok(NodeType::Fold { op: *op, params }),
            NodeType::Filter { rel, .. } => Ok(NodeType::Filter { rel: *rel, params }),
            NodeType::Select => {
                let index =
                    integer::to_index(&params[0]).ok_or_else(|| LoadError::InvalidParameter {
                        type_name: self.to_string(),
                        reason: format!("selector index {} is not a non-negative index", params[0]),
                        pos: pos.clone(),
                    })?;
                Ok(NodeType::SelectAt(index))
            }
            NodeType::Call {
                graph,
                name,
                nparameters,
                nargs,
                ..
            } => Ok(NodeType::Call {
                graph: *graph,
                name: name.clone(),
                nparameters: *nparameters,
                nargs: *nargs,
                params,
            }),
            // parameter_range returned None above for everything else
            _ => Err(LoadError::NotParameterizable {
                type_name: self.to_string(),
                pos: pos.clone(),
            }),
        }
    }
}

impl fmt::Display for NodeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NodeType::Nop => write!(f, "Nop"),
            NodeType::Die => write!(f, "Die"),
            NodeType::Return => write!(f, "Return"),
            NodeType::Out => write!(f, "Out"),
            NodeType::Literal(value) => write!(f, "{value}"),
            NodeType::Fold { op, .. } => write!(f, "{}", op.symbol()),
            NodeType::Filter { rel, .. } => write!(f, "{}", rel.symbol()),
            NodeType::Select => write!(f, "Use"),
            NodeType::SelectAt(index) => write!(f, "Use({index})"),
            NodeType::Call { name, .. } => write!(f, "{name}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pos() -> SourcePos {
        SourcePos::builtin()
    }

    fn call(nparameters: usize, nargs: usize) -> NodeType {
        NodeType::Call {
            graph: GraphId(0),
            name: "Pair".into(),
            nparameters,
            nargs,
            params: Vec::new(),
        }
    }

    #[test]
    fn operators_and_filters_are_open_junctions() {
        let add = NodeType::Fold {
            op: FoldOp::Add,
            params: Vec::new(),
        };
        assert_eq!(add.junction_range(), Some(Arity::at_least(1)));

        let eq = NodeType::Filter {
            rel: RelOp::Eq,
            params: Vec::new(),
        };
        assert_eq!(eq.junction_range(), Some(Arity::at_least(1)));
    }

    #[test]
    fn selector_junction_range_follows_its_index() {
        assert_eq!(
            NodeType::SelectAt(2).junction_range(),
            Some(Arity::at_least(3))
        );
    }

    #[test]
    fn sub_graph_is_a_junction_only_with_multiple_arguments() {
        assert_eq!(call(0, 2).junction_range(), Some(Arity::exactly(2)));
        assert_eq!(call(0, 1).junction_range(), None);
        assert_eq!(call(0, 0).junction_range(), None);
    }

    #[test]
    fn simple_types_never_synchronize() {
        for ty in [NodeType::Nop, NodeType::Die, NodeType::Return, NodeType::Out] {
            assert_eq!(ty.junction_range(), None);
            assert_eq!(ty.parameter_range(), None);
        }
    }

    #[test]
    fn parameterize_select_produces_an_indexed_selector() {
        let ty = NodeType::Select
            .parameterize(vec![Int::from(2)], &pos())
            .unwrap();
        assert_eq!(ty, NodeType::SelectAt(2));
    }

    #[test]
    fn parameterize_select_rejects_negative_indices() {
        let err = NodeType::Select
            .parameterize(vec![Int::from(-1)], &pos())
            .unwrap_err();
        assert!(matches!(err, LoadError::InvalidParameter { .. }));
    }

    #[test]
    fn parameterize_select_wants_exactly_one_parameter() {
        let err = NodeType::Select
            .parameterize(vec![Int::from(0), Int::from(1)], &pos())
            .unwrap_err();
        assert!(matches!(err, LoadError::ParameterCount { found: 2, .. }));
    }

    #[test]
    fn out_is_not_parameterizable() {
        let err = NodeType::Out
            .parameterize(vec![Int::from(1)], &pos())
            .unwrap_err();
        assert!(matches!(err, LoadError::NotParameterizable { .. }));
    }

    #[test]
    fn parameterized_operator_keeps_its_values() {
        let add = NodeType::Fold {
            op: FoldOp::Add,
            params: Vec::new(),
        };
        let ty = add.parameterize(vec![Int::from(3)], &pos()).unwrap();
        assert_eq!(
            ty,
            NodeType::Fold {
                op: FoldOp::Add,
                params: vec![Int::from(3)],
            }
        );
        // The original is untouched.
        assert_eq!(
            add,
            NodeType::Fold {
                op: FoldOp::Add,
                params: Vec::new(),
            }
        );
    }

    #[test]
    fn sub_graph_parameter_count_is_exact() {
        let err = call(2, 1).parameterize(vec![Int::from(1)], &pos()).unwrap_err();
        assert!(matches!(err, LoadError::ParameterCount { found: 1, .. }));

        let ty = call(2, 1)
            .parameterize(vec![Int::from(1), Int::from(2)], &pos())
            .unwrap();
        assert!(!ty.requires_parameters());
    }

    #[test]
    fn unparameterized_forms_are_flagged() {
        assert!(NodeType::Select.requires_parameters());
        assert!(call(1, 1).requires_parameters());
        assert!(!call(0, 1).requires_parameters());
        assert!(!NodeType::Nop.requires_parameters());
        let add = NodeType::Fold {
            op: FoldOp::Add,
            params: Vec::new(),
        };
        assert!(!add.requires_parameters());
    }

    #[test]
    fn display_uses_surface_names() {
        assert_eq!(NodeType::Literal(Int::from(42)).to_string(), "42");
        assert_eq!(NodeType::SelectAt(1).to_string(), "Use(1)");
        assert_eq!(
            NodeType::Filter {
                rel: RelOp::Ne,
                params: Vec::new()
            }
            .to_string(),
            "!="
        );
        assert_eq!(call(0, 2).to_string(), "Pair");
    }
}
