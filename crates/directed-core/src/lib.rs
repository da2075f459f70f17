pub mod diagnostics;
pub mod error;
pub mod graph;
pub mod id;
pub mod integer;
pub mod node;
pub mod node_type;
pub mod ops;
pub mod registry;

// Re-export commonly used types
pub use diagnostics::{Diagnostic, SourcePos};
pub use error::LoadError;
pub use graph::{Graph, GraphBuilder, Program};
pub use id::{GraphId, NodeId};
pub use integer::Int;
pub use node::Node;
pub use node_type::{Arity, NodeType, Outcome};
pub use ops::{FoldOp, RelOp};
pub use registry::{ImportStack, NodeTypeRegistry};
