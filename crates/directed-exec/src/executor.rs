//! Logical tokens that walk a graph.

use directed_core::id::NodeId;
use directed_core::integer::Int;

use crate::junction::SlotId;

/// One token traversing a graph instance.
///
/// Executors are logical, not host threads: the scheduler advances each one
/// action at a time, in `alive` order, on the single host thread. The
/// accumulator travels by value; forks copy it.
#[derive(Debug, Clone)]
pub struct Executor {
    /// Unique within the owning instance.
    pub id: u64,
    pub current: NodeId,
    /// Index in `current`'s parent order through which this executor
    /// arrived. Meaningful on junction arrival.
    pub last_edge_index: usize,
    pub accumulator: Int,
    /// Junction slot reserved while parked at a multi-input node.
    pub waiting: Option<SlotId>,
    /// Move target assigned at seed or fork time, consumed by the next
    /// action.
    pub pending_target: Option<NodeId>,
    /// Tombstone; compacted out at the end of the step.
    pub dead: bool,
}

impl Executor {
    /// A freshly seeded executor: its first action executes its own node.
    pub fn seeded(id: u64, node: NodeId, accumulator: Int) -> Self {
        Executor {
            id,
            current: node,
            last_edge_index: 0,
            accumulator,
            waiting: None,
            pending_target: Some(node),
            dead: false,
        }
    }

    /// A fork clone: same accumulator, same current node, fresh id; its
    /// next action moves it onto `target`.
    pub fn fork(&self, id: u64, target: NodeId) -> Executor {
        Executor {
            id,
            current: self.current,
            last_edge_index: self.last_edge_index,
            accumulator: self.accumulator.clone(),
            waiting: None,
            pending_target: Some(target),
            dead: false,
        }
    }
}
