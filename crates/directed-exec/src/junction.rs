//! Synchronization slots for multi-input nodes.
//!
//! Each junction node owns a list of in-flight slots, one cell per in-edge.
//! An arriving executor takes the first slot whose cell for its arrival
//! edge is free (first-fit), so two executors arriving on the same edge
//! always occupy different slots and independent token waves interleave.
//! The arrival that fills the last cell drains the slot atomically: the
//! registry hands back the accumulators in parent-edge order together with
//! the consumed executors, and removes the slot.

use std::collections::HashMap;

use directed_core::id::NodeId;
use directed_core::integer::Int;

/// Identifier for one in-flight slot, unique within an instance. Stable
/// while other slots at the same node come and go.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SlotId(u64);

#[derive(Debug, Clone)]
struct SlotEntry {
    executor: u64,
    accumulator: Int,
}

/// One synchronization slot: one cell per in-edge of the junction node.
#[derive(Debug, Clone)]
struct JunctionSlot {
    id: SlotId,
    cells: Vec<Option<SlotEntry>>,
}

impl JunctionSlot {
    fn new(id: SlotId, width: usize) -> Self {
        JunctionSlot {
            id,
            cells: vec![None; width],
        }
    }

    fn is_full(&self) -> bool {
        self.cells.iter().all(Option::is_some)
    }
}

/// What happened when an executor arrived at a junction.
#[derive(Debug, PartialEq, Eq)]
pub enum Arrival {
    /// The executor parked; its slot still has empty cells.
    Parked(SlotId),
    /// The arrival completed the slot. `arguments` are the accumulators in
    /// parent-edge order; `consumed` lists the other executors that were
    /// parked in the slot, now spent.
    Filled {
        arguments: Vec<Int>,
        consumed: Vec<u64>,
    },
}

/// Per-instance registry of in-flight junction slots, keyed by node.
#[derive(Debug, Default)]
pub struct JunctionRegistry {
    slots: HashMap<NodeId, Vec<JunctionSlot>>,
    next_slot: u64,
}

impl JunctionRegistry {
    pub fn new() -> Self {
        JunctionRegistry::default()
    }

    /// Places an executor arriving through parent edge `edge` of a junction
    /// with `width` in-edges. Scans the node's slots for the first with
    /// that cell free, appending a fresh slot when none has room, then
    /// drains the slot if this arrival filled it.
    pub fn arrive(
        &mut self,
        node: NodeId,
        width: usize,
        edge: usize,
        executor: u64,
        accumulator: Int,
    ) -> Arrival {
        let list = self.slots.entry(node).or_default();

        let index = match list.iter().position(|slot| slot.cells[edge].is_none()) {
            Some(index) => index,
            None => {
                let id = SlotId(self.next_slot);
                self.next_slot += 1;
                list.push(JunctionSlot::new(id, width));
                list.len() - 1
            }
        };

        list[index].cells[edge] = Some(SlotEntry {
            executor,
            accumulator,
        });

        if !list[index].is_full() {
            return Arrival::Parked(list[index].id);
        }

        let slot = list.remove(index);
        let mut arguments = Vec::with_capacity(slot.cells.len());
        let mut consumed = Vec::new();
        for cell in slot.cells.into_iter().flatten() {
            if cell.executor != executor {
                consumed.push(cell.executor);
            }
            arguments.push(cell.accumulator);
        }
        Arrival::Filled {
            arguments,
            consumed,
        }
    }

    /// Number of in-flight slots at a node.
    pub fn pending_slots(&self, node: NodeId) -> usize {
        self.slots.get(&node).map_or(0, Vec::len)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lone_arrival_parks() {
        let mut registry = JunctionRegistry::new();
        let arrival = registry.arrive(NodeId(0), 2, 0, 1, Int::from(7));
        assert!(matches!(arrival, Arrival::Parked(_)));
        assert_eq!(registry.pending_slots(NodeId(0)), 1);
    }

    #[test]
    fn filling_arrival_drains_in_parent_order() {
        let mut registry = JunctionRegistry::new();
        registry.arrive(NodeId(0), 2, 1, 1, Int::from(20));
        let arrival = registry.arrive(NodeId(0), 2, 0, 2, Int::from(10));

        assert_eq!(
            arrival,
            Arrival::Filled {
                arguments: vec![Int::from(10), Int::from(20)],
                consumed: vec![1],
            }
        );
        assert_eq!(registry.pending_slots(NodeId(0)), 0);
    }

    #[test]
    fn same_edge_arrivals_take_separate_slots() {
        let mut registry = JunctionRegistry::new();
        let first = registry.arrive(NodeId(0), 2, 0, 1, Int::from(1));
        let second = registry.arrive(NodeId(0), 2, 0, 2, Int::from(2));

        match (first, second) {
            (Arrival::Parked(a), Arrival::Parked(b)) => assert_ne!(a, b),
            other => panic!("expected two parked executors, got {other:?}"),
        }
        assert_eq!(registry.pending_slots(NodeId(0)), 2);

        // First-fit: the edge-1 arrival completes the oldest slot.
        let arrival = registry.arrive(NodeId(0), 2, 1, 3, Int::from(10));
        assert_eq!(
            arrival,
            Arrival::Filled {
                arguments: vec![Int::from(1), Int::from(10)],
                consumed: vec![1],
            }
        );
        assert_eq!(registry.pending_slots(NodeId(0)), 1);
    }

    #[test]
    fn single_cell_junction_fires_immediately() {
        let mut registry = JunctionRegistry::new();
        let arrival = registry.arrive(NodeId(4), 1, 0, 7, Int::from(5));
        assert_eq!(
            arrival,
            Arrival::Filled {
                arguments: vec![Int::from(5)],
                consumed: vec![],
            }
        );
    }

    #[test]
    fn junctions_track_slots_independently() {
        let mut registry = JunctionRegistry::new();
        registry.arrive(NodeId(0), 2, 0, 1, Int::from(1));
        registry.arrive(NodeId(9), 3, 2, 2, Int::from(2));

        assert_eq!(registry.pending_slots(NodeId(0)), 1);
        assert_eq!(registry.pending_slots(NodeId(9)), 1);
        assert_eq!(registry.pending_slots(NodeId(5)), 0);
    }
}
