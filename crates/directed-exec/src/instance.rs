//! The scheduler owning the live executors of one graph run.
//!
//! Execution is single-threaded cooperative: one step advances every live
//! executor once, in `alive` order. Forks created mid-step are quarantined
//! in a pending list and only join at the step boundary, after dead
//! executors are compacted out (survivors keep their relative order). A
//! `Return` outcome aborts the step immediately; executors not yet advanced
//! that round are abandoned. Output is flushed at the end of every step, so
//! bytes appear in step-major, within-step-executor order.

use std::io::Write;

use num_traits::Zero;
use tracing::{debug, trace};

use directed_core::graph::{Graph, Program};
use directed_core::id::{GraphId, NodeId};
use directed_core::integer::{self, Int};
use directed_core::node_type::{NodeType, Outcome};

use crate::error::RuntimeError;
use crate::executor::Executor;
use crate::junction::{Arrival, JunctionRegistry};
use crate::observer::Observer;

/// Host-side hooks shared by a whole instance tree: the byte stream written
/// by output nodes and the optional step observer. Nested sub-graph runs go
/// through the same session.
pub struct Session<'a> {
    output: &'a mut dyn Write,
    observer: Option<&'a mut dyn Observer>,
}

impl<'a> Session<'a> {
    pub fn new(output: &'a mut dyn Write) -> Self {
        Session {
            output,
            observer: None,
        }
    }

    pub fn with_observer(output: &'a mut dyn Write, observer: &'a mut dyn Observer) -> Self {
        Session {
            output,
            observer: Some(observer),
        }
    }

    fn emit(&mut self, byte: u8) -> Result<(), RuntimeError> {
        self.output
            .write_all(&[byte])
            .map_err(|err| RuntimeError::Output {
                message: err.to_string(),
            })
    }

    fn flush(&mut self) -> Result<(), RuntimeError> {
        self.output.flush().map_err(|err| RuntimeError::Output {
            message: err.to_string(),
        })
    }
}

/// Why a graph instance stopped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    /// A `Return` fired with this value.
    Returned(Int),
    /// Every executor died without returning.
    Died,
}

/// One run of one graph: the live executor set, the pending forks, and the
/// junction slots in flight.
#[derive(Debug)]
pub struct GraphInstance<'p> {
    program: &'p Program,
    graph_id: GraphId,
    alive: Vec<Executor>,
    pending: Vec<Executor>,
    junctions: JunctionRegistry,
    return_value: Option<Int>,
    next_id: u64,
}

impl<'p> GraphInstance<'p> {
    /// Creates an instance and seeds its executors: one per input node
    /// carrying the matching input (surplus inputs are ignored, which is
    /// how a zero-argument graph discards the value arriving on its single
    /// in-edge), then one per parentless node carrying zero. Every seed
    /// executes its own node as its first action.
    pub fn new(program: &'p Program, graph_id: GraphId, inputs: Vec<Int>) -> Self {
        let mut instance = GraphInstance {
            program,
            graph_id,
            alive: Vec::new(),
            pending: Vec::new(),
            junctions: JunctionRegistry::new(),
            return_value: None,
            next_id: 0,
        };

        let graph = program.graph(graph_id);
        for (&node, value) in graph.input_nodes().iter().zip(inputs) {
            let id = instance.fresh_id();
            instance.alive.push(Executor::seeded(id, node, value));
        }
        for node in graph.parentless_nodes() {
            let id = instance.fresh_id();
            instance.alive.push(Executor::seeded(id, node, Int::zero()));
        }
        instance
    }

    pub fn alive_count(&self) -> usize {
        self.alive.len()
    }

    fn graph(&self) -> &'p Graph {
        self.program.graph(self.graph_id)
    }

    fn fresh_id(&mut self) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    /// Runs to completion: steps until a return value is produced or every
    /// executor is gone.
    pub fn run(&mut self, session: &mut Session<'_>) -> Result<RunOutcome, RuntimeError> {
        let name = self.graph().name();
        debug!(graph = name, executors = self.alive.len(), "instance start");
        if let Some(observer) = session.observer.as_mut() {
            observer.enter_graph(name);
        }

        while self.return_value.is_none() && !self.alive.is_empty() {
            self.step(session)?;
        }
        session.flush()?;

        match self.return_value.take() {
            Some(value) => {
                debug!(graph = name, %value, "instance returned");
                Ok(RunOutcome::Returned(value))
            }
            None => {
                debug!(graph = name, "instance died");
                Ok(RunOutcome::Died)
            }
        }
    }

    /// One scheduler step. Advances each executor that was alive at the
    /// start of the step; a set return value aborts the iteration before
    /// the next executor acts.
    fn step(&mut self, session: &mut Session<'_>) -> Result<(), RuntimeError> {
        let stepping = self.alive.len();
        trace!(graph = self.graph().name(), executors = stepping, "step");

        for index in 0..stepping {
            self.advance(index, session)?;
            if self.return_value.is_some() {
                return Ok(());
            }
        }

        self.alive.retain(|executor| !executor.dead);
        self.pending.retain(|executor| !executor.dead);
        self.alive.append(&mut self.pending);

        if let Some(observer) = session.observer.as_mut() {
            observer.step_finished(self.graph().name());
        }
        session.flush()
    }

    /// One executor action.
    fn advance(&mut self, index: usize, session: &mut Session<'_>) -> Result<(), RuntimeError> {
        if self.alive[index].dead {
            return Ok(());
        }

        if self.alive[index].waiting.is_some() {
            // A slot drains at the arrival that fills it, so a parked
            // executor never observes a full slot; it leaves the parked
            // state only by being consumed or by surviving a drain.
        } else if let Some(target) = self.alive[index].pending_target.take() {
            self.move_to(index, target, session)?;
        } else {
            let children = self.graph().children(self.alive[index].current);
            match children.split_first() {
                None => self.alive[index].dead = true,
                Some((&first, rest)) => {
                    for &child in rest {
                        let id = self.fresh_id();
                        let clone = self.alive[index].fork(id, child);
                        self.pending.push(clone);
                    }
                    self.move_to(index, first, session)?;
                }
            }
        }

        if let Some(observer) = session.observer.as_mut() {
            let graph = self.graph();
            let executor = &self.alive[index];
            let label = graph.node(executor.current).label();
            observer.executor_advanced(graph.name(), executor.id, &label, &executor.accumulator);
        }
        Ok(())
    }

    /// Moves an executor onto `target`: records the arrival edge, then
    /// either parks it at a junction or executes the node type with the
    /// accumulator as sole argument.
    fn move_to(
        &mut self,
        index: usize,
        target: NodeId,
        session: &mut Session<'_>,
    ) -> Result<(), RuntimeError> {
        let graph = self.graph();
        let from = self.alive[index].current;
        let edge = graph.parent_index(target, from).unwrap_or(0);
        self.alive[index].last_edge_index = edge;
        self.alive[index].current = target;

        let junction = graph.node(target).ty.junction_range().is_some();
        if junction && graph.parent_count(target) > 1 {
            self.arrive(index, target, edge, session)
        } else {
            let args = [self.alive[index].accumulator.clone()];
            let outcome = self.execute(target, &args, session)?;
            self.settle(index, outcome);
            Ok(())
        }
    }

    /// Junction arrival. A drain dispatches the outcome into the arriving
    /// executor and tombstones the consumed ones.
    fn arrive(
        &mut self,
        index: usize,
        node: NodeId,
        edge: usize,
        session: &mut Session<'_>,
    ) -> Result<(), RuntimeError> {
        let width = self.graph().parent_count(node);
        let executor_id = self.alive[index].id;
        let accumulator = self.alive[index].accumulator.clone();

        match self
            .junctions
            .arrive(node, width, edge, executor_id, accumulator)
        {
            Arrival::Parked(slot) => {
                self.alive[index].waiting = Some(slot);
                Ok(())
            }
            Arrival::Filled {
                arguments,
                consumed,
            } => {
                for id in consumed {
                    if let Some(other) = self.alive.iter_mut().find(|e| e.id == id) {
                        other.dead = true;
                        other.waiting = None;
                    }
                }
                self.alive[index].waiting = None;
                let outcome = self.execute(node, &arguments, session)?;
                self.settle(index, outcome);
                Ok(())
            }
        }
    }

    /// Applies an outcome to the executor that produced it.
    fn settle(&mut self, index: usize, outcome: Outcome) {
        match outcome {
            Outcome::Value(value) => self.alive[index].accumulator = value,
            Outcome::Return(value) => self.return_value = Some(value),
            Outcome::Die => self.alive[index].dead = true,
            Outcome::DieAll => {
                for executor in &mut self.alive {
                    executor.dead = true;
                }
                for executor in &mut self.pending {
                    executor.dead = true;
                }
            }
        }
    }

    /// Executes `node`'s type with the collected arguments.
    fn execute(
        &self,
        node: NodeId,
        args: &[Int],
        session: &mut Session<'_>,
    ) -> Result<Outcome, RuntimeError> {
        let target = self.graph().node(node);
        match &target.ty {
            NodeType::Nop => Ok(Outcome::Value(first_arg(args)?.clone())),
            NodeType::Die => Ok(Outcome::DieAll),
            NodeType::Return => Ok(Outcome::Return(first_arg(args)?.clone())),
            NodeType::Out => {
                let value = first_arg(args)?;
                session.emit(integer::low_byte(value))?;
                Ok(Outcome::Value(value.clone()))
            }
            NodeType::Literal(value) => Ok(Outcome::Value(value.clone())),
            NodeType::Fold { op, params } => {
                let mut values = args.iter().chain(params.iter());
                let mut folded = first_arg(args)?.clone();
                values.next();
                for value in values {
                    folded = op
                        .apply(&folded, value)
                        .ok_or_else(|| RuntimeError::DivideByZero {
                            pos: target.pos.clone(),
                        })?;
                }
                Ok(Outcome::Value(folded))
            }
            NodeType::Filter { rel, params } => {
                let sequence: Vec<&Int> = args.iter().chain(params.iter()).collect();
                let holds = sequence
                    .windows(2)
                    .all(|pair| rel.holds(pair[0], pair[1]));
                if holds {
                    Ok(Outcome::Value(first_arg(args)?.clone()))
                } else {
                    Ok(Outcome::Die)
                }
            }
            NodeType::Select => Err(RuntimeError::Internal {
                message: "unparameterized Use reached execution".into(),
            }),
            NodeType::SelectAt(index) => {
                let value = args.get(*index).ok_or_else(|| RuntimeError::Internal {
                    message: format!("selector index {index} beyond {} inputs", args.len()),
                })?;
                Ok(Outcome::Value(value.clone()))
            }
            NodeType::Call { graph, params, .. } => {
                let inputs: Vec<Int> = params
                    .iter()
                    .cloned()
                    .chain(args.iter().cloned())
                    .collect();
                let mut inner = GraphInstance::new(self.program, *graph, inputs);
                match inner.run(session)? {
                    RunOutcome::Returned(value) => Ok(Outcome::Value(value)),
                    RunOutcome::Died => Ok(Outcome::Die),
                }
            }
        }
    }
}

fn first_arg(args: &[Int]) -> Result<&Int, RuntimeError> {
    args.first().ok_or_else(|| RuntimeError::Internal {
        message: "node executed with no arguments".into(),
    })
}

/// Runs a program's entry graph with the host-provided input.
///
/// A `Main` taking no argument ignores the input; an instance that dies
/// without returning produces the conventional result of zero.
pub fn run_main(
    program: &Program,
    main: GraphId,
    input: Int,
    session: &mut Session<'_>,
) -> Result<Int, RuntimeError> {
    let graph = program.graph(main);
    let inputs = if graph.nargs() == 0 {
        Vec::new()
    } else {
        vec![input]
    };
    let mut instance = GraphInstance::new(program, main, inputs);
    match instance.run(session)? {
        RunOutcome::Returned(value) => Ok(value),
        RunOutcome::Died => Ok(Int::zero()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use directed_core::diagnostics::SourcePos;
    use directed_core::node::Node;

    fn pos() -> SourcePos {
        SourcePos::builtin()
    }

    /// Main { in -> Return }
    fn echo_program() -> (Program, GraphId) {
        let mut graph = Graph::new("Main", 0, 1);
        let input = graph.add_node(Node::named(NodeType::Nop, "in", pos()));
        let ret = graph.add_node(Node::new(NodeType::Return, pos()));
        graph.add_edge(input, ret);
        graph.mark_input(input);
        graph.validate().unwrap();

        let mut program = Program::new();
        let id = program.add_graph(graph);
        (program, id)
    }

    #[test]
    fn seeding_covers_inputs_and_parentless_nodes() {
        let mut graph = Graph::new("Main", 0, 1);
        let input = graph.add_node(Node::named(NodeType::Nop, "in", pos()));
        let lit = graph.add_node(Node::new(NodeType::Literal(Int::from(9)), pos()));
        let ret = graph.add_node(Node::new(NodeType::Return, pos()));
        graph.add_edge(input, ret);
        graph.add_edge(lit, ret);
        graph.mark_input(input);

        let mut program = Program::new();
        let id = program.add_graph(graph);

        let instance = GraphInstance::new(&program, id, vec![Int::from(5)]);
        assert_eq!(instance.alive_count(), 2);
    }

    #[test]
    fn surplus_inputs_are_ignored() {
        let mut graph = Graph::new("Main", 0, 0);
        let lit = graph.add_node(Node::new(NodeType::Literal(Int::from(3)), pos()));
        let ret = graph.add_node(Node::new(NodeType::Return, pos()));
        graph.add_edge(lit, ret);

        let mut program = Program::new();
        let id = program.add_graph(graph);

        let mut output = Vec::new();
        let mut session = Session::new(&mut output);
        let result = run_main(&program, id, Int::from(99), &mut session).unwrap();
        assert_eq!(result, Int::from(3));
    }

    #[test]
    fn run_twice_stays_settled() {
        let (program, main) = echo_program();
        let mut instance = GraphInstance::new(&program, main, vec![Int::from(42)]);

        let mut output = Vec::new();
        let mut session = Session::new(&mut output);
        assert_eq!(
            instance.run(&mut session).unwrap(),
            RunOutcome::Returned(Int::from(42))
        );
        // The return value was delivered; a second run finds nothing to do.
        assert_eq!(instance.run(&mut session).unwrap(), RunOutcome::Died);
    }
}
