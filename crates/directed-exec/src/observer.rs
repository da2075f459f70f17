//! Step observation hooks for debug output.
//!
//! Debug state is never process-global: an observer is passed explicitly
//! into the instance and shared by the whole instance tree, nested
//! sub-graph runs included.

use std::collections::HashSet;
use std::io::Write;

use directed_core::integer::Int;

/// Callbacks the scheduler fires as execution progresses.
pub trait Observer {
    /// A new instance began running `graph`.
    fn enter_graph(&mut self, graph: &str);

    /// One executor finished its action for the current step.
    fn executor_advanced(&mut self, graph: &str, executor: u64, node: &str, accumulator: &Int);

    /// The scheduler finished one full pass over the live executors.
    fn step_finished(&mut self, graph: &str);
}

/// Observer that renders one line per executor action, an optional filter
/// restricting output to the named graphs.
///
/// Format: `executor <id> @ <label> : <accumulator>` per action, `---`
/// between steps, `=== <graph> ===` on instance entry.
pub struct DebugTrace<W> {
    writer: W,
    filter: Option<HashSet<String>>,
}

impl<W: Write> DebugTrace<W> {
    /// Traces every graph.
    pub fn new(writer: W) -> Self {
        DebugTrace {
            writer,
            filter: None,
        }
    }

    /// Traces only the named graphs.
    pub fn filtered<I>(writer: W, graphs: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<String>,
    {
        DebugTrace {
            writer,
            filter: Some(graphs.into_iter().map(Into::into).collect()),
        }
    }

    fn watching(&self, graph: &str) -> bool {
        self.filter
            .as_ref()
            .map_or(true, |names| names.contains(graph))
    }
}

impl<W: Write> Observer for DebugTrace<W> {
    fn enter_graph(&mut self, graph: &str) {
        if self.watching(graph) {
            let _ = writeln!(self.writer, "=== {graph} ===");
        }
    }

    fn executor_advanced(&mut self, graph: &str, executor: u64, node: &str, accumulator: &Int) {
        if self.watching(graph) {
            let _ = writeln!(self.writer, "executor {executor} @ {node} : {accumulator}");
        }
    }

    fn step_finished(&mut self, graph: &str) {
        if self.watching(graph) {
            let _ = writeln!(self.writer, "---");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_the_debug_record_format() {
        let mut buffer = Vec::new();
        let mut trace = DebugTrace::new(&mut buffer);
        trace.enter_graph("Main");
        trace.executor_advanced("Main", 0, "in", &Int::from(42));
        trace.step_finished("Main");

        let text = String::from_utf8(buffer).unwrap();
        assert_eq!(text, "=== Main ===\nexecutor 0 @ in : 42\n---\n");
    }

    #[test]
    fn filter_drops_unwatched_graphs() {
        let mut buffer = Vec::new();
        let mut trace = DebugTrace::filtered(&mut buffer, ["Helper"]);
        trace.enter_graph("Main");
        trace.executor_advanced("Main", 0, "in", &Int::from(1));
        trace.enter_graph("Helper");
        trace.step_finished("Helper");

        let text = String::from_utf8(buffer).unwrap();
        assert_eq!(text, "=== Helper ===\n---\n");
    }
}
