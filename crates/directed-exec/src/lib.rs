//! Token-walking runtime for Directed program graphs.
//!
//! A [`GraphInstance`] seeds one executor per input node and per parentless
//! node, then steps the whole set cooperatively on a single host thread:
//! executors fork at multi-child nodes, park at junctions until every
//! in-edge has delivered, and the first `Return` outcome ends the instance.
//! Sub-graph nodes run a nested instance to completion synchronously inside
//! the outer executor's action.

pub mod error;
pub mod executor;
pub mod instance;
pub mod junction;
pub mod observer;

pub use error::RuntimeError;
pub use executor::Executor;
pub use instance::{run_main, GraphInstance, RunOutcome, Session};
pub use junction::{Arrival, JunctionRegistry, SlotId};
pub use observer::{DebugTrace, Observer};
