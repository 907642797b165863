//! A mark-and-sweep collector over a simulated object graph.
//!
//! Objects are named nodes in an [`ObjectStore`]; directed references
//! between them decide what a collection keeps. Every allocation and release
//! goes through the [`Ledger`], which always agrees with the live graph.

mod collector;
mod error;
mod ledger;
mod object;
mod roots;
mod scenario;
mod settings;
mod simulator;
mod visitor;

pub mod export;

pub use collector::{
    CycleOutcome, CycleReport, SweepReport, clear_marks, mark, mark_all, run_cycle, sweep,
};
pub use error::{GcError, Missing};
pub use ledger::Ledger;
pub use object::{
    EDGE_SIZE, OBJECT_HEADER_SIZE, Object, ObjectId, ObjectStore, Released, object_size,
};
pub use roots::{DEFAULT_ROOT_CAPACITY, RootOutcome, RootProvider, RootSet};
pub use scenario::{SCENARIO_FIRST_ID, Scenario, ScenarioReport};
pub use settings::SimulatorSettings;
pub use simulator::{SharedSimulator, ShutdownReport, Simulator};
pub use visitor::{Visitable, Visitor};
