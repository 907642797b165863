//! Fixed leak scenarios.
//!
//! Every scenario starts from an empty simulator, builds its graph, runs one
//! mark phase, reports what turned out to be garbage, sweeps it and resets
//! the simulator again. Nothing carries over between runs.

use std::fmt;

use log::info;

use crate::{GcError, Ledger, ObjectId, Simulator, SweepReport, collector, object_size};

/// First object id handed out inside a scenario.
pub const SCENARIO_FIRST_ID: i64 = 1000;

#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Scenario {
    /// `A -> B -> C` rooted at `A`, plus an unrooted `D -> E`.
    AcyclicChains = 1,
    /// `A -> B -> C -> A` rooted at `A`, plus an unrooted `D <-> E`.
    TwoCycles = 2,
    /// `N0 -> ... -> N9` rooted at `N0`, plus edgeless `X1..X5`.
    LongChain = 3,
}

impl Scenario {
    pub const ALL: [Scenario; 3] = [Self::AcyclicChains, Self::TwoCycles, Self::LongChain];

    pub fn id(self) -> u8 {
        self as u8
    }

    pub fn description(self) -> &'static str {
        match self {
            Self::AcyclicChains => "Simple chain leak (A -> B -> C   and   D -> E)",
            Self::TwoCycles => "Cyclic leak (A -> B -> C -> A   and   D <-> E)",
            Self::LongChain => "Long chain + garbage nodes",
        }
    }

    /// Runs the scenario against `sim`, which is reset before and after.
    ///
    /// An unknown id never gets here, so the simulator is only touched once
    /// the scenario is known to exist.
    pub fn run(self, sim: &mut Simulator) -> Result<ScenarioReport, GcError> {
        sim.reset();
        info!("[Force Leak] creating scenario {}", self.id());

        let created = match self.build(sim) {
            Ok(created) => created,
            Err(err) => {
                sim.reset();
                return Err(err);
            }
        };
        info!("[Force Leak] scenario {} created", self.id());

        collector::mark_all(&mut sim.store, &sim.roots);

        let mut unreachable = Vec::new();
        let mut garbage_bytes = 0;
        for object in created
            .iter()
            .filter_map(|&id| sim.store.get(id))
            .filter(|object| !object.is_marked())
        {
            garbage_bytes += object_size(object.name());
            unreachable.push(object.name().to_owned());
        }

        let sweep = if unreachable.is_empty() {
            collector::clear_marks(&mut sim.store);
            None
        } else {
            Some(collector::sweep(&mut sim.store))
        };
        let ledger = *sim.store.ledger();

        info!("[Force Leak] scenario {} completed, resetting", self.id());
        sim.reset();

        Ok(ScenarioReport {
            scenario: self,
            created: created.len(),
            unreachable,
            garbage_bytes,
            sweep,
            ledger,
        })
    }

    fn build(self, sim: &mut Simulator) -> Result<Vec<ObjectId>, GcError> {
        let mut g = Builder {
            sim,
            next_id: SCENARIO_FIRST_ID,
            created: Vec::new(),
        };

        match self {
            Self::AcyclicChains => {
                let a = g.object("A")?;
                let b = g.object("B")?;
                let c = g.object("C")?;
                let d = g.object("D")?;
                let e = g.object("E")?;
                g.edge(a, b)?;
                g.edge(b, c)?;
                g.edge(d, e)?;
                g.root(a)?;
            }
            Self::TwoCycles => {
                let a = g.object("A")?;
                let b = g.object("B")?;
                let c = g.object("C")?;
                g.edge(a, b)?;
                g.edge(b, c)?;
                g.edge(c, a)?;
                g.root(a)?;

                let d = g.object("D")?;
                let e = g.object("E")?;
                g.edge(d, e)?;
                g.edge(e, d)?;
            }
            Self::LongChain => {
                let mut prev: Option<ObjectId> = None;
                for i in 0..10 {
                    let node = g.object(&format!("N{i}"))?;
                    match prev {
                        Some(prev) => g.edge(prev, node)?,
                        None => g.root(node)?,
                    }
                    prev = Some(node);
                }
                for i in 1..=5 {
                    g.object(&format!("X{i}"))?;
                }
            }
        }

        Ok(g.created)
    }
}

impl TryFrom<u8> for Scenario {
    type Error = GcError;

    fn try_from(id: u8) -> Result<Self, Self::Error> {
        match id {
            1 => Ok(Self::AcyclicChains),
            2 => Ok(Self::TwoCycles),
            3 => Ok(Self::LongChain),
            _ => Err(GcError::UnknownScenario { id }),
        }
    }
}

impl fmt::Display for Scenario {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}. {}", self.id(), self.description())
    }
}

struct Builder<'a> {
    sim: &'a mut Simulator,
    next_id: i64,
    created: Vec<ObjectId>,
}

impl Builder<'_> {
    fn object(&mut self, name: &str) -> Result<ObjectId, GcError> {
        let id = self.sim.store.create(self.next_id, name)?;
        self.next_id += 1;
        self.created.push(id);
        Ok(id)
    }

    fn edge(&mut self, from: ObjectId, to: ObjectId) -> Result<(), GcError> {
        self.sim.store.add_edge(from, to)
    }

    fn root(&mut self, id: ObjectId) -> Result<(), GcError> {
        self.sim.roots.add(id).map(|_| ())
    }
}

/// Outcome of a scenario run, captured before the final reset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScenarioReport {
    pub scenario: Scenario,
    /// Number of objects the scenario built.
    pub created: usize,
    /// Garbage found by the mark phase, in creation order.
    pub unreachable: Vec<String>,
    /// Estimated size of the garbage, objects only.
    pub garbage_bytes: usize,
    /// `None` when nothing was unreachable and no sweep ran.
    pub sweep: Option<SweepReport>,
    /// Counters right after the sweep.
    pub ledger: Ledger,
}
