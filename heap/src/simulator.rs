//! The owning simulator context.
//!
//! [`Simulator`] ties a store, a root set and the settings together and
//! exposes the name-level operations an interactive front end needs.
//! [`SharedSimulator`] puts one behind a lock for threaded hosts.

use std::{fmt::Display, sync::Arc};

use chrono::{DateTime, TimeZone};
use log::{info, warn};
use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::{
    CycleOutcome, GcError, Ledger, Missing, ObjectId, ObjectStore, RootOutcome, RootSet, Scenario,
    ScenarioReport, SimulatorSettings, collector, export,
};

#[derive(Debug)]
pub struct Simulator {
    pub(crate) store: ObjectStore,
    pub(crate) roots: RootSet,
    settings: SimulatorSettings,
    next_id: i64,
}

/// What [`Simulator::shutdown`] released.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShutdownReport {
    /// Survivor names, most recently created first.
    pub survivors: Vec<String>,
    pub bytes_freed: usize,
    /// Counters after the survivors were freed, before the final reset.
    pub ledger: Ledger,
}

impl Default for Simulator {
    fn default() -> Self {
        Self::with_settings(SimulatorSettings::default())
    }
}

impl Simulator {
    pub fn new(settings: SimulatorSettings) -> Result<Self, &'static str> {
        settings.validate()?;
        Ok(Self::with_settings(settings))
    }

    fn with_settings(settings: SimulatorSettings) -> Self {
        Self {
            store: ObjectStore::new(settings.heap_limit),
            roots: RootSet::new(settings.root_capacity),
            settings,
            next_id: 1,
        }
    }

    pub fn store(&self) -> &ObjectStore {
        &self.store
    }

    pub fn roots(&self) -> &RootSet {
        &self.roots
    }

    pub fn settings(&self) -> &SimulatorSettings {
        &self.settings
    }

    // ── Mutation ──────────────────────────────────────────────────────

    /// Creates an object with the next sequential id. A rejected name does
    /// not use up an id.
    pub fn create_object(&mut self, name: &str) -> Result<ObjectId, GcError> {
        let handle = self.store.create(self.next_id, name)?;
        self.next_id += 1;
        Ok(handle)
    }

    /// Resolves both names before touching the graph.
    pub fn add_reference(&mut self, from: &str, to: &str) -> Result<(), GcError> {
        let source = self.store.find_by_name(from);
        let target = self.store.find_by_name(to);
        let (source, target) = match (source, target) {
            (Some(source), Some(target)) => (source, target),
            (None, None) => {
                return Err(GcError::not_found(Missing::Both {
                    source: from.to_owned(),
                    target: to.to_owned(),
                }));
            }
            (None, _) => {
                return Err(GcError::not_found(Missing::Source(from.to_owned())));
            }
            (_, None) => {
                return Err(GcError::not_found(Missing::Target(to.to_owned())));
            }
        };

        let result = self.store.add_edge(source, target);
        if let Err(err) = &result
            && err.is_warning()
        {
            warn!("{err}");
        }
        result
    }

    pub fn mark_root(&mut self, name: &str) -> Result<RootOutcome, GcError> {
        let id = self
            .store
            .find_by_name(name)
            .ok_or_else(|| GcError::not_found(Missing::Object(name.to_owned())))?;

        match self.roots.add(id) {
            Ok(RootOutcome::Added) => {
                info!("object '{name}' marked as root");
                Ok(RootOutcome::Added)
            }
            Ok(RootOutcome::AlreadyRoot) => Ok(RootOutcome::AlreadyRoot),
            Err(err) => {
                warn!("cannot root '{name}': {err}");
                Err(err)
            }
        }
    }

    pub fn collect(&mut self) -> CycleOutcome {
        collector::run_cycle(&mut self.store, &self.roots)
    }

    pub fn force_scenario(&mut self, id: u8) -> Result<ScenarioReport, GcError> {
        Scenario::try_from(id)?.run(self)
    }

    /// Empties the store and the root set and zeroes the ledger. The id
    /// counter keeps running.
    pub fn reset(&mut self) {
        self.store.reset();
        self.roots.clear();
    }

    /// Frees every survivor with full accounting, then resets.
    pub fn shutdown(&mut self) -> ShutdownReport {
        let released = self.store.retain(|_| false);
        let ledger = *self.store.ledger();
        self.reset();

        let bytes_freed = released.iter().map(|r| r.bytes).sum();
        let survivors = released.into_iter().map(|r| r.name).collect();
        ShutdownReport {
            survivors,
            bytes_freed,
            ledger,
        }
    }

    // ── Inspection ────────────────────────────────────────────────────

    pub fn status(&self) -> Ledger {
        *self.store.ledger()
    }

    /// Marks from the current roots, renders the graph as DOT and clears
    /// the marks again. Nothing is freed.
    pub fn visualize(&mut self) -> String {
        collector::mark_all(&mut self.store, &self.roots);
        let dot = export::dot::render(&self.store, &self.roots);
        collector::clear_marks(&mut self.store);
        dot
    }

    pub fn snapshot<Tz>(&self, at: &DateTime<Tz>) -> String
    where
        Tz: TimeZone,
        Tz::Offset: Display,
    {
        export::snapshot::render(&self.store, at)
    }
}

/// A [`Simulator`] behind a single lock. Every mutation holds the write lock
/// for its whole duration, so no partially marked or swept state is ever
/// observable.
#[derive(Debug, Clone, Default)]
pub struct SharedSimulator(Arc<RwLock<Simulator>>);

impl SharedSimulator {
    pub fn new(simulator: Simulator) -> Self {
        Self(Arc::new(RwLock::new(simulator)))
    }

    pub fn read(&self) -> RwLockReadGuard<'_, Simulator> {
        self.0.read()
    }

    pub fn write(&self) -> RwLockWriteGuard<'_, Simulator> {
        self.0.write()
    }

    pub fn create_object(&self, name: &str) -> Result<ObjectId, GcError> {
        self.0.write().create_object(name)
    }

    pub fn add_reference(&self, from: &str, to: &str) -> Result<(), GcError> {
        self.0.write().add_reference(from, to)
    }

    pub fn mark_root(&self, name: &str) -> Result<RootOutcome, GcError> {
        self.0.write().mark_root(name)
    }

    pub fn collect(&self) -> CycleOutcome {
        self.0.write().collect()
    }

    pub fn status(&self) -> Ledger {
        self.0.read().status()
    }
}

#[cfg(test)]
mod tests {
    use std::thread;

    use super::*;
    use crate::{EDGE_SIZE, object_size};

    fn assert_balanced(sim: &Simulator) {
        assert_eq!(
            sim.status().live_bytes(),
            sim.store().footprint(),
            "ledger out of sync with live graph"
        );
    }

    #[test]
    fn ids_are_sequential_and_skip_rejections() {
        let mut sim = Simulator::default();
        let a = sim.create_object("A").unwrap();
        sim.create_object("A").unwrap_err();
        let b = sim.create_object("B").unwrap();

        assert_eq!(sim.store().get(a).unwrap().id(), 1);
        assert_eq!(sim.store().get(b).unwrap().id(), 2);
    }

    #[test]
    fn add_reference_reports_unresolved_names() {
        let mut sim = Simulator::default();
        sim.create_object("A").unwrap();

        assert_eq!(
            sim.add_reference("X", "A"),
            Err(GcError::not_found(Missing::Source("X".into())))
        );
        assert_eq!(
            sim.add_reference("A", "Y"),
            Err(GcError::not_found(Missing::Target("Y".into())))
        );
        assert_eq!(
            sim.add_reference("X", "Y"),
            Err(GcError::not_found(Missing::Both {
                source: "X".into(),
                target: "Y".into()
            }))
        );
        assert_eq!(sim.status().bytes_allocated(), object_size("A"));
    }

    #[test]
    fn duplicate_reference_is_a_warning() {
        let mut sim = Simulator::default();
        sim.create_object("A").unwrap();
        sim.create_object("B").unwrap();
        sim.add_reference("A", "B").unwrap();

        let err = sim.add_reference("A", "B").unwrap_err();

        assert!(err.is_warning());
        assert_balanced(&sim);
    }

    #[test]
    fn mark_root_is_idempotent() {
        let mut sim = Simulator::default();
        sim.create_object("A").unwrap();

        assert_eq!(sim.mark_root("A"), Ok(RootOutcome::Added));
        assert_eq!(sim.mark_root("A"), Ok(RootOutcome::AlreadyRoot));
        assert_eq!(sim.roots().len(), 1);
        assert_eq!(
            sim.mark_root("missing"),
            Err(GcError::not_found(Missing::Object("missing".into())))
        );
    }

    #[test]
    fn root_capacity_comes_from_settings() {
        let settings = SimulatorSettings {
            root_capacity: 1,
            ..Default::default()
        };
        let mut sim = Simulator::new(settings).unwrap();
        assert_eq!(sim.settings().root_capacity, 1);
        assert_eq!(sim.roots().capacity(), 1);
        sim.create_object("A").unwrap();
        sim.create_object("B").unwrap();
        sim.mark_root("A").unwrap();

        assert_eq!(
            sim.mark_root("B"),
            Err(GcError::CapacityExceeded { capacity: 1 })
        );
    }

    #[test]
    fn invalid_settings_are_rejected() {
        let settings = SimulatorSettings {
            root_capacity: 0,
            ..Default::default()
        };
        assert!(Simulator::new(settings).is_err());
    }

    #[test]
    fn collect_keeps_rooted_graph_and_roots() {
        let mut sim = Simulator::default();
        for name in ["A", "B", "C", "D"] {
            sim.create_object(name).unwrap();
        }
        sim.add_reference("A", "B").unwrap();
        sim.add_reference("C", "D").unwrap();
        sim.add_reference("D", "C").unwrap();
        sim.mark_root("A").unwrap();

        let CycleOutcome::Collected(report) = sim.collect() else {
            panic!("heap was not empty");
        };

        assert_eq!(report.sweep.objects_freed(), 2);
        assert_eq!(sim.store().len(), 2);
        assert_eq!(sim.roots().len(), 1);
        assert_balanced(&sim);

        // a second cycle finds nothing new
        let CycleOutcome::Collected(again) = sim.collect() else {
            panic!("heap was not empty");
        };
        assert_eq!(again.sweep.objects_freed(), 0);
    }

    #[test]
    fn visualize_leaves_no_marks_and_frees_nothing() {
        let mut sim = Simulator::default();
        sim.create_object("A").unwrap();
        sim.create_object("B").unwrap();
        sim.mark_root("A").unwrap();
        let before = sim.status();

        let dot = sim.visualize();

        assert!(dot.contains("\"A\" [label=\"A\", fillcolor=green];"));
        assert!(dot.contains("\"B\" [label=\"B\", fillcolor=red];"));
        assert_eq!(sim.status(), before);
        assert!(sim.store().iter().all(|(_, o)| !o.is_marked()));
    }

    #[test]
    fn reset_keeps_id_counter() {
        let mut sim = Simulator::default();
        sim.create_object("A").unwrap();
        sim.mark_root("A").unwrap();

        sim.reset();
        assert!(sim.store().is_empty());
        assert!(sim.roots().is_empty());
        assert!(sim.status().is_zero());

        let b = sim.create_object("B").unwrap();
        assert_eq!(sim.store().get(b).unwrap().id(), 2);
    }

    #[test]
    fn shutdown_accounts_for_survivors() {
        let mut sim = Simulator::default();
        sim.create_object("A").unwrap();
        sim.create_object("B").unwrap();
        sim.add_reference("A", "B").unwrap();

        let report = sim.shutdown();

        assert_eq!(report.survivors, vec!["B", "A"]);
        assert_eq!(
            report.bytes_freed,
            object_size("A") + object_size("B") + EDGE_SIZE
        );
        assert_eq!(report.ledger.objects_freed(), 2);
        assert_eq!(report.ledger.live_bytes(), 0);
        assert!(sim.store().is_empty());
        assert!(sim.status().is_zero());
    }

    #[test]
    fn shutdown_on_empty_simulator_frees_nothing() {
        let mut sim = Simulator::default();
        let report = sim.shutdown();
        assert!(report.survivors.is_empty());
        assert_eq!(report.bytes_freed, 0);
    }

    #[test]
    fn force_scenario_rejects_unknown_ids_without_reset() {
        let mut sim = Simulator::default();
        sim.create_object("A").unwrap();

        assert_eq!(
            sim.force_scenario(9),
            Err(GcError::UnknownScenario { id: 9 })
        );
        assert_eq!(sim.store().len(), 1);

        let report = sim.force_scenario(2).unwrap();
        assert_eq!(report.unreachable, vec!["D", "E"]);
        assert!(sim.store().is_empty());
    }

    #[test]
    fn shared_simulator_serializes_mutations() {
        let shared = SharedSimulator::default();

        let handles: Vec<_> = (0..4)
            .map(|t| {
                let shared = shared.clone();
                thread::spawn(move || {
                    for i in 0..25 {
                        shared.create_object(&format!("T{t}_{i}")).unwrap();
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(shared.status().live_objects(), 100);
        shared.mark_root("T0_0").unwrap();
        shared.collect();

        {
            let sim = shared.read();
            assert_eq!(sim.store().len(), 1);
            assert_eq!(sim.status().live_bytes(), sim.store().footprint());
        }

        shared.write().reset();
        assert!(shared.read().store().is_empty());
        assert!(shared.status().is_zero());
    }
}
