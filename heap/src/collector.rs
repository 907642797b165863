//! Mark-and-sweep over an [`ObjectStore`].
//!
//! Marking always finishes before anything is released, so garbage that is
//! only referenced by other garbage (chains, cycles) goes away in the same
//! sweep. Marking walks an explicit worklist; graph depth never turns into
//! call-stack depth.

use log::{debug, info, trace};

use crate::{ObjectId, ObjectStore, Released, RootProvider, Visitable};

/// What a single sweep handed back.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SweepReport {
    /// Collected objects, most recently created first.
    pub collected: Vec<Released>,
}

impl SweepReport {
    pub fn objects_freed(&self) -> usize {
        self.collected.len()
    }

    /// Bytes released by this sweep, objects and their edges together.
    pub fn bytes_freed(&self) -> usize {
        self.collected.iter().map(|released| released.bytes).sum()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> + '_ {
        self.collected.iter().map(|released| released.name.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CycleReport {
    pub live_before: usize,
    pub live_after: usize,
    pub marked: usize,
    pub sweep: SweepReport,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CycleOutcome {
    /// Nothing was allocated, so nothing ran.
    EmptyHeap,
    Collected(CycleReport),
}

// ── Marking ───────────────────────────────────────────────────────────

/// Marks everything reachable from `root`. Returns how many objects were
/// newly marked.
pub fn mark(store: &mut ObjectStore, root: ObjectId) -> usize {
    let mut worklist = vec![root];
    drain(store, &mut worklist)
}

/// Marks everything reachable from any root, one root at a time in the
/// provider's order.
pub fn mark_all<R>(store: &mut ObjectStore, roots: &R) -> usize
where
    R: RootProvider + ?Sized,
{
    let mut worklist = Vec::new();
    let mut marked = 0;
    roots.visit_roots(&mut |root| {
        worklist.push(root);
        marked += drain(store, &mut worklist);
    });
    marked
}

fn drain(store: &mut ObjectStore, worklist: &mut Vec<ObjectId>) -> usize {
    let mut marked = 0;
    while let Some(id) = worklist.pop() {
        // stale handles and already visited objects end the walk here
        let Some(object) = store.get_mut(id) else {
            continue;
        };
        if object.marked {
            continue;
        }
        object.marked = true;
        marked += 1;
        trace!("marked '{}'", object.name());
        object.visit_edges(worklist);
    }
    marked
}

/// Drops every mark without collecting anything.
pub fn clear_marks(store: &mut ObjectStore) {
    store.clear_marks();
}

// ── Sweeping ──────────────────────────────────────────────────────────

/// Releases every unmarked object and unmarks the survivors.
pub fn sweep(store: &mut ObjectStore) -> SweepReport {
    let collected = store.retain(|object| {
        if object.marked {
            object.marked = false;
            true
        } else {
            false
        }
    });

    for released in &collected {
        debug!("[GC] collecting unreachable object: {}", released.name);
    }
    let report = SweepReport { collected };
    info!(
        "[GC] sweep complete: {} object(s) collected, {} bytes freed",
        report.objects_freed(),
        report.bytes_freed()
    );
    report
}

/// A full collection: mark from `roots`, then sweep.
pub fn run_cycle<R>(store: &mut ObjectStore, roots: &R) -> CycleOutcome
where
    R: RootProvider + ?Sized,
{
    if store.is_empty() {
        info!("no objects in heap, nothing to collect");
        return CycleOutcome::EmptyHeap;
    }

    let live_before = store.ledger().live_bytes();
    let marked = mark_all(store, roots);
    let sweep = sweep(store);
    let live_after = store.ledger().live_bytes();

    info!("[GC] cycle complete: {live_before} -> {live_after} bytes in use");
    CycleOutcome::Collected(CycleReport {
        live_before,
        live_after,
        marked,
        sweep,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{EDGE_SIZE, RootSet, object_size};

    fn create_chain(store: &mut ObjectStore, prefix: &str, len: usize) -> Vec<ObjectId> {
        let ids: Vec<_> = (0..len)
            .map(|i| store.create(i as i64, &format!("{prefix}{i}")).unwrap())
            .collect();
        for pair in ids.windows(2) {
            store.add_edge(pair[0], pair[1]).unwrap();
        }
        ids
    }

    fn survivors(store: &ObjectStore) -> Vec<&str> {
        let mut names: Vec<_> = store.iter().map(|(_, o)| o.name()).collect();
        names.sort();
        names
    }

    #[test]
    fn mark_follows_edges_and_counts_once() {
        let mut store = ObjectStore::new(None);
        let chain = create_chain(&mut store, "N", 4);
        store.add_edge(chain[3], chain[0]).unwrap();

        assert_eq!(mark(&mut store, chain[0]), 4);
        assert_eq!(mark(&mut store, chain[2]), 0, "already marked");
        assert!(store.iter().all(|(_, o)| o.is_marked()));
    }

    #[test]
    fn mark_does_not_touch_structure_or_ledger() {
        let mut store = ObjectStore::new(None);
        let chain = create_chain(&mut store, "N", 3);
        let before = *store.ledger();

        mark(&mut store, chain[0]);

        assert_eq!(*store.ledger(), before);
        assert_eq!(store.len(), 3);
        assert_eq!(store.get(chain[0]).unwrap().refs(), &[chain[1]]);
    }

    #[test]
    fn mark_ignores_stale_roots() {
        let mut store = ObjectStore::new(None);
        let a = store.create(1, "A").unwrap();
        store.destroy(a);

        let roots = [a];
        assert_eq!(mark_all(&mut store, &roots[..]), 0);
    }

    #[test]
    fn deep_chain_marks_without_recursion() {
        let mut store = ObjectStore::new(None);
        let chain = create_chain(&mut store, "N", 200_000);

        assert_eq!(mark(&mut store, chain[0]), chain.len());
    }

    #[test]
    fn sweep_collects_unmarked_and_clears_survivor_marks() {
        let mut store = ObjectStore::new(None);
        let live = create_chain(&mut store, "L", 3);
        let dead = create_chain(&mut store, "D", 2);

        mark(&mut store, live[0]);
        let report = sweep(&mut store);

        let mut collected: Vec<_> = report.names().collect();
        collected.sort();
        assert_eq!(collected, vec!["D0", "D1"]);
        assert_eq!(
            report.bytes_freed(),
            object_size("D0") + object_size("D1") + EDGE_SIZE
        );
        assert!(store.iter().all(|(_, o)| !o.is_marked()));
        assert!(!store.contains(dead[0]) && !store.contains(dead[1]));
        assert_eq!(store.ledger().live_bytes(), store.footprint());
    }

    #[test]
    fn unrooted_cycle_is_collected_in_one_cycle() {
        let mut store = ObjectStore::new(None);
        let a = store.create(1, "A").unwrap();
        let d = store.create(2, "D").unwrap();
        let e = store.create(3, "E").unwrap();
        store.add_edge(d, e).unwrap();
        store.add_edge(e, d).unwrap();

        let mut roots = RootSet::default();
        roots.add(a).unwrap();

        let CycleOutcome::Collected(report) = run_cycle(&mut store, &roots) else {
            panic!("heap was not empty");
        };

        assert_eq!(report.marked, 1);
        assert_eq!(report.sweep.objects_freed(), 2);
        assert_eq!(survivors(&store), vec!["A"]);
        assert_eq!(store.ledger().live_bytes(), object_size("A"));
    }

    #[test]
    fn garbage_pointing_into_live_graph_leaves_no_dangling_edges() {
        let mut store = ObjectStore::new(None);
        let live = store.create(1, "live").unwrap();
        let garbage = create_chain(&mut store, "G", 3);
        store.add_edge(garbage[2], live).unwrap();

        let roots = [live];
        run_cycle(&mut store, &roots[..]);

        assert_eq!(survivors(&store), vec!["live"]);
        for (_, object) in store.iter() {
            for &target in object.refs() {
                assert!(store.contains(target), "dangling edge");
            }
        }
        assert_eq!(store.ledger().live_bytes(), store.footprint());
    }

    #[test]
    fn run_cycle_reports_live_bytes_before_and_after() {
        let mut store = ObjectStore::new(None);
        let kept = create_chain(&mut store, "K", 2);
        create_chain(&mut store, "X", 2);
        let before = store.ledger().live_bytes();

        let roots = [kept[0]];
        let CycleOutcome::Collected(report) = run_cycle(&mut store, &roots[..]) else {
            panic!("heap was not empty");
        };

        assert_eq!(report.live_before, before);
        assert_eq!(report.live_after, store.ledger().live_bytes());
        assert_eq!(
            report.live_before - report.live_after,
            report.sweep.bytes_freed()
        );
    }

    #[test]
    fn run_cycle_on_empty_heap_is_a_no_op() {
        let mut store = ObjectStore::new(None);
        let roots = RootSet::default();

        assert_eq!(run_cycle(&mut store, &roots), CycleOutcome::EmptyHeap);
        assert!(store.ledger().is_zero());
    }

    #[test]
    fn no_roots_collects_everything() {
        let mut store = ObjectStore::new(None);
        create_chain(&mut store, "N", 5);

        run_cycle(&mut store, &RootSet::default());

        assert!(store.is_empty());
        assert_eq!(store.ledger().objects_freed(), 5);
        assert_eq!(store.ledger().live_bytes(), 0);
    }

    #[test]
    fn clear_marks_resets_every_flag() {
        let mut store = ObjectStore::new(None);
        let chain = create_chain(&mut store, "N", 3);
        mark(&mut store, chain[0]);

        clear_marks(&mut store);

        assert!(store.iter().all(|(_, o)| !o.is_marked()));
        assert_eq!(store.len(), 3);
    }
}
