//! Object graph storage.
//!
//! Objects live in an arena of slots addressed by [`ObjectId`] (slot index +
//! generation). Freeing a slot bumps its generation, so a handle that outlived
//! its object resolves to nothing instead of to the slot's next tenant.

use std::{collections::HashMap, fmt, mem};

use log::{debug, trace};

use crate::{GcError, Ledger, Missing};

/// Approximate per-object overhead charged to the ledger.
pub const OBJECT_HEADER_SIZE: usize = 40;
/// Approximate cost of a single reference edge.
pub const EDGE_SIZE: usize = 16;

/// Approximate size of an object named `name`, not counting its edges.
#[inline]
pub fn object_size(name: &str) -> usize {
    OBJECT_HEADER_SIZE + name.len() + 1
}

fn slot_index(len: usize) -> Result<u32, GcError> {
    u32::try_from(len).map_err(|_| GcError::ArenaExhausted { slots: len })
}

/// Handle to an object in an [`ObjectStore`].
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObjectId {
    index: u32,
    generation: u32,
}

impl fmt::Debug for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ObjectId({}/{})", self.index, self.generation)
    }
}

#[derive(Debug)]
pub struct Object {
    id: i64,
    name: String,
    pub(crate) marked: bool,
    refs: Vec<ObjectId>,
}

impl Object {
    fn new(id: i64, name: &str) -> Self {
        Self {
            id,
            name: name.to_owned(),
            marked: false,
            refs: Vec::new(),
        }
    }

    pub fn id(&self) -> i64 {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_marked(&self) -> bool {
        self.marked
    }

    /// Outgoing edges in insertion order.
    pub fn refs(&self) -> &[ObjectId] {
        &self.refs
    }

    pub fn size(&self) -> usize {
        object_size(&self.name)
    }

    /// Size of the object plus all of its outgoing edges.
    pub fn footprint(&self) -> usize {
        self.size() + self.refs.len() * EDGE_SIZE
    }
}

/// An object handed back to the ledger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Released {
    pub name: String,
    /// Object size plus the edges dropped with it.
    pub bytes: usize,
}

#[derive(Debug, Default)]
struct Slot {
    generation: u32,
    object: Option<Object>,
}

#[derive(Debug)]
pub struct ObjectStore {
    slots: Vec<Slot>,
    free_list: Vec<u32>,
    // creation order, oldest first
    order: Vec<ObjectId>,
    names: HashMap<String, ObjectId, ahash::RandomState>,
    ledger: Ledger,
    heap_limit: Option<usize>,
}

impl Default for ObjectStore {
    fn default() -> Self {
        Self::new(None)
    }
}

impl ObjectStore {
    pub fn new(heap_limit: Option<usize>) -> Self {
        Self {
            slots: Vec::new(),
            free_list: Vec::new(),
            order: Vec::new(),
            names: HashMap::default(),
            ledger: Ledger::new(),
            heap_limit,
        }
    }

    // ── Allocation ────────────────────────────────────────────────────

    pub fn create(&mut self, id: i64, name: &str) -> Result<ObjectId, GcError> {
        if self.names.contains_key(name) {
            return Err(GcError::DuplicateName {
                name: name.to_owned(),
            });
        }
        let size = object_size(name);
        self.reserve(size)?;

        let handle = self.alloc_slot(Object::new(id, name))?;
        self.order.push(handle);
        self.names.insert(name.to_owned(), handle);
        self.ledger.record_object_allocation(size);

        debug!("created object '{name}' (id {id}, approx {size} bytes)");
        Ok(handle)
    }

    fn reserve(&self, bytes: usize) -> Result<(), GcError> {
        let Some(limit) = self.heap_limit else {
            return Ok(());
        };
        let live = self.ledger.live_bytes();
        if live + bytes > limit {
            return Err(GcError::AllocationFailure {
                requested: bytes,
                live,
                limit,
            });
        }
        Ok(())
    }

    fn alloc_slot(&mut self, object: Object) -> Result<ObjectId, GcError> {
        if let Some(index) = self.free_list.pop() {
            let slot = &mut self.slots[index as usize];
            debug_assert!(slot.object.is_none(), "free slot still occupied");
            slot.object = Some(object);
            return Ok(ObjectId {
                index,
                generation: slot.generation,
            });
        }
        let index = slot_index(self.slots.len())?;
        self.slots.push(Slot {
            generation: 0,
            object: Some(object),
        });
        Ok(ObjectId {
            index,
            generation: 0,
        })
    }

    fn free_slot(&mut self, id: ObjectId) -> Option<Object> {
        let slot = self.slots.get_mut(id.index as usize)?;
        if slot.generation != id.generation {
            return None;
        }
        let object = slot.object.take()?;
        // a slot whose generation would wrap is retired instead of reused
        if let Some(next) = slot.generation.checked_add(1) {
            slot.generation = next;
            self.free_list.push(id.index);
        }
        Some(object)
    }

    // ── Lookup ────────────────────────────────────────────────────────

    pub fn find_by_name(&self, name: &str) -> Option<ObjectId> {
        self.names.get(name).copied()
    }

    pub fn get(&self, id: ObjectId) -> Option<&Object> {
        let slot = self.slots.get(id.index as usize)?;
        if slot.generation != id.generation {
            return None;
        }
        slot.object.as_ref()
    }

    pub(crate) fn get_mut(&mut self, id: ObjectId) -> Option<&mut Object> {
        let slot = self.slots.get_mut(id.index as usize)?;
        if slot.generation != id.generation {
            return None;
        }
        slot.object.as_mut()
    }

    pub fn contains(&self, id: ObjectId) -> bool {
        self.get(id).is_some()
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Live objects, most recently created first.
    pub fn iter(&self) -> impl Iterator<Item = (ObjectId, &Object)> + '_ {
        self.order
            .iter()
            .rev()
            .filter_map(|&id| Some((id, self.get(id)?)))
    }

    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    pub fn heap_limit(&self) -> Option<usize> {
        self.heap_limit
    }

    /// Sum of the approximate sizes of every live object and edge.
    ///
    /// Always equal to `ledger().live_bytes()`.
    pub fn footprint(&self) -> usize {
        self.iter().map(|(_, object)| object.footprint()).sum()
    }

    // ── Edges ─────────────────────────────────────────────────────────

    pub fn add_edge(&mut self, from: ObjectId, to: ObjectId) -> Result<(), GcError> {
        let (source, target) = match (self.get(from), self.get(to)) {
            (Some(source), Some(target)) => (source, target),
            (None, _) => return Err(GcError::not_found(Missing::Handle(from))),
            (_, None) => return Err(GcError::not_found(Missing::Handle(to))),
        };
        if from == to {
            return Err(GcError::SelfReference {
                name: source.name.clone(),
            });
        }
        if source.refs.contains(&to) {
            return Err(GcError::DuplicateEdge {
                from: source.name.clone(),
                to: target.name.clone(),
            });
        }
        self.reserve(EDGE_SIZE)?;
        debug!("reference created: {} -> {}", source.name, target.name);

        if let Some(source) = self.get_mut(from) {
            source.refs.push(to);
            self.ledger.record_bytes_allocation(EDGE_SIZE);
        }
        Ok(())
    }

    /// Removes a single edge. Returns whether it existed.
    pub fn remove_edge(&mut self, from: ObjectId, to: ObjectId) -> bool {
        let Some(source) = self.get_mut(from) else {
            return false;
        };
        let Some(pos) = source.refs.iter().position(|&r| r == to) else {
            return false;
        };
        source.refs.remove(pos);
        self.ledger.record_bytes_free(EDGE_SIZE);
        true
    }

    /// Drops every outgoing edge of `id`. Returns how many were dropped.
    pub fn clear_edges(&mut self, id: ObjectId) -> usize {
        let Some(object) = self.get_mut(id) else {
            return 0;
        };
        let count = mem::take(&mut object.refs).len();
        self.ledger.record_bytes_free(count * EDGE_SIZE);
        count
    }

    // ── Release ───────────────────────────────────────────────────────

    /// Unlinks and frees a single object. Stale handles are ignored.
    pub fn destroy(&mut self, id: ObjectId) -> Option<Released> {
        if !self.contains(id) {
            return None;
        }
        self.order.retain(|&live| live != id);
        self.release(id)
    }

    // caller must already have unlinked `id` from `order`
    fn release(&mut self, id: ObjectId) -> Option<Released> {
        let edge_bytes = self.clear_edges(id) * EDGE_SIZE;
        let object = self.free_slot(id)?;
        let size = object.size();
        self.names.remove(&object.name);
        self.ledger.record_object_free(size);
        trace!("released '{}' ({} bytes)", object.name, size);
        Some(Released {
            name: object.name,
            bytes: size + edge_bytes,
        })
    }

    /// Single in-place pass over the live sequence: objects `keep` rejects
    /// are unlinked and released, the rest stay in their original order.
    ///
    /// Released objects are returned most recent first.
    pub(crate) fn retain(&mut self, mut keep: impl FnMut(&mut Object) -> bool) -> Vec<Released> {
        let mut order = mem::take(&mut self.order);
        let mut released = Vec::new();

        order.retain(|&id| {
            let Some(object) = self.get_mut(id) else {
                return false;
            };
            if keep(object) {
                return true;
            }
            released.extend(self.release(id));
            false
        });

        self.order = order;
        released.reverse();
        released
    }

    pub(crate) fn clear_marks(&mut self) {
        self.slots
            .iter_mut()
            .filter_map(|slot| slot.object.as_mut())
            .for_each(|object| object.marked = false);
    }

    /// Frees every object without accounting for it and zeroes the ledger.
    pub fn reset(&mut self) {
        // edges go with their owner
        for id in mem::take(&mut self.order) {
            self.free_slot(id);
        }
        self.names.clear();
        self.ledger.reset();
    }
}
