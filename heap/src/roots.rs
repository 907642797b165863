use crate::{GcError, ObjectId};

pub const DEFAULT_ROOT_CAPACITY: usize = 50;

/// Anything that can name the starting points of a mark phase.
pub trait RootProvider {
    fn visit_roots(&self, visitor: &mut dyn FnMut(ObjectId));
}

impl RootProvider for [ObjectId] {
    fn visit_roots(&self, visitor: &mut dyn FnMut(ObjectId)) {
        self.iter().for_each(|&id| visitor(id));
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RootOutcome {
    Added,
    AlreadyRoot,
}

/// Insertion-ordered, duplicate-free set of roots with a hard capacity.
#[derive(Debug, Clone)]
pub struct RootSet {
    entries: Vec<ObjectId>,
    capacity: usize,
}

impl Default for RootSet {
    fn default() -> Self {
        Self::new(DEFAULT_ROOT_CAPACITY)
    }
}

impl RootSet {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: Vec::new(),
            capacity,
        }
    }

    /// Adding an existing root is not an error and never hits the capacity.
    pub fn add(&mut self, id: ObjectId) -> Result<RootOutcome, GcError> {
        if self.contains(id) {
            return Ok(RootOutcome::AlreadyRoot);
        }
        if self.entries.len() >= self.capacity {
            return Err(GcError::CapacityExceeded {
                capacity: self.capacity,
            });
        }
        self.entries.push(id);
        Ok(RootOutcome::Added)
    }

    pub fn contains(&self, id: ObjectId) -> bool {
        self.entries.contains(&id)
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn iter(&self) -> impl Iterator<Item = ObjectId> + '_ {
        self.entries.iter().copied()
    }

    pub fn as_slice(&self) -> &[ObjectId] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl RootProvider for RootSet {
    fn visit_roots(&self, visitor: &mut dyn FnMut(ObjectId)) {
        self.as_slice().visit_roots(visitor);
    }
}
