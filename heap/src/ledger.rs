//! Memory accounting.
//!
//! Every allocation and release in the [`ObjectStore`](crate::ObjectStore)
//! passes through here, so `bytes_allocated - bytes_freed` always equals the
//! approximate footprint of the live graph.

/// The four allocation counters.
///
/// Counters only grow; the sole way back to zero is [`Ledger::reset`].
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Ledger {
    objects_allocated: usize,
    objects_freed: usize,
    bytes_allocated: usize,
    bytes_freed: usize,
}

impl Ledger {
    pub const fn new() -> Self {
        Self {
            objects_allocated: 0,
            objects_freed: 0,
            bytes_allocated: 0,
            bytes_freed: 0,
        }
    }

    #[inline]
    pub(crate) fn record_object_allocation(&mut self, size: usize) {
        self.objects_allocated += 1;
        self.bytes_allocated += size;
    }

    #[inline]
    pub(crate) fn record_object_free(&mut self, size: usize) {
        self.objects_freed += 1;
        self.bytes_freed += size;
    }

    #[inline]
    pub(crate) fn record_bytes_allocation(&mut self, size: usize) {
        self.bytes_allocated += size;
    }

    #[inline]
    pub(crate) fn record_bytes_free(&mut self, size: usize) {
        self.bytes_freed += size;
    }

    pub(crate) fn reset(&mut self) {
        *self = Self::new();
    }

    pub fn objects_allocated(&self) -> usize {
        self.objects_allocated
    }

    pub fn objects_freed(&self) -> usize {
        self.objects_freed
    }

    pub fn bytes_allocated(&self) -> usize {
        self.bytes_allocated
    }

    pub fn bytes_freed(&self) -> usize {
        self.bytes_freed
    }

    pub fn live_objects(&self) -> usize {
        self.objects_allocated - self.objects_freed
    }

    pub fn live_bytes(&self) -> usize {
        debug_assert!(
            self.bytes_freed <= self.bytes_allocated,
            "freed more bytes than were allocated"
        );
        self.bytes_allocated.saturating_sub(self.bytes_freed)
    }

    pub fn is_zero(&self) -> bool {
        *self == Self::new()
    }
}
