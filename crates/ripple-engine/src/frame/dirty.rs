/// Tracks how many ring slots still hold stale data for one item.
///
/// A change must be copied into every slot, one slot per frame, before the item
/// is clean again.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct DirtyFrames {
    remaining: usize,
    depth: usize,
}

impl DirtyFrames {
    /// New items start dirty in every slot.
    pub fn new(depth: usize) -> Self {
        Self {
            remaining: depth,
            depth,
        }
    }

    /// Marks the item changed.
    #[inline]
    pub fn mark(&mut self) {
        self.remaining = self.depth;
    }

    #[inline]
    pub fn is_dirty(&self) -> bool {
        self.remaining > 0
    }

    /// Returns `true` if the current slot needs an upload, and counts it done.
    #[inline]
    pub fn consume(&mut self) -> bool {
        if self.remaining == 0 {
            return false;
        }
        self.remaining -= 1;
        true
    }
}
