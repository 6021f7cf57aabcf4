use crate::sync::{Fence, FenceDriver, FenceError};

use super::FrameError;

/// Number of frames the CPU may record ahead of the GPU.
pub const FRAME_RING_DEPTH: usize = 3;

/// One slot of a `FrameRing`.
#[derive(Debug)]
pub struct FrameSlot<T> {
    pub resources: T,
    /// Fence value of the last submission that used this slot; 0 = never submitted.
    fence: u64,
}

impl<T> FrameSlot<T> {
    #[inline]
    pub fn fence(&self) -> u64 {
        self.fence
    }
}

/// Fixed-size circular pool of per-frame resources.
///
/// The ring starts positioned on the last slot so that the first `advance()`
/// lands on slot 0.
#[derive(Debug)]
pub struct FrameRing<T> {
    slots: Vec<FrameSlot<T>>,
    current: usize,
}

impl<T> FrameRing<T> {
    /// Builds `depth` slots, calling `make_slot` with each slot index.
    pub fn new(depth: usize, mut make_slot: impl FnMut(usize) -> T) -> Result<Self, FrameError> {
        Self::try_new(depth, |i| Ok(make_slot(i)))
    }

    /// Like `new`, for slot constructors that can fail (e.g. GPU allocations).
    pub fn try_new(
        depth: usize,
        mut make_slot: impl FnMut(usize) -> Result<T, FrameError>,
    ) -> Result<Self, FrameError> {
        if depth < 2 {
            return Err(FrameError::DepthTooSmall { depth });
        }

        let slots = (0..depth)
            .map(|i| {
                Ok(FrameSlot {
                    resources: make_slot(i)?,
                    fence: 0,
                })
            })
            .collect::<Result<Vec<_>, FrameError>>()?;

        log::debug!("frame ring created with {depth} slots");

        Ok(Self {
            slots,
            current: depth - 1,
        })
    }

    /// Moves to the next slot, blocking until the GPU has finished with it.
    ///
    /// Blocks only when the slot has been submitted before and its fence value has
    /// not yet been reached. This bounds CPU/GPU skew to `depth - 1` frames.
    /// On error the ring stays on the previous slot.
    pub fn advance<D: FenceDriver>(
        &mut self,
        fence: &Fence<D>,
    ) -> Result<&mut FrameSlot<T>, FenceError> {
        let next = self.next_index();

        let marker = self.slots[next].fence;
        if marker != 0 && !fence.is_complete(marker) {
            log::debug!(
                "frame slot {next} busy; waiting for fence {marker} (completed {})",
                fence.completed_value()
            );
            fence.wait_for(marker)?;
        }

        self.current = next;
        Ok(&mut self.slots[next])
    }

    /// Whether the next `advance()` would have to wait on `fence`.
    pub fn would_block<D: FenceDriver>(&self, fence: &Fence<D>) -> bool {
        let marker = self.slots[self.next_index()].fence;
        marker != 0 && !fence.is_complete(marker)
    }

    /// Tags the current slot with the fence value signalled after its submission.
    pub fn retire(&mut self, fence_value: u64) {
        let slot = &mut self.slots[self.current];
        debug_assert!(fence_value >= slot.fence, "fence values must not go backwards");
        slot.fence = fence_value;
    }

    #[inline]
    pub fn current(&self) -> &FrameSlot<T> {
        &self.slots[self.current]
    }

    #[inline]
    pub fn current_mut(&mut self) -> &mut FrameSlot<T> {
        &mut self.slots[self.current]
    }

    #[inline]
    pub fn current_index(&self) -> usize {
        self.current
    }

    #[inline]
    pub fn depth(&self) -> usize {
        self.slots.len()
    }

    pub fn slots(&self) -> &[FrameSlot<T>] {
        &self.slots
    }

    /// Mutable access to every slot, e.g. to resize buffers after a full GPU drain.
    pub fn slots_mut(&mut self) -> &mut [FrameSlot<T>] {
        &mut self.slots
    }

    #[inline]
    fn next_index(&self) -> usize {
        (self.current + 1) % self.slots.len()
    }
}
