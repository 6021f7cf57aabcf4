/// Logical roles of the three wave buffers.
///
/// Each field is an index into a fixed array of three owned buffers. Rotation
/// only reassigns indices.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct WaveRoles {
    prev: u8,
    curr: u8,
    next: u8,
}

impl Default for WaveRoles {
    fn default() -> Self {
        Self { prev: 0, curr: 1, next: 2 }
    }
}

impl WaveRoles {
    /// prev ← curr, curr ← next, next ← prev.
    #[inline]
    pub fn rotate(&mut self) {
        let recycled = self.prev;
        self.prev = self.curr;
        self.curr = self.next;
        self.next = recycled;
    }

    #[inline]
    pub fn prev(self) -> usize {
        self.prev as usize
    }

    #[inline]
    pub fn current(self) -> usize {
        self.curr as usize
    }

    #[inline]
    pub fn next(self) -> usize {
        self.next as usize
    }

    /// Which of the three rotation states this is, in `0..3`.
    ///
    /// Per-state bind groups are looked up by phase.
    #[inline]
    pub fn phase(self) -> usize {
        self.prev as usize
    }

    /// All three rotation states in phase order.
    pub fn all() -> [WaveRoles; 3] {
        let mut r = WaveRoles::default();
        let mut out = [r; 3];
        for slot in out.iter_mut().skip(1) {
            r.rotate();
            *slot = r;
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rotate_shifts_each_role() {
        let mut r = WaveRoles::default();
        r.rotate();
        assert_eq!((r.prev(), r.current(), r.next()), (1, 2, 0));
    }

    #[test]
    fn three_rotations_are_the_identity() {
        let start = WaveRoles::default();
        let mut r = start;
        r.rotate();
        r.rotate();
        assert_ne!(r, start);
        r.rotate();
        assert_eq!(r, start);
    }

    #[test]
    fn roles_always_name_distinct_buffers() {
        for r in WaveRoles::all() {
            let mut idx = [r.prev(), r.current(), r.next()];
            idx.sort_unstable();
            assert_eq!(idx, [0, 1, 2]);
        }
    }

    #[test]
    fn phases_are_distinct_and_ordered() {
        let phases: Vec<usize> = WaveRoles::all().iter().map(|r| r.phase()).collect();
        assert_eq!(phases, vec![0, 1, 2]);
    }
}
