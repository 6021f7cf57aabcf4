use core::fmt;
use core::marker::PhantomData;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BindingError {
    #[error("binding table '{label}' is full ({capacity} entries)")]
    Full { label: &'static str, capacity: usize },

    #[error("binding index {index} out of range for table '{label}' ({len} entries)")]
    OutOfRange {
        label: &'static str,
        index: usize,
        len: usize,
    },
}

/// Index into a `BindingTable<T>`.
///
/// The type parameter ties a handle to the kind of entry it was issued for.
pub struct BindingHandle<T> {
    index: u32,
    _marker: PhantomData<fn() -> T>,
}

impl<T> BindingHandle<T> {
    #[inline]
    const fn new(index: usize) -> Self {
        Self {
            index: index as u32,
            _marker: PhantomData,
        }
    }

    #[inline]
    pub fn index(self) -> usize {
        self.index as usize
    }
}

impl<T> Clone for BindingHandle<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for BindingHandle<T> {}

impl<T> PartialEq for BindingHandle<T> {
    fn eq(&self, other: &Self) -> bool {
        self.index == other.index
    }
}

impl<T> Eq for BindingHandle<T> {}

impl<T> fmt::Debug for BindingHandle<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BindingHandle({})", self.index)
    }
}

/// Fixed-capacity arena of descriptors.
///
/// Entries are never removed; `replace` swaps an entry in place so that handles
/// stay valid across rebuilds (e.g. after a resize).
pub struct BindingTable<T> {
    label: &'static str,
    entries: Vec<T>,
    capacity: usize,
}

impl<T> BindingTable<T> {
    pub fn new(label: &'static str, capacity: usize) -> Self {
        Self {
            label,
            entries: Vec::with_capacity(capacity),
            capacity,
        }
    }

    pub fn insert(&mut self, entry: T) -> Result<BindingHandle<T>, BindingError> {
        if self.entries.len() == self.capacity {
            return Err(BindingError::Full {
                label: self.label,
                capacity: self.capacity,
            });
        }
        self.entries.push(entry);
        Ok(BindingHandle::new(self.entries.len() - 1))
    }

    pub fn get(&self, handle: BindingHandle<T>) -> Result<&T, BindingError> {
        self.entries
            .get(handle.index())
            .ok_or_else(|| self.out_of_range(handle.index()))
    }

    /// Swaps in a rebuilt entry and returns the old one.
    pub fn replace(&mut self, handle: BindingHandle<T>, entry: T) -> Result<T, BindingError> {
        let err = self.out_of_range(handle.index());
        let slot = self.entries.get_mut(handle.index()).ok_or(err)?;
        Ok(std::mem::replace(slot, entry))
    }

    /// Handle for an existing position, e.g. one computed from a rotation phase.
    pub fn handle(&self, index: usize) -> Result<BindingHandle<T>, BindingError> {
        if index < self.entries.len() {
            Ok(BindingHandle::new(index))
        } else {
            Err(self.out_of_range(index))
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    fn out_of_range(&self, index: usize) -> BindingError {
        BindingError::OutOfRange {
            label: self.label,
            index,
            len: self.entries.len(),
        }
    }
}

/// Panics on a foreign handle, like slice indexing. Use `get` when the handle
/// may not belong to this table.
impl<T> core::ops::Index<BindingHandle<T>> for BindingTable<T> {
    type Output = T;

    fn index(&self, handle: BindingHandle<T>) -> &T {
        &self.entries[handle.index()]
    }
}

impl<T> core::ops::IndexMut<BindingHandle<T>> for BindingTable<T> {
    fn index_mut(&mut self, handle: BindingHandle<T>) -> &mut T {
        &mut self.entries[handle.index()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_hands_out_sequential_handles() {
        let mut t = BindingTable::new("test", 3);
        let a = t.insert("a").unwrap();
        let b = t.insert("b").unwrap();
        assert_eq!((a.index(), b.index()), (0, 1));
        assert_eq!(t.get(b), Ok(&"b"));
    }

    #[test]
    fn insert_past_capacity_fails() {
        let mut t = BindingTable::new("tiny", 1);
        t.insert(1).unwrap();
        assert_eq!(
            t.insert(2),
            Err(BindingError::Full {
                label: "tiny",
                capacity: 1
            })
        );
    }

    #[test]
    fn handles_from_a_larger_table_are_rejected() {
        let mut big = BindingTable::new("big", 4);
        let small: BindingTable<u8> = BindingTable::new("small", 4);
        big.insert(0u8).unwrap();
        let h = big.insert(1u8).unwrap();
        assert!(matches!(small.get(h), Err(BindingError::OutOfRange { index: 1, .. })));
    }

    #[test]
    fn replace_keeps_the_handle_valid() {
        let mut t = BindingTable::new("test", 2);
        let h = t.insert(String::from("old")).unwrap();
        assert_eq!(t.replace(h, String::from("new")).unwrap(), "old");
        assert_eq!(t.get(h).unwrap(), "new");
    }

    #[test]
    fn handle_lookup_is_bounds_checked() {
        let mut t = BindingTable::new("test", 3);
        t.insert(()).unwrap();
        assert!(t.handle(0).is_ok());
        assert!(t.handle(1).is_err());
    }

    #[test]
    fn indexing_returns_the_entry() {
        let mut t = BindingTable::new("test", 2);
        t.insert(10).unwrap();
        let h = t.insert(20).unwrap();
        assert_eq!(t[h], 20);
        t[h] = 30;
        assert_eq!(t.get(h), Ok(&30));
    }
}
