//! Slot Arena with Generational Handles
//!
//! Game objects and physics bodies live in flat slot arrays. A handle is an
//! index plus the generation of the slot at the time the object was stored:
//! - Removing an object nulls its slot and bumps the slot's generation
//! - Inserting reuses the FIRST null slot, otherwise appends
//! - Occupied slots are never moved, so handles stay valid across frames
//!
//! A stale handle (slot emptied or reused since) simply resolves to `None`,
//! which is what makes "clear the selection, then delete" safe without
//! any raw back-pointers.

/// A reference to an object stored in an [`Arena`].
///
/// Two handles with the same index but different generations refer to
/// different objects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Handle {
    index: u32,
    generation: u32,
}

impl Handle {
    /// A handle that never resolves.
    pub const NULL: Handle = Handle { index: u32::MAX, generation: 0 };

    pub(crate) fn new(index: u32, generation: u32) -> Self {
        Self { index, generation }
    }

    /// Slot index of this handle.
    pub fn index(&self) -> u32 {
        self.index
    }

    /// Generation of the slot when this handle was issued.
    pub fn generation(&self) -> u32 {
        self.generation
    }

    pub fn is_null(&self) -> bool {
        self.index == u32::MAX
    }
}

impl Default for Handle {
    fn default() -> Self {
        Handle::NULL
    }
}

struct Slot<T> {
    generation: u32,
    value: Option<T>,
}

/// Flat slot storage. Null slots double as the free list.
pub struct Arena<T> {
    slots: Vec<Slot<T>>,
    len: usize,
}

impl<T> Arena<T> {
    pub fn new() -> Self {
        Self { slots: Vec::new(), len: 0 }
    }

    /// The handle the next `insert` will return.
    pub fn next_handle(&self) -> Handle {
        match self.slots.iter().position(|s| s.value.is_none()) {
            Some(idx) => Handle::new(idx as u32, self.slots[idx].generation),
            None => Handle::new(self.slots.len() as u32, 0),
        }
    }

    /// Store a value in the first null slot (or a new slot at the end).
    pub fn insert(&mut self, value: T) -> Handle {
        self.insert_with(|_| value)
    }

    /// Store a value that needs to know its own handle up front
    /// (e.g. a shape whose rigidbody points back at it).
    pub fn insert_with(&mut self, make: impl FnOnce(Handle) -> T) -> Handle {
        let handle = self.next_handle();
        let idx = handle.index as usize;
        let value = make(handle);
        if idx == self.slots.len() {
            self.slots.push(Slot { generation: 0, value: Some(value) });
        } else {
            self.slots[idx].value = Some(value);
        }
        self.len += 1;
        handle
    }

    /// Remove a value, nulling its slot. A stale or null handle is a no-op.
    /// The backing store never shrinks.
    pub fn remove(&mut self, handle: Handle) -> Option<T> {
        if !self.contains(handle) {
            return None;
        }
        let slot = &mut self.slots[handle.index as usize];
        slot.generation = slot.generation.wrapping_add(1);
        self.len -= 1;
        slot.value.take()
    }

    pub fn contains(&self, handle: Handle) -> bool {
        self.get(handle).is_some()
    }

    pub fn get(&self, handle: Handle) -> Option<&T> {
        if handle.is_null() {
            return None;
        }
        self.slots
            .get(handle.index as usize)
            .filter(|s| s.generation == handle.generation)
            .and_then(|s| s.value.as_ref())
    }

    pub fn get_mut(&mut self, handle: Handle) -> Option<&mut T> {
        if handle.is_null() {
            return None;
        }
        self.slots
            .get_mut(handle.index as usize)
            .filter(|s| s.generation == handle.generation)
            .and_then(|s| s.value.as_mut())
    }

    /// Mutable access to two distinct live values at once.
    pub fn get2_mut(&mut self, a: Handle, b: Handle) -> Option<(&mut T, &mut T)> {
        if a.index == b.index || !self.contains(a) || !self.contains(b) {
            return None;
        }
        let (lo, hi, swapped) = if a.index < b.index {
            (a.index as usize, b.index as usize, false)
        } else {
            (b.index as usize, a.index as usize, true)
        };
        let (head, tail) = self.slots.split_at_mut(hi);
        let first = head[lo].value.as_mut()?;
        let second = tail[0].value.as_mut()?;
        if swapped {
            Some((second, first))
        } else {
            Some((first, second))
        }
    }

    /// Iterate live values in slot order.
    pub fn iter(&self) -> impl Iterator<Item = (Handle, &T)> {
        self.slots.iter().enumerate().filter_map(|(idx, s)| {
            s.value.as_ref().map(|v| (Handle::new(idx as u32, s.generation), v))
        })
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (Handle, &mut T)> {
        self.slots.iter_mut().enumerate().filter_map(|(idx, s)| {
            let generation = s.generation;
            s.value.as_mut().map(|v| (Handle::new(idx as u32, generation), v))
        })
    }

    /// Handles of all live values, snapshotted so the arena can be mutated
    /// while walking them.
    pub fn handles(&self) -> Vec<Handle> {
        self.iter().map(|(h, _)| h).collect()
    }

    /// Number of live values.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Number of slots, live or null.
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Drop every value. Generations are bumped so old handles go stale.
    pub fn clear(&mut self) -> Vec<T> {
        let mut removed = Vec::with_capacity(self.len);
        for slot in &mut self.slots {
            if let Some(v) = slot.value.take() {
                slot.generation = slot.generation.wrapping_add(1);
                removed.push(v);
            }
        }
        self.len = 0;
        removed
    }
}

impl<T> Default for Arena<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_and_remove() {
        let mut arena = Arena::new();
        let a = arena.insert("a");
        let b = arena.insert("b");
        assert_eq!(arena.len(), 2);

        assert_eq!(arena.remove(a), Some("a"));
        assert_eq!(arena.len(), 1);
        assert!(!arena.contains(a));
        assert_eq!(arena.get(b), Some(&"b"));
    }

    #[test]
    fn test_reuses_first_null_slot() {
        let mut arena = Arena::new();
        let a = arena.insert(0);
        let b = arena.insert(1);
        let c = arena.insert(2);
        arena.remove(c);
        arena.remove(a);

        // Slot 0 is the first null slot even though slot 2 was freed first
        let d = arena.insert(3);
        assert_eq!(d.index(), 0);
        assert_ne!(d.generation(), a.generation());
        assert_eq!(arena.get(b), Some(&1));
        assert_eq!(arena.capacity(), 3);
    }

    #[test]
    fn test_stale_handle_does_not_resolve() {
        let mut arena = Arena::new();
        let a = arena.insert(10);
        arena.remove(a);
        let b = arena.insert(20);
        assert_eq!(a.index(), b.index());
        assert_eq!(arena.get(a), None);
        assert_eq!(arena.remove(a), None);
        assert_eq!(arena.get(b), Some(&20));
    }

    #[test]
    fn test_double_remove_is_noop() {
        let mut arena = Arena::new();
        let a = arena.insert(1);
        assert!(arena.remove(a).is_some());
        assert!(arena.remove(a).is_none());
        assert_eq!(arena.len(), 0);
        assert!(arena.remove(Handle::NULL).is_none());
    }

    #[test]
    fn test_insert_with_sees_own_handle() {
        let mut arena = Arena::new();
        arena.insert(Handle::NULL);
        let h = arena.insert_with(|me| me);
        assert_eq!(arena.get(h), Some(&h));
    }

    #[test]
    fn test_get2_mut() {
        let mut arena = Arena::new();
        let a = arena.insert(1);
        let b = arena.insert(2);
        {
            let (x, y) = arena.get2_mut(b, a).unwrap();
            assert_eq!((*x, *y), (2, 1));
            *x += 10;
        }
        assert_eq!(arena.get(b), Some(&12));
        assert!(arena.get2_mut(a, a).is_none());
    }

    #[test]
    fn test_clear_invalidates_handles() {
        let mut arena = Arena::new();
        let a = arena.insert(1);
        arena.insert(2);
        assert_eq!(arena.clear().len(), 2);
        assert!(arena.is_empty());
        assert!(!arena.contains(a));
        assert_eq!(arena.insert(3).index(), 0);
    }
}
