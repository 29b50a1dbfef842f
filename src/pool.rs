//! Fixed-capacity, index-addressed storage with LIFO free-list reuse.

/// Stable reference to a pool slot.
///
/// `value` is the slot index and survives reuse; `generation` is bumped every
/// time the slot is released so references held across a free are rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, PartialOrd, Ord)]
pub struct Handle {
    pub value: u32,
    pub generation: u32,
}

impl Handle {
    pub const fn new(value: u32, generation: u32) -> Self {
        Self { value, generation }
    }
}

#[derive(Debug)]
struct Entry<T> {
    generation: u32,
    alive: bool,
    value: Option<T>,
}

#[derive(Debug)]
pub struct Pool<T> {
    entries: Vec<Entry<T>>,
    capacity: usize,
    free_list: Vec<u32>,
    live: usize,
}

impl<T> Pool<T> {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: Vec::with_capacity(capacity),
            capacity,
            free_list: Vec::new(),
            live: 0,
        }
    }

    /// Pool sized from a byte budget, one slot per `size_of::<T>()` bytes.
    pub fn with_byte_budget(bytes: usize) -> Self {
        let slot = core::mem::size_of::<T>().max(1);
        Self::new(bytes / slot)
    }

    /// Stores `value` in the most recently freed slot, or the next untouched one.
    ///
    /// # Panics
    /// When every slot is alive.
    pub fn allocate(&mut self, value: T) -> Handle {
        if let Some(index) = self.free_list.pop() {
            let entry = &mut self.entries[index as usize];
            entry.alive = true;
            entry.value = Some(value);
            self.live += 1;
            return Handle::new(index, entry.generation);
        }

        assert!(
            self.entries.len() < self.capacity,
            "pool capacity of {} exhausted",
            self.capacity
        );
        let index = self.entries.len() as u32;
        self.entries.push(Entry {
            generation: 0,
            alive: true,
            value: Some(value),
        });
        self.live += 1;
        Handle::new(index, 0)
    }

    /// Releases the slot and hands back its value.
    ///
    /// # Panics
    /// When `handle` does not refer to a live slot.
    pub fn deallocate(&mut self, handle: Handle) -> T {
        assert!(self.is_alive(handle), "deallocating dead handle {handle:?}");
        let entry = &mut self.entries[handle.value as usize];
        entry.alive = false;
        entry.generation = entry.generation.wrapping_add(1);
        self.free_list.push(handle.value);
        self.live -= 1;
        match entry.value.take() {
            Some(value) => value,
            None => unreachable!("live slot without value"),
        }
    }

    pub fn is_alive(&self, handle: Handle) -> bool {
        self.entries
            .get(handle.value as usize)
            .is_some_and(|e| e.alive && e.generation == handle.generation)
    }

    pub fn get(&self, handle: Handle) -> Option<&T> {
        let entry = self.entries.get(handle.value as usize)?;
        if entry.alive && entry.generation == handle.generation {
            entry.value.as_ref()
        } else {
            None
        }
    }

    pub fn get_mut(&mut self, handle: Handle) -> Option<&mut T> {
        let entry = self.entries.get_mut(handle.value as usize)?;
        if entry.alive && entry.generation == handle.generation {
            entry.value.as_mut()
        } else {
            None
        }
    }

    /// Live slots in index order.
    pub fn iter(&self) -> impl Iterator<Item = (Handle, &T)> {
        self.entries.iter().enumerate().filter_map(|(i, e)| {
            e.value
                .as_ref()
                .filter(|_| e.alive)
                .map(|v| (Handle::new(i as u32, e.generation), v))
        })
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (Handle, &mut T)> {
        self.entries.iter_mut().enumerate().filter_map(|(i, e)| {
            let generation = e.generation;
            let alive = e.alive;
            e.value
                .as_mut()
                .filter(|_| alive)
                .map(|v| (Handle::new(i as u32, generation), v))
        })
    }

    pub fn len(&self) -> usize {
        self.live
    }

    pub fn is_empty(&self) -> bool {
        self.live == 0
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl<T> core::ops::Index<Handle> for Pool<T> {
    type Output = T;

    /// # Panics
    /// When `handle` is stale.
    fn index(&self, handle: Handle) -> &T {
        match self.get(handle) {
            Some(value) => value,
            None => panic!("stale handle {handle:?}"),
        }
    }
}

impl<T> core::ops::IndexMut<Handle> for Pool<T> {
    fn index_mut(&mut self, handle: Handle) -> &mut T {
        match self.get_mut(handle) {
            Some(value) => value,
            None => panic!("stale handle {handle:?}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reuse_keeps_value_and_bumps_generation() {
        let mut pool = Pool::new(4);
        let a = pool.allocate(1);
        assert_eq!(pool.deallocate(a), 1);
        assert!(!pool.is_alive(a));

        let b = pool.allocate(2);
        assert_eq!(b.value, a.value);
        assert!(pool.is_alive(b));
        assert_ne!(b.generation, a.generation);
        assert!(pool.get(a).is_none());
        assert_eq!(pool.get(b), Some(&2));
    }

    #[test]
    fn free_list_is_lifo() {
        let mut pool = Pool::new(4);
        let a = pool.allocate('a');
        let b = pool.allocate('b');
        let _c = pool.allocate('c');
        pool.deallocate(a);
        pool.deallocate(b);
        assert_eq!(pool.allocate('d').value, b.value);
        assert_eq!(pool.allocate('e').value, a.value);
    }

    #[test]
    fn iteration_skips_dead_slots() {
        let mut pool = Pool::new(4);
        let a = pool.allocate(10);
        let _b = pool.allocate(20);
        let _c = pool.allocate(30);
        pool.deallocate(a);
        let values: Vec<_> = pool.iter().map(|(_, v)| *v).collect();
        assert_eq!(values, vec![20, 30]);
        assert_eq!(pool.len(), 2);
    }

    #[test]
    #[should_panic(expected = "exhausted")]
    fn exhausting_capacity_is_fatal() {
        let mut pool = Pool::new(1);
        pool.allocate(());
        pool.allocate(());
    }

    #[test]
    #[should_panic(expected = "dead handle")]
    fn double_free_is_fatal() {
        let mut pool = Pool::new(1);
        let a = pool.allocate(());
        pool.deallocate(a);
        pool.deallocate(a);
    }

    #[test]
    fn byte_budget_divides_by_slot_size() {
        let pool: Pool<[u8; 64]> = Pool::with_byte_budget(1024);
        assert_eq!(pool.capacity(), 16);
    }
}
