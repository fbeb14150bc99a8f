//! The memory pool elements are allocated from.

use std::{
    fmt,
    marker::PhantomData,
    ops::{Index, IndexMut},
};

use stable_vec::StableVec;

use crate::handle::{hsize, Generation, Handle};


/// A pool of fixed-size elements with O(1) allocation and O(1) release.
///
/// Elements are stored in a [`StableVec`]: removing an element leaves a hole
/// and never moves other elements, so pool indices stay stable. Freed slots
/// are remembered in a free list and reused (most recently freed first)
/// before the pool grows.
///
/// Each slot carries a generation counter that is bumped whenever the element
/// in it is freed. Handles remember the generation they were created with,
/// which makes it possible to detect the use of a handle to a killed element
/// (see [`Pool::contains`]) even after its slot got reused.
///
/// Iterating the pool ([`Pool::handles`]) visits all live elements in
/// increasing slot order ("pool order") without any auxiliary index.
#[derive(Clone)]
pub struct Pool<H: Handle, T> {
    slots: StableVec<T>,
    generations: Vec<Generation>,
    free: Vec<hsize>,
    _dummy: PhantomData<H>,
}

impl<H: Handle, T> Pool<H, T> {
    /// Creates an empty pool.
    pub fn new() -> Self {
        Self {
            slots: StableVec::new(),
            generations: Vec::new(),
            free: Vec::new(),
            _dummy: PhantomData,
        }
    }

    /// Creates an empty pool with memory for `cap` many elements.
    pub fn with_capacity(cap: usize) -> Self {
        Self {
            slots: StableVec::with_capacity(cap),
            generations: Vec::with_capacity(cap),
            free: Vec::new(),
            _dummy: PhantomData,
        }
    }

    /// Allocates a slot for `elem` and returns its handle.
    pub fn alloc(&mut self, elem: T) -> H {
        self.alloc_with(|_| elem)
    }

    /// Allocates a slot and initializes it with the value returned by `init`,
    /// which receives the handle of the new element. This is useful for
    /// elements that need to refer to themselves (e.g. a loop which is its
    /// own `next` before it is linked into a cycle).
    pub fn alloc_with(&mut self, init: impl FnOnce(H) -> T) -> H {
        match self.free.pop() {
            Some(idx) => {
                let slot = idx as usize;
                let handle = H::new(idx, self.generations[slot]);
                let old = self.slots.insert(slot, init(handle));
                debug_assert!(old.is_none(), "pool free list contained an occupied slot");
                handle
            }
            None => {
                let slot = self.slots.next_push_index();
                let generation = match self.generations.get(slot) {
                    Some(&gen) => gen,
                    None => {
                        self.generations.push(0);
                        0
                    }
                };
                let handle = H::new(slot as hsize, generation);
                let pushed = self.slots.push(init(handle));
                debug_assert_eq!(pushed, slot);
                handle
            }
        }
    }

    /// Releases the slot of `handle` and returns the element that was stored
    /// in it. Returns `None` (and does nothing) if the handle is stale.
    pub fn free(&mut self, handle: H) -> Option<T> {
        if !self.contains(handle) {
            return None;
        }

        let slot = handle.to_usize();
        let out = self.slots.remove(slot);
        self.generations[slot] = self.generations[slot].wrapping_add(1);
        self.free.push(handle.idx());
        out
    }

    /// Returns `true` if `handle` refers to a live element of this pool.
    #[inline]
    pub fn contains(&self, handle: H) -> bool {
        let slot = handle.to_usize();
        slot < self.generations.len()
            && self.generations[slot] == handle.generation()
            && self.slots.has_element_at(slot)
    }

    #[inline]
    pub fn get(&self, handle: H) -> Option<&T> {
        if self.contains(handle) {
            self.slots.get(handle.to_usize())
        } else {
            None
        }
    }

    #[inline]
    pub fn get_mut(&mut self, handle: H) -> Option<&mut T> {
        if self.contains(handle) {
            self.slots.get_mut(handle.to_usize())
        } else {
            None
        }
    }

    /// Number of live elements.
    pub fn len(&self) -> hsize {
        self.slots.num_elements() as hsize
    }

    pub fn is_empty(&self) -> bool {
        self.slots.num_elements() == 0
    }

    /// Upper bound (exclusive) of all slot indices ever handed out. Handle
    /// indices of live elements are always smaller than this value, which
    /// makes it the right size for index-addressed side tables.
    pub fn slot_bound(&self) -> usize {
        self.generations.len()
    }

    /// Number of elements the pool can hold without reallocating.
    pub fn capacity(&self) -> usize {
        self.slots.capacity()
    }

    /// Reserves memory for at least `additional` more elements.
    pub fn reserve(&mut self, additional: usize) {
        let free = self.free.len();
        if additional > free {
            self.slots.reserve(additional - free);
            self.generations.reserve(additional - free);
        }
    }

    /// Removes all elements. The generations of all slots are bumped, so
    /// every handle handed out before becomes stale.
    pub fn clear(&mut self) {
        // The old slots are pushed again from index 0 on, with the bumped
        // generations still in place.
        self.slots = StableVec::with_capacity(self.slots.capacity());
        self.free.clear();
        for gen in &mut self.generations {
            *gen = gen.wrapping_add(1);
        }
    }

    /// Iterates over the handles of all live elements in pool order.
    pub fn handles(&self) -> Handles<'_, H, T> {
        Handles {
            pool: self,
            next: 0,
            remaining: self.slots.num_elements(),
        }
    }

    /// Iterates over all live elements (with their handle) in pool order.
    pub fn iter(&self) -> impl Iterator<Item = (H, &T)> + '_ {
        self.handles().map(move |h| (h, &self[h]))
    }

    /// Iterates mutably over all live elements (with their handle) in pool
    /// order.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = (H, &mut T)> + '_ {
        let generations = &self.generations;
        self.slots.iter_mut().map(move |(slot, elem)| (H::new(slot as hsize, generations[slot]), elem))
    }

    pub fn values_mut(&mut self) -> impl Iterator<Item = &mut T> + '_ {
        self.slots.values_mut()
    }

    /// Returns the handle of the live element in slot `slot`, if any.
    fn handle_at(&self, slot: usize) -> Option<H> {
        if slot < self.generations.len() && self.slots.has_element_at(slot) {
            Some(H::new(slot as hsize, self.generations[slot]))
        } else {
            None
        }
    }
}

impl<H: Handle, T> Default for Pool<H, T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<H: Handle, T> Index<H> for Pool<H, T> {
    type Output = T;
    fn index(&self, handle: H) -> &Self::Output {
        match self.get(handle) {
            Some(elem) => elem,
            None => panic!("{:?} does not refer to a live {}", handle, H::KIND),
        }
    }
}

impl<H: Handle, T> IndexMut<H> for Pool<H, T> {
    fn index_mut(&mut self, handle: H) -> &mut Self::Output {
        match self.get_mut(handle) {
            Some(elem) => elem,
            None => panic!("{:?} does not refer to a live {}", handle, H::KIND),
        }
    }
}

impl<H: Handle, T: fmt::Debug> fmt::Debug for Pool<H, T> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}


/// Iterator over the handles of a pool, in pool order. Returned by
/// [`Pool::handles`].
#[derive(Debug)]
pub struct Handles<'a, H: Handle, T> {
    pool: &'a Pool<H, T>,
    next: usize,
    remaining: usize,
}

impl<H: Handle, T> Clone for Handles<'_, H, T> {
    fn clone(&self) -> Self {
        Self { ..*self }
    }
}

impl<H: Handle, T> Iterator for Handles<'_, H, T> {
    type Item = H;

    fn next(&mut self) -> Option<Self::Item> {
        while self.remaining > 0 && self.next < self.pool.slot_bound() {
            let slot = self.next;
            self.next += 1;
            if let Some(h) = self.pool.handle_at(slot) {
                self.remaining -= 1;
                return Some(h);
            }
        }

        None
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<H: Handle, T> ExactSizeIterator for Handles<'_, H, T> {}
