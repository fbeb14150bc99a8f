//! A set of element handles backed by a bitset indexed by pool slot.

use std::{fmt, marker::PhantomData};

use crate::handle::{hsize, Handle};


/// Set of elements of one kind, stored as one bit per pool slot.
///
/// This is used by algorithms that need to mark elements as visited. The set
/// is owned by the algorithm (or passed in by its caller), so no state is left
/// in the elements themselves. Only the slot index of a handle is stored: the
/// set must not outlive mutations of the mesh it was built for.
#[derive(Clone, PartialEq, Eq)]
pub struct ElemSet<H: Handle> {
    words: Vec<u64>,
    len: usize,
    _dummy: PhantomData<H>,
}

impl<H: Handle> ElemSet<H> {
    pub fn new() -> Self {
        Self {
            words: Vec::new(),
            len: 0,
            _dummy: PhantomData,
        }
    }

    /// Creates an empty set that can hold slots `0..bound` without
    /// reallocating. Pass `Pool::slot_bound()` here.
    pub fn with_bound(bound: usize) -> Self {
        Self {
            words: vec![0; (bound + 63) / 64],
            len: 0,
            _dummy: PhantomData,
        }
    }

    #[inline]
    fn pos(h: H) -> (usize, u64) {
        let idx = h.to_usize();
        (idx / 64, 1 << (idx % 64))
    }

    /// Inserts `h`. Returns `true` if it was not in the set before.
    pub fn insert(&mut self, h: H) -> bool {
        let (word, bit) = Self::pos(h);
        if word >= self.words.len() {
            self.words.resize(word + 1, 0);
        }

        let was_set = self.words[word] & bit != 0;
        self.words[word] |= bit;
        if !was_set {
            self.len += 1;
        }
        !was_set
    }

    /// Removes `h`. Returns `true` if it was in the set.
    pub fn remove(&mut self, h: H) -> bool {
        let (word, bit) = Self::pos(h);
        match self.words.get_mut(word) {
            Some(w) if *w & bit != 0 => {
                *w &= !bit;
                self.len -= 1;
                true
            }
            _ => false,
        }
    }

    #[inline]
    pub fn contains(&self, h: H) -> bool {
        let (word, bit) = Self::pos(h);
        self.words.get(word).map(|w| w & bit != 0).unwrap_or(false)
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Removes all elements, keeping the allocated memory.
    pub fn clear(&mut self) {
        for w in &mut self.words {
            *w = 0;
        }
        self.len = 0;
    }

    /// Iterates over the slot indices in this set, in increasing order.
    pub fn indices(&self) -> impl Iterator<Item = hsize> + '_ {
        self.words.iter().enumerate().flat_map(|(wi, &w)| {
            (0..64usize).filter(move |&b| w & (1u64 << b) != 0).map(move |b| (wi * 64 + b) as hsize)
        })
    }
}

impl<H: Handle> Default for ElemSet<H> {
    fn default() -> Self {
        Self::new()
    }
}

impl<H: Handle> fmt::Debug for ElemSet<H> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_set().entries(self.indices()).finish()
    }
}
