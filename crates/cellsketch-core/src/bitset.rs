//! Dense bit set used both as a transaction cache and as a position
//! deduplicator.
//!
//! `N` bits are stored in `ceil(N / 64)` words. A cached population count
//! is maintained incrementally so [`BitSet::population_count`] is O(1).

use crate::error::{Result, SketchError};
use crate::words::WordBuffer;

/// A fixed-size dense bit set with O(1) population count and a destructive
/// "clearing iterator".
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BitSet {
    words: WordBuffer,
    len: usize,
    population: usize,
}

impl BitSet {
    /// Creates a new bit set of `len` bits, all clear.
    #[must_use]
    pub fn new(len: usize) -> Self {
        Self {
            words: WordBuffer::zeroed(len.div_ceil(64)),
            len,
            population: 0,
        }
    }

    /// Number of logical bits, `N`.
    #[must_use]
    pub fn size(&self) -> usize {
        self.len
    }

    /// Reads bit `i`.
    ///
    /// # Panics
    /// Panics if `i >= size()`.
    #[must_use]
    pub fn get(&self, i: usize) -> bool {
        assert!(i < self.len, "bit index {i} out of range (len {})", self.len);
        self.words.get_bit(i)
    }

    /// Sets bit `i`. Returns `true` iff it was previously clear.
    ///
    /// # Panics
    /// Panics if `i >= size()`.
    pub fn set(&mut self, i: usize) -> bool {
        assert!(i < self.len, "bit index {i} out of range (len {})", self.len);
        let changed = self.words.set_bit(i);
        if changed {
            self.population += 1;
        }
        changed
    }

    /// Current number of set bits, O(1).
    #[must_use]
    pub fn population_count(&self) -> usize {
        self.population
    }

    /// Zeros every word. No-op if already empty.
    pub fn clear(&mut self) {
        if self.population == 0 {
            return;
        }
        self.words.clear();
        self.population = 0;
    }

    /// In-place bitwise OR with `other`. Requires identical word length.
    pub fn union(&mut self, other: &BitSet) -> Result<()> {
        self.require_same_shape(other)?;
        self.words.union_with(&other.words);
        self.recompute_population();
        Ok(())
    }

    /// In-place bitwise AND with `other`. Requires identical word length.
    pub fn intersect(&mut self, other: &BitSet) -> Result<()> {
        self.require_same_shape(other)?;
        self.words.intersect_with(&other.words);
        self.recompute_population();
        Ok(())
    }

    /// Exposes the backing word buffer for export.
    #[must_use]
    pub fn raw_words(&self) -> &[u64] {
        self.words.words()
    }

    /// Byte view (little-endian) of the backing word buffer.
    #[must_use]
    pub fn as_bytes_le(&self) -> Vec<u8> {
        self.raw_words().iter().flat_map(|w| w.to_le_bytes()).collect()
    }

    /// A lazy, destructive iterator over the indices of currently set bits,
    /// in strictly ascending order. Each bit is cleared the instant it is
    /// yielded.
    pub fn clearing_iterator(&mut self) -> ClearingIter<'_> {
        ClearingIter {
            set: self,
            word_cursor: 0,
        }
    }

    fn require_same_shape(&self, other: &BitSet) -> Result<()> {
        if self.words.word_len() != other.words.word_len() {
            return Err(SketchError::incompatible(format!(
                "bit set word length mismatch: {} vs {}",
                self.words.word_len(),
                other.words.word_len()
            )));
        }
        Ok(())
    }

    fn recompute_population(&mut self) {
        self.population = self
            .words
            .words()
            .iter()
            .map(|w| w.count_ones() as usize)
            .sum();
    }
}

/// Destructive iterator produced by [`BitSet::clearing_iterator`].
///
/// Isolates the lowest set bit of the current word via `x & -x`, clears it,
/// and reports its global index; advances the word cursor past runs of zero
/// words.
pub struct ClearingIter<'a> {
    set: &'a mut BitSet,
    word_cursor: usize,
}

impl Iterator for ClearingIter<'_> {
    type Item = usize;

    fn next(&mut self) -> Option<usize> {
        let words = self.set.words.words_mut();
        while self.word_cursor < words.len() {
            let word = words[self.word_cursor];
            if word == 0 {
                self.word_cursor += 1;
                continue;
            }
            let lowest = word & word.wrapping_neg();
            words[self.word_cursor] = word ^ lowest;
            self.set.population = self.set.population.saturating_sub(1);
            let idx = self.word_cursor * 64 + lowest.trailing_zeros() as usize;
            return Some(idx);
        }
        None
    }
}
