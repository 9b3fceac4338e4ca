//! *b*-bit-per-cell packed counter array with saturating increment, cursor
//! scans, and cell-wise saturating merge.
//!
//! Cells are packed little-endian into consecutive 64-bit words with no
//! per-cell alignment — a cell may straddle a word boundary. Cell `i`
//! occupies bit positions `[i*b, i*b + b)` in a flat bit-address space.

use crate::error::{Result, SketchError};
use crate::words::WordBuffer;

/// A fixed-size array of `M` saturating `b`-bit unsigned counters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CellArray {
    words: WordBuffer,
    len: usize,
    bits_per_cell: u32,
    cell_mask: u64,
    nonzero_count: usize,
}

impl CellArray {
    /// Creates a new array of `len` cells, each `bits_per_cell` bits wide
    /// (1..=31), all zeroed.
    ///
    /// # Errors
    /// Returns [`SketchError::InvalidDimension`] if `bits_per_cell` is
    /// outside `1..=31`.
    pub fn new(len: usize, bits_per_cell: u32) -> Result<Self> {
        if !(1..=31).contains(&bits_per_cell) {
            return Err(SketchError::invalid_dimension(format!(
                "bits_per_cell must be in 1..=31, got {bits_per_cell}"
            )));
        }
        let total_bits = len.saturating_mul(bits_per_cell as usize);
        Ok(Self {
            words: WordBuffer::zeroed(total_bits.div_ceil(64)),
            len,
            bits_per_cell,
            cell_mask: (1u64 << bits_per_cell) - 1,
            nonzero_count: 0,
        })
    }

    /// Number of cells, `M`.
    #[must_use]
    pub fn size(&self) -> usize {
        self.len
    }

    /// Bits per cell, `b`.
    #[must_use]
    pub fn bits_per_cell(&self) -> u32 {
        self.bits_per_cell
    }

    /// The saturation ceiling, `2^b - 1`.
    #[must_use]
    pub fn cell_mask(&self) -> u64 {
        self.cell_mask
    }

    #[inline]
    fn start_bit(&self, i: usize) -> usize {
        i * self.bits_per_cell as usize
    }

    /// Reads cell `i`.
    ///
    /// # Panics
    /// Panics if `i >= size()`.
    #[must_use]
    pub fn get(&self, i: usize) -> u64 {
        assert!(i < self.len, "cell index {i} out of range (len {})", self.len);
        self.words.get_bits(self.start_bit(i), self.bits_per_cell)
    }

    /// Increments cell `i` by 1, clamped at the saturation ceiling. Returns
    /// `true` iff the stored value changed.
    ///
    /// # Panics
    /// Panics if `i >= size()`.
    pub fn increment(&mut self, i: usize) -> bool {
        self.add(i, 1)
    }

    /// Adds `delta` (>= 0) to cell `i`, clamped at the saturation ceiling.
    /// `delta == 0` is a no-op. Returns `true` iff the stored value changed.
    ///
    /// Implemented as an in-place XOR of `old ^ new` into the packed word(s)
    /// so only the bits that actually changed are touched.
    ///
    /// # Panics
    /// Panics if `i >= size()`.
    pub fn add(&mut self, i: usize, delta: u64) -> bool {
        assert!(i < self.len, "cell index {i} out of range (len {})", self.len);
        if delta == 0 {
            return false;
        }
        let old = self.get(i);
        let new = old.saturating_add(delta).min(self.cell_mask);
        if new == old {
            return false;
        }
        self.words.xor_bits(self.start_bit(i), self.bits_per_cell, old ^ new);
        if old == 0 {
            self.nonzero_count += 1;
        }
        true
    }

    /// Defined as `increment(i)`. Exists so [`CellArray`] can serve as a
    /// generic "hash sink" alongside [`crate::bitset::BitSet`] under the
    /// same `set`-shaped contract used by batched filter inserts.
    ///
    /// This intentionally does **not** set the cell to 1 — a second call on
    /// an already-hit cell increments it again.
    pub fn set(&mut self, i: usize) -> bool {
        self.increment(i)
    }

    /// Number of non-zero cells, O(1).
    #[must_use]
    pub fn population_count(&self) -> usize {
        self.nonzero_count
    }

    /// Zeros all words. No-op if already empty.
    pub fn clear(&mut self) {
        if self.nonzero_count == 0 {
            return;
        }
        self.words.clear();
        self.nonzero_count = 0;
    }

    /// Cell-wise saturating addition: `self[i] := min(ceiling, self[i] + other[i])`
    /// for every `i`. Requires identical shape (size and bits-per-cell).
    pub fn union(&mut self, other: &CellArray) -> Result<()> {
        self.require_same_shape(other)?;
        for i in 0..self.len {
            let delta = other.get(i);
            if delta > 0 {
                self.add(i, delta);
            }
        }
        Ok(())
    }

    /// Declared but deliberately unsupported — always returns
    /// [`SketchError::UnsupportedOperation`].
    ///
    /// # Errors
    /// Always.
    pub fn intersect(&mut self, _other: &CellArray) -> Result<()> {
        Err(SketchError::UnsupportedOperation {
            operation: "CellArray::intersect",
        })
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

    /// Rebinds this array to an externally supplied word buffer. The
    /// buffer's length must exactly match the word count implied by
    /// `size()` and `bits_per_cell()`.
    ///
    /// # Errors
    /// Returns [`SketchError::SizeMismatch`] if the lengths differ.
    pub fn wrap(&mut self, words: Box<[u64]>) -> Result<()> {
        let expected = (self.len * self.bits_per_cell as usize).div_ceil(64);
        if words.len() != expected {
            return Err(SketchError::SizeMismatch {
                expected,
                actual: words.len(),
            });
        }
        self.words = WordBuffer::from_words(words);
        self.recompute_population();
        Ok(())
    }

    fn recompute_population(&mut self) {
        self.nonzero_count = (0..self.len).filter(|&i| self.get(i) != 0).count();
    }

    fn require_same_shape(&self, other: &CellArray) -> Result<()> {
        if self.len != other.len || self.bits_per_cell != other.bits_per_cell {
            return Err(SketchError::incompatible(format!(
                "cell array shape mismatch: ({}, {}) vs ({}, {})",
                self.len, self.bits_per_cell, other.len, other.bits_per_cell
            )));
        }
        Ok(())
    }

    /// A lazy sequence of `(cell_index, value)` pairs for all non-zero
    /// cells, in ascending `cell_index` order.
    pub fn cursor(&self) -> Cursor<'_> {
        Cursor {
            array: self,
            next_index: 0,
        }
    }

    /// Like [`CellArray::cursor`], but zeros each cell as it is yielded.
    /// After the cursor is fully drained, every backing word is zero and
    /// the population count is zero.
    pub fn clearing_cursor(&mut self) -> ClearingCursor<'_> {
        ClearingCursor {
            array: self,
            next_index: 0,
        }
    }
}

/// Read-only cursor produced by [`CellArray::cursor`].
pub struct Cursor<'a> {
    array: &'a CellArray,
    next_index: usize,
}

impl Iterator for Cursor<'_> {
    type Item = (usize, u64);

    fn next(&mut self) -> Option<(usize, u64)> {
        while self.next_index < self.array.len {
            let i = self.next_index;
            self.next_index += 1;
            let v = self.array.get(i);
            if v != 0 {
                return Some((i, v));
            }
        }
        None
    }
}

/// Destructive cursor produced by [`CellArray::clearing_cursor`].
pub struct ClearingCursor<'a> {
    array: &'a mut CellArray,
    next_index: usize,
}

impl Iterator for ClearingCursor<'_> {
    type Item = (usize, u64);

    fn next(&mut self) -> Option<(usize, u64)> {
        while self.next_index < self.array.len {
            let i = self.next_index;
            self.next_index += 1;
            let v = self.array.get(i);
            if v != 0 {
                self.array
                    .words
                    .set_bits(self.array.start_bit(i), self.array.bits_per_cell, 0);
                self.array.nonzero_count -= 1;
                return Some((i, v));
            }
        }
        None
    }
}
