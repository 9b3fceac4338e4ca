//! The public facade: [`CountingFilter`] and [`SpectralFilter`], two
//! approximate multiplicity sketches sharing one packed-cell core.
//!
//! Both wrap a [`Filter`] with identical storage and hashing; they differ
//! only in what happens on insert. `CountingFilter` increments every one of
//! the `k` hashed positions (classic counting Bloom filter). `SpectralFilter`
//! increments only the positions that currently hold the minimum value among
//! the `k` candidates (the "minimum increase" rule), which keeps counts
//! closer to true multiplicities under heavy hash collision.
//!
//! Single-writer only: `&mut self` is required for every mutating method,
//! and nothing here is `Sync`-safe to mutate from multiple threads at once.

use std::marker::PhantomData;
use std::ops::{Deref, DerefMut};

use crate::bitset::BitSet;
use crate::cellarray::CellArray;
use crate::error::{Result, SketchError};
use crate::funnel::Funnel;
use crate::hash128::Hasher128;
use crate::strategy::HashStrategy;

/// Upper bound on `k` (number of hash positions per element). `count` and
/// the batched insert paths use a fixed-size stack buffer of this length
/// rather than allocating per call.
pub const MAX_K: u32 = 255;

/// Running counters for a filter's lifetime. Plain (non-atomic) fields:
/// the single-writer contract means there is never concurrent mutation to
/// race against.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct FilterMetrics {
    /// Number of single-element `insert` calls.
    pub inserts: u64,
    /// Number of elements inserted via a batched call (`insert_bag_batch` or
    /// `insert_set_batch`), counted per element, not per batch.
    pub batched_insertions: u64,
    /// Number of increment/add attempts that landed on a cell already at its
    /// saturation ceiling (the attempt left the cell unchanged).
    pub saturation_events: u64,
    /// Number of `insert_set_batch` flushes performed.
    pub flush_counts: u64,
    /// Number of `union` calls attempted (successful or not).
    pub union_calls: u64,
    /// Number of `might_contain` calls.
    pub membership_queries: u64,
    /// Number of `might_contain` calls that returned `true`.
    pub membership_hits: u64,
}

/// Computes `m`, the number of cells, from an expected insertion count `n`
/// and a target false-positive probability `p`.
///
/// `n == 0` is silently promoted to `1` (an empty filter still needs at
/// least one cell per hash position). `p` must lie strictly within `(0, 1)`.
///
/// # Errors
/// Returns [`SketchError::InvalidDimension`] if `p` is not in `(0, 1)`.
pub fn optimal_num_cells(n: u64, p: f64) -> Result<usize> {
    if !(p > 0.0 && p < 1.0) {
        return Err(SketchError::invalid_dimension(format!(
            "false-positive probability must be in (0, 1), got {p}"
        )));
    }
    let n = n.max(1) as f64;
    let m = -n * p.ln() / (std::f64::consts::LN_2 * std::f64::consts::LN_2);
    Ok((m.ceil() as usize).max(1))
}

/// Computes `k`, the number of hash positions per element, from the cell
/// count `m` and expected insertion count `n`. Always at least 1.
#[must_use]
pub fn optimal_num_hashes(m: usize, n: u64) -> u32 {
    let n = n.max(1) as f64;
    let k = (m as f64 / n) * std::f64::consts::LN_2;
    (k.round() as u32).max(1)
}

/// Shared state and read-only operations for the counting and spectral
/// filter facades. Not constructed directly by callers; see
/// [`CountingFilter::with_expected_insertions`] and
/// [`SpectralFilter::with_expected_insertions`].
#[derive(Debug, Clone)]
pub struct Filter<T: ?Sized, H, S, F> {
    m: usize,
    k: u32,
    strategy: S,
    funnel: F,
    hasher: H,
    cells: CellArray,
    tx_cache: BitSet,
    metrics: FilterMetrics,
    _marker: PhantomData<T>,
}

impl<T, H, S, F> Filter<T, H, S, F>
where
    T: ?Sized,
    H: Hasher128,
    S: HashStrategy,
    F: Funnel<T>,
{
    fn new_with_dimensions(
        m: usize,
        k: u32,
        bits_per_cell: u32,
        strategy: S,
        funnel: F,
        hasher: H,
    ) -> Result<Self> {
        if m == 0 {
            return Err(SketchError::invalid_dimension("cell count m must be > 0"));
        }
        if !(1..=MAX_K).contains(&k) {
            return Err(SketchError::invalid_dimension(format!(
                "hash count k must be in 1..={MAX_K}, got {k}"
            )));
        }
        Ok(Self {
            m,
            k,
            strategy,
            funnel,
            hasher,
            cells: CellArray::new(m, bits_per_cell)?,
            tx_cache: BitSet::new(m),
            metrics: FilterMetrics::default(),
            _marker: PhantomData,
        })
    }

    fn with_expected_insertions(
        expected_insertions: u64,
        false_positive_probability: f64,
        bits_per_cell: u32,
        strategy: S,
        funnel: F,
        hasher: H,
    ) -> Result<Self> {
        let m = optimal_num_cells(expected_insertions, false_positive_probability)?;
        let k = optimal_num_hashes(m, expected_insertions);
        Self::new_with_dimensions(m, k, bits_per_cell, strategy, funnel, hasher)
    }

    /// Number of cells, `m`.
    #[must_use]
    pub fn num_cells(&self) -> usize {
        self.m
    }

    /// Number of hash positions per element, `k`.
    #[must_use]
    pub fn num_hashes(&self) -> u32 {
        self.k
    }

    /// Bits per cell.
    #[must_use]
    pub fn bits_per_cell(&self) -> u32 {
        self.cells.bits_per_cell()
    }

    /// Number of non-zero cells.
    #[must_use]
    pub fn population_count(&self) -> usize {
        self.cells.population_count()
    }

    /// Clears every cell.
    pub fn clear(&mut self) {
        self.cells.clear();
        self.tx_cache.clear();
    }

    /// `true` iff every one of `value`'s `k` hashed positions is non-zero.
    /// Never false-negative; may false-positive.
    pub fn might_contain(&mut self, value: &T) -> bool {
        let mut positions = [0usize; MAX_K as usize];
        let k = self.k as usize;
        let cells = &self.cells;
        let found = self.strategy.might_contain(
            value,
            &self.funnel,
            &self.hasher,
            self.m,
            self.k,
            |p| cells.get(p) != 0,
            &mut positions[..k],
        );
        self.metrics.membership_queries += 1;
        if found {
            self.metrics.membership_hits += 1;
        }
        found
    }

    /// Estimated multiplicity: the minimum cell value among `value`'s `k`
    /// hashed positions. May overestimate due to collisions; never
    /// underestimates a value that was actually inserted that many times.
    #[must_use]
    pub fn count(&self, value: &T) -> u64 {
        let mut positions = [0usize; MAX_K as usize];
        let k = self.k as usize;
        self.strategy.count(
            value,
            &self.funnel,
            &self.hasher,
            self.m,
            self.k,
            |p| self.cells.get(p),
            &mut positions[..k],
        )
    }

    /// In-place cell-wise saturating union with `other`. Requires identical
    /// `m`, `k`, strategy ordinal, and bits-per-cell.
    ///
    /// # Errors
    /// Returns [`SketchError::Incompatible`] if the shapes differ.
    pub fn union(&mut self, other: &Self) -> Result<()> {
        self.metrics.union_calls += 1;
        self.require_compatible(other)?;
        self.cells.union(&other.cells)
    }

    /// `true` iff `self` and `other` share `m`, `k`, and strategy ordinal
    /// (and so can be unioned). Funnel and hasher identity are enforced at
    /// the type level and are not checked here.
    #[must_use]
    pub fn is_compatible(&self, other: &Self) -> bool {
        self.m == other.m
            && self.k == other.k
            && self.cells.bits_per_cell() == other.cells.bits_per_cell()
            && self.strategy.ordinal() == other.strategy.ordinal()
    }

    fn require_compatible(&self, other: &Self) -> Result<()> {
        if self.is_compatible(other) {
            Ok(())
        } else {
            Err(SketchError::incompatible(format!(
                "filter shape mismatch: (m={}, k={}, strategy={}) vs (m={}, k={}, strategy={})",
                self.m,
                self.k,
                self.strategy.ordinal(),
                other.m,
                other.k,
                other.strategy.ordinal()
            )))
        }
    }

    /// Estimate of the false-positive probability given `inserted` distinct
    /// elements so far: `(1 - e^{-k*inserted/m})^k`, the classic Bloom
    /// filter estimate applied to this structure's cell model.
    #[must_use]
    pub fn expected_fpp(&self, inserted: u64) -> f64 {
        let exponent = -(self.k as f64) * inserted as f64 / self.m as f64;
        (1.0 - exponent.exp()).powi(self.k as i32)
    }

    /// Snapshot of this filter's running counters.
    #[must_use]
    pub fn metrics(&self) -> FilterMetrics {
        self.metrics
    }

    /// Raw backing words of the cell array, for export.
    #[must_use]
    pub fn raw_words(&self) -> &[u64] {
        self.cells.raw_words()
    }

    /// Byte view (little-endian) of the backing cell words.
    #[must_use]
    pub fn as_bytes_le(&self) -> Vec<u8> {
        self.cells.as_bytes_le()
    }

    /// Rebinds the backing cell storage to externally supplied words. The
    /// word count must match `m` and `bits_per_cell` exactly.
    ///
    /// # Errors
    /// Returns [`SketchError::SizeMismatch`] if the word count differs.
    pub fn wrap_cells(&mut self, words: Box<[u64]>) -> Result<()> {
        self.cells.wrap(words)
    }
}

impl<T, H, S, F> PartialEq for Filter<T, H, S, F>
where
    T: ?Sized,
    H: Hasher128,
    S: HashStrategy,
    F: Funnel<T> + PartialEq,
{
    fn eq(&self, other: &Self) -> bool {
        self.m == other.m
            && self.k == other.k
            && self.strategy.ordinal() == other.strategy.ordinal()
            && self.funnel == other.funnel
            && self.cells == other.cells
    }
}

fn positions_for<T, H, S, F>(
    filter: &Filter<T, H, S, F>,
    value: &T,
    out: &mut [usize],
) where
    T: ?Sized,
    H: Hasher128,
    S: HashStrategy,
    F: Funnel<T>,
{
    filter
        .strategy
        .positions(value, &filter.funnel, &filter.hasher, filter.m, filter.k, out);
}

/// A counting Bloom filter: every insert increments all `k` hashed
/// positions, saturating at each cell's ceiling.
#[derive(Debug, Clone)]
pub struct CountingFilter<T: ?Sized, H, S, F> {
    inner: Filter<T, H, S, F>,
}

impl<T, H, S, F> CountingFilter<T, H, S, F>
where
    T: ?Sized,
    H: Hasher128,
    S: HashStrategy,
    F: Funnel<T>,
{
    /// Builds a counting filter sized for `expected_insertions` elements at
    /// a target false-positive probability `false_positive_probability`,
    /// with `bits_per_cell`-wide saturating counters.
    ///
    /// # Errors
    /// Returns [`SketchError::InvalidDimension`] if the false-positive
    /// target or bits-per-cell are out of range.
    pub fn with_expected_insertions(
        expected_insertions: u64,
        false_positive_probability: f64,
        bits_per_cell: u32,
        strategy: S,
        funnel: F,
        hasher: H,
    ) -> Result<Self> {
        Ok(Self {
            inner: Filter::with_expected_insertions(
                expected_insertions,
                false_positive_probability,
                bits_per_cell,
                strategy,
                funnel,
                hasher,
            )?,
        })
    }

    /// Inserts `value`, incrementing all `k` of its hashed cells. Returns
    /// `true` iff at least one cell actually changed value (i.e. wasn't
    /// already saturated).
    pub fn insert(&mut self, value: &T) -> bool {
        let mut positions = [0usize; MAX_K as usize];
        let k = self.inner.k as usize;
        positions_for(&self.inner, value, &mut positions[..k]);
        let mut changed = false;
        for &p in &positions[..k] {
            if self.inner.cells.increment(p) {
                changed = true;
            } else {
                self.inner.metrics.saturation_events += 1;
            }
        }
        self.inner.metrics.inserts += 1;
        changed
    }

    /// Inserts every `(element, delta)` pair of `values`, each `delta >= 1`,
    /// deduplicating each element's own `k` positions first (so a single
    /// element whose double-hashing happens to collide with itself
    /// contributes its `delta` at most once per distinct position, matching
    /// [`CountingFilter::insert`]'s own per-call behavior), then tallying
    /// deltas across the whole batch before applying one saturating add per
    /// touched cell.
    pub fn insert_bag_batch<'a, I>(&mut self, values: I)
    where
        T: 'a,
        I: IntoIterator<Item = (&'a T, u64)>,
    {
        let mut hits: Vec<(usize, u64)> = Vec::new();
        let mut buf = [0usize; MAX_K as usize];
        let k = self.inner.k as usize;
        let mut n = 0u64;
        for (value, delta) in values {
            positions_for(&self.inner, value, &mut buf[..k]);
            let deduped = dedup_sorted_prefix(&mut buf[..k]);
            hits.extend(deduped.iter().map(|&p| (p, delta)));
            n += 1;
        }
        hits.sort_unstable_by_key(|&(p, _)| p);
        let mut i = 0;
        while i < hits.len() {
            let p = hits[i].0;
            let mut delta_sum = 0u64;
            while i < hits.len() && hits[i].0 == p {
                delta_sum = delta_sum.saturating_add(hits[i].1);
                i += 1;
            }
            if delta_sum > 0 && !self.inner.cells.add(p, delta_sum) {
                self.inner.metrics.saturation_events += 1;
            }
        }
        self.inner.metrics.batched_insertions += n;
    }
}

/// Sorts `positions` in place and compacts it to its deduplicated prefix,
/// returning that prefix. Used to collapse within-element duplicate hash
/// positions (possible whenever `k` hash slots collide onto the same cell)
/// before a batched insert tallies hits across many elements.
fn dedup_sorted_prefix(positions: &mut [usize]) -> &[usize] {
    positions.sort_unstable();
    let mut write = 0;
    for read in 0..positions.len() {
        if write == 0 || positions[read] != positions[write - 1] {
            positions[write] = positions[read];
            write += 1;
        }
    }
    &positions[..write]
}

impl<T: ?Sized, H, S, F> Deref for CountingFilter<T, H, S, F> {
    type Target = Filter<T, H, S, F>;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

impl<T: ?Sized, H, S, F> DerefMut for CountingFilter<T, H, S, F> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.inner
    }
}

impl<T, H, S, F> PartialEq for CountingFilter<T, H, S, F>
where
    T: ?Sized,
    H: Hasher128,
    S: HashStrategy,
    F: Funnel<T> + PartialEq,
{
    fn eq(&self, other: &Self) -> bool {
        self.inner == other.inner
    }
}

/// A spectral Bloom filter: every insert increments only the hashed
/// positions currently holding the minimum value among the `k` candidates
/// (ties all increment together), keeping estimated counts closer to true
/// multiplicities than a plain counting filter under collision.
#[derive(Debug, Clone)]
pub struct SpectralFilter<T: ?Sized, H, S, F> {
    inner: Filter<T, H, S, F>,
}

impl<T, H, S, F> SpectralFilter<T, H, S, F>
where
    T: ?Sized,
    H: Hasher128,
    S: HashStrategy,
    F: Funnel<T>,
{
    /// Builds a spectral filter with the same sizing contract as
    /// [`CountingFilter::with_expected_insertions`].
    ///
    /// # Errors
    /// Returns [`SketchError::InvalidDimension`] if the false-positive
    /// target or bits-per-cell are out of range.
    pub fn with_expected_insertions(
        expected_insertions: u64,
        false_positive_probability: f64,
        bits_per_cell: u32,
        strategy: S,
        funnel: F,
        hasher: H,
    ) -> Result<Self> {
        Ok(Self {
            inner: Filter::with_expected_insertions(
                expected_insertions,
                false_positive_probability,
                bits_per_cell,
                strategy,
                funnel,
                hasher,
            )?,
        })
    }

    /// Inserts `value` under the minimum-increment rule: only cells tied
    /// for the lowest current value among the `k` candidates are
    /// incremented, each at most once even if it appears more than once
    /// among the `k` hashed positions. Returns `true` iff at least one cell
    /// changed.
    pub fn insert(&mut self, value: &T) -> bool {
        let mut positions = [0usize; MAX_K as usize];
        let mut min_buf = [0usize; MAX_K as usize];
        let k = self.inner.k as usize;
        let count = {
            let cells = &self.inner.cells;
            self.inner.strategy.min_positions(
                value,
                &self.inner.funnel,
                &self.inner.hasher,
                self.inner.m,
                self.inner.k,
                |p| cells.get(p),
                &mut positions[..k],
                &mut min_buf[..k],
            )
        };
        let deduped = dedup_sorted_prefix(&mut min_buf[..count]);
        let mut changed = false;
        for &p in deduped {
            if self.inner.cells.increment(p) {
                changed = true;
            } else {
                self.inner.metrics.saturation_events += 1;
            }
        }
        self.inner.metrics.inserts += 1;
        changed
    }

    /// Inserts every element of `values` as a deduplicated set: every
    /// position hashed to by at least one element in the batch is
    /// incremented exactly once, regardless of how many elements mapped to
    /// it or whether it was each element's individual minimum. This is a
    /// conservative (upper-bound) approximation of applying
    /// [`SpectralFilter::insert`] once per element, trading exactness for a
    /// single linear pass with no per-element minimum recomputation.
    pub fn insert_set_batch<'a, I>(&mut self, values: I)
    where
        T: 'a,
        I: IntoIterator<Item = &'a T>,
    {
        self.inner.tx_cache.clear();
        let mut buf = [0usize; MAX_K as usize];
        let k = self.inner.k as usize;
        let mut n = 0u64;
        for value in values {
            positions_for(&self.inner, value, &mut buf[..k]);
            for &p in &buf[..k] {
                self.inner.tx_cache.set(p);
            }
            n += 1;
        }
        self.flush_set_batch();
        self.inner.metrics.batched_insertions += n;
    }

    fn flush_set_batch(&mut self) {
        self.inner.metrics.flush_counts += 1;
        let tx_cache = &mut self.inner.tx_cache;
        let cells = &mut self.inner.cells;
        let mut saturated = 0u64;
        for p in tx_cache.clearing_iterator() {
            if !cells.increment(p) {
                saturated += 1;
            }
        }
        self.inner.metrics.saturation_events += saturated;
    }
}

impl<T: ?Sized, H, S, F> Deref for SpectralFilter<T, H, S, F> {
    type Target = Filter<T, H, S, F>;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

impl<T: ?Sized, H, S, F> DerefMut for SpectralFilter<T, H, S, F> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.inner
    }
}

impl<T, H, S, F> PartialEq for SpectralFilter<T, H, S, F>
where
    T: ?Sized,
    H: Hasher128,
    S: HashStrategy,
    F: Funnel<T> + PartialEq,
{
    fn eq(&self, other: &Self) -> bool {
        self.inner == other.inner
    }
}
