//! Seeded scenario tests exercising the crate's components the way a
//! long-running transactional cache would: repeated random insert/clear
//! cycles, checked against invariants that must hold regardless of which
//! positions happened to get hashed.

mod common;

use cellsketch_core::{
    BitSet, CellArray, CountingFilter, Murmur3X64128, SpectralFilter, U64Funnel, V64Strategy,
};
use common::Xorshift64;

/// S1: a `BitSet` driven by 1000 random set operations must yield exactly
/// its set bits, in ascending order, via the clearing iterator, and end up
/// fully drained.
#[test]
fn s1_bitset_clearing_iterator_random_drive() {
    let mut rng = Xorshift64::new(1);
    let mut bs = BitSet::new(10_000);
    let mut expected = std::collections::BTreeSet::new();

    for _ in 0..1000 {
        let idx = rng.next_below(10_000) as usize;
        bs.set(idx);
        expected.insert(idx);
    }

    assert_eq!(bs.population_count(), expected.len());
    let drained: Vec<usize> = bs.clearing_iterator().collect();
    let expected: Vec<usize> = expected.into_iter().collect();
    assert_eq!(drained, expected);
    assert_eq!(bs.population_count(), 0);
}

/// S2: a `CellArray` of 1000 7-bit cells must round-trip a single
/// deterministic sequential write pass without corrupting neighboring
/// cells, even though 7 does not divide 64. Cell 999 is deliberately left
/// untouched by the `0..999` pass, so it also checks that writing every
/// other cell in the array doesn't leak into a cell nobody wrote.
#[test]
fn s2_cellarray_round_trip() {
    let mut rng = Xorshift64::new(42);
    let mut arr = CellArray::new(1000, 7).unwrap();
    let mut model = vec![0u64; 1000];

    for i in 0..999 {
        let value = rng.next_u64() & 0x7F;
        arr.add(i, value);
        model[i] = value;
    }

    for i in 0..1000 {
        assert_eq!(arr.get(i), model[i], "cell {i} mismatch");
    }
}

/// S3: a freshly sized counting filter (b=4, n=10, p=0.01) must recognize
/// every element it was given and hold no false negatives.
#[test]
fn s3_counting_filter_basic() {
    let mut f = CountingFilter::with_expected_insertions(
        10,
        0.01,
        4,
        V64Strategy,
        U64Funnel,
        Murmur3X64128::new(),
    )
    .unwrap();

    for v in 0..10u64 {
        f.insert(&v);
    }
    for v in 0..10u64 {
        assert!(f.might_contain(&v), "false negative for {v}");
        assert!(f.count(&v) >= 1);
    }
}

/// S4: a spectral filter (b=7, n=100, p=0.1) driven by 100k single-element
/// inserts across a fixed population of 100 keys must never report a false
/// negative for a key it actually inserted, and every tracked count must
/// never exceed the cell ceiling.
#[test]
fn s4_spectral_single_put_large() {
    let mut rng = Xorshift64::new(42);
    let mut f = SpectralFilter::with_expected_insertions(
        100,
        0.1,
        7,
        V64Strategy,
        U64Funnel,
        Murmur3X64128::new(),
    )
    .unwrap();

    let mut true_counts = vec![0u64; 100];
    for _ in 0..100_000 {
        let key = rng.next_below(100);
        f.insert(&key);
        true_counts[key as usize] += 1;
    }

    let ceiling = (1u64 << 7) - 1;
    for key in 0..100u64 {
        assert!(f.might_contain(&key), "false negative for {key}");
        let estimate = f.count(&key);
        assert!(estimate <= ceiling);
        if true_counts[key as usize] > 0 {
            assert!(estimate >= 1, "spectral estimate underflowed for {key}");
        }
    }
}

/// S5: set-batch insert into a wide-celled (b=31) spectral filter, applied
/// across 100k rounds of random 100-element subsets, must still report
/// every previously-batched key as present, never panic on a ceiling
/// that's effectively unreachable at this width, and never report a count
/// higher than the number of batches that actually contained the key (the
/// "upper bound by insertions" property: `count(x) <= R` for `R` batches).
#[test]
fn s5_spectral_set_batch_bound() {
    let mut rng = Xorshift64::new(7);
    let mut f = SpectralFilter::with_expected_insertions(
        100,
        0.1,
        31,
        V64Strategy,
        U64Funnel,
        Murmur3X64128::new(),
    )
    .unwrap();

    let mut ever_inserted = vec![false; 100];
    let mut batches_containing = vec![0u64; 100];
    for _ in 0..100_000 {
        let mut seen_this_round = [false; 100];
        let mut batch = Vec::with_capacity(100);
        for _ in 0..100 {
            let key = rng.next_below(100);
            batch.push(key);
            ever_inserted[key as usize] = true;
            if !seen_this_round[key as usize] {
                seen_this_round[key as usize] = true;
                batches_containing[key as usize] += 1;
            }
        }
        f.insert_set_batch(batch.iter());
    }

    for key in 0..100u64 {
        if ever_inserted[key as usize] {
            assert!(f.might_contain(&key), "false negative for {key}");
        }
        let estimate = f.count(&key);
        assert!(
            estimate <= batches_containing[key as usize],
            "count({key}) = {estimate} exceeds the {} batches it appeared in",
            batches_containing[key as usize]
        );
    }
}

/// S6: unioning two independently built and seeded spectral filters must
/// preserve membership of everything inserted into either side.
#[test]
fn s6_spectral_union_of_independent_filters() {
    let mut rng_a = Xorshift64::new(11);
    let mut rng_b = Xorshift64::new(22);

    let mut a = SpectralFilter::with_expected_insertions(
        50,
        0.05,
        6,
        V64Strategy,
        U64Funnel,
        Murmur3X64128::new(),
    )
    .unwrap();
    let mut b = SpectralFilter::with_expected_insertions(
        50,
        0.05,
        6,
        V64Strategy,
        U64Funnel,
        Murmur3X64128::new(),
    )
    .unwrap();

    let keys_a: Vec<u64> = (0..200).map(|_| rng_a.next_below(1_000_000)).collect();
    let keys_b: Vec<u64> = (0..200).map(|_| rng_b.next_below(1_000_000)).collect();

    for k in &keys_a {
        a.insert(k);
    }
    for k in &keys_b {
        b.insert(k);
    }

    a.union(&b).unwrap();

    for k in keys_a.iter().chain(keys_b.iter()) {
        assert!(a.might_contain(k), "lost membership for {k} after union");
    }
}
