#![no_main]

use cellsketch_core::BitSet;
use libfuzzer_sys::fuzz_target;

// Each input byte sets one bit (mod len). The clearing iterator must then
// drain exactly the set of distinct indices touched, in ascending order,
// and leave the set fully empty.
fuzz_target!(|data: &[u8]| {
    let len = 256usize;
    let mut bs = BitSet::new(len);
    let mut expected = std::collections::BTreeSet::new();

    for &byte in data {
        let idx = byte as usize % len;
        bs.set(idx);
        expected.insert(idx);
    }

    let drained: Vec<usize> = bs.clearing_iterator().collect();
    let expected: Vec<usize> = expected.into_iter().collect();
    assert_eq!(drained, expected);
    assert_eq!(bs.population_count(), 0);
});
