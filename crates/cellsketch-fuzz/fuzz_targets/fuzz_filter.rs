#![no_main]

use cellsketch_core::{CountingFilter, Murmur3X64128, U64Funnel, V64Strategy};
use libfuzzer_sys::fuzz_target;

// Each 8-byte chunk of the input is interpreted as a u64 element and
// inserted. The no-false-negative invariant (every inserted element must
// test positive) must hold regardless of which elements collide.
fuzz_target!(|data: &[u8]| {
    let Ok(mut f) = CountingFilter::with_expected_insertions(
        1000,
        0.05,
        6,
        V64Strategy,
        U64Funnel,
        Murmur3X64128::new(),
    ) else {
        return;
    };

    let mut inserted = Vec::new();
    for chunk in data.chunks_exact(8) {
        let v = u64::from_le_bytes(chunk.try_into().unwrap());
        f.insert(&v);
        inserted.push(v);
    }

    for v in inserted {
        assert!(f.might_contain(&v));
    }
});
