#![no_main]

use cellsketch_core::CellArray;
use libfuzzer_sys::fuzz_target;

// Byte stream: first byte picks bits_per_cell (1..=31), remaining bytes are
// (index_byte, delta_byte) pairs driving `add`. The invariant checked is
// that every cell's tracked value never exceeds its saturation ceiling and
// that `get` after `add` reflects a saturating accumulation, independent of
// how the deltas are grouped.
fuzz_target!(|data: &[u8]| {
    if data.is_empty() {
        return;
    }
    let bits_per_cell = (data[0] % 31) + 1;
    let len = 64usize;
    let Ok(mut arr) = CellArray::new(len, bits_per_cell) else {
        return;
    };
    let ceiling = arr.cell_mask();

    for pair in data[1..].chunks_exact(2) {
        let idx = pair[0] as usize % len;
        let delta = pair[1] as u64;
        arr.add(idx, delta);
        assert!(arr.get(idx) <= ceiling);
    }

    let population = arr.population_count();
    let drained: usize = arr.clearing_cursor().count();
    assert_eq!(population, drained);
    assert_eq!(arr.population_count(), 0);
});
