use cellsketch_core::{CountingFilter, Murmur3X64128, SpectralFilter, U64Funnel, V64Strategy};
use criterion::{black_box, criterion_group, criterion_main, Criterion};

fn bench_counting_insert(c: &mut Criterion) {
    c.bench_function("counting_filter_insert_u64", |b| {
        let mut f = CountingFilter::with_expected_insertions(
            100_000,
            0.01,
            8,
            V64Strategy,
            U64Funnel,
            Murmur3X64128::new(),
        )
        .unwrap();
        let mut i = 0u64;
        b.iter(|| {
            f.insert(black_box(&i));
            i = i.wrapping_add(1);
        });
    });
}

fn bench_spectral_insert(c: &mut Criterion) {
    c.bench_function("spectral_filter_insert_u64", |b| {
        let mut f = SpectralFilter::with_expected_insertions(
            100_000,
            0.01,
            8,
            V64Strategy,
            U64Funnel,
            Murmur3X64128::new(),
        )
        .unwrap();
        let mut i = 0u64;
        b.iter(|| {
            f.insert(black_box(&i));
            i = i.wrapping_add(1);
        });
    });
}

fn bench_might_contain(c: &mut Criterion) {
    let mut f = CountingFilter::with_expected_insertions(
        100_000,
        0.01,
        8,
        V64Strategy,
        U64Funnel,
        Murmur3X64128::new(),
    )
    .unwrap();
    for i in 0..100_000u64 {
        f.insert(&i);
    }
    c.bench_function("counting_filter_might_contain_hit", |b| {
        let mut i = 0u64;
        b.iter(|| {
            let hit = f.might_contain(black_box(&i));
            i = (i + 1) % 100_000;
            hit
        });
    });
}

criterion_group!(benches, bench_counting_insert, bench_spectral_insert, bench_might_contain);
criterion_main!(benches);
