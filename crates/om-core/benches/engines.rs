use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use rand::{Rng, SeedableRng};
use rand::rngs::StdRng;

use om_core::{
    carve, compare_with_limit, compute_entropy_profile, extract_strings, find_all,
    scan_text_patterns, Analyzer,
};

const SIZES: &[(usize, &str)] = &[
    (64 << 10, "64KB"),
    (1 << 20, "1MB"),
    (8 << 20, "8MB"),
];

/// Mixed content: random noise, text runs and an embedded JPEG every 64 KB.
fn mixed_buffer(size: usize) -> Vec<u8> {
    let mut rng = StdRng::seed_from_u64(0x0DD5_EED5);
    let mut data = vec![0u8; size];
    rng.fill(&mut data[..]);

    let text = b"GET http://10.0.0.5/index.html user=admin@example.com ";
    let jpeg = [0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10, 0x4A, 0x46, 0x49, 0x46, 0xFF, 0xD9];
    let mut pos = 0;
    while pos + 4096 < size {
        data[pos..pos + text.len()].copy_from_slice(text);
        if pos % (64 << 10) == 0 {
            data[pos + 1024..pos + 1024 + jpeg.len()].copy_from_slice(&jpeg);
        }
        pos += 4096;
    }
    data
}

// ============================================================================
// Entropy: block sweep (parallel past 1 MiB)
// ============================================================================

fn bench_entropy(c: &mut Criterion) {
    let mut group = c.benchmark_group("entropy_profile");

    for &(size, label) in SIZES {
        let data = mixed_buffer(size);
        group.throughput(Throughput::Bytes(size as u64));

        for block_size in [256usize, 4096] {
            group.bench_with_input(
                BenchmarkId::new(format!("block_{block_size}"), label),
                &data,
                |b, data| {
                    b.iter(|| std::hint::black_box(compute_entropy_profile(data, block_size)));
                },
            );
        }
    }

    group.finish();
}

// ============================================================================
// Strings and text patterns
// ============================================================================

fn bench_strings(c: &mut Criterion) {
    let mut group = c.benchmark_group("strings");

    for &(size, label) in SIZES {
        let data = mixed_buffer(size);
        group.throughput(Throughput::Bytes(size as u64));

        group.bench_with_input(BenchmarkId::new("extract", label), &data, |b, data| {
            b.iter(|| std::hint::black_box(extract_strings(data, 4)));
        });

        group.bench_with_input(BenchmarkId::new("text_patterns", label), &data, |b, data| {
            b.iter(|| std::hint::black_box(scan_text_patterns(data)));
        });
    }

    group.finish();
}

// ============================================================================
// Signature search and carving
// ============================================================================

fn bench_carving(c: &mut Criterion) {
    let mut group = c.benchmark_group("carving");

    for &(size, label) in SIZES {
        let data = mixed_buffer(size);
        group.throughput(Throughput::Bytes(size as u64));

        group.bench_with_input(BenchmarkId::new("carve", label), &data, |b, data| {
            b.iter(|| std::hint::black_box(carve(data)));
        });

        group.bench_with_input(BenchmarkId::new("find_all_jpeg_soi", label), &data, |b, data| {
            b.iter(|| std::hint::black_box(find_all(data, &[0xFF, 0xD8, 0xFF])));
        });
    }

    group.finish();
}

// ============================================================================
// Positional diff
// ============================================================================

fn bench_compare(c: &mut Criterion) {
    let mut group = c.benchmark_group("compare");

    for &(size, label) in SIZES {
        let a = mixed_buffer(size);
        let mut b = a.clone();
        // one changed byte per KB
        for i in (0..b.len()).step_by(1024) {
            b[i] ^= 0xFF;
        }
        group.throughput(Throughput::Bytes(size as u64));

        group.bench_function(BenchmarkId::new("limit_1000", label), |bench| {
            bench.iter(|| std::hint::black_box(compare_with_limit(&a, &b, 1000)));
        });
    }

    group.finish();
}

// ============================================================================
// Full analyzer
// ============================================================================

fn bench_analyze(c: &mut Criterion) {
    let mut group = c.benchmark_group("analyze");
    group.sample_size(20);
    let analyzer = Analyzer::default();

    for &(size, label) in SIZES {
        let data = mixed_buffer(size);
        group.throughput(Throughput::Bytes(size as u64));

        group.bench_with_input(BenchmarkId::new("all_stages", label), &data, |b, data| {
            b.iter(|| std::hint::black_box(analyzer.analyze(data)));
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_entropy,
    bench_strings,
    bench_carving,
    bench_compare,
    bench_analyze,
);
criterion_main!(benches);
