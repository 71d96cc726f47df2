//! Lookup benchmarks comparing the two corpus store backends.
//!
//! Run with: `cargo bench`
//! Save baseline: `cargo bench -- --save-baseline main`
//! Compare: `cargo bench -- --baseline main`

use criterion::{Criterion, criterion_group, criterion_main};
use needle::corpus::{CorpusStore, MappedStore, SetStore};
use std::fmt::Write as _;
use std::hint::black_box;
use std::path::PathBuf;

const LINES: usize = 200_000;

/// Generate a corpus of distinct payload lines and return its path.
/// The TempDir must stay alive for the duration of the benchmark.
fn generate_corpus() -> (tempfile::TempDir, PathBuf) {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let path = dir.path().join("bench-corpus.txt");

    let mut content = String::with_capacity(LINES * 32);
    for i in 0..LINES {
        writeln!(content, "payload-line-{i:08}-with-some-width").unwrap();
    }
    std::fs::write(&path, content).expect("Failed to write bench corpus");

    (dir, path)
}

fn bench_set_store(c: &mut Criterion) {
    let (_dir, path) = generate_corpus();
    let store = SetStore::new(path);
    store.refresh().unwrap();

    let hit = format!("payload-line-{:08}-with-some-width", LINES / 2);

    let mut group = c.benchmark_group("set_store");
    group.bench_function("hit", |b| {
        b.iter(|| store.contains(black_box(hit.as_bytes())).unwrap())
    });
    group.bench_function("miss", |b| {
        b.iter(|| store.contains(black_box(b"absent-line".as_slice())).unwrap())
    });
    group.finish();
}

fn bench_mapped_store(c: &mut Criterion) {
    let (_dir, path) = generate_corpus();
    let store = MappedStore::new(path);
    store.refresh().unwrap();

    // Worst case for the scan: a hit near the end of the mapping
    let hit = format!("payload-line-{:08}-with-some-width", LINES - 1);

    let mut group = c.benchmark_group("mapped_store");
    group.sample_size(20);
    group.bench_function("hit_near_end", |b| {
        b.iter(|| store.contains(black_box(hit.as_bytes())).unwrap())
    });
    group.bench_function("miss", |b| {
        b.iter(|| store.contains(black_box(b"absent-line".as_slice())).unwrap())
    });
    group.finish();
}

criterion_group!(benches, bench_set_store, bench_mapped_store);
criterion_main!(benches);
