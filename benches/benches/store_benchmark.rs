//! Record codec, offset search and synchronization benchmarks.
//!
//! Run with: `cargo bench --package fxhist-bench`

use criterion::{BatchSize, BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use fxhist_lib::prelude::*;
use fxhist_bench::{START, m1_days};
use fxhist_lib::{BarCodec, search};
use std::hint::black_box;
use tempfile::TempDir;

fn codec_benchmark(c: &mut Criterion) {
    let bars = m1_days(5);
    let mut group = c.benchmark_group("codec");
    group.throughput(Throughput::Elements(bars.len() as u64));

    for version in [FormatVersion::V400, FormatVersion::V401] {
        let codec = BarCodec::for_version(version);
        let mut data = Vec::with_capacity(bars.len() * codec.record_size());
        for bar in &bars {
            codec.encode_into(bar, &mut data).unwrap();
        }

        group.bench_with_input(BenchmarkId::new("encode", version), &bars, |b, bars| {
            b.iter(|| {
                let mut out = Vec::with_capacity(data.len());
                for bar in bars {
                    codec.encode_into(bar, &mut out).unwrap();
                }
                out
            });
        });
        group.bench_with_input(BenchmarkId::new("decode", version), &data, |b, data| {
            b.iter(|| codec.decode_all(black_box(data)).unwrap().count());
        });
    }
    group.finish();
}

fn search_benchmark(c: &mut Criterion) {
    let bars = m1_days(250);
    let last = bars[bars.len() - 1].open_time;

    c.bench_function("search/exact", |b| {
        let mut time = START;
        b.iter(|| {
            time = if time >= last { START } else { time + 7 * 60 };
            search::find_exact(bars.as_slice(), black_box(time))
        });
    });
    c.bench_function("search/floor-between-bars", |b| {
        b.iter(|| search::find_floor(bars.as_slice(), black_box(last - 30)));
    });
}

fn synchronize_benchmark(c: &mut Criterion) {
    let day = m1_days(1);
    let mut group = c.benchmark_group("synchronize");
    group.sample_size(20);
    group.throughput(Throughput::Elements(day.len() as u64));

    group.bench_function("one-day-all-periods", |b| {
        b.iter_batched(
            || {
                let dir = TempDir::new().unwrap();
                let set = HistorySet::create(dir.path(), "EURUSD", 5, FormatVersion::V400, Period::all())
                    .unwrap();
                (dir, set)
            },
            |(dir, mut set)| {
                set.synchronize(&day).unwrap();
                set.close().unwrap();
                dir
            },
            BatchSize::PerIteration,
        );
    });
    group.finish();
}

criterion_group!(benches, codec_benchmark, search_benchmark, synchronize_benchmark);
criterion_main!(benches);
