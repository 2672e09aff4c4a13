use criterion::{black_box, criterion_group, criterion_main, Criterion};

use gcplogs::timestamp::{append_rfc3339_fixed_nanos, append_unix_fixed_nanos};
use gcplogs::{format_rfc3339_fixed_nanos, format_unix_fixed_nanos, Instant, MinuteCache};

/// 2019-02-23T18:57:14.358873000Z
fn bench_instant() -> Instant {
    Instant::new(1550948234, 358873000).unwrap()
}

fn bench_format(c: &mut Criterion) {
    let mut group = c.benchmark_group("time_format");
    let now = bench_instant();

    group.bench_function("unix_fixed_nanos", |b| {
        b.iter(|| format_unix_fixed_nanos(black_box(now)))
    });

    group.bench_function("rfc3339_fixed_nanos", |b| {
        b.iter(|| format_rfc3339_fixed_nanos(black_box(now)))
    });

    // Same instant every iteration: every call after the first hits the cache.
    group.bench_function("rfc3339_minute_cache", |b| {
        let mut cache = MinuteCache::new();
        b.iter(|| cache.format_rfc3339(black_box(now)))
    });

    group.finish();
}

fn bench_append(c: &mut Criterion) {
    let mut group = c.benchmark_group("time_append");
    let now = bench_instant();

    group.bench_function("unix_fixed_nanos", |b| {
        let mut buf = String::with_capacity(64);
        b.iter(|| {
            buf.clear();
            append_unix_fixed_nanos(&mut buf, black_box(now));
            buf.len()
        })
    });

    group.bench_function("rfc3339_fixed_nanos", |b| {
        let mut buf = String::with_capacity(64);
        b.iter(|| {
            buf.clear();
            append_rfc3339_fixed_nanos(&mut buf, black_box(now));
            buf.len()
        })
    });

    group.bench_function("rfc3339_minute_cache", |b| {
        let mut cache = MinuteCache::new();
        let mut buf = String::with_capacity(64);
        b.iter(|| {
            buf.clear();
            cache.append_rfc3339(&mut buf, black_box(now));
            buf.len()
        })
    });

    group.finish();
}

criterion_group!(benches, bench_format, bench_append);
criterion_main!(benches);
