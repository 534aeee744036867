use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use lrucache::LruCache;

fn filled(capacity: u64, count: u64) -> LruCache<u64, Vec<u8>> {
    let data = vec![b'x'; 1024];
    LruCache::with_entries(capacity as usize, (0..count).map(|id| (id, data.clone())))
}

fn bench_cached_lookup(c: &mut Criterion) {
    let mut group = c.benchmark_group("cached_lookup");
    group.sample_size(50);
    group.throughput(Throughput::Elements(1));

    group.bench_function("lookup_1kb_hit", |b| {
        let cache = filled(1000, 100);

        let mut counter = 0u64;
        b.iter(|| {
            black_box(cache.lookup(&(counter % 100)).ok());
            counter += 1;
        });
    });

    group.bench_function("lookup_repeated_key", |b| {
        let cache = filled(1000, 100);

        // Same key every time; served from the last-accessed slot
        b.iter(|| {
            black_box(cache.lookup(&42).ok());
        });
    });

    group.finish();
}

fn bench_mixed_50_50(c: &mut Criterion) {
    let mut group = c.benchmark_group("mixed");
    group.sample_size(50);
    group.throughput(Throughput::Elements(1));

    group.bench_function("50_read_50_write", |b| {
        let mut cache = filled(1000, 100);
        let data = vec![b'x'; 1024];

        let mut counter = 0u64;
        b.iter(|| {
            if counter % 2 == 0 {
                black_box(cache.get(&(counter % 100)));
            } else {
                black_box(cache.insert(counter, data.clone()));
            }
            counter += 1;
        });
    });

    group.finish();
}

fn bench_evicting_insert(c: &mut Criterion) {
    let mut group = c.benchmark_group("evicting_insert");
    group.sample_size(50);
    group.throughput(Throughput::Elements(1));

    group.bench_function("insert_1kb_full", |b| {
        // Small cache; every insert evicts
        let mut cache = filled(10, 10);
        let data = vec![b'x'; 1024];

        let mut counter = 10u64;
        b.iter(|| {
            black_box(cache.insert(counter, data.clone()));
            counter += 1;
        });
    });

    group.finish();
}

fn bench_cache_miss(c: &mut Criterion) {
    let mut group = c.benchmark_group("cache_miss");
    group.sample_size(50);
    group.throughput(Throughput::Elements(1));

    group.bench_function("lookup_miss", |b| {
        let cache = filled(10, 100);

        let mut counter = 0u64;
        b.iter(|| {
            // Only ids 90..100 survive
            black_box(cache.lookup(&(counter % 90)).ok());
            counter += 1;
        });
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_cached_lookup,
    bench_mixed_50_50,
    bench_evicting_insert,
    bench_cache_miss
);
criterion_main!(benches);
