use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use managedmap::{Lifetime, ManagedMap};
use std::time::Duration;
use tokio::runtime::Runtime;

const KEYS: u64 = 1_000;

fn runtime() -> Runtime {
    tokio::runtime::Builder::new_multi_thread()
        .worker_threads(2)
        .enable_time()
        .build()
        .unwrap()
}

fn filled(rt: &Runtime, lifetime: Lifetime) -> ManagedMap<u64, u64> {
    let map = ManagedMap::with_handle(lifetime, rt.handle().clone());
    for key in 0..KEYS {
        map.put(key, key).unwrap();
    }
    map
}

fn bench_reads(c: &mut Criterion) {
    let rt = runtime();
    let map = filled(&rt, Lifetime::unbounded());

    let mut group = c.benchmark_group("reads");
    group.throughput(Throughput::Elements(KEYS));
    group.bench_function("get_unbounded_budget", |b| {
        b.iter(|| {
            for key in 0..KEYS {
                black_box(map.get(&key).unwrap());
            }
        });
    });
    group.bench_function("has", |b| {
        b.iter(|| {
            for key in 0..KEYS {
                black_box(map.has(&key).unwrap());
            }
        });
    });
    group.finish();

    rt.block_on(map.close()).unwrap();
}

fn bench_writes(c: &mut Criterion) {
    let rt = runtime();
    let map = filled(&rt, Lifetime::new(Duration::from_secs(3600), 0));

    let mut group = c.benchmark_group("writes");
    group.throughput(Throughput::Elements(KEYS));
    // Live keys are updated in place, no watcher is spawned.
    group.bench_function("put_update", |b| {
        b.iter(|| {
            for key in 0..KEYS {
                map.put(key, black_box(key + 1)).unwrap();
            }
        });
    });
    group.finish();

    rt.block_on(map.close()).unwrap();
}

fn bench_lifecycle(c: &mut Criterion) {
    let rt = runtime();

    let mut group = c.benchmark_group("lifecycle");
    group.sample_size(20);
    group.throughput(Throughput::Elements(KEYS));
    // Insert spawns a watcher, remove joins it.
    group.bench_function("put_remove", |b| {
        let map = ManagedMap::with_handle(Lifetime::unbounded(), rt.handle().clone());
        b.iter(|| {
            rt.block_on(async {
                for key in 0..KEYS {
                    map.put(key, key).unwrap();
                }
                for key in 0..KEYS {
                    map.remove(&key).await.unwrap();
                }
            });
        });
        rt.block_on(map.close()).unwrap();
    });
    group.finish();
}

criterion_group!(benches, bench_reads, bench_writes, bench_lifecycle);
criterion_main!(benches);
