// Tests for concurrent access scenarios.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Barrier};
use std::thread;
use std::time::Duration;

use crate::support::{budget_only, settle};
use crate::{Lifetime, ManagedMap};

/// Simultaneous readers against a budget of one: exactly one wins.
#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_concurrent_reads_single_success() {
    const READERS: usize = 8;
    let map = ManagedMap::new();

    for round in 0..100u32 {
        map.put(round, round).unwrap();

        let barrier = Arc::new(Barrier::new(READERS));
        let hits = Arc::new(AtomicUsize::new(0));
        let handles: Vec<_> = (0..READERS)
            .map(|_| {
                let map = map.clone();
                let barrier = Arc::clone(&barrier);
                let hits = Arc::clone(&hits);
                thread::spawn(move || {
                    barrier.wait();
                    if map.get(&round).unwrap().is_some() {
                        hits.fetch_add(1, Ordering::SeqCst);
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().expect("reader panicked");
        }

        assert_eq!(hits.load(Ordering::SeqCst), 1, "round {round}");
    }

    assert_eq!(settle(&map, 0).await, 0);
    assert_eq!(map.stats().expired_budget, 100);
    map.close().await.unwrap();
}

/// Concurrent budgeted reads never over-serve: total hits equal the budget.
#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_concurrent_reads_respect_budget() {
    const READERS: usize = 8;
    const BUDGET: u64 = 1_000;

    let map = ManagedMap::with_lifetime(budget_only(BUDGET));
    map.put("k", 1).unwrap();

    let hits = Arc::new(AtomicUsize::new(0));
    let handles: Vec<_> = (0..READERS)
        .map(|_| {
            let map = map.clone();
            let hits = Arc::clone(&hits);
            thread::spawn(move || {
                for _ in 0..BUDGET {
                    if map.get("k").unwrap().is_some() {
                        hits.fetch_add(1, Ordering::Relaxed);
                    }
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().expect("reader panicked");
    }

    assert_eq!(hits.load(Ordering::Relaxed) as u64, BUDGET);
    assert_eq!(settle(&map, 0).await, 0);
    map.close().await.unwrap();
}

/// Concurrent first writes of the same key create a single entry.
#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_concurrent_writes_same_key() {
    let map = ManagedMap::with_lifetime(Lifetime::unbounded());
    let handles: Vec<_> = (0..10)
        .map(|writer| {
            let map = map.clone();
            thread::spawn(move || {
                for i in 0..100 {
                    map.put("contested", format!("writer{writer}:{i}")).unwrap();
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().expect("writer panicked");
    }

    assert_eq!(map.size().unwrap(), 1);
    let stats = map.stats();
    assert_eq!(stats.inserts, 1);
    assert_eq!(stats.updates, 999);
    assert_eq!(map.watcher_refs(), 1);
    map.close().await.unwrap();
}

/// Readers, writers and removers running together leave a consistent map.
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_mixed_workload_is_consistent() {
    let map = ManagedMap::with_lifetime(Lifetime::new(Duration::from_millis(20), 3));

    let mut tasks = Vec::new();
    for worker in 0..4u64 {
        let map = map.clone();
        tasks.push(tokio::spawn(async move {
            for i in 0..200u64 {
                let key = (worker * 7 + i) % 50;
                map.put(key, i).unwrap();
                let _ = map.get(&key).unwrap();
                if i % 10 == 0 {
                    map.remove(&key).await.unwrap();
                }
                tokio::task::yield_now().await;
            }
        }));
    }
    for task in tasks {
        task.await.unwrap();
    }

    tokio::time::sleep(Duration::from_millis(25)).await;
    assert_eq!(settle(&map, 0).await, 0);

    let stats = map.stats();
    assert_eq!(stats.inserts, stats.evicted());
    map.close().await.unwrap();
    assert_eq!(map.watcher_refs(), 0);
}
