//! Concurrent load generator that exercises a managed map end to end.

use rand::Rng;
use std::time::Duration;
use tokio::task::JoinSet;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::{ManagedMap, MapError};

/// Shape of a soak run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SoakConfig {
    pub writers: usize,
    pub readers: usize,
    pub removers: usize,
    /// Keys are drawn uniformly from `0..keys`.
    pub keys: u64,
    pub duration: Duration,
    pub report_interval: Duration,
    pub close_timeout: Duration,
}

impl Default for SoakConfig {
    fn default() -> Self {
        Self {
            writers: 4,
            readers: 8,
            removers: 1,
            keys: 10_000,
            duration: Duration::from_secs(30),
            report_interval: Duration::from_secs(5),
            close_timeout: Duration::from_secs(10),
        }
    }
}

/// Operations performed by a soak run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SoakReport {
    pub writes: u64,
    pub reads: u64,
    pub removes: u64,
}

impl SoakReport {
    fn merge(&mut self, other: SoakReport) {
        self.writes += other.writes;
        self.reads += other.reads;
        self.removes += other.removes;
    }
}

#[derive(Debug, Clone, Copy)]
enum Role {
    Writer,
    Reader,
    Remover,
}

/// Drives `map` with the configured workers until `cfg.duration` elapses,
/// `shutdown_token` is cancelled, or the map is closed underneath.
pub async fn run(
    map: ManagedMap<u64, u64>,
    cfg: &SoakConfig,
    shutdown_token: CancellationToken,
) -> SoakReport {
    let deadline = Instant::now() + cfg.duration;
    let keys = cfg.keys.max(1);

    let roles = std::iter::repeat(Role::Writer)
        .take(cfg.writers)
        .chain(std::iter::repeat(Role::Reader).take(cfg.readers))
        .chain(std::iter::repeat(Role::Remover).take(cfg.removers));

    let mut workers = JoinSet::new();
    for role in roles {
        workers.spawn(worker(role, map.clone(), keys, deadline, shutdown_token.clone()));
    }

    tracing::info!(
        component = "soak",
        event = "started",
        writers = cfg.writers,
        readers = cfg.readers,
        removers = cfg.removers,
        keys,
        duration = %humantime::format_duration(cfg.duration),
        "soak run started"
    );

    let mut report = SoakReport::default();
    while let Some(joined) = workers.join_next().await {
        match joined {
            Ok(part) => report.merge(part),
            Err(e) => tracing::error!(component = "soak", event = "worker_failed", error = %e, "soak worker failed"),
        }
    }

    tracing::info!(
        component = "soak",
        event = "finished",
        writes = report.writes,
        reads = report.reads,
        removes = report.removes,
        "soak run finished"
    );
    report
}

async fn worker(
    role: Role,
    map: ManagedMap<u64, u64>,
    keys: u64,
    deadline: Instant,
    shutdown_token: CancellationToken,
) -> SoakReport {
    let mut report = SoakReport::default();
    let mut seq = 0u64;

    while !shutdown_token.is_cancelled() && Instant::now() < deadline {
        // ThreadRng is not Send; keep it out of the await below.
        let key = rand::thread_rng().gen_range(0..keys);
        let step = match role {
            Role::Writer => map.put(key, seq).map(|_| report.writes += 1),
            Role::Reader => map.get(&key).map(|_| report.reads += 1),
            Role::Remover => map.remove(&key).await.map(|_| report.removes += 1),
        };
        if let Err(MapError::Closed) = step {
            tracing::debug!(component = "soak", event = "map_closed", ?role, "worker stopped, map closed");
            break;
        }
        seq = seq.wrapping_add(1);
        tokio::task::yield_now().await;
    }

    report
}
