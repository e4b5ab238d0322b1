// Main entrypoint of the managedmap soak runner.

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use managedmap::config::{Config, ConfigTrait};
use managedmap::shutdown::GracefulShutdown;
use managedmap::workers::watcher::telemetry;
use managedmap::{soak, ManagedMap};

const CONFIG_PATH: &str = "cfg/managedmap.cfg.yaml";
const CONFIG_PATH_LOCAL: &str = "cfg/managedmap.cfg.local.yaml";

/// managedmap - drives a self-expiring concurrent map under load and reports its lifecycle stats
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Custom config file path
    #[arg(short, long, value_name = "FILE")]
    cfg: Option<PathBuf>,

    /// Overrides soak.duration (e.g. "30s", "2m")
    #[arg(short, long, value_parser = humantime::parse_duration)]
    duration: Option<Duration>,
}

/// Loads the configuration struct from YAML file.
/// Tries local config first, then falls back to default config.
fn load_cfg(path: Option<PathBuf>) -> Result<(Config, PathBuf)> {
    if let Some(custom_path) = path {
        let cfg = Config::load(&custom_path)
            .with_context(|| format!("failed to load custom config from {:?}", custom_path))?;
        return Ok((cfg, custom_path));
    }

    match Config::load(CONFIG_PATH_LOCAL) {
        Ok(cfg) => Ok((cfg, PathBuf::from(CONFIG_PATH_LOCAL))),
        Err(_) => {
            let cfg = Config::load(CONFIG_PATH)
                .with_context(|| format!("failed to load config from {}", CONFIG_PATH))?;
            Ok((cfg, PathBuf::from(CONFIG_PATH)))
        }
    }
}

/// Configures structured logging based on configuration.
fn configure_logger(cfg: &Config) {
    use tracing_subscriber::fmt;
    use tracing_subscriber::prelude::*;
    use tracing_subscriber::EnvFilter;

    let log_level = cfg
        .logs()
        .and_then(|logs| logs.level.as_deref())
        .unwrap_or("info");

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));

    if cfg.is_prod() {
        // Production: JSON format
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json())
            .init();
    } else {
        // Development: Pretty console format
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().pretty())
            .init();
    }
}

fn main() -> Result<()> {
    let args = Args::parse();

    tokio::runtime::Runtime::new()
        .context("Failed to create tokio runtime")?
        .block_on(async_main(args))
}

async fn async_main(args: Args) -> Result<()> {
    let (cfg, cfg_path) = load_cfg(args.cfg)?;

    // Configure logger (must be done after config is loaded)
    configure_logger(&cfg);
    info!(component = "config", event = "load_success", path = ?cfg_path, "config loaded");

    let mut soak_cfg = cfg.soak();
    if let Some(duration) = args.duration {
        soak_cfg.duration = duration;
    }

    let lifetime = cfg.lifetime();
    info!(
        component = "main",
        event = "map_configured",
        timeout = ?lifetime.timeout(),
        access_budget = ?lifetime.access_budget(),
        "managed map configured"
    );
    let map: ManagedMap<u64, u64> = ManagedMap::with_lifetime(lifetime);

    let shutdown_token = CancellationToken::new();
    let graceful_shutdown =
        GracefulShutdown::new(shutdown_token.clone()).with_graceful_timeout(soak_cfg.close_timeout);

    // Periodic stats
    let telemetry_token = shutdown_token.child_token();
    let stats_map = map.clone();
    let logger = tokio::spawn(telemetry::logger(
        telemetry_token.clone(),
        "soak".to_string(),
        map.counters(),
        move || stats_map.size().ok(),
        soak_cfg.report_interval,
    ));

    // The soak run ends on its own when the duration elapses, or early on SIGINT.
    let run = tokio::spawn({
        let map = map.clone();
        let soak_cfg = soak_cfg.clone();
        let token = shutdown_token.clone();
        async move { soak::run(map, &soak_cfg, token).await }
    });
    let signal = tokio::spawn({
        let graceful_shutdown = graceful_shutdown.clone();
        async move { graceful_shutdown.await_signal().await }
    });

    let report = run.await.context("soak run panicked")?;
    shutdown_token.cancel();
    let _ = signal.await;
    telemetry_token.cancel();
    let _ = logger.await;

    let stats = map.stats();
    info!(
        component = "main",
        event = "soak_report",
        writes = report.writes,
        reads = report.reads,
        removes = report.removes,
        hits = stats.hits,
        misses = stats.misses,
        inserts = stats.inserts,
        expired_timeout = stats.expired_timeout,
        expired_budget = stats.expired_budget,
        removed = stats.removed,
        "soak complete"
    );

    match graceful_shutdown.finish(map.close()).await {
        Ok(Ok(())) => Ok(()),
        Ok(Err(e)) => {
            error!(component = "main", event = "close_failed", error = %e, "failed to close managed map");
            Err(e.into())
        }
        Err(e) => {
            error!(component = "main", event = "graceful_shutdown_failed", error = %e, "failed to gracefully shut down");
            Err(e.into())
        }
    }
}
