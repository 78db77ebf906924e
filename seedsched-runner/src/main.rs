//! Seedsched Runner
//!
//! A scheduler daemon that feeds a taint-tracking analyzer with the most
//! interesting candidate inputs produced by concurrently running fuzzers.
//!
//! Architecture:
//! - Sources: readers over the AFL queue and the edge/path rarity logs
//! - Frontier: bounded, priority-ordered admission of discovered inputs
//! - Dispatch: fixed worker pool invoking the analyzer under a timeout
//! - Poller: the single discovery loop that keeps the frontier fed
//!
//! The poller and the workers share nothing but the frontier; the process
//! runs until stopped externally.

mod config;
mod frontier;
mod scheduler;
mod service;
mod source;

use std::sync::Arc;
use std::sync::atomic::AtomicU64;

use anyhow::Result;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::Config;
use crate::frontier::Frontier;
use crate::scheduler::{DispatchPool, SourcePoller};
use crate::service::{Analyzer, TaintAnalyzer, check_analyzer_available};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "seedsched_runner=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting seedsched runner");

    // Load configuration
    let config = load_config()?;
    info!(
        "Loaded configuration: scheduler_id={}, sync_dir={}, analyzer={}",
        config.scheduler_id,
        config.sync_dir.display(),
        config.analyzer_path.display()
    );

    // A misconfigured analyzer path should fail startup, not every dispatch
    check_analyzer_available(&config.analyzer_path)?;

    // The frontier is the only state shared between poller and workers
    let frontier = Arc::new(Frontier::new(config.frontier_capacity));
    let out_index = Arc::new(AtomicU64::new(0));
    let analyzer: Arc<dyn Analyzer> = Arc::new(TaintAnalyzer::new(
        config.analyzer_path.clone(),
        config.invocation_timeout,
    ));

    let pool = DispatchPool::new(
        Arc::clone(&frontier),
        analyzer,
        out_index,
        config.work_dir.clone(),
    );
    let workers = pool.spawn(config.worker_count);
    info!(
        "Spawned {} dispatch worker(s) (frontier capacity: {}, invocation timeout: {:?})",
        workers.len(),
        config.frontier_capacity,
        config.invocation_timeout
    );

    // Run discovery on this task; it only returns if the process is stopped
    let poller = SourcePoller::new(&config, Arc::clone(&frontier));
    poller.run().await;

    Ok(())
}

/// Loads configuration from environment variables with fallback to defaults
fn load_config() -> Result<Config> {
    match Config::from_env() {
        Ok(config) => {
            config.validate()?;
            Ok(config)
        }
        Err(_) => {
            info!("Failed to load config from environment, using defaults");
            let config = Config::default();
            config.validate()?;
            Ok(config)
        }
    }
}
