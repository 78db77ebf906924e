//! Scheduler configuration
//!
//! Defines all configurable parameters for the scheduler daemon including
//! the fuzzer sync layout, the analyzer binary, frontier capacity, worker
//! pool size, and timing parameters.

use std::path::PathBuf;
use std::time::Duration;

/// Scheduler configuration
///
/// All capacities and timeouts are configurable to allow tuning for
/// different targets (fast parsers vs slow instrumented binaries).
#[derive(Debug, Clone)]
pub struct Config {
    /// Unique identifier for this scheduler instance, used in logs
    pub scheduler_id: String,

    /// Root directory of the fuzzer sync layout (AFL queue, rarity logs)
    pub sync_dir: PathBuf,

    /// Root directory for per-dispatch output directories
    pub work_dir: PathBuf,

    /// Path to the instrumented analyzer binary
    pub analyzer_path: PathBuf,

    /// Maximum number of entries held in the priority frontier
    pub frontier_capacity: usize,

    /// Number of dispatch workers
    pub worker_count: usize,

    /// Wall-clock budget for a single analyzer invocation
    pub invocation_timeout: Duration,

    /// How long the poll loop sleeps after a cycle that found nothing new
    pub idle_backoff: Duration,
}

impl Config {
    /// Creates a new configuration with defaults
    pub fn new(scheduler_id: String, sync_dir: PathBuf) -> Self {
        Self {
            scheduler_id,
            sync_dir,
            work_dir: PathBuf::from("./work"),
            analyzer_path: PathBuf::from("./analyzer"),
            frontier_capacity: 20_000,
            worker_count: 8,
            invocation_timeout: Duration::from_millis(1_000),
            idle_backoff: Duration::from_millis(100),
        }
    }

    /// Creates configuration from environment variables
    ///
    /// Expected environment variables:
    /// - SYNC_DIR (required)
    /// - ANALYZER_PATH (required)
    /// - SCHEDULER_ID (optional, default: random uuid)
    /// - WORK_DIR (optional, default: ./work)
    /// - FRONTIER_CAPACITY (optional, default: 20000)
    /// - WORKER_COUNT (optional, default: 8)
    /// - INVOCATION_TIMEOUT_MS (optional, default: 1000)
    /// - IDLE_BACKOFF_MS (optional, default: 100)
    pub fn from_env() -> anyhow::Result<Self> {
        let sync_dir = std::env::var("SYNC_DIR")
            .map_err(|_| anyhow::anyhow!("SYNC_DIR environment variable not set"))?;

        let analyzer_path = std::env::var("ANALYZER_PATH")
            .map_err(|_| anyhow::anyhow!("ANALYZER_PATH environment variable not set"))?;

        let scheduler_id = std::env::var("SCHEDULER_ID")
            .unwrap_or_else(|_| uuid::Uuid::new_v4().to_string());

        let work_dir = std::env::var("WORK_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("./work"));

        let frontier_capacity = std::env::var("FRONTIER_CAPACITY")
            .ok()
            .and_then(|s| s.parse::<usize>().ok())
            .unwrap_or(20_000);

        let worker_count = std::env::var("WORKER_COUNT")
            .ok()
            .and_then(|s| s.parse::<usize>().ok())
            .unwrap_or(8);

        let invocation_timeout = std::env::var("INVOCATION_TIMEOUT_MS")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
            .map(Duration::from_millis)
            .unwrap_or(Duration::from_millis(1_000));

        let idle_backoff = std::env::var("IDLE_BACKOFF_MS")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
            .map(Duration::from_millis)
            .unwrap_or(Duration::from_millis(100));

        Ok(Self {
            scheduler_id,
            sync_dir: PathBuf::from(sync_dir),
            work_dir,
            analyzer_path: PathBuf::from(analyzer_path),
            frontier_capacity,
            worker_count,
            invocation_timeout,
            idle_backoff,
        })
    }

    /// Validates the configuration
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.scheduler_id.is_empty() {
            anyhow::bail!("scheduler_id cannot be empty");
        }

        if self.sync_dir.as_os_str().is_empty() {
            anyhow::bail!("sync_dir cannot be empty");
        }

        if self.work_dir.as_os_str().is_empty() {
            anyhow::bail!("work_dir cannot be empty");
        }

        if self.analyzer_path.as_os_str().is_empty() {
            anyhow::bail!("analyzer_path cannot be empty");
        }

        if self.frontier_capacity == 0 {
            anyhow::bail!("frontier_capacity must be greater than 0");
        }

        if self.worker_count == 0 {
            anyhow::bail!("worker_count must be greater than 0");
        }

        if self.invocation_timeout.is_zero() {
            anyhow::bail!("invocation_timeout must be greater than 0");
        }

        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new(uuid::Uuid::new_v4().to_string(), PathBuf::from("./sync"))
    }
}
