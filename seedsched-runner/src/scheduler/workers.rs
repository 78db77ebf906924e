//! Dispatch worker pool
//!
//! A fixed pool of workers draining the frontier. Each worker pops the
//! best-ranked task, allocates the next process-wide output index, creates
//! the isolated output directory for that index, and runs the analyzer
//! over the candidate input. A failing input is logged and dropped, never
//! retried; workers run for the lifetime of the process.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use seedsched_core::domain::task::Task;
use tokio::task::JoinHandle;
use tracing::{debug, error, warn};

use crate::frontier::Frontier;
use crate::service::{Analyzer, AnalyzerOutcome};

/// Worker pool that dispatches frontier tasks to the analyzer
pub struct DispatchPool {
    frontier: Arc<Frontier>,
    analyzer: Arc<dyn Analyzer>,
    out_index: Arc<AtomicU64>,
    work_dir: PathBuf,
}

impl DispatchPool {
    /// Creates a new dispatch pool
    pub fn new(
        frontier: Arc<Frontier>,
        analyzer: Arc<dyn Analyzer>,
        out_index: Arc<AtomicU64>,
        work_dir: PathBuf,
    ) -> Self {
        Self {
            frontier,
            analyzer,
            out_index,
            work_dir,
        }
    }

    /// Spawns `count` worker tasks
    ///
    /// The returned handles never resolve in normal operation; the pool is
    /// stopped by shutting the process down.
    pub fn spawn(&self, count: usize) -> Vec<JoinHandle<()>> {
        (0..count)
            .map(|worker_id| {
                let frontier = Arc::clone(&self.frontier);
                let analyzer = Arc::clone(&self.analyzer);
                let out_index = Arc::clone(&self.out_index);
                let work_dir = self.work_dir.clone();

                tokio::spawn(async move {
                    loop {
                        let task = frontier.pop_best().await;
                        let index = out_index.fetch_add(1, Ordering::Relaxed);
                        dispatch_one(worker_id, index, &task, analyzer.as_ref(), &work_dir)
                            .await;
                    }
                })
            })
            .collect()
    }
}

/// Output directory for a dispatch index
///
/// The `queue` leaf is where the analyzer drops generated inputs for
/// downstream pickup.
pub fn output_dir_for(work_dir: &Path, index: u64) -> PathBuf {
    work_dir.join(format!("taint-out-{index}")).join("queue")
}

/// Runs a single invocation; every failure is contained here
async fn dispatch_one(
    worker_id: usize,
    index: u64,
    task: &Task,
    analyzer: &dyn Analyzer,
    work_dir: &Path,
) {
    let output_dir = output_dir_for(work_dir, index);

    // Indexes are never shared, but create_dir_all also treats a directory
    // that already exists as success, so creation races are harmless.
    if let Err(err) = std::fs::create_dir_all(&output_dir) {
        error!(
            "Worker {}: cannot create output directory {}: {} (check WORK_DIR permissions)",
            worker_id,
            output_dir.display(),
            err
        );
        return;
    }

    let waited_ms = (chrono::Utc::now() - task.discovered_at).num_milliseconds();
    debug!(
        "Worker {}: dispatching {} (category {:?}, score {}, queued {}ms) as #{}",
        worker_id,
        task.path.display(),
        task.category,
        task.score,
        waited_ms,
        index
    );

    match analyzer.analyze(&task.path, &output_dir).await {
        Ok(AnalyzerOutcome::Completed { exit_code: 0 }) => {
            debug!("Worker {}: #{} completed", worker_id, index);
        }
        Ok(AnalyzerOutcome::Completed { exit_code }) => {
            warn!(
                "Worker {}: analyzer exited with {} for {}",
                worker_id,
                exit_code,
                task.path.display()
            );
        }
        Ok(AnalyzerOutcome::TimedOut) => {
            warn!(
                "Worker {}: analyzer timed out on {}",
                worker_id,
                task.path.display()
            );
        }
        Err(err) => {
            warn!(
                "Worker {}: failed to invoke analyzer on {}: {:#}",
                worker_id,
                task.path.display(),
                err
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use async_trait::async_trait;
    use std::collections::HashSet;
    use std::sync::Mutex;
    use std::time::{Duration, Instant};
    use tokio::time;

    /// Records every invocation instead of spawning a process.
    #[derive(Default)]
    struct RecordingAnalyzer {
        invocations: Mutex<Vec<(PathBuf, PathBuf)>>,
    }

    #[async_trait]
    impl Analyzer for RecordingAnalyzer {
        async fn analyze(&self, input: &Path, output_dir: &Path) -> Result<AnalyzerOutcome> {
            self.invocations
                .lock()
                .unwrap()
                .push((input.to_path_buf(), output_dir.to_path_buf()));
            Ok(AnalyzerOutcome::Completed { exit_code: 0 })
        }
    }

    /// Always fails, to prove workers outlive analyzer failures.
    struct FailingAnalyzer;

    #[async_trait]
    impl Analyzer for FailingAnalyzer {
        async fn analyze(&self, _input: &Path, _output_dir: &Path) -> Result<AnalyzerOutcome> {
            anyhow::bail!("injected failure")
        }
    }

    async fn wait_for<F: Fn() -> bool>(condition: F) {
        let deadline = Instant::now() + Duration::from_secs(5);
        while !condition() {
            assert!(Instant::now() < deadline, "timed out waiting for workers");
            time::sleep(Duration::from_millis(10)).await;
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_pool_dispatches_each_task_once_with_unique_indexes() {
        const TASKS: u64 = 50;

        let dir = tempfile::tempdir().unwrap();
        let frontier = Arc::new(Frontier::new(TASKS as usize));
        let analyzer = Arc::new(RecordingAnalyzer::default());
        let out_index = Arc::new(AtomicU64::new(0));

        for i in 0..TASKS {
            frontier.insert(Task::afl(i, PathBuf::from(format!("in-{i}"))));
        }

        let pool = DispatchPool::new(
            Arc::clone(&frontier),
            Arc::clone(&analyzer) as Arc<dyn Analyzer>,
            Arc::clone(&out_index),
            dir.path().to_path_buf(),
        );
        let _workers = pool.spawn(4);

        wait_for(|| analyzer.invocations.lock().unwrap().len() == TASKS as usize).await;

        let invocations = analyzer.invocations.lock().unwrap();

        // Every task analyzed exactly once.
        let inputs: HashSet<_> = invocations.iter().map(|(input, _)| input.clone()).collect();
        assert_eq!(inputs.len(), TASKS as usize);

        // Output indexes are dense and never reused.
        let dirs: HashSet<_> = invocations.iter().map(|(_, out)| out.clone()).collect();
        assert_eq!(dirs.len(), TASKS as usize);
        for index in 0..TASKS {
            let expected = output_dir_for(dir.path(), index);
            assert!(dirs.contains(&expected), "missing output dir for #{index}");
            assert!(expected.is_dir(), "output dir for #{index} not created");
        }
        assert_eq!(out_index.load(Ordering::Relaxed), TASKS);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_workers_survive_analyzer_failures() {
        let dir = tempfile::tempdir().unwrap();
        let frontier = Arc::new(Frontier::new(16));
        let out_index = Arc::new(AtomicU64::new(0));

        let pool = DispatchPool::new(
            Arc::clone(&frontier),
            Arc::new(FailingAnalyzer) as Arc<dyn Analyzer>,
            Arc::clone(&out_index),
            dir.path().to_path_buf(),
        );
        let _workers = pool.spawn(2);

        for i in 0..8 {
            frontier.insert(Task::afl(i, PathBuf::from(format!("in-{i}"))));
        }

        // Every task is attempted despite each one failing.
        wait_for(|| out_index.load(Ordering::Relaxed) == 8).await;
        wait_for(|| frontier.is_empty()).await;
    }

    #[test]
    fn test_output_dir_layout() {
        let dir = output_dir_for(Path::new("/work"), 42);
        assert_eq!(dir, PathBuf::from("/work/taint-out-42/queue"));
    }
}
