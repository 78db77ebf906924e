//! Analyzer invocation service
//!
//! Runs the instrumented taint-tracking binary over one candidate input.
//! The binary receives the input path as its argument and learns the taint
//! source and output sink through `TAINT_OPTIONS`; everything it produces
//! lands in the per-dispatch output directory. Its stdout/stderr are
//! discarded; the populated output directory is the whole result.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use tokio::process::Command;
use tokio::time;
use tracing::info;

/// Outcome of one analyzer invocation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnalyzerOutcome {
    /// The analyzer exited on its own
    Completed { exit_code: i32 },
    /// The analyzer outlived the wall-clock budget and was killed
    TimedOut,
}

/// Service trait for running the analysis program over a candidate input
#[async_trait]
pub trait Analyzer: Send + Sync {
    /// Analyzes `input`, writing all artifacts under `output_dir`
    ///
    /// An `Err` means the invocation could not be carried out at all
    /// (typically a spawn failure); the analyzer's own failures are
    /// reported through [`AnalyzerOutcome`].
    async fn analyze(&self, input: &Path, output_dir: &Path) -> Result<AnalyzerOutcome>;
}

/// Process-backed implementation of [`Analyzer`]
pub struct TaintAnalyzer {
    program: PathBuf,
    timeout: Duration,
}

impl TaintAnalyzer {
    /// Creates an analyzer for the given binary and per-invocation budget
    pub fn new(program: PathBuf, timeout: Duration) -> Self {
        Self { program, timeout }
    }
}

#[async_trait]
impl Analyzer for TaintAnalyzer {
    async fn analyze(&self, input: &Path, output_dir: &Path) -> Result<AnalyzerOutcome> {
        let taint_options = format!(
            "taint_file={} output_dir={}",
            input.display(),
            output_dir.display()
        );

        let mut child = Command::new(&self.program)
            .arg(input)
            .env("TAINT_OPTIONS", taint_options)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .with_context(|| format!("Failed to spawn analyzer {}", self.program.display()))?;

        match time::timeout(self.timeout, child.wait()).await {
            Ok(status) => {
                let status = status.context("Failed to wait for analyzer")?;
                Ok(AnalyzerOutcome::Completed {
                    exit_code: status.code().unwrap_or(-1),
                })
            }
            Err(_) => {
                // Budget exhausted: kill and reap before reporting, so no
                // zombie or file handle outlives the invocation.
                child
                    .kill()
                    .await
                    .context("Failed to kill timed-out analyzer")?;
                Ok(AnalyzerOutcome::TimedOut)
            }
        }
    }
}

/// Checks that the configured analyzer binary exists
///
/// Run once at startup so a misconfigured path fails loudly instead of
/// producing a spawn error for every dispatched task.
pub fn check_analyzer_available(program: &Path) -> Result<()> {
    let metadata = std::fs::metadata(program)
        .with_context(|| format!("Analyzer binary not found at {}", program.display()))?;

    if !metadata.is_file() {
        anyhow::bail!("Analyzer path {} is not a regular file", program.display());
    }

    info!("Analyzer binary found: {}", program.display());
    Ok(())
}
