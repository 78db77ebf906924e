//! Source poller
//!
//! The single producer loop. Each cycle runs the three source readers
//! against their cursors and offers every discovered task to the frontier.
//! The loop never terminates in normal operation; it backs off briefly
//! only when a full cycle discovers nothing new.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use seedsched_core::domain::cursor::{AflCursor, LogCursor};
use seedsched_core::domain::task::Task;
use tokio::time;
use tracing::{debug, info};

use crate::config::Config;
use crate::frontier::{Admission, Frontier};
use crate::source::{self, RaritySource};

/// Poller that continuously discovers candidate inputs
pub struct SourcePoller {
    frontier: Arc<Frontier>,
    afl_queue_dir: PathBuf,
    edge: RaritySource,
    path: RaritySource,
    afl_cursor: AflCursor,
    edge_cursor: LogCursor,
    path_cursor: LogCursor,
    idle_backoff: Duration,
}

impl SourcePoller {
    /// Creates a poller over the source layout described by `config`
    pub fn new(config: &Config, frontier: Arc<Frontier>) -> Self {
        Self {
            frontier,
            afl_queue_dir: source::afl::queue_dir(&config.sync_dir),
            edge: RaritySource::edge(&config.sync_dir),
            path: RaritySource::path(&config.sync_dir),
            afl_cursor: AflCursor::default(),
            edge_cursor: LogCursor::default(),
            path_cursor: LogCursor::default(),
            idle_backoff: config.idle_backoff,
        }
    }

    /// Runs the polling loop forever
    pub async fn run(mut self) {
        info!(
            "Starting source poller (AFL queue: {}, idle backoff: {:?})",
            self.afl_queue_dir.display(),
            self.idle_backoff
        );

        loop {
            let discovered = self.poll_cycle();
            if discovered == 0 {
                time::sleep(self.idle_backoff).await;
            }
        }
    }

    /// Runs one scan over all three sources
    ///
    /// Returns how many tasks the cycle discovered, admitted or not.
    fn poll_cycle(&mut self) -> usize {
        let mut discovered = 0;

        let (tasks, cursor) = source::afl::scan(&self.afl_queue_dir, self.afl_cursor);
        self.afl_cursor = cursor;
        discovered += self.offer_all(tasks);

        let (tasks, cursor) = source::rarity::scan(&self.edge, self.edge_cursor);
        self.edge_cursor = cursor;
        discovered += self.offer_all(tasks);

        let (tasks, cursor) = source::rarity::scan(&self.path, self.path_cursor);
        self.path_cursor = cursor;
        discovered += self.offer_all(tasks);

        if discovered > 0 {
            info!(
                "Discovered {} new candidate(s); frontier holds {}",
                discovered,
                self.frontier.len()
            );
        }

        discovered
    }

    fn offer_all(&self, tasks: Vec<Task>) -> usize {
        let count = tasks.len();
        for task in tasks {
            match self.frontier.insert(task) {
                Admission::Admitted => {}
                Admission::Displaced(evicted) => {
                    debug!("Frontier full; displaced {}", evicted.path.display());
                }
                Admission::Rejected(task) => {
                    debug!("Frontier full; dropped {}", task.path.display());
                }
            }
        }
        count
    }
}
