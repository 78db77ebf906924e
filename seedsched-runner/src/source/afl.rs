//! AFL queue reader
//!
//! Scans the fuzzer's queue directory for entries named `id:NNNNNN*` at or
//! above the cursor index. Queue ids are dense and monotonically assigned
//! by the fuzzer, so the probe walks sequentially and stops at the first
//! missing index: a gap means "no more new items yet", never "skip ahead".

use std::io;
use std::path::{Path, PathBuf};

use seedsched_core::domain::cursor::AflCursor;
use seedsched_core::domain::task::Task;
use tracing::{debug, warn};

/// AFL queue directory under the fuzzer sync root
pub fn queue_dir(sync_dir: &Path) -> PathBuf {
    sync_dir.join("fuzzer1").join("queue")
}

/// Scans `queue_dir` for new entries starting at `cursor`
///
/// Returns the discovered tasks and the cursor advanced past them. A queue
/// directory that does not exist yet yields no tasks and an unchanged
/// cursor.
pub fn scan(queue_dir: &Path, cursor: AflCursor) -> (Vec<Task>, AflCursor) {
    let names = match list_names(queue_dir) {
        Ok(names) => names,
        Err(err) if err.kind() == io::ErrorKind::NotFound => {
            debug!("AFL queue {} not created yet", queue_dir.display());
            return (Vec::new(), cursor);
        }
        Err(err) => {
            warn!("Failed to scan AFL queue {}: {}", queue_dir.display(), err);
            return (Vec::new(), cursor);
        }
    };

    let mut tasks = Vec::new();
    let mut next = cursor.next_index;
    loop {
        let prefix = format!("id:{next:06}");
        match names.iter().find(|name| name.starts_with(&prefix)) {
            Some(name) => {
                tasks.push(Task::afl(next, queue_dir.join(name)));
                next += 1;
            }
            None => break,
        }
    }

    let count = tasks.len() as u64;
    (tasks, cursor.advanced_by(count))
}

fn list_names(dir: &Path) -> io::Result<Vec<String>> {
    let mut names = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        if let Ok(name) = entry?.file_name().into_string() {
            names.push(name);
        }
    }
    Ok(names)
}
