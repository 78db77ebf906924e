//! Rarity log readers
//!
//! Tails the append-only logs written by the edge/path rarity filters.
//! Each complete line is `score,filename,tag`; the tag routes the filename
//! to the source's queue or crash directory. The cursor only ever advances
//! past fully terminated lines, so a line the filter is still writing is
//! left for a later cycle instead of being half-consumed.

use std::fs::File;
use std::io::{self, Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};

use seedsched_core::domain::cursor::LogCursor;
use seedsched_core::domain::rarity::{RarityRecord, RarityTag};
use seedsched_core::domain::task::{SourceCategory, Task};
use tracing::{debug, warn};

/// Descriptor for one rarity log and its companion directories
#[derive(Debug, Clone)]
pub struct RaritySource {
    pub category: SourceCategory,
    pub log_path: PathBuf,
    pub queue_dir: PathBuf,
    pub crash_dir: PathBuf,
    pub queue_tag: &'static str,
    pub crash_tag: &'static str,
}

impl RaritySource {
    /// The edge-rarity log under the fuzzer sync root
    pub fn edge(sync_dir: &Path) -> Self {
        let filter_dir = sync_dir.join("MQfilter");
        Self {
            category: SourceCategory::EdgeRarity,
            log_path: filter_dir.join("edge_rare"),
            queue_dir: filter_dir.join("queue"),
            crash_dir: filter_dir.join("crashes"),
            queue_tag: "eq",
            crash_tag: "ec",
        }
    }

    /// The path-rarity log under the fuzzer sync root
    pub fn path(sync_dir: &Path) -> Self {
        let filter_dir = sync_dir.join("MQfilter-path");
        Self {
            category: SourceCategory::PathRarity,
            log_path: sync_dir.join("MQfilter").join("path_rare"),
            queue_dir: filter_dir.join("_queue"),
            crash_dir: filter_dir.join("_crashes"),
            queue_tag: "pq",
            crash_tag: "pc",
        }
    }
}

/// Reads newly completed lines from `source`'s log starting at `cursor`
///
/// Returns the discovered tasks and the cursor advanced just past the last
/// fully read line. A log that does not exist yet yields no tasks and an
/// unchanged cursor; a malformed complete line is skipped but consumed,
/// since it can never become valid.
pub fn scan(source: &RaritySource, cursor: LogCursor) -> (Vec<Task>, LogCursor) {
    let tail = match read_tail(&source.log_path, cursor.offset) {
        Ok(tail) => tail,
        Err(err) if err.kind() == io::ErrorKind::NotFound => {
            debug!("Rarity log {} not created yet", source.log_path.display());
            return (Vec::new(), cursor);
        }
        Err(err) => {
            warn!(
                "Failed to read rarity log {}: {}",
                source.log_path.display(),
                err
            );
            return (Vec::new(), cursor);
        }
    };

    let mut tasks = Vec::new();
    let mut consumed = 0usize;

    for line in tail.split_inclusive('\n') {
        if !line.ends_with('\n') {
            // Incomplete trailing line, still being written.
            break;
        }
        consumed += line.len();

        let record = match RarityRecord::parse(line, source.queue_tag, source.crash_tag) {
            Ok(record) => record,
            Err(err) => {
                debug!(
                    "Skipping malformed line in {}: {}",
                    source.log_path.display(),
                    err
                );
                continue;
            }
        };

        let dir = match record.tag {
            RarityTag::Queue => &source.queue_dir,
            RarityTag::Crash => &source.crash_dir,
        };
        tasks.push(Task::rarity(
            source.category,
            record.score,
            dir.join(&record.filename),
        ));
    }

    (tasks, cursor.advanced_by(consumed as u64))
}

fn read_tail(log_path: &Path, offset: u64) -> io::Result<String> {
    let mut file = File::open(log_path)?;
    file.seek(SeekFrom::Start(offset))?;
    let mut tail = String::new();
    file.read_to_string(&mut tail)?;
    Ok(tail)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::OpenOptions;
    use std::io::Write;

    fn edge_source(dir: &Path) -> RaritySource {
        RaritySource::edge(dir)
    }

    fn append(log_path: &Path, content: &str) {
        std::fs::create_dir_all(log_path.parent().unwrap()).unwrap();
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(log_path)
            .unwrap();
        file.write_all(content.as_bytes()).unwrap();
    }

    #[test]
    fn test_scan_missing_log_is_not_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let source = edge_source(dir.path());

        let (tasks, cursor) = scan(&source, LogCursor::default());
        assert!(tasks.is_empty());
        assert_eq!(cursor.offset, 0);
    }

    #[test]
    fn test_scan_resumes_without_reemitting() {
        let dir = tempfile::tempdir().unwrap();
        let source = edge_source(dir.path());

        append(&source.log_path, "0.5,a,eq\n");
        let (tasks, cursor) = scan(&source, LogCursor::default());
        assert_eq!(tasks.len(), 1);
        assert_eq!(tasks[0].score, 0.5);
        assert_eq!(tasks[0].path, source.queue_dir.join("a"));
        assert_eq!(cursor.offset, "0.5,a,eq\n".len() as u64);

        // Nothing new yet.
        let (tasks, cursor) = scan(&source, cursor);
        assert!(tasks.is_empty());

        // A later append yields exactly the second record.
        append(&source.log_path, "0.9,b,eq\n");
        let (tasks, cursor) = scan(&source, cursor);
        assert_eq!(tasks.len(), 1);
        assert_eq!(tasks[0].score, 0.9);
        assert_eq!(tasks[0].path, source.queue_dir.join("b"));
        assert_eq!(cursor.offset, ("0.5,a,eq\n".len() + "0.9,b,eq\n".len()) as u64);
    }

    #[test]
    fn test_scan_leaves_partial_line_for_later() {
        let dir = tempfile::tempdir().unwrap();
        let source = edge_source(dir.path());

        append(&source.log_path, "0.9,b,eq");
        let (tasks, cursor) = scan(&source, LogCursor::default());
        assert!(tasks.is_empty());
        assert_eq!(cursor.offset, 0);

        // Once the newline lands the line is emitted exactly once.
        append(&source.log_path, "\n");
        let (tasks, cursor) = scan(&source, cursor);
        assert_eq!(tasks.len(), 1);
        assert_eq!(tasks[0].score, 0.9);

        let (tasks, _) = scan(&source, cursor);
        assert!(tasks.is_empty());
    }

    #[test]
    fn test_scan_skips_malformed_lines() {
        let dir = tempfile::tempdir().unwrap();
        let source = edge_source(dir.path());

        append(
            &source.log_path,
            "garbage\n0.7,good,eq\nnot,a,float,line\n1.5,also-good,ec\n",
        );
        let (tasks, cursor) = scan(&source, LogCursor::default());
        assert_eq!(tasks.len(), 2);
        assert_eq!(tasks[0].path, source.queue_dir.join("good"));
        assert_eq!(tasks[1].path, source.crash_dir.join("also-good"));

        // Malformed complete lines were consumed, not re-scanned.
        let (tasks, _) = scan(&source, cursor);
        assert!(tasks.is_empty());
    }

    #[test]
    fn test_crash_tag_resolves_to_crash_dir() {
        let dir = tempfile::tempdir().unwrap();
        let source = edge_source(dir.path());

        append(&source.log_path, "2.5,boom,ec\n");
        let (tasks, _) = scan(&source, LogCursor::default());
        assert_eq!(tasks.len(), 1);
        assert_eq!(tasks[0].path, source.crash_dir.join("boom"));
        assert_eq!(tasks[0].category, SourceCategory::EdgeRarity);
    }

    #[test]
    fn test_path_source_uses_path_tags_and_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let source = RaritySource::path(dir.path());

        append(&source.log_path, "0.3,p1,pq\n0.4,p2,pc\n0.5,p3,eq\n");
        let (tasks, _) = scan(&source, LogCursor::default());

        // Edge tags are foreign to the path log and get skipped.
        assert_eq!(tasks.len(), 2);
        assert_eq!(tasks[0].path, source.queue_dir.join("p1"));
        assert_eq!(tasks[1].path, source.crash_dir.join("p2"));
        assert!(tasks.iter().all(|t| t.category == SourceCategory::PathRarity));
    }
}
