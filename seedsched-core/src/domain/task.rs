//! Candidate task types
//!
//! A `Task` is one candidate input discovered by a source reader. Tasks are
//! immutable after creation; their dispatch order is a pure function of
//! their fields.

use std::cmp::Ordering;
use std::path::PathBuf;

/// Origin of a candidate input.
///
/// Categories carry a fixed dispatch rank: the AFL queue always outranks
/// the edge-rarity stream, which always outranks the path-rarity stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SourceCategory {
    AflQueue,
    EdgeRarity,
    PathRarity,
}

impl SourceCategory {
    /// Dispatch rank for this category; lower is served first.
    pub fn rank(self) -> u8 {
        match self {
            SourceCategory::AflQueue => 0,
            SourceCategory::EdgeRarity => 1,
            SourceCategory::PathRarity => 2,
        }
    }
}

/// A candidate input awaiting analysis.
#[derive(Debug, Clone)]
pub struct Task {
    /// Which source discovered this input.
    pub category: SourceCategory,

    /// Resume order assigned by the fuzzer; meaningful for `AflQueue` only.
    pub sequence_index: u64,

    /// Rarity metric from the filter logs; meaningful for the rarity
    /// categories, higher is more interesting.
    pub score: f64,

    /// Candidate input file, resolved at discovery time.
    pub path: PathBuf,

    /// When the source reader discovered this input.
    pub discovered_at: chrono::DateTime<chrono::Utc>,
}

impl Task {
    /// Creates a task for an AFL queue entry.
    pub fn afl(sequence_index: u64, path: PathBuf) -> Self {
        Self {
            category: SourceCategory::AflQueue,
            sequence_index,
            score: 0.0,
            path,
            discovered_at: chrono::Utc::now(),
        }
    }

    /// Creates a task for a rarity log entry.
    pub fn rarity(category: SourceCategory, score: f64, path: PathBuf) -> Self {
        Self {
            category,
            sequence_index: 0,
            score,
            path,
            discovered_at: chrono::Utc::now(),
        }
    }

    /// Total dispatch order across all categories.
    ///
    /// `Ordering::Less` means `self` is dispatched before `other`:
    /// 1. lower category rank first;
    /// 2. within the AFL queue, ascending sequence index;
    /// 3. otherwise descending score, using `f64::total_cmp` so every pair
    ///    of tasks (NaN scores included) orders deterministically.
    pub fn dispatch_cmp(&self, other: &Task) -> Ordering {
        self.category
            .rank()
            .cmp(&other.category.rank())
            .then_with(|| {
                if self.category == SourceCategory::AflQueue {
                    self.sequence_index.cmp(&other.sequence_index)
                } else {
                    Ordering::Equal
                }
            })
            .then_with(|| other.score.total_cmp(&self.score))
    }
}
