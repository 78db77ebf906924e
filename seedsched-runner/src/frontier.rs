//! Bounded priority frontier
//!
//! The single structure shared between the poll loop and the dispatch
//! workers. Holds not-yet-dispatched tasks in dispatch order, bounded by a
//! fixed capacity: once full, a new task is admitted only by displacing a
//! strictly worse entry, so the frontier converges on the best-K candidates
//! seen so far instead of growing with the corpus.

use std::cmp::Ordering;
use std::collections::BTreeSet;
use std::sync::Mutex;

use seedsched_core::domain::task::Task;
use tokio::sync::Notify;

/// Outcome of an admission attempt
#[derive(Debug)]
pub enum Admission {
    /// Admitted below capacity
    Admitted,
    /// Admitted at capacity by evicting the worst-ranked entry
    Displaced(Task),
    /// At capacity and not better than the current worst entry
    Rejected(Task),
}

/// A task plus its admission serial.
///
/// The serial makes entries unique inside the ordered set and doubles as
/// the final tiebreak: of two tasks with equal dispatch keys, the earlier
/// admission is served first.
struct Entry {
    task: Task,
    serial: u64,
}

impl Ord for Entry {
    fn cmp(&self, other: &Self) -> Ordering {
        self.task
            .dispatch_cmp(&other.task)
            .then_with(|| self.serial.cmp(&other.serial))
    }
}

impl PartialOrd for Entry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for Entry {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Entry {}

struct State {
    entries: BTreeSet<Entry>,
    next_serial: u64,
}

/// Concurrent, capacity-bounded priority structure for pending tasks
///
/// All mutations are serialized under one mutex; waiting poppers park on a
/// [`Notify`] rather than spinning.
pub struct Frontier {
    state: Mutex<State>,
    notify: Notify,
    capacity: usize,
}

impl Frontier {
    /// Creates an empty frontier holding at most `capacity` entries
    pub fn new(capacity: usize) -> Self {
        Self {
            state: Mutex::new(State {
                entries: BTreeSet::new(),
                next_serial: 0,
            }),
            notify: Notify::new(),
            capacity,
        }
    }

    /// Offers a task to the frontier
    ///
    /// Below capacity the task is admitted unconditionally. At capacity it
    /// is admitted only if it ranks strictly better than the current worst
    /// entry, which is then evicted. Admission wakes one waiting popper.
    pub fn insert(&self, task: Task) -> Admission {
        let mut state = self.state.lock().unwrap();
        let serial = state.next_serial;
        state.next_serial += 1;
        let entry = Entry { task, serial };

        if state.entries.len() < self.capacity {
            state.entries.insert(entry);
            drop(state);
            self.notify.notify_one();
            return Admission::Admitted;
        }

        let beats_worst = match state.entries.last() {
            Some(worst) => entry.task.dispatch_cmp(&worst.task) == Ordering::Less,
            None => false,
        };
        if beats_worst {
            let evicted = state.entries.pop_last().expect("frontier is non-empty");
            state.entries.insert(entry);
            drop(state);
            self.notify.notify_one();
            Admission::Displaced(evicted.task)
        } else {
            Admission::Rejected(entry.task)
        }
    }

    /// Removes and returns the best-ranked task, waiting cooperatively
    /// while the frontier is empty
    ///
    /// Safe to call from any number of workers concurrently; no two calls
    /// ever return the same entry.
    pub async fn pop_best(&self) -> Task {
        loop {
            // Register for a wakeup before checking, so an insert landing
            // between the check and the await is not lost.
            let notified = self.notify.notified();
            if let Some(task) = self.try_pop() {
                return task;
            }
            notified.await;
        }
    }

    /// Non-blocking pop of the best-ranked task
    pub fn try_pop(&self) -> Option<Task> {
        let mut state = self.state.lock().unwrap();
        let entry = state.entries.pop_first()?;
        if !state.entries.is_empty() {
            // Pass the wakeup along: a single notify permit may have been
            // consumed on behalf of several queued inserts.
            self.notify.notify_one();
        }
        Some(entry.task)
    }

    /// Current entry count
    pub fn len(&self) -> usize {
        self.state.lock().unwrap().entries.len()
    }

    /// True if no entries are pending
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
