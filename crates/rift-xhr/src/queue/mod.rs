//! In-flight request and timer queues.
//!
//! - `PendingQueue`: matched requests awaiting delivery, in send order
//! - `TimerQueue`: captured timer callbacks awaiting manual firing

mod timers;

pub use timers::{Scheduler, TimerCallback, TimerHandle, TimerQueue};

use std::fmt;
use std::sync::Arc;

/// Requests that have matched a rule but have not been delivered.
///
/// Entries are compared by identity (`Arc::ptr_eq`), never by value. Order is
/// send order; any position may be taken out, which shifts later entries down.
pub struct PendingQueue<T> {
    entries: Vec<Arc<T>>,
}

impl<T> Default for PendingQueue<T> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
        }
    }
}

impl<T> fmt::Debug for PendingQueue<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PendingQueue")
            .field("len", &self.entries.len())
            .finish()
    }
}

impl<T> PendingQueue<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn enqueue(&mut self, entry: Arc<T>) {
        self.entries.push(entry);
    }

    /// Remove the entry by identity. Returns whether it was queued.
    pub fn remove(&mut self, entry: &Arc<T>) -> bool {
        match self.position(entry) {
            Some(index) => {
                self.entries.remove(index);
                true
            }
            None => false,
        }
    }

    pub fn position(&self, entry: &Arc<T>) -> Option<usize> {
        self.entries.iter().position(|e| Arc::ptr_eq(e, entry))
    }

    pub fn get(&self, index: usize) -> Option<Arc<T>> {
        self.entries.get(index).cloned()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

}
