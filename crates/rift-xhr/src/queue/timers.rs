//! Deferred callback queue for deterministic timer substitution.

use std::fmt;
use std::time::Duration;
use tracing::trace;

/// A captured timer callback.
pub type TimerCallback = Box<dyn FnOnce() + Send>;

/// Handle of a captured callback: its slot index in capture order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerHandle(pub usize);

/// Host scheduling primitives (`setTimeout` / `clearTimeout`) as a seam.
///
/// The simulator implements this by capturing callbacks instead of scheduling
/// them; adapters bind it wherever the host expects a scheduler.
pub trait Scheduler {
    /// Schedule `callback`. Implementations may ignore `delay`.
    fn set_timeout(&self, callback: TimerCallback, delay: Duration) -> TimerHandle;

    /// Cancel a scheduled callback; unknown or already-fired handles are ignored.
    fn clear_timeout(&self, handle: TimerHandle);
}

/// Slots of captured callbacks. A slot is emptied once fired or released and is
/// never reused, so handles stay unique until the queue is cleared.
#[derive(Default)]
pub struct TimerQueue {
    slots: Vec<Option<TimerCallback>>,
}

impl fmt::Debug for TimerQueue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TimerQueue")
            .field("slots", &self.slots.len())
            .field("pending", &self.pending())
            .finish()
    }
}

impl TimerQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn capture(&mut self, callback: TimerCallback) -> TimerHandle {
        self.slots.push(Some(callback));
        let handle = TimerHandle(self.slots.len() - 1);
        trace!("Captured timer {:?}", handle);
        handle
    }

    /// Empty the slot. Returns whether a callback was still waiting there.
    pub fn release(&mut self, handle: TimerHandle) -> bool {
        let released = self
            .slots
            .get_mut(handle.0)
            .and_then(Option::take)
            .is_some();
        trace!("Released timer {:?} (was pending: {})", handle, released);
        released
    }

    /// Take the earliest captured callback that is still waiting.
    ///
    /// The slot is emptied before the callback is handed out, so the caller can run
    /// it without holding the queue.
    pub fn take_next(&mut self) -> Option<(TimerHandle, TimerCallback)> {
        self.slots
            .iter_mut()
            .enumerate()
            .find_map(|(index, slot)| slot.take().map(|cb| (TimerHandle(index), cb)))
    }

    /// Number of callbacks still waiting.
    pub fn pending(&self) -> usize {
        self.slots.iter().filter(|s| s.is_some()).count()
    }
}
