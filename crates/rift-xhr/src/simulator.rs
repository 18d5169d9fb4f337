//! The simulator context: rules, pending responses, captured timers.
//!
//! Each `Simulator` is an isolated environment. Tests build one per scenario (or
//! call [`Simulator::reset`]) so nothing leaks between them. Handles are cheap to
//! clone and every clone drives the same environment.

use crate::config::SimulatorConfig;
use crate::queue::{PendingQueue, Scheduler, TimerCallback, TimerHandle, TimerQueue};
use crate::rules::{Predicates, Rule, RuleHandle, RuleRegistry};
use crate::signature::RequestSignature;
use crate::xhr::{MockXhr, RequestState};
use parking_lot::{Mutex, RwLock};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, trace};

/// Constructor handed to adapters that bind the simulator into a host's
/// request-construction point.
pub type RequestFactory = Arc<dyn Fn() -> MockXhr + Send + Sync>;

struct Environment {
    config: SimulatorConfig,
    rules: RwLock<RuleRegistry>,
    pending: Mutex<PendingQueue<Mutex<RequestState>>>,
    timers: Mutex<TimerQueue>,
    requests: Mutex<Vec<Arc<RequestSignature>>>,
}

/// Handle to a request simulation environment.
#[derive(Clone)]
pub struct Simulator {
    env: Arc<Environment>,
}

impl Default for Simulator {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Simulator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Simulator")
            .field("rules", &self.rule_count())
            .field("pending_requests", &self.pending_requests())
            .field("pending_timers", &self.pending_timers())
            .finish()
    }
}

impl Simulator {
    pub fn new() -> Self {
        Self::with_config(SimulatorConfig::default())
    }

    pub fn with_config(config: SimulatorConfig) -> Self {
        info!(
            "Created request simulator (server={}, fallback status={})",
            config.server,
            config.fallback.status_code()
        );
        let rules = RuleRegistry::new(config.fallback.clone());
        Self {
            env: Arc::new(Environment {
                config,
                rules: RwLock::new(rules),
                pending: Mutex::new(PendingQueue::new()),
                timers: Mutex::new(TimerQueue::new()),
                requests: Mutex::new(Vec::new()),
            }),
        }
    }

    pub fn config(&self) -> &SimulatorConfig {
        &self.env.config
    }

    // ===== Rules =====

    /// Declare a rule; set its response through the returned handle.
    ///
    /// Rules registered later take priority over earlier ones.
    pub fn register(&self, predicates: Predicates) -> RuleHandle {
        self.env.rules.write().register(predicates)
    }

    /// Number of rules, fallback included.
    pub fn rule_count(&self) -> usize {
        self.env.rules.read().len()
    }

    /// Return to the initial state: only the fallback rule, no pending requests,
    /// no captured timers, empty request log.
    pub fn reset(&self) {
        self.env.rules.write().reset();
        // Old entries drop outside the locks.
        let pending = std::mem::take(&mut *self.env.pending.lock());
        let timers = std::mem::take(&mut *self.env.timers.lock());
        self.env.requests.lock().clear();
        if !pending.is_empty() || timers.pending() > 0 {
            debug!(
                "Discarded {} pending request(s) and {} timer(s)",
                pending.len(),
                timers.pending()
            );
        }
        info!("Simulator reset");
    }

    pub(crate) fn select_rule(&self, signature: &RequestSignature) -> Arc<Rule> {
        // Matchers run on a snapshot so they may call back into the simulator.
        let registry = self.env.rules.read().clone();
        registry.select(signature)
    }

    // ===== Requests =====

    /// A new, unsent request bound to this simulator.
    pub fn new_request(&self) -> MockXhr {
        MockXhr::new(self.clone())
    }

    pub fn request_factory(&self) -> RequestFactory {
        let simulator = self.clone();
        Arc::new(move || simulator.new_request())
    }

    pub(crate) fn record(&self, signature: Arc<RequestSignature>) {
        self.env.requests.lock().push(signature);
    }

    /// Signatures of every request sent since creation or the last reset.
    pub fn recorded_requests(&self) -> Vec<Arc<RequestSignature>> {
        self.env.requests.lock().clone()
    }

    // ===== Pending responses =====

    pub(crate) fn enqueue(&self, state: &Arc<Mutex<RequestState>>) {
        self.env.pending.lock().enqueue(Arc::clone(state));
    }

    pub(crate) fn dequeue(&self, state: &Arc<Mutex<RequestState>>) -> bool {
        self.env.pending.lock().remove(state)
    }

    pub(crate) fn is_pending(&self, state: &Arc<Mutex<RequestState>>) -> bool {
        self.env.pending.lock().position(state).is_some()
    }

    pub fn pending_requests(&self) -> usize {
        self.env.pending.lock().len()
    }

    /// The request waiting at `index`, in send order.
    pub fn pending_request(&self, index: usize) -> Option<MockXhr> {
        let state = self.env.pending.lock().get(index)?;
        Some(MockXhr::from_state(state, self.clone()))
    }

    /// Deliver the request waiting at `index`. Later requests shift down one position.
    /// Returns `false` (and does nothing) when no request waits there.
    pub fn deliver_at(&self, index: usize) -> bool {
        let Some(request) = self.pending_request(index) else {
            debug!("No pending request at index {}", index);
            return false;
        };
        request.deliver();
        true
    }

    /// Deliver the first pending request until none remain, including requests
    /// sent or aborted by listeners along the way. Returns how many were delivered.
    pub fn deliver_all(&self) -> usize {
        let mut delivered = 0;
        while self.deliver_at(0) {
            delivered += 1;
        }
        delivered
    }

    // ===== Timers =====

    /// Capture a callback in place of scheduling it.
    pub fn capture_timer<F>(&self, callback: F) -> TimerHandle
    where
        F: FnOnce() + Send + 'static,
    {
        self.env.timers.lock().capture(Box::new(callback))
    }

    /// Forget a captured callback. Returns whether it was still waiting.
    pub fn release_timer(&self, handle: TimerHandle) -> bool {
        self.env.timers.lock().release(handle)
    }

    /// Fire the earliest captured callback still waiting. Returns `false` when none is.
    pub fn fire_next_timer(&self) -> bool {
        let next = self.env.timers.lock().take_next();
        match next {
            Some((handle, callback)) => {
                debug!("Firing timer {:?}", handle);
                callback();
                true
            }
            None => {
                debug!("No pending timer to fire");
                false
            }
        }
    }

    pub fn pending_timers(&self) -> usize {
        self.env.timers.lock().pending()
    }
}

impl Scheduler for Simulator {
    fn set_timeout(&self, callback: TimerCallback, delay: Duration) -> TimerHandle {
        trace!("Capturing timer scheduled for {:?}", delay);
        self.env.timers.lock().capture(callback)
    }

    fn clear_timeout(&self, handle: TimerHandle) {
        self.release_timer(handle);
    }
}
