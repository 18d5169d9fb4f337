//! The simulated request object.
//!
//! `MockXhr` follows the XMLHttpRequest contract closely enough for request code
//! to run unmodified: `open` → `set_header` → `send` → ready-state notifications,
//! plus `abort` and the response header accessors. Nothing leaves the process;
//! responses come from the rules registered on the owning [`Simulator`].
//!
//! ## Module Structure
//!
//! - `headers`: canned and custom response header lookup

mod headers;


pub use headers::CANNED_HEADERS;

use crate::error::{Result, XhrError};
use crate::rules::{ResponseSpec, RuleId};
use crate::signature::{RequestSignature, SignatureBuilder};
use crate::simulator::Simulator;
use parking_lot::Mutex;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// Readiness of a request. Partial-transfer states are not modeled: delivery moves
/// straight from `Opened` to `Done`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ReadyState {
    #[default]
    Unsent = 0,
    Opened = 1,
    Done = 4,
}

impl ReadyState {
    pub fn code(self) -> u8 {
        self as u8
    }
}

impl fmt::Display for ReadyState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ReadyState::Unsent => "UNSENT",
            ReadyState::Opened => "OPENED",
            ReadyState::Done => "DONE",
        };
        write!(f, "{name} ({})", self.code())
    }
}

/// Optional arguments of `open`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpenOptions {
    pub asynchronous: bool,
    pub username: Option<String>,
    pub password: Option<String>,
}

impl Default for OpenOptions {
    fn default() -> Self {
        Self {
            asynchronous: true,
            username: None,
            password: None,
        }
    }
}

impl OpenOptions {
    /// Deliver inline during `send`.
    pub fn synchronous() -> Self {
        Self {
            asynchronous: false,
            ..Self::default()
        }
    }

    pub fn with_credentials(
        mut self,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        self.username = Some(username.into());
        self.password = Some(password.into());
        self
    }

    pub fn with_username(mut self, username: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self
    }
}

/// Ready-state change listener. Receives the request whose state changed.
pub type ReadyStateCallback = Box<dyn FnMut(&MockXhr) + Send>;

#[derive(Default)]
pub(crate) struct RequestState {
    ready_state: ReadyState,
    status: u16,
    builder: Option<SignatureBuilder>,
    signature: Option<Arc<RequestSignature>>,
    matched_rule: Option<RuleId>,
    response: Option<ResponseSpec>,
    response_text: String,
    on_ready_state_change: Option<ReadyStateCallback>,
}

/// A simulated asynchronous request.
///
/// Cloning yields another handle to the same request. The pending queue of the
/// owning simulator refers to the request by identity only.
#[derive(Clone)]
pub struct MockXhr {
    state: Arc<Mutex<RequestState>>,
    simulator: Simulator,
}

impl fmt::Debug for MockXhr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.lock();
        f.debug_struct("MockXhr")
            .field("ready_state", &state.ready_state)
            .field("status", &state.status)
            .field("url", &state.signature.as_ref().map(|s| s.url.as_str()))
            .field("matched_rule", &state.matched_rule)
            .finish()
    }
}

impl MockXhr {
    pub(crate) fn new(simulator: Simulator) -> Self {
        Self {
            state: Arc::new(Mutex::new(RequestState::default())),
            simulator,
        }
    }

    pub(crate) fn from_state(state: Arc<Mutex<RequestState>>, simulator: Simulator) -> Self {
        Self { state, simulator }
    }

    /// Open an asynchronous request without credentials.
    pub fn open(&self, method: &str, url: &str) {
        self.open_with(method, url, OpenOptions::default());
    }

    /// Build the signature skeleton and move to `Opened`, notifying the listener.
    /// Re-opening rebuilds the skeleton.
    pub fn open_with(&self, method: &str, url: &str, options: OpenOptions) {
        {
            let mut state = self.state.lock();
            state.builder = Some(SignatureBuilder::new(
                method,
                url,
                options.asynchronous,
                options.username,
                options.password,
            ));
            state.ready_state = ReadyState::Opened;
        }
        self.notify();
    }

    /// Record a request header. Only legal while `Opened`.
    pub fn set_header(&self, name: &str, value: &str) -> Result<()> {
        let mut state = self.state.lock();
        let ready_state = state.ready_state;
        match state.builder.as_mut() {
            Some(builder) if ready_state == ReadyState::Opened => {
                builder.header(name, value);
                Ok(())
            }
            _ => Err(XhrError::InvalidState {
                operation: "set a request header",
                state: ready_state,
            }),
        }
    }

    /// Freeze the signature, match it against the rules and queue the response.
    ///
    /// Synchronous requests are delivered before this returns; asynchronous ones
    /// wait for [`Simulator::deliver_at`] or [`Simulator::deliver_all`].
    pub fn send(&self, data: Option<Value>) -> Result<()> {
        let signature = {
            let mut state = self.state.lock();
            let signature = match (&state.builder, state.ready_state) {
                (Some(builder), ReadyState::Opened) => Arc::new(builder.build(data)),
                (_, ready_state) => {
                    return Err(XhrError::InvalidState {
                        operation: "send",
                        state: ready_state,
                    })
                }
            };
            state.signature = Some(Arc::clone(&signature));
            signature
        };
        self.simulator.record(Arc::clone(&signature));

        let rule = self.simulator.select_rule(&signature);
        debug!(
            "{} {} matched rule {}{}",
            signature.method,
            signature.url,
            rule.id(),
            if rule.is_fallback() { " (fallback)" } else { "" }
        );
        let response = rule.materialize(&signature, self)?;

        {
            let mut state = self.state.lock();
            state.matched_rule = Some(rule.id());
            state.response = Some(response);
        }
        self.simulator.enqueue(&self.state);

        if !signature.asynchronous {
            self.deliver();
        }
        Ok(())
    }

    /// Cancel the request.
    ///
    /// A request that already matched a rule is dropped from the pending queue and
    /// reset silently. Otherwise the reset to `Unsent` is notified.
    pub fn abort(&self) {
        let matched = self.state.lock().matched_rule.is_some();
        if matched {
            let was_pending = self.simulator.dequeue(&self.state);
            self.state.lock().ready_state = ReadyState::Unsent;
            debug!("Aborted matched request (was pending: {})", was_pending);
        } else {
            self.state.lock().ready_state = ReadyState::Unsent;
            self.notify();
        }
    }

    /// Copy the materialized response onto the request and complete it.
    pub(crate) fn deliver(&self) {
        self.simulator.dequeue(&self.state);
        {
            let mut state = self.state.lock();
            let Some((status, body)) = state
                .response
                .as_ref()
                .map(|r| (r.status_code(), r.body_text()))
            else {
                return;
            };
            state.status = status;
            state.response_text = body;
            state.ready_state = ReadyState::Done;
            debug!(
                "Delivered {} {} -> {}",
                state.signature.as_ref().map_or("", |s| s.method.as_str()),
                state.signature.as_ref().map_or("", |s| s.url.as_str()),
                status
            );
        }
        self.notify();
    }

    /// Run the listener outside the state lock so it can inspect the request.
    /// A listener replaced from inside its own invocation is kept.
    fn notify(&self) {
        let callback = self.state.lock().on_ready_state_change.take();
        if let Some(mut callback) = callback {
            callback(self);
            let mut state = self.state.lock();
            if state.on_ready_state_change.is_none() {
                state.on_ready_state_change = Some(callback);
            }
        }
    }

    /// Install the ready-state listener (`onreadystatechange`).
    pub fn on_ready_state_change<F>(&self, callback: F)
    where
        F: FnMut(&MockXhr) + Send + 'static,
    {
        self.state.lock().on_ready_state_change = Some(Box::new(callback));
    }

    pub fn clear_ready_state_change(&self) {
        self.state.lock().on_ready_state_change = None;
    }

    pub fn ready_state(&self) -> ReadyState {
        self.state.lock().ready_state
    }

    /// HTTP status; 0 until delivered.
    pub fn status(&self) -> u16 {
        self.state.lock().status
    }

    pub fn response_text(&self) -> String {
        self.state.lock().response_text.clone()
    }

    pub fn response_json<T: DeserializeOwned>(&self) -> serde_json::Result<T> {
        serde_json::from_str(&self.state.lock().response_text)
    }

    /// A response header, or `None` before a response has been matched.
    pub fn response_header(&self, name: &str) -> Option<String> {
        let state = self.state.lock();
        let response = state.response.as_ref()?;
        headers::response_header(response, name, self.simulator.config())
    }

    /// Every response header as `name: value` lines; empty before a response exists.
    pub fn all_response_headers(&self) -> String {
        let state = self.state.lock();
        state
            .response
            .as_ref()
            .map(|r| headers::all_response_headers(r, self.simulator.config()))
            .unwrap_or_default()
    }

    /// The signature frozen by the last `send`.
    pub fn signature(&self) -> Option<Arc<RequestSignature>> {
        self.state.lock().signature.clone()
    }

    pub fn matched_rule(&self) -> Option<RuleId> {
        self.state.lock().matched_rule
    }

    /// Whether the request sits in the pending queue.
    pub fn is_pending(&self) -> bool {
        self.simulator.is_pending(&self.state)
    }

    /// Whether both handles refer to the same request.
    pub fn same_request(&self, other: &MockXhr) -> bool {
        Arc::ptr_eq(&self.state, &other.state)
    }
}
