//! Rift XHR: a deterministic simulated request object for testing request code
//! without a network or server.
//!
//! Tests declare rules (a predicate map plus a response) on a [`Simulator`], hand
//! the code under test a [`MockXhr`] (through [`Simulator::request_factory`]), and
//! then decide when and in which order responses arrive. Timer callbacks can be
//! captured through the [`Scheduler`] seam and fired on demand, so timeouts are
//! driven by the test instead of a clock.
//!
//! # Example
//!
//! ```
//! use rift_xhr::predicate::starts_with;
//! use rift_xhr::{OpenOptions, Predicates, ReadyState, ResponseSpec, Simulator};
//!
//! let sim = Simulator::new();
//! sim.register(Predicates::new().url(starts_with("/good")))
//!     .set_response(ResponseSpec::new().with_status(200).with_data("200-ok"));
//!
//! // Synchronous requests complete inside send()
//! let xhr = sim.new_request();
//! xhr.open_with("GET", "/good/1", OpenOptions::synchronous());
//! xhr.send(None).unwrap();
//! assert_eq!(xhr.ready_state(), ReadyState::Done);
//! assert_eq!(xhr.response_text(), "200-ok");
//!
//! // Asynchronous requests wait for the test
//! let pending = sim.new_request();
//! pending.open("GET", "/missing");
//! pending.send(None).unwrap();
//! assert_eq!(pending.ready_state(), ReadyState::Opened);
//! sim.deliver_at(0);
//! assert_eq!(pending.status(), 404);
//! ```
//!
//! # Module Structure
//!
//! - `predicate` - The `Matcher` capability and a stock predicate library
//! - `signature` - Frozen request signatures
//! - `rules` - Rules, the registry and response materialization
//! - `xhr` - The simulated request object
//! - `queue` - Pending response and deferred callback queues
//! - `simulator` - The environment tying them together
//! - `config` - Simulator settings and scenario files
//! - `runner` - Scenario replay

pub mod config;
pub mod error;
pub mod predicate;
pub mod queue;
pub mod rules;
pub mod runner;
pub mod signature;
pub mod simulator;
pub mod xhr;

pub use config::{Scenario, SimulatorConfig};
pub use error::{Result, XhrError};
pub use queue::{Scheduler, TimerCallback, TimerHandle};
pub use rules::{Predicates, ResponseSource, ResponseSpec, ResponseType, RuleHandle, RuleId};
pub use runner::{run_scenario, RequestOutcome, ScenarioReport};
pub use signature::RequestSignature;
pub use simulator::{RequestFactory, Simulator};
pub use xhr::{MockXhr, OpenOptions, ReadyState};
