//! Replays a scenario against a fresh simulator and checks expectations.

use crate::config::{RequestConfig, Scenario};
use crate::error::XhrError;
use crate::rules::RuleId;
use crate::simulator::Simulator;
use crate::xhr::MockXhr;
use serde::Serialize;
use tracing::{debug, info};

/// Result of one replayed request.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestOutcome {
    pub index: usize,
    pub method: String,
    pub url: String,
    pub status: u16,
    pub body: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rule: Option<u64>,
    pub fallback: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub failures: Vec<String>,
}

/// Outcomes of every request, in scenario order.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScenarioReport {
    pub outcomes: Vec<RequestOutcome>,
}

impl ScenarioReport {
    pub fn failure_count(&self) -> usize {
        self.outcomes.iter().map(|o| o.failures.len()).sum()
    }

    pub fn passed(&self) -> bool {
        self.failure_count() == 0
    }
}

/// Register the scenario's rules on a new simulator and replay its requests.
///
/// Synchronous requests complete as they are sent; asynchronous ones are delivered
/// in send order once every request has been sent.
pub fn run_scenario(scenario: &Scenario) -> Result<ScenarioReport, XhrError> {
    let simulator = Simulator::with_config(scenario.simulator.clone());
    for rule in &scenario.rules {
        simulator
            .register(rule.predicates()?)
            .set_response(rule.respond.clone());
    }

    let mut sent = Vec::with_capacity(scenario.requests.len());
    for request in &scenario.requests {
        let xhr = simulator.new_request();
        xhr.open_with(&request.method, &request.url, request.open_options());
        for (name, value) in &request.headers {
            xhr.set_header(name, value)?;
        }
        xhr.send(request.data.clone())?;
        sent.push(xhr);
    }

    let delivered = simulator.deliver_all();
    debug!("Delivered {} asynchronous request(s)", delivered);

    let report = ScenarioReport {
        outcomes: scenario
            .requests
            .iter()
            .zip(&sent)
            .enumerate()
            .map(|(index, (request, xhr))| outcome(index, request, xhr))
            .collect(),
    };
    info!(
        "Replayed {} request(s) against {} rule(s): {} failure(s)",
        report.outcomes.len(),
        scenario.rules.len(),
        report.failure_count()
    );
    Ok(report)
}

fn outcome(index: usize, request: &RequestConfig, xhr: &MockXhr) -> RequestOutcome {
    let status = xhr.status();
    let body = xhr.response_text();
    let rule = xhr.matched_rule();

    let mut failures = Vec::new();
    if let Some(expect) = &request.expect {
        if let Some(expected) = expect.status {
            if expected != status {
                failures.push(format!("expected status {expected}, got {status}"));
            }
        }
        if let Some(expected) = &expect.body {
            if *expected != body {
                failures.push(format!("expected body {expected:?}, got {body:?}"));
            }
        }
        for (name, expected) in &expect.headers {
            match xhr.response_header(name) {
                Some(actual) if actual == *expected => {}
                actual => failures.push(format!(
                    "expected header {name}: {expected:?}, got {:?}",
                    actual.unwrap_or_default()
                )),
            }
        }
    }

    RequestOutcome {
        index,
        method: request.method.clone(),
        url: request.url.clone(),
        status,
        body,
        rule: rule.map(|id| id.0),
        fallback: rule == Some(RuleId::FALLBACK),
        failures,
    }
}
