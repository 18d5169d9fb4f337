//! Configuration types for the simulator and scenario files.

mod scenario;

pub use scenario::{Expectation, RequestConfig, RuleConfig, Scenario};

use crate::rules::ResponseSpec;
use anyhow::Context;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Body of the fallback response when nothing else matches.
pub const FALLBACK_BODY: &str = "no matching response";

/// Simulator-wide settings. Every field has a default, so an empty document is valid.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SimulatorConfig {
    /// Value of the canned `server` response header
    #[serde(default = "default_server")]
    pub server: String,

    /// Value of the canned `last-modified` response header
    #[serde(default)]
    pub last_modified: DateTime<Utc>,

    /// Response of the fallback rule
    #[serde(default = "default_fallback")]
    pub fallback: ResponseSpec,
}

fn default_server() -> String {
    format!("rift-xhr/{}", env!("CARGO_PKG_VERSION"))
}

fn default_fallback() -> ResponseSpec {
    ResponseSpec::new().with_status(404).with_data(FALLBACK_BODY)
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        Self {
            server: default_server(),
            last_modified: DateTime::<Utc>::default(),
            fallback: default_fallback(),
        }
    }
}

impl SimulatorConfig {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, anyhow::Error> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read simulator config {}", path.display()))?;
        let config: SimulatorConfig = serde_yaml::from_str(&contents)
            .with_context(|| format!("failed to parse simulator config {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        let status = self.fallback.status_code();
        if !(100..=599).contains(&status) {
            anyhow::bail!("fallback status {status} is not a valid HTTP status (100-599)");
        }
        Ok(())
    }

    /// `last_modified` as an HTTP date.
    pub fn last_modified_header(&self) -> String {
        self.last_modified
            .format("%a, %d %b %Y %H:%M:%S GMT")
            .to_string()
    }
}
