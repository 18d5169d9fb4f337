//! Scenario files: declarative rules plus the requests to replay against them.

use super::SimulatorConfig;
use crate::error::XhrError;
use crate::predicate::{LogicalMatcher, PredicateOptions};
use crate::rules::{Predicates, ResponseSpec};
use crate::xhr::OpenOptions;
use anyhow::Context;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::Path;

/// A complete scenario document (YAML or JSON).
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Scenario {
    #[serde(default)]
    pub simulator: SimulatorConfig,
    /// Rules in registration order; later rules take priority
    #[serde(default)]
    pub rules: Vec<RuleConfig>,
    #[serde(default)]
    pub requests: Vec<RequestConfig>,
}

/// One declarative rule.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RuleConfig {
    /// Field name to predicate; empty matches every request
    #[serde(default)]
    pub when: BTreeMap<String, LogicalMatcher>,
    #[serde(default)]
    pub options: PredicateOptions,
    #[serde(default)]
    pub respond: ResponseSpec,
}

impl RuleConfig {
    pub fn predicates(&self) -> Result<Predicates, XhrError> {
        Ok(Predicates::compile(&self.when, &self.options)?)
    }
}

/// One request to replay.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestConfig {
    #[serde(default = "default_method")]
    pub method: String,
    pub url: String,
    /// Asynchronous requests are delivered after every request has been sent
    #[serde(rename = "async", default)]
    pub asynchronous: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub headers: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expect: Option<Expectation>,
}

fn default_method() -> String {
    "GET".to_string()
}

impl RequestConfig {
    pub fn open_options(&self) -> OpenOptions {
        OpenOptions {
            asynchronous: self.asynchronous,
            username: self.username.clone(),
            password: self.password.clone(),
        }
    }
}

/// What a replayed request should have received.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Expectation {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub headers: BTreeMap<String, String>,
}

impl Scenario {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, anyhow::Error> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read scenario {}", path.display()))?;
        Self::parse(&contents).with_context(|| format!("invalid scenario {}", path.display()))
    }

    /// Parse and validate a YAML (or JSON) scenario document.
    pub fn parse(contents: &str) -> Result<Self, anyhow::Error> {
        let scenario: Scenario = serde_yaml::from_str(contents)?;
        scenario.validate()?;
        Ok(scenario)
    }

    /// Check the simulator settings and that every rule's predicates compile.
    pub fn validate(&self) -> Result<(), anyhow::Error> {
        self.simulator.validate()?;
        for (index, rule) in self.rules.iter().enumerate() {
            rule.predicates()
                .with_context(|| format!("rules[{index}] has an invalid predicate"))?;
        }
        for (index, request) in self.requests.iter().enumerate() {
            if request.url.is_empty() {
                anyhow::bail!("requests[{index}] has an empty url");
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const SCENARIO: &str = r#"
rules:
  - when:
      url: { startsWith: /good }
    respond: { status: 200, data: 200-ok }
  - when:
      method: { or: [ { equals: PUT }, { equals: DELETE } ] }
      url: { matches: 'blog/\d+' }
      username: { equals: admin }
    respond: { data: manipulate-ok }
requests:
  - url: /good/1
    expect: { status: 200, body: 200-ok }
  - method: PUT
    url: /my/blog/143
    username: admin
    async: true
"#;

    #[test]
    fn test_parse_scenario() {
        let scenario = Scenario::parse(SCENARIO).unwrap();

        assert_eq!(scenario.rules.len(), 2);
        assert_eq!(scenario.rules[1].when.len(), 3);
        assert_eq!(scenario.rules[0].respond.data, Some(json!("200-ok")));

        assert_eq!(scenario.requests[0].method, "GET");
        assert!(!scenario.requests[0].asynchronous);
        assert_eq!(
            scenario.requests[0].expect.as_ref().unwrap().status,
            Some(200)
        );

        let options = scenario.requests[1].open_options();
        assert!(options.asynchronous);
        assert_eq!(options.username.as_deref(), Some("admin"));
    }

    #[test]
    fn test_parse_json_scenario() {
        let json = r#"{"rules": [{"respond": {"data": {"foo": "bar"}}}], "requests": [{"url": "/bar"}]}"#;
        let scenario = Scenario::parse(json).unwrap();

        assert!(scenario.rules[0].when.is_empty());
        assert_eq!(scenario.rules[0].respond.data, Some(json!({"foo": "bar"})));
    }

    #[test]
    fn test_invalid_regex_reports_rule_index() {
        let yaml = r#"
rules:
  - respond: { data: ok }
  - when: { url: { matches: '(unclosed' } }
"#;
        let err = Scenario::parse(yaml).unwrap_err();
        assert!(format!("{err:#}").contains("rules[1] has an invalid predicate"));
    }

    #[test]
    fn test_empty_url_rejected() {
        let err = Scenario::parse("requests: [ { url: '' } ]").unwrap_err();
        assert!(err.to_string().contains("requests[0] has an empty url"));
    }
}
