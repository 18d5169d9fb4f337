//! Response rules: predicate maps bound to response specifications.
//!
//! ## Module Structure
//!
//! - `registry`: ordered rule storage and reverse-order selection
//! - `response`: response specifications and materialization

mod registry;
mod response;

pub use registry::RuleRegistry;
pub use response::{ResponseFn, ResponseSource, ResponseSpec, ResponseType};

use crate::predicate::{compile_field, LogicalMatcher, Matcher, PredicateOptions};
use crate::signature::{fields, RequestSignature};
use crate::xhr::MockXhr;
use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// Identifier of a registered rule. The fallback rule is always `RuleId(0)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RuleId(pub u64);

impl RuleId {
    pub const FALLBACK: RuleId = RuleId(0);
}

impl fmt::Display for RuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Mapping from signature field name to the matcher that field must satisfy.
#[derive(Debug, Default)]
pub struct Predicates {
    fields: BTreeMap<String, Box<dyn Matcher>>,
}

impl Predicates {
    /// An empty map; a rule with no predicates matches every request.
    pub fn new() -> Self {
        Self::default()
    }

    /// Constrain a field (see [`fields`]). Later calls for the same field replace it.
    pub fn with(mut self, field: impl Into<String>, matcher: impl Matcher + 'static) -> Self {
        self.insert(field, Box::new(matcher));
        self
    }

    pub fn method(self, matcher: impl Matcher + 'static) -> Self {
        self.with(fields::METHOD, matcher)
    }

    pub fn url(self, matcher: impl Matcher + 'static) -> Self {
        self.with(fields::URL, matcher)
    }

    pub fn insert(&mut self, field: impl Into<String>, matcher: Box<dyn Matcher>) {
        self.fields.insert(field.into(), matcher);
    }

    /// Compile declarative field predicates (scenario files).
    pub fn compile(
        when: &BTreeMap<String, LogicalMatcher>,
        options: &PredicateOptions,
    ) -> Result<Self, regex::Error> {
        let mut predicates = Self::new();
        for (field, matcher) in when {
            predicates.insert(field.clone(), compile_field(matcher, options)?);
        }
        Ok(predicates)
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    /// Every constrained field that the signature carries must match.
    /// Fields the signature does not know are no constraint.
    pub fn satisfied_by(&self, signature: &RequestSignature) -> bool {
        self.fields.iter().all(|(name, matcher)| {
            signature
                .field(name)
                .map_or(true, |value| matcher.matches(&value))
        })
    }
}

/// A predicate map bound to a response.
///
/// The response lives in a mutex because it is filled in after registration and
/// because serialized JSON bodies are cached back onto static responses.
#[derive(Debug)]
pub struct Rule {
    id: RuleId,
    predicates: Predicates,
    response: Mutex<ResponseSource>,
}

impl Rule {
    fn new(id: RuleId, predicates: Predicates, response: ResponseSource) -> Self {
        Self {
            id,
            predicates,
            response: Mutex::new(response),
        }
    }

    pub fn id(&self) -> RuleId {
        self.id
    }

    pub fn is_fallback(&self) -> bool {
        self.id == RuleId::FALLBACK
    }

    pub fn predicates(&self) -> &Predicates {
        &self.predicates
    }

    pub fn matches(&self, signature: &RequestSignature) -> bool {
        self.predicates.satisfied_by(signature)
    }

    /// Current response source, including any cached serialized body.
    pub fn response(&self) -> ResponseSource {
        self.response.lock().clone()
    }
}

/// Handle returned by registration; fills in the rule's response.
#[derive(Debug, Clone)]
pub struct RuleHandle {
    rule: Arc<Rule>,
}

impl RuleHandle {
    pub fn id(&self) -> RuleId {
        self.rule.id
    }

    pub fn rule(&self) -> &Arc<Rule> {
        &self.rule
    }

    /// Set the response delivered to requests matching this rule.
    pub fn set_response(&self, response: impl Into<ResponseSource>) -> &Self {
        *self.rule.response.lock() = response.into();
        self
    }

    /// Compute the response per request from its signature and the request object.
    pub fn set_response_fn<F>(&self, f: F) -> &Self
    where
        F: Fn(&RequestSignature, &MockXhr) -> ResponseSpec + Send + Sync + 'static,
    {
        self.set_response(ResponseSource::Computed(Arc::new(f)))
    }

    pub fn response(&self) -> ResponseSource {
        self.rule.response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::predicate::{equal_to, starts_with, StringMatcher};
    use crate::signature::SignatureBuilder;
    use serde_json::json;

    fn signature(method: &str, url: &str) -> RequestSignature {
        SignatureBuilder::new(method, url, true, None, None).build(None)
    }

    #[test]
    fn test_empty_predicates_match_everything() {
        let predicates = Predicates::new();
        assert!(predicates.is_empty());
        assert!(predicates.satisfied_by(&signature("DELETE", "/anything")));
    }

    #[test]
    fn test_all_fields_must_match() {
        let predicates = Predicates::new()
            .method(equal_to("HEAD"))
            .url(starts_with("/good"));

        assert!(predicates.satisfied_by(&signature("HEAD", "/good?foo=bar")));
        assert!(!predicates.satisfied_by(&signature("GET", "/good?foo=bar")));
        assert!(!predicates.satisfied_by(&signature("HEAD", "/bad")));
    }

    #[test]
    fn test_unknown_field_is_no_constraint() {
        let predicates = Predicates::new()
            .with("cookies", equal_to("never"))
            .url(starts_with("/"));

        assert!(predicates.satisfied_by(&signature("GET", "/x")));
    }

    #[test]
    fn test_null_field_is_still_checked() {
        let predicates = Predicates::new().with(fields::USERNAME, equal_to("me"));
        assert!(!predicates.satisfied_by(&signature("GET", "/x")));
    }

    #[test]
    fn test_compile_declarative_predicates() {
        let mut when = BTreeMap::new();
        when.insert(
            "url".to_string(),
            LogicalMatcher::Leaf(StringMatcher::StartsWith("/API".to_string())),
        );
        let options = PredicateOptions {
            case_sensitive: false,
            ..Default::default()
        };
        let predicates = Predicates::compile(&when, &options).unwrap();

        assert_eq!(predicates.field_names().collect::<Vec<_>>(), vec!["url"]);
        assert!(predicates.satisfied_by(&signature("GET", "/api/v1")));
    }

    #[test]
    fn test_handle_sets_response() {
        let rule = Arc::new(Rule::new(
            RuleId(3),
            Predicates::new(),
            ResponseSource::default(),
        ));
        let handle = RuleHandle {
            rule: Arc::clone(&rule),
        };
        handle.set_response(ResponseSpec::new().with_status(201).with_data(json!("made")));

        match rule.response() {
            ResponseSource::Static(spec) => {
                assert_eq!(spec.status, Some(201));
                assert_eq!(spec.data, Some(json!("made")));
            }
            other => panic!("expected static response, got {other:?}"),
        }
        assert_eq!(handle.id(), RuleId(3));
        assert!(!rule.is_fallback());
    }
}
