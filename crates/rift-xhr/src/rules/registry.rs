//! Ordered rule storage with reverse-order (latest wins) selection.

use super::{Predicates, ResponseSource, ResponseSpec, Rule, RuleHandle, RuleId};
use crate::signature::RequestSignature;
use std::sync::Arc;
use tracing::debug;

/// Rules in registration order. The fallback rule is always first.
#[derive(Debug, Clone)]
pub struct RuleRegistry {
    rules: Vec<Arc<Rule>>,
    next_id: u64,
    fallback: ResponseSpec,
}

impl RuleRegistry {
    /// A registry holding only the fallback rule, answering with `fallback`.
    pub fn new(fallback: ResponseSpec) -> Self {
        let mut registry = Self {
            rules: Vec::new(),
            next_id: 0,
            fallback,
        };
        registry.reset();
        registry
    }

    /// Append a rule with an empty response; the handle fills it in.
    pub fn register(&mut self, predicates: Predicates) -> RuleHandle {
        let id = RuleId(self.next_id);
        self.next_id += 1;
        debug!(
            "Registered rule {} on fields [{}]",
            id,
            predicates.field_names().collect::<Vec<_>>().join(", ")
        );
        let rule = Arc::new(Rule::new(id, predicates, ResponseSource::default()));
        self.rules.push(Arc::clone(&rule));
        RuleHandle { rule }
    }

    /// Drop every rule except a freshly built fallback.
    pub fn reset(&mut self) {
        let fallback = Rule::new(
            RuleId::FALLBACK,
            Predicates::new(),
            ResponseSource::Static(self.fallback.clone()),
        );
        self.rules = vec![Arc::new(fallback)];
        self.next_id = RuleId::FALLBACK.0 + 1;
    }

    /// Most recently registered matching rule; the fallback when nothing else matches.
    pub fn select(&self, signature: &RequestSignature) -> Arc<Rule> {
        let selected = self
            .rules
            .iter()
            .rev()
            .find(|rule| rule.matches(signature))
            .unwrap_or(&self.rules[0]);
        Arc::clone(selected)
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn rules(&self) -> &[Arc<Rule>] {
        &self.rules
    }
}
