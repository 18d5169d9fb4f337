//! Logical operators for combining predicates: NOT, OR, AND.

use super::matcher::Matcher;
use super::options::PredicateOptions;
use super::string_matcher::{CompiledStringMatcher, StringMatcher};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Declarative field predicate: a string operator or a logical combination of them.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub enum LogicalMatcher {
    /// Negates the inner matcher
    Not(Box<LogicalMatcher>),

    /// Matches if ANY of the inner matchers match
    Or(Vec<LogicalMatcher>),

    /// Matches if ALL of the inner matchers match
    And(Vec<LogicalMatcher>),

    /// A leaf string matcher
    #[serde(untagged)]
    Leaf(StringMatcher),
}

impl Default for LogicalMatcher {
    fn default() -> Self {
        LogicalMatcher::Leaf(StringMatcher::Exists(true))
    }
}

/// Logical combination over arbitrary matchers.
///
/// Produced by compiling a [`LogicalMatcher`] and by the `any_of` / `all_of` / `not`
/// constructors. An empty `Or` never matches; an empty `And` always does.
#[derive(Debug)]
pub enum CompiledLogicalMatcher {
    Not(Box<dyn Matcher>),
    Or(Vec<Box<dyn Matcher>>),
    And(Vec<Box<dyn Matcher>>),
}

impl CompiledLogicalMatcher {
    /// Compile a LogicalMatcher; leaves become [`CompiledStringMatcher`]s.
    pub fn compile(
        matcher: &LogicalMatcher,
        options: &PredicateOptions,
    ) -> Result<Box<dyn Matcher>, regex::Error> {
        let compile_all = |matchers: &[LogicalMatcher]| {
            matchers
                .iter()
                .map(|m| Self::compile(m, options))
                .collect::<Result<Vec<_>, _>>()
        };

        let compiled: Box<dyn Matcher> = match matcher {
            LogicalMatcher::Not(inner) => {
                Box::new(CompiledLogicalMatcher::Not(Self::compile(inner, options)?))
            }
            LogicalMatcher::Or(matchers) => {
                Box::new(CompiledLogicalMatcher::Or(compile_all(matchers)?))
            }
            LogicalMatcher::And(matchers) => {
                Box::new(CompiledLogicalMatcher::And(compile_all(matchers)?))
            }
            LogicalMatcher::Leaf(leaf) => Box::new(CompiledStringMatcher::compile(leaf, options)?),
        };
        Ok(compiled)
    }
}

impl Matcher for CompiledLogicalMatcher {
    fn matches(&self, value: &Value) -> bool {
        match self {
            CompiledLogicalMatcher::Not(inner) => !inner.matches(value),
            CompiledLogicalMatcher::Or(matchers) => matchers.iter().any(|m| m.matches(value)),
            CompiledLogicalMatcher::And(matchers) => matchers.iter().all(|m| m.matches(value)),
        }
    }
}

/// Compile a rule field predicate, applying `options.not` to the whole expression.
pub fn compile_field(
    matcher: &LogicalMatcher,
    options: &PredicateOptions,
) -> Result<Box<dyn Matcher>, regex::Error> {
    let compiled = CompiledLogicalMatcher::compile(matcher, options)?;
    if options.not {
        Ok(Box::new(CompiledLogicalMatcher::Not(compiled)))
    } else {
        Ok(compiled)
    }
}
