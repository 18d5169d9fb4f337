//! Pluggable predicates for rule matching.
//!
//! The simulator only needs the [`Matcher`] capability. This module also ships a
//! stock predicate library so rules can be declared without pulling in a separate
//! matcher crate, both from code and from scenario files.
//!
//! # Module Structure
//!
//! - `matcher` - The `Matcher` trait, deep equality and closure adapters
//! - `string_matcher` - String operators (equals, contains, startsWith, endsWith, matches, exists)
//! - `logical` - Logical operators (not, or, and)
//! - `options` - Predicate options (caseSensitive, except, not)
//!
//! # Example
//!
//! ```
//! use rift_xhr::predicate::{any_of, equal_to, starts_with, Matcher};
//! use serde_json::json;
//!
//! let method = any_of(vec![Box::new(equal_to("GET")), Box::new(equal_to("POST"))]);
//! assert!(method.matches(&json!("POST")));
//! assert!(starts_with("/good").matches(&json!("/good/1")));
//! ```

mod logical;
mod matcher;
mod options;
mod string_matcher;

pub use logical::{compile_field, CompiledLogicalMatcher, LogicalMatcher};
pub use matcher::{value_text, CachedValue, FnMatcher, Matcher, ValueEquals};
pub use options::PredicateOptions;
pub use string_matcher::{CompiledExcept, CompiledStringMatcher, StringMatcher};

use serde_json::Value;

/// Deep equality with an expected value.
pub fn equal_to(expected: impl Into<Value>) -> ValueEquals {
    ValueEquals(expected.into())
}

/// Alias of [`equal_to`], for rules read as `async: is(false)`.
pub fn is(expected: impl Into<Value>) -> ValueEquals {
    equal_to(expected)
}

/// Case-sensitive substring match on the field's text form.
pub fn contains(needle: impl Into<String>) -> CompiledStringMatcher {
    CompiledStringMatcher::contains(needle)
}

/// Case-sensitive prefix match on the field's text form.
pub fn starts_with(prefix: impl Into<String>) -> CompiledStringMatcher {
    CompiledStringMatcher::starts_with(prefix)
}

/// Case-sensitive suffix match on the field's text form.
pub fn ends_with(suffix: impl Into<String>) -> CompiledStringMatcher {
    CompiledStringMatcher::ends_with(suffix)
}

/// Regex match on the field's text form.
pub fn matches_pattern(pattern: &str) -> Result<CompiledStringMatcher, regex::Error> {
    CompiledStringMatcher::pattern(pattern)
}

/// Field is non-null (`true`) or null (`false`).
pub fn exists(should_exist: bool) -> CompiledStringMatcher {
    CompiledStringMatcher::exists(should_exist)
}

pub fn any_of(matchers: Vec<Box<dyn Matcher>>) -> CompiledLogicalMatcher {
    CompiledLogicalMatcher::Or(matchers)
}

pub fn all_of(matchers: Vec<Box<dyn Matcher>>) -> CompiledLogicalMatcher {
    CompiledLogicalMatcher::And(matchers)
}

pub fn not(matcher: impl Matcher + 'static) -> CompiledLogicalMatcher {
    CompiledLogicalMatcher::Not(Box::new(matcher))
}

/// Wrap a closure as a matcher.
pub fn predicate_fn<F>(f: F) -> FnMatcher<F>
where
    F: Fn(&Value) -> bool + Send + Sync,
{
    FnMatcher::new(f)
}
