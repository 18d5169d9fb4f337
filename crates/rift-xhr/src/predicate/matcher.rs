//! The matcher capability and the helpers shared by the stock matchers.
//!
//! - `Matcher` - the single operation every predicate exposes
//! - `CachedValue` - a pattern with pre-computed lowercase for case-insensitive matching
//! - `value_text` - the text form of a signature field used by string matchers
//! - `ValueEquals` / `FnMatcher` - deep equality and closure adapters

use serde_json::Value;
use std::borrow::Cow;
use std::fmt;
use std::sync::Arc;

/// A predicate over one signature field.
///
/// The simulator depends on nothing but this operation; any type can be used in a
/// rule's predicate map by implementing it.
pub trait Matcher: Send + Sync + fmt::Debug {
    fn matches(&self, value: &Value) -> bool;
}

impl<M: Matcher + ?Sized> Matcher for Box<M> {
    fn matches(&self, value: &Value) -> bool {
        (**self).matches(value)
    }
}

impl<M: Matcher + ?Sized> Matcher for Arc<M> {
    fn matches(&self, value: &Value) -> bool {
        (**self).matches(value)
    }
}

/// Text form of a field value for string comparison.
///
/// `null` is treated as an absent value. Scalars use their literal form and
/// objects/arrays their compact JSON.
pub fn value_text(value: &Value) -> Option<Cow<'_, str>> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(Cow::Borrowed(s.as_str())),
        Value::Bool(b) => Some(Cow::Owned(b.to_string())),
        Value::Number(n) => Some(Cow::Owned(n.to_string())),
        other => Some(Cow::Owned(other.to_string())),
    }
}

/// A string value with pre-computed lowercase for efficient case-insensitive matching.
#[derive(Debug, Clone, PartialEq)]
pub struct CachedValue {
    /// Original value (for case-sensitive matching)
    pub value: String,
    /// Pre-computed lowercase (for case-insensitive matching)
    pub lower: String,
}

impl CachedValue {
    pub fn new(value: impl Into<String>) -> Self {
        let value = value.into();
        let lower = value.to_lowercase();
        Self { value, lower }
    }

    #[inline]
    pub fn equals(&self, value: &str, case_sensitive: bool) -> bool {
        if case_sensitive {
            value == self.value
        } else {
            value.to_lowercase() == self.lower
        }
    }

    #[inline]
    pub fn contained_in(&self, value: &str, case_sensitive: bool) -> bool {
        if case_sensitive {
            value.contains(&self.value)
        } else {
            value.to_lowercase().contains(&self.lower)
        }
    }

    #[inline]
    pub fn starts(&self, value: &str, case_sensitive: bool) -> bool {
        if case_sensitive {
            value.starts_with(&self.value)
        } else {
            value.to_lowercase().starts_with(&self.lower)
        }
    }

    #[inline]
    pub fn ends(&self, value: &str, case_sensitive: bool) -> bool {
        if case_sensitive {
            value.ends_with(&self.value)
        } else {
            value.to_lowercase().ends_with(&self.lower)
        }
    }
}

impl From<&str> for CachedValue {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// Deep equality against an expected JSON value.
#[derive(Debug, Clone, PartialEq)]
pub struct ValueEquals(pub Value);

impl Matcher for ValueEquals {
    fn matches(&self, value: &Value) -> bool {
        *value == self.0
    }
}

/// Adapter turning any `Fn(&Value) -> bool` into a matcher.
pub struct FnMatcher<F> {
    f: F,
}

impl<F> FnMatcher<F>
where
    F: Fn(&Value) -> bool + Send + Sync,
{
    pub fn new(f: F) -> Self {
        Self { f }
    }
}

impl<F> fmt::Debug for FnMatcher<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("FnMatcher")
    }
}

impl<F> Matcher for FnMatcher<F>
where
    F: Fn(&Value) -> bool + Send + Sync,
{
    fn matches(&self, value: &Value) -> bool {
        (self.f)(value)
    }
}
