//! String operators for declarative predicates.
//!
//! `StringMatcher` is the serde form used in scenario files; `CompiledStringMatcher`
//! is the runtime form that implements [`Matcher`].

use super::matcher::{value_text, CachedValue, Matcher};
use super::options::PredicateOptions;
use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;

/// String matching operator for comparing field values.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub enum StringMatcher {
    /// Exact string equality
    Equals(String),

    /// String contains substring
    Contains(String),

    /// String starts with prefix
    StartsWith(String),

    /// String ends with suffix
    EndsWith(String),

    /// Regex pattern match
    Matches(String),

    /// Field existence check (value is whether field should exist)
    Exists(bool),
}

impl Default for StringMatcher {
    fn default() -> Self {
        StringMatcher::Exists(true)
    }
}

#[derive(Debug, Clone)]
enum StringOp {
    Equals(CachedValue),
    Contains(CachedValue),
    StartsWith(CachedValue),
    EndsWith(CachedValue),
    Matches(Arc<Regex>),
    Exists(bool),
}

/// Compiled except regex, stripped from values before comparison.
#[derive(Debug, Clone)]
pub struct CompiledExcept {
    pub regex: Arc<Regex>,
}

impl CompiledExcept {
    pub fn compile(pattern: &str) -> Result<Self, regex::Error> {
        Ok(CompiledExcept {
            regex: Arc::new(Regex::new(pattern)?),
        })
    }

    pub fn apply(&self, value: &str) -> String {
        self.regex.replace_all(value, "").to_string()
    }
}

/// Runtime form of a [`StringMatcher`] with its options baked in.
#[derive(Debug, Clone)]
pub struct CompiledStringMatcher {
    op: StringOp,
    case_sensitive: bool,
    except: Option<CompiledExcept>,
}

impl CompiledStringMatcher {
    /// Compile a StringMatcher. `options.not` is not applied here; see
    /// [`compile_field`](super::compile_field).
    pub fn compile(
        matcher: &StringMatcher,
        options: &PredicateOptions,
    ) -> Result<Self, regex::Error> {
        let op = match matcher {
            StringMatcher::Equals(v) => StringOp::Equals(CachedValue::new(v.as_str())),
            StringMatcher::Contains(v) => StringOp::Contains(CachedValue::new(v.as_str())),
            StringMatcher::StartsWith(v) => StringOp::StartsWith(CachedValue::new(v.as_str())),
            StringMatcher::EndsWith(v) => StringOp::EndsWith(CachedValue::new(v.as_str())),
            StringMatcher::Matches(pattern) => {
                let regex = RegexBuilder::new(pattern)
                    .case_insensitive(!options.case_sensitive)
                    .build()?;
                StringOp::Matches(Arc::new(regex))
            }
            StringMatcher::Exists(exists) => StringOp::Exists(*exists),
        };
        let except = options
            .except
            .as_deref()
            .filter(|p| !p.is_empty())
            .map(CompiledExcept::compile)
            .transpose()?;

        Ok(Self {
            op,
            case_sensitive: options.case_sensitive,
            except,
        })
    }

    fn with_defaults(op: StringOp) -> Self {
        Self {
            op,
            case_sensitive: true,
            except: None,
        }
    }

    pub fn equals(value: impl Into<String>) -> Self {
        Self::with_defaults(StringOp::Equals(CachedValue::new(value)))
    }

    pub fn contains(value: impl Into<String>) -> Self {
        Self::with_defaults(StringOp::Contains(CachedValue::new(value)))
    }

    pub fn starts_with(value: impl Into<String>) -> Self {
        Self::with_defaults(StringOp::StartsWith(CachedValue::new(value)))
    }

    pub fn ends_with(value: impl Into<String>) -> Self {
        Self::with_defaults(StringOp::EndsWith(CachedValue::new(value)))
    }

    pub fn pattern(pattern: &str) -> Result<Self, regex::Error> {
        Ok(Self::with_defaults(StringOp::Matches(Arc::new(
            Regex::new(pattern)?,
        ))))
    }

    pub fn exists(should_exist: bool) -> Self {
        Self::with_defaults(StringOp::Exists(should_exist))
    }

    /// Check a text value (None when the field is absent or null).
    pub fn matches_text(&self, value: Option<&str>) -> bool {
        let stripped;
        let value = match (value, &self.except) {
            (Some(v), Some(except)) => {
                stripped = except.apply(v);
                Some(stripped.as_str())
            }
            (v, _) => v,
        };

        match (&self.op, value) {
            (StringOp::Exists(should_exist), v) => *should_exist == v.is_some(),

            // For all other operators, value must exist
            (_, None) => false,

            (StringOp::Equals(cached), Some(v)) => cached.equals(v, self.case_sensitive),
            (StringOp::Contains(cached), Some(v)) => cached.contained_in(v, self.case_sensitive),
            (StringOp::StartsWith(cached), Some(v)) => cached.starts(v, self.case_sensitive),
            (StringOp::EndsWith(cached), Some(v)) => cached.ends(v, self.case_sensitive),
            (StringOp::Matches(regex), Some(v)) => regex.is_match(v),
        }
    }
}

impl Matcher for CompiledStringMatcher {
    fn matches(&self, value: &Value) -> bool {
        self.matches_text(value_text(value).as_deref())
    }
}
