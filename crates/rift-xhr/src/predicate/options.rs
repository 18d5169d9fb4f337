//! Rule-wide options for declarative predicates.

use serde::{Deserialize, Serialize};

/// Applied to every field predicate of one declarative rule.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct PredicateOptions {
    /// String operators and regexes compare case-sensitively
    pub case_sensitive: bool,

    /// Regex removed from field text before any operator sees it
    #[serde(skip_serializing_if = "Option::is_none")]
    pub except: Option<String>,

    /// Invert each field predicate
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub not: bool,
}

impl Default for PredicateOptions {
    fn default() -> Self {
        Self {
            case_sensitive: true,
            except: None,
            not: false,
        }
    }
}

impl PredicateOptions {
    pub fn case_insensitive(mut self) -> Self {
        self.case_sensitive = false;
        self
    }

    pub fn with_except(mut self, pattern: impl Into<String>) -> Self {
        self.except = Some(pattern.into());
        self
    }

    pub fn negated(mut self) -> Self {
        self.not = true;
        self
    }
}
