//! Request signatures: the frozen, matchable view of one simulated request.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Field names understood by [`RequestSignature::field`].
pub mod fields {
    pub const METHOD: &str = "method";
    pub const URL: &str = "url";
    pub const ASYNC: &str = "async";
    pub const USERNAME: &str = "username";
    pub const PASSWORD: &str = "password";
    pub const HEADERS: &str = "headers";
    pub const DATA: &str = "data";

    pub const ALL: [&str; 7] = [METHOD, URL, ASYNC, USERNAME, PASSWORD, HEADERS, DATA];
}

/// Observable fields of a sent request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequestSignature {
    pub method: String,
    pub url: String,
    #[serde(rename = "async")]
    pub asynchronous: bool,
    pub username: Option<String>,
    pub password: Option<String>,
    pub headers: BTreeMap<String, String>,
    pub data: Option<Value>,
}

impl RequestSignature {
    /// Value of a named field for predicate evaluation.
    ///
    /// Every known field is always present; absent credentials and data read as
    /// `null`. Unknown names return `None`, which rule matching treats as
    /// "no constraint".
    pub fn field(&self, name: &str) -> Option<Value> {
        let value = match name {
            fields::METHOD => Value::String(self.method.clone()),
            fields::URL => Value::String(self.url.clone()),
            fields::ASYNC => Value::Bool(self.asynchronous),
            fields::USERNAME => self.username.clone().map_or(Value::Null, Value::String),
            fields::PASSWORD => self.password.clone().map_or(Value::Null, Value::String),
            fields::HEADERS => Value::Object(
                self.headers
                    .iter()
                    .map(|(k, v)| (k.clone(), Value::String(v.clone())))
                    .collect(),
            ),
            fields::DATA => self.data.clone().unwrap_or(Value::Null),
            _ => return None,
        };
        Some(value)
    }
}

/// Signature skeleton accumulated between `open()` and `send()`.
#[derive(Debug, Clone, PartialEq)]
pub struct SignatureBuilder {
    method: String,
    url: String,
    asynchronous: bool,
    username: Option<String>,
    password: Option<String>,
    headers: BTreeMap<String, String>,
}

impl SignatureBuilder {
    pub fn new(
        method: &str,
        url: &str,
        asynchronous: bool,
        username: Option<String>,
        password: Option<String>,
    ) -> Self {
        Self {
            method: method.to_string(),
            url: url.to_string(),
            asynchronous,
            username: username.filter(|u| !u.is_empty()),
            password: password.filter(|p| !p.is_empty()),
            headers: BTreeMap::new(),
        }
    }

    /// Record a request header; a repeated name replaces the earlier value.
    pub fn header(&mut self, name: &str, value: &str) {
        self.headers.insert(name.to_string(), value.to_string());
    }

    /// Freeze the skeleton into a signature carrying the request body.
    pub fn build(&self, data: Option<Value>) -> RequestSignature {
        RequestSignature {
            method: self.method.clone(),
            url: self.url.clone(),
            asynchronous: self.asynchronous,
            username: self.username.clone(),
            password: self.password.clone(),
            headers: self.headers.clone(),
            data,
        }
    }
}
