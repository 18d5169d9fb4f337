//! Response specifications and their materialization into deliverable responses.

use super::Rule;
use crate::error::{Result, XhrError};
use crate::signature::RequestSignature;
use crate::xhr::MockXhr;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, warn};

/// Declared body type; drives JSON serialization and the canned `content-type`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseType {
    #[default]
    Json,
    Xml,
    Html,
    Script,
    Text,
    /// Wildcard content type (`*/*`)
    #[serde(rename = "default")]
    Any,
}

impl ResponseType {
    pub fn content_type(&self) -> &'static str {
        match self {
            ResponseType::Xml => "application/xml",
            ResponseType::Html => "text/html",
            ResponseType::Script => "text/javascript",
            ResponseType::Text => "text/plain",
            ResponseType::Any => "*/*",
            ResponseType::Json => "application/json",
        }
    }
}

/// A response as declared on a rule.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseSpec {
    /// HTTP status; unset (or 0) delivers 200
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    /// Custom response headers, in declaration order
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub headers: IndexMap<String, String>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<ResponseType>,
}

impl ResponseSpec {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_status(mut self, status: u16) -> Self {
        self.status = Some(status);
        self
    }

    pub fn with_data(mut self, data: impl Into<Value>) -> Self {
        self.data = Some(data.into());
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    pub fn with_type(mut self, kind: ResponseType) -> Self {
        self.kind = Some(kind);
        self
    }

    pub fn status_code(&self) -> u16 {
        self.status.filter(|s| *s != 0).unwrap_or(200)
    }

    pub fn response_type(&self) -> ResponseType {
        self.kind.unwrap_or_default()
    }

    /// Body as delivered to the request: text as-is, nothing as empty.
    pub fn body_text(&self) -> String {
        match &self.data {
            None | Some(Value::Null) => String::new(),
            Some(Value::String(s)) => s.clone(),
            Some(other) => other.to_string(),
        }
    }

    /// JSON-typed responses with structured data must be serialized before delivery.
    pub fn needs_serialization(&self) -> bool {
        self.response_type() == ResponseType::Json
            && self.data.as_ref().is_some_and(|d| !d.is_string())
    }

    /// Replace structured data by its JSON text. Returns whether anything changed.
    pub fn serialize_data(&mut self) -> Result<bool> {
        if !self.needs_serialization() {
            return Ok(false);
        }
        let Some(data) = self.data.take() else {
            return Ok(false);
        };
        let text = serde_json::to_string(&data).map_err(XhrError::SerializationUnavailable)?;
        self.data = Some(Value::String(text));
        Ok(true)
    }
}

/// Signature of a computed response.
pub type ResponseFn = dyn Fn(&RequestSignature, &MockXhr) -> ResponseSpec + Send + Sync;

/// How a rule produces its response.
#[derive(Clone)]
pub enum ResponseSource {
    Static(ResponseSpec),
    Computed(Arc<ResponseFn>),
}

impl Default for ResponseSource {
    fn default() -> Self {
        ResponseSource::Static(ResponseSpec::default())
    }
}

impl From<ResponseSpec> for ResponseSource {
    fn from(spec: ResponseSpec) -> Self {
        ResponseSource::Static(spec)
    }
}

impl fmt::Debug for ResponseSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResponseSource::Static(spec) => f.debug_tuple("Static").field(spec).finish(),
            ResponseSource::Computed(_) => f.write_str("Computed(..)"),
        }
    }
}

impl Rule {
    /// Produce the concrete response for one request.
    ///
    /// Static responses have their serialized JSON body written back onto the rule,
    /// so every later match reuses the same text. Computed responses are serialized
    /// per call.
    pub fn materialize(
        &self,
        signature: &RequestSignature,
        request: &MockXhr,
    ) -> Result<ResponseSpec> {
        let compute = {
            let mut source = self.response.lock();
            match &mut *source {
                ResponseSource::Static(spec) => {
                    if !self.is_fallback() && *spec == ResponseSpec::default() {
                        warn!("Rule {} matched before a response was set", self.id);
                    }
                    if spec.serialize_data()? {
                        debug!("Cached serialized body on rule {}", self.id);
                    }
                    return Ok(spec.clone());
                }
                ResponseSource::Computed(f) => Arc::clone(f),
            }
        };

        // Computed responses run unlocked so they may inspect the rule or request.
        let mut spec = compute(signature, request);
        spec.serialize_data()?;
        Ok(spec)
    }
}
