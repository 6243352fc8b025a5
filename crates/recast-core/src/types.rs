// SPDX-FileCopyrightText: 2026 Recast Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Common types shared by the Recast managers and their collaborators.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Ordered, duplicate-free list of subscriber identifiers for one message.
pub type ExclusionList = Vec<String>;

/// Health status reported by store health checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthStatus {
    /// Store is fully operational.
    Healthy,
    /// Store is operational but experiencing issues.
    Degraded(String),
    /// Store is not operational.
    Unhealthy(String),
}

/// Returns the JSON type name of a value, as reported in type errors.
pub fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

// --- Media ---

/// Declared kind of a media asset.
///
/// Serialized as the plain `type` string; unrecognized kinds are kept verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum MediaKind {
    Image,
    Video,
    Other(String),
}

impl MediaKind {
    pub fn as_str(&self) -> &str {
        match self {
            MediaKind::Image => "image",
            MediaKind::Video => "video",
            MediaKind::Other(kind) => kind,
        }
    }
}

impl From<String> for MediaKind {
    fn from(value: String) -> Self {
        match value.as_str() {
            "image" => MediaKind::Image,
            "video" => MediaKind::Video,
            _ => MediaKind::Other(value),
        }
    }
}

impl From<MediaKind> for String {
    fn from(kind: MediaKind) -> Self {
        kind.as_str().to_string()
    }
}

impl std::fmt::Display for MediaKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A media asset extracted from an original message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaElement {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(rename = "type")]
    pub kind: MediaKind,
    /// Source URL. Must be non-empty for the element to be insertable.
    #[serde(default)]
    pub src: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alt: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Value>,
}

impl MediaElement {
    pub fn new(kind: MediaKind, src: impl Into<String>) -> Self {
        Self {
            id: None,
            kind,
            src: src.into(),
            alt: None,
            metadata: None,
        }
    }
}

/// A renderable element handed to a [`MediaContainer`](crate::MediaContainer).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderedElement {
    pub tag: String,
    #[serde(default)]
    pub classes: Vec<String>,
    #[serde(default)]
    pub attributes: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

impl RenderedElement {
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            classes: Vec::new(),
            attributes: BTreeMap::new(),
            text: None,
        }
    }

    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }

    pub fn with_class(mut self, class: impl Into<String>) -> Self {
        self.classes.push(class.into());
        self
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.classes.iter().any(|c| c == class)
    }
}

/// Outcome of inserting one media element into a new message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum InsertionResult {
    /// The element was rendered and attached to the container.
    Inserted { element: RenderedElement },
    /// Validation or attachment failed; `fallback` is the placeholder to show instead.
    Failed {
        error: String,
        fallback: RenderedElement,
    },
}

impl InsertionResult {
    pub fn is_success(&self) -> bool {
        matches!(self, InsertionResult::Inserted { .. })
    }
}

// --- Parsing and processing ---

/// A token paired with its sequential `msg-<n>` identifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaggedToken {
    pub token: String,
    pub id: String,
}

/// Output of the processing pipeline for one message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessingResult {
    pub tokens: Vec<String>,
    pub excluded: bool,
    pub media_analysis: Option<Value>,
}

// --- Queue ---

/// An outbound job held by the message queue.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueuedMessage {
    pub id: String,
    #[serde(default)]
    pub payload: Value,
    #[serde(default)]
    pub retry_count: u32,
}

impl QueuedMessage {
    pub fn new(id: impl Into<String>, payload: Value) -> Self {
        Self {
            id: id.into(),
            payload,
            retry_count: 0,
        }
    }
}

// --- Messaging channel envelopes ---

/// A request arriving over the extension messaging channel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Request {
    pub action: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
    #[serde(default)]
    pub source: String,
}

/// Envelope status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseStatus {
    Success,
    Error,
}

/// A response sent back over the messaging channel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Response {
    pub status: ResponseStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
}

impl Response {
    pub fn success(data: Value, request_id: Option<String>) -> Self {
        Self {
            status: ResponseStatus::Success,
            data: Some(data),
            error: None,
            request_id,
        }
    }

    pub fn error(error: impl Into<String>, request_id: Option<String>) -> Self {
        Self {
            status: ResponseStatus::Error,
            data: None,
            error: Some(error.into()),
            request_id,
        }
    }
}
