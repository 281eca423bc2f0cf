//! Raw payloads as delivered by the native layer.
//!
//! Android hands over a structured object, iOS a JSON string written by the
//! share extension. Both are resolved here, once, into [`RawPayload`] so the
//! normalizer never has to probe fields of an unknown shape.

use serde_json::{Map, Value};

use crate::error::Result;

/// A payload exactly as received from the native layer.
#[derive(Debug, Clone, PartialEq)]
pub enum RawShareInput {
    /// JSON-encoded payload (iOS share extension)
    Json(String),
    /// Already structured payload (Android)
    Object(Value),
}

impl RawShareInput {
    /// `null` and the empty string mean "nothing shared", not an error.
    pub fn is_empty(&self) -> bool {
        match self {
            RawShareInput::Json(s) => s.is_empty(),
            RawShareInput::Object(value) => value.is_null(),
        }
    }
}

impl From<&str> for RawShareInput {
    fn from(value: &str) -> Self {
        RawShareInput::Json(value.to_string())
    }
}

impl From<String> for RawShareInput {
    fn from(value: String) -> Self {
        RawShareInput::Json(value)
    }
}

impl From<Value> for RawShareInput {
    fn from(value: Value) -> Self {
        match value {
            Value::String(s) => RawShareInput::Json(s),
            other => RawShareInput::Object(other),
        }
    }
}

/// One `{url, meta}` entry of the iOS web URL shape.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct RawWebUrl {
    pub url: String,
    pub meta: Option<Value>,
}

/// A raw payload classified by structure.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum RawPayload {
    Empty,
    Text {
        text: String,
        meta: Option<Map<String, Value>>,
    },
    WebUrls(Vec<RawWebUrl>),
    Files {
        files: Vec<Value>,
        meta: Option<Map<String, Value>>,
    },
}

impl RawPayload {
    /// Parse (if needed) and classify a raw input.
    ///
    /// Only a malformed top-level JSON string is an error.
    pub(crate) fn decode(input: &RawShareInput) -> Result<Self> {
        if input.is_empty() {
            return Ok(RawPayload::Empty);
        }
        let value = match input {
            RawShareInput::Json(raw) => serde_json::from_str(&escape_string_newlines(raw))?,
            RawShareInput::Object(value) => value.clone(),
        };
        Ok(Self::classify(value))
    }

    fn classify(value: Value) -> Self {
        let mut object = match value {
            Value::Object(object) => object,
            // Older Android modules sent the bare file list
            Value::Array(files) => {
                return RawPayload::Files { files, meta: None };
            }
            _ => return RawPayload::Empty,
        };

        let meta = match object.remove("meta") {
            Some(Value::Object(meta)) => Some(meta),
            _ => None,
        };

        if let Some(Value::String(text)) = object.remove("text") {
            if !text.is_empty() {
                return RawPayload::Text { text, meta };
            }
        }

        if let Some(Value::Array(entries)) = object.remove("weburls") {
            let entries: Vec<RawWebUrl> =
                entries.into_iter().filter_map(RawWebUrl::from_value).collect();
            if !entries.is_empty() {
                return RawPayload::WebUrls(entries);
            }
        }

        match object.remove("files") {
            Some(Value::Array(files)) => RawPayload::Files { files, meta },
            _ => RawPayload::Empty,
        }
    }
}

impl RawWebUrl {
    /// `None` for entries without a usable URL.
    fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Object(mut entry) => match entry.remove("url") {
                Some(Value::String(url)) if !url.is_empty() => Some(RawWebUrl {
                    url,
                    meta: entry.remove("meta"),
                }),
                _ => None,
            },
            Value::String(url) if !url.is_empty() => Some(RawWebUrl { url, meta: None }),
            _ => None,
        }
    }
}

/// Escape raw line breaks that appear inside JSON string literals.
///
/// Share extensions write user text verbatim, so a shared note with several
/// lines arrives with literal newlines inside `"text"`. Newlines between
/// tokens are valid JSON and are left alone.
pub(crate) fn escape_string_newlines(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut in_string = false;
    let mut escaped = false;

    for c in raw.chars() {
        if in_string {
            if escaped {
                escaped = false;
                out.push(c);
                continue;
            }
            match c {
                '\\' => {
                    escaped = true;
                    out.push(c);
                }
                '"' => {
                    in_string = false;
                    out.push(c);
                }
                '\n' => out.push_str("\\n"),
                '\r' => out.push_str("\\r"),
                '\t' => out.push_str("\\t"),
                _ => out.push(c),
            }
        } else {
            if c == '"' {
                in_string = true;
            }
            out.push(c);
        }
    }
    out
}
