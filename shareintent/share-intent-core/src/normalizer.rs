use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{Map, Value};
use tracing::debug;

use crate::error::Result;
use crate::models::{ShareIntent, ShareIntentFile, ShareIntentMeta, ShareIntentType};
use crate::payload::{RawPayload, RawShareInput, RawWebUrl};

/// URL-like tokens in shared text, with or without a scheme.
///
/// The leading class also takes `/` so a token such as `foo://x.com` is
/// matched whole and then rejected by the `http` prefix check.
static WEB_URL_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)[-a-z0-9@:%._+~#=/]{2,256}\.[a-z]{2,6}\b[-a-z0-9@:%_+.~#?&/=]*")
        .expect("web url pattern is valid")
});

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NormalizeOptions {
    /// Trace the classification and the final result at debug level.
    pub debug: bool,
}

/// Convert a raw native payload into the canonical [`ShareIntent`].
///
/// Empty input yields [`ShareIntent::empty`]. The only error is a malformed
/// top-level JSON string; bad nested metadata and files without a location
/// are recovered from silently.
pub fn normalize(raw: &RawShareInput, options: NormalizeOptions) -> Result<ShareIntent> {
    let payload = RawPayload::decode(raw)?;

    let result = match payload {
        RawPayload::Empty => ShareIntent::empty(),
        RawPayload::Text { text, meta } => from_text(text, meta),
        RawPayload::WebUrls(entries) => from_web_urls(entries),
        RawPayload::Files { files, meta } => from_files(files, meta),
    };

    if options.debug {
        debug!(
            "share-intent[normalized] {}",
            serde_json::to_string_pretty(&result).unwrap_or_default()
        );
    }
    Ok(result)
}

/// First URL-like token in `text` that starts with `http`.
pub fn find_web_url(text: &str) -> Option<&str> {
    WEB_URL_PATTERN
        .find_iter(text)
        .map(|m| m.as_str())
        .find(|token| token.starts_with("http"))
}

fn from_text(text: String, meta: Option<Map<String, Value>>) -> ShareIntent {
    let web_url = find_web_url(&text).map(str::to_string);
    let title = meta
        .as_ref()
        .and_then(|meta| meta.get("title"))
        .and_then(Value::as_str)
        .map(str::to_string);

    ShareIntent {
        kind: Some(if web_url.is_some() {
            ShareIntentType::WebUrl
        } else {
            ShareIntentType::Text
        }),
        text: Some(text),
        web_url,
        files: None,
        meta: title.map(ShareIntentMeta::with_title),
    }
}

fn from_web_urls(entries: Vec<RawWebUrl>) -> ShareIntent {
    let Some(first) = entries.into_iter().next() else {
        return ShareIntent::empty();
    };

    let meta = match first.meta {
        Some(Value::String(raw)) => parse_meta(&raw),
        Some(Value::Object(object)) => ShareIntentMeta::from_json_object(&object),
        _ => ShareIntentMeta::default(),
    };

    ShareIntent {
        kind: Some(ShareIntentType::WebUrl),
        // Mirrored into `text` for consumers that only read text
        text: Some(first.url.clone()),
        web_url: Some(first.url),
        files: None,
        meta: Some(meta),
    }
}

fn parse_meta(raw: &str) -> ShareIntentMeta {
    match serde_json::from_str::<Value>(raw) {
        Ok(Value::Object(object)) => ShareIntentMeta::from_json_object(&object),
        Ok(_) => ShareIntentMeta::default(),
        Err(e) => {
            debug!("share-intent: ignoring malformed web url meta: {}", e);
            ShareIntentMeta::default()
        }
    }
}

fn from_files(files: Vec<Value>, meta: Option<Map<String, Value>>) -> ShareIntent {
    let files: Vec<ShareIntentFile> = files.iter().filter_map(to_share_file).collect();
    let kind = if files.iter().all(ShareIntentFile::is_media) {
        ShareIntentType::Media
    } else {
        ShareIntentType::File
    };

    ShareIntent {
        kind: Some(kind),
        text: None,
        web_url: None,
        files: Some(files),
        meta: meta.map(|meta| ShareIntentMeta::from_json_object(&meta)),
    }
}

/// Map one platform file entry onto the canonical shape.
///
/// Entries with neither `path` nor `contentUri` are dropped.
fn to_share_file(entry: &Value) -> Option<ShareIntentFile> {
    let entry = entry.as_object()?;
    let path = non_empty_str(entry, "path");
    let content_uri = non_empty_str(entry, "contentUri");
    if path.is_none() && content_uri.is_none() {
        return None;
    }

    let path = path
        .map(str::to_string)
        .or_else(|| non_empty_str(entry, "filePath").map(|p| format!("file://{}", p)))
        .or_else(|| content_uri.map(str::to_string))?;

    Some(ShareIntentFile {
        path,
        mime_type: non_empty_str(entry, "mimeType").map(str::to_string),
        file_name: non_empty_str(entry, "fileName").map(str::to_string),
        size: coerce_number(entry.get("fileSize").or_else(|| entry.get("size"))).map(|n| n as u64),
        width: coerce_number(entry.get("width")).map(|n| n as u32),
        height: coerce_number(entry.get("height")).map(|n| n as u32),
        duration: coerce_number(entry.get("duration")).map(|n| n as u64),
    })
}

fn non_empty_str<'a>(entry: &'a Map<String, Value>, key: &str) -> Option<&'a str> {
    entry
        .get(key)
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
}

/// Numbers arrive as JSON numbers or as strings depending on the platform.
fn coerce_number(value: Option<&Value>) -> Option<f64> {
    let n = match value? {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    (n.is_finite() && n >= 0.0).then(|| n.round())
}
