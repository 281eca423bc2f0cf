use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// What kind of content a [`ShareIntent`] carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ShareIntentType {
    #[serde(rename = "media")]
    Media,
    #[serde(rename = "file")]
    File,
    #[serde(rename = "text")]
    Text,
    #[serde(rename = "weburl")]
    WebUrl,
}

/// One shared file, in the shape consumers see on every platform.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShareIntentFile {
    /// URI reachable by the app (`file://...` or a content URI)
    pub path: String,
    pub mime_type: Option<String>,
    pub file_name: Option<String>,
    /// Size in bytes
    pub size: Option<u64>,
    pub width: Option<u32>,
    pub height: Option<u32>,
    /// Duration in milliseconds (video only)
    pub duration: Option<u64>,
}

impl ShareIntentFile {
    pub fn is_media(&self) -> bool {
        self.mime_type
            .as_deref()
            .map(|mime| mime.starts_with("image/") || mime.starts_with("video/"))
            .unwrap_or(false)
    }
}

/// Free-form metadata attached to a share.
///
/// `title` and `extra` (caption text sent along with files) are lifted out of
/// the map; every other key is kept in `entries`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShareIntentMeta {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extra: Option<String>,
    #[serde(flatten)]
    pub entries: BTreeMap<String, String>,
}

impl ShareIntentMeta {
    pub fn with_title(title: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            ..Default::default()
        }
    }

    /// Build metadata from a raw JSON object.
    ///
    /// Null values are skipped and non-string scalars are stringified, since
    /// native layers are not consistent about what they put in there.
    pub fn from_json_object(object: &Map<String, Value>) -> Self {
        let mut meta = Self::default();
        for (key, value) in object {
            let value = match value {
                Value::Null => continue,
                Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            match key.as_str() {
                "title" => meta.title = Some(value),
                "extra" => meta.extra = Some(value),
                _ => {
                    meta.entries.insert(key.clone(), value);
                }
            }
        }
        meta
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        match key {
            "title" => self.title.as_deref(),
            "extra" => self.extra.as_deref(),
            _ => self.entries.get(key).map(String::as_str),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.extra.is_none() && self.entries.is_empty()
    }
}

/// Canonical, cross-platform shared content.
///
/// The default value (everything `None`) means nothing is currently shared.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShareIntent {
    #[serde(rename = "type")]
    pub kind: Option<ShareIntentType>,
    pub text: Option<String>,
    pub web_url: Option<String>,
    pub files: Option<Vec<ShareIntentFile>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<ShareIntentMeta>,
}

impl ShareIntent {
    pub fn empty() -> Self {
        Self::default()
    }

    /// True when text, a web URL or at least one file is present.
    pub fn has_content(&self) -> bool {
        let non_empty = |s: &Option<String>| s.as_deref().is_some_and(|s| !s.is_empty());
        non_empty(&self.text)
            || non_empty(&self.web_url)
            || self.files.as_ref().is_some_and(|files| !files.is_empty())
    }
}
