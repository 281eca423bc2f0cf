use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Result, ShareIntentError};

/// Suffix appended to the URL scheme to form the extension key.
pub const SHARE_KEY_SUFFIX: &str = "ShareKey";

/// Host part of the URL the iOS share extension opens to hand control back.
pub const PULL_BACK_HOST: &str = "dataUrl";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    /// Share intent delivered in-process; the module keeps a pending payload.
    Android,
    /// Share extension writes to shared storage and deep-links back.
    Ios,
    Desktop,
}

impl Platform {
    pub fn current() -> Self {
        if cfg!(target_os = "android") {
            Platform::Android
        } else if cfg!(target_os = "ios") {
            Platform::Ios
        } else {
            Platform::Desktop
        }
    }

    pub fn supports_share_intents(self) -> bool {
        matches!(self, Platform::Android | Platform::Ios)
    }

    /// Whether the native side can be asked for its payload without a URL.
    pub fn keeps_pending_payload(self) -> bool {
        matches!(self, Platform::Android)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ShareIntentOptions {
    pub debug: bool,
    /// Reset the shared content when the app leaves the foreground.
    pub reset_on_background: bool,
    /// `None` means "disabled where sharing is unsupported".
    pub disabled: Option<bool>,
    /// Overrides the URL scheme used for the extension key.
    pub scheme: Option<String>,
}

impl Default for ShareIntentOptions {
    fn default() -> Self {
        Self {
            debug: false,
            reset_on_background: true,
            disabled: None,
            scheme: None,
        }
    }
}

impl ShareIntentOptions {
    pub fn from_json_str(json: &str) -> Result<Self> {
        let options: Self = serde_json::from_str(json)
            .map_err(|e| ShareIntentError::Config(format!("invalid options: {}", e)))?;
        options.validate()?;
        Ok(options)
    }

    pub fn is_disabled(&self, platform: Platform) -> bool {
        self.disabled
            .unwrap_or_else(|| !platform.supports_share_intents())
    }

    pub fn validate(&self) -> Result<()> {
        if let Some(scheme) = &self.scheme {
            if scheme.is_empty() {
                return Err(ShareIntentError::Config("scheme must not be empty".into()));
            }
            if scheme.contains(':') || scheme.contains('/') {
                return Err(ShareIntentError::Config(format!(
                    "scheme must not contain ':' or '/': {}",
                    scheme
                )));
            }
        }
        Ok(())
    }
}

/// Resolve the app's URL scheme.
///
/// Order: the `scheme` option, the first registered app scheme, then the
/// scheme prefix of the app's own deep-link URL.
pub fn resolve_scheme(
    options: &ShareIntentOptions,
    app_schemes: &[String],
    linking_url: Option<&str>,
) -> Option<String> {
    if let Some(scheme) = &options.scheme {
        if options.debug {
            debug!("share-intent[scheme] from option: {}", scheme);
        }
        return Some(scheme.clone());
    }

    if let Some(first) = app_schemes.first() {
        if options.debug {
            if app_schemes.len() > 1 {
                debug!(
                    "share-intent[scheme] multiple schemes registered ({}), using: {}",
                    app_schemes.join(","),
                    first
                );
            } else {
                debug!("share-intent[scheme] from app config: {}", first);
            }
        }
        return Some(first.clone());
    }

    let extracted = linking_url
        .and_then(|url| url.split(':').next())
        .filter(|scheme| !scheme.is_empty())
        .map(str::to_string);
    if options.debug {
        debug!(
            "share-intent[scheme] from linking url: {:?} -> {:?}",
            linking_url, extracted
        );
    }
    extracted
}

/// Key under which the native layer stores a pending payload.
pub fn extension_key(scheme: Option<&str>) -> String {
    format!("{}{}", scheme.unwrap_or_default(), SHARE_KEY_SUFFIX)
}

/// True if `url` is the share extension handing control back to the app.
pub fn is_pull_back_url(url: &str, scheme: Option<&str>) -> bool {
    match scheme {
        Some(scheme) => url.starts_with(&format!("{}://{}", scheme, PULL_BACK_HOST)),
        None => false,
    }
}
