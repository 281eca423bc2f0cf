use serde::{Deserialize, Serialize};
use share_intent_core::ShareIntentOptions;

/// Event emitted to the webview whenever the share intent snapshot changes.
pub const SHARE_INTENT_CHANGED_EVENT: &str = "share-intent://changed";

/// `plugins.share-intent` section of the Tauri config.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PluginConfig {
    #[serde(flatten)]
    pub options: ShareIntentOptions,
    /// URL schemes registered by the app; the first one builds the extension key.
    #[serde(default)]
    pub schemes: Vec<String>,
}

/// Arguments of the native `getShareIntent` call.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PullRequest {
    pub url: String,
}

/// Arguments of the native `clearShareIntent` / `hasShareIntent` calls.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredPayloadRequest {
    pub key: String,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HasShareIntentResponse {
    pub value: bool,
}

/// Body of the native `onChange`, `onError` and `onStateChange` events.
///
/// Android sends the payload as an object, iOS as a JSON string.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NativeEventPayload {
    #[serde(default)]
    pub value: serde_json::Value,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plugin_config_from_tauri_conf() {
        let config: PluginConfig = serde_json::from_str(
            r#"{ "debug": true, "resetOnBackground": false, "schemes": ["myapp", "myapp-dev"] }"#,
        )
        .unwrap();

        assert!(config.options.debug);
        assert!(!config.options.reset_on_background);
        assert_eq!(config.options.scheme, None);
        assert_eq!(config.schemes, vec!["myapp", "myapp-dev"]);
    }

    #[test]
    fn test_plugin_config_defaults() {
        let config: PluginConfig = serde_json::from_str("{}").unwrap();
        assert!(config.options.reset_on_background);
        assert!(config.schemes.is_empty());
    }
}
