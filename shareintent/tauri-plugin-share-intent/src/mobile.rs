use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;
use share_intent_core::{
    EventEmitter, EventSource, Listener, NativeEvent, NativeModule, NativeShareState,
    ShareIntentError, Subscription,
};
use tauri::{
    ipc::{Channel, InvokeResponseBody},
    plugin::{PluginApi, PluginHandle},
    AppHandle, Runtime,
};
use tracing::warn;

use crate::models::*;

#[cfg(target_os = "ios")]
tauri::ios_plugin_binding!(init_plugin_share_intent);

/// Register the native plugin and route its events into an emitter.
pub fn init<R: Runtime, C: DeserializeOwned>(
    _app: &AppHandle<R>,
    api: PluginApi<R, C>,
) -> crate::Result<ShareIntentNative<R>> {
    #[cfg(target_os = "android")]
    let handle = api.register_android_plugin("app.shareintent", "ShareIntentPlugin")?;
    #[cfg(target_os = "ios")]
    let handle = api.register_ios_plugin(init_plugin_share_intent)?;

    let native = ShareIntentNative {
        handle,
        events: Arc::new(EventEmitter::new()),
    };
    native.forward("onChange", |value| {
        Some(NativeEvent::PayloadChanged(value.into()))
    })?;
    native.forward("onError", |value| {
        let message = match value {
            serde_json::Value::String(message) => message,
            other => other.to_string(),
        };
        Some(NativeEvent::ErrorOccurred(message))
    })?;
    native.forward("onStateChange", |value| {
        serde_json::from_value::<NativeShareState>(value)
            .ok()
            .map(NativeEvent::StateChanged)
    })?;
    Ok(native)
}

#[derive(Serialize)]
struct RegisterListener {
    event: String,
    handler: Channel,
}

/// Access to the native share module.
pub struct ShareIntentNative<R: Runtime> {
    handle: PluginHandle<R>,
    events: Arc<EventEmitter<NativeEvent>>,
}

impl<R: Runtime> ShareIntentNative<R> {
    fn forward<F>(&self, event: &str, map: F) -> crate::Result<()>
    where
        F: Fn(serde_json::Value) -> Option<NativeEvent> + Send + Sync + 'static,
    {
        let events = self.events.clone();
        let name = event.to_string();
        let handler: Channel = Channel::new(move |body| {
            let InvokeResponseBody::Json(json) = body else {
                warn!("share-intent: {} sent a non-JSON body", name);
                return Ok(());
            };
            match serde_json::from_str::<NativeEventPayload>(&json) {
                Ok(payload) => {
                    if let Some(event) = map(payload.value) {
                        events.emit(&event);
                    }
                }
                Err(e) => warn!("share-intent: unreadable {} event: {}", name, e),
            }
            Ok(())
        });

        // The native base plugin returns an empty object
        self.handle
            .run_mobile_plugin::<serde_json::Value>(
                "registerListener",
                RegisterListener {
                    event: event.to_string(),
                    handler,
                },
            )
            .map(|_| ())
            .map_err(Into::into)
    }
}

fn native_error(err: impl std::fmt::Display) -> ShareIntentError {
    ShareIntentError::Native(err.to_string())
}

impl<R: Runtime> NativeModule for ShareIntentNative<R> {
    fn pull_payload(&self, hint_url: &str) -> share_intent_core::Result<()> {
        self.handle
            .run_mobile_plugin::<serde_json::Value>(
                "getShareIntent",
                PullRequest {
                    url: hint_url.to_string(),
                },
            )
            .map(|_| ())
            .map_err(native_error)
    }

    fn clear_stored_payload(&self, key: &str) -> share_intent_core::Result<()> {
        self.handle
            .run_mobile_plugin::<serde_json::Value>(
                "clearShareIntent",
                StoredPayloadRequest {
                    key: key.to_string(),
                },
            )
            .map(|_| ())
            .map_err(native_error)
    }

    fn has_stored_payload(&self, key: &str) -> share_intent_core::Result<bool> {
        self.handle
            .run_mobile_plugin::<HasShareIntentResponse>(
                "hasShareIntent",
                StoredPayloadRequest {
                    key: key.to_string(),
                },
            )
            .map(|response| response.value)
            .map_err(native_error)
    }

    fn subscribe(&self, listener: Listener<NativeEvent>) -> share_intent_core::Result<Subscription> {
        self.events.subscribe(listener)
    }
}
