use serde::de::DeserializeOwned;
use share_intent_core::{
    EventEmitter, EventSource, Listener, NativeEvent, NativeModule, Subscription,
};
use tauri::{plugin::PluginApi, AppHandle, Runtime};

/// Initialize the desktop stand-in (share intents are mobile-only).
pub fn init<R: Runtime, C: DeserializeOwned>(
    _app: &AppHandle<R>,
    _api: PluginApi<R, C>,
) -> crate::Result<ShareIntentNative> {
    Ok(ShareIntentNative {
        events: EventEmitter::new(),
    })
}

/// Desktop has no share sheet: nothing is ever pending and no event fires.
///
/// The plugin still loads so the same frontend works everywhere.
pub struct ShareIntentNative {
    events: EventEmitter<NativeEvent>,
}

impl NativeModule for ShareIntentNative {
    fn pull_payload(&self, _hint_url: &str) -> share_intent_core::Result<()> {
        Ok(())
    }

    fn clear_stored_payload(&self, _key: &str) -> share_intent_core::Result<()> {
        Ok(())
    }

    fn has_stored_payload(&self, _key: &str) -> share_intent_core::Result<bool> {
        Ok(false)
    }

    fn subscribe(&self, listener: Listener<NativeEvent>) -> share_intent_core::Result<Subscription> {
        self.events.subscribe(listener)
    }
}
