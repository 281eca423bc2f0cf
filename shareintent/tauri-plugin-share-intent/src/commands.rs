use share_intent_core::ShareIntentSnapshot;
use tauri::{command, AppHandle, Manager, Runtime, State};

use crate::{Error, Result, ShareIntentState};

fn state<R: Runtime>(app: &AppHandle<R>) -> Result<State<'_, ShareIntentState>> {
    app.try_state::<ShareIntentState>()
        .ok_or(Error::NotInitialized)
}

/// Current share intent, readiness and last error.
#[command]
pub(crate) async fn get_share_intent<R: Runtime>(app: AppHandle<R>) -> Result<ShareIntentSnapshot> {
    Ok(state(&app)?.handle().snapshot())
}

/// Drop the shared content once the frontend has handled it.
///
/// `clear_native` defaults to true so the native copy is discarded too.
#[command]
pub(crate) async fn reset_share_intent<R: Runtime>(
    app: AppHandle<R>,
    clear_native: Option<bool>,
) -> Result<ShareIntentSnapshot> {
    let handle = state(&app)?.handle();
    handle.reset_with(clear_native.unwrap_or(true));
    Ok(handle.snapshot())
}

/// Whether the native layer still holds a payload under the extension key.
#[command]
pub(crate) async fn has_share_intent<R: Runtime>(app: AppHandle<R>) -> Result<bool> {
    Ok(state(&app)?.handle().has_stored_payload())
}

/// Forward a deep-link URL received by the frontend (e.g. via a deep-link plugin).
#[command]
pub(crate) async fn notify_url<R: Runtime>(app: AppHandle<R>, url: Option<String>) -> Result<()> {
    state(&app)?.notify_url(url);
    Ok(())
}
