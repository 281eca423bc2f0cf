use std::sync::Arc;

use share_intent_core::{
    AppStateStatus, CoordinatorHandle, EventEmitter, NativeChannel, NativeModule,
    ShareIntentCoordinator, UrlEvent,
};
use tauri::{
    plugin::{Builder, TauriPlugin},
    Emitter, Manager, RunEvent, Runtime, WindowEvent,
};
use tracing::{debug, error};

pub use models::*;

#[cfg(desktop)]
mod desktop;
#[cfg(mobile)]
mod mobile;

mod commands;
mod error;
mod models;

pub use error::{Error, Result};

/// The native share module is registered once per process and shared by
/// every coordinator the plugin builds.
static NATIVE: NativeChannel = NativeChannel::new();

/// Managed state: the coordinator plus the signal sources the plugin feeds.
pub struct ShareIntentState {
    coordinator: ShareIntentCoordinator,
    app_state: EventEmitter<AppStateStatus>,
    urls: EventEmitter<UrlEvent>,
}

impl ShareIntentState {
    pub fn handle(&self) -> CoordinatorHandle {
        self.coordinator.handle()
    }

    pub fn notify_app_state(&self, state: AppStateStatus) {
        self.app_state.emit(&state);
    }

    pub fn notify_url(&self, url: Option<String>) {
        self.urls.emit(&url);
    }
}

/// Extensions to [`tauri::App`], [`tauri::AppHandle`] and [`tauri::Window`] to access the share intent state.
pub trait ShareIntentExt<R: Runtime> {
    fn share_intent(&self) -> &ShareIntentState;
}

impl<R: Runtime, T: Manager<R>> crate::ShareIntentExt<R> for T {
    fn share_intent(&self) -> &ShareIntentState {
        self.state::<ShareIntentState>().inner()
    }
}

/// Initializes the share-intent plugin.
///
/// - Registers the native share module (Android activity listener, iOS share
///   extension bridge) and subscribes to its events
/// - Feeds app resume/focus changes and opened URLs to the coordinator
/// - Emits [`SHARE_INTENT_CHANGED_EVENT`] with a fresh snapshot on every change
pub fn init<R: Runtime>() -> TauriPlugin<R, Option<PluginConfig>> {
    Builder::<R, Option<PluginConfig>>::new("share-intent")
        .invoke_handler(tauri::generate_handler![
            commands::get_share_intent,
            commands::reset_share_intent,
            commands::has_share_intent,
            commands::notify_url,
        ])
        .setup(|app, api| {
            let config = api.config().clone().unwrap_or_default();

            let native = NATIVE.get_or_try_init(|| -> Result<Arc<dyn NativeModule>> {
                #[cfg(mobile)]
                let native = mobile::init(app, api)?;
                #[cfg(desktop)]
                let native = desktop::init(app, api)?;
                Ok(Arc::new(native))
            })?;

            let app_state = EventEmitter::new();
            let urls = EventEmitter::new();
            let emitter = app.clone();
            let coordinator = ShareIntentCoordinator::builder(config.options)
                .app_schemes(config.schemes)
                .on_change(move |snapshot| {
                    if let Err(e) = emitter.emit(SHARE_INTENT_CHANGED_EVENT, snapshot) {
                        error!("share-intent: failed to emit change: {}", e);
                    }
                })
                .activate(native, &app_state, &urls)?;

            app.manage(ShareIntentState {
                coordinator,
                app_state,
                urls,
            });
            Ok(())
        })
        .on_event(|app, event| {
            let Some(state) = app.try_state::<ShareIntentState>() else {
                return;
            };
            match event {
                RunEvent::Resumed => {
                    debug!("share-intent: app resumed");
                    state.notify_app_state(AppStateStatus::Active);
                }
                RunEvent::WindowEvent {
                    event: WindowEvent::Focused(focused),
                    ..
                } => {
                    state.notify_app_state(if *focused {
                        AppStateStatus::Active
                    } else {
                        AppStateStatus::Background
                    });
                }
                #[cfg(any(target_os = "macos", target_os = "ios"))]
                RunEvent::Opened { urls } => {
                    for url in urls {
                        state.notify_url(Some(url.to_string()));
                    }
                }
                _ => {}
            }
        })
        .build()
}
