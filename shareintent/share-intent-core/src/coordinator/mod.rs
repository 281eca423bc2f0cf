//! Keeps the canonical [`ShareIntent`] in sync with the native layer and the
//! app lifecycle.
//!
//! The coordinator subscribes to native notifications, foreground changes
//! and deep-link URLs, runs each through [`CoordinatorState::apply`] and
//! executes the resulting effects after the state lock is released. Native
//! modules are therefore free to emit synchronously from inside a pull.

mod state;

pub use state::{
    CoordinatorEvent, CoordinatorState, Effect, LifecyclePhase, ShareIntentSnapshot,
    TransitionContext, PARSE_ERROR_MESSAGE,
};

use std::ops::Deref;
use std::sync::{Arc, Weak};

use parking_lot::Mutex;
use tracing::{debug, info, warn};

use crate::config::{extension_key, resolve_scheme, Platform, ShareIntentOptions};
use crate::error::Result;
use crate::events::{AppStateStatus, EventSource, NativeEvent, NativeShareState, Subscription, UrlEvent};
use crate::models::ShareIntent;
use crate::native::NativeModule;

pub type ResetCallback = Box<dyn Fn() + Send + Sync>;
pub type ChangeObserver = Box<dyn Fn(&ShareIntentSnapshot) + Send + Sync>;

pub struct CoordinatorBuilder {
    options: ShareIntentOptions,
    platform: Platform,
    app_schemes: Vec<String>,
    linking_url: Option<String>,
    initial_url: Option<String>,
    initial_app_state: AppStateStatus,
    on_reset: Option<ResetCallback>,
    on_change: Option<ChangeObserver>,
}

impl CoordinatorBuilder {
    pub fn new(options: ShareIntentOptions) -> Self {
        Self {
            options,
            platform: Platform::current(),
            app_schemes: Vec::new(),
            linking_url: None,
            initial_url: None,
            initial_app_state: AppStateStatus::Active,
            on_reset: None,
            on_change: None,
        }
    }

    pub fn platform(mut self, platform: Platform) -> Self {
        self.platform = platform;
        self
    }

    /// URL schemes registered by the application, first one wins.
    pub fn app_schemes(mut self, schemes: Vec<String>) -> Self {
        self.app_schemes = schemes;
        self
    }

    /// The app's own deep-link base URL, last resort for the scheme.
    pub fn linking_url(mut self, url: impl Into<String>) -> Self {
        self.linking_url = Some(url.into());
        self
    }

    /// URL the app was launched with, if any.
    pub fn initial_url(mut self, url: Option<String>) -> Self {
        self.initial_url = url;
        self
    }

    pub fn initial_app_state(mut self, state: AppStateStatus) -> Self {
        self.initial_app_state = state;
        self
    }

    pub fn on_reset<F>(mut self, callback: F) -> Self
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.on_reset = Some(Box::new(callback));
        self
    }

    pub fn on_change<F>(mut self, observer: F) -> Self
    where
        F: Fn(&ShareIntentSnapshot) + Send + Sync + 'static,
    {
        self.on_change = Some(Box::new(observer));
        self
    }

    /// Register all listeners and move to the ready state.
    ///
    /// A disabled coordinator registers nothing and never talks to `native`.
    /// Registration failures are returned as-is.
    pub fn activate(
        self,
        native: Arc<dyn NativeModule>,
        app_state: &dyn EventSource<AppStateStatus>,
        urls: &dyn EventSource<UrlEvent>,
    ) -> Result<ShareIntentCoordinator> {
        self.options.validate()?;

        let disabled = self.options.is_disabled(self.platform);
        let scheme = resolve_scheme(
            &self.options,
            &self.app_schemes,
            self.linking_url.as_deref(),
        );
        if scheme.is_none() && !disabled {
            warn!("share-intent: no URL scheme resolved, extension key falls back to a bare suffix");
        }

        let shared = Arc::new(Shared {
            state: Mutex::new(CoordinatorState::new(
                self.initial_app_state,
                self.initial_url,
            )),
            native,
            settings: Settings {
                platform: self.platform,
                extension_key: extension_key(scheme.as_deref()),
                scheme,
                reset_on_background: self.options.reset_on_background,
                debug: self.options.debug,
                disabled,
            },
            on_reset: self.on_reset,
            on_change: self.on_change,
        });

        let mut coordinator = ShareIntentCoordinator {
            handle: CoordinatorHandle {
                shared: shared.clone(),
            },
            subscriptions: Vec::new(),
        };

        if disabled {
            if shared.settings.debug {
                debug!("share-intent: disabled on {:?}", shared.settings.platform);
            }
            return Ok(coordinator);
        }

        let weak = Arc::downgrade(&shared);
        coordinator
            .subscriptions
            .push(shared.native.subscribe(Box::new(move |event: &NativeEvent| {
                dispatch_weak(&weak, CoordinatorEvent::from(event.clone()));
            }))?);

        let weak = Arc::downgrade(&shared);
        coordinator
            .subscriptions
            .push(app_state.subscribe(Box::new(move |next: &AppStateStatus| {
                dispatch_weak(&weak, CoordinatorEvent::AppState(*next));
            }))?);

        let weak = Arc::downgrade(&shared);
        coordinator
            .subscriptions
            .push(urls.subscribe(Box::new(move |url: &UrlEvent| {
                dispatch_weak(&weak, CoordinatorEvent::Url(url.clone()));
            }))?);

        info!(
            "share-intent: ready on {:?} (key: {})",
            shared.settings.platform, shared.settings.extension_key
        );
        shared.dispatch(CoordinatorEvent::Activated);
        Ok(coordinator)
    }
}

struct Settings {
    platform: Platform,
    scheme: Option<String>,
    extension_key: String,
    reset_on_background: bool,
    debug: bool,
    disabled: bool,
}

struct Shared {
    state: Mutex<CoordinatorState>,
    native: Arc<dyn NativeModule>,
    settings: Settings,
    on_reset: Option<ResetCallback>,
    on_change: Option<ChangeObserver>,
}

fn dispatch_weak(shared: &Weak<Shared>, event: CoordinatorEvent) {
    if let Some(shared) = shared.upgrade() {
        shared.dispatch(event);
    }
}

impl Shared {
    fn context(&self) -> TransitionContext<'_> {
        TransitionContext {
            platform: self.settings.platform,
            scheme: self.settings.scheme.as_deref(),
            extension_key: &self.settings.extension_key,
            reset_on_background: self.settings.reset_on_background,
            debug: self.settings.debug,
        }
    }

    fn dispatch(&self, event: CoordinatorEvent) {
        if self.settings.disabled {
            return;
        }
        let effects = self.state.lock().apply(event, &self.context());
        for effect in effects {
            self.run(effect);
        }
    }

    fn run(&self, effect: Effect) {
        match effect {
            Effect::Pull { hint_url } => {
                if let Err(e) = self.native.pull_payload(&hint_url) {
                    warn!("share-intent: pull request failed: {}", e);
                }
            }
            Effect::ClearStored { key } => {
                if let Err(e) = self.native.clear_stored_payload(&key) {
                    warn!("share-intent: failed to clear stored payload {}: {}", key, e);
                }
            }
            Effect::NotifyReset => {
                if let Some(on_reset) = &self.on_reset {
                    on_reset();
                }
            }
            Effect::Changed(snapshot) => {
                if let Some(on_change) = &self.on_change {
                    on_change(&snapshot);
                }
            }
        }
    }
}

/// Cloneable access to a coordinator's state, shared between consumers.
#[derive(Clone)]
pub struct CoordinatorHandle {
    shared: Arc<Shared>,
}

impl CoordinatorHandle {
    pub fn snapshot(&self) -> ShareIntentSnapshot {
        self.shared.state.lock().snapshot()
    }

    pub fn share_intent(&self) -> ShareIntent {
        self.shared.state.lock().share_intent().clone()
    }

    pub fn has_share_intent(&self) -> bool {
        self.shared.state.lock().has_share_intent()
    }

    pub fn is_ready(&self) -> bool {
        self.shared.state.lock().is_ready()
    }

    pub fn error(&self) -> Option<String> {
        self.shared.state.lock().error().map(str::to_string)
    }

    pub fn phase(&self) -> LifecyclePhase {
        self.shared.state.lock().phase()
    }

    pub fn native_state(&self) -> Option<NativeShareState> {
        self.shared.state.lock().native_state()
    }

    pub fn extension_key(&self) -> &str {
        &self.shared.settings.extension_key
    }

    pub fn is_disabled(&self) -> bool {
        self.shared.settings.disabled
    }

    /// Clear the shared content and the native copy of it.
    pub fn reset(&self) {
        self.reset_with(true);
    }

    pub fn reset_with(&self, clear_native: bool) {
        self.shared.dispatch(CoordinatorEvent::Reset { clear_native });
    }

    /// Ask the native layer whether a payload is stored under the extension key.
    pub fn has_stored_payload(&self) -> bool {
        if self.shared.settings.disabled {
            return false;
        }
        self.shared
            .native
            .has_stored_payload(&self.shared.settings.extension_key)
            .unwrap_or_else(|e| {
                warn!("share-intent: stored payload query failed: {}", e);
                false
            })
    }
}

/// Owns the listener registrations. Dropping it deactivates.
pub struct ShareIntentCoordinator {
    handle: CoordinatorHandle,
    subscriptions: Vec<Subscription>,
}

impl ShareIntentCoordinator {
    pub fn builder(options: ShareIntentOptions) -> CoordinatorBuilder {
        CoordinatorBuilder::new(options)
    }

    pub fn handle(&self) -> CoordinatorHandle {
        self.handle.clone()
    }

    /// Release every listener; later events are ignored.
    pub fn deactivate(&mut self) {
        if self.subscriptions.is_empty() && self.handle.phase() != LifecyclePhase::Ready {
            return;
        }
        for subscription in &mut self.subscriptions {
            subscription.release();
        }
        self.subscriptions.clear();
        self.handle.shared.dispatch(CoordinatorEvent::Deactivated);
        debug!("share-intent: deactivated");
    }
}

impl Deref for ShareIntentCoordinator {
    type Target = CoordinatorHandle;

    fn deref(&self) -> &Self::Target {
        &self.handle
    }
}

impl Drop for ShareIntentCoordinator {
    fn drop(&mut self) {
        self.deactivate();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ShareIntentError;
    use crate::events::{EventEmitter, Listener};
    use crate::models::ShareIntentType;
    use crate::payload::RawShareInput;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn init_tracing() {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| "share_intent_core=debug".into()),
            )
            .with_test_writer()
            .try_init();
    }

    /// Records outbound calls and lets tests play the native side.
    #[derive(Default)]
    struct FakeNative {
        events: EventEmitter<NativeEvent>,
        pulls: Mutex<Vec<String>>,
        clears: Mutex<Vec<String>>,
        stored: Mutex<Option<RawShareInput>>,
        subscribe_calls: AtomicUsize,
    }

    impl FakeNative {
        fn emit(&self, event: NativeEvent) {
            self.events.emit(&event);
        }

        fn pulls(&self) -> Vec<String> {
            self.pulls.lock().clone()
        }

        fn clears(&self) -> Vec<String> {
            self.clears.lock().clone()
        }
    }

    impl NativeModule for FakeNative {
        fn pull_payload(&self, hint_url: &str) -> Result<()> {
            self.pulls.lock().push(hint_url.to_string());
            let stored = self.stored.lock().clone();
            if let Some(raw) = stored {
                self.emit(NativeEvent::PayloadChanged(raw));
            }
            Ok(())
        }

        fn clear_stored_payload(&self, key: &str) -> Result<()> {
            self.clears.lock().push(key.to_string());
            *self.stored.lock() = None;
            Ok(())
        }

        fn has_stored_payload(&self, _key: &str) -> Result<bool> {
            Ok(self.stored.lock().is_some())
        }

        fn subscribe(&self, listener: Listener<NativeEvent>) -> Result<Subscription> {
            self.subscribe_calls.fetch_add(1, Ordering::SeqCst);
            self.events.subscribe(listener)
        }
    }

    struct FailingSource;

    impl EventSource<AppStateStatus> for FailingSource {
        fn subscribe(&self, _listener: Listener<AppStateStatus>) -> Result<Subscription> {
            Err(ShareIntentError::Registration("app state unavailable".into()))
        }
    }

    struct Harness {
        native: Arc<FakeNative>,
        app_state: EventEmitter<AppStateStatus>,
        urls: EventEmitter<UrlEvent>,
        resets: Arc<AtomicUsize>,
    }

    impl Harness {
        fn new() -> Self {
            init_tracing();
            Self {
                native: Arc::new(FakeNative::default()),
                app_state: EventEmitter::new(),
                urls: EventEmitter::new(),
                resets: Arc::new(AtomicUsize::new(0)),
            }
        }

        fn activate(&self, platform: Platform, options: ShareIntentOptions) -> ShareIntentCoordinator {
            let resets = self.resets.clone();
            ShareIntentCoordinator::builder(options)
                .platform(platform)
                .app_schemes(vec!["myapp".into()])
                .on_reset(move || {
                    resets.fetch_add(1, Ordering::SeqCst);
                })
                .activate(self.native.clone(), &self.app_state, &self.urls)
                .unwrap()
        }

        fn resets(&self) -> usize {
            self.resets.load(Ordering::SeqCst)
        }
    }

    fn debug_options() -> ShareIntentOptions {
        ShareIntentOptions {
            debug: true,
            ..Default::default()
        }
    }

    #[test]
    fn test_activation_registers_and_is_ready() {
        let h = Harness::new();
        let coordinator = h.activate(Platform::Ios, debug_options());

        assert!(coordinator.is_ready());
        assert!(!coordinator.has_share_intent());
        assert_eq!(coordinator.extension_key(), "myappShareKey");
        assert_eq!(h.native.events.listener_count(), 1);
        assert_eq!(h.app_state.listener_count(), 1);
        assert_eq!(h.urls.listener_count(), 1);
    }

    #[test]
    fn test_android_cold_start_delivers_pending_payload() {
        let h = Harness::new();
        *h.native.stored.lock() = Some(RawShareInput::Object(json!({
            "files": [{ "contentUri": "content://media/1", "mimeType": "image/jpeg", "fileSize": "512" }]
        })));

        let coordinator = h.activate(Platform::Android, debug_options());

        assert_eq!(h.native.pulls(), vec![String::new()]);
        let intent = coordinator.share_intent();
        assert_eq!(intent.kind, Some(ShareIntentType::Media));
        assert_eq!(intent.files.unwrap()[0].size, Some(512));
    }

    #[test]
    fn test_ios_pull_back_url_roundtrip() {
        let h = Harness::new();
        let coordinator = h.activate(Platform::Ios, debug_options());
        assert!(h.native.pulls().is_empty());

        *h.native.stored.lock() = Some(RawShareInput::Json(
            r#"{"text":"Check this out https://example.com/page"}"#.into(),
        ));
        h.urls
            .emit(&Some("myapp://dataUrl=myappShareKey#text".to_string()));

        assert_eq!(
            h.native.pulls(),
            vec!["myapp://dataUrl=myappShareKey#text".to_string()]
        );
        let snapshot = coordinator.snapshot();
        assert!(snapshot.has_share_intent);
        assert_eq!(snapshot.share_intent.kind, Some(ShareIntentType::WebUrl));
        assert_eq!(
            snapshot.share_intent.web_url.as_deref(),
            Some("https://example.com/page")
        );
        assert_eq!(snapshot.share_intent.files, None);
    }

    #[test]
    fn test_malformed_payload_sets_error_and_keeps_state() {
        let h = Harness::new();
        let coordinator = h.activate(Platform::Ios, ShareIntentOptions::default());

        h.native.emit(NativeEvent::PayloadChanged(RawShareInput::Object(
            json!({ "text": "primed" }),
        )));
        let primed = coordinator.share_intent();

        h.native
            .emit(NativeEvent::PayloadChanged("{not json".into()));
        assert_eq!(coordinator.error().as_deref(), Some(PARSE_ERROR_MESSAGE));
        assert_eq!(coordinator.share_intent(), primed);
    }

    #[test]
    fn test_native_error_is_surfaced() {
        let h = Harness::new();
        let coordinator = h.activate(Platform::Ios, ShareIntentOptions::default());
        h.native.emit(NativeEvent::ErrorOccurred(
            "Cannot retrieve appGroupIdentifier".into(),
        ));
        assert_eq!(
            coordinator.error().as_deref(),
            Some("Cannot retrieve appGroupIdentifier")
        );
        assert!(!coordinator.has_share_intent());
    }

    #[test]
    fn test_background_resets_once() {
        let h = Harness::new();
        let coordinator = h.activate(Platform::Android, ShareIntentOptions::default());
        h.native.emit(NativeEvent::PayloadChanged(RawShareInput::Object(
            json!({ "text": "hello" }),
        )));
        assert!(coordinator.has_share_intent());

        h.app_state.emit(&AppStateStatus::Background);

        assert_eq!(h.native.clears(), vec!["myappShareKey".to_string()]);
        assert_eq!(h.resets(), 1, "onResetShareIntent should fire exactly once");
        assert!(!coordinator.has_share_intent());
        assert_eq!(coordinator.share_intent(), ShareIntent::empty());

        h.app_state.emit(&AppStateStatus::Inactive);
        assert_eq!(h.resets(), 1);
    }

    #[test]
    fn test_consumer_reset() {
        let h = Harness::new();
        let coordinator = h.activate(Platform::Ios, ShareIntentOptions::default());
        h.native.emit(NativeEvent::PayloadChanged(RawShareInput::Object(
            json!({ "text": "hello" }),
        )));
        h.native
            .emit(NativeEvent::PayloadChanged("{broken".into()));
        assert!(coordinator.error().is_some());

        coordinator.reset();
        assert_eq!(coordinator.error(), None);
        assert!(!coordinator.has_share_intent());
        assert_eq!(h.native.clears(), vec!["myappShareKey".to_string()]);
        assert_eq!(h.resets(), 1);

        coordinator.reset_with(false);
        assert_eq!(h.native.clears().len(), 1);
        assert_eq!(h.resets(), 1, "Nothing left to reset");
    }

    #[test]
    fn test_disabled_never_touches_native() {
        let h = Harness::new();
        let options = ShareIntentOptions {
            disabled: Some(true),
            ..Default::default()
        };
        let coordinator = h.activate(Platform::Android, options);

        assert!(!coordinator.is_ready());
        assert_eq!(h.native.subscribe_calls.load(Ordering::SeqCst), 0);
        assert_eq!(h.app_state.listener_count(), 0);
        assert_eq!(h.urls.listener_count(), 0);

        h.app_state.emit(&AppStateStatus::Active);
        h.urls.emit(&Some("myapp://dataUrl=myappShareKey".into()));
        coordinator.reset();

        assert!(h.native.pulls().is_empty());
        assert!(h.native.clears().is_empty());
        assert!(!coordinator.has_stored_payload());
        assert_eq!(h.resets(), 0);
    }

    #[test]
    fn test_desktop_defaults_to_disabled() {
        let h = Harness::new();
        let coordinator = h.activate(Platform::Desktop, ShareIntentOptions::default());
        assert!(coordinator.is_disabled());
        assert!(!coordinator.is_ready());
    }

    #[test]
    fn test_deactivate_releases_listeners() {
        let h = Harness::new();
        let mut coordinator = h.activate(Platform::Android, ShareIntentOptions::default());
        let handle = coordinator.handle();

        coordinator.deactivate();
        coordinator.deactivate();
        assert_eq!(h.native.events.listener_count(), 0);
        assert_eq!(h.app_state.listener_count(), 0);
        assert_eq!(handle.phase(), LifecyclePhase::Deactivated);

        h.native.emit(NativeEvent::PayloadChanged(RawShareInput::Object(
            json!({ "text": "late" }),
        )));
        h.app_state.emit(&AppStateStatus::Active);
        assert!(!handle.has_share_intent());
        assert_eq!(h.native.pulls().len(), 1, "Only the activation pull");
    }

    #[test]
    fn test_drop_deactivates() {
        let h = Harness::new();
        let coordinator = h.activate(Platform::Android, ShareIntentOptions::default());
        let handle = coordinator.handle();
        drop(coordinator);

        assert_eq!(h.urls.listener_count(), 0);
        assert_eq!(handle.phase(), LifecyclePhase::Deactivated);
    }

    #[test]
    fn test_registration_failure_propagates() {
        let h = Harness::new();
        let result = ShareIntentCoordinator::builder(ShareIntentOptions::default())
            .platform(Platform::Android)
            .activate(h.native.clone(), &FailingSource, &h.urls);

        assert!(matches!(result, Err(ShareIntentError::Registration(_))));
        assert_eq!(
            h.native.events.listener_count(),
            0,
            "Partial registrations are released"
        );
        assert!(h.native.pulls().is_empty());
    }

    #[test]
    fn test_change_observer_sees_snapshots() {
        let h = Harness::new();
        let seen = Arc::new(Mutex::new(Vec::<ShareIntentSnapshot>::new()));
        let log = seen.clone();
        let handle_holder: Arc<Mutex<Option<CoordinatorHandle>>> = Arc::new(Mutex::new(None));
        let holder = handle_holder.clone();

        let coordinator = ShareIntentCoordinator::builder(ShareIntentOptions::default())
            .platform(Platform::Ios)
            .app_schemes(vec!["myapp".into()])
            .on_change(move |snapshot| {
                // Reading state from inside the observer must not deadlock
                if let Some(handle) = holder.lock().as_ref() {
                    assert_eq!(&handle.snapshot(), snapshot);
                }
                log.lock().push(snapshot.clone());
            })
            .activate(h.native.clone(), &h.app_state, &h.urls)
            .unwrap();
        *handle_holder.lock() = Some(coordinator.handle());

        h.native.emit(NativeEvent::PayloadChanged(RawShareInput::Object(
            json!({ "text": "hello" }),
        )));

        let seen = seen.lock();
        assert_eq!(seen.len(), 2, "ready + payload");
        assert!(seen[0].is_ready && !seen[0].has_share_intent);
        assert!(seen[1].has_share_intent);
    }

    #[test]
    fn test_shared_handles_observe_same_state() {
        let h = Harness::new();
        let coordinator = h.activate(Platform::Ios, ShareIntentOptions::default());
        let first = coordinator.handle();
        let second = coordinator.handle();

        h.native.emit(NativeEvent::PayloadChanged(RawShareInput::Object(
            json!({ "text": "hello" }),
        )));
        assert_eq!(first.snapshot(), second.snapshot());

        second.reset();
        assert!(!first.has_share_intent());
    }

    #[test]
    fn test_has_stored_payload_queries_native() {
        let h = Harness::new();
        let coordinator = h.activate(Platform::Ios, ShareIntentOptions::default());
        assert!(!coordinator.has_stored_payload());
        *h.native.stored.lock() = Some("{}".into());
        assert!(coordinator.has_stored_payload());
    }

    #[test]
    fn test_native_state_notification() {
        let h = Harness::new();
        let coordinator = h.activate(Platform::Android, ShareIntentOptions::default());
        h.native
            .emit(NativeEvent::StateChanged(NativeShareState::Pending));
        assert_eq!(coordinator.native_state(), Some(NativeShareState::Pending));
    }
}
