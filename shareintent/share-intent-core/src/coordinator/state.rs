//! Pure state transitions of the share intent lifecycle.
//!
//! Every signal becomes a [`CoordinatorEvent`]; [`CoordinatorState::apply`]
//! mutates the state and returns the side effects the coordinator must run
//! once the state lock is released.

use serde::Serialize;
use tracing::{debug, error};

use crate::config::{is_pull_back_url, Platform};
use crate::events::{AppStateStatus, NativeEvent, NativeShareState};
use crate::models::ShareIntent;
use crate::normalizer::{normalize, NormalizeOptions};
use crate::payload::RawShareInput;

/// Diagnostic stored in `error` when a payload cannot be parsed.
pub const PARSE_ERROR_MESSAGE: &str = "Cannot parse share intent value";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum LifecyclePhase {
    Uninitialized,
    Ready,
    Deactivated,
}

#[derive(Debug, Clone, PartialEq)]
pub enum CoordinatorEvent {
    /// Listener registration completed.
    Activated,
    Payload(RawShareInput),
    NativeError(String),
    NativeState(NativeShareState),
    AppState(AppStateStatus),
    Url(Option<String>),
    Reset { clear_native: bool },
    Deactivated,
}

impl From<NativeEvent> for CoordinatorEvent {
    fn from(event: NativeEvent) -> Self {
        match event {
            NativeEvent::PayloadChanged(raw) => CoordinatorEvent::Payload(raw),
            NativeEvent::ErrorOccurred(message) => CoordinatorEvent::NativeError(message),
            NativeEvent::StateChanged(state) => CoordinatorEvent::NativeState(state),
        }
    }
}

/// Work requested by a transition.
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    Pull { hint_url: String },
    ClearStored { key: String },
    NotifyReset,
    Changed(ShareIntentSnapshot),
}

/// Settings a transition needs to decide on effects.
#[derive(Debug, Clone, Copy)]
pub struct TransitionContext<'a> {
    pub platform: Platform,
    pub scheme: Option<&'a str>,
    pub extension_key: &'a str,
    pub reset_on_background: bool,
    pub debug: bool,
}

/// What consumers observe.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ShareIntentSnapshot {
    pub is_ready: bool,
    pub has_share_intent: bool,
    pub share_intent: ShareIntent,
    pub error: Option<String>,
}

#[derive(Debug, Clone)]
pub struct CoordinatorState {
    phase: LifecyclePhase,
    share_intent: ShareIntent,
    error: Option<String>,
    app_state: AppStateStatus,
    url: Option<String>,
    native_state: Option<NativeShareState>,
}

impl CoordinatorState {
    pub fn new(app_state: AppStateStatus, url: Option<String>) -> Self {
        Self {
            phase: LifecyclePhase::Uninitialized,
            share_intent: ShareIntent::empty(),
            error: None,
            app_state,
            url,
            native_state: None,
        }
    }

    pub fn phase(&self) -> LifecyclePhase {
        self.phase
    }

    pub fn is_ready(&self) -> bool {
        self.phase == LifecyclePhase::Ready
    }

    pub fn share_intent(&self) -> &ShareIntent {
        &self.share_intent
    }

    /// Derived on every read so it can never disagree with `share_intent`.
    pub fn has_share_intent(&self) -> bool {
        self.share_intent.has_content()
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn app_state(&self) -> AppStateStatus {
        self.app_state
    }

    pub fn url(&self) -> Option<&str> {
        self.url.as_deref()
    }

    pub fn native_state(&self) -> Option<NativeShareState> {
        self.native_state
    }

    pub fn snapshot(&self) -> ShareIntentSnapshot {
        ShareIntentSnapshot {
            is_ready: self.is_ready(),
            has_share_intent: self.has_share_intent(),
            share_intent: self.share_intent.clone(),
            error: self.error.clone(),
        }
    }

    pub fn apply(&mut self, event: CoordinatorEvent, ctx: &TransitionContext<'_>) -> Vec<Effect> {
        let before = self.snapshot();
        let mut effects = match (self.phase, event) {
            (LifecyclePhase::Uninitialized, CoordinatorEvent::Activated) => {
                self.phase = LifecyclePhase::Ready;
                self.refresh(ctx)
            }
            (LifecyclePhase::Ready, CoordinatorEvent::Payload(raw)) => {
                self.on_payload(&raw, ctx);
                Vec::new()
            }
            (LifecyclePhase::Ready, CoordinatorEvent::NativeError(message)) => {
                if ctx.debug {
                    debug!("share-intent[error] {}", message);
                }
                self.error = Some(message);
                Vec::new()
            }
            (LifecyclePhase::Ready, CoordinatorEvent::NativeState(state)) => {
                if ctx.debug {
                    debug!("share-intent[state] {:?}", state);
                }
                self.native_state = Some(state);
                Vec::new()
            }
            (LifecyclePhase::Ready, CoordinatorEvent::AppState(next)) => {
                self.on_app_state(next, ctx)
            }
            (LifecyclePhase::Ready, CoordinatorEvent::Url(url)) => {
                if ctx.debug {
                    debug!("share-intent[url] {:?}", url);
                }
                self.url = url;
                self.refresh(ctx)
            }
            (LifecyclePhase::Ready, CoordinatorEvent::Reset { clear_native }) => {
                self.reset(clear_native, ctx)
            }
            (_, CoordinatorEvent::Deactivated) => {
                self.phase = LifecyclePhase::Deactivated;
                Vec::new()
            }
            (phase, event) => {
                if ctx.debug {
                    debug!("share-intent: ignoring {:?} while {:?}", event, phase);
                }
                Vec::new()
            }
        };

        // Observers hear about this state before any pull can produce a newer one
        let after = self.snapshot();
        if after != before {
            effects.insert(0, Effect::Changed(after));
        }
        effects
    }

    fn on_payload(&mut self, raw: &RawShareInput, ctx: &TransitionContext<'_>) {
        if ctx.debug {
            debug!("share-intent[change] {:?}", raw);
        }
        match normalize(raw, NormalizeOptions { debug: ctx.debug }) {
            Ok(share_intent) => {
                self.share_intent = share_intent;
                self.error = None;
            }
            Err(e) => {
                if ctx.debug {
                    error!("share-intent[change] {}", e);
                }
                self.error = Some(PARSE_ERROR_MESSAGE.to_string());
            }
        }
    }

    fn on_app_state(&mut self, next: AppStateStatus, ctx: &TransitionContext<'_>) -> Vec<Effect> {
        let previous = self.app_state;
        self.app_state = next;

        match next {
            AppStateStatus::Active => {
                if ctx.debug {
                    debug!("share-intent[active] refresh");
                }
                self.refresh(ctx)
            }
            AppStateStatus::Inactive | AppStateStatus::Background
                if ctx.reset_on_background
                    && previous == AppStateStatus::Active
                    && self.has_share_intent() =>
            {
                if ctx.debug {
                    debug!("share-intent[to-background] reset");
                }
                self.reset(true, ctx)
            }
            _ => Vec::new(),
        }
    }

    /// Decide whether to ask the native layer for its payload.
    fn refresh(&self, ctx: &TransitionContext<'_>) -> Vec<Effect> {
        if ctx.debug {
            debug!("share-intent[refresh] {:?}", self.url);
        }
        match self.url.as_deref() {
            Some(url) if is_pull_back_url(url, ctx.scheme) => vec![Effect::Pull {
                hint_url: url.to_string(),
            }],
            _ if ctx.platform.keeps_pending_payload() => vec![Effect::Pull {
                hint_url: String::new(),
            }],
            _ => Vec::new(),
        }
    }

    fn reset(&mut self, clear_native: bool, ctx: &TransitionContext<'_>) -> Vec<Effect> {
        let mut effects = Vec::new();
        self.error = None;
        if clear_native {
            effects.push(Effect::ClearStored {
                key: ctx.extension_key.to_string(),
            });
        }
        // A batch whose files were all dropped still counts as shared
        if self.share_intent != ShareIntent::empty() {
            self.share_intent = ShareIntent::empty();
            effects.push(Effect::NotifyReset);
        }
        effects
    }
}
