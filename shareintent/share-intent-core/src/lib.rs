//! Share intent handling shared by the mobile front-ends.
//!
//! Two pieces:
//! - [`normalize`] turns a raw Android/iOS share payload into one
//!   [`ShareIntent`] shape.
//! - [`ShareIntentCoordinator`] decides when to ask the native layer for a
//!   payload, owns the current [`ShareIntent`] and resets it as the app
//!   moves between foreground and background.

mod config;
mod coordinator;
mod error;
mod events;
mod models;
mod native;
mod normalizer;
mod payload;

pub use config::{
    extension_key, is_pull_back_url, resolve_scheme, Platform, ShareIntentOptions,
    PULL_BACK_HOST, SHARE_KEY_SUFFIX,
};
pub use coordinator::{
    ChangeObserver, CoordinatorBuilder, CoordinatorEvent, CoordinatorHandle, CoordinatorState,
    Effect, LifecyclePhase, ResetCallback, ShareIntentCoordinator, ShareIntentSnapshot,
    TransitionContext, PARSE_ERROR_MESSAGE,
};
pub use error::{Result, ShareIntentError};
pub use events::{
    AppStateStatus, EventEmitter, EventSource, Listener, NativeEvent, NativeShareState,
    Subscription, UrlEvent,
};
pub use models::{ShareIntent, ShareIntentFile, ShareIntentMeta, ShareIntentType};
pub use native::{NativeChannel, NativeModule};
pub use normalizer::{find_web_url, normalize, NormalizeOptions};
pub use payload::RawShareInput;
