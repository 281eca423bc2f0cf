use std::sync::Arc;

use once_cell::sync::OnceCell;

use crate::error::Result;
use crate::events::{Listener, NativeEvent, Subscription};

/// The platform share module, as seen from the coordinator.
///
/// Outbound calls are fire-and-forget: a pull only asks the native side to
/// eventually emit [`NativeEvent::PayloadChanged`] or
/// [`NativeEvent::ErrorOccurred`].
pub trait NativeModule: Send + Sync {
    /// Ask the native layer to re-deliver its current payload.
    ///
    /// `hint_url` is the pull-back URL on iOS and empty on Android.
    fn pull_payload(&self, hint_url: &str) -> Result<()>;

    /// Discard whatever is stored under `key`.
    fn clear_stored_payload(&self, key: &str) -> Result<()>;

    fn has_stored_payload(&self, key: &str) -> Result<bool>;

    fn subscribe(&self, listener: Listener<NativeEvent>) -> Result<Subscription>;
}

/// Create-once holder for the native module shared by every coordinator.
pub struct NativeChannel {
    cell: OnceCell<Arc<dyn NativeModule>>,
}

impl NativeChannel {
    pub const fn new() -> Self {
        Self {
            cell: OnceCell::new(),
        }
    }

    /// Return the shared module, creating it on first use.
    pub fn get_or_init<F>(&self, init: F) -> Arc<dyn NativeModule>
    where
        F: FnOnce() -> Arc<dyn NativeModule>,
    {
        self.cell.get_or_init(init).clone()
    }

    /// Like [`get_or_init`](Self::get_or_init) for factories that can fail.
    ///
    /// A failed factory leaves the channel empty so a later call may retry.
    pub fn get_or_try_init<F, E>(&self, init: F) -> std::result::Result<Arc<dyn NativeModule>, E>
    where
        F: FnOnce() -> std::result::Result<Arc<dyn NativeModule>, E>,
    {
        self.cell.get_or_try_init(init).cloned()
    }

    pub fn get(&self) -> Option<Arc<dyn NativeModule>> {
        self.cell.get().cloned()
    }
}

impl Default for NativeChannel {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ShareIntentError;
    use crate::events::{EventEmitter, EventSource};
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct NullNative {
        events: EventEmitter<NativeEvent>,
    }

    impl NativeModule for NullNative {
        fn pull_payload(&self, _hint_url: &str) -> Result<()> {
            Ok(())
        }

        fn clear_stored_payload(&self, _key: &str) -> Result<()> {
            Ok(())
        }

        fn has_stored_payload(&self, _key: &str) -> Result<bool> {
            Ok(false)
        }

        fn subscribe(&self, listener: Listener<NativeEvent>) -> Result<Subscription> {
            self.events.subscribe(listener)
        }
    }

    #[test]
    fn test_channel_initializes_once() {
        static CHANNEL: NativeChannel = NativeChannel::new();
        let created = AtomicUsize::new(0);

        assert!(CHANNEL.get().is_none());
        let make = || -> Arc<dyn NativeModule> {
            created.fetch_add(1, Ordering::SeqCst);
            Arc::new(NullNative {
                events: EventEmitter::new(),
            })
        };

        let first = CHANNEL.get_or_init(make);
        let second = CHANNEL.get_or_init(make);

        assert_eq!(created.load(Ordering::SeqCst), 1, "Factory should run once");
        assert!(Arc::ptr_eq(&first, &second));
        assert!(CHANNEL.get().is_some());
    }

    #[test]
    fn test_channel_failed_init_can_retry() {
        static CHANNEL: NativeChannel = NativeChannel::new();

        let failed = CHANNEL.get_or_try_init(|| {
            Err(ShareIntentError::Registration("plugin missing".into()))
        });
        assert!(matches!(failed, Err(ShareIntentError::Registration(_))));
        assert!(CHANNEL.get().is_none());

        let module = CHANNEL
            .get_or_try_init(|| -> Result<Arc<dyn NativeModule>> {
                Ok(Arc::new(NullNative {
                    events: EventEmitter::new(),
                }))
            })
            .unwrap();
        let again = CHANNEL
            .get_or_try_init(|| -> Result<Arc<dyn NativeModule>> {
                panic!("channel is already initialized")
            })
            .unwrap();
        assert!(Arc::ptr_eq(&module, &again));
    }
}
