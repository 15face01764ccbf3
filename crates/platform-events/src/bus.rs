//! # Event Bus
//!
//! Listener registry and edge-triggered state tracking for platform signals.

use std::sync::Arc;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::EventBusError;

type StateListener = Arc<dyn Fn(bool) + Send + Sync>;
type Callback = Arc<dyn Fn() + Send + Sync>;

/// Handle returned by a subscription, used to unsubscribe
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

/// Lifecycle state of the host application
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AppState {
    Active,
    Background,
    Inactive,
    Unknown,
}

impl AppState {
    pub fn is_active(self) -> bool {
        self == AppState::Active
    }
}

struct Inner {
    closed: bool,
    next_id: u64,
    has_audio_focus: bool,
    app_state: AppState,
    // Vecs keep listeners in subscription order
    audio_focus: Vec<(ListenerId, StateListener)>,
    app_active: Vec<(ListenerId, StateListener)>,
    screen_capture_stop: Vec<(ListenerId, Callback)>,
    screen_capture_start: Option<Callback>,
}

impl Inner {
    fn next_id(&mut self) -> ListenerId {
        self.next_id += 1;
        ListenerId(self.next_id)
    }
}

/// Owned registry of platform event listeners.
///
/// Listeners are always invoked after the internal lock is released, so a
/// listener may subscribe or unsubscribe from within its callback.
pub struct PlatformEventBus {
    inner: Mutex<Inner>,
}

impl PlatformEventBus {
    /// Create a bus. Audio focus is assumed held until told otherwise.
    pub fn new(initial_app_state: AppState) -> Self {
        Self {
            inner: Mutex::new(Inner {
                closed: false,
                next_id: 0,
                has_audio_focus: true,
                app_state: initial_app_state,
                audio_focus: Vec::new(),
                app_active: Vec::new(),
                screen_capture_stop: Vec::new(),
                screen_capture_start: None,
            }),
        }
    }

    pub fn has_audio_focus(&self) -> bool {
        self.inner.lock().has_audio_focus
    }

    pub fn app_state(&self) -> AppState {
        self.inner.lock().app_state
    }

    pub fn is_closed(&self) -> bool {
        self.inner.lock().closed
    }

    /// Number of registered listeners, the start callback included
    pub fn listener_count(&self) -> usize {
        let inner = self.inner.lock();
        inner.audio_focus.len()
            + inner.app_active.len()
            + inner.screen_capture_stop.len()
            + usize::from(inner.screen_capture_start.is_some())
    }

    /// Called with the new value whenever audio focus is gained or lost
    pub fn on_audio_focus_change<F>(&self, listener: F) -> Result<ListenerId, EventBusError>
    where
        F: Fn(bool) + Send + Sync + 'static,
    {
        let mut inner = self.inner.lock();
        if inner.closed {
            return Err(EventBusError::Closed);
        }
        let id = inner.next_id();
        inner.audio_focus.push((id, Arc::new(listener)));
        Ok(id)
    }

    /// Called with `is_active` whenever the app enters or leaves the foreground
    pub fn on_app_active_change<F>(&self, listener: F) -> Result<ListenerId, EventBusError>
    where
        F: Fn(bool) + Send + Sync + 'static,
    {
        let mut inner = self.inner.lock();
        if inner.closed {
            return Err(EventBusError::Closed);
        }
        let id = inner.next_id();
        inner.app_active.push((id, Arc::new(listener)));
        Ok(id)
    }

    /// Called when the system stops the screen capture, e.g. from the control center
    pub fn on_screen_capture_stop<F>(&self, listener: F) -> Result<ListenerId, EventBusError>
    where
        F: Fn() + Send + Sync + 'static,
    {
        let mut inner = self.inner.lock();
        if inner.closed {
            return Err(EventBusError::Closed);
        }
        let id = inner.next_id();
        inner.screen_capture_stop.push((id, Arc::new(listener)));
        Ok(id)
    }

    /// Install the single callback run once the system screen capture has started.
    /// Replaces any previous callback.
    pub fn set_screen_capture_start_callback<F>(&self, callback: F) -> Result<(), EventBusError>
    where
        F: Fn() + Send + Sync + 'static,
    {
        let mut inner = self.inner.lock();
        if inner.closed {
            return Err(EventBusError::Closed);
        }
        inner.screen_capture_start = Some(Arc::new(callback));
        Ok(())
    }

    pub fn clear_screen_capture_start_callback(&self) {
        self.inner.lock().screen_capture_start = None;
    }

    /// Remove a listener. Returns false if the id is unknown.
    pub fn unsubscribe(&self, id: ListenerId) -> bool {
        let mut inner = self.inner.lock();
        let before = inner.audio_focus.len()
            + inner.app_active.len()
            + inner.screen_capture_stop.len();

        inner.audio_focus.retain(|(lid, _)| *lid != id);
        inner.app_active.retain(|(lid, _)| *lid != id);
        inner.screen_capture_stop.retain(|(lid, _)| *lid != id);

        let after = inner.audio_focus.len()
            + inner.app_active.len()
            + inner.screen_capture_stop.len();
        before != after
    }

    /// Record the current audio focus; listeners run only if it changed
    pub fn audio_focus_changed(&self, has_focus: bool) {
        let listeners = {
            let mut inner = self.inner.lock();
            if inner.closed || inner.has_audio_focus == has_focus {
                return;
            }
            inner.has_audio_focus = has_focus;
            snapshot(&inner.audio_focus)
        };

        debug!(has_focus, listeners = listeners.len(), "Audio focus changed");
        for listener in listeners {
            listener(has_focus);
        }
    }

    /// Record the app state; listeners run only if the app became active or stopped being active
    pub fn app_state_changed(&self, state: AppState) {
        let listeners = {
            let mut inner = self.inner.lock();
            if inner.closed {
                return;
            }
            let was_active = inner.app_state.is_active();
            inner.app_state = state;
            if was_active == state.is_active() {
                return;
            }
            snapshot(&inner.app_active)
        };

        let is_active = state.is_active();
        debug!(?state, is_active, "App active state changed");
        for listener in listeners {
            listener(is_active);
        }
    }

    pub fn screen_capture_stopped(&self) {
        let listeners = {
            let inner = self.inner.lock();
            if inner.closed {
                return;
            }
            snapshot(&inner.screen_capture_stop)
        };

        debug!(listeners = listeners.len(), "System screen capture stopped");
        for listener in listeners {
            listener();
        }
    }

    pub fn screen_capture_started(&self) {
        let callback = {
            let inner = self.inner.lock();
            if inner.closed {
                return;
            }
            inner.screen_capture_start.clone()
        };

        if let Some(callback) = callback {
            debug!("System screen capture started");
            callback();
        }
    }

    /// Drop every listener and refuse new ones. Later emits are ignored.
    pub fn shutdown(&self) {
        let mut inner = self.inner.lock();
        inner.closed = true;
        inner.audio_focus.clear();
        inner.app_active.clear();
        inner.screen_capture_stop.clear();
        inner.screen_capture_start = None;
        debug!("Platform event bus shut down");
    }
}

impl Default for PlatformEventBus {
    fn default() -> Self {
        Self::new(AppState::Active)
    }
}

fn snapshot<T: ?Sized>(listeners: &[(ListenerId, Arc<T>)]) -> Vec<Arc<T>> {
    listeners.iter().map(|(_, l)| Arc::clone(l)).collect()
}
