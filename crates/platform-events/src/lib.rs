//! # Platform Events
//!
//! An owned event bus for the platform signals the call client reacts to:
//! audio focus changes, the app moving between foreground and background,
//! and the system screen capture starting or stopping.
//!
//! The bus is created at app start, handed to whoever needs it, and torn
//! down with [`PlatformEventBus::shutdown`].

mod bus;
mod error;
mod native;

pub use bus::{AppState, ListenerId, PlatformEventBus};
pub use error::EventBusError;
pub use native::{
    AUDIO_FOCUS_CHANGE_EVENT, AudioFocusEvent, SCREEN_CAPTURE_START_EVENT,
    SCREEN_CAPTURE_STOP_EVENT,
};
