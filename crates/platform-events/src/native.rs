//! # Native Events
//!
//! Routing of raw events emitted by the native modules onto the bus.

use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, error};

use crate::bus::PlatformEventBus;
use crate::error::EventBusError;

pub const AUDIO_FOCUS_CHANGE_EVENT: &str = "EventAudioFocusChange";
pub const SCREEN_CAPTURE_STOP_EVENT: &str = "EventSystemScreenCaptureStop";
pub const SCREEN_CAPTURE_START_EVENT: &str = "EventSystemScreenCaptureStart";

/// Payload of [`AUDIO_FOCUS_CHANGE_EVENT`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AudioFocusEvent {
    pub has_focus: bool,
}

impl PlatformEventBus {
    /// Route a native event by name. Payloads are only inspected for events that carry one.
    pub fn dispatch_native(&self, name: &str, payload: &Value) -> Result<(), EventBusError> {
        match name {
            AUDIO_FOCUS_CHANGE_EVENT => {
                let event = AudioFocusEvent::deserialize(payload).map_err(|e| {
                    error!(event = name, error = %e, "Invalid audio focus event");
                    EventBusError::InvalidPayload {
                        event: name.to_owned(),
                        reason: e.to_string(),
                    }
                })?;
                self.audio_focus_changed(event.has_focus);
            }
            SCREEN_CAPTURE_STOP_EVENT => self.screen_capture_stopped(),
            SCREEN_CAPTURE_START_EVENT => self.screen_capture_started(),
            other => {
                debug!(event = other, "Ignoring unknown native event");
                return Err(EventBusError::UnknownEvent(other.to_owned()));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use serde_json::json;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_dispatch_audio_focus() {
        let bus = PlatformEventBus::default();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        bus.on_audio_focus_change(move |focus| sink.lock().push(focus))
            .unwrap();

        bus.dispatch_native(AUDIO_FOCUS_CHANGE_EVENT, &json!({ "hasFocus": false }))
            .unwrap();

        assert_eq!(*seen.lock(), vec![false]);
        assert!(!bus.has_audio_focus());
    }

    #[test]
    fn test_dispatch_audio_focus_invalid_payload() {
        let bus = PlatformEventBus::default();

        for payload in [
            Value::Null,
            json!({}),
            json!({ "hasFocus": "no" }),
            json!({ "has_focus": false }),
        ] {
            let err = bus
                .dispatch_native(AUDIO_FOCUS_CHANGE_EVENT, &payload)
                .unwrap_err();
            assert!(
                matches!(err, EventBusError::InvalidPayload { ref event, .. } if event == AUDIO_FOCUS_CHANGE_EVENT),
                "payload: {payload}"
            );
        }
        assert!(bus.has_audio_focus());
    }

    #[test]
    fn test_dispatch_screen_capture_events() {
        let bus = PlatformEventBus::default();
        let stops = Arc::new(AtomicUsize::new(0));
        let starts = Arc::new(AtomicUsize::new(0));

        let s = stops.clone();
        bus.on_screen_capture_stop(move || {
            s.fetch_add(1, Ordering::SeqCst);
        })
        .unwrap();
        let s = starts.clone();
        bus.set_screen_capture_start_callback(move || {
            s.fetch_add(1, Ordering::SeqCst);
        })
        .unwrap();

        bus.dispatch_native(SCREEN_CAPTURE_START_EVENT, &Value::Null)
            .unwrap();
        bus.dispatch_native(SCREEN_CAPTURE_STOP_EVENT, &json!({}))
            .unwrap();

        assert_eq!(starts.load(Ordering::SeqCst), 1);
        assert_eq!(stops.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_dispatch_unknown_event() {
        let bus = PlatformEventBus::default();
        let err = bus.dispatch_native("EventSomethingElse", &Value::Null).unwrap_err();
        assert!(matches!(err, EventBusError::UnknownEvent(ref name) if name == "EventSomethingElse"));
    }
}
