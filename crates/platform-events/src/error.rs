use thiserror::Error;

#[derive(Debug, Error)]
pub enum EventBusError {
    #[error("Event bus has been shut down")]
    Closed,

    #[error("Invalid payload for {event}: {reason}")]
    InvalidPayload { event: String, reason: String },

    #[error("Unknown native event: {0}")]
    UnknownEvent(String),
}
