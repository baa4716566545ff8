use std::fmt;

use crate::NotificationPayload;

/// Proof of delivery returned by a sink.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Receipt {
    pub request_id: String,
}

/// Errors a [`NotificationSink`] may return. Reported, never retried.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchError {
    /// Network or transport failure.
    Transport(String),
    /// The sink answered but refused the message.
    Rejected { status: u16, errors: Vec<String> },
    /// The sink's answer could not be decoded.
    Decode(String),
}

impl fmt::Display for DispatchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DispatchError::Transport(msg) => write!(f, "notification transport error: {msg}"),
            DispatchError::Rejected { status, errors } if errors.is_empty() => {
                write!(f, "notification rejected status={status}")
            }
            DispatchError::Rejected { status, errors } => {
                write!(
                    f,
                    "notification rejected status={status}: {}",
                    errors.join("; ")
                )
            }
            DispatchError::Decode(msg) => write!(f, "notification response decode error: {msg}"),
        }
    }
}

impl std::error::Error for DispatchError {}

/// Push-notification delivery contract.
///
/// Object-safe so the daemon can hold a `Box<dyn NotificationSink>`.
#[async_trait::async_trait]
pub trait NotificationSink: Send + Sync {
    /// Human-readable name identifying this sink (e.g. `"pushover"`).
    fn sink_name(&self) -> &'static str;

    async fn send(&self, payload: &NotificationPayload) -> Result<Receipt, DispatchError>;
}
