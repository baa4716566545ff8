//! ptx-notify
//!
//! Notification side of the reconcile cycle: the message formatter/batcher,
//! the [`NotificationSink`] boundary and the Pushover client behind it.

pub mod format;
pub mod pushover;
mod sink;

pub use format::{format_events, render_event, DeepLink, MessagePolicy, NotificationPayload};
pub use pushover::PushoverSink;
pub use sink::{DispatchError, NotificationSink, Receipt};
