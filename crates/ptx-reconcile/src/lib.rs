//! ptx-reconcile
//!
//! Submission reconciliation core.
//!
//! - Known submissions are keyed by `code`; a never-seen code is NEW
//! - A known code whose fields differ is CHANGED (when change detection is on)
//! - Codes that vanish from the source are kept, never reported
//! - The baseline seed never produces events
//!
//! Deterministic, pure logic. No IO. No network calls.

mod engine;
pub mod snapshot_adapter;
mod store;
mod types;

pub use engine::{diff_submissions, reconcile};
pub use snapshot_adapter::{normalize_page, parse_submissions_json, ParseError};
pub use store::KnownSubmissions;
pub use types::*;
