//! Message formatting and batching.
//!
//! Turns one cycle's events into at most one [`NotificationPayload`]:
//! one rendered line per event, newline-joined, truncated to the body cap.
//!
//! It does **not**:
//! - send anything (that is the sink)
//! - decide which events exist (that is `ptx-reconcile`)

use std::time::Duration;

use ptx_reconcile::{FieldChange, SubmissionEvent};

pub const DEFAULT_TITLE: &str = "PreTalx: Changed submissions detected";
/// Pushover's message limit.
pub const DEFAULT_MAX_BODY_CHARS: usize = 1024;
pub const DEFAULT_SOUND: &str = "cosmic";
pub const DEFAULT_RETRY: Duration = Duration::from_secs(60);
pub const DEEP_LINK_TITLE: &str = "PreTalx";
pub const TRUNCATION_MARKER: &str = "...";

/// Longest rendering of a single old/new value inside a change line.
const MAX_VALUE_CHARS: usize = 120;

// ---------------------------------------------------------------------------
// Payload
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeepLink {
    pub url: String,
    pub title: String,
}

/// One notification, ready for a sink.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationPayload {
    pub title: String,
    /// Newline-joined event lines, already truncated.
    pub body: String,
    pub link: Option<DeepLink>,
    pub sound: Option<String>,
    pub retry: Option<Duration>,
}

// ---------------------------------------------------------------------------
// Policy
// ---------------------------------------------------------------------------

/// Static formatting settings, built once at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessagePolicy {
    pub title: String,
    pub max_body_chars: usize,
    pub link: Option<DeepLink>,
    pub sound: Option<String>,
    pub retry: Option<Duration>,
}

impl Default for MessagePolicy {
    fn default() -> Self {
        Self {
            title: DEFAULT_TITLE.to_string(),
            max_body_chars: DEFAULT_MAX_BODY_CHARS,
            link: None,
            sound: Some(DEFAULT_SOUND.to_string()),
            retry: Some(DEFAULT_RETRY),
        }
    }
}

impl MessagePolicy {
    /// Defaults plus a deep link derived from the source API URL.
    pub fn for_source(api_url: &str) -> Self {
        Self {
            link: deep_link_from_api_url(api_url).map(|url| DeepLink {
                url,
                title: DEEP_LINK_TITLE.to_string(),
            }),
            ..Self::default()
        }
    }

    pub fn with_max_body_chars(mut self, max_body_chars: usize) -> Self {
        self.max_body_chars = max_body_chars;
        self
    }

    pub fn with_sound(mut self, sound: Option<String>) -> Self {
        self.sound = sound;
        self
    }
}

// ---------------------------------------------------------------------------
// Rendering
// ---------------------------------------------------------------------------

fn shorten(value: &str) -> String {
    if value.chars().count() <= MAX_VALUE_CHARS {
        return value.to_string();
    }
    let head: String = value.chars().take(MAX_VALUE_CHARS).collect();
    format!("{head}{TRUNCATION_MARKER}")
}

/// `field: 'old' -> 'new'` items joined with `; `.
pub fn render_diff(diff: &[FieldChange]) -> String {
    diff.iter()
        .map(|c| format!("{}: '{}' -> '{}'", c.field, shorten(&c.old), shorten(&c.new)))
        .collect::<Vec<_>>()
        .join("; ")
}

pub fn render_event(event: &SubmissionEvent) -> String {
    match event {
        SubmissionEvent::New { submission } => format!(
            "A new {} with the title '{}' has been submitted.",
            submission.type_label(),
            submission.title
        ),
        SubmissionEvent::Changed { current, diff, .. } => format!(
            "The {} with the title '{}' has been changed: {}.",
            current.type_label(),
            current.title,
            render_diff(diff)
        ),
    }
}

/// Cut `body` to at most `max_chars` characters, ending in [`TRUNCATION_MARKER`].
///
/// Character-based; never splits a UTF-8 sequence. A cap too small to hold
/// the marker gets a plain cut instead.
pub fn truncate_body(body: &str, max_chars: usize) -> String {
    if body.chars().count() <= max_chars {
        return body.to_string();
    }
    let marker_chars = TRUNCATION_MARKER.chars().count();
    if max_chars <= marker_chars {
        return body.chars().take(max_chars).collect();
    }
    let keep = max_chars - marker_chars;
    let mut out: String = body.chars().take(keep).collect();
    out.push_str(TRUNCATION_MARKER);
    out
}

/// Format one cycle's events.
///
/// No events => `None` (nothing is sent). Otherwise exactly one payload,
/// however many events there are.
pub fn format_events(
    events: &[SubmissionEvent],
    policy: &MessagePolicy,
) -> Option<NotificationPayload> {
    if events.is_empty() {
        return None;
    }

    let body = events
        .iter()
        .map(render_event)
        .collect::<Vec<_>>()
        .join("\n");

    Some(NotificationPayload {
        title: policy.title.clone(),
        body: truncate_body(&body, policy.max_body_chars),
        link: policy.link.clone(),
        sound: policy.sound.clone(),
        retry: policy.retry,
    })
}

/// Human-facing URL for an API base URL.
///
/// `https://host/api/events/<slug>` → `https://host/<slug>/`;
/// any other `https://host/.../api/...` → the part before `/api`, with a slash.
/// `None` when the URL has no `/api/` segment.
pub fn deep_link_from_api_url(api_url: &str) -> Option<String> {
    let trimmed = format!("{}/", api_url.trim().trim_end_matches('/'));
    let idx = trimmed.find("/api/")?;
    let root = &trimmed[..idx];
    if root.is_empty() {
        return None;
    }

    let rest = &trimmed[idx + "/api/".len()..];
    let slug = rest
        .strip_prefix("events/")
        .and_then(|r| r.split('/').next())
        .filter(|s| !s.is_empty());

    Some(match slug {
        Some(slug) => format!("{root}/{slug}/"),
        None => format!("{root}/"),
    })
}
