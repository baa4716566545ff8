//! ptx-source
//!
//! Submission source boundary: the [`SubmissionSource`] trait and the pretalx
//! REST client behind it.
//!
//! This crate fetches and parses one page of submissions. It does **not**
//! diff, store or notify; the daemon hands the result to `ptx-reconcile`.

use std::fmt;
use std::time::Duration;

use ptx_reconcile::{parse_submissions_json, ParseError, Submission};
use reqwest::header::{ACCEPT, AUTHORIZATION};
use tracing::info;

/// Single bounded page; pagination beyond it is not attempted.
pub const PAGE_LIMIT: usize = 1000;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

/// Errors a [`SubmissionSource`] may return. Any of them aborts the cycle.
#[derive(Debug, Clone)]
pub enum SourceError {
    /// Network or transport failure, including reading the body.
    Transport(String),
    /// The source answered with a non-success HTTP status.
    Status { status: u16, message: String },
    /// The body was not a valid submissions page.
    Parse(ParseError),
}

impl SourceError {
    /// `true` for failures reaching the source (as opposed to reading its answer).
    pub fn is_fetch(&self) -> bool {
        matches!(self, SourceError::Transport(_) | SourceError::Status { .. })
    }
}

impl fmt::Display for SourceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceError::Transport(msg) => write!(f, "request to pretalx failed: {msg}"),
            SourceError::Status { status, message } => {
                write!(f, "pretalx http error status={status}: {message}")
            }
            SourceError::Parse(err) => write!(f, "un-marshalling response failed: {err}"),
        }
    }
}

impl std::error::Error for SourceError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SourceError::Parse(err) => Some(err),
            _ => None,
        }
    }
}

impl From<ParseError> for SourceError {
    fn from(err: ParseError) -> Self {
        SourceError::Parse(err)
    }
}

// ---------------------------------------------------------------------------
// Source trait
// ---------------------------------------------------------------------------

/// Upstream submission source contract.
///
/// Object-safe so the daemon can hold a `Box<dyn SubmissionSource>`.
#[async_trait::async_trait]
pub trait SubmissionSource: Send + Sync {
    /// Human-readable name identifying this source (e.g. `"pretalx"`).
    fn source_name(&self) -> &'static str;

    /// Fetch the current submissions in source order.
    async fn fetch_all(&self) -> Result<Vec<Submission>, SourceError>;
}

// ---------------------------------------------------------------------------
// pretalx
// ---------------------------------------------------------------------------

/// pretalx-backed submission source.
///
/// `base_url` is the event API root, e.g. `https://pretalx.com/api/events/demo`.
/// The token is read by the caller and passed in; it is never logged.
#[derive(Clone)]
pub struct PretalxSource {
    http: reqwest::Client,
    base_url: String,
    token: String,
    limit: usize,
}

impl fmt::Debug for PretalxSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PretalxSource")
            .field("base_url", &self.base_url)
            .field("token", &"<REDACTED>")
            .field("limit", &self.limit)
            .finish()
    }
}

impl PretalxSource {
    pub fn new(base_url: impl Into<String>, token: impl Into<String>) -> Self {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());
        Self::with_client(http, base_url, token)
    }

    pub fn with_client(
        http: reqwest::Client,
        base_url: impl Into<String>,
        token: impl Into<String>,
    ) -> Self {
        Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token: token.into(),
            limit: PAGE_LIMIT,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn submissions_url(&self) -> String {
        format!("{}/submissions", self.base_url)
    }
}

#[async_trait::async_trait]
impl SubmissionSource for PretalxSource {
    fn source_name(&self) -> &'static str {
        "pretalx"
    }

    async fn fetch_all(&self) -> Result<Vec<Submission>, SourceError> {
        let url = self.submissions_url();
        let limit = self.limit.to_string();
        info!(url = %url, limit = self.limit, "requesting submissions");

        let resp = self
            .http
            .get(&url)
            .query(&[("limit", limit.as_str())])
            .header(ACCEPT, "application/json")
            .header(AUTHORIZATION, format!("Token {}", self.token))
            .send()
            .await
            .map_err(|e| SourceError::Transport(e.to_string()))?;

        let status = resp.status();
        let body = resp
            .text()
            .await
            .map_err(|e| SourceError::Transport(format!("reading response body failed: {e}")))?;

        if !status.is_success() {
            return Err(SourceError::Status {
                status: status.as_u16(),
                message: truncate_for_log(&body),
            });
        }

        Ok(parse_submissions_json(&body)?)
    }
}

fn truncate_for_log(body: &str) -> String {
    const MAX: usize = 200;
    let trimmed = body.trim();
    if trimmed.chars().count() <= MAX {
        trimmed.to_string()
    } else {
        let head: String = trimmed.chars().take(MAX).collect();
        format!("{head}...")
    }
}

// -----------------
// Tests (no network)
// -----------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_url_trailing_slash_trimmed() {
        let src = PretalxSource::new("https://pretalx.example/api/events/demo/", "t");
        assert_eq!(
            src.submissions_url(),
            "https://pretalx.example/api/events/demo/submissions"
        );
    }

    #[test]
    fn debug_redacts_token() {
        let src = PretalxSource::new("https://pretalx.example/api/events/demo", "s3cr3t");
        let dbg = format!("{src:?}");
        assert!(!dbg.contains("s3cr3t"));
        assert!(dbg.contains("<REDACTED>"));
    }

    #[test]
    fn source_error_classification() {
        assert!(SourceError::Transport("refused".into()).is_fetch());
        assert!(SourceError::Status {
            status: 401,
            message: String::new()
        }
        .is_fetch());
        assert!(!SourceError::Parse(ParseError::Malformed("x".into())).is_fetch());
    }

    #[test]
    fn source_error_display_status() {
        let err = SourceError::Status {
            status: 403,
            message: "forbidden".into(),
        };
        assert_eq!(err.to_string(), "pretalx http error status=403: forbidden");
    }

    #[test]
    fn long_bodies_are_cut_for_logs() {
        let body = "x".repeat(500);
        assert_eq!(truncate_for_log(&body).chars().count(), 203);
    }
}
