//! Snapshot adapter: deserialize the source wire format and normalize to internal types.
//!
//! # Purpose
//! The submissions endpoint returns a paginated list wrapper whose records carry
//! several loosely-typed fields.  This module defines the *raw* (wire-level)
//! structs that mirror that response and provides [`normalize_page`] to turn
//! them into the ordered `Vec<Submission>` consumed by the diff engine.
//!
//! # Design constraints
//! - Pure, deterministic conversion. No IO, no async.
//! - Null or absent optional fields default to their zero value.
//! - A record of the wrong shape, an empty `code` or a duplicated `code`
//!   is a [`ParseError`]; the caller aborts the cycle.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Deserializer};
use serde_json::Value;
use tracing::warn;

use crate::{Speaker, Submission, TypeLabel};

/// Source keys that change without editorial meaning. Dropped before diffing.
pub const IGNORED_FIELDS: &[&str] = &["image", "is_featured", "slot", "track"];

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// All errors that can occur while parsing a fetched submissions page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// The body is not a submissions list wrapper, or a record has the wrong shape.
    Malformed(String),
    /// The record at `index` has an empty `code`.
    MissingCode { index: usize },
    /// The same `code` appears more than once in one page.
    DuplicateCode { code: String },
}

impl std::fmt::Display for ParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Malformed(msg) => write!(f, "malformed submissions response: {msg}"),
            Self::MissingCode { index } => {
                write!(f, "submission at index {index} has empty code")
            }
            Self::DuplicateCode { code } => {
                write!(f, "submission code '{code}' appears more than once")
            }
        }
    }
}

impl std::error::Error for ParseError {}

// ---------------------------------------------------------------------------
// Raw wire-level structs  (source JSON → these → internal types)
// ---------------------------------------------------------------------------

/// Top-level list wrapper as returned by the submissions endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct RawSubmissionPage {
    #[serde(default, deserialize_with = "null_as_default")]
    pub count: u64,
    #[serde(default)]
    pub next: Option<String>,
    #[serde(default)]
    pub previous: Option<String>,
    pub results: Vec<RawSubmission>,
}

/// Wire-level submission record.
///
/// Unknown keys are collected into `extra` rather than rejected so that
/// additions on the source side don't break deserialization.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawSubmission {
    #[serde(default, deserialize_with = "lenient_string")]
    pub code: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub title: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub submission_type: RawTypeLabel,
    #[serde(default, deserialize_with = "lenient_string")]
    pub state: String,
    #[serde(rename = "abstract", default, deserialize_with = "lenient_string")]
    pub abstract_text: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub description: String,
    /// Minutes; the source sends either a number or a string.
    #[serde(default, deserialize_with = "lenient_string")]
    pub duration: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub content_locale: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub do_not_record: bool,
    #[serde(default, deserialize_with = "null_as_default")]
    pub speakers: Vec<RawSpeaker>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

/// Submission type: a plain string or a map of locale → label.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum RawTypeLabel {
    Plain(String),
    Localized(BTreeMap<String, Option<String>>),
}

impl Default for RawTypeLabel {
    fn default() -> Self {
        RawTypeLabel::Localized(BTreeMap::new())
    }
}

/// Wire-level speaker entry. `avatar` and other keys are ignored.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawSpeaker {
    #[serde(default, deserialize_with = "lenient_string")]
    pub code: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub name: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub biography: String,
}

// ---------------------------------------------------------------------------
// Deserialization helpers
// ---------------------------------------------------------------------------

fn null_as_default<'de, D, T>(de: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(de)?.unwrap_or_default())
}

/// Scalars become text; null becomes `""`. Arrays and objects are rejected.
fn lenient_string<'de, D>(de: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(de)? {
        Value::Null => Ok(String::new()),
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        Value::Bool(b) => Ok(b.to_string()),
        other => Err(serde::de::Error::custom(format!(
            "expected a scalar, got {other}"
        ))),
    }
}

// ---------------------------------------------------------------------------
// Normalization
// ---------------------------------------------------------------------------

fn normalize_type_label(raw: RawTypeLabel) -> TypeLabel {
    match raw {
        RawTypeLabel::Plain(label) => TypeLabel::new(label, ""),
        RawTypeLabel::Localized(mut labels) => TypeLabel::new(
            labels.remove("en").flatten().unwrap_or_default(),
            labels.remove("de").flatten().unwrap_or_default(),
        ),
    }
}

fn normalize_submission(index: usize, raw: RawSubmission) -> Result<Submission, ParseError> {
    let code = raw.code.trim().to_string();
    if code.is_empty() {
        return Err(ParseError::MissingCode { index });
    }

    let mut extra = raw.extra;
    for key in IGNORED_FIELDS {
        extra.remove(*key);
    }

    Ok(Submission {
        code,
        title: raw.title,
        submission_type: normalize_type_label(raw.submission_type),
        state: raw.state,
        abstract_text: raw.abstract_text,
        description: raw.description,
        duration: raw.duration,
        content_locale: raw.content_locale,
        do_not_record: raw.do_not_record,
        speakers: raw
            .speakers
            .into_iter()
            .map(|s| Speaker {
                code: s.code,
                name: s.name,
                biography: s.biography,
            })
            .collect(),
        extra,
    })
}

/// Normalize a raw page into submissions, preserving fetch order.
///
/// # Errors
/// Returns the first [`ParseError`] encountered.
pub fn normalize_page(raw: RawSubmissionPage) -> Result<Vec<Submission>, ParseError> {
    let fetched = raw.results.len();
    if raw.next.is_some() || raw.count > fetched as u64 {
        warn!(
            count = raw.count,
            fetched,
            "source reports more submissions than one page holds; only the first page is reconciled"
        );
    }

    let mut seen: BTreeSet<String> = BTreeSet::new();
    let mut out: Vec<Submission> = Vec::with_capacity(fetched);
    for (index, raw_submission) in raw.results.into_iter().enumerate() {
        let submission = normalize_submission(index, raw_submission)?;
        if !seen.insert(submission.code.clone()) {
            return Err(ParseError::DuplicateCode {
                code: submission.code,
            });
        }
        out.push(submission);
    }
    Ok(out)
}

/// Parse a response body directly into submissions.
///
/// Convenience wrapper: `json → RawSubmissionPage → Vec<Submission>`.
pub fn parse_submissions_json(json: &str) -> Result<Vec<Submission>, ParseError> {
    let raw: RawSubmissionPage =
        serde_json::from_str(json).map_err(|e| ParseError::Malformed(e.to_string()))?;
    normalize_page(raw)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
