use std::collections::BTreeMap;

use serde_json::Value;

/// Localized submission-type label as published by the source.
///
/// `primary` is the English label, `secondary` the German fallback.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TypeLabel {
    pub primary: String,
    pub secondary: String,
}

impl TypeLabel {
    pub fn new(primary: impl Into<String>, secondary: impl Into<String>) -> Self {
        Self {
            primary: primary.into(),
            secondary: secondary.into(),
        }
    }

    /// Primary label, falling back to the secondary one. Both empty yields `""`.
    pub fn resolve(&self) -> &str {
        if self.primary.is_empty() {
            &self.secondary
        } else {
            &self.primary
        }
    }
}

/// Speaker attached to a submission. Avatars are not tracked.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Speaker {
    pub code: String,
    pub name: String,
    pub biography: String,
}

/// One submission record, normalized from the source wire format.
///
/// `code` is the identity key across cycles. Every other field, including the
/// opaque `extra` map, takes part in equality and in [`crate::diff_submissions`].
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Submission {
    pub code: String,
    pub title: String,
    pub submission_type: TypeLabel,
    pub state: String,
    pub abstract_text: String,
    pub description: String,
    pub duration: String,
    pub content_locale: String,
    pub do_not_record: bool,
    pub speakers: Vec<Speaker>,
    /// Remaining source fields, ordered by key.
    pub extra: BTreeMap<String, Value>,
}

impl Submission {
    pub fn new(
        code: impl Into<String>,
        title: impl Into<String>,
        submission_type: TypeLabel,
    ) -> Self {
        Self {
            code: code.into(),
            title: title.into(),
            submission_type,
            ..Self::default()
        }
    }

    /// Human-facing type name used in notifications.
    pub fn type_label(&self) -> &str {
        self.submission_type.resolve()
    }
}

/// A single differing field between two versions of a submission.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FieldChange {
    pub field: String,
    pub old: String,
    pub new: String,
}

impl FieldChange {
    pub fn new(field: impl Into<String>, old: impl Into<String>, new: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            old: old.into(),
            new: new.into(),
        }
    }
}

/// Classified outcome of comparing a fresh submission against the store.
#[derive(Clone, Debug, PartialEq)]
pub enum SubmissionEvent {
    New {
        submission: Submission,
    },
    Changed {
        previous: Submission,
        current: Submission,
        diff: Vec<FieldChange>,
    },
}

impl SubmissionEvent {
    pub fn code(&self) -> &str {
        match self {
            SubmissionEvent::New { submission } => &submission.code,
            SubmissionEvent::Changed { current, .. } => &current.code,
        }
    }

    pub fn is_new(&self) -> bool {
        matches!(self, SubmissionEvent::New { .. })
    }

    pub fn is_changed(&self) -> bool {
        matches!(self, SubmissionEvent::Changed { .. })
    }
}

/// Which event kinds the diff engine reports.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ReportMode {
    /// Only submissions whose code was never seen before.
    NewOnly,
    /// New submissions plus field-level changes to known ones.
    #[default]
    NewAndChanged,
}

impl ReportMode {
    pub fn from_only_new(only_new: bool) -> Self {
        if only_new {
            ReportMode::NewOnly
        } else {
            ReportMode::NewAndChanged
        }
    }

    pub fn detects_changes(self) -> bool {
        self == ReportMode::NewAndChanged
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ReportMode::NewOnly => "new_only",
            ReportMode::NewAndChanged => "new_and_changed",
        }
    }
}
