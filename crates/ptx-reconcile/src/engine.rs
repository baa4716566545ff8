use std::collections::BTreeSet;

use serde_json::Value;

use crate::{
    FieldChange, KnownSubmissions, ReportMode, Speaker, Submission, SubmissionEvent, TypeLabel,
};

fn push_if_differs(diffs: &mut Vec<FieldChange>, field: &str, old: &str, new: &str) {
    if old != new {
        diffs.push(FieldChange::new(field, old, new));
    }
}

fn render_type_label(label: &TypeLabel) -> String {
    if label.secondary.is_empty() {
        label.primary.clone()
    } else {
        format!("{} / {}", label.primary, label.secondary)
    }
}

fn render_speaker_names(speakers: &[Speaker]) -> String {
    speakers
        .iter()
        .map(|s| format!("{} ({})", s.name, s.code))
        .collect::<Vec<_>>()
        .join(", ")
}

fn render_speaker_bios(speakers: &[Speaker]) -> String {
    speakers
        .iter()
        .map(|s| format!("{}: {}", s.name, s.biography))
        .collect::<Vec<_>>()
        .join(" | ")
}

/// Strings render bare, null/absent as empty, everything else as compact JSON.
fn render_value(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

/// Field-by-field comparison in fixed schema order, opaque keys last (by key).
///
/// Empty result iff `previous == current` (ignoring `code`, which is the identity).
pub fn diff_submissions(previous: &Submission, current: &Submission) -> Vec<FieldChange> {
    let mut diffs: Vec<FieldChange> = Vec::new();

    push_if_differs(&mut diffs, "title", &previous.title, &current.title);

    if previous.submission_type != current.submission_type {
        diffs.push(FieldChange::new(
            "submission_type",
            render_type_label(&previous.submission_type),
            render_type_label(&current.submission_type),
        ));
    }

    push_if_differs(&mut diffs, "state", &previous.state, &current.state);
    push_if_differs(
        &mut diffs,
        "abstract",
        &previous.abstract_text,
        &current.abstract_text,
    );
    push_if_differs(
        &mut diffs,
        "description",
        &previous.description,
        &current.description,
    );
    push_if_differs(&mut diffs, "duration", &previous.duration, &current.duration);
    push_if_differs(
        &mut diffs,
        "content_locale",
        &previous.content_locale,
        &current.content_locale,
    );

    if previous.do_not_record != current.do_not_record {
        diffs.push(FieldChange::new(
            "do_not_record",
            previous.do_not_record.to_string(),
            current.do_not_record.to_string(),
        ));
    }

    if previous.speakers != current.speakers {
        let old_names = render_speaker_names(&previous.speakers);
        let new_names = render_speaker_names(&current.speakers);
        let old_bios = render_speaker_bios(&previous.speakers);
        let new_bios = render_speaker_bios(&current.speakers);
        push_if_differs(&mut diffs, "speakers", &old_names, &new_names);
        // Bios only matter when the roster itself is unchanged.
        if old_names == new_names {
            diffs.push(FieldChange::new("speaker_biographies", old_bios, new_bios));
        }
    }

    let keys: BTreeSet<&String> = previous.extra.keys().chain(current.extra.keys()).collect();
    for key in keys {
        let old = previous.extra.get(key);
        let new = current.extra.get(key);
        if old != new {
            diffs.push(FieldChange::new(
                key.as_str(),
                render_value(old),
                render_value(new),
            ));
        }
    }

    diffs
}

/// Classify `fresh` against `store` and advance the store.
///
/// Iterates in fetch order:
/// - unknown code => `New`, inserted;
/// - known code, `NewAndChanged`, any field differs => `Changed`, overwritten;
/// - known code otherwise => nothing, store untouched.
///
/// Codes missing from `fresh` are left in the store; deletions are not reported.
pub fn reconcile<I>(
    store: &mut KnownSubmissions,
    fresh: I,
    mode: ReportMode,
) -> Vec<SubmissionEvent>
where
    I: IntoIterator<Item = Submission>,
{
    let mut events: Vec<SubmissionEvent> = Vec::new();

    for submission in fresh {
        let Some(known) = store.get(&submission.code) else {
            store.put(submission.code.clone(), submission.clone());
            events.push(SubmissionEvent::New { submission });
            continue;
        };

        if !mode.detects_changes() || *known == submission {
            continue;
        }

        let diff = diff_submissions(known, &submission);
        let previous = known.clone();
        store.put(submission.code.clone(), submission.clone());
        events.push(SubmissionEvent::Changed {
            previous,
            current: submission,
            diff,
        });
    }

    events
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn talk(code: &str, title: &str) -> Submission {
        Submission::new(code, title, TypeLabel::new("Talk", "Vortrag"))
    }

    #[test]
    fn identical_submissions_have_no_diff() {
        assert!(diff_submissions(&talk("A", "X"), &talk("A", "X")).is_empty());
    }

    #[test]
    fn title_change_is_reported() {
        let diff = diff_submissions(&talk("A", "X"), &talk("A", "X2"));
        assert_eq!(diff, vec![FieldChange::new("title", "X", "X2")]);
    }

    #[test]
    fn diff_follows_schema_order() {
        let old = talk("A", "X");
        let mut new = talk("A", "Y");
        new.state = "accepted".to_string();
        new.duration = "45".to_string();
        new.do_not_record = true;
        let fields: Vec<String> = diff_submissions(&old, &new)
            .into_iter()
            .map(|d| d.field)
            .collect();
        assert_eq!(fields, vec!["title", "state", "duration", "do_not_record"]);
    }

    #[test]
    fn secondary_label_change_is_visible() {
        let old = talk("A", "X");
        let mut new = talk("A", "X");
        new.submission_type.secondary = "Kurzvortrag".to_string();
        let diff = diff_submissions(&old, &new);
        assert_eq!(
            diff,
            vec![FieldChange::new(
                "submission_type",
                "Talk / Vortrag",
                "Talk / Kurzvortrag"
            )]
        );
    }

    #[test]
    fn speaker_roster_change() {
        let mut old = talk("A", "X");
        old.speakers.push(Speaker {
            code: "S1".into(),
            name: "Ada".into(),
            biography: String::new(),
        });
        let mut new = old.clone();
        new.speakers.push(Speaker {
            code: "S2".into(),
            name: "Grace".into(),
            biography: String::new(),
        });
        let diff = diff_submissions(&old, &new);
        assert_eq!(diff.len(), 1);
        assert_eq!(diff[0].field, "speakers");
        assert_eq!(diff[0].new, "Ada (S1), Grace (S2)");
    }

    #[test]
    fn speaker_biography_only_change() {
        let mut old = talk("A", "X");
        old.speakers.push(Speaker {
            code: "S1".into(),
            name: "Ada".into(),
            biography: "old".into(),
        });
        let mut new = old.clone();
        new.speakers[0].biography = "new".into();
        let diff = diff_submissions(&old, &new);
        assert_eq!(
            diff,
            vec![FieldChange::new("speaker_biographies", "Ada: old", "Ada: new")]
        );
    }

    #[test]
    fn opaque_fields_diff_by_key() {
        let mut old = talk("A", "X");
        old.extra.insert("answers".into(), json!([]));
        old.extra.insert("notes".into(), json!("n"));
        let mut new = talk("A", "X");
        new.extra.insert("answers".into(), json!([{"id": 1}]));
        new.extra.insert("zeta".into(), json!("added"));
        let diff = diff_submissions(&old, &new);
        assert_eq!(
            diff,
            vec![
                FieldChange::new("answers", "[]", r#"[{"id":1}]"#),
                FieldChange::new("notes", "n", ""),
                FieldChange::new("zeta", "", "added"),
            ]
        );
    }

    #[test]
    fn reconcile_empty_store_reports_all_new_in_order() {
        let mut store = KnownSubmissions::new();
        let events = reconcile(
            &mut store,
            vec![talk("B", "b"), talk("A", "a")],
            ReportMode::NewAndChanged,
        );
        let codes: Vec<&str> = events.iter().map(|e| e.code()).collect();
        assert_eq!(codes, vec!["B", "A"]);
        assert!(events.iter().all(|e| e.is_new()));
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn reconcile_new_only_skips_changes_and_leaves_store() {
        let mut store = KnownSubmissions::new();
        store.seed(vec![talk("A", "X")]);
        let events = reconcile(&mut store, vec![talk("A", "X2")], ReportMode::NewOnly);
        assert!(events.is_empty());
        assert_eq!(store.get("A").unwrap().title, "X");
    }
}
