//! Scenario: Pushover sink over HTTP against an in-process mock server.

use httpmock::prelude::*;
use ptx_notify::{
    format_events, DispatchError, MessagePolicy, NotificationSink, PushoverSink,
};
use ptx_reconcile::{Submission, SubmissionEvent, TypeLabel};

fn one_event_payload() -> ptx_notify::NotificationPayload {
    let events = vec![SubmissionEvent::New {
        submission: Submission::new("B", "Y", TypeLabel::new("Workshop", "")),
    }];
    let policy = MessagePolicy::for_source("https://pretalx.com/api/events/demo");
    format_events(&events, &policy).expect("one event yields one payload")
}

#[tokio::test]
async fn accepted_message_returns_receipt() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/1/messages.json")
                .body_contains("token=app-token")
                .body_contains("user=user-key")
                .body_contains("sound=cosmic")
                .body_contains("url_title=PreTalx");
            then.status(200)
                .header("content-type", "application/json")
                .body(r#"{"status": 1, "request": "req-42"}"#);
        })
        .await;

    let sink = PushoverSink::new_with_base_url("app-token", "user-key", server.base_url());
    let receipt = sink.send(&one_event_payload()).await.unwrap();

    mock.assert_async().await;
    assert_eq!(receipt.request_id, "req-42");
}

#[tokio::test]
async fn rejected_message_carries_errors() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/1/messages.json");
            then.status(400)
                .header("content-type", "application/json")
                .body(r#"{"user": "invalid", "errors": ["user identifier is invalid"], "status": 0, "request": "r"}"#);
        })
        .await;

    let sink = PushoverSink::new_with_base_url("app", "bad-user", server.base_url());
    let err = sink.send(&one_event_payload()).await.unwrap_err();

    assert_eq!(
        err,
        DispatchError::Rejected {
            status: 400,
            errors: vec!["user identifier is invalid".to_string()],
        }
    );
}

#[tokio::test]
async fn status_zero_with_http_ok_is_rejected() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/1/messages.json");
            then.status(200).body(r#"{"status": 0, "errors": ["quota exceeded"]}"#);
        })
        .await;

    let sink = PushoverSink::new_with_base_url("app", "user", server.base_url());
    let err = sink.send(&one_event_payload()).await.unwrap_err();
    assert!(matches!(err, DispatchError::Rejected { status: 200, .. }), "{err:?}");
}

#[tokio::test]
async fn non_json_success_is_decode_error() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/1/messages.json");
            then.status(200).body("ok");
        })
        .await;

    let sink = PushoverSink::new_with_base_url("app", "user", server.base_url());
    let err = sink.send(&one_event_payload()).await.unwrap_err();
    assert!(matches!(err, DispatchError::Decode(_)), "{err:?}");
}

#[tokio::test]
async fn unreachable_sink_is_transport_error() {
    let sink = PushoverSink::new_with_base_url("app", "user", "http://127.0.0.1:1");
    let err = sink.send(&one_event_payload()).await.unwrap_err();
    assert!(matches!(err, DispatchError::Transport(_)), "{err:?}");
}
