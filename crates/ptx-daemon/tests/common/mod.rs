#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use ptx_notify::{DispatchError, NotificationPayload, NotificationSink, Receipt};
use ptx_reconcile::{Submission, TypeLabel};
use ptx_source::{SourceError, SubmissionSource};

pub fn sub(code: &str, title: &str) -> Submission {
    Submission::new(code, title, TypeLabel::new("Talk", ""))
}

/// Replays scripted fetch results in order; repeats the last one when exhausted.
pub struct ScriptedSource {
    script: Mutex<VecDeque<Result<Vec<Submission>, SourceError>>>,
    last: Mutex<Option<Result<Vec<Submission>, SourceError>>>,
    calls: Mutex<usize>,
}

impl ScriptedSource {
    pub fn new(script: Vec<Result<Vec<Submission>, SourceError>>) -> Arc<Self> {
        Arc::new(Self {
            script: Mutex::new(script.into()),
            last: Mutex::new(None),
            calls: Mutex::new(0),
        })
    }

    pub fn calls(&self) -> usize {
        *self.calls.lock().unwrap()
    }
}

#[async_trait::async_trait]
impl SubmissionSource for ScriptedSource {
    fn source_name(&self) -> &'static str {
        "scripted"
    }

    async fn fetch_all(&self) -> Result<Vec<Submission>, SourceError> {
        *self.calls.lock().unwrap() += 1;
        let next = self.script.lock().unwrap().pop_front();
        let mut last = self.last.lock().unwrap();
        match next {
            Some(result) => {
                *last = Some(result.clone());
                result
            }
            None => last.clone().unwrap_or_else(|| Ok(Vec::new())),
        }
    }
}

/// Records every payload; fails every send when `fail` is set.
pub struct RecordingSink {
    sent: Mutex<Vec<NotificationPayload>>,
    fail: Option<DispatchError>,
}

impl RecordingSink {
    pub fn ok() -> Arc<Self> {
        Arc::new(Self {
            sent: Mutex::new(Vec::new()),
            fail: None,
        })
    }

    pub fn failing(err: DispatchError) -> Arc<Self> {
        Arc::new(Self {
            sent: Mutex::new(Vec::new()),
            fail: Some(err),
        })
    }

    pub fn sent(&self) -> Vec<NotificationPayload> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl NotificationSink for RecordingSink {
    fn sink_name(&self) -> &'static str {
        "recording"
    }

    async fn send(&self, payload: &NotificationPayload) -> Result<Receipt, DispatchError> {
        self.sent.lock().unwrap().push(payload.clone());
        match &self.fail {
            Some(err) => Err(err.clone()),
            None => Ok(Receipt {
                request_id: format!("req-{}", self.sent.lock().unwrap().len()),
            }),
        }
    }
}
