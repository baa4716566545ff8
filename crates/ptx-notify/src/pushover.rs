//! Pushover-backed notification sink.

use std::fmt;
use std::time::Duration;

use chrono::Utc;
use serde::Deserialize;
use tracing::debug;

use crate::{DispatchError, NotificationPayload, NotificationSink, Receipt};

pub const PUSHOVER_API_URL: &str = "https://api.pushover.net";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Application token and recipient are read by the caller and passed in; never logged.
#[derive(Clone)]
pub struct PushoverSink {
    http: reqwest::Client,
    base_url: String,
    app_token: String,
    user_key: String,
    device: Option<String>,
}

impl fmt::Debug for PushoverSink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PushoverSink")
            .field("base_url", &self.base_url)
            .field("app_token", &"<REDACTED>")
            .field("user_key", &"<REDACTED>")
            .field("device", &self.device)
            .finish()
    }
}

impl PushoverSink {
    pub fn new(app_token: impl Into<String>, user_key: impl Into<String>) -> Self {
        Self::new_with_base_url(app_token, user_key, PUSHOVER_API_URL)
    }

    pub fn new_with_base_url(
        app_token: impl Into<String>,
        user_key: impl Into<String>,
        base_url: impl Into<String>,
    ) -> Self {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());
        Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            app_token: app_token.into(),
            user_key: user_key.into(),
            device: None,
        }
    }

    /// Deliver to one named device of the recipient instead of all of them.
    pub fn with_device(mut self, device: Option<String>) -> Self {
        self.device = device;
        self
    }

    fn messages_url(&self) -> String {
        format!("{}/1/messages.json", self.base_url)
    }

    fn form(&self, payload: &NotificationPayload) -> Vec<(&'static str, String)> {
        let mut form: Vec<(&'static str, String)> = vec![
            ("token", self.app_token.clone()),
            ("user", self.user_key.clone()),
            ("title", payload.title.clone()),
            ("message", payload.body.clone()),
            ("timestamp", Utc::now().timestamp().to_string()),
        ];
        if let Some(link) = &payload.link {
            form.push(("url", link.url.clone()));
            form.push(("url_title", link.title.clone()));
        }
        if let Some(sound) = &payload.sound {
            form.push(("sound", sound.clone()));
        }
        if let Some(retry) = payload.retry {
            form.push(("retry", retry.as_secs().to_string()));
        }
        if let Some(device) = &self.device {
            form.push(("device", device.clone()));
        }
        form
    }
}

#[derive(Debug, Deserialize)]
struct PushoverResponse {
    #[serde(default)]
    status: i64,
    #[serde(default)]
    request: String,
    #[serde(default)]
    errors: Vec<String>,
}

#[async_trait::async_trait]
impl NotificationSink for PushoverSink {
    fn sink_name(&self) -> &'static str {
        "pushover"
    }

    async fn send(&self, payload: &NotificationPayload) -> Result<Receipt, DispatchError> {
        debug!(
            chars = payload.body.chars().count(),
            device = self.device.as_deref().unwrap_or("all"),
            "posting pushover message"
        );
        let resp = self
            .http
            .post(self.messages_url())
            .form(&self.form(payload))
            .send()
            .await
            .map_err(|e| DispatchError::Transport(e.to_string()))?;

        let status = resp.status();
        let body = resp
            .text()
            .await
            .map_err(|e| DispatchError::Transport(format!("reading response body failed: {e}")))?;

        let parsed: PushoverResponse = match serde_json::from_str(&body) {
            Ok(parsed) => parsed,
            Err(_) if !status.is_success() => {
                return Err(DispatchError::Rejected {
                    status: status.as_u16(),
                    errors: Vec::new(),
                })
            }
            Err(e) => return Err(DispatchError::Decode(e.to_string())),
        };

        if !status.is_success() || parsed.status != 1 {
            return Err(DispatchError::Rejected {
                status: status.as_u16(),
                errors: parsed.errors,
            });
        }

        Ok(Receipt {
            request_id: parsed.request,
        })
    }
}
