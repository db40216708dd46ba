//! Completion notification: one human-readable summary per search run.

use serde::Serialize;
use std::time::Duration;

#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    #[error("notification failed: {0}")]
    Transport(String),
}

pub trait Notifier: Send + Sync {
    fn notify(&self, message: &str) -> Result<(), NotifyError>;
}

#[derive(Serialize)]
struct NotifyPayload<'a> {
    message: &'a str,
}

/// Posts `{"message": ...}` to a webhook URL.
pub struct WebhookNotifier {
    url: String,
    agent: ureq::Agent,
}

impl WebhookNotifier {
    pub fn new(url: &str) -> Self {
        let agent = ureq::Agent::new_with_config(
            ureq::config::Config::builder()
                .timeout_connect(Some(Duration::from_secs(5)))
                .timeout_send_request(Some(Duration::from_secs(10)))
                .build(),
        );
        WebhookNotifier {
            url: url.trim_end_matches('/').to_string(),
            agent,
        }
    }
}

impl Notifier for WebhookNotifier {
    fn notify(&self, message: &str) -> Result<(), NotifyError> {
        self.agent
            .post(&self.url)
            .send_json(&NotifyPayload { message })
            .map(|_| ())
            .map_err(|e| NotifyError::Transport(e.to_string()))
    }
}
