use reqwest::header::CONTENT_TYPE;
use reqwest_middleware::{ClientBuilder, ClientWithMiddleware};
use reqwest_retry::{policies::ExponentialBackoff, RetryTransientMiddleware};
use serde::Serialize;

use crate::notify::{Notifier, NotifyError};

/// Pushes text messages to a single LINE user
#[derive(Clone)]
pub struct LineNotifier {
    client: ClientWithMiddleware,
    access_token: String,
    user_id: String,
    base_url: String,
}

#[derive(Debug, Serialize)]
struct PushMessage<'a> {
    to: &'a str,
    messages: [TextMessage<'a>; 1],
}

#[derive(Debug, Serialize)]
struct TextMessage<'a> {
    #[serde(rename = "type")]
    kind: &'static str,
    text: &'a str,
}

impl LineNotifier {
    /// Longest text LINE accepts in a single message, in characters
    pub const MAX_TEXT_CHARS: usize = 5000;

    pub fn new(access_token: impl Into<String>, user_id: impl Into<String>) -> Self {
        let retry_policy = ExponentialBackoff::builder().build_with_max_retries(3);
        let client = ClientBuilder::new(reqwest::Client::new())
            .with(RetryTransientMiddleware::new_with_policy(retry_policy))
            .build();

        Self {
            client,
            access_token: access_token.into(),
            user_id: user_id.into(),
            base_url: "https://api.line.me".into(),
        }
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }
}

/// Cuts `text` down to LINE's message limit on a char boundary
pub fn truncate_message(text: &str) -> &str {
    match text.char_indices().nth(LineNotifier::MAX_TEXT_CHARS) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

impl Notifier for LineNotifier {
    #[tracing::instrument(skip_all, fields(chars = text.chars().count()))]
    async fn notify(&self, text: &str) -> Result<(), NotifyError> {
        let message = PushMessage {
            to: &self.user_id,
            messages: [TextMessage {
                kind: "text",
                text: truncate_message(text),
            }],
        };
        let body = serde_json::to_vec(&message)?;

        let resp = self
            .client
            .post(format!("{}/v2/bot/message/push", self.base_url))
            .bearer_auth(&self.access_token)
            .header(CONTENT_TYPE, "application/json")
            .body(body)
            .send()
            .await
            .inspect_err(|e| tracing::error!(error = %e, "Failed to make http request"))?;

        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let message = resp.text().await.unwrap_or_default();
            return Err(NotifyError::Api { status, message });
        }

        tracing::info!("Report pushed to LINE");
        Ok(())
    }
}
