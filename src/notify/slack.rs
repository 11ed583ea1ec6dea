use super::Notifier;
use crate::config::SlackConfig;
use crate::error::NotifyError;
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

const POST_MESSAGE_URL: &str = "https://slack.com/api/chat.postMessage";

/// Posts listings through the Slack Web API as a bot user.
pub struct SlackNotifier {
    client: Client,
    token: String,
    username: String,
    icon_emoji: String,
}

#[derive(Debug, Deserialize)]
struct SlackResponse {
    ok: bool,
    error: Option<String>,
}

impl SlackNotifier {
    pub fn new(token: impl Into<String>, config: &SlackConfig) -> Result<Self, NotifyError> {
        let client = Client::builder().timeout(Duration::from_secs(15)).build()?;

        Ok(Self {
            client,
            token: token.into(),
            username: config.username.clone(),
            icon_emoji: config.icon_emoji.clone(),
        })
    }

    fn build_payload(&self, channel: &str, text: &str) -> serde_json::Value {
        serde_json::json!({
            "channel": channel,
            "text": text,
            "username": self.username,
            "icon_emoji": self.icon_emoji,
        })
    }
}

#[async_trait]
impl Notifier for SlackNotifier {
    async fn post_message(&self, channel: &str, text: &str) -> Result<(), NotifyError> {
        let response = self
            .client
            .post(POST_MESSAGE_URL)
            .bearer_auth(&self.token)
            .json(&self.build_payload(channel, text))
            .send()
            .await?
            .error_for_status()?;

        let body: SlackResponse = response.json().await?;
        if !body.ok {
            return Err(NotifyError::Rejected {
                channel: channel.to_string(),
                reason: body.error.unwrap_or_else(|| "unknown error".to_string()),
            });
        }

        debug!("Posted to {}", channel);
        Ok(())
    }
}
