use super::Notifier;
use crate::error::NotifyError;
use async_trait::async_trait;
use tracing::info;

/// Writes messages to the log instead of posting them. Used when no Slack token is set.
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn post_message(&self, channel: &str, text: &str) -> Result<(), NotifyError> {
        info!(channel, "{}", text);
        Ok(())
    }
}
