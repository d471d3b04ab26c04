//! One-way notification channel to a Webex room.

use serde_json::json;
use tracing::info;

use crate::config::WebexConfig;

const WEBEX_MESSAGES_URL: &str = "https://webexapis.com/v1/messages";

/// Sends plain-string notifications to a single Webex room.
pub struct WebexNotifier {
    bot_token: String,
    room_id: String,
    base_url: String,
    client: reqwest::Client,
}

impl WebexNotifier {
    /// Build the notifier if the channel is configured; `None` disables it.
    pub fn from_config(config: &WebexConfig) -> Option<Self> {
        match (&config.bot_token, &config.room_id) {
            (Some(bot_token), Some(room_id)) => Some(Self {
                bot_token: bot_token.clone(),
                room_id: room_id.clone(),
                base_url: WEBEX_MESSAGES_URL.to_string(),
                client: reqwest::Client::new(),
            }),
            _ => None,
        }
    }

    /// Send one notification message.
    pub async fn send_notification(&self, notification: &str) -> anyhow::Result<()> {
        info!("SENDING_NOTIFICATION: {notification}");

        let response = self
            .client
            .post(&self.base_url)
            .bearer_auth(&self.bot_token)
            .json(&json!({
                "roomId": self.room_id,
                "text": notification,
            }))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            anyhow::bail!("Webex answered {status}");
        }
        Ok(())
    }
}
