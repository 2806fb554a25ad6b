// src/connectors/telegram.rs
use crate::connectors::messages::SendMessage;
use crate::connectors::traits::Notifier;
use crate::error::NotifierError;
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use tracing::info;

const DEFAULT_API_BASE: &str = "https://api.telegram.org";

/// Delivers alerts to one chat through the Bot API.
pub struct TelegramNotifier {
    http_client: Client,
    bot_token: String,
    chat_id: String,
    api_base: String,
}

impl TelegramNotifier {
    pub fn new(bot_token: String, chat_id: String, timeout: Duration) -> Result<Self, reqwest::Error> {
        Ok(Self {
            http_client: Client::builder().timeout(timeout).build()?,
            bot_token,
            chat_id,
            api_base: DEFAULT_API_BASE.to_string(),
        })
    }

    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into().trim_end_matches('/').to_string();
        self
    }
}

#[async_trait]
impl Notifier for TelegramNotifier {
    async fn send(&self, message: &str) -> Result<(), NotifierError> {
        let url = format!("{}/bot{}/sendMessage", self.api_base, self.bot_token);
        let payload = SendMessage {
            chat_id: &self.chat_id,
            text: message,
            parse_mode: "Markdown",
        };

        let response = self.http_client.post(&url).form(&payload).send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(NotifierError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        info!(chat_id = %self.chat_id, "📨 Alert delivered");
        Ok(())
    }
}
