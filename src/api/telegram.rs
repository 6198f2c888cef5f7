use super::Notifier;
use crate::error::BotError;
use crate::Result;
use reqwest::Client;
use serde::Serialize;
use std::time::Duration;

pub const TELEGRAM_API_BASE: &str = "https://api.telegram.org";

/// Sends signal announcements to a Telegram chat
#[derive(Clone)]
pub struct TelegramNotifier {
    client: Client,
    base_url: String,
    bot_token: String,
    chat_id: String,
}

#[derive(Debug, Serialize)]
struct SendMessage<'a> {
    chat_id: &'a str,
    text: &'a str,
}

impl TelegramNotifier {
    pub fn new(base_url: &str, bot_token: &str, chat_id: &str, timeout: Duration) -> Result<Self> {
        if bot_token.is_empty() || chat_id.is_empty() {
            return Err(BotError::Config(
                "Telegram bot token and chat id are both required".into(),
            ));
        }

        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            bot_token: bot_token.to_string(),
            chat_id: chat_id.to_string(),
        })
    }
}

impl Notifier for TelegramNotifier {
    async fn send(&self, text: &str) -> Result<()> {
        let url = format!("{}/bot{}/sendMessage", self.base_url, self.bot_token);

        let response = self
            .client
            .post(&url)
            .json(&SendMessage {
                chat_id: &self.chat_id,
                text,
            })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(BotError::Provider(format!(
                "Telegram sendMessage returned {}: {}",
                status, body
            )));
        }

        tracing::debug!("Telegram message delivered to chat {}", self.chat_id);
        Ok(())
    }
}
