//! Telegram operational-log notifier (Bot API `sendMessage` / `sendPhoto`).
//!
//! Only outbound calls: the bot never polls for updates. Every message is
//! prefixed with the bot name and severity, e.g. `Doraymon: [INFO] ...`.

mod send;

#[cfg(test)]
mod tests;

use async_trait::async_trait;
use capa_core::{config::TelegramConfig, message::Severity, traits::Notifier};
use std::time::Duration;
use tracing::error;

/// Telegram HTML messages are limited to 4096 characters.
const MAX_MESSAGE_LEN: usize = 4096;

/// Mirrors operational events to a Telegram chat.
pub struct TelegramNotifier {
    pub(super) config: TelegramConfig,
    pub(super) name: String,
    pub(super) client: reqwest::Client,
    pub(super) base_url: String,
}

impl TelegramNotifier {
    /// `name` is the prefix shown on every message.
    pub fn new(config: TelegramConfig, name: &str) -> Self {
        let base_url = format!(
            "{}/bot{}",
            config.base_url.trim_end_matches('/'),
            config.bot_token
        );
        Self {
            config,
            name: name.to_string(),
            client: reqwest::Client::new(),
            base_url,
        }
    }

    /// Log line as sent to the chat.
    pub fn format(&self, severity: Severity, text: &str) -> String {
        format!("{}: [{}] {text}", self.name, severity.label())
    }

    fn retry_delay(&self) -> Duration {
        Duration::from_secs(self.config.retry_delay_secs)
    }

    fn attempts(&self) -> u32 {
        self.config.max_attempts.max(1)
    }
}

#[async_trait]
impl Notifier for TelegramNotifier {
    async fn notify(&self, severity: Severity, text: &str) {
        let message = self.format(severity, text);
        for chunk in crate::utils::split_message(&message, MAX_MESSAGE_LEN) {
            let mut delivered = false;
            for attempt in 1..=self.attempts() {
                match self.send_text(chunk).await {
                    Ok(()) => {
                        delivered = true;
                        break;
                    }
                    Err(e) if attempt < self.attempts() => {
                        tracing::warn!(
                            "telegram attempt {attempt}/{} failed: {e}",
                            self.attempts()
                        );
                        tokio::time::sleep(self.retry_delay()).await;
                    }
                    Err(e) => tracing::warn!("telegram attempt {attempt} failed: {e}"),
                }
            }
            if !delivered {
                error!("Telegram {}: {chunk} exceeded maximum retries", self.name);
            }
        }
    }

    async fn notify_photo(&self, image: &[u8], caption: &str) {
        for attempt in 1..=self.attempts() {
            match self.send_photo_bytes(image, caption).await {
                Ok(()) => return,
                Err(e) => {
                    tracing::warn!("telegram photo attempt {attempt} failed: {e}");
                    if attempt < self.attempts() {
                        tokio::time::sleep(self.retry_delay()).await;
                    }
                }
            }
        }
        error!("Telegram {}: photo '{caption}' exceeded maximum retries", self.name);
    }
}
