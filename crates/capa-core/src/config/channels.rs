use super::defaults::*;
use serde::{Deserialize, Serialize};

/// Telegram operational-log channel.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelegramConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub bot_token: String,
    /// Chat that receives logs and QR codes.
    #[serde(default)]
    pub chat_id: String,
    /// Total delivery attempts per message (default: 3).
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    /// Fixed delay between attempts in seconds (default: 5).
    #[serde(default = "default_retry_delay_secs")]
    pub retry_delay_secs: u64,
    #[serde(default = "default_telegram_base_url")]
    pub base_url: String,
}

impl Default for TelegramConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            bot_token: String::new(),
            chat_id: String::new(),
            max_attempts: default_max_attempts(),
            retry_delay_secs: default_retry_delay_secs(),
            base_url: default_telegram_base_url(),
        }
    }
}

/// WhatsApp configuration.
///
/// Each account is its own login, with session data stored at
/// `{data_dir}/whatsapp_session_{id}/`. Pairing is done by scanning a QR code.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WhatsAppConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Group JID that receives reminders (e.g. `"120363001234567890@g.us"`).
    #[serde(default)]
    pub reminder_group: String,
    /// Account used to deliver reminders.
    #[serde(default = "default_account_id")]
    pub reminder_account: u32,
    #[serde(default = "default_accounts")]
    pub accounts: Vec<WhatsAppAccount>,
}

impl Default for WhatsAppConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            reminder_group: String::new(),
            reminder_account: default_account_id(),
            accounts: default_accounts(),
        }
    }
}

/// A single WhatsApp login.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WhatsAppAccount {
    pub id: u32,
    /// Connect at startup instead of waiting for `GET /initialize`.
    #[serde(default)]
    pub auto_start: bool,
}
