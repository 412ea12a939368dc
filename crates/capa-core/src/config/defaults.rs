//! Default value functions used by serde for config deserialization.

use super::WhatsAppAccount;

pub fn default_name() -> String {
    "Doraymon".to_string()
}

pub fn default_data_dir() -> String {
    "~/.capa-bot".to_string()
}

pub fn default_log_file() -> String {
    "~/.capa-bot/capa-bot.log".to_string()
}

pub fn default_log_level() -> String {
    "info".to_string()
}

pub fn default_utc_offset_hours() -> i32 {
    7
}

pub fn default_true() -> bool {
    true
}

pub fn default_credentials_path() -> String {
    "service-account.json".to_string()
}

pub fn default_capa_range() -> String {
    "' CAPA'!A:X".to_string()
}

pub fn default_directory_range() -> String {
    "PHONENUMBER!A:G".to_string()
}

pub fn default_sheets_base_url() -> String {
    "https://sheets.googleapis.com/v4".to_string()
}

pub fn default_telegram_base_url() -> String {
    "https://api.telegram.org".to_string()
}

pub fn default_max_attempts() -> u32 {
    3
}

pub fn default_retry_delay_secs() -> u64 {
    5
}

pub fn default_account_id() -> u32 {
    1
}

pub fn default_accounts() -> Vec<WhatsAppAccount> {
    vec![WhatsAppAccount {
        id: default_account_id(),
        auto_start: false,
    }]
}

pub fn default_api_host() -> String {
    "127.0.0.1".to_string()
}

pub fn default_api_port() -> u16 {
    3000
}

pub fn default_daily_time() -> String {
    "08:00".to_string()
}

pub fn default_holiday_url() -> String {
    "https://api-harilibur.vercel.app/api".to_string()
}
